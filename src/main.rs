//! CLI: terminal dashboard, exports and AI commentary for SMV statement reports.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use smv_financial_report::{
    Config, HorizontalAnalysis, NarrativeGenerator, OpenAiCompatClient, RawReport, Report,
    ReportBuilder, ReportError, ReportSet, StatementKind, VerticalAnalysis, export_set,
    render_horizontal, render_ratios, render_statement, render_summary, render_table,
    render_vertical,
};

#[derive(Parser, Debug)]
#[command(name = "smv-report", version, about = "SMV financial statement analyzer")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Years at or after this are not taken as document years (default: current year)
    #[arg(long, global = true)]
    cutoff: Option<i32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Header, statements and balance check of one report
    Show {
        file: PathBuf,
        /// Also print every statement
        #[arg(long)]
        statements: bool,
        /// Force the document year
        #[arg(long)]
        year: Option<i32>,
    },

    /// Vertical analysis of one report
    Vertical {
        file: PathBuf,
        #[arg(long)]
        year: Option<i32>,
    },

    /// Horizontal analysis of one post-2010 report
    Horizontal {
        file: PathBuf,
        #[arg(long)]
        year: Option<i32>,
    },

    /// Financial ratios over report files or directories
    Ratios {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Multi-year consolidated tables
    Consolidate {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Keep only the N rows with the largest mean (default from config)
        #[arg(long)]
        top: Option<usize>,
    },

    /// Write CSV/XLSX/JSON exports into a directory
    Export {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[arg(long, short)]
        out: PathBuf,
    },

    /// AI commentary on the ratios (needs the API key variable from the config)
    Narrate {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Write the Markdown here instead of stdout
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
}

fn load_report(path: &Path, year: Option<i32>, cutoff: Option<i32>) -> Result<Report> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let raw = RawReport::from_reader(file)?;
    let mut builder = ReportBuilder::new(&raw);
    if let Some(year) = year {
        builder = builder.document_year(year);
    }
    if let Some(cutoff) = cutoff {
        builder = builder.year_cutoff(cutoff);
    }
    builder
        .parse()
        .with_context(|| format!("parse {}", path.display()))
}

fn with_cutoff(builder: ReportBuilder<'_>, cutoff: Option<i32>) -> Result<Report, ReportError> {
    match cutoff {
        Some(cutoff) => builder.year_cutoff(cutoff).parse(),
        None => builder.parse(),
    }
}

fn load_set(paths: &[PathBuf], cutoff: Option<i32>) -> Result<ReportSet> {
    let mut set = ReportSet::default();
    for path in paths {
        if path.is_dir() {
            let loaded = ReportSet::from_dir_with(path, |builder| with_cutoff(builder, cutoff))
                .with_context(|| format!("read directory {}", path.display()))?;
            set.merge(loaded);
        } else {
            set.merge(ReportSet::from_paths_with([path], |builder| {
                with_cutoff(builder, cutoff)
            }));
        }
    }
    for skipped in &set.skipped {
        eprintln!("skipped {}: {}", skipped.path.display(), skipped.reason);
    }
    if set.reports.is_empty() {
        bail!("no report could be loaded");
    }
    log::info!("{} reports loaded", set.reports.len());
    Ok(set)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            Config::load(path).with_context(|| format!("read config {}", path.display()))?
        }
        None => Config::default(),
    };
    let cutoff = cli.cutoff.or(config.analysis.year_cutoff);

    match cli.command {
        Command::Show {
            file,
            statements,
            year,
        } => {
            let report = load_report(&file, year, cutoff)?;
            println!("{}", render_summary(&report));
            if statements {
                for statement in StatementKind::ALL
                    .into_iter()
                    .filter_map(|kind| report.statement(kind))
                {
                    println!("\n{}", render_statement(statement));
                }
            }
        }
        Command::Vertical { file, year } => {
            let report = load_report(&file, year, cutoff)?;
            println!("{}", render_vertical(&VerticalAnalysis::from_report(&report)));
        }
        Command::Horizontal { file, year } => {
            let report = load_report(&file, year, cutoff)?;
            let analysis = HorizontalAnalysis::from_report(&report)?;
            println!("{}", render_horizontal(&analysis));
        }
        Command::Ratios { paths } => {
            let set = load_set(&paths, cutoff)?;
            println!("{}", render_ratios(&set.ratios()?));
        }
        Command::Consolidate { paths, top } => {
            let set = load_set(&paths, cutoff)?;
            let top = top.unwrap_or(config.analysis.top_n);
            for kind in StatementKind::ALL {
                if let Some(table) = set.consolidate_values(kind) {
                    println!("{}\n", render_table(&table, None));
                }
            }
            let vertical = set.consolidate_vertical();
            let horizontal = set.consolidate_horizontal();
            for table in [
                &vertical.assets,
                &vertical.liabilities,
                &vertical.income,
                &vertical.cash_flow,
                &horizontal.balance,
                &horizontal.income,
                &horizontal.cash_flow,
            ]
            .into_iter()
            .flatten()
            {
                println!("{}\n", render_table(table, Some(top)));
            }
        }
        Command::Export { paths, out } => {
            let set = load_set(&paths, cutoff)?;
            let written = export_set(&set, &out)?;
            for path in written {
                println!("{}", path.display());
            }
        }
        Command::Narrate { paths, out } => {
            let set = load_set(&paths, cutoff)?;
            let ratios = set.ratios()?;
            let client = OpenAiCompatClient::from_config(&config.llm)?;
            let narrative = NarrativeGenerator::new(client, config.llm.clone()).generate(&ratios)?;
            let markdown = narrative.to_markdown();
            match out {
                Some(path) => {
                    fs::write(&path, markdown)
                        .with_context(|| format!("write {}", path.display()))?;
                    println!("{}", path.display());
                }
                None => println!("{markdown}"),
            }
        }
    }
    Ok(())
}
