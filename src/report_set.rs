//! A set of reports and the multi-year views built from it.

use std::collections::BTreeSet;
use std::fs::{self, DirEntry};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::ReportError;
use crate::horizontal::{HorizontalAnalysis, StatementHorizontal};
use crate::raw::RawReport;
use crate::ratios::RatioReport;
use crate::report::{Report, ReportBuilder};
use crate::table::{CellFormat, ConsolidatedTable, Occurrences, RowKey, TableBuilder};
use crate::types::StatementKind;
use crate::vertical::{VerticalAnalysis, VerticalLine};

/// File extensions of regulator exports.
const REPORT_EXTENSIONS: [&str; 3] = ["xls", "html", "htm"];

/// Vertical analysis of several years side by side.
#[derive(Debug, Clone, Serialize)]
pub struct ConsolidatedVertical {
    /// Assets section of the balance sheet.
    pub assets: Option<ConsolidatedTable>,
    /// Liabilities section of the balance sheet.
    pub liabilities: Option<ConsolidatedTable>,
    /// Income statement.
    pub income: Option<ConsolidatedTable>,
    /// Cash flow.
    pub cash_flow: Option<ConsolidatedTable>,
}

/// Horizontal analysis of several year pairs side by side.
#[derive(Debug, Clone, Serialize)]
pub struct ConsolidatedHorizontal {
    /// Balance sheet.
    pub balance: Option<ConsolidatedTable>,
    /// Income statement.
    pub income: Option<ConsolidatedTable>,
    /// Cash flow.
    pub cash_flow: Option<ConsolidatedTable>,
}

/// A file left out of a set, with the reason.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    /// File path.
    pub path: PathBuf,
    /// Read or parse error.
    pub reason: String,
}

/// Reports with aggregation helpers.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportSet {
    /// Parsed reports in load order.
    pub reports: Vec<Report>,
    /// Files that could not be read or parsed.
    pub skipped: Vec<SkippedFile>,
}

impl From<Vec<Report>> for ReportSet {
    fn from(reports: Vec<Report>) -> Self {
        Self {
            reports,
            skipped: Vec::new(),
        }
    }
}

impl ReportSet {
    /// Loads and parses every report file in a directory with all statements.
    #[inline]
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, ReportError> {
        Self::from_dir_with(dir, |builder| builder.parse())
    }

    /// Loads and parses every report file in a directory, letting the caller tune the builder.
    ///
    /// # Example
    ///
    /// ```
    /// # use smv_financial_report::ReportSet;
    /// # let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");
    /// let set = ReportSet::from_dir_with(dir, |builder| builder.equity(false).parse()).unwrap();
    /// assert!(!set.reports.is_empty());
    /// ```
    pub fn from_dir_with<P, F>(dir: P, parse_fn: F) -> Result<Self, ReportError>
    where
        P: AsRef<Path>,
        for<'a> F: FnMut(ReportBuilder<'a>) -> Result<Report, ReportError>,
    {
        let mut entries: Vec<_> = fs::read_dir(dir)?
            .filter_map(std::result::Result::ok)
            .collect();
        entries.sort_by_key(DirEntry::path);

        let paths = entries
            .into_iter()
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_report_file(path));
        Ok(Self::from_paths_with(paths, parse_fn))
    }

    /// Parses the given files in order.
    #[inline]
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self::from_paths_with(paths, |builder| builder.parse())
    }

    /// Parses the given files in order with a custom builder setup.
    ///
    /// A file that cannot be read or parsed is logged, recorded in `skipped` and left out.
    pub fn from_paths_with<I, P, F>(paths: I, mut parse_fn: F) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
        for<'a> F: FnMut(ReportBuilder<'a>) -> Result<Report, ReportError>,
    {
        let mut set = Self::default();
        for path in paths {
            let path = path.as_ref();
            log::debug!("loading {}", path.display());
            let loaded = fs::File::open(path)
                .map_err(ReportError::from)
                .and_then(RawReport::from_reader)
                .and_then(|raw| parse_fn(ReportBuilder::new(&raw)));
            match loaded {
                Ok(report) => {
                    for warning in &report.warnings {
                        log::info!("{}: {warning}", path.display());
                    }
                    set.reports.push(report);
                }
                Err(err) => {
                    log::warn!("{} skipped: {err}", path.display());
                    set.skipped.push(SkippedFile {
                        path: path.to_path_buf(),
                        reason: err.to_string(),
                    });
                }
            }
        }
        set
    }

    /// Appends the reports and skipped files of another set.
    pub fn merge(&mut self, other: Self) {
        self.reports.extend(other.reports);
        self.skipped.extend(other.skipped);
    }

    /// Post-2010 reports, newest document year first (load order among equal years).
    pub fn post_2010(&self) -> Vec<&Report> {
        let mut reports: Vec<&Report> = self
            .reports
            .iter()
            .filter(|r| !r.meta.format.is_pre_2010())
            .collect();
        reports.sort_by(|a, b| b.meta.year.cmp(&a.meta.year));
        reports
    }

    /// Values of one statement across all post-2010 reports.
    ///
    /// Columns are every year found, newest first. When several reports carry the same
    /// year, the newest report wins. Equity rows are matched by account code.
    pub fn consolidate_values(&self, kind: StatementKind) -> Option<ConsolidatedTable> {
        let statements: Vec<_> = self
            .post_2010()
            .into_iter()
            .filter_map(|r| r.statement(kind))
            .collect();
        if statements.is_empty() {
            return None;
        }

        let years: BTreeSet<i32> = statements.iter().flat_map(|s| s.years.iter().copied()).collect();
        let years: Vec<i32> = years.into_iter().rev().collect();
        let columns = years.iter().map(ToString::to_string).collect();
        let mut builder = TableBuilder::new(kind.label(), CellFormat::Amount, columns);

        for statement in statements {
            let mut seen = Occurrences::default();
            for account in &statement.accounts {
                let key = match (&account.code, kind) {
                    (Some(code), StatementKind::Equity) => RowKey::Code(code.clone()),
                    _ => seen.key(&account.name),
                };
                let row = builder.row(key, account.code.as_deref(), &account.name);
                for (year, value) in &account.values {
                    if let Some(col) = years.iter().position(|y| y == year) {
                        builder.fill(row, col, Some(*value));
                    }
                }
            }
        }
        Some(builder.finish())
    }

    /// Vertical analysis of every post-2010 report, newest first, one per document year.
    pub fn vertical_analyses(&self) -> Vec<VerticalAnalysis> {
        let mut years = BTreeSet::new();
        self.post_2010()
            .into_iter()
            .filter(|r| years.insert(r.meta.year))
            .map(VerticalAnalysis::from_report)
            .collect()
    }

    /// Vertical analyses side by side, one column per document year.
    ///
    /// A section is only built when every post-2010 report provides it.
    pub fn consolidate_vertical(&self) -> ConsolidatedVertical {
        let analyses = self.vertical_analyses();
        let assets = consolidate_lines(&analyses, "Vertical analysis: assets", |a| {
            a.balance.as_ref().map(|b| b.assets.as_slice())
        });
        let liabilities = consolidate_lines(&analyses, "Vertical analysis: liabilities", |a| {
            a.balance.as_ref().map(|b| b.liabilities.as_slice())
        });
        let income = consolidate_lines(&analyses, "Vertical analysis: income statement", |a| {
            a.income.as_ref().map(|s| s.lines.as_slice())
        });
        let cash_flow = consolidate_lines(&analyses, "Vertical analysis: cash flow", |a| {
            a.cash_flow.as_ref().map(|s| s.lines.as_slice())
        });
        ConsolidatedVertical {
            assets,
            liabilities,
            income,
            cash_flow,
        }
    }

    /// Horizontal analyses side by side, one `YYYY vs YYYY` column per report.
    pub fn consolidate_horizontal(&self) -> ConsolidatedHorizontal {
        let mut analyses: Vec<HorizontalAnalysis> = Vec::new();
        for report in self.post_2010() {
            if analyses.iter().any(|a| a.year == report.meta.year) {
                continue;
            }
            match HorizontalAnalysis::from_report(report) {
                Ok(analysis) => analyses.push(analysis),
                Err(err) => log::warn!("{err}"),
            }
        }
        ConsolidatedHorizontal {
            balance: consolidate_horizontal_table(&analyses, StatementKind::Balance),
            income: consolidate_horizontal_table(&analyses, StatementKind::Income),
            cash_flow: consolidate_horizontal_table(&analyses, StatementKind::CashFlow),
        }
    }

    /// Financial ratios over the set.
    ///
    /// # Errors
    ///
    /// [`ReportError::NoEligibleReports`] when no post-2010 report has a balance sheet.
    #[inline]
    pub fn ratios(&self) -> Result<RatioReport, ReportError> {
        RatioReport::from_reports(&self.reports)
    }
}

fn is_report_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            REPORT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

fn consolidate_lines<F>(
    analyses: &[VerticalAnalysis],
    title: &str,
    lines_of: F,
) -> Option<ConsolidatedTable>
where
    F: Fn(&VerticalAnalysis) -> Option<&[VerticalLine]>,
{
    if analyses.is_empty() {
        return None;
    }
    let sections: Vec<&[VerticalLine]> = analyses.iter().map(&lines_of).collect::<Option<_>>()?;
    let columns = analyses.iter().map(|a| a.year.to_string()).collect();
    let mut builder = TableBuilder::new(title, CellFormat::Percent, columns);

    for (col, lines) in sections.into_iter().enumerate() {
        let mut seen = Occurrences::default();
        for line in lines {
            let row = builder.row(seen.key(&line.account), None, &line.account);
            builder.fill(row, col, line.percent);
        }
    }
    Some(builder.finish())
}

fn consolidate_horizontal_table(
    analyses: &[HorizontalAnalysis],
    kind: StatementKind,
) -> Option<ConsolidatedTable> {
    let statements: Vec<&StatementHorizontal> = analyses
        .iter()
        .filter_map(|a| a.statements().find(|s| s.kind == kind))
        .collect();
    if statements.is_empty() {
        return None;
    }
    let columns = statements
        .iter()
        .map(|s| format!("{} vs {}", s.current_year, s.base_year))
        .collect();
    let mut builder = TableBuilder::new(
        format!("Horizontal analysis: {}", kind.label().to_lowercase()),
        CellFormat::Percent,
        columns,
    );

    for (col, statement) in statements.into_iter().enumerate() {
        let mut seen = Occurrences::default();
        for line in &statement.lines {
            let row = builder.row(seen.key(&line.account), None, &line.account);
            builder.fill(row, col, line.percent);
        }
    }
    Some(builder.finish())
}
