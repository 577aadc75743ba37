//! Plain-text dashboard: aligned tables for the terminal.

use crate::export::format_ratio_value;
use crate::horizontal::{HorizontalAnalysis, StatementHorizontal, Variation};
use crate::ratios::{RatioKind, RatioReport};
use crate::report::Report;
use crate::table::ConsolidatedTable;
use crate::types::{Statement, StatementKind};
use crate::utils::{format_amount, format_percent};
use crate::vertical::{VerticalAnalysis, VerticalLine};

/// Lays out a grid: first column left-aligned, the rest right-aligned.
pub fn grid(header: &[String], rows: &[Vec<String>]) -> String {
    let columns = header.len().max(rows.iter().map(Vec::len).max().unwrap_or(0));
    let mut widths = vec![0usize; columns];
    for row in std::iter::once(header).chain(rows.iter().map(Vec::as_slice)) {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    let render = |row: &[String]| {
        let cells: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(idx, &width)| {
                let cell = row.get(idx).map_or("", String::as_str);
                if idx == 0 {
                    format!("{cell:<width$}")
                } else {
                    format!("{cell:>width$}")
                }
            })
            .collect();
        cells.join("  ").trim_end().to_string()
    };

    let rule = "-".repeat(widths.iter().sum::<usize>() + 2 * columns.saturating_sub(1));
    let mut lines = vec![render(header), rule];
    lines.extend(rows.iter().map(|row| render(row)));
    lines.join("\n")
}

fn owned(cells: &[&str]) -> Vec<String> {
    cells.iter().map(ToString::to_string).collect()
}

/// Report header, loaded statements, balance check and warnings.
pub fn render_summary(report: &Report) -> String {
    let meta = &report.meta;
    let mut out = vec![
        format!("Company: {}", meta.company_or_default()),
        format!(
            "Type: {}  Period: {}",
            meta.report_type.as_deref().unwrap_or("-"),
            meta.period.as_deref().unwrap_or("-")
        ),
        format!("Year: {} ({} template)", meta.year, meta.format),
        String::new(),
    ];

    let rows: Vec<Vec<String>> = StatementKind::ALL
        .into_iter()
        .filter_map(|kind| report.statement(kind))
        .map(|s| {
            let years: Vec<String> = s.years.iter().map(ToString::to_string).collect();
            vec![s.title.clone(), s.accounts.len().to_string(), years.join(", ")]
        })
        .collect();
    out.push(grid(&owned(&["Statement", "Rows", "Years"]), &rows));

    if let Some(check) = &report.balance_check {
        out.push(String::new());
        out.push(format!(
            "Balance check {}: assets {} = liabilities {} + equity {} -> {} (difference {})",
            check.year,
            format_amount(check.total_assets),
            format_amount(check.total_liabilities),
            format_amount(check.total_equity),
            if check.is_balanced { "OK" } else { "MISMATCH" },
            format_amount(check.difference),
        ));
    }
    for warning in &report.warnings {
        out.push(format!("warning: {warning}"));
    }
    out.join("\n")
}

/// A statement with its values by year.
pub fn render_statement(statement: &Statement) -> String {
    let mut header = owned(&["Account", "Note"]);
    header.extend(statement.years.iter().map(ToString::to_string));
    let rows: Vec<Vec<String>> = statement
        .accounts
        .iter()
        .map(|account| {
            let mut row = vec![account.name.clone(), account.note.clone()];
            row.extend(statement.years.iter().map(|y| format_amount(account.value(*y))));
            row
        })
        .collect();
    format!("{}\n{}", statement.title, grid(&header, &rows))
}

fn vertical_rows(lines: &[VerticalLine]) -> Vec<Vec<String>> {
    lines
        .iter()
        .map(|line| {
            let marker = if line.is_base { " *" } else { "" };
            vec![
                format!("{}{marker}", line.account),
                format_amount(line.value),
                format_percent(line.percent),
            ]
        })
        .collect()
}

/// Vertical analysis of one report; base rows are marked with `*`.
pub fn render_vertical(analysis: &VerticalAnalysis) -> String {
    let header = |year: i32| owned(&["Account", year.to_string().as_str(), "%"]);
    let mut out = vec![format!("{} - vertical analysis {}", analysis.company, analysis.year)];
    if let Some(balance) = &analysis.balance {
        out.push(format!("\n{} - assets", balance.title));
        out.push(grid(&header(balance.year), &vertical_rows(&balance.assets)));
        if !balance.liabilities.is_empty() {
            out.push(format!("\n{} - liabilities", balance.title));
            out.push(grid(&header(balance.year), &vertical_rows(&balance.liabilities)));
        }
    }
    for statement in [&analysis.income, &analysis.cash_flow].into_iter().flatten() {
        out.push(format!("\n{}", statement.title));
        out.push(grid(&header(statement.year), &vertical_rows(&statement.lines)));
    }
    out.join("\n")
}

const fn variation_label(variation: Variation) -> &'static str {
    match variation {
        Variation::Increase => "up",
        Variation::Decrease => "down",
        Variation::Unchanged => "=",
        Variation::NotComputable => "n/c",
    }
}

fn render_statement_horizontal(statement: &StatementHorizontal) -> String {
    let header = owned(&[
        "Account",
        statement.base_year.to_string().as_str(),
        statement.current_year.to_string().as_str(),
        "Change",
        "%",
        "",
    ]);
    let rows: Vec<Vec<String>> = statement
        .lines
        .iter()
        .map(|line| {
            vec![
                line.account.clone(),
                format_amount(line.base_value),
                format_amount(line.current_value),
                format_amount(line.change),
                format_percent(line.percent),
                variation_label(line.variation).to_string(),
            ]
        })
        .collect();
    let s = statement.stats;
    format!(
        "{}\n{}\nup {} / down {} / unchanged {} / not computable {}",
        statement.title,
        grid(&header, &rows),
        s.increases,
        s.decreases,
        s.unchanged,
        s.not_computable
    )
}

/// Horizontal analysis of one report.
pub fn render_horizontal(analysis: &HorizontalAnalysis) -> String {
    let mut out = vec![format!(
        "{} - horizontal analysis {}",
        analysis.company, analysis.year
    )];
    out.extend(
        analysis
            .statements()
            .map(|s| format!("\n{}", render_statement_horizontal(s))),
    );
    out.push(format!("\n{} lines analysed", analysis.stats.total()));
    out.join("\n")
}

/// Ratios by year followed by min, max and mean.
pub fn render_ratios(ratios: &RatioReport) -> String {
    let mut header = owned(&["Ratio"]);
    header.extend(ratios.years.iter().map(ToString::to_string));
    header.extend(owned(&["Min", "Max", "Mean"]));

    let rows: Vec<Vec<String>> = RatioKind::ALL
        .into_iter()
        .map(|kind| {
            let mut row = vec![kind.label().to_string()];
            row.extend(
                ratios
                    .series(kind)
                    .into_iter()
                    .map(|(_, v)| format_ratio_value(kind, v)),
            );
            let summary = ratios.summary.get(&kind);
            row.push(format_ratio_value(kind, summary.map(|s| s.min)));
            row.push(format_ratio_value(kind, summary.map(|s| s.max)));
            row.push(format_ratio_value(kind, summary.map(|s| s.mean)));
            row
        })
        .collect();
    format!("{} - financial ratios\n{}", ratios.company, grid(&header, &rows))
}

/// A consolidated table; with `top` only the rows with the largest mean are kept.
pub fn render_table(table: &ConsolidatedTable, top: Option<usize>) -> String {
    let mut header = owned(&["Account"]);
    header.extend(table.columns.iter().cloned());
    let selected: Vec<_> = match top {
        Some(n) => table.top_by_mean_abs(n),
        None => table.rows.iter().collect(),
    };
    let rows: Vec<Vec<String>> = selected
        .into_iter()
        .map(|row| {
            let mut cells = vec![row.account.clone()];
            cells.extend(row.cells.iter().map(|c| table.format.format(*c)));
            cells
        })
        .collect();
    format!("{}\n{}", table.title, grid(&header, &rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_aligns_columns() {
        let text = grid(
            &owned(&["Account", "2023"]),
            &[owned(&["Caja", "1,000"]), owned(&["Inventarios", "50"])],
        );
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Account       2023");
        assert_eq!(lines[1], "------------------");
        assert_eq!(lines[2], "Caja         1,000");
        assert_eq!(lines[3], "Inventarios     50");
    }
}
