//! CSV, XLSX and JSON exports of statements, consolidated tables and ratios.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::ReportError;
use crate::ratios::{RatioKind, RatioReport};
use crate::report::Report;
use crate::report_set::ReportSet;
use crate::table::ConsolidatedTable;
use crate::types::{Statement, StatementKind};
use crate::utils::{format_amount, format_percent, format_ratio};
use rust_decimal::Decimal;
use rust_xlsxwriter::Workbook;

fn finish<W: Write>(writer: csv::Writer<W>) -> Result<W, ReportError> {
    writer
        .into_inner()
        .map_err(|err| ReportError::Io(err.into_error()))
}

/// Header and formatted rows of a consolidated table.
///
/// A `Code` column is added when any row carries an account code.
fn table_records(table: &ConsolidatedTable) -> Vec<Vec<String>> {
    let with_codes = table.rows.iter().any(|r| r.code.is_some());

    let mut header: Vec<String> = Vec::with_capacity(table.columns.len() + 2);
    if with_codes {
        header.push("Code".to_string());
    }
    header.push("Account".to_string());
    header.extend(table.columns.iter().cloned());

    let mut records = Vec::with_capacity(table.rows.len() + 1);
    records.push(header);
    for row in &table.rows {
        let mut record: Vec<String> = Vec::with_capacity(table.columns.len() + 2);
        if with_codes {
            record.push(row.code.clone().unwrap_or_default());
        }
        record.push(row.account.clone());
        record.extend(row.cells.iter().map(|cell| table.format.format(*cell)));
        records.push(record);
    }
    records
}

/// Writes a consolidated table with formatted cells and returns the inner writer.
///
/// A `Code` column is added when any row carries an account code.
pub fn write_table_csv<W: Write>(writer: W, table: &ConsolidatedTable) -> Result<W, ReportError> {
    let mut csv = csv::Writer::from_writer(writer);
    for record in table_records(table) {
        csv.write_record(&record)?;
    }
    finish(csv)
}

/// Writes one statement as printed in the report.
pub fn write_statement_csv<W: Write>(writer: W, statement: &Statement) -> Result<W, ReportError> {
    let with_codes = statement.has_codes();
    let mut csv = csv::Writer::from_writer(writer);

    let mut header: Vec<String> = Vec::new();
    if with_codes {
        header.push("Code".to_string());
    }
    header.extend(["Account", "Note", "Total"].map(String::from));
    header.extend(statement.years.iter().map(ToString::to_string));
    csv.write_record(&header)?;

    for account in &statement.accounts {
        let mut record: Vec<String> = Vec::with_capacity(header.len());
        if with_codes {
            record.push(account.code.clone().unwrap_or_default());
        }
        record.push(account.name.clone());
        record.push(account.note.clone());
        record.push(if account.is_total { "yes" } else { "" }.to_string());
        record.extend(
            statement
                .years
                .iter()
                .map(|year| format_amount(account.value(*year))),
        );
        csv.write_record(&record)?;
    }
    finish(csv)
}

/// Formats a ratio the way it is presented: margins and returns as percentages.
pub fn format_ratio_value(kind: RatioKind, value: Option<Decimal>) -> String {
    if kind.is_percentage() {
        format_percent(value.map(|v| v * Decimal::ONE_HUNDRED))
    } else {
        format_ratio(value)
    }
}

fn ratio_records(ratios: &RatioReport) -> Vec<Vec<String>> {
    let mut header = vec!["Ratio".to_string(), "Category".to_string()];
    header.extend(ratios.years.iter().map(ToString::to_string));
    header.extend(["Min", "Max", "Mean"].map(String::from));

    let mut records = vec![header];
    for kind in RatioKind::ALL {
        let mut record = vec![kind.label().to_string(), kind.category().label().to_string()];
        record.extend(
            ratios
                .series(kind)
                .into_iter()
                .map(|(_, value)| format_ratio_value(kind, value)),
        );
        let summary = ratios.summary.get(&kind);
        record.push(format_ratio_value(kind, summary.map(|s| s.min)));
        record.push(format_ratio_value(kind, summary.map(|s| s.max)));
        record.push(format_ratio_value(kind, summary.map(|s| s.mean)));
        records.push(record);
    }
    records
}

/// Writes the ratio report: one row per ratio, one column per year, then min/max/mean.
pub fn write_ratios_csv<W: Write>(writer: W, ratios: &RatioReport) -> Result<W, ReportError> {
    let mut csv = csv::Writer::from_writer(writer);
    for record in ratio_records(ratios) {
        csv.write_record(&record)?;
    }
    finish(csv)
}

/// Writes consolidated tables to an XLSX workbook, one sheet per table.
///
/// Cells hold the same formatted text as the CSV exports. The ratios, when given, go
/// to a last sheet named `ratios`. Sheet names must be unique and at most 31
/// characters long.
pub fn write_workbook(
    path: &Path,
    sheets: &[(&str, &ConsolidatedTable)],
    ratios: Option<&RatioReport>,
) -> Result<(), ReportError> {
    let mut workbook = Workbook::new();
    let ratio_sheet = ratios.map(|ratios| ("ratios", ratio_records(ratios)));
    let all = sheets
        .iter()
        .map(|(name, table)| (*name, table_records(table)))
        .chain(ratio_sheet);

    for (name, records) in all {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(name)?;
        for (row, record) in (0u32..).zip(&records) {
            for (col, cell) in (0u16..).zip(record) {
                worksheet.write_string(row, col, cell.as_str())?;
            }
        }
    }
    workbook.save(path)?;
    Ok(())
}

/// Writes a parsed report as pretty JSON.
pub fn write_report_json<W: Write>(writer: W, report: &Report) -> Result<(), ReportError> {
    serde_json::to_writer_pretty(writer, report)?;
    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<File>, ReportError> {
    Ok(BufWriter::new(File::create(path)?))
}

fn save_table(dir: &Path, name: &str, table: &ConsolidatedTable) -> Result<PathBuf, ReportError> {
    let path = dir.join(name);
    write_table_csv(create(&path)?, table)?.flush()?;
    Ok(path)
}

/// Exports everything a set offers into a directory and returns the files written.
///
/// Writes one JSON file per report, consolidated values per statement, consolidated
/// vertical and horizontal tables, and the ratios when any report qualifies. The same
/// tables also go to `consolidated.xlsx`, one sheet each.
pub fn export_set(set: &ReportSet, dir: &Path) -> Result<Vec<PathBuf>, ReportError> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    for (idx, report) in set.reports.iter().enumerate() {
        let path = dir.join(format!("report_{:02}_{}.json", idx + 1, report.meta.year));
        let mut file = create(&path)?;
        write_report_json(&mut file, report)?;
        file.flush()?;
        written.push(path);
    }

    let mut tables: Vec<(String, ConsolidatedTable)> = StatementKind::ALL
        .into_iter()
        .filter_map(|kind| {
            set.consolidate_values(kind)
                .map(|table| (format!("values_{}", kind.key()), table))
        })
        .collect();

    let vertical = set.consolidate_vertical();
    let horizontal = set.consolidate_horizontal();
    for (name, table) in [
        ("vertical_assets", vertical.assets),
        ("vertical_liabilities", vertical.liabilities),
        ("vertical_income", vertical.income),
        ("vertical_cash_flow", vertical.cash_flow),
        ("horizontal_balance", horizontal.balance),
        ("horizontal_income", horizontal.income),
        ("horizontal_cash_flow", horizontal.cash_flow),
    ] {
        if let Some(table) = table {
            tables.push((name.to_string(), table));
        }
    }

    for (name, table) in &tables {
        written.push(save_table(dir, &format!("{name}.csv"), table)?);
    }

    let ratios = match set.ratios() {
        Ok(ratios) => {
            let path = dir.join("ratios.csv");
            write_ratios_csv(create(&path)?, &ratios)?.flush()?;
            written.push(path);
            Some(ratios)
        }
        Err(ReportError::NoEligibleReports) => {
            log::info!("no ratios to export");
            None
        }
        Err(err) => return Err(err),
    };

    if !tables.is_empty() || ratios.is_some() {
        let path = dir.join("consolidated.xlsx");
        let sheets: Vec<(&str, &ConsolidatedTable)> = tables
            .iter()
            .map(|(name, table)| (name.as_str(), table))
            .collect();
        write_workbook(&path, &sheets, ratios.as_ref())?;
        written.push(path);
    }

    log::debug!("exported {} files to {}", written.len(), dir.display());
    Ok(written)
}
