//! Consolidated tables: one row per account, one column per year or comparison.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::utils::{format_amount, format_percent, format_ratio, rule_key};

/// How the cells of a table are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CellFormat {
    /// Amounts with thousands separators.
    Amount,
    /// Percentages with two decimals.
    Percent,
    /// Plain ratios with two decimals.
    Ratio,
}

impl CellFormat {
    /// Formats one cell; missing cells print as `N/A`, or empty for amounts.
    pub fn format(self, value: Option<Decimal>) -> String {
        match self {
            Self::Amount => value.map(format_amount).unwrap_or_default(),
            Self::Percent => format_percent(value),
            Self::Ratio => format_ratio(value),
        }
    }
}

/// One account across columns.
#[derive(Debug, Clone, Serialize)]
pub struct ConsolidatedRow {
    /// Account code, equity statement only.
    pub code: Option<String>,
    /// Account name as first seen.
    pub account: String,
    /// One cell per column, `None` where no report provides a value.
    pub cells: Vec<Option<Decimal>>,
}

impl ConsolidatedRow {
    /// Mean of the absolute values of the present cells.
    pub fn mean_abs(&self) -> Option<Decimal> {
        let present: Vec<Decimal> = self.cells.iter().flatten().map(|v| v.abs()).collect();
        if present.is_empty() {
            return None;
        }
        let count = Decimal::from(present.len());
        Some(present.into_iter().sum::<Decimal>() / count)
    }
}

/// Table of accounts by column.
#[derive(Debug, Clone, Serialize)]
pub struct ConsolidatedTable {
    /// Table title.
    pub title: String,
    /// Cell format.
    pub format: CellFormat,
    /// Column labels, most recent first.
    pub columns: Vec<String>,
    /// Rows in first-appearance order.
    pub rows: Vec<ConsolidatedRow>,
}

impl ConsolidatedTable {
    /// First row whose account name matches, ignoring case, accents and spacing.
    pub fn row(&self, account: &str) -> Option<&ConsolidatedRow> {
        let key = rule_key(account);
        self.rows.iter().find(|r| rule_key(&r.account) == key)
    }

    /// All rows whose account name matches.
    pub fn rows_named<'a>(&'a self, account: &str) -> impl Iterator<Item = &'a ConsolidatedRow> {
        let key = rule_key(account);
        self.rows
            .iter()
            .filter(move |r| rule_key(&r.account) == key)
    }

    /// Position of a column label.
    pub fn column(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == label)
    }

    /// Rows with the largest mean absolute value, used to pick trend lines.
    ///
    /// Ties keep document order; rows without values are skipped.
    pub fn top_by_mean_abs(&self, n: usize) -> Vec<&ConsolidatedRow> {
        let mut ranked: Vec<(Decimal, &ConsolidatedRow)> = self
            .rows
            .iter()
            .filter_map(|row| row.mean_abs().map(|mean| (mean, row)))
            .collect();
        ranked.sort_by(|a, b| b.0.cmp(&a.0));
        ranked.into_iter().take(n).map(|(_, row)| row).collect()
    }
}

/// Identity of a row across reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum RowKey {
    /// Equity rows are matched by account code.
    Code(String),
    /// Other rows by normalized name and its occurrence within the statement.
    Name(String, usize),
}

/// Counts repeated account names within one statement.
#[derive(Debug, Default)]
pub(crate) struct Occurrences(HashMap<String, usize>);

impl Occurrences {
    /// Key of the next row with this name.
    pub(crate) fn key(&mut self, name: &str) -> RowKey {
        let name = rule_key(name);
        let seen = self.0.entry(name.clone()).or_insert(0);
        let key = RowKey::Name(name, *seen);
        *seen += 1;
        key
    }
}

/// Accumulates rows from several sources into a table with fixed columns.
#[derive(Debug)]
pub(crate) struct TableBuilder {
    table: ConsolidatedTable,
    index: HashMap<RowKey, usize>,
}

impl TableBuilder {
    pub(crate) fn new(title: impl Into<String>, format: CellFormat, columns: Vec<String>) -> Self {
        Self {
            table: ConsolidatedTable {
                title: title.into(),
                format,
                columns,
                rows: Vec::new(),
            },
            index: HashMap::new(),
        }
    }

    /// Row index for a key, appending an empty row the first time it is seen.
    pub(crate) fn row(&mut self, key: RowKey, code: Option<&str>, account: &str) -> usize {
        let width = self.table.columns.len();
        let rows = &mut self.table.rows;
        *self.index.entry(key).or_insert_with(|| {
            rows.push(ConsolidatedRow {
                code: code.map(str::to_string),
                account: account.to_string(),
                cells: vec![None; width],
            });
            rows.len() - 1
        })
    }

    /// Sets a cell unless an earlier source already filled it.
    pub(crate) fn fill(&mut self, row: usize, column: usize, value: Option<Decimal>) {
        if let Some(cell) = self.table.rows[row].cells.get_mut(column) {
            if cell.is_none() {
                *cell = value;
            }
        }
    }

    pub(crate) fn finish(self) -> ConsolidatedTable {
        self.table
    }
}
