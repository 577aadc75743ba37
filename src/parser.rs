//! Extraction of statement tables and header data from the report DOM.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::error::ReportError;
use crate::raw::DomReport;
use crate::rules;
use crate::types::{
    Account, BalanceCheck, ReportFormat, ReportMetadata, Statement, StatementKind,
};
use crate::utils::{collect_text, find_year, parse_amount, rule_key, years_in};
use regex::Regex;
use rust_decimal::Decimal;
use scraper::{ElementRef, Selector};

/// Characters of document text searched before falling back to the whole text.
const HEADER_WINDOW: usize = 500;

static YEAR_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\ba(?:ñ|n|\x{FFFD})o\s*:\s*(\d{4})").expect("valid year label regex")
});

static COMPANY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)empresa\s*:\s*(.+?)\s*(?:tipo\s*:|per[ií]odo\s*:|a(?:ñ|n|\x{FFFD})o\s*:|$)")
        .expect("valid company regex")
});

static SPAN_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span").expect("valid span selector"));
static DIV_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div").expect("valid div selector"));
static TR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("valid tr selector"));
static TD_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("valid td selector"));
static TH_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th").expect("valid th selector"));

/// Header row of a statement table: its index and the text of its cells.
struct HeaderRow {
    index: usize,
    cells: Vec<String>,
}

impl DomReport {
    /// Reads company, type, period and document year from the report header.
    ///
    /// `year_override` skips detection. Detected years must be strictly below `cutoff`.
    pub fn meta(
        &self,
        year_override: Option<i32>,
        cutoff: i32,
    ) -> Result<ReportMetadata, ReportError> {
        let full_text = collect_text(self.doc.root_element());
        let year = match year_override {
            Some(year) => year,
            None => self.detect_year(&full_text, cutoff)?,
        };

        let company = self.labelled("Empresa:").or_else(|| {
            COMPANY_RE
                .captures(&full_text)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim().to_string())
                .filter(|s| !s.is_empty())
        });

        let lower = full_text.to_lowercase();
        let report_type = self.labelled("Tipo:").or_else(|| {
            if lower.contains("consolidado") {
                Some("Consolidado".to_string())
            } else if lower.contains("individual") {
                Some("Individual".to_string())
            } else {
                None
            }
        });
        let period = self
            .labelled("Periodo:")
            .or_else(|| self.labelled("Período:"))
            .or_else(|| {
                if lower.contains("trimestral") {
                    Some("Trimestral".to_string())
                } else if lower.contains("anual") {
                    Some("Anual".to_string())
                } else {
                    None
                }
            });

        Ok(ReportMetadata {
            company,
            report_type,
            period,
            year,
            format: ReportFormat::from_year(year),
        })
    }

    fn detect_year(&self, full_text: &str, cutoff: i32) -> Result<i32, ReportError> {
        let labelled = YEAR_LABEL_RE
            .captures(full_text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<i32>().ok())
            .filter(|year| *year < cutoff);
        if let Some(year) = labelled {
            return Ok(year);
        }

        let head: String = full_text.chars().take(HEADER_WINDOW).collect();
        let year = years_in(&head)
            .filter(|year| *year < cutoff)
            .max()
            .or_else(|| years_in(full_text).filter(|year| *year < cutoff).max())
            .ok_or(ReportError::MissingField { field: "year" })?;
        log::debug!("document year {year} inferred from report text");
        Ok(year)
    }

    /// Text after a label in the innermost `div` that starts with it.
    fn labelled(&self, label: &str) -> Option<String> {
        self.doc
            .select(&DIV_SELECTOR)
            .filter(|div| {
                !div.children()
                    .filter_map(ElementRef::wrap)
                    .any(|child| child.value().name() == "div")
            })
            .map(collect_text)
            .find_map(|text| {
                text.strip_prefix(label)
                    .map(|rest| rest.trim().to_string())
            })
            .filter(|value| !value.is_empty())
    }

    /// Finds the table that follows a bold heading with the given title.
    ///
    /// Exact matches on the normalized text win; containment either way is accepted next.
    pub fn find_statement_table(&self, title: &'static str) -> Result<ElementRef<'_>, ReportError> {
        let wanted = rule_key(title);
        let headings: Vec<(ElementRef<'_>, String)> = self
            .doc
            .select(&SPAN_SELECTOR)
            .filter(|span| is_bold(*span))
            .map(|span| (span, rule_key(&collect_text(span))))
            .filter(|(_, key)| !key.is_empty())
            .collect();

        let heading = headings
            .iter()
            .find(|(_, key)| *key == wanted)
            .or_else(|| {
                headings
                    .iter()
                    .find(|(_, key)| key.contains(&wanted) || wanted.contains(key.as_str()))
            })
            .map(|(span, _)| *span)
            .ok_or(ReportError::StatementNotFound { title })?;

        self.doc
            .root_element()
            .descendants()
            .skip_while(|node| node.id() != heading.id())
            .skip(1)
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "table")
            .ok_or(ReportError::StatementNotFound { title })
    }

    /// Parses one statement of the report.
    ///
    /// The equity statement keeps account codes and only its total column, keyed by
    /// `doc_year`. Cells that are not numbers read as zero and are reported in
    /// `warnings`.
    pub fn parse_statement(
        &self,
        kind: StatementKind,
        title: &'static str,
        doc_year: i32,
        warnings: &mut Vec<String>,
    ) -> Result<Statement, ReportError> {
        let table = self.find_statement_table(title)?;
        let rows: Vec<ElementRef<'_>> = table.select(&TR_SELECTOR).collect();
        let is_equity = kind == StatementKind::Equity;
        let header = header_row(&rows, !is_equity).ok_or(ReportError::MissingField {
            field: "header row",
        })?;

        let (years, accounts) = if is_equity {
            (
                vec![doc_year],
                equity_accounts(&rows, &header, doc_year, warnings),
            )
        } else {
            year_accounts(&rows, &header, warnings)?
        };

        log::debug!("{title}: {} rows, years {years:?}", accounts.len());
        Ok(Statement {
            kind,
            title: title.to_string(),
            years,
            accounts,
        })
    }
}

fn is_bold(span: ElementRef<'_>) -> bool {
    span.value().attr("style").is_some_and(|style| {
        let compact: String = style
            .chars()
            .filter(|ch| !ch.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();
        compact.contains("font-weight:bold")
    })
}

fn has_class(cell: ElementRef<'_>, class: &str) -> bool {
    cell.value().classes().any(|c| c == class)
}

/// Header cells come from `th`; tables without them use the second row.
///
/// With `needs_years`, a `th` row without any year is skipped for the `td` row below it.
fn header_row(rows: &[ElementRef<'_>], needs_years: bool) -> Option<HeaderRow> {
    let th_row = rows
        .iter()
        .enumerate()
        .find(|(_, row)| row.select(&TH_SELECTOR).next().is_some());
    let mut fallback = 1;
    if let Some((index, row)) = th_row {
        let cells: Vec<String> = row.select(&TH_SELECTOR).map(collect_text).collect();
        if !needs_years || cells.iter().any(|cell| find_year(cell).is_some()) {
            return Some(HeaderRow { index, cells });
        }
        log::debug!("header row {index} has no years, trying the next row");
        fallback = index + 1;
    }
    rows.get(fallback).map(|row| HeaderRow {
        index: fallback,
        cells: row.select(&TD_SELECTOR).map(collect_text).collect(),
    })
}

/// Reads a cell amount; a malformed cell reads as zero and leaves a warning.
fn cell_amount(text: &str, account: &str, warnings: &mut Vec<String>) -> Decimal {
    parse_amount(text, account).unwrap_or_else(|err| {
        log::warn!("{err}, read as 0");
        warnings.push(format!("{err}, read as 0"));
        Decimal::ZERO
    })
}

fn year_accounts(
    rows: &[ElementRef<'_>],
    header: &HeaderRow,
    warnings: &mut Vec<String>,
) -> Result<(Vec<i32>, Vec<Account>), ReportError> {
    let year_cols: Vec<(usize, i32)> = header
        .cells
        .iter()
        .enumerate()
        .filter_map(|(col, text)| find_year(text).map(|year| (col, year)))
        .collect();
    if year_cols.is_empty() {
        return Err(ReportError::MissingField {
            field: "year columns",
        });
    }

    let mut accounts = Vec::new();
    for (row_idx, tr) in rows.iter().enumerate().skip(header.index + 1) {
        let cells: Vec<ElementRef<'_>> = tr.select(&TD_SELECTOR).collect();
        if cells.len() < 2 {
            continue;
        }
        let name = collect_text(cells[0]);
        if name.is_empty() {
            continue;
        }

        let mut values = BTreeMap::new();
        for &(col, year) in &year_cols {
            if let Some(cell) = cells.get(col) {
                values.insert(year, cell_amount(&collect_text(*cell), &name, warnings));
            }
        }
        if values.is_empty() {
            continue;
        }

        accounts.push(Account {
            code: None,
            is_total: has_class(cells[0], "pinta"),
            note: collect_text(cells[1]),
            name,
            row: row_idx,
            values,
        });
    }

    let mut years: Vec<i32> = year_cols.into_iter().map(|(_, year)| year).collect();
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();
    Ok((years, accounts))
}

fn equity_accounts(
    rows: &[ElementRef<'_>],
    header: &HeaderRow,
    doc_year: i32,
    warnings: &mut Vec<String>,
) -> Vec<Account> {
    let keys: Vec<String> = header.cells.iter().map(|c| rule_key(c)).collect();
    let code_col = keys.iter().position(|k| k == "CCUENTA").unwrap_or(0);
    let name_col = keys
        .iter()
        .enumerate()
        .position(|(col, k)| {
            col != code_col && (k == "CUENTA" || (k.contains("CUENTA") && k.len() < 15))
        })
        .unwrap_or(1);
    let total_col = keys
        .iter()
        .position(|k| k.contains("TOTAL") && k.contains("PATRIMONIO"))
        .unwrap_or_else(|| keys.len().saturating_sub(1));

    let mut accounts = Vec::new();
    for (row_idx, tr) in rows.iter().enumerate().skip(header.index + 1) {
        let cells: Vec<ElementRef<'_>> = tr.select(&TD_SELECTOR).collect();
        if cells.len() < 3 {
            continue;
        }
        let Some(name) = cells
            .get(name_col)
            .map(|cell| collect_text(*cell))
            .filter(|name| !name.is_empty())
        else {
            continue;
        };
        let code = cells
            .get(code_col)
            .map(|cell| collect_text(*cell))
            .filter(|code| !code.is_empty());
        let amount = match cells.get(total_col) {
            Some(cell) => cell_amount(&collect_text(*cell), &name, warnings),
            None => Decimal::ZERO,
        };
        let key = rule_key(&name);

        accounts.push(Account {
            code,
            is_total: has_class(cells[0], "pinta")
                || key.contains("SALDOS")
                || key.contains("TOTAL"),
            note: String::new(),
            name,
            row: row_idx,
            values: BTreeMap::from([(doc_year, amount)]),
        });
    }
    accounts
}

/// Checks assets = liabilities + equity for the latest year of a balance sheet.
///
/// `None` when one of the three totals is missing.
pub fn balance_check(balance: &Statement, format: ReportFormat) -> Option<BalanceCheck> {
    let year = balance.latest_year()?;
    let find = |pred: &dyn Fn(&str) -> bool| {
        balance
            .accounts
            .iter()
            .find(|a| pred(&rule_key(&a.name)))
            .map(|a| a.value(year))
    };
    let total_assets = find(&|key: &str| rules::is_total_assets(format, key))?;
    let total_liabilities = find(&|key: &str| rules::is_total_liabilities(format, key))?;
    let total_equity = find(&rules::is_total_equity)?;

    let tolerance = rules::balance_tolerance();
    let difference = total_assets
        .saturating_sub(total_liabilities)
        .saturating_sub(total_equity)
        .abs();
    Some(BalanceCheck {
        year,
        total_assets,
        total_liabilities,
        total_equity,
        difference,
        tolerance,
        is_balanced: difference <= total_assets.abs().saturating_mul(tolerance),
    })
}
