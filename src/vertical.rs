//! Vertical analysis: every line of a statement as a share of its section total.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::report::Report;
use crate::rules;
use crate::types::{Money, ReportFormat, Statement, StatementKind};
use crate::utils::{percent_of, rule_key};

/// One analysed line.
#[derive(Debug, Clone, Serialize)]
pub struct VerticalLine {
    /// Account name.
    pub account: String,
    /// Value in the analysis year.
    pub value: Money,
    /// Share of the base in percent; `None` when the base is zero.
    pub percent: Option<Decimal>,
    /// Row is a total or subtotal.
    pub is_total: bool,
    /// Row is the base the section is measured against.
    pub is_base: bool,
}

/// Balance sheet split into assets and liabilities.
#[derive(Debug, Clone, Serialize)]
pub struct BalanceVertical {
    /// Statement heading.
    pub title: String,
    /// Analysis year (most recent).
    pub year: i32,
    /// Base of the assets section.
    pub total_assets: Money,
    /// Base of the liabilities section, if the row exists.
    pub total_liabilities: Option<Money>,
    /// Asset rows up to and including total assets.
    pub assets: Vec<VerticalLine>,
    /// Liability rows up to and including total liabilities.
    pub liabilities: Vec<VerticalLine>,
}

/// Income or cash flow statement against its base rows.
#[derive(Debug, Clone, Serialize)]
pub struct StatementVertical {
    /// Statement kind.
    pub kind: StatementKind,
    /// Statement heading.
    pub title: String,
    /// Analysis year (most recent).
    pub year: i32,
    /// Names of the base rows, in document order.
    pub bases: Vec<String>,
    /// Every row of the statement.
    pub lines: Vec<VerticalLine>,
}

/// Vertical analysis of one report.
#[derive(Debug, Clone, Serialize)]
pub struct VerticalAnalysis {
    /// Document year.
    pub year: i32,
    /// Template of the report.
    pub format: ReportFormat,
    /// Company name.
    pub company: String,
    /// Balance sheet, when total assets are known and non-zero.
    pub balance: Option<BalanceVertical>,
    /// Income statement, when a revenue base is found.
    pub income: Option<StatementVertical>,
    /// Cash flow, when at least one section base is found.
    pub cash_flow: Option<StatementVertical>,
}

impl VerticalAnalysis {
    /// Runs the vertical analysis on every available statement.
    pub fn from_report(report: &Report) -> Self {
        let format = report.meta.format;
        let analysis = Self {
            year: report.meta.year,
            format,
            company: report.meta.company_or_default().to_string(),
            balance: report
                .balance
                .as_ref()
                .and_then(|s| BalanceVertical::from_statement(s, format)),
            income: report.income.as_ref().and_then(income_vertical),
            cash_flow: report.cash_flow.as_ref().and_then(cash_flow_vertical),
        };
        if analysis.balance.is_none() && report.balance.is_some() {
            log::warn!("{}: total assets missing or zero", analysis.company);
        }
        analysis
    }
}

impl BalanceVertical {
    /// Splits the balance sheet at the total rows of the given template.
    ///
    /// Returns `None` when total assets are missing or zero. When total liabilities are
    /// missing or zero the liabilities section is left empty.
    pub fn from_statement(statement: &Statement, format: ReportFormat) -> Option<Self> {
        let year = statement.latest_year()?;
        let keys: Vec<String> = statement.accounts.iter().map(|a| rule_key(&a.name)).collect();

        let total_assets = statement
            .accounts
            .iter()
            .zip(&keys)
            .find(|(_, key)| rules::is_total_assets(format, key))
            .map(|(account, _)| account.value(year))
            .filter(|value| !value.is_zero())?;
        let total_liabilities = statement
            .accounts
            .iter()
            .zip(&keys)
            .find(|(_, key)| rules::is_total_liabilities(format, key))
            .map(|(account, _)| account.value(year));

        let mut assets = Vec::new();
        let mut liabilities = Vec::new();
        let mut rows = statement.accounts.iter().zip(&keys);

        for (account, key) in rows.by_ref() {
            let is_base = rules::is_total_assets(format, key);
            let value = account.value(year);
            assets.push(VerticalLine {
                account: account.name.clone(),
                value,
                percent: percent_of(value, total_assets),
                is_total: account.is_total,
                is_base,
            });
            if is_base {
                break;
            }
        }

        if let Some(base) = total_liabilities.filter(|value| !value.is_zero()) {
            for (account, key) in rows {
                let is_base = rules::is_total_liabilities(format, key);
                let value = account.value(year);
                liabilities.push(VerticalLine {
                    account: account.name.clone(),
                    value,
                    percent: percent_of(value, base),
                    is_total: account.is_total,
                    is_base,
                });
                if is_base {
                    break;
                }
            }
        }

        Some(Self {
            title: statement.title.clone(),
            year,
            total_assets,
            total_liabilities,
            assets,
            liabilities,
        })
    }
}

/// Income statement against the first positive sales or revenue row near the top.
pub fn income_vertical(statement: &Statement) -> Option<StatementVertical> {
    let year = statement.latest_year()?;
    let (base_idx, base) = statement
        .accounts
        .iter()
        .take(rules::REVENUE_BASE_WINDOW)
        .enumerate()
        .find(|(_, a)| rules::is_revenue_base(&rule_key(&a.name)) && a.value(year) > Decimal::ZERO)?;
    let base_value = base.value(year);

    let lines = statement
        .accounts
        .iter()
        .enumerate()
        .map(|(idx, account)| {
            let value = account.value(year);
            VerticalLine {
                account: account.name.clone(),
                value,
                percent: percent_of(value, base_value),
                is_total: account.is_total,
                is_base: idx == base_idx,
            }
        })
        .collect();

    Some(StatementVertical {
        kind: statement.kind,
        title: statement.title.clone(),
        year,
        bases: vec![base.name.clone()],
        lines,
    })
}

/// Cash flow against the net cash row closing each activity section.
///
/// A row is measured against the first base at or below it; rows after the last base
/// use the last base.
pub fn cash_flow_vertical(statement: &Statement) -> Option<StatementVertical> {
    let year = statement.latest_year()?;
    let base_rows: Vec<usize> = statement
        .accounts
        .iter()
        .enumerate()
        .filter(|(_, a)| rules::is_cash_flow_base(&rule_key(&a.name)))
        .map(|(idx, _)| idx)
        .collect();
    let last_base = *base_rows.last()?;

    let lines = statement
        .accounts
        .iter()
        .enumerate()
        .map(|(idx, account)| {
            let base_idx = base_rows
                .iter()
                .copied()
                .find(|&b| b >= idx)
                .unwrap_or(last_base);
            let value = account.value(year);
            VerticalLine {
                account: account.name.clone(),
                value,
                percent: percent_of(value, statement.accounts[base_idx].value(year)),
                is_total: account.is_total,
                is_base: idx == base_idx,
            }
        })
        .collect();

    Some(StatementVertical {
        kind: statement.kind,
        title: statement.title.clone(),
        year,
        bases: base_rows
            .iter()
            .map(|&idx| statement.accounts[idx].name.clone())
            .collect(),
        lines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Account;
    use std::collections::BTreeMap;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn account(name: &str, value: &str) -> Account {
        Account {
            code: None,
            name: name.to_string(),
            note: String::new(),
            is_total: false,
            row: 0,
            values: BTreeMap::from([(2020, d(value))]),
        }
    }

    fn statement(kind: StatementKind, rows: &[(&str, &str)]) -> Statement {
        Statement {
            kind,
            title: "T".to_string(),
            years: vec![2020],
            accounts: rows.iter().map(|(n, v)| account(n, v)).collect(),
        }
    }

    #[test]
    fn zero_cash_flow_base_gives_no_percentage() {
        let s = statement(
            StatementKind::CashFlow,
            &[
                ("Cobranzas", "100"),
                ("Flujos de Efectivo Procedentes de Actividades de Operación", "0"),
            ],
        );
        let v = cash_flow_vertical(&s).unwrap();
        assert!(v.lines.iter().all(|l| l.percent.is_none()));
        assert!(v.lines[1].is_base);
    }

    #[test]
    fn zero_total_liabilities_leaves_section_empty() {
        let s = statement(
            StatementKind::Balance,
            &[
                ("Caja", "10"),
                ("Total de Activos", "10"),
                ("Deudas", "0"),
                ("Total Pasivos", "0"),
            ],
        );
        let v = BalanceVertical::from_statement(&s, ReportFormat::Post2010).unwrap();
        assert_eq!(v.assets.len(), 2);
        assert_eq!(v.assets[1].percent, Some(d("100")));
        assert!(v.liabilities.is_empty());
    }

    #[test]
    fn missing_total_assets_skips_balance() {
        let s = statement(StatementKind::Balance, &[("Caja", "10")]);
        assert!(BalanceVertical::from_statement(&s, ReportFormat::Post2010).is_none());
    }

    #[test]
    fn negative_revenue_is_not_a_base() {
        let s = statement(
            StatementKind::Income,
            &[("Costo de Ventas", "-50"), ("Ventas Netas", "200"), ("Utilidad", "20")],
        );
        let v = income_vertical(&s).unwrap();
        assert_eq!(v.bases, vec!["Ventas Netas".to_string()]);
        assert_eq!(v.lines[0].percent, Some(d("-25")));
        assert_eq!(v.lines[2].percent, Some(d("10")));
    }
}
