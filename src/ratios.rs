//! Financial ratios of post-2010 reports.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::ReportError;
use crate::report::Report;
use crate::rules;
use crate::types::{Money, ReportFormat, Statement};
use crate::utils::{ratio, rule_key};

/// Ratio family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum RatioCategory {
    /// Short-term solvency.
    Liquidity,
    /// Financing structure.
    Leverage,
    /// Returns.
    Profitability,
    /// Asset efficiency.
    Activity,
}

impl RatioCategory {
    /// Human-readable label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Liquidity => "Liquidity",
            Self::Leverage => "Leverage",
            Self::Profitability => "Profitability",
            Self::Activity => "Activity",
        }
    }
}

/// Computed ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioKind {
    /// Current assets / current liabilities.
    CurrentRatio,
    /// (Current assets − inventories) / current liabilities.
    QuickRatio,
    /// Total liabilities / total assets.
    DebtRatio,
    /// Total liabilities / total equity.
    DebtToEquity,
    /// Net income / revenue.
    NetMargin,
    /// Net income / total assets.
    ReturnOnAssets,
    /// Net income / total equity.
    ReturnOnEquity,
    /// Revenue / total assets.
    AssetTurnover,
    /// Revenue / average trade receivables.
    ReceivablesTurnover,
    /// Cost of sales / average inventories.
    InventoryTurnover,
}

impl RatioKind {
    /// Every ratio in presentation order.
    pub const ALL: [Self; 10] = [
        Self::CurrentRatio,
        Self::QuickRatio,
        Self::DebtRatio,
        Self::DebtToEquity,
        Self::NetMargin,
        Self::ReturnOnAssets,
        Self::ReturnOnEquity,
        Self::AssetTurnover,
        Self::ReceivablesTurnover,
        Self::InventoryTurnover,
    ];

    /// Short machine-friendly key.
    pub const fn key(self) -> &'static str {
        match self {
            Self::CurrentRatio => "current_ratio",
            Self::QuickRatio => "quick_ratio",
            Self::DebtRatio => "debt_ratio",
            Self::DebtToEquity => "debt_to_equity",
            Self::NetMargin => "net_margin",
            Self::ReturnOnAssets => "roa",
            Self::ReturnOnEquity => "roe",
            Self::AssetTurnover => "asset_turnover",
            Self::ReceivablesTurnover => "receivables_turnover",
            Self::InventoryTurnover => "inventory_turnover",
        }
    }

    /// Human-readable label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::CurrentRatio => "Current ratio",
            Self::QuickRatio => "Quick ratio",
            Self::DebtRatio => "Debt ratio",
            Self::DebtToEquity => "Debt to equity",
            Self::NetMargin => "Net margin",
            Self::ReturnOnAssets => "ROA",
            Self::ReturnOnEquity => "ROE",
            Self::AssetTurnover => "Asset turnover",
            Self::ReceivablesTurnover => "Receivables turnover",
            Self::InventoryTurnover => "Inventory turnover",
        }
    }

    /// Family of the ratio.
    pub const fn category(self) -> RatioCategory {
        match self {
            Self::CurrentRatio | Self::QuickRatio => RatioCategory::Liquidity,
            Self::DebtRatio | Self::DebtToEquity => RatioCategory::Leverage,
            Self::NetMargin | Self::ReturnOnAssets | Self::ReturnOnEquity => {
                RatioCategory::Profitability
            }
            Self::AssetTurnover | Self::ReceivablesTurnover | Self::InventoryTurnover => {
                RatioCategory::Activity
            }
        }
    }

    /// Margins and returns read better as percentages.
    pub const fn is_percentage(self) -> bool {
        matches!(self.category(), RatioCategory::Profitability) || matches!(self, Self::DebtRatio)
    }
}

/// Figures the ratios of one year are computed from.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RatioInputs {
    /// Total assets.
    pub total_assets: Money,
    /// Total current assets.
    pub current_assets: Money,
    /// Inventories inside the current assets block.
    pub inventories: Money,
    /// Total liabilities.
    pub total_liabilities: Money,
    /// Total current liabilities.
    pub current_liabilities: Money,
    /// Total equity.
    pub total_equity: Money,
    /// Net income, signed.
    pub net_income: Option<Money>,
    /// Revenue from ordinary activities.
    pub revenue: Option<Money>,
    /// Cost of sales.
    pub cost_of_sales: Option<Money>,
    /// Average trade receivables over this and the prior year.
    pub average_receivables: Option<Money>,
    /// Average inventories over this and the prior year.
    pub average_inventories: Option<Money>,
}

/// Ratios of one year.
#[derive(Debug, Clone, Serialize)]
pub struct RatioSet {
    /// Analysis year.
    pub year: i32,
    /// Figures used.
    pub inputs: RatioInputs,
    /// Ratios that could be computed.
    pub values: BTreeMap<RatioKind, Decimal>,
}

impl RatioSet {
    /// Value of a ratio, `None` when it could not be computed.
    #[inline]
    pub fn get(&self, kind: RatioKind) -> Option<Decimal> {
        self.values.get(&kind).copied()
    }

    /// Computes the ratios of the latest year of a balance sheet.
    ///
    /// Returns `None` when total assets or total liabilities are missing or zero.
    pub fn compute(balance: &Statement, income: Option<&Statement>) -> Option<Self> {
        let year = balance.latest_year()?;
        let mut inputs = balance_inputs(balance, year);
        if inputs.total_assets.is_zero() || inputs.total_liabilities.is_zero() {
            return None;
        }
        if let Some(income) = income {
            let find = |pred: fn(&str) -> bool| {
                income
                    .accounts
                    .iter()
                    .find(|a| pred(&rule_key(&a.name)))
                    .map(|a| a.value(year))
            };
            inputs.net_income = net_income(income, year);
            inputs.revenue = find(rules::is_ordinary_revenue).map(|v| v.abs());
            inputs.cost_of_sales = find(rules::is_cost_of_sales).map(|v| v.abs());
        }
        if let Some(prior) = balance.years.iter().copied().filter(|y| *y < year).max() {
            inputs.average_receivables = average_receivables(balance, year, prior);
            inputs.average_inventories = average_inventories(balance, year, prior);
        }

        let mut values: BTreeMap<RatioKind, Decimal> = BTreeMap::new();
        let mut put = |kind: RatioKind, value: Option<Decimal>| {
            if let Some(value) = value {
                values.insert(kind, value);
            }
        };
        let i = &inputs;
        if !i.current_assets.is_zero() {
            put(RatioKind::CurrentRatio, ratio(i.current_assets, i.current_liabilities));
            put(
                RatioKind::QuickRatio,
                ratio(i.current_assets.saturating_sub(i.inventories), i.current_liabilities),
            );
        }
        put(RatioKind::DebtRatio, ratio(i.total_liabilities, i.total_assets));
        put(RatioKind::DebtToEquity, ratio(i.total_liabilities, i.total_equity));
        if let Some(net) = i.net_income {
            put(RatioKind::NetMargin, i.revenue.and_then(|rev| ratio(net, rev)));
            put(RatioKind::ReturnOnAssets, ratio(net, i.total_assets));
            put(RatioKind::ReturnOnEquity, ratio(net, i.total_equity));
        }
        if let Some(revenue) = i.revenue.filter(|rev| !rev.is_zero()) {
            put(RatioKind::AssetTurnover, ratio(revenue, i.total_assets));
            put(
                RatioKind::ReceivablesTurnover,
                i.average_receivables.and_then(|avg| ratio(revenue, avg)),
            );
            put(
                RatioKind::InventoryTurnover,
                i.cost_of_sales
                    .filter(|cost| !cost.is_zero())
                    .zip(i.average_inventories)
                    .and_then(|(cost, avg)| ratio(cost, avg)),
            );
        }

        Some(Self {
            year,
            inputs,
            values,
        })
    }
}

/// Totals of the balance sheet; the first matching row wins.
fn balance_inputs(balance: &Statement, year: i32) -> RatioInputs {
    let mut inputs = RatioInputs::default();
    let mut seen = [false; 6];
    let mut in_current_assets = false;
    let format = ReportFormat::Post2010;

    for account in &balance.accounts {
        let key = rule_key(&account.name);
        let value = account.value(year).abs();

        if rules::opens_current_assets(&key) {
            in_current_assets = true;
            continue;
        }
        if in_current_assets && rules::closes_current_assets(&key) {
            in_current_assets = false;
        }

        let slot = if rules::is_total_assets(format, &key) {
            Some((0, &mut inputs.total_assets))
        } else if rules::is_total_current_assets(&key) {
            Some((1, &mut inputs.current_assets))
        } else if in_current_assets
            && rules::is_inventory(&key)
            && account.value(year) > Decimal::ZERO
        {
            Some((2, &mut inputs.inventories))
        } else if rules::is_total_liabilities(format, &key) {
            Some((3, &mut inputs.total_liabilities))
        } else if rules::is_total_current_liabilities(&key) {
            Some((4, &mut inputs.current_liabilities))
        } else if rules::is_total_equity(&key) {
            Some((5, &mut inputs.total_equity))
        } else {
            None
        };
        if let Some((idx, field)) = slot {
            if !seen[idx] {
                seen[idx] = true;
                *field = value;
            }
        }
    }
    inputs
}

/// Net income of the year.
///
/// Statements with discontinued operations print several net results; the row for the
/// whole year wins, else the last matching row.
fn net_income(income: &Statement, year: i32) -> Option<Money> {
    let matches: Vec<_> = income
        .accounts
        .iter()
        .filter(|a| rules::is_net_income(&rule_key(&a.name)))
        .collect();
    matches
        .iter()
        .find(|a| rules::is_net_income_for_year(&rule_key(&a.name)))
        .or_else(|| matches.last())
        .map(|a| a.value(year))
}

/// Average of the current and non-current trade receivables over two years.
///
/// Rows that also include other receivables are preferred (first and last of them);
/// otherwise the first two trade receivable rows are used.
fn average_receivables(balance: &Statement, year: i32, prior: i32) -> Option<Money> {
    let parts: Vec<(String, Money, Money)> = balance
        .accounts
        .iter()
        .map(|a| (rule_key(&a.name), a))
        .filter(|(key, _)| rules::is_trade_receivable(key))
        .map(|(key, a)| (key, a.value(year).abs(), a.value(prior).abs()))
        .collect();
    let full: Vec<&(String, Money, Money)> = parts
        .iter()
        .filter(|(key, ..)| rules::is_full_trade_receivable(key))
        .collect();

    let chosen: Vec<&(String, Money, Money)> = match full.as_slice() {
        [] => parts.iter().take(2).collect(),
        [only] => vec![*only],
        [first, .., last] => vec![*first, *last],
    };
    let sum: Money = chosen.iter().map(|(_, cur, prev)| *cur + *prev).sum();
    (!sum.is_zero()).then(|| sum / Decimal::TWO)
}

/// Average of all inventory rows over two years.
fn average_inventories(balance: &Statement, year: i32, prior: i32) -> Option<Money> {
    let sum: Money = balance
        .accounts
        .iter()
        .filter(|a| rules::is_inventory(&rule_key(&a.name)))
        .map(|a| a.value(year).abs() + a.value(prior).abs())
        .sum();
    (!sum.is_zero()).then(|| sum / Decimal::TWO)
}

/// Min, max and mean of a ratio across years.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RatioSummary {
    /// Lowest value.
    pub min: Decimal,
    /// Highest value.
    pub max: Decimal,
    /// Arithmetic mean.
    pub mean: Decimal,
}

/// Ratios of every eligible report of a set.
#[derive(Debug, Clone, Serialize)]
pub struct RatioReport {
    /// Company of the first eligible report.
    pub company: String,
    /// Years with ratios, ascending.
    pub years: Vec<i32>,
    /// Ratios by document year.
    pub by_year: BTreeMap<i32, RatioSet>,
    /// Summary per ratio over the years where it was computed.
    pub summary: BTreeMap<RatioKind, RatioSummary>,
}

impl RatioReport {
    /// Computes ratios for every post-2010 report that has a balance sheet.
    ///
    /// # Errors
    ///
    /// [`ReportError::NoEligibleReports`] when no report qualifies.
    pub fn from_reports<'a, I>(reports: I) -> Result<Self, ReportError>
    where
        I: IntoIterator<Item = &'a Report>,
    {
        let mut eligible: Vec<&Report> = reports
            .into_iter()
            .filter(|r| !r.meta.format.is_pre_2010() && r.balance.is_some())
            .collect();
        eligible.sort_by_key(|r| r.meta.year);
        let company = eligible
            .first()
            .map(|r| r.meta.company_or_default().to_string())
            .ok_or(ReportError::NoEligibleReports)?;

        let mut by_year = BTreeMap::new();
        for report in eligible {
            let Some(balance) = report.balance.as_ref() else {
                continue;
            };
            match RatioSet::compute(balance, report.income.as_ref()) {
                Some(set) => {
                    by_year.entry(report.meta.year).or_insert(set);
                }
                None => log::warn!(
                    "{}: no ratios for {}, total assets or liabilities missing",
                    report.meta.company_or_default(),
                    report.meta.year
                ),
            }
        }
        if by_year.is_empty() {
            return Err(ReportError::NoEligibleReports);
        }

        let summary = RatioKind::ALL
            .into_iter()
            .filter_map(|kind| summarize(by_year.values().filter_map(|s| s.get(kind))).map(|s| (kind, s)))
            .collect();

        Ok(Self {
            company,
            years: by_year.keys().copied().collect(),
            by_year,
            summary,
        })
    }

    /// Values of one ratio in ascending year order.
    pub fn series(&self, kind: RatioKind) -> Vec<(i32, Option<Decimal>)> {
        self.by_year
            .iter()
            .map(|(year, set)| (*year, set.get(kind)))
            .collect()
    }

    /// Most recent year's ratios.
    pub fn latest(&self) -> Option<&RatioSet> {
        self.by_year.values().next_back()
    }
}

fn summarize<I: Iterator<Item = Decimal>>(values: I) -> Option<RatioSummary> {
    let mut count = 0u32;
    let mut sum = Decimal::ZERO;
    let mut min: Option<Decimal> = None;
    let mut max: Option<Decimal> = None;
    for value in values {
        count += 1;
        sum += value;
        min = Some(min.map_or(value, |m| m.min(value)));
        max = Some(max.map_or(value, |m| m.max(value)));
    }
    Some(RatioSummary {
        min: min?,
        max: max?,
        mean: sum / Decimal::from(count),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Account, StatementKind};

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn income(rows: &[(&str, &str)]) -> Statement {
        let accounts = rows
            .iter()
            .enumerate()
            .map(|(row, (name, value))| Account {
                code: None,
                name: (*name).to_string(),
                note: String::new(),
                is_total: false,
                row: row + 1,
                values: BTreeMap::from([(2023, d(value))]),
            })
            .collect();
        Statement {
            kind: StatementKind::Income,
            title: "ESTADO DE RESULTADOS".to_string(),
            years: vec![2023],
            accounts,
        }
    }

    #[test]
    fn net_income_prefers_the_whole_year_row() {
        let statement = income(&[
            ("Ingresos de Actividades Ordinarias", "1000"),
            ("Ganancia (Pérdida) Neta de Operaciones Continuadas", "100"),
            ("Ganancia (Pérdida) Neta de Operaciones Discontinuadas", "-40"),
            ("Ganancia (Pérdida) Neta del Ejercicio", "60"),
        ]);
        assert_eq!(net_income(&statement, 2023), Some(d("60")));
    }

    #[test]
    fn net_income_falls_back_to_the_last_match() {
        let statement = income(&[
            ("Ganancia (Pérdida) Neta de Operaciones Continuadas", "100"),
            ("Ganancia (Pérdida) Neta", "75"),
        ]);
        assert_eq!(net_income(&statement, 2023), Some(d("75")));
        assert_eq!(net_income(&income(&[("Costo de Ventas", "-600")]), 2023), None);
    }
}
