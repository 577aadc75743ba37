//! Horizontal analysis: year-over-year change of every line.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::ReportError;
use crate::report::Report;
use crate::types::{Money, Statement, StatementKind};

/// Direction of a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Variation {
    /// Positive percentage change.
    Increase,
    /// Negative percentage change.
    Decrease,
    /// No change, including zero in both years.
    Unchanged,
    /// Base year is zero while the current year is not.
    NotComputable,
}

/// One analysed line.
#[derive(Debug, Clone, Serialize)]
pub struct HorizontalLine {
    /// Account name.
    pub account: String,
    /// Row is a total or subtotal.
    pub is_total: bool,
    /// Value in the base year.
    pub base_value: Money,
    /// Value in the current year.
    pub current_value: Money,
    /// Absolute change.
    pub change: Money,
    /// Change relative to the base in percent.
    pub percent: Option<Decimal>,
    /// Direction of the change.
    pub variation: Variation,
}

/// Counts of lines per variation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VariationStats {
    /// Lines that increased.
    pub increases: usize,
    /// Lines that decreased.
    pub decreases: usize,
    /// Lines without change.
    pub unchanged: usize,
    /// Lines with a zero base.
    pub not_computable: usize,
}

impl VariationStats {
    fn record(&mut self, variation: Variation) {
        match variation {
            Variation::Increase => self.increases += 1,
            Variation::Decrease => self.decreases += 1,
            Variation::Unchanged => self.unchanged += 1,
            Variation::NotComputable => self.not_computable += 1,
        }
    }

    fn merge(&mut self, other: &Self) {
        self.increases += other.increases;
        self.decreases += other.decreases;
        self.unchanged += other.unchanged;
        self.not_computable += other.not_computable;
    }

    /// Number of lines counted.
    pub const fn total(&self) -> usize {
        self.increases + self.decreases + self.unchanged + self.not_computable
    }
}

/// Compares a current value against a base value.
pub fn compare(base: Money, current: Money) -> (Option<Decimal>, Variation) {
    if base.is_zero() {
        return if current.is_zero() {
            (Some(Decimal::ZERO), Variation::Unchanged)
        } else {
            (None, Variation::NotComputable)
        };
    }
    let Some(percent) = current
        .checked_sub(base)
        .and_then(|change| change.checked_div(base))
        .and_then(|share| share.checked_mul(Decimal::ONE_HUNDRED))
    else {
        return (None, Variation::NotComputable);
    };
    let variation = if percent > Decimal::ZERO {
        Variation::Increase
    } else if percent < Decimal::ZERO {
        Variation::Decrease
    } else {
        Variation::Unchanged
    };
    (Some(percent), variation)
}

/// Horizontal analysis of one statement.
#[derive(Debug, Clone, Serialize)]
pub struct StatementHorizontal {
    /// Statement kind.
    pub kind: StatementKind,
    /// Statement heading.
    pub title: String,
    /// Most recent year.
    pub current_year: i32,
    /// Year before it.
    pub base_year: i32,
    /// Every row of the statement.
    pub lines: Vec<HorizontalLine>,
    /// Counts per variation.
    pub stats: VariationStats,
}

impl StatementHorizontal {
    /// Compares the two most recent years, `None` with fewer than two years.
    pub fn from_statement(statement: &Statement) -> Option<Self> {
        let (&current_year, &base_year) = (statement.years.first()?, statement.years.get(1)?);
        let mut stats = VariationStats::default();
        let lines = statement
            .accounts
            .iter()
            .map(|account| {
                let base_value = account.value(base_year);
                let current_value = account.value(current_year);
                let (percent, variation) = compare(base_value, current_value);
                stats.record(variation);
                HorizontalLine {
                    account: account.name.clone(),
                    is_total: account.is_total,
                    base_value,
                    current_value,
                    change: current_value.saturating_sub(base_value),
                    percent,
                    variation,
                }
            })
            .collect();

        Some(Self {
            kind: statement.kind,
            title: statement.title.clone(),
            current_year,
            base_year,
            lines,
            stats,
        })
    }
}

/// Horizontal analysis of the balance sheet, income statement and cash flow of a report.
#[derive(Debug, Clone, Serialize)]
pub struct HorizontalAnalysis {
    /// Document year.
    pub year: i32,
    /// Company name.
    pub company: String,
    /// Balance sheet.
    pub balance: Option<StatementHorizontal>,
    /// Income statement.
    pub income: Option<StatementHorizontal>,
    /// Cash flow.
    pub cash_flow: Option<StatementHorizontal>,
    /// Counts over all analysed statements.
    pub stats: VariationStats,
}

impl HorizontalAnalysis {
    /// Analyses a post-2010 report.
    ///
    /// # Errors
    ///
    /// [`ReportError::UnsupportedFormat`] for pre-2010 reports.
    pub fn from_report(report: &Report) -> Result<Self, ReportError> {
        if report.meta.format.is_pre_2010() {
            return Err(ReportError::UnsupportedFormat {
                analysis: "Horizontal analysis",
                year: report.meta.year,
            });
        }

        let analyse = |kind| {
            report
                .statement(kind)
                .and_then(StatementHorizontal::from_statement)
        };
        let balance = analyse(StatementKind::Balance);
        let income = analyse(StatementKind::Income);
        let cash_flow = analyse(StatementKind::CashFlow);

        let mut stats = VariationStats::default();
        for statement in [&balance, &income, &cash_flow].into_iter().flatten() {
            stats.merge(&statement.stats);
        }

        Ok(Self {
            year: report.meta.year,
            company: report.meta.company_or_default().to_string(),
            balance,
            income,
            cash_flow,
            stats,
        })
    }

    /// Analysed statements in report order.
    pub fn statements(&self) -> impl Iterator<Item = &StatementHorizontal> {
        [&self.balance, &self.income, &self.cash_flow]
            .into_iter()
            .flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn zero_base_cases() {
        assert_eq!(
            compare(Decimal::ZERO, Decimal::ZERO),
            (Some(Decimal::ZERO), Variation::Unchanged)
        );
        assert_eq!(compare(Decimal::ZERO, d("5")), (None, Variation::NotComputable));
    }

    #[test]
    fn sign_follows_the_percentage() {
        assert_eq!(compare(d("80"), d("100")), (Some(d("25")), Variation::Increase));
        // a larger expense against a negative base reads as an increase
        assert_eq!(compare(d("-40"), d("-60")), (Some(d("50")), Variation::Increase));
        assert_eq!(compare(d("40"), d("20")).1, Variation::Decrease);
    }

    #[test]
    fn out_of_range_change_is_not_computable() {
        assert_eq!(
            compare(d("0.0000000001"), d("100000000000000000000")),
            (None, Variation::NotComputable)
        );
        assert_eq!(
            compare(Decimal::MIN, Decimal::MAX),
            (None, Variation::NotComputable)
        );
    }
}
