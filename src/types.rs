//! Domain types for the statements found in a report.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Monetary value; `Decimal` keeps the reported figures exact.
pub type Money = Decimal;

/// Regulatory template of a report, decided by its document year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ReportFormat {
    /// Local GAAP templates, document year 2009 or earlier.
    Pre2010,
    /// IFRS templates, document year 2010 or later.
    Post2010,
}

impl ReportFormat {
    /// Template used by reports of the given document year.
    #[inline]
    pub const fn from_year(year: i32) -> Self {
        if year <= 2009 {
            Self::Pre2010
        } else {
            Self::Post2010
        }
    }

    /// Whether this is the pre-2010 template.
    #[inline]
    pub const fn is_pre_2010(self) -> bool {
        matches!(self, Self::Pre2010)
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pre2010 => f.write_str("pre-2010"),
            Self::Post2010 => f.write_str("post-2010"),
        }
    }
}

/// Financial statements published in a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum StatementKind {
    /// Balance sheet / statement of financial position.
    Balance,
    /// Income statement.
    Income,
    /// Statement of changes in equity.
    Equity,
    /// Cash flow statement.
    CashFlow,
    /// Statement of comprehensive income (post-2010 only).
    ComprehensiveIncome,
}

impl StatementKind {
    /// All statements in report order.
    pub const ALL: [Self; 5] = [
        Self::Balance,
        Self::Income,
        Self::Equity,
        Self::CashFlow,
        Self::ComprehensiveIncome,
    ];

    /// Short machine-friendly key, used in file names.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Balance => "balance",
            Self::Income => "income",
            Self::Equity => "equity",
            Self::CashFlow => "cash_flow",
            Self::ComprehensiveIncome => "comprehensive_income",
        }
    }

    /// Human-readable label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Balance => "Balance sheet",
            Self::Income => "Income statement",
            Self::Equity => "Changes in equity",
            Self::CashFlow => "Cash flow",
            Self::ComprehensiveIncome => "Comprehensive income",
        }
    }
}

/// One statement row.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    /// Account code (`CCUENTA`), only present in the equity statement.
    pub code: Option<String>,
    /// Account name as printed.
    pub name: String,
    /// Note reference column.
    pub note: String,
    /// Row is a total or subtotal.
    pub is_total: bool,
    /// Row index inside the table (header is row 0).
    pub row: usize,
    /// Values by year.
    pub values: BTreeMap<i32, Money>,
}

impl Account {
    /// Value for a year, zero when the year is absent.
    #[inline]
    pub fn value(&self, year: i32) -> Money {
        self.values.get(&year).copied().unwrap_or(Decimal::ZERO)
    }
}

/// A statement table.
#[derive(Debug, Clone, Serialize)]
pub struct Statement {
    /// Statement kind.
    pub kind: StatementKind,
    /// Heading the statement was found under.
    pub title: String,
    /// Years present, most recent first.
    pub years: Vec<i32>,
    /// Rows in document order.
    pub accounts: Vec<Account>,
}

impl Statement {
    /// Most recent year of the statement.
    #[inline]
    pub fn latest_year(&self) -> Option<i32> {
        self.years.first().copied()
    }

    /// Equity statements carry account codes and a single total column.
    pub fn has_codes(&self) -> bool {
        self.accounts.iter().any(|a| a.code.is_some())
    }
}

/// Report header data.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Company name.
    pub company: Option<String>,
    /// Report type, e.g. "Individual" or "Consolidado".
    pub report_type: Option<String>,
    /// Reporting period, e.g. "Anual".
    pub period: Option<String>,
    /// Document (fiscal) year.
    pub year: i32,
    /// Template of the report.
    pub format: ReportFormat,
}

impl ReportMetadata {
    /// Company name or a placeholder.
    pub fn company_or_default(&self) -> &str {
        self.company.as_deref().unwrap_or("Unidentified company")
    }
}

/// Accounting equation check: assets = liabilities + equity.
#[derive(Debug, Clone, Serialize)]
pub struct BalanceCheck {
    /// Year checked.
    pub year: i32,
    /// Total assets.
    pub total_assets: Money,
    /// Total liabilities.
    pub total_liabilities: Money,
    /// Total equity.
    pub total_equity: Money,
    /// Absolute difference between both sides.
    pub difference: Money,
    /// Relative tolerance against total assets.
    pub tolerance: Decimal,
    /// Difference within tolerance.
    pub is_balanced: bool,
}
