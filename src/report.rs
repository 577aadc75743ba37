//! Builds a full report on top of the statement parsers.

use chrono::Datelike;

use crate::error::ReportError;
use crate::parser::balance_check;
use crate::raw::{DomReport, RawReport};
use crate::rules::statement_title;
use crate::types::{BalanceCheck, ReportMetadata, Statement, StatementKind};

/// Which statements to load and how to date the report (internal type).
#[derive(Debug, Clone, Copy)]
pub(crate) struct ParseOptions {
    pub load_balance: bool,
    pub load_income: bool,
    pub load_equity: bool,
    pub load_cash_flow: bool,
    pub load_comprehensive_income: bool,
    pub document_year: Option<i32>,
    pub year_cutoff: Option<i32>,
}

impl ParseOptions {
    /// Loads every known statement and detects the year.
    pub const fn everything() -> Self {
        Self {
            load_balance: true,
            load_income: true,
            load_equity: true,
            load_cash_flow: true,
            load_comprehensive_income: true,
            document_year: None,
            year_cutoff: None,
        }
    }

    const fn loads(&self, kind: StatementKind) -> bool {
        match kind {
            StatementKind::Balance => self.load_balance,
            StatementKind::Income => self.load_income,
            StatementKind::Equity => self.load_equity,
            StatementKind::CashFlow => self.load_cash_flow,
            StatementKind::ComprehensiveIncome => self.load_comprehensive_income,
        }
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::everything()
    }
}

/// One parsed report.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Report {
    /// Header data.
    pub meta: ReportMetadata,
    /// Balance sheet.
    pub balance: Option<Statement>,
    /// Income statement.
    pub income: Option<Statement>,
    /// Statement of changes in equity.
    pub equity: Option<Statement>,
    /// Cash flow statement.
    pub cash_flow: Option<Statement>,
    /// Statement of comprehensive income.
    pub comprehensive_income: Option<Statement>,
    /// Accounting equation check of the balance sheet.
    pub balance_check: Option<BalanceCheck>,
    /// Statements that were requested but could not be read, and cells read as zero.
    pub warnings: Vec<String>,
}

impl Report {
    /// Parses one report, loading every statement.
    #[inline]
    pub fn parse(raw: &RawReport) -> Result<Self, ReportError> {
        Self::parse_with_options(raw, ParseOptions::everything())
    }

    /// Parses a report with internal options (used by the builder).
    pub(crate) fn parse_with_options(
        raw: &RawReport,
        options: ParseOptions,
    ) -> Result<Self, ReportError> {
        let dom = DomReport::parse(raw);
        let cutoff = options
            .year_cutoff
            .unwrap_or_else(|| chrono::Local::now().year());
        let meta = dom.meta(options.document_year, cutoff)?;

        let mut warnings = Vec::new();
        let mut cell_warnings = Vec::new();
        let mut load = |kind: StatementKind| {
            let title = statement_title(meta.format, kind)?;
            parse_optional(options.loads(kind), &mut warnings, || {
                dom.parse_statement(kind, title, meta.year, &mut cell_warnings)
            })
        };
        let balance = load(StatementKind::Balance);
        let income = load(StatementKind::Income);
        let equity = load(StatementKind::Equity);
        let cash_flow = load(StatementKind::CashFlow);
        let comprehensive_income = load(StatementKind::ComprehensiveIncome);
        warnings.extend(cell_warnings);

        let balance_check = balance
            .as_ref()
            .and_then(|statement| balance_check(statement, meta.format));
        if let Some(check) = balance_check.as_ref().filter(|check| !check.is_balanced) {
            log::warn!(
                "{}: balance sheet off by {} in {}",
                meta.company_or_default(),
                check.difference,
                check.year
            );
        }

        Ok(Report {
            meta,
            balance,
            income,
            equity,
            cash_flow,
            comprehensive_income,
            balance_check,
            warnings,
        })
    }

    /// Statement of the given kind, if it was loaded.
    pub const fn statement(&self, kind: StatementKind) -> Option<&Statement> {
        match kind {
            StatementKind::Balance => self.balance.as_ref(),
            StatementKind::Income => self.income.as_ref(),
            StatementKind::Equity => self.equity.as_ref(),
            StatementKind::CashFlow => self.cash_flow.as_ref(),
            StatementKind::ComprehensiveIncome => self.comprehensive_income.as_ref(),
        }
    }

    /// Document year.
    #[inline]
    pub const fn year(&self) -> i32 {
        self.meta.year
    }
}

/// Builder for parsing a `Report` with a choice of statements.
pub struct ReportBuilder<'a> {
    raw: &'a RawReport,
    options: ParseOptions,
}

impl<'a> ReportBuilder<'a> {
    /// Creates a builder for the given raw report.
    ///
    /// # Example
    ///
    /// ```
    /// # use smv_financial_report::{RawReport, ReportBuilder};
    /// # let raw = RawReport::from_str("<html><div>Año: 2015</div></html>");
    /// let report = ReportBuilder::new(&raw)
    ///     .equity(false)
    ///     .year_cutoff(2100)
    ///     .parse()
    ///     .unwrap();
    /// assert_eq!(report.meta.year, 2015);
    /// ```
    #[inline]
    pub fn new(raw: &'a RawReport) -> Self {
        Self {
            raw,
            options: ParseOptions::everything(),
        }
    }

    /// Enables or disables the balance sheet.
    #[inline]
    pub const fn balance(mut self, enabled: bool) -> Self {
        self.options.load_balance = enabled;
        self
    }

    /// Enables or disables the income statement.
    #[inline]
    pub const fn income(mut self, enabled: bool) -> Self {
        self.options.load_income = enabled;
        self
    }

    /// Enables or disables the statement of changes in equity.
    #[inline]
    pub const fn equity(mut self, enabled: bool) -> Self {
        self.options.load_equity = enabled;
        self
    }

    /// Enables or disables the cash flow statement.
    #[inline]
    pub const fn cash_flow(mut self, enabled: bool) -> Self {
        self.options.load_cash_flow = enabled;
        self
    }

    /// Enables or disables the statement of comprehensive income.
    #[inline]
    pub const fn comprehensive_income(mut self, enabled: bool) -> Self {
        self.options.load_comprehensive_income = enabled;
        self
    }

    /// Forces the document year instead of detecting it.
    #[inline]
    pub const fn document_year(mut self, year: i32) -> Self {
        self.options.document_year = Some(year);
        self
    }

    /// Years at or after the cutoff are not taken as the document year.
    ///
    /// Defaults to the current calendar year.
    #[inline]
    pub const fn year_cutoff(mut self, cutoff: i32) -> Self {
        self.options.year_cutoff = Some(cutoff);
        self
    }

    /// Parses with the current settings.
    #[inline]
    pub fn parse(self) -> Result<Report, ReportError> {
        Report::parse_with_options(self.raw, self.options)
    }
}

/// Runs a statement parser, turning a failure into a warning.
fn parse_optional<T, F>(enabled: bool, warnings: &mut Vec<String>, loader: F) -> Option<T>
where
    F: FnOnce() -> Result<T, ReportError>,
{
    if !enabled {
        return None;
    }
    match loader() {
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("statement skipped: {err}");
            warnings.push(err.to_string());
            None
        }
    }
}
