#![warn(missing_docs)]
//! Parser and analyzer for financial statement reports published by the Peruvian
//! securities regulator (SMV) as HTML files with an `.xls` extension.
//!
//! A report is parsed into its statements, which feed the vertical, horizontal and
//! ratio analyses. A [`ReportSet`] lines several years up side by side.

mod config;
mod dashboard;
mod error;
mod export;
mod horizontal;
mod narrative;
mod parser;
mod ratios;
mod raw;
mod report;
mod report_set;
mod rules;
mod table;
mod types;
mod utils;
mod vertical;

pub use crate::config::{AnalysisConfig, Config, LlmConfig, PhaseTokens};
pub use crate::dashboard::{
    grid, render_horizontal, render_ratios, render_statement, render_summary, render_table,
    render_vertical,
};
pub use crate::error::ReportError;
pub use crate::export::{
    export_set, format_ratio_value, write_ratios_csv, write_report_json, write_statement_csv,
    write_table_csv, write_workbook,
};
pub use crate::horizontal::{
    HorizontalAnalysis, HorizontalLine, StatementHorizontal, Variation, VariationStats, compare,
};
pub use crate::narrative::{
    ChatBackend, ChatMessage, CompletionRequest, Narrative, NarrativeGenerator, NarrativePhase,
    NarrativeSection, OpenAiCompatClient,
};
pub use crate::parser::balance_check;
pub use crate::ratios::{
    RatioCategory, RatioInputs, RatioKind, RatioReport, RatioSet, RatioSummary,
};
pub use crate::raw::{DomReport, RawReport};
pub use crate::report::{Report, ReportBuilder};
pub use crate::report_set::{ConsolidatedHorizontal, ConsolidatedVertical, ReportSet, SkippedFile};
pub use crate::table::{CellFormat, ConsolidatedRow, ConsolidatedTable};
pub use crate::types::*;
pub use crate::utils::{
    format_amount, format_percent, format_ratio, parse_amount, percent_of, round_dp, rule_key,
};
pub use crate::vertical::{
    BalanceVertical, StatementVertical, VerticalAnalysis, VerticalLine, cash_flow_vertical,
    income_vertical,
};

/// Row rules and statement headings of both report templates.
pub mod templates {
    pub use crate::rules::*;
}
