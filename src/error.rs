//! Errors raised while parsing, analysing and exporting statement reports.

/// Parsing, analysis or export error.
#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    /// I/O error while reading a report or writing an export.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The heading of a statement (or its table) was not found.
    #[error("Statement '{title}' not found")]
    StatementNotFound {
        /// Heading searched for.
        title: &'static str,
    },
    /// A cell could not be read as a number.
    #[error("Invalid number '{value}' for account '{account}'")]
    Number {
        /// Raw cell text.
        value: String,
        /// Account the cell belongs to.
        account: String,
    },
    /// A required field is missing from the report.
    #[error("Required field '{field}' missing")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },
    /// The analysis is not defined for the report's template.
    #[error("{analysis} is not available for {year} reports (pre-2010 template)")]
    UnsupportedFormat {
        /// Analysis requested.
        analysis: &'static str,
        /// Document year of the report.
        year: i32,
    },
    /// No report in the set qualifies for the requested computation.
    #[error("No post-2010 report with a balance sheet available")]
    NoEligibleReports,
    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// Writing an XLSX workbook failed.
    #[error("XLSX error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// The configuration file is malformed.
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
    /// HTTP transport error while talking to the LLM API.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// The LLM API answered with an error or an empty completion.
    #[error("LLM error: {0}")]
    Llm(String),
    /// The environment variable holding the API key is not set.
    #[error("API key variable '{var}' is not set")]
    MissingApiKey {
        /// Variable name.
        var: String,
    },
}
