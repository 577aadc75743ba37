//! Raw report HTML and the parsed DOM.

use crate::error::ReportError;
use scraper::Html;
use std::io::Read;

/// Report HTML before DOM parsing.
#[derive(Debug, Clone)]
pub struct RawReport {
    /// Full report HTML.
    pub html: String,
}

impl RawReport {
    /// Reads a report from any `Read`.
    ///
    /// Exports are usually ISO-8859-1; input that is not valid UTF-8 is decoded as Latin-1.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, ReportError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let html = match String::from_utf8(bytes) {
            Ok(html) => html,
            Err(err) => {
                log::debug!("report is not UTF-8, decoding as Latin-1");
                err.into_bytes().into_iter().map(char::from).collect()
            }
        };
        Ok(Self { html })
    }

    /// Builds a report from an HTML string.
    #[inline]
    pub fn from_str(s: &str) -> Self {
        Self {
            html: s.to_string(),
        }
    }
}

/// Parsed report DOM with statement lookup helpers.
#[derive(Debug, Clone)]
pub struct DomReport {
    pub(crate) doc: Html,
}

impl DomReport {
    /// Parses the DOM of a raw report.
    #[inline]
    pub fn parse(raw: &RawReport) -> Self {
        Self {
            doc: Html::parse_document(&raw.html),
        }
    }
}
