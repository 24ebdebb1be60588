//! # URL Resolver
//!
//! Recognizes the human-facing URL of a published Google Sheets page and
//! rewrites it into the sheet's CSV export endpoint.
//!
//! ```text
//! https://docs.google.com/spreadsheets/d/<documentId>/<pageName>
//!   -> https://docs.google.com/spreadsheets/d/<documentId>/gviz/tq?tqx=out:csv&sheet=<pageName>
//! ```
use crate::error::RetrosheetError;
use crate::resolver::options::RequestOptions;
use crate::resolver::ResolverError::{MalformedUrlError, MissingFieldError};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

pub mod options;

/// Prefix shared by every spreadsheet URL.
pub const SPREADSHEET_URL_PREFIX: &str = "https://docs.google.com/spreadsheets/d";

/// Query parameter of the export URL that carries the page name.
pub const SHEET_QUERY_PARAMETER: &str = "sheet";

/// `<prefix>/<documentId>/<pageName>`, with an optional trailing slash, query or fragment.
static SPREADSHEET_URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://docs\.google\.com/spreadsheets/d/([^/?#]*)(?:/([^/?#]*))?/?(?:[?#].*)?$")
        .expect("Hardcode regex pattern")
});

/// Errors raised while resolving a spreadsheet URL.
#[derive(Error, Debug)]
pub enum ResolverError {
    /// URL carries the spreadsheet prefix but not the `<documentId>/<pageName>` shape
    #[error("URL '{0}' doesn't match the expected '<documentId>/<pageName>' spreadsheet URL")]
    MalformedUrlError(String),

    /// Document id or page name is empty
    #[error("Couldn't find {field} in URL '{url}'")]
    MissingFieldError { field: &'static str, url: String },
}

/// The `(documentId, pageName)` pair identifying one page of a published sheet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SheetReference {
    /// Spreadsheet document id
    pub document_id: String,
    /// Page (tab) name, as it appears in the URL path
    pub page_name: String,
}

impl SheetReference {
    /// Base CSV export URL for this page, before any options are applied.
    pub fn export_url(&self) -> String {
        format!(
            "{SPREADSHEET_URL_PREFIX}/{}/gviz/tq?tqx=out:csv&{SHEET_QUERY_PARAMETER}={}",
            self.document_id,
            escape_query_value(&self.page_name)
        )
    }
}

/// Escapes the characters a path segment may carry but a query value may not.
/// Existing percent-escapes in the segment are kept as they are.
fn escape_query_value(segment: &str) -> String {
    let mut escaped = String::with_capacity(segment.len());
    for character in segment.chars() {
        match character {
            '&' => escaped.push_str("%26"),
            '+' => escaped.push_str("%2B"),
            '=' => escaped.push_str("%3D"),
            _ => escaped.push(character),
        }
    }
    escaped
}

impl TryFrom<&str> for SheetReference {
    type Error = RetrosheetError;

    /// Extracts the document id and page name from a human-facing spreadsheet URL.
    fn try_from(url: &str) -> Result<Self, Self::Error> {
        let captures = SPREADSHEET_URL_PATTERN
            .captures(url)
            .ok_or_else(|| MalformedUrlError(url.to_owned()))?;
        let document_id = captures
            .get(1)
            .map(|matcher| matcher.as_str())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| MissingFieldError { field: "documentId", url: url.to_owned() })?;
        let page_name = captures
            .get(2)
            .map(|matcher| matcher.as_str())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| MissingFieldError { field: "pageName", url: url.to_owned() })?;
        Ok(SheetReference {
            document_id: document_id.to_owned(),
            page_name: page_name.to_owned(),
        })
    }
}

/// Returns true if the URL should be served as a spreadsheet.
///
/// This is a plain prefix test. Shape validation happens in [`rewrite`], so a
/// URL that passes here may still fail there.
pub fn is_spreadsheet_url(url: &str) -> bool {
    url.starts_with(SPREADSHEET_URL_PREFIX)
}

/// Rewrites a human-facing spreadsheet URL into its CSV export URL.
///
/// Parameters are appended in a fixed order: `sheet`, `tq`, `range`, `headers`.
/// The query is percent-encoded, the range is appended verbatim.
///
/// The rewrite is one-directional: the export URL is itself under the
/// spreadsheet prefix but does not have the `<documentId>/<pageName>` shape, so
/// it is not a valid input for a second rewrite.
pub fn rewrite(url: &str, options: Option<&RequestOptions>) -> Result<String, RetrosheetError> {
    let reference = SheetReference::try_from(url)?;
    let mut target = reference.export_url();
    if let Some(options) = options {
        if let Some(query) = options.non_blank_query() {
            target.push_str("&tq=");
            target.push_str(&urlencoding::encode(query));
        }
        if let Some(range) = options.non_blank_range() {
            target.push_str("&range=");
            target.push_str(range);
        }
        if let Some(headers) = options.header_row_offset {
            target.push_str(&format!("&headers={headers}"));
        }
    }
    Ok(target)
}
