use crate::error::RetrosheetError;
use crate::resolver::options::OptionsError::InvalidParameter;
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while reading request options from a key-value bag.
#[derive(Error, Debug)]
pub enum OptionsError {
    /// Invalid value provided for a named option
    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },
}

/// Per-endpoint options applied when a spreadsheet URL is rewritten.
///
/// Every field is optional. A missing field means the matching query
/// parameter is left off the export URL.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Google Visualization query, sent as `tq`
    pub query: Option<String>,
    /// A1-notation range, sent as `range`
    pub range: Option<String>,
    /// Number of header rows, sent as `headers`
    pub header_row_offset: Option<i32>,
}

impl RequestOptions {
    /// Value of `headers` that means "not set".
    pub const UNSET_HEADER_ROW_OFFSET: i32 = -1;

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_range(mut self, range: impl Into<String>) -> Self {
        self.range = Some(range.into());
        self
    }

    pub fn with_header_row_offset(mut self, offset: i32) -> Self {
        self.header_row_offset = Some(offset).filter(|it| *it != Self::UNSET_HEADER_ROW_OFFSET);
        self
    }

    /// Query text if present and not blank.
    pub(crate) fn non_blank_query(&self) -> Option<&str> {
        non_blank(self.query.as_deref())
    }

    /// Range text if present and not blank.
    pub(crate) fn non_blank_range(&self) -> Option<&str> {
        non_blank(self.range.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

/// Trait for reading a single named option out of a key-value bag.
///
/// # Type Parameters
///
/// * `T` - The type of the option value
pub trait NamedParam<T> {
    /// Returns the key the option is stored under
    fn name() -> &'static str;

    /// Extracts the option value from the bag
    ///
    /// # Returns
    ///
    /// * `Ok(None)` if the key is absent, or present with the "not set" value
    /// * `Err` if the value is present but cannot be parsed
    fn read(bag: &HashMap<String, String>) -> Result<Option<T>, RetrosheetError>;
}

/// Query option reader
struct QueryParam;

/// Range option reader
struct RangeParam;

/// Header row offset option reader
struct HeadersParam;

impl NamedParam<String> for QueryParam {
    fn name() -> &'static str {
        "query"
    }

    fn read(bag: &HashMap<String, String>) -> Result<Option<String>, RetrosheetError> {
        Ok(bag.get(Self::name()).cloned())
    }
}

impl NamedParam<String> for RangeParam {
    fn name() -> &'static str {
        "range"
    }

    fn read(bag: &HashMap<String, String>) -> Result<Option<String>, RetrosheetError> {
        Ok(bag.get(Self::name()).cloned())
    }
}

impl NamedParam<i32> for HeadersParam {
    fn name() -> &'static str {
        "headers"
    }

    fn read(bag: &HashMap<String, String>) -> Result<Option<i32>, RetrosheetError> {
        let Some(value) = bag.get(Self::name()) else {
            return Ok(None);
        };
        let offset = value.trim().parse::<i32>().map_err(|_| InvalidParameter {
            name: Self::name().to_string(),
            message: format!("'{value}' is not a row count"),
        })?;
        Ok(Some(offset).filter(|it| *it != RequestOptions::UNSET_HEADER_ROW_OFFSET))
    }
}

impl TryFrom<&HashMap<String, String>> for RequestOptions {
    type Error = RetrosheetError;

    /// Reads `query`, `range` and `headers` from an opaque key-value bag.
    /// Unknown keys are ignored.
    fn try_from(bag: &HashMap<String, String>) -> Result<Self, Self::Error> {
        Ok(RequestOptions {
            query: QueryParam::read(bag)?,
            range: RangeParam::read(bag)?,
            header_row_offset: HeadersParam::read(bag)?,
        })
    }
}
