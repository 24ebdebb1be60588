//! # CSV-to-JSON Transcoder
//!
//! Turns the CSV export of a sheet page into a JSON document keyed by page
//! name, with every field typed independently:
//!
//! ```text
//! id,name          {
//! 1,Alice     ->     "Sheet1": [
//! 2,Bob                { "id": 1, "name": "Alice" },
//!                      { "id": 2, "name": "Bob" }
//!                    ]
//!                  }
//! ```
use crate::error::RetrosheetError;
use crate::transcoder::table::CsvTable;
use crate::transcoder::value::InferredValue;
use serde_json::{Map, Value};
use std::io::Read;
use thiserror::Error;
use tracing::debug;

pub mod table;
pub mod value;

/// Errors raised while converting a CSV body.
#[derive(Error, Debug)]
pub enum TranscoderError {
    /// Body is absent, unreadable, or has no header row
    #[error("Invalid CSV data: {message}")]
    CsvFormatError { message: String },

    /// A data row does not supply a value for every header
    #[error("Row {row} has no value for column '{header}' (expected {expected} fields, found {actual})")]
    RowShapeError {
        row: usize,
        header: String,
        expected: usize,
        actual: usize,
    },
}

/// Builds the output document `{ page_name: [ {header: value, ...}, ... ] }`.
///
/// Objects keep header order and rows keep file order. The whole body must
/// convert; a single short row fails the document.
pub fn to_document<R: Read>(reader: R, page_name: &str) -> Result<Value, RetrosheetError> {
    let table = CsvTable::read(reader)?;
    debug!(page_name, columns = table.headers().len(), rows = table.len(), "Read CSV table");

    let mut items = Vec::with_capacity(table.len());
    for row in table.rows() {
        let mut item = Map::new();
        for header in table.headers() {
            let field = row.field(header)?;
            item.insert(header.to_owned(), InferredValue::infer(field).into());
        }
        items.push(Value::Object(item));
    }

    let mut root = Map::new();
    root.insert(page_name.to_owned(), Value::Array(items));
    Ok(Value::Object(root))
}

/// Converts a CSV body into JSON text with two-space indentation.
pub fn transcode<R: Read>(reader: R, page_name: &str) -> Result<String, RetrosheetError> {
    let document = to_document(reader, page_name)?;
    Ok(serde_json::to_string_pretty(&document)?)
}
