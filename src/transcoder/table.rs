use crate::error::RetrosheetError;
use crate::transcoder::TranscoderError::{CsvFormatError, RowShapeError};
use csv::{ReaderBuilder, StringRecord};
use std::collections::HashMap;
use std::io::Read;

/// Header row plus data rows of one CSV response body.
///
/// Headers are kept exactly as given, blanks and duplicates included. Fields
/// are looked up by header name; when a name repeats, the last column carrying
/// it wins.
pub struct CsvTable {
    /// Column headers from the first record
    headers: Vec<String>,
    /// Data records in file order
    rows: Vec<StringRecord>,
    /// Header name to column index
    columns: HashMap<String, usize>,
}

impl CsvTable {
    /// Reads a whole CSV body.
    ///
    /// The reader is consumed and dropped before this returns, whether or not
    /// parsing succeeds. Blank lines are skipped. Rows may be longer or shorter
    /// than the header; shape is checked when a field is fetched.
    ///
    /// # Errors
    ///
    /// Returns a CSV format error if the body cannot be read or has no header row.
    pub fn read<R: Read>(reader: R) -> Result<Self, RetrosheetError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let headers: Vec<String> = reader
            .headers()
            .map_err(to_format_error)?
            .iter()
            .map(str::to_owned)
            .collect();
        if headers.is_empty() {
            Err(CsvFormatError { message: "Missing header row".to_owned() })?;
        }
        let rows = reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(to_format_error)?;
        let columns = headers
            .iter()
            .enumerate()
            .map(|(index, header)| (header.to_owned(), index))
            .collect();
        Ok(CsvTable { headers, rows, columns })
    }

    /// Column headers in file order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterates over the data rows in file order.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = Row<'_>> + '_ {
        self.rows
            .iter()
            .enumerate()
            .map(move |(index, record)| Row { table: self, number: index + 1, record })
    }
}

/// One data row of a [`CsvTable`].
pub struct Row<'a> {
    table: &'a CsvTable,
    /// 1-based data row number (the header row is not counted)
    number: usize,
    record: &'a StringRecord,
}

impl<'a> Row<'a> {
    /// 1-based data row number.
    pub fn number(&self) -> usize {
        self.number
    }

    /// Returns the raw field under `header`.
    ///
    /// # Errors
    ///
    /// Returns a row shape error if the row is too short to carry the column,
    /// or if `header` is not a column of the table.
    pub fn field(&self, header: &str) -> Result<&'a str, RetrosheetError> {
        let field = self
            .table
            .columns
            .get(header)
            .and_then(|index| self.record.get(*index));
        Ok(field.ok_or_else(|| RowShapeError {
            row: self.number,
            header: header.to_owned(),
            expected: self.table.headers.len(),
            actual: self.record.len(),
        })?)
    }
}

fn to_format_error(error: csv::Error) -> RetrosheetError {
    CsvFormatError { message: error.to_string() }.into()
}
