//! CSV decoding into header-keyed records.
//!
//! No type coercion happens here; every cell stays a string and the
//! ingestion layer decides what each column means.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// One data row, keyed by (trimmed) header name.
pub type Record = BTreeMap<String, String>;

/// Parse CSV text with a header row into records.
///
/// Blank lines are skipped. A row whose column count differs from the header
/// is an error, which is also how an unterminated quote surfaces. A leading
/// UTF-8 byte-order mark is ignored; when a header repeats, the rightmost
/// column wins.
pub fn decode_csv(input: &str) -> Result<Vec<Record>> {
  let input = input.strip_prefix('\u{feff}').unwrap_or(input);
  let mut reader = csv::ReaderBuilder::new()
    .has_headers(true)
    .flexible(true)
    .from_reader(input.as_bytes());

  let headers: Vec<String> = reader
    .headers()?
    .iter()
    .map(|h| h.trim().to_owned())
    .collect();

  let mut records = Vec::new();
  for row in reader.records() {
    let row = row?;
    if row.len() == 1 && row[0].trim().is_empty() {
      continue;
    }
    if row.len() != headers.len() {
      return Err(Error::ColumnCount {
        line:     row.position().map(|p| p.line()).unwrap_or_default(),
        expected: headers.len(),
        found:    row.len(),
      });
    }
    records.push(
      headers
        .iter()
        .cloned()
        .zip(row.iter().map(str::to_owned))
        .collect(),
    );
  }
  Ok(records)
}

/// [`decode_csv`] over raw upload bytes, which must be UTF-8.
pub fn decode_csv_bytes(input: &[u8]) -> Result<Vec<Record>> {
  decode_csv(std::str::from_utf8(input)?)
}
