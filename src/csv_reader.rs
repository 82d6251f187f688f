// CSV loading with dynamic typing

use crate::data::{DataError, Dataset, Value};
use std::io::{self, Read};

/// Read a headed CSV document into a [`Dataset`].
///
/// Cells are typed with [`Value::parse_dynamic`]; records receive their index in file
/// order. Ragged rows are accepted and padded with nulls.
pub fn read_dataset<R: Read>(reader: R) -> Result<Dataset, DataError> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in csv.records() {
        let record = result?;
        rows.push(record.iter().map(Value::parse_dynamic).collect());
    }

    Ok(Dataset::new(headers, rows))
}

pub fn read_dataset_from_stdin() -> Result<Dataset, DataError> {
    read_dataset(io::stdin().lock())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_typed_rows() {
        let input = "furnishingstatus,parking,mainroad\nfurnished,2,yes\nunfurnished,,no\n";
        let ds = read_dataset(input.as_bytes()).unwrap();
        assert_eq!(ds.headers, vec!["furnishingstatus", "parking", "mainroad"]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[0].get("parking"), Some(&Value::Number(2.0)));
        assert_eq!(ds.records[1].get("parking"), Some(&Value::Null));
        assert_eq!(ds.records[1].index, 1);
    }

    #[test]
    fn test_header_only() {
        let ds = read_dataset("a,b\n".as_bytes()).unwrap();
        assert!(ds.is_empty());
        assert_eq!(ds.headers.len(), 2);
    }

    #[test]
    fn test_ragged_rows() {
        let ds = read_dataset("a,b\n1\n".as_bytes()).unwrap();
        assert_eq!(ds.records[0].get("b"), Some(&Value::Null));
    }
}
