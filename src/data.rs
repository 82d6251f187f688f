use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Failures while turning raw input into a [`Dataset`].
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read CSV input: {0}")]
    Csv(#[from] csv::Error),
    #[error("input data must be a JSON array of objects")]
    NotAnArray,
    #[error("row {row} is not a JSON object")]
    NotAnObject { row: usize },
    #[error("unsupported value type for field '{field}' in row {row}")]
    UnsupportedValue { field: String, row: usize },
}

/// A raw attribute value as it was loaded, before any category normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Bool(bool),
    Text(String),
    Null,
}

impl Value {
    /// Type a raw CSV cell: numbers, booleans, empty cells, then plain text.
    /// Surrounding whitespace is ignored.
    pub fn parse_dynamic(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Value::Null;
        }
        if trimmed.eq_ignore_ascii_case("true") {
            return Value::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return Value::Bool(false);
        }
        if looks_numeric(trimmed) {
            if let Ok(n) = trimmed.parse::<f64>() {
                if n.is_finite() {
                    return Value::Number(n);
                }
            }
        }
        Value::Text(trimmed.to_string())
    }
}

// Rejects things Rust happily parses as floats ("inf", "NaN", "infinity").
fn looks_numeric(s: &str) -> bool {
    s.chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'))
        && s.chars().any(|c| c.is_ascii_digit())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Bool(b) => write!(f, "{}", b),
            Value::Text(s) => f.write_str(s),
            Value::Null => Ok(()),
        }
    }
}

/// One dataset row. `index` is assigned at load time and never reused.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub index: usize,
    pub values: HashMap<String, Value>,
}

impl Record {
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.values.get(attribute)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub records: Vec<Record>,
}

impl Dataset {
    /// Build a dataset from positional rows; row `i` receives index `i`.
    /// Short rows are padded with nulls.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| {
                let mut cells = row.into_iter();
                let values = headers
                    .iter()
                    .map(|h| (h.clone(), cells.next().unwrap_or(Value::Null)))
                    .collect();
                Record { index, values }
            })
            .collect();

        Self { headers, records }
    }

    /// Create a Dataset from a JSON Array of Objects
    pub fn from_json(value: &JsonValue) -> Result<Self, DataError> {
        let array = value.as_array().ok_or(DataError::NotAnArray)?;

        // Headers are the union of keys, in first-seen order
        let mut headers: Vec<String> = Vec::new();
        for (row, item) in array.iter().enumerate() {
            let obj = item.as_object().ok_or(DataError::NotAnObject { row })?;
            for key in obj.keys() {
                if !headers.contains(key) {
                    headers.push(key.clone());
                }
            }
        }

        let mut rows = Vec::with_capacity(array.len());
        for (row, item) in array.iter().enumerate() {
            let obj = item.as_object().ok_or(DataError::NotAnObject { row })?;
            let mut cells = Vec::with_capacity(headers.len());
            for header in &headers {
                let cell = match obj.get(header) {
                    Some(JsonValue::String(s)) => Value::Text(s.clone()),
                    Some(JsonValue::Number(n)) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
                    Some(JsonValue::Bool(b)) => Value::Bool(*b),
                    Some(JsonValue::Null) | None => Value::Null,
                    _ => {
                        return Err(DataError::UnsupportedValue {
                            field: header.clone(),
                            row,
                        })
                    }
                };
                cells.push(cell);
            }
            rows.push(cells);
        }

        Ok(Self::new(headers, rows))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Attributes usable as default axes: every header not listed in `exclude`
    /// (compared case-insensitively), plus never the synthetic `index`.
    pub fn attributes_excluding(&self, exclude: &[String]) -> Vec<String> {
        self.headers
            .iter()
            .filter(|h| !h.eq_ignore_ascii_case("index"))
            .filter(|h| !exclude.iter().any(|e| e.eq_ignore_ascii_case(h)))
            .cloned()
            .collect()
    }
}
