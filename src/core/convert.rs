//! Purpose: Convert a record's raw fields into schema-typed values.
//! Exports: `Value`, `TypedRow`, `convert_row`, `convert_field`.
//! Role: Second stage of the row pipeline, after the tokenizer.
//! Invariants: Columns convert in schema order; the first failure aborts the row.
//! Invariants: Text columns are taken verbatim; parsed columns allow only whitespace around the value.
use std::fmt;

use serde::Serialize;

use crate::core::config::{ColumnType, Schema};
use crate::core::error::{Error, ErrorKind};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Boolean(bool),
}

impl Value {
    pub fn column_type(&self) -> ColumnType {
        match self {
            Value::Text(_) => ColumnType::Text,
            Value::Integer(_) => ColumnType::Integer,
            Value::Unsigned(_) => ColumnType::Unsigned,
            Value::Float(_) => ColumnType::Float,
            Value::Boolean(_) => ColumnType::Boolean,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Unsigned(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(text) => f.write_str(text),
            Value::Integer(value) => write!(f, "{value}"),
            Value::Unsigned(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value}"),
            Value::Boolean(value) => write!(f, "{value}"),
        }
    }
}

/// One converted record. `line` is the 1-based record number in the source.
#[derive(Clone, Debug, PartialEq)]
pub struct TypedRow {
    line: u64,
    values: Vec<Value>,
}

impl TypedRow {
    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, column: usize) -> Option<&Value> {
        self.values.get(column)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

pub fn convert_row(fields: &[String], schema: &Schema, line: u64) -> Result<TypedRow, Error> {
    if fields.len() != schema.len() {
        return Err(Error::new(ErrorKind::SchemaMismatch)
            .with_message("field count does not match schema")
            .with_line(line)
            .with_counts(schema.len(), fields.len()));
    }

    let values = schema
        .columns()
        .iter()
        .zip(fields)
        .enumerate()
        .map(|(column, (column_type, raw))| {
            convert_field(raw, *column_type).map_err(|err| err.with_line(line).with_field(column))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TypedRow { line, values })
}

/// Converts one field. Errors carry no position; `convert_row` adds line and column.
///
/// Floats must be finite: `inf`, `NaN`, and out-of-range exponents are rejected.
pub fn convert_field(raw: &str, column_type: ColumnType) -> Result<Value, Error> {
    let value = match column_type {
        ColumnType::Text => return Ok(Value::Text(raw.to_string())),
        ColumnType::Integer => trimmed(raw).parse().ok().map(Value::Integer),
        ColumnType::Unsigned => trimmed(raw).parse().ok().map(Value::Unsigned),
        ColumnType::Float => trimmed(raw)
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map(Value::Float),
        ColumnType::Boolean => parse_bool(trimmed(raw)).map(Value::Boolean),
    };
    value.ok_or_else(|| {
        Error::new(ErrorKind::FieldConversion)
            .with_message(format!("cannot parse {raw:?} as {column_type}"))
    })
}

fn trimmed(raw: &str) -> &str {
    raw.trim_matches(|c: char| c.is_ascii_whitespace())
}

fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "1" => Some(true),
        "0" => Some(false),
        _ if text.eq_ignore_ascii_case("true") => Some(true),
        _ if text.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}
