//! Purpose: Parser configuration: delimiter characters, quote handling, start record, schema.
//! Exports: `ParserConfig`, `Schema`, `ColumnType`, `QuoteMode`.
//! Role: Leaf value read by the tokenizer, converter, and cursor; never mutated after validation.
//! Invariants: Start record is 1-based and at least 1.
//! Invariants: Column delimiter, record delimiter, and quote character are pairwise distinct.
//! Invariants: The record delimiter is a single ASCII byte so sources can split on bytes.
use std::fmt;
use std::str::FromStr;

use crate::core::error::{Error, ErrorKind};

pub const DEFAULT_COLUMN_DELIMITER: char = ',';
pub const DEFAULT_RECORD_DELIMITER: char = '\n';
pub const DEFAULT_QUOTE: char = '"';

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ColumnType {
    Text,
    Integer,
    Unsigned,
    Float,
    Boolean,
}

impl ColumnType {
    pub fn name(self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Integer => "int",
            ColumnType::Unsigned => "uint",
            ColumnType::Float => "float",
            ColumnType::Boolean => "bool",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColumnType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "string" | "str" => Ok(ColumnType::Text),
            "int" | "integer" | "i64" => Ok(ColumnType::Integer),
            "uint" | "unsigned" | "u64" => Ok(ColumnType::Unsigned),
            "float" | "double" | "f64" => Ok(ColumnType::Float),
            "bool" | "boolean" => Ok(ColumnType::Boolean),
            other => Err(Error::new(ErrorKind::Usage)
                .with_message(format!("unknown column type `{other}`"))
                .with_hint("Use one of: text, int, uint, float, bool.")),
        }
    }
}

/// Ordered column types a row must conform to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Schema {
    columns: Vec<ColumnType>,
}

impl Schema {
    pub fn new(columns: impl Into<Vec<ColumnType>>) -> Self {
        Self {
            columns: columns.into(),
        }
    }

    pub fn columns(&self) -> &[ColumnType] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Parses a comma-separated list of type names, e.g. `int,text,float`.
impl FromStr for Schema {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(Error::new(ErrorKind::Usage).with_message("schema is empty"));
        }
        let columns = s
            .split(',')
            .map(ColumnType::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { columns })
    }
}

/// How the tokenizer treats a character that directly follows a closing quote.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum QuoteMode {
    /// The character is dropped and scanning continues unquoted.
    #[default]
    Lenient,
    /// The record is rejected as malformed.
    Strict,
}

#[derive(Clone, Debug)]
pub struct ParserConfig {
    column_delimiter: char,
    record_delimiter: char,
    quote: char,
    quote_mode: QuoteMode,
    start_record: i64,
    schema: Schema,
}

impl ParserConfig {
    pub fn new(schema: Schema) -> Self {
        Self {
            column_delimiter: DEFAULT_COLUMN_DELIMITER,
            record_delimiter: DEFAULT_RECORD_DELIMITER,
            quote: DEFAULT_QUOTE,
            quote_mode: QuoteMode::default(),
            start_record: 1,
            schema,
        }
    }

    pub fn with_column_delimiter(mut self, delimiter: char) -> Self {
        self.column_delimiter = delimiter;
        self
    }

    pub fn with_record_delimiter(mut self, delimiter: char) -> Self {
        self.record_delimiter = delimiter;
        self
    }

    pub fn with_quote(mut self, quote: char) -> Self {
        self.quote = quote;
        self
    }

    pub fn with_quote_mode(mut self, mode: QuoteMode) -> Self {
        self.quote_mode = mode;
        self
    }

    /// First record to yield, 1-based. Records before it are skipped (e.g. a header).
    pub fn with_start_record(mut self, start_record: i64) -> Self {
        self.start_record = start_record;
        self
    }

    pub fn column_delimiter(&self) -> char {
        self.column_delimiter
    }

    pub fn record_delimiter(&self) -> char {
        self.record_delimiter
    }

    /// Record delimiter as the byte sources split on. Only meaningful after `validate`.
    pub fn record_delimiter_byte(&self) -> u8 {
        self.record_delimiter as u8
    }

    pub fn quote(&self) -> char {
        self.quote
    }

    pub fn quote_mode(&self) -> QuoteMode {
        self.quote_mode
    }

    pub fn start_record(&self) -> i64 {
        self.start_record
    }

    /// Number of records skipped before the first yielded one.
    pub fn skip_count(&self) -> u64 {
        u64::try_from(self.start_record.saturating_sub(1)).unwrap_or(0)
    }

    /// 1-based number of the first yielded record.
    pub fn first_line(&self) -> u64 {
        self.skip_count() + 1
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.start_record <= 0 {
            return Err(config_error("start record must be at least 1")
                .with_hint("Records are numbered from 1."));
        }
        if self.schema.is_empty() {
            return Err(config_error("schema must declare at least one column"));
        }
        if !self.record_delimiter.is_ascii() {
            return Err(config_error(format!(
                "record delimiter {:?} must be an ASCII character",
                self.record_delimiter
            )));
        }
        let chars = [
            ("column delimiter", self.column_delimiter),
            ("record delimiter", self.record_delimiter),
            ("quote character", self.quote),
        ];
        for (i, (left_name, left)) in chars.iter().enumerate() {
            for (right_name, right) in &chars[i + 1..] {
                if left == right {
                    return Err(config_error(format!(
                        "{left_name} and {right_name} are both {left:?}"
                    )));
                }
            }
        }
        Ok(())
    }
}

fn config_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::Configuration).with_message(message)
}

#[cfg(test)]
mod tests {
    use super::{ColumnType, ParserConfig, QuoteMode, Schema};
    use crate::core::error::ErrorKind;

    fn schema() -> Schema {
        Schema::new([ColumnType::Integer, ColumnType::Text])
    }

    #[test]
    fn defaults_match_conventional_csv() {
        let config = ParserConfig::new(schema());
        assert_eq!(config.column_delimiter(), ',');
        assert_eq!(config.record_delimiter(), '\n');
        assert_eq!(config.quote(), '"');
        assert_eq!(config.quote_mode(), QuoteMode::Lenient);
        assert_eq!(config.start_record(), 1);
        assert_eq!(config.skip_count(), 0);
        config.validate().expect("valid");
    }

    #[test]
    fn zero_start_record_is_rejected() {
        let err = ParserConfig::new(schema())
            .with_start_record(0)
            .validate()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn negative_start_record_is_rejected() {
        let config = ParserConfig::new(schema()).with_start_record(-1);
        assert_eq!(config.skip_count(), 0);
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn colliding_delimiters_are_rejected() {
        let err = ParserConfig::new(schema())
            .with_quote(',')
            .validate()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.message().unwrap().contains("quote character"));
    }

    #[test]
    fn non_ascii_record_delimiter_is_rejected() {
        let err = ParserConfig::new(schema())
            .with_record_delimiter('¶')
            .validate()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn empty_schema_is_rejected() {
        let err = ParserConfig::new(Schema::new(Vec::new()))
            .validate()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn schema_parses_type_aliases() {
        let schema: Schema = "int, text,FLOAT,bool,u64,string".parse().expect("schema");
        assert_eq!(
            schema.columns(),
            &[
                ColumnType::Integer,
                ColumnType::Text,
                ColumnType::Float,
                ColumnType::Boolean,
                ColumnType::Unsigned,
                ColumnType::Text,
            ]
        );
    }

    #[test]
    fn schema_rejects_unknown_type() {
        let err = "int,date".parse::<Schema>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert!(err.message().unwrap().contains("date"));
    }
}
