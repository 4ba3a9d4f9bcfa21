// Error model shared by the tokenizer, converter, cursor, and CLI.
use std::error::Error as StdError;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Internal,
    Usage,
    Configuration,
    StartOffsetOutOfRange,
    MalformedField,
    SchemaMismatch,
    FieldConversion,
    CursorExhausted,
    Io,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    hint: Option<String>,
    line: Option<u64>,
    field: Option<usize>,
    expected: Option<usize>,
    actual: Option<usize>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            hint: None,
            line: None,
            field: None,
            expected: None,
            actual: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    /// 1-based record number the error was raised for.
    pub fn line(&self) -> Option<u64> {
        self.line
    }

    /// 0-based field (tokenizer) or column (converter) index.
    pub fn field(&self) -> Option<usize> {
        self.field
    }

    pub fn expected(&self) -> Option<usize> {
        self.expected
    }

    pub fn actual(&self) -> Option<usize> {
        self.actual
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_line(mut self, line: u64) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_field(mut self, field: usize) -> Self {
        self.field = Some(field);
        self
    }

    pub fn with_counts(mut self, expected: usize, actual: usize) -> Self {
        self.expected = Some(expected);
        self.actual = Some(actual);
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(line) = self.line {
            write!(f, " (line: {line})")?;
        }
        if let Some(field) = self.field {
            write!(f, " (field: {field})")?;
        }
        if let (Some(expected), Some(actual)) = (self.expected, self.actual) {
            write!(f, " (expected: {expected}, actual: {actual})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage => 2,
        ErrorKind::Configuration => 3,
        ErrorKind::StartOffsetOutOfRange => 4,
        ErrorKind::MalformedField => 5,
        ErrorKind::SchemaMismatch => 6,
        ErrorKind::FieldConversion => 7,
        ErrorKind::CursorExhausted => 8,
        ErrorKind::Io => 9,
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind, to_exit_code};
    use std::error::Error as _;

    #[test]
    fn exit_code_mapping_is_stable() {
        let cases = [
            (ErrorKind::Internal, 1),
            (ErrorKind::Usage, 2),
            (ErrorKind::Configuration, 3),
            (ErrorKind::StartOffsetOutOfRange, 4),
            (ErrorKind::MalformedField, 5),
            (ErrorKind::SchemaMismatch, 6),
            (ErrorKind::FieldConversion, 7),
            (ErrorKind::CursorExhausted, 8),
            (ErrorKind::Io, 9),
        ];

        for (kind, code) in cases {
            assert_eq!(to_exit_code(kind), code);
        }
    }

    #[test]
    fn display_includes_record_context() {
        let err = Error::new(ErrorKind::SchemaMismatch)
            .with_message("field count does not match schema")
            .with_line(4)
            .with_counts(3, 2);
        let text = err.to_string();
        assert!(text.starts_with("SchemaMismatch: field count"));
        assert!(text.contains("(line: 4)"));
        assert!(text.contains("(expected: 3, actual: 2)"));
    }

    #[test]
    fn source_is_chained() {
        let io = std::io::Error::other("disk gone");
        let err = Error::new(ErrorKind::Io).with_source(io);
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("disk gone"));
    }
}
