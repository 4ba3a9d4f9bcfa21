//! Purpose: Record sources: pull one delimiter-terminated record at a time.
//! Exports: `RecordSource`, `DelimitedReader`.
//! Role: Boundary between byte input (files, stdin, buffers) and the row cursor.
//! Invariants: Records are returned without their trailing delimiter.
//! Invariants: A final record without a trailing delimiter is still returned; an empty tail is not.
//! Invariants: Only one record is buffered at a time; records must be valid UTF-8.
use std::io::{self, BufRead};

use bstr::ByteSlice;

use crate::core::config::ParserConfig;
use crate::core::error::{Error, ErrorKind};

/// Sequential, forward-only supplier of raw records.
pub trait RecordSource {
    /// Replaces `record` with the next record. Returns `false` once exhausted.
    fn next_record(&mut self, record: &mut String) -> Result<bool, Error>;

    /// Discards the next record. Returns `false` if there was none.
    fn skip_record(&mut self) -> Result<bool, Error> {
        let mut scratch = String::new();
        self.next_record(&mut scratch)
    }
}

impl<S: RecordSource + ?Sized> RecordSource for &mut S {
    fn next_record(&mut self, record: &mut String) -> Result<bool, Error> {
        (**self).next_record(record)
    }

    fn skip_record(&mut self) -> Result<bool, Error> {
        (**self).skip_record()
    }
}

/// Splits a buffered byte reader on a single-byte record delimiter.
#[derive(Debug)]
pub struct DelimitedReader<R> {
    reader: R,
    delimiter: u8,
    buf: Vec<u8>,
    records_read: u64,
}

impl<R: BufRead> DelimitedReader<R> {
    pub fn new(reader: R, delimiter: u8) -> Self {
        Self {
            reader,
            delimiter,
            buf: Vec::new(),
            records_read: 0,
        }
    }

    /// Splits on `config`'s record delimiter. Call after `config.validate()`.
    pub fn with_config(reader: R, config: &ParserConfig) -> Self {
        Self::new(reader, config.record_delimiter_byte())
    }

    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    fn fill(&mut self) -> Result<bool, Error> {
        self.buf.clear();
        let read = self
            .reader
            .read_until(self.delimiter, &mut self.buf)
            .map_err(|err| io_error(err, "failed to read record"))?;
        if read == 0 {
            return Ok(false);
        }
        if self.buf.last() == Some(&self.delimiter) {
            self.buf.pop();
        }
        self.records_read += 1;
        Ok(true)
    }
}

impl<R: BufRead> RecordSource for DelimitedReader<R> {
    fn next_record(&mut self, record: &mut String) -> Result<bool, Error> {
        if !self.fill()? {
            return Ok(false);
        }
        let text = self.buf.to_str().map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message(format!(
                    "record is not valid UTF-8: {}",
                    self.buf.to_str_lossy()
                ))
                .with_line(self.records_read)
                .with_source(err)
        })?;
        record.clear();
        record.push_str(text);
        Ok(true)
    }

    fn skip_record(&mut self) -> Result<bool, Error> {
        self.fill()
    }
}

fn io_error(err: io::Error, message: &str) -> Error {
    Error::new(ErrorKind::Io)
        .with_message(message)
        .with_source(err)
}

#[cfg(test)]
mod tests {
    use super::{DelimitedReader, RecordSource};
    use crate::core::config::{ColumnType, ParserConfig, Schema};
    use crate::core::error::ErrorKind;

    fn collect(input: &[u8], delimiter: u8) -> Vec<String> {
        let mut source = DelimitedReader::new(input, delimiter);
        let mut out = Vec::new();
        let mut record = String::new();
        while source.next_record(&mut record).expect("read") {
            out.push(record.clone());
        }
        out
    }

    #[test]
    fn splits_on_delimiter_and_keeps_unterminated_tail() {
        assert_eq!(collect(b"a,b\nc,d\ne", b'\n'), ["a,b", "c,d", "e"]);
    }

    #[test]
    fn trailing_delimiter_does_not_add_empty_record() {
        assert_eq!(collect(b"a\nb\n", b'\n'), ["a", "b"]);
        assert!(collect(b"", b'\n').is_empty());
    }

    #[test]
    fn blank_lines_in_the_middle_are_records() {
        assert_eq!(collect(b"a\n\nb\n", b'\n'), ["a", "", "b"]);
    }

    #[test]
    fn custom_delimiter_leaves_newlines_in_records() {
        assert_eq!(collect(b"x\ny|z", b'|'), ["x\ny", "z"]);
    }

    #[test]
    fn config_record_delimiter_drives_splitting() {
        let config =
            ParserConfig::new(Schema::new([ColumnType::Text])).with_record_delimiter(';');
        let mut source = DelimitedReader::with_config(&b"a\nb;c"[..], &config);
        let mut record = String::new();
        assert!(source.next_record(&mut record).expect("first"));
        assert_eq!(record, "a\nb");
        assert!(source.next_record(&mut record).expect("second"));
        assert_eq!(record, "c");
        assert!(!source.next_record(&mut record).expect("end"));
    }

    #[test]
    fn skip_counts_records_without_decoding() {
        let input = b"\xff\xfe\nok\n";
        let mut source = DelimitedReader::new(&input[..], b'\n');
        assert!(source.skip_record().expect("skip"));
        let mut record = String::new();
        assert!(source.next_record(&mut record).expect("read"));
        assert_eq!(record, "ok");
        assert_eq!(source.records_read(), 2);
        assert!(!source.skip_record().expect("skip at end"));
    }

    #[test]
    fn invalid_utf8_is_an_io_error() {
        let input = b"ok\n\xff\n";
        let mut source = DelimitedReader::new(&input[..], b'\n');
        let mut record = String::new();
        assert!(source.next_record(&mut record).expect("first"));
        let err = source.next_record(&mut record).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.line(), Some(2));
    }
}
