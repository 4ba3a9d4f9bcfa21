// Forward-only row cursor over a record source, re-parsing the buffered record on each read.
use tracing::{debug, trace};

use crate::core::config::ParserConfig;
use crate::core::convert::{TypedRow, convert_row};
use crate::core::error::{Error, ErrorKind};
use crate::core::source::RecordSource;
use crate::core::tokenize::{RawFields, tokenize_into};

/// Where a cursor stands. `End` is the canonical sentinel every exhausted cursor equals.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CursorPosition {
    Record(u64),
    End,
}

#[derive(Debug)]
pub struct RowCursor<'a, S: RecordSource + ?Sized> {
    source: &'a mut S,
    config: &'a ParserConfig,
    record: String,
    fields: RawFields,
    line: u64,
    exhausted: bool,
}

impl<'a, S: RecordSource + ?Sized> RowCursor<'a, S> {
    /// Validates `config`, skips to its start record, and buffers that record.
    ///
    /// Records are split by `source`; the cursor trusts that split and never reads
    /// the config's record delimiter. Build `DelimitedReader` sources with
    /// `DelimitedReader::with_config` to keep the two in agreement.
    ///
    /// An empty source with no records to skip yields an already exhausted cursor.
    pub fn new(source: &'a mut S, config: &'a ParserConfig) -> Result<Self, Error> {
        config.validate()?;
        let skip = config.skip_count();
        for skipped in 0..skip {
            if !source.skip_record()? {
                return Err(out_of_range(config.first_line(), skipped));
            }
        }
        if skip > 0 {
            debug!(skipped = skip, "skipped leading records");
        }

        let mut record = String::new();
        let exhausted = !source.next_record(&mut record)?;
        if exhausted && skip > 0 {
            return Err(out_of_range(config.first_line(), skip));
        }
        debug!(start = config.first_line(), exhausted, "row cursor opened");

        Ok(Self {
            source,
            config,
            record,
            fields: RawFields::default(),
            line: config.first_line(),
            exhausted,
        })
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn position(&self) -> CursorPosition {
        if self.exhausted {
            CursorPosition::End
        } else {
            CursorPosition::Record(self.line)
        }
    }

    /// 1-based number of the buffered record, or `None` once exhausted.
    pub fn line(&self) -> Option<u64> {
        match self.position() {
            CursorPosition::Record(line) => Some(line),
            CursorPosition::End => None,
        }
    }

    /// The buffered record text, without its delimiter.
    pub fn record(&self) -> Option<&str> {
        (!self.exhausted).then_some(self.record.as_str())
    }

    /// Moves to the next record. A no-op once exhausted.
    ///
    /// A source error is terminal: the cursor is exhausted before the error is returned.
    pub fn advance(&mut self) -> Result<(), Error> {
        if self.exhausted {
            return Ok(());
        }
        let read = match self.source.next_record(&mut self.record) {
            Ok(read) => read,
            Err(err) => {
                self.exhausted = true;
                self.record.clear();
                debug!(last_line = self.line, "row cursor stopped on source error");
                return Err(err);
            }
        };
        if read {
            self.line += 1;
            trace!(line = self.line, "advanced");
        } else {
            self.exhausted = true;
            self.record.clear();
            debug!(last_line = self.line, "row cursor exhausted");
        }
        Ok(())
    }

    /// Tokenizes the buffered record.
    pub fn raw_fields(&mut self) -> Result<&RawFields, Error> {
        self.ensure_live()?;
        tokenize_into(&self.record, self.config, self.line, &mut self.fields)?;
        Ok(&self.fields)
    }

    /// Tokenizes and converts the buffered record into a fresh row.
    pub fn current(&mut self) -> Result<TypedRow, Error> {
        let line = self.line;
        let config = self.config;
        let fields = self.raw_fields()?;
        convert_row(fields.fields(), config.schema(), line)
    }

    pub fn rows(self) -> Rows<'a, S> {
        Rows {
            cursor: self,
            pending: None,
            done: false,
        }
    }

    fn ensure_live(&self) -> Result<(), Error> {
        if self.exhausted {
            return Err(Error::new(ErrorKind::CursorExhausted)
                .with_message("cursor is past the last record"));
        }
        Ok(())
    }
}

impl<'a, S: RecordSource + ?Sized> IntoIterator for RowCursor<'a, S> {
    type Item = Result<TypedRow, Error>;
    type IntoIter = Rows<'a, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows()
    }
}

/// Iterator adapter: read the current row, then advance.
///
/// Row errors are yielded in place and iteration continues with the next record.
/// A source error while advancing is yielded once and ends the iteration.
#[derive(Debug)]
pub struct Rows<'a, S: RecordSource + ?Sized> {
    cursor: RowCursor<'a, S>,
    pending: Option<Error>,
    done: bool,
}

impl<'a, S: RecordSource + ?Sized> Rows<'a, S> {
    pub fn cursor(&self) -> &RowCursor<'a, S> {
        &self.cursor
    }
}

impl<S: RecordSource + ?Sized> Iterator for Rows<'_, S> {
    type Item = Result<TypedRow, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(err) = self.pending.take() {
            return Some(Err(err));
        }
        if self.done || self.cursor.is_exhausted() {
            return None;
        }
        let row = self.cursor.current();
        if let Err(err) = self.cursor.advance() {
            self.pending = Some(err);
            self.done = true;
        }
        Some(row)
    }
}

impl<S: RecordSource + ?Sized> std::iter::FusedIterator for Rows<'_, S> {}

fn out_of_range(start_record: u64, available: u64) -> Error {
    Error::new(ErrorKind::StartOffsetOutOfRange).with_message(format!(
        "start record {start_record} is beyond the end of input ({available} records)"
    ))
}
