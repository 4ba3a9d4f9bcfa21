//! Purpose: Split one raw record into raw string fields, honoring quoting and escaping.
//! Exports: `RawFields`, `tokenize`, `tokenize_into`.
//! Role: Correctness-critical scanner between the record source and the typed converter.
//! Invariants: One left-to-right pass over the record's chars; no lookahead.
//! Invariants: A record yields `delimiters outside quotes + 1` fields.
//! Invariants: A record must not end inside an open quote and must match the schema arity.
use crate::core::config::{ParserConfig, QuoteMode};
use crate::core::error::{Error, ErrorKind};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum ScanState {
    /// Outside quotes.
    Reading,
    /// Inside a quoted section.
    Screening,
    /// Just saw a quote inside a quoted section: either a close or the first of `""`.
    EscapeScreening,
}

/// Fields of one record plus the char offset each field starts at.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RawFields {
    fields: Vec<String>,
    starts: Vec<usize>,
}

impl RawFields {
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Char offset within the record where field `index` begins.
    pub fn start_of(&self, index: usize) -> Option<usize> {
        self.starts.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_fields(self) -> Vec<String> {
        self.fields
    }

    fn reset(&mut self) {
        self.fields.clear();
        self.starts.clear();
        self.open(0);
    }

    fn open(&mut self, start: usize) {
        self.fields.push(String::new());
        self.starts.push(start);
    }

    fn push(&mut self, c: char) {
        if let Some(field) = self.fields.last_mut() {
            field.push(c);
        }
    }

    fn current_index(&self) -> usize {
        self.fields.len().saturating_sub(1)
    }
}

pub fn tokenize(record: &str, config: &ParserConfig, line: u64) -> Result<RawFields, Error> {
    let mut out = RawFields::default();
    tokenize_into(record, config, line, &mut out)?;
    Ok(out)
}

/// Tokenizes into `out`, overwriting whatever it held. `line` is only used for errors.
pub fn tokenize_into(
    record: &str,
    config: &ParserConfig,
    line: u64,
    out: &mut RawFields,
) -> Result<(), Error> {
    let delimiter = config.column_delimiter();
    let quote = config.quote();
    let mut state = ScanState::Reading;
    out.reset();

    for (pos, c) in record.chars().enumerate() {
        state = match state {
            ScanState::Reading => {
                if c == delimiter {
                    out.open(pos + 1);
                    ScanState::Reading
                } else if c == quote {
                    ScanState::Screening
                } else {
                    out.push(c);
                    ScanState::Reading
                }
            }
            ScanState::Screening => {
                if c == quote {
                    ScanState::EscapeScreening
                } else {
                    out.push(c);
                    ScanState::Screening
                }
            }
            ScanState::EscapeScreening => {
                if c == delimiter {
                    out.open(pos + 1);
                    ScanState::Reading
                } else if c == quote {
                    out.push(quote);
                    ScanState::Screening
                } else {
                    match config.quote_mode() {
                        QuoteMode::Lenient => ScanState::Reading,
                        QuoteMode::Strict => {
                            return Err(malformed(out, line).with_message(format!(
                                "unexpected {c:?} after closing quote at offset {pos}"
                            )));
                        }
                    }
                }
            }
        };
    }

    // A quote as the last char closes its field; only an open quote is malformed.
    if state == ScanState::Screening {
        return Err(malformed(out, line).with_message("record ends inside a quoted field"));
    }

    let expected = config.schema().len();
    if out.len() != expected {
        return Err(Error::new(ErrorKind::SchemaMismatch)
            .with_message("field count does not match schema")
            .with_line(line)
            .with_counts(expected, out.len()));
    }
    Ok(())
}

fn malformed(out: &RawFields, line: u64) -> Error {
    Error::new(ErrorKind::MalformedField)
        .with_line(line)
        .with_field(out.current_index())
}

#[cfg(test)]
mod tests {
    use super::{RawFields, tokenize, tokenize_into};
    use crate::core::config::{ColumnType, ParserConfig, QuoteMode, Schema};
    use crate::core::error::ErrorKind;

    fn config(arity: usize) -> ParserConfig {
        ParserConfig::new(Schema::new(vec![ColumnType::Text; arity]))
    }

    fn fields(record: &str, arity: usize) -> Vec<String> {
        tokenize(record, &config(arity), 1)
            .expect("tokenize")
            .into_fields()
    }

    #[test]
    fn unquoted_fields_split_on_every_delimiter() {
        assert_eq!(fields("a,b,c", 3), ["a", "b", "c"]);
        assert_eq!(fields(",,", 3), ["", "", ""]);
        assert_eq!(fields("", 1), [""]);
        assert_eq!(fields(" x , y ", 2), [" x ", " y "]);
    }

    #[test]
    fn quoted_fields_keep_delimiters_and_escaped_quotes() {
        assert_eq!(
            fields(r#"10,"a,b","c""d""#, 3),
            ["10", "a,b", "c\"d"]
        );
        assert_eq!(fields("\"line\nbreak\",x", 2), ["line\nbreak", "x"]);
        assert_eq!(fields(r#""""""#, 1), ["\""]);
        assert_eq!(fields(r#""""#, 1), [""]);
    }

    #[test]
    fn quotes_inside_unquoted_text_switch_mode() {
        assert_eq!(fields(r#"ab"c,d"e,f"#, 2), ["abc,d", "f"]);
    }

    #[test]
    fn lenient_mode_drops_char_after_closing_quote() {
        assert_eq!(fields(r#""ab"cd,e"#, 2), ["abd", "e"]);
    }

    #[test]
    fn strict_mode_rejects_char_after_closing_quote() {
        let cfg = config(2).with_quote_mode(QuoteMode::Strict);
        let err = tokenize(r#""ab"cd,e"#, &cfg, 7).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedField);
        assert_eq!(err.line(), Some(7));
        assert_eq!(err.field(), Some(0));
    }

    #[test]
    fn unterminated_quote_is_malformed() {
        let err = tokenize(r#"a,"bc"#, &config(2), 3).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedField);
        assert_eq!(err.line(), Some(3));
        assert_eq!(err.field(), Some(1));
    }

    #[test]
    fn closing_quote_at_end_of_record_closes_field() {
        assert_eq!(fields(r#"a,"bc""#, 2), ["a", "bc"]);
    }

    #[test]
    fn escaped_quote_without_close_is_malformed() {
        let err = tokenize(r#""ab"""#, &config(1), 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedField);
        assert_eq!(err.field(), Some(0));
    }

    #[test]
    fn arity_mismatch_reports_counts() {
        let err = tokenize("1,2", &config(3), 5).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
        assert_eq!(err.line(), Some(5));
        assert_eq!(err.expected(), Some(3));
        assert_eq!(err.actual(), Some(2));
    }

    #[test]
    fn custom_characters_are_honored() {
        let cfg = config(3).with_column_delimiter(';').with_quote('\'');
        assert_eq!(
            tokenize("1;'a;b';'it''s'", &cfg, 1).unwrap().into_fields(),
            ["1", "a;b", "it's"]
        );
    }

    #[test]
    fn field_starts_track_char_offsets() {
        let raw = tokenize("ä,\"b,c\",d", &config(3), 1).expect("tokenize");
        assert_eq!(raw.start_of(0), Some(0));
        assert_eq!(raw.start_of(1), Some(2));
        assert_eq!(raw.start_of(2), Some(8));
        assert_eq!(raw.start_of(3), None);
    }

    #[test]
    fn reused_buffer_is_overwritten() {
        let cfg = config(2);
        let mut raw = RawFields::default();
        tokenize_into("a,b", &cfg, 1, &mut raw).expect("first");
        tokenize_into("c,d", &cfg, 2, &mut raw).expect("second");
        assert_eq!(raw.fields(), ["c", "d"]);
    }

    #[test]
    fn field_count_is_unquoted_delimiters_plus_one() {
        for record in ["", "a", "a,b", ",,,", "x,,y,z"] {
            let expected = record.matches(',').count() + 1;
            let got = tokenize(record, &config(expected), 1).expect("tokenize");
            assert_eq!(got.len(), expected, "record {record:?}");
        }
    }
}
