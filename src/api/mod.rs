//! Purpose: Define the stable public Rust API boundary for rowcast.
//! Exports: Config, tokenizer, converter, source, and cursor types plus the error model.
//! Role: Public, additive-only surface; hides internal module layout.
//! Invariants: This module is the only public path to the core modules.

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::config::{
    ColumnType, DEFAULT_COLUMN_DELIMITER, DEFAULT_QUOTE, DEFAULT_RECORD_DELIMITER, ParserConfig,
    QuoteMode, Schema,
};
pub use crate::core::convert::{TypedRow, Value, convert_field, convert_row};
pub use crate::core::cursor::{CursorPosition, RowCursor, Rows};
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::source::{DelimitedReader, RecordSource};
pub use crate::core::tokenize::{RawFields, tokenize};
