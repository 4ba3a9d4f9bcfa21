// Core modules implementing configuration, tokenizing, conversion, and row iteration.
pub mod config;
pub mod convert;
pub mod cursor;
pub mod error;
pub mod source;
pub mod tokenize;
