//! Purpose: Library crate behind the `rowcast` CLI: quote-aware delimited text to typed rows.
//! Exports: `api` (stable surface), `render` (row presentation), `notice` (stderr notices).
//! Role: Core modules stay private; callers go through `api`.
//! Invariants: Parsing is single-threaded, synchronous, and forward-only.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
mod core;

pub mod api;
pub mod notice;
pub mod render;
