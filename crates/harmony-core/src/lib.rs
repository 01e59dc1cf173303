//! # Harmony Core
//!
//! Pure logic for Harmony match results: the instrument/question data model,
//! the match-filtering engine, result options and their single-instrument
//! override, import-URL encoding, selection splitting, and the import history.
//!
//! This crate performs no I/O and has no async runtime. File formats, HTTP,
//! and the extension background worker live in the `harmony` crate.

pub mod error;
pub mod filter;
pub mod history;
pub mod import_url;
pub mod models;
pub mod options;
pub mod selection;
