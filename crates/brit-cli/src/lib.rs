//! # brit-cli — BRIT Command-Line Interface
//!
//! Operates the publication workflow over a JSON object store file.
//!
//! ## Subcommands
//!
//! - `list`: records and their publication status
//! - `policy`: the capability flags of a user on one record
//! - `check`: prepublish readiness report
//! - `submit`, `withdraw`, `approve`, `reject`, `archive`: guarded actions
//! - `repair`: restore review stamp invariants on drifted records
//!
//! Argument parsing lives in `main.rs`; handlers here delegate to the
//! library crates and return the process exit code.

pub mod commands;
pub mod config;
pub mod store_file;
