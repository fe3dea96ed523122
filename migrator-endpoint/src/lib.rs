//! # Migrator Endpoint
//!
//! This crate provides the capability interfaces consumed by the migration
//! pipeline and a concrete CSV file backend. It includes definitions for
//! errors, interfaces, and implementations backed by tabular files on disk.

pub mod console;
pub mod csv;
pub mod errors;
pub mod interfaces;
pub mod types;

pub use console::ConsolePrompt;
pub use csv::{CsvRecordEndpoint, CsvTabularStore};
pub use errors::{EndpointError, TabularStoreError};
pub use interfaces::{ConfirmationPrompt, RecordEndpoint, TabularStore};
pub use types::{Decision, PromptOptions, QueryDirection, RecordRow, TableData, UpdateDirection};
