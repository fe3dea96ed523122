//! # Migrator Shared
//! This crate defines shared data structures and types used across the record
//! migrator ecosystem. It includes common definitions for migrated object
//! descriptions, record sets, and CSV issue reports.
pub mod types;
