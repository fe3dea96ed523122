//! Configuration and dependency initialization for the migrator.

mod dependencies;

pub use dependencies::{Dependencies, JobDescription};
