//! Error types for the task ordering module.
use thiserror::Error;

/// Represents errors that can occur while computing the task order.
#[derive(Debug, Error)]
pub enum OrderingError {
    /// The declared master-detail relationships cannot be linearized. The
    /// listed objects are those left unordered once every placeable object
    /// was placed, i.e. the cycle members and anything constrained behind
    /// them.
    #[error("master-detail relationships form a cycle; unorderable objects: {objects:?}")]
    MasterDetailCycle { objects: Vec<String> },
}
