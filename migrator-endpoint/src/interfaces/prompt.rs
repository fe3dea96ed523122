//! Confirmation prompt trait definition.

use async_trait::async_trait;

use crate::types::{Decision, PromptOptions};

/// Abstracts an interactive continue/abort confirmation.
///
/// Modeling the prompt as a capability returning a [`Decision`] keeps the
/// pipeline control flow deterministic and testable without a real terminal;
/// callers perform any side effect (such as flushing a report file) before
/// awaiting the decision.
#[async_trait]
pub trait ConfirmationPrompt: Send + Sync {
    /// Ask the user whether to continue.
    ///
    /// Implementations fall back to `options.default` when no explicit
    /// answer can be obtained.
    async fn confirm(&self, message: &str, options: &PromptOptions) -> Decision;
}
