//! Interactive console prompt implementation.

use async_trait::async_trait;
use tracing::warn;

use crate::interfaces::ConfirmationPrompt;
use crate::types::{Decision, PromptOptions};

/// Confirmation prompt reading a yes/no answer from standard input.
///
/// An empty answer or an unreadable terminal resolves to the caller's
/// default decision, so non-interactive runs never hang.
#[derive(Debug, Default, Clone)]
pub struct ConsolePrompt;

impl ConsolePrompt {
    pub fn new() -> Self {
        Self
    }

    fn parse_answer(answer: &str, options: &PromptOptions) -> Decision {
        match answer.trim().to_lowercase().as_str() {
            "y" | "yes" => Decision::Continue,
            "n" | "no" => Decision::Abort,
            "" => options.default,
            other => {
                warn!(answer = other, "Unrecognized answer, using the default");
                options.default
            }
        }
    }
}

#[async_trait]
impl ConfirmationPrompt for ConsolePrompt {
    async fn confirm(&self, message: &str, options: &PromptOptions) -> Decision {
        let suffix = match options.default {
            Decision::Continue => "[Y/n]",
            Decision::Abort => "[y/N]",
        };
        println!("{message} {suffix}");

        let options = *options;
        let answer = tokio::task::spawn_blocking(move || {
            let mut line = String::new();
            match std::io::stdin().read_line(&mut line) {
                Ok(_) => line,
                Err(_) => String::new(),
            }
        })
        .await
        .unwrap_or_default();

        Self::parse_answer(&answer, &options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_answers_win_over_the_default() {
        let abort_default = PromptOptions {
            default: Decision::Abort,
        };
        assert_eq!(
            ConsolePrompt::parse_answer("y", &abort_default),
            Decision::Continue
        );
        assert_eq!(
            ConsolePrompt::parse_answer("No", &PromptOptions::default()),
            Decision::Abort
        );
    }

    #[test]
    fn blank_answers_fall_back_to_the_default() {
        assert_eq!(
            ConsolePrompt::parse_answer("\n", &PromptOptions::default()),
            Decision::Continue
        );
        assert_eq!(
            ConsolePrompt::parse_answer(
                "",
                &PromptOptions {
                    default: Decision::Abort
                }
            ),
            Decision::Abort
        );
    }
}
