//! Rows → natural-language answer via the completion service

use std::sync::Arc;

use crate::completion::{CompletionRequest, CompletionService};
use crate::executor::ResultSet;
use crate::instructions::Instructions;

/// Output budget for the final answer
pub const COMPOSITION_MAX_TOKENS: u32 = 200;

/// A composed answer; `composed` is false when the fallback sentence was used
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    pub composed: bool,
}

pub struct ResponseComposer {
    completion: Arc<dyn CompletionService>,
    instructions: Arc<Instructions>,
    fallback: String,
}

impl ResponseComposer {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        instructions: Arc<Instructions>,
        fallback: impl Into<String>,
    ) -> Self {
        Self {
            completion,
            instructions,
            fallback: fallback.into(),
        }
    }

    /// Phrase `rows` as an answer to `question`. Never fails.
    pub async fn compose(&self, question: &str, rows: &ResultSet) -> Answer {
        let request = CompletionRequest {
            system: self.instructions.answer().to_string(),
            user: user_message(question, rows),
            temperature: 0.0,
            max_tokens: COMPOSITION_MAX_TOKENS,
        };

        match self.completion.complete(request).await {
            Ok(text) => Answer {
                text,
                composed: true,
            },
            Err(e) => {
                tracing::warn!(error = %e, "failed to compose answer, using fallback");
                Answer {
                    text: self.fallback.clone(),
                    composed: false,
                }
            }
        }
    }
}

fn user_message(question: &str, rows: &ResultSet) -> String {
    format!(
        "The original question was: \"{}\"\n\nThe data obtained is: {}",
        question,
        rows.to_compact_json()
    )
}
