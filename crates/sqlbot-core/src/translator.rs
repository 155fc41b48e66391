//! Natural language → candidate SQL via the completion service

use std::fmt;
use std::sync::Arc;

use crate::completion::{CompletionRequest, CompletionService};
use crate::instructions::{Instructions, FAILURE_MARKER};
use crate::schema::SchemaDescriptor;

/// Output budget for a single statement
pub const TRANSLATION_MAX_TOKENS: u32 = 150;

/// Why the translator produced the failure marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclineReason {
    /// The model answered with the failure marker itself
    Marker,
    /// The completion call failed; the detail is for logs only
    Service(String),
}

impl fmt::Display for DeclineReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclineReason::Marker => write!(f, "model returned {}", FAILURE_MARKER),
            DeclineReason::Service(detail) => write!(f, "completion failed: {}", detail),
        }
    }
}

/// What the translator hands to the validator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateQuery {
    Statement(String),
    Declined(DeclineReason),
}

impl CandidateQuery {
    /// Classify raw model output: trimmed, and the bare marker means declined
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed == FAILURE_MARKER {
            CandidateQuery::Declined(DeclineReason::Marker)
        } else {
            CandidateQuery::Statement(trimmed.to_string())
        }
    }

    pub fn is_declined(&self) -> bool {
        matches!(self, CandidateQuery::Declined(_))
    }
}

/// Per-message input to the translator
#[derive(Debug, Clone, Copy)]
pub struct TranslationRequest<'a> {
    pub question: &'a str,
    pub schema: &'a SchemaDescriptor,
}

pub struct QueryTranslator {
    completion: Arc<dyn CompletionService>,
    instructions: Arc<Instructions>,
}

impl QueryTranslator {
    pub fn new(completion: Arc<dyn CompletionService>, instructions: Arc<Instructions>) -> Self {
        Self {
            completion,
            instructions,
        }
    }

    /// Translate one question. Never fails: service errors become a decline.
    ///
    /// The schema itself is already embedded in the instructions; the request
    /// carries it so callers can log against the descriptor they hold.
    pub async fn translate(&self, request: TranslationRequest<'_>) -> CandidateQuery {
        let completion = CompletionRequest {
            system: self.instructions.sql().to_string(),
            user: request.question.to_string(),
            temperature: 0.0,
            max_tokens: TRANSLATION_MAX_TOKENS,
        };

        match self.completion.complete(completion).await {
            Ok(raw) => {
                tracing::debug!(raw = %raw, "translation completed");
                CandidateQuery::from_raw(&raw)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    tables = request.schema.tables().len(),
                    "failed to generate SQL"
                );
                CandidateQuery::Declined(DeclineReason::Service(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::CompletionError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Canned {
        reply: Result<String, String>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    #[async_trait]
    impl CompletionService for Canned {
        async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
            self.seen.lock().unwrap().push(request);
            self.reply.clone().map_err(CompletionError::Request)
        }
    }

    fn translator(reply: Result<&str, &str>) -> (QueryTranslator, Arc<Canned>) {
        let canned = Arc::new(Canned {
            reply: reply.map(String::from).map_err(String::from),
            seen: Mutex::new(Vec::new()),
        });
        let schema = SchemaDescriptor::artists();
        let instructions = Arc::new(Instructions::new(&schema));
        (QueryTranslator::new(canned.clone(), instructions), canned)
    }

    #[test]
    fn test_from_raw_trims_and_detects_marker() {
        assert_eq!(
            CandidateQuery::from_raw("  ERROR\n"),
            CandidateQuery::Declined(DeclineReason::Marker)
        );
        assert_eq!(
            CandidateQuery::from_raw("\nSELECT 1;  "),
            CandidateQuery::Statement("SELECT 1;".to_string())
        );
        // Only the bare marker counts
        assert!(!CandidateQuery::from_raw("ERROR: no").is_declined());
    }

    #[tokio::test]
    async fn test_translate_sends_deterministic_request() {
        let (translator, canned) = translator(Ok("SELECT COUNT(*) FROM artists"));
        let schema = SchemaDescriptor::artists();

        let candidate = translator
            .translate(TranslationRequest {
                question: "How many artists?",
                schema: &schema,
            })
            .await;

        assert_eq!(
            candidate,
            CandidateQuery::Statement("SELECT COUNT(*) FROM artists".to_string())
        );

        let seen = canned.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].temperature, 0.0);
        assert_eq!(seen[0].max_tokens, TRANSLATION_MAX_TOKENS);
        assert_eq!(seen[0].user, "How many artists?");
        assert!(seen[0].system.contains("Table: artists"));
    }

    #[tokio::test]
    async fn test_service_error_becomes_decline() {
        let (translator, _) = translator(Err("quota exceeded"));
        let schema = SchemaDescriptor::artists();

        let candidate = translator
            .translate(TranslationRequest {
                question: "anything",
                schema: &schema,
            })
            .await;

        match candidate {
            CandidateQuery::Declined(DeclineReason::Service(detail)) => {
                assert!(detail.contains("quota exceeded"));
            }
            other => panic!("expected service decline, got {:?}", other),
        }
    }
}
