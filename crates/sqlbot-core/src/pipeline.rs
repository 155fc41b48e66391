//! Pipeline orchestrator - one turn per inbound question
//!
//! Translating → Validating → Executing → Composing → Done, short-circuiting
//! into a failed turn at the first three stages. Composition never fails a
//! turn once execution succeeded.

use std::fmt;
use std::sync::Arc;

use tracing::Instrument;
use uuid::Uuid;

use crate::completion::CompletionService;
use crate::composer::ResponseComposer;
use crate::error::{PipelineError, ReplyMessages};
use crate::executor::QueryExecutor;
use crate::instructions::Instructions;
use crate::schema::SchemaDescriptor;
use crate::translator::{CandidateQuery, QueryTranslator, TranslationRequest};
use crate::validator::ValidatedQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Translating,
    Validating,
    Executing,
    Composing,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Translating => "translating",
            Stage::Validating => "validating",
            Stage::Executing => "executing",
            Stage::Composing => "composing",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub enum Outcome {
    Answered {
        sql: String,
        row_count: usize,
        /// False when the composer fell back to the canned sentence
        composed: bool,
    },
    Failed {
        stage: Stage,
        error: PipelineError,
    },
}

impl Outcome {
    /// Stable label for metrics
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Answered { .. } => "answered",
            Outcome::Failed { error, .. } => error.kind(),
        }
    }
}

/// Result of one full pipeline run
#[derive(Debug)]
pub struct Turn {
    pub id: Uuid,
    pub reply: String,
    pub outcome: Outcome,
}

pub struct Pipeline {
    schema: Arc<SchemaDescriptor>,
    translator: QueryTranslator,
    executor: Arc<dyn QueryExecutor>,
    composer: ResponseComposer,
    messages: ReplyMessages,
}

impl Pipeline {
    pub fn new(
        schema: Arc<SchemaDescriptor>,
        completion: Arc<dyn CompletionService>,
        executor: Arc<dyn QueryExecutor>,
        messages: ReplyMessages,
    ) -> Self {
        let instructions = Arc::new(Instructions::new(&schema));
        let translator = QueryTranslator::new(completion.clone(), instructions.clone());
        let composer = ResponseComposer::new(
            completion,
            instructions,
            messages.composition_fallback.clone(),
        );

        Self {
            schema,
            translator,
            executor,
            composer,
            messages,
        }
    }

    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    /// Run one turn for `question` and produce the reply to send back
    pub async fn run(&self, question: &str) -> Turn {
        let id = Uuid::new_v4();
        let span = tracing::info_span!("turn", turn_id = %id);

        async move {
            tracing::info!(question = %question, "turn started");

            let (outcome, reply) = match self.run_stages(question).await {
                Ok(answered) => answered,
                Err((stage, error)) => {
                    tracing::warn!(stage = %stage, kind = error.kind(), error = %error, "turn failed");
                    let reply = self.messages.for_error(&error).to_string();
                    (Outcome::Failed { stage, error }, reply)
                }
            };

            tracing::info!(outcome = outcome.label(), reply = %reply, "turn finished");
            Turn { id, reply, outcome }
        }
        .instrument(span)
        .await
    }

    async fn run_stages(&self, question: &str) -> Result<(Outcome, String), (Stage, PipelineError)> {
        tracing::debug!(stage = %Stage::Translating, "stage entered");
        let candidate = self
            .translator
            .translate(TranslationRequest {
                question,
                schema: &self.schema,
            })
            .await;

        let statement = match candidate {
            CandidateQuery::Statement(sql) => sql,
            CandidateQuery::Declined(reason) => {
                return Err((Stage::Translating, PipelineError::TranslationDeclined(reason)));
            }
        };
        tracing::info!(stage = %Stage::Translating, sql = %statement, "SQL generated");

        tracing::debug!(stage = %Stage::Validating, "stage entered");
        let query = ValidatedQuery::new(&statement).ok_or_else(|| {
            (
                Stage::Validating,
                PipelineError::SafetyRejected {
                    candidate: statement.clone(),
                },
            )
        })?;

        tracing::debug!(stage = %Stage::Executing, "stage entered");
        let rows = self
            .executor
            .execute(&query)
            .await
            .map_err(|e| (Stage::Executing, PipelineError::from(e)))?;
        tracing::info!(stage = %Stage::Executing, rows = rows.len(), data = %rows.to_compact_json(), "query executed");

        tracing::debug!(stage = %Stage::Composing, "stage entered");
        let answer = self.composer.compose(question, &rows).await;
        tracing::info!(stage = %Stage::Done, composed = answer.composed, "answer ready");

        Ok((
            Outcome::Answered {
                sql: query.as_str().to_string(),
                row_count: rows.len(),
                composed: answer.composed,
            },
            answer.text,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_labels() {
        assert_eq!(Stage::Translating.to_string(), "translating");
        assert_eq!(Stage::Done.as_str(), "done");
    }

    #[test]
    fn test_outcome_labels() {
        let answered = Outcome::Answered {
            sql: "select 1".to_string(),
            row_count: 1,
            composed: true,
        };
        assert_eq!(answered.label(), "answered");

        let failed = Outcome::Failed {
            stage: Stage::Validating,
            error: PipelineError::SafetyRejected {
                candidate: "drop table artists".to_string(),
            },
        };
        assert_eq!(failed.label(), "rejected");
    }
}
