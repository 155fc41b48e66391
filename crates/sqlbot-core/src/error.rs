//! Failure taxonomy of a pipeline turn
//!
//! Internal only: users see one of the fixed [`ReplyMessages`], never this
//! detail.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::executor::ExecutionError;
use crate::translator::DeclineReason;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Translation declined: {0}")]
    TranslationDeclined(DeclineReason),

    #[error("Safety check rejected candidate: {candidate}")]
    SafetyRejected { candidate: String },

    #[error("Execution failed: {0}")]
    Execution(#[from] ExecutionError),
}

impl PipelineError {
    /// Stable label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::TranslationDeclined(_) => "declined",
            PipelineError::SafetyRejected { .. } => "rejected",
            PipelineError::Execution(_) => "execution_failed",
        }
    }
}

/// Fixed user-facing texts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplyMessages {
    /// Sent for both a translator decline and a validator rejection
    pub declined: String,
    pub unexpected_error: String,
    /// Used when the rows could not be phrased
    pub composition_fallback: String,
}

impl Default for ReplyMessages {
    fn default() -> Self {
        Self {
            declined: "Error, no puedo procesar esa consulta. Estoy programado para realizar únicamente operaciones de lectura.".to_string(),
            unexpected_error: "Lo siento, ocurrió un error inesperado al procesar tu solicitud. Por favor, inténtalo nuevamente.".to_string(),
            composition_fallback: "No pude interpretar los resultados, pero la consulta fue exitosa.".to_string(),
        }
    }
}

impl ReplyMessages {
    /// The user-facing text for a terminal failure
    pub fn for_error(&self, error: &PipelineError) -> &str {
        match error {
            PipelineError::TranslationDeclined(_) | PipelineError::SafetyRejected { .. } => {
                &self.declined
            }
            PipelineError::Execution(_) => &self.unexpected_error,
        }
    }
}
