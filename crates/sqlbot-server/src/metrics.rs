//! Prometheus counters for pipeline turns

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use sqlbot_core::{Outcome, Turn};

pub struct Metrics {
    registry: Registry,
    turns: IntCounterVec,
    composition_fallbacks: IntCounter,
    ignored: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let turns = IntCounterVec::new(
            Opts::new("sqlbot_turns_total", "Pipeline turns by outcome"),
            &["outcome"],
        )?;
        let composition_fallbacks = IntCounter::new(
            "sqlbot_composition_fallbacks_total",
            "Answered turns that used the fallback sentence",
        )?;
        let ignored = IntCounterVec::new(
            Opts::new("sqlbot_ignored_messages_total", "Inbound messages not processed"),
            &["reason"],
        )?;

        registry.register(Box::new(turns.clone()))?;
        registry.register(Box::new(composition_fallbacks.clone()))?;
        registry.register(Box::new(ignored.clone()))?;

        Ok(Self {
            registry,
            turns,
            composition_fallbacks,
            ignored,
        })
    }

    pub fn record_turn(&self, turn: &Turn) {
        self.turns.with_label_values(&[turn.outcome.label()]).inc();
        if let Outcome::Answered {
            composed: false, ..
        } = turn.outcome
        {
            self.composition_fallbacks.inc();
        }
    }

    pub fn record_ignored(&self, reason: &str) {
        self.ignored.with_label_values(&[reason]).inc();
    }

    /// Text exposition format
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&self.registry.gather(), &mut buffer) {
            tracing::warn!(error = %e, "failed to encode metrics");
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlbot_core::{PipelineError, Stage};

    fn turn(outcome: Outcome) -> Turn {
        Turn {
            id: Default::default(),
            reply: String::new(),
            outcome,
        }
    }

    #[test]
    fn test_counts_by_outcome() {
        let metrics = Metrics::new().unwrap();

        metrics.record_turn(&turn(Outcome::Answered {
            sql: "select 1".to_string(),
            row_count: 1,
            composed: false,
        }));
        metrics.record_turn(&turn(Outcome::Failed {
            stage: Stage::Validating,
            error: PipelineError::SafetyRejected {
                candidate: "x".to_string(),
            },
        }));
        metrics.record_ignored("unauthorized");

        let text = metrics.render();
        assert!(text.contains(r#"sqlbot_turns_total{outcome="answered"} 1"#));
        assert!(text.contains(r#"sqlbot_turns_total{outcome="rejected"} 1"#));
        assert!(text.contains("sqlbot_composition_fallbacks_total 1"));
        assert!(text.contains(r#"sqlbot_ignored_messages_total{reason="unauthorized"} 1"#));
    }
}
