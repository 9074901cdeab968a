//! Core types and trait for vote combination.

use serde::{Deserialize, Serialize};

use mirador_models::ModelCategory;
use mirador_traits::{RiskLevel, Signal};

/// One model's contribution to the consensus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelVote {
    /// Name of the contributing model.
    pub model: String,
    /// Category of the contributing model.
    pub category: ModelCategory,
    /// Predicted value (typically a price level).
    pub predicted_value: f64,
    /// The model's confidence in [0, 1].
    pub confidence: f64,
    /// The model's signal.
    pub signal: Signal,
    /// The model's risk assessment.
    pub risk: RiskLevel,
}

impl ModelVote {
    /// Whether the vote counts toward the consensus. A confidence at or
    /// below 0.1 or a predicted value of exactly zero marks the model as
    /// unavailable or failed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.confidence > 0.1 && self.predicted_value != 0.0
    }
}

/// The combined prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consensus {
    /// Confidence-weighted consensus value.
    pub predicted_value: f64,
    /// Mean confidence of the contributing votes.
    pub confidence: f64,
    /// Modal signal among contributing votes.
    pub signal: Signal,
    /// Modal risk level among contributing votes.
    pub risk: RiskLevel,
    /// Population variance of the contributing predicted values.
    pub prediction_variance: f64,
    /// Number of votes that passed validity filtering.
    pub contributing: usize,
    /// Total number of votes received.
    pub total: usize,
}

/// Combines model votes into a consensus.
///
/// Implementations must be thread-safe (`Send + Sync`); vote collection is
/// embarrassingly parallel and combination may run on any thread.
pub trait Combiner: Send + Sync {
    /// Combines the votes. `current_price` anchors the neutral fallback
    /// when no vote survives filtering.
    fn combine(&self, votes: &[ModelVote], current_price: f64) -> Consensus;

    /// Name of this combination strategy.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vote(confidence: f64, value: f64) -> ModelVote {
        ModelVote {
            model: "test".to_string(),
            category: ModelCategory::Valuation,
            predicted_value: value,
            confidence,
            signal: Signal::Hold,
            risk: RiskLevel::Medium,
        }
    }

    #[test]
    fn test_vote_validity() {
        assert!(vote(0.8, 100.0).is_valid());
        assert!(!vote(0.1, 100.0).is_valid());
        assert!(!vote(0.0, 100.0).is_valid());
        assert!(!vote(0.8, 0.0).is_valid());
    }
}
