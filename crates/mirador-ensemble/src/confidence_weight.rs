//! Confidence-weighted vote combination.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use mirador_traits::{RiskLevel, Signal};

use crate::combiner::{Combiner, Consensus, ModelVote};

/// Configuration for confidence-weighted combination.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfidenceWeightedConfig {
    /// Per-model base weights. Models without an entry share the remaining
    /// weight equally. Weights are normalized before use.
    pub base_weights: HashMap<String, f64>,
}

/// Combiner that weights each valid vote by its model's base weight times
/// its reported confidence.
///
/// Votes with confidence at or below 0.1 or a predicted value of exactly
/// zero are treated as unavailable models and excluded from both the
/// weighted mean and the prediction variance. When nothing survives
/// filtering, the consensus falls back to a neutral hold at the current
/// price rather than failing.
#[derive(Debug, Clone, Default)]
pub struct ConfidenceWeightedCombiner {
    base_weights: HashMap<String, f64>,
}

impl ConfidenceWeightedCombiner {
    /// Creates a combiner with equal base weights.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the base-weight table. Non-positive entries are ignored and
    /// the remainder is normalized to sum to one.
    pub fn set_weights(&mut self, weights: HashMap<String, f64>) {
        let valid: HashMap<String, f64> = weights
            .into_iter()
            .filter(|(_, w)| *w > 0.0 && w.is_finite())
            .collect();
        let total: f64 = valid.values().sum();
        if total > 0.0 {
            self.base_weights = valid.into_iter().map(|(k, w)| (k, w / total)).collect();
        }
    }

    /// The normalized base-weight table.
    #[must_use]
    pub const fn weights(&self) -> &HashMap<String, f64> {
        &self.base_weights
    }

    fn base_weight(&self, model: &str, n_valid: usize) -> f64 {
        self.base_weights
            .get(model)
            .copied()
            .unwrap_or(1.0 / n_valid.max(1) as f64)
    }

    fn modal_signal(votes: &[&ModelVote]) -> Signal {
        const ORDER: [Signal; 5] = [
            Signal::StrongBuy,
            Signal::Buy,
            Signal::Hold,
            Signal::Sell,
            Signal::StrongSell,
        ];
        let mut best = Signal::Hold;
        let mut best_count = 0;
        for candidate in ORDER {
            let count = votes.iter().filter(|v| v.signal == candidate).count();
            if count > best_count {
                best = candidate;
                best_count = count;
            }
        }
        best
    }

    fn modal_risk(votes: &[&ModelVote]) -> RiskLevel {
        const ORDER: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];
        let mut best = RiskLevel::Medium;
        let mut best_count = 0;
        for candidate in ORDER {
            let count = votes.iter().filter(|v| v.risk == candidate).count();
            if count > best_count {
                best = candidate;
                best_count = count;
            }
        }
        best
    }
}

impl Combiner for ConfidenceWeightedCombiner {
    fn combine(&self, votes: &[ModelVote], current_price: f64) -> Consensus {
        let valid: Vec<&ModelVote> = votes.iter().filter(|v| v.is_valid()).collect();

        if valid.is_empty() {
            tracing::debug!(
                total = votes.len(),
                "no valid model votes; returning neutral consensus"
            );
            return Consensus {
                predicted_value: current_price,
                confidence: 0.1,
                signal: Signal::Hold,
                risk: RiskLevel::High,
                prediction_variance: 0.0,
                contributing: 0,
                total: votes.len(),
            };
        }

        let n_valid = valid.len();
        let mut weighted_sum = 0.0;
        let mut total_weight = 0.0;
        for vote in &valid {
            let weight = self.base_weight(&vote.model, n_valid) * vote.confidence;
            weighted_sum += vote.predicted_value * weight;
            total_weight += weight;
        }
        let predicted_value = if total_weight > 0.0 {
            weighted_sum / total_weight
        } else {
            current_price
        };

        let confidence =
            valid.iter().map(|v| v.confidence).sum::<f64>() / n_valid as f64;

        let mean_value =
            valid.iter().map(|v| v.predicted_value).sum::<f64>() / n_valid as f64;
        let prediction_variance = valid
            .iter()
            .map(|v| (v.predicted_value - mean_value).powi(2))
            .sum::<f64>()
            / n_valid as f64;

        Consensus {
            predicted_value,
            confidence,
            signal: Self::modal_signal(&valid),
            risk: Self::modal_risk(&valid),
            prediction_variance,
            contributing: n_valid,
            total: votes.len(),
        }
    }

    fn name(&self) -> &str {
        "confidence_weight"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mirador_models::ModelCategory;

    fn vote(model: &str, confidence: f64, value: f64, signal: Signal, risk: RiskLevel) -> ModelVote {
        ModelVote {
            model: model.to_string(),
            category: ModelCategory::Valuation,
            predicted_value: value,
            confidence,
            signal,
            risk,
        }
    }

    #[test]
    fn test_invalid_votes_are_excluded() {
        let combiner = ConfidenceWeightedCombiner::new();
        let votes = vec![
            vote("a", 0.8, 110.0, Signal::Buy, RiskLevel::Low),
            vote("b", 0.6, 100.0, Signal::Buy, RiskLevel::Medium),
            vote("c", 0.0, 0.0, Signal::Sell, RiskLevel::High),
        ];

        let consensus = combiner.combine(&votes, 100.0);

        // equal base weights: (110 * 0.8 + 100 * 0.6) / (0.8 + 0.6)
        assert_relative_eq!(consensus.predicted_value, 148.0 / 1.4, epsilon = 1e-9);
        assert_eq!(consensus.contributing, 2);
        assert_eq!(consensus.total, 3);

        // variance over the two valid values only: mean 105, spread 5
        assert_relative_eq!(consensus.prediction_variance, 25.0, epsilon = 1e-9);
        assert_relative_eq!(consensus.confidence, 0.7, epsilon = 1e-9);
    }

    #[test]
    fn test_all_invalid_falls_back_to_neutral() {
        let combiner = ConfidenceWeightedCombiner::new();
        let votes = vec![
            vote("a", 0.05, 110.0, Signal::Buy, RiskLevel::Low),
            vote("b", 0.9, 0.0, Signal::Sell, RiskLevel::Low),
        ];

        let consensus = combiner.combine(&votes, 123.0);
        assert_relative_eq!(consensus.predicted_value, 123.0);
        assert_relative_eq!(consensus.confidence, 0.1);
        assert_eq!(consensus.signal, Signal::Hold);
        assert_eq!(consensus.risk, RiskLevel::High);
        assert_eq!(consensus.contributing, 0);
    }

    #[test]
    fn test_empty_votes_fall_back() {
        let combiner = ConfidenceWeightedCombiner::new();
        let consensus = combiner.combine(&[], 50.0);
        assert_relative_eq!(consensus.predicted_value, 50.0);
        assert_eq!(consensus.total, 0);
    }

    #[test]
    fn test_modal_signal_and_risk() {
        let combiner = ConfidenceWeightedCombiner::new();
        let votes = vec![
            vote("a", 0.8, 110.0, Signal::Buy, RiskLevel::Low),
            vote("b", 0.7, 108.0, Signal::Buy, RiskLevel::Medium),
            vote("c", 0.6, 95.0, Signal::Sell, RiskLevel::Medium),
        ];

        let consensus = combiner.combine(&votes, 100.0);
        assert_eq!(consensus.signal, Signal::Buy);
        assert_eq!(consensus.risk, RiskLevel::Medium);
    }

    #[test]
    fn test_base_weights_shift_consensus() {
        let mut combiner = ConfidenceWeightedCombiner::new();
        combiner.set_weights(HashMap::from([
            ("heavy".to_string(), 3.0),
            ("light".to_string(), 1.0),
        ]));

        let votes = vec![
            vote("heavy", 0.5, 120.0, Signal::Buy, RiskLevel::Low),
            vote("light", 0.5, 80.0, Signal::Sell, RiskLevel::Low),
        ];

        let consensus = combiner.combine(&votes, 100.0);
        // weights 0.75/0.25 after normalization
        assert_relative_eq!(consensus.predicted_value, 110.0, epsilon = 1e-9);
    }

    #[test]
    fn test_set_weights_ignores_invalid_entries() {
        let mut combiner = ConfidenceWeightedCombiner::new();
        combiner.set_weights(HashMap::from([
            ("good".to_string(), 2.0),
            ("negative".to_string(), -1.0),
            ("zero".to_string(), 0.0),
        ]));

        assert_eq!(combiner.weights().len(), 1);
        assert_relative_eq!(combiner.weights()["good"], 1.0);
    }
}
