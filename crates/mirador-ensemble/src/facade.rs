//! The ensemble facade: fans one data payload out to the registered models
//! and combines their votes into a consensus.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use mirador_models::regime::volatility::VolatilityRegimeModel;
use mirador_models::technical::ichimoku::{IchimokuModel, IchimokuTag, TrendDirection};
use mirador_models::timeseries::arima::ArimaModel;
use mirador_models::valuation::dcf::DcfModel;
use mirador_models::valuation::fama_french::FamaFrenchModel;
use mirador_models::ModelCategory;
use mirador_traits::stats::std_pop;
use mirador_traits::{IndicatorModel, ModelInput, RiskLevel, Signal};

use crate::combiner::{Combiner, Consensus, ModelVote};
use crate::confidence_weight::ConfidenceWeightedCombiner;

/// A model adapter that turns an evaluation into a [`ModelVote`].
///
/// Predictions are independent of one another; callers may fan out across
/// threads freely and combine afterwards.
pub trait Predictor: Send + Sync {
    /// Name of the underlying model.
    fn name(&self) -> &str;

    /// Category of the underlying model.
    fn category(&self) -> ModelCategory;

    /// Produces this model's vote. Like model evaluation itself, this never
    /// fails: an unusable input yields a zero-confidence vote that the
    /// combiner will filter out.
    fn predict(&self, input: &ModelInput<'_>) -> ModelVote;
}

impl Predictor for DcfModel {
    fn name(&self) -> &str {
        IndicatorModel::name(self)
    }

    fn category(&self) -> ModelCategory {
        ModelCategory::Valuation
    }

    fn predict(&self, input: &ModelInput<'_>) -> ModelVote {
        let result = self.evaluate(input).into_result();
        let risk = if result.upside_pct.abs() < 10.0 {
            RiskLevel::Low
        } else {
            RiskLevel::Medium
        };
        ModelVote {
            model: IndicatorModel::name(self).to_string(),
            category: ModelCategory::Valuation,
            predicted_value: result.fair_value_per_share,
            confidence: result.confidence,
            signal: result.signal,
            risk,
        }
    }
}

impl Predictor for FamaFrenchModel {
    fn name(&self) -> &str {
        IndicatorModel::name(self)
    }

    fn category(&self) -> ModelCategory {
        ModelCategory::Valuation
    }

    fn predict(&self, input: &ModelInput<'_>) -> ModelVote {
        let result = self.evaluate(input).into_result();
        let current_price = input.prices.last_close().unwrap_or(0.0);
        let expected_return = result.expected_return_5f;

        let signal = if expected_return > 0.08 {
            Signal::Buy
        } else if expected_return < 0.02 {
            Signal::Sell
        } else {
            Signal::Hold
        };
        let beta = result.loadings.market;
        let risk = if beta < 1.2 {
            RiskLevel::Low
        } else if beta < 1.8 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        };

        ModelVote {
            model: IndicatorModel::name(self).to_string(),
            category: ModelCategory::Valuation,
            predicted_value: current_price * (1.0 + expected_return),
            confidence: result.confidence,
            signal,
            risk,
        }
    }
}

impl Predictor for ArimaModel {
    fn name(&self) -> &str {
        IndicatorModel::name(self)
    }

    fn category(&self) -> ModelCategory {
        ModelCategory::TimeSeries
    }

    fn predict(&self, input: &ModelInput<'_>) -> ModelVote {
        let outcome = self.evaluate(input);
        let degraded = outcome.is_degraded();
        let result = outcome.into_result();
        let current_price = input.prices.last_close().unwrap_or(0.0);
        let predicted_value = result.forecast.last().copied().unwrap_or(current_price);

        // Coefficient of variation of the recent window drives confidence
        let closes = input.prices.closes();
        let recent = &closes[closes.len().saturating_sub(30)..];
        let mean = if recent.is_empty() {
            0.0
        } else {
            recent.iter().sum::<f64>() / recent.len() as f64
        };
        let cv = if mean > 0.0 {
            std_pop(recent) / mean
        } else {
            1.0
        };

        let confidence = if degraded { 0.1 } else { (0.8 - cv).max(0.1) };
        let trend = if current_price > 0.0 {
            (predicted_value - current_price) / current_price
        } else {
            0.0
        };
        let signal = if trend > 0.02 {
            Signal::Buy
        } else if trend < -0.02 {
            Signal::Sell
        } else {
            Signal::Hold
        };
        let risk = if cv < 0.1 {
            RiskLevel::Low
        } else if cv < 0.2 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        };

        ModelVote {
            model: IndicatorModel::name(self).to_string(),
            category: ModelCategory::TimeSeries,
            predicted_value,
            confidence,
            signal,
            risk,
        }
    }
}

impl Predictor for IchimokuModel {
    fn name(&self) -> &str {
        IndicatorModel::name(self)
    }

    fn category(&self) -> ModelCategory {
        ModelCategory::Technical
    }

    fn predict(&self, input: &ModelInput<'_>) -> ModelVote {
        let outcome = self.evaluate(input);
        let degraded = outcome.is_degraded();
        let result = outcome.into_result();
        let current_price = input.prices.last_close().unwrap_or(0.0);

        let signal = match result.trend.map(|t| t.direction) {
            Some(TrendDirection::StrongBullish) => Signal::StrongBuy,
            Some(TrendDirection::Bullish) => Signal::Buy,
            Some(TrendDirection::Bearish) => Signal::Sell,
            Some(TrendDirection::StrongBearish) => Signal::StrongSell,
            None => Signal::Hold,
        };
        let strong_trend = result.signals.contains(&IchimokuTag::StrongBullishTrend)
            || result.signals.contains(&IchimokuTag::StrongBearishTrend);
        let risk = if degraded {
            RiskLevel::High
        } else if strong_trend {
            RiskLevel::Low
        } else {
            RiskLevel::Medium
        };

        ModelVote {
            model: IndicatorModel::name(self).to_string(),
            category: ModelCategory::Technical,
            // the pattern model scores direction, not a price target
            predicted_value: current_price,
            confidence: result.confidence,
            signal,
            risk,
        }
    }
}

impl Predictor for VolatilityRegimeModel {
    fn name(&self) -> &str {
        IndicatorModel::name(self)
    }

    fn category(&self) -> ModelCategory {
        ModelCategory::Regime
    }

    fn predict(&self, input: &ModelInput<'_>) -> ModelVote {
        let result = self.evaluate(input).into_result();
        ModelVote {
            model: IndicatorModel::name(self).to_string(),
            category: ModelCategory::Regime,
            predicted_value: input.prices.last_close().unwrap_or(0.0),
            confidence: result.confidence,
            signal: result.signal,
            risk: result.risk_level,
        }
    }
}

/// Mean confidences of the contributing votes, by category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CategoryScores {
    /// Valuation models.
    pub valuation: f64,
    /// Time-series models.
    pub time_series: f64,
    /// Technical models.
    pub technical: f64,
    /// Regime models.
    pub regime: f64,
    /// Mean of the category scores.
    pub overall: f64,
}

/// The complete ensemble output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsemblePrediction {
    /// The combined prediction.
    pub consensus: Consensus,
    /// Every vote received, including filtered ones.
    pub votes: Vec<ModelVote>,
    /// Per-category confidence scores.
    pub scores: CategoryScores,
}

/// A registered model, for status reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredModel {
    /// Model name.
    pub name: String,
    /// Model category.
    pub category: ModelCategory,
}

/// Status of the ensemble's registered models.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleStatus {
    /// Number of registered models.
    pub total_models: usize,
    /// The registered models.
    pub models: Vec<RegisteredModel>,
}

/// The ensemble facade.
///
/// Holds a set of registered predictors and a combiner. A prediction fans
/// the payload out to every predictor and combines whatever comes back;
/// individual model failure is absorbed as an invalid vote, never
/// propagated.
pub struct Ensemble {
    predictors: Vec<Box<dyn Predictor>>,
    combiner: ConfidenceWeightedCombiner,
}

impl std::fmt::Debug for Ensemble {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ensemble")
            .field("models", &self.predictors.len())
            .finish()
    }
}

impl Ensemble {
    /// Creates an empty ensemble with an equal-weight combiner.
    #[must_use]
    pub fn new() -> Self {
        Self {
            predictors: Vec::new(),
            combiner: ConfidenceWeightedCombiner::new(),
        }
    }

    /// Creates an ensemble with the standard model set: DCF, Fama-French,
    /// ARIMA, Ichimoku and volatility regime. Valuation models carry a 1.2x
    /// base weight before normalization.
    #[must_use]
    pub fn with_default_models() -> Self {
        let mut ensemble = Self::new();
        ensemble.register(Box::new(DcfModel::default()));
        ensemble.register(Box::new(FamaFrenchModel::default()));
        ensemble.register(Box::new(ArimaModel::default()));
        ensemble.register(Box::new(IchimokuModel::default()));
        ensemble.register(Box::new(VolatilityRegimeModel::new()));

        let weights = ensemble
            .predictors
            .iter()
            .map(|p| {
                let weight = if p.category() == ModelCategory::Valuation {
                    1.2
                } else {
                    1.0
                };
                (p.name().to_string(), weight)
            })
            .collect();
        ensemble.set_weights(weights);
        ensemble
    }

    /// Registers a predictor.
    pub fn register(&mut self, predictor: Box<dyn Predictor>) {
        self.predictors.push(predictor);
    }

    /// Replaces the model base-weight table (normalized before use).
    pub fn set_weights(&mut self, weights: HashMap<String, f64>) {
        self.combiner.set_weights(weights);
    }

    /// Fans the payload out to every registered model and combines the
    /// votes.
    #[must_use]
    pub fn predict(&self, input: &ModelInput<'_>) -> EnsemblePrediction {
        let votes: Vec<ModelVote> = self.predictors.iter().map(|p| p.predict(input)).collect();
        let current_price = input.prices.last_close().unwrap_or(0.0);
        let consensus = self.combiner.combine(&votes, current_price);
        let scores = Self::category_scores(&votes);

        EnsemblePrediction {
            consensus,
            votes,
            scores,
        }
    }

    /// Reports the registered models.
    #[must_use]
    pub fn status(&self) -> EnsembleStatus {
        EnsembleStatus {
            total_models: self.predictors.len(),
            models: self
                .predictors
                .iter()
                .map(|p| RegisteredModel {
                    name: p.name().to_string(),
                    category: p.category(),
                })
                .collect(),
        }
    }

    fn category_scores(votes: &[ModelVote]) -> CategoryScores {
        let mean_for = |category: ModelCategory| {
            let confidences: Vec<f64> = votes
                .iter()
                .filter(|v| v.category == category && v.is_valid())
                .map(|v| v.confidence)
                .collect();
            if confidences.is_empty() {
                0.0
            } else {
                confidences.iter().sum::<f64>() / confidences.len() as f64
            }
        };

        let valuation = mean_for(ModelCategory::Valuation);
        let time_series = mean_for(ModelCategory::TimeSeries);
        let technical = mean_for(ModelCategory::Technical);
        let regime = mean_for(ModelCategory::Regime);
        CategoryScores {
            valuation,
            time_series,
            technical,
            regime,
            overall: (valuation + time_series + technical + regime) / 4.0,
        }
    }
}

impl Default for Ensemble {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirador_traits::{FundamentalSnapshot, MarketContext, PriceSeries};

    fn wavy_series(bars: usize) -> PriceSeries {
        let close: Vec<f64> = (0..bars)
            .map(|i| 100.0 + (i as f64 * 0.3).sin() * 2.0)
            .collect();
        PriceSeries::from_closes(close).unwrap()
    }

    fn snapshot() -> FundamentalSnapshot {
        FundamentalSnapshot {
            free_cash_flow: Some(5e9),
            shares_outstanding: Some(1e9),
            net_debt: Some(2e9),
            cash: Some(10e9),
            revenue: Some(50e9),
            market_cap: Some(100e9),
            beta: Some(1.1),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_ensemble_registers_five_models() {
        let ensemble = Ensemble::with_default_models();
        let status = ensemble.status();
        assert_eq!(status.total_models, 5);

        let names: Vec<&str> = status.models.iter().map(|m| m.name.as_str()).collect();
        assert!(names.contains(&"dcf"));
        assert!(names.contains(&"fama_french"));
        assert!(names.contains(&"arima"));
        assert!(names.contains(&"ichimoku"));
        assert!(names.contains(&"volatility_regime"));
    }

    #[test]
    fn test_predict_produces_well_formed_consensus() {
        let ensemble = Ensemble::with_default_models();
        let prices = wavy_series(120);
        let fundamentals = snapshot();
        let market = MarketContext::default();
        let input = ModelInput::new(&prices, &fundamentals, &market);

        let prediction = ensemble.predict(&input);

        assert_eq!(prediction.votes.len(), 5);
        assert!(prediction.consensus.predicted_value > 0.0);
        assert!(prediction.consensus.predicted_value.is_finite());
        assert!(prediction.consensus.contributing > 0);
        assert!((0.0..=1.0).contains(&prediction.consensus.confidence));
        assert!(prediction.scores.valuation > 0.0);
        assert!(prediction.scores.overall > 0.0);
    }

    #[test]
    fn test_empty_ensemble_falls_back_to_neutral() {
        let ensemble = Ensemble::new();
        let prices = wavy_series(120);
        let market = MarketContext::default();
        let input = ModelInput::from_prices(&prices, &market);

        let prediction = ensemble.predict(&input);
        assert_eq!(prediction.consensus.contributing, 0);
        assert_eq!(prediction.consensus.signal, Signal::Hold);
        assert_eq!(prediction.consensus.risk, RiskLevel::High);
    }

    #[test]
    fn test_short_history_still_yields_consensus() {
        // every model degrades on 5 bars, but the ensemble must not fail
        let ensemble = Ensemble::with_default_models();
        let prices = wavy_series(5);
        let market = MarketContext::default();
        let input = ModelInput::from_prices(&prices, &market);

        let prediction = ensemble.predict(&input);
        assert!(prediction.consensus.predicted_value.is_finite());
        assert_eq!(prediction.votes.len(), 5);
    }

    #[test]
    fn test_votes_carry_expected_categories() {
        let ensemble = Ensemble::with_default_models();
        let prices = wavy_series(120);
        let fundamentals = snapshot();
        let market = MarketContext::default();
        let input = ModelInput::new(&prices, &fundamentals, &market);

        let prediction = ensemble.predict(&input);
        let valuation_votes = prediction
            .votes
            .iter()
            .filter(|v| v.category == ModelCategory::Valuation)
            .count();
        assert_eq!(valuation_votes, 2);
    }
}
