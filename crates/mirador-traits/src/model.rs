//! The indicator model trait.
//!
//! An indicator model is a stateless calculator: the same input always yields
//! the same output, no call mutates shared state, and calls for different
//! symbols are safe to run concurrently. Implementations must be `Send +
//! Sync` so callers can fan out across threads freely.

use crate::{Evaluation, FundamentalSnapshot, MarketContext, PriceSeries};

/// The data payload handed to a model for one evaluation.
///
/// Models read what they need and ignore the rest; a missing fundamental
/// snapshot degrades the models that want one rather than failing them.
#[derive(Debug, Clone, Copy)]
pub struct ModelInput<'a> {
    /// OHLCV history, chronologically ascending.
    pub prices: &'a PriceSeries,
    /// Point-in-time fundamentals, if the caller has them.
    pub fundamentals: Option<&'a FundamentalSnapshot>,
    /// Economy-wide context.
    pub market: &'a MarketContext,
    /// Realized return over the evaluation horizon, when known. Only used by
    /// models that report alpha against an expected return.
    pub actual_return: Option<f64>,
}

impl<'a> ModelInput<'a> {
    /// Payload with prices only.
    #[must_use]
    pub const fn from_prices(prices: &'a PriceSeries, market: &'a MarketContext) -> Self {
        Self {
            prices,
            fundamentals: None,
            market,
            actual_return: None,
        }
    }

    /// Payload with prices and fundamentals.
    #[must_use]
    pub const fn new(
        prices: &'a PriceSeries,
        fundamentals: &'a FundamentalSnapshot,
        market: &'a MarketContext,
    ) -> Self {
        Self {
            prices,
            fundamentals: Some(fundamentals),
            market,
            actual_return: None,
        }
    }
}

/// A stateless analytical model that turns market data into a scored,
/// interpreted result.
///
/// # Contract
///
/// `evaluate` never panics and never fails: whatever the input, it returns a
/// well-formed result wrapped in an [`Evaluation`] whose `Degraded` variant
/// records quality problems (short history, missing fundamentals, guarded
/// numerics). Confidence lives inside the result type.
pub trait IndicatorModel: Send + Sync {
    /// The model-specific result type.
    type Output;

    /// Unique, descriptive model name used in registries and logs.
    fn name(&self) -> &str;

    /// Minimum number of bars for a non-degraded evaluation.
    fn min_history(&self) -> usize;

    /// Whether the model consumes a [`FundamentalSnapshot`].
    fn requires_fundamentals(&self) -> bool {
        false
    }

    /// Runs the model over the input.
    fn evaluate(&self, input: &ModelInput<'_>) -> Evaluation<Self::Output>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlatModel;

    impl IndicatorModel for FlatModel {
        type Output = f64;

        fn name(&self) -> &str {
            "flat"
        }

        fn min_history(&self) -> usize {
            1
        }

        fn evaluate(&self, input: &ModelInput<'_>) -> Evaluation<f64> {
            match input.prices.last_close() {
                Some(c) => Evaluation::Computed(c),
                None => Evaluation::Degraded {
                    result: 0.0,
                    reason: crate::DegradeReason::InsufficientHistory {
                        required: 1,
                        available: 0,
                    },
                },
            }
        }
    }

    #[test]
    fn test_model_evaluate() {
        let prices = PriceSeries::from_closes(vec![100.0, 110.0]).unwrap();
        let market = MarketContext::default();
        let input = ModelInput::from_prices(&prices, &market);

        let model = FlatModel;
        assert_eq!(model.name(), "flat");
        assert!(!model.requires_fundamentals());
        assert_eq!(*model.evaluate(&input).result(), 110.0);
    }

    #[test]
    fn test_model_degrades_on_empty_input() {
        let prices = PriceSeries::from_closes(vec![]).unwrap();
        let market = MarketContext::default();
        let input = ModelInput::from_prices(&prices, &market);

        let outcome = FlatModel.evaluate(&input);
        assert!(outcome.is_degraded());
    }

    #[test]
    fn test_model_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FlatModel>();
    }
}
