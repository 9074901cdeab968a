#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/miradorlabs/mirador/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! # mirador
//!
//! Umbrella crate re-exporting the mirador sub-crates behind one API.
//!
//! ## Quick Start
//!
//! ```ignore
//! use mirador::prelude::*;
//! use mirador::models::technical::IchimokuModel;
//!
//! let prices = PriceSeries::from_closes(closes)?;
//! let market = MarketContext::default();
//! let input = ModelInput::from_prices(&prices, &market);
//!
//! let outcome = IchimokuModel::default().evaluate(&input);
//! println!("{:?}", outcome.result().signals);
//! ```
//!
//! ## Crate Organization
//!
//! - [`traits`] - Core types ([`PriceSeries`], [`IndicatorModel`],
//!   [`Evaluation`], numeric utilities)
//! - [`models`] - Indicator model implementations (valuation, time series,
//!   technical, regime, flow)
//! - [`ensemble`] - Confidence-weighted consensus over the models
//!
//! ## Architecture
//!
//! 1. **Models** compute a scored result from one symbol's data
//! 2. **Evaluations** tag every result as computed or explicitly degraded
//! 3. **The ensemble** fans a payload out to the models and blends the
//!    votes by confidence

/// Version information for the mirador crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core type definitions.
///
/// Re-exports everything from `mirador-traits`: data containers, the model
/// trait, signal and risk enumerations, and the `stats` utilities.
pub mod traits {
    pub use mirador_traits::*;
}

/// Indicator model implementations.
///
/// Re-exports `mirador-models`: the valuation, time-series, technical,
/// regime and flow model families plus the model registry.
pub mod models {
    pub use mirador_models::*;
}

/// Consensus combination.
///
/// Re-exports `mirador-ensemble`: the predictor adapters, the
/// confidence-weighted combiner and the ensemble facade.
pub mod ensemble {
    pub use mirador_ensemble::*;
}

// Re-export the core vocabulary at the top level for convenience
pub use mirador_ensemble::{Combiner, Consensus, Ensemble, ModelVote, Predictor};
pub use mirador_traits::{
    Date, DegradeReason, Evaluation, FundamentalSnapshot, IndicatorModel, MarketContext,
    MiradorError, ModelInput, PriceSeries, Result, RiskLevel, Signal, Symbol,
};

/// Prelude module for convenient imports.
///
/// ```ignore
/// use mirador::prelude::*;
/// ```
pub mod prelude {
    pub use mirador_ensemble::{Combiner, Ensemble, Predictor};
    pub use mirador_traits::{
        DegradeReason, Evaluation, FundamentalSnapshot, IndicatorModel, MarketContext,
        MiradorError, ModelInput, PriceSeries, Result, RiskLevel, Signal,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::regime::volatility::Regime;
    use crate::models::regime::VolatilityRegimeModel;
    use crate::models::technical::ichimoku::IchimokuTag;
    use crate::models::technical::IchimokuModel;
    use crate::models::valuation::DcfModel;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        let parts: Vec<&str> = VERSION.split('.').collect();
        assert!(parts.len() >= 2, "Version should have at least major.minor");
    }

    #[test]
    fn test_re_exports() {
        fn _accept_model<M: IndicatorModel>(_model: &M) {}
        fn _accept_predictor(_predictor: &dyn Predictor) {}
        fn _accept_combiner(_combiner: &dyn Combiner) {}

        let _result: Result<()> = Ok(());
        let _error: MiradorError = MiradorError::InvalidData("test".to_string());
    }

    // A full valuation pass through the public API: realistic fundamentals
    // must produce a positive fair value with mid-range confidence.
    #[test]
    fn test_end_to_end_dcf_scenario() {
        let prices = PriceSeries::from_closes(vec![100.0; 300]).unwrap();
        let fundamentals = FundamentalSnapshot {
            free_cash_flow: Some(5e9),
            shares_outstanding: Some(1e9),
            net_debt: Some(2e9),
            cash: Some(10e9),
            ..Default::default()
        };
        let market = MarketContext::default();
        let input = ModelInput::new(&prices, &fundamentals, &market);

        let result = DcfModel::default().evaluate(&input).into_result();
        assert!(result.fair_value_per_share > 0.0);
        assert!(result.confidence >= 0.5 && result.confidence <= 0.95);
    }

    // A steadily rising market must read as bullish through the public API.
    #[test]
    fn test_end_to_end_ichimoku_scenario() {
        let close: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let high: Vec<f64> = close.iter().map(|c| c + 2.0).collect();
        let low: Vec<f64> = close.iter().map(|c| c - 2.0).collect();
        let prices =
            PriceSeries::from_columns(None, close.clone(), high, low, close, vec![0.0; 60])
                .unwrap();
        let market = MarketContext::default();
        let input = ModelInput::from_prices(&prices, &market);

        let result = IchimokuModel::default().evaluate(&input).into_result();
        assert!(result.signals.contains(&IchimokuTag::PriceAboveCloud));
        assert!(result.signals.contains(&IchimokuTag::BullishCloud));
    }

    // A flat market is the low-volatility regime; persistent calm reads as
    // complacency risk.
    #[test]
    fn test_end_to_end_regime_scenario() {
        let prices = PriceSeries::from_closes(vec![4200.0; 80]).unwrap();
        let market = MarketContext::default();
        let input = ModelInput::from_prices(&prices, &market);

        let result = VolatilityRegimeModel::new().evaluate(&input).into_result();
        assert_eq!(result.analysis.current_regime, Regime::Low);
        assert_eq!(result.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_end_to_end_ensemble() {
        let prices = PriceSeries::from_closes(
            (0..120).map(|i| 100.0 + (i as f64 * 0.3).sin()).collect(),
        )
        .unwrap();
        let fundamentals = FundamentalSnapshot {
            free_cash_flow: Some(5e9),
            shares_outstanding: Some(1e9),
            market_cap: Some(100e9),
            beta: Some(1.0),
            ..Default::default()
        };
        let market = MarketContext::default();
        let input = ModelInput::new(&prices, &fundamentals, &market);

        let prediction = Ensemble::with_default_models().predict(&input);
        assert!(prediction.consensus.predicted_value.is_finite());
        assert!(prediction.consensus.contributing > 0);
    }
}
