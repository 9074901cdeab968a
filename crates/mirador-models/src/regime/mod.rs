//! State-classification models.

pub mod volatility;

pub use volatility::{Regime, VolatilityRegimeModel, VolatilityRegimeResult};
