//! Statistical forecasting models and feature engineering.

pub mod arima;
pub mod features;

pub use arima::{ArimaConfig, ArimaModel, ArimaResult};
pub use features::{FeatureConfig, FeatureMatrix, FeaturePipeline};
