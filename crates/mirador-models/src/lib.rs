//! Indicator model implementations for the Mirador engine.
//!
//! This crate provides the concrete analytical models across five families:
//! - Valuation: discounted cash flow, Fama-French factor pricing
//! - Time series: ARIMA forecasting, sequence-model feature engineering
//! - Technical: Ichimoku cloud construction and signal tags
//! - Regime: volatility regime classification and transition forecasting
//! - Flow: exchange flow trends and cohort estimates
//!
//! Every model is a stateless calculator implementing the never-fails
//! evaluation contract from `mirador-traits`: degraded inputs produce
//! degraded results, not errors.
//!
//! # Example
//!
//! ```ignore
//! use mirador_models::technical::IchimokuModel;
//! use mirador_models::registry::available_models;
//! use mirador_traits::{IndicatorModel, ModelInput};
//!
//! let model = IchimokuModel::default();
//! let outcome = model.evaluate(&input);
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod flow;
pub mod regime;
pub mod registry;
pub mod technical;
pub mod timeseries;
pub mod valuation;

// Re-export key types
pub use registry::{ModelCategory, ModelInfo};
