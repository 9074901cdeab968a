#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/miradorlabs/mirador/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core type definitions for the Mirador indicator engine.
//!
//! This crate provides the foundational abstractions for the indicator
//! models: validated data containers, the model trait, the evaluation
//! outcome type and the shared numeric utilities.

/// The version of the mirador-traits crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Module declarations
pub mod error;
pub mod model;
pub mod signal;
pub mod stats;
pub mod types;

// Re-exports
pub use error::{MiradorError, Result};
pub use model::{IndicatorModel, ModelInput};
pub use signal::{DegradeReason, Evaluation, RiskLevel, Signal};
pub use types::{Date, FundamentalSnapshot, MarketContext, PriceSeries, Symbol};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }
}
