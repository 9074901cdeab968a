//! Consensus combination for the Mirador indicator engine.
//!
//! This crate fans a single data payload out to the registered indicator
//! models and blends their outputs into one prediction:
//! - [`Predictor`] adapts each model's result into a [`ModelVote`]
//! - [`ConfidenceWeightedCombiner`] filters invalid votes and computes the
//!   confidence-weighted consensus
//! - [`Ensemble`] wires the two together and reports per-category scores
//!
//! Failure is absorbed, never propagated: a model that cannot produce a
//! usable prediction contributes an invalid vote, and an ensemble with zero
//! valid votes returns a neutral hold.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod combiner;
pub mod confidence_weight;
pub mod facade;

// Re-export key types
pub use combiner::{Combiner, Consensus, ModelVote};
pub use confidence_weight::ConfidenceWeightedCombiner;
pub use facade::{Ensemble, EnsemblePrediction, EnsembleStatus, Predictor};
