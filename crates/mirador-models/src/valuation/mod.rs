//! Fundamental-data-driven valuation models.

pub mod dcf;
pub mod fama_french;

pub use dcf::{DcfConfig, DcfModel, DcfResult};
pub use fama_french::{FamaFrenchConfig, FamaFrenchModel, FamaFrenchResult};
