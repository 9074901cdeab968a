//! Exchange flow analytics.

pub mod exchange;

pub use exchange::{ExchangeFlowConfig, ExchangeFlowModel, ExchangeFlowResult, FlowSeries};
