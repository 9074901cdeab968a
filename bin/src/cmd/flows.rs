//! Exchange flow command implementation.

use std::path::Path;

use anyhow::Result;

use mirador_models::flow::{ExchangeFlowConfig, ExchangeFlowModel};

use crate::cmd::{emit, OutputFormat};
use crate::data;

/// Run the exchange flow analysis over a CSV flow history.
pub(crate) fn run(data_path: &Path, asset: String, format: OutputFormat) -> Result<()> {
    let flows = data::load_flows(data_path)?;
    let model = ExchangeFlowModel::new(ExchangeFlowConfig {
        asset,
        ..ExchangeFlowConfig::default()
    });

    let outcome = model.analyze(&flows);
    emit(format, &outcome, |r| {
        vec![
            format!("Net flow:          {:+.0}", r.net_flow),
            format!("Inflow trend:      {:?}", r.inflow_trend),
            format!("Outflow trend:     {:?}", r.outflow_trend),
            format!("Balance ratio:     {:.3}", r.exchange_balance_ratio),
            format!("Selling pressure:  {}", r.selling_pressure.description()),
            format!("Flow momentum:     {:+.3}", r.flow_momentum),
            format!("Whale behavior:    {:?} (heuristic)", r.whale.behavior),
            format!("Institutional:     {:?} (heuristic)", r.institutional.phase),
            format!("Interpretation:    {}", r.interpretation),
        ]
    })
}
