//! Exchange flow model.
//!
//! Analyzes coin movement to and from exchanges: net flow, regression-based
//! trend labels, selling pressure and flow momentum. The whale,
//! institutional and per-exchange breakdowns are proportional-split
//! estimates over the aggregate flow, not measurements — transaction-level
//! data is not available at this layer, so every such block carries an
//! explicit `heuristic` flag.

use serde::{Deserialize, Serialize};

use mirador_traits::stats::linear_regression;
use mirador_traits::{Date, DegradeReason, Evaluation, MiradorError, Result};

/// Static exchange share table used for the per-exchange breakdown.
const EXCHANGE_SHARES: [(&str, f64); 5] = [
    ("Binance", 0.35),
    ("Coinbase", 0.25),
    ("Kraken", 0.15),
    ("Bitfinex", 0.15),
    ("Huobi", 0.10),
];

/// Fallback exchange-balance ratio when no balance data exists.
const DEFAULT_BALANCE_RATIO: f64 = 0.12;

/// Configuration for the exchange flow model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeFlowConfig {
    /// Asset ticker the flows describe.
    pub asset: String,
    /// Window for the regression trend classification.
    pub trend_window: usize,
}

impl Default for ExchangeFlowConfig {
    fn default() -> Self {
        Self {
            asset: "BTC".to_string(),
            trend_window: 7,
        }
    }
}

/// Per-period exchange flow history.
#[derive(Debug, Clone)]
pub struct FlowSeries {
    dates: Option<Vec<Date>>,
    inflow: Vec<f64>,
    outflow: Vec<f64>,
    exchange_balance: Vec<f64>,
    total_supply: Vec<f64>,
}

impl FlowSeries {
    /// Builds a flow series from aligned per-period columns.
    ///
    /// # Errors
    ///
    /// Returns an error on mismatched lengths or negative/non-finite flows.
    pub fn new(
        dates: Option<Vec<Date>>,
        inflow: Vec<f64>,
        outflow: Vec<f64>,
        exchange_balance: Vec<f64>,
        total_supply: Vec<f64>,
    ) -> Result<Self> {
        let n = inflow.len();
        if outflow.len() != n || exchange_balance.len() != n || total_supply.len() != n {
            return Err(MiradorError::InvalidData(
                "flow columns have mismatched lengths".to_string(),
            ));
        }
        if let Some(d) = &dates
            && d.len() != n
        {
            return Err(MiradorError::InvalidData(
                "date column length does not match flows".to_string(),
            ));
        }
        for (i, (inf, out)) in inflow.iter().zip(&outflow).enumerate() {
            if !inf.is_finite() || !out.is_finite() || *inf < 0.0 || *out < 0.0 {
                return Err(MiradorError::InvalidData(format!(
                    "invalid flow at row {i}"
                )));
            }
        }
        Ok(Self {
            dates,
            inflow,
            outflow,
            exchange_balance,
            total_supply,
        })
    }

    /// Number of periods.
    pub const fn len(&self) -> usize {
        self.inflow.len()
    }

    /// Whether the series is empty.
    pub const fn is_empty(&self) -> bool {
        self.inflow.is_empty()
    }

    /// Period dates, when supplied.
    pub fn dates(&self) -> Option<&[Date]> {
        self.dates.as_deref()
    }
}

/// Direction classification of a flow series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowTrend {
    /// Strong positive slope.
    Increasing,
    /// Positive slope with weak correlation.
    SlowlyIncreasing,
    /// Strong negative slope.
    Decreasing,
    /// Negative slope with weak correlation.
    SlowlyDecreasing,
    /// No meaningful correlation with time.
    Stable,
    /// Fewer periods than the trend window.
    InsufficientData,
}

/// Qualitative selling pressure label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SellingPressure {
    /// Strong inflows to exchanges.
    High,
    /// Some selling pressure.
    Moderate,
    /// Strong outflows from exchanges.
    Low,
    /// Limited exchange supply.
    VeryLow,
    /// Balanced flow.
    Neutral,
}

impl SellingPressure {
    /// Human-readable label.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::High => "High - Strong Inflows to Exchanges",
            Self::Moderate => "Moderate - Some Selling Pressure",
            Self::Low => "Low - Strong Outflows from Exchanges",
            Self::VeryLow => "Very Low - Limited Exchange Supply",
            Self::Neutral => "Neutral - Balanced Flow",
        }
    }
}

/// Large-holder behavior classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WhaleBehavior {
    /// Net whale flow strongly inbound.
    StrongAccumulation,
    /// Net whale flow strongly outbound.
    StrongDistribution,
    /// Whale flow negligible against total flow.
    NeutralSideways,
    /// No dominant direction.
    MixedSignals,
}

/// Estimated large-holder flow analysis. All figures are proportional
/// splits of the aggregate flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhaleAnalysis {
    /// Estimated whale share of total inflow.
    pub inflow_volume: f64,
    /// Estimated whale share of total outflow.
    pub outflow_volume: f64,
    /// Whale inflow minus outflow.
    pub net_flow: f64,
    /// Whale flow as a percentage of total flow.
    pub flow_percentage: f64,
    /// Estimated count of large transactions.
    pub large_transaction_count: usize,
    /// Accumulation score in [0, 100].
    pub accumulation_score: f64,
    /// Distribution score in [0, 100].
    pub distribution_score: f64,
    /// Mean recent net flow.
    pub flow_momentum: f64,
    /// Scaled whale dominance of exchange flow.
    pub exchange_dominance: f64,
    /// Behavior classification.
    pub behavior: WhaleBehavior,
    /// Estimated price impact of whale flow.
    pub price_impact: f64,
    /// Capitulation risk score in [0, 100].
    pub capitulation_risk: f64,
    /// Always true: these are proportional estimates, not measurements.
    pub heuristic: bool,
}

/// Institutional accumulation phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstitutionalPhase {
    /// Net institutional flow above 10% of total flow.
    StrongAccumulation,
    /// Net institutional flow below -10% of total flow.
    Distribution,
    /// In between.
    Neutral,
}

/// Fixed institutional transaction-pattern scores.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TransactionPatterns {
    /// Regularity of transaction timing.
    pub regular_intervals: f64,
    /// Prevalence of large block trades.
    pub large_block_trades: f64,
    /// Off-hours activity share.
    pub off_hours_activity: f64,
    /// Cross-exchange coordination score.
    pub cross_exchange_coordination: f64,
}

/// Estimated custody flow indicators.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CustodyIndicators {
    /// Estimated custody inflows.
    pub inflows: f64,
    /// Estimated custody outflows.
    pub outflows: f64,
    /// Estimated custody net change.
    pub net_change: f64,
    /// Custody share of institutional flow.
    pub dominance: f64,
}

/// Estimated institutional flow analysis. All figures are proportional
/// splits of the aggregate flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstitutionalAnalysis {
    /// Estimated institutional share of total inflow.
    pub inflow_volume: f64,
    /// Estimated institutional share of total outflow.
    pub outflow_volume: f64,
    /// Institutional inflow minus outflow.
    pub net_flow: f64,
    /// Institutional flow as a percentage of total flow.
    pub flow_percentage: f64,
    /// Fixed transaction-pattern scores.
    pub transaction_patterns: TransactionPatterns,
    /// Estimated custody flow indicators.
    pub custody: CustodyIndicators,
    /// Estimated OTC flow volume.
    pub otc_flow: f64,
    /// Accumulation phase classification.
    pub phase: InstitutionalPhase,
    /// Sentiment score in [0, 100].
    pub sentiment_score: f64,
    /// Estimated regulatory flow impact.
    pub regulatory_impact: f64,
    /// Institutional over retail flow ratio.
    pub institutional_vs_retail: f64,
    /// Flow predictability score in [0, 100].
    pub predictability: f64,
    /// Always true: these are proportional estimates, not measurements.
    pub heuristic: bool,
}

/// One exchange's share of the aggregate flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeShare {
    /// Exchange name.
    pub exchange: String,
    /// Assumed market share.
    pub market_share: f64,
    /// Estimated inflow through this exchange.
    pub inflow: f64,
    /// Estimated outflow through this exchange.
    pub outflow: f64,
    /// Estimated net flow through this exchange.
    pub net_flow: f64,
}

/// Per-exchange breakdown over a fixed market-share table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeBreakdown {
    /// Per-exchange estimates.
    pub shares: Vec<ExchangeShare>,
    /// Always true: the share table is assumed, not observed.
    pub heuristic: bool,
}

/// Result of an exchange flow analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeFlowResult {
    /// Most recent net flow (inflow minus outflow).
    pub net_flow: f64,
    /// Trend of the inflow series.
    pub inflow_trend: FlowTrend,
    /// Trend of the outflow series.
    pub outflow_trend: FlowTrend,
    /// Latest exchange balance over total supply.
    pub exchange_balance_ratio: f64,
    /// Qualitative selling pressure.
    pub selling_pressure: SellingPressure,
    /// Rate of change of recent net flows.
    pub flow_momentum: f64,
    /// Large-holder flow estimates.
    pub whale: WhaleAnalysis,
    /// Institutional flow estimates.
    pub institutional: InstitutionalAnalysis,
    /// Per-exchange breakdown.
    pub breakdown: ExchangeBreakdown,
    /// Human-readable summary.
    pub interpretation: String,
}

/// Exchange flow calculator.
#[derive(Debug, Clone, Default)]
pub struct ExchangeFlowModel {
    config: ExchangeFlowConfig,
}

impl ExchangeFlowModel {
    /// Creates a model with the given configuration.
    #[must_use]
    pub const fn new(config: ExchangeFlowConfig) -> Self {
        Self { config }
    }

    /// The asset the model describes.
    #[must_use]
    pub fn asset(&self) -> &str {
        &self.config.asset
    }

    /// Net flow for one period; positive means net inflow to exchanges.
    #[must_use]
    pub fn net_flow(inflow: f64, outflow: f64) -> f64 {
        inflow - outflow
    }

    /// Classifies the direction of a flow series by regressing the last
    /// `trend_window` values against time.
    #[must_use]
    pub fn flow_trend(&self, flows: &[f64]) -> FlowTrend {
        let window = self.config.trend_window;
        if flows.len() < window {
            return FlowTrend::InsufficientData;
        }
        let recent = &flows[flows.len() - window..];
        let xs: Vec<f64> = (0..window).map(|i| i as f64).collect();
        let Some(fit) = linear_regression(&xs, recent) else {
            return FlowTrend::Stable;
        };

        if fit.r.abs() < 0.3 {
            FlowTrend::Stable
        } else if fit.slope > 0.0 {
            if fit.r > 0.5 {
                FlowTrend::Increasing
            } else {
                FlowTrend::SlowlyIncreasing
            }
        } else if fit.r < -0.5 {
            FlowTrend::Decreasing
        } else {
            FlowTrend::SlowlyDecreasing
        }
    }

    /// Fraction of total supply sitting on exchanges; zero when the supply
    /// is unknown or zero.
    #[must_use]
    pub fn exchange_balance_ratio(exchange_balance: f64, total_supply: f64) -> f64 {
        if total_supply <= 0.0 {
            0.0
        } else {
            exchange_balance / total_supply
        }
    }

    /// Selling pressure from the net flow, inflow trend and balance ratio.
    #[must_use]
    pub fn selling_pressure(
        net_flow: f64,
        inflow_trend: FlowTrend,
        exchange_balance_ratio: f64,
    ) -> SellingPressure {
        let inflows_rising = matches!(
            inflow_trend,
            FlowTrend::Increasing | FlowTrend::SlowlyIncreasing
        );
        if net_flow > 1000.0 && inflows_rising {
            SellingPressure::High
        } else if net_flow > 0.0 && exchange_balance_ratio > 0.15 {
            SellingPressure::Moderate
        } else if net_flow < -1000.0 {
            SellingPressure::Low
        } else if exchange_balance_ratio < 0.10 {
            SellingPressure::VeryLow
        } else {
            SellingPressure::Neutral
        }
    }

    /// Momentum as the relative change of the last three net flows against
    /// the four before them.
    #[must_use]
    pub fn flow_momentum(net_flows: &[f64]) -> f64 {
        if net_flows.len() < 7 {
            return 0.0;
        }
        let n = net_flows.len();
        let recent_avg = net_flows[n - 3..].iter().sum::<f64>() / 3.0;
        let older_avg = net_flows[n - 7..n - 3].iter().sum::<f64>() / 4.0;
        if older_avg == 0.0 {
            0.0
        } else {
            (recent_avg - older_avg) / older_avg.abs()
        }
    }

    fn whale_analysis(&self, net_flows: &[f64], inflows: &[f64], outflows: &[f64]) -> WhaleAnalysis {
        let total_inflow: f64 = inflows.iter().sum();
        let total_outflow: f64 = outflows.iter().sum();

        // Assume 30% of inflow and 25% of outflow is whale-sized
        let inflow_volume = total_inflow * 0.3;
        let outflow_volume = total_outflow * 0.25;
        let net_flow = inflow_volume - outflow_volume;

        let total_flow = total_inflow + total_outflow;
        let flow_percentage = if total_flow > 0.0 {
            (inflow_volume + outflow_volume) / total_flow * 100.0
        } else {
            0.0
        };

        let denom = net_flow.abs().max(1.0);
        let accumulation_score = (net_flow / denom).max(0.0) * 100.0;
        let distribution_score = (-net_flow / denom).max(0.0) * 100.0;

        let recent = &net_flows[net_flows.len().saturating_sub(7)..];
        let flow_momentum = if recent.is_empty() {
            0.0
        } else {
            recent.iter().sum::<f64>() / recent.len() as f64
        };

        let behavior = if accumulation_score > 60.0 {
            WhaleBehavior::StrongAccumulation
        } else if distribution_score > 60.0 {
            WhaleBehavior::StrongDistribution
        } else if net_flow.abs() < total_flow * 0.05 {
            WhaleBehavior::NeutralSideways
        } else {
            WhaleBehavior::MixedSignals
        };

        WhaleAnalysis {
            inflow_volume,
            outflow_volume,
            net_flow,
            flow_percentage,
            large_transaction_count: (net_flows.len() as f64 * 0.15) as usize,
            accumulation_score,
            distribution_score,
            flow_momentum,
            exchange_dominance: flow_percentage / 100.0 * 0.8,
            behavior,
            price_impact: net_flow.abs() / total_flow.max(1.0) * 0.7,
            capitulation_risk: (distribution_score - 50.0).max(0.0) / 50.0 * 100.0,
            heuristic: true,
        }
    }

    fn institutional_analysis(&self, net_flows: &[f64], inflows: &[f64], outflows: &[f64]) -> InstitutionalAnalysis {
        let total_inflow: f64 = inflows.iter().sum();
        let total_outflow: f64 = outflows.iter().sum();

        // Assume 40% of inflow and 35% of outflow is institutional
        let inflow_volume = total_inflow * 0.4;
        let outflow_volume = total_outflow * 0.35;
        let net_flow = inflow_volume - outflow_volume;

        let total_flow = total_inflow + total_outflow;
        let flow_percentage = if total_flow > 0.0 {
            (inflow_volume + outflow_volume) / total_flow * 100.0
        } else {
            0.0
        };

        let phase = if net_flow > total_flow * 0.1 {
            InstitutionalPhase::StrongAccumulation
        } else if net_flow < -total_flow * 0.1 {
            InstitutionalPhase::Distribution
        } else {
            InstitutionalPhase::Neutral
        };

        let retail_flow = total_flow - (inflow_volume + outflow_volume);

        let n = net_flows.len();
        let (mean, variance) = if n > 1 {
            let mean = net_flows.iter().sum::<f64>() / n as f64;
            let variance =
                net_flows.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
            (mean, variance)
        } else {
            (net_flows.first().copied().unwrap_or(0.0), 0.0)
        };
        let predictability = (100.0 - (variance / mean.max(1.0)) * 10.0).max(0.0);

        InstitutionalAnalysis {
            inflow_volume,
            outflow_volume,
            net_flow,
            flow_percentage,
            transaction_patterns: TransactionPatterns {
                regular_intervals: 0.7,
                large_block_trades: 0.6,
                off_hours_activity: 0.4,
                cross_exchange_coordination: 0.5,
            },
            custody: CustodyIndicators {
                inflows: inflow_volume * 0.6,
                outflows: outflow_volume * 0.4,
                net_change: net_flow * 0.5,
                dominance: 0.3,
            },
            otc_flow: net_flow.abs() * 0.3,
            phase,
            sentiment_score: (net_flow / net_flow.abs().max(1.0)) * 50.0 + 50.0,
            regulatory_impact: net_flow.abs() / total_flow.max(1.0) * 0.2,
            institutional_vs_retail: (inflow_volume + outflow_volume) / retail_flow.max(1.0),
            predictability,
            heuristic: true,
        }
    }

    fn breakdown(net_flows: &[f64]) -> ExchangeBreakdown {
        let total_flow: f64 = net_flows.iter().map(|f| f.abs()).sum();
        ExchangeBreakdown {
            shares: EXCHANGE_SHARES
                .iter()
                .map(|(name, share)| ExchangeShare {
                    exchange: (*name).to_string(),
                    market_share: *share,
                    inflow: total_flow * share * 0.6,
                    outflow: total_flow * share * 0.4,
                    net_flow: total_flow * share * 0.2,
                })
                .collect(),
            heuristic: true,
        }
    }

    fn empty_result(&self) -> ExchangeFlowResult {
        ExchangeFlowResult {
            net_flow: 0.0,
            inflow_trend: FlowTrend::InsufficientData,
            outflow_trend: FlowTrend::InsufficientData,
            exchange_balance_ratio: DEFAULT_BALANCE_RATIO,
            selling_pressure: SellingPressure::Neutral,
            flow_momentum: 0.0,
            whale: self.whale_analysis(&[], &[], &[]),
            institutional: self.institutional_analysis(&[], &[], &[]),
            breakdown: Self::breakdown(&[]),
            interpretation: format!("No exchange flow data for {}", self.config.asset),
        }
    }

    /// Runs the full exchange flow analysis.
    pub fn analyze(&self, flows: &FlowSeries) -> Evaluation<ExchangeFlowResult> {
        if flows.is_empty() {
            return Evaluation::Degraded {
                result: self.empty_result(),
                reason: DegradeReason::Fallback("empty flow series".to_string()),
            };
        }

        let net_flows: Vec<f64> = flows
            .inflow
            .iter()
            .zip(&flows.outflow)
            .map(|(i, o)| Self::net_flow(*i, *o))
            .collect();
        let current_net_flow = *net_flows.last().unwrap_or(&0.0);

        let inflow_trend = self.flow_trend(&flows.inflow);
        let outflow_trend = self.flow_trend(&flows.outflow);

        let n = flows.len();
        let exchange_balance_ratio =
            Self::exchange_balance_ratio(flows.exchange_balance[n - 1], flows.total_supply[n - 1]);

        let selling_pressure =
            Self::selling_pressure(current_net_flow, inflow_trend, exchange_balance_ratio);
        let flow_momentum = Self::flow_momentum(&net_flows);

        let interpretation = format!(
            "{}: net flow {:.0} ({:?} inflows); {}",
            self.config.asset,
            current_net_flow,
            inflow_trend,
            selling_pressure.description()
        );

        let result = ExchangeFlowResult {
            net_flow: current_net_flow,
            inflow_trend,
            outflow_trend,
            exchange_balance_ratio,
            selling_pressure,
            flow_momentum,
            whale: self.whale_analysis(&net_flows, &flows.inflow, &flows.outflow),
            institutional: self.institutional_analysis(&net_flows, &flows.inflow, &flows.outflow),
            breakdown: Self::breakdown(&net_flows),
            interpretation,
        };

        if n < self.config.trend_window {
            Evaluation::Degraded {
                result,
                reason: DegradeReason::InsufficientHistory {
                    required: self.config.trend_window,
                    available: n,
                },
            }
        } else {
            Evaluation::Computed(result)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn flow_series(inflow: Vec<f64>, outflow: Vec<f64>) -> FlowSeries {
        let n = inflow.len();
        FlowSeries::new(None, inflow, outflow, vec![2.4e6; n], vec![19.5e6; n]).unwrap()
    }

    #[test]
    fn test_net_flow() {
        assert_relative_eq!(ExchangeFlowModel::net_flow(1500.0, 1000.0), 500.0);
        assert_relative_eq!(ExchangeFlowModel::net_flow(800.0, 1200.0), -400.0);
    }

    #[test]
    fn test_flow_trend_classification() {
        let model = ExchangeFlowModel::default();

        let rising: Vec<f64> = (0..10).map(|i| 1000.0 + i as f64 * 100.0).collect();
        assert_eq!(model.flow_trend(&rising), FlowTrend::Increasing);

        let falling: Vec<f64> = (0..10).map(|i| 2000.0 - i as f64 * 100.0).collect();
        assert_eq!(model.flow_trend(&falling), FlowTrend::Decreasing);

        let flat = vec![1000.0, 1010.0, 990.0, 1005.0, 995.0, 1000.0, 1002.0];
        assert_eq!(model.flow_trend(&flat), FlowTrend::Stable);

        assert_eq!(
            model.flow_trend(&[1000.0, 1100.0]),
            FlowTrend::InsufficientData
        );
    }

    #[test]
    fn test_balance_ratio_zero_supply() {
        assert_relative_eq!(ExchangeFlowModel::exchange_balance_ratio(100.0, 0.0), 0.0);
        assert_relative_eq!(
            ExchangeFlowModel::exchange_balance_ratio(100.0, 1000.0),
            0.1
        );
    }

    #[test]
    fn test_selling_pressure_branches() {
        use SellingPressure::*;
        let sp = ExchangeFlowModel::selling_pressure;

        assert_eq!(sp(1500.0, FlowTrend::Increasing, 0.12), High);
        assert_eq!(sp(500.0, FlowTrend::Stable, 0.20), Moderate);
        assert_eq!(sp(-1500.0, FlowTrend::Stable, 0.12), Low);
        assert_eq!(sp(100.0, FlowTrend::Stable, 0.05), VeryLow);
        assert_eq!(sp(100.0, FlowTrend::Stable, 0.12), Neutral);
    }

    #[test]
    fn test_flow_momentum() {
        // older average 100, recent average 200: +100%
        let flows = [100.0, 100.0, 100.0, 100.0, 200.0, 200.0, 200.0];
        assert_relative_eq!(ExchangeFlowModel::flow_momentum(&flows), 1.0);

        assert_relative_eq!(ExchangeFlowModel::flow_momentum(&[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_whale_split_is_proportional_and_flagged() {
        let model = ExchangeFlowModel::default();
        let inflows = vec![1000.0; 10];
        let outflows = vec![800.0; 10];
        let series = flow_series(inflows, outflows);
        let result = model.analyze(&series).into_result();

        assert!(result.whale.heuristic);
        assert_relative_eq!(result.whale.inflow_volume, 10_000.0 * 0.3);
        assert_relative_eq!(result.whale.outflow_volume, 8_000.0 * 0.25);
        assert_relative_eq!(result.whale.net_flow, 1000.0);
        assert_eq!(result.whale.behavior, WhaleBehavior::StrongAccumulation);
    }

    #[test]
    fn test_institutional_split_and_phase() {
        let model = ExchangeFlowModel::default();
        let series = flow_series(vec![1000.0; 10], vec![100.0; 10]);
        let result = model.analyze(&series).into_result();

        assert!(result.institutional.heuristic);
        assert_relative_eq!(result.institutional.inflow_volume, 10_000.0 * 0.4);
        // net 3650 against total flow 11000 exceeds the 10% accumulation bar
        assert_eq!(
            result.institutional.phase,
            InstitutionalPhase::StrongAccumulation
        );
        assert!(result.institutional.sentiment_score > 50.0);
    }

    #[test]
    fn test_breakdown_uses_static_share_table() {
        let model = ExchangeFlowModel::default();
        let series = flow_series(vec![1000.0; 10], vec![500.0; 10]);
        let result = model.analyze(&series).into_result();

        assert!(result.breakdown.heuristic);
        assert_eq!(result.breakdown.shares.len(), 5);
        let total_share: f64 = result.breakdown.shares.iter().map(|s| s.market_share).sum();
        assert_relative_eq!(total_share, 1.0);
        assert_eq!(result.breakdown.shares[0].exchange, "Binance");
    }

    #[test]
    fn test_analyze_end_to_end() {
        let model = ExchangeFlowModel::default();
        let inflow: Vec<f64> = (0..14).map(|i| 1000.0 + i as f64 * 50.0).collect();
        let outflow = vec![600.0; 14];
        let series = flow_series(inflow, outflow);

        let outcome = model.analyze(&series);
        assert!(!outcome.is_degraded());
        let result = outcome.result();
        assert_eq!(result.inflow_trend, FlowTrend::Increasing);
        assert!(result.net_flow > 1000.0);
        assert_eq!(result.selling_pressure, SellingPressure::High);
    }

    #[test]
    fn test_short_series_degrades() {
        let model = ExchangeFlowModel::default();
        let series = flow_series(vec![1000.0; 3], vec![900.0; 3]);
        let outcome = model.analyze(&series);
        assert!(outcome.is_degraded());
        assert_eq!(outcome.result().inflow_trend, FlowTrend::InsufficientData);
    }

    #[test]
    fn test_empty_series_uses_default_ratio() {
        let model = ExchangeFlowModel::default();
        let series = FlowSeries::new(None, vec![], vec![], vec![], vec![]).unwrap();
        let outcome = model.analyze(&series);
        assert!(outcome.is_degraded());
        assert_relative_eq!(
            outcome.result().exchange_balance_ratio,
            DEFAULT_BALANCE_RATIO
        );
    }

    #[test]
    fn test_flow_series_validation() {
        assert!(FlowSeries::new(None, vec![1.0], vec![1.0, 2.0], vec![0.0], vec![0.0]).is_err());
        assert!(FlowSeries::new(None, vec![-1.0], vec![1.0], vec![0.0], vec![0.0]).is_err());
    }
}
