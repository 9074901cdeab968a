//! Ichimoku Kinko Hyo (Ichimoku Cloud) indicator.
//!
//! Builds the five Ichimoku lines from OHLC history, derives the cloud
//! boundaries, and emits rule-based crossover and position tags. Indices
//! before a full window use all available history, so the lines are defined
//! from the first bar onward.

use serde::{Deserialize, Serialize};

use mirador_traits::stats::trend_slope;
use mirador_traits::{DegradeReason, Evaluation, IndicatorModel, ModelInput};

/// Configuration for the Ichimoku indicator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IchimokuConfig {
    /// Tenkan-sen (conversion line) period.
    pub tenkan_period: usize,
    /// Kijun-sen (base line) period.
    pub kijun_period: usize,
    /// Senkou Span B (leading span B) period.
    pub senkou_b_period: usize,
    /// Forward displacement of the Senkou spans and backward displacement of
    /// the Chikou span.
    pub displacement: usize,
}

impl Default for IchimokuConfig {
    fn default() -> Self {
        Self {
            tenkan_period: 9,
            kijun_period: 26,
            senkou_b_period: 52,
            displacement: 26,
        }
    }
}

/// Rule-based signal tags emitted by the Ichimoku model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IchimokuTag {
    /// Tenkan-sen crossed above Kijun-sen.
    TenkanKijunBullishCross,
    /// Tenkan-sen crossed below Kijun-sen.
    TenkanKijunBearishCross,
    /// Price crossed above the Kijun-sen.
    PriceAboveKijun,
    /// Price crossed below the Kijun-sen.
    PriceBelowKijun,
    /// Price trades above the cloud.
    PriceAboveCloud,
    /// Price trades below the cloud.
    PriceBelowCloud,
    /// Price trades inside the cloud.
    PriceInCloud,
    /// Span A above Span B.
    BullishCloud,
    /// Span A below Span B.
    BearishCloud,
    /// Chikou span above the price of `displacement` bars ago.
    ChikouBullish,
    /// Chikou span below the price of `displacement` bars ago.
    ChikouBearish,
    /// At least three bullish tags agree.
    StrongBullishTrend,
    /// At least three bearish tags agree.
    StrongBearishTrend,
    /// No rule fired.
    Neutral,
    /// History shorter than the Senkou B window.
    InsufficientData,
}

impl IchimokuTag {
    /// Whether this tag points up.
    #[must_use]
    pub const fn is_bullish(&self) -> bool {
        matches!(
            self,
            Self::TenkanKijunBullishCross
                | Self::PriceAboveKijun
                | Self::PriceAboveCloud
                | Self::BullishCloud
                | Self::ChikouBullish
                | Self::StrongBullishTrend
        )
    }

    /// Whether this tag points down.
    #[must_use]
    pub const fn is_bearish(&self) -> bool {
        matches!(
            self,
            Self::TenkanKijunBearishCross
                | Self::PriceBelowKijun
                | Self::PriceBelowCloud
                | Self::BearishCloud
                | Self::ChikouBearish
                | Self::StrongBearishTrend
        )
    }
}

/// Where the price sits relative to the cloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloudPosition {
    /// Above the upper boundary.
    AboveCloud,
    /// Below the lower boundary.
    BelowCloud,
    /// Between the boundaries.
    InCloud,
}

/// Price position relative to the cloud.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriceCloudAnalysis {
    /// Position classification.
    pub position: CloudPosition,
    /// Normalized distance: fraction of price outside the cloud, or the
    /// position within the cloud thickness when inside.
    pub distance: f64,
    /// Current upper boundary.
    pub cloud_top: f64,
    /// Current lower boundary.
    pub cloud_bottom: f64,
    /// Boundary spread.
    pub thickness: f64,
}

/// Overall trend direction from component alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendDirection {
    /// Five or more alignment points.
    StrongBullish,
    /// Three or four alignment points.
    Bullish,
    /// Two alignment points.
    Bearish,
    /// One or zero alignment points.
    StrongBearish,
}

/// Component-alignment trend score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrendAnalysis {
    /// Direction bucket.
    pub direction: TrendDirection,
    /// Alignment strength in [0, 1].
    pub strength: f64,
    /// Raw alignment score.
    pub score: u32,
    /// Maximum attainable score.
    pub max_score: u32,
}

/// Momentum classification from the Tenkan/Kijun slopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MomentumState {
    /// Both slopes up, Tenkan much faster.
    AcceleratingBullish,
    /// Both slopes up.
    Bullish,
    /// Both slopes down, Tenkan much faster.
    AcceleratingBearish,
    /// Both slopes down.
    Bearish,
    /// Slopes disagree.
    Mixed,
}

/// Momentum read from the conversion and base lines.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MomentumAnalysis {
    /// Momentum bucket.
    pub state: MomentumState,
    /// Tenkan and Kijun slopes point in opposite directions.
    pub divergence: bool,
    /// Five-bar Tenkan-sen slope.
    pub tenkan_slope: f64,
    /// Five-bar Kijun-sen slope.
    pub kijun_slope: f64,
}

/// Cloud color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloudColor {
    /// Span A above Span B.
    Bullish,
    /// Span A below Span B.
    Bearish,
    /// Spans equal.
    Neutral,
}

/// Direction of the cloud's drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlopeTrend {
    /// Average span slope positive.
    Rising,
    /// Average span slope negative.
    Falling,
    /// Average span slope zero.
    Flat,
}

/// Cloud shape characteristics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CloudAnalysis {
    /// Color of the current cloud.
    pub color: CloudColor,
    /// Current span spread.
    pub thickness: f64,
    /// Drift direction of the spans.
    pub trend: SlopeTrend,
    /// Five-bar Span A slope.
    pub span_a_slope: f64,
    /// Five-bar Span B slope.
    pub span_b_slope: f64,
}

/// Chikou span confirmation read.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChikouAnalysis {
    /// Chikou versus the displaced price.
    pub direction: CloudColor,
    /// Whether the Chikou span runs clear of past prices (no overlap within
    /// 1%).
    pub clear_space: bool,
    /// Current Chikou value.
    pub chikou_value: f64,
    /// Price `displacement` bars ago.
    pub reference_price: f64,
}

/// What a support/resistance level is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelKind {
    /// Kijun-sen acting as support.
    KijunSupport,
    /// Kijun-sen acting as resistance.
    KijunResistance,
    /// Upper cloud boundary acting as support.
    CloudTopSupport,
    /// Lower cloud boundary acting as support.
    CloudBottomSupport,
    /// Upper cloud boundary acting as resistance.
    CloudTopResistance,
    /// Lower cloud boundary acting as resistance.
    CloudBottomResistance,
}

/// Strength bucket of a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelStrength {
    /// Single-line level.
    Medium,
    /// Cloud-boundary level.
    Strong,
}

/// A support or resistance level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Level {
    /// Price level.
    pub level: f64,
    /// What the level is derived from.
    pub kind: LevelKind,
    /// Strength bucket.
    pub strength: LevelStrength,
}

/// Support and resistance levels implied by the current lines.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupportResistance {
    /// Levels below the price.
    pub supports: Vec<Level>,
    /// Levels above the price.
    pub resistances: Vec<Level>,
}

/// Result of an Ichimoku evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IchimokuResult {
    /// Conversion line.
    pub tenkan_sen: Vec<f64>,
    /// Base line.
    pub kijun_sen: Vec<f64>,
    /// Leading span A, shifted forward by the displacement (zero-padded).
    pub senkou_span_a: Vec<f64>,
    /// Leading span B, shifted forward by the displacement (zero-padded).
    pub senkou_span_b: Vec<f64>,
    /// Lagging span: closes shifted backward by the displacement.
    pub chikou_span: Vec<f64>,
    /// Elementwise max of the leading spans.
    pub cloud_top: Vec<f64>,
    /// Elementwise min of the leading spans.
    pub cloud_bottom: Vec<f64>,
    /// Rule-based signal tags, in emission order.
    pub signals: Vec<IchimokuTag>,
    /// Price position relative to the cloud.
    pub price_vs_cloud: Option<PriceCloudAnalysis>,
    /// Component-alignment trend score.
    pub trend: Option<TrendAnalysis>,
    /// Tenkan/Kijun momentum read.
    pub momentum: Option<MomentumAnalysis>,
    /// Cloud shape characteristics.
    pub cloud: Option<CloudAnalysis>,
    /// Chikou confirmation read.
    pub chikou: Option<ChikouAnalysis>,
    /// Implied support and resistance levels.
    pub support_resistance: SupportResistance,
    /// History-based confidence in [0, 1].
    pub confidence: f64,
    /// Human-readable summary.
    pub interpretation: String,
}

/// Ichimoku Kinko Hyo calculator.
#[derive(Debug, Clone)]
pub struct IchimokuModel {
    config: IchimokuConfig,
}

impl IchimokuModel {
    /// Creates an Ichimoku model with the given configuration.
    #[must_use]
    pub const fn new(config: IchimokuConfig) -> Self {
        Self { config }
    }

    /// The model configuration.
    #[must_use]
    pub const fn config(&self) -> &IchimokuConfig {
        &self.config
    }

    /// Midpoint of the period high and low, using all available history
    /// before a full window exists.
    fn midpoint_line(high: &[f64], low: &[f64], period: usize) -> Vec<f64> {
        let period = period.max(1);
        (0..high.len())
            .map(|i| {
                let start = i.saturating_sub(period - 1);
                let period_high = high[start..=i].iter().copied().fold(f64::MIN, f64::max);
                let period_low = low[start..=i].iter().copied().fold(f64::MAX, f64::min);
                (period_high + period_low) / 2.0
            })
            .collect()
    }

    fn shift_forward(values: Vec<f64>, displacement: usize) -> Vec<f64> {
        let mut shifted = vec![0.0; displacement];
        shifted.extend(values);
        shifted
    }

    fn chikou_span(close: &[f64], displacement: usize) -> Vec<f64> {
        if close.len() <= displacement {
            return vec![0.0; close.len()];
        }
        let mut chikou: Vec<f64> = close[displacement..].to_vec();
        chikou.extend(std::iter::repeat_n(0.0, displacement));
        chikou
    }

    fn generate_signals(
        &self,
        close: &[f64],
        tenkan: &[f64],
        kijun: &[f64],
        span_a: &[f64],
        span_b: &[f64],
        chikou: &[f64],
        cloud_top: &[f64],
        cloud_bottom: &[f64],
    ) -> Vec<IchimokuTag> {
        let mut signals = Vec::new();
        let n = close.len();
        let current_price = close[n - 1];

        // Tenkan/Kijun crossover
        if n >= 2 {
            let (t_prev, t_cur) = (tenkan[n - 2], tenkan[n - 1]);
            let (k_prev, k_cur) = (kijun[n - 2], kijun[n - 1]);
            if t_prev <= k_prev && t_cur > k_cur {
                signals.push(IchimokuTag::TenkanKijunBullishCross);
            } else if t_prev >= k_prev && t_cur < k_cur {
                signals.push(IchimokuTag::TenkanKijunBearishCross);
            }

            if close[n - 2] <= k_prev && current_price > k_cur {
                signals.push(IchimokuTag::PriceAboveKijun);
            } else if close[n - 2] >= k_prev && current_price < k_cur {
                signals.push(IchimokuTag::PriceBelowKijun);
            }
        }

        // Price versus cloud; zero sentinels collapse to the price itself
        if let (Some(&top), Some(&bottom)) = (cloud_top.last(), cloud_bottom.last()) {
            let top = if top != 0.0 { top } else { current_price };
            let bottom = if bottom != 0.0 { bottom } else { current_price };
            if current_price > top {
                signals.push(IchimokuTag::PriceAboveCloud);
            } else if current_price < bottom {
                signals.push(IchimokuTag::PriceBelowCloud);
            } else {
                signals.push(IchimokuTag::PriceInCloud);
            }
        }

        // Cloud color
        if let (Some(&a), Some(&b)) = (span_a.last(), span_b.last()) {
            if a > b {
                signals.push(IchimokuTag::BullishCloud);
            } else if a < b {
                signals.push(IchimokuTag::BearishCloud);
            }
        }

        // Chikou versus the displaced price
        let displacement = self.config.displacement;
        if n > displacement {
            let chikou_current = chikou[n - 1 - displacement];
            let reference = close[n - 1 - displacement];
            if chikou_current > reference {
                signals.push(IchimokuTag::ChikouBullish);
            } else if chikou_current < reference {
                signals.push(IchimokuTag::ChikouBearish);
            }
        }

        // Strong trend when at least three emitted tags agree in direction
        if signals.len() >= 3 {
            let bullish = signals.iter().filter(|s| s.is_bullish()).count();
            let bearish = signals.iter().filter(|s| s.is_bearish()).count();
            if bullish >= 3 {
                signals.push(IchimokuTag::StrongBullishTrend);
            } else if bearish >= 3 {
                signals.push(IchimokuTag::StrongBearishTrend);
            }
        }

        if signals.is_empty() {
            signals.push(IchimokuTag::Neutral);
        }
        signals
    }

    fn analyze_price_vs_cloud(
        close: &[f64],
        cloud_top: &[f64],
        cloud_bottom: &[f64],
    ) -> Option<PriceCloudAnalysis> {
        let current_price = *close.last()?;
        let top = *cloud_top.last()?;
        let bottom = *cloud_bottom.last()?;
        let top = if top != 0.0 { top } else { current_price };
        let bottom = if bottom != 0.0 { bottom } else { current_price };

        let thickness = top - bottom;
        let (position, distance) = if current_price > top {
            (CloudPosition::AboveCloud, (current_price - top) / current_price)
        } else if current_price < bottom {
            (CloudPosition::BelowCloud, (bottom - current_price) / current_price)
        } else if thickness > 0.0 {
            (CloudPosition::InCloud, (current_price - bottom) / thickness)
        } else {
            (CloudPosition::InCloud, 0.5)
        };

        Some(PriceCloudAnalysis {
            position,
            distance,
            cloud_top: top,
            cloud_bottom: bottom,
            thickness,
        })
    }

    fn analyze_trend(
        close: &[f64],
        tenkan: &[f64],
        kijun: &[f64],
        cloud_top: &[f64],
        cloud_bottom: &[f64],
    ) -> Option<TrendAnalysis> {
        if close.len() < 10 {
            return None;
        }
        let current_price = *close.last()?;
        let current_tenkan = *tenkan.last()?;
        let current_kijun = *kijun.last()?;
        let top = cloud_top.last().copied().filter(|&v| v != 0.0).unwrap_or(current_price);
        let bottom = cloud_bottom
            .last()
            .copied()
            .filter(|&v| v != 0.0)
            .unwrap_or(current_price);

        let mut score = 0u32;
        if current_price > current_tenkan {
            score += 1;
        }
        if current_price > current_kijun {
            score += 1;
        }
        if current_price > top {
            score += 2;
        }
        if current_tenkan > current_kijun {
            score += 1;
        }
        // cloud color approximated from the line midpoints
        if (current_tenkan + current_kijun) / 2.0 > bottom {
            score += 1;
        }

        let (direction, strength) = match score {
            5..=6 => (TrendDirection::StrongBullish, score as f64 / 6.0),
            3..=4 => (TrendDirection::Bullish, score as f64 / 6.0),
            2 => (TrendDirection::Bearish, (6 - score) as f64 / 6.0),
            _ => (TrendDirection::StrongBearish, (6 - score) as f64 / 6.0),
        };

        Some(TrendAnalysis {
            direction,
            strength,
            score,
            max_score: 6,
        })
    }

    fn analyze_momentum(tenkan: &[f64], kijun: &[f64]) -> Option<MomentumAnalysis> {
        if tenkan.len() < 5 || kijun.len() < 5 {
            return None;
        }
        let tenkan_slope = trend_slope(&tenkan[tenkan.len() - 5..])?;
        let kijun_slope = trend_slope(&kijun[kijun.len() - 5..])?;

        let state = if tenkan_slope > 0.0 && kijun_slope > 0.0 {
            if tenkan_slope > kijun_slope * 1.5 {
                MomentumState::AcceleratingBullish
            } else {
                MomentumState::Bullish
            }
        } else if tenkan_slope < 0.0 && kijun_slope < 0.0 {
            if tenkan_slope.abs() > kijun_slope.abs() * 1.5 {
                MomentumState::AcceleratingBearish
            } else {
                MomentumState::Bearish
            }
        } else {
            MomentumState::Mixed
        };

        let divergence = (tenkan_slope > 0.0 && kijun_slope < 0.0)
            || (tenkan_slope < 0.0 && kijun_slope > 0.0);

        Some(MomentumAnalysis {
            state,
            divergence,
            tenkan_slope,
            kijun_slope,
        })
    }

    fn analyze_cloud(span_a: &[f64], span_b: &[f64]) -> Option<CloudAnalysis> {
        if span_a.len() < 5 || span_b.len() < 5 {
            return None;
        }
        let current_a = *span_a.last()?;
        let current_b = *span_b.last()?;

        let color = if current_a > current_b {
            CloudColor::Bullish
        } else if current_a < current_b {
            CloudColor::Bearish
        } else {
            CloudColor::Neutral
        };

        let span_a_slope = trend_slope(&span_a[span_a.len() - 5..])?;
        let span_b_slope = trend_slope(&span_b[span_b.len() - 5..])?;
        let avg = (span_a_slope + span_b_slope) / 2.0;
        let trend = if avg > 0.0 {
            SlopeTrend::Rising
        } else if avg < 0.0 {
            SlopeTrend::Falling
        } else {
            SlopeTrend::Flat
        };

        Some(CloudAnalysis {
            color,
            thickness: (current_a - current_b).abs(),
            trend,
            span_a_slope,
            span_b_slope,
        })
    }

    fn analyze_chikou(&self, close: &[f64], chikou: &[f64]) -> Option<ChikouAnalysis> {
        let displacement = self.config.displacement;
        let n = close.len();
        if n < displacement + 5 {
            return None;
        }

        let chikou_value = chikou[n - 1 - displacement];
        let reference_price = close[n - 1 - displacement];
        let direction = if chikou_value > reference_price {
            CloudColor::Bullish
        } else if chikou_value < reference_price {
            CloudColor::Bearish
        } else {
            CloudColor::Neutral
        };

        // Clear space: the lagging span should not hug past prices
        let mut clear_space = true;
        for i in 1..displacement.min(n - displacement) {
            let j = n - 1 - displacement - i;
            let price = close[j];
            if price > 0.0 && ((chikou[j] - price) / price).abs() < 0.01 {
                clear_space = false;
                break;
            }
        }

        Some(ChikouAnalysis {
            direction,
            clear_space,
            chikou_value,
            reference_price,
        })
    }

    fn support_resistance(
        close: &[f64],
        kijun: &[f64],
        cloud_top: &[f64],
        cloud_bottom: &[f64],
    ) -> SupportResistance {
        let mut levels = SupportResistance::default();
        let (Some(&current_price), Some(&current_kijun)) = (close.last(), kijun.last()) else {
            return levels;
        };

        if current_price > current_kijun {
            levels.supports.push(Level {
                level: current_kijun,
                kind: LevelKind::KijunSupport,
                strength: LevelStrength::Medium,
            });
        } else {
            levels.resistances.push(Level {
                level: current_kijun,
                kind: LevelKind::KijunResistance,
                strength: LevelStrength::Medium,
            });
        }

        if let (Some(&top), Some(&bottom)) = (cloud_top.last(), cloud_bottom.last()) {
            let top = if top != 0.0 { top } else { current_price };
            let bottom = if bottom != 0.0 { bottom } else { current_price };
            if current_price > top {
                levels.supports.push(Level {
                    level: top,
                    kind: LevelKind::CloudTopSupport,
                    strength: LevelStrength::Strong,
                });
                levels.supports.push(Level {
                    level: bottom,
                    kind: LevelKind::CloudBottomSupport,
                    strength: LevelStrength::Strong,
                });
            } else if current_price < bottom {
                levels.resistances.push(Level {
                    level: bottom,
                    kind: LevelKind::CloudBottomResistance,
                    strength: LevelStrength::Strong,
                });
                levels.resistances.push(Level {
                    level: top,
                    kind: LevelKind::CloudTopResistance,
                    strength: LevelStrength::Strong,
                });
            }
        }

        levels
    }

    fn interpret(signals: &[IchimokuTag], trend: Option<&TrendAnalysis>) -> String {
        if signals.contains(&IchimokuTag::InsufficientData) {
            return "Insufficient history for a full Ichimoku read".to_string();
        }
        let trend_text = trend.map_or("trend unclear", |t| match t.direction {
            TrendDirection::StrongBullish => "strong bullish trend",
            TrendDirection::Bullish => "bullish trend",
            TrendDirection::Bearish => "bearish trend",
            TrendDirection::StrongBearish => "strong bearish trend",
        });
        let position = if signals.contains(&IchimokuTag::PriceAboveCloud) {
            "price above the cloud"
        } else if signals.contains(&IchimokuTag::PriceBelowCloud) {
            "price below the cloud"
        } else {
            "price inside the cloud"
        };
        format!("Ichimoku shows a {trend_text} with {position}")
    }
}

impl Default for IchimokuModel {
    fn default() -> Self {
        Self::new(IchimokuConfig::default())
    }
}

impl IndicatorModel for IchimokuModel {
    type Output = IchimokuResult;

    fn name(&self) -> &str {
        "ichimoku"
    }

    fn min_history(&self) -> usize {
        self.config.senkou_b_period
    }

    fn evaluate(&self, input: &ModelInput<'_>) -> Evaluation<IchimokuResult> {
        let high = input.prices.highs();
        let low = input.prices.lows();
        let close = input.prices.closes();
        let n = close.len();
        let cfg = &self.config;

        if n < cfg.senkou_b_period {
            tracing::debug!(
                available = n,
                required = cfg.senkou_b_period,
                "ichimoku degraded: history shorter than the Senkou B window"
            );
            // Degraded single-signal result: every line collapses to the close
            let flat = close.to_vec();
            let (cloud_top, cloud_bottom) = (flat.clone(), flat.clone());
            let signals = vec![IchimokuTag::InsufficientData];
            let interpretation = Self::interpret(&signals, None);
            return Evaluation::Degraded {
                result: IchimokuResult {
                    tenkan_sen: flat.clone(),
                    kijun_sen: flat.clone(),
                    senkou_span_a: flat.clone(),
                    senkou_span_b: flat.clone(),
                    chikou_span: flat,
                    cloud_top,
                    cloud_bottom,
                    signals,
                    price_vs_cloud: None,
                    trend: None,
                    momentum: None,
                    cloud: None,
                    chikou: None,
                    support_resistance: SupportResistance::default(),
                    confidence: 0.1,
                    interpretation,
                },
                reason: DegradeReason::InsufficientHistory {
                    required: cfg.senkou_b_period,
                    available: n,
                },
            };
        }

        let tenkan_sen = Self::midpoint_line(high, low, cfg.tenkan_period);
        let kijun_sen = Self::midpoint_line(high, low, cfg.kijun_period);

        let span_a_raw: Vec<f64> = tenkan_sen
            .iter()
            .zip(&kijun_sen)
            .map(|(t, k)| (t + k) / 2.0)
            .collect();
        let senkou_span_a = Self::shift_forward(span_a_raw, cfg.displacement);
        let senkou_span_b = Self::shift_forward(
            Self::midpoint_line(high, low, cfg.senkou_b_period),
            cfg.displacement,
        );
        let chikou_span = Self::chikou_span(close, cfg.displacement);

        let cloud_top: Vec<f64> = senkou_span_a
            .iter()
            .zip(&senkou_span_b)
            .map(|(a, b)| a.max(*b))
            .collect();
        let cloud_bottom: Vec<f64> = senkou_span_a
            .iter()
            .zip(&senkou_span_b)
            .map(|(a, b)| a.min(*b))
            .collect();

        let signals = self.generate_signals(
            close,
            &tenkan_sen,
            &kijun_sen,
            &senkou_span_a,
            &senkou_span_b,
            &chikou_span,
            &cloud_top,
            &cloud_bottom,
        );

        let trend = Self::analyze_trend(close, &tenkan_sen, &kijun_sen, &cloud_top, &cloud_bottom);
        let confidence = (0.3 + (n - cfg.senkou_b_period) as f64 * 0.01).min(0.95);
        let interpretation = Self::interpret(&signals, trend.as_ref());

        Evaluation::Computed(IchimokuResult {
            price_vs_cloud: Self::analyze_price_vs_cloud(close, &cloud_top, &cloud_bottom),
            trend,
            momentum: Self::analyze_momentum(&tenkan_sen, &kijun_sen),
            cloud: Self::analyze_cloud(&senkou_span_a, &senkou_span_b),
            chikou: self.analyze_chikou(close, &chikou_span),
            support_resistance: Self::support_resistance(close, &kijun_sen, &cloud_top, &cloud_bottom),
            tenkan_sen,
            kijun_sen,
            senkou_span_a,
            senkou_span_b,
            chikou_span,
            cloud_top,
            cloud_bottom,
            signals,
            confidence,
            interpretation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mirador_traits::{MarketContext, PriceSeries};

    fn rising_series(bars: usize) -> PriceSeries {
        let close: Vec<f64> = (0..bars).map(|i| 100.0 + i as f64).collect();
        let high: Vec<f64> = close.iter().map(|c| c + 2.0).collect();
        let low: Vec<f64> = close.iter().map(|c| c - 2.0).collect();
        PriceSeries::from_columns(None, close.clone(), high, low, close, vec![0.0; bars]).unwrap()
    }

    fn evaluate(prices: &PriceSeries) -> Evaluation<IchimokuResult> {
        let market = MarketContext::default();
        let input = ModelInput::from_prices(prices, &market);
        IchimokuModel::default().evaluate(&input)
    }

    #[test]
    fn test_default_config() {
        let config = IchimokuConfig::default();
        assert_eq!(config.tenkan_period, 9);
        assert_eq!(config.kijun_period, 26);
        assert_eq!(config.senkou_b_period, 52);
        assert_eq!(config.displacement, 26);
    }

    #[test]
    fn test_cloud_invariants() {
        let prices = rising_series(80);
        let result = evaluate(&prices).into_result();

        assert_eq!(result.chikou_span.len(), 80);
        assert_eq!(result.cloud_top.len(), result.cloud_bottom.len());
        for (top, bottom) in result.cloud_top.iter().zip(&result.cloud_bottom) {
            assert!(top >= bottom);
        }
        // spans carry the forward displacement padding
        assert_eq!(result.senkou_span_a.len(), 80 + 26);
        assert!(result.senkou_span_a[..26].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_insufficient_history_degrades() {
        let prices = rising_series(30);
        let outcome = evaluate(&prices);

        assert!(outcome.is_degraded());
        let result = outcome.result();
        assert_eq!(result.signals, vec![IchimokuTag::InsufficientData]);
        assert!(result.confidence <= 0.1);
        assert_eq!(result.chikou_span.len(), 30);
    }

    #[test]
    fn test_rising_series_signals() {
        let prices = rising_series(60);
        let result = evaluate(&prices).into_result();

        assert!(result.signals.contains(&IchimokuTag::PriceAboveCloud));
        assert!(result.signals.contains(&IchimokuTag::BullishCloud));
        assert!(result.signals.contains(&IchimokuTag::StrongBullishTrend));

        // beyond the longest warm-up window the cloud trails the rising price
        let close = prices.closes();
        for i in 52..close.len() {
            assert!(
                result.cloud_top[i] < close[i],
                "cloud top must trail a steadily rising close at bar {i}"
            );
        }
    }

    #[test]
    fn test_trend_alignment_on_rising_series() {
        let prices = rising_series(60);
        let result = evaluate(&prices).into_result();

        let trend = result.trend.unwrap();
        assert_eq!(trend.direction, TrendDirection::StrongBullish);
        assert_eq!(trend.score, 6);
        assert_relative_eq!(trend.strength, 1.0);

        let momentum = result.momentum.unwrap();
        assert_eq!(momentum.state, MomentumState::Bullish);
        assert!(!momentum.divergence);
    }

    #[test]
    fn test_falling_series_signals() {
        let close: Vec<f64> = (0..60).map(|i| 200.0 - i as f64).collect();
        let high: Vec<f64> = close.iter().map(|c| c + 2.0).collect();
        let low: Vec<f64> = close.iter().map(|c| c - 2.0).collect();
        let prices =
            PriceSeries::from_columns(None, close.clone(), high, low, close, vec![0.0; 60]).unwrap();
        let result = evaluate(&prices).into_result();

        assert!(result.signals.contains(&IchimokuTag::PriceBelowCloud));
        assert!(result.signals.contains(&IchimokuTag::BearishCloud));
        assert!(result.signals.contains(&IchimokuTag::StrongBearishTrend));
    }

    #[test]
    fn test_confidence_scales_with_history() {
        let short = evaluate(&rising_series(60)).into_result();
        let long = evaluate(&rising_series(150)).into_result();

        assert_relative_eq!(short.confidence, 0.38);
        assert!(long.confidence > short.confidence);
        assert!(long.confidence <= 0.95);
    }

    #[test]
    fn test_support_levels_on_rising_series() {
        let prices = rising_series(60);
        let result = evaluate(&prices).into_result();

        // price above kijun and cloud: all three levels act as support
        assert_eq!(result.support_resistance.supports.len(), 3);
        assert!(result.support_resistance.resistances.is_empty());
    }
}
