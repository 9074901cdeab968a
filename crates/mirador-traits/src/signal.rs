//! Trading signal and risk enumerations, and the evaluation outcome type.
//!
//! Every model encodes its failure modes in the success value: evaluation
//! returns an [`Evaluation`] that is either fully computed or explicitly
//! degraded, never an `Err`. Callers that only want the payload can ignore
//! the distinction; test suites can assert on it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A discrete trading recommendation derived from computed thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    /// Strong conviction buy.
    StrongBuy,
    /// Buy.
    Buy,
    /// No action.
    Hold,
    /// Sell.
    Sell,
    /// Strong conviction sell.
    StrongSell,
}

impl Signal {
    /// Derives a valuation signal from an upside/downside percentage
    /// (`(fair_value - price) / price * 100`).
    ///
    /// Thresholds: above 20% strong buy, above 10% buy, above -10% hold,
    /// above -20% sell, otherwise strong sell.
    #[must_use]
    pub fn from_upside_pct(upside_pct: f64) -> Self {
        if upside_pct > 20.0 {
            Self::StrongBuy
        } else if upside_pct > 10.0 {
            Self::Buy
        } else if upside_pct > -10.0 {
            Self::Hold
        } else if upside_pct > -20.0 {
            Self::Sell
        } else {
            Self::StrongSell
        }
    }

    /// Whether the signal leans long.
    #[must_use]
    pub const fn is_bullish(&self) -> bool {
        matches!(self, Self::StrongBuy | Self::Buy)
    }

    /// Whether the signal leans short.
    #[must_use]
    pub const fn is_bearish(&self) -> bool {
        matches!(self, Self::StrongSell | Self::Sell)
    }

    /// Screaming-case label used in serialized output and the CLI.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::StrongBuy => "STRONG_BUY",
            Self::Buy => "BUY",
            Self::Hold => "HOLD",
            Self::Sell => "SELL",
            Self::StrongSell => "STRONG_SELL",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Qualitative risk assessment attached to model results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    /// Low risk.
    Low,
    /// Medium risk.
    Medium,
    /// High risk.
    High,
}

impl RiskLevel {
    /// Human-readable label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an evaluation produced a degraded result instead of a full one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DegradeReason {
    /// Fewer bars than the model's minimum window.
    InsufficientHistory {
        /// Bars the model needs for a full evaluation.
        required: usize,
        /// Bars actually supplied.
        available: usize,
    },
    /// No fundamental snapshot was supplied to a model that wants one.
    MissingFundamentals,
    /// A numeric guard replaced an invalid intermediate state.
    NumericalGuard(String),
    /// The computation could not proceed at all; the result is a neutral
    /// placeholder.
    Fallback(String),
}

impl fmt::Display for DegradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientHistory {
                required,
                available,
            } => write!(f, "insufficient history: {available} of {required} bars"),
            Self::MissingFundamentals => write!(f, "no fundamental data supplied"),
            Self::NumericalGuard(msg) => write!(f, "numeric guard: {msg}"),
            Self::Fallback(msg) => write!(f, "fallback result: {msg}"),
        }
    }
}

/// The outcome of a model evaluation.
///
/// A model call always yields a usable result object; degraded outcomes
/// (short history, missing inputs, guarded numerics) still carry a complete
/// result with floor-level confidence, tagged with the reason. This replaces
/// the catch-all-and-return-empty pattern with something a test can
/// distinguish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Evaluation<T> {
    /// The model ran its full computation.
    Computed(T),
    /// The model produced a reduced-quality result.
    Degraded {
        /// The (still well-formed) result.
        result: T,
        /// What forced the degradation.
        reason: DegradeReason,
    },
}

impl<T> Evaluation<T> {
    /// Borrows the result regardless of outcome.
    pub const fn result(&self) -> &T {
        match self {
            Self::Computed(r) | Self::Degraded { result: r, .. } => r,
        }
    }

    /// Consumes the evaluation, returning the result.
    pub fn into_result(self) -> T {
        match self {
            Self::Computed(r) | Self::Degraded { result: r, .. } => r,
        }
    }

    /// Whether the outcome was degraded.
    pub const fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// The degradation reason, when degraded.
    pub const fn reason(&self) -> Option<&DegradeReason> {
        match self {
            Self::Computed(_) => None,
            Self::Degraded { reason, .. } => Some(reason),
        }
    }

    /// Maps the payload, preserving the outcome tag.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Evaluation<U> {
        match self {
            Self::Computed(r) => Evaluation::Computed(f(r)),
            Self::Degraded { result, reason } => Evaluation::Degraded {
                result: f(result),
                reason,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_thresholds() {
        assert_eq!(Signal::from_upside_pct(25.0), Signal::StrongBuy);
        assert_eq!(Signal::from_upside_pct(15.0), Signal::Buy);
        assert_eq!(Signal::from_upside_pct(0.0), Signal::Hold);
        assert_eq!(Signal::from_upside_pct(-15.0), Signal::Sell);
        assert_eq!(Signal::from_upside_pct(-25.0), Signal::StrongSell);
    }

    #[test]
    fn test_signal_boundaries() {
        // thresholds are strict inequalities
        assert_eq!(Signal::from_upside_pct(20.0), Signal::Buy);
        assert_eq!(Signal::from_upside_pct(10.0), Signal::Hold);
        assert_eq!(Signal::from_upside_pct(-10.0), Signal::Sell);
        assert_eq!(Signal::from_upside_pct(-20.0), Signal::StrongSell);
    }

    #[test]
    fn test_signal_direction() {
        assert!(Signal::StrongBuy.is_bullish());
        assert!(Signal::Sell.is_bearish());
        assert!(!Signal::Hold.is_bullish());
        assert!(!Signal::Hold.is_bearish());
    }

    #[test]
    fn test_evaluation_accessors() {
        let computed: Evaluation<i32> = Evaluation::Computed(7);
        assert!(!computed.is_degraded());
        assert_eq!(*computed.result(), 7);
        assert!(computed.reason().is_none());

        let degraded = Evaluation::Degraded {
            result: 0,
            reason: DegradeReason::MissingFundamentals,
        };
        assert!(degraded.is_degraded());
        assert_eq!(degraded.into_result(), 0);
    }

    #[test]
    fn test_evaluation_map() {
        let degraded = Evaluation::Degraded {
            result: 2,
            reason: DegradeReason::Fallback("empty series".to_string()),
        };
        let mapped = degraded.map(|v| v * 10);
        assert!(mapped.is_degraded());
        assert_eq!(*mapped.result(), 20);
    }

    #[test]
    fn test_degrade_reason_display() {
        let reason = DegradeReason::InsufficientHistory {
            required: 52,
            available: 10,
        };
        assert_eq!(reason.to_string(), "insufficient history: 10 of 52 bars");
    }
}
