//! Model registry for discovering and categorizing the available indicator
//! models.

use serde::{Deserialize, Serialize};

/// Indicator model category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelCategory {
    /// Fundamental-data-driven fair-value models.
    Valuation,
    /// Statistical forecasting over price series.
    TimeSeries,
    /// Geometric and rule-based chart-pattern models.
    Technical,
    /// Volatility-state classification and transition models.
    Regime,
    /// Exchange flow analytics.
    Flow,
}

impl ModelCategory {
    /// Get a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Valuation => "Fundamental fair-value and factor-return estimation",
            Self::TimeSeries => "Statistical forecasting and feature engineering",
            Self::Technical => "Chart-pattern construction and signal derivation",
            Self::Regime => "Volatility-state classification and transition forecasting",
            Self::Flow => "Exchange flow and holder-cohort analytics",
        }
    }
}

/// Metadata about an indicator model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Unique identifier for the model.
    pub name: &'static str,
    /// Category classification.
    pub category: ModelCategory,
    /// Human-readable description.
    pub description: &'static str,
    /// Minimum bars for a non-degraded evaluation.
    pub min_history: usize,
    /// Whether the model consumes fundamental data.
    pub requires_fundamentals: bool,
}

/// Get information about all available models.
#[must_use]
pub fn available_models() -> Vec<ModelInfo> {
    vec![
        ModelInfo {
            name: "dcf",
            category: ModelCategory::Valuation,
            description: "Discounted cash flow fair value with sensitivity and scenarios",
            min_history: 1,
            requires_fundamentals: true,
        },
        ModelInfo {
            name: "fama_french",
            category: ModelCategory::Valuation,
            description: "3- and 5-factor expected returns from characteristic loadings",
            min_history: 1,
            requires_fundamentals: true,
        },
        ModelInfo {
            name: "arima",
            category: ModelCategory::TimeSeries,
            description: "AIC-selected lagged-regression forecast with intervals",
            min_history: 20,
            requires_fundamentals: false,
        },
        ModelInfo {
            name: "feature_pipeline",
            category: ModelCategory::TimeSeries,
            description: "Sequence-model feature engineering and windowing",
            min_history: 51,
            requires_fundamentals: false,
        },
        ModelInfo {
            name: "ichimoku",
            category: ModelCategory::Technical,
            description: "Five-line Ichimoku construction with crossover tags",
            min_history: 52,
            requires_fundamentals: false,
        },
        ModelInfo {
            name: "volatility_regime",
            category: ModelCategory::Regime,
            description: "Four-band volatility regime with Markov transition forecast",
            min_history: 11,
            requires_fundamentals: false,
        },
        ModelInfo {
            name: "exchange_flow",
            category: ModelCategory::Flow,
            description: "Net exchange flow trends with cohort-split estimates",
            min_history: 7,
            requires_fundamentals: false,
        },
    ]
}

/// Get all models in a specific category.
#[must_use]
pub fn models_by_category(category: &ModelCategory) -> Vec<ModelInfo> {
    available_models()
        .into_iter()
        .filter(|info| &info.category == category)
        .collect()
}

/// Get information about a specific model by name.
#[must_use]
pub fn get_model_info(name: &str) -> Option<ModelInfo> {
    available_models().into_iter().find(|info| info.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_models() {
        let models = available_models();
        assert_eq!(models.len(), 7);

        let categories: Vec<_> = models.iter().map(|m| m.category).collect();
        assert!(categories.contains(&ModelCategory::Valuation));
        assert!(categories.contains(&ModelCategory::TimeSeries));
        assert!(categories.contains(&ModelCategory::Technical));
        assert!(categories.contains(&ModelCategory::Regime));
        assert!(categories.contains(&ModelCategory::Flow));
    }

    #[test]
    fn test_models_by_category() {
        let valuation = models_by_category(&ModelCategory::Valuation);
        assert_eq!(valuation.len(), 2);
        assert!(valuation.iter().all(|m| m.requires_fundamentals));

        let technical = models_by_category(&ModelCategory::Technical);
        assert_eq!(technical.len(), 1);
    }

    #[test]
    fn test_get_model_info() {
        let info = get_model_info("ichimoku").unwrap();
        assert_eq!(info.category, ModelCategory::Technical);
        assert_eq!(info.min_history, 52);

        assert!(get_model_info("nonexistent_model").is_none());
    }

    #[test]
    fn test_category_descriptions() {
        for models in [
            ModelCategory::Valuation,
            ModelCategory::TimeSeries,
            ModelCategory::Technical,
            ModelCategory::Regime,
            ModelCategory::Flow,
        ] {
            assert!(!models.description().is_empty());
        }
    }
}
