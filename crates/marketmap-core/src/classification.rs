//! Weather-style market classification.
//!
//! A [`ClassificationTable`] is an ordered list of `(rule, label)` rows evaluated top to bottom;
//! the first matching row wins. Band edges keep their inclusive/exclusive sense exactly.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherLabel {
    /// High volatility regardless of direction.
    Stormy,
    Sunny,
    Cloudy,
    PartlyCloudy,
    MostlyCloudy,
    Rainy,
}

impl WeatherLabel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stormy => "stormy",
            Self::Sunny => "sunny",
            Self::Cloudy => "cloudy",
            Self::PartlyCloudy => "partly_cloudy",
            Self::MostlyCloudy => "mostly_cloudy",
            Self::Rainy => "rainy",
        }
    }

    pub const fn emoji(self) -> &'static str {
        match self {
            Self::Stormy => "⛈️",
            Self::Sunny => "☀️",
            Self::Cloudy => "☁️",
            Self::PartlyCloudy => "⛅",
            Self::MostlyCloudy => "🌥️",
            Self::Rainy => "🌧️",
        }
    }
}

impl Display for WeatherLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Band edges used to build the default table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationThresholds {
    pub volatility_threshold_pct: f64,
    pub strong_move_pct: f64,
    pub flat_band_pct: f64,
}

impl Default for ClassificationThresholds {
    fn default() -> Self {
        Self {
            volatility_threshold_pct: 1.5,
            strong_move_pct: 1.0,
            flat_band_pct: 0.5,
        }
    }
}

impl ClassificationThresholds {
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (key, value) in [
            ("volatility_threshold_pct", self.volatility_threshold_pct),
            ("strong_move_pct", self.strong_move_pct),
            ("flat_band_pct", self.flat_band_pct),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ValidationError::InvalidConfig {
                    key,
                    reason: format!("must be a non-negative number, got {value}"),
                });
            }
        }

        if self.flat_band_pct > self.strong_move_pct {
            return Err(ValidationError::InvalidConfig {
                key: "flat_band_pct",
                reason: String::from("must not exceed strong_move_pct"),
            });
        }

        Ok(())
    }
}

/// One predicate in the classification table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BandRule {
    VolatilityAbove(f64),
    ChangeAbove(f64),
    /// `low <= change <= high`
    ChangeWithin { low: f64, high: f64 },
    /// `low <= change < high`
    ChangeFromBelow { low: f64, high: f64 },
    ChangeBelow(f64),
}

impl BandRule {
    pub fn matches(self, change_pct: Option<f64>, volatility_range_pct: Option<f64>) -> bool {
        match (self, change_pct) {
            (Self::VolatilityAbove(limit), _) => volatility_range_pct.is_some_and(|v| v > limit),
            (_, None) => false,
            (Self::ChangeAbove(limit), Some(change)) => change > limit,
            (Self::ChangeWithin { low, high }, Some(change)) => low <= change && change <= high,
            (Self::ChangeFromBelow { low, high }, Some(change)) => low <= change && change < high,
            (Self::ChangeBelow(limit), Some(change)) => change < limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationTable {
    rows: Vec<(BandRule, WeatherLabel)>,
    fallback: WeatherLabel,
}

impl ClassificationTable {
    pub fn new(rows: Vec<(BandRule, WeatherLabel)>, fallback: WeatherLabel) -> Self {
        Self { rows, fallback }
    }

    pub fn from_thresholds(thresholds: &ClassificationThresholds) -> Self {
        let strong = thresholds.strong_move_pct;
        let flat = thresholds.flat_band_pct;

        Self::new(
            vec![
                (
                    BandRule::VolatilityAbove(thresholds.volatility_threshold_pct),
                    WeatherLabel::Stormy,
                ),
                (BandRule::ChangeAbove(strong), WeatherLabel::Sunny),
                (
                    BandRule::ChangeWithin {
                        low: -flat,
                        high: flat,
                    },
                    WeatherLabel::PartlyCloudy,
                ),
                (
                    BandRule::ChangeFromBelow {
                        low: -strong,
                        high: -flat,
                    },
                    WeatherLabel::MostlyCloudy,
                ),
                (BandRule::ChangeBelow(-strong), WeatherLabel::Rainy),
            ],
            WeatherLabel::Cloudy,
        )
    }

    pub fn classify(
        &self,
        change_pct: Option<f64>,
        volatility_range_pct: Option<f64>,
    ) -> WeatherLabel {
        self.rows
            .iter()
            .find(|(rule, _)| rule.matches(change_pct, volatility_range_pct))
            .map(|(_, label)| *label)
            .unwrap_or(self.fallback)
    }
}

impl Default for ClassificationTable {
    fn default() -> Self {
        Self::from_thresholds(&ClassificationThresholds::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(change: f64) -> WeatherLabel {
        ClassificationTable::default().classify(Some(change), None)
    }

    #[test]
    fn flat_band_is_inclusive_on_both_edges() {
        assert_eq!(classify(0.5), WeatherLabel::PartlyCloudy);
        assert_eq!(classify(-0.5), WeatherLabel::PartlyCloudy);
        assert_eq!(classify(0.0), WeatherLabel::PartlyCloudy);
    }

    #[test]
    fn bands_follow_table_order() {
        assert_eq!(classify(1.01), WeatherLabel::Sunny);
        assert_eq!(classify(1.0), WeatherLabel::Cloudy);
        assert_eq!(classify(0.51), WeatherLabel::Cloudy);
        assert_eq!(classify(-0.51), WeatherLabel::MostlyCloudy);
        assert_eq!(classify(-1.0), WeatherLabel::MostlyCloudy);
        assert_eq!(classify(-1.01), WeatherLabel::Rainy);
    }

    #[test]
    fn high_volatility_overrides_direction() {
        let table = ClassificationTable::default();
        assert_eq!(table.classify(Some(3.0), Some(1.6)), WeatherLabel::Stormy);
        assert_eq!(table.classify(Some(-3.0), Some(1.6)), WeatherLabel::Stormy);
        assert_eq!(table.classify(Some(3.0), Some(1.5)), WeatherLabel::Sunny);
    }

    #[test]
    fn missing_change_falls_through_to_cloudy() {
        assert_eq!(ClassificationTable::default().classify(None, None), WeatherLabel::Cloudy);
    }

    #[test]
    fn custom_table_is_honoured() {
        let table = ClassificationTable::new(
            vec![(BandRule::ChangeAbove(0.0), WeatherLabel::Sunny)],
            WeatherLabel::Rainy,
        );
        assert_eq!(table.classify(Some(0.1), None), WeatherLabel::Sunny);
        assert_eq!(table.classify(Some(0.0), None), WeatherLabel::Rainy);
    }

    #[test]
    fn labels_serialize_snake_case() {
        let json = serde_json::to_string(&WeatherLabel::PartlyCloudy).expect("serializable");
        assert_eq!(json, "\"partly_cloudy\"");
    }

    #[test]
    fn thresholds_reject_inverted_bands() {
        let thresholds = ClassificationThresholds {
            flat_band_pct: 2.0,
            ..ClassificationThresholds::default()
        };
        assert!(thresholds.validate().is_err());
    }
}
