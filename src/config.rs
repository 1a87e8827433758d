//! Agent configuration. The risk calculation section is delivered by the backend;
//! the built-in defaults are used until a server configuration has been loaded.

use crate::home::DetectionMode;
use crate::risk::RiskLevel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Risk calculation parameters (server-controlled)
    pub risk: RiskCalculationConfig,
    /// Exposure detection scheduling
    pub detection: DetectionConfig,
    /// Logging
    pub log: LogConfig,
}

/// Numeric range with per-bound exclusivity, as used throughout the risk parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub min_exclusive: bool,
    #[serde(default)]
    pub max_exclusive: bool,
}

impl ValueRange {
    /// `[min, max]`
    pub fn closed(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            min_exclusive: false,
            max_exclusive: false,
        }
    }

    /// `[min, max)`
    pub fn half_open(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            min_exclusive: false,
            max_exclusive: true,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        let above_min = if self.min_exclusive {
            value > self.min
        } else {
            value >= self.min
        };
        let below_max = if self.max_exclusive {
            value < self.max
        } else {
            value <= self.max
        };
        above_min && below_max
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinutesAtAttenuationFilter {
    pub attenuation_range: ValueRange,
    pub drop_if_minutes_in_range: ValueRange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrlFilter {
    pub drop_if_trl_in_range: ValueRange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinutesAtAttenuationWeight {
    pub attenuation_range: ValueRange,
    pub weight: f64,
}

/// Offsets summed into the transmission risk level (TRL) of a window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrlEncoding {
    pub infectiousness_offset_standard: u32,
    pub infectiousness_offset_high: u32,
    pub report_type_offset_confirmed_test: u32,
    pub report_type_offset_confirmed_clinical_diagnosis: u32,
    pub report_type_offset_self_report: u32,
    pub report_type_offset_recursive: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransmissionRiskValueMapping {
    pub transmission_risk_level: u32,
    pub transmission_risk_value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedTimeToRiskLevelMapping {
    pub normalized_time_range: ValueRange,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskCalculationConfig {
    /// Windows older than this (relative to today) are ignored
    pub max_age_in_days: u32,
    pub minutes_at_attenuation_filters: Vec<MinutesAtAttenuationFilter>,
    pub trl_filters: Vec<TrlFilter>,
    pub minutes_at_attenuation_weights: Vec<MinutesAtAttenuationWeight>,
    pub trl_encoding: TrlEncoding,
    pub transmission_risk_value_mapping: Vec<TransmissionRiskValueMapping>,
    pub normalized_time_per_ew_to_risk_level_mapping: Vec<NormalizedTimeToRiskLevelMapping>,
    pub normalized_time_per_day_to_risk_level_mapping: Vec<NormalizedTimeToRiskLevelMapping>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub mode: DetectionMode,
    /// Hours between automatic detections; also the validity of a risk result
    pub interval_hours: u32,
    /// Exposure window fixture consumed by the offline agent run
    pub fixture_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            risk: RiskCalculationConfig::default(),
            detection: DetectionConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for TrlEncoding {
    fn default() -> Self {
        Self {
            infectiousness_offset_standard: 0,
            infectiousness_offset_high: 4,
            report_type_offset_confirmed_test: 4,
            report_type_offset_confirmed_clinical_diagnosis: 2,
            report_type_offset_self_report: 3,
            report_type_offset_recursive: 4,
        }
    }
}

impl Default for RiskCalculationConfig {
    fn default() -> Self {
        let level_mapping = vec![
            NormalizedTimeToRiskLevelMapping {
                normalized_time_range: ValueRange::half_open(0.0, 15.0),
                risk_level: RiskLevel::Low,
            },
            NormalizedTimeToRiskLevelMapping {
                normalized_time_range: ValueRange::closed(15.0, 9999.0),
                risk_level: RiskLevel::High,
            },
        ];
        let trl_values = [0.0, 0.0, 0.6, 0.8, 1.0, 1.2, 1.4, 1.6];

        Self {
            max_age_in_days: 14,
            minutes_at_attenuation_filters: vec![MinutesAtAttenuationFilter {
                attenuation_range: ValueRange::half_open(0.0, 73.0),
                drop_if_minutes_in_range: ValueRange::half_open(0.0, 10.0),
            }],
            trl_filters: vec![TrlFilter {
                drop_if_trl_in_range: ValueRange::closed(1.0, 2.0),
            }],
            minutes_at_attenuation_weights: vec![
                MinutesAtAttenuationWeight {
                    attenuation_range: ValueRange::half_open(0.0, 55.0),
                    weight: 1.0,
                },
                MinutesAtAttenuationWeight {
                    attenuation_range: ValueRange::half_open(55.0, 63.0),
                    weight: 0.5,
                },
            ],
            trl_encoding: TrlEncoding::default(),
            transmission_risk_value_mapping: trl_values
                .iter()
                .enumerate()
                .map(|(i, v)| TransmissionRiskValueMapping {
                    transmission_risk_level: i as u32 + 1,
                    transmission_risk_value: *v,
                })
                .collect(),
            normalized_time_per_ew_to_risk_level_mapping: level_mapping.clone(),
            normalized_time_per_day_to_risk_level_mapping: level_mapping,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            mode: DetectionMode::Automatic,
            interval_hours: 24,
            fixture_path: None,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
}

impl AgentConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &Path) -> Self {
        Self::try_load(path).unwrap_or_default()
    }

    /// Like [`AgentConfig::load`], but an unreadable or invalid file is an error.
    /// A missing file still yields the default.
    pub fn try_load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}
