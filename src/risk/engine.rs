//! Aggregates exposure windows into per-day and overall risk using the server-delivered
//! risk calculation configuration.

use super::RiskLevel;
use crate::config::{NormalizedTimeToRiskLevelMapping, RiskCalculationConfig};
use crate::exposure::{CalibrationConfidence, ExposureWindow, Infectiousness, ReportType};
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RiskError {
    #[error("no {scope} risk level mapped for normalized time {normalized_time} on {date}")]
    NoRiskLevelForNormalizedTime {
        scope: &'static str,
        date: NaiveDate,
        normalized_time: f64,
    },
    #[error("invalid risk calculation configuration: {0}")]
    InvalidConfiguration(String),
}

/// Aggregated risk of a single calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRisk {
    pub date: NaiveDate,
    pub normalized_time: f64,
    pub risk_level: RiskLevel,
    pub distinct_encounters_with_low_risk: usize,
    pub distinct_encounters_with_high_risk: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskCalculationResult {
    pub risk_level: RiskLevel,
    pub calculation_date: DateTime<Utc>,
    /// Ascending by date
    pub daily: Vec<DailyRisk>,
    pub most_recent_date_with_low_risk: Option<NaiveDate>,
    pub most_recent_date_with_high_risk: Option<NaiveDate>,
    pub number_of_days_with_low_risk: usize,
    pub number_of_days_with_high_risk: usize,
    pub minimum_distinct_encounters_with_low_risk: usize,
    pub minimum_distinct_encounters_with_high_risk: usize,
}

struct ScoredWindow {
    date: NaiveDate,
    transmission_risk_level: u32,
    calibration_confidence: CalibrationConfidence,
    normalized_time: f64,
    risk_level: RiskLevel,
}

pub struct RiskEngine {
    config: RiskCalculationConfig,
}

impl RiskEngine {
    pub fn new(config: RiskCalculationConfig) -> Self {
        Self { config }
    }

    pub fn calculate(
        &self,
        windows: &[ExposureWindow],
        now: DateTime<Utc>,
    ) -> Result<RiskCalculationResult, RiskError> {
        let today = now.date_naive();
        let oldest = today
            .checked_sub_days(Days::new(u64::from(self.config.max_age_in_days)))
            .unwrap_or(NaiveDate::MIN);

        let mut by_date: BTreeMap<NaiveDate, Vec<ScoredWindow>> = BTreeMap::new();
        for window in windows {
            if window.date < oldest || window.date > today {
                debug!(date = %window.date, "exposure window outside calculation period");
                continue;
            }
            if let Some(scored) = self.score_window(window)? {
                by_date.entry(scored.date).or_default().push(scored);
            }
        }

        let mut daily = Vec::with_capacity(by_date.len());
        for (date, scored) in &by_date {
            daily.push(self.aggregate_day(*date, scored)?);
        }

        let latest = |level: RiskLevel| daily.iter().rev().find(|d| d.risk_level == level);
        let count = |level: RiskLevel| daily.iter().filter(|d| d.risk_level == level).count();
        let latest_low = latest(RiskLevel::Low);
        let latest_high = latest(RiskLevel::High);

        let most_recent_date_with_low_risk = latest_low.map(|d| d.date);
        let most_recent_date_with_high_risk = latest_high.map(|d| d.date);
        let minimum_distinct_encounters_with_low_risk = latest_low
            .map(|d| d.distinct_encounters_with_low_risk)
            .unwrap_or(0);
        let minimum_distinct_encounters_with_high_risk = latest_high
            .map(|d| d.distinct_encounters_with_high_risk)
            .unwrap_or(0);
        let number_of_days_with_low_risk = count(RiskLevel::Low);
        let number_of_days_with_high_risk = count(RiskLevel::High);
        let risk_level = if most_recent_date_with_high_risk.is_some() {
            RiskLevel::High
        } else {
            RiskLevel::Low
        };

        Ok(RiskCalculationResult {
            risk_level,
            calculation_date: now,
            daily,
            most_recent_date_with_low_risk,
            most_recent_date_with_high_risk,
            number_of_days_with_low_risk,
            number_of_days_with_high_risk,
            minimum_distinct_encounters_with_low_risk,
            minimum_distinct_encounters_with_high_risk,
        })
    }

    /// Returns `None` when a filter drops the window.
    fn score_window(&self, window: &ExposureWindow) -> Result<Option<ScoredWindow>, RiskError> {
        if self.dropped_by_attenuation_filter(window) {
            debug!(date = %window.date, "exposure window dropped by minutes at attenuation filter");
            return Ok(None);
        }
        let trl = self.transmission_risk_level(window)?;
        if self
            .config
            .trl_filters
            .iter()
            .any(|f| f.drop_if_trl_in_range.contains(f64::from(trl)))
        {
            debug!(date = %window.date, trl, "exposure window dropped by trl filter");
            return Ok(None);
        }

        let normalized_time = self.transmission_risk_value(trl) * self.weighted_minutes(window);
        let risk_level = map_risk_level(
            &self.config.normalized_time_per_ew_to_risk_level_mapping,
            normalized_time,
        )
        .ok_or(RiskError::NoRiskLevelForNormalizedTime {
            scope: "exposure window",
            date: window.date,
            normalized_time,
        })?;

        Ok(Some(ScoredWindow {
            date: window.date,
            transmission_risk_level: trl,
            calibration_confidence: window.calibration_confidence,
            normalized_time,
            risk_level,
        }))
    }

    fn aggregate_day(
        &self,
        date: NaiveDate,
        scored: &[ScoredWindow],
    ) -> Result<DailyRisk, RiskError> {
        let normalized_time: f64 = scored.iter().map(|s| s.normalized_time).sum();
        let risk_level = map_risk_level(
            &self.config.normalized_time_per_day_to_risk_level_mapping,
            normalized_time,
        )
        .ok_or(RiskError::NoRiskLevelForNormalizedTime {
            scope: "daily",
            date,
            normalized_time,
        })?;

        Ok(DailyRisk {
            date,
            normalized_time,
            risk_level,
            distinct_encounters_with_low_risk: distinct_encounters(scored, RiskLevel::Low),
            distinct_encounters_with_high_risk: distinct_encounters(scored, RiskLevel::High),
        })
    }

    fn dropped_by_attenuation_filter(&self, window: &ExposureWindow) -> bool {
        self.config.minutes_at_attenuation_filters.iter().any(|filter| {
            let seconds: u64 = window
                .scan_instances
                .iter()
                .filter(|s| filter.attenuation_range.contains(f64::from(s.typical_attenuation)))
                .map(|s| u64::from(s.seconds_since_last_scan))
                .sum();
            filter.drop_if_minutes_in_range.contains(seconds as f64 / 60.0)
        })
    }

    fn transmission_risk_level(&self, window: &ExposureWindow) -> Result<u32, RiskError> {
        let enc = &self.config.trl_encoding;
        let infectiousness_offset = match window.infectiousness {
            Infectiousness::Standard => enc.infectiousness_offset_standard,
            Infectiousness::High => enc.infectiousness_offset_high,
            Infectiousness::None => 0,
        };
        let report_type_offset = match window.report_type {
            ReportType::ConfirmedTest => enc.report_type_offset_confirmed_test,
            ReportType::ConfirmedClinicalDiagnosis => {
                enc.report_type_offset_confirmed_clinical_diagnosis
            }
            ReportType::SelfReport => enc.report_type_offset_self_report,
            ReportType::Recursive => enc.report_type_offset_recursive,
            ReportType::Unknown | ReportType::Revoked => 0,
        };
        infectiousness_offset
            .checked_add(report_type_offset)
            .ok_or_else(|| {
                RiskError::InvalidConfiguration(format!(
                    "trl offsets {} + {} overflow",
                    infectiousness_offset, report_type_offset
                ))
            })
    }

    fn transmission_risk_value(&self, trl: u32) -> f64 {
        self.config
            .transmission_risk_value_mapping
            .iter()
            .find(|m| m.transmission_risk_level == trl)
            .map(|m| m.transmission_risk_value)
            .unwrap_or(0.0)
    }

    fn weighted_minutes(&self, window: &ExposureWindow) -> f64 {
        let weighted_seconds: f64 = window
            .scan_instances
            .iter()
            .map(|s| {
                let weight = self
                    .config
                    .minutes_at_attenuation_weights
                    .iter()
                    .find(|w| w.attenuation_range.contains(f64::from(s.typical_attenuation)))
                    .map(|w| w.weight)
                    .unwrap_or(0.0);
                f64::from(s.seconds_since_last_scan) * weight
            })
            .sum();
        weighted_seconds / 60.0
    }
}

fn map_risk_level(
    mapping: &[NormalizedTimeToRiskLevelMapping],
    normalized_time: f64,
) -> Option<RiskLevel> {
    mapping
        .iter()
        .find(|m| m.normalized_time_range.contains(normalized_time))
        .map(|m| m.risk_level)
}

/// Encounters are told apart by transmission risk level and calibration confidence.
fn distinct_encounters(scored: &[ScoredWindow], level: RiskLevel) -> usize {
    scored
        .iter()
        .filter(|s| s.risk_level == level)
        .map(|s| (s.transmission_risk_level, s.calibration_confidence))
        .collect::<HashSet<_>>()
        .len()
}
