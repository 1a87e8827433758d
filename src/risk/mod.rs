//! Exposure window risk aggregation and the risk state shown on the home screen.

mod engine;

pub use engine::{DailyRisk, RiskCalculationResult, RiskEngine, RiskError};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownReason {
    /// No detection has completed yet
    NoCalculation,
    /// Last result is older than the detection interval allows
    Outdated,
}

/// Risk as presented to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskState {
    Low,
    High,
    Unknown(UnknownReason),
}

impl RiskState {
    /// A result stays valid for twice the detection interval, so one missed
    /// automatic run does not immediately hide the risk.
    pub fn from_result(
        result: Option<&RiskCalculationResult>,
        now: DateTime<Utc>,
        detection_interval_hours: u32,
    ) -> Self {
        let Some(result) = result else {
            return RiskState::Unknown(UnknownReason::NoCalculation);
        };
        let validity = Duration::hours(i64::from(detection_interval_hours) * 2);
        if now - result.calculation_date > validity {
            return RiskState::Unknown(UnknownReason::Outdated);
        }
        match result.risk_level {
            RiskLevel::Low => RiskState::Low,
            RiskLevel::High => RiskState::High,
        }
    }
}
