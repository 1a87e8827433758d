//! Exposure window data model: platform enumerations, scan instances and the
//! immutable window value consumed by the risk calculation.

mod decoder;

pub use decoder::{decode_windows, DecodeError, ExposureWindowRecord, ScanInstanceRecord};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Diagnosis report type as reported by the exposure notification platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    Unknown,
    ConfirmedTest,
    ConfirmedClinicalDiagnosis,
    SelfReport,
    Recursive,
    Revoked,
}

impl ReportType {
    pub fn code(self) -> u32 {
        match self {
            ReportType::Unknown => 0,
            ReportType::ConfirmedTest => 1,
            ReportType::ConfirmedClinicalDiagnosis => 2,
            ReportType::SelfReport => 3,
            ReportType::Recursive => 4,
            ReportType::Revoked => 5,
        }
    }
}

impl TryFrom<i64> for ReportType {
    type Error = DecodeError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ReportType::Unknown),
            1 => Ok(ReportType::ConfirmedTest),
            2 => Ok(ReportType::ConfirmedClinicalDiagnosis),
            3 => Ok(ReportType::SelfReport),
            4 => Ok(ReportType::Recursive),
            5 => Ok(ReportType::Revoked),
            _ => Err(DecodeError::InvalidCode {
                field: "reportType",
                code,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Infectiousness {
    None,
    Standard,
    High,
}

impl Infectiousness {
    pub fn code(self) -> u32 {
        match self {
            Infectiousness::None => 0,
            Infectiousness::Standard => 1,
            Infectiousness::High => 2,
        }
    }
}

impl TryFrom<i64> for Infectiousness {
    type Error = DecodeError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Infectiousness::None),
            1 => Ok(Infectiousness::Standard),
            2 => Ok(Infectiousness::High),
            _ => Err(DecodeError::InvalidCode {
                field: "infectiousness",
                code,
            }),
        }
    }
}

/// Confidence of the platform in the attenuation calibration of the sending device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationConfidence {
    Lowest,
    Low,
    Medium,
    High,
}

impl CalibrationConfidence {
    pub fn code(self) -> u8 {
        match self {
            CalibrationConfidence::Lowest => 0,
            CalibrationConfidence::Low => 1,
            CalibrationConfidence::Medium => 2,
            CalibrationConfidence::High => 3,
        }
    }
}

impl TryFrom<i64> for CalibrationConfidence {
    type Error = DecodeError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(CalibrationConfidence::Lowest),
            1 => Ok(CalibrationConfidence::Low),
            2 => Ok(CalibrationConfidence::Medium),
            3 => Ok(CalibrationConfidence::High),
            _ => Err(DecodeError::InvalidCode {
                field: "calibrationConfidence",
                code,
            }),
        }
    }
}

/// One proximity beacon sample inside an exposure window. Attenuations in dB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanInstance {
    pub minimum_attenuation: u8,
    pub typical_attenuation: u8,
    pub seconds_since_last_scan: u32,
}

/// One exposure episode on a single calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposureWindow {
    pub date: NaiveDate,
    pub report_type: ReportType,
    pub infectiousness: Infectiousness,
    pub calibration_confidence: CalibrationConfidence,
    pub scan_instances: Vec<ScanInstance>,
}

impl ExposureWindow {
    /// Total scan duration in seconds.
    pub fn duration_secs(&self) -> u64 {
        self.scan_instances
            .iter()
            .map(|s| u64::from(s.seconds_since_last_scan))
            .sum()
    }
}
