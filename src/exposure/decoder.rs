//! Decodes exposure window records (fixture files, platform dumps) into typed windows.
//! Dates are derived as `today - ageInDays` in calendar days.

use super::{CalibrationConfidence, ExposureWindow, Infectiousness, ReportType, ScanInstance};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid {field} code: {code}")]
    InvalidCode { field: &'static str, code: i64 },
    #[error("invalid ageInDays {age_in_days} relative to {today}")]
    InvalidAge { age_in_days: i64, today: NaiveDate },
    #[error("malformed exposure window json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanInstanceRecord {
    pub minimum_attenuation: u8,
    pub typical_attenuation: u8,
    pub seconds_since_last_scan: u32,
}

impl From<&ScanInstanceRecord> for ScanInstance {
    fn from(r: &ScanInstanceRecord) -> Self {
        ScanInstance {
            minimum_attenuation: r.minimum_attenuation,
            typical_attenuation: r.typical_attenuation,
            seconds_since_last_scan: r.seconds_since_last_scan,
        }
    }
}

/// Raw, integer-encoded exposure window as found in test data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExposureWindowRecord {
    pub age_in_days: i64,
    pub report_type: i64,
    pub infectiousness: i64,
    pub calibration_confidence: i64,
    #[serde(default)]
    pub scan_instances: Vec<ScanInstanceRecord>,
}

impl ExposureWindowRecord {
    pub fn decode(&self, today: NaiveDate) -> Result<ExposureWindow, DecodeError> {
        let invalid_age = || DecodeError::InvalidAge {
            age_in_days: self.age_in_days,
            today,
        };
        let age = u64::try_from(self.age_in_days).map_err(|_| invalid_age())?;
        let date = today.checked_sub_days(Days::new(age)).ok_or_else(invalid_age)?;

        Ok(ExposureWindow {
            date,
            report_type: ReportType::try_from(self.report_type)?,
            infectiousness: Infectiousness::try_from(self.infectiousness)?,
            calibration_confidence: CalibrationConfidence::try_from(self.calibration_confidence)?,
            scan_instances: self.scan_instances.iter().map(ScanInstance::from).collect(),
        })
    }
}

/// Decode a JSON array of records. The first invalid record fails the whole batch.
pub fn decode_windows(json: &str, today: NaiveDate) -> Result<Vec<ExposureWindow>, DecodeError> {
    let records: Vec<ExposureWindowRecord> = serde_json::from_str(json)?;
    records.iter().map(|r| r.decode(today)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(age_in_days: i64) -> ExposureWindowRecord {
        ExposureWindowRecord {
            age_in_days,
            report_type: 1,
            infectiousness: 2,
            calibration_confidence: 3,
            scan_instances: vec![ScanInstanceRecord {
                minimum_attenuation: 25,
                typical_attenuation: 30,
                seconds_since_last_scan: 300,
            }],
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn age_zero_is_today() {
        let today = day(2020, 11, 20);
        assert_eq!(record(0).decode(today).unwrap().date, today);
    }

    #[test]
    fn age_counts_calendar_days_across_month_and_year_ends() {
        assert_eq!(record(5).decode(day(2020, 11, 20)).unwrap().date, day(2020, 11, 15));
        assert_eq!(record(5).decode(day(2021, 3, 2)).unwrap().date, day(2021, 2, 25));
        assert_eq!(record(1).decode(day(2021, 1, 1)).unwrap().date, day(2020, 12, 31));
    }

    #[test]
    fn enums_and_scan_instances_are_carried_over() {
        let w = record(0).decode(day(2020, 11, 20)).unwrap();
        assert_eq!(w.report_type, ReportType::ConfirmedTest);
        assert_eq!(w.infectiousness, Infectiousness::High);
        assert_eq!(w.calibration_confidence, CalibrationConfidence::High);
        assert_eq!(w.scan_instances.len(), 1);
        assert_eq!(w.scan_instances[0].seconds_since_last_scan, 300);
    }

    #[test]
    fn out_of_range_code_fails_with_typed_error() {
        let mut r = record(0);
        r.infectiousness = 7;
        let err = r.decode(day(2020, 11, 20)).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidCode { field: "infectiousness", code: 7 }
        ));
    }

    #[test]
    fn negative_age_is_rejected() {
        let err = record(-1).decode(day(2020, 11, 20)).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidAge { age_in_days: -1, .. }));
    }

    #[test]
    fn decode_windows_reads_camel_case_fixture() {
        let json = r#"[
            {"ageInDays": 1, "reportType": 2, "infectiousness": 1, "calibrationConfidence": 0,
             "scanInstances": [{"minimumAttenuation": 40, "typicalAttenuation": 50, "secondsSinceLastScan": 180}]},
            {"ageInDays": 3, "reportType": 3, "infectiousness": 2, "calibrationConfidence": 1}
        ]"#;
        let windows = decode_windows(json, day(2020, 11, 20)).unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].date, day(2020, 11, 19));
        assert_eq!(windows[0].report_type, ReportType::ConfirmedClinicalDiagnosis);
        assert!(windows[1].scan_instances.is_empty());
    }

    #[test]
    fn decode_windows_reports_malformed_json() {
        let err = decode_windows("{not json", day(2020, 11, 20)).unwrap_err();
        assert!(matches!(err, DecodeError::Json(_)));
    }
}
