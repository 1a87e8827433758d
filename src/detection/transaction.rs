//! Drives a single detection attempt against the platform and backend seams.

use super::{FailureReason, SummaryCause};
use crate::config::RiskCalculationConfig;
use crate::exposure::ExposureWindow;
use crate::risk::{RiskCalculationResult, RiskEngine, RiskError};
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

/// Remote key packages available for download.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DaysAndHours {
    pub days: Vec<NaiveDate>,
    pub hours: Vec<u8>,
}

impl DaysAndHours {
    pub fn package_count(&self) -> usize {
        self.days.len() + self.hours.len()
    }
}

/// Answers from the platform exposure notification service and the key/config backend.
pub trait DetectionDelegate {
    fn device_time_correct(&self) -> bool;
    fn supported_countries(&self) -> Option<Vec<String>>;
    fn available_days_and_hours(&self, countries: &[String]) -> Option<DaysAndHours>;
    fn has_disk_space(&self, packages: &DaysAndHours) -> bool;
    fn write_diagnosis_keys(&self, packages: &DaysAndHours) -> std::io::Result<()>;
    fn exposure_configuration(&self) -> Option<RiskCalculationConfig>;
    fn exposure_manager_available(&self) -> bool;
    fn detect_exposure_windows(&self) -> Result<Vec<ExposureWindow>, SummaryCause>;
}

#[derive(Debug, Error)]
pub enum DetectionError {
    #[error(transparent)]
    EndedPrematurely(#[from] FailureReason),
    #[error("risk calculation failed: {0}")]
    Risk(#[from] RiskError),
}

impl DetectionError {
    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            DetectionError::EndedPrematurely(reason) => Some(*reason),
            DetectionError::Risk(_) => None,
        }
    }
}

pub struct ExposureDetection {
    id: Uuid,
}

impl Default for ExposureDetection {
    fn default() -> Self {
        Self::new()
    }
}

impl ExposureDetection {
    pub fn new() -> Self {
        Self { id: Uuid::new_v4() }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn run(
        &self,
        delegate: &impl DetectionDelegate,
        now: DateTime<Utc>,
    ) -> Result<RiskCalculationResult, DetectionError> {
        info!(detection_id = %self.id, "exposure detection started");
        let result = self.execute(delegate, now);
        match &result {
            Ok(r) => info!(
                detection_id = %self.id,
                risk_level = ?r.risk_level,
                days = r.daily.len(),
                "exposure detection finished"
            ),
            Err(DetectionError::EndedPrematurely(reason)) => warn!(
                detection_id = %self.id,
                reason = reason.code(),
                retryable = reason.is_retryable(),
                "exposure detection ended prematurely"
            ),
            Err(e) => warn!(detection_id = %self.id, error = %e, "exposure detection failed"),
        }
        result
    }

    fn execute(
        &self,
        delegate: &impl DetectionDelegate,
        now: DateTime<Utc>,
    ) -> Result<RiskCalculationResult, DetectionError> {
        if !delegate.device_time_correct() {
            return Err(FailureReason::WrongDeviceTime.into());
        }
        let countries = delegate
            .supported_countries()
            .filter(|c| !c.is_empty())
            .ok_or(FailureReason::NoSupportedCountries)?;
        let packages = delegate
            .available_days_and_hours(&countries)
            .ok_or(FailureReason::NoDaysAndHours)?;
        if !delegate.has_disk_space(&packages) {
            return Err(FailureReason::NoDiskSpace.into());
        }
        if let Err(e) = delegate.write_diagnosis_keys(&packages) {
            warn!(detection_id = %self.id, error = %e, "writing diagnosis keys failed");
            return Err(FailureReason::UnableToWriteDiagnosisKeys.into());
        }
        info!(
            detection_id = %self.id,
            packages = packages.package_count(),
            countries = countries.len(),
            "diagnosis keys written"
        );

        let config = delegate
            .exposure_configuration()
            .ok_or(FailureReason::NoExposureConfiguration)?;
        if !delegate.exposure_manager_available() {
            return Err(FailureReason::NoExposureManager.into());
        }
        let windows = delegate
            .detect_exposure_windows()
            .map_err(FailureReason::NoSummary)?;
        info!(
            detection_id = %self.id,
            windows = windows.len(),
            exposure_secs = windows.iter().map(ExposureWindow::duration_secs).sum::<u64>(),
            "exposure windows detected"
        );

        let engine = RiskEngine::new(config);
        Ok(engine.calculate(&windows, now)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exposure::{CalibrationConfidence, Infectiousness, ReportType, ScanInstance};
    use crate::risk::RiskLevel;

    struct FakeDelegate {
        time_ok: bool,
        countries: Option<Vec<String>>,
        packages: Option<DaysAndHours>,
        disk_space: bool,
        write_ok: bool,
        config: Option<RiskCalculationConfig>,
        manager: bool,
        windows: Result<Vec<ExposureWindow>, SummaryCause>,
    }

    impl Default for FakeDelegate {
        fn default() -> Self {
            Self {
                time_ok: true,
                countries: Some(vec!["DE".into()]),
                packages: Some(DaysAndHours {
                    days: vec![NaiveDate::from_ymd_opt(2020, 12, 9).unwrap()],
                    hours: vec![],
                }),
                disk_space: true,
                write_ok: true,
                config: Some(RiskCalculationConfig::default()),
                manager: true,
                windows: Ok(vec![]),
            }
        }
    }

    impl DetectionDelegate for FakeDelegate {
        fn device_time_correct(&self) -> bool {
            self.time_ok
        }
        fn supported_countries(&self) -> Option<Vec<String>> {
            self.countries.clone()
        }
        fn available_days_and_hours(&self, _countries: &[String]) -> Option<DaysAndHours> {
            self.packages.clone()
        }
        fn has_disk_space(&self, _packages: &DaysAndHours) -> bool {
            self.disk_space
        }
        fn write_diagnosis_keys(&self, _packages: &DaysAndHours) -> std::io::Result<()> {
            if self.write_ok {
                Ok(())
            } else {
                Err(std::io::Error::other("read-only"))
            }
        }
        fn exposure_configuration(&self) -> Option<RiskCalculationConfig> {
            self.config.clone()
        }
        fn exposure_manager_available(&self) -> bool {
            self.manager
        }
        fn detect_exposure_windows(&self) -> Result<Vec<ExposureWindow>, SummaryCause> {
            self.windows.clone()
        }
    }

    fn reason(delegate: FakeDelegate) -> Option<FailureReason> {
        ExposureDetection::new()
            .run(&delegate, Utc::now())
            .unwrap_err()
            .failure_reason()
    }

    fn delegate_with(change: impl FnOnce(&mut FakeDelegate)) -> FakeDelegate {
        let mut delegate = FakeDelegate::default();
        change(&mut delegate);
        delegate
    }

    fn close_window(now: DateTime<Utc>) -> ExposureWindow {
        ExposureWindow {
            date: now.date_naive(),
            report_type: ReportType::ConfirmedTest,
            infectiousness: Infectiousness::High,
            calibration_confidence: CalibrationConfidence::High,
            scan_instances: vec![ScanInstance {
                minimum_attenuation: 35,
                typical_attenuation: 40,
                seconds_since_last_scan: 1800,
            }],
        }
    }

    #[test]
    fn each_missing_step_maps_to_its_reason() {
        let cases = vec![
            (delegate_with(|d| d.time_ok = false), FailureReason::WrongDeviceTime),
            (delegate_with(|d| d.countries = None), FailureReason::NoSupportedCountries),
            (delegate_with(|d| d.countries = Some(vec![])), FailureReason::NoSupportedCountries),
            (delegate_with(|d| d.packages = None), FailureReason::NoDaysAndHours),
            (delegate_with(|d| d.disk_space = false), FailureReason::NoDiskSpace),
            (delegate_with(|d| d.write_ok = false), FailureReason::UnableToWriteDiagnosisKeys),
            (delegate_with(|d| d.config = None), FailureReason::NoExposureConfiguration),
            (delegate_with(|d| d.manager = false), FailureReason::NoExposureManager),
            (
                delegate_with(|d| d.windows = Err(SummaryCause::AlreadyRunning)),
                FailureReason::NoSummary(SummaryCause::AlreadyRunning),
            ),
        ];
        for (delegate, expected) in cases {
            assert_eq!(reason(delegate), Some(expected));
        }
    }

    #[test]
    fn unmappable_configuration_surfaces_as_risk_error() {
        let now = Utc::now();
        let mut config = RiskCalculationConfig::default();
        config.normalized_time_per_ew_to_risk_level_mapping.clear();
        let delegate = delegate_with(|d| {
            d.config = Some(config);
            d.windows = Ok(vec![close_window(now)]);
        });

        let err = ExposureDetection::new().run(&delegate, now).unwrap_err();
        assert!(matches!(err, DetectionError::Risk(_)));
        assert_eq!(err.failure_reason(), None);
    }

    #[test]
    fn successful_detection_yields_risk_result() {
        let now = Utc::now();
        let delegate = delegate_with(|d| d.windows = Ok(vec![close_window(now)]));
        let result = ExposureDetection::new().run(&delegate, now).unwrap();
        assert_eq!(result.risk_level, RiskLevel::High);
        assert_eq!(result.calculation_date, now);
    }
}
