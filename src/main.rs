//! exposure-risk entrypoint: runs one offline exposure detection over a fixture of
//! exposure windows and prints the outcome as a JSON line on stdout.

use chrono::{Days, NaiveDate, Utc};
use exposure_risk::{
    config::{AgentConfig, RiskCalculationConfig},
    detection::{DaysAndHours, DetectionDelegate, ExposureDetection, SummaryCause},
    exposure::{decode_windows, ExposureWindow},
    home::{DetectionMode, DetectionState, ManualExposureDetectionState, RiskCellConfigurator},
    logging::{DetectionLogEvent, StructuredLogger},
    risk::RiskState,
};
use std::path::PathBuf;
use tracing::{info, warn};

/// Serves a pre-recorded set of exposure windows in place of the platform service.
struct FixtureDelegate {
    config: RiskCalculationConfig,
    windows: Option<Vec<ExposureWindow>>,
    today: NaiveDate,
}

impl DetectionDelegate for FixtureDelegate {
    fn device_time_correct(&self) -> bool {
        true
    }

    fn supported_countries(&self) -> Option<Vec<String>> {
        Some(vec!["local".to_string()])
    }

    fn available_days_and_hours(&self, _countries: &[String]) -> Option<DaysAndHours> {
        let days = (0..u64::from(self.config.max_age_in_days))
            .filter_map(|age| self.today.checked_sub_days(Days::new(age)))
            .collect();
        Some(DaysAndHours { days, hours: Vec::new() })
    }

    fn has_disk_space(&self, _packages: &DaysAndHours) -> bool {
        true
    }

    fn write_diagnosis_keys(&self, _packages: &DaysAndHours) -> std::io::Result<()> {
        Ok(())
    }

    fn exposure_configuration(&self) -> Option<RiskCalculationConfig> {
        Some(self.config.clone())
    }

    fn exposure_manager_available(&self) -> bool {
        true
    }

    fn detect_exposure_windows(&self) -> Result<Vec<ExposureWindow>, SummaryCause> {
        self.windows.clone().ok_or(SummaryCause::None)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = std::env::var("EXPOSURE_RISK_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.json"));
    let (config, config_error) = match AgentConfig::try_load(&config_path) {
        Ok(config) => (config, None),
        Err(e) => (AgentConfig::default(), Some(e)),
    };

    StructuredLogger::init(config.log.json, &config.log.level);
    if let Some(e) = config_error {
        warn!(path = ?config_path, error = %e, "invalid config, using defaults");
    }

    let now = Utc::now();
    let today = now.date_naive();
    let fixture = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| config.detection.fixture_path.clone());

    let windows = match &fixture {
        Some(path) => {
            let data = std::fs::read_to_string(path)?;
            let windows = decode_windows(&data, today)?;
            info!(path = ?path, count = windows.len(), "decoded exposure windows");
            Some(windows)
        }
        None => None,
    };

    let delegate = FixtureDelegate {
        config: config.risk.clone(),
        windows,
        today,
    };
    let detection = ExposureDetection::new();
    let outcome = detection.run(&delegate, now);

    let risk_state =
        RiskState::from_result(outcome.as_ref().ok(), now, config.detection.interval_hours);
    let manual_state = match config.detection.mode {
        DetectionMode::Manual => Some(ManualExposureDetectionState::Waiting),
        DetectionMode::Automatic => None,
    };
    let cell = RiskCellConfigurator::new(
        DetectionState::Idle,
        outcome.as_ref().ok().map(|r| r.calculation_date),
        config.detection.interval_hours,
        config.detection.mode,
        manual_state,
    );
    info!(
        risk_state = ?risk_state,
        cell_hash = cell.display_hash(),
        update_button = ?cell.update_button(),
        "risk cell configured"
    );

    let event = DetectionLogEvent::from_outcome(detection.id(), &outcome);
    StructuredLogger::emit_json(&event, &mut std::io::stdout());

    outcome?;
    Ok(())
}
