//! Risk cell configurator. Two configurators are equal iff all five identity fields are
//! equal, and the hash covers exactly those fields.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Lifecycle of the exposure detection driving the cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionState {
    Idle,
    Downloading,
    Detecting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMode {
    Automatic,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManualExposureDetectionState {
    Possible,
    Waiting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateButton {
    Hidden,
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RiskCellConfigurator {
    pub state: DetectionState,
    pub last_update_date: Option<DateTime<Utc>>,
    /// Hours between detections
    pub detection_interval: u32,
    pub detection_mode: DetectionMode,
    pub manual_exposure_detection_state: Option<ManualExposureDetectionState>,
}

impl RiskCellConfigurator {
    pub fn new(
        state: DetectionState,
        last_update_date: Option<DateTime<Utc>>,
        detection_interval: u32,
        detection_mode: DetectionMode,
        manual_exposure_detection_state: Option<ManualExposureDetectionState>,
    ) -> Self {
        Self {
            state,
            last_update_date,
            detection_interval,
            detection_mode,
            manual_exposure_detection_state,
        }
    }

    pub fn display_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    pub fn update_button(&self) -> UpdateButton {
        match (self.detection_mode, self.state) {
            (DetectionMode::Automatic, _) => UpdateButton::Hidden,
            (DetectionMode::Manual, DetectionState::Idle)
                if self.manual_exposure_detection_state
                    == Some(ManualExposureDetectionState::Possible) =>
            {
                UpdateButton::Enabled
            }
            (DetectionMode::Manual, _) => UpdateButton::Disabled,
        }
    }

    pub fn next_update_date(&self) -> Option<DateTime<Utc>> {
        let interval = Duration::hours(i64::from(self.detection_interval));
        self.last_update_date.and_then(|d| d.checked_add_signed(interval))
    }
}

/// Keeps the configurator of the previous refresh cycle.
#[derive(Debug, Default)]
pub struct RiskCellRefresh {
    previous: Option<RiskCellConfigurator>,
}

impl RiskCellRefresh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `next` and report whether it differs from the previous cycle.
    pub fn update(&mut self, next: RiskCellConfigurator) -> bool {
        let changed = self.previous.as_ref() != Some(&next);
        self.previous = Some(next);
        changed
    }

    pub fn current(&self) -> Option<&RiskCellConfigurator> {
        self.previous.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use super::ManualExposureDetectionState::{Possible, Waiting};

    fn configurator(
        date: DateTime<Utc>,
        mode: DetectionMode,
        manual: ManualExposureDetectionState,
    ) -> RiskCellConfigurator {
        RiskCellConfigurator::new(DetectionState::Idle, Some(date), 0, mode, Some(manual))
    }

    #[test]
    fn identical_fields_have_equal_hash() {
        let date = Utc::now();
        let a = configurator(date, DetectionMode::Manual, Possible);
        let b = configurator(date, DetectionMode::Manual, Possible);
        assert_eq!(a, b);
        assert_eq!(a.display_hash(), b.display_hash());
    }

    #[test]
    fn detection_mode_changes_identity() {
        let date = Utc::now();
        let a = configurator(date, DetectionMode::Manual, Possible);
        let b = configurator(date, DetectionMode::Automatic, Possible);
        assert_ne!(a, b);
        assert_ne!(a.display_hash(), b.display_hash());
    }

    #[test]
    fn manual_detection_state_changes_identity() {
        let date = Utc::now();
        let a = configurator(date, DetectionMode::Manual, Possible);
        let b = configurator(date, DetectionMode::Manual, Waiting);
        assert_ne!(a, b);
        assert_ne!(a.display_hash(), b.display_hash());
    }

    #[test]
    fn every_field_takes_part_in_equality() {
        let date = Utc::now();
        let base = configurator(date, DetectionMode::Manual, Possible);

        let mut other = base.clone();
        other.state = DetectionState::Detecting;
        assert_ne!(base, other);

        let mut other = base.clone();
        other.last_update_date = Some(date + Duration::seconds(1));
        assert_ne!(base, other);

        let mut other = base.clone();
        other.last_update_date = None;
        assert_ne!(base, other);

        let mut other = base.clone();
        other.detection_interval = 24;
        assert_ne!(base, other);

        let mut other = base.clone();
        other.manual_exposure_detection_state = None;
        assert_ne!(base, other);
    }

    #[test]
    fn update_button_follows_mode_and_state() {
        let date = Utc::now();
        let manual = configurator(date, DetectionMode::Manual, Possible);
        assert_eq!(manual.update_button(), UpdateButton::Enabled);

        let waiting = configurator(date, DetectionMode::Manual, Waiting);
        assert_eq!(waiting.update_button(), UpdateButton::Disabled);

        let mut running = manual.clone();
        running.state = DetectionState::Downloading;
        assert_eq!(running.update_button(), UpdateButton::Disabled);

        let automatic = configurator(date, DetectionMode::Automatic, Possible);
        assert_eq!(automatic.update_button(), UpdateButton::Hidden);
    }

    #[test]
    fn next_update_adds_interval() {
        let date = Utc::now();
        let mut c = configurator(date, DetectionMode::Automatic, Possible);
        c.detection_interval = 24;
        assert_eq!(c.next_update_date(), Some(date + Duration::hours(24)));
        c.last_update_date = None;
        assert_eq!(c.next_update_date(), None);
    }

    #[test]
    fn next_update_out_of_range_is_none() {
        let far_future = Utc.with_ymd_and_hms(262000, 1, 1, 0, 0, 0).unwrap();
        let mut c = configurator(far_future, DetectionMode::Automatic, Possible);
        c.detection_interval = u32::MAX;
        assert_eq!(c.next_update_date(), None);
    }

    #[test]
    fn refresh_rerenders_only_on_change() {
        let date = Utc::now();
        let mut refresh = RiskCellRefresh::new();
        let a = configurator(date, DetectionMode::Manual, Possible);
        assert!(refresh.update(a.clone()));
        assert!(!refresh.update(a.clone()));
        let b = configurator(date, DetectionMode::Manual, Waiting);
        assert!(refresh.update(b.clone()));
        assert_eq!(refresh.current(), Some(&b));
    }
}
