//! Reasons an exposure detection attempt ends without a usable result, and the
//! user-facing message each one maps to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Built-in English message texts.
pub mod messages {
    pub const ERROR_ALERT: &str = "An error occurred during exposure logging.";
    pub const FULL_DISK_SPACE: &str =
        "Your device does not have enough free storage. Please free up storage to continue with the risk identification.";
    pub const WRONG_DEVICE_TIME: &str =
        "The date and/or time set on your device does not match the current date and time. Please set the correct date and time so that your risk status can be determined.";
    pub const EN_UNSUPPORTED: &str =
        "Exposure logging is not supported on this device. Please update the operating system.";
    pub const EN_INTERNAL: &str =
        "The exposure notification framework reported an internal error. Please try again later.";
    pub const EN_RATE_LIMITED: &str =
        "Exposure checks are limited by the operating system. Please check again later.";
}

/// Error codes reported by the platform exposure notification framework.
///
/// Serialized as the raw code. Equality, hashing and [`PlatformErrorCode::category`]
/// go through [`PlatformErrorCode::raw`], so `Other(13)` behaves as `RateLimited`.
/// Build values with [`PlatformErrorCode::from_raw`]; `Other` is meant for codes
/// outside 1–17.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum PlatformErrorCode {
    Unknown,
    BadParameter,
    NotEntitled,
    NotAuthorized,
    Unsupported,
    Invalidated,
    BluetoothOff,
    InsufficientStorage,
    NotEnabled,
    ApiMisuse,
    Internal,
    InsufficientMemory,
    RateLimited,
    Restricted,
    BadFormat,
    DataInaccessible,
    TravelStatusNotAvailable,
    Other(u32),
}

impl PlatformErrorCode {
    pub fn from_raw(code: u32) -> Self {
        match code {
            1 => Self::Unknown,
            2 => Self::BadParameter,
            3 => Self::NotEntitled,
            4 => Self::NotAuthorized,
            5 => Self::Unsupported,
            6 => Self::Invalidated,
            7 => Self::BluetoothOff,
            8 => Self::InsufficientStorage,
            9 => Self::NotEnabled,
            10 => Self::ApiMisuse,
            11 => Self::Internal,
            12 => Self::InsufficientMemory,
            13 => Self::RateLimited,
            14 => Self::Restricted,
            15 => Self::BadFormat,
            16 => Self::DataInaccessible,
            17 => Self::TravelStatusNotAvailable,
            other => Self::Other(other),
        }
    }

    pub fn raw(self) -> u32 {
        match self {
            Self::Unknown => 1,
            Self::BadParameter => 2,
            Self::NotEntitled => 3,
            Self::NotAuthorized => 4,
            Self::Unsupported => 5,
            Self::Invalidated => 6,
            Self::BluetoothOff => 7,
            Self::InsufficientStorage => 8,
            Self::NotEnabled => 9,
            Self::ApiMisuse => 10,
            Self::Internal => 11,
            Self::InsufficientMemory => 12,
            Self::RateLimited => 13,
            Self::Restricted => 14,
            Self::BadFormat => 15,
            Self::DataInaccessible => 16,
            Self::TravelStatusNotAvailable => 17,
            Self::Other(code) => code,
        }
    }

    pub fn category(self) -> SummaryCategory {
        match Self::from_raw(self.raw()) {
            Self::Unsupported => SummaryCategory::Unsupported,
            Self::Internal => SummaryCategory::Internal,
            Self::RateLimited => SummaryCategory::RateLimited,
            _ => SummaryCategory::Generic,
        }
    }
}

impl From<u32> for PlatformErrorCode {
    fn from(code: u32) -> Self {
        Self::from_raw(code)
    }
}

impl From<PlatformErrorCode> for u32 {
    fn from(code: PlatformErrorCode) -> Self {
        code.raw()
    }
}

impl PartialEq for PlatformErrorCode {
    fn eq(&self, other: &Self) -> bool {
        self.raw() == other.raw()
    }
}

impl Eq for PlatformErrorCode {}

impl Hash for PlatformErrorCode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw().hash(state);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryCategory {
    Unsupported,
    Internal,
    RateLimited,
    Generic,
}

/// What went wrong while obtaining the exposure summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryCause {
    /// Detection finished without summary and without error
    None,
    /// Another detection was still in progress
    AlreadyRunning,
    Platform(PlatformErrorCode),
}

impl SummaryCause {
    pub fn platform(raw_code: u32) -> Self {
        SummaryCause::Platform(PlatformErrorCode::from_raw(raw_code))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// No exposure manager could be provided to the transaction
    NoExposureManager,
    /// Summary detection ran but produced an error or no summary
    NoSummary(SummaryCause),
    /// The remote days and hours available for download could not be determined
    NoDaysAndHours,
    NoExposureConfiguration,
    UnableToWriteDiagnosisKeys,
    NoSupportedCountries,
    /// Key packages could not be stored for lack of disk space
    NoDiskSpace,
    /// Device clock is off; no risk calculation is possible
    WrongDeviceTime,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for FailureReason {}

fn coded(code: &str) -> String {
    format!("{} Code: {}", messages::ERROR_ALERT, code)
}

impl FailureReason {
    pub fn message(&self) -> String {
        match self {
            FailureReason::NoExposureManager => coded("NoExposureManager"),
            FailureReason::UnableToWriteDiagnosisKeys => coded("DignosisKeys"),
            FailureReason::NoSummary(cause) => match cause {
                SummaryCause::Platform(code) => match code.category() {
                    SummaryCategory::Unsupported => messages::EN_UNSUPPORTED.to_string(),
                    SummaryCategory::Internal => messages::EN_INTERNAL.to_string(),
                    SummaryCategory::RateLimited => messages::EN_RATE_LIMITED.to_string(),
                    SummaryCategory::Generic => {
                        format!("{} EN Code: {}", messages::ERROR_ALERT, code.raw())
                    }
                },
                SummaryCause::AlreadyRunning => coded("ExposureDetectionIsAlreadyRunning"),
                SummaryCause::None => coded("NoSummary"),
            },
            FailureReason::NoDaysAndHours => coded("NoDaysAndHours"),
            FailureReason::NoExposureConfiguration => coded("NoExposureConfiguration"),
            FailureReason::NoSupportedCountries => coded("NoSupportedCountries"),
            FailureReason::NoDiskSpace => messages::FULL_DISK_SPACE.to_string(),
            FailureReason::WrongDeviceTime => messages::WRONG_DEVICE_TIME.to_string(),
        }
    }

    /// Whether a later automatic attempt may succeed without user action.
    pub fn is_retryable(&self) -> bool {
        match self {
            FailureReason::NoDiskSpace | FailureReason::WrongDeviceTime => false,
            FailureReason::NoSummary(SummaryCause::AlreadyRunning) => false,
            FailureReason::NoSummary(SummaryCause::Platform(code)) => {
                code.category() != SummaryCategory::Unsupported
            }
            _ => true,
        }
    }

    /// Stable snake_case tag for structured logs.
    pub fn code(&self) -> &'static str {
        match self {
            FailureReason::NoExposureManager => "no_exposure_manager",
            FailureReason::NoSummary(_) => "no_summary",
            FailureReason::NoDaysAndHours => "no_days_and_hours",
            FailureReason::NoExposureConfiguration => "no_exposure_configuration",
            FailureReason::UnableToWriteDiagnosisKeys => "unable_to_write_diagnosis_keys",
            FailureReason::NoSupportedCountries => "no_supported_countries",
            FailureReason::NoDiskSpace => "no_disk_space",
            FailureReason::WrongDeviceTime => "wrong_device_time",
        }
    }
}
