//! One exposure detection attempt: fetch remote key metadata, hand diagnosis keys to the
//! platform, collect exposure windows and run the risk calculation.

mod failure;
mod transaction;

pub use failure::{messages, FailureReason, PlatformErrorCode, SummaryCategory, SummaryCause};
pub use transaction::{DaysAndHours, DetectionDelegate, DetectionError, ExposureDetection};
