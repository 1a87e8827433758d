//! exposure-risk — on-device exposure window risk evaluation.
//!
//! Modular structure:
//! - [`exposure`] — Exposure window model and fixture decoding
//! - [`risk`] — Configurable per-day and overall risk aggregation
//! - [`detection`] — Detection attempt orchestration and failure reasons
//! - [`home`] — Home screen risk cell identity
//! - [`logging`] — Structured JSON logging

pub mod config;
pub mod detection;
pub mod exposure;
pub mod home;
pub mod logging;
pub mod risk;

pub use config::AgentConfig;
pub use detection::{DetectionDelegate, ExposureDetection, FailureReason};
pub use exposure::{decode_windows, ExposureWindow, ExposureWindowRecord};
pub use home::RiskCellConfigurator;
pub use logging::StructuredLogger;
pub use risk::{RiskEngine, RiskLevel, RiskState};
