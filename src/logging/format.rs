//! JSON log lines: one JSON object per line (ndjson) for detection outcomes.

use crate::detection::DetectionError;
use crate::risk::RiskCalculationResult;
use serde::Serialize;
use std::io::Write;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Serialize)]
pub struct DetectionLogEvent<'a> {
    pub ts: String,
    pub detection_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_with_high_risk: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_recent_date_with_high_risk: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<'a> DetectionLogEvent<'a> {
    pub fn from_outcome(
        detection_id: impl ToString,
        outcome: &'a Result<RiskCalculationResult, DetectionError>,
    ) -> Self {
        let mut event = DetectionLogEvent {
            ts: chrono::Utc::now().to_rfc3339(),
            detection_id: detection_id.to_string(),
            risk_level: None,
            days_with_high_risk: None,
            most_recent_date_with_high_risk: None,
            failure: None,
            retryable: None,
            error: None,
        };
        match outcome {
            Ok(r) => {
                event.risk_level = Some(match r.risk_level {
                    crate::risk::RiskLevel::Low => "low",
                    crate::risk::RiskLevel::High => "high",
                });
                event.days_with_high_risk = Some(r.number_of_days_with_high_risk);
                event.most_recent_date_with_high_risk =
                    r.most_recent_date_with_high_risk.map(|d| d.to_string());
            }
            Err(e) => {
                if let Some(reason) = e.failure_reason() {
                    event.failure = Some(reason.code());
                    event.retryable = Some(reason.is_retryable());
                }
                event.error = Some(e.to_string());
            }
        }
        event
    }
}

/// Initialize tracing with JSON format (one JSON object per line)
pub struct StructuredLogger;

impl StructuredLogger {
    /// Install global subscriber: JSON lines to stdout, level from RUST_LOG or default.
    pub fn init(json: bool, default_level: &str) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        if json {
            let fmt = tracing_subscriber::fmt::layer()
                .json()
                .with_span_events(FmtSpan::NONE)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt)
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    /// Emit a single structured line without going through tracing
    pub fn emit_json(event: &impl Serialize, w: &mut impl Write) {
        if let Ok(line) = serde_json::to_string(event) {
            let _ = writeln!(w, "{}", line);
        }
    }
}
