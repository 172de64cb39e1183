use crate::models::pixel::SourceOrigin;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Successful outcome of one decode attempt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanReport {
    pub value: String,
    pub origin: SourceOrigin,
    pub elapsed_ms: u64,
    pub scanned_at: DateTime<Utc>,
}

/// Outcome of the generate-then-scan self-test
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelfTestReport {
    pub generated: String,
    pub recognized: String,
    pub matched: bool,
    pub elapsed_ms: u64,
}

impl SelfTestReport {
    pub fn new(generated: String, report: ScanReport) -> Self {
        let matched = generated == report.value;
        Self {
            generated,
            recognized: report.value,
            matched,
            elapsed_ms: report.elapsed_ms,
        }
    }
}

/// How a capture loop ended without an error
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CaptureOutcome {
    Decoded { report: ScanReport, attempts: u32 },
    Cancelled { attempts: u32 },
}

impl CaptureOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Decoded { attempts, .. } | Self::Cancelled { attempts } => *attempts,
        }
    }

    pub fn report(&self) -> Option<&ScanReport> {
        match self {
            Self::Decoded { report, .. } => Some(report),
            Self::Cancelled { .. } => None,
        }
    }
}
