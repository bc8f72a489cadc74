use thiserror::Error;

use crate::telemetry_system::source::ReferenceFrame;

#[derive(Debug, Error)]
pub enum AutopilotError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Host error: {0}")]
    Host(String),

    #[error("Unknown telemetry field: {0}")]
    UnknownTelemetryField(String),

    #[error("Unknown telemetry stream: {0}")]
    UnknownStream(usize),

    #[error("Stage index {stage} out of range for {stage_count} tracked stages")]
    StageOutOfRange { stage: i32, stage_count: usize },

    #[error("Prograde vector in {0} frame has no direction")]
    DegenerateDirection(ReferenceFrame),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Phase '{phase}' exceeded its budget of {ticks} ticks")]
    PhaseBudgetExceeded { phase: String, ticks: u64 },
}
