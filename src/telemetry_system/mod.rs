pub mod source;
pub mod telemetry;
