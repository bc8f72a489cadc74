use crate::control::command::CommandSink;
use crate::errors::AutopilotError;
use crate::telemetry_system::source::TelemetrySource;

/// Telemetry and command handles for one vessel on the host.
pub struct VesselHandle {
    pub name: String,
    pub telemetry: Box<dyn TelemetrySource>,
    pub commands: Box<dyn CommandSink>,
}

/// An open session with a simulation host.
pub trait Connection {
    fn active_vessel(&mut self) -> Result<VesselHandle, AutopilotError>;
}
