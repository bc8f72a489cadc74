use crate::errors::AutopilotError;

/// Mutator side of the host interface for one vessel.
pub trait CommandSink {
    fn throttle(&self) -> Result<f64, AutopilotError>;

    fn set_throttle(&mut self, throttle: f64) -> Result<(), AutopilotError>;

    fn engage_autopilot(&mut self) -> Result<(), AutopilotError>;

    fn disengage_autopilot(&mut self) -> Result<(), AutopilotError>;

    /// Attitude-hold target, both angles in degrees.
    fn target_pitch_and_heading(&mut self, pitch: f64, heading: f64) -> Result<(), AutopilotError>;

    fn set_sas(&mut self, enabled: bool) -> Result<(), AutopilotError>;

    fn activate_next_stage(&mut self) -> Result<(), AutopilotError>;
}
