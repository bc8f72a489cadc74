pub mod config;
pub mod connection;
pub mod constants;
pub mod control;
pub mod errors;
pub mod simulation;
pub mod telemetry_system;
pub mod utils;

#[cfg(test)]
mod testing;

pub use config::LaunchParameters;
pub use connection::{Connection, VesselHandle};
pub use errors::AutopilotError;

// Re-export commonly used items from control
pub use control::behavior::{Behavior, PhaseOutcome, TerminationCondition};
pub use control::command::CommandSink;
pub use control::launch::{LaunchPhase, LaunchReport};
pub use control::policy::{
    FollowApoapsis, GradualTurn, LeadDistance, ProgradeSeekingTurn, StaticAngle,
    StaticOrbitPrograde, TerminalVelocityThrottle, ThrottlePolicy, ThrustOnApoapsis, TurnPolicy,
};
pub use control::vessel::{navball_angle, VesselController};

// Re-export commonly used items from simulation
pub use simulation::host::{SimulatedHost, TelemetryNoise};
pub use simulation::vehicle::{StageDesign, VesselDesign, VesselFactory};

// Re-export commonly used items from telemetry_system
pub use telemetry_system::source::{
    ReferenceFrame, Resource, StreamId, StreamValue, Subscription, TelemetryField, TelemetrySource,
};
pub use telemetry_system::telemetry::TelemetryFeed;

// Re-export commonly used utilities
pub use utils::vector2d::Vector2D;
pub use utils::vector3d::Vector3D;
