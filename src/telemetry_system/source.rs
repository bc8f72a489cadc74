//! Host-side telemetry interface.
//!
//! A host hands out streams: a subscription is registered once with
//! [`TelemetrySource::add_stream`] and then read any number of times. Reads
//! return the most recent sample the host has published.

use strum::{Display, EnumIter, EnumString};

use crate::errors::AutopilotError;
use crate::utils::vector3d::Vector3D;

/// Scalar telemetry published by the host.
///
/// The serialized names are the short names used on the command line and by
/// [`TelemetryFeed::get_named`](super::telemetry::TelemetryFeed::get_named).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
pub enum TelemetryField {
    #[strum(serialize = "ut")]
    MissionTime,
    #[strum(serialize = "alt")]
    Altitude,
    #[strum(serialize = "speed")]
    Speed,
    #[strum(serialize = "vspeed")]
    VerticalSpeed,
    #[strum(serialize = "hspeed")]
    HorizontalSpeed,
    #[strum(serialize = "termv")]
    TerminalVelocity,
    #[strum(serialize = "apo")]
    Apoapsis,
    #[strum(serialize = "apo_time")]
    TimeToApoapsis,
    #[strum(serialize = "peri")]
    Periapsis,
    #[strum(serialize = "peri_time")]
    TimeToPeriapsis,
    #[strum(serialize = "ecc")]
    Eccentricity,
    #[strum(serialize = "heading")]
    Heading,
    #[strum(serialize = "pitch")]
    Pitch,
}

/// Frames the prograde direction can be read in.
///
/// | Frame | Axes | Prograde of |
/// |---|---|---|
/// | `Vessel` | x right, y nose, z belly | orbital velocity |
/// | `Orbital` | x radial out, y orbit normal, z along-track | orbital velocity |
/// | `Surface` | x up, y north, z east | orbital velocity |
/// | `OrbitalBody` | x, y equatorial (non-rotating), z polar | orbital velocity |
/// | `SurfaceVelocity` | x up, y north, z east | surface-relative velocity |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ReferenceFrame {
    Vessel,
    Orbital,
    Surface,
    OrbitalBody,
    SurfaceVelocity,
}

/// Propellant resources tracked per decouple stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
pub enum Resource {
    LiquidFuel,
    SolidFuel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subscription {
    Scalar(TelemetryField),
    Prograde(ReferenceFrame),
    StageResource { decouple_stage: usize, resource: Resource },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StreamValue {
    Scalar(f64),
    Vector(Vector3D),
}

impl StreamValue {
    pub fn as_scalar(self) -> Result<f64, AutopilotError> {
        match self {
            StreamValue::Scalar(value) => Ok(value),
            StreamValue::Vector(v) => Err(AutopilotError::Host(format!(
                "expected a scalar sample, got vector {}",
                v
            ))),
        }
    }

    pub fn as_vector(self) -> Result<Vector3D, AutopilotError> {
        match self {
            StreamValue::Vector(v) => Ok(v),
            StreamValue::Scalar(value) => Err(AutopilotError::Host(format!(
                "expected a vector sample, got scalar {}",
                value
            ))),
        }
    }
}

pub trait TelemetrySource {
    fn add_stream(&mut self, subscription: Subscription) -> Result<StreamId, AutopilotError>;

    fn read(&self, stream: StreamId) -> Result<StreamValue, AutopilotError>;

    /// Blocks until the host has published a new sample.
    fn await_update(&mut self) -> Result<(), AutopilotError>;
}
