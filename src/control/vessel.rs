use log::{debug, info, trace};

use crate::connection::VesselHandle;
use crate::constants::{
    AUTOSTAGE_FUEL_THRESHOLD, DEGENERATE_DIRECTION_EPSILON, EAST_HEADING_DEG, NO_STAGE,
    TURN_HYSTERESIS_DEG,
};
use crate::control::command::CommandSink;
use crate::errors::AutopilotError;
use crate::telemetry_system::source::ReferenceFrame;
use crate::telemetry_system::telemetry::TelemetryFeed;
use crate::utils::vector3d::Vector3D;

/// Control session for a single vessel.
///
/// Owns the telemetry subscriptions and the command handle, and tracks the
/// staging and attitude state the closed-loop policies depend on.
pub struct VesselController {
    name: String,
    feed: TelemetryFeed,
    commands: Box<dyn CommandSink>,
    current_stage: i32,
    last_turn_offset: f64,
}

impl VesselController {
    /// Subscribes to the vessel's telemetry, engages the autopilot pointing
    /// straight up (pitch 90, heading 90) and turns SAS on.
    pub fn new(handle: VesselHandle, stage_count: usize) -> Result<Self, AutopilotError> {
        let VesselHandle {
            name,
            telemetry,
            mut commands,
        } = handle;
        let feed = TelemetryFeed::subscribe(telemetry, stage_count)?;

        commands.engage_autopilot()?;
        commands.target_pitch_and_heading(90.0, EAST_HEADING_DEG)?;
        commands.set_sas(true)?;
        info!("Controlling '{}' with {} tracked stages", name, stage_count);

        Ok(VesselController {
            name,
            feed,
            commands,
            current_stage: NO_STAGE,
            last_turn_offset: 0.0,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn telemetry(&self) -> &TelemetryFeed {
        &self.feed
    }

    /// -1 until the first staging event.
    pub fn current_stage(&self) -> i32 {
        self.current_stage
    }

    pub fn stage_count(&self) -> usize {
        self.feed.stage_count()
    }

    pub fn last_turn_offset(&self) -> f64 {
        self.last_turn_offset
    }

    pub(crate) fn await_update(&mut self) -> Result<(), AutopilotError> {
        self.feed.await_update()
    }

    pub fn throttle(&self) -> Result<f64, AutopilotError> {
        self.commands.throttle()
    }

    /// Commands `throttle` clamped to [0, 1].
    pub fn set_throttle(&mut self, throttle: f64) -> Result<(), AutopilotError> {
        if throttle.is_nan() {
            return Err(AutopilotError::InvalidParameter(
                "throttle must be a number".to_string(),
            ));
        }
        let throttle = throttle.clamp(0.0, 1.0);
        trace!("throttle {:.3}", throttle);
        self.commands.set_throttle(throttle)
    }

    /// Points the vessel `offset` degrees from vertical toward the east.
    ///
    /// Offsets within 0.5 degrees of the last one sent are dropped. Returns
    /// whether a new attitude target went out.
    pub fn turn_east(&mut self, offset: f64) -> Result<bool, AutopilotError> {
        if offset.is_nan() {
            return Err(AutopilotError::InvalidParameter(
                "turn offset must be a number".to_string(),
            ));
        }
        if (offset - self.last_turn_offset).abs() <= TURN_HYSTERESIS_DEG {
            return Ok(false);
        }
        self.commands
            .target_pitch_and_heading(90.0 - offset, EAST_HEADING_DEG)?;
        self.last_turn_offset = offset;
        debug!("Attitude target: {:.2}° from vertical", offset);
        Ok(true)
    }

    /// Activates the next stage. There is no check against running out of
    /// stages; reading propellant afterwards reports the stage as out of range.
    pub fn spacebar(&mut self) -> Result<(), AutopilotError> {
        self.current_stage += 1;
        info!("Staging: stage {} active", self.current_stage);
        self.commands.activate_next_stage()
    }

    /// Stages when the current stage's combined propellant drops below 0.01.
    pub fn check_autostage(&mut self) -> Result<bool, AutopilotError> {
        let fuel = self.stage_fuel()?;
        if fuel < AUTOSTAGE_FUEL_THRESHOLD {
            info!(
                "Stage {} burned out ({:.4} remaining)",
                self.current_stage, fuel
            );
            self.spacebar()?;
            return Ok(true);
        }
        Ok(false)
    }

    pub fn stage_liquid(&self) -> Result<f64, AutopilotError> {
        self.feed.stage_liquid(self.current_stage)
    }

    pub fn stage_solid(&self) -> Result<f64, AutopilotError> {
        self.feed.stage_solid(self.current_stage)
    }

    pub fn stage_fuel(&self) -> Result<f64, AutopilotError> {
        Ok(self.stage_liquid()? + self.stage_solid()?)
    }

    /// Orbital prograde as a navball angle: 0 straight up, 90 horizontal east.
    pub fn orbit_prograde_navball(&self) -> Result<f64, AutopilotError> {
        let frame = ReferenceFrame::Surface;
        navball_angle(self.feed.prograde(frame)?, frame)
    }

    /// Surface-relative prograde as a navball angle.
    pub fn surface_prograde_east_angle(&self) -> Result<f64, AutopilotError> {
        let frame = ReferenceFrame::SurfaceVelocity;
        navball_angle(self.feed.prograde(frame)?, frame)
    }

    /// Where the nose points, as a navball angle.
    pub fn angle_east_navball(&self) -> Result<f64, AutopilotError> {
        Ok(90.0 - self.feed.pitch()?)
    }
}

/// `90 - atan(up / east)` in degrees, from a direction in up/north/east axes.
///
/// A vertical direction (east component within epsilon of zero) maps to 0 when
/// pointing up and 180 when pointing down. A direction with neither an up nor
/// an east component is an error.
///
/// Not continuous near vertical: a direction just west of straight up reads
/// close to 180, not close to 0.
pub fn navball_angle(direction: Vector3D, frame: ReferenceFrame) -> Result<f64, AutopilotError> {
    let (up, east) = (direction.x, direction.z);
    if east.abs() > DEGENERATE_DIRECTION_EPSILON {
        return Ok(90.0 - (up / east).atan().to_degrees());
    }
    if up > DEGENERATE_DIRECTION_EPSILON {
        Ok(0.0)
    } else if up < -DEGENERATE_DIRECTION_EPSILON {
        Ok(180.0)
    } else {
        Err(AutopilotError::DegenerateDirection(frame))
    }
}
