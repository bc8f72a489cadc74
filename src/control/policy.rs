//! Closed-loop control laws, one value object per law.
//!
//! Each policy keeps the parameters it was built with and is applied once per
//! control tick by the phase runner. The arithmetic of every law is exposed as
//! a plain method so it can be checked without a vessel.

use log::trace;

use crate::constants::PROGRADE_NUDGE_DEG;
use crate::control::vessel::VesselController;
use crate::errors::AutopilotError;

pub trait TurnPolicy {
    fn apply(&mut self, vessel: &mut VesselController) -> Result<(), AutopilotError>;
}

pub trait ThrottlePolicy {
    fn apply(&mut self, vessel: &mut VesselController) -> Result<(), AutopilotError>;
}

fn altitude_ratio(altitude: f64, init_alt: f64, final_alt: f64) -> f64 {
    (altitude - init_alt) / (final_alt - init_alt)
}

fn require_climb(init_alt: f64, final_alt: f64, what: &str) -> Result<(), AutopilotError> {
    if final_alt - init_alt <= 0.0 {
        return Err(AutopilotError::InvalidParameter(format!(
            "{} altitude {:.1} m must be above the starting altitude {:.1} m",
            what, final_alt, init_alt
        )));
    }
    Ok(())
}

/// Holds a fixed offset from vertical.
#[derive(Debug, Clone)]
pub struct StaticAngle {
    pub offset: f64,
}

impl StaticAngle {
    pub fn new(offset: f64) -> Self {
        StaticAngle { offset }
    }
}

impl TurnPolicy for StaticAngle {
    fn apply(&mut self, vessel: &mut VesselController) -> Result<(), AutopilotError> {
        vessel.turn_east(self.offset)?;
        Ok(())
    }
}

/// Points half a degree off orbital prograde, toward a target navball angle.
#[derive(Debug, Clone)]
pub struct StaticOrbitPrograde {
    pub target: f64,
}

impl StaticOrbitPrograde {
    pub fn new(target: f64) -> Self {
        StaticOrbitPrograde { target }
    }

    pub fn next_offset(&self, prograde_angle: f64) -> f64 {
        let offset = if prograde_angle < self.target {
            prograde_angle + PROGRADE_NUDGE_DEG
        } else {
            prograde_angle - PROGRADE_NUDGE_DEG
        };
        offset.clamp(0.0, 90.0)
    }
}

impl TurnPolicy for StaticOrbitPrograde {
    fn apply(&mut self, vessel: &mut VesselController) -> Result<(), AutopilotError> {
        let prograde = vessel.orbit_prograde_navball()?;
        vessel.turn_east(self.next_offset(prograde))?;
        Ok(())
    }
}

/// Pitch offset grows linearly with altitude, from 0 at `init_alt` to
/// `turn_max` at `alt_max`.
#[derive(Debug, Clone)]
pub struct GradualTurn {
    init_alt: f64,
    alt_max: f64,
    turn_max: f64,
}

impl GradualTurn {
    pub fn new(init_alt: f64, alt_max: f64, turn_max: f64) -> Result<Self, AutopilotError> {
        require_climb(init_alt, alt_max, "Turn end")?;
        Ok(GradualTurn {
            init_alt,
            alt_max,
            turn_max,
        })
    }

    /// Starts the turn from the vessel's current altitude.
    pub fn from_vessel(
        vessel: &VesselController,
        alt_max: f64,
        turn_max: f64,
    ) -> Result<Self, AutopilotError> {
        Self::new(vessel.telemetry().altitude()?, alt_max, turn_max)
    }

    pub fn offset_at(&self, altitude: f64) -> f64 {
        self.turn_max * altitude_ratio(altitude, self.init_alt, self.alt_max)
    }
}

impl TurnPolicy for GradualTurn {
    fn apply(&mut self, vessel: &mut VesselController) -> Result<(), AutopilotError> {
        let altitude = vessel.telemetry().altitude()?;
        vessel.turn_east(self.offset_at(altitude))?;
        Ok(())
    }
}

/// Same altitude schedule as [`GradualTurn`], but the schedule sets where
/// surface prograde should be. The nose is nudged by `delta` per tick until
/// prograde matches.
#[derive(Debug, Clone)]
pub struct ProgradeSeekingTurn {
    schedule: GradualTurn,
    delta: f64,
}

impl ProgradeSeekingTurn {
    pub fn new(
        init_alt: f64,
        alt_max: f64,
        turn_max: f64,
        delta: f64,
    ) -> Result<Self, AutopilotError> {
        Ok(ProgradeSeekingTurn {
            schedule: GradualTurn::new(init_alt, alt_max, turn_max)?,
            delta,
        })
    }

    pub fn from_vessel(
        vessel: &VesselController,
        alt_max: f64,
        turn_max: f64,
        delta: f64,
    ) -> Result<Self, AutopilotError> {
        Self::new(vessel.telemetry().altitude()?, alt_max, turn_max, delta)
    }

    pub fn desired_prograde(&self, altitude: f64) -> f64 {
        self.schedule.offset_at(altitude)
    }

    pub fn next_offset(&self, altitude: f64, prograde_angle: f64, pointing: f64) -> f64 {
        let step = if prograde_angle < self.desired_prograde(altitude) {
            self.delta
        } else {
            -self.delta
        };
        (pointing + step).clamp(0.0, 90.0)
    }
}

impl TurnPolicy for ProgradeSeekingTurn {
    fn apply(&mut self, vessel: &mut VesselController) -> Result<(), AutopilotError> {
        let altitude = vessel.telemetry().altitude()?;
        let prograde = vessel.surface_prograde_east_angle()?;
        let pointing = vessel.angle_east_navball()?;
        let offset = self.next_offset(altitude, prograde, pointing);
        trace!(
            "prograde {:.2}° desired {:.2}° pointing {:.2}° -> {:.2}°",
            prograde,
            self.desired_prograde(altitude),
            pointing,
            offset
        );
        vessel.turn_east(offset)?;
        Ok(())
    }
}

/// Multiplicative throttle that converges on terminal velocity.
#[derive(Debug, Clone)]
pub struct TerminalVelocityThrottle {
    pub accel: f64,
    pub decel: f64,
    pub min_throttle: f64,
    pub autostage: bool,
}

impl TerminalVelocityThrottle {
    pub fn new(accel: f64, decel: f64, min_throttle: f64, autostage: bool) -> Self {
        TerminalVelocityThrottle {
            accel,
            decel,
            min_throttle,
            autostage,
        }
    }

    /// Unclamped; the controller clamps to [0, 1] when commanding.
    pub fn next_throttle(&self, throttle: f64, speed: f64, terminal_velocity: f64) -> f64 {
        if speed < terminal_velocity {
            throttle * self.accel
        } else {
            (throttle * self.decel).max(self.min_throttle)
        }
    }
}

impl ThrottlePolicy for TerminalVelocityThrottle {
    fn apply(&mut self, vessel: &mut VesselController) -> Result<(), AutopilotError> {
        if self.autostage {
            vessel.check_autostage()?;
        }
        let speed = vessel.telemetry().speed()?;
        let terminal_velocity = vessel.telemetry().terminal_velocity()?;
        let throttle = self.next_throttle(vessel.throttle()?, speed, terminal_velocity);
        vessel.set_throttle(throttle)
    }
}

/// Lead kept between the vessel's altitude and its apoapsis.
#[derive(Debug, Clone, PartialEq)]
pub enum LeadDistance {
    Static(f64),
    /// Shrinks from `max_dist` at the starting altitude to `min_dist` at
    /// `final_alt`.
    Linear {
        max_dist: f64,
        min_dist: f64,
        final_alt: f64,
    },
}

/// Bang-bang throttle that keeps apoapsis a lead distance above the vessel.
#[derive(Debug, Clone)]
pub struct FollowApoapsis {
    init_alt: f64,
    lead: LeadDistance,
    autostage: bool,
}

impl FollowApoapsis {
    /// `static_dist` selects a fixed lead; otherwise the lead shrinks linearly
    /// and reaches `min_dist` at `apo_target - min_dist`.
    pub fn new(
        init_alt: f64,
        max_dist: f64,
        min_dist: f64,
        static_dist: Option<f64>,
        apo_target: f64,
        autostage: bool,
    ) -> Result<Self, AutopilotError> {
        let lead = match static_dist {
            Some(dist) => LeadDistance::Static(dist),
            None => {
                let final_alt = apo_target - min_dist;
                require_climb(init_alt, final_alt, "Apoapsis lead end")?;
                LeadDistance::Linear {
                    max_dist,
                    min_dist,
                    final_alt,
                }
            }
        };
        Ok(FollowApoapsis {
            init_alt,
            lead,
            autostage,
        })
    }

    pub fn lead(&self) -> &LeadDistance {
        &self.lead
    }

    pub fn lead_distance(&self, altitude: f64) -> f64 {
        match self.lead {
            LeadDistance::Static(dist) => dist,
            LeadDistance::Linear {
                max_dist,
                min_dist,
                final_alt,
            } => {
                let ratio = altitude_ratio(altitude, self.init_alt, final_alt);
                max_dist - (max_dist - min_dist) * ratio
            }
        }
    }

    pub fn throttle_for(&self, altitude: f64, apoapsis: f64) -> f64 {
        if altitude + self.lead_distance(altitude) > apoapsis {
            1.0
        } else {
            0.0
        }
    }
}

impl ThrottlePolicy for FollowApoapsis {
    fn apply(&mut self, vessel: &mut VesselController) -> Result<(), AutopilotError> {
        if self.autostage {
            vessel.check_autostage()?;
        }
        let apoapsis = vessel.telemetry().apoapsis()?;
        let altitude = vessel.telemetry().altitude()?;
        vessel.set_throttle(self.throttle_for(altitude, apoapsis))
    }
}

/// Full throttle once apoapsis is at most `seconds_behind` seconds away.
#[derive(Debug, Clone)]
pub struct ThrustOnApoapsis {
    pub seconds_behind: f64,
    pub autostage: bool,
}

impl ThrustOnApoapsis {
    pub fn new(seconds_behind: f64, autostage: bool) -> Self {
        ThrustOnApoapsis {
            seconds_behind,
            autostage,
        }
    }

    pub fn throttle_for(&self, time_to_apoapsis: f64) -> f64 {
        if time_to_apoapsis > self.seconds_behind {
            0.0
        } else {
            1.0
        }
    }
}

impl ThrottlePolicy for ThrustOnApoapsis {
    fn apply(&mut self, vessel: &mut VesselController) -> Result<(), AutopilotError> {
        if self.autostage {
            vessel.check_autostage()?;
        }
        let time_to_apoapsis = vessel.telemetry().time_to_apoapsis()?;
        vessel.set_throttle(self.throttle_for(time_to_apoapsis))
    }
}
