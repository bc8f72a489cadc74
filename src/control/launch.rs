//! The four-phase ascent sequence.

use log::info;
use strum::Display;

use crate::config::LaunchParameters;
use crate::control::behavior::{Behavior, PhaseOutcome, TerminationCondition};
use crate::control::policy::{
    FollowApoapsis, ProgradeSeekingTurn, StaticAngle, StaticOrbitPrograde,
    TerminalVelocityThrottle, ThrustOnApoapsis,
};
use crate::control::vessel::VesselController;
use crate::errors::AutopilotError;
use crate::telemetry_system::source::TelemetryField;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum LaunchPhase {
    #[strum(serialize = "vertical ascent")]
    VerticalAscent,
    #[strum(serialize = "gravity turn")]
    GravityTurn,
    #[strum(serialize = "apoapsis approach")]
    ApoapsisApproach,
    #[strum(serialize = "circularization")]
    Circularization,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LaunchReport {
    pub phases: Vec<(LaunchPhase, PhaseOutcome)>,
    pub apoapsis: f64,
    pub periapsis: f64,
    pub final_stage: i32,
}

impl LaunchReport {
    pub fn total_ticks(&self) -> u64 {
        self.phases.iter().map(|(_, outcome)| outcome.ticks).sum()
    }

    pub fn outcome(&self, phase: LaunchPhase) -> Option<&PhaseOutcome> {
        self.phases
            .iter()
            .find(|(p, _)| *p == phase)
            .map(|(_, outcome)| outcome)
    }
}

impl VesselController {
    /// Flies from the pad to orbit.
    ///
    /// 1. Full throttle, stage, hold `initial_turn_offset` until vertical speed
    ///    exceeds `init_speed_max`.
    /// 2. Prograde-seeking gravity turn under terminal-velocity throttle until
    ///    altitude exceeds `alt_max`.
    /// 3. Track orbital prograde toward the horizon while keeping apoapsis a
    ///    lead ahead, until apoapsis exceeds `apo_max`.
    /// 4. Hold horizontal and burn near apoapsis until periapsis passes the
    ///    apoapsis captured when the phase began.
    ///
    /// The throttle is cut whenever the sequence stops, including on error.
    pub fn launch(&mut self, params: &LaunchParameters) -> Result<LaunchReport, AutopilotError> {
        params.validate()?;
        let mut phases = Vec::with_capacity(4);

        let flown = self.ascend(params, &mut phases);
        let cut = self.set_throttle(0.0);
        flown?;
        cut?;

        let report = LaunchReport {
            phases,
            apoapsis: self.telemetry().apoapsis()?,
            periapsis: self.telemetry().periapsis()?,
            final_stage: self.current_stage(),
        };
        info!(
            "Orbiting! {:.0} x {:.0} m after {} ticks",
            report.apoapsis,
            report.periapsis,
            report.total_ticks()
        );
        Ok(report)
    }

    fn ascend(
        &mut self,
        params: &LaunchParameters,
        phases: &mut Vec<(LaunchPhase, PhaseOutcome)>,
    ) -> Result<(), AutopilotError> {
        self.set_throttle(1.0)?;
        self.spacebar()?;

        info!("Full throttle until {:.0} m/s", params.init_speed_max);
        let outcome = phase(LaunchPhase::VerticalAscent, params)
            .turn(StaticAngle::new(params.initial_turn_offset))
            .until(TerminationCondition::above(
                TelemetryField::VerticalSpeed,
                params.init_speed_max,
            ))
            .run(self)?;
        phases.push((LaunchPhase::VerticalAscent, outcome));

        info!("Gravity turn with terminal velocity maintenance");
        let turn = ProgradeSeekingTurn::from_vessel(
            self,
            params.alt_max,
            params.turn_max,
            params.turn_delta,
        )?;
        let throttle = TerminalVelocityThrottle::new(
            params.termv_accel,
            params.termv_decel,
            params.termv_min_throttle,
            params.autostage,
        );
        let outcome = phase(LaunchPhase::GravityTurn, params)
            .turn(turn)
            .throttle(throttle)
            .until(TerminationCondition::above(
                TelemetryField::Altitude,
                params.alt_max,
            ))
            .run(self)?;
        phases.push((LaunchPhase::GravityTurn, outcome));

        info!("Follow apoapsis to {:.0} m", params.apo_max);
        let throttle = FollowApoapsis::new(
            self.telemetry().altitude()?,
            params.follow_apo_max_dist,
            params.follow_apo_min_dist,
            params.follow_apo_dist,
            params.apo_max,
            params.autostage,
        )?;
        let outcome = phase(LaunchPhase::ApoapsisApproach, params)
            .turn(StaticOrbitPrograde::new(90.0))
            .throttle(throttle)
            .until(TerminationCondition::above(
                TelemetryField::Apoapsis,
                params.apo_max,
            ))
            .run(self)?;
        phases.push((LaunchPhase::ApoapsisApproach, outcome));

        let target_periapsis = self.telemetry().apoapsis()?;
        info!("Circularize at {:.0} m", target_periapsis);
        let outcome = phase(LaunchPhase::Circularization, params)
            .turn(StaticAngle::new(90.0))
            .throttle(ThrustOnApoapsis::new(
                params.circularize_seconds,
                params.autostage,
            ))
            .until(TerminationCondition::above(
                TelemetryField::Periapsis,
                target_periapsis,
            ))
            .run(self)?;
        phases.push((LaunchPhase::Circularization, outcome));
        Ok(())
    }
}

fn phase(phase: LaunchPhase, params: &LaunchParameters) -> Behavior {
    Behavior::new(&phase.to_string()).max_ticks(params.max_phase_ticks)
}
