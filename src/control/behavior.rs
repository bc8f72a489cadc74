//! Generic phase runner.
//!
//! A phase applies an optional turn policy and an optional throttle policy
//! every tick, then checks its termination conditions. The loop has no exit
//! other than a tripped condition or, when one is set, the tick budget.

use log::{debug, info, warn};

use crate::control::policy::{ThrottlePolicy, TurnPolicy};
use crate::control::vessel::VesselController;
use crate::errors::AutopilotError;
use crate::telemetry_system::source::TelemetryField;

pub type ValueFn = Box<dyn Fn(&VesselController) -> Result<f64, AutopilotError>>;

/// Ends a phase when `value` leaves `[lower, upper]`. A missing bound is
/// unbounded on that side.
pub struct TerminationCondition {
    name: String,
    value: ValueFn,
    lower: Option<f64>,
    upper: Option<f64>,
}

impl TerminationCondition {
    pub fn new(
        name: &str,
        value: impl Fn(&VesselController) -> Result<f64, AutopilotError> + 'static,
        lower: Option<f64>,
        upper: Option<f64>,
    ) -> Self {
        TerminationCondition {
            name: name.to_string(),
            value: Box::new(value),
            lower,
            upper,
        }
    }

    pub fn field(field: TelemetryField, lower: Option<f64>, upper: Option<f64>) -> Self {
        Self::new(
            &field.to_string(),
            move |vessel| vessel.telemetry().get(field),
            lower,
            upper,
        )
    }

    /// Trips once `field` rises above `upper`.
    pub fn above(field: TelemetryField, upper: f64) -> Self {
        Self::field(field, None, Some(upper))
    }

    /// Trips once `field` drops below `lower`.
    pub fn below(field: TelemetryField, lower: f64) -> Self {
        Self::field(field, Some(lower), None)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_exceeded_by(&self, value: f64) -> bool {
        self.lower.map_or(false, |lower| value < lower)
            || self.upper.map_or(false, |upper| value > upper)
    }

    fn check(&self, vessel: &VesselController) -> Result<Option<f64>, AutopilotError> {
        let value = (self.value)(vessel)?;
        Ok(self.is_exceeded_by(value).then_some(value))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhaseOutcome {
    pub phase: String,
    pub condition: String,
    pub value: f64,
    pub ticks: u64,
}

/// Runs the control loop until a condition trips.
///
/// Each tick waits for a fresh sample, applies `turn` then `throttle`, then
/// checks `conditions` in declaration order; the first one exceeded ends the
/// phase. With `max_ticks` set the phase fails once that many ticks have run
/// without a condition tripping.
pub fn run_phase(
    vessel: &mut VesselController,
    phase: &str,
    mut turn: Option<&mut (dyn TurnPolicy + '_)>,
    mut throttle: Option<&mut (dyn ThrottlePolicy + '_)>,
    conditions: &[TerminationCondition],
    max_ticks: Option<u64>,
) -> Result<PhaseOutcome, AutopilotError> {
    if conditions.is_empty() && max_ticks.is_none() {
        warn!(
            "Phase '{}' has no termination condition and will not end",
            phase
        );
    }

    let mut ticks: u64 = 0;
    loop {
        if let Some(max_ticks) = max_ticks {
            if ticks >= max_ticks {
                return Err(AutopilotError::PhaseBudgetExceeded {
                    phase: phase.to_string(),
                    ticks,
                });
            }
        }

        vessel.await_update()?;
        ticks += 1;

        if let Some(turn) = &mut turn {
            turn.apply(vessel)?;
        }
        if let Some(throttle) = &mut throttle {
            throttle.apply(vessel)?;
        }

        for condition in conditions {
            if let Some(value) = condition.check(vessel)? {
                info!(
                    "Phase '{}' complete after {} ticks: {} = {:.2}",
                    phase, ticks, condition.name, value
                );
                return Ok(PhaseOutcome {
                    phase: phase.to_string(),
                    condition: condition.name.clone(),
                    value,
                    ticks,
                });
            }
        }
    }
}

/// A named phase: its policies, its exit conditions and an optional budget.
pub struct Behavior {
    name: String,
    turn: Option<Box<dyn TurnPolicy>>,
    throttle: Option<Box<dyn ThrottlePolicy>>,
    conditions: Vec<TerminationCondition>,
    max_ticks: Option<u64>,
}

impl Behavior {
    pub fn new(name: &str) -> Self {
        Behavior {
            name: name.to_string(),
            turn: None,
            throttle: None,
            conditions: Vec::new(),
            max_ticks: None,
        }
    }

    pub fn turn(mut self, policy: impl TurnPolicy + 'static) -> Self {
        self.turn = Some(Box::new(policy));
        self
    }

    pub fn throttle(mut self, policy: impl ThrottlePolicy + 'static) -> Self {
        self.throttle = Some(Box::new(policy));
        self
    }

    pub fn until(mut self, condition: TerminationCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn max_ticks(mut self, max_ticks: Option<u64>) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    pub fn run(mut self, vessel: &mut VesselController) -> Result<PhaseOutcome, AutopilotError> {
        debug!(
            "Starting phase '{}' with {} termination conditions",
            self.name,
            self.conditions.len()
        );
        run_phase(
            vessel,
            &self.name,
            self.turn.as_deref_mut(),
            self.throttle.as_deref_mut(),
            &self.conditions,
            self.max_ticks,
        )
    }
}

impl VesselController {
    /// Unbounded phase runner; see [`run_phase`].
    pub fn run_behavior(
        &mut self,
        turn: Option<&mut (dyn TurnPolicy + '_)>,
        throttle: Option<&mut (dyn ThrottlePolicy + '_)>,
        conditions: &[TerminationCondition],
    ) -> Result<PhaseOutcome, AutopilotError> {
        run_phase(self, "behavior", turn, throttle, conditions, None)
    }
}
