use crate::constants::*;
use crate::errors::AutopilotError;

/// Tunable parameters of the ascent profile.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchParameters {
    pub alt_max: f64,
    pub apo_max: f64,
    pub turn_max: f64,
    pub init_speed_max: f64,
    pub initial_turn_offset: f64,
    pub turn_delta: f64,
    pub termv_accel: f64,
    pub termv_decel: f64,
    pub termv_min_throttle: f64,
    pub follow_apo_min_dist: f64,
    pub follow_apo_max_dist: f64,
    /// Fixed lead distance. `None` selects the linearly shrinking lead.
    pub follow_apo_dist: Option<f64>,
    pub circularize_seconds: f64,
    pub autostage: bool,
    /// Tick budget per phase. `None` runs each phase until its condition trips.
    pub max_phase_ticks: Option<u64>,
}

impl Default for LaunchParameters {
    fn default() -> Self {
        LaunchParameters {
            alt_max: DEFAULT_ALT_MAX,
            apo_max: DEFAULT_APO_MAX,
            turn_max: DEFAULT_TURN_MAX,
            init_speed_max: DEFAULT_INIT_SPEED_MAX,
            initial_turn_offset: DEFAULT_INITIAL_TURN_OFFSET,
            turn_delta: DEFAULT_TURN_DELTA,
            termv_accel: DEFAULT_TERMV_ACCEL,
            termv_decel: DEFAULT_TERMV_DECEL,
            termv_min_throttle: DEFAULT_TERMV_MIN_THROTTLE,
            follow_apo_min_dist: DEFAULT_FOLLOW_APO_MIN_DIST,
            follow_apo_max_dist: DEFAULT_FOLLOW_APO_MAX_DIST,
            follow_apo_dist: None,
            circularize_seconds: DEFAULT_CIRCULARIZE_SECONDS,
            autostage: true,
            max_phase_ticks: None,
        }
    }
}

impl LaunchParameters {
    pub fn validate(&self) -> Result<(), AutopilotError> {
        if self.alt_max <= 0.0 {
            return Err(invalid("alt_max must be positive"));
        }
        if self.apo_max <= self.alt_max {
            return Err(invalid("apo_max must be above alt_max"));
        }
        if !(0.0..=90.0).contains(&self.turn_max) {
            return Err(invalid("turn_max must be within [0, 90] degrees"));
        }
        if self.init_speed_max <= 0.0 {
            return Err(invalid("init_speed_max must be positive"));
        }
        if self.turn_delta <= 0.0 {
            return Err(invalid("turn_delta must be positive"));
        }
        if self.termv_accel <= 1.0 {
            return Err(invalid("termv_accel must be greater than 1"));
        }
        if !(0.0..1.0).contains(&self.termv_decel) {
            return Err(invalid("termv_decel must be within [0, 1)"));
        }
        if !(0.0..=1.0).contains(&self.termv_min_throttle) {
            return Err(invalid("termv_min_throttle must be within [0, 1]"));
        }
        if self.follow_apo_min_dist > self.follow_apo_max_dist {
            return Err(invalid(
                "follow_apo_min_dist must not exceed follow_apo_max_dist",
            ));
        }
        if self.follow_apo_min_dist >= self.apo_max {
            return Err(invalid("follow_apo_min_dist must be below apo_max"));
        }
        if matches!(self.follow_apo_dist, Some(dist) if dist < 0.0) {
            return Err(invalid("follow_apo_dist must not be negative"));
        }
        if self.circularize_seconds < 0.0 {
            return Err(invalid("circularize_seconds must not be negative"));
        }
        if self.max_phase_ticks == Some(0) {
            return Err(invalid("max_phase_ticks must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> AutopilotError {
    AutopilotError::InvalidParameter(message.to_string())
}
