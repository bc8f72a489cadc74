// Controller constants
pub const TURN_HYSTERESIS_DEG: f64 = 0.5; // minimum change before a new attitude target is sent
pub const AUTOSTAGE_FUEL_THRESHOLD: f64 = 0.01; // combined liquid + solid units
pub const PROGRADE_NUDGE_DEG: f64 = 0.5;
pub const EAST_HEADING_DEG: f64 = 90.0;
pub const NO_STAGE: i32 = -1;
pub const DEGENERATE_DIRECTION_EPSILON: f64 = 1e-9;

// Launch profile defaults
pub const DEFAULT_ALT_MAX: f64 = 30_000.0; // m, end of the gravity turn
pub const DEFAULT_APO_MAX: f64 = 75_000.0; // m, target apoapsis
pub const DEFAULT_TURN_MAX: f64 = 90.0; // degrees from vertical at alt_max
pub const DEFAULT_INIT_SPEED_MAX: f64 = 100.0; // m/s vertical before the turn starts
pub const DEFAULT_INITIAL_TURN_OFFSET: f64 = 1.0; // degrees held during vertical ascent
pub const DEFAULT_TURN_DELTA: f64 = 1.0; // degrees per tick for the prograde-seeking turn
pub const DEFAULT_TERMV_ACCEL: f64 = 1.02;
pub const DEFAULT_TERMV_DECEL: f64 = 0.99;
pub const DEFAULT_TERMV_MIN_THROTTLE: f64 = 0.1;
pub const DEFAULT_FOLLOW_APO_MIN_DIST: f64 = 1_000.0; // m
pub const DEFAULT_FOLLOW_APO_MAX_DIST: f64 = 12_000.0; // m
pub const DEFAULT_CIRCULARIZE_SECONDS: f64 = 8.0; // s before apoapsis
pub const DEFAULT_STAGE_COUNT: usize = 2;

// Simulated host: Kerbin-like body
pub const BODY_RADIUS: f64 = 600_000.0; // m
pub const BODY_GRAVITATIONAL_PARAMETER: f64 = 3.5316e12; // m³/s²
pub const BODY_ROTATION_PERIOD: f64 = 21_549.425; // s
pub const ATMOSPHERE_HEIGHT: f64 = 70_000.0; // m
pub const AIR_DENSITY_SEA_LEVEL: f64 = 1.225; // kg/m³
pub const ATMOSPHERE_SCALE_HEIGHT: f64 = 5_600.0; // m

// Simulated host: physics
pub const STANDARD_GRAVITY: f64 = 9.80665; // m/s²
pub const FUEL_UNIT_MASS: f64 = 5.0; // kg per propellant unit
pub const TIME_STEP: f64 = 0.1; // s per published sample
pub const ATTITUDE_SLEW_RATE: f64 = 15.0; // degrees per second
