use crate::utils::vector2d::Vector2D;

/// Quadratic drag on the air-relative velocity.
#[derive(Debug, Clone)]
pub struct Aerodynamics {
    /// Drag coefficient times reference area, m².
    pub drag_area: f64,
}

impl Aerodynamics {
    pub fn new(drag_area: f64) -> Self {
        Aerodynamics { drag_area }
    }

    pub fn dynamic_pressure(&self, airspeed: f64, air_density: f64) -> f64 {
        0.5 * air_density * airspeed.powi(2)
    }

    /// Force opposing `air_velocity`, N.
    pub fn drag(&self, air_velocity: Vector2D, air_density: f64) -> Vector2D {
        let airspeed = air_velocity.magnitude();
        if airspeed > 0.0 {
            let magnitude = self.dynamic_pressure(airspeed, air_density) * self.drag_area;
            -air_velocity.normalize() * magnitude
        } else {
            Vector2D::default()
        }
    }

    /// Speed at which drag balances weight. Infinite in vacuum.
    pub fn terminal_velocity(&self, mass: f64, gravity: f64, air_density: f64) -> f64 {
        let resistance = air_density * self.drag_area;
        if resistance <= f64::EPSILON {
            f64::INFINITY
        } else {
            (2.0 * mass * gravity / resistance).sqrt()
        }
    }
}
