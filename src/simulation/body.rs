use crate::constants::{
    AIR_DENSITY_SEA_LEVEL, ATMOSPHERE_HEIGHT, ATMOSPHERE_SCALE_HEIGHT, BODY_GRAVITATIONAL_PARAMETER,
    BODY_RADIUS, BODY_ROTATION_PERIOD,
};

/// Rotating spherical body with an exponential atmosphere.
#[derive(Clone, Debug)]
pub struct CelestialBody {
    pub name: String,
    pub radius: f64,
    pub gravitational_parameter: f64,
    pub rotation_period: f64,
    pub atmosphere_height: f64,
    pub scale_height: f64,
    pub sea_level_density: f64,
}

impl CelestialBody {
    pub fn kerbin() -> Self {
        CelestialBody {
            name: "Kerbin".to_string(),
            radius: BODY_RADIUS,
            gravitational_parameter: BODY_GRAVITATIONAL_PARAMETER,
            rotation_period: BODY_ROTATION_PERIOD,
            atmosphere_height: ATMOSPHERE_HEIGHT,
            scale_height: ATMOSPHERE_SCALE_HEIGHT,
            sea_level_density: AIR_DENSITY_SEA_LEVEL,
        }
    }

    pub fn surface_gravity(&self) -> f64 {
        self.gravity_at_altitude(0.0)
    }

    pub fn gravity_at_altitude(&self, altitude: f64) -> f64 {
        let distance = self.radius + altitude;
        self.gravitational_parameter / distance.powi(2)
    }

    /// rad/s, counter-clockwise seen from the north pole.
    pub fn angular_velocity(&self) -> f64 {
        2.0 * std::f64::consts::PI / self.rotation_period
    }

    /// Zero at and above the top of the atmosphere.
    pub fn air_density(&self, altitude: f64) -> f64 {
        if !self.is_in_atmosphere(altitude) {
            return 0.0;
        }
        self.sea_level_density * (-altitude.max(0.0) / self.scale_height).exp()
    }

    pub fn is_in_atmosphere(&self, altitude: f64) -> bool {
        altitude < self.atmosphere_height
    }

    pub fn circular_orbit_speed(&self, altitude: f64) -> f64 {
        (self.gravitational_parameter / (self.radius + altitude)).sqrt()
    }
}
