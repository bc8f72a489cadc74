//! Keplerian elements from a planar state vector.

use std::f64::consts::{PI, TAU};

use crate::utils::vector2d::Vector2D;

/// Below this eccentricity the orbit is treated as circular and the
/// periapsis direction is undefined.
const CIRCULAR_ECCENTRICITY: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitalElements {
    /// Negative for hyperbolic trajectories.
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    /// Altitude above the surface. Infinite on escape trajectories.
    pub apoapsis_altitude: f64,
    pub periapsis_altitude: f64,
    pub time_to_apoapsis: f64,
    /// Negative once periapsis has passed on an escape trajectory.
    pub time_to_periapsis: f64,
}

impl OrbitalElements {
    pub fn from_state(
        position: Vector2D,
        velocity: Vector2D,
        gravitational_parameter: f64,
        body_radius: f64,
    ) -> Self {
        let mu = gravitational_parameter;
        let r = position.magnitude();
        let v2 = velocity.dot(&velocity);
        let radial_velocity = position.dot(&velocity);
        let angular_momentum = position.cross(&velocity);
        let energy = v2 / 2.0 - mu / r;

        let eccentricity_vector =
            (position * (v2 - mu / r) - velocity * radial_velocity) / mu;
        let eccentricity = eccentricity_vector.magnitude();
        let semi_latus_rectum = angular_momentum.powi(2) / mu;

        let periapsis_radius = semi_latus_rectum / (1.0 + eccentricity);
        let apoapsis_radius = if eccentricity < 1.0 {
            semi_latus_rectum / (1.0 - eccentricity)
        } else {
            f64::INFINITY
        };

        let true_anomaly = if eccentricity < CIRCULAR_ECCENTRICITY {
            0.0
        } else {
            let cos_nu = (eccentricity_vector.dot(&position) / (eccentricity * r)).clamp(-1.0, 1.0);
            if radial_velocity < 0.0 {
                TAU - cos_nu.acos()
            } else {
                cos_nu.acos()
            }
        };

        let semi_major_axis = if energy.abs() > f64::EPSILON {
            -mu / (2.0 * energy)
        } else {
            f64::INFINITY
        };

        let (time_to_apoapsis, time_to_periapsis) = if eccentricity < 1.0 && semi_major_axis > 0.0 {
            elliptic_times(true_anomaly, eccentricity, semi_major_axis, mu)
        } else if semi_major_axis < 0.0 {
            (
                f64::INFINITY,
                hyperbolic_time_to_periapsis(true_anomaly, eccentricity, semi_major_axis, mu),
            )
        } else {
            (f64::INFINITY, 0.0)
        };

        OrbitalElements {
            semi_major_axis,
            eccentricity,
            apoapsis_altitude: apoapsis_radius - body_radius,
            periapsis_altitude: periapsis_radius - body_radius,
            time_to_apoapsis,
            time_to_periapsis,
        }
    }

    pub fn period(&self, gravitational_parameter: f64) -> Option<f64> {
        (self.eccentricity < 1.0 && self.semi_major_axis > 0.0)
            .then(|| TAU * (self.semi_major_axis.powi(3) / gravitational_parameter).sqrt())
    }
}

fn elliptic_times(
    true_anomaly: f64,
    eccentricity: f64,
    semi_major_axis: f64,
    mu: f64,
) -> (f64, f64) {
    let eccentric_anomaly = ((1.0 - eccentricity.powi(2)).sqrt() * true_anomaly.sin())
        .atan2(eccentricity + true_anomaly.cos());
    let mean_anomaly = (eccentric_anomaly - eccentricity * eccentric_anomaly.sin()).rem_euclid(TAU);
    let mean_motion = (mu / semi_major_axis.powi(3)).sqrt();

    let to_apoapsis = (PI - mean_anomaly).rem_euclid(TAU) / mean_motion;
    let to_periapsis = (TAU - mean_anomaly).rem_euclid(TAU) / mean_motion;
    (to_apoapsis, to_periapsis)
}

fn hyperbolic_time_to_periapsis(
    true_anomaly: f64,
    eccentricity: f64,
    semi_major_axis: f64,
    mu: f64,
) -> f64 {
    // signed anomaly in (-pi, pi]
    let nu = if true_anomaly > PI { true_anomaly - TAU } else { true_anomaly };
    let hyperbolic_anomaly =
        2.0 * (((eccentricity - 1.0) / (eccentricity + 1.0)).sqrt() * (nu / 2.0).tan()).atanh();
    let mean_anomaly = eccentricity * hyperbolic_anomaly.sinh() - hyperbolic_anomaly;
    let mean_motion = (mu / (-semi_major_axis).powi(3)).sqrt();
    -mean_anomaly / mean_motion
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const MU: f64 = 3.5316e12;
    const RADIUS: f64 = 600_000.0;

    #[test]
    fn test_circular_orbit() {
        let r = RADIUS + 80_000.0;
        let speed = (MU / r).sqrt();
        let elements = OrbitalElements::from_state(
            Vector2D::new(r, 0.0),
            Vector2D::new(0.0, speed),
            MU,
            RADIUS,
        );

        assert!(elements.eccentricity < 1e-9);
        assert_relative_eq!(elements.semi_major_axis, r, max_relative = 1e-9);
        assert_relative_eq!(elements.apoapsis_altitude, 80_000.0, epsilon = 1e-3);
        assert_relative_eq!(elements.periapsis_altitude, 80_000.0, epsilon = 1e-3);
        let period = elements.period(MU).unwrap();
        assert_relative_eq!(elements.time_to_apoapsis, period / 2.0, max_relative = 1e-9);
    }

    #[test]
    fn test_elliptic_orbit_at_periapsis() {
        let periapsis = RADIUS + 80_000.0;
        let apoapsis = RADIUS + 200_000.0;
        let a = (periapsis + apoapsis) / 2.0;
        let speed = (MU * (2.0 / periapsis - 1.0 / a)).sqrt();
        let elements = OrbitalElements::from_state(
            Vector2D::new(periapsis, 0.0),
            Vector2D::new(0.0, speed),
            MU,
            RADIUS,
        );

        assert_relative_eq!(elements.periapsis_altitude, 80_000.0, epsilon = 1e-3);
        assert_relative_eq!(elements.apoapsis_altitude, 200_000.0, epsilon = 1e-3);
        assert_relative_eq!(elements.eccentricity, 60_000.0 / a, max_relative = 1e-9);
        let period = elements.period(MU).unwrap();
        assert_relative_eq!(elements.time_to_apoapsis, period / 2.0, max_relative = 1e-6);
    }

    #[test]
    fn test_climbing_toward_apoapsis() {
        let periapsis = RADIUS + 80_000.0;
        let apoapsis = RADIUS + 200_000.0;
        let a = (periapsis + apoapsis) / 2.0;
        let speed = (MU * (2.0 / periapsis - 1.0 / a)).sqrt();
        // partway around the same orbit, integrated coarsely
        let mut position = Vector2D::new(periapsis, 0.0);
        let mut velocity = Vector2D::new(0.0, speed);
        for _ in 0..600 {
            let gravity = -position.normalize() * (MU / position.magnitude().powi(2));
            velocity = velocity + gravity * 0.5;
            position = position + velocity * 0.5;
        }
        let elements = OrbitalElements::from_state(position, velocity, MU, RADIUS);
        let period = elements.period(MU).unwrap();

        assert!(position.dot(&velocity) > 0.0);
        assert!(elements.time_to_apoapsis < period / 2.0);
        assert!(elements.time_to_periapsis > period / 2.0);
        assert_relative_eq!(
            elements.time_to_periapsis - elements.time_to_apoapsis,
            period / 2.0,
            max_relative = 1e-6
        );
    }

    #[test]
    fn test_escape_trajectory() {
        let r = RADIUS + 100_000.0;
        let escape = (2.0 * MU / r).sqrt();
        let elements = OrbitalElements::from_state(
            Vector2D::new(r, 0.0),
            Vector2D::new(0.0, escape * 1.2),
            MU,
            RADIUS,
        );

        assert!(elements.eccentricity > 1.0);
        assert!(elements.apoapsis_altitude.is_infinite());
        assert!(elements.time_to_apoapsis.is_infinite());
        assert_relative_eq!(elements.periapsis_altitude, 100_000.0, epsilon = 1e-3);
        assert!(elements.period(MU).is_none());
    }

    #[test]
    fn test_resting_on_the_surface() {
        // co-rotating with the surface: apoapsis is the launch site
        let elements = OrbitalElements::from_state(
            Vector2D::new(RADIUS, 0.0),
            Vector2D::new(0.0, 174.94),
            MU,
            RADIUS,
        );
        assert_relative_eq!(elements.apoapsis_altitude, 0.0, epsilon = 1e-3);
        assert!(elements.periapsis_altitude < -RADIUS * 0.9);
    }
}
