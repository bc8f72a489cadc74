use crate::simulation::aerodynamics::Aerodynamics;
use crate::simulation::body::CelestialBody;
use crate::utils::vector2d::Vector2D;

/// Inertial state of the vessel in the body's equatorial plane, origin at the
/// body's centre.
#[derive(Debug, Clone)]
pub struct Kinematics {
    pub position: Vector2D,
    pub velocity: Vector2D,
    pub acceleration: Vector2D,
    pub time: f64,
    pub landed: bool,
}

impl Kinematics {
    /// At rest on the surface at `longitude` (radians), moving with the
    /// body's rotation.
    pub fn on_surface(body: &CelestialBody, longitude: f64) -> Self {
        let position = Vector2D::from_polar(body.radius, longitude);
        Kinematics {
            position,
            velocity: surface_velocity_at(body, position),
            acceleration: Vector2D::default(),
            time: 0.0,
            landed: true,
        }
    }

    pub fn altitude(&self, body: &CelestialBody) -> f64 {
        self.position.magnitude() - body.radius
    }

    /// Radial unit vector.
    pub fn up(&self) -> Vector2D {
        self.position.normalize()
    }

    /// Horizontal unit vector in the direction of the body's rotation.
    pub fn east(&self) -> Vector2D {
        self.up().perpendicular()
    }

    /// Velocity relative to the rotating surface and its atmosphere.
    pub fn surface_velocity(&self, body: &CelestialBody) -> Vector2D {
        self.velocity - surface_velocity_at(body, self.position)
    }

    /// One RK4 step under gravity, drag and a thrust force held constant over
    /// the step.
    pub fn update(
        &mut self,
        delta_time: f64,
        thrust: Vector2D,
        total_mass: f64,
        aerodynamics: &Aerodynamics,
        body: &CelestialBody,
    ) {
        let initial_state = (self.position, self.velocity);
        let derivatives = |state: (Vector2D, Vector2D)| {
            let acceleration =
                calculate_acceleration(state, thrust, total_mass, aerodynamics, body);
            (state.1, acceleration)
        };

        let k1 = derivatives(initial_state);
        let k2 = derivatives((
            initial_state.0 + k1.0 * (delta_time / 2.0),
            initial_state.1 + k1.1 * (delta_time / 2.0),
        ));
        let k3 = derivatives((
            initial_state.0 + k2.0 * (delta_time / 2.0),
            initial_state.1 + k2.1 * (delta_time / 2.0),
        ));
        let k4 = derivatives((
            initial_state.0 + k3.0 * delta_time,
            initial_state.1 + k3.1 * delta_time,
        ));

        self.position =
            initial_state.0 + (delta_time / 6.0) * (k1.0 + 2.0 * k2.0 + 2.0 * k3.0 + k4.0);
        self.velocity =
            initial_state.1 + (delta_time / 6.0) * (k1.1 + 2.0 * k2.1 + 2.0 * k3.1 + k4.1);
        self.acceleration = calculate_acceleration(
            (self.position, self.velocity),
            thrust,
            total_mass,
            aerodynamics,
            body,
        );
        self.time += delta_time;

        self.clamp_to_ground(body);
    }

    /// Keeps the vessel on the surface while thrust cannot lift it.
    fn clamp_to_ground(&mut self, body: &CelestialBody) {
        if self.position.magnitude() <= body.radius {
            self.position = self.up() * body.radius;
            self.velocity = surface_velocity_at(body, self.position);
            self.acceleration = Vector2D::default();
            self.landed = true;
        } else {
            self.landed = false;
        }
    }
}

fn surface_velocity_at(body: &CelestialBody, position: Vector2D) -> Vector2D {
    position.perpendicular() * body.angular_velocity()
}

fn calculate_acceleration(
    state: (Vector2D, Vector2D),
    thrust: Vector2D,
    total_mass: f64,
    aerodynamics: &Aerodynamics,
    body: &CelestialBody,
) -> Vector2D {
    let (position, velocity) = state;
    let radius = position.magnitude();
    let altitude = radius - body.radius;

    let gravity = -position.normalize() * (body.gravitational_parameter / radius.powi(2));
    let air_velocity = velocity - surface_velocity_at(body, position);
    let drag = aerodynamics.drag(air_velocity, body.air_density(altitude));

    gravity + (thrust + drag) / total_mass
}
