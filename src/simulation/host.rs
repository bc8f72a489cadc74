//! In-process host that flies a simulated vessel.
//!
//! Every `await_update` advances the simulation by one fixed time step and
//! publishes a fresh sample. Reads between updates return that sample.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strum::IntoEnumIterator;

use crate::connection::{Connection, VesselHandle};
use crate::constants::{ATTITUDE_SLEW_RATE, TIME_STEP};
use crate::control::command::CommandSink;
use crate::errors::AutopilotError;
use crate::simulation::body::CelestialBody;
use crate::simulation::kinematics::Kinematics;
use crate::simulation::orbit::OrbitalElements;
use crate::simulation::vehicle::{Vehicle, VesselDesign};
use crate::telemetry_system::source::{
    ReferenceFrame, StreamId, StreamValue, Subscription, TelemetryField, TelemetrySource,
};
use crate::utils::vector3d::Vector3D;

/// Seeded uniform noise on published scalars, as a fraction of each value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryNoise {
    pub seed: u64,
    pub amplitude: f64,
}

#[derive(Debug, Clone, Default)]
struct Sample {
    scalars: HashMap<TelemetryField, f64>,
    prograde: HashMap<ReferenceFrame, Vector3D>,
}

struct Simulation {
    body: CelestialBody,
    vehicle: Vehicle,
    kinematics: Kinematics,
    throttle: f64,
    autopilot_engaged: bool,
    sas: bool,
    target_pitch: f64,
    target_heading: f64,
    pitch: f64,
    heading: f64,
    streams: Vec<Subscription>,
    sample: Sample,
    noise: Option<(StdRng, f64)>,
    claimed: bool,
}

impl Simulation {
    fn step(&mut self, delta_time: f64) {
        if self.autopilot_engaged {
            let max_change = ATTITUDE_SLEW_RATE * delta_time;
            self.pitch += (self.target_pitch - self.pitch).clamp(-max_change, max_change);
            self.heading = self.target_heading;
        }

        let thrust = self.vehicle.burn(self.throttle, delta_time);
        let pitch = self.pitch.to_radians();
        let direction = self.kinematics.up() * pitch.sin()
            + self.kinematics.east() * (pitch.cos() * self.heading.to_radians().sin());
        let mass = self.vehicle.total_mass();
        self.kinematics.update(
            delta_time,
            direction * thrust,
            mass,
            &self.vehicle.aerodynamics,
            &self.body,
        );
        trace!(
            "t={:.1} alt={:.1} thrust={:.0} mass={:.0}",
            self.kinematics.time,
            self.kinematics.altitude(&self.body),
            thrust,
            mass
        );
    }

    fn elements(&self) -> OrbitalElements {
        OrbitalElements::from_state(
            self.kinematics.position,
            self.kinematics.velocity,
            self.body.gravitational_parameter,
            self.body.radius,
        )
    }

    fn scalar(&self, field: TelemetryField, elements: &OrbitalElements) -> f64 {
        let k = &self.kinematics;
        let altitude = k.altitude(&self.body);
        match field {
            TelemetryField::MissionTime => k.time,
            TelemetryField::Altitude => altitude,
            TelemetryField::Speed => k.surface_velocity(&self.body).magnitude(),
            TelemetryField::VerticalSpeed => k.velocity.dot(&k.up()),
            TelemetryField::HorizontalSpeed => k.surface_velocity(&self.body).dot(&k.east()).abs(),
            TelemetryField::TerminalVelocity => self.vehicle.aerodynamics.terminal_velocity(
                self.vehicle.total_mass(),
                self.body.gravity_at_altitude(altitude),
                self.body.air_density(altitude),
            ),
            TelemetryField::Apoapsis => elements.apoapsis_altitude,
            TelemetryField::TimeToApoapsis => elements.time_to_apoapsis,
            TelemetryField::Periapsis => elements.periapsis_altitude,
            TelemetryField::TimeToPeriapsis => elements.time_to_periapsis,
            TelemetryField::Eccentricity => elements.eccentricity,
            TelemetryField::Heading => self.heading,
            TelemetryField::Pitch => self.pitch,
        }
    }

    /// Unit prograde in `frame`'s axes, zero when not moving.
    fn prograde(&self, frame: ReferenceFrame) -> Vector3D {
        let k = &self.kinematics;
        let (up, east) = (k.up(), k.east());
        let velocity = match frame {
            ReferenceFrame::SurfaceVelocity => k.surface_velocity(&self.body),
            _ => k.velocity,
        };
        let direction = velocity.normalize();
        if velocity.magnitude() == 0.0 {
            return Vector3D::default();
        }
        match frame {
            ReferenceFrame::Surface | ReferenceFrame::SurfaceVelocity => {
                Vector3D::new(direction.dot(&up), 0.0, direction.dot(&east))
            }
            // z is along-track by construction
            ReferenceFrame::Orbital => Vector3D::new(0.0, 0.0, 1.0),
            ReferenceFrame::OrbitalBody => Vector3D::new(direction.x, direction.y, 0.0),
            ReferenceFrame::Vessel => {
                let pitch = self.pitch.to_radians();
                let nose = up * pitch.sin() + east * pitch.cos();
                let belly = -nose.perpendicular();
                Vector3D::new(0.0, direction.dot(&nose), direction.dot(&belly))
            }
        }
    }

    fn publish(&mut self) {
        let elements = self.elements();
        let mut sample = Sample::default();
        for field in TelemetryField::iter() {
            let mut value = self.scalar(field, &elements);
            if field != TelemetryField::MissionTime {
                if let Some((rng, amplitude)) = self.noise.as_mut() {
                    value *= 1.0 + rng.gen_range(-*amplitude..=*amplitude);
                }
            }
            sample.scalars.insert(field, value);
        }
        for frame in ReferenceFrame::iter() {
            sample.prograde.insert(frame, self.prograde(frame));
        }
        self.sample = sample;
    }

    fn read(&self, subscription: Subscription) -> Result<StreamValue, AutopilotError> {
        match subscription {
            Subscription::Scalar(field) => self
                .sample
                .scalars
                .get(&field)
                .map(|value| StreamValue::Scalar(*value))
                .ok_or_else(|| AutopilotError::Host(format!("no sample for {}", field))),
            Subscription::Prograde(frame) => self
                .sample
                .prograde
                .get(&frame)
                .map(|direction| StreamValue::Vector(*direction))
                .ok_or_else(|| AutopilotError::Host(format!("no prograde in {} frame", frame))),
            Subscription::StageResource {
                decouple_stage,
                resource,
            } => Ok(StreamValue::Scalar(
                self.vehicle.resource(decouple_stage, resource),
            )),
        }
    }
}

/// Host session around one simulated vessel sitting on the launch pad.
#[derive(Clone)]
pub struct SimulatedHost {
    sim: Rc<RefCell<Simulation>>,
}

impl SimulatedHost {
    pub fn new(
        design: &VesselDesign,
        noise: Option<TelemetryNoise>,
    ) -> Result<Self, AutopilotError> {
        design.validate()?;
        let body = CelestialBody::kerbin();
        let kinematics = Kinematics::on_surface(&body, 0.0);
        let noise = match noise {
            Some(noise) if noise.amplitude < 0.0 || noise.amplitude >= 1.0 => {
                return Err(AutopilotError::InvalidParameter(
                    "noise amplitude must be within [0, 1)".to_string(),
                ));
            }
            Some(noise) if noise.amplitude > 0.0 => {
                Some((StdRng::seed_from_u64(noise.seed), noise.amplitude))
            }
            _ => None,
        };
        info!(
            "Simulated host: '{}' with {} stages on {}",
            design.name,
            design.stage_count(),
            body.name
        );

        let mut sim = Simulation {
            body,
            vehicle: Vehicle::new(design),
            kinematics,
            throttle: 0.0,
            autopilot_engaged: false,
            sas: false,
            target_pitch: 90.0,
            target_heading: 90.0,
            pitch: 90.0,
            heading: 90.0,
            streams: Vec::new(),
            sample: Sample::default(),
            noise,
            claimed: false,
        };
        sim.publish();
        Ok(SimulatedHost {
            sim: Rc::new(RefCell::new(sim)),
        })
    }

    pub fn time(&self) -> f64 {
        self.sim.borrow().kinematics.time
    }

    pub fn altitude(&self) -> f64 {
        let sim = self.sim.borrow();
        sim.kinematics.altitude(&sim.body)
    }

    pub fn is_landed(&self) -> bool {
        self.sim.borrow().kinematics.landed
    }

    pub fn mass(&self) -> f64 {
        self.sim.borrow().vehicle.total_mass()
    }

    pub fn stage_activations(&self) -> usize {
        self.sim.borrow().vehicle.activations()
    }

    pub fn pitch(&self) -> f64 {
        self.sim.borrow().pitch
    }

    pub fn throttle(&self) -> f64 {
        self.sim.borrow().throttle
    }

    pub fn autopilot_engaged(&self) -> bool {
        self.sim.borrow().autopilot_engaged
    }

    pub fn sas_enabled(&self) -> bool {
        self.sim.borrow().sas
    }

    pub fn orbit(&self) -> OrbitalElements {
        self.sim.borrow().elements()
    }

    pub fn stream_count(&self) -> usize {
        self.sim.borrow().streams.len()
    }
}

impl Connection for SimulatedHost {
    /// One session per host: the vessel has a single pilot.
    fn active_vessel(&mut self) -> Result<VesselHandle, AutopilotError> {
        let name = {
            let mut sim = self.sim.borrow_mut();
            if sim.claimed {
                return Err(AutopilotError::Connection(format!(
                    "'{}' is already under control",
                    sim.vehicle.name
                )));
            }
            sim.claimed = true;
            sim.vehicle.name.clone()
        };
        Ok(VesselHandle {
            name,
            telemetry: Box::new(SimTelemetry(self.clone())),
            commands: Box::new(SimCommands(self.clone())),
        })
    }
}

struct SimTelemetry(SimulatedHost);

impl TelemetrySource for SimTelemetry {
    fn add_stream(&mut self, subscription: Subscription) -> Result<StreamId, AutopilotError> {
        let mut sim = self.0.sim.borrow_mut();
        sim.streams.push(subscription);
        Ok(StreamId(sim.streams.len() - 1))
    }

    fn read(&self, stream: StreamId) -> Result<StreamValue, AutopilotError> {
        let sim = self.0.sim.borrow();
        let subscription = *sim
            .streams
            .get(stream.0)
            .ok_or(AutopilotError::UnknownStream(stream.0))?;
        sim.read(subscription)
    }

    fn await_update(&mut self) -> Result<(), AutopilotError> {
        let mut sim = self.0.sim.borrow_mut();
        sim.step(TIME_STEP);
        sim.publish();
        Ok(())
    }
}

struct SimCommands(SimulatedHost);

impl CommandSink for SimCommands {
    fn throttle(&self) -> Result<f64, AutopilotError> {
        Ok(self.0.sim.borrow().throttle)
    }

    fn set_throttle(&mut self, throttle: f64) -> Result<(), AutopilotError> {
        if !(0.0..=1.0).contains(&throttle) {
            return Err(AutopilotError::Host(format!(
                "throttle {} outside [0, 1]",
                throttle
            )));
        }
        self.0.sim.borrow_mut().throttle = throttle;
        Ok(())
    }

    fn engage_autopilot(&mut self) -> Result<(), AutopilotError> {
        debug!("Autopilot engaged");
        self.0.sim.borrow_mut().autopilot_engaged = true;
        Ok(())
    }

    fn disengage_autopilot(&mut self) -> Result<(), AutopilotError> {
        debug!("Autopilot disengaged");
        self.0.sim.borrow_mut().autopilot_engaged = false;
        Ok(())
    }

    fn target_pitch_and_heading(&mut self, pitch: f64, heading: f64) -> Result<(), AutopilotError> {
        let mut sim = self.0.sim.borrow_mut();
        sim.target_pitch = pitch.clamp(-90.0, 90.0);
        sim.target_heading = heading;
        Ok(())
    }

    fn set_sas(&mut self, enabled: bool) -> Result<(), AutopilotError> {
        self.0.sim.borrow_mut().sas = enabled;
        Ok(())
    }

    fn activate_next_stage(&mut self) -> Result<(), AutopilotError> {
        self.0.sim.borrow_mut().vehicle.activate_next_stage();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::vehicle::VesselFactory;
    use crate::telemetry_system::source::Resource;
    use approx::assert_relative_eq;

    fn host() -> (SimulatedHost, VesselHandle) {
        let mut host = SimulatedHost::new(&VesselFactory::kerbin_two_stage(), None).unwrap();
        let handle = host.active_vessel().unwrap();
        (host, handle)
    }

    fn read_scalar(handle: &mut VesselHandle, field: TelemetryField) -> f64 {
        let id = handle.telemetry.add_stream(Subscription::Scalar(field)).unwrap();
        handle.telemetry.read(id).unwrap().as_scalar().unwrap()
    }

    #[test]
    fn test_pad_sample() {
        let (host, mut handle) = host();
        assert_eq!(handle.name, "Kerbin Two Stage");
        assert_relative_eq!(read_scalar(&mut handle, TelemetryField::Altitude), 0.0);
        assert_relative_eq!(
            read_scalar(&mut handle, TelemetryField::Speed),
            0.0,
            epsilon = 1e-9
        );
        assert_eq!(read_scalar(&mut handle, TelemetryField::Pitch), 90.0);
        assert_relative_eq!(
            read_scalar(&mut handle, TelemetryField::Apoapsis),
            0.0,
            epsilon = 1e-3
        );
        assert!(host.is_landed());
        assert_eq!(host.stream_count(), 4);

        // orbital prograde on the pad is the surface's own motion: due east
        let id = handle
            .telemetry
            .add_stream(Subscription::Prograde(ReferenceFrame::Surface))
            .unwrap();
        let prograde = handle.telemetry.read(id).unwrap().as_vector().unwrap();
        assert_relative_eq!(prograde.z, 1.0, epsilon = 1e-12);
        assert_relative_eq!(prograde.x, 0.0, epsilon = 1e-12);
        let id = handle
            .telemetry
            .add_stream(Subscription::Prograde(ReferenceFrame::Orbital))
            .unwrap();
        let along_track = handle.telemetry.read(id).unwrap().as_vector().unwrap();
        assert_eq!(along_track, Vector3D::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_unknown_stream() {
        let (_host, handle) = host();
        assert!(matches!(
            handle.telemetry.read(StreamId(7)),
            Err(AutopilotError::UnknownStream(7))
        ));
    }

    #[test]
    fn test_reads_hold_until_update() {
        let (host, mut handle) = host();
        handle.commands.engage_autopilot().unwrap();
        handle.commands.set_throttle(1.0).unwrap();
        handle.commands.activate_next_stage().unwrap();
        let time = handle
            .telemetry
            .add_stream(Subscription::Scalar(TelemetryField::MissionTime))
            .unwrap();

        for _ in 0..20 {
            handle.telemetry.await_update().unwrap();
        }
        let before = handle.telemetry.read(time).unwrap().as_scalar().unwrap();
        assert_relative_eq!(before, 2.0, epsilon = 1e-9);
        assert_eq!(
            handle.telemetry.read(time).unwrap().as_scalar().unwrap(),
            before
        );
        assert!(host.altitude() > 0.0);
        assert!(!host.is_landed());
    }

    #[test]
    fn test_no_thrust_stays_on_the_pad() {
        let (host, mut handle) = host();
        handle.commands.activate_next_stage().unwrap();
        for _ in 0..30 {
            handle.telemetry.await_update().unwrap();
        }
        assert!(host.is_landed());
        assert_relative_eq!(host.altitude(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_attitude_slews_toward_target() {
        let (host, mut handle) = host();
        handle.commands.engage_autopilot().unwrap();
        handle.commands.target_pitch_and_heading(60.0, 90.0).unwrap();
        handle.telemetry.await_update().unwrap();
        assert_relative_eq!(host.pitch(), 88.5, epsilon = 1e-9);
        for _ in 0..30 {
            handle.telemetry.await_update().unwrap();
        }
        assert_relative_eq!(host.pitch(), 60.0);

        // released: the vessel holds its attitude
        handle.commands.disengage_autopilot().unwrap();
        assert!(!host.autopilot_engaged());
        handle.commands.target_pitch_and_heading(30.0, 90.0).unwrap();
        handle.telemetry.await_update().unwrap();
        assert_relative_eq!(host.pitch(), 60.0);
    }

    #[test]
    fn test_staging_drops_mass_and_resources() {
        let (host, mut handle) = host();
        let booster = handle
            .telemetry
            .add_stream(Subscription::StageResource {
                decouple_stage: 1,
                resource: Resource::LiquidFuel,
            })
            .unwrap();
        assert_eq!(
            handle.telemetry.read(booster).unwrap().as_scalar().unwrap(),
            3_600.0
        );

        handle.commands.activate_next_stage().unwrap();
        handle.commands.activate_next_stage().unwrap();
        assert_relative_eq!(host.mass(), 5_000.0);
        assert_eq!(
            handle.telemetry.read(booster).unwrap().as_scalar().unwrap(),
            0.0
        );

        // nothing left: no-op
        handle.commands.activate_next_stage().unwrap();
        assert_eq!(host.stage_activations(), 2);
    }

    #[test]
    fn test_terminal_velocity_on_the_pad() {
        let (_host, mut handle) = host();
        let expected = (2.0 * 26_000.0 * 9.81 / (1.225 * 2.0_f64)).sqrt();
        assert_relative_eq!(
            read_scalar(&mut handle, TelemetryField::TerminalVelocity),
            expected,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_noise_is_seeded() {
        let noise = TelemetryNoise {
            seed: 7,
            amplitude: 0.01,
        };
        let sample = || {
            let mut host =
                SimulatedHost::new(&VesselFactory::kerbin_two_stage(), Some(noise)).unwrap();
            let mut handle = host.active_vessel().unwrap();
            read_scalar(&mut handle, TelemetryField::TerminalVelocity)
        };
        let first = sample();
        assert_eq!(first, sample());
        let clean = (2.0 * 26_000.0 * 9.81 / (1.225 * 2.0_f64)).sqrt();
        assert!((first / clean - 1.0).abs() <= 0.01 + 1e-12);
    }

    #[test]
    fn test_rejects_out_of_range_throttle() {
        let (_host, mut handle) = host();
        assert!(handle.commands.set_throttle(1.5).is_err());
    }

    #[test]
    fn test_second_session_is_refused() {
        let (mut host, _handle) = host();
        assert!(matches!(
            host.active_vessel(),
            Err(AutopilotError::Connection(_))
        ));
    }

    #[test]
    fn test_rejects_bad_noise() {
        let noise = TelemetryNoise {
            seed: 1,
            amplitude: 1.5,
        };
        assert!(SimulatedHost::new(&VesselFactory::kerbin_two_stage(), Some(noise)).is_err());
    }
}
