use std::collections::HashMap;
use std::str::FromStr;

use log::debug;
use strum::IntoEnumIterator;

use super::source::{
    ReferenceFrame, Resource, StreamId, Subscription, TelemetryField, TelemetrySource,
};
use crate::errors::AutopilotError;
use crate::utils::vector3d::Vector3D;

/// Live telemetry for one vessel.
///
/// Every stream is registered with the host once, in [`TelemetryFeed::subscribe`].
/// Reads go straight to the host's latest sample; nothing is cached here.
pub struct TelemetryFeed {
    source: Box<dyn TelemetrySource>,
    scalars: HashMap<TelemetryField, StreamId>,
    prograde: HashMap<ReferenceFrame, StreamId>,
    liquid: Vec<StreamId>,
    solid: Vec<StreamId>,
}

impl TelemetryFeed {
    /// Subscribes to all scalar fields, the prograde vector in every frame, and
    /// liquid/solid propellant for decouple stages `0..stage_count`.
    ///
    /// Decouple stages count down as the vessel stages, so the per-stage lists
    /// are reversed: index 0 is decouple stage `stage_count - 1`, the first
    /// section to be dropped.
    pub fn subscribe(
        mut source: Box<dyn TelemetrySource>,
        stage_count: usize,
    ) -> Result<Self, AutopilotError> {
        let mut scalars = HashMap::new();
        for field in TelemetryField::iter() {
            scalars.insert(field, source.add_stream(Subscription::Scalar(field))?);
        }

        let mut prograde = HashMap::new();
        for frame in ReferenceFrame::iter() {
            prograde.insert(frame, source.add_stream(Subscription::Prograde(frame))?);
        }

        let mut liquid = Vec::with_capacity(stage_count);
        let mut solid = Vec::with_capacity(stage_count);
        for decouple_stage in 0..stage_count {
            liquid.push(source.add_stream(Subscription::StageResource {
                decouple_stage,
                resource: Resource::LiquidFuel,
            })?);
            solid.push(source.add_stream(Subscription::StageResource {
                decouple_stage,
                resource: Resource::SolidFuel,
            })?);
        }
        liquid.reverse();
        solid.reverse();

        debug!(
            "Subscribed to {} scalar, {} vector and {} stage streams",
            scalars.len(),
            prograde.len(),
            liquid.len() + solid.len()
        );

        Ok(TelemetryFeed {
            source,
            scalars,
            prograde,
            liquid,
            solid,
        })
    }

    pub fn stage_count(&self) -> usize {
        self.liquid.len()
    }

    pub fn await_update(&mut self) -> Result<(), AutopilotError> {
        self.source.await_update()
    }

    pub fn get(&self, field: TelemetryField) -> Result<f64, AutopilotError> {
        let stream = self
            .scalars
            .get(&field)
            .ok_or_else(|| AutopilotError::UnknownTelemetryField(field.to_string()))?;
        self.source.read(*stream)?.as_scalar()
    }

    /// Looks a field up by its short name (`"alt"`, `"apo_time"`, ...).
    pub fn get_named(&self, name: &str) -> Result<f64, AutopilotError> {
        let field = TelemetryField::from_str(name)
            .map_err(|_| AutopilotError::UnknownTelemetryField(name.to_string()))?;
        self.get(field)
    }

    pub fn prograde(&self, frame: ReferenceFrame) -> Result<Vector3D, AutopilotError> {
        let stream = self
            .prograde
            .get(&frame)
            .ok_or_else(|| AutopilotError::UnknownTelemetryField(frame.to_string()))?;
        self.source.read(*stream)?.as_vector()
    }

    pub fn stage_liquid(&self, stage: i32) -> Result<f64, AutopilotError> {
        let stream = self.stage_stream(&self.liquid, stage)?;
        self.source.read(stream)?.as_scalar()
    }

    pub fn stage_solid(&self, stage: i32) -> Result<f64, AutopilotError> {
        let stream = self.stage_stream(&self.solid, stage)?;
        self.source.read(stream)?.as_scalar()
    }

    fn stage_stream(&self, streams: &[StreamId], stage: i32) -> Result<StreamId, AutopilotError> {
        usize::try_from(stage)
            .ok()
            .and_then(|index| streams.get(index))
            .copied()
            .ok_or(AutopilotError::StageOutOfRange {
                stage,
                stage_count: streams.len(),
            })
    }

    pub fn ut(&self) -> Result<f64, AutopilotError> {
        self.get(TelemetryField::MissionTime)
    }

    pub fn altitude(&self) -> Result<f64, AutopilotError> {
        self.get(TelemetryField::Altitude)
    }

    pub fn speed(&self) -> Result<f64, AutopilotError> {
        self.get(TelemetryField::Speed)
    }

    pub fn vertical_speed(&self) -> Result<f64, AutopilotError> {
        self.get(TelemetryField::VerticalSpeed)
    }

    pub fn horizontal_speed(&self) -> Result<f64, AutopilotError> {
        self.get(TelemetryField::HorizontalSpeed)
    }

    pub fn terminal_velocity(&self) -> Result<f64, AutopilotError> {
        self.get(TelemetryField::TerminalVelocity)
    }

    pub fn apoapsis(&self) -> Result<f64, AutopilotError> {
        self.get(TelemetryField::Apoapsis)
    }

    pub fn time_to_apoapsis(&self) -> Result<f64, AutopilotError> {
        self.get(TelemetryField::TimeToApoapsis)
    }

    pub fn periapsis(&self) -> Result<f64, AutopilotError> {
        self.get(TelemetryField::Periapsis)
    }

    pub fn time_to_periapsis(&self) -> Result<f64, AutopilotError> {
        self.get(TelemetryField::TimeToPeriapsis)
    }

    pub fn eccentricity(&self) -> Result<f64, AutopilotError> {
        self.get(TelemetryField::Eccentricity)
    }

    pub fn heading(&self) -> Result<f64, AutopilotError> {
        self.get(TelemetryField::Heading)
    }

    pub fn pitch(&self) -> Result<f64, AutopilotError> {
        self.get(TelemetryField::Pitch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeHost;
    use approx::assert_relative_eq;

    #[test]
    fn test_subscribe_registers_every_stream() {
        let host = FakeHost::new();
        let feed = TelemetryFeed::subscribe(host.telemetry(), 3).unwrap();

        // 13 scalars, 5 frames, 2 resources for each of 3 stages
        assert_eq!(host.subscription_count(), 13 + 5 + 6);
        assert_eq!(feed.stage_count(), 3);
    }

    #[test]
    fn test_stage_index_zero_is_highest_decouple_stage() {
        let host = FakeHost::new();
        host.set_stage_resource(2, Resource::LiquidFuel, 300.0);
        host.set_stage_resource(1, Resource::LiquidFuel, 200.0);
        host.set_stage_resource(0, Resource::LiquidFuel, 100.0);
        host.set_stage_resource(2, Resource::SolidFuel, 30.0);
        let feed = TelemetryFeed::subscribe(host.telemetry(), 3).unwrap();

        assert_relative_eq!(feed.stage_liquid(0).unwrap(), 300.0);
        assert_relative_eq!(feed.stage_liquid(1).unwrap(), 200.0);
        assert_relative_eq!(feed.stage_liquid(2).unwrap(), 100.0);
        assert_relative_eq!(feed.stage_solid(0).unwrap(), 30.0);
    }

    #[test]
    fn test_stage_out_of_range() {
        let host = FakeHost::new();
        let feed = TelemetryFeed::subscribe(host.telemetry(), 2).unwrap();

        assert!(matches!(
            feed.stage_liquid(-1),
            Err(AutopilotError::StageOutOfRange { stage: -1, stage_count: 2 })
        ));
        assert!(matches!(
            feed.stage_solid(2),
            Err(AutopilotError::StageOutOfRange { stage: 2, stage_count: 2 })
        ));
    }

    #[test]
    fn test_reads_are_live() {
        let host = FakeHost::new();
        host.set_scalar(TelemetryField::Altitude, 10.0);
        let feed = TelemetryFeed::subscribe(host.telemetry(), 1).unwrap();
        assert_relative_eq!(feed.altitude().unwrap(), 10.0);

        host.set_scalar(TelemetryField::Altitude, 250.0);
        assert_relative_eq!(feed.altitude().unwrap(), 250.0);
        assert_relative_eq!(feed.get_named("alt").unwrap(), 250.0);
    }

    #[test]
    fn test_unknown_field_name_is_an_error() {
        let host = FakeHost::new();
        let feed = TelemetryFeed::subscribe(host.telemetry(), 1).unwrap();

        match feed.get_named("altitdue") {
            Err(AutopilotError::UnknownTelemetryField(name)) => assert_eq!(name, "altitdue"),
            other => panic!("expected unknown field error, got {:?}", other),
        }
    }

    #[test]
    fn test_prograde_per_frame() {
        let host = FakeHost::new();
        host.set_prograde(ReferenceFrame::Surface, Vector3D::new(1.0, 0.0, 0.0));
        host.set_prograde(ReferenceFrame::Vessel, Vector3D::new(0.0, 1.0, 0.0));
        let feed = TelemetryFeed::subscribe(host.telemetry(), 1).unwrap();

        assert_eq!(
            feed.prograde(ReferenceFrame::Surface).unwrap(),
            Vector3D::new(1.0, 0.0, 0.0)
        );
        assert_eq!(
            feed.prograde(ReferenceFrame::Vessel).unwrap(),
            Vector3D::new(0.0, 1.0, 0.0)
        );
    }
}
