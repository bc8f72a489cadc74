//! Scriptable in-memory host for unit tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::connection::VesselHandle;
use crate::control::command::CommandSink;
use crate::errors::AutopilotError;
use crate::telemetry_system::source::{
    ReferenceFrame, Resource, StreamId, StreamValue, Subscription, TelemetryField,
    TelemetrySource,
};
use crate::utils::vector3d::Vector3D;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Throttle(f64),
    Engage,
    Disengage,
    Target { pitch: f64, heading: f64 },
    Sas(bool),
    Stage,
}

type UpdateScript = Box<dyn FnMut(&FakeHost)>;

#[derive(Default)]
struct FakeState {
    values: HashMap<Subscription, StreamValue>,
    streams: Vec<Subscription>,
    sent: Vec<Command>,
    throttle: f64,
    updates: usize,
    script: Option<UpdateScript>,
}

#[derive(Clone, Default)]
pub struct FakeHost {
    state: Rc<RefCell<FakeState>>,
}

struct FakeTelemetry(FakeHost);
struct FakeCommands(FakeHost);

impl FakeHost {
    pub fn new() -> Self {
        FakeHost::default()
    }

    pub fn telemetry(&self) -> Box<dyn TelemetrySource> {
        Box::new(FakeTelemetry(self.clone()))
    }

    pub fn commands(&self) -> Box<dyn CommandSink> {
        Box::new(FakeCommands(self.clone()))
    }

    pub fn handle(&self) -> VesselHandle {
        VesselHandle {
            name: "Fake Vessel".to_string(),
            telemetry: self.telemetry(),
            commands: self.commands(),
        }
    }

    pub fn set_scalar(&self, field: TelemetryField, value: f64) {
        self.state
            .borrow_mut()
            .values
            .insert(Subscription::Scalar(field), StreamValue::Scalar(value));
    }

    pub fn scalar(&self, field: TelemetryField) -> f64 {
        match self.state.borrow().values.get(&Subscription::Scalar(field)) {
            Some(StreamValue::Scalar(value)) => *value,
            _ => 0.0,
        }
    }

    pub fn set_prograde(&self, frame: ReferenceFrame, direction: Vector3D) {
        self.state.borrow_mut().values.insert(
            Subscription::Prograde(frame),
            StreamValue::Vector(direction),
        );
    }

    pub fn set_stage_resource(&self, decouple_stage: usize, resource: Resource, amount: f64) {
        self.state.borrow_mut().values.insert(
            Subscription::StageResource {
                decouple_stage,
                resource,
            },
            StreamValue::Scalar(amount),
        );
    }

    pub fn set_throttle(&self, throttle: f64) {
        self.state.borrow_mut().throttle = throttle;
    }

    pub fn throttle(&self) -> f64 {
        self.state.borrow().throttle
    }

    /// Runs `script` on every `await_update`, before the tick's reads.
    pub fn on_update(&self, script: impl FnMut(&FakeHost) + 'static) {
        self.state.borrow_mut().script = Some(Box::new(script));
    }

    pub fn subscription_count(&self) -> usize {
        self.state.borrow().streams.len()
    }

    pub fn update_count(&self) -> usize {
        self.state.borrow().updates
    }

    pub fn sent(&self) -> Vec<Command> {
        self.state.borrow().sent.clone()
    }

    pub fn clear_sent(&self) {
        self.state.borrow_mut().sent.clear();
    }

    pub fn count_sent(&self, predicate: impl Fn(&Command) -> bool) -> usize {
        self.state.borrow().sent.iter().filter(|c| predicate(*c)).count()
    }

    fn record(&self, command: Command) {
        self.state.borrow_mut().sent.push(command);
    }
}

impl TelemetrySource for FakeTelemetry {
    fn add_stream(&mut self, subscription: Subscription) -> Result<StreamId, AutopilotError> {
        let mut state = self.0.state.borrow_mut();
        state.streams.push(subscription);
        Ok(StreamId(state.streams.len() - 1))
    }

    fn read(&self, stream: StreamId) -> Result<StreamValue, AutopilotError> {
        let state = self.0.state.borrow();
        let subscription = state
            .streams
            .get(stream.0)
            .ok_or(AutopilotError::UnknownStream(stream.0))?;
        Ok(match state.values.get(subscription) {
            Some(value) => *value,
            None => match subscription {
                Subscription::Prograde(_) => StreamValue::Vector(Vector3D::default()),
                _ => StreamValue::Scalar(0.0),
            },
        })
    }

    fn await_update(&mut self) -> Result<(), AutopilotError> {
        let script = {
            let mut state = self.0.state.borrow_mut();
            state.updates += 1;
            state.script.take()
        };
        if let Some(mut script) = script {
            script(&self.0);
            self.0.state.borrow_mut().script = Some(script);
        }
        Ok(())
    }
}

impl CommandSink for FakeCommands {
    fn throttle(&self) -> Result<f64, AutopilotError> {
        Ok(self.0.throttle())
    }

    fn set_throttle(&mut self, throttle: f64) -> Result<(), AutopilotError> {
        self.0.set_throttle(throttle);
        self.0.record(Command::Throttle(throttle));
        Ok(())
    }

    fn engage_autopilot(&mut self) -> Result<(), AutopilotError> {
        self.0.record(Command::Engage);
        Ok(())
    }

    fn disengage_autopilot(&mut self) -> Result<(), AutopilotError> {
        self.0.record(Command::Disengage);
        Ok(())
    }

    fn target_pitch_and_heading(&mut self, pitch: f64, heading: f64) -> Result<(), AutopilotError> {
        self.0.record(Command::Target { pitch, heading });
        Ok(())
    }

    fn set_sas(&mut self, enabled: bool) -> Result<(), AutopilotError> {
        self.0.record(Command::Sas(enabled));
        Ok(())
    }

    fn activate_next_stage(&mut self) -> Result<(), AutopilotError> {
        self.0.record(Command::Stage);
        Ok(())
    }
}
