use log::{info, warn};

use crate::constants::FUEL_UNIT_MASS;
use crate::errors::AutopilotError;
use crate::simulation::aerodynamics::Aerodynamics;
use crate::telemetry_system::source::Resource;

#[derive(Debug, Clone)]
pub struct StageDesign {
    pub name: String,
    pub resource: Resource,
    /// Propellant units at launch.
    pub fuel: f64,
    /// kg, without propellant.
    pub dry_mass: f64,
    /// N at full throttle.
    pub max_thrust: f64,
    /// Propellant units per second at full throttle.
    pub fuel_flow: f64,
}

/// A stack of stages, listed bottom (first to burn) to top.
#[derive(Debug, Clone)]
pub struct VesselDesign {
    pub name: String,
    pub stages: Vec<StageDesign>,
    /// Drag coefficient times reference area, m².
    pub drag_area: f64,
}

impl VesselDesign {
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn validate(&self) -> Result<(), AutopilotError> {
        if self.stages.is_empty() {
            return Err(AutopilotError::InvalidParameter(format!(
                "vessel '{}' has no stages",
                self.name
            )));
        }
        if self.drag_area < 0.0 {
            return Err(AutopilotError::InvalidParameter(
                "drag area must not be negative".to_string(),
            ));
        }
        for stage in &self.stages {
            if stage.fuel < 0.0
                || stage.dry_mass <= 0.0
                || stage.max_thrust < 0.0
                || stage.fuel_flow < 0.0
            {
                return Err(AutopilotError::InvalidParameter(format!(
                    "stage '{}' has a negative or zero quantity",
                    stage.name
                )));
            }
        }
        Ok(())
    }
}

pub struct VesselFactory;

impl VesselFactory {
    /// Liquid-fuelled booster and orbital stage, enough for low Kerbin orbit
    /// with margin.
    pub fn kerbin_two_stage() -> VesselDesign {
        VesselDesign {
            name: "Kerbin Two Stage".to_string(),
            stages: vec![
                StageDesign {
                    name: "Booster".to_string(),
                    resource: Resource::LiquidFuel,
                    fuel: 3_600.0,
                    dry_mass: 3_000.0,
                    max_thrust: 400_000.0,
                    fuel_flow: 27.2,
                },
                StageDesign {
                    name: "Orbiter".to_string(),
                    resource: Resource::LiquidFuel,
                    fuel: 800.0,
                    dry_mass: 1_000.0,
                    max_thrust: 60_000.0,
                    fuel_flow: 3.6,
                },
            ],
            drag_area: 2.0,
        }
    }

    /// Solid booster under a liquid upper stage.
    pub fn solid_booster() -> VesselDesign {
        VesselDesign {
            name: "Solid Booster".to_string(),
            stages: vec![
                StageDesign {
                    name: "Solid Booster".to_string(),
                    resource: Resource::SolidFuel,
                    fuel: 1_200.0,
                    dry_mass: 1_500.0,
                    max_thrust: 250_000.0,
                    fuel_flow: 17.0,
                },
                StageDesign {
                    name: "Orbiter".to_string(),
                    resource: Resource::LiquidFuel,
                    fuel: 800.0,
                    dry_mass: 1_000.0,
                    max_thrust: 60_000.0,
                    fuel_flow: 3.6,
                },
            ],
            drag_area: 1.6,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Stage {
    pub design: StageDesign,
    pub fuel: f64,
    pub is_active: bool,
    pub jettisoned: bool,
}

impl Stage {
    pub fn new(design: StageDesign) -> Self {
        Stage {
            fuel: design.fuel,
            design,
            is_active: false,
            jettisoned: false,
        }
    }

    /// Burns for `delta_time` and returns the average thrust. Solid motors
    /// ignore the throttle once lit.
    pub fn burn(&mut self, throttle: f64, delta_time: f64) -> f64 {
        if !self.is_active || self.is_depleted() {
            return 0.0;
        }
        let throttle = match self.design.resource {
            Resource::SolidFuel => 1.0,
            Resource::LiquidFuel => throttle.clamp(0.0, 1.0),
        };
        let demand = self.design.fuel_flow * throttle * delta_time;
        if demand <= 0.0 {
            return 0.0;
        }
        let consumed = demand.min(self.fuel);
        self.fuel -= consumed;
        if self.is_depleted() {
            info!("{} burned out", self.design.name);
        }
        self.design.max_thrust * throttle * (consumed / demand)
    }

    pub fn is_depleted(&self) -> bool {
        self.fuel <= 0.0
    }

    pub fn total_mass(&self) -> f64 {
        self.design.dry_mass + self.fuel * FUEL_UNIT_MASS
    }

    pub fn resource(&self, resource: Resource) -> f64 {
        if self.jettisoned || self.design.resource != resource {
            0.0
        } else {
            self.fuel
        }
    }
}

/// Runtime state of a staged vessel.
pub struct Vehicle {
    pub name: String,
    pub aerodynamics: Aerodynamics,
    stages: Vec<Stage>,
    activations: usize,
}

impl Vehicle {
    pub fn new(design: &VesselDesign) -> Self {
        Vehicle {
            name: design.name.clone(),
            aerodynamics: Aerodynamics::new(design.drag_area),
            stages: design.stages.iter().cloned().map(Stage::new).collect(),
            activations: 0,
        }
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Number of staging events so far.
    pub fn activations(&self) -> usize {
        self.activations
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Lights the bottom stage on the first call. Each later call drops the
    /// burning stage and lights the one above it. Returns false once nothing
    /// is left to stage.
    pub fn activate_next_stage(&mut self) -> bool {
        if self.activations >= self.stages.len() {
            warn!("No stages left to activate on '{}'", self.name);
            return false;
        }
        if let Some(previous) = self.activations.checked_sub(1) {
            let spent = &mut self.stages[previous];
            spent.is_active = false;
            spent.jettisoned = true;
            info!("{} jettisoned", spent.design.name);
        }
        let next = &mut self.stages[self.activations];
        next.is_active = true;
        info!("{} ignited", next.design.name);
        self.activations += 1;
        true
    }

    pub fn burn(&mut self, throttle: f64, delta_time: f64) -> f64 {
        self.stages
            .iter_mut()
            .filter(|stage| stage.is_active)
            .map(|stage| stage.burn(throttle, delta_time))
            .sum()
    }

    pub fn total_mass(&self) -> f64 {
        self.stages
            .iter()
            .filter(|stage| !stage.jettisoned)
            .map(Stage::total_mass)
            .sum()
    }

    /// Propellant left in the stage that separates at `decouple_stage`.
    /// The bottom stage decouples last, so it has the highest number.
    pub fn resource(&self, decouple_stage: usize, resource: Resource) -> f64 {
        let count = self.stages.len();
        if decouple_stage >= count {
            return 0.0;
        }
        self.stages[count - 1 - decouple_stage].resource(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_presets_are_valid() {
        assert!(VesselFactory::kerbin_two_stage().validate().is_ok());
        assert!(VesselFactory::solid_booster().validate().is_ok());
        let empty = VesselDesign {
            name: "Empty".to_string(),
            stages: Vec::new(),
            drag_area: 1.0,
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_staging_drops_mass() {
        let mut vehicle = Vehicle::new(&VesselFactory::kerbin_two_stage());
        assert_relative_eq!(vehicle.total_mass(), 26_000.0);

        assert!(vehicle.activate_next_stage());
        assert_relative_eq!(vehicle.total_mass(), 26_000.0);

        assert!(vehicle.activate_next_stage());
        assert_relative_eq!(vehicle.total_mass(), 5_000.0);
        assert_eq!(vehicle.activations(), 2);
        assert!(vehicle.stages()[0].jettisoned);

        assert!(!vehicle.activate_next_stage());
        assert_eq!(vehicle.activations(), 2);
    }

    #[test]
    fn test_resources_by_decouple_stage() {
        let mut vehicle = Vehicle::new(&VesselFactory::kerbin_two_stage());
        assert_eq!(vehicle.resource(1, Resource::LiquidFuel), 3_600.0);
        assert_eq!(vehicle.resource(0, Resource::LiquidFuel), 800.0);
        assert_eq!(vehicle.resource(1, Resource::SolidFuel), 0.0);
        assert_eq!(vehicle.resource(2, Resource::LiquidFuel), 0.0);

        vehicle.activate_next_stage();
        vehicle.activate_next_stage();
        assert_eq!(vehicle.resource(1, Resource::LiquidFuel), 0.0);
    }

    #[test]
    fn test_burn_consumes_fuel() {
        let mut vehicle = Vehicle::new(&VesselFactory::kerbin_two_stage());
        assert_eq!(vehicle.burn(1.0, 1.0), 0.0);

        vehicle.activate_next_stage();
        assert_relative_eq!(vehicle.burn(1.0, 1.0), 400_000.0);
        assert_relative_eq!(
            vehicle.resource(1, Resource::LiquidFuel),
            3_572.8,
            epsilon = 1e-9
        );
        assert_relative_eq!(vehicle.burn(0.5, 1.0), 200_000.0);
        assert_eq!(vehicle.burn(0.0, 1.0), 0.0);
    }

    #[test]
    fn test_burnout_mid_step_scales_thrust() {
        let mut stage = Stage::new(StageDesign {
            name: "Test".to_string(),
            resource: Resource::LiquidFuel,
            fuel: 5.0,
            dry_mass: 100.0,
            max_thrust: 1_000.0,
            fuel_flow: 10.0,
        });
        stage.is_active = true;
        assert_relative_eq!(stage.burn(1.0, 1.0), 500.0);
        assert!(stage.is_depleted());
        assert_eq!(stage.burn(1.0, 1.0), 0.0);
    }

    #[test]
    fn test_solid_motor_ignores_throttle() {
        let mut vehicle = Vehicle::new(&VesselFactory::solid_booster());
        vehicle.activate_next_stage();
        assert_relative_eq!(vehicle.burn(0.0, 1.0), 250_000.0);
        assert_relative_eq!(
            vehicle.resource(1, Resource::SolidFuel),
            1_183.0,
            epsilon = 1e-9
        );
    }
}
