use ascent_autopilot::*;
use clap::{Parser, ValueEnum};
use log::info;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Preset {
    TwoStage,
    SolidBooster,
}

impl Preset {
    fn design(self) -> VesselDesign {
        match self {
            Preset::TwoStage => VesselFactory::kerbin_two_stage(),
            Preset::SolidBooster => VesselFactory::solid_booster(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "autopilot")]
#[command(about = "Flies a vessel from the launch pad to a circular orbit")]
#[command(version)]
struct Args {
    /// Vessel to fly on the simulated host
    #[arg(long, value_enum, default_value = "two-stage")]
    vessel: Preset,

    /// Decouple stages to track propellant for
    #[arg(long, default_value_t = constants::DEFAULT_STAGE_COUNT)]
    stages: usize,

    /// Relative telemetry noise, e.g. 0.001
    #[arg(long)]
    noise: Option<f64>,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    // launch profile
    #[arg(long)]
    alt_max: Option<f64>,

    #[arg(long)]
    apo_max: Option<f64>,

    #[arg(long)]
    turn_max: Option<f64>,

    #[arg(long)]
    init_speed_max: Option<f64>,

    #[arg(long)]
    termv_accel: Option<f64>,

    #[arg(long)]
    termv_decel: Option<f64>,

    #[arg(long)]
    termv_min_throttle: Option<f64>,

    /// Fixed apoapsis lead in metres instead of the shrinking one
    #[arg(long)]
    follow_apo_dist: Option<f64>,

    #[arg(long)]
    circularize_seconds: Option<f64>,

    #[arg(long)]
    no_autostage: bool,

    /// Give up on a phase after this many control ticks
    #[arg(long)]
    max_phase_ticks: Option<u64>,
}

impl Args {
    fn launch_parameters(&self) -> LaunchParameters {
        let defaults = LaunchParameters::default();
        LaunchParameters {
            alt_max: self.alt_max.unwrap_or(defaults.alt_max),
            apo_max: self.apo_max.unwrap_or(defaults.apo_max),
            turn_max: self.turn_max.unwrap_or(defaults.turn_max),
            init_speed_max: self.init_speed_max.unwrap_or(defaults.init_speed_max),
            termv_accel: self.termv_accel.unwrap_or(defaults.termv_accel),
            termv_decel: self.termv_decel.unwrap_or(defaults.termv_decel),
            termv_min_throttle: self.termv_min_throttle.unwrap_or(defaults.termv_min_throttle),
            follow_apo_dist: self.follow_apo_dist,
            circularize_seconds: self
                .circularize_seconds
                .unwrap_or(defaults.circularize_seconds),
            autostage: !self.no_autostage,
            max_phase_ticks: self.max_phase_ticks,
            ..defaults
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();
    let params = args.launch_parameters();
    let noise = args.noise.map(|amplitude| TelemetryNoise {
        seed: args.seed,
        amplitude,
    });

    let mut host = SimulatedHost::new(&args.vessel.design(), noise)?;
    let mut vessel = VesselController::new(host.active_vessel()?, args.stages)?;
    info!("Launching '{}'", vessel.name());

    let report = vessel.launch(&params)?;

    println!("Phase                Ticks  Condition");
    for (phase, outcome) in &report.phases {
        println!(
            "{:<20} {:>6}  {} = {:.1}",
            phase.to_string(),
            outcome.ticks,
            outcome.condition,
            outcome.value
        );
    }
    println!("Apoapsis:   {:>10.0} m", report.apoapsis);
    println!("Periapsis:  {:>10.0} m", report.periapsis);
    let orbit = host.orbit();
    println!("Eccentricity: {:>8.4}", orbit.eccentricity);
    if let Some(period) = orbit.period(constants::BODY_GRAVITATIONAL_PARAMETER) {
        println!("Period:     {:>10.0} s", period);
    }
    println!("Final stage: {}", report.final_stage);
    println!("Mission time: {:.1} s", host.time());

    Ok(())
}
