use std::{
    fs,
    path::{Path, PathBuf},
};

use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use thiserror::Error;

use crate::world::{Bystander, World};

fn default_dt_secs() -> f32 {
    1.0 / 60.0
}

fn default_snapshot_interval() -> u64 {
    0
}

fn default_snapshot_dir() -> String {
    "snapshots".to_string()
}

fn default_rain_count() -> usize {
    4000
}

fn default_rain_area() -> f32 {
    40.0
}

fn default_rain_ceiling() -> f32 {
    40.0
}

fn default_rain_fall_speed() -> f32 {
    25.0
}

fn default_flash_probability() -> f32 {
    0.02
}

fn default_flash_intensity() -> f32 {
    15.0
}

fn default_flash_decay() -> f32 {
    0.8
}

fn default_flash_spread() -> f32 {
    25.0
}

fn default_flash_height() -> f32 {
    25.0
}

fn default_safe_radius() -> f32 {
    2.8
}

fn default_push_strength() -> f32 {
    1.5
}

fn default_arrival_radius() -> f32 {
    1.2
}

fn default_velocity_smoothing() -> f32 {
    0.08
}

fn default_yaw_smoothing() -> f32 {
    0.15
}

fn default_speed_min() -> f32 {
    2.0
}

fn default_speed_max() -> f32 {
    3.0
}

fn default_transition_rate() -> f32 {
    0.02
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default = "default_dt_secs")]
    pub dt_secs: f32,
    #[serde(default)]
    pub ticks: Option<u64>,
    #[serde(default)]
    pub snapshot: SnapshotSection,
    /// Closed waypoint loop shared by every walker. May be empty; walkers
    /// then simply hold still.
    #[serde(default)]
    pub route: Vec<Vec3>,
    #[serde(default)]
    pub benches: Vec<Vec3>,
    #[serde(default)]
    pub lamps: Vec<Vec3>,
    #[serde(default)]
    pub fountain: Option<Vec3>,
    #[serde(default)]
    pub trees: Vec<Vec3>,
    #[serde(default)]
    pub bystanders: Vec<Bystander>,
    #[serde(default)]
    pub walkers: Vec<WalkerSpec>,
    #[serde(default)]
    pub rain: RainConfig,
    #[serde(default)]
    pub lightning: LightningConfig,
    #[serde(default)]
    pub steering: SteeringConfig,
    #[serde(default)]
    pub day_night: DayNightConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotSection {
    #[serde(default = "default_snapshot_interval")]
    pub interval: u64,
    #[serde(default = "default_snapshot_dir")]
    pub output_dir: String,
}

impl Default for SnapshotSection {
    fn default() -> Self {
        Self {
            interval: default_snapshot_interval(),
            output_dir: default_snapshot_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalkerSpec {
    pub name: String,
    /// Tick at which the walker's model finishes loading and it joins the
    /// live update set.
    #[serde(default)]
    pub arrives_tick: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RainConfig {
    #[serde(default = "default_rain_count")]
    pub count: usize,
    #[serde(default = "default_rain_area")]
    pub area_half_extent: f32,
    #[serde(default = "default_rain_ceiling")]
    pub ceiling: f32,
    #[serde(default = "default_rain_fall_speed")]
    pub fall_speed: f32,
}

impl Default for RainConfig {
    fn default() -> Self {
        Self {
            count: default_rain_count(),
            area_half_extent: default_rain_area(),
            ceiling: default_rain_ceiling(),
            fall_speed: default_rain_fall_speed(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LightningConfig {
    #[serde(default = "default_flash_probability")]
    pub flash_probability: f32,
    #[serde(default = "default_flash_intensity")]
    pub flash_intensity: f32,
    #[serde(default = "default_flash_decay")]
    pub decay: f32,
    /// Half-extent of the square on the ceiling plane a flash relocates to.
    #[serde(default = "default_flash_spread")]
    pub spread: f32,
    #[serde(default = "default_flash_height")]
    pub height: f32,
}

impl Default for LightningConfig {
    fn default() -> Self {
        Self {
            flash_probability: default_flash_probability(),
            flash_intensity: default_flash_intensity(),
            decay: default_flash_decay(),
            spread: default_flash_spread(),
            height: default_flash_height(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SteeringConfig {
    #[serde(default = "default_safe_radius")]
    pub safe_radius: f32,
    #[serde(default = "default_push_strength")]
    pub push_strength: f32,
    #[serde(default = "default_arrival_radius")]
    pub arrival_radius: f32,
    #[serde(default = "default_velocity_smoothing")]
    pub velocity_smoothing: f32,
    #[serde(default = "default_yaw_smoothing")]
    pub yaw_smoothing: f32,
    #[serde(default = "default_speed_min")]
    pub speed_min: f32,
    #[serde(default = "default_speed_max")]
    pub speed_max: f32,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            safe_radius: default_safe_radius(),
            push_strength: default_push_strength(),
            arrival_radius: default_arrival_radius(),
            velocity_smoothing: default_velocity_smoothing(),
            yaw_smoothing: default_yaw_smoothing(),
            speed_min: default_speed_min(),
            speed_max: default_speed_max(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DayNightConfig {
    /// Per-tick approach factor toward the day/night target. Deliberately
    /// not scaled by delta time.
    #[serde(default = "default_transition_rate")]
    pub transition_rate: f32,
}

impl Default for DayNightConfig {
    fn default() -> Self {
        Self {
            transition_rate: default_transition_rate(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read scenario file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scenario: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid scenario: {0}")]
    Validation(String),
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario, ScenarioError> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path).map_err(|source| ScenarioError::Io {
            path: path.clone(),
            source,
        })?;
        Scenario::from_yaml(&data)
    }
}

impl Scenario {
    pub fn from_yaml(text: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = serde_yaml::from_str(text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        let steering = &self.steering;
        if steering.speed_max < steering.speed_min {
            return Err(ScenarioError::Validation(format!(
                "walker speed range is inverted ({} > {})",
                steering.speed_min, steering.speed_max
            )));
        }
        for (label, value) in [
            ("velocity_smoothing", steering.velocity_smoothing),
            ("yaw_smoothing", steering.yaw_smoothing),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ScenarioError::Validation(format!(
                    "steering {label} must be in (0, 1], got {value}"
                )));
            }
        }
        if !(steering.safe_radius > 0.0) {
            return Err(ScenarioError::Validation(
                "steering safe_radius must be positive".to_string(),
            ));
        }
        if !(steering.arrival_radius > 0.0) {
            return Err(ScenarioError::Validation(
                "steering arrival_radius must be positive".to_string(),
            ));
        }
        let rate = self.day_night.transition_rate;
        if !(rate > 0.0 && rate < 1.0) {
            return Err(ScenarioError::Validation(format!(
                "day_night transition_rate must be in (0, 1), got {rate}"
            )));
        }
        let decay = self.lightning.decay;
        if !(decay >= 0.0 && decay <= 1.0) {
            return Err(ScenarioError::Validation(format!(
                "lightning decay must be in [0, 1], got {decay}"
            )));
        }
        Ok(())
    }

    pub fn build_world(&self) -> World {
        let mut world = World::new(self.dt_secs);
        world.set_route(self.route.clone());
        for &bench in &self.benches {
            world.add_obstacle(bench);
        }
        for &lamp in &self.lamps {
            world.add_obstacle(lamp);
        }
        if let Some(fountain) = self.fountain {
            world.set_fountain(fountain);
        }
        for &tree in &self.trees {
            world.add_tree(tree);
        }
        for bystander in &self.bystanders {
            world.add_bystander(bystander.clone());
        }
        for walker in &self.walkers {
            world.schedule_walker(&walker.name, walker.arrives_tick);
        }
        world.set_spawn_speed(self.steering.speed_min, self.steering.speed_max);

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        world.seed_rain(
            self.rain.count,
            self.rain.area_half_extent,
            self.rain.ceiling,
            self.rain.fall_speed,
            &mut rng,
        );
        world
    }

    pub fn ticks(&self, override_ticks: Option<u64>) -> u64 {
        override_ticks.or(self.ticks).unwrap_or(600)
    }
}
