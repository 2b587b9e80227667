use anyhow::Result;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    scenario::DayNightConfig,
    world::{Rgb, Weather, World},
};

// Sky palette.
const DAY_SKY: Rgb = Rgb::new(0.529, 0.808, 0.922); // #87ceeb
const NIGHT_SKY: Rgb = Rgb::new(0.0, 0.031, 0.078); // #000814
const STORM_SKY: Rgb = Rgb::new(0.165, 0.184, 0.220); // #2a2f38

const HEMISPHERE_DAY: f32 = 0.6;
const DIRECTIONAL_DAY: f32 = 1.2;
const AMBIENT_DAY: f32 = 0.4;
const HEMISPHERE_STORM: f32 = 0.1;
const DIRECTIONAL_STORM: f32 = 0.15;

const SWAY_Z_AMPLITUDE: f32 = 0.05;
const SWAY_X_AMPLITUDE: f32 = 0.03;
const SWAY_DECAY: f32 = 0.9;

/// Day/night blend, sky and fog color, light rig intensities, actor
/// visibility, and storm wind on the trees.
pub struct EnvironmentSystem {
    config: DayNightConfig,
}

impl EnvironmentSystem {
    pub fn new(config: DayNightConfig) -> Self {
        Self { config }
    }
}

impl Default for EnvironmentSystem {
    fn default() -> Self {
        Self::new(DayNightConfig::default())
    }
}

impl System for EnvironmentSystem {
    fn name(&self) -> &str {
        "environment"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let target = if world.environment.is_day { 1.0 } else { 0.0 };
        world.environment.day_transition +=
            (target - world.environment.day_transition) * self.config.transition_rate;

        let is_day = world.environment.is_day;
        let weather = world.environment.weather;
        let blend = world.environment.day_transition;
        let storm = weather == Weather::Storm;

        // Colors snap between palettes; only intensities follow the blend.
        let sky = if storm {
            STORM_SKY
        } else if is_day {
            DAY_SKY
        } else {
            NIGHT_SKY
        };
        world.sky = sky;
        world.fog.color = sky;

        world.lights.hemisphere = if storm {
            HEMISPHERE_STORM
        } else {
            HEMISPHERE_DAY * blend
        };
        world.lights.directional = if storm {
            DIRECTIONAL_STORM
        } else {
            DIRECTIONAL_DAY * blend
        };
        // Ambient ignores storm mode.
        world.lights.ambient = AMBIENT_DAY * blend;

        world.visibility.sun = is_day && !storm;
        world.visibility.moon = !is_day && !storm;
        world.visibility.night_sky = !is_day;
        world.visibility.characters = weather == Weather::Clear;

        for (index, tree) in world.trees.iter_mut().enumerate() {
            if storm {
                tree.sway_z = (ctx.elapsed_secs * 2.0 + index as f32).sin() * SWAY_Z_AMPLITUDE;
                tree.sway_x = (ctx.elapsed_secs * 1.5 + index as f32).cos() * SWAY_X_AMPLITUDE;
            } else {
                tree.sway_z *= SWAY_DECAY;
                tree.sway_x *= SWAY_DECAY;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::RngManager;

    fn run_ticks(world: &mut World, system: &mut EnvironmentSystem, ticks: u64) {
        let mut rng = RngManager::new(1);
        for _ in 0..ticks {
            let ctx = SystemContext {
                tick: world.tick(),
                dt_secs: world.dt_secs(),
                elapsed_secs: world.elapsed_secs(),
                scenario_name: "test",
            };
            system.run(&ctx, world, &mut rng.stream("environment")).unwrap();
            world.advance_time();
        }
    }

    #[test]
    fn transition_approaches_night_without_overshoot() {
        let mut world = World::new(1.0 / 60.0);
        let mut system = EnvironmentSystem::default();
        world.set_day(false);

        let mut previous = world.environment().day_transition;
        for _ in 0..400 {
            run_ticks(&mut world, &mut system, 1);
            let current = world.environment().day_transition;
            assert!((0.0..=1.0).contains(&current));
            assert!(current <= previous);
            previous = current;
        }
        assert!(previous < 0.01);
    }

    #[test]
    fn storm_forces_dim_lights_but_not_ambient() {
        let mut world = World::new(1.0 / 60.0);
        let mut system = EnvironmentSystem::default();
        world.set_weather(Weather::Storm);
        run_ticks(&mut world, &mut system, 1);

        assert_eq!(world.lights().hemisphere, 0.1);
        assert_eq!(world.lights().directional, 0.15);
        let blend = world.environment().day_transition;
        assert_eq!(world.lights().ambient, 0.4 * blend);
        assert!(!world.visibility().sun);
        assert!(!world.visibility().moon);
        assert!(!world.visibility().characters);
    }

    #[test]
    fn storm_sky_wins_over_day_night() {
        let mut world = World::new(1.0 / 60.0);
        let mut system = EnvironmentSystem::default();
        world.set_weather(Weather::Storm);
        run_ticks(&mut world, &mut system, 1);
        assert_eq!(world.sky(), STORM_SKY);

        world.set_day(false);
        run_ticks(&mut world, &mut system, 1);
        assert_eq!(world.sky(), STORM_SKY);

        world.set_weather(Weather::Clear);
        run_ticks(&mut world, &mut system, 1);
        assert_eq!(world.sky(), NIGHT_SKY);
    }

    #[test]
    fn trees_sway_in_storm_and_settle_after() {
        let mut world = World::new(1.0 / 60.0);
        world.add_tree(glam::Vec3::new(-22.0, 0.0, 20.0));
        let mut system = EnvironmentSystem::default();

        world.set_weather(Weather::Storm);
        run_ticks(&mut world, &mut system, 30);
        let swaying = world.trees()[0].sway_z.abs() + world.trees()[0].sway_x.abs();
        assert!(swaying > 0.0);

        world.set_weather(Weather::Clear);
        run_ticks(&mut world, &mut system, 200);
        assert!(world.trees()[0].sway_z.abs() < 1e-4);
        assert!(world.trees()[0].sway_x.abs() < 1e-4);
    }
}
