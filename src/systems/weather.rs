use anyhow::Result;
use glam::Vec3;
use rand::Rng;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    scenario::LightningConfig,
    world::{Weather, World},
};

// Fog bands are discrete per mode, never interpolated.
const CLEAR_FOG: (f32, f32) = (20.0, 90.0);
const RAIN_FOG: (f32, f32) = (10.0, 60.0);
const STORM_FOG: (f32, f32) = (5.0, 40.0);

/// Fog banding, rain particle recycling, and the lightning flash process.
pub struct WeatherSystem {
    config: LightningConfig,
}

impl WeatherSystem {
    pub fn new(config: LightningConfig) -> Self {
        Self { config }
    }
}

impl Default for WeatherSystem {
    fn default() -> Self {
        Self::new(LightningConfig::default())
    }
}

impl System for WeatherSystem {
    fn name(&self) -> &str {
        "weather"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let weather = world.environment.weather;

        let (near, far) = match weather {
            Weather::Clear => CLEAR_FOG,
            Weather::Rain => RAIN_FOG,
            Weather::Storm => STORM_FOG,
        };
        world.fog.near = near;
        world.fog.far = far;

        world.rain.visible = weather != Weather::Clear;
        if world.rain.visible {
            let fall = world.rain.fall_speed * ctx.dt_secs;
            let ceiling = world.rain.ceiling;
            for drop in world.rain.positions.iter_mut() {
                drop.y -= fall;
                if drop.y < 0.0 {
                    drop.y = ceiling;
                }
            }
        }

        // Flashes only strike during a storm; the decay keeps running in
        // every mode so a flash left over from a storm fades out instead of
        // freezing.
        if weather == Weather::Storm && rng.gen::<f32>() < self.config.flash_probability {
            world.lightning.intensity = self.config.flash_intensity;
            world.lightning.position = Vec3::new(
                (rng.gen::<f32>() - 0.5) * 2.0 * self.config.spread,
                self.config.height,
                (rng.gen::<f32>() - 0.5) * 2.0 * self.config.spread,
            );
        } else {
            world.lightning.intensity *= self.config.decay;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::RngManager;
    use rand::SeedableRng;

    fn tick(world: &mut World, system: &mut WeatherSystem, rng: &mut RngManager) {
        let ctx = SystemContext {
            tick: world.tick(),
            dt_secs: world.dt_secs(),
            elapsed_secs: world.elapsed_secs(),
            scenario_name: "test",
        };
        system.run(&ctx, world, &mut rng.stream("weather")).unwrap();
        world.advance_time();
    }

    #[test]
    fn fog_band_follows_mode() {
        let mut world = World::new(1.0 / 60.0);
        let mut system = WeatherSystem::default();
        let mut rng = RngManager::new(5);

        tick(&mut world, &mut system, &mut rng);
        assert_eq!((world.fog().near, world.fog().far), (20.0, 90.0));
        assert!(!world.rain().visible());

        world.set_weather(Weather::Rain);
        tick(&mut world, &mut system, &mut rng);
        assert_eq!((world.fog().near, world.fog().far), (10.0, 60.0));
        assert!(world.rain().visible());

        world.set_weather(Weather::Storm);
        tick(&mut world, &mut system, &mut rng);
        assert_eq!((world.fog().near, world.fog().far), (5.0, 40.0));
        assert!(world.rain().visible());
    }

    #[test]
    fn rain_recycles_inside_bounds() {
        let mut world = World::new(1.0 / 60.0);
        let mut seed_rng = rand_chacha::ChaCha8Rng::seed_from_u64(2);
        world.seed_rain(64, 40.0, 40.0, 25.0, &mut seed_rng);
        world.set_weather(Weather::Rain);

        let mut system = WeatherSystem::default();
        let mut rng = RngManager::new(2);
        for _ in 0..500 {
            tick(&mut world, &mut system, &mut rng);
            for drop in world.rain().positions() {
                assert!(drop.y >= 0.0 && drop.y <= world.rain().ceiling());
            }
        }
    }

    #[test]
    fn forced_flash_resets_intensity_and_relocates() {
        let mut world = World::new(1.0 / 60.0);
        world.set_weather(Weather::Storm);
        let mut system = WeatherSystem::new(LightningConfig {
            flash_probability: 1.0,
            ..LightningConfig::default()
        });
        let mut rng = RngManager::new(9);

        tick(&mut world, &mut system, &mut rng);
        assert_eq!(world.lightning().intensity, 15.0);
        assert_eq!(world.lightning().position.y, 25.0);
        assert!(world.lightning().position.x.abs() <= 25.0);
        assert!(world.lightning().position.z.abs() <= 25.0);
    }

    #[test]
    fn intensity_decays_monotonically_between_flashes() {
        let mut world = World::new(1.0 / 60.0);
        world.set_weather(Weather::Storm);

        // One guaranteed strike, then a system that never strikes again.
        let mut striking = WeatherSystem::new(LightningConfig {
            flash_probability: 1.0,
            ..LightningConfig::default()
        });
        let mut rng = RngManager::new(4);
        tick(&mut world, &mut striking, &mut rng);
        assert_eq!(world.lightning().intensity, 15.0);

        let mut quiet = WeatherSystem::new(LightningConfig {
            flash_probability: 0.0,
            ..LightningConfig::default()
        });
        let mut previous = world.lightning().intensity;
        for _ in 0..40 {
            tick(&mut world, &mut quiet, &mut rng);
            let current = world.lightning().intensity;
            assert!(current >= 0.0);
            assert!(current < previous);
            previous = current;
        }
    }

    #[test]
    fn leftover_flash_keeps_fading_after_storm_ends() {
        let mut world = World::new(1.0 / 60.0);
        world.set_weather(Weather::Storm);
        let mut system = WeatherSystem::new(LightningConfig {
            flash_probability: 1.0,
            ..LightningConfig::default()
        });
        let mut rng = RngManager::new(6);
        tick(&mut world, &mut system, &mut rng);
        let at_storm_end = world.lightning().intensity;

        world.set_weather(Weather::Clear);
        tick(&mut world, &mut system, &mut rng);
        let after = world.lightning().intensity;
        assert!(after < at_storm_end);
        assert_eq!(after, at_storm_end * 0.8);
    }
}
