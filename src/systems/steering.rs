use anyhow::Result;
use glam::Vec3;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    scenario::SteeringConfig,
    world::{Agent, World},
};

/// Waypoint seeking blended with obstacle repulsion for every live walker.
pub struct SteeringSystem {
    config: SteeringConfig,
    obstacle_scratch: Vec<Vec3>,
}

impl SteeringSystem {
    pub fn new(config: SteeringConfig) -> Self {
        Self {
            config,
            obstacle_scratch: Vec::new(),
        }
    }
}

impl Default for SteeringSystem {
    fn default() -> Self {
        Self::new(SteeringConfig::default())
    }
}

impl System for SteeringSystem {
    fn name(&self) -> &str {
        "steering"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        world.collect_obstacles(&mut self.obstacle_scratch);
        let (agents, route) = world.steering_mut();
        for agent in agents.iter_mut() {
            advance_agent(
                agent,
                route,
                &self.obstacle_scratch,
                &self.config,
                ctx.dt_secs,
            );
        }
        Ok(())
    }
}

/// Advance one walker by one tick. With an empty route the walker is left
/// untouched. A zero-length combined direction holds the previous velocity
/// instead of producing NaN.
pub(crate) fn advance_agent(
    agent: &mut Agent,
    route: &[Vec3],
    obstacles: &[Vec3],
    config: &SteeringConfig,
    dt_secs: f32,
) {
    if route.is_empty() {
        return;
    }
    let target = route[agent.waypoint];

    let desired = (target - agent.position).normalize_or_zero();

    let mut avoidance = Vec3::ZERO;
    for &obstacle in obstacles {
        let offset = agent.position - obstacle;
        let distance = offset.length();
        // Coincident obstacles have no meaningful push direction.
        if distance <= f32::EPSILON || distance >= config.safe_radius {
            continue;
        }
        let strength = (config.safe_radius - distance) / config.safe_radius;
        avoidance += (offset / distance) * (strength * config.push_strength);
    }

    let combined = desired + avoidance;
    let move_direction = if combined.length_squared() > f32::EPSILON {
        combined / combined.length()
    } else {
        agent.velocity
    };

    agent.velocity = agent.velocity.lerp(move_direction, config.velocity_smoothing);
    agent.position += agent.velocity * (agent.speed * dt_secs);

    let target_yaw = agent.velocity.x.atan2(agent.velocity.z);
    agent.heading += (target_yaw - agent.heading) * config.yaw_smoothing;

    if agent.position.distance(target) < config.arrival_radius {
        agent.waypoint = (agent.waypoint + 1) % route.len();
    }
}
