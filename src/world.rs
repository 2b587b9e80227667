use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::rng::SystemRng;

/// Weather mode for the whole scene. Mutated only through commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weather {
    Clear,
    Rain,
    Storm,
}

/// Linear RGB color in [0,1] channels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

#[derive(Debug, Clone)]
pub struct Environment {
    pub is_day: bool,
    pub weather: Weather,
    /// Blend between night (0) and day (1). Advanced once per tick by the
    /// environment system, never set directly.
    pub day_transition: f32,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            is_day: true,
            weather: Weather::Clear,
            day_transition: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Fog {
    pub color: Rgb,
    pub near: f32,
    pub far: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LightRig {
    pub hemisphere: f32,
    pub directional: f32,
    pub ambient: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Visibility {
    pub sun: bool,
    pub moon: bool,
    pub night_sky: bool,
    pub characters: bool,
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            sun: true,
            moon: false,
            night_sky: false,
            characters: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Lightning {
    pub intensity: f32,
    pub position: Vec3,
}

impl Default for Lightning {
    fn default() -> Self {
        Self {
            intensity: 0.0,
            position: Vec3::new(0.0, 30.0, 0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(u32);

impl AgentId {
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// A walker following the waypoint loop.
#[derive(Debug, Clone, Serialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub position: Vec3,
    /// Smoothed yaw in radians.
    pub heading: f32,
    /// Smoothed movement direction, unit-ish.
    pub velocity: Vec3,
    /// Fixed for the agent's lifetime, randomized at admission.
    pub speed: f32,
    /// Always a valid index into the waypoint loop while the loop is
    /// non-empty.
    pub waypoint: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Tree {
    pub position: Vec3,
    pub sway_x: f32,
    pub sway_z: f32,
}

/// Static character or animal actor. Only the shared characters-visible flag
/// affects it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bystander {
    pub name: String,
    pub position: Vec3,
    #[serde(default)]
    pub yaw: f32,
}

/// Fixed-size recycled rain field. `x`/`z` never change after seeding.
#[derive(Debug, Clone)]
pub struct RainField {
    pub(crate) visible: bool,
    pub(crate) fall_speed: f32,
    pub(crate) ceiling: f32,
    pub(crate) positions: Vec<Vec3>,
}

impl RainField {
    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn ceiling(&self) -> f32 {
        self.ceiling
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ScheduledWalker {
    pub name: String,
    pub arrives_tick: u64,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct SpawnParams {
    pub speed_min: f32,
    pub speed_max: f32,
}

pub struct World {
    tick: u64,
    elapsed_secs: f32,
    dt_secs: f32,
    pub(crate) environment: Environment,
    pub(crate) sky: Rgb,
    pub(crate) fog: Fog,
    pub(crate) lights: LightRig,
    pub(crate) visibility: Visibility,
    pub(crate) lightning: Lightning,
    pub(crate) rain: RainField,
    pub(crate) agents: Vec<Agent>,
    pub(crate) trees: Vec<Tree>,
    pub(crate) bystanders: Vec<Bystander>,
    route: Vec<Vec3>,
    static_obstacles: Vec<Vec3>,
    fountain: Option<Vec3>,
    arrivals: Vec<ScheduledWalker>,
    spawn: SpawnParams,
    next_agent: u32,
}

impl World {
    pub fn new(dt_secs: f32) -> Self {
        let clear_sky = Rgb::new(0.529, 0.808, 0.922);
        Self {
            tick: 0,
            elapsed_secs: 0.0,
            dt_secs,
            environment: Environment::default(),
            sky: clear_sky,
            fog: Fog {
                color: clear_sky,
                near: 20.0,
                far: 90.0,
            },
            lights: LightRig::default(),
            visibility: Visibility::default(),
            lightning: Lightning::default(),
            rain: RainField {
                visible: false,
                fall_speed: 25.0,
                ceiling: 40.0,
                positions: Vec::new(),
            },
            agents: Vec::new(),
            trees: Vec::new(),
            bystanders: Vec::new(),
            route: Vec::new(),
            static_obstacles: Vec::new(),
            fountain: None,
            arrivals: Vec::new(),
            spawn: SpawnParams {
                speed_min: 2.0,
                speed_max: 3.0,
            },
            next_agent: 0,
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn dt_secs(&self) -> f32 {
        self.dt_secs
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed_secs
    }

    pub fn advance_time(&mut self) {
        self.tick += 1;
        self.elapsed_secs += self.dt_secs;
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn sky(&self) -> Rgb {
        self.sky
    }

    pub fn fog(&self) -> &Fog {
        &self.fog
    }

    pub fn lights(&self) -> &LightRig {
        &self.lights
    }

    pub fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    pub fn lightning(&self) -> &Lightning {
        &self.lightning
    }

    pub fn rain(&self) -> &RainField {
        &self.rain
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn bystanders(&self) -> &[Bystander] {
        &self.bystanders
    }

    pub fn route(&self) -> &[Vec3] {
        &self.route
    }

    pub fn set_day(&mut self, is_day: bool) {
        self.environment.is_day = is_day;
        // The night sky flips immediately; everything else follows the blend.
        self.visibility.night_sky = !is_day;
    }

    pub fn set_weather(&mut self, weather: Weather) {
        self.environment.weather = weather;
    }

    pub fn set_route(&mut self, route: Vec<Vec3>) {
        self.route = route;
    }

    pub fn add_obstacle(&mut self, position: Vec3) {
        self.static_obstacles.push(position);
    }

    pub fn set_fountain(&mut self, center: Vec3) {
        self.fountain = Some(center);
    }

    pub fn add_tree(&mut self, position: Vec3) {
        self.trees.push(Tree {
            position,
            sway_x: 0.0,
            sway_z: 0.0,
        });
    }

    pub fn add_bystander(&mut self, bystander: Bystander) {
        self.bystanders.push(bystander);
    }

    pub fn set_spawn_speed(&mut self, speed_min: f32, speed_max: f32) {
        self.spawn = SpawnParams {
            speed_min,
            speed_max,
        };
    }

    pub fn schedule_walker(&mut self, name: &str, arrives_tick: u64) {
        self.arrivals.push(ScheduledWalker {
            name: name.to_string(),
            arrives_tick,
        });
    }

    pub fn seed_rain(
        &mut self,
        count: usize,
        area_half_extent: f32,
        ceiling: f32,
        fall_speed: f32,
        rng: &mut impl Rng,
    ) {
        let mut positions = Vec::with_capacity(count);
        for _ in 0..count {
            positions.push(Vec3::new(
                (rng.gen::<f32>() - 0.5) * 2.0 * area_half_extent,
                rng.gen::<f32>() * ceiling,
                (rng.gen::<f32>() - 0.5) * 2.0 * area_half_extent,
            ));
        }
        self.rain = RainField {
            visible: false,
            fall_speed,
            ceiling,
            positions,
        };
    }

    /// Admit a walker into the live update set. Shared by scheduled arrivals
    /// and spawn commands.
    pub fn spawn_walker(&mut self, name: String, rng: &mut SystemRng<'_>) -> AgentId {
        let id = AgentId(self.next_agent);
        self.next_agent += 1;
        let span = self.spawn.speed_max - self.spawn.speed_min;
        let speed = self.spawn.speed_min + span * rng.gen::<f32>();
        let waypoint = if self.route.is_empty() {
            0
        } else {
            rng.gen_range(0..self.route.len())
        };
        self.agents.push(Agent {
            id,
            name,
            position: Vec3::ZERO,
            heading: 0.0,
            velocity: Vec3::ZERO,
            speed,
            waypoint,
        });
        id
    }

    pub(crate) fn admit_due_walkers(&mut self, tick: u64, rng: &mut SystemRng<'_>) {
        let mut index = 0;
        while index < self.arrivals.len() {
            if self.arrivals[index].arrives_tick <= tick {
                let walker = self.arrivals.remove(index);
                self.spawn_walker(walker.name, rng);
            } else {
                index += 1;
            }
        }
    }

    /// Gather the live obstacle field: static benches and lamps, current tree
    /// positions, and the fountain center. Trees never move, so collecting
    /// fresh each tick is redundant but cheap.
    pub(crate) fn collect_obstacles(&self, out: &mut Vec<Vec3>) {
        out.clear();
        out.extend_from_slice(&self.static_obstacles);
        out.extend(self.trees.iter().map(|tree| tree.position));
        if let Some(fountain) = self.fountain {
            out.push(fountain);
        }
    }

    pub(crate) fn steering_mut(&mut self) -> (&mut [Agent], &[Vec3]) {
        (&mut self.agents, &self.route)
    }

    pub fn frame(&self) -> RenderFrame {
        RenderFrame {
            tick: self.tick,
            elapsed_secs: self.elapsed_secs,
            is_day: self.environment.is_day,
            day_transition: self.environment.day_transition,
            weather: self.environment.weather,
            sky: self.sky,
            fog: self.fog,
            lights: self.lights,
            lightning: self.lightning.clone(),
            visibility: self.visibility,
            agents: self
                .agents
                .iter()
                .map(|agent| AgentFrame {
                    id: agent.id,
                    name: agent.name.clone(),
                    position: agent.position,
                    yaw: agent.heading,
                })
                .collect(),
            trees: self.trees.clone(),
            bystanders: self.bystanders.clone(),
            rain: RainFrame {
                visible: self.rain.visible,
                positions: self.rain.positions.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentFrame {
    pub id: AgentId,
    pub name: String,
    pub position: Vec3,
    pub yaw: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RainFrame {
    pub visible: bool,
    pub positions: Vec<Vec3>,
}

/// Everything the rendering collaborator needs for one tick.
#[derive(Debug, Clone, Serialize)]
pub struct RenderFrame {
    pub tick: u64,
    pub elapsed_secs: f32,
    pub is_day: bool,
    pub day_transition: f32,
    pub weather: Weather,
    pub sky: Rgb,
    pub fog: Fog,
    pub lights: LightRig,
    pub lightning: Lightning,
    pub visibility: Visibility,
    pub agents: Vec<AgentFrame>,
    pub trees: Vec<Tree>,
    pub bystanders: Vec<Bystander>,
    pub rain: RainFrame,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::RngManager;

    #[test]
    fn obstacle_field_combines_all_groups() {
        let mut world = World::new(1.0);
        world.add_obstacle(Vec3::new(7.0, 0.0, -5.0));
        world.add_obstacle(Vec3::new(8.0, 0.0, 6.0));
        world.add_tree(Vec3::new(-22.0, 0.0, 20.0));
        world.set_fountain(Vec3::ZERO);

        let mut field = Vec::new();
        world.collect_obstacles(&mut field);
        assert_eq!(field.len(), 4);
        assert_eq!(field[2], Vec3::new(-22.0, 0.0, 20.0));
        assert_eq!(field[3], Vec3::ZERO);
    }

    #[test]
    fn scheduled_walkers_arrive_on_time() {
        let mut world = World::new(1.0);
        world.set_route(vec![Vec3::new(0.0, 0.0, -7.0)]);
        world.schedule_walker("early", 0);
        world.schedule_walker("late", 5);

        let mut rng = RngManager::new(11);
        world.admit_due_walkers(0, &mut rng.stream("spawn"));
        assert_eq!(world.agents().len(), 1);
        assert_eq!(world.agents()[0].name, "early");

        world.admit_due_walkers(4, &mut rng.stream("spawn"));
        assert_eq!(world.agents().len(), 1);

        world.admit_due_walkers(5, &mut rng.stream("spawn"));
        assert_eq!(world.agents().len(), 2);
    }

    #[test]
    fn spawned_walker_speed_is_in_range() {
        let mut world = World::new(1.0);
        world.set_route(vec![Vec3::ZERO, Vec3::new(10.0, 0.0, -4.0)]);
        let mut rng = RngManager::new(3);
        for index in 0..16 {
            let id = world.spawn_walker(format!("walker_{index}"), &mut rng.stream("spawn"));
            assert_eq!(id.raw(), index);
        }
        for agent in world.agents() {
            assert!(agent.speed >= 2.0 && agent.speed < 3.0);
            assert!(agent.waypoint < world.route().len());
        }
    }
}
