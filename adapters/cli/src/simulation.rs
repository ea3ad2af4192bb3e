//! Headless driver wiring the world to the movement and builder systems.

use std::time::Duration;

use anyhow::{bail, Result};
use skirmish_core::{AgentId, Command, Event};
use skirmish_system_builder::Builder;
use skirmish_system_movement::{Movement, MovementConfig};
use skirmish_world::{self as world, query, Grid, World};
use tracing::{debug, info, warn};

use crate::config::SimulationConfig;

pub(crate) struct Simulation {
    world: World,
    movement: Movement,
    builder: Builder,
    agents: Vec<AgentId>,
}

impl Simulation {
    /// Generates the grid, places structures and registers agents.
    pub(crate) fn new(config: &SimulationConfig) -> Result<Self> {
        let mut simulation = Self {
            world: World::new(),
            movement: Movement::with_config(MovementConfig {
                speed: config.movement.speed,
            }),
            builder: Builder::new(config.builder),
            agents: Vec::new(),
        };

        let mut setup = vec![
            Command::ConfigureGrid {
                settings: config.grid,
            },
            Command::ConfigureReseed {
                seed: config.generation.reseed_seed,
            },
        ];
        if !config.terrain.is_empty() {
            setup.push(Command::ConfigureTerrain {
                kinds: config.terrain.clone(),
                fallback: None,
            });
        }
        setup.push(Command::GenerateGrid {
            seed: config.generation.seed,
            noise_scale: config.generation.noise_scale,
        });

        let events = simulation.dispatch(setup);
        if let Some(reason) = events.iter().find_map(|event| match event {
            Event::GenerationSkipped { reason } => Some(reason.clone()),
            _ => None,
        }) {
            bail!("grid generation failed: {reason}");
        }

        let mut commands = Vec::new();
        for structure in &config.structures {
            let placed = simulation.builder.place(
                structure.kind,
                structure.origin,
                query::grid(&simulation.world),
                &mut commands,
            );
            if let Err(error) = placed {
                warn!(kind = ?structure.kind, origin = ?structure.origin, %error, "structure skipped");
            }
        }

        let Some(grid) = query::grid(&simulation.world) else {
            bail!("grid generation produced no grid");
        };
        for agent in &config.agents {
            let start = grid.world_position(agent.start);
            let target = agent.target.map(|cell| grid.world_position(cell));
            let id = simulation.movement.register(start, target, &mut commands);
            simulation.agents.push(id);
        }

        let _ = simulation.dispatch(commands);
        Ok(simulation)
    }

    /// Advances the world clock by `dt` and steps every agent.
    pub(crate) fn tick(&mut self, dt: Duration) {
        let _ = self.dispatch(vec![Command::Tick { dt }]);
        for snapshot in self.movement.agent_view().iter() {
            debug!(
                agent = snapshot.id.get(),
                x = snapshot.position.x,
                y = snapshot.position.y,
                z = snapshot.position.z,
                waypoint = snapshot.path_index,
                waypoints = snapshot.path_len,
                "agent progress"
            );
        }
    }

    /// Draws a fresh seed and rebuilds the grid; agents restart from their spawn.
    pub(crate) fn reseed(&mut self) {
        let events = self.dispatch(vec![Command::RandomizeSeedAndRebuild]);
        for event in &events {
            if let Event::GridRegenerated { generation, seed } = event {
                info!(generation, seed, "grid reseeded");
            }
        }
    }

    pub(crate) fn grid(&self) -> Option<&Grid> {
        query::grid(&self.world)
    }

    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    pub(crate) fn movement(&self) -> &Movement {
        &self.movement
    }

    pub(crate) fn agents(&self) -> &[AgentId] {
        &self.agents
    }

    /// Applies commands until no system asks for more, then lets movement react.
    ///
    /// Follow-up occupancy from the builder lands before agents re-plan.
    fn dispatch(&mut self, commands: Vec<Command>) -> Vec<Event> {
        let mut events = Vec::new();
        let mut pending = commands;

        while !pending.is_empty() {
            let mut batch = Vec::new();
            for command in pending.drain(..) {
                world::apply(&mut self.world, command, &mut batch);
            }
            self.builder.handle(&batch, &mut pending);
            events.extend(batch);
        }

        self.movement.handle(&events, query::grid(&self.world));
        events
    }
}
