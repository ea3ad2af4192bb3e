#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic movement system that routes agents and steps them along their paths.

use skirmish_core::{AgentId, Command, Event, PathfinderId, Vec3};
use skirmish_system_pathfinding::{PathOutcome, Pathfinder};
use skirmish_world::Grid;
use thiserror::Error;
use tracing::debug;

/// Distance below which an agent counts as having reached its current waypoint.
pub const WAYPOINT_EPSILON: f32 = 0.05;

/// Default travel speed in world units per second.
pub const DEFAULT_SPEED: f32 = 5.0;

/// Tunables for the movement system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MovementConfig {
    /// Travel speed in world units per second.
    pub speed: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SPEED,
        }
    }
}

/// Errors produced when the movement system is asked about unknown agents.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum MovementError {
    /// No agent with the identifier is registered.
    #[error("agent {} is not registered", .agent.get())]
    UnknownAgent {
        /// Identifier that failed to resolve.
        agent: AgentId,
    },
}

/// Pure system that reacts to world events and advances agents.
#[derive(Debug, Default)]
pub struct Movement {
    config: MovementConfig,
    agents: Vec<Agent>,
    next_agent: u32,
    next_pathfinder: u32,
}

impl Movement {
    /// Creates a movement system with the provided configuration.
    #[must_use]
    pub fn with_config(config: MovementConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> MovementConfig {
        self.config
    }

    /// Registers an agent at `position` heading for `target`.
    ///
    /// A missing target is placed at the agent's own position. The agent is
    /// routed on the next call to [`Movement::handle`] that sees a grid.
    pub fn register(
        &mut self,
        position: Vec3,
        target: Option<Vec3>,
        out: &mut Vec<Command>,
    ) -> AgentId {
        let id = AgentId::new(self.next_agent);
        let pathfinder = PathfinderId::new(self.next_pathfinder);
        self.next_agent = self.next_agent.saturating_add(1);
        self.next_pathfinder = self.next_pathfinder.saturating_add(1);

        self.agents
            .push(Agent::new(id, pathfinder, position, target.unwrap_or(position)));
        out.push(Command::RegisterPathfinder { pathfinder });
        id
    }

    /// Removes the agent and releases its pathfinder registration.
    pub fn deregister(&mut self, agent: AgentId, out: &mut Vec<Command>) -> Result<(), MovementError> {
        let index = self.position_of(agent)?;
        let removed = self.agents.remove(index);
        out.push(Command::UnregisterPathfinder {
            pathfinder: removed.pathfinder_id,
        });
        Ok(())
    }

    /// Moves the agent's target and re-plans from its live position.
    pub fn retarget(
        &mut self,
        agent: AgentId,
        target: Vec3,
        grid: Option<&Grid>,
    ) -> Result<PathOutcome, MovementError> {
        let index = self.position_of(agent)?;
        let agent = &mut self.agents[index];
        agent.target = target;
        Ok(agent.route(grid))
    }

    /// Snaps every agent back to its initial position and re-plans.
    pub fn reset_all(&mut self, grid: Option<&Grid>) {
        debug!(agents = self.agents.len(), "resetting all agents");
        for agent in &mut self.agents {
            let _ = agent.reset(grid);
        }
    }

    /// Consumes world events against the current grid.
    ///
    /// Refresh requests are served before any time step in the same batch.
    pub fn handle(&mut self, events: &[Event], grid: Option<&Grid>) {
        for event in events {
            if let Event::PathfinderRefreshRequested { pathfinder } = event {
                if let Some(agent) = self
                    .agents
                    .iter_mut()
                    .find(|agent| agent.pathfinder_id == *pathfinder)
                {
                    let outcome = agent.reset(grid);
                    debug!(agent = agent.id.get(), ?outcome, "agent reset after regeneration");
                }
            }
        }

        for agent in self.agents.iter_mut().filter(|agent| agent.needs_route) {
            let _ = agent.route(grid);
        }

        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                let max_distance = self.config.speed * dt.as_secs_f32();
                for agent in &mut self.agents {
                    agent.step(max_distance);
                }
            }
        }
    }

    /// Captures a read-only snapshot of every agent.
    #[must_use]
    pub fn agent_view(&self) -> AgentView {
        AgentView::from_snapshots(self.agents.iter().map(Agent::snapshot).collect())
    }

    /// Waypoints the agent is currently following.
    pub fn path(&self, agent: AgentId) -> Result<&[Vec3], MovementError> {
        let index = self.position_of(agent)?;
        Ok(&self.agents[index].path)
    }

    /// Pathfinder owned by the agent, once it has searched at least once.
    pub fn pathfinder(&self, agent: AgentId) -> Result<Option<&Pathfinder>, MovementError> {
        let index = self.position_of(agent)?;
        Ok(self.agents[index].pathfinder.as_ref())
    }

    fn position_of(&self, agent: AgentId) -> Result<usize, MovementError> {
        self.agents
            .binary_search_by_key(&agent, |candidate| candidate.id)
            .map_err(|_| MovementError::UnknownAgent { agent })
    }
}

/// Immutable representation of a single agent's state.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentSnapshot {
    /// Identifier allocated on registration.
    pub id: AgentId,
    /// Pathfinder notified when the grid regenerates.
    pub pathfinder: PathfinderId,
    /// Live position in world space.
    pub position: Vec3,
    /// Position of the target marker.
    pub target: Vec3,
    /// Position restored by a reset.
    pub initial_position: Vec3,
    /// Index of the waypoint the agent is heading for.
    pub path_index: usize,
    /// Number of waypoints in the current path.
    pub path_len: usize,
}

impl AgentSnapshot {
    /// Reports whether the agent has no waypoint left to follow.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.path_index >= self.path_len
    }
}

/// Read-only view of agents sorted by identifier.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentView {
    snapshots: Vec<AgentSnapshot>,
}

impl AgentView {
    /// Creates a new agent view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<AgentSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &AgentSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<AgentSnapshot> {
        self.snapshots
    }
}

#[derive(Clone, Debug)]
struct Agent {
    id: AgentId,
    pathfinder_id: PathfinderId,
    position: Vec3,
    target: Vec3,
    initial_position: Vec3,
    path: Vec<Vec3>,
    path_index: usize,
    pathfinder: Option<Pathfinder>,
    needs_route: bool,
}

impl Agent {
    fn new(id: AgentId, pathfinder_id: PathfinderId, position: Vec3, target: Vec3) -> Self {
        Self {
            id,
            pathfinder_id,
            position,
            target,
            initial_position: position,
            path: Vec::new(),
            path_index: 0,
            pathfinder: None,
            needs_route: true,
        }
    }

    fn route(&mut self, grid: Option<&Grid>) -> PathOutcome {
        let pathfinder = self
            .pathfinder
            .get_or_insert_with(|| Pathfinder::new(self.pathfinder_id));
        let outcome = pathfinder.find_path(grid, Some(self.position), Some(self.target));

        match outcome {
            PathOutcome::Found { .. } => {
                self.path.clear();
                self.path.extend_from_slice(pathfinder.waypoints());
                self.path_index = 0;
            }
            PathOutcome::NoPath => {
                self.path.clear();
                self.path_index = 0;
            }
            PathOutcome::Skipped => {}
        }

        self.needs_route = outcome == PathOutcome::Skipped;
        outcome
    }

    fn reset(&mut self, grid: Option<&Grid>) -> PathOutcome {
        self.position = self.initial_position;
        self.path_index = 0;
        let outcome = self.route(grid);
        if outcome == PathOutcome::Skipped {
            // Stale route; re-planned once a grid is available.
            self.path.clear();
        }
        outcome
    }

    fn step(&mut self, max_distance: f32) {
        let Some(&waypoint) = self.path.get(self.path_index) else {
            return;
        };

        self.position = move_towards(self.position, waypoint, max_distance);
        if self.position.distance(waypoint) < WAYPOINT_EPSILON {
            self.path_index += 1;
        }
    }

    fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id,
            pathfinder: self.pathfinder_id,
            position: self.position,
            target: self.target,
            initial_position: self.initial_position,
            path_index: self.path_index,
            path_len: self.path.len(),
        }
    }
}

fn move_towards(current: Vec3, target: Vec3, max_distance: f32) -> Vec3 {
    let offset = target - current;
    let distance = offset.length();
    if distance <= max_distance || distance == 0.0 {
        target
    } else {
        current + offset / distance * max_distance.max(0.0)
    }
}
