#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Weighted A* search over the Skirmish grid.
//!
//! A [`Pathfinder`] remembers the endpoints of its last request so the owner
//! can re-run it when the world announces a regeneration. Every call keeps a
//! [`SearchTrace`] describing the frontier and visited cells for diagnostics.

use skirmish_core::{CellCoord, PathfinderId, Vec3};
use skirmish_world::{Cell, Grid};
use tracing::debug;

/// Result of a single search request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathOutcome {
    /// A route was found.
    Found {
        /// Number of waypoints, both endpoints included.
        waypoints: usize,
        /// Sum of the weights of every entered cell.
        cost: u32,
    },
    /// The endpoints are disconnected or lie outside the grid.
    NoPath,
    /// The grid or an endpoint was unset; nothing was computed.
    Skipped,
}

impl PathOutcome {
    /// Reports whether the search produced a route.
    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }
}

/// Route from start to goal, inclusive of both endpoints.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    waypoints: Vec<Vec3>,
    cells: Vec<CellCoord>,
    cost: u32,
}

impl Path {
    /// World positions in start to goal order.
    #[must_use]
    pub fn waypoints(&self) -> &[Vec3] {
        &self.waypoints
    }

    /// Grid indices in start to goal order.
    #[must_use]
    pub fn cells(&self) -> &[CellCoord] {
        &self.cells
    }

    /// Sum of the weights of every entered cell; the start cell is free.
    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }

    /// Number of waypoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Always false for a found path; it holds at least the start.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

/// Flattened record of the most recent search, kept for inspection only.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchTrace {
    generation: u64,
    frontier: Vec<Vec<Vec3>>,
    visited: Vec<Vec3>,
    path: Vec<Vec3>,
}

impl SearchTrace {
    fn reset(&mut self, generation: u64) {
        self.generation = generation;
        self.frontier.clear();
        self.visited.clear();
        self.path.clear();
    }

    /// Generation of the grid the trace was recorded against.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Open set positions captured before each expansion, in insertion order.
    #[must_use]
    pub fn frontier(&self) -> &[Vec<Vec3>] {
        &self.frontier
    }

    /// Closed set positions in the order they were finalised.
    #[must_use]
    pub fn visited(&self) -> &[Vec3] {
        &self.visited
    }

    /// Final path positions, empty when no route was found.
    #[must_use]
    pub fn path(&self) -> &[Vec3] {
        &self.path
    }

    /// Number of cells expanded.
    #[must_use]
    pub fn expansions(&self) -> usize {
        self.visited.len()
    }
}

/// A* search context bound to one requester.
#[derive(Clone, Debug)]
pub struct Pathfinder {
    id: PathfinderId,
    start: Option<Vec3>,
    target: Option<Vec3>,
    path: Option<Path>,
    trace: SearchTrace,
    workspace: SearchWorkspace,
}

impl Pathfinder {
    /// Creates a pathfinder with no endpoints and no path.
    #[must_use]
    pub fn new(id: PathfinderId) -> Self {
        Self {
            id,
            start: None,
            target: None,
            path: None,
            trace: SearchTrace::default(),
            workspace: SearchWorkspace::default(),
        }
    }

    /// Identifier used for regeneration notifications.
    #[must_use]
    pub const fn id(&self) -> PathfinderId {
        self.id
    }

    /// Endpoints of the last request.
    #[must_use]
    pub const fn endpoints(&self) -> (Option<Vec3>, Option<Vec3>) {
        (self.start, self.target)
    }

    /// Searches from `start` to `target`, remembering both for [`Pathfinder::refresh`].
    pub fn find_path(
        &mut self,
        grid: Option<&Grid>,
        start: Option<Vec3>,
        target: Option<Vec3>,
    ) -> PathOutcome {
        self.start = start;
        self.target = target;
        self.refresh(grid)
    }

    /// Re-runs the last request against the provided grid.
    ///
    /// Unset references leave every piece of prior state untouched. Endpoints
    /// outside the grid clear the path.
    pub fn refresh(&mut self, grid: Option<&Grid>) -> PathOutcome {
        let (Some(grid), Some(start), Some(target)) = (grid, self.start, self.target) else {
            return PathOutcome::Skipped;
        };

        let start_cell = grid.xy_index(start);
        let goal_cell = grid.xy_index(target);
        self.trace.reset(grid.generation());
        self.path = search(
            grid,
            start_cell,
            goal_cell,
            &mut self.workspace,
            &mut self.trace,
        );

        match &self.path {
            Some(path) => {
                self.trace.path.extend_from_slice(path.waypoints());
                PathOutcome::Found {
                    waypoints: path.len(),
                    cost: path.cost(),
                }
            }
            None => {
                debug!(
                    pathfinder = self.id.get(),
                    ?start_cell,
                    ?goal_cell,
                    "no path"
                );
                PathOutcome::NoPath
            }
        }
    }

    /// Route produced by the last search, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_ref()
    }

    /// Waypoints of the last route, empty when there is none.
    #[must_use]
    pub fn waypoints(&self) -> &[Vec3] {
        match &self.path {
            Some(path) => path.waypoints(),
            None => &[],
        }
    }

    /// Diagnostics captured during the last search.
    #[must_use]
    pub fn trace(&self) -> &SearchTrace {
        &self.trace
    }
}

/// Dense per-cell scratch buffers, cleared before every search.
#[derive(Clone, Debug, Default)]
struct SearchWorkspace {
    open: Vec<usize>,
    in_open: Vec<bool>,
    closed: Vec<bool>,
    came_from: Vec<Option<usize>>,
    g_score: Vec<u32>,
    f_score: Vec<u32>,
}

impl SearchWorkspace {
    fn prepare(&mut self, cell_count: usize) {
        self.open.clear();
        reset(&mut self.in_open, cell_count, false);
        reset(&mut self.closed, cell_count, false);
        reset(&mut self.came_from, cell_count, None);
        reset(&mut self.g_score, cell_count, u32::MAX);
        reset(&mut self.f_score, cell_count, u32::MAX);
    }

    fn push_open(&mut self, index: usize) {
        self.open.push(index);
        self.in_open[index] = true;
    }

    /// Removes the open entry with the lowest f-score.
    ///
    /// Ties go to the earliest inserted entry; removal keeps the order of the rest.
    fn pop_lowest(&mut self) -> Option<usize> {
        let mut best = 0;
        for position in 1..self.open.len() {
            if self.f_score[self.open[position]] < self.f_score[self.open[best]] {
                best = position;
            }
        }

        if best >= self.open.len() {
            return None;
        }

        let index = self.open.remove(best);
        self.in_open[index] = false;
        Some(index)
    }
}

fn reset<T: Clone>(buffer: &mut Vec<T>, len: usize, value: T) {
    buffer.clear();
    buffer.resize(len, value);
}

fn heuristic(from: CellCoord, to: CellCoord) -> u32 {
    from.manhattan_distance(to)
}

fn search(
    grid: &Grid,
    start: CellCoord,
    goal: CellCoord,
    workspace: &mut SearchWorkspace,
    trace: &mut SearchTrace,
) -> Option<Path> {
    let start_index = grid.index_of(start)?;
    let goal_index = grid.index_of(goal)?;
    let cells = grid.cells();

    workspace.prepare(cells.len());
    workspace.g_score[start_index] = 0;
    workspace.f_score[start_index] = heuristic(start, goal);
    workspace.push_open(start_index);

    while !workspace.open.is_empty() {
        trace.frontier.push(
            workspace
                .open
                .iter()
                .filter_map(|&index| cells.get(index))
                .map(Cell::world_position)
                .collect(),
        );

        let current = workspace.pop_lowest()?;
        if current == goal_index {
            return Some(reconstruct(cells, workspace, current));
        }

        workspace.closed[current] = true;
        let current_cell = cells.get(current)?;
        trace.visited.push(current_cell.world_position());
        let current_g = workspace.g_score[current];

        for neighbor in grid.neighbors(current_cell.coord()) {
            let Some(index) = grid.index_of(neighbor) else {
                continue;
            };
            let Some(cell) = cells.get(index) else {
                continue;
            };

            if !cell.traversable() || workspace.closed[index] {
                continue;
            }

            let tentative = current_g.saturating_add(cell.weight());
            if tentative >= workspace.g_score[index] {
                continue;
            }

            workspace.came_from[index] = Some(current);
            workspace.g_score[index] = tentative;
            workspace.f_score[index] = tentative.saturating_add(heuristic(neighbor, goal));
            if !workspace.in_open[index] {
                workspace.push_open(index);
            }
        }
    }

    None
}

fn reconstruct(cells: &[Cell], workspace: &SearchWorkspace, goal_index: usize) -> Path {
    let mut indices = vec![goal_index];
    let mut current = goal_index;
    while let Some(previous) = workspace.came_from[current] {
        indices.push(previous);
        current = previous;
    }
    indices.reverse();

    let route: Vec<&Cell> = indices.iter().filter_map(|&index| cells.get(index)).collect();
    Path {
        waypoints: route.iter().map(|cell| cell.world_position()).collect(),
        cells: route.iter().map(|cell| cell.coord()).collect(),
        cost: workspace.g_score[goal_index],
    }
}
