//! Plain-text map dump used as a diagnostic after a run.

use std::fmt::Write as _;

use skirmish_core::CellCoord;
use skirmish_system_movement::{AgentSnapshot, Movement};
use skirmish_world::{Cell, Grid};

const AGENT: char = 'A';
const OCCUPIED: char = '#';
const PATH: char = '*';
const BLOCKED: char = '~';
const OPEN: char = '.';

/// Renders one row per grid line, agents over paths over occupancy over terrain.
pub(crate) fn render_map(grid: &Grid, movement: &Movement) -> String {
    let width = grid.width() as usize;
    let mut glyphs: Vec<char> = grid.cells().iter().map(terrain_glyph).collect();

    for cell in grid.cells().iter().filter(|cell| cell.occupied()) {
        mark(grid, &mut glyphs, cell.coord(), OCCUPIED);
    }

    let agents = movement.agent_view();
    for snapshot in agents.iter() {
        let Ok(path) = movement.path(snapshot.id) else {
            continue;
        };
        for waypoint in &path[snapshot.path_index.min(path.len())..] {
            mark(grid, &mut glyphs, grid.xy_index(*waypoint), PATH);
        }
    }
    for snapshot in agents.iter() {
        mark(grid, &mut glyphs, grid.xy_index(snapshot.position), AGENT);
    }

    let mut map = String::with_capacity(glyphs.len() + grid.height() as usize);
    for row in glyphs.chunks(width.max(1)) {
        map.extend(row);
        map.push('\n');
    }
    map
}

/// One line per agent describing where it is and how far along its path.
pub(crate) fn render_summary(movement: &Movement) -> String {
    let mut summary = String::new();
    for snapshot in movement.agent_view().iter() {
        let _ = writeln!(summary, "{}", describe(snapshot));
    }
    summary
}

fn describe(snapshot: &AgentSnapshot) -> String {
    let status = if snapshot.path_len == 0 {
        "no path"
    } else if snapshot.is_idle() {
        "arrived"
    } else {
        "moving"
    };
    format!(
        "agent {}: ({:.2}, {:.2}, {:.2}) waypoint {}/{} {status}",
        snapshot.id.get(),
        snapshot.position.x,
        snapshot.position.y,
        snapshot.position.z,
        snapshot.path_index,
        snapshot.path_len,
    )
}

fn terrain_glyph(cell: &Cell) -> char {
    if !cell.walkable() {
        return BLOCKED;
    }
    match cell.weight() {
        1 => OPEN,
        weight @ 2..=9 => char::from_digit(weight, 10).unwrap_or(OPEN),
        _ => '+',
    }
}

fn mark(grid: &Grid, glyphs: &mut [char], coord: CellCoord, glyph: char) {
    if let Some(slot) = grid.index_of(coord).and_then(|index| glyphs.get_mut(index)) {
        *slot = glyph;
    }
}
