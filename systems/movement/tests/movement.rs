use std::time::Duration;

use skirmish_core::{
    CellCoord, Command, Event, GridSettings, PathfinderId, Plane, TerrainColor, TerrainKind, Vec3,
};
use skirmish_system_movement::{AgentSnapshot, Movement, MovementError};
use skirmish_system_pathfinding::PathOutcome;
use skirmish_world::{self as world, query, World};

fn open_world(width: u32, height: u32) -> World {
    let grass = TerrainKind::new("grass", true, 1, TerrainColor::from_rgb(86, 160, 62))
        .expect("valid terrain");
    let mut world = World::new();
    let mut events = Vec::new();
    for command in [
        Command::ConfigureGrid {
            settings: GridSettings::new(width, height, 1.0, Plane::Xz),
        },
        Command::ConfigureTerrain {
            kinds: Vec::new(),
            fallback: Some(grass),
        },
        Command::GenerateGrid {
            seed: 1,
            noise_scale: 0.1,
        },
    ] {
        world::apply(&mut world, command, &mut events);
    }
    world
}

fn at(x: i32, y: i32) -> Vec3 {
    Plane::Xz.to_world(CellCoord::new(x, y), 1.0)
}

fn apply_all(world: &mut World, commands: Vec<Command>) -> Vec<Event> {
    let mut events = Vec::new();
    for command in commands {
        world::apply(world, command, &mut events);
    }
    events
}

fn pump(world: &mut World, movement: &mut Movement, commands: Vec<Command>) {
    let events = apply_all(world, commands);
    movement.handle(&events, query::grid(world));
}

fn tick(world: &mut World, movement: &mut Movement, times: usize) {
    for _ in 0..times {
        pump(
            world,
            movement,
            vec![Command::Tick {
                dt: Duration::from_secs(1),
            }],
        );
    }
}

fn snapshot(movement: &Movement, index: usize) -> AgentSnapshot {
    movement
        .agent_view()
        .into_vec()
        .into_iter()
        .nth(index)
        .expect("agent registered")
}

#[test]
fn agent_follows_path_to_target() {
    let mut world = open_world(5, 5);
    let mut movement = Movement::default();
    let mut commands = Vec::new();
    let agent = movement.register(at(0, 0), Some(at(4, 4)), &mut commands);
    pump(&mut world, &mut movement, commands);

    assert_eq!(movement.path(agent).map(<[Vec3]>::len), Ok(9));

    tick(&mut world, &mut movement, 8);
    assert!(!snapshot(&movement, 0).is_idle());

    tick(&mut world, &mut movement, 1);
    let state = snapshot(&movement, 0);
    assert!(state.is_idle());
    assert_eq!(state.position, at(4, 4));

    tick(&mut world, &mut movement, 3);
    assert_eq!(snapshot(&movement, 0).position, at(4, 4));
}

#[test]
fn partial_steps_respect_speed() {
    let mut world = open_world(5, 1);
    let mut movement = Movement::default();
    let mut commands = Vec::new();
    let _ = movement.register(at(0, 0), Some(at(4, 0)), &mut commands);
    pump(&mut world, &mut movement, commands);

    let step = Duration::from_millis(100);
    pump(&mut world, &mut movement, vec![Command::Tick { dt: step }]);
    pump(&mut world, &mut movement, vec![Command::Tick { dt: step }]);

    let state = snapshot(&movement, 0);
    assert!((state.position.x - 0.5).abs() < 1e-5);
    assert_eq!(state.path_index, 1);
}

#[test]
fn retarget_replans_from_live_position() {
    let mut world = open_world(5, 5);
    let mut movement = Movement::default();
    let mut commands = Vec::new();
    let agent = movement.register(at(0, 0), Some(at(4, 0)), &mut commands);
    pump(&mut world, &mut movement, commands);
    tick(&mut world, &mut movement, 3);
    assert_eq!(snapshot(&movement, 0).position, at(2, 0));

    let outcome = movement
        .retarget(agent, at(2, 4), query::grid(&world))
        .expect("agent registered");
    assert_eq!(
        outcome,
        PathOutcome::Found {
            waypoints: 5,
            cost: 4
        }
    );

    let state = snapshot(&movement, 0);
    assert_eq!(state.path_index, 0);
    assert_eq!(state.target, at(2, 4));
    assert_eq!(movement.path(agent).map(|path| path[0]), Ok(at(2, 0)));

    tick(&mut world, &mut movement, 5);
    assert_eq!(snapshot(&movement, 0).position, at(2, 4));
}

#[test]
fn regeneration_resets_agents_before_stepping() {
    let mut world = open_world(5, 5);
    let mut movement = Movement::default();
    let mut commands = Vec::new();
    let _ = movement.register(at(0, 0), Some(at(4, 4)), &mut commands);
    let _ = movement.register(at(4, 0), Some(at(0, 4)), &mut commands);
    pump(&mut world, &mut movement, commands);
    tick(&mut world, &mut movement, 4);
    assert_ne!(snapshot(&movement, 0).position, at(0, 0));

    let events = apply_all(
        &mut world,
        vec![
            Command::RandomizeSeedAndRebuild,
            Command::Tick {
                dt: Duration::from_secs(1),
            },
        ],
    );
    let refreshed: Vec<PathfinderId> = events
        .iter()
        .filter_map(|event| match event {
            Event::PathfinderRefreshRequested { pathfinder } => Some(*pathfinder),
            _ => None,
        })
        .collect();
    assert_eq!(refreshed.len(), 2);

    movement.handle(&events, query::grid(&world));

    for state in movement.agent_view().iter() {
        assert_eq!(state.position, state.initial_position);
        assert_eq!(state.path_index, 1, "reset must precede the step");
        assert_eq!(state.path_len, 9);
    }
}

#[test]
fn reset_all_restores_initial_positions() {
    let mut world = open_world(4, 4);
    let mut movement = Movement::default();
    let mut commands = Vec::new();
    let _ = movement.register(at(0, 0), Some(at(3, 3)), &mut commands);
    let _ = movement.register(at(3, 0), None, &mut commands);
    pump(&mut world, &mut movement, commands);
    tick(&mut world, &mut movement, 2);

    movement.reset_all(query::grid(&world));

    let states = movement.agent_view().into_vec();
    assert_eq!(states[0].position, at(0, 0));
    assert_eq!(states[0].path_index, 0);
    assert_eq!(states[0].path_len, 7);
    assert_eq!(states[1].position, at(3, 0));
    assert_eq!(states[1].path_len, 1);
}

#[test]
fn reset_all_idles_unreachable_agents_and_routes_the_rest() {
    let mut world = open_world(5, 3);
    let mut movement = Movement::default();
    let mut commands = Vec::new();
    let walled = movement.register(at(0, 0), Some(at(4, 0)), &mut commands);
    let open = movement.register(at(0, 2), Some(at(1, 2)), &mut commands);
    pump(&mut world, &mut movement, commands);
    tick(&mut world, &mut movement, 2);
    assert_eq!(snapshot(&movement, 0).position, at(1, 0));

    let wall: Vec<Command> = (0..3)
        .map(|y| Command::SetCellOccupied {
            cell: CellCoord::new(2, y),
            occupied: true,
        })
        .collect();
    let _ = apply_all(&mut world, wall);

    movement.reset_all(query::grid(&world));

    let states = movement.agent_view().into_vec();
    assert_eq!(states[0].id, walled);
    assert_eq!(states[0].position, at(0, 0));
    assert_eq!(states[0].path_index, 0);
    assert_eq!(states[0].path_len, 0);
    assert!(states[0].is_idle());

    assert_eq!(states[1].id, open);
    assert_eq!(states[1].position, at(0, 2));
    assert_eq!(states[1].path_index, 0);
    assert_eq!(states[1].path_len, 2);

    tick(&mut world, &mut movement, 2);
    let states = movement.agent_view().into_vec();
    assert_eq!(states[0].position, at(0, 0));
    assert_eq!(states[1].position, at(1, 2));
    assert!(states[1].is_idle());
}

#[test]
fn blocked_target_leaves_agent_idle() {
    let mut world = open_world(5, 5);
    let wall: Vec<Command> = (0..5)
        .map(|y| Command::SetCellOccupied {
            cell: CellCoord::new(2, y),
            occupied: true,
        })
        .collect();
    let _ = apply_all(&mut world, wall);

    let mut movement = Movement::default();
    let mut commands = Vec::new();
    let agent = movement.register(at(0, 2), Some(at(4, 2)), &mut commands);
    pump(&mut world, &mut movement, commands);

    assert_eq!(movement.path(agent).map(<[Vec3]>::len), Ok(0));
    tick(&mut world, &mut movement, 3);
    let state = snapshot(&movement, 0);
    assert!(state.is_idle());
    assert_eq!(state.position, at(0, 2));

    let _ = apply_all(
        &mut world,
        vec![Command::SetCellOccupied {
            cell: CellCoord::new(2, 4),
            occupied: false,
        }],
    );
    let outcome = movement
        .retarget(agent, at(4, 2), query::grid(&world))
        .expect("agent registered");
    assert!(outcome.is_found());
}

#[test]
fn agents_registered_before_generation_route_once_grid_exists() {
    let mut world = World::new();
    let mut movement = Movement::default();
    let mut commands = Vec::new();
    let agent = movement.register(at(0, 0), Some(at(2, 0)), &mut commands);
    pump(&mut world, &mut movement, commands);

    assert_eq!(movement.path(agent).map(<[Vec3]>::len), Ok(0));
    assert_eq!(
        movement
            .pathfinder(agent)
            .map(|pathfinder| pathfinder.is_some()),
        Ok(true)
    );

    let open = open_world(3, 1);
    movement.handle(&[], query::grid(&open));
    assert_eq!(movement.path(agent).map(<[Vec3]>::len), Ok(3));
}

#[test]
fn deregistered_agents_are_no_longer_notified() {
    let mut world = open_world(3, 3);
    let mut movement = Movement::default();
    let mut commands = Vec::new();
    let first = movement.register(at(0, 0), Some(at(2, 2)), &mut commands);
    let second = movement.register(at(2, 2), Some(at(0, 0)), &mut commands);
    pump(&mut world, &mut movement, commands);

    let mut commands = Vec::new();
    movement
        .deregister(first, &mut commands)
        .expect("agent registered");
    let _ = apply_all(&mut world, commands);

    assert_eq!(
        query::registered_pathfinders(&world),
        vec![snapshot(&movement, 0).pathfinder]
    );
    assert_eq!(snapshot(&movement, 0).id, second);
    assert_eq!(
        movement.path(first),
        Err(MovementError::UnknownAgent { agent: first })
    );
}
