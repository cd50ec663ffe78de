use std::time::Duration;

use ladder_outline_core::{
    Command, DiscoverySource, Event, LadderKind, LevelId, TileCoord, TileLayer, TileMap,
    TilePosition, LADDER_TILE_INDEX,
};
use ladder_outline_system_scanning::{Scanning, VERIFICATION_DELAY_TICKS};
use ladder_outline_world::{self as world, query, World};

fn map_with_ladders(width: u32, height: u32, ladders: &[TileCoord]) -> TileMap {
    let mut layer = TileLayer::empty("buildings".to_owned(), width, height);
    for tile in ladders {
        assert!(layer.set_tile(*tile, Some(LADDER_TILE_INDEX)));
    }
    TileMap::new(vec![layer])
}

fn pump(world: &mut World, scanning: &mut Scanning, map: &TileMap, events: &[Event]) -> Vec<Event> {
    let mut commands = Vec::new();
    scanning.handle(events, map, &mut commands);

    let mut produced = Vec::new();
    for command in commands {
        world::apply(world, command, &mut produced);
    }
    produced
}

fn enter_level(world: &mut World, level: u32) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::EnterLevel {
            level: LevelId::new(level),
        },
        &mut events,
    );
    events
}

fn advance_one_tick(world: &mut World) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::Tick {
            dt: Duration::from_millis(16),
        },
        &mut events,
    );
    events
}

#[test]
fn entry_sweep_populates_the_tracker() {
    let mut world = World::new();
    let mut scanning = Scanning::new();
    let map = map_with_ladders(10, 10, &[TileCoord::new(3, 4), TileCoord::new(7, 2)]);

    let entered = enter_level(&mut world, 1);
    let found = pump(&mut world, &mut scanning, &map, &entered);

    assert_eq!(found.len(), 2);
    assert!(found.iter().all(|event| matches!(
        event,
        Event::LadderFound {
            source: DiscoverySource::Scan,
            ..
        }
    )));

    let view = query::ladder_view(&world);
    assert_eq!(
        view.into_vec(),
        vec![TilePosition::new(448, 128), TilePosition::new(192, 256)]
    );
}

#[test]
fn resweeping_an_unchanged_grid_announces_nothing_new() {
    let mut world = World::new();
    let mut scanning = Scanning::new();
    let map = map_with_ladders(10, 10, &[TileCoord::new(3, 4)]);

    let entered = enter_level(&mut world, 1);
    let found = pump(&mut world, &mut scanning, &map, &entered);
    assert_eq!(found.len(), 1);

    let mut later_finds = 0;
    for _ in 0..VERIFICATION_DELAY_TICKS {
        let ticked = advance_one_tick(&mut world);
        let produced = pump(&mut world, &mut scanning, &map, &ticked);
        later_finds += produced
            .iter()
            .filter(|event| matches!(event, Event::LadderFound { .. }))
            .count();
    }

    assert_eq!(later_finds, 0);
    assert_eq!(query::ladder_view(&world).len(), 1);
}

#[test]
fn verification_sweep_catches_tiles_added_after_entry() {
    let mut world = World::new();
    let mut scanning = Scanning::new();
    let mut map = map_with_ladders(10, 10, &[]);

    let entered = enter_level(&mut world, 1);
    let found = pump(&mut world, &mut scanning, &map, &entered);
    assert!(found.is_empty());

    assert!(map.set_tile("buildings", TileCoord::new(5, 6), Some(LADDER_TILE_INDEX)));

    for _ in 0..VERIFICATION_DELAY_TICKS - 1 {
        let ticked = advance_one_tick(&mut world);
        let produced = pump(&mut world, &mut scanning, &map, &ticked);
        assert!(produced.is_empty());
    }

    let ticked = advance_one_tick(&mut world);
    let produced = pump(&mut world, &mut scanning, &map, &ticked);
    assert_eq!(
        produced,
        vec![Event::LadderFound {
            position: TilePosition::new(320, 384),
            source: DiscoverySource::Scan,
        }]
    );
}

#[test]
fn notifications_drain_after_the_sweep_without_duplicating_it() {
    let mut world = World::new();
    let mut scanning = Scanning::new();
    let map = map_with_ladders(10, 10, &[TileCoord::new(3, 4)]);

    let entered = enter_level(&mut world, 1);
    let found = pump(&mut world, &mut scanning, &map, &entered);
    assert_eq!(found.len(), 1);

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::ReportLadder {
            tile: TileCoord::new(3, 4),
            kind: LadderKind::Ladder,
        },
        &mut events,
    );
    world::apply(
        &mut world,
        Command::ReportLadder {
            tile: TileCoord::new(5, 5),
            kind: LadderKind::Shaft,
        },
        &mut events,
    );
    assert!(events.is_empty());

    world::apply(&mut world, Command::Pulse, &mut events);
    assert!(events.is_empty(), "first pulse only arms the queue");

    world::apply(&mut world, Command::Pulse, &mut events);
    assert!(
        events.is_empty(),
        "notification for an already swept tile stays silent"
    );

    world::apply(&mut world, Command::Pulse, &mut events);
    assert_eq!(
        events,
        vec![Event::LadderFound {
            position: TilePosition::new(320, 320),
            source: DiscoverySource::Notification,
        }]
    );

    assert_eq!(query::ladder_view(&world).len(), 2);
}
