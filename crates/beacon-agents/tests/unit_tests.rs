//! Unit controller tests, driven through the reference runtime's views.

use beacon_agents::prelude::*;
use beacon_core::comms::compress_influence;
use beacon_runtime::prelude::{BroadcastBoard, BudgetConfig, GridWorld, UnitView, WorldConfig};

fn flat_world() -> GridWorld {
    let config = WorldConfig {
        width: 30,
        height: 30,
        origin_x: 0,
        origin_y: 0,
        min_passability: 1.0,
        neutral_centers: 0,
        ..WorldConfig::default()
    };
    GridWorld::new(config, 8).unwrap()
}

fn controller(world: &GridWorld, id: AgentId) -> UnitController {
    let unit = world.unit(id).unwrap();
    let spawn = Spawn {
        id,
        team: unit.team,
        unit_type: unit.unit_type,
        location: unit.location,
        round: world.round(),
        seed: 4,
    };
    UnitController::new(&spawn, &ControllerConfig::default())
}

fn turn(world: &GridWorld, board: &BroadcastBoard, agent: &mut UnitController) -> Vec<AgentAction> {
    let costs = BudgetConfig::default();
    let view = UnitView::new(world, board, world.unit(agent.id()).unwrap(), &costs);
    let actions = agent.take_turn(&view);
    assert!(!view.exhausted());
    actions
}

fn broadcast(actions: &[AgentAction]) -> Message {
    match actions.first() {
        Some(AgentAction::Broadcast(flag)) => decode(*flag).unwrap(),
        other => panic!("expected a broadcast first, got {:?}", other),
    }
}

#[test]
fn scout_reads_heading_from_home() {
    let mut world = flat_world();
    let ec = world
        .place(Team::A, UnitType::EnlightenmentCenter, Location::new(15, 15), 150, None)
        .unwrap();
    let mut board = BroadcastBoard::new();
    board
        .write(ec, encode(&Message::with_direction(Label::Scout, Direction::West)).unwrap())
        .unwrap();
    board.commit();
    let id = world
        .place(Team::A, UnitType::Muckraker, Location::new(16, 15), 1, Some(ec))
        .unwrap();
    world.begin_round();

    let mut scout = controller(&world, id);
    let actions = turn(&world, &board, &mut scout);

    assert_eq!(scout.home(), Some((ec, Location::new(15, 15))));
    assert_eq!(scout.role(), Role::Scout(Direction::West));
    assert_eq!(broadcast(&actions).label(), Label::OurEc);
    let moved = actions.iter().find_map(|a| match a {
        AgentAction::Move(d) => Some(*d),
        _ => None,
    });
    assert!(moved.is_some_and(|d| d.dx() < 0), "moved {:?}", moved);
}

#[test]
fn slanderer_flees_muckrakers() {
    let mut world = flat_world();
    let ec = world
        .place(Team::A, UnitType::EnlightenmentCenter, Location::new(15, 15), 150, None)
        .unwrap();
    let mut board = BroadcastBoard::new();
    let hide = Message::located(Label::EcUpdate, Location::new(15, 15), Direction::Center.ordinal() as u32);
    board.write(ec, encode(&hide).unwrap()).unwrap();
    board.commit();
    let here = Location::new(16, 15);
    let id = world
        .place(Team::A, UnitType::Slanderer, here, 130, Some(ec))
        .unwrap();
    let threat = Location::new(19, 15);
    world.place(Team::B, UnitType::Muckraker, threat, 1, None).unwrap();
    world.begin_round();

    let mut slanderer = controller(&world, id);
    let actions = turn(&world, &board, &mut slanderer);

    assert_eq!(slanderer.role(), Role::Flee);
    for action in &actions {
        if let AgentAction::Move(d) = action {
            let to = here.add(*d);
            assert!(to.distance_squared_to(threat) >= here.distance_squared_to(threat));
        }
    }
}

#[test]
fn muckraker_reports_and_targets_enemy_center() {
    let mut world = flat_world();
    let here = Location::new(10, 10);
    let id = world
        .place(Team::A, UnitType::Muckraker, here, 1, None)
        .unwrap();
    let enemy = Location::new(14, 12);
    world
        .place(Team::B, UnitType::EnlightenmentCenter, enemy, 150, None)
        .unwrap();
    world.begin_round();
    let board = BroadcastBoard::new();

    let mut muckraker = controller(&world, id);
    let actions = turn(&world, &board, &mut muckraker);

    assert_eq!(muckraker.home(), None);
    assert_eq!(muckraker.role(), Role::Attack(enemy));
    let report = broadcast(&actions);
    assert_eq!(report.label(), Label::EnemyEc);
    assert_eq!(report.location(here), Some(enemy));
    assert_eq!(report.field(2), Some(compress_influence(150)));

    // A center is reported once; later turns carry the unit's status.
    let actions = turn(&world, &board, &mut muckraker);
    assert_eq!(broadcast(&actions).label(), Label::AttackLoc);
}

#[test]
fn assignment_waits_out_a_starved_first_turn() {
    let mut world = flat_world();
    let ec = world
        .place(Team::A, UnitType::EnlightenmentCenter, Location::new(15, 15), 150, None)
        .unwrap();
    let mut board = BroadcastBoard::new();
    board
        .write(ec, encode(&Message::with_direction(Label::Scout, Direction::South)).unwrap())
        .unwrap();
    board.commit();
    let id = world
        .place(Team::A, UnitType::Muckraker, Location::new(15, 16), 1, Some(ec))
        .unwrap();
    world.begin_round();

    let mut scout = controller(&world, id);
    let broke = BudgetConfig {
        per_turn: 0,
        ..BudgetConfig::default()
    };
    let view = UnitView::new(&world, &board, world.unit(id).unwrap(), &broke);
    scout.take_turn(&view);
    assert!(view.exhausted());
    assert_eq!(scout.assignment(), None);

    world.begin_round();
    turn(&world, &board, &mut scout);
    assert_eq!(scout.home(), Some((ec, Location::new(15, 15))));
    assert_eq!(scout.role(), Role::Scout(Direction::South));
    assert_eq!(scout.age(), 2);
}
