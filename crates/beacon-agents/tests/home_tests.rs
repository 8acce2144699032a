//! Home controller tests, driven through the reference runtime's views.

use beacon_agents::prelude::*;
use beacon_runtime::prelude::{BroadcastBoard, BudgetConfig, GridWorld, UnitView, WorldConfig};

fn flat_world() -> GridWorld {
    let config = WorldConfig {
        width: 24,
        height: 24,
        origin_x: 0,
        origin_y: 0,
        min_passability: 1.0,
        neutral_centers: 0,
        ..WorldConfig::default()
    };
    GridWorld::new(config, 5).unwrap()
}

fn home(world: &mut GridWorld, at: Location) -> (AgentId, HomeController) {
    let id = world
        .place(Team::A, UnitType::EnlightenmentCenter, at, 150, None)
        .unwrap();
    let spawn = Spawn {
        id,
        team: Team::A,
        unit_type: UnitType::EnlightenmentCenter,
        location: at,
        round: 0,
        seed: 21,
    };
    (id, HomeController::new(&spawn, &ControllerConfig::default()))
}

fn turn(world: &GridWorld, board: &BroadcastBoard, id: AgentId, agent: &mut dyn Agent) -> Vec<AgentAction> {
    let costs = BudgetConfig::default();
    let view = UnitView::new(world, board, world.unit(id).unwrap(), &costs);
    let actions = agent.take_turn(&view);
    assert!(!view.exhausted());
    actions
}

#[test]
fn opening_builds_a_slanderer_and_queues_scouts() {
    let mut world = flat_world();
    let (id, mut home) = home(&mut world, Location::new(6, 12));
    world.begin_round();
    let board = BroadcastBoard::new();

    let actions = turn(&world, &board, id, &mut home);

    let AgentAction::Broadcast(flag) = actions[0] else {
        panic!("expected the build instruction first, got {:?}", actions);
    };
    assert_eq!(decode(flag).unwrap().label(), Label::EcUpdate);
    let AgentAction::Build(order) = actions[1] else {
        panic!("expected a build, got {:?}", actions);
    };
    assert_eq!(order.unit_type, UnitType::Slanderer);
    assert_eq!(order.influence, 130);

    assert_eq!(home.phase(), Phase::Opening);
    assert_eq!(home.queued(UnitType::Muckraker), 8);
    assert_eq!(home.scheduler().queue().len(), 8);
    for action in &actions[2..] {
        let AgentAction::Bid(amount) = action else {
            panic!("unexpected trailing action {:?}", action);
        };
        assert!(*amount as i32 <= world.unit(id).unwrap().influence - 130);
    }
}

#[test]
fn reports_update_registry_and_safe_heading() {
    let mut world = flat_world();
    let here = Location::new(6, 12);
    let (id, mut home) = home(&mut world, here);
    let scout = world
        .place(Team::A, UnitType::Muckraker, Location::new(7, 13), 1, Some(id))
        .unwrap();
    let lookout = world
        .place(Team::A, UnitType::Muckraker, Location::new(5, 11), 1, Some(id))
        .unwrap();
    world.begin_round();

    let enemy = Location::new(18, 20);
    let threat = Location::new(6, 2);
    let mut board = BroadcastBoard::new();
    board
        .write(scout, encode(&Message::located(Label::EnemyEc, enemy, 5)).unwrap())
        .unwrap();
    board
        .write(lookout, encode(&Message::located(Label::DangerInfo, threat, 3)).unwrap())
        .unwrap();
    board.commit();

    let actions = turn(&world, &board, id, &mut home);

    let entry = home.registry().get(enemy).unwrap();
    assert_eq!(entry.allegiance, Allegiance::Enemy);
    assert_eq!(entry.influence, Some(16));
    let toward = here.direction_to(threat);
    assert_eq!(home.danger().count(toward), 3);
    assert!(home.tracked().contains(scout));

    assert!(actions.iter().all(|a| !matches!(a, AgentAction::Build(_))));
    let AgentAction::Broadcast(flag) = actions[0] else {
        panic!("expected a status broadcast, got {:?}", actions);
    };
    let update = decode(flag).unwrap();
    assert_eq!(update.label(), Label::EcUpdate);
    assert_eq!(update.location(here), Some(enemy));
    assert_eq!(update.field(2), Some(toward.opposite().ordinal() as u32));
}

#[test]
fn close_danger_is_ignored() {
    let mut world = flat_world();
    let here = Location::new(6, 12);
    let (id, mut home) = home(&mut world, here);
    let lookout = world
        .place(Team::A, UnitType::Muckraker, Location::new(7, 12), 1, Some(id))
        .unwrap();
    world.begin_round();

    let mut board = BroadcastBoard::new();
    let near = Location::new(8, 13);
    board
        .write(lookout, encode(&Message::located(Label::DangerInfo, near, 2)).unwrap())
        .unwrap();
    board.commit();

    let actions = turn(&world, &board, id, &mut home);
    assert!(!home.danger().any());
    assert!(actions.iter().any(|a| matches!(a, AgentAction::Build(_))));
}

#[test]
fn starved_turn_keeps_tracked_units_and_queued_builds() {
    let mut world = flat_world();
    let here = Location::new(6, 12);
    let (id, mut home) = home(&mut world, here);
    let scout = world
        .place(Team::A, UnitType::Muckraker, Location::new(7, 13), 1, Some(id))
        .unwrap();
    world.begin_round();
    let board = BroadcastBoard::new();

    let first = turn(&world, &board, id, &mut home);
    assert!(first.iter().any(|a| matches!(a, AgentAction::Build(_))));
    assert!(home.tracked().contains(scout));
    assert_eq!(home.scheduler().queue().len(), 8);

    // Over budget: the arena throws this turn away, build included.
    world.begin_round();
    let broke = BudgetConfig {
        per_turn: 0,
        ..BudgetConfig::default()
    };
    let view = UnitView::new(&world, &board, world.unit(id).unwrap(), &broke);
    home.take_turn(&view);
    assert!(view.exhausted());
    assert!(home.tracked().contains(scout));
    assert_eq!(home.scheduler().queue().len(), 8);

    // The slanderer never appeared, so it is built again.
    world.begin_round();
    let actions = turn(&world, &board, id, &mut home);
    assert!(home.tracked().contains(scout));
    let rebuilt = actions.iter().find_map(|action| match action {
        AgentAction::Build(order) => Some(order.unit_type),
        _ => None,
    });
    assert_eq!(rebuilt, Some(UnitType::Slanderer));
    assert_eq!(home.scheduler().queue().len(), 8);
}
