use std::collections::HashMap;

use airship::{CollisionKind, PartKind, ShipCommand, ShipError, ShipEvent, ShipKinematics, ShipMode, ShipTuning, SimConfig, Simulation};
use engine_core::{Entity, PlayerSlot, Quat, Transform, Vec3, Velocity};
use input::GamepadFrame;

const DT: f32 = 1.0 / 60.0;

fn sim_with_ship() -> (Simulation, Entity) {
    let mut sim = Simulation::new(&SimConfig::default(), ShipTuning::default());
    let ship = sim
        .spawn_ship(PlayerSlot::Player1, Transform::from_position(Vec3::new(0.0, 60.0, 0.0)))
        .expect("spawn ship");
    (sim, ship)
}

fn idle() -> HashMap<PlayerSlot, GamepadFrame> {
    HashMap::new()
}

fn with_input(frame: GamepadFrame) -> HashMap<PlayerSlot, GamepadFrame> {
    HashMap::from([(PlayerSlot::Player1, frame)])
}

fn teleport(sim: &mut Simulation, ship: Entity, position: Vec3, velocity: Vec3) {
    let kin = ShipKinematics::new(Transform::from_position(position), Velocity::new(velocity));
    sim.set_ship_kinematics(ship, &kin).expect("teleport");
}

fn place(sim: &mut Simulation, ship: Entity, transform: Transform, velocity: Vec3) {
    let kin = ShipKinematics::new(transform, Velocity::new(velocity));
    sim.set_ship_kinematics(ship, &kin).expect("place");
}

/// Tuning without drag, so a set velocity is still the velocity at impact.
fn undamped() -> ShipTuning {
    let mut tuning = ShipTuning::default();
    tuning.flight.linear_drag = 0.0;
    tuning.flight.angular_drag = 0.0;
    tuning
}

fn run_frames(sim: &mut Simulation, frames: usize) -> Vec<(Entity, ShipEvent)> {
    let mut events = Vec::new();
    for _ in 0..frames {
        sim.frame(DT, &idle());
        events.extend(sim.drain_events());
    }
    events
}

fn count(events: &[(Entity, ShipEvent)], ship: Entity, pred: impl Fn(&ShipEvent) -> bool) -> usize {
    events.iter().filter(|(e, ev)| *e == ship && pred(ev)).count()
}

#[test]
fn ship_spawns_in_pregame() {
    let (sim, ship) = sim_with_ship();
    assert_eq!(sim.ship_mode(ship), Some(ShipMode::Pregame));
    assert_eq!(sim.ship_entity(PlayerSlot::Player1), Some(ship));
}

#[test]
fn second_ship_for_same_player_is_rejected() {
    let (mut sim, _) = sim_with_ship();
    let err = sim
        .spawn_ship(PlayerSlot::Player1, Transform::default())
        .unwrap_err();
    assert!(matches!(err, ShipError::SlotTaken(PlayerSlot::Player1)));
}

#[test]
fn stick_past_dead_zone_starts_the_match() {
    let (mut sim, ship) = sim_with_ship();

    sim.frame(DT, &with_input(GamepadFrame::default().with_left_stick(0.1, 0.0)));
    assert_eq!(sim.ship_mode(ship), Some(ShipMode::Pregame));

    sim.frame(DT, &with_input(GamepadFrame::default().with_left_stick(0.3, 0.0)));
    assert_eq!(sim.ship_mode(ship), Some(ShipMode::Control));

    let changes: Vec<_> = sim
        .drain_events()
        .into_iter()
        .filter_map(|(_, e)| match e {
            ShipEvent::ModeChanged { from, to } => Some((from, to)),
            _ => None,
        })
        .collect();
    assert_eq!(changes, vec![(ShipMode::Pregame, ShipMode::Control)]);
}

#[test]
fn full_throttle_flies_forward() {
    let (mut sim, ship) = sim_with_ship();
    let throttle = GamepadFrame::default().with_triggers(-1.0);
    for _ in 0..60 {
        sim.frame(DT, &with_input(throttle.clone()));
    }
    assert_eq!(sim.ship_mode(ship), Some(ShipMode::Control));

    let snapshot = sim.ship_snapshot(ship).expect("snapshot");
    assert!(snapshot.kinematics.linear_velocity.z < -1.0);
    assert!((snapshot.throttle - 1.0).abs() < 1e-6);
    assert!(!snapshot.is_reversing);
}

#[test]
fn climbing_past_ceiling_stalls() {
    let (mut sim, ship) = sim_with_ship();
    sim.command(ship, ShipCommand::SetMode(ShipMode::Control)).expect("command");
    let stall_y = sim.tuning().flight.stall_y;

    teleport(&mut sim, ship, Vec3::new(0.0, stall_y + 1.0, 0.0), Vec3::new(0.0, 5.0, 0.0));
    sim.frame(DT, &idle());
    assert_eq!(sim.ship_mode(ship), Some(ShipMode::Stalling));
}

#[test]
fn falling_below_floor_kills() {
    let (mut sim, ship) = sim_with_ship();
    sim.command(ship, ShipCommand::SetMode(ShipMode::Control)).expect("command");
    let kill_y = sim.tuning().flight.kill_y;

    teleport(&mut sim, ship, Vec3::new(0.0, kill_y - 1.0, 0.0), Vec3::new(0.0, -5.0, 0.0));
    sim.frame(DT, &idle());
    assert_eq!(sim.ship_mode(ship), Some(ShipMode::Dying));

    // Already dying: no second transition.
    sim.drain_events();
    sim.frame(DT, &idle());
    let changes = sim
        .drain_events()
        .into_iter()
        .filter(|(_, e)| matches!(e, ShipEvent::ModeChanged { .. }))
        .count();
    assert_eq!(changes, 0);
}

#[test]
fn losing_both_balloons_kills_once() {
    let (mut sim, ship) = sim_with_ship();
    sim.command(ship, ShipCommand::SetMode(ShipMode::Control)).expect("command");
    sim.drain_events();

    let left = sim.break_part(ship, PartKind::LeftBalloon).expect("ship");
    assert!(left.is_some_and(|b| !b.killed_ship));
    assert_eq!(sim.ship_mode(ship), Some(ShipMode::Control));
    assert!(sim.break_part(ship, PartKind::LeftBalloon).expect("ship").is_none());

    let right = sim.break_part(ship, PartKind::RightBalloon).expect("ship");
    assert!(right.is_some_and(|b| b.killed_ship));
    assert_eq!(sim.ship_mode(ship), Some(ShipMode::Dying));

    let events: Vec<ShipEvent> = sim.drain_events().into_iter().map(|(_, e)| e).collect();
    let deaths = events
        .iter()
        .filter(|e| matches!(e, ShipEvent::ModeChanged { to: ShipMode::Dying, .. }))
        .count();
    let pops = events
        .iter()
        .filter(|e| matches!(e, ShipEvent::BalloonPopped { .. }))
        .count();
    assert_eq!(deaths, 1);
    assert_eq!(pops, 2);

    let handle = sim.ship(ship).expect("ship");
    assert!(handle.is_part_type_destroyed(PartKind::LeftBalloon));
    assert!(handle.is_part_type_destroyed(PartKind::RightBalloon));
    assert!(!handle.is_part_type_destroyed(PartKind::Mast));
    for (_, part) in handle.parts().parts() {
        for &collider in &part.colliders {
            assert_eq!(sim.physics().is_collider_enabled(collider), !part.kind.is_balloon());
        }
    }
}

#[test]
fn pregame_repairs_and_returns_to_spawn() {
    let (mut sim, ship) = sim_with_ship();
    sim.command(ship, ShipCommand::SetMode(ShipMode::Control)).expect("command");
    sim.break_part(ship, PartKind::Mast).expect("ship");
    teleport(&mut sim, ship, Vec3::new(40.0, 80.0, 0.0), Vec3::new(3.0, 0.0, 0.0));

    sim.command(ship, ShipCommand::SetModeNamed("pregame".to_string()))
        .expect("command");
    assert_eq!(sim.ship_mode(ship), Some(ShipMode::Pregame));

    let kin = sim.ship_kinematics(ship).expect("kinematics");
    assert!((kin.position() - Vec3::new(0.0, 60.0, 0.0)).length() < 1e-3);
    assert!(kin.linear_velocity.length() < 1e-3);
    assert!(!sim.ship(ship).expect("ship").is_part_type_destroyed(PartKind::Mast));
}

#[test]
fn unknown_mode_name_is_ignored() {
    let (mut sim, ship) = sim_with_ship();
    sim.command(ship, ShipCommand::SetModeNamed("hovering".to_string()))
        .expect("command");
    assert_eq!(sim.ship_mode(ship), Some(ShipMode::Pregame));
}

#[test]
fn passenger_in_tray_adds_mass() {
    let (mut sim, ship) = sim_with_ship();
    let offset = sim.tuning().tray.offset;
    let passenger = sim.spawn_passenger(Vec3::new(0.0, 60.0, 0.0) + offset);

    for _ in 0..10 {
        sim.frame(DT, &idle());
    }

    let events = sim.drain_events();
    assert!(events
        .iter()
        .all(|(_, e)| !matches!(e, ShipEvent::Collision { .. } | ShipEvent::TrayPoweredDown)));

    let snapshot = sim.ship_snapshot(ship).expect("snapshot");
    assert_eq!(snapshot.passengers, 1);
    assert!(snapshot.mass_ratio > 1.0);
    assert_eq!(sim.passengers(), vec![passenger]);
}

#[test]
fn front_target_picks_ship_ahead() {
    let mut sim = Simulation::new(&SimConfig::default(), ShipTuning::default());
    let hunter = sim
        .spawn_ship(PlayerSlot::Player1, Transform::from_position(Vec3::new(0.0, 60.0, 0.0)))
        .expect("spawn");
    let ahead = sim
        .spawn_ship(PlayerSlot::Player2, Transform::from_position(Vec3::new(0.0, 60.0, -100.0)))
        .expect("spawn");
    let _behind = sim
        .spawn_ship(PlayerSlot::Player3, Transform::from_position(Vec3::new(0.0, 60.0, 100.0)))
        .expect("spawn");

    let target = sim.find_front_target(hunter, None, airship::targeting::FRONT_CANNON_LOCK_DOT, airship::targeting::MAX_TARGET_DISTANCE);
    assert_eq!(target, Some(ahead));
}

#[test]
fn head_on_ram_is_classified_by_the_faster_ship() {
    let mut sim = Simulation::new(&SimConfig::default(), ShipTuning::default());
    let rammer = sim
        .spawn_ship(PlayerSlot::Player1, Transform::from_position(Vec3::new(0.0, 60.0, 0.0)))
        .expect("spawn");
    let facing = Transform::from_position_rotation(Vec3::new(0.0, 60.0, -20.0), Quat::from_rotation_y(std::f32::consts::PI));
    let target = sim.spawn_ship(PlayerSlot::Player2, facing).expect("spawn");
    for ship in [rammer, target] {
        sim.command(ship, ShipCommand::SetMode(ShipMode::Control)).expect("command");
    }
    place(&mut sim, rammer, Transform::from_position(Vec3::new(0.0, 60.0, 0.0)), Vec3::new(0.0, 0.0, -30.0));
    place(&mut sim, target, facing, Vec3::new(0.0, 0.0, 10.0));
    sim.drain_events();

    let mut first_hit = Vec::new();
    for _ in 0..120 {
        sim.frame(DT, &idle());
        let events = sim.drain_events();
        if events.iter().any(|(_, e)| matches!(e, ShipEvent::Collision { .. })) {
            first_hit = events;
            break;
        }
    }

    let collisions: Vec<_> = first_hit
        .iter()
        .filter_map(|(entity, e)| match e {
            ShipEvent::Collision { kind } => Some((*entity, *kind)),
            _ => None,
        })
        .collect();
    assert_eq!(collisions, vec![(rammer, CollisionKind::HeadOn)]);
    assert!(count(&first_hit, rammer, |e| matches!(e, ShipEvent::TrayPoweredDown)) >= 1);
    assert!(count(&first_hit, target, |e| matches!(e, ShipEvent::TrayPoweredDown)) >= 1);
    assert_eq!(count(&first_hit, rammer, |e| matches!(e, ShipEvent::PartDestroyed { .. })), 0);
}

#[test]
fn hard_landing_bumps_once() {
    let mut sim = Simulation::new(&SimConfig::default(), undamped());
    sim.add_ground(0.0);
    let ship = sim
        .spawn_ship(PlayerSlot::Player1, Transform::from_position(Vec3::new(0.0, 60.0, 0.0)))
        .expect("spawn");
    sim.command(ship, ShipCommand::SetMode(ShipMode::Control)).expect("command");
    // Hull bottom just above the ground, fast enough to bump but not to break parts.
    place(&mut sim, ship, Transform::from_position(Vec3::new(0.0, 1.05, 0.0)), Vec3::new(0.0, -97.0, 0.0));
    sim.drain_events();

    let events = run_frames(&mut sim, 20);
    assert_eq!(count(&events, ship, |e| matches!(e, ShipEvent::TrayPoweredDown)), 1);
    assert_eq!(count(&events, ship, |e| matches!(e, ShipEvent::Haptic(_))), 1);
    assert_eq!(count(&events, ship, |e| matches!(e, ShipEvent::PartDestroyed { .. })), 0);
    assert_eq!(sim.ship_mode(ship), Some(ShipMode::Control));
}

#[test]
fn gentle_landing_does_not_bump() {
    let mut sim = Simulation::new(&SimConfig::default(), undamped());
    sim.add_ground(0.0);
    let ship = sim
        .spawn_ship(PlayerSlot::Player1, Transform::from_position(Vec3::new(0.0, 60.0, 0.0)))
        .expect("spawn");
    sim.command(ship, ShipCommand::SetMode(ShipMode::Control)).expect("command");
    place(&mut sim, ship, Transform::from_position(Vec3::new(0.0, 1.05, 0.0)), Vec3::new(0.0, -20.0, 0.0));
    sim.drain_events();

    let events = run_frames(&mut sim, 20);
    assert_eq!(count(&events, ship, |e| matches!(e, ShipEvent::TrayPoweredDown)), 0);
}

#[test]
fn inverted_crash_pops_balloons_and_kills_once() {
    let mut sim = Simulation::new(&SimConfig::default(), undamped());
    sim.add_ground(0.0);
    let ship = sim
        .spawn_ship(PlayerSlot::Player1, Transform::from_position(Vec3::new(0.0, 60.0, 0.0)))
        .expect("spawn");
    sim.command(ship, ShipCommand::SetMode(ShipMode::Control)).expect("command");
    // Upside down: the balloon bottoms sit 5 below the body origin.
    let inverted = Transform::from_position_rotation(Vec3::new(0.0, 5.05, 0.0), Quat::from_rotation_z(std::f32::consts::PI));
    place(&mut sim, ship, inverted, Vec3::new(0.0, -150.0, 0.0));
    sim.drain_events();

    let events = run_frames(&mut sim, 20);
    assert_eq!(count(&events, ship, |e| matches!(e, ShipEvent::BalloonPopped { .. })), 2);
    assert_eq!(
        count(&events, ship, |e| matches!(e, ShipEvent::ModeChanged { to: ShipMode::Dying, .. })),
        1
    );
    assert!(count(&events, ship, |e| matches!(e, ShipEvent::TrayPoweredDown)) >= 1);
    assert_eq!(sim.ship_mode(ship), Some(ShipMode::Dying));
    let handle = sim.ship(ship).expect("ship");
    assert!(handle.is_part_type_destroyed(PartKind::LeftBalloon));
    assert!(handle.is_part_type_destroyed(PartKind::RightBalloon));
}

#[test]
fn releasing_everything_after_stall_commit_dives() {
    let mut tuning = ShipTuning::default();
    tuning.state.any_input_dead_zone = 0.5;
    let mut sim = Simulation::new(&SimConfig::default(), tuning);
    let ship = sim
        .spawn_ship(PlayerSlot::Player1, Transform::from_position(Vec3::new(0.0, 60.0, 0.0)))
        .expect("spawn");
    sim.command(ship, ShipCommand::SetMode(ShipMode::Stalling)).expect("command");

    // Below the tuned dead zone the stick never counts as held, so letting go is no release.
    let nudge = GamepadFrame::default().with_left_stick(0.3, 0.0);
    for _ in 0..70 {
        sim.frame(DT, &with_input(nudge.clone()));
    }
    sim.frame(DT, &idle());
    assert_eq!(sim.ship_mode(ship), Some(ShipMode::Stalling));

    sim.frame(DT, &with_input(GamepadFrame::default().with_left_stick(0.6, 0.0)));
    assert_eq!(sim.ship_mode(ship), Some(ShipMode::Stalling));
    sim.frame(DT, &idle());
    assert_eq!(sim.ship_mode(ship), Some(ShipMode::Suicide));
}

#[test]
fn stall_release_before_commit_keeps_stalling() {
    let (mut sim, ship) = sim_with_ship();
    sim.command(ship, ShipCommand::SetMode(ShipMode::Stalling)).expect("command");
    sim.frame(DT, &with_input(GamepadFrame::default().with_left_stick(0.0, 0.9)));
    sim.frame(DT, &idle());
    assert_eq!(sim.ship_mode(ship), Some(ShipMode::Stalling));
}

#[test]
fn roulette_holds_ship_at_spawn_without_colliders() {
    let (mut sim, ship) = sim_with_ship();
    sim.command(ship, ShipCommand::SetMode(ShipMode::Control)).expect("command");
    teleport(&mut sim, ship, Vec3::new(25.0, 90.0, -40.0), Vec3::new(0.0, 0.0, -30.0));

    sim.command(ship, ShipCommand::SetMode(ShipMode::Roulette)).expect("command");
    assert_eq!(sim.ship_mode(ship), Some(ShipMode::Roulette));

    let kin = sim.ship_kinematics(ship).expect("kinematics");
    assert!((kin.position() - Vec3::new(0.0, 60.0, 0.0)).length() < 1e-3);
    assert!(kin.linear_velocity.length() < 1e-3);

    let handle = sim.ship(ship).expect("ship");
    assert!(!sim.physics().is_collider_enabled(handle.hull_collider()));
    assert!(!sim.physics().is_collider_enabled(handle.tray_collider()));
    for collider in handle.part_colliders() {
        assert!(!sim.physics().is_collider_enabled(collider));
    }
}

#[test]
fn overweight_parts_are_rejected_at_spawn() {
    let mut tuning = ShipTuning::default();
    tuning.flight.mass = 20.5;
    let mut sim = Simulation::new(&SimConfig::default(), ShipTuning::default());
    let err = sim
        .spawn_ship_with(PlayerSlot::Player1, Transform::default(), tuning)
        .unwrap_err();
    assert!(matches!(err, ShipError::Tuning(_)));
    assert_eq!(sim.ship_entity(PlayerSlot::Player1), None);
}
