//! airship-sim - headless airship match driven by scripted gamepad input.

use std::collections::HashMap;
use std::path::Path;

use airship::{ShipEvent, ShipTuning, SimConfig, Simulation};
use anyhow::{Context, Result};
use engine_core::{PlayerSlot, Quat, Transform, Vec3};
use input::{GamepadButton, GamepadFrame};
use rand::{Rng, SeedableRng};

const SPAWN_HEIGHT: f32 = 60.0;
const SPAWN_SPACING: f32 = 40.0;

/// Scripted controller for one player at `t` seconds into the match.
fn scripted_frame(player: PlayerSlot, t: f32) -> GamepadFrame {
    // Everyone sits in pregame for the first half second.
    if t < 0.5 {
        return GamepadFrame::default();
    }
    let phase = player.index() as f32 * 0.8;
    let yaw = (t * 0.4 + phase).sin() * 0.6;
    let pitch = (t * 0.25 + phase).cos() * 0.3;
    let mut frame = GamepadFrame::default()
        .with_left_stick(yaw, pitch)
        .with_triggers(-1.0);
    // Drop the hatch for a moment every ten seconds.
    if (t % 10.0) > 8.0 {
        frame = frame.with_button(GamepadButton::BumperLeft);
    }
    frame
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = SimConfig::load(Path::new("sim_config.ron"));
    let tuning = ShipTuning::load(&config.tuning_path);
    log::info!(
        "Starting airship-sim: {} players, {} passengers, {:.0}s at {} Hz",
        config.players,
        config.passengers,
        config.duration,
        config.fixed_rate_hz
    );

    let mut sim = Simulation::new(&config, tuning);
    sim.add_ground(0.0);
    sim.add_pillar(Vec3::new(0.0, 40.0, -120.0), Vec3::new(8.0, 40.0, 8.0));

    let players = config.players.clamp(1, PlayerSlot::ALL.len());
    for (i, player) in PlayerSlot::ALL.iter().take(players).enumerate() {
        let angle = i as f32 / players as f32 * std::f32::consts::TAU;
        let position = Vec3::new(angle.cos() * SPAWN_SPACING, SPAWN_HEIGHT, angle.sin() * SPAWN_SPACING);
        let spawn = Transform::from_position_rotation(position, Quat::from_rotation_y(angle));
        sim.spawn_ship(*player, spawn)
            .with_context(|| format!("spawning ship for {}", player))?;
    }

    let mut rng = rand::rngs::StdRng::seed_from_u64(0x5ea_b1e);
    for _ in 0..config.passengers {
        let position = Vec3::new(
            rng.gen_range(-SPAWN_SPACING..SPAWN_SPACING),
            rng.gen_range(5.0..30.0),
            rng.gen_range(-SPAWN_SPACING..SPAWN_SPACING),
        );
        sim.spawn_passenger(position);
    }

    let frame_dt = config.frame_dt.max(1.0e-3);
    let frames = (config.duration / frame_dt).ceil() as u32;
    for n in 0..frames {
        let t = n as f32 * frame_dt;
        let inputs: HashMap<PlayerSlot, GamepadFrame> = PlayerSlot::ALL
            .iter()
            .take(players)
            .map(|&p| (p, scripted_frame(p, t)))
            .collect();
        sim.frame(frame_dt, &inputs);

        for (entity, event) in sim.drain_events() {
            match event {
                ShipEvent::ModeChanged { from, to } => log::info!("{:?}: {} -> {}", entity, from, to),
                ShipEvent::PartDestroyed { kind } => log::info!("{:?}: lost {:?}", entity, kind),
                ShipEvent::Collision { kind } => log::info!("{:?}: collision {:?}", entity, kind),
                ShipEvent::TrayPoweredDown => log::debug!("{:?}: tray powered down", entity),
                ShipEvent::Haptic(request) => log::trace!("{:?}: rumble {:?}", entity, request),
                other => log::debug!("{:?}: {:?}", entity, other),
            }
        }
    }

    log::info!(
        "Simulated {:.1}s over {} frames",
        sim.time().elapsed_seconds(),
        sim.time().frame_count()
    );
    for entity in sim.ships() {
        if let Some(snapshot) = sim.ship_snapshot(entity) {
            log::info!(
                "{} finished in {} at {:?}, mass ratio {:.2}, carrying {}",
                snapshot.player,
                snapshot.mode,
                snapshot.kinematics.position(),
                snapshot.mass_ratio,
                snapshot.passengers
            );
        }
    }
    Ok(())
}
