//! Ship tuning and simulation settings. Loaded from RON files at startup.
//!
//! Every field has a serde default, so a tuning file only needs to list the
//! values it changes. Defaults match the shipped inspector values.

use engine_core::Vec3;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::TuningError;
use crate::parts::{PartKind, MIN_SHIP_MASS};

/// Everything that shapes how one ship flies, breaks, and changes mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipTuning {
    #[serde(default)]
    pub flight: FlightTuning,
    #[serde(default)]
    pub collision: CollisionTuning,
    #[serde(default)]
    pub state: StateTuning,
    #[serde(default)]
    pub tray: TrayTuning,
    #[serde(default)]
    pub behaviours: BehaviourTuning,
    /// Hull box used for the main collider and the mass distribution.
    #[serde(default = "default_hull_half_extents")]
    pub hull_half_extents: Vec3,
    /// Destructible parts attached to the hull.
    #[serde(default = "default_parts")]
    pub parts: Vec<PartConfig>,
    /// How losing each part type hampers handling.
    #[serde(default = "default_part_effects")]
    pub part_effects: Vec<PartEffect>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightTuning {
    /// Mass of the intact, empty ship.
    #[serde(default = "default_mass")]
    pub mass: f32,
    /// Forward acceleration at full throttle.
    #[serde(default = "default_general_speed")]
    pub general_speed: f32,
    #[serde(default = "default_reverse_speed_mult")]
    pub reverse_speed_mult: f32,
    #[serde(default = "default_axis_force")]
    pub pitch_force: f32,
    #[serde(default = "default_axis_force")]
    pub yaw_force: f32,
    #[serde(default = "default_axis_force")]
    pub roll_force: f32,
    /// Auto-level strength against pitch, kept below 1 so the player always wins.
    #[serde(default = "default_pitch_limit_mult")]
    pub pitch_limit_mult: f32,
    /// Auto-level strength against roll.
    #[serde(default = "default_roll_limit_mult")]
    pub roll_limit_mult: f32,
    /// Share of yaw input fed into roll so turns bank.
    #[serde(default = "default_yaw_roll_coupling")]
    pub yaw_roll_coupling: f32,
    /// Roll input amplification while flying on one balloon.
    #[serde(default = "default_single_balloon_roll_mult")]
    pub single_balloon_roll_mult: f32,
    /// Force along the ship's moving "up", opposing drift.
    #[serde(default = "default_lift_force")]
    pub lift_force: f32,
    #[serde(default = "default_anim_throttle_mult")]
    pub anim_throttle_mult: f32,
    /// Climbing above this altitude stalls the ship.
    #[serde(default = "default_stall_y")]
    pub stall_y: f32,
    /// Falling below this altitude kills the ship.
    #[serde(default = "default_kill_y")]
    pub kill_y: f32,
    #[serde(default = "default_trapdoor_rumble_cooldown")]
    pub trapdoor_rumble_cooldown: f32,
    /// Below this speed the control multiplier kicks in.
    #[serde(default = "default_high_control_speed_threshold")]
    pub high_control_speed_threshold: f32,
    /// Control multiplier at a standstill.
    #[serde(default = "default_high_control_mult")]
    pub high_control_mult: f32,
    #[serde(default = "default_drag")]
    pub linear_drag: f32,
    #[serde(default = "default_drag")]
    pub angular_drag: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionTuning {
    /// Relative speed that counts as a bump worth rumbling for.
    #[serde(default = "default_bump_vel_threshold")]
    pub bump_vel_threshold: f32,
    #[serde(default = "default_one")]
    pub bump_rumble_strength: f32,
    #[serde(default = "default_bump_rumble_duration")]
    pub bump_rumble_duration: f32,
    /// Upward force of a balloon bursting, applied for one physics step.
    #[serde(default = "default_balloon_destroy_force")]
    pub balloon_destroy_force: f32,
    #[serde(default = "default_one")]
    pub balloon_rumble_strength: f32,
    #[serde(default = "default_balloon_rumble_duration")]
    pub balloon_rumble_duration: f32,
    /// Cone for directional classification, sin(15 degrees).
    #[serde(default = "default_col_dir_threshold")]
    pub col_dir_threshold: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTuning {
    /// Stick/trigger magnitude that wakes a ship out of pregame.
    #[serde(default = "default_any_input_dead_zone")]
    pub any_input_dead_zone: f32,
    /// Control time needed after a stall before the ceiling can stall the ship again.
    #[serde(default = "default_stall_cooldown")]
    pub stall_cooldown: f32,
    /// Time a stall must last before it can be turned into a fireship dive.
    #[serde(default = "default_stall_commit_time")]
    pub stall_commit_time: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrayTuning {
    #[serde(default = "default_tray_half_extents")]
    pub half_extents: Vec3,
    #[serde(default = "default_tray_offset")]
    pub offset: Vec3,
    /// How long a power-down suspends passenger retention.
    #[serde(default = "default_power_down_duration")]
    pub power_down_duration: f32,
    /// Mass each carried passenger adds to the ship.
    #[serde(default = "default_passenger_mass")]
    pub passenger_mass: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviourTuning {
    /// Forward acceleration of a fireship dive.
    #[serde(default = "default_fireship_speed")]
    pub fireship_speed: f32,
    #[serde(default = "default_fireship_turn_force")]
    pub fireship_turn_force: f32,
    /// Nose-down torque while stalling.
    #[serde(default = "default_stall_nose_down_force")]
    pub stall_nose_down_force: f32,
    /// Roulette wheel speed in radians per second.
    #[serde(default = "default_roulette_spin_speed")]
    pub roulette_spin_speed: f32,
    #[serde(default = "default_roulette_slots")]
    pub roulette_slots: u32,
}

/// One destructible part: its collider box and break rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartConfig {
    pub kind: PartKind,
    #[serde(default = "default_break_velocity")]
    pub break_velocity: f32,
    #[serde(default = "default_part_mass")]
    pub mass: f32,
    pub half_extents: Vec3,
    pub offset: Vec3,
}

/// The handling penalty for losing a part type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartEffect {
    pub kind: PartKind,
    /// Primary multiplier, e.g. the share of roll authority a balloon provides.
    pub value_mult: f32,
    /// Auxiliary value, e.g. the constant roll a lone balloon pulls with.
    #[serde(default)]
    pub aux_value_mult: f32,
}

/// Headless simulation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default = "default_fixed_rate_hz")]
    pub fixed_rate_hz: f64,
    #[serde(default = "default_gravity")]
    pub gravity: Vec3,
    #[serde(default = "default_players")]
    pub players: usize,
    #[serde(default = "default_passengers")]
    pub passengers: usize,
    /// How long the scripted demo runs, in seconds.
    #[serde(default = "default_duration")]
    pub duration: f32,
    /// Frame delta used by the scripted demo.
    #[serde(default = "default_frame_dt")]
    pub frame_dt: f32,
    /// Path of the ship tuning file, relative to the working directory.
    #[serde(default = "default_tuning_path")]
    pub tuning_path: PathBuf,
}

fn default_mass() -> f32 {
    100.0
}
fn default_general_speed() -> f32 {
    200.0
}
fn default_reverse_speed_mult() -> f32 {
    0.5
}
fn default_axis_force() -> f32 {
    1000.0
}
fn default_pitch_limit_mult() -> f32 {
    0.7
}
fn default_roll_limit_mult() -> f32 {
    0.8
}
fn default_yaw_roll_coupling() -> f32 {
    0.25
}
fn default_single_balloon_roll_mult() -> f32 {
    1.5
}
fn default_lift_force() -> f32 {
    1.0
}
fn default_anim_throttle_mult() -> f32 {
    2.5
}
fn default_stall_y() -> f32 {
    1000.0
}
fn default_kill_y() -> f32 {
    -2000.0
}
fn default_trapdoor_rumble_cooldown() -> f32 {
    0.75
}
fn default_high_control_speed_threshold() -> f32 {
    30.0
}
fn default_high_control_mult() -> f32 {
    2.0
}
fn default_drag() -> f32 {
    2.0
}
fn default_bump_vel_threshold() -> f32 {
    90.0
}
fn default_one() -> f32 {
    1.0
}
fn default_bump_rumble_duration() -> f32 {
    0.75
}
fn default_balloon_destroy_force() -> f32 {
    500.0
}
fn default_balloon_rumble_duration() -> f32 {
    0.2
}
fn default_col_dir_threshold() -> f32 {
    0.258819
}
fn default_any_input_dead_zone() -> f32 {
    input::ANY_INPUT_DEAD_ZONE
}
fn default_stall_cooldown() -> f32 {
    2.0
}
fn default_stall_commit_time() -> f32 {
    1.0
}
fn default_tray_half_extents() -> Vec3 {
    Vec3::new(1.5, 0.75, 3.0)
}
fn default_tray_offset() -> Vec3 {
    Vec3::new(0.0, 1.75, 0.0)
}
fn default_power_down_duration() -> f32 {
    1.5
}
fn default_passenger_mass() -> f32 {
    1.0
}
fn default_fireship_speed() -> f32 {
    300.0
}
fn default_fireship_turn_force() -> f32 {
    600.0
}
fn default_stall_nose_down_force() -> f32 {
    400.0
}
fn default_roulette_spin_speed() -> f32 {
    6.0
}
fn default_roulette_slots() -> u32 {
    4
}
fn default_break_velocity() -> f32 {
    100.0
}
fn default_part_mass() -> f32 {
    5.0
}
fn default_hull_half_extents() -> Vec3 {
    Vec3::new(2.0, 1.0, 6.0)
}
fn default_fixed_rate_hz() -> f64 {
    60.0
}
fn default_gravity() -> Vec3 {
    Vec3::new(0.0, -9.81, 0.0)
}
fn default_players() -> usize {
    2
}
fn default_passengers() -> usize {
    8
}
fn default_duration() -> f32 {
    20.0
}
fn default_frame_dt() -> f32 {
    1.0 / 60.0
}
fn default_tuning_path() -> PathBuf {
    PathBuf::from("ship_tuning.ron")
}

fn default_parts() -> Vec<PartConfig> {
    vec![
        PartConfig {
            kind: PartKind::LeftBalloon,
            break_velocity: default_break_velocity(),
            mass: default_part_mass(),
            half_extents: Vec3::new(1.5, 1.5, 4.0),
            offset: Vec3::new(-2.5, 3.5, 0.0),
        },
        PartConfig {
            kind: PartKind::RightBalloon,
            break_velocity: default_break_velocity(),
            mass: default_part_mass(),
            half_extents: Vec3::new(1.5, 1.5, 4.0),
            offset: Vec3::new(2.5, 3.5, 0.0),
        },
        PartConfig {
            kind: PartKind::Mast,
            break_velocity: default_break_velocity(),
            mass: default_part_mass(),
            half_extents: Vec3::new(0.25, 2.0, 0.25),
            offset: Vec3::new(0.0, 3.0, -2.0),
        },
        PartConfig {
            kind: PartKind::Rudder,
            break_velocity: default_break_velocity(),
            mass: default_part_mass(),
            half_extents: Vec3::new(0.1, 1.0, 0.75),
            offset: Vec3::new(0.0, 0.5, 6.75),
        },
    ]
}

fn default_part_effects() -> Vec<PartEffect> {
    vec![
        PartEffect {
            kind: PartKind::LeftBalloon,
            value_mult: 0.4,
            aux_value_mult: 0.5,
        },
        PartEffect {
            kind: PartKind::RightBalloon,
            value_mult: 0.4,
            aux_value_mult: 0.5,
        },
        PartEffect {
            kind: PartKind::Mast,
            value_mult: 0.5,
            aux_value_mult: 0.0,
        },
        PartEffect {
            kind: PartKind::Rudder,
            value_mult: 0.6,
            aux_value_mult: 0.0,
        },
    ]
}

impl Default for FlightTuning {
    fn default() -> Self {
        Self {
            mass: default_mass(),
            general_speed: default_general_speed(),
            reverse_speed_mult: default_reverse_speed_mult(),
            pitch_force: default_axis_force(),
            yaw_force: default_axis_force(),
            roll_force: default_axis_force(),
            pitch_limit_mult: default_pitch_limit_mult(),
            roll_limit_mult: default_roll_limit_mult(),
            yaw_roll_coupling: default_yaw_roll_coupling(),
            single_balloon_roll_mult: default_single_balloon_roll_mult(),
            lift_force: default_lift_force(),
            anim_throttle_mult: default_anim_throttle_mult(),
            stall_y: default_stall_y(),
            kill_y: default_kill_y(),
            trapdoor_rumble_cooldown: default_trapdoor_rumble_cooldown(),
            high_control_speed_threshold: default_high_control_speed_threshold(),
            high_control_mult: default_high_control_mult(),
            linear_drag: default_drag(),
            angular_drag: default_drag(),
        }
    }
}

impl Default for CollisionTuning {
    fn default() -> Self {
        Self {
            bump_vel_threshold: default_bump_vel_threshold(),
            bump_rumble_strength: default_one(),
            bump_rumble_duration: default_bump_rumble_duration(),
            balloon_destroy_force: default_balloon_destroy_force(),
            balloon_rumble_strength: default_one(),
            balloon_rumble_duration: default_balloon_rumble_duration(),
            col_dir_threshold: default_col_dir_threshold(),
        }
    }
}

impl Default for StateTuning {
    fn default() -> Self {
        Self {
            any_input_dead_zone: default_any_input_dead_zone(),
            stall_cooldown: default_stall_cooldown(),
            stall_commit_time: default_stall_commit_time(),
        }
    }
}

impl Default for TrayTuning {
    fn default() -> Self {
        Self {
            half_extents: default_tray_half_extents(),
            offset: default_tray_offset(),
            power_down_duration: default_power_down_duration(),
            passenger_mass: default_passenger_mass(),
        }
    }
}

impl Default for BehaviourTuning {
    fn default() -> Self {
        Self {
            fireship_speed: default_fireship_speed(),
            fireship_turn_force: default_fireship_turn_force(),
            stall_nose_down_force: default_stall_nose_down_force(),
            roulette_spin_speed: default_roulette_spin_speed(),
            roulette_slots: default_roulette_slots(),
        }
    }
}

impl Default for ShipTuning {
    fn default() -> Self {
        Self {
            flight: FlightTuning::default(),
            collision: CollisionTuning::default(),
            state: StateTuning::default(),
            tray: TrayTuning::default(),
            behaviours: BehaviourTuning::default(),
            hull_half_extents: default_hull_half_extents(),
            parts: default_parts(),
            part_effects: default_part_effects(),
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            fixed_rate_hz: default_fixed_rate_hz(),
            gravity: default_gravity(),
            players: default_players(),
            passengers: default_passengers(),
            duration: default_duration(),
            frame_dt: default_frame_dt(),
            tuning_path: default_tuning_path(),
        }
    }
}

fn check(field: &'static str, value: f32, ok: bool, requirement: &'static str) -> Result<(), TuningError> {
    if ok && value.is_finite() {
        Ok(())
    } else {
        Err(TuningError::OutOfRange {
            field,
            requirement,
            value,
        })
    }
}

impl ShipTuning {
    /// Parse tuning from RON text and validate it.
    pub fn from_ron_str(text: &str) -> Result<Self, TuningError> {
        let tuning: Self = ron::from_str(text)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from `path`. If the file is missing or invalid, returns defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(data) => match Self::from_ron_str(&data) {
                Ok(tuning) => return tuning,
                Err(e) => log::warn!("Invalid ship tuning at {:?}: {}, using defaults", path, e),
            },
            Err(e) => log::info!("No ship tuning at {:?} ({}), using defaults", path, e),
        }
        Self::default()
    }

    /// Reject values the flight model cannot work with.
    pub fn validate(&self) -> Result<(), TuningError> {
        let f = &self.flight;
        check("flight.mass", f.mass, f.mass > 0.0, "> 0")?;
        check(
            "flight.high_control_speed_threshold",
            f.high_control_speed_threshold,
            f.high_control_speed_threshold > 0.0,
            "> 0",
        )?;
        check("flight.pitch_limit_mult", f.pitch_limit_mult, (0.0..1.0).contains(&f.pitch_limit_mult), "in [0, 1)")?;
        check("flight.roll_limit_mult", f.roll_limit_mult, (0.0..1.0).contains(&f.roll_limit_mult), "in [0, 1)")?;
        check("flight.stall_y", f.stall_y, f.stall_y > f.kill_y, "above kill_y")?;

        let c = &self.collision;
        check(
            "collision.col_dir_threshold",
            c.col_dir_threshold,
            c.col_dir_threshold > 0.0 && c.col_dir_threshold < 1.0,
            "in (0, 1)",
        )?;
        check("collision.bump_vel_threshold", c.bump_vel_threshold, c.bump_vel_threshold >= 0.0, ">= 0")?;

        check("tray.passenger_mass", self.tray.passenger_mass, self.tray.passenger_mass >= 0.0, ">= 0")?;

        for part in &self.parts {
            check("parts[].mass", part.mass, part.mass >= 0.0, ">= 0")?;
            check("parts[].break_velocity", part.break_velocity, part.break_velocity >= 0.0, ">= 0")?;
        }
        let part_mass: f32 = self.parts.iter().map(|p| p.mass).sum();
        if f.mass - part_mass < MIN_SHIP_MASS {
            return Err(TuningError::PartsTooHeavy {
                parts: part_mass,
                mass: f.mass,
            });
        }
        Ok(())
    }

    /// The handling penalty configured for `kind`, if any.
    pub fn part_effect(&self, kind: PartKind) -> Option<&PartEffect> {
        self.part_effects.iter().find(|e| e.kind == kind)
    }
}

impl SimConfig {
    /// Load settings from `path`. If the file is missing or invalid, returns defaults.
    pub fn load(path: &Path) -> Self {
        if let Ok(data) = std::fs::read_to_string(path) {
            match ron::from_str(&data) {
                Ok(c) => return c,
                Err(e) => log::warn!("Invalid sim config at {:?}: {}, using defaults", path, e),
            }
        }
        Self::default()
    }
}
