//! Ship mode state machine.
//!
//! A mode change is a pure function of the target mode: [`enter`] returns the
//! visibility flags, the one behaviour module to run, and the reset work the
//! owning ship must apply to its physics body. [`ShipStateMachine`] records the
//! current mode, keeps the stall timers, and queues entries for the ship to flush.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::StateTuning;
use crate::error::UnknownMode;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShipMode {
    #[default]
    Pregame,
    Roulette,
    Control,
    Dying,
    Stalling,
    Suicide,
}

impl ShipMode {
    pub const ALL: [ShipMode; 6] = [
        ShipMode::Pregame,
        ShipMode::Roulette,
        ShipMode::Control,
        ShipMode::Dying,
        ShipMode::Stalling,
        ShipMode::Suicide,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShipMode::Pregame => "Pregame",
            ShipMode::Roulette => "Roulette",
            ShipMode::Control => "Control",
            ShipMode::Dying => "Dying",
            ShipMode::Stalling => "Stalling",
            ShipMode::Suicide => "Suicide",
        }
    }
}

impl fmt::Display for ShipMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShipMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShipMode::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownMode(s.to_string()))
    }
}

/// Which parts of the ship hierarchy are shown/active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visibility {
    pub colliders: bool,
    pub meshes: bool,
    pub hinges: bool,
    pub roulette: bool,
    pub particles: bool,
    pub weapons: bool,
}

impl Visibility {
    pub fn for_mode(mode: ShipMode) -> Self {
        let hull = |particles: bool, weapons: bool| Visibility {
            colliders: true,
            meshes: true,
            hinges: true,
            roulette: false,
            particles,
            weapons,
        };
        match mode {
            ShipMode::Pregame => hull(false, false),
            ShipMode::Roulette => Visibility {
                colliders: false,
                meshes: false,
                hinges: false,
                roulette: true,
                particles: false,
                weapons: false,
            },
            ShipMode::Control => hull(true, true),
            ShipMode::Dying | ShipMode::Stalling | ShipMode::Suicide => hull(true, false),
        }
    }
}

/// The per-mode behaviours. At most one runs at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BehaviourModule {
    Roulette,
    Control,
    Dying,
    Stalling,
    Suicide,
}

impl BehaviourModule {
    /// The module a mode runs. Pregame runs none.
    pub fn for_mode(mode: ShipMode) -> Option<Self> {
        match mode {
            ShipMode::Pregame => None,
            ShipMode::Roulette => Some(BehaviourModule::Roulette),
            ShipMode::Control => Some(BehaviourModule::Control),
            ShipMode::Dying => Some(BehaviourModule::Dying),
            ShipMode::Stalling => Some(BehaviourModule::Stalling),
            ShipMode::Suicide => Some(BehaviourModule::Suicide),
        }
    }
}

/// Everything entering a mode changes, for the owner to apply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeEntry {
    pub mode: ShipMode,
    pub visibility: Visibility,
    pub module: Option<BehaviourModule>,
    /// Teleport back to the spawn pose.
    pub reset_to_spawn: bool,
    pub zero_velocity: bool,
    pub repair_parts: bool,
    pub reset_suicide_timer: bool,
    pub reset_dying_timer: bool,
    /// Whether gravity acts on the body in this mode.
    pub gravity: bool,
}

/// Describe entering `mode`. Pure; the same mode always yields the same entry.
pub fn enter(mode: ShipMode) -> ModeEntry {
    let mut entry = ModeEntry {
        mode,
        visibility: Visibility::for_mode(mode),
        module: BehaviourModule::for_mode(mode),
        reset_to_spawn: false,
        zero_velocity: false,
        repair_parts: false,
        reset_suicide_timer: false,
        reset_dying_timer: false,
        gravity: false,
    };
    match mode {
        ShipMode::Pregame => {
            entry.reset_to_spawn = true;
            entry.zero_velocity = true;
            entry.repair_parts = true;
        }
        ShipMode::Roulette => {
            entry.reset_to_spawn = true;
            entry.zero_velocity = true;
        }
        ShipMode::Control => {
            entry.reset_suicide_timer = true;
            entry.reset_dying_timer = true;
        }
        ShipMode::Dying | ShipMode::Stalling => entry.gravity = true,
        ShipMode::Suicide => {}
    }
    entry
}

/// Anything that can ask a ship to change mode.
pub trait StateRequester {
    fn request_state(&mut self, mode: ShipMode);
}

#[derive(Debug, Clone)]
pub struct ShipStateMachine {
    mode: ShipMode,
    visibility: Visibility,
    module: Option<BehaviourModule>,
    /// Counts down in Control; the ceiling cannot stall the ship again until it runs out.
    stall_cooldown: f32,
    /// Counts down in Stalling; once negative the stall can be escaped.
    stall_commit: f32,
    pending: Vec<ModeEntry>,
    tuning: StateTuning,
}

impl ShipStateMachine {
    /// Start in Pregame, with its entry queued for the owner.
    pub fn new(tuning: StateTuning) -> Self {
        let entry = enter(ShipMode::Pregame);
        Self {
            mode: entry.mode,
            visibility: entry.visibility,
            module: entry.module,
            stall_cooldown: 0.0,
            stall_commit: 0.0,
            pending: vec![entry],
            tuning,
        }
    }

    pub fn mode(&self) -> ShipMode {
        self.mode
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn active_module(&self) -> Option<BehaviourModule> {
        self.module
    }

    pub fn is_module_enabled(&self, module: BehaviourModule) -> bool {
        self.module == Some(module)
    }

    pub fn stall_cooldown(&self) -> f32 {
        self.stall_cooldown
    }

    /// Switch to `mode` immediately, overwriting whatever was active.
    pub fn set_state(&mut self, mode: ShipMode) -> ModeEntry {
        let entry = enter(mode);
        if self.mode != mode {
            log::debug!("Ship mode {} -> {}", self.mode, mode);
        }
        self.mode = entry.mode;
        self.visibility = entry.visibility;
        self.module = entry.module;
        if mode == ShipMode::Stalling {
            self.stall_commit = self.tuning.stall_commit_time;
            self.stall_cooldown = self.tuning.stall_cooldown;
        }
        self.pending.push(entry);
        entry
    }

    /// Switch by name. Unknown names are logged and ignored.
    pub fn set_state_named(&mut self, name: &str) -> Option<ModeEntry> {
        match name.parse::<ShipMode>() {
            Ok(mode) => Some(self.set_state(mode)),
            Err(e) => {
                log::warn!("Ignoring mode change: {}", e);
                None
            }
        }
    }

    /// Advance the mode timers.
    pub fn tick(&mut self, dt: f32) {
        match self.mode {
            ShipMode::Control => self.stall_cooldown -= dt,
            ShipMode::Stalling => self.stall_commit -= dt,
            _ => {}
        }
    }

    /// True once a stall has lasted long enough to be turned into a fireship dive.
    pub fn can_escape_stall(&self) -> bool {
        self.mode == ShipMode::Stalling && self.stall_commit < 0.0
    }

    /// Stall from the altitude ceiling, unless already stalling or a recent stall is cooling down.
    pub fn request_stall(&mut self) -> bool {
        if self.mode == ShipMode::Stalling || self.stall_cooldown > 0.0 {
            return false;
        }
        self.set_state(ShipMode::Stalling);
        true
    }

    /// Kill the ship unless it is already dying.
    pub fn request_death(&mut self) -> bool {
        if self.mode == ShipMode::Dying {
            return false;
        }
        self.set_state(ShipMode::Dying);
        true
    }

    /// Leave Pregame once the player touches the controller.
    pub fn try_auto_start(&mut self, any_input: bool) -> bool {
        if self.mode == ShipMode::Pregame && any_input {
            self.set_state(ShipMode::Control);
            true
        } else {
            false
        }
    }

    /// Debug cycle bound to the select button.
    pub fn cycle_debug(&mut self) -> Option<ShipMode> {
        let next = match self.mode {
            ShipMode::Roulette | ShipMode::Suicide => ShipMode::Control,
            ShipMode::Control => ShipMode::Dying,
            _ => return None,
        };
        self.set_state(next);
        Some(next)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Entries queued since the last call, oldest first.
    pub fn take_pending(&mut self) -> Vec<ModeEntry> {
        std::mem::take(&mut self.pending)
    }

    pub fn dead_zone(&self) -> f32 {
        self.tuning.any_input_dead_zone
    }
}

impl StateRequester for ShipStateMachine {
    fn request_state(&mut self, mode: ShipMode) {
        match mode {
            ShipMode::Dying => {
                self.request_death();
            }
            ShipMode::Stalling => {
                self.request_stall();
            }
            other => {
                self.set_state(other);
            }
        }
    }
}
