//! Gamepad input state and the mapping from raw controller axes to ship controls.
//!
//! The host polls the physical pads; this crate only sees one [`GamepadFrame`]
//! per player per frame and tracks button edges across frames.

use engine_core::PlayerSlot;
use glam::Vec2;
use std::collections::HashSet;

/// Default dead zone for "has this player touched the controller yet".
pub const ANY_INPUT_DEAD_ZONE: f32 = 0.25;

/// Digital gamepad buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GamepadButton {
    BumperLeft,
    BumperRight,
    FaceDown,
    FaceUp,
    FaceLeft,
    FaceRight,
    ClickLeft,
    ClickRight,
    Start,
    Select,
}

impl GamepadButton {
    pub const ALL: [GamepadButton; 10] = [
        GamepadButton::BumperLeft,
        GamepadButton::BumperRight,
        GamepadButton::FaceDown,
        GamepadButton::FaceUp,
        GamepadButton::FaceLeft,
        GamepadButton::FaceRight,
        GamepadButton::ClickLeft,
        GamepadButton::ClickRight,
        GamepadButton::Start,
        GamepadButton::Select,
    ];
}

/// Button transition reported by the pad layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementState {
    Pressed,
    Released,
}

/// One frame of raw controller state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GamepadFrame {
    /// Left stick, x = right, y = up.
    pub left_stick: Vec2,
    /// Right (camera) stick.
    pub right_stick: Vec2,
    /// Combined trigger axis as the pad reports it: negative = right trigger.
    pub triggers: f32,
    /// D-pad, y < 0 when pressed down.
    pub dpad: Vec2,
    /// Buttons held this frame.
    pub buttons: HashSet<GamepadButton>,
}

impl GamepadFrame {
    pub fn with_left_stick(mut self, x: f32, y: f32) -> Self {
        self.left_stick = Vec2::new(x, y);
        self
    }

    pub fn with_triggers(mut self, triggers: f32) -> Self {
        self.triggers = triggers;
        self
    }

    pub fn with_dpad(mut self, x: f32, y: f32) -> Self {
        self.dpad = Vec2::new(x, y);
        self
    }

    pub fn with_button(mut self, button: GamepadButton) -> Self {
        self.buttons.insert(button);
        self
    }

    pub fn is_held(&self, button: GamepadButton) -> bool {
        self.buttons.contains(&button)
    }

    /// True if any button is held or any analogue axis is past `dead_zone`.
    pub fn any_input(&self, dead_zone: f32) -> bool {
        let axes = [
            self.triggers,
            self.left_stick.x,
            self.left_stick.y,
            self.right_stick.x,
            self.right_stick.y,
        ];
        !self.buttons.is_empty() || axes.iter().any(|a| a.abs() >= dead_zone)
    }

    /// Map the raw frame onto the controls a ship consumes.
    ///
    /// The trigger axis is negated so that pulling the forward trigger yields
    /// positive throttle.
    pub fn ship_controls(&self) -> ShipControls {
        ShipControls {
            pitch: self.left_stick.y,
            yaw: self.left_stick.x,
            // No stick drives roll; ships bank through yaw coupling.
            roll: 0.0,
            throttle: -self.triggers,
            bumper_left: self.is_held(GamepadButton::BumperLeft),
            bumper_right: self.is_held(GamepadButton::BumperRight),
            dpad_vertical: self.dpad.y,
            face_up: self.is_held(GamepadButton::FaceUp),
            face_down: self.is_held(GamepadButton::FaceDown),
            face_left: self.is_held(GamepadButton::FaceLeft),
            face_right: self.is_held(GamepadButton::FaceRight),
        }
    }
}

/// Controls consumed by the ship behaviours, already in ship convention.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShipControls {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
    pub throttle: f32,
    pub bumper_left: bool,
    pub bumper_right: bool,
    pub dpad_vertical: f32,
    pub face_up: bool,
    pub face_down: bool,
    pub face_left: bool,
    pub face_right: bool,
}

/// Manages input state for one player across frames.
#[derive(Debug)]
pub struct InputState {
    player: PlayerSlot,
    /// Latest analogue state and held buttons.
    frame: GamepadFrame,
    /// Buttons pressed this frame.
    pressed: HashSet<GamepadButton>,
    /// Buttons released this frame.
    released: HashSet<GamepadButton>,
    /// Threshold for `active`, shared with whatever decides "the player is playing".
    dead_zone: f32,
    /// Whether `any_input` held on the previous frame.
    was_active: bool,
    /// Whether `any_input` holds this frame.
    active: bool,
}

impl InputState {
    pub fn new(player: PlayerSlot) -> Self {
        Self::with_dead_zone(player, ANY_INPUT_DEAD_ZONE)
    }

    pub fn with_dead_zone(player: PlayerSlot, dead_zone: f32) -> Self {
        Self {
            player,
            frame: GamepadFrame::default(),
            pressed: HashSet::new(),
            released: HashSet::new(),
            dead_zone,
            was_active: false,
            active: false,
        }
    }

    pub fn dead_zone(&self) -> f32 {
        self.dead_zone
    }

    pub fn player(&self) -> PlayerSlot {
        self.player
    }

    /// Clear per-frame edges. Call at the start of each frame.
    pub fn begin_frame(&mut self) {
        self.pressed.clear();
        self.released.clear();
        self.was_active = self.active;
    }

    /// Process a single button transition.
    pub fn process_button(&mut self, button: GamepadButton, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.frame.buttons.contains(&button) {
                    self.pressed.insert(button);
                }
                self.frame.buttons.insert(button);
            }
            ElementState::Released => {
                if self.frame.buttons.remove(&button) {
                    self.released.insert(button);
                }
            }
        }
        self.active = self.frame.any_input(self.dead_zone);
    }

    /// Replace the whole controller state, deriving button edges from the difference.
    pub fn apply_frame(&mut self, frame: &GamepadFrame) {
        for button in GamepadButton::ALL {
            match (self.frame.is_held(button), frame.is_held(button)) {
                (false, true) => self.process_button(button, ElementState::Pressed),
                (true, false) => self.process_button(button, ElementState::Released),
                _ => {}
            }
        }
        self.frame.left_stick = frame.left_stick;
        self.frame.right_stick = frame.right_stick;
        self.frame.triggers = frame.triggers;
        self.frame.dpad = frame.dpad;
        self.active = self.frame.any_input(self.dead_zone);
    }

    pub fn frame(&self) -> &GamepadFrame {
        &self.frame
    }

    pub fn is_held(&self, button: GamepadButton) -> bool {
        self.frame.is_held(button)
    }

    pub fn is_pressed(&self, button: GamepadButton) -> bool {
        self.pressed.contains(&button)
    }

    pub fn is_released(&self, button: GamepadButton) -> bool {
        self.released.contains(&button)
    }

    /// True if anything is past the dead zone this frame.
    pub fn any_input(&self, dead_zone: f32) -> bool {
        self.frame.any_input(dead_zone)
    }

    /// True on the frame the player lets go of everything after holding something.
    pub fn all_released(&self) -> bool {
        self.was_active && !self.active
    }

    pub fn ship_controls(&self) -> ShipControls {
        self.frame.ship_controls()
    }
}
