//! Input snapshot consumed by the physics actor.
//!
//! The actor never talks to input devices. Each render frame the caller
//! fills a snapshot (typically via [`InputSnapshot::set`], which performs
//! edge detection) and hands it to the actor with
//! `PhysicsActor::capture_input`. The simulate helpers exist so that the
//! simulation itself can suppress or inject buttons mid-step.

use serde::{Deserialize, Serialize};

/// The buttons known to the physics core. FIRE1 is the jump button;
/// FIRE2..FIRE4 are reserved for action moves bound by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Button {
    Up,
    Down,
    Left,
    Right,
    Fire1,
    Fire2,
    Fire3,
    Fire4,
}

const BUTTON_COUNT: usize = 8;

impl Button {
    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

/// A record of the 8 button states plus edge-triggered "pressed" bits.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    held: [bool; BUTTON_COUNT],
    pressed: [bool; BUTTON_COUNT],
}

impl InputSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current state of a button, deriving the pressed bit from
    /// the previous held state. Call once per button per render frame.
    pub fn set(&mut self, button: Button, down: bool) {
        let i = button.index();
        self.pressed[i] = down && !self.held[i];
        self.held[i] = down;
    }

    /// Is the button currently held down?
    #[inline]
    pub fn is_down(&self, button: Button) -> bool {
        self.held[button.index()]
    }

    /// Was the button first pressed on this frame?
    #[inline]
    pub fn was_pressed(&self, button: Button) -> bool {
        self.pressed[button.index()]
    }

    /// Release every button and clear all pressed bits.
    pub fn reset(&mut self) {
        self.held = [false; BUTTON_COUNT];
        self.pressed = [false; BUTTON_COUNT];
    }

    /// Simulate that the button is held down (without a press edge).
    pub fn simulate_down(&mut self, button: Button) {
        self.held[button.index()] = true;
    }

    /// Simulate that the button was released.
    pub fn simulate_up(&mut self, button: Button) {
        let i = button.index();
        self.held[i] = false;
        self.pressed[i] = false;
    }

    /// Simulate that the button was first pressed on this frame.
    pub fn simulate_press(&mut self, button: Button) {
        let i = button.index();
        self.held[i] = true;
        self.pressed[i] = true;
    }
}
