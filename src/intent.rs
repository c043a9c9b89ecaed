//! Driver intent components.
//!
//! Intents represent the raw controls for one frame, coming from a player or
//! an AI. The controller never samples input devices itself; you write a
//! [`DriveIntent`] every frame from whatever source you have (keyboard,
//! gamepad, replay, network) and the classification system turns it into
//! per-frame state flags.

use bevy::prelude::*;

/// Direction pressed on the trick input for this frame.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrickInput {
    /// No trick input.
    #[default]
    None,
    /// Up (front flip family).
    Up,
    /// Down (back flip family).
    Down,
    /// Left (side spin).
    Left,
    /// Right (side spin).
    Right,
}

impl TrickInput {
    /// Whether any trick direction is pressed.
    pub fn is_pressed(self) -> bool {
        self != TrickInput::None
    }
}

/// Raw driver controls for one simulated frame.
///
/// # Example
///
/// ```rust
/// use kart_vehicle_controller::prelude::*;
///
/// let mut intent = DriveIntent::default();
/// intent.set_stick(0.7, 0.0);
/// intent.set_accelerate(true);
/// assert_eq!(intent.stick_x, 0.7);
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct DriveIntent {
    /// Lateral stick deflection in `[-1, 1]` (positive = right).
    pub stick_x: f32,
    /// Vertical stick deflection in `[-1, 1]` (positive = up).
    pub stick_y: f32,
    /// Whether the accelerate button is held.
    pub accelerate: bool,
    /// Whether the brake button is held.
    pub brake: bool,
    /// Whether the drift/hop button is held.
    pub drift: bool,
    /// Trick direction pressed this frame.
    pub trick: TrickInput,
    /// Whether the wheelie trigger is pressed (two-wheeled vehicles only).
    pub trick_up: bool,
}

impl DriveIntent {
    /// Create a new empty intent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set both stick axes, clamped to `[-1, 1]`.
    pub fn set_stick(&mut self, x: f32, y: f32) {
        self.stick_x = x.clamp(-1.0, 1.0);
        self.stick_y = y.clamp(-1.0, 1.0);
    }

    /// Set the accelerate button state.
    pub fn set_accelerate(&mut self, held: bool) {
        self.accelerate = held;
    }

    /// Set the brake button state.
    pub fn set_brake(&mut self, held: bool) {
        self.brake = held;
    }

    /// Set the drift/hop button state.
    ///
    /// Call this every frame with the current state; the classification
    /// system detects the rising edge that starts a hop.
    pub fn set_drift(&mut self, held: bool) {
        self.drift = held;
    }

    /// Set the trick direction for this frame.
    pub fn set_trick(&mut self, trick: TrickInput) {
        self.trick = trick;
    }

    /// Set the wheelie trigger state.
    pub fn set_trick_up(&mut self, pressed: bool) {
        self.trick_up = pressed;
    }

    /// Clear all controls.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_default_is_neutral() {
        let intent = DriveIntent::new();
        assert_eq!(intent.stick_x, 0.0);
        assert_eq!(intent.stick_y, 0.0);
        assert!(!intent.accelerate);
        assert!(!intent.drift);
        assert_eq!(intent.trick, TrickInput::None);
    }

    #[test]
    fn stick_is_clamped() {
        let mut intent = DriveIntent::new();
        intent.set_stick(2.0, -3.0);
        assert_eq!(intent.stick_x, 1.0);
        assert_eq!(intent.stick_y, -1.0);
    }

    #[test]
    fn trick_input_pressed() {
        assert!(!TrickInput::None.is_pressed());
        assert!(TrickInput::Up.is_pressed());
        assert!(TrickInput::Left.is_pressed());
    }

    #[test]
    fn clear_resets_everything() {
        let mut intent = DriveIntent::new();
        intent.set_stick(1.0, 1.0);
        intent.set_accelerate(true);
        intent.set_drift(true);
        intent.set_trick(TrickInput::Down);
        intent.clear();
        assert_eq!(intent.stick_x, 0.0);
        assert!(!intent.accelerate);
        assert!(!intent.drift);
        assert_eq!(intent.trick, TrickInput::None);
    }
}
