//! Aerial trick state machine.
//!
//! A trick input is buffered for a short window; if the vehicle leaves the
//! ground off a trickable edge within that window (and is going fast
//! enough), a trick starts and its rotation integrates frame by frame from a
//! per-weight-class parameter table. The accumulated rotation is exposed as
//! a quaternion that the transform sync composes on top of the physical
//! orientation; it never feeds back into the integrator, so a trick cannot
//! corrupt the rigid-body pose.

use bevy::prelude::*;

use crate::config::VehicleStats;
use crate::intent::TrickInput;
use crate::state::VehicleState;

/// Frames a trick input stays buffered waiting for takeoff.
const TRICK_ALLOW_WINDOW: u16 = 14;
/// Frames after a trick ends before another can start.
const TRICK_COOLDOWN: u16 = 5;
/// Airtime range (inclusive) in which a buffered trick may start.
const TRICK_MIN_AIRTIME: u32 = 3;
const TRICK_MAX_AIRTIME: u32 = 10;
/// Minimum capped speed ratio to start a trick.
const TRICK_MIN_SPEED_RATIO: f32 = 0.5;

/// Rotation-rate decay floor and per-frame decrement.
const ANGLE_DELTA_FACTOR_MIN: f32 = 0.5;
const ANGLE_DELTA_FACTOR_DECREMENT: f32 = 0.05;
/// Slowest the rotation rate may get, in degrees per frame.
const ANGLE_DELTA_MIN: f32 = 2.0;

/// `(final angle, initial degrees per frame)` indexed by
/// `[weight class][column]`; columns are flip, spin, ramp trick.
const ANGLE_PROPERTIES: [[(f32, f32); 3]; 3] = [
    [(40.0, 15.0), (45.0, 20.0), (45.0, 20.0)],
    [(36.0, 13.0), (42.0, 18.0), (42.0, 18.0)],
    [(32.0, 11.0), (39.0, 16.0), (16.0, 1.0)],
];

const FLIP_COLUMN: usize = 0;
const SPIN_COLUMN: usize = 1;
const RAMP_COLUMN: usize = 2;

/// Trick family, fixing the rotation axis.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrickKind {
    /// Pitch rotation, nose first.
    FrontFlip,
    /// Pitch rotation, tail first.
    BackFlip,
    /// Yaw spin.
    Spin,
}

/// A trick in progress.
#[derive(Reflect, Debug, Clone)]
pub struct ActiveTrick {
    kind: TrickKind,
    /// Rotation direction, -1 or 1.
    sign: f32,
    final_angle: f32,
    angle: f32,
    angle_delta: f32,
    angle_delta_factor: f32,
}

impl ActiveTrick {
    fn new(kind: TrickKind, sign: f32, final_angle: f32, initial_delta: f32) -> Self {
        Self {
            kind,
            sign,
            final_angle,
            angle: 0.0,
            angle_delta: initial_delta,
            angle_delta_factor: 1.0,
        }
    }

    /// Advance one frame; the rotation rate only ever slows down.
    fn advance(&mut self) -> Quat {
        self.angle_delta_factor =
            (self.angle_delta_factor - ANGLE_DELTA_FACTOR_DECREMENT).max(ANGLE_DELTA_FACTOR_MIN);
        self.angle_delta = (self.angle_delta * self.angle_delta_factor).max(ANGLE_DELTA_MIN);
        self.angle = (self.angle + self.angle_delta).min(self.final_angle);

        let axis = match self.kind {
            TrickKind::FrontFlip | TrickKind::BackFlip => Vec3::X,
            TrickKind::Spin => Vec3::Y,
        };
        Quat::from_axis_angle(axis, (self.sign * self.angle).to_radians())
    }

    pub fn kind(&self) -> TrickKind {
        self.kind
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn angle_delta(&self) -> f32 {
        self.angle_delta
    }

    pub fn final_angle(&self) -> f32 {
        self.final_angle
    }
}

/// Trick controller state for one vehicle.
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct KartTrick {
    cooldown: u16,
    next_input: TrickInput,
    next_allow_timer: u16,
    rot: Quat,
    active: Option<ActiveTrick>,
}

impl KartTrick {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the trick state machine for one frame.
    pub fn calc(
        &mut self,
        trick_input: TrickInput,
        stats: &VehicleStats,
        state: &mut VehicleState,
        speed_ratio_capped: f32,
    ) {
        if self.cooldown > 0 {
            self.cooldown -= 1;
        }
        state.set_trick_start(false);

        // Buffer the most recent input for a short takeoff window.
        if trick_input.is_pressed() {
            self.next_input = trick_input;
            self.next_allow_timer = TRICK_ALLOW_WINDOW;
        } else if self.next_allow_timer > 0 {
            self.next_allow_timer -= 1;
            if self.next_allow_timer == 0 {
                self.next_input = TrickInput::None;
            }
        }

        if self.active.is_some() {
            if state.is_touching_ground() {
                self.land(state);
            } else if let Some(active) = &mut self.active {
                self.rot = active.advance();
            }
            return;
        }

        if self.cooldown == 0
            && self.next_input.is_pressed()
            && !state.is_touching_ground()
            && (TRICK_MIN_AIRTIME..=TRICK_MAX_AIRTIME).contains(&state.airtime())
            && speed_ratio_capped > TRICK_MIN_SPEED_RATIO
            && state.is_trickable()
        {
            self.start(stats, state);
        }
    }

    fn start(&mut self, stats: &VehicleStats, state: &mut VehicleState) {
        let (kind, sign, column) = match self.next_input {
            TrickInput::Up => (TrickKind::FrontFlip, -1.0, FLIP_COLUMN),
            TrickInput::Down => (TrickKind::BackFlip, 1.0, FLIP_COLUMN),
            TrickInput::Left => (TrickKind::Spin, 1.0, SPIN_COLUMN),
            TrickInput::Right => (TrickKind::Spin, -1.0, SPIN_COLUMN),
            TrickInput::None => return,
        };
        let column = if state.is_ramp_boost() { RAMP_COLUMN } else { column };
        let (final_angle, initial_delta) = ANGLE_PROPERTIES[stats.weight_class.index()][column];

        self.active = Some(ActiveTrick::new(kind, sign, final_angle, initial_delta));
        self.next_input = TrickInput::None;
        self.next_allow_timer = 0;
        self.cooldown = TRICK_COOLDOWN;
        state.set_trick_start(true);
        state.set_in_a_trick(true);
    }

    fn land(&mut self, state: &mut VehicleState) {
        self.active = None;
        self.rot = Quat::IDENTITY;
        state.set_in_a_trick(false);
        self.cooldown = TRICK_COOLDOWN;
    }

    /// Cancel any trick and clear the buffer, as on respawn.
    pub fn reset(&mut self, state: &mut VehicleState) {
        self.active = None;
        self.rot = Quat::IDENTITY;
        self.next_input = TrickInput::None;
        self.next_allow_timer = 0;
        self.cooldown = 0;
        state.set_in_a_trick(false);
        state.set_trick_start(false);
    }

    /// Accumulated trick rotation, composed onto the visual orientation.
    pub fn rot(&self) -> Quat {
        self.rot
    }

    pub fn active(&self) -> Option<&ActiveTrick> {
        self.active.as_ref()
    }
}
