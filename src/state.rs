//! Per-frame vehicle state.
//!
//! [`VehicleState`] is the blackboard every controller stage reads and
//! writes through instead of calling the other stages directly. It holds the
//! current frame's classification of the vehicle (touching ground, drifting,
//! hopping, boosting, wheelieing) plus the handful of scalars that persist
//! across frames (airtime, start boost charge). It has no update logic of
//! its own beyond input classification.

use bevy::prelude::*;

use crate::intent::DriveIntent;
use crate::RaceStage;

/// Stick deflection below which lateral input is ignored.
const STICK_DEADZONE: f32 = 0.2;

/// Start boost charge gain per held frame, before the diminishing term.
const START_BOOST_CHARGE_INC: f32 = 0.02;
/// Diminishing factor applied to the charge gain as the charge fills.
const START_BOOST_CHARGE_FALLOFF: f32 = 0.018;
/// Charge retained per frame while the accelerator is released.
const START_BOOST_CHARGE_DECAY: f32 = 0.96;

/// Shared per-frame state for one vehicle.
///
/// Reset at race start and respawn; mutated every frame by the input
/// classification, movement, trick, and ground contact systems. The
/// integrator only ever reads it.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct VehicleState {
    accelerate: bool,
    brake: bool,
    drift_input: bool,
    drift_manual: bool,
    auto_drift: bool,
    hop_start: bool,
    hop: bool,
    stick_left: bool,
    stick_right: bool,
    all_wheels_collision: bool,
    touching_ground: bool,
    boost: bool,
    wheelie: bool,
    wheelie_rot: bool,
    trick_start: bool,
    in_a_trick: bool,
    trickable: bool,
    ramp_boost: bool,
    trick_up_start: bool,

    airtime: u32,
    top: Vec3,
    stick_x: f32,
    stick_y: f32,
    start_boost_charge: f32,

    prev_drift_held: bool,
    prev_trick_up_held: bool,
}

impl Default for VehicleState {
    fn default() -> Self {
        Self {
            accelerate: false,
            brake: false,
            drift_input: false,
            drift_manual: false,
            auto_drift: false,
            hop_start: false,
            hop: false,
            stick_left: false,
            stick_right: false,
            all_wheels_collision: false,
            touching_ground: false,
            boost: false,
            wheelie: false,
            wheelie_rot: false,
            trick_start: false,
            in_a_trick: false,
            trickable: false,
            ramp_boost: false,
            trick_up_start: false,
            airtime: 0,
            top: Vec3::Y,
            stick_x: 0.0,
            stick_y: 0.0,
            start_boost_charge: 0.0,
            prev_drift_held: false,
            prev_trick_up_held: false,
        }
    }
}

impl VehicleState {
    /// Create a fresh state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset everything, as on race start or respawn.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Classify this frame's raw controls into state flags.
    ///
    /// During the countdown only the start boost charge responds to input;
    /// all driving controls unlock when the race stage is reached.
    pub(crate) fn classify_input(&mut self, intent: &DriveIntent, stage: RaceStage) {
        match stage {
            RaceStage::Countdown => {
                self.accelerate = false;
                self.brake = false;
                self.drift_input = false;
                self.hop_start = false;
                self.trick_up_start = false;
                self.stick_x = 0.0;
                self.stick_y = 0.0;
                self.stick_left = false;
                self.stick_right = false;
                self.calc_start_boost(intent.accelerate);
            }
            RaceStage::Race => {
                self.accelerate = intent.accelerate;
                self.brake = intent.brake;
                self.drift_input = intent.drift;
                self.hop_start = intent.drift && !self.prev_drift_held;
                self.trick_up_start = intent.trick_up && !self.prev_trick_up_held;
                self.stick_x = intent.stick_x;
                self.stick_y = intent.stick_y;
                self.stick_left = intent.stick_x < -STICK_DEADZONE;
                self.stick_right = intent.stick_x > STICK_DEADZONE;
            }
        }
        self.prev_drift_held = intent.drift;
        self.prev_trick_up_held = intent.trick_up;
    }

    fn calc_start_boost(&mut self, accelerate: bool) {
        if accelerate {
            self.start_boost_charge += START_BOOST_CHARGE_INC
                - START_BOOST_CHARGE_FALLOFF * self.start_boost_charge;
        } else {
            self.start_boost_charge *= START_BOOST_CHARGE_DECAY;
        }
        self.start_boost_charge = self.start_boost_charge.clamp(0.0, 1.0);
    }

    /// Record this frame's ground contact classification.
    ///
    /// Written by the external collision step before the movement pipeline
    /// runs; `top` is the contact surface normal.
    pub fn set_ground_contact(&mut self, touching: bool, all_wheels: bool, top: Vec3) {
        self.touching_ground = touching;
        self.all_wheels_collision = all_wheels;
        if touching {
            self.top = top;
            self.airtime = 0;
        } else {
            self.airtime += 1;
        }
    }

    /// Whether the vehicle is drifting (manually or via automatic drift).
    pub fn is_drifting(&self) -> bool {
        self.drift_manual || self.auto_drift
    }

    pub fn is_accelerate(&self) -> bool {
        self.accelerate
    }

    pub fn is_brake(&self) -> bool {
        self.brake
    }

    pub fn is_drift_input(&self) -> bool {
        self.drift_input
    }

    pub fn is_drift_manual(&self) -> bool {
        self.drift_manual
    }

    pub fn is_auto_drift(&self) -> bool {
        self.auto_drift
    }

    pub fn is_hop_start(&self) -> bool {
        self.hop_start
    }

    pub fn is_hop(&self) -> bool {
        self.hop
    }

    pub fn is_stick_left(&self) -> bool {
        self.stick_left
    }

    pub fn is_stick_right(&self) -> bool {
        self.stick_right
    }

    pub fn is_all_wheels_collision(&self) -> bool {
        self.all_wheels_collision
    }

    pub fn is_touching_ground(&self) -> bool {
        self.touching_ground
    }

    pub fn is_boost(&self) -> bool {
        self.boost
    }

    pub fn is_wheelie(&self) -> bool {
        self.wheelie
    }

    pub fn is_wheelie_rot(&self) -> bool {
        self.wheelie_rot
    }

    pub fn is_trick_start(&self) -> bool {
        self.trick_start
    }

    pub fn is_in_a_trick(&self) -> bool {
        self.in_a_trick
    }

    pub fn is_trickable(&self) -> bool {
        self.trickable
    }

    pub fn is_ramp_boost(&self) -> bool {
        self.ramp_boost
    }

    /// Whether the wheelie trigger was pressed this frame.
    pub fn is_trick_up_start(&self) -> bool {
        self.trick_up_start
    }

    pub fn airtime(&self) -> u32 {
        self.airtime
    }

    /// Contact surface normal from the most recent grounded frame.
    pub fn top(&self) -> Vec3 {
        self.top
    }

    pub fn stick_x(&self) -> f32 {
        self.stick_x
    }

    pub fn stick_y(&self) -> f32 {
        self.stick_y
    }

    pub fn start_boost_charge(&self) -> f32 {
        self.start_boost_charge
    }

    pub fn set_accelerate(&mut self, is_set: bool) {
        self.accelerate = is_set;
    }

    pub fn set_drift_manual(&mut self, is_set: bool) {
        self.drift_manual = is_set;
    }

    pub fn set_auto_drift(&mut self, is_set: bool) {
        self.auto_drift = is_set;
    }

    pub fn set_hop(&mut self, is_set: bool) {
        self.hop = is_set;
    }

    pub fn set_boost(&mut self, is_set: bool) {
        self.boost = is_set;
    }

    pub fn set_wheelie(&mut self, is_set: bool) {
        self.wheelie = is_set;
    }

    pub fn set_wheelie_rot(&mut self, is_set: bool) {
        self.wheelie_rot = is_set;
    }

    pub fn set_trick_start(&mut self, is_set: bool) {
        self.trick_start = is_set;
    }

    pub fn set_in_a_trick(&mut self, is_set: bool) {
        self.in_a_trick = is_set;
    }

    pub fn set_trickable(&mut self, is_set: bool) {
        self.trickable = is_set;
    }

    pub fn set_ramp_boost(&mut self, is_set: bool) {
        self.ramp_boost = is_set;
    }
}
