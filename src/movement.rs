//! Per-frame movement controller.
//!
//! [`KartMove`] turns the frame's classified input and ground contact into
//! velocity and rotation commands for [`KartDynamics`](crate::dynamics). It
//! owns the drift state machine, the speed limits, the acceleration curve
//! evaluation, and the two-wheeled lean/wheelie/dive behavior.
//!
//! Every scalar in this module is gameplay tuning; the constants are named
//! and used exactly once each so a tuning pass touches one line per knob.
//! Update order within [`KartMove::calc`] is load-bearing: speed reads the
//! turn computed this frame, rotation reads the speed, and reordering the
//! steps changes trajectories.

use bevy::prelude::*;

use crate::boost::{BoostKind, KartBoost};
use crate::config::{CurvePoint, DriftType, VehicleKind, VehicleStats};
use crate::dynamics::KartDynamics;
use crate::state::VehicleState;
use crate::RaceStage;

/// Hard ceiling on the soft speed limit, in distance units per frame.
const HARD_SPEED_LIMIT: f32 = 120.0;
/// Soft speed limit decay toward its target, per frame, when above it.
const SOFT_LIMIT_DECAY: f32 = 3.0;
/// Fraction of base speed required before a hop can become a drift.
const MIN_DRIFT_THRESHOLD: f32 = 0.55;
/// Mini-turbo charge ceiling.
const MAX_MT_CHARGE: u16 = 270;
/// Mini-turbo charge gained every charging frame.
const BASE_MT_CHARGE: u16 = 2;
/// Extra charge gained when the stick is held against the drift.
const EXTRA_MT_CHARGE: u16 = 3;
/// Counter-stick deflection needed for the extra charge.
const BONUS_CHARGE_STICK_THRESHOLD: f32 = 0.4;

/// Blend weight of the smoothed turn while drifting.
const DRIFT_TURN_BLEND: f32 = 0.8;
/// Blend weight of the hop offset while drifting.
const DRIFT_TURN_HOP_BIAS: f32 = 0.2;
/// Turn authority multiplier while wheelieing.
const WHEELIE_TURN_FACTOR: f32 = 0.2;
/// Turn authority multiplier while hopping in the air.
const HOP_AIRBORNE_TURN_FACTOR: f32 = 1.4;
/// Speed below which steering produces no rotation.
const MIN_TURN_SPEED: f32 = 1.0;
/// Speed at and above which turn authority is halved.
const HIGH_SPEED_TURN_THRESHOLD: f32 = 70.0;
const HIGH_SPEED_TURN_FACTOR: f32 = 0.5;

/// Smoothed-up blend rate bounds; blending slows as the surface pitches
/// against the chassis forward.
const SMOOTHED_UP_BLEND_BASE: f32 = 0.8;
const SMOOTHED_UP_BLEND_PITCH_SCALE: f32 = 6.0;
const SMOOTHED_UP_BLEND_MIN: f32 = 0.3;
/// Orientation pull toward the blended up, with full and with partial wheel
/// contact.
const STABILIZATION_FULL_CONTACT: f32 = 0.1;
const STABILIZATION_PARTIAL_CONTACT: f32 = 0.22;
/// Fraction of the direction correction kept for the next frame.
const DIR_DIFF_DECAY: f32 = 0.1;
/// Airtime beyond which the facing direction freezes.
const DIR_FREEZE_AIRTIME: u32 = 5;

/// Velocity-direction convergence toward facing, degrees per frame.
const VEL_DIR_ROT_GROUNDED_DEG: f32 = 0.2;
const VEL_DIR_ROT_AIRBORNE_DEG: f32 = 0.5;

/// Passive speed retention when coasting.
const COAST_DRAG: f32 = 0.98;
/// Speed retention per airborne frame.
const AIRBORNE_DRAG: f32 = 0.999;
/// Braking deceleration per frame.
const BRAKE_DECELERATION: f32 = 1.5;
/// Speed target bonus added to the boost multiplier during a wheelie.
const WHEELIE_SPEED_BONUS: f32 = 0.15;

/// Initial vertical hop velocity.
const HOP_VEL: f32 = 10.0;
/// Hop velocity retained per frame before gravity.
const HOP_VEL_DECAY: f32 = 0.998;

/// Wheelie pose step per active frame and its cap.
const WHEELIE_ROT_STEP: f32 = 0.01;
const MAX_WHEELIE_ROT: f32 = 0.07;
/// Pitch angular velocity retained per wheelie frame.
const WHEELIE_PITCH_DAMPING: f32 = 0.9;
/// Frames after which an invalid wheelie is dropped.
const FAILED_WHEELIE_FRAMES: u32 = 15;
/// Frames after which any wheelie is dropped.
const MAX_WHEELIE_FRAMES: u32 = 180;
/// Frames before another wheelie may start.
const WHEELIE_COOLDOWN: u16 = 20;
/// Wheelie pose decay acceleration and its floor.
const WHEELIE_ROT_DEC_STEP: f32 = 0.001;
const MIN_WHEELIE_ROT_DEC: f32 = -0.03;
/// Minimum capped speed ratio for a wheelie to stay valid.
const WHEELIE_MIN_SPEED_RATIO: f32 = 0.3;

/// Lean buildup per frame and cap, during the race and the countdown.
const LEAN_ROT_INC_RACE: f32 = 0.1;
const LEAN_ROT_CAP_RACE: f32 = 1.0;
const LEAN_ROT_INC_COUNTDOWN: f32 = 0.08;
const LEAN_ROT_CAP_COUNTDOWN: f32 = 0.6;
/// Lean bounds while drifting, on the side picked by the hop offset.
const DRIFT_LEAN_MIN: f32 = 0.7;
const DRIFT_LEAN_MAX: f32 = 1.5;
/// Stick-driven lean step while not drifting.
const LEAN_STICK_STEP: f32 = 0.05;
/// Lean retained per frame with no stick input or during a wheelie.
const LEAN_ROT_DECAY: f32 = 0.9;
/// Sideways velocity nudge per unit of lean.
const DRIFT_LEAN_VEL_SCALAR: f32 = 0.065;
const LEAN_VEL_SCALAR: f32 = 0.05;
/// Visual roll angle per unit of lean, in radians.
const LEAN_VISUAL_SCALAR: f32 = 0.65;

/// Dive pitch retention per frame, stick gain, airtime scale, and cap.
const DIVE_ROT_DECAY: f32 = 0.96;
const DIVE_STICK_SCALAR: f32 = 0.005;
const DIVE_AIRTIME_SCALE: f32 = 50.0;
const DIVE_ROT_CAP: f32 = 0.8;

/// Standstill pitch response to the start boost charge and to speed changes.
const STANDSTILL_CHARGE_ROT_SCALAR: f32 = 0.015;
const STANDSTILL_SPEED_DIFF_CAP: f32 = 3.0;
const STANDSTILL_DIFF_SCALAR: f32 = 0.15;
const STANDSTILL_ROT_SCALAR: f32 = 0.08;
const STANDSTILL_BLEND: f32 = 0.2;

/// Manual drift progression.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriftState {
    #[default]
    NotDrifting,
    ChargingMiniTurbo,
    ChargedMiniTurbo,
    /// Reachable only by drift types that are not implemented yet; releasing
    /// from this state is a fatal error.
    ChargedSuperMiniTurbo,
}

/// Movement controller state for one vehicle.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct KartMove {
    base_speed: f32,
    soft_speed_limit: f32,
    hard_speed_limit: f32,
    speed: f32,
    last_speed: f32,
    acceleration: f32,
    speed_ratio_capped: f32,

    up: Vec3,
    smoothed_up: Vec3,
    dir: Vec3,
    vel_dir: Vec3,
    dir_diff: Vec3,
    stabilization: f32,

    raw_turn: f32,
    weighted_turn: f32,
    real_turn: f32,

    drift_state: DriftState,
    mt_charge: u16,
    hop_stick_x: f32,
    hop_frame: u32,
    hop_dir: Vec3,
    hop_vel_y: f32,
    hop_pos_y: f32,
    hop_gravity: f32,

    surface_rot_factor: f32,
    kcl_rot_factor: f32,

    lean_rot: f32,
    lean_rot_inc: f32,
    lean_rot_cap: f32,
    wheelie_frames: u32,
    wheelie_cooldown: u16,
    wheelie_rot: f32,
    wheelie_rot_dec: f32,
    dive_rot: f32,
    standstill_boost_rot: f32,
}

impl KartMove {
    pub fn new(stats: &VehicleStats) -> Self {
        Self {
            base_speed: stats.base_speed,
            soft_speed_limit: stats.base_speed,
            hard_speed_limit: HARD_SPEED_LIMIT,
            speed: 0.0,
            last_speed: 0.0,
            acceleration: 0.0,
            speed_ratio_capped: 0.0,
            up: Vec3::Y,
            smoothed_up: Vec3::Y,
            dir: Vec3::Z,
            vel_dir: Vec3::Z,
            dir_diff: Vec3::ZERO,
            stabilization: STABILIZATION_FULL_CONTACT,
            raw_turn: 0.0,
            weighted_turn: 0.0,
            real_turn: 0.0,
            drift_state: DriftState::NotDrifting,
            mt_charge: 0,
            hop_stick_x: 0.0,
            hop_frame: 0,
            hop_dir: Vec3::Z,
            hop_vel_y: 0.0,
            hop_pos_y: 0.0,
            hop_gravity: 0.0,
            surface_rot_factor: 1.0,
            kcl_rot_factor: 1.0,
            lean_rot: 0.0,
            lean_rot_inc: LEAN_ROT_INC_RACE,
            lean_rot_cap: LEAN_ROT_CAP_RACE,
            wheelie_frames: 0,
            wheelie_cooldown: 0,
            wheelie_rot: 0.0,
            wheelie_rot_dec: 0.0,
            dive_rot: 0.0,
            standstill_boost_rot: 0.0,
        }
    }

    /// Run the movement pipeline for one frame.
    ///
    /// Reads the classified [`VehicleState`], ticks boosts, and leaves
    /// velocity and angular-velocity commands in [`KartDynamics`] for the
    /// integration step that follows.
    pub fn calc(
        &mut self,
        stats: &VehicleStats,
        state: &mut VehicleState,
        boost: &mut KartBoost,
        dynamics: &mut KartDynamics,
        stage: RaceStage,
    ) {
        self.calc_top(state, dynamics);
        self.calc_dirs(state, dynamics);
        self.calc_offroad(state);
        self.calc_turn(stats, state);
        if !state.is_auto_drift() {
            self.calc_manual_drift(stats, state, boost, dynamics);
        }
        if state.is_hop() {
            self.calc_hop_physics();
        }
        if stats.kind == VehicleKind::Bike {
            self.calc_wheelie(state, dynamics);
        }
        state.set_boost(boost.calc());
        self.calc_vehicle_speed(stats, state, boost, dynamics, stage);
        self.calc_vehicle_rotation(stats, state, dynamics, stage);
    }

    /// Track the ground normal with the smoothed up vector, blending slower
    /// the more the surface pitches against the chassis, and pick the
    /// upright stabilization factor from the wheel contact count.
    fn calc_top(&mut self, state: &VehicleState, dynamics: &KartDynamics) {
        if !state.is_touching_ground() {
            return;
        }
        self.up = state.top();
        let forward = dynamics.main_rot() * Vec3::Z;
        let pitch = self.up.dot(forward).abs();
        let blend = (SMOOTHED_UP_BLEND_BASE - SMOOTHED_UP_BLEND_PITCH_SCALE * pitch)
            .clamp(SMOOTHED_UP_BLEND_MIN, SMOOTHED_UP_BLEND_BASE);
        self.smoothed_up += (self.up - self.smoothed_up) * blend;
        if self.smoothed_up.length_squared() > f32::EPSILON {
            self.smoothed_up = self.smoothed_up.normalize();
        } else {
            self.smoothed_up = Vec3::Y;
        }

        self.stabilization = if state.is_all_wheels_collision() {
            STABILIZATION_FULL_CONTACT
        } else {
            STABILIZATION_PARTIAL_CONTACT
        };
    }

    /// Steer the persistent facing direction toward the orientation-derived
    /// forward, with a rate-limited correction that never overshoots.
    fn calc_dirs(&mut self, state: &VehicleState, dynamics: &KartDynamics) {
        if state.airtime() > DIR_FREEZE_AIRTIME {
            return;
        }
        let right = dynamics.main_rot() * Vec3::X;
        let candidate = right.cross(self.smoothed_up);
        if candidate.length_squared() <= f32::EPSILON {
            return;
        }
        let candidate = candidate.normalize();

        let prev_cross = self.dir.cross(candidate);
        self.dir_diff += (candidate - self.dir) * self.kcl_rot_factor;
        let next = self.dir + self.dir_diff;
        if next.length_squared() <= f32::EPSILON {
            return;
        }
        let next = next.normalize();
        if prev_cross.dot(next.cross(candidate)) < 0.0 {
            // Crossed past the target; snap instead of oscillating.
            self.dir = candidate;
            self.dir_diff = Vec3::ZERO;
        } else {
            self.dir = next;
            self.dir_diff *= DIR_DIFF_DECAY;
        }
    }

    fn calc_offroad(&mut self, state: &VehicleState) {
        if state.is_touching_ground() {
            self.kcl_rot_factor = self.surface_rot_factor;
        }
    }

    fn calc_turn(&mut self, stats: &VehicleStats, state: &VehicleState) {
        self.raw_turn = if !state.is_hop() || self.hop_stick_x == 0.0 {
            -state.stick_x()
        } else {
            self.hop_stick_x
        };
        let reactivity = if state.is_drifting() {
            stats.drift_reactivity
        } else {
            stats.handling_reactivity
        };
        self.weighted_turn = (self.raw_turn * reactivity
            + self.weighted_turn * (1.0 - reactivity))
            .clamp(-1.0, 1.0);

        self.real_turn = self.weighted_turn;
        if state.is_drifting() {
            self.real_turn = (DRIFT_TURN_BLEND * (0.5 * (self.weighted_turn + self.hop_stick_x))
                + DRIFT_TURN_HOP_BIAS * self.hop_stick_x)
                .clamp(-1.0, 1.0);
        }
    }

    /// Drift state machine: hop, charge, release.
    fn calc_manual_drift(
        &mut self,
        stats: &VehicleStats,
        state: &mut VehicleState,
        boost: &mut KartBoost,
        dynamics: &KartDynamics,
    ) {
        if state.is_hop_start() && !state.is_hop() && !state.is_in_a_trick() {
            self.hop(state, dynamics);
        } else if state.is_hop() && self.hop_stick_x == 0.0 {
            self.capture_hop_stick(state);
        }

        match self.drift_state {
            DriftState::NotDrifting => {
                if state.is_hop() && state.is_touching_ground() && self.hop_frame > 0 {
                    if state.is_drift_input()
                        && self.hop_stick_x != 0.0
                        && self.speed >= MIN_DRIFT_THRESHOLD * self.base_speed
                    {
                        self.start_manual_drift(stats, state);
                    } else {
                        self.end_hop(state);
                    }
                }
            }
            DriftState::ChargingMiniTurbo | DriftState::ChargedMiniTurbo => {
                if !state.is_drift_input() || !state.is_accelerate() {
                    // Releasing in the air holds the charge until landing.
                    if state.is_touching_ground() {
                        self.release_mt(stats, state, boost);
                    }
                } else if state.is_touching_ground()
                    && self.drift_state == DriftState::ChargingMiniTurbo
                {
                    self.calc_mt_charge(state);
                }
            }
            DriftState::ChargedSuperMiniTurbo => {
                if !state.is_drift_input() || !state.is_accelerate() {
                    panic!("super mini-turbo release is not supported yet");
                }
            }
        }
    }

    fn hop(&mut self, state: &mut VehicleState, dynamics: &KartDynamics) {
        state.set_hop(true);
        self.hop_stick_x = 0.0;
        self.hop_frame = 0;
        self.hop_dir = self.dir;
        self.hop_vel_y = HOP_VEL;
        self.hop_pos_y = 0.0;
        self.hop_gravity = dynamics.gravity();
        self.capture_hop_stick(state);
        self.cancel_wheelie(state);
    }

    /// Latch the hop offset the first time the stick deflects sideways.
    fn capture_hop_stick(&mut self, state: &mut VehicleState) {
        if state.is_stick_right() {
            self.hop_stick_x = -1.0;
        } else if state.is_stick_left() {
            self.hop_stick_x = 1.0;
        }
        if self.hop_stick_x != 0.0 {
            self.cancel_wheelie(state);
        }
    }

    fn calc_hop_physics(&mut self) {
        self.hop_vel_y = self.hop_vel_y * HOP_VEL_DECAY + self.hop_gravity;
        self.hop_pos_y += self.hop_vel_y;
        if self.hop_pos_y < 0.0 {
            self.hop_pos_y = 0.0;
            self.hop_vel_y = 0.0;
        }
        self.hop_frame += 1;
    }

    fn start_manual_drift(&mut self, stats: &VehicleStats, state: &mut VehicleState) {
        if stats.drift_type != DriftType::InsideBike {
            panic!(
                "drift type {:?} is not supported yet; only InsideBike drifts",
                stats.drift_type
            );
        }
        state.set_hop(false);
        state.set_drift_manual(true);
        self.drift_state = DriftState::ChargingMiniTurbo;
        self.mt_charge = 0;
        // The hop offset stays latched for the drift, but the arc is over.
        self.hop_pos_y = 0.0;
        self.hop_vel_y = 0.0;
    }

    fn end_hop(&mut self, state: &mut VehicleState) {
        state.set_hop(false);
        self.hop_stick_x = 0.0;
        self.hop_frame = 0;
        self.hop_pos_y = 0.0;
        self.hop_vel_y = 0.0;
    }

    fn calc_mt_charge(&mut self, state: &VehicleState) {
        self.mt_charge += BASE_MT_CHARGE;
        if -self.hop_stick_x * state.stick_x() > BONUS_CHARGE_STICK_THRESHOLD {
            self.mt_charge += EXTRA_MT_CHARGE;
        }
        if self.mt_charge >= MAX_MT_CHARGE {
            self.mt_charge = MAX_MT_CHARGE;
            self.drift_state = DriftState::ChargedMiniTurbo;
        }
    }

    fn release_mt(&mut self, stats: &VehicleStats, state: &mut VehicleState, boost: &mut KartBoost) {
        if self.drift_state == DriftState::ChargedMiniTurbo {
            boost.activate(BoostKind::AllMt, stats.mini_turbo_frames);
        }
        self.drift_state = DriftState::NotDrifting;
        self.mt_charge = 0;
        state.set_drift_manual(false);
        self.end_hop(state);
    }

    /// Wheelie sub-state: trigger, validity grace, pose buildup and decay.
    fn calc_wheelie(&mut self, state: &mut VehicleState, dynamics: &mut KartDynamics) {
        if self.wheelie_cooldown > 0 {
            self.wheelie_cooldown -= 1;
        }

        if state.is_trick_up_start()
            && !state.is_wheelie()
            && !state.is_hop()
            && !state.is_drifting()
            && state.is_touching_ground()
            && self.wheelie_cooldown == 0
        {
            self.start_wheelie(state);
        }

        if state.is_wheelie() {
            self.wheelie_frames += 1;
            if self.wheelie_frames >= MAX_WHEELIE_FRAMES
                || (!self.can_wheelie() && self.wheelie_frames >= FAILED_WHEELIE_FRAMES)
            {
                self.cancel_wheelie(state);
            } else {
                state.set_wheelie_rot(true);
                self.wheelie_rot = (self.wheelie_rot + WHEELIE_ROT_STEP).min(MAX_WHEELIE_ROT);
                let mut ang_vel0 = dynamics.ang_vel0();
                ang_vel0.x *= WHEELIE_PITCH_DAMPING;
                dynamics.set_ang_vel0(ang_vel0);
            }
        } else if self.wheelie_rot > 0.0 {
            self.wheelie_rot_dec = (self.wheelie_rot_dec - WHEELIE_ROT_DEC_STEP)
                .max(MIN_WHEELIE_ROT_DEC);
            self.wheelie_rot += self.wheelie_rot_dec;
            if self.wheelie_rot <= 0.0 {
                self.wheelie_rot = 0.0;
                state.set_wheelie_rot(false);
            }
        }
    }

    fn start_wheelie(&mut self, state: &mut VehicleState) {
        state.set_wheelie(true);
        self.wheelie_frames = 0;
        self.wheelie_rot_dec = 0.0;
        self.wheelie_cooldown = WHEELIE_COOLDOWN;
    }

    /// Drop an active wheelie. Safe to call when none is active.
    pub fn cancel_wheelie(&mut self, state: &mut VehicleState) {
        if state.is_wheelie() {
            state.set_wheelie(false);
            self.wheelie_frames = 0;
            self.wheelie_cooldown = WHEELIE_COOLDOWN;
        }
    }

    fn can_wheelie(&self) -> bool {
        self.speed_ratio_capped >= WHEELIE_MIN_SPEED_RATIO && self.speed >= 0.0
    }

    fn calc_vehicle_speed(
        &mut self,
        stats: &VehicleStats,
        state: &VehicleState,
        boost: &KartBoost,
        dynamics: &mut KartDynamics,
        stage: RaceStage,
    ) {
        self.last_speed = self.speed;
        if stage == RaceStage::Race && !state.is_drift_manual() {
            self.speed += dynamics.speed_fix();
        }

        self.acceleration = 0.0;
        if state.is_touching_ground() {
            if state.is_accelerate() {
                self.acceleration = match boost.acceleration() {
                    Some(boost_accel) => boost_accel,
                    None => self.calc_acceleration_curve(stats, state),
                };
            } else if state.is_brake() {
                self.acceleration = -BRAKE_DECELERATION;
            } else {
                self.speed *= COAST_DRAG;
            }
        } else {
            self.speed *= AIRBORNE_DRAG;
        }
        self.speed += self.acceleration;
        // Steering sheds speed, scaled by how fast we already are. Drifting
        // and boosting keep the full speed.
        if state.is_touching_ground() && !state.is_drifting() && !state.is_boost() {
            self.speed *= 1.0
                - (1.0 - stats.turning_speed) * self.weighted_turn.abs() * self.speed_ratio_capped;
        }

        let mut multiplier = boost.multiplier();
        if state.is_wheelie() {
            multiplier += WHEELIE_SPEED_BONUS;
        }
        let target = self.base_speed * multiplier;

        if self.soft_speed_limit < target {
            self.soft_speed_limit = target;
        } else {
            self.soft_speed_limit = (self.soft_speed_limit - SOFT_LIMIT_DECAY).max(target);
        }
        self.soft_speed_limit = self.soft_speed_limit.min(self.hard_speed_limit);
        self.speed = self.speed.clamp(-self.soft_speed_limit, self.soft_speed_limit);
        self.speed_ratio_capped = (self.speed.abs() / self.base_speed).min(1.0);

        if state.is_hop() {
            self.vel_dir = self.hop_dir;
        } else {
            let step = if state.is_touching_ground() {
                VEL_DIR_ROT_GROUNDED_DEG.to_radians()
            } else {
                VEL_DIR_ROT_AIRBORNE_DEG.to_radians()
            };
            self.vel_dir = rotate_toward(self.vel_dir, self.dir, step);
        }
        dynamics.set_int_vel(self.vel_dir * self.speed);
    }

    /// Piecewise-linear acceleration lookup keyed by `speed / softLimit`.
    fn calc_acceleration_curve(&self, stats: &VehicleStats, state: &VehicleState) -> f32 {
        let curve = if state.is_drifting() {
            &stats.acceleration_drift
        } else {
            &stats.acceleration_standard
        };
        let ratio = self.speed / self.soft_speed_limit;
        curve_lookup(curve, ratio)
    }

    fn calc_vehicle_rotation(
        &mut self,
        stats: &VehicleStats,
        state: &VehicleState,
        dynamics: &mut KartDynamics,
        stage: RaceStage,
    ) {
        if stats.kind != VehicleKind::Bike {
            panic!("kart lean and rotation model is not supported yet; only bikes");
        }

        let mut turn = self.real_turn
            * if state.is_drifting() {
                stats.drift_tightness
            } else {
                stats.handling_tightness
            };
        turn *= self.kcl_rot_factor;
        if state.is_wheelie() {
            turn *= WHEELIE_TURN_FACTOR;
        }
        if state.is_hop() && !state.is_touching_ground() {
            turn *= HOP_AIRBORNE_TURN_FACTOR;
        }
        if !state.is_drifting() {
            if self.speed.abs() < MIN_TURN_SPEED {
                turn = 0.0;
            } else if self.speed >= HIGH_SPEED_TURN_THRESHOLD {
                turn *= HIGH_SPEED_TURN_FACTOR;
            }
        }

        self.calc_lean(state, stage, dynamics);
        self.calc_standstill_boost_rot(state, stage);
        self.calc_dive(state);

        // The steering angular velocity is rewritten whole every frame; only
        // the physical accumulator carries over.
        let pitch = self.standstill_boost_rot + self.dive_rot;
        dynamics.set_ang_vel2(Vec3::new(pitch, turn, 0.0));

        // Blend the reference up between world up and the surface normal by
        // how fast we are actually going, then pull the steering orientation
        // toward it.
        let blended_up = Vec3::Y.lerp(self.smoothed_up, self.speed_ratio_capped);
        if blended_up.length_squared() > f32::EPSILON {
            let blended_up = blended_up.normalize();
            let current_up = dynamics.main_rot() * Vec3::Y;
            let correction = Quat::from_rotation_arc(current_up, blended_up);
            let corrected = correction * dynamics.main_rot();
            dynamics.set_main_rot(dynamics.main_rot().slerp(corrected, self.stabilization));
        }
    }

    fn calc_lean(&mut self, state: &VehicleState, stage: RaceStage, dynamics: &mut KartDynamics) {
        (self.lean_rot_inc, self.lean_rot_cap) = match stage {
            RaceStage::Countdown => (LEAN_ROT_INC_COUNTDOWN, LEAN_ROT_CAP_COUNTDOWN),
            RaceStage::Race => (LEAN_ROT_INC_RACE, LEAN_ROT_CAP_RACE),
        };

        let mut capped = false;
        if state.is_wheelie() {
            self.lean_rot *= LEAN_ROT_DECAY;
        } else if state.is_drifting() {
            // Lean locks to the drift side; bounds flip with the hop offset.
            self.lean_rot += self.lean_rot_inc * -self.hop_stick_x;
            let (min, max) = if self.hop_stick_x < 0.0 {
                (DRIFT_LEAN_MIN, DRIFT_LEAN_MAX)
            } else {
                (-DRIFT_LEAN_MAX, -DRIFT_LEAN_MIN)
            };
            capped = self.lean_rot <= min || self.lean_rot >= max;
            self.lean_rot = self.lean_rot.clamp(min, max);
        } else {
            let stick = state.stick_x();
            if state.is_stick_left() || state.is_stick_right() {
                self.lean_rot += LEAN_STICK_STEP * stick;
            } else {
                self.lean_rot *= LEAN_ROT_DECAY;
            }
            capped = self.lean_rot.abs() >= self.lean_rot_cap;
            self.lean_rot = self.lean_rot.clamp(-self.lean_rot_cap, self.lean_rot_cap);
        }

        // The sideways nudge only applies while the lean is still building;
        // once it sits at its bound no further impulse accumulates.
        if !capped {
            let scalar = if state.is_drifting() {
                DRIFT_LEAN_VEL_SCALAR
            } else {
                LEAN_VEL_SCALAR
            };
            let right = dynamics.main_rot() * Vec3::X;
            dynamics.set_ext_vel(dynamics.ext_vel() + right * (self.lean_rot * scalar));
        }
    }

    fn calc_standstill_boost_rot(&mut self, state: &VehicleState, stage: RaceStage) {
        let target = match stage {
            RaceStage::Countdown => STANDSTILL_CHARGE_ROT_SCALAR * -state.start_boost_charge(),
            RaceStage::Race => {
                // Losing speed pitches the nose down, gaining it pitches the
                // nose up; a gain past the cap leaves the scalar at 1.
                let diff = self.last_speed - self.speed;
                let scalar = if diff >= -STANDSTILL_SPEED_DIFF_CAP {
                    diff.min(STANDSTILL_SPEED_DIFF_CAP) * STANDSTILL_DIFF_SCALAR
                } else {
                    1.0
                };
                STANDSTILL_ROT_SCALAR * scalar
            }
        };
        self.standstill_boost_rot += (target - self.standstill_boost_rot) * STANDSTILL_BLEND;
    }

    fn calc_dive(&mut self, state: &VehicleState) {
        self.dive_rot *= DIVE_ROT_DECAY;
        if !state.is_touching_ground() {
            self.dive_rot += state.stick_y()
                * (state.airtime() as f32 / DIVE_AIRTIME_SCALE)
                * DIVE_STICK_SCALAR;
            self.dive_rot = self.dive_rot.clamp(-DIVE_ROT_CAP, DIVE_ROT_CAP);
        }
    }

    /// Pitch the movement direction upward at trick takeoff.
    ///
    /// Adds `rot_angle_deg` to the direction's elevation, never exceeding
    /// `target_angle_deg` above the horizon and never pitching down. The
    /// velocity direction snaps with it so the launch takes effect the same
    /// frame.
    pub fn pitch_takeoff_dir(&mut self, target_angle_deg: f32, rot_angle_deg: f32) {
        let mut horizontal = self.dir;
        horizontal.y = 0.0;
        if horizontal.length_squared() <= f32::EPSILON {
            return;
        }
        let horizontal = horizontal.normalize();
        let elevation = self.dir.y.clamp(-1.0, 1.0).asin();
        let pitched = (elevation + rot_angle_deg.to_radians())
            .min(target_angle_deg.to_radians())
            .max(elevation);
        self.dir = horizontal * pitched.cos() + Vec3::Y * pitched.sin();
        self.vel_dir = self.dir;
        self.dir_diff = Vec3::ZERO;
    }

    /// Chassis pose on top of the physical orientation: wheelie pitch and
    /// lean roll. Composed into the transform, never into the integrator.
    pub fn chassis_rot(&self) -> Quat {
        Quat::from_rotation_z(-self.lean_rot * LEAN_VISUAL_SCALAR)
            * Quat::from_rotation_x(-self.wheelie_rot)
    }

    /// Written by the ground contact step from the wheels' surface materials.
    pub fn set_surface_rotation_factor(&mut self, factor: f32) {
        self.surface_rot_factor = factor;
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn acceleration(&self) -> f32 {
        self.acceleration
    }

    pub fn speed_ratio_capped(&self) -> f32 {
        self.speed_ratio_capped
    }

    pub fn soft_speed_limit(&self) -> f32 {
        self.soft_speed_limit
    }

    pub fn hard_speed_limit(&self) -> f32 {
        self.hard_speed_limit
    }

    pub fn dir(&self) -> Vec3 {
        self.dir
    }

    pub fn smoothed_up(&self) -> Vec3 {
        self.smoothed_up
    }

    pub fn drift_state(&self) -> DriftState {
        self.drift_state
    }

    pub fn mt_charge(&self) -> u16 {
        self.mt_charge
    }

    /// Hop offset: sign of the stick captured at hop start (-1, 0, or 1).
    pub fn hop_stick_x(&self) -> f32 {
        self.hop_stick_x
    }

    pub fn hop_pos_y(&self) -> f32 {
        self.hop_pos_y
    }

    pub fn lean_rot(&self) -> f32 {
        self.lean_rot
    }

    pub fn wheelie_rot(&self) -> f32 {
        self.wheelie_rot
    }

    pub fn dive_rot(&self) -> f32 {
        self.dive_rot
    }
}

impl Default for KartMove {
    fn default() -> Self {
        Self::new(&VehicleStats::default())
    }
}

/// Rotate `from` toward `to` by at most `max_angle` radians.
fn rotate_toward(from: Vec3, to: Vec3, max_angle: f32) -> Vec3 {
    let axis = from.cross(to);
    if axis.length_squared() <= f32::EPSILON {
        return from;
    }
    let angle = from.angle_between(to);
    if angle <= max_angle {
        return to;
    }
    Quat::from_axis_angle(axis.normalize(), max_angle) * from
}

/// First breakpoint past the ratio wins; interpolate from its predecessor.
/// Past the table the last value holds.
fn curve_lookup(curve: &[CurvePoint], ratio: f32) -> f32 {
    for (i, &(r1, a1)) in curve.iter().enumerate() {
        if ratio < r1 {
            if i == 0 {
                return a1;
            }
            let (r0, a0) = curve[i - 1];
            let t = (ratio - r0) / (r1 - r0);
            return a0 + t * (a1 - a0);
        }
    }
    curve.last().map(|&(_, a)| a).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct Rig {
        stats: VehicleStats,
        state: VehicleState,
        boost: KartBoost,
        dynamics: KartDynamics,
        movement: KartMove,
    }

    impl Rig {
        fn grounded() -> Self {
            let stats = VehicleStats::default();
            let mut state = VehicleState::new();
            state.set_ground_contact(true, true, Vec3::Y);
            let mut dynamics = KartDynamics::default();
            dynamics.set_gravity(0.0);
            let movement = KartMove::new(&stats);
            Self {
                stats,
                state,
                boost: KartBoost::new(),
                dynamics,
                movement,
            }
        }

        fn step(&mut self) {
            self.movement.calc(
                &self.stats,
                &mut self.state,
                &mut self.boost,
                &mut self.dynamics,
                RaceStage::Race,
            );
        }
    }

    #[test]
    fn at_rest_stays_at_rest() {
        let mut rig = Rig::grounded();
        for _ in 0..60 {
            rig.state.set_ground_contact(true, true, Vec3::Y);
            rig.step();
        }
        assert_eq!(rig.movement.speed(), 0.0);
        assert!(rig.state.is_touching_ground());
        assert!(!rig.state.is_drifting());
        assert!(!rig.state.is_hop());
        assert!(!rig.state.is_boost());
        assert!(!rig.state.is_wheelie());
    }

    #[test]
    fn speed_limits_hold_under_full_throttle() {
        let mut rig = Rig::grounded();
        rig.state.set_accelerate(true);
        for _ in 0..600 {
            rig.state.set_ground_contact(true, true, Vec3::Y);
            rig.step();
            let m = &rig.movement;
            assert!(m.speed().abs() <= m.soft_speed_limit() + 1e-4);
            assert!(m.soft_speed_limit() <= m.hard_speed_limit() + 1e-4);
            assert!((0.0..=1.0).contains(&m.speed_ratio_capped()));
        }
        assert!(rig.movement.speed() > 0.0);
    }

    #[test]
    fn curve_lookup_interpolates() {
        let curve = vec![(0.25, 3.0), (0.5, 1.5), (1.0, 0.5)];
        assert_relative_eq!(curve_lookup(&curve, 0.0), 3.0);
        assert_relative_eq!(curve_lookup(&curve, 0.375), 2.25);
        assert_relative_eq!(curve_lookup(&curve, 0.75), 1.0);
        // Past the last breakpoint the final value holds unclamped.
        assert_relative_eq!(curve_lookup(&curve, 2.0), 0.5);
    }

    #[test]
    fn boost_bypasses_acceleration_curve() {
        let mut rig = Rig::grounded();
        rig.state.set_accelerate(true);
        rig.boost
            .activate(BoostKind::MushroomAndBoostPanel, 90);
        rig.step();
        assert_eq!(
            rig.movement.acceleration(),
            BoostKind::MushroomAndBoostPanel.acceleration()
        );
        assert!(rig.state.is_boost());
    }

    fn enter_drift(rig: &mut Rig) {
        rig.movement.speed = rig.stats.base_speed;
        rig.state.set_accelerate(true);
        let mut intent = crate::intent::DriveIntent::new();
        intent.set_accelerate(true);
        intent.set_stick(1.0, 0.0);
        intent.set_drift(true);
        rig.state.classify_input(&intent, RaceStage::Race);
        rig.state.set_ground_contact(true, true, Vec3::Y);
        rig.step();
        assert!(rig.state.is_hop(), "drift press hops first");

        // Next frame, still grounded with drift held: the hop lands into a
        // charging drift.
        rig.state.classify_input(&intent, RaceStage::Race);
        rig.state.set_ground_contact(true, true, Vec3::Y);
        rig.step();
    }

    #[test]
    fn drift_enters_charging_once() {
        let mut rig = Rig::grounded();
        enter_drift(&mut rig);
        assert_eq!(rig.movement.drift_state(), DriftState::ChargingMiniTurbo);
        assert!(rig.state.is_drift_manual());
        assert_eq!(rig.movement.hop_stick_x(), -1.0, "right stick hops left-handed");
    }

    #[test]
    fn slow_hop_does_not_drift() {
        let mut rig = Rig::grounded();
        let slow = rig.stats.base_speed * MIN_DRIFT_THRESHOLD - 1.0;
        let mut intent = crate::intent::DriveIntent::new();
        intent.set_stick(1.0, 0.0);
        intent.set_drift(true);
        // Coasting, so the speed stays below the drift threshold through the
        // landing check.
        rig.movement.speed = slow;
        rig.state.classify_input(&intent, RaceStage::Race);
        rig.state.set_ground_contact(true, true, Vec3::Y);
        rig.step();
        rig.movement.speed = slow;
        rig.state.classify_input(&intent, RaceStage::Race);
        rig.state.set_ground_contact(true, true, Vec3::Y);
        rig.step();
        assert_eq!(rig.movement.drift_state(), DriftState::NotDrifting);
        assert!(!rig.state.is_drift_manual());
    }

    #[test]
    fn charge_is_monotonic_and_saturates() {
        let mut rig = Rig::grounded();
        enter_drift(&mut rig);

        let mut intent = crate::intent::DriveIntent::new();
        intent.set_accelerate(true);
        intent.set_stick(1.0, 0.0);
        intent.set_drift(true);

        let mut last = rig.movement.mt_charge();
        let mut saturated_at = None;
        for frame in 0..200 {
            rig.state.classify_input(&intent, RaceStage::Race);
            rig.state.set_ground_contact(true, true, Vec3::Y);
            rig.movement.speed = rig.stats.base_speed;
            rig.step();
            let charge = rig.movement.mt_charge();
            assert!(charge >= last, "charge never decreases while charging");
            assert!(charge <= MAX_MT_CHARGE);
            if charge == MAX_MT_CHARGE && saturated_at.is_none() {
                saturated_at = Some(frame);
                assert_eq!(rig.movement.drift_state(), DriftState::ChargedMiniTurbo);
            }
            last = charge;
        }
        assert!(saturated_at.is_some(), "charge reaches the ceiling");
    }

    #[test]
    fn release_grants_boost_and_resets() {
        let mut rig = Rig::grounded();
        enter_drift(&mut rig);

        let mut intent = crate::intent::DriveIntent::new();
        intent.set_accelerate(true);
        intent.set_stick(1.0, 0.0);
        intent.set_drift(true);
        for _ in 0..200 {
            rig.state.classify_input(&intent, RaceStage::Race);
            rig.state.set_ground_contact(true, true, Vec3::Y);
            rig.movement.speed = rig.stats.base_speed;
            rig.step();
        }
        assert_eq!(rig.movement.drift_state(), DriftState::ChargedMiniTurbo);

        intent.set_drift(false);
        rig.state.classify_input(&intent, RaceStage::Race);
        rig.state.set_ground_contact(true, true, Vec3::Y);
        rig.step();

        assert_eq!(rig.movement.drift_state(), DriftState::NotDrifting);
        assert_eq!(rig.movement.mt_charge(), 0);
        assert!(!rig.state.is_drift_manual());
        assert!(
            rig.boost.remaining(BoostKind::AllMt) > 0,
            "charged release grants a mini-turbo boost"
        );
    }

    #[test]
    fn uncharged_release_grants_nothing() {
        let mut rig = Rig::grounded();
        enter_drift(&mut rig);

        let mut intent = crate::intent::DriveIntent::new();
        intent.set_accelerate(true);
        rig.state.classify_input(&intent, RaceStage::Race);
        rig.state.set_ground_contact(true, true, Vec3::Y);
        rig.step();

        assert_eq!(rig.movement.drift_state(), DriftState::NotDrifting);
        assert_eq!(rig.boost.remaining(BoostKind::AllMt), 0);
    }

    #[test]
    fn airborne_release_keeps_drift_until_landing() {
        let mut rig = Rig::grounded();
        enter_drift(&mut rig);

        let intent = crate::intent::DriveIntent::new();
        rig.state.classify_input(&intent, RaceStage::Race);
        rig.state.set_ground_contact(false, false, Vec3::Y);
        rig.step();
        assert_eq!(rig.movement.drift_state(), DriftState::ChargingMiniTurbo);

        rig.state.classify_input(&intent, RaceStage::Race);
        rig.state.set_ground_contact(true, true, Vec3::Y);
        rig.step();
        assert_eq!(rig.movement.drift_state(), DriftState::NotDrifting);
    }

    #[test]
    fn airborne_hop_captures_offset_and_cancels_wheelie() {
        let mut rig = Rig::grounded();
        rig.movement.speed = rig.stats.base_speed;
        rig.state.set_wheelie(true);
        rig.movement.wheelie_frames = 5;

        let mut intent = crate::intent::DriveIntent::new();
        intent.set_accelerate(true);
        intent.set_stick(1.0, 0.0);
        intent.set_drift(true);
        rig.state.classify_input(&intent, RaceStage::Race);
        rig.state.set_ground_contact(false, false, Vec3::Y);
        rig.step();

        assert_eq!(rig.movement.hop_stick_x(), -1.0);
        assert!(!rig.state.is_wheelie());
    }

    #[test]
    fn wheelie_cancels_at_max_duration() {
        let mut rig = Rig::grounded();
        rig.state.set_accelerate(true);
        // Up to speed first so the wheelie stays valid.
        for _ in 0..60 {
            rig.state.set_ground_contact(true, true, Vec3::Y);
            rig.step();
        }

        let mut intent = crate::intent::DriveIntent::new();
        intent.set_accelerate(true);
        intent.set_trick_up(true);
        rig.state.classify_input(&intent, RaceStage::Race);
        rig.state.set_ground_contact(true, true, Vec3::Y);
        rig.step();
        assert!(rig.state.is_wheelie());

        intent.set_trick_up(false);
        let mut frames = 1;
        while rig.state.is_wheelie() {
            rig.state.classify_input(&intent, RaceStage::Race);
            rig.state.set_ground_contact(true, true, Vec3::Y);
            rig.step();
            frames += 1;
            assert!(frames <= MAX_WHEELIE_FRAMES + 1, "wheelie must end");
        }
        assert_eq!(frames, MAX_WHEELIE_FRAMES);
    }

    #[test]
    fn invalid_wheelie_drops_after_grace() {
        let mut rig = Rig::grounded();
        // Standing still: speed ratio stays below the validity floor.
        let mut intent = crate::intent::DriveIntent::new();
        intent.set_trick_up(true);
        rig.state.classify_input(&intent, RaceStage::Race);
        rig.state.set_ground_contact(true, true, Vec3::Y);
        rig.step();
        assert!(rig.state.is_wheelie());

        intent.set_trick_up(false);
        let mut frames = 1;
        while rig.state.is_wheelie() {
            rig.state.classify_input(&intent, RaceStage::Race);
            rig.state.set_ground_contact(true, true, Vec3::Y);
            rig.step();
            frames += 1;
            assert!(frames <= FAILED_WHEELIE_FRAMES + 1);
        }
        assert_eq!(frames, FAILED_WHEELIE_FRAMES);
    }

    #[test]
    fn wheelie_raises_speed_target() {
        let mut rig = Rig::grounded();
        rig.state.set_wheelie(true);
        rig.state.set_accelerate(true);
        rig.movement.wheelie_frames = 1;
        rig.movement.speed = rig.stats.base_speed;
        rig.state.set_ground_contact(true, true, Vec3::Y);
        rig.step();
        assert!(rig.movement.soft_speed_limit() > rig.stats.base_speed);
    }

    #[test]
    fn offroad_reduces_turn_authority() {
        let mut on_road = Rig::grounded();
        let mut off_road = Rig::grounded();
        off_road.movement.set_surface_rotation_factor(0.4);
        for rig in [&mut on_road, &mut off_road] {
            rig.state.set_accelerate(true);
            let mut intent = crate::intent::DriveIntent::new();
            intent.set_accelerate(true);
            intent.set_stick(1.0, 0.0);
            for _ in 0..30 {
                rig.state.classify_input(&intent, RaceStage::Race);
                rig.state.set_ground_contact(true, true, Vec3::Y);
                rig.step();
            }
        }
        let yaw = |rig: &Rig| rig.dynamics.ang_vel2().y.abs();
        assert!(yaw(&off_road) < yaw(&on_road));
    }

    #[test]
    fn steering_lean_impulse_stays_bounded() {
        let mut rig = Rig::grounded();
        let mut intent = crate::intent::DriveIntent::new();
        intent.set_accelerate(true);
        intent.set_stick(1.0, 0.0);
        let mut max_slide = 0.0f32;
        for _ in 0..300 {
            rig.state.classify_input(&intent, RaceStage::Race);
            rig.state.set_ground_contact(true, true, Vec3::Y);
            rig.step();
            let ext = rig.dynamics.ext_vel();
            max_slide = max_slide.max(Vec3::new(ext.x, 0.0, ext.z).length());
        }
        assert!(
            max_slide < 2.0,
            "lean nudges must not pile into a sideways slide, got {max_slide}"
        );
    }

    #[test]
    fn drift_keeps_the_full_speed_target() {
        let mut rig = Rig::grounded();
        enter_drift(&mut rig);

        let mut intent = crate::intent::DriveIntent::new();
        intent.set_accelerate(true);
        intent.set_stick(1.0, 0.0);
        intent.set_drift(true);
        for _ in 0..60 {
            rig.state.classify_input(&intent, RaceStage::Race);
            rig.state.set_ground_contact(true, true, Vec3::Y);
            rig.step();
        }
        // Full-lock drifting does not shed the steering speed loss.
        assert!(rig.movement.speed() >= rig.stats.base_speed * 0.99);
    }

    #[test]
    fn takeoff_pitch_raises_the_direction() {
        let mut rig = Rig::grounded();
        rig.movement.pitch_takeoff_dir(40.0, 15.0);
        assert_relative_eq!(
            rig.movement.dir().y,
            15f32.to_radians().sin(),
            epsilon = 1e-5
        );

        // Repeated pitches saturate at the target elevation.
        for _ in 0..10 {
            rig.movement.pitch_takeoff_dir(40.0, 15.0);
        }
        assert_relative_eq!(
            rig.movement.dir().y,
            40f32.to_radians().sin(),
            epsilon = 1e-4
        );
        assert_relative_eq!(rig.movement.dir().length(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn smoothed_up_tracks_the_surface_quickly() {
        let mut rig = Rig::grounded();
        let normal = Vec3::new(0.8, 0.6, 0.0).normalize();
        for _ in 0..3 {
            rig.state.set_ground_contact(true, true, normal);
            rig.step();
        }
        assert!(rig.movement.smoothed_up().dot(normal) > 0.99);
    }

    #[test]
    fn drift_turn_survives_the_low_speed_gate() {
        let mut rig = Rig::grounded();
        enter_drift(&mut rig);

        rig.movement.speed = 0.5;
        rig.movement.real_turn = -1.0;
        rig.movement
            .calc_vehicle_rotation(&rig.stats, &rig.state, &mut rig.dynamics, RaceStage::Race);
        assert!(
            rig.dynamics.ang_vel2().y.abs() > 0.0,
            "a crawling drift still turns"
        );

        rig.state.set_drift_manual(false);
        rig.movement.speed = 0.5;
        rig.movement.real_turn = -1.0;
        rig.movement
            .calc_vehicle_rotation(&rig.stats, &rig.state, &mut rig.dynamics, RaceStage::Race);
        assert_eq!(rig.dynamics.ang_vel2().y, 0.0);
    }

    #[test]
    fn acceleration_pitches_the_nose_up() {
        let mut rig = Rig::grounded();
        rig.state.set_accelerate(true);
        for _ in 0..10 {
            rig.state.set_ground_contact(true, true, Vec3::Y);
            rig.step();
        }
        assert!(
            rig.movement.standstill_boost_rot < 0.0,
            "gaining speed pitches opposite to losing it"
        );
    }

    #[test]
    fn dive_rot_stays_bounded() {
        let mut rig = Rig::grounded();
        let mut intent = crate::intent::DriveIntent::new();
        intent.set_stick(0.0, -1.0);
        for _ in 0..300 {
            rig.state.classify_input(&intent, RaceStage::Race);
            rig.state.set_ground_contact(false, false, Vec3::Y);
            rig.step();
            assert!(rig.movement.dive_rot().abs() <= DIVE_ROT_CAP);
        }
        assert!(rig.movement.dive_rot() < 0.0, "holding down pitches forward");
    }

    #[test]
    fn countdown_lean_cap_is_tighter() {
        let run = |stage: RaceStage| {
            let mut rig = Rig::grounded();
            let mut intent = crate::intent::DriveIntent::new();
            intent.set_stick(1.0, 0.0);
            for _ in 0..100 {
                rig.state.classify_input(&intent, RaceStage::Race);
                rig.state.set_ground_contact(true, true, Vec3::Y);
                rig.movement
                    .calc(&rig.stats, &mut rig.state, &mut rig.boost, &mut rig.dynamics, stage);
            }
            rig.movement.lean_rot()
        };
        let countdown = run(RaceStage::Countdown);
        let race = run(RaceStage::Race);
        assert!(countdown.abs() <= LEAN_ROT_CAP_COUNTDOWN + 1e-5);
        assert!(race.abs() > countdown.abs());
    }

    #[test]
    #[should_panic(expected = "not supported yet")]
    fn kart_rotation_is_a_fatal_stub() {
        let mut rig = Rig::grounded();
        rig.stats.kind = VehicleKind::Kart;
        rig.step();
    }

    #[test]
    #[should_panic(expected = "not supported yet")]
    fn outside_drift_is_a_fatal_stub() {
        let mut rig = Rig::grounded();
        rig.stats.drift_type = DriftType::OutsideKart;
        enter_drift(&mut rig);
    }
}
