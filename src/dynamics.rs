//! Rigid body integrator.
//!
//! [`KartDynamics`] owns the vehicle's pose and velocities and advances them
//! one fixed step at a time from the forces and torques its caller
//! accumulates. It knows nothing about input, drifting, or tricks; the
//! movement controller computes those and feeds the results in through the
//! setters and [`KartDynamics::apply_suspension_wrench`].
//!
//! The orientation is split across two quaternions: `main_rot` integrates
//! only the steering angular velocity and is what the movement controller
//! reasons about, while `full_rot` also absorbs the physical accumulator and
//! is what the chassis visually does. Trick rotation lives outside this
//! module entirely and is composed onto the transform last, so a trick can
//! never corrupt the physical pose.

use bevy::prelude::*;

/// Gravity in distance units per frame squared.
const GRAVITY: f32 = -1.3;
/// External (collision impulse) velocity retained per frame.
const EXT_VEL_DECAY: f32 = 0.998;
/// Steering angular velocity retained per frame.
const ANG_VEL2_DAMPING: f32 = 0.98;
/// Physical angular velocity accumulator retained per frame.
const ANG_VEL0_FACTOR: f32 = 0.98;
/// Extra damping on the yaw component of the physical accumulator.
const ANG_VEL0_Y_FACTOR: f32 = 0.9;
/// Per-frame pull of the roll accumulator toward zero while a two-wheeled
/// vehicle is airborne.
const UPRIGHT_STABILIZATION: f32 = 0.1;

/// Integrator variant, selecting upright-stabilization behavior.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DynamicsKind {
    /// No stabilization beyond damping.
    Standard,
    /// Bikes: roll is actively pulled upright while airborne.
    #[default]
    TwoWheeled,
}

/// Pose, velocities, and force accumulators for one vehicle.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use kart_vehicle_controller::prelude::*;
///
/// let mut dynamics = KartDynamics::new(DynamicsKind::TwoWheeled);
/// dynamics.set_gravity(0.0);
/// dynamics.set_int_vel(Vec3::Z * 2.0);
/// dynamics.integrate(1.0, 120.0, false);
/// assert!(dynamics.pos().z > 0.0);
/// ```
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct KartDynamics {
    kind: DynamicsKind,

    pos: Vec3,
    /// Velocity the movement controller commands each frame.
    int_vel: Vec3,
    /// Collision-impulse velocity; decays every step.
    ext_vel: Vec3,
    /// Velocity inherited from a moving surface under the wheels.
    moving_surface_vel: Vec3,
    /// Total velocity of the last step.
    velocity: Vec3,
    /// Magnitude of the last step's velocity after the speed cap.
    speed_norm: f32,

    /// Steering orientation; integrates `ang_vel2` only.
    main_rot: Quat,
    /// Physical orientation; integrates both accumulators.
    full_rot: Quat,

    /// Physical angular velocity accumulator, fed by torques.
    ang_vel0: Vec3,
    /// Steering angular velocity, commanded directly.
    ang_vel2: Vec3,

    total_force: Vec3,
    total_torque: Vec3,

    inv_inertia: Vec3,
    gravity: f32,

    /// Forward component of `ext_vel` folded back into scalar speed by the
    /// movement controller.
    speed_fix: f32,
}

impl KartDynamics {
    pub fn new(kind: DynamicsKind) -> Self {
        Self {
            kind,
            pos: Vec3::ZERO,
            int_vel: Vec3::ZERO,
            ext_vel: Vec3::ZERO,
            moving_surface_vel: Vec3::ZERO,
            velocity: Vec3::ZERO,
            speed_norm: 0.0,
            main_rot: Quat::IDENTITY,
            full_rot: Quat::IDENTITY,
            ang_vel0: Vec3::ZERO,
            ang_vel2: Vec3::ZERO,
            total_force: Vec3::ZERO,
            total_torque: Vec3::ZERO,
            inv_inertia: Vec3::ONE,
            gravity: GRAVITY,
            speed_fix: 0.0,
        }
    }

    /// Advance the state one fixed step.
    ///
    /// `max_speed` caps the magnitude of the combined velocity; `airborne`
    /// selects the aerial branches (speed-fix extraction is skipped, and the
    /// two-wheeled variant stabilizes its roll).
    pub fn integrate(&mut self, dt: f32, max_speed: f32, airborne: bool) {
        self.total_force.y += self.gravity;
        let acceleration = self.total_force;

        self.ext_vel *= EXT_VEL_DECAY;
        self.ext_vel += acceleration * dt;

        // Transfer the forward-horizontal part of the impulse velocity into
        // the scalar speed channel so the movement controller can absorb it.
        self.speed_fix = 0.0;
        if !airborne {
            let mut forward = self.main_rot * Vec3::Z;
            forward.y = 0.0;
            if forward.length_squared() > f32::EPSILON {
                forward = forward.normalize();
                self.speed_fix = self.ext_vel.dot(forward);
                self.ext_vel -= forward * self.speed_fix;
            }
        }

        self.ang_vel0 += self.inv_inertia * self.total_torque * dt;
        self.ang_vel0 *= ANG_VEL0_FACTOR;
        self.ang_vel0.y *= ANG_VEL0_Y_FACTOR;

        if self.kind == DynamicsKind::TwoWheeled && airborne {
            self.stabilize();
        }

        self.velocity = self.int_vel + self.ext_vel + self.moving_surface_vel;
        let length = self.velocity.length();
        self.speed_norm = length.min(max_speed);
        if length > f32::EPSILON {
            self.velocity *= self.speed_norm / length;
        }
        self.pos += self.velocity * dt;

        self.main_rot = integrate_quat(self.main_rot, self.ang_vel2, dt);
        self.full_rot = integrate_quat(self.full_rot, self.ang_vel0 + self.ang_vel2, dt);

        self.ang_vel2 *= ANG_VEL2_DAMPING;
        self.total_force = Vec3::ZERO;
        self.total_torque = Vec3::ZERO;
    }

    /// Pull the roll accumulator toward zero.
    fn stabilize(&mut self) {
        self.ang_vel0.z -= self.ang_vel0.z * UPRIGHT_STABILIZATION;
        self.ang_vel0.x -= self.ang_vel0.x * UPRIGHT_STABILIZATION;
    }

    /// Snap the steering orientation upright, keeping its heading.
    ///
    /// Used by the two-wheeled variant after a landing that left the chassis
    /// flipped past recovery.
    pub fn force_upright(&mut self) {
        let mut forward = self.main_rot * Vec3::Z;
        forward.y = 0.0;
        if forward.length_squared() <= f32::EPSILON {
            return;
        }
        forward = forward.normalize();
        let yaw = forward.x.atan2(forward.z);
        self.main_rot = Quat::from_rotation_y(yaw);
        self.full_rot = self.main_rot;
        self.ang_vel0 = Vec3::ZERO;
    }

    /// Fold a suspension force at a contact point into the accumulators.
    ///
    /// `f_linear` pushes the body directly; `f_rot` produces torque through
    /// the lever arm from the body origin to `point`. `ignore_x` zeroes the
    /// roll component for suspension units that must not induce roll.
    pub fn apply_suspension_wrench(
        &mut self,
        point: Vec3,
        f_linear: Vec3,
        f_rot: Vec3,
        ignore_x: bool,
    ) {
        self.total_force += f_linear;
        let mut torque = (point - self.pos).cross(f_rot);
        if ignore_x {
            torque.x = 0.0;
        }
        self.total_torque += torque;
    }

    pub fn kind(&self) -> DynamicsKind {
        self.kind
    }

    pub fn pos(&self) -> Vec3 {
        self.pos
    }

    pub fn set_pos(&mut self, pos: Vec3) {
        self.pos = pos;
    }

    pub fn int_vel(&self) -> Vec3 {
        self.int_vel
    }

    pub fn set_int_vel(&mut self, int_vel: Vec3) {
        self.int_vel = int_vel;
    }

    pub fn ext_vel(&self) -> Vec3 {
        self.ext_vel
    }

    pub fn set_ext_vel(&mut self, ext_vel: Vec3) {
        self.ext_vel = ext_vel;
    }

    pub fn moving_surface_vel(&self) -> Vec3 {
        self.moving_surface_vel
    }

    pub fn set_moving_surface_vel(&mut self, vel: Vec3) {
        self.moving_surface_vel = vel;
    }

    /// Total velocity of the last integrated step.
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Capped velocity magnitude of the last integrated step.
    pub fn speed_norm(&self) -> f32 {
        self.speed_norm
    }

    pub fn main_rot(&self) -> Quat {
        self.main_rot
    }

    pub fn set_main_rot(&mut self, rot: Quat) {
        self.main_rot = rot.normalize();
    }

    pub fn full_rot(&self) -> Quat {
        self.full_rot
    }

    pub fn set_full_rot(&mut self, rot: Quat) {
        self.full_rot = rot.normalize();
    }

    pub fn ang_vel0(&self) -> Vec3 {
        self.ang_vel0
    }

    pub fn set_ang_vel0(&mut self, ang_vel: Vec3) {
        self.ang_vel0 = ang_vel;
    }

    pub fn ang_vel2(&self) -> Vec3 {
        self.ang_vel2
    }

    pub fn set_ang_vel2(&mut self, ang_vel: Vec3) {
        self.ang_vel2 = ang_vel;
    }

    pub fn set_inv_inertia(&mut self, inv_inertia: Vec3) {
        self.inv_inertia = inv_inertia;
    }

    pub fn gravity(&self) -> f32 {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: f32) {
        self.gravity = gravity;
    }

    /// Forward speed transferred out of the impulse velocity this step.
    pub fn speed_fix(&self) -> f32 {
        self.speed_fix
    }

    /// Reset pose and velocities, keeping the variant and tuning.
    pub fn reset(&mut self, pos: Vec3, rot: Quat) {
        self.pos = pos;
        self.main_rot = rot.normalize();
        self.full_rot = self.main_rot;
        self.int_vel = Vec3::ZERO;
        self.ext_vel = Vec3::ZERO;
        self.moving_surface_vel = Vec3::ZERO;
        self.velocity = Vec3::ZERO;
        self.speed_norm = 0.0;
        self.ang_vel0 = Vec3::ZERO;
        self.ang_vel2 = Vec3::ZERO;
        self.total_force = Vec3::ZERO;
        self.total_torque = Vec3::ZERO;
        self.speed_fix = 0.0;
    }
}

impl Default for KartDynamics {
    fn default() -> Self {
        Self::new(DynamicsKind::default())
    }
}

/// First-order quaternion integration of an angular velocity over `dt`.
fn integrate_quat(q: Quat, ang_vel: Vec3, dt: f32) -> Quat {
    if ang_vel.length_squared() <= f32::EPSILON {
        return q;
    }
    let wq = Quat::from_xyzw(ang_vel.x, ang_vel.y, ang_vel.z, 0.0) * q;
    let next = Quat::from_xyzw(
        q.x + 0.5 * dt * wq.x,
        q.y + 0.5 * dt * wq.y,
        q.z + 0.5 * dt * wq.z,
        q.w + 0.5 * dt * wq.w,
    );
    if next.length_squared() <= f32::EPSILON {
        q
    } else {
        next.normalize()
    }
}
