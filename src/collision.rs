//! Collision query result structures.
//!
//! These structures hold the results of track collision queries (sphere and
//! point casts) used for ground contact classification and spawn placement.

use bevy::prelude::*;

/// Surface material bit masks reported by the collision backend.
///
/// A contact can carry several materials at once (e.g. a trickable boost
/// ramp), so the flags are combined into a single mask.
pub mod surface {
    /// Drivable floor geometry.
    pub const FLOOR: u32 = 1 << 0;
    /// Slow off-road terrain (reduced rotation authority).
    pub const OFFROAD: u32 = 1 << 1;
    /// Boost ramp surface.
    pub const BOOST_RAMP: u32 = 1 << 2;
    /// Surface edge that permits tricks when leaving it.
    pub const TRICKABLE: u32 = 1 << 3;
    /// Wall geometry.
    pub const WALL: u32 = 1 << 4;
    /// Moving surface (conveyor, flowing water).
    pub const MOVING: u32 = 1 << 5;

    /// All floor-like materials.
    pub const ANY_FLOOR: u32 = FLOOR | OFFROAD | BOOST_RAMP | TRICKABLE;
    /// Everything.
    pub const ALL: u32 = u32::MAX;
}

/// Rotation authority multiplier while off-road.
const OFFROAD_ROTATION_FACTOR: f32 = 0.4;

/// Information about a sphere/point cast collision against the track.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceContact {
    /// Normal of the surface at the contact (points away from the surface).
    pub normal: Vec3,
    /// Material mask of the surface, combined from [`surface`] flags.
    pub materials: u32,
    /// Offset that pushes the query shape out of penetration.
    pub offset: Vec3,
    /// Velocity carried by the surface (conveyors, flowing water).
    pub velocity: Vec3,
}

impl SurfaceContact {
    /// Create a contact result for a static surface.
    pub fn new(normal: Vec3, materials: u32, offset: Vec3) -> Self {
        Self {
            normal,
            materials,
            offset,
            velocity: Vec3::ZERO,
        }
    }

    /// Attach the surface's own velocity to the contact.
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    /// Whether the contact is with drivable floor geometry.
    pub fn is_floor(&self) -> bool {
        self.materials & surface::ANY_FLOOR != 0
    }

    /// Whether the contact is with a boost ramp.
    pub fn is_boost_ramp(&self) -> bool {
        self.materials & surface::BOOST_RAMP != 0
    }

    /// Whether the contact surface permits tricks.
    pub fn is_trickable(&self) -> bool {
        self.materials & surface::TRICKABLE != 0
    }

    /// Whether the contact is with a moving surface.
    pub fn is_moving(&self) -> bool {
        self.materials & surface::MOVING != 0
    }

    /// Rotation authority factor contributed by this surface.
    ///
    /// Regular road gives full authority; off-road terrain reduces it.
    pub fn rotation_factor(&self) -> f32 {
        if self.materials & surface::OFFROAD != 0 {
            OFFROAD_ROTATION_FACTOR
        } else {
            1.0
        }
    }
}
