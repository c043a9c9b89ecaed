//! Physics backend abstraction.
//!
//! This module defines the trait that collision backends must implement to
//! work with the vehicle controller. The controller core never touches track
//! geometry directly; every ground query goes through this trait, so the
//! collision representation (triangle mesh, heightfield, physics engine) can
//! be swapped without touching the simulation.

use bevy::prelude::*;

use crate::collision::SurfaceContact;

/// Trait for collision backend implementations.
///
/// Implement this trait to integrate a track collision representation with
/// the vehicle controller. The backend answers sphere and point casts against
/// track geometry and reports the fixed timestep.
///
/// Determinism contract: given the same query arguments, a backend must
/// return bit-identical results. The controller's trajectories are only
/// reproducible if its collision inputs are.
pub trait KartPhysicsBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;

    /// Cast a sphere against track geometry.
    ///
    /// # Arguments
    /// * `world` - The ECS world for queries
    /// * `center` - Sphere center in world space
    /// * `previous` - Sphere center on the previous frame (for tunneling)
    /// * `radius` - Sphere radius
    /// * `type_mask` - Surface materials to test, from [`crate::collision::surface`]
    ///
    /// Returns `None` when nothing within the mask is touched.
    fn sphere_cast(
        world: &World,
        center: Vec3,
        previous: Vec3,
        radius: f32,
        type_mask: u32,
    ) -> Option<SurfaceContact>;

    /// Cast a single point against track geometry.
    ///
    /// Used for spawn placement. The default forwards to a zero-radius
    /// sphere cast.
    fn point_cast(
        world: &World,
        point: Vec3,
        previous: Vec3,
        type_mask: u32,
    ) -> Option<SurfaceContact> {
        Self::sphere_cast(world, point, previous, 0.0, type_mask)
    }

    /// Get the fixed timestep delta time in seconds.
    fn fixed_timestep(world: &World) -> f32 {
        world
            .get_resource::<Time<Fixed>>()
            .map(|t| t.delta_secs())
            .filter(|&d| d > 0.0)
            .unwrap_or(1.0 / 60.0)
    }
}

/// Empty plugin for backends that don't need additional setup.
pub struct NoOpBackendPlugin;

impl Plugin for NoOpBackendPlugin {
    fn build(&self, _app: &mut App) {}
}
