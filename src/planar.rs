//! Planar track backend.
//!
//! A minimal collision backend for tests, prototypes, and headless
//! simulation: the track is a flat floor at a fixed height, with optional
//! rectangular regions that override the surface material (off-road strips,
//! boost ramps, trickable edges, gaps, conveyors). Queries are pure reads of
//! a [`PlanarTrack`] resource, so results are trivially deterministic.

use bevy::prelude::*;

use crate::backend::KartPhysicsBackend;
use crate::collision::{surface, SurfaceContact};

/// An axis-aligned material override on the floor plane.
#[derive(Reflect, Debug, Clone, Copy)]
pub struct TrackRegion {
    /// Region bounds on the XZ plane.
    pub min: Vec2,
    pub max: Vec2,
    /// Material mask inside the region. A mask of `0` is a gap: casts over
    /// it miss entirely.
    pub materials: u32,
    /// Surface velocity carried by the region (conveyors, currents).
    pub velocity: Vec3,
}

impl TrackRegion {
    pub fn new(min: Vec2, max: Vec2, materials: u32) -> Self {
        Self {
            min,
            max,
            materials,
            velocity: Vec3::ZERO,
        }
    }

    /// A hole in the floor.
    pub fn gap(min: Vec2, max: Vec2) -> Self {
        Self::new(min, max, 0)
    }

    fn contains(&self, x: f32, z: f32) -> bool {
        x >= self.min.x && x <= self.max.x && z >= self.min.y && z <= self.max.y
    }
}

/// The track description queried by [`PlanarTrackBackend`].
#[derive(Resource, Reflect, Debug, Clone, Default)]
#[reflect(Resource)]
pub struct PlanarTrack {
    /// Height of the floor plane.
    pub floor_height: f32,
    /// Material overrides; the last region containing a point wins.
    pub regions: Vec<TrackRegion>,
}

impl PlanarTrack {
    /// Material mask under a point, or `None` over a gap.
    pub fn materials_at(&self, x: f32, z: f32) -> Option<u32> {
        let mut materials = surface::FLOOR;
        for region in &self.regions {
            if region.contains(x, z) {
                materials = region.materials;
            }
        }
        (materials != 0).then_some(materials)
    }

    /// Surface velocity under a point.
    pub fn velocity_at(&self, x: f32, z: f32) -> Vec3 {
        let mut velocity = Vec3::ZERO;
        for region in &self.regions {
            if region.contains(x, z) {
                velocity = region.velocity;
            }
        }
        velocity
    }
}

/// Plugin registering the [`PlanarTrack`] resource.
pub struct PlanarTrackPlugin;

impl Plugin for PlanarTrackPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<PlanarTrack>()
            .init_resource::<PlanarTrack>();
    }
}

/// Collision backend over a [`PlanarTrack`].
pub struct PlanarTrackBackend;

impl KartPhysicsBackend for PlanarTrackBackend {
    fn plugin() -> impl Plugin {
        PlanarTrackPlugin
    }

    fn sphere_cast(
        world: &World,
        center: Vec3,
        _previous: Vec3,
        radius: f32,
        type_mask: u32,
    ) -> Option<SurfaceContact> {
        let track = world.get_resource::<PlanarTrack>()?;
        let bottom = center.y - radius;
        if bottom > track.floor_height {
            return None;
        }
        let materials = track.materials_at(center.x, center.z)?;
        if materials & type_mask == 0 {
            return None;
        }
        let offset = Vec3::Y * (track.floor_height - bottom);
        Some(
            SurfaceContact::new(Vec3::Y, materials, offset)
                .with_velocity(track.velocity_at(center.x, center.z)),
        )
    }
}
