//! # `kart_vehicle_controller`
//!
//! A deterministic per-frame kart/bike vehicle controller with physics
//! backend abstraction.
//!
//! This crate simulates a single racing vehicle's motion one fixed frame at
//! a time:
//! - A rigid-body integrator advancing position, orientation, and the
//!   split internal/external/moving-surface velocities
//! - A movement pipeline covering turning, manual drifts with mini-turbo
//!   charging, acceleration curves, soft/hard speed limits, and the
//!   two-wheeled lean, dive, and wheelie behavior
//! - An aerial trick state machine with buffered inputs and per-weight-class
//!   rotation tables
//! - A per-frame control state blackboard the stages communicate through
//! - A physics backend trait so track collision can come from any source
//!   (a flat planar backend is included for tests and prototypes)
//!
//! ## Determinism
//!
//! All tuning is expressed in per-frame units and every update runs in a
//! fixed order, so identical inputs and identical collision query results
//! reproduce bit-identical trajectories. Backends must uphold the same
//! contract for their query results.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bevy::prelude::*;
//! use kart_vehicle_controller::prelude::*;
//!
//! App::new()
//!     .add_plugins(MinimalPlugins)
//!     .add_plugins(KartVehiclePlugin::<PlanarTrackBackend>::default())
//!     .run();
//! ```

use bevy::prelude::*;

pub mod backend;
pub mod boost;
pub mod collision;
pub mod config;
pub mod dynamics;
pub mod intent;
pub mod movement;
pub mod planar;
pub mod state;
pub mod systems;
pub mod trick;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::backend::KartPhysicsBackend;
    pub use crate::boost::{BoostKind, KartBoost};
    pub use crate::collision::{surface, SurfaceContact};
    pub use crate::config::{DriftType, VehicleKind, VehicleStats, WeightClass};
    pub use crate::dynamics::{DynamicsKind, KartDynamics};
    pub use crate::intent::{DriveIntent, TrickInput};
    pub use crate::movement::{DriftState, KartMove};
    pub use crate::planar::{PlanarTrack, PlanarTrackBackend, TrackRegion};
    pub use crate::state::VehicleState;
    pub use crate::systems::SpawnPlacement;
    pub use crate::trick::{KartTrick, TrickKind};
    pub use crate::{KartVehicleBundle, KartVehiclePlugin, RaceStage};
}

/// Global race stage, gating input and some tuning.
///
/// During [`RaceStage::Countdown`] driving controls are ignored; holding the
/// accelerator charges the start boost instead.
#[derive(Resource, Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[reflect(Resource)]
pub enum RaceStage {
    /// Pre-race countdown.
    Countdown,
    /// The race proper.
    #[default]
    Race,
}

/// Everything a simulated vehicle entity needs.
///
/// The [`systems::SpawnPlacement`] marker makes the first frame drop the
/// vehicle onto the floor beneath its transform.
#[derive(Bundle, Default)]
pub struct KartVehicleBundle {
    pub stats: config::VehicleStats,
    pub state: state::VehicleState,
    pub intent: intent::DriveIntent,
    pub boost: boost::KartBoost,
    pub dynamics: dynamics::KartDynamics,
    pub movement: movement::KartMove,
    pub trick: trick::KartTrick,
    pub placement: systems::SpawnPlacement,
    pub transform: Transform,
}

impl KartVehicleBundle {
    /// Bundle for the given stats, spawning at `pos`.
    pub fn new(stats: config::VehicleStats, pos: Vec3) -> Self {
        stats.validate();
        let movement = movement::KartMove::new(&stats);
        let mut dynamics = dynamics::KartDynamics::new(match stats.kind {
            config::VehicleKind::Bike => dynamics::DynamicsKind::TwoWheeled,
            config::VehicleKind::Kart => dynamics::DynamicsKind::Standard,
        });
        dynamics.set_pos(pos);
        Self {
            stats,
            movement,
            dynamics,
            transform: Transform::from_translation(pos),
            ..Default::default()
        }
    }
}

/// Main plugin for the vehicle controller.
///
/// Generic over a physics backend `B` that answers track collision queries.
///
/// # Examples
///
/// ```rust,no_run
/// use bevy::prelude::*;
/// use kart_vehicle_controller::prelude::*;
///
/// App::new()
///     .add_plugins(MinimalPlugins)
///     .add_plugins(KartVehiclePlugin::<PlanarTrackBackend>::default())
///     .run();
/// ```
pub struct KartVehiclePlugin<B: backend::KartPhysicsBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::KartPhysicsBackend> Default for KartVehiclePlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::KartPhysicsBackend> Plugin for KartVehiclePlugin<B> {
    fn build(&self, app: &mut App) {
        // Register core types
        app.register_type::<RaceStage>();
        app.register_type::<config::VehicleStats>();
        app.register_type::<intent::DriveIntent>();
        app.register_type::<state::VehicleState>();
        app.register_type::<boost::KartBoost>();
        app.register_type::<dynamics::KartDynamics>();
        app.register_type::<movement::KartMove>();
        app.register_type::<trick::KartTrick>();
        app.register_type::<systems::SpawnPlacement>();

        app.init_resource::<RaceStage>();

        // Add the physics backend plugin
        app.add_plugins(B::plugin());

        // One FixedUpdate tick is one simulated frame; the order within the
        // chain is part of the determinism contract.
        app.add_systems(
            FixedUpdate,
            (
                systems::place_spawned_vehicles::<B>,
                systems::update_ground_contact::<B>,
                systems::classify_inputs,
                systems::update_movement,
                systems::update_tricks,
                systems::integrate_dynamics,
                systems::sync_transforms,
            )
                .chain(),
        );
    }
}
