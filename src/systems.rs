//! Controller systems.
//!
//! One FixedUpdate tick is one simulated frame. The systems run in a fixed
//! chain per frame: spawn placement, ground contact, input classification,
//! movement, tricks, integration, transform sync. Systems that query track
//! geometry are generic over the physics backend and run exclusively so the
//! backend can read the whole world.

use bevy::prelude::*;

use crate::backend::KartPhysicsBackend;
use crate::boost::KartBoost;
use crate::collision::surface;
use crate::config::VehicleStats;
use crate::dynamics::KartDynamics;
use crate::intent::DriveIntent;
use crate::movement::KartMove;
use crate::state::VehicleState;
use crate::trick::KartTrick;
use crate::RaceStage;

/// Fixed step length in frame units. Distances and speeds are per frame, so
/// each FixedUpdate tick advances exactly one frame.
const FRAME: f32 = 1.0;

/// How far below the spawn position the placement probe sweeps.
const PLACEMENT_PROBE_DEPTH: f32 = 1000.0;

/// Marker for vehicles awaiting initial placement on the track.
///
/// Removed after the first placement pass; insert it again to re-place a
/// vehicle (respawn).
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct SpawnPlacement;

/// Drop freshly spawned vehicles onto the floor under them.
pub fn place_spawned_vehicles<B: KartPhysicsBackend>(world: &mut World) {
    let entities: Vec<(Entity, f32, Vec3)> = world
        .query_filtered::<(Entity, &VehicleStats, &KartDynamics), With<SpawnPlacement>>()
        .iter(world)
        .map(|(e, stats, dynamics)| (e, stats.initial_y_pos, dynamics.pos()))
        .collect();

    for (entity, initial_y_pos, pos) in entities {
        let probe = pos - Vec3::Y * PLACEMENT_PROBE_DEPTH;
        match B::point_cast(world, probe, pos, surface::ANY_FLOOR) {
            Some(contact) => {
                let placed = probe + contact.offset + contact.normal * initial_y_pos;
                if let Some(mut dynamics) = world.get_mut::<KartDynamics>(entity) {
                    let rot = dynamics.main_rot();
                    dynamics.reset(placed, rot);
                }
            }
            None => {
                warn!("no floor under spawn position {pos} for {entity}; leaving pose as spawned");
            }
        }
        world.entity_mut(entity).remove::<SpawnPlacement>();
    }
}

/// Cast every wheel against the track and classify ground contact.
pub fn update_ground_contact<B: KartPhysicsBackend>(world: &mut World) {
    struct Wheels {
        entity: Entity,
        offsets: Vec<Vec3>,
        radius: f32,
        pos: Vec3,
        rot: Quat,
        hop_pos_y: f32,
    }

    let entities: Vec<Wheels> = world
        .query::<(Entity, &VehicleStats, &KartDynamics, &KartMove)>()
        .iter(world)
        .map(|(entity, stats, dynamics, movement)| Wheels {
            entity,
            offsets: stats.wheel_offsets.clone(),
            radius: stats.wheel_radius,
            pos: dynamics.pos(),
            rot: dynamics.main_rot(),
            hop_pos_y: movement.hop_pos_y(),
        })
        .collect();

    for wheels in entities {
        let body = wheels.pos + Vec3::Y * wheels.hop_pos_y;
        let mut hits = 0usize;
        let mut normal_sum = Vec3::ZERO;
        let mut offset_sum = Vec3::ZERO;
        let mut rot_factor_sum = 0.0;
        let mut surface_vel_sum = Vec3::ZERO;
        let mut trickable = false;
        let mut ramp = false;

        for &offset in &wheels.offsets {
            let center = body + wheels.rot * offset;
            let Some(contact) = B::sphere_cast(
                world,
                center,
                center,
                wheels.radius,
                surface::ANY_FLOOR | surface::MOVING,
            ) else {
                continue;
            };
            hits += 1;
            normal_sum += contact.normal;
            offset_sum += contact.offset;
            rot_factor_sum += contact.rotation_factor();
            surface_vel_sum += contact.velocity;
            trickable |= contact.is_trickable();
            ramp |= contact.is_boost_ramp();
        }

        let touching = hits > 0;
        let all_wheels = hits == wheels.offsets.len();
        let top = if touching {
            let averaged = normal_sum / hits as f32;
            if averaged.length_squared() > f32::EPSILON {
                averaged.normalize()
            } else {
                Vec3::Y
            }
        } else {
            Vec3::Y
        };

        if let Some(mut state) = world.get_mut::<VehicleState>(wheels.entity) {
            state.set_ground_contact(touching, all_wheels, top);
            if touching {
                state.set_trickable(trickable);
                state.set_ramp_boost(ramp);
            }
        }
        if let Some(mut movement) = world.get_mut::<KartMove>(wheels.entity) {
            if touching {
                movement.set_surface_rotation_factor(rot_factor_sum / hits as f32);
            }
        }
        if let Some(mut dynamics) = world.get_mut::<KartDynamics>(wheels.entity) {
            if touching {
                let pos = dynamics.pos();
                dynamics.set_pos(pos + offset_sum / hits as f32);
                dynamics.set_moving_surface_vel(surface_vel_sum / hits as f32);
                // Kill the impulse velocity component driving into the
                // surface, or gravity accumulates frame over frame.
                let into = dynamics.ext_vel().dot(top);
                if into < 0.0 {
                    let ext_vel = dynamics.ext_vel() - top * into;
                    dynamics.set_ext_vel(ext_vel);
                }
            } else {
                dynamics.set_moving_surface_vel(Vec3::ZERO);
            }
        }
    }
}

/// Turn the frame's raw controls into state flags.
pub fn classify_inputs(
    stage: Res<RaceStage>,
    mut vehicles: Query<(&DriveIntent, &mut VehicleState)>,
) {
    for (intent, mut state) in &mut vehicles {
        state.classify_input(intent, *stage);
    }
}

/// Run the movement pipeline for every vehicle.
pub fn update_movement(
    stage: Res<RaceStage>,
    mut vehicles: Query<(
        &VehicleStats,
        &mut VehicleState,
        &mut KartBoost,
        &mut KartDynamics,
        &mut KartMove,
    )>,
) {
    for (stats, mut state, mut boost, mut dynamics, mut movement) in &mut vehicles {
        movement.calc(stats, &mut state, &mut boost, &mut dynamics, *stage);
    }
}

/// Run the trick state machine for every vehicle.
pub fn update_tricks(
    mut vehicles: Query<(
        &DriveIntent,
        &VehicleStats,
        &mut VehicleState,
        &mut KartMove,
        &mut KartTrick,
    )>,
) {
    for (intent, stats, mut state, mut movement, mut trick) in &mut vehicles {
        trick.calc(intent.trick, stats, &mut state, movement.speed_ratio_capped());
        // Takeoff pitches the movement direction toward the trick's target
        // angle, launching the vehicle off the edge.
        if state.is_trick_start() {
            if let Some(active) = trick.active() {
                movement.pitch_takeoff_dir(active.final_angle(), active.angle_delta());
            }
        }
    }
}

/// Advance every vehicle's rigid body by one frame.
pub fn integrate_dynamics(
    mut vehicles: Query<(&KartMove, &VehicleState, &mut KartDynamics)>,
) {
    for (movement, state, mut dynamics) in &mut vehicles {
        let airborne = !state.is_touching_ground();
        dynamics.integrate(FRAME, movement.hard_speed_limit(), airborne);
    }
}

/// Write the physical pose plus hop, trick, and chassis rotation into the
/// transform. Trick and chassis rotation are composed here and never touch
/// the integrator.
pub fn sync_transforms(
    mut vehicles: Query<(&KartDynamics, &KartMove, &KartTrick, &mut Transform)>,
) {
    for (dynamics, movement, trick, mut transform) in &mut vehicles {
        transform.translation = dynamics.pos() + Vec3::Y * movement.hop_pos_y();
        transform.rotation = dynamics.full_rot() * trick.rot() * movement.chassis_rot();
    }
}
