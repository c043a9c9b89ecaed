//! Vehicle configuration components.
//!
//! This module defines the static, per-vehicle-class tuning data: speed,
//! handling and drift response, and the acceleration curves. Stats are
//! read-only during simulation; every scalar here is load-bearing gameplay
//! tuning, so presets keep them as explicit named values.

use bevy::prelude::*;

/// Weight class of a vehicle, indexing the trick angle tables.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeightClass {
    Light,
    #[default]
    Medium,
    Heavy,
}

impl WeightClass {
    /// Table index for per-weight-class lookups.
    pub fn index(self) -> usize {
        match self {
            WeightClass::Light => 0,
            WeightClass::Medium => 1,
            WeightClass::Heavy => 2,
        }
    }
}

/// Chassis layout, selecting the turn-rotation and wheelie behavior.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VehicleKind {
    /// Two-wheeled vehicle: lean-based turning, wheelies, upright
    /// stabilization.
    #[default]
    Bike,
    /// Four-wheeled vehicle. The kart lean model is not implemented yet;
    /// stepping a kart through the rotation pipeline is a fatal error.
    Kart,
}

/// Drift behavior classification.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriftType {
    /// Bike that leans into the drift. The only fully supported path.
    #[default]
    InsideBike,
    /// Bike that swings wide while drifting. Not implemented yet.
    OutsideBike,
    /// Kart drift. Not implemented yet.
    OutsideKart,
}

/// An acceleration curve breakpoint: `(speed ratio, acceleration)`.
pub type CurvePoint = (f32, f32);

/// Static per-vehicle-class stats.
///
/// Owned by the vehicle entity and never mutated during simulation. Curves
/// and scalars are validated once at construction; malformed data is a fatal
/// error at load time, never a per-frame one.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct VehicleStats {
    /// Chassis layout.
    pub kind: VehicleKind,
    /// Weight class, indexing trick angle tables.
    pub weight_class: WeightClass,
    /// Drift behavior classification.
    pub drift_type: DriftType,

    /// Base speed in distance units per frame.
    pub base_speed: f32,
    /// Exponential smoothing constant for turn input while not drifting.
    pub handling_reactivity: f32,
    /// Exponential smoothing constant for turn input while drifting.
    pub drift_reactivity: f32,
    /// Turn-to-rotation gain while not drifting (radians per frame at full
    /// deflection).
    pub handling_tightness: f32,
    /// Turn-to-rotation gain while drifting.
    pub drift_tightness: f32,
    /// Fraction of speed retained at full steering deflection.
    pub turning_speed: f32,

    /// Acceleration curve while not drifting, as ordered
    /// `(speed ratio, acceleration)` breakpoints.
    pub acceleration_standard: Vec<CurvePoint>,
    /// Acceleration curve while drifting.
    pub acceleration_drift: Vec<CurvePoint>,

    /// Boost duration granted by a released mini-turbo, in frames.
    pub mini_turbo_frames: u16,

    /// Wheel contact points in chassis space, relative to the body origin.
    pub wheel_offsets: Vec<Vec3>,
    /// Radius of the per-wheel ground cast sphere.
    pub wheel_radius: f32,
    /// Resting height of the body origin above the floor, used for spawn
    /// placement.
    pub initial_y_pos: f32,
}

impl VehicleStats {
    /// A standard inside-drifting bike for the given weight class.
    pub fn bike(weight_class: WeightClass) -> Self {
        let (base_speed, handling_tightness, drift_tightness) = match weight_class {
            WeightClass::Light => (55.0, 0.017, 0.024),
            WeightClass::Medium => (58.0, 0.015, 0.022),
            WeightClass::Heavy => (61.0, 0.013, 0.020),
        };

        let stats = Self {
            kind: VehicleKind::Bike,
            weight_class,
            drift_type: DriftType::InsideBike,
            base_speed,
            handling_reactivity: 0.7,
            drift_reactivity: 0.88,
            handling_tightness,
            drift_tightness,
            turning_speed: 0.96,
            acceleration_standard: vec![(0.25, 3.0), (0.5, 1.5), (0.8, 0.8), (1.0, 0.4)],
            acceleration_drift: vec![(0.5, 2.5), (1.0, 1.2)],
            mini_turbo_frames: 70,
            wheel_offsets: vec![Vec3::new(0.0, 0.0, 10.0), Vec3::new(0.0, 0.0, -10.0)],
            wheel_radius: 5.0,
            initial_y_pos: 5.0,
        };
        stats.validate();
        stats
    }

    /// Builder: set the base speed.
    pub fn with_base_speed(mut self, base_speed: f32) -> Self {
        self.base_speed = base_speed;
        self
    }

    /// Builder: set turn reactivity constants.
    pub fn with_reactivity(mut self, handling: f32, drift: f32) -> Self {
        self.handling_reactivity = handling;
        self.drift_reactivity = drift;
        self
    }

    /// Builder: set turn tightness gains.
    pub fn with_tightness(mut self, handling: f32, drift: f32) -> Self {
        self.handling_tightness = handling;
        self.drift_tightness = drift;
        self
    }

    /// Builder: replace the acceleration curves.
    pub fn with_acceleration_curves(
        mut self,
        standard: Vec<CurvePoint>,
        drift: Vec<CurvePoint>,
    ) -> Self {
        self.acceleration_standard = standard;
        self.acceleration_drift = drift;
        self.validate();
        self
    }

    /// Validate the stats.
    ///
    /// Panics on malformed data: acceleration curves with no breakpoints or
    /// non-increasing ratios, a non-positive base speed, or a vehicle with no
    /// wheels. Stats failing here would silently corrupt the simulation, so
    /// loading them is a fatal error.
    pub fn validate(&self) {
        assert!(
            self.base_speed > 0.0,
            "vehicle stats: base speed must be positive, got {}",
            self.base_speed
        );
        assert!(
            !self.wheel_offsets.is_empty(),
            "vehicle stats: at least one wheel contact point is required"
        );
        Self::validate_curve("standard", &self.acceleration_standard);
        Self::validate_curve("drift", &self.acceleration_drift);
    }

    fn validate_curve(name: &str, curve: &[CurvePoint]) {
        assert!(
            !curve.is_empty(),
            "vehicle stats: {name} acceleration curve has no breakpoints"
        );
        let mut prev = 0.0;
        for &(ratio, _) in curve {
            assert!(
                ratio > prev,
                "vehicle stats: {name} acceleration curve ratios must be strictly \
                 increasing and positive (got {ratio} after {prev})"
            );
            prev = ratio;
        }
    }
}

impl Default for VehicleStats {
    fn default() -> Self {
        Self::bike(WeightClass::Medium)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bike_presets_validate() {
        for class in [WeightClass::Light, WeightClass::Medium, WeightClass::Heavy] {
            let stats = VehicleStats::bike(class);
            assert_eq!(stats.kind, VehicleKind::Bike);
            assert_eq!(stats.weight_class, class);
            assert!(stats.base_speed > 0.0);
        }
    }

    #[test]
    fn heavier_bikes_are_faster_but_turn_less() {
        let light = VehicleStats::bike(WeightClass::Light);
        let heavy = VehicleStats::bike(WeightClass::Heavy);
        assert!(heavy.base_speed > light.base_speed);
        assert!(heavy.handling_tightness < light.handling_tightness);
    }

    #[test]
    fn weight_class_indices() {
        assert_eq!(WeightClass::Light.index(), 0);
        assert_eq!(WeightClass::Medium.index(), 1);
        assert_eq!(WeightClass::Heavy.index(), 2);
    }

    #[test]
    #[should_panic(expected = "no breakpoints")]
    fn empty_curve_is_fatal() {
        let _ = VehicleStats::default().with_acceleration_curves(vec![], vec![(1.0, 1.0)]);
    }

    #[test]
    #[should_panic(expected = "strictly increasing")]
    fn non_increasing_curve_is_fatal() {
        let _ = VehicleStats::default()
            .with_acceleration_curves(vec![(0.5, 2.0), (0.5, 1.0)], vec![(1.0, 1.0)]);
    }

    #[test]
    fn builder_overrides() {
        let stats = VehicleStats::default()
            .with_base_speed(70.0)
            .with_reactivity(0.5, 0.9)
            .with_tightness(0.02, 0.03);
        assert_eq!(stats.base_speed, 70.0);
        assert_eq!(stats.handling_reactivity, 0.5);
        assert_eq!(stats.drift_tightness, 0.03);
    }
}
