/// Rotary engine kinematics.
///
/// Sign convention, fixed for the whole crate: with right-handed rotation
/// about the engine axis, the shaft turns by `+δ` per step, each rotor is
/// carried around the shaft centroid by `+θ` and spun about its own
/// centroid by `-θ·2/3`. The net rotor orientation is therefore `+θ/3`,
/// which is what makes a rotor apex trace the housing's epitrochoid.
use nalgebra::{Point3, Unit, Vector3};
use tracing::trace;

use crate::part::{PartId, PartRole};
use crate::registry::PartRegistry;
use crate::transform::Transform;

/// Rotor spin relative to its orbit, opposite in sign
pub const SPIN_RATIO: f64 = 2.0 / 3.0;

#[derive(Debug, Clone, PartialEq)]
pub struct KinematicSolver {
    axis: Unit<Vector3<f32>>,
}

impl KinematicSolver {
    pub fn new(axis: Unit<Vector3<f32>>) -> Self {
        Self { axis }
    }

    pub fn axis(&self) -> &Unit<Vector3<f32>> {
        &self.axis
    }

    /// Advance the assembly by one step and return the new phase `θ + δ`.
    ///
    /// The shaft turns incrementally; rotors are rebuilt from their
    /// reference meshes at the shaft's new phase `θ + δ`, so they never lag
    /// the shaft and rotor error never accumulates. Missing shaft or rotor
    /// meshes are skipped.
    pub fn step(&self, registry: &mut PartRegistry, theta: f64, delta: f64) -> f64 {
        let phase = theta + delta;
        let pivot = self.turn_shaft(registry, delta);
        let pivot = pivot.unwrap_or_else(Point3::origin);

        for id in registry.ids() {
            if registry.get(id).is_some_and(|p| p.role() == PartRole::Rotor) {
                self.place_rotor(registry, id, phase, &pivot);
            }
        }

        trace!(theta, delta, "kinematic step");
        phase
    }

    /// Put the shaft and rotors back at phase zero, keeping explode offsets
    pub fn reset(&self, registry: &mut PartRegistry) {
        for id in registry.ids() {
            let animated = registry
                .get(id)
                .is_some_and(|p| matches!(p.role(), PartRole::Shaft | PartRole::Rotor));
            if animated && registry.reset_from_reference(id) {
                if let Some(part) = registry.get_mut(id) {
                    let offset = part.explode_offset();
                    part.mesh.translate(&offset);
                }
            }
        }
    }

    fn turn_shaft(&self, registry: &mut PartRegistry, delta: f64) -> Option<Point3<f32>> {
        let id = registry.shaft()?;
        let shaft = registry.get_mut(id)?;
        let center = shaft.mesh.centroid()?;
        shaft
            .mesh
            .transform(&Transform::rotation_about(&self.axis, delta, &center));
        Some(center)
    }

    fn place_rotor(&self, registry: &mut PartRegistry, id: PartId, theta: f64, pivot: &Point3<f32>) {
        if !registry.reset_from_reference(id) {
            return;
        }
        let Some(rotor) = registry.get_mut(id) else {
            return;
        };

        rotor
            .mesh
            .transform(&Transform::rotation_about(&self.axis, theta, pivot));

        let Some(center) = rotor.mesh.centroid() else {
            return;
        };
        rotor.mesh.transform(&Transform::rotation_about(
            &self.axis,
            -theta * SPIN_RATIO,
            &center,
        ));

        let offset = rotor.explode_offset();
        rotor.mesh.translate(&offset);
    }
}

impl Default for KinematicSolver {
    fn default() -> Self {
        Self::new(Vector3::y_axis())
    }
}
