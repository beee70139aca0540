/// Exploded-view layout: spreads eligible parts along an axis
use nalgebra::{Unit, Vector3};
use tracing::debug;

use crate::registry::PartRegistry;

pub const DEFAULT_EXPLODE_STEP: f32 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct ExplodeLayout {
    axis: Unit<Vector3<f32>>,
    step: f32,
}

impl ExplodeLayout {
    pub fn new(axis: Unit<Vector3<f32>>, step: f32) -> Self {
        Self { axis, step }
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    /// Move every eligible part to its exploded or assembled position.
    ///
    /// The k-th eligible part in load order sits `k * step` along the
    /// axis when exploded. Parts are shifted by the difference from their
    /// current offset, so toggling back restores them exactly and applying
    /// the same state twice does nothing. Returns the number of parts moved.
    pub fn apply(&self, registry: &mut PartRegistry, exploded: bool) -> usize {
        let mut d = 0u32;
        let mut moved = 0;

        for part in registry.iter_mut() {
            if !part.is_explode_eligible() {
                continue;
            }
            d += 1;

            let target = if exploded {
                self.axis.into_inner() * (self.step * d as f32)
            } else {
                Vector3::zeros()
            };
            let shift = target - part.explode_offset;
            if shift != Vector3::zeros() {
                part.mesh.translate(&shift);
                moved += 1;
            }
            part.explode_offset = target;
        }

        debug!(exploded, moved, "explode layout applied");
        moved
    }
}

impl Default for ExplodeLayout {
    fn default() -> Self {
        Self::new(Vector3::y_axis(), DEFAULT_EXPLODE_STEP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Mesh;
    use crate::kinematics::KinematicSolver;
    use crate::part::{PartId, PartRole, RoleAssignment};
    use nalgebra::Point3;

    fn part_mesh(x: f32) -> Mesh {
        Mesh::cuboid(Vector3::new(0.2, 0.2, 0.2), Point3::new(x, 0.0, 0.0))
    }

    fn engine() -> (PartRegistry, [PartId; 4]) {
        let mut registry = PartRegistry::new();
        let ids = [
            registry.insert("crankshaft", RoleAssignment::new(PartRole::Shaft, false), part_mesh(0.0)),
            registry.insert("front_rotor", RoleAssignment::new(PartRole::Rotor, false), part_mesh(1.0)),
            registry.insert("back_rotor", RoleAssignment::new(PartRole::Rotor, false), part_mesh(2.0)),
            registry.insert("housing", RoleAssignment::new(PartRole::Static, true), part_mesh(3.0)),
        ];
        (registry, ids)
    }

    fn centroid(registry: &PartRegistry, id: PartId) -> Point3<f32> {
        registry.get(id).unwrap().mesh.centroid().unwrap()
    }

    #[test]
    fn test_two_of_four_parts_spread() {
        let (mut registry, [shaft, front, back, housing]) = engine();
        let before: Vec<_> = registry.ids().map(|id| centroid(&registry, id)).collect();

        let layout = ExplodeLayout::default();
        assert_eq!(layout.apply(&mut registry, true), 2);

        assert_eq!(centroid(&registry, shaft), before[0]);
        assert_eq!(centroid(&registry, housing), before[3]);

        let front_shift = centroid(&registry, front) - before[1];
        let back_shift = centroid(&registry, back) - before[2];
        assert!((front_shift - Vector3::new(0.0, 0.1, 0.0)).norm() < 1e-6);
        assert!((back_shift - Vector3::new(0.0, 0.2, 0.0)).norm() < 1e-6);
    }

    #[test]
    fn test_round_trip_restores_positions() {
        let (mut registry, _) = engine();
        let before: Vec<Mesh> = registry.iter().map(|p| p.mesh.clone()).collect();

        let layout = ExplodeLayout::new(Vector3::x_axis(), 0.37);
        layout.apply(&mut registry, true);
        layout.apply(&mut registry, false);

        for (part, original) in registry.iter().zip(&before) {
            for (a, b) in part.mesh.vertices().zip(original.vertices()) {
                assert!((a.position - b.position).norm() < 1e-5);
            }
            assert_eq!(part.explode_offset(), Vector3::zeros());
        }
    }

    #[test]
    fn test_repeated_state_is_noop() {
        let (mut registry, [_, front, ..]) = engine();
        let layout = ExplodeLayout::default();

        layout.apply(&mut registry, true);
        let once = centroid(&registry, front);
        assert_eq!(layout.apply(&mut registry, true), 0);
        assert_eq!(centroid(&registry, front), once);

        assert_eq!(layout.apply(&mut registry, false), 2);
        assert_eq!(layout.apply(&mut registry, false), 0);
    }

    #[test]
    fn test_offset_survives_animation() {
        let (mut registry, [_, front, ..]) = engine();
        let solver = KinematicSolver::default();
        let layout = ExplodeLayout::default();
        layout.apply(&mut registry, true);

        let mut assembled = engine().0;
        solver.step(&mut registry, 40.0, 10.0);
        solver.step(&mut assembled, 40.0, 10.0);

        let lift = centroid(&registry, front) - centroid(&assembled, front);
        assert!((lift - Vector3::new(0.0, 0.1, 0.0)).norm() < 1e-5);
    }
}
