/// Rigid transforms about fixed axes and pivots
use nalgebra::{Isometry3, Point3, Translation3, Unit, UnitQuaternion, Vector3};

/// Transform builder for the rigid motions used by the engine animation
pub struct Transform;

impl Transform {
    /// Normalize a configured axis, `None` for a zero-length vector
    pub fn axis(v: [f32; 3]) -> Option<Unit<Vector3<f32>>> {
        Unit::try_new(Vector3::from(v), 1e-6)
    }

    /// Rotation by `degrees` about the line through `pivot` along `axis`.
    ///
    /// The angle is reduced modulo 360 in f64 before narrowing, so phase
    /// angles accumulated over long runs keep full f32 precision.
    pub fn rotation_about(
        axis: &Unit<Vector3<f32>>,
        degrees: f64,
        pivot: &Point3<f32>,
    ) -> Isometry3<f32> {
        let radians = degrees.rem_euclid(360.0).to_radians() as f32;
        let rotation = UnitQuaternion::from_axis_angle(axis, radians);
        let shift = pivot.coords - rotation * pivot.coords;
        Isometry3::from_parts(Translation3::from(shift), rotation)
    }
}
