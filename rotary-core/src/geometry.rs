/// Geometry primitives for engine part meshes
use nalgebra::{Isometry3, Point3, Vector3};
use thiserror::Error;

/// A 3D vertex with position and normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32, nx: f32, ny: f32, nz: f32) -> Self {
        Self {
            position: Point3::new(x, y, z),
            normal: Vector3::new(nx, ny, nz),
        }
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Face normal from the winding of the vertices, `None` for degenerate faces
    pub fn face_normal(&self) -> Option<Vector3<f32>> {
        let [v0, v1, v2] = self.vertices.map(|v| v.position);
        (v1 - v0).cross(&(v2 - v0)).try_normalize(1e-12)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    #[error("topology mismatch: expected {expected} triangles, found {actual}")]
    TopologyMismatch { expected: usize, actual: usize },
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Bounds {
    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn extent(&self) -> Vector3<f32> {
        self.max - self.min
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }
}

/// A surface mesh stored as a triangle soup.
///
/// The triangle list is the mesh connectivity: once loaded it is never
/// reordered or resized, only vertex positions and normals are rewritten.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.triangles.iter().flat_map(|t| t.vertices.iter())
    }

    /// Mean of all vertex positions.
    ///
    /// Summed in f64 so that the pivot of a mesh rotated about its own
    /// centroid stays put over long animation runs.
    pub fn centroid(&self) -> Option<Point3<f32>> {
        if self.triangles.is_empty() {
            return None;
        }
        let mut sum = Vector3::<f64>::zeros();
        let mut count = 0usize;
        for vertex in self.vertices() {
            sum += vertex.position.coords.cast::<f64>();
            count += 1;
        }
        Some(Point3::from((sum / count as f64).cast::<f32>()))
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let mut vertices = self.vertices();
        let first = vertices.next()?.position;
        Some(vertices.fold(
            Bounds {
                min: first,
                max: first,
            },
            |b, v| Bounds {
                min: b.min.inf(&v.position),
                max: b.max.sup(&v.position),
            },
        ))
    }

    /// Apply a rigid transform in place; normals follow the rotation part
    pub fn transform(&mut self, isometry: &Isometry3<f32>) {
        for triangle in &mut self.triangles {
            for vertex in &mut triangle.vertices {
                vertex.position = isometry * vertex.position;
                vertex.normal = isometry.rotation * vertex.normal;
            }
        }
    }

    pub fn translate(&mut self, offset: &Vector3<f32>) {
        for triangle in &mut self.triangles {
            for vertex in &mut triangle.vertices {
                vertex.position += offset;
            }
        }
    }

    /// Overwrite every vertex with the matching vertex of `source`.
    ///
    /// Reuses the existing buffer; both meshes must share connectivity.
    pub fn copy_positions_from(&mut self, source: &Mesh) -> Result<(), MeshError> {
        if self.triangles.len() != source.triangles.len() {
            return Err(MeshError::TopologyMismatch {
                expected: self.triangles.len(),
                actual: source.triangles.len(),
            });
        }
        for (dst, src) in self.triangles.iter_mut().zip(&source.triangles) {
            dst.vertices = src.vertices;
        }
        Ok(())
    }

    /// Closed box with outward normals, two triangles per face
    pub fn cuboid(half_extents: Vector3<f32>, center: Point3<f32>) -> Self {
        let mut mesh = Self::with_capacity(12);

        for axis in 0..3 {
            let u_axis = (axis + 1) % 3;
            let v_axis = (axis + 2) % 3;
            for sign in [1.0f32, -1.0] {
                let mut normal = Vector3::zeros();
                normal[axis] = sign;

                let corner = |su: f32, sv: f32| {
                    let mut p = center.coords;
                    p[axis] += sign * half_extents[axis];
                    p[u_axis] += su * half_extents[u_axis];
                    p[v_axis] += sv * half_extents[v_axis];
                    Vertex {
                        position: Point3::from(p),
                        normal,
                    }
                };

                let (a, b, c, d) = (
                    corner(-1.0, -1.0),
                    corner(1.0, -1.0),
                    corner(1.0, 1.0),
                    corner(-1.0, 1.0),
                );
                if sign > 0.0 {
                    mesh.add_triangle(Triangle::new(a, b, c));
                    mesh.add_triangle(Triangle::new(a, c, d));
                } else {
                    mesh.add_triangle(Triangle::new(a, c, b));
                    mesh.add_triangle(Triangle::new(a, d, c));
                }
            }
        }

        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Translation3, UnitQuaternion};

    #[test]
    fn test_cuboid_centroid_and_bounds() {
        let mesh = Mesh::cuboid(Vector3::new(1.0, 2.0, 3.0), Point3::new(4.0, 5.0, 6.0));
        assert_eq!(mesh.len(), 12);

        let centroid = mesh.centroid().unwrap();
        assert!((centroid - Point3::new(4.0, 5.0, 6.0)).norm() < 1e-6);

        let bounds = mesh.bounds().unwrap();
        assert_eq!(bounds.min, Point3::new(3.0, 3.0, 3.0));
        assert_eq!(bounds.max, Point3::new(5.0, 7.0, 9.0));
        assert_eq!(bounds.center(), Point3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn test_cuboid_normals_face_outward() {
        let mesh = Mesh::cuboid(Vector3::new(1.0, 1.0, 1.0), Point3::origin());
        for triangle in &mesh.triangles {
            let winding = triangle.face_normal().unwrap();
            let stored = triangle.vertices[0].normal;
            assert!((winding - stored).norm() < 1e-6);
        }
    }

    #[test]
    fn test_empty_mesh_has_no_centroid() {
        let mesh = Mesh::new();
        assert!(mesh.centroid().is_none());
        assert!(mesh.bounds().is_none());
    }

    #[test]
    fn test_transform_rotates_normals() {
        let mut mesh = Mesh::cuboid(Vector3::new(1.0, 1.0, 1.0), Point3::origin());
        let quarter = Isometry3::from_parts(
            Translation3::new(0.0, 0.0, 0.0),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), std::f32::consts::FRAC_PI_2),
        );
        mesh.transform(&quarter);

        for triangle in &mesh.triangles {
            let winding = triangle.face_normal().unwrap();
            assert!((winding - triangle.vertices[0].normal).norm() < 1e-5);
        }
    }

    #[test]
    fn test_translate_moves_centroid() {
        let mut mesh = Mesh::cuboid(Vector3::new(0.5, 0.5, 0.5), Point3::origin());
        mesh.translate(&Vector3::new(0.0, 0.3, 0.0));
        let centroid = mesh.centroid().unwrap();
        assert!((centroid - Point3::new(0.0, 0.3, 0.0)).norm() < 1e-6);
    }

    #[test]
    fn test_copy_positions_from() {
        let reference = Mesh::cuboid(Vector3::new(1.0, 1.0, 1.0), Point3::origin());
        let mut current = reference.clone();
        current.translate(&Vector3::new(3.0, 0.0, 0.0));
        let capacity = current.triangles.capacity();

        current.copy_positions_from(&reference).unwrap();
        assert_eq!(current, reference);
        assert_eq!(current.triangles.capacity(), capacity);
    }

    #[test]
    fn test_copy_positions_rejects_topology_change() {
        let reference = Mesh::cuboid(Vector3::new(1.0, 1.0, 1.0), Point3::origin());
        let mut other = Mesh::new();
        assert_eq!(
            other.copy_positions_from(&reference),
            Err(MeshError::TopologyMismatch {
                expected: 0,
                actual: 12
            })
        );
    }

    #[test]
    fn test_degenerate_face_has_no_normal() {
        let v = Vertex::new(1.0, 1.0, 1.0, 0.0, 0.0, 0.0);
        assert!(Triangle::new(v, v, v).face_normal().is_none());
    }
}
