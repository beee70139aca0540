/// Rotary Core - Wankel engine assembly model and kinematics
///
/// This library loads per-part STL meshes into a registry, animates the
/// eccentric shaft and rotors with the rotors phase-locked at the 2:3
/// spin-to-orbit ratio, and lays parts out in an exploded view. Rendering
/// front ends only read the registry's render meshes.

pub mod clock;
pub mod config;
pub mod explode;
pub mod geometry;
pub mod kinematics;
pub mod part;
pub mod projection;
pub mod registry;
pub mod stl;
pub mod transform;

// Re-export commonly used types
pub use clock::{AnimationClock, AssemblyState, Ticker};
pub use config::{ConfigError, RoleRule, RoleTable, ViewerConfig};
pub use explode::ExplodeLayout;
pub use geometry::{Bounds, Mesh, Triangle, Vertex};
pub use kinematics::KinematicSolver;
pub use part::{Part, PartId, PartRole, RoleAssignment};
pub use projection::{Camera, ProjectionMode};
pub use registry::{LoadError, PartRegistry};
pub use transform::Transform;
