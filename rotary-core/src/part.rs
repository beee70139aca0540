/// Engine parts and their kinematic roles
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::geometry::Mesh;

/// How the animation treats a part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartRole {
    /// Eccentric shaft, spun about its own centroid
    Shaft,
    /// Rotor, carried around the shaft and counter-spun at 2/3 rate
    Rotor,
    /// Never moved by the animation
    Static,
}

/// Role and layout flags chosen for a part at load time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleAssignment {
    pub role: PartRole,
    pub explode_exempt: bool,
}

impl RoleAssignment {
    pub fn new(role: PartRole, explode_exempt: bool) -> Self {
        Self {
            role,
            explode_exempt,
        }
    }
}

/// Stable handle to a part in a `PartRegistry`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartId(pub(crate) usize);

impl PartId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct Part {
    id: PartId,
    name: String,
    label: String,
    assignment: RoleAssignment,
    /// Render mesh, rewritten in place by the animation and explode layout
    pub mesh: Mesh,
    pub visible: bool,
    pub(crate) explode_offset: Vector3<f32>,
}

impl Part {
    pub(crate) fn new(id: PartId, name: &str, assignment: RoleAssignment, mesh: Mesh) -> Self {
        Self {
            id,
            name: name.to_string(),
            label: display_label(name),
            assignment,
            mesh,
            visible: true,
            explode_offset: Vector3::zeros(),
        }
    }

    pub fn id(&self) -> PartId {
        self.id
    }

    /// Lookup identifier, the mesh file stem
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn role(&self) -> PartRole {
        self.assignment.role
    }

    pub fn is_explode_eligible(&self) -> bool {
        self.assignment.role != PartRole::Shaft && !self.assignment.explode_exempt
    }

    pub fn explode_offset(&self) -> Vector3<f32> {
        self.explode_offset
    }
}

/// Strip a leading ordering prefix such as `4` in `4crankshaft`.
pub fn display_label(name: &str) -> String {
    let trimmed = name.trim_start_matches(|c: char| c.is_ascii_digit() || c == '_' || c == '-' || c == ' ');
    if trimmed.is_empty() {
        name.to_string()
    } else {
        trimmed.replace('_', " ")
    }
}
