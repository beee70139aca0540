/// Part registry: every loaded part, its live render mesh, and the
/// immutable reference mesh the animation resets from.
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use nalgebra::Isometry3;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::RoleTable;
use crate::geometry::{Bounds, Mesh};
use crate::part::{Part, PartId, PartRole, RoleAssignment};
use crate::stl;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("mesh directory {} does not exist", .0.display())]
    MissingDir(PathBuf),
    #[error("failed to read mesh directory {}: {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no loadable STL meshes found in {}", .0.display())]
    Empty(PathBuf),
}

#[derive(Debug, Default)]
pub struct PartRegistry {
    parts: Vec<Part>,
    by_name: HashMap<String, PartId>,
    references: HashMap<PartId, Mesh>,
}

impl PartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a part; the mesh becomes both the reference and the
    /// initial render mesh. Re-inserting a name replaces that part's meshes.
    pub fn insert(&mut self, name: &str, assignment: RoleAssignment, mesh: Mesh) -> PartId {
        if let Some(&id) = self.by_name.get(name) {
            let part = &mut self.parts[id.0];
            *part = Part::new(id, name, assignment, mesh.clone());
            self.references.insert(id, mesh);
            return id;
        }

        let id = PartId(self.parts.len());
        self.references.insert(id, mesh.clone());
        self.parts.push(Part::new(id, name, assignment, mesh));
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Drop the stored reference mesh of a part. Animated parts without a
    /// reference are left where they are.
    pub fn forget_reference(&mut self, id: PartId) -> Option<Mesh> {
        self.references.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Part> {
        self.parts.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Part> {
        self.parts.iter_mut()
    }

    pub fn get(&self, id: PartId) -> Option<&Part> {
        self.parts.get(id.0)
    }

    pub fn get_mut(&mut self, id: PartId) -> Option<&mut Part> {
        self.parts.get_mut(id.0)
    }

    pub fn find(&self, name: &str) -> Option<PartId> {
        self.by_name.get(name).copied()
    }

    pub fn reference(&self, id: PartId) -> Option<&Mesh> {
        self.references.get(&id)
    }

    /// Part ids in load order
    pub fn ids(&self) -> impl Iterator<Item = PartId> {
        (0..self.parts.len()).map(PartId)
    }

    pub fn with_role(&self, role: PartRole) -> impl Iterator<Item = PartId> + '_ {
        self.parts.iter().filter(move |p| p.role() == role).map(Part::id)
    }

    /// First part tagged as the shaft
    pub fn shaft(&self) -> Option<PartId> {
        self.with_role(PartRole::Shaft).next()
    }

    /// Copy the reference mesh back into the render mesh, without the
    /// explode offset. Returns `false` when there is nothing to reset from.
    pub fn reset_from_reference(&mut self, id: PartId) -> bool {
        let (Some(part), Some(reference)) = (self.parts.get_mut(id.0), self.references.get(&id))
        else {
            return false;
        };
        part.mesh.copy_positions_from(reference).is_ok()
    }

    /// Combined bounds of every part's render mesh
    pub fn bounds(&self) -> Option<Bounds> {
        self.parts
            .iter()
            .filter_map(|p| p.mesh.bounds())
            .reduce(|a, b| a.union(&b))
    }

    /// Load every `.stl` file in `dir`, sorted by file name.
    ///
    /// Files that are not STL are ignored and STL files that fail to parse
    /// are skipped with a warning. A missing directory, or one with no
    /// loadable mesh, is an error.
    pub fn load_dir(
        dir: &Path,
        roles: &RoleTable,
        load_rotation: Option<&Isometry3<f32>>,
    ) -> Result<Self, LoadError> {
        if !dir.is_dir() {
            return Err(LoadError::MissingDir(dir.to_path_buf()));
        }

        let read_dir_error = |source| LoadError::ReadDir {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(read_dir_error)? {
            let path = entry.map_err(read_dir_error)?.path();
            if path.is_file() && is_stl(&path) {
                paths.push(path);
            } else {
                debug!(path = %path.display(), "skipping non-STL entry");
            }
        }
        paths.sort();

        let mut registry = Self::new();
        for path in paths {
            let Some(name) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };

            let mut mesh = match stl::load_stl(&path) {
                Ok(mesh) => mesh,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable mesh");
                    continue;
                }
            };
            if let Some(rotation) = load_rotation {
                mesh.transform(rotation);
            }

            let assignment = roles.classify(&name);
            debug!(part = %name, role = ?assignment.role, triangles = mesh.len(), "loaded part");
            registry.insert(&name, assignment, mesh);
        }

        if registry.is_empty() {
            return Err(LoadError::Empty(dir.to_path_buf()));
        }

        info!(
            dir = %dir.display(),
            parts = registry.len(),
            shaft = registry.shaft().is_some(),
            rotors = registry.with_role(PartRole::Rotor).count(),
            "loaded engine assembly"
        );
        Ok(registry)
    }
}

fn is_stl(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("stl"))
}
