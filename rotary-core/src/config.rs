/// Viewer configuration: kinematic constants, explode spacing and the role
/// table that maps mesh file names to part roles.
///
/// Every field has a default, so a YAML file only needs the keys it changes.
use std::path::{Path, PathBuf};

use nalgebra::{Isometry3, Point3, Unit, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::part::{PartRole, RoleAssignment};
use crate::transform::Transform;

/// Slowest speed accepted, also the floor of the interactive speed controls
pub const MIN_DEGREES_PER_STEP: f64 = 1.0;
/// Largest step accepted; anything above reads as a jump rather than motion.
pub const MAX_DEGREES_PER_STEP: f64 = 180.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("{0} must be a non-zero vector")]
    ZeroAxis(&'static str),
    #[error("degrees_per_step must be in [1, 180], got {0}")]
    Speed(f64),
    #[error("explode_step must be positive, got {0}")]
    ExplodeStep(f32),
}

/// One row of the role table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleRule {
    /// Case-insensitive substring of the part name
    pub pattern: String,
    pub role: PartRole,
    /// Whether the part spreads out in the explode view
    #[serde(default = "default_true")]
    pub explode: bool,
}

fn default_true() -> bool {
    true
}

impl RoleRule {
    pub fn new(pattern: &str, role: PartRole, explode: bool) -> Self {
        Self {
            pattern: pattern.to_string(),
            role,
            explode,
        }
    }

    fn matches(&self, name: &str) -> bool {
        name.to_ascii_lowercase()
            .contains(&self.pattern.to_ascii_lowercase())
    }
}

/// Ordered role rules; the first matching rule wins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleTable {
    rules: Vec<RoleRule>,
}

impl RoleTable {
    pub fn new(rules: Vec<RoleRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[RoleRule] {
        &self.rules
    }

    /// Unmatched names are static and spread out when exploded
    pub fn classify(&self, name: &str) -> RoleAssignment {
        self.rules
            .iter()
            .find(|rule| rule.matches(name))
            .map(|rule| RoleAssignment::new(rule.role, !rule.explode))
            .unwrap_or(RoleAssignment::new(PartRole::Static, false))
    }
}

impl Default for RoleTable {
    fn default() -> Self {
        Self::new(vec![
            // Static parts first so names like `rotor_housing` stay put
            RoleRule::new("housing", PartRole::Static, false),
            RoleRule::new("plate", PartRole::Static, false),
            RoleRule::new("hub", PartRole::Static, false),
            RoleRule::new("shaft", PartRole::Shaft, false),
            RoleRule::new("rotor", PartRole::Rotor, true),
        ])
    }
}

/// Fixed rotation applied to every mesh as it is loaded
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadRotation {
    pub axis: [f32; 3],
    pub degrees: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub mesh_dir: PathBuf,
    /// Engine long axis; shaft and rotors turn about it
    pub axis: [f32; 3],
    pub degrees_per_step: f64,
    pub delay_ms: u64,
    pub explode_step: f32,
    pub explode_axis: [f32; 3],
    pub load_rotation: Option<LoadRotation>,
    pub roles: RoleTable,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            mesh_dir: PathBuf::from("./models"),
            axis: [0.0, 1.0, 0.0],
            degrees_per_step: 10.0,
            delay_ms: 0,
            explode_step: 0.1,
            explode_axis: [0.0, 1.0, 0.0],
            load_rotation: None,
            roles: RoleTable::default(),
        }
    }
}

impl ViewerConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: ViewerConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.axis()?;
        self.explode_axis()?;
        self.load_rotation()?;
        if !(MIN_DEGREES_PER_STEP..=MAX_DEGREES_PER_STEP).contains(&self.degrees_per_step) {
            return Err(ConfigError::Speed(self.degrees_per_step));
        }
        if !(self.explode_step > 0.0) {
            return Err(ConfigError::ExplodeStep(self.explode_step));
        }
        Ok(())
    }

    pub fn axis(&self) -> Result<Unit<Vector3<f32>>, ConfigError> {
        Transform::axis(self.axis).ok_or(ConfigError::ZeroAxis("axis"))
    }

    pub fn explode_axis(&self) -> Result<Unit<Vector3<f32>>, ConfigError> {
        Transform::axis(self.explode_axis).ok_or(ConfigError::ZeroAxis("explode_axis"))
    }

    /// Load rotation as an isometry about the model origin
    pub fn load_rotation(&self) -> Result<Option<Isometry3<f32>>, ConfigError> {
        self.load_rotation
            .map(|rotation| -> Result<Isometry3<f32>, ConfigError> {
                let axis = Transform::axis(rotation.axis)
                    .ok_or(ConfigError::ZeroAxis("load_rotation.axis"))?;
                Ok(Transform::rotation_about(
                    &axis,
                    rotation.degrees,
                    &Point3::origin(),
                ))
            })
            .transpose()
    }
}
