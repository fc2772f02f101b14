//! Top-level import entry points.

use std::path::Path;

use crate::builder;
use crate::error::ImportResult;
use crate::schema;
use crate::skeleton::SkeletonResult;

/// Bone length used when none is configured.
pub const DEFAULT_BONE_LENGTH: f64 = 0.3;

/// Options for one import.
#[derive(Clone, Debug, PartialEq)]
pub struct ImportOptions {
    /// Geometry to import; `None` picks the first geometry with bones
    pub geometry_name: Option<String>,

    /// Length of emitted bones in world units (display only)
    pub bone_length: f64,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            geometry_name: None,
            bone_length: DEFAULT_BONE_LENGTH,
        }
    }
}

impl ImportOptions {
    pub fn with_geometry_name(mut self, name: impl Into<String>) -> Self {
        self.geometry_name = Some(name.into());
        self
    }

    pub fn with_bone_length(mut self, length: f64) -> Self {
        self.bone_length = length;
        self
    }
}

/// Import a geometry from raw JSON bytes.
pub fn import_model(bytes: &[u8], options: &ImportOptions) -> ImportResult<SkeletonResult> {
    let descriptor = schema::load_model_from_slice(bytes, options.geometry_name.as_deref())?;
    builder::build(&descriptor, options)
}

/// Import a geometry from a JSON string.
pub fn import_model_str(json: &str, options: &ImportOptions) -> ImportResult<SkeletonResult> {
    import_model(json.as_bytes(), options)
}

/// Import a geometry file from disk.
pub fn import_model_file<P: AsRef<Path>>(path: P, options: &ImportOptions) -> ImportResult<SkeletonResult> {
    let path = path.as_ref();
    log::debug!("Importing {}", path.display());

    let bytes = std::fs::read(path)?;
    import_model(&bytes, options)
}
