//! Geometry file loading.
//!
//! This module reads the three JSON layouts of block-model geometry files
//! and normalizes them into a [`ModelDescriptor`](crate::model::ModelDescriptor).
//! Nothing outside this module needs to know which layout was read.
//!
//! ## Supported Layouts
//!
//! - `1.8.0`: geometries are top-level keys (`"geometry.pig": {...}`),
//!   optionally with a `name:parent` suffix
//! - `1.12.0`: a `minecraft:geometry` list with `description` blocks
//! - `1.16.0`: as 1.12, plus per-face UV maps
//!
//! # Example
//!
//! ```ignore
//! use bbm_core::schema::load_model_from_str;
//!
//! let model = load_model_from_str(json, Some("pig"))?;
//! println!("{} bones", model.bones.len());
//! ```

mod loader;
mod raw;
mod version;

pub use loader::*;
pub use version::{detect_format_version, FORMAT_VERSION_KEY, GEOMETRY_LIST_KEY};
