//! BBM Core - block-model geometry import.
//!
//! This crate reads block-model geometry JSON (format versions 1.8, 1.12
//! and 1.16) and builds a skeleton with cube meshes and locators bound to
//! its bones, in a Z-up, meter-scaled world.
//!
//! - **Schema**: version detection, geometry selection and normalization
//! - **UV**: box and per-face texture layouts
//! - **Builder**: two-phase pivot and rotation resolution
//!
//! # Example
//!
//! ```ignore
//! use bbm_core::{import_model_file, ImportOptions};
//!
//! let options = ImportOptions::default().with_geometry_name("pig");
//! let result = import_model_file("pig.geo.json", &options)?;
//! println!("{} bones, {} meshes",
//!     result.skeleton.bone_count(),
//!     result.meshes.len());
//! ```

pub mod builder;
pub mod coords;
pub mod error;
pub mod graph;
pub mod import;
pub mod mesh;
pub mod model;
pub mod schema;
pub mod skeleton;
pub mod uv;

// Re-export commonly used types
pub use coords::CoordinatesConverter;
pub use error::{ImportError, ImportResult};
pub use import::{import_model, import_model_file, import_model_str, ImportOptions, DEFAULT_BONE_LENGTH};
pub use mesh::CubeMesh;
pub use model::{Bone, Cube, Face, FaceUv, FormatVersion, Locator, ModelDescriptor};
pub use schema::{list_geometries, load_model_file, load_model_from_str};
pub use skeleton::{Attachment, LocatorObject, MeshObject, Skeleton, SkeletonBone, SkeletonResult};
