//! Raw JSON shapes of a geometry object.
//!
//! These mirror the file closely and are tolerant: every field is optional
//! and unknown fields are ignored. The loader turns them into the
//! normalized [`crate::model`] types.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

pub type Vec3 = [f64; 3];
pub type Vec2 = [f64; 2];

/// One geometry, in any layout.
///
/// 1.12+ keeps texture and bounds data under `description`; 1.8 keeps them
/// on the geometry itself.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawGeometry {
    pub description: RawDescription,
    pub bones: Vec<RawBone>,

    pub texturewidth: Option<f64>,
    pub textureheight: Option<f64>,
    pub visible_bounds_offset: Option<Vec3>,
    pub visible_bounds_width: Option<f64>,
    pub visible_bounds_height: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawDescription {
    pub identifier: Option<String>,
    pub texture_width: Option<f64>,
    pub texture_height: Option<f64>,
    pub visible_bounds_offset: Option<Vec3>,
    pub visible_bounds_width: Option<f64>,
    pub visible_bounds_height: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawBone {
    pub name: Option<String>,
    pub parent: Option<String>,
    pub pivot: Option<Vec3>,
    pub rotation: Option<Vec3>,
    pub mirror: Option<bool>,
    pub inflate: Option<f64>,
    pub cubes: Vec<RawCube>,

    /// Name to locator, in document order; entries are read as
    /// [`RawLocator`] by the loader.
    pub locators: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawCube {
    pub origin: Option<Vec3>,
    pub size: Option<Vec3>,
    pub pivot: Option<Vec3>,
    pub rotation: Option<Vec3>,
    pub inflate: Option<f64>,
    pub mirror: Option<bool>,
    pub uv: Option<RawUv>,
}

/// `"uv": [u, v]` or `"uv": { "north": {...}, ... }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawUv {
    Box(Vec<f64>),
    PerFace(BTreeMap<String, Value>),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawFaceUv {
    pub uv: Option<Vec2>,
    pub uv_size: Option<Vec2>,
}

/// `"name": [x, y, z]` or `"name": { "offset": [...], "rotation": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawLocator {
    Offset(Vec3),
    Full(RawLocatorFull),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawLocatorFull {
    pub offset: Option<Vec3>,
    pub rotation: Option<Vec3>,
}
