//! Geometry selection and normalization.

use std::path::Path;

use bbm_math::{DVec2, DVec3};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ImportError, ImportResult};
use crate::model::{
    Bone, Cube, Face, FormatVersion, Locator, ModelDescriptor, VisibleBounds,
};
use crate::schema::raw::{RawBone, RawCube, RawFaceUv, RawGeometry, RawLocator, RawUv};
use crate::schema::version::{detect_format_version, FORMAT_VERSION_KEY, GEOMETRY_LIST_KEY};
use crate::uv::{self, FaceEntry, UvSpec};

/// Prefix conventionally carried by geometry identifiers.
pub const GEOMETRY_PREFIX: &str = "geometry.";

const DEFAULT_IDENTIFIER: &str = "geometry.unknown";
const DEFAULT_BONE_NAME: &str = "unnamed";
const DEFAULT_TEXTURE_SIZE: u32 = 64;

/// A geometry found in a document, before it is read.
struct Candidate<'a> {
    /// Identifier used for name matching and as the model identifier.
    identifier: String,
    value: &'a Value,
}

impl Candidate<'_> {
    fn has_bones(&self) -> bool {
        self.value
            .get("bones")
            .and_then(Value::as_array)
            .is_some_and(|bones| !bones.is_empty())
    }
}

/// Load a geometry file from disk.
pub fn load_model_file<P: AsRef<Path>>(
    path: P,
    geometry_name: Option<&str>,
) -> ImportResult<ModelDescriptor> {
    let bytes = std::fs::read(path.as_ref())?;
    load_model_from_slice(&bytes, geometry_name)
}

/// Load a geometry from raw JSON bytes.
pub fn load_model_from_slice(
    bytes: &[u8],
    geometry_name: Option<&str>,
) -> ImportResult<ModelDescriptor> {
    let doc: Value = serde_json::from_slice(bytes)?;
    load_model_from_value(&doc, geometry_name)
}

/// Load a geometry from a JSON string (useful for testing).
pub fn load_model_from_str(json: &str, geometry_name: Option<&str>) -> ImportResult<ModelDescriptor> {
    let doc: Value = serde_json::from_str(json)?;
    load_model_from_value(&doc, geometry_name)
}

/// Normalize one geometry of a parsed document.
///
/// With a `geometry_name`, the geometry whose identifier equals the name is
/// chosen, then one equal to `geometry.<name>`. Without one, the first
/// geometry with a non-empty bone list is chosen.
pub fn load_model_from_value(
    doc: &Value,
    geometry_name: Option<&str>,
) -> ImportResult<ModelDescriptor> {
    let format_version = detect_format_version(doc);
    let candidates = geometry_candidates(doc, format_version)?;
    let candidate = select_geometry(&candidates, geometry_name)?;

    log::debug!(
        "Reading geometry '{}' (format {})",
        candidate.identifier,
        format_version
    );

    let raw = RawGeometry::deserialize(candidate.value)?;
    normalize(raw, candidate.identifier.clone(), format_version)
}

/// Identifiers of every geometry in a document, in document order.
pub fn list_geometries(json: &str) -> ImportResult<Vec<String>> {
    let doc: Value = serde_json::from_str(json)?;
    let format_version = detect_format_version(&doc);
    let candidates = geometry_candidates(&doc, format_version)?;
    Ok(candidates.into_iter().map(|c| c.identifier).collect())
}

fn geometry_candidates(doc: &Value, format_version: FormatVersion) -> ImportResult<Vec<Candidate<'_>>> {
    match format_version {
        FormatVersion::V1_12 | FormatVersion::V1_16 => {
            let list = match doc.get(GEOMETRY_LIST_KEY) {
                None => return Ok(Vec::new()),
                Some(Value::Array(list)) => list,
                Some(_) => {
                    log::warn!("'{}' is not a list", GEOMETRY_LIST_KEY);
                    return Err(ImportError::GeometryNotFound {
                        attempted: vec![GEOMETRY_LIST_KEY.to_string()],
                    });
                }
            };

            Ok(list
                .iter()
                .filter(|geometry| geometry.is_object())
                .map(|geometry| Candidate {
                    identifier: geometry
                        .pointer("/description/identifier")
                        .and_then(Value::as_str)
                        .unwrap_or(DEFAULT_IDENTIFIER)
                        .to_string(),
                    value: geometry,
                })
                .collect())
        }
        FormatVersion::V1_8 => {
            let Some(root) = doc.as_object() else {
                return Ok(Vec::new());
            };

            Ok(root
                .iter()
                .filter(|(key, value)| {
                    key.as_str() != FORMAT_VERSION_KEY && key.as_str() != "debug" && value.is_object()
                })
                .map(|(key, value)| Candidate {
                    // "geometry.child:geometry.parent" names the child.
                    identifier: key.split(':').next().unwrap_or(key).to_string(),
                    value,
                })
                .collect())
        }
    }
}

fn select_geometry<'c, 'a>(
    candidates: &'c [Candidate<'a>],
    geometry_name: Option<&str>,
) -> ImportResult<&'c Candidate<'a>> {
    match geometry_name.filter(|name| !name.is_empty()) {
        Some(name) => {
            let mut attempted = vec![name.to_string()];
            let prefixed = format!("{}{}", GEOMETRY_PREFIX, name);
            if prefixed != name {
                attempted.push(prefixed);
            }

            // Each spelling is tried against the whole list before the next,
            // so an exact bare match always beats a prefixed one.
            let found = attempted
                .iter()
                .find_map(|wanted| candidates.iter().find(|c| &c.identifier == wanted));
            found.ok_or(ImportError::GeometryNotFound { attempted })
        }
        None => candidates.iter().find(|c| c.has_bones()).ok_or_else(|| {
            ImportError::GeometryNotFound {
                attempted: candidates.iter().map(|c| c.identifier.clone()).collect(),
            }
        }),
    }
}

fn normalize(
    raw: RawGeometry,
    identifier: String,
    format_version: FormatVersion,
) -> ImportResult<ModelDescriptor> {
    let (texture_width, texture_height, offset, width, height) = match format_version {
        FormatVersion::V1_8 => (
            raw.texturewidth,
            raw.textureheight,
            raw.visible_bounds_offset,
            raw.visible_bounds_width,
            raw.visible_bounds_height,
        ),
        FormatVersion::V1_12 | FormatVersion::V1_16 => (
            raw.description.texture_width,
            raw.description.texture_height,
            raw.description.visible_bounds_offset,
            raw.description.visible_bounds_width,
            raw.description.visible_bounds_height,
        ),
    };

    let defaults = VisibleBounds::default();
    let visible_bounds = VisibleBounds {
        offset: offset.map(DVec3::from).unwrap_or(defaults.offset),
        width: width.unwrap_or(defaults.width),
        height: height.unwrap_or(defaults.height),
    };

    let bones: Vec<Bone> = raw.bones.into_iter().map(normalize_bone).collect();

    log::debug!(
        "Normalized '{}': {} bones, {} cubes",
        identifier,
        bones.len(),
        bones.iter().map(|b| b.cubes.len()).sum::<usize>()
    );

    Ok(ModelDescriptor {
        identifier,
        format_version,
        texture_width: texture_dimension(texture_width, "texture width")?,
        texture_height: texture_dimension(texture_height, "texture height")?,
        visible_bounds,
        bones,
    })
}

fn texture_dimension(value: Option<f64>, what: &str) -> ImportResult<u32> {
    match value {
        None => Ok(DEFAULT_TEXTURE_SIZE),
        Some(v) if v.is_finite() && v >= 0.0 && v <= f64::from(u32::MAX) => Ok(v as u32),
        Some(v) => Err(ImportError::InvalidGeometry(format!("{} {} is out of range", what, v))),
    }
}

fn vec3(v: Option<[f64; 3]>) -> DVec3 {
    v.map(DVec3::from).unwrap_or(DVec3::ZERO)
}

fn normalize_bone(raw: RawBone) -> Bone {
    let mirror = raw.mirror.unwrap_or(false);
    let inflate = raw.inflate.unwrap_or(0.0);
    let name = raw.name.unwrap_or_else(|| DEFAULT_BONE_NAME.to_string());

    let cubes = raw
        .cubes
        .into_iter()
        .map(|cube| normalize_cube(cube, mirror, inflate, &name))
        .collect();

    let locators = raw
        .locators
        .into_iter()
        .filter_map(|(locator_name, value)| match RawLocator::deserialize(&value) {
            Ok(RawLocator::Offset(offset)) => Some(Locator {
                name: locator_name,
                offset: DVec3::from(offset),
                rotation: DVec3::ZERO,
            }),
            Ok(RawLocator::Full(full)) => Some(Locator {
                name: locator_name,
                offset: vec3(full.offset),
                rotation: vec3(full.rotation),
            }),
            Err(err) => {
                log::warn!(
                    "Bone '{}': ignoring unreadable locator '{}' ({})",
                    name,
                    locator_name,
                    err
                );
                None
            }
        })
        .collect();

    Bone {
        parent: raw.parent,
        pivot: vec3(raw.pivot),
        rotation: vec3(raw.rotation),
        mirror,
        inflate,
        cubes,
        locators,
        name,
    }
}

/// `mirror` and `inflate` fall back to the owning bone's values.
fn normalize_cube(raw: RawCube, bone_mirror: bool, bone_inflate: f64, bone_name: &str) -> Cube {
    let size = vec3(raw.size);
    let mirror = raw.mirror.unwrap_or(bone_mirror);
    let spec = raw.uv.and_then(|uv| uv_spec(uv, bone_name));

    Cube {
        origin: vec3(raw.origin),
        pivot: vec3(raw.pivot),
        rotation: vec3(raw.rotation),
        inflate: raw.inflate.unwrap_or(bone_inflate),
        uv: uv::resolve(spec.as_ref(), size, mirror),
        size,
        mirror,
    }
}

fn uv_spec(raw: RawUv, bone_name: &str) -> Option<UvSpec> {
    match raw {
        RawUv::Box(anchor) if anchor.len() >= 2 => {
            Some(UvSpec::Box(DVec2::new(anchor[0], anchor[1])))
        }
        RawUv::Box(_) => None,
        RawUv::PerFace(mut faces) => {
            let entries = Face::ALL
                .iter()
                .filter_map(|&face| {
                    let value = faces.remove(face.key())?;
                    match RawFaceUv::deserialize(&value) {
                        Ok(raw) => Some((
                            face,
                            FaceEntry {
                                uv: raw.uv.map(DVec2::from),
                                uv_size: raw.uv_size.map(DVec2::from),
                            },
                        )),
                        Err(err) => {
                            log::warn!(
                                "Bone '{}': ignoring unreadable {} UV ({})",
                                bone_name,
                                face.key(),
                                err
                            );
                            None
                        }
                    }
                })
                .collect();
            Some(UvSpec::PerFace(entries))
        }
    }
}
