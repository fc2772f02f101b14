//! Normalized model description.
//!
//! These types are the single internal representation produced from every
//! supported file version. They are built once by the schema loader and
//! never mutated afterwards.

use std::collections::HashSet;
use std::fmt;

use bbm_math::{DVec2, DVec3};

use crate::error::{ImportError, ImportResult};

/// Geometry file format generations with distinct JSON layouts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormatVersion {
    /// `1.8.0`: geometries are top-level keys.
    V1_8,
    /// `1.12.0`: `minecraft:geometry` list with descriptions.
    V1_12,
    /// `1.16.0` and later: as 1.12, plus per-face UV.
    V1_16,
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FormatVersion::V1_8 => "1.8.0",
            FormatVersion::V1_12 => "1.12.0",
            FormatVersion::V1_16 => "1.16.0",
        };
        f.write_str(s)
    }
}

/// A cube face, named by the direction it faces in model space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Face {
    North,
    South,
    East,
    West,
    Up,
    Down,
}

impl Face {
    /// All faces in storage order.
    pub const ALL: [Face; 6] = [
        Face::North,
        Face::South,
        Face::East,
        Face::West,
        Face::Up,
        Face::Down,
    ];

    /// The JSON key for this face.
    pub fn key(self) -> &'static str {
        match self {
            Face::North => "north",
            Face::South => "south",
            Face::East => "east",
            Face::West => "west",
            Face::Up => "up",
            Face::Down => "down",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// UV rectangle of one face, in texture pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceUv {
    /// Anchor corner.
    pub uv: DVec2,

    /// Signed size; a negative component flips that direction.
    pub uv_size: DVec2,
}

impl FaceUv {
    /// The "not visible" sentinel.
    pub const HIDDEN: FaceUv = FaceUv {
        uv: DVec2::new(0.0, -1.0),
        uv_size: DVec2::ZERO,
    };

    pub fn new(uv: DVec2, uv_size: DVec2) -> Self {
        Self { uv, uv_size }
    }

    /// True for the invisible-face sentinel.
    pub fn is_hidden(&self) -> bool {
        *self == Self::HIDDEN
    }

    /// Texture-pixel corners in mesh loop order:
    /// bottom-left, bottom-right, top-right, top-left.
    pub fn corners(&self) -> [DVec2; 4] {
        let DVec2 { x: u, y: v } = self.uv;
        let DVec2 { x: w, y: h } = self.uv_size;
        [
            DVec2::new(u, v + h),
            DVec2::new(u + w, v + h),
            DVec2::new(u + w, v),
            DVec2::new(u, v),
        ]
    }
}

/// Exactly one [`FaceUv`] per face.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceUvMap {
    faces: [FaceUv; 6],
}

impl FaceUvMap {
    /// A map with every face hidden.
    pub fn hidden() -> Self {
        Self {
            faces: [FaceUv::HIDDEN; 6],
        }
    }

    pub fn get(&self, face: Face) -> &FaceUv {
        &self.faces[face.index()]
    }

    pub fn set(&mut self, face: Face, uv: FaceUv) {
        self.faces[face.index()] = uv;
    }

    /// Iterate `(face, uv)` pairs in [`Face::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Face, &FaceUv)> + '_ {
        Face::ALL.iter().map(move |&face| (face, self.get(face)))
    }
}

/// An axis-aligned box belonging to a bone.
#[derive(Clone, Debug, PartialEq)]
pub struct Cube {
    /// Minimum corner in model units.
    pub origin: DVec3,
    pub size: DVec3,
    pub pivot: DVec3,
    /// Euler degrees about `pivot`.
    pub rotation: DVec3,
    pub inflate: f64,
    pub mirror: bool,
    pub uv: FaceUvMap,
}

/// A named attachment point.
#[derive(Clone, Debug, PartialEq)]
pub struct Locator {
    pub name: String,
    pub offset: DVec3,
    pub rotation: DVec3,
}

/// A named node in the bone hierarchy.
#[derive(Clone, Debug, PartialEq)]
pub struct Bone {
    pub name: String,
    /// Parent bone name; an unknown name makes this bone a root.
    pub parent: Option<String>,
    pub pivot: DVec3,
    /// Euler degrees about `pivot`.
    pub rotation: DVec3,
    pub mirror: bool,
    pub inflate: f64,
    pub cubes: Vec<Cube>,
    pub locators: Vec<Locator>,
}

/// Culling box declared by the model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisibleBounds {
    pub offset: DVec3,
    pub width: f64,
    pub height: f64,
}

impl Default for VisibleBounds {
    fn default() -> Self {
        Self {
            offset: DVec3::ZERO,
            width: 1.0,
            height: 1.0,
        }
    }
}

/// A fully normalized geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelDescriptor {
    pub identifier: String,
    pub format_version: FormatVersion,
    pub texture_width: u32,
    pub texture_height: u32,
    pub visible_bounds: VisibleBounds,
    /// Bones in declaration order.
    pub bones: Vec<Bone>,
}

impl ModelDescriptor {
    /// Check the invariants the geometry builder relies on.
    ///
    /// Rejects duplicate bone names, negative cube sizes and non-finite
    /// numbers. Runs before anything is built so a failure leaves nothing
    /// behind.
    pub fn validate(&self) -> ImportResult<()> {
        let mut names = HashSet::with_capacity(self.bones.len());

        for bone in &self.bones {
            if !names.insert(bone.name.as_str()) {
                return Err(ImportError::InvalidGeometry(format!(
                    "duplicate bone name '{}'",
                    bone.name
                )));
            }

            check_finite_vec(&bone.name, "pivot", bone.pivot)?;
            check_finite_vec(&bone.name, "rotation", bone.rotation)?;
            check_finite(&bone.name, "inflate", bone.inflate)?;

            for (i, cube) in bone.cubes.iter().enumerate() {
                let what = format!("{} cube {}", bone.name, i);

                check_finite_vec(&what, "origin", cube.origin)?;
                check_finite_vec(&what, "size", cube.size)?;
                check_finite_vec(&what, "pivot", cube.pivot)?;
                check_finite_vec(&what, "rotation", cube.rotation)?;
                check_finite(&what, "inflate", cube.inflate)?;

                if cube.size.min_element() < 0.0 {
                    return Err(ImportError::InvalidGeometry(format!(
                        "{} has negative size [{}, {}, {}]",
                        what, cube.size.x, cube.size.y, cube.size.z
                    )));
                }

                for (face, uv) in cube.uv.iter() {
                    if !uv.uv.is_finite() || !uv.uv_size.is_finite() {
                        return Err(ImportError::InvalidGeometry(format!(
                            "{} has a non-finite {} UV",
                            what,
                            face.key()
                        )));
                    }
                }
            }

            for locator in &bone.locators {
                check_finite_vec(&locator.name, "offset", locator.offset)?;
                check_finite_vec(&locator.name, "rotation", locator.rotation)?;
            }
        }

        Ok(())
    }

    /// Look up a bone by name.
    pub fn bone(&self, name: &str) -> Option<&Bone> {
        self.bones.iter().find(|bone| bone.name == name)
    }
}

fn check_finite(what: &str, field: &str, value: f64) -> ImportResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ImportError::InvalidGeometry(format!(
            "{} has a non-finite {}",
            what, field
        )))
    }
}

fn check_finite_vec(what: &str, field: &str, value: DVec3) -> ImportResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ImportError::InvalidGeometry(format!(
            "{} has a non-finite {}",
            what, field
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube(size: DVec3) -> Cube {
        Cube {
            origin: DVec3::ZERO,
            size,
            pivot: DVec3::ZERO,
            rotation: DVec3::ZERO,
            inflate: 0.0,
            mirror: false,
            uv: FaceUvMap::hidden(),
        }
    }

    fn bone(name: &str, cubes: Vec<Cube>) -> Bone {
        Bone {
            name: name.to_string(),
            parent: None,
            pivot: DVec3::ZERO,
            rotation: DVec3::ZERO,
            mirror: false,
            inflate: 0.0,
            cubes,
            locators: Vec::new(),
        }
    }

    fn descriptor(bones: Vec<Bone>) -> ModelDescriptor {
        ModelDescriptor {
            identifier: "geometry.test".to_string(),
            format_version: FormatVersion::V1_12,
            texture_width: 64,
            texture_height: 64,
            visible_bounds: VisibleBounds::default(),
            bones,
        }
    }

    #[test]
    fn test_face_uv_corners() {
        let uv = FaceUv::new(DVec2::new(4.0, 8.0), DVec2::new(2.0, 3.0));
        assert_eq!(
            uv.corners(),
            [
                DVec2::new(4.0, 11.0),
                DVec2::new(6.0, 11.0),
                DVec2::new(6.0, 8.0),
                DVec2::new(4.0, 8.0),
            ]
        );
    }

    #[test]
    fn test_hidden_sentinel() {
        assert!(FaceUv::HIDDEN.is_hidden());
        assert!(!FaceUv::new(DVec2::ZERO, DVec2::ONE).is_hidden());

        let map = FaceUvMap::hidden();
        assert_eq!(map.iter().count(), 6);
        assert!(map.iter().all(|(_, uv)| uv.is_hidden()));
    }

    #[test]
    fn test_validate_accepts_zero_size() {
        let model = descriptor(vec![bone("body", vec![cube(DVec3::new(0.0, 2.0, 2.0))])]);
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_negative_size() {
        let model = descriptor(vec![bone("body", vec![cube(DVec3::new(-1.0, 2.0, 2.0))])]);
        assert!(matches!(
            model.validate(),
            Err(ImportError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        let mut b = bone("body", Vec::new());
        b.pivot = DVec3::new(0.0, f64::NAN, 0.0);
        let model = descriptor(vec![b]);
        assert!(matches!(
            model.validate(),
            Err(ImportError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_validate_rejects_duplicate_bone() {
        let model = descriptor(vec![bone("head", Vec::new()), bone("head", Vec::new())]);
        let err = model.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate bone name 'head'"));
    }
}
