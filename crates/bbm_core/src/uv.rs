//! Cube UV resolution.
//!
//! Every cube ends up with six face rectangles in texture pixels, either
//! synthesized from a single box-UV anchor or taken from a per-face map.
//!
//! Box UV layout for a cube of `(w, h, d)` anchored at `(u, v)`:
//!
//! ```text
//!           u      u+d     u+d+w   u+2d+w  u+2d+2w
//! v                | UP    | DOWN  |
//! v+d       | R1   | NORTH | R3    | SOUTH |
//! v+d+h
//! ```
//!
//! `R1` is east and `R3` is west, swapped when the cube is mirrored. The
//! down face is stored with a negative height so it reads bottom-up.

use bbm_math::{DVec2, DVec3};

use crate::model::{Face, FaceUv, FaceUvMap};

/// UV declaration of one cube as written in the file.
#[derive(Clone, Debug, PartialEq)]
pub enum UvSpec {
    /// Box UV anchored at a texture pixel.
    Box(DVec2),

    /// Explicit rectangles for the listed faces.
    PerFace(Vec<(Face, FaceEntry)>),
}

/// One explicit face; missing fields take defaults.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FaceEntry {
    pub uv: Option<DVec2>,
    pub uv_size: Option<DVec2>,
}

/// Resolve the six face rectangles of a cube.
///
/// `spec = None` is box UV at the texture origin. `mirror` is the cube's
/// effective mirror flag and only affects box UV.
pub fn resolve(spec: Option<&UvSpec>, size: DVec3, mirror: bool) -> FaceUvMap {
    match spec {
        None => box_uv(size, DVec2::ZERO, mirror),
        Some(UvSpec::Box(anchor)) => box_uv(size, *anchor, mirror),
        Some(UvSpec::PerFace(faces)) => per_face_uv(size, faces),
    }
}

/// Synthesize the standard cross unwrap.
///
/// Sizes are truncated to whole pixels before laying out rectangles.
pub fn box_uv(size: DVec3, anchor: DVec2, mirror: bool) -> FaceUvMap {
    let w = size.x.trunc();
    let h = size.y.trunc();
    let d = size.z.trunc();
    let DVec2 { x: u, y: v } = anchor;

    let r1 = FaceUv::new(DVec2::new(u, v + d), DVec2::new(d, h));
    let north = FaceUv::new(DVec2::new(u + d, v + d), DVec2::new(w, h));
    let r3 = FaceUv::new(DVec2::new(u + d + w, v + d), DVec2::new(d, h));
    let south = FaceUv::new(DVec2::new(u + 2.0 * d + w, v + d), DVec2::new(w, h));
    let up = FaceUv::new(DVec2::new(u + d, v), DVec2::new(w, d));
    let down = FaceUv::new(DVec2::new(u + d + w, v + d), DVec2::new(w, -d));

    let (east, west) = if mirror { (r3, r1) } else { (r1, r3) };

    let mut map = FaceUvMap::hidden();
    map.set(Face::North, north);
    map.set(Face::South, south);
    map.set(Face::East, east);
    map.set(Face::West, west);
    map.set(Face::Up, up);
    map.set(Face::Down, down);
    map
}

/// Build a map from explicit faces; faces not listed are hidden.
pub fn per_face_uv(size: DVec3, faces: &[(Face, FaceEntry)]) -> FaceUvMap {
    let mut map = FaceUvMap::hidden();

    for &(face, entry) in faces {
        let uv = entry.uv.unwrap_or(DVec2::ZERO);
        let uv_size = entry.uv_size.unwrap_or_else(|| natural_size(face, size));
        map.set(face, FaceUv::new(uv, uv_size));
    }

    map
}

/// Pixel size of a face when the file does not give one.
fn natural_size(face: Face, size: DVec3) -> DVec2 {
    match face {
        Face::North | Face::South => DVec2::new(size.x, size.y),
        Face::East | Face::West => DVec2::new(size.z, size.y),
        Face::Up | Face::Down => DVec2::new(size.x, size.z),
    }
}
