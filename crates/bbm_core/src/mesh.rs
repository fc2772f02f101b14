//! Cube mesh geometry.
//!
//! Every cube in a model becomes one 8-vertex, 6-quad mesh. Vertices are
//! indexed by axis signs and faces come in a fixed order, so UVs can be
//! assigned per face without looking at geometry.

use bbm_math::{Aabb, DMat4, DVec2, DVec3};

use crate::coords::CoordinatesConverter;
use crate::model::{Face, FaceUvMap};

/// Model face shown on each mesh face, by mesh face index.
///
/// Mesh faces are ordered +Y, -Y, +X, -X, +Z, -Z in world space, which are
/// south, north, east, west, up and down in model space.
pub const MESH_FACE_ORDER: [Face; 6] = [
    Face::South,
    Face::North,
    Face::East,
    Face::West,
    Face::Up,
    Face::Down,
];

/// Vertex sign pattern: 0 `---`, 1 `--+`, 2 `-+-`, 3 `-++`, 4 `+--`,
/// 5 `+-+`, 6 `++-`, 7 `+++` (x, y, z).
const CORNER_SIGNS: [[f64; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, 1.0, 1.0],
    [1.0, -1.0, -1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, -1.0],
    [1.0, 1.0, 1.0],
];

/// Vertex loops per face, counter-clockwise seen from outside, starting at
/// the corner that takes the texture's bottom-left.
const FACE_LOOPS: [[u32; 4]; 6] = [
    [6, 2, 3, 7], // +Y
    [0, 4, 5, 1], // -Y
    [4, 6, 7, 5], // +X
    [2, 0, 1, 3], // -X
    [1, 5, 7, 3], // +Z
    [2, 6, 4, 0], // -Z
];

/// A box mesh with per-loop UVs.
#[derive(Clone, Debug, PartialEq)]
pub struct CubeMesh {
    /// Vertex positions in the owning object's local space
    pub positions: [DVec3; 8],

    /// Quad faces as vertex loops, in [`MESH_FACE_ORDER`]
    pub faces: [[u32; 4]; 6],

    /// Normalized UV per face loop corner
    pub uvs: [[DVec2; 4]; 6],

    /// False for faces whose UV is the hidden sentinel
    pub visible: [bool; 6],
}

impl CubeMesh {
    /// A box centred on the origin with the given half extents.
    pub fn new(half_extents: DVec3) -> Self {
        let positions = CORNER_SIGNS.map(|s| DVec3::from(s) * half_extents);

        Self {
            positions,
            faces: FACE_LOOPS,
            uvs: [[DVec2::ZERO; 4]; 6],
            visible: [true; 6],
        }
    }

    /// Assign UVs face by face from texture-pixel rectangles.
    pub fn set_uvs(&mut self, uv: &FaceUvMap, converter: &CoordinatesConverter) {
        for (index, face) in MESH_FACE_ORDER.iter().enumerate() {
            let rect = uv.get(*face);
            self.uvs[index] = rect.corners().map(|corner| converter.convert(corner));
            self.visible[index] = !rect.is_hidden();
        }
    }

    /// Move every vertex by `offset`.
    pub fn translate(&mut self, offset: DVec3) {
        for position in &mut self.positions {
            *position += offset;
        }
    }

    /// Model face shown by mesh face `index`.
    pub fn face_kind(index: usize) -> Option<Face> {
        MESH_FACE_ORDER.get(index).copied()
    }

    /// Centre of the vertex positions.
    pub fn center(&self) -> DVec3 {
        self.positions.iter().copied().sum::<DVec3>() / 8.0
    }

    /// Outward normal of mesh face `index` in local space.
    pub fn face_normal(&self, index: usize) -> Option<DVec3> {
        let [a, b, c, _] = self.faces.get(index)?.map(|i| self.positions[i as usize]);
        Some((b - a).cross(c - a).normalize_or_zero())
    }

    /// Fan-triangulate the quads (two triangles per face).
    pub fn triangulate(&self) -> Vec<u32> {
        let mut indices = Vec::with_capacity(36);
        for [a, b, c, d] in self.faces {
            indices.extend_from_slice(&[a, b, c, a, c, d]);
        }
        indices
    }

    /// Vertex positions transformed by `matrix`.
    pub fn world_positions(&self, matrix: &DMat4) -> [DVec3; 8] {
        self.positions.map(|p| matrix.transform_point3(p))
    }

    /// Bounding box of the mesh under `matrix`.
    pub fn bounds(&self, matrix: &DMat4) -> Aabb {
        let mut aabb = Aabb::empty();
        for p in self.world_positions(matrix) {
            aabb.grow(p);
        }
        aabb
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.faces.len() * 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FaceUv;
    use crate::uv::box_uv;

    #[test]
    fn test_cube_mesh_creation() {
        let mesh = CubeMesh::new(DVec3::new(1.0, 2.0, 3.0));

        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 12);
        assert_eq!(mesh.positions[0], DVec3::new(-1.0, -2.0, -3.0));
        assert_eq!(mesh.positions[7], DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(mesh.center(), DVec3::ZERO);
    }

    #[test]
    fn test_face_normals_point_outwards() {
        let mesh = CubeMesh::new(DVec3::ONE);
        let expected = [
            DVec3::Y,
            DVec3::NEG_Y,
            DVec3::X,
            DVec3::NEG_X,
            DVec3::Z,
            DVec3::NEG_Z,
        ];

        for (index, normal) in expected.iter().enumerate() {
            let actual = mesh.face_normal(index).unwrap();
            assert!(
                (actual - *normal).length() < 1e-12,
                "face {} normal {:?}",
                index,
                actual
            );
        }
        assert_eq!(mesh.face_normal(6), None);
    }

    #[test]
    fn test_face_mapping_table() {
        assert_eq!(CubeMesh::face_kind(0), Some(Face::South));
        assert_eq!(CubeMesh::face_kind(1), Some(Face::North));
        assert_eq!(CubeMesh::face_kind(2), Some(Face::East));
        assert_eq!(CubeMesh::face_kind(3), Some(Face::West));
        assert_eq!(CubeMesh::face_kind(4), Some(Face::Up));
        assert_eq!(CubeMesh::face_kind(5), Some(Face::Down));
        assert_eq!(CubeMesh::face_kind(6), None);
    }

    #[test]
    fn test_set_uvs() {
        let converter = CoordinatesConverter::new(16, 16).unwrap();
        let mut map = box_uv(DVec3::splat(4.0), DVec2::ZERO, false);
        map.set(Face::Down, FaceUv::HIDDEN);

        let mut mesh = CubeMesh::new(DVec3::splat(0.125));
        mesh.set_uvs(&map, &converter);

        // North rectangle (4, 4)-(8, 8) lands on mesh face 1.
        assert_eq!(
            mesh.uvs[1],
            [
                DVec2::new(0.25, 0.5),
                DVec2::new(0.5, 0.5),
                DVec2::new(0.5, 0.75),
                DVec2::new(0.25, 0.75),
            ]
        );
        assert!(mesh.visible[1]);
        assert!(!mesh.visible[5]);
    }

    #[test]
    fn test_triangulate() {
        let mesh = CubeMesh::new(DVec3::ONE);
        let indices = mesh.triangulate();

        assert_eq!(indices.len(), 36);
        assert_eq!(&indices[..6], &[6, 2, 3, 6, 3, 7]);
        assert!(indices.iter().all(|&i| i < 8));
    }

    #[test]
    fn test_translate_and_bounds() {
        let mut mesh = CubeMesh::new(DVec3::splat(0.5));
        mesh.translate(DVec3::new(1.0, 0.0, 0.0));

        let bounds = mesh.bounds(&DMat4::from_translation(DVec3::new(0.0, 2.0, 0.0)));
        assert_eq!(bounds.min, DVec3::new(0.5, 1.5, -0.5));
        assert_eq!(bounds.max, DVec3::new(1.5, 2.5, 0.5));
    }
}
