//! Imported object graph: a skeleton plus the meshes and locators bound
//! to its bones.

use std::collections::HashMap;

use bbm_math::{Aabb, DMat4, DMat4Ext, DVec3, Transform};

use crate::mesh::CubeMesh;

/// One bone of a [`Skeleton`].
///
/// Bones are head/tail segments. The length is cosmetic; `matrix` carries
/// the orientation and puts the head at its translation.
#[derive(Clone, Debug, PartialEq)]
pub struct SkeletonBone {
    pub name: String,

    /// Index of the parent bone in [`Skeleton::bones`]
    pub parent: Option<usize>,

    pub head: DVec3,
    pub tail: DVec3,

    /// World matrix of the bone, translation at `head`
    pub matrix: DMat4,
}

impl SkeletonBone {
    /// Frame that bone-parented objects are evaluated in: the bone matrix
    /// moved to the tail.
    pub fn tail_frame(&self) -> DMat4 {
        DMat4::from_translation(self.tail - self.head) * self.matrix
    }

    pub fn length(&self) -> f64 {
        (self.tail - self.head).length()
    }
}

/// A named bone hierarchy.
#[derive(Clone, Debug, Default)]
pub struct Skeleton {
    pub name: String,
    pub bones: Vec<SkeletonBone>,
    index: HashMap<String, usize>,
}

impl Skeleton {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a bone and return its index.
    pub fn add_bone(&mut self, bone: SkeletonBone) -> usize {
        let id = self.bones.len();
        self.index.insert(bone.name.clone(), id);
        self.bones.push(bone);
        id
    }

    pub fn bone(&self, id: usize) -> Option<&SkeletonBone> {
        self.bones.get(id)
    }

    pub fn bone_id(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn bone_by_name(&self, name: &str) -> Option<&SkeletonBone> {
        self.bone_id(name).and_then(|id| self.bone(id))
    }

    /// Indices of bones without a parent.
    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.bones
            .iter()
            .enumerate()
            .filter(|(_, bone)| bone.parent.is_none())
            .map(|(id, _)| id)
    }

    /// Indices of the direct children of a bone.
    pub fn children_of(&self, id: usize) -> impl Iterator<Item = usize> + '_ {
        self.bones
            .iter()
            .enumerate()
            .filter(move |(_, bone)| bone.parent == Some(id))
            .map(|(child, _)| child)
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }
}

/// How an object hangs off a bone.
///
/// `world = bone.tail_frame() * parent_inverse * basis`
#[derive(Clone, Debug, PartialEq)]
pub struct Attachment {
    pub bone: usize,
    pub parent_inverse: DMat4,
    pub basis: Transform,
}

impl Attachment {
    /// World matrix, or `None` if the bone is not in `skeleton`.
    pub fn world_matrix(&self, skeleton: &Skeleton) -> Option<DMat4> {
        let bone = skeleton.bone(self.bone)?;
        Some(bone.tail_frame() * self.parent_inverse * self.basis.to_matrix())
    }

    /// Change the basis so the world matrix becomes `world`.
    ///
    /// Returns false if the bone is not in `skeleton`.
    pub fn set_world_matrix(&mut self, skeleton: &Skeleton, world: DMat4) -> bool {
        let Some(bone) = skeleton.bone(self.bone) else {
            return false;
        };
        let frame = bone.tail_frame() * self.parent_inverse;
        self.basis = Transform::from_matrix(frame.inverse() * world);
        true
    }
}

/// A cube mesh bound to a bone.
#[derive(Clone, Debug)]
pub struct MeshObject {
    pub name: String,
    pub attachment: Attachment,
    pub mesh: CubeMesh,
}

/// An empty marker bound to a bone.
#[derive(Clone, Debug)]
pub struct LocatorObject {
    pub name: String,
    pub attachment: Attachment,
}

/// Everything produced by one import.
#[derive(Clone, Debug)]
pub struct SkeletonResult {
    pub skeleton: Skeleton,
    pub meshes: Vec<MeshObject>,
    pub locators: Vec<LocatorObject>,
}

impl SkeletonResult {
    pub fn mesh(&self, name: &str) -> Option<&MeshObject> {
        self.meshes.iter().find(|m| m.name == name)
    }

    pub fn locator(&self, name: &str) -> Option<&LocatorObject> {
        self.locators.iter().find(|l| l.name == name)
    }

    /// World matrix of a mesh or locator attachment.
    pub fn world_matrix(&self, attachment: &Attachment) -> Option<DMat4> {
        attachment.world_matrix(&self.skeleton)
    }

    /// World-space centre of a mesh's vertices.
    pub fn mesh_world_center(&self, mesh: &MeshObject) -> Option<DVec3> {
        self.world_matrix(&mesh.attachment)
            .map(|m| m.transform_point3(mesh.mesh.center()))
    }

    /// World-space position of a locator.
    pub fn locator_world_position(&self, locator: &LocatorObject) -> Option<DVec3> {
        self.world_matrix(&locator.attachment).map(|m| m.translation())
    }

    /// Bounds of every mesh vertex in world space.
    pub fn world_bounds(&self) -> Aabb {
        self.meshes
            .iter()
            .filter_map(|m| self.world_matrix(&m.attachment).map(|w| m.mesh.bounds(&w)))
            .fold(Aabb::empty(), |acc, b| Aabb::surrounding(&acc, &b))
    }
}
