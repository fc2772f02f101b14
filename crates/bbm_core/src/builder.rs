//! Geometry builder.
//!
//! Turns a [`ModelDescriptor`] into a [`SkeletonResult`] in two phases:
//!
//! 1. Every bone, cube and locator is laid out as a placeholder node.
//!    Nodes are parented with parent-inverse compensation and only then
//!    rotated, so each rotation swings its subtree about the node's pivot.
//!    World matrices are resolved top-down from the roots.
//! 2. Bone placeholders become skeleton bones carrying those world matrices.
//!    Meshes and locators are re-attached to their bones with their world
//!    pose preserved.
//!
//! All per-import state lives in one build context that is dropped when
//! [`build`] returns.

use std::collections::HashMap;

use log::{debug, info, trace, warn};

use bbm_math::{source_rotation, to_world_extent, to_world_point, DMat4, DMat4Ext, DVec3, UNITS_PER_METER};

use crate::coords::CoordinatesConverter;
use crate::error::{ImportError, ImportResult};
use crate::graph::{NodeId, PlaceholderGraph};
use crate::import::ImportOptions;
use crate::mesh::CubeMesh;
use crate::model::ModelDescriptor;
use crate::schema::GEOMETRY_PREFIX;
use crate::skeleton::{Attachment, LocatorObject, MeshObject, Skeleton, SkeletonBone, SkeletonResult};

/// Build the object graph for one geometry.
///
/// The descriptor is validated first; on any error nothing is returned.
pub fn build(descriptor: &ModelDescriptor, options: &ImportOptions) -> ImportResult<SkeletonResult> {
    descriptor.validate()?;

    if !options.bone_length.is_finite() {
        return Err(ImportError::InvalidGeometry(format!(
            "bone length {} is not finite",
            options.bone_length
        )));
    }

    let converter = CoordinatesConverter::new(descriptor.texture_width, descriptor.texture_height)?;

    debug!(
        "Building '{}' ({}): {} bones, texture {}x{}",
        descriptor.identifier,
        descriptor.format_version,
        descriptor.bones.len(),
        descriptor.texture_width,
        descriptor.texture_height
    );

    let mut context = BuildContext::new(descriptor);
    context.place_nodes(&converter);
    context.wire_links();
    context.apply_rotations();

    let result = context.emit(options.bone_length)?;

    info!(
        "Imported '{}': {} bones, {} meshes, {} locators",
        result.skeleton.name,
        result.skeleton.bone_count(),
        result.meshes.len(),
        result.locators.len()
    );

    Ok(result)
}

/// Skeleton name for a geometry identifier.
pub fn skeleton_name(identifier: &str) -> &str {
    identifier.strip_prefix(GEOMETRY_PREFIX).unwrap_or(identifier)
}

/// A cube placeholder and the mesh it carries.
struct CubeNode {
    bone: usize,
    node: NodeId,
    name: String,
    mesh: CubeMesh,
}

/// A locator placeholder.
struct LocatorNode {
    bone: usize,
    node: NodeId,
    name: String,
}

/// Working state for one import.
struct BuildContext<'a> {
    descriptor: &'a ModelDescriptor,
    graph: PlaceholderGraph,

    /// Placeholder per bone, indexed like `descriptor.bones`
    bone_nodes: Vec<NodeId>,

    bone_index: HashMap<&'a str, usize>,

    /// Accepted bone parent links
    bone_parents: Vec<Option<usize>>,

    cubes: Vec<CubeNode>,
    locators: Vec<LocatorNode>,
}

impl<'a> BuildContext<'a> {
    fn new(descriptor: &'a ModelDescriptor) -> Self {
        let bone_index = descriptor
            .bones
            .iter()
            .enumerate()
            .map(|(i, bone)| (bone.name.as_str(), i))
            .collect();

        Self {
            descriptor,
            graph: PlaceholderGraph::new(),
            bone_nodes: Vec::with_capacity(descriptor.bones.len()),
            bone_index,
            bone_parents: vec![None; descriptor.bones.len()],
            cubes: Vec::new(),
            locators: Vec::new(),
        }
    }

    /// Create every placeholder node and cube mesh, unparented.
    fn place_nodes(&mut self, converter: &CoordinatesConverter) {
        for (bone_id, bone) in self.descriptor.bones.iter().enumerate() {
            let bone_pivot = to_world_point(bone.pivot);
            let node = self.graph.add_node(bone.name.as_str(), bone_pivot);
            self.bone_nodes.push(node);

            for (i, cube) in bone.cubes.iter().enumerate() {
                let size = to_world_extent(cube.size);
                let pivot = to_world_point(cube.pivot);
                let half_extents = size / 2.0 + DVec3::splat(cube.inflate / UNITS_PER_METER);

                let mut mesh = CubeMesh::new(half_extents);
                mesh.set_uvs(&cube.uv, converter);
                mesh.translate(to_world_point(cube.origin) + size / 2.0 - pivot);

                let name = format!("{}.cube{}", bone.name, i);
                let node = self.graph.add_node(name.as_str(), pivot);
                self.cubes.push(CubeNode {
                    bone: bone_id,
                    node,
                    name,
                    mesh,
                });
            }

            for locator in &bone.locators {
                let node = self
                    .graph
                    .add_node(locator.name.as_str(), to_world_point(locator.offset));
                self.graph.rotate(node, source_rotation(locator.rotation));
                self.locators.push(LocatorNode {
                    bone: bone_id,
                    node,
                    name: locator.name.clone(),
                });
            }

            debug!(
                "Placed bone '{}' with {} cubes, {} locators",
                bone.name,
                bone.cubes.len(),
                bone.locators.len()
            );
        }
    }

    /// Parent bones to bones, and cubes and locators to their bone.
    fn wire_links(&mut self) {
        for (bone_id, bone) in self.descriptor.bones.iter().enumerate() {
            let Some(parent_name) = bone.parent.as_deref() else {
                continue;
            };

            let parent_id = match self.bone_index.get(parent_name) {
                Some(&id) if id != bone_id => id,
                Some(_) => {
                    warn!("Bone '{}' lists itself as parent, keeping it a root", bone.name);
                    continue;
                }
                None => {
                    warn!(
                        "Bone '{}' has unknown parent '{}', keeping it a root",
                        bone.name, parent_name
                    );
                    continue;
                }
            };

            let child = self.bone_nodes[bone_id];
            let parent = self.bone_nodes[parent_id];
            if self.graph.set_parent_keep_world(child, parent) {
                self.bone_parents[bone_id] = Some(parent_id);
            } else {
                warn!(
                    "Parenting bone '{}' to '{}' would form a cycle, keeping it a root",
                    bone.name, parent_name
                );
            }
        }

        for cube in &self.cubes {
            self.graph
                .set_parent_keep_world(cube.node, self.bone_nodes[cube.bone]);
        }
        for locator in &self.locators {
            self.graph
                .set_parent_keep_world(locator.node, self.bone_nodes[locator.bone]);
        }
    }

    /// Rotate bones and cubes about their pivots.
    fn apply_rotations(&mut self) {
        for (bone, &node) in self.descriptor.bones.iter().zip(&self.bone_nodes) {
            self.graph.rotate(node, source_rotation(bone.rotation));
        }

        let cube_rotations = self
            .descriptor
            .bones
            .iter()
            .flat_map(|bone| bone.cubes.iter().map(|cube| cube.rotation));
        for (cube, rotation) in self.cubes.iter().zip(cube_rotations) {
            self.graph.rotate(cube.node, source_rotation(rotation));
        }
    }

    /// Emit the skeleton and re-attach meshes and locators to bones.
    fn emit(self, bone_length: f64) -> ImportResult<SkeletonResult> {
        let world = self.graph.resolve_world_matrices();
        debug!("Resolved {} placeholder nodes", world.len());
        for (id, matrix) in world.iter().enumerate() {
            if let Some(node) = self.graph.node(id) {
                trace!("  '{}' at {:?}", node.name, matrix.translation());
            }
        }

        let tip = DVec3::new(0.0, bone_length, 0.0);

        let mut skeleton = Skeleton::new(skeleton_name(&self.descriptor.identifier));
        for ((bone, &node), &parent) in self
            .descriptor
            .bones
            .iter()
            .zip(&self.bone_nodes)
            .zip(&self.bone_parents)
        {
            let matrix = world[node];
            skeleton.add_bone(SkeletonBone {
                name: bone.name.clone(),
                parent,
                head: matrix.translation(),
                tail: matrix.transform_point3(tip),
                matrix,
            });
        }

        let mut meshes = Vec::with_capacity(self.cubes.len());
        for cube in self.cubes {
            let attachment = attach(&self.graph, &skeleton, cube.node, cube.bone, &cube.name)?;
            meshes.push(MeshObject {
                name: cube.name,
                attachment,
                mesh: cube.mesh,
            });
        }

        let mut locators = Vec::with_capacity(self.locators.len());
        for locator in self.locators {
            let attachment = attach(&self.graph, &skeleton, locator.node, locator.bone, &locator.name)?;
            locators.push(LocatorObject {
                name: locator.name,
                attachment,
            });
        }

        Ok(SkeletonResult {
            skeleton,
            meshes,
            locators,
        })
    }
}

/// Move a placeholder's transform onto a bone.
///
/// The object keeps its parent-inverse; evaluated against the bone's tail
/// frame it lands `tail - head` away from its placeholder pose, so the
/// world matrix is shifted back by `head - tail`.
fn attach(
    graph: &PlaceholderGraph,
    skeleton: &Skeleton,
    node: NodeId,
    bone: usize,
    name: &str,
) -> ImportResult<Attachment> {
    let placeholder = graph
        .node(node)
        .ok_or_else(|| ImportError::DanglingReference(format!("'{}' has no placeholder node", name)))?;
    let target = skeleton.bone(bone).ok_or_else(|| {
        ImportError::DanglingReference(format!("'{}' refers to missing bone slot {}", name, bone))
    })?;

    let mut attachment = Attachment {
        bone,
        parent_inverse: placeholder.parent_inverse,
        basis: placeholder.transform,
    };

    let shift = DMat4::from_translation(target.head - target.tail);
    let world = shift * target.tail_frame() * attachment.parent_inverse * attachment.basis.to_matrix();
    attachment.set_world_matrix(skeleton, world);

    Ok(attachment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Bone, Cube, FaceUvMap, FormatVersion, Locator, VisibleBounds};
    use crate::uv::box_uv;
    use bbm_math::{DQuat, DVec2};

    fn cube(origin: [f64; 3], size: [f64; 3], pivot: [f64; 3], rotation: [f64; 3]) -> Cube {
        Cube {
            origin: DVec3::from(origin),
            size: DVec3::from(size),
            pivot: DVec3::from(pivot),
            rotation: DVec3::from(rotation),
            inflate: 0.0,
            mirror: false,
            uv: box_uv(DVec3::from(size), DVec2::ZERO, false),
        }
    }

    fn bone(name: &str, parent: Option<&str>, pivot: [f64; 3], rotation: [f64; 3]) -> Bone {
        Bone {
            name: name.to_string(),
            parent: parent.map(str::to_string),
            pivot: DVec3::from(pivot),
            rotation: DVec3::from(rotation),
            mirror: false,
            inflate: 0.0,
            cubes: Vec::new(),
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

    fn approx(a: DVec3, b: DVec3) -> bool {
        (a - b).length() < 1e-9
    }

    #[test]
    fn test_translation_chain_sums_offsets() {
        let mut leaf = bone("leaf", Some("mid"), [2.0, 8.0, 0.0], [0.0; 3]);
        leaf.cubes.push(cube([1.0, 8.0, -1.0], [2.0, 2.0, 2.0], [0.0; 3], [0.0; 3]));

        let model = descriptor(vec![
            bone("root", None, [0.0; 3], [0.0; 3]),
            bone("mid", Some("root"), [0.0, 4.0, 0.0], [0.0; 3]),
            leaf,
        ]);

        let result = build(&model, &ImportOptions::default()).unwrap();

        // Per-level pivot offsets plus the cube's own centre offset.
        let offsets = [[0.0, 0.0, 0.0], [0.0, 4.0, 0.0], [2.0, 4.0, 0.0], [0.0, 1.0, 0.0]];
        let sum = offsets.iter().map(|o| DVec3::from(*o)).sum::<DVec3>();
        let expected = to_world_point(sum);

        let mesh = result.mesh("leaf.cube0").unwrap();
        let center = result.mesh_world_center(mesh).unwrap();
        assert!(approx(center, expected), "{:?} != {:?}", center, expected);
    }

    #[test]
    fn test_skeleton_bones() {
        let model = descriptor(vec![
            bone("body", None, [0.0, 16.0, 0.0], [0.0; 3]),
            bone("head", Some("body"), [0.0, 24.0, -4.0], [0.0; 3]),
        ]);

        let result = build(&model, &ImportOptions::default()).unwrap();
        let skeleton = &result.skeleton;

        assert_eq!(skeleton.name, "test");
        let head = skeleton.bone_by_name("head").unwrap();
        assert_eq!(head.parent, skeleton.bone_id("body"));
        assert!(approx(head.head, DVec3::new(0.0, -0.25, 1.5)));
        assert!(approx(head.tail, DVec3::new(0.0, 0.05, 1.5)));
    }

    #[test]
    fn test_bone_rotation_swings_children_about_pivot() {
        let mut arm = bone("arm", None, [0.0; 3], [0.0, 0.0, 90.0]);
        arm.locators.push(Locator {
            name: "hand".to_string(),
            offset: DVec3::new(16.0, 0.0, 0.0),
            rotation: DVec3::ZERO,
        });
        let model = descriptor(vec![arm]);

        let result = build(&model, &ImportOptions::default()).unwrap();
        let hand = result.locator("hand").unwrap();
        let position = result.locator_world_position(hand).unwrap();

        // +90 about model z is +90 about world y: world +X swings to -Z.
        assert!(approx(position, DVec3::new(0.0, 0.0, -1.0)), "{:?}", position);
    }

    #[test]
    fn test_cube_rotation_about_own_pivot() {
        let mut b = bone("b", None, [0.0; 3], [0.0; 3]);
        b.cubes.push(cube([0.0; 3], [16.0, 16.0, 16.0], [0.0; 3], [90.0, 0.0, 0.0]));
        let model = descriptor(vec![b]);

        let result = build(&model, &ImportOptions::default()).unwrap();
        let mesh = result.mesh("b.cube0").unwrap();
        let center = result.mesh_world_center(mesh).unwrap();

        // Unrotated centre (0.5, 0.5, 0.5); +90 about X sends (y, z) to (-z, y).
        assert!(approx(center, DVec3::new(0.5, -0.5, 0.5)), "{:?}", center);
    }

    #[test]
    fn test_reattach_preserves_pose() {
        let mut body = bone("body", None, [0.0, 12.0, 0.0], [10.0, -20.0, 30.0]);
        body.cubes.push(cube([-4.0, 8.0, -6.0], [8.0, 8.0, 12.0], [0.0, 12.0, 0.0], [0.0, 45.0, 0.0]));
        let mut head = bone("head", Some("body"), [0.0, 16.0, -6.0], [-15.0, 5.0, 0.0]);
        head.cubes.push(cube([-3.0, 14.0, -10.0], [6.0, 6.0, 4.0], [1.0, 17.0, -8.0], [0.0, 0.0, 22.5]));
        head.locators.push(Locator {
            name: "lead".to_string(),
            offset: DVec3::new(0.0, 18.0, -10.0),
            rotation: DVec3::new(0.0, 90.0, 0.0),
        });
        let model = descriptor(vec![body, head]);

        let options = ImportOptions::default();
        let result = build(&model, &options).unwrap();

        // Rebuild phase one to get the placeholder poses.
        let converter = CoordinatesConverter::new(64, 64).unwrap();
        let mut context = BuildContext::new(&model);
        context.place_nodes(&converter);
        context.wire_links();
        context.apply_rotations();
        let world = context.graph.resolve_world_matrices();

        for cube in &context.cubes {
            let mesh = result.mesh(&cube.name).unwrap();
            let after = result.world_matrix(&mesh.attachment).unwrap();
            assert!(after.approx_eq(&world[cube.node], 1e-9), "{} moved", cube.name);
        }
        for locator in &context.locators {
            let object = result.locator(&locator.name).unwrap();
            let after = result.world_matrix(&object.attachment).unwrap();
            assert!(after.approx_eq(&world[locator.node], 1e-9), "{} moved", locator.name);
        }
    }

    #[test]
    fn test_locator_placement_and_rotation() {
        let mut b = bone("b", None, [0.0, 8.0, 0.0], [0.0; 3]);
        b.locators.push(Locator {
            name: "tip".to_string(),
            offset: DVec3::new(2.0, 4.0, 6.0),
            rotation: DVec3::new(0.0, 0.0, 90.0),
        });
        let model = descriptor(vec![b]);

        let result = build(&model, &ImportOptions::default()).unwrap();
        let tip = result.locator("tip").unwrap();
        let matrix = result.world_matrix(&tip.attachment).unwrap();

        assert!(approx(matrix.translation(), DVec3::new(0.125, 0.375, 0.25)));
        let (_, rotation, _) = matrix.to_scale_rotation_translation();
        assert!(rotation.angle_between(DQuat::from_rotation_y(std::f64::consts::FRAC_PI_2)) < 1e-9);
    }

    #[test]
    fn test_negative_size_is_rejected() {
        let mut b = bone("b", None, [0.0; 3], [0.0; 3]);
        b.cubes.push(cube([0.0; 3], [-1.0, 2.0, 2.0], [0.0; 3], [0.0; 3]));

        let err = build(&descriptor(vec![b]), &ImportOptions::default()).unwrap_err();
        assert!(matches!(err, ImportError::InvalidGeometry(_)));
    }

    #[test]
    fn test_zero_texture_size_is_rejected() {
        let mut model = descriptor(vec![bone("b", None, [0.0; 3], [0.0; 3])]);
        model.texture_height = 0;

        let err = build(&model, &ImportOptions::default()).unwrap_err();
        assert!(matches!(err, ImportError::InvalidGeometry(_)));
    }

    #[test]
    fn test_dangling_and_self_parents_become_roots() {
        let model = descriptor(vec![
            bone("a", Some("missing"), [0.0; 3], [0.0; 3]),
            bone("b", Some("b"), [0.0; 3], [0.0; 3]),
        ]);

        let result = build(&model, &ImportOptions::default()).unwrap();
        assert_eq!(result.skeleton.roots().count(), 2);
    }

    #[test]
    fn test_parent_cycle_is_broken() {
        let model = descriptor(vec![
            bone("a", Some("b"), [0.0; 3], [0.0; 3]),
            bone("b", Some("a"), [0.0, 4.0, 0.0], [0.0; 3]),
        ]);

        let result = build(&model, &ImportOptions::default()).unwrap();
        let skeleton = &result.skeleton;

        assert_eq!(skeleton.bone_by_name("a").unwrap().parent, skeleton.bone_id("b"));
        assert_eq!(skeleton.bone_by_name("b").unwrap().parent, None);
    }

    #[test]
    fn test_inflate_and_mesh_layout() {
        let mut b = bone("b", None, [0.0; 3], [0.0; 3]);
        let mut c = cube([0.0; 3], [16.0, 32.0, 8.0], [0.0; 3], [0.0; 3]);
        c.inflate = 1.0;
        c.uv = FaceUvMap::hidden();
        b.cubes.push(c);

        let result = build(&descriptor(vec![b]), &ImportOptions::default()).unwrap();
        let mesh = &result.mesh("b.cube0").unwrap().mesh;

        // Half extents are swapped to world axes and grown by the inflate.
        let extent = mesh.positions[7] - mesh.positions[0];
        assert!(approx(extent, DVec3::new(1.125, 0.625, 2.125)));
        assert!(mesh.visible.iter().all(|v| !v));
    }

    #[test]
    fn test_bone_length_option() {
        let model = descriptor(vec![bone("b", None, [0.0; 3], [0.0; 3])]);
        let options = ImportOptions::default().with_bone_length(1.0);

        let result = build(&model, &options).unwrap();
        let b = result.skeleton.bone_by_name("b").unwrap();
        assert!(approx(b.tail, DVec3::Y));
    }

    #[test]
    fn test_skeleton_name() {
        assert_eq!(skeleton_name("geometry.pig"), "pig");
        assert_eq!(skeleton_name("pig"), "pig");
        assert_eq!(skeleton_name("geometry.geometry.x"), "geometry.x");
    }
}
