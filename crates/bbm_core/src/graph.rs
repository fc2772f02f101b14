//! Transient placeholder scene graph.
//!
//! Bones, cubes and locators are first laid out as plain transform nodes so
//! that pivot and rotation chains can be composed with ordinary parenting.
//! The resolved world matrices then seed the permanent skeleton. A graph
//! lives for one import only.

use bbm_math::{DMat4, DQuat, DVec3, Transform};

/// Index of a node in its [`PlaceholderGraph`].
pub type NodeId = usize;

/// One transform node.
#[derive(Clone, Debug)]
pub struct PlaceholderNode {
    pub name: String,

    /// Local basis (location and rotation)
    pub transform: Transform,

    pub parent: Option<NodeId>,

    /// Inverse of the parent's world matrix at attach time
    pub parent_inverse: DMat4,

    pub children: Vec<NodeId>,
}

/// Arena of placeholder nodes.
#[derive(Debug, Default)]
pub struct PlaceholderGraph {
    nodes: Vec<PlaceholderNode>,
}

impl PlaceholderGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root node at `location` with no rotation.
    pub fn add_node(&mut self, name: impl Into<String>, location: DVec3) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(PlaceholderNode {
            name: name.into(),
            transform: Transform::from_translation(location),
            parent: None,
            parent_inverse: DMat4::IDENTITY,
            children: Vec::new(),
        });
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&PlaceholderNode> {
        self.nodes.get(id)
    }

    /// Local matrix including the parent-inverse compensation.
    fn local_matrix(&self, id: NodeId) -> DMat4 {
        let node = &self.nodes[id];
        node.parent_inverse * node.transform.to_matrix()
    }

    /// World matrix of one node, composed up its parent chain.
    pub fn world_matrix(&self, id: NodeId) -> DMat4 {
        let mut matrix = self.local_matrix(id);
        let mut current = self.nodes[id].parent;
        while let Some(parent) = current {
            matrix = self.local_matrix(parent) * matrix;
            current = self.nodes[parent].parent;
        }
        matrix
    }

    /// True if `ancestor` is `id` or one of its ancestors.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.nodes[node].parent;
        }
        false
    }

    /// Attach `child` to `parent` without moving it in world space.
    ///
    /// The child's parent-inverse becomes the inverse of the parent's
    /// current world matrix. Returns false, leaving the graph untouched, if
    /// the link would create a cycle.
    pub fn set_parent_keep_world(&mut self, child: NodeId, parent: NodeId) -> bool {
        if self.is_ancestor(child, parent) {
            return false;
        }

        if self.nodes[child].parent.is_some() {
            // Bake the old chain into the basis before dropping it.
            let world = self.world_matrix(child);
            self.detach(child);
            self.nodes[child].transform = Transform::from_matrix(world);
        }

        let parent_inverse = self.world_matrix(parent).inverse();
        let node = &mut self.nodes[child];
        node.parent = Some(parent);
        node.parent_inverse = parent_inverse;
        self.nodes[parent].children.push(child);
        true
    }

    fn detach(&mut self, child: NodeId) {
        if let Some(old_parent) = self.nodes[child].parent.take() {
            self.nodes[old_parent].children.retain(|&id| id != child);
        }
        self.nodes[child].parent_inverse = DMat4::IDENTITY;
    }

    /// Rotate a node about its own location; descendants follow.
    pub fn rotate(&mut self, id: NodeId, rotation: DQuat) {
        self.nodes[id].transform.rotate(rotation);
    }

    /// Resolve every world matrix top-down from the roots.
    ///
    /// The result is indexed by [`NodeId`].
    pub fn resolve_world_matrices(&self) -> Vec<DMat4> {
        let mut world = vec![DMat4::IDENTITY; self.nodes.len()];
        let mut stack: Vec<(NodeId, DMat4)> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(id, _)| (id, DMat4::IDENTITY))
            .collect();

        while let Some((id, parent_world)) = stack.pop() {
            let matrix = parent_world * self.local_matrix(id);
            world[id] = matrix;
            for &child in &self.nodes[id].children {
                stack.push((child, matrix));
            }
        }

        world
    }
}
