//! Forward kinematics over an index-ordered hierarchy of rigid transforms.
//!
//! Nodes are stored in a flat `Vec` and refer to their parent by index.
//! Every parent is stored before its children, so a single pass in storage
//! order resolves all global transforms: by the time node `i` is visited its
//! parent's global transform is already final for this solve.
//!
//! The ordering is checked when nodes enter the hierarchy, which also rules
//! out cycles. Animation code mutates node fields between solves; the solver
//! only ever writes the cached globals.

use glam::{Mat4, Quat, Vec3};

use crate::error::HierarchyError;

/// A rigid transform with an optional parent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformNode {
    pub position: Vec3,
    /// Unit quaternion.
    pub rotation: Quat,
    pub scale: Vec3,
    /// Index of the parent node, `None` for roots.
    pub parent: Option<usize>,
}

impl Default for TransformNode {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            parent: None,
        }
    }
}

impl TransformNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(mut self, x: f32, y: f32, z: f32) -> Self {
        self.position = Vec3::new(x, y, z);
        self
    }

    pub fn rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn uniform_scale(mut self, s: f32) -> Self {
        self.scale = Vec3::splat(s);
        self
    }

    pub fn scale(mut self, x: f32, y: f32, z: f32) -> Self {
        self.scale = Vec3::new(x, y, z);
        self
    }

    pub fn parent(mut self, parent: usize) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// `translate(position) * rotate(rotation) * scale(scale)`, recomputed on
    /// every call.
    pub fn local_transform(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// Parent-before-child ordered nodes with their solved global transforms.
#[derive(Clone, Debug, Default)]
pub struct Hierarchy {
    nodes: Vec<TransformNode>,
    globals: Vec<Mat4>,
}

impl Hierarchy {
    /// Builds a hierarchy, rejecting any node whose parent is not stored
    /// strictly before it. Global transforms start as identity until the
    /// first [`solve`](Self::solve).
    pub fn new(nodes: Vec<TransformNode>) -> Result<Self, HierarchyError> {
        for (index, node) in nodes.iter().enumerate() {
            check_parent(index, node)?;
        }
        let globals = vec![Mat4::IDENTITY; nodes.len()];
        Ok(Self { nodes, globals })
    }

    /// Appends a node and returns its index.
    pub fn push(&mut self, node: TransformNode) -> Result<usize, HierarchyError> {
        let index = self.nodes.len();
        check_parent(index, &node)?;
        self.nodes.push(node);
        self.globals.push(Mat4::IDENTITY);
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[TransformNode] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&TransformNode> {
        self.nodes.get(index)
    }

    /// Mutable access for animation. The parent link is not exposed so the
    /// storage order stays valid.
    pub fn node_mut(&mut self, index: usize) -> Result<NodeMut<'_>, HierarchyError> {
        let len = self.nodes.len();
        self.nodes
            .get_mut(index)
            .map(|node| NodeMut { node })
            .ok_or(HierarchyError::OutOfRange { index, len })
    }

    /// Resolves every global transform in one pass over storage order.
    pub fn solve(&mut self) {
        for index in 0..self.nodes.len() {
            let node = &self.nodes[index];
            let local = node.local_transform();
            self.globals[index] = match node.parent {
                None => local,
                // parent < index, already resolved this pass
                Some(parent) => self.globals[parent] * local,
            };
        }
    }

    /// Global transform from the last solve.
    pub fn global_transform(&self, index: usize) -> Option<Mat4> {
        self.globals.get(index).copied()
    }

    pub fn global_transforms(&self) -> impl ExactSizeIterator<Item = &Mat4> + '_ {
        self.globals.iter()
    }

    /// World-space position of a node after the last solve.
    pub fn world_position(&self, index: usize) -> Option<Vec3> {
        self.global_transform(index).map(|m| m.w_axis.truncate())
    }
}

/// Handle for mutating a node's transform without touching its parent link.
pub struct NodeMut<'a> {
    node: &'a mut TransformNode,
}

impl NodeMut<'_> {
    pub fn position(&mut self) -> &mut Vec3 {
        &mut self.node.position
    }

    pub fn rotation(&mut self) -> &mut Quat {
        &mut self.node.rotation
    }

    pub fn scale(&mut self) -> &mut Vec3 {
        &mut self.node.scale
    }
}

fn check_parent(index: usize, node: &TransformNode) -> Result<(), HierarchyError> {
    match node.parent {
        Some(parent) if parent >= index => {
            Err(HierarchyError::ParentNotBeforeChild { index, parent })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn approx_eq(a: Mat4, b: Mat4) -> bool {
        a.abs_diff_eq(b, 1e-5)
    }

    fn chain() -> Hierarchy {
        Hierarchy::new(vec![
            TransformNode::new().position(1.0, 0.0, 0.0),
            TransformNode::new()
                .position(0.0, 2.0, 0.0)
                .rotation(Quat::from_rotation_z(FRAC_PI_2))
                .parent(0),
            TransformNode::new()
                .position(3.0, 0.0, 0.0)
                .uniform_scale(0.5)
                .parent(1),
            TransformNode::new().position(0.0, 0.0, 4.0).parent(2),
        ])
        .unwrap()
    }

    #[test]
    fn solve_composes_root_to_leaf() {
        let mut h = chain();
        h.solve();

        let locals: Vec<Mat4> = h.nodes().iter().map(|n| n.local_transform()).collect();
        let expected = locals[0] * locals[1] * locals[2] * locals[3];
        assert!(approx_eq(h.global_transform(3).unwrap(), expected));
    }

    #[test]
    fn solve_matches_hand_computed_positions() {
        let mut h = chain();
        h.solve();

        // root at (1,0,0); child up 2; rotated 90deg about z, so +x becomes +y
        let p1 = h.world_position(1).unwrap();
        let p2 = h.world_position(2).unwrap();
        let p3 = h.world_position(3).unwrap();
        assert!(p1.abs_diff_eq(Vec3::new(1.0, 2.0, 0.0), 1e-5));
        assert!(p2.abs_diff_eq(Vec3::new(1.0, 5.0, 0.0), 1e-5));
        // half scale shrinks the z offset of the leaf
        assert!(p3.abs_diff_eq(Vec3::new(1.0, 5.0, 2.0), 1e-5));
    }

    #[test]
    fn solve_is_idempotent() {
        let mut h = chain();
        h.solve();
        let first: Vec<Mat4> = h.global_transforms().copied().collect();
        h.solve();
        let second: Vec<Mat4> = h.global_transforms().copied().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_parent_after_child() {
        let err = Hierarchy::new(vec![
            TransformNode::new().parent(1),
            TransformNode::new(),
        ])
        .unwrap_err();
        assert_eq!(err, HierarchyError::ParentNotBeforeChild { index: 0, parent: 1 });
    }

    #[test]
    fn rejects_self_parent_on_push() {
        let mut h = Hierarchy::default();
        assert_eq!(h.push(TransformNode::new()), Ok(0));
        assert_eq!(
            h.push(TransformNode::new().parent(1)),
            Err(HierarchyError::ParentNotBeforeChild { index: 1, parent: 1 })
        );
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn mutation_is_picked_up_by_next_solve() {
        let mut h = chain();
        h.solve();
        *h.node_mut(0).unwrap().position() = Vec3::ZERO;
        h.solve();
        assert!(h.world_position(1).unwrap().abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 1e-5));
        assert!(h.node_mut(9).is_err());
    }
}
