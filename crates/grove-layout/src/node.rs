use grove_core::SplitDirection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Tolerance used when checking that split sizes sum to one.
pub const SIZE_EPSILON: f32 = 1e-3;

/// What a leaf refers to.
///
/// Pane leaves live in a session's own tree and are bound to a process;
/// session leaves live in the workspace tree and their leaf id is the
/// session id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LeafPayload {
    Pane { cwd: String },
    Session,
}

/// Recursive layout tree node
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayoutNode {
    Leaf {
        id: String,
        payload: LeafPayload,
    },
    Split {
        direction: SplitDirection,
        /// Fractions of the parent extent, one per child, summing to 1.
        #[serde(default)]
        sizes: Vec<f32>,
        children: Vec<Arc<LayoutNode>>,
    },
}

/// `n` equal shares summing to one.
pub fn equal_sizes(n: usize) -> Vec<f32> {
    if n == 0 {
        return Vec::new();
    }
    vec![1.0 / n as f32; n]
}

impl LayoutNode {
    /// Create a pane leaf
    pub fn pane(id: impl Into<String>, cwd: impl Into<String>) -> Self {
        LayoutNode::Leaf {
            id: id.into(),
            payload: LeafPayload::Pane { cwd: cwd.into() },
        }
    }

    /// Create a workspace leaf referencing a session
    pub fn session(id: impl Into<String>) -> Self {
        LayoutNode::Leaf {
            id: id.into(),
            payload: LeafPayload::Session,
        }
    }

    /// Create a split with equal sizes. Needs at least two children.
    pub fn new_split(direction: SplitDirection, children: Vec<LayoutNode>) -> Self {
        let sizes = equal_sizes(children.len());
        Self::with_sizes(direction, sizes, children)
    }

    /// Create a split with explicit sizes.
    pub fn with_sizes(direction: SplitDirection, sizes: Vec<f32>, children: Vec<LayoutNode>) -> Self {
        debug_assert!(children.len() >= 2, "split needs at least two children");
        debug_assert_eq!(sizes.len(), children.len(), "one size per child");
        LayoutNode::Split {
            direction,
            sizes,
            children: children.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, LayoutNode::Leaf { .. })
    }

    /// ID of this node when it is a leaf
    pub fn leaf_id(&self) -> Option<&str> {
        match self {
            LayoutNode::Leaf { id, .. } => Some(id),
            LayoutNode::Split { .. } => None,
        }
    }

    /// Get the layout node at a given path
    pub fn get_at_path(&self, path: &[usize]) -> Option<&LayoutNode> {
        if path.is_empty() {
            return Some(self);
        }

        match self {
            LayoutNode::Leaf { .. } => None,
            LayoutNode::Split { children, .. } => children.get(path[0])?.get_at_path(&path[1..]),
        }
    }

    /// Payload of the leaf with the given ID
    pub fn leaf(&self, target_id: &str) -> Option<&LeafPayload> {
        match self {
            LayoutNode::Leaf { id, payload } => (id == target_id).then_some(payload),
            LayoutNode::Split { children, .. } => children.iter().find_map(|c| c.leaf(target_id)),
        }
    }

    /// Find the layout path to a leaf by its ID
    pub fn find_leaf_path(&self, target_id: &str) -> Option<Vec<usize>> {
        self.find_leaf_path_recursive(target_id, vec![])
    }

    fn find_leaf_path_recursive(&self, target_id: &str, current_path: Vec<usize>) -> Option<Vec<usize>> {
        match self {
            LayoutNode::Leaf { id, .. } => (id == target_id).then_some(current_path),
            LayoutNode::Split { children, .. } => {
                for (i, child) in children.iter().enumerate() {
                    let mut child_path = current_path.clone();
                    child_path.push(i);
                    if let Some(found_path) = child.find_leaf_path_recursive(target_id, child_path) {
                        return Some(found_path);
                    }
                }
                None
            }
        }
    }

    /// Collect all leaf IDs in left-to-right order
    pub fn collect_leaf_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        self.collect_leaf_ids_recursive(&mut ids);
        ids
    }

    fn collect_leaf_ids_recursive(&self, ids: &mut Vec<String>) {
        match self {
            LayoutNode::Leaf { id, .. } => ids.push(id.clone()),
            LayoutNode::Split { children, .. } => {
                for child in children {
                    child.collect_leaf_ids_recursive(ids);
                }
            }
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            LayoutNode::Leaf { .. } => 1,
            LayoutNode::Split { children, .. } => children.iter().map(|c| c.leaf_count()).sum(),
        }
    }

    /// Full-tree membership scan
    pub fn contains_leaf(&self, target_id: &str) -> bool {
        self.leaf(target_id).is_some()
    }

    /// ID of the first leaf in this subtree
    pub fn first_leaf_id(&self) -> &str {
        match self {
            LayoutNode::Leaf { id, .. } => id,
            LayoutNode::Split { children, .. } => match children.first() {
                Some(first) => first.first_leaf_id(),
                None => "",
            },
        }
    }

    /// Check the split invariants on every reachable node:
    /// one size per child, at least two children, sizes summing to one.
    pub fn is_well_formed(&self) -> bool {
        match self {
            LayoutNode::Leaf { .. } => true,
            LayoutNode::Split { sizes, children, .. } => {
                let total: f32 = sizes.iter().sum();
                children.len() >= 2
                    && sizes.len() == children.len()
                    && sizes.iter().all(|s| s.is_finite() && *s > 0.0)
                    && (total - 1.0).abs() <= SIZE_EPSILON
                    && children.iter().all(|c| c.is_well_formed())
            }
        }
    }
}
