//! Structural edits on layout trees.
//!
//! Every edit returns a new tree. Only the ancestors of the edited node are
//! rebuilt; all other subtrees are shared with the input by `Arc`.

use crate::node::{LayoutNode, LeafPayload, SIZE_EPSILON, equal_sizes};
use crate::resize::MIN_SIZE;
use grove_core::SplitDirection;
use std::sync::Arc;

/// Sizes given to the two halves of a fresh split.
pub const SPLIT_SIZES: [f32; 2] = [0.5, 0.5];

enum Pruned {
    Untouched,
    Removed,
    Rebuilt(LayoutNode),
}

/// Scale `sizes` so they sum to one; falls back to equal shares when the total is unusable.
pub(crate) fn rescale(sizes: &[f32]) -> Vec<f32> {
    let total: f32 = sizes.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return equal_sizes(sizes.len());
    }
    sizes.iter().map(|s| s / total).collect()
}

/// Whether `sizes` can be stored on a split as is: every share finite and at
/// least [`MIN_SIZE`], the total within [`SIZE_EPSILON`] of one.
pub fn sizes_are_valid(sizes: &[f32]) -> bool {
    let total: f32 = sizes.iter().sum();
    sizes.iter().all(|s| s.is_finite() && *s >= MIN_SIZE - SIZE_EPSILON) && (total - 1.0).abs() <= SIZE_EPSILON
}

impl LayoutNode {
    /// Replace the leaf `target_id` with a two-way split holding the original
    /// leaf and a new leaf that copies its payload.
    ///
    /// Returns the new tree and the new leaf's ID, or an unchanged tree and
    /// `None` when the target is not in the tree.
    pub fn split(&self, target_id: &str, direction: SplitDirection) -> (LayoutNode, Option<String>) {
        let Some(payload) = self.leaf(target_id).cloned() else {
            log::debug!("split: leaf {} not found", target_id);
            return (self.clone(), None);
        };
        let new_id = grove_core::id::new_id();
        let new_leaf = LayoutNode::Leaf { id: new_id.clone(), payload };
        (self.insert_at_target(target_id, new_leaf, direction, false), Some(new_id))
    }

    /// Replace the leaf `target_id` with a split of the target and `new_leaf`.
    /// `before` puts the new leaf first. Missing target leaves the tree as is.
    pub fn insert_at_target(
        &self,
        target_id: &str,
        new_leaf: LayoutNode,
        direction: SplitDirection,
        before: bool,
    ) -> LayoutNode {
        let mut new_leaf = Some(new_leaf);
        self.insert_recursive(target_id, &mut new_leaf, direction, before)
            .unwrap_or_else(|| self.clone())
    }

    fn insert_recursive(
        &self,
        target_id: &str,
        new_leaf: &mut Option<LayoutNode>,
        direction: SplitDirection,
        before: bool,
    ) -> Option<LayoutNode> {
        match self {
            LayoutNode::Leaf { id, .. } if id == target_id => {
                let inserted = Arc::new(new_leaf.take()?);
                let original = Arc::new(self.clone());
                let children = if before {
                    vec![inserted, original]
                } else {
                    vec![original, inserted]
                };
                Some(LayoutNode::Split {
                    direction,
                    sizes: SPLIT_SIZES.to_vec(),
                    children,
                })
            }
            LayoutNode::Leaf { .. } => None,
            LayoutNode::Split { direction: split_direction, sizes, children } => {
                for (i, child) in children.iter().enumerate() {
                    if let Some(replacement) = child.insert_recursive(target_id, new_leaf, direction, before) {
                        let mut new_children = children.clone();
                        new_children[i] = Arc::new(replacement);
                        return Some(LayoutNode::Split {
                            direction: *split_direction,
                            sizes: sizes.clone(),
                            children: new_children,
                        });
                    }
                }
                None
            }
        }
    }

    /// Remove the leaf `leaf_id`.
    ///
    /// A split left with one child becomes that child; a split left with none
    /// disappears. Returns `None` when the whole tree is gone.
    pub fn remove(&self, leaf_id: &str) -> Option<LayoutNode> {
        self.retain_leaves(&mut |id, _| id != leaf_id)
    }

    /// Keep only the leaves for which `keep` returns true, collapsing splits
    /// exactly like [`LayoutNode::remove`].
    pub fn retain_leaves<F>(&self, keep: &mut F) -> Option<LayoutNode>
    where
        F: FnMut(&str, &LeafPayload) -> bool,
    {
        match self.prune(keep) {
            Pruned::Untouched => Some(self.clone()),
            Pruned::Removed => None,
            Pruned::Rebuilt(node) => Some(node),
        }
    }

    fn prune<F>(&self, keep: &mut F) -> Pruned
    where
        F: FnMut(&str, &LeafPayload) -> bool,
    {
        match self {
            LayoutNode::Leaf { id, payload } => {
                if keep(id.as_str(), payload) {
                    Pruned::Untouched
                } else {
                    Pruned::Removed
                }
            }
            LayoutNode::Split { direction, sizes, children } => {
                let mut kept_children: Vec<Arc<LayoutNode>> = Vec::with_capacity(children.len());
                let mut kept_sizes = Vec::with_capacity(children.len());
                let mut changed = false;
                let mut dropped = false;

                for (i, child) in children.iter().enumerate() {
                    let size = sizes.get(i).copied().unwrap_or(0.0);
                    match child.prune(keep) {
                        Pruned::Untouched => {
                            kept_children.push(child.clone());
                            kept_sizes.push(size);
                        }
                        Pruned::Removed => {
                            changed = true;
                            dropped = true;
                        }
                        Pruned::Rebuilt(node) => {
                            changed = true;
                            kept_children.push(Arc::new(node));
                            kept_sizes.push(size);
                        }
                    }
                }

                if !changed {
                    return Pruned::Untouched;
                }

                match kept_children.len() {
                    0 => Pruned::Removed,
                    1 => Pruned::Rebuilt(kept_children[0].as_ref().clone()),
                    _ => Pruned::Rebuilt(LayoutNode::Split {
                        direction: *direction,
                        sizes: if dropped { rescale(&kept_sizes) } else { kept_sizes },
                        children: kept_children,
                    }),
                }
            }
        }
    }

    /// Replace the sizes of the split at `path`, rebuilding only its ancestors.
    ///
    /// Returns `None` when the path does not lead to a split with the same
    /// number of children as `sizes`, or when [`sizes_are_valid`] rejects them.
    pub fn with_sizes_at_path(&self, path: &[usize], new_sizes: Vec<f32>) -> Option<LayoutNode> {
        match self {
            LayoutNode::Leaf { .. } => None,
            LayoutNode::Split { direction, sizes, children } => {
                if path.is_empty() {
                    if new_sizes.len() != children.len() || !sizes_are_valid(&new_sizes) {
                        return None;
                    }
                    return Some(LayoutNode::Split {
                        direction: *direction,
                        sizes: new_sizes,
                        children: children.clone(),
                    });
                }
                let child = children.get(path[0])?;
                let replacement = child.with_sizes_at_path(&path[1..], new_sizes)?;
                let mut new_children = children.clone();
                new_children[path[0]] = Arc::new(replacement);
                Some(LayoutNode::Split {
                    direction: *direction,
                    sizes: sizes.clone(),
                    children: new_children,
                })
            }
        }
    }
}
