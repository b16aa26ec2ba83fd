//! Repair of trees read back from disk.

use crate::mutation::rescale;
use crate::node::{LayoutNode, equal_sizes};
use crate::resize::MIN_SIZE;
use std::collections::HashSet;
use std::sync::Arc;

const SUM_TOLERANCE: f32 = 1e-4;

/// Rebuild `tree` keeping only leaves whose id is in `live`.
///
/// Collapses splits the same way [`LayoutNode::remove`] does, drops leaves
/// whose id was already seen earlier in the tree and repairs split sizes.
/// The result satisfies [`LayoutNode::is_well_formed`] and validating it
/// again returns it unchanged.
pub fn validate(tree: Option<&LayoutNode>, live: &HashSet<String>) -> Option<LayoutNode> {
    let mut seen = HashSet::new();
    validate_recursive(tree?, live, &mut seen)
}

fn validate_recursive(node: &LayoutNode, live: &HashSet<String>, seen: &mut HashSet<String>) -> Option<LayoutNode> {
    match node {
        LayoutNode::Leaf { id, .. } => {
            if !live.contains(id) {
                log::warn!("Dropping layout leaf {} with no live entity", id);
                return None;
            }
            if !seen.insert(id.clone()) {
                log::warn!("Dropping duplicate layout leaf {}", id);
                return None;
            }
            Some(node.clone())
        }
        LayoutNode::Split { direction, sizes, children } => {
            let original_sizes = if sizes.len() == children.len() {
                sizes.clone()
            } else {
                equal_sizes(children.len())
            };

            let mut kept_children = Vec::with_capacity(children.len());
            let mut kept_sizes = Vec::with_capacity(children.len());
            for (child, size) in children.iter().zip(original_sizes) {
                if let Some(valid) = validate_recursive(child, live, seen) {
                    kept_children.push(Arc::new(valid));
                    kept_sizes.push(size);
                }
            }

            match kept_children.len() {
                0 => None,
                1 => kept_children.pop().map(|c| c.as_ref().clone()),
                _ => Some(LayoutNode::Split {
                    direction: *direction,
                    sizes: repair_sizes(&kept_sizes),
                    children: kept_children,
                }),
            }
        }
    }
}

/// Make `sizes` usable: equal shares when any entry is unusable or some adjacent
/// pair is too small to drag, otherwise rescaled to sum to one if it drifted.
fn repair_sizes(sizes: &[f32]) -> Vec<f32> {
    if sizes.iter().any(|s| !s.is_finite() || *s <= 0.0) {
        return equal_sizes(sizes.len());
    }
    let total: f32 = sizes.iter().sum();
    let tiny = (2.0 * MIN_SIZE - 1e-3) * total;
    if sizes.windows(2).any(|pair| pair[0] + pair[1] < tiny) {
        return equal_sizes(sizes.len());
    }
    if (total - 1.0).abs() > SUM_TOLERANCE {
        return rescale(sizes);
    }
    sizes.to_vec()
}
