//! Projection of a layout tree onto rectangles.
//!
//! Coordinates are normalized: the root usually gets the unit square and
//! callers scale to pixels or terminal cells.

use crate::node::{LayoutNode, equal_sizes};
use grove_core::{DropZone, SplitDirection};
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Default for Rect {
    fn default() -> Self {
        Self::UNIT
    }
}

impl Rect {
    pub const UNIT: Rect = Rect { x: 0.0, y: 0.0, w: 1.0, h: 1.0 };

    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn area(&self) -> f32 {
        self.w * self.h
    }

    /// Half-open containment: the right and bottom edges belong to the neighbor.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.x + self.w && point.y >= self.y && point.y < self.y + self.h
    }

    /// Extent along the axis a split of `direction` divides.
    pub fn extent(&self, direction: SplitDirection) -> f32 {
        match direction {
            SplitDirection::Vertical => self.w,
            SplitDirection::Horizontal => self.h,
        }
    }

    /// Start coordinate along the axis a split of `direction` divides.
    pub fn start(&self, direction: SplitDirection) -> f32 {
        match direction {
            SplitDirection::Vertical => self.x,
            SplitDirection::Horizontal => self.y,
        }
    }

    /// Slice of this rect beginning `offset` along the split axis and spanning `size`,
    /// both as fractions of this rect's extent.
    pub fn child(&self, direction: SplitDirection, offset: f32, size: f32) -> Rect {
        match direction {
            SplitDirection::Vertical => Rect::new(self.x + offset * self.w, self.y, size * self.w, self.h),
            SplitDirection::Horizontal => Rect::new(self.x, self.y + offset * self.h, self.w, size * self.h),
        }
    }

    /// Point position as fractions of this rect, not clamped.
    pub fn relative(&self, point: Point) -> (f32, f32) {
        let fx = if self.w > 0.0 { (point.x - self.x) / self.w } else { 0.0 };
        let fy = if self.h > 0.0 { (point.y - self.y) / self.h } else { 0.0 };
        (fx, fy)
    }

    /// Edge of this rect nearest to `point`.
    pub fn drop_zone(&self, point: Point) -> DropZone {
        let (fx, fy) = self.relative(point);
        DropZone::nearest(fx.clamp(0.0, 1.0), fy.clamp(0.0, 1.0))
    }

    /// Terminal grid size of this normalized rect on a `cols` x `rows` screen.
    pub fn to_cells(&self, cols: u16, rows: u16) -> (u16, u16) {
        let c = (self.w * cols as f32).round().max(1.0).min(u16::MAX as f32) as u16;
        let r = (self.h * rows as f32).round().max(1.0).min(u16::MAX as f32) as u16;
        (c, r)
    }
}

/// Absolute rectangle of one leaf.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LeafRect {
    pub id: String,
    pub rect: Rect,
}

/// Draggable boundary between children `index` and `index + 1` of a split.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Divider {
    /// Direction of the owning split.
    pub direction: SplitDirection,
    /// Absolute coordinate of the line on the split axis.
    pub position: f32,
    /// Rectangle of the owning split.
    pub rect: Rect,
    /// Path from the root to the owning split.
    pub path: Vec<usize>,
    pub index: usize,
    /// Sizes of the owning split at projection time.
    pub sizes: Vec<f32>,
}

impl Divider {
    /// Whether `point` lies within `tolerance` of the line, inside the owning split.
    pub fn hit(&self, point: Point, tolerance: f32) -> bool {
        match self.direction {
            SplitDirection::Vertical => {
                (point.x - self.position).abs() <= tolerance
                    && point.y >= self.rect.y
                    && point.y <= self.rect.y + self.rect.h
            }
            SplitDirection::Horizontal => {
                (point.y - self.position).abs() <= tolerance
                    && point.x >= self.rect.x
                    && point.x <= self.rect.x + self.rect.w
            }
        }
    }
}

/// Leaf rectangles and dividers of one tree.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Projection {
    pub leaves: Vec<LeafRect>,
    pub dividers: Vec<Divider>,
}

impl Projection {
    pub fn leaf_rect(&self, id: &str) -> Option<Rect> {
        self.leaves.iter().find(|l| l.id == id).map(|l| l.rect)
    }

    /// Leaf under `point`, used as a drop target.
    pub fn leaf_at(&self, point: Point) -> Option<&LeafRect> {
        self.leaves.iter().find(|l| l.rect.contains(point))
    }

    /// Divider under `point`. Innermost dividers win over their ancestors.
    pub fn divider_at(&self, point: Point, tolerance: f32) -> Option<&Divider> {
        self.dividers.iter().find(|d| d.hit(point, tolerance))
    }
}

/// Project `tree` into `bounds`.
pub fn project(tree: &LayoutNode, bounds: Rect) -> Projection {
    let mut projection = Projection::default();
    let mut path = Vec::new();
    project_recursive(tree, bounds, &mut path, &mut projection);
    projection
}

/// Absolute leaf rectangles of `tree` inside `bounds`.
pub fn leaf_rects(tree: &LayoutNode, bounds: Rect) -> Vec<LeafRect> {
    project(tree, bounds).leaves
}

/// Dividers of `tree` inside `bounds`.
pub fn dividers(tree: &LayoutNode, bounds: Rect) -> Vec<Divider> {
    project(tree, bounds).dividers
}

fn project_recursive(node: &LayoutNode, bounds: Rect, path: &mut Vec<usize>, out: &mut Projection) {
    match node {
        LayoutNode::Leaf { id, .. } => out.leaves.push(LeafRect { id: id.clone(), rect: bounds }),
        LayoutNode::Split { direction, sizes, children } => {
            let sizes = if sizes.len() == children.len() {
                sizes.clone()
            } else {
                equal_sizes(children.len())
            };

            let mut offset = 0.0;
            let mut own_dividers = Vec::new();
            for (i, child) in children.iter().enumerate() {
                let size = sizes[i];
                let child_bounds = bounds.child(*direction, offset, size);
                path.push(i);
                project_recursive(child, child_bounds, path, out);
                path.pop();
                offset += size;

                if i + 1 < children.len() {
                    own_dividers.push(Divider {
                        direction: *direction,
                        position: bounds.start(*direction) + offset * bounds.extent(*direction),
                        rect: bounds,
                        path: path.clone(),
                        index: i,
                        sizes: sizes.clone(),
                    });
                }
            }
            // Children were projected first, so nested dividers precede this split's.
            out.dividers.extend(own_dividers);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f32 = 1e-4;

    fn pane(id: &str) -> LayoutNode {
        LayoutNode::pane(id, "/tmp")
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < EPS
    }

    fn assert_rect(rect: Rect, x: f32, y: f32, w: f32, h: f32) {
        assert!(
            approx(rect.x, x) && approx(rect.y, y) && approx(rect.w, w) && approx(rect.h, h),
            "got {:?}, expected ({}, {}, {}, {})",
            rect,
            x,
            y,
            w,
            h
        );
    }

    fn sample_tree() -> LayoutNode {
        // A on top; B | C below
        LayoutNode::with_sizes(
            SplitDirection::Horizontal,
            vec![0.5, 0.5],
            vec![
                pane("A"),
                LayoutNode::with_sizes(SplitDirection::Vertical, vec![0.25, 0.75], vec![pane("B"), pane("C")]),
            ],
        )
    }

    #[test]
    fn single_leaf_fills_bounds() {
        let projection = project(&pane("A"), Rect::UNIT);
        assert_eq!(projection.leaves.len(), 1);
        assert_rect(projection.leaves[0].rect, 0.0, 0.0, 1.0, 1.0);
        assert!(projection.dividers.is_empty());
    }

    #[test]
    fn nested_rects() {
        let projection = project(&sample_tree(), Rect::UNIT);
        assert_rect(projection.leaf_rect("A").unwrap(), 0.0, 0.0, 1.0, 0.5);
        assert_rect(projection.leaf_rect("B").unwrap(), 0.0, 0.5, 0.25, 0.5);
        assert_rect(projection.leaf_rect("C").unwrap(), 0.25, 0.5, 0.75, 0.5);
    }

    #[test]
    fn dividers_carry_path_index_and_sizes() {
        let projection = project(&sample_tree(), Rect::UNIT);
        assert_eq!(projection.dividers.len(), 2);

        let inner = &projection.dividers[0];
        assert_eq!(inner.direction, SplitDirection::Vertical);
        assert_eq!(inner.path, vec![1]);
        assert_eq!(inner.index, 0);
        assert_eq!(inner.sizes, vec![0.25, 0.75]);
        assert!(approx(inner.position, 0.25));
        assert_rect(inner.rect, 0.0, 0.5, 1.0, 0.5);

        let outer = &projection.dividers[1];
        assert_eq!(outer.direction, SplitDirection::Horizontal);
        assert!(outer.path.is_empty());
        assert!(approx(outer.position, 0.5));
    }

    #[test]
    fn no_divider_after_last_child() {
        let tree = LayoutNode::new_split(SplitDirection::Vertical, vec![pane("a"), pane("b"), pane("c")]);
        let dividers = dividers(&tree, Rect::UNIT);
        assert_eq!(dividers.iter().map(|d| d.index).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn mismatched_sizes_project_as_equal_shares() {
        let tree = LayoutNode::Split {
            direction: SplitDirection::Vertical,
            sizes: vec![1.0],
            children: vec![std::sync::Arc::new(pane("a")), std::sync::Arc::new(pane("b"))],
        };
        let rects = leaf_rects(&tree, Rect::UNIT);
        assert_rect(rects[1].rect, 0.5, 0.0, 0.5, 1.0);
    }

    #[test]
    fn projection_into_offset_bounds() {
        let tree = LayoutNode::new_split(SplitDirection::Vertical, vec![pane("a"), pane("b")]);
        let rects = leaf_rects(&tree, Rect::new(0.5, 0.0, 0.5, 1.0));
        assert_rect(rects[0].rect, 0.5, 0.0, 0.25, 1.0);
        assert_rect(rects[1].rect, 0.75, 0.0, 0.25, 1.0);
    }

    #[test]
    fn hit_testing() {
        let projection = project(&sample_tree(), Rect::UNIT);
        assert_eq!(projection.leaf_at(Point::new(0.1, 0.1)).map(|l| l.id.as_str()), Some("A"));
        assert_eq!(projection.leaf_at(Point::new(0.5, 0.9)).map(|l| l.id.as_str()), Some("C"));
        assert!(projection.leaf_at(Point::new(1.5, 0.5)).is_none());

        let inner = projection.divider_at(Point::new(0.251, 0.75), 0.01).unwrap();
        assert_eq!(inner.path, vec![1]);
        let outer = projection.divider_at(Point::new(0.8, 0.495), 0.01).unwrap();
        assert!(outer.path.is_empty());
        // the inner vertical divider only spans the lower half
        assert!(projection.divider_at(Point::new(0.25, 0.2), 0.01).is_none());
    }

    #[test]
    fn drop_zone_from_point() {
        let rect = Rect::new(0.5, 0.0, 0.5, 1.0);
        assert_eq!(rect.drop_zone(Point::new(0.52, 0.5)), DropZone::Left);
        assert_eq!(rect.drop_zone(Point::new(0.98, 0.5)), DropZone::Right);
        assert_eq!(rect.drop_zone(Point::new(0.75, 0.02)), DropZone::Top);
        assert_eq!(rect.drop_zone(Point::new(0.75, 0.97)), DropZone::Bottom);
    }

    #[test]
    fn to_cells_has_minimum_size() {
        assert_eq!(Rect::new(0.0, 0.0, 0.5, 0.5).to_cells(80, 24), (40, 12));
        assert_eq!(Rect::new(0.0, 0.0, 0.001, 0.001).to_cells(80, 24), (1, 1));
    }

    fn arb_tree() -> impl Strategy<Value = LayoutNode> {
        let leaf = Just(()).prop_map(|_| pane("x"));
        leaf.prop_recursive(4, 32, 4, |inner| {
            (
                prop::bool::ANY,
                prop::collection::vec((inner, 1u32..20), 2..5),
            )
                .prop_map(|(vertical, parts)| {
                    let direction = if vertical { SplitDirection::Vertical } else { SplitDirection::Horizontal };
                    let total: u32 = parts.iter().map(|(_, w)| *w).sum();
                    let sizes = parts.iter().map(|(_, w)| *w as f32 / total as f32).collect();
                    let children = parts.into_iter().map(|(c, _)| c).collect();
                    LayoutNode::with_sizes(direction, sizes, children)
                })
        })
    }

    proptest! {
        #[test]
        fn leaves_tile_the_bounds(tree in arb_tree()) {
            let rects = leaf_rects(&tree, Rect::UNIT);
            let area: f32 = rects.iter().map(|l| l.rect.area()).sum();
            prop_assert_eq!(rects.len(), tree.leaf_count());
            prop_assert!((area - 1.0).abs() < 1e-3);
        }

        #[test]
        fn one_divider_per_adjacent_pair(tree in arb_tree()) {
            let projection = project(&tree, Rect::UNIT);
            // every split with n children contributes n - 1 dividers and n - 1 extra leaves
            prop_assert_eq!(projection.dividers.len(), tree.leaf_count() - 1);
        }
    }
}
