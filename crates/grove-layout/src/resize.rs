use crate::geometry::{Divider, Point, Rect};
use crate::node::LayoutNode;
use grove_core::SplitDirection;

/// Smallest share a child may be dragged down to.
pub const MIN_SIZE: f32 = 0.1;

/// New sizes after dragging the divider between `index` and `index + 1` to
/// `pointer_fraction` of the owning split.
///
/// Returns `None` for an out-of-range index or for a pair too small to drag.
pub fn resize_pair(sizes: &[f32], index: usize, pointer_fraction: f32) -> Option<Vec<f32>> {
    if index + 1 >= sizes.len() {
        return None;
    }
    let combined = sizes[index] + sizes[index + 1];
    if combined < 2.0 * MIN_SIZE {
        return None;
    }
    let before_sum: f32 = sizes[..index].iter().sum();
    let fraction = pointer_fraction.clamp(0.0, 1.0);
    let upper = (combined - MIN_SIZE).max(MIN_SIZE);
    let first = (fraction - before_sum).clamp(MIN_SIZE, upper);

    let mut new_sizes = sizes.to_vec();
    new_sizes[index] = first;
    new_sizes[index + 1] = combined - first;
    Some(new_sizes)
}

/// Sizes to write back into the split at `path`.
#[derive(Clone, Debug, PartialEq)]
pub struct SizeUpdate {
    pub path: Vec<usize>,
    pub sizes: Vec<f32>,
}

impl SizeUpdate {
    /// Apply to `tree`. `None` if the path is stale or the sizes are invalid.
    pub fn apply(&self, tree: &LayoutNode) -> Option<LayoutNode> {
        tree.with_sizes_at_path(&self.path, self.sizes.clone())
    }
}

/// State of an active divider drag
#[derive(Clone, Debug, PartialEq)]
pub struct DragState {
    pub path: Vec<usize>,
    pub index: usize,
    pub direction: SplitDirection,
    /// Rectangle of the owning split, captured at press time.
    pub rect: Rect,
    /// Working copy of the owning split's sizes.
    pub sizes: Vec<f32>,
}

impl DragState {
    pub fn from_divider(divider: &Divider) -> Self {
        Self {
            path: divider.path.clone(),
            index: divider.index,
            direction: divider.direction,
            rect: divider.rect,
            sizes: divider.sizes.clone(),
        }
    }

    /// Pointer position along the split axis as a fraction of the owning rect.
    pub fn pointer_fraction(&self, point: Point) -> f32 {
        let extent = self.rect.extent(self.direction);
        if extent <= 0.0 {
            return 0.0;
        }
        let coord = match self.direction {
            SplitDirection::Vertical => point.x,
            SplitDirection::Horizontal => point.y,
        };
        ((coord - self.rect.start(self.direction)) / extent).clamp(0.0, 1.0)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
enum ResizeState {
    #[default]
    Idle,
    Dragging(DragState),
}

/// Pointer-driven divider drag: press begins, moves produce size updates,
/// release ends. Sizes written by the last move stay in place.
#[derive(Clone, Debug, Default)]
pub struct ResizeController {
    state: ResizeState,
}

impl ResizeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, ResizeState::Dragging(_))
    }

    pub fn drag_state(&self) -> Option<&DragState> {
        match &self.state {
            ResizeState::Dragging(drag) => Some(drag),
            ResizeState::Idle => None,
        }
    }

    /// Start dragging `divider`.
    pub fn begin(&mut self, divider: &Divider) {
        log::debug!("resize: begin at {:?}[{}]", divider.path, divider.index);
        self.state = ResizeState::Dragging(DragState::from_divider(divider));
    }

    /// Start dragging whichever divider is under `point`. Returns whether one was hit.
    pub fn press(&mut self, dividers: &[Divider], point: Point, tolerance: f32) -> bool {
        match dividers.iter().find(|d| d.hit(point, tolerance)) {
            Some(divider) => {
                self.begin(divider);
                true
            }
            None => false,
        }
    }

    /// Feed a pointer sample. Returns the update to write back, if any.
    pub fn drag(&mut self, point: Point) -> Option<SizeUpdate> {
        let ResizeState::Dragging(drag) = &mut self.state else {
            return None;
        };
        let fraction = drag.pointer_fraction(point);
        let sizes = resize_pair(&drag.sizes, drag.index, fraction)?;
        drag.sizes = sizes.clone();
        Some(SizeUpdate {
            path: drag.path.clone(),
            sizes,
        })
    }

    /// End the drag.
    pub fn release(&mut self) {
        if self.is_dragging() {
            log::debug!("resize: released");
        }
        self.state = ResizeState::Idle;
    }
}
