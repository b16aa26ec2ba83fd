//! Split layout engine shared by session pane trees and the cross-session
//! workspace tree.
//!
//! - `node`: the tree itself and read-only queries
//! - `mutation`: split / remove / insert, rebuilt with structural sharing
//! - `geometry`: tree + rectangle -> leaf rectangles and dividers
//! - `resize`: interactive divider dragging
//! - `validate`: pruning and repair after reload

pub mod geometry;
pub mod mutation;
pub mod node;
pub mod resize;
pub mod validate;

pub use geometry::{Divider, LeafRect, Point, Projection, Rect, project};
pub use grove_core::{DropZone, SplitDirection};
pub use node::{LayoutNode, LeafPayload, equal_sizes};
pub use resize::{DragState, MIN_SIZE, ResizeController, SizeUpdate};
pub use validate::validate;
