//! Types shared by every grove crate.

pub mod id;
pub mod types;

pub use types::{DropZone, SplitDirection};
