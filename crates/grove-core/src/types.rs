use serde::{Deserialize, Serialize};

/// Axis along which a split arranges its children.
///
/// `Vertical` places children side by side (the divider line is vertical),
/// `Horizontal` stacks them top to bottom.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitDirection {
    Horizontal,
    Vertical,
}

impl SplitDirection {
    pub fn display_name(&self) -> &'static str {
        match self {
            SplitDirection::Horizontal => "hsplit",
            SplitDirection::Vertical => "vsplit",
        }
    }
}

/// Which edge of a target the user dropped a session onto.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropZone {
    Left,
    Right,
    Top,
    Bottom,
}

impl DropZone {
    pub const ALL: [DropZone; 4] = [DropZone::Left, DropZone::Right, DropZone::Top, DropZone::Bottom];

    /// Split direction produced by dropping on this edge.
    pub fn direction(&self) -> SplitDirection {
        match self {
            DropZone::Left | DropZone::Right => SplitDirection::Vertical,
            DropZone::Top | DropZone::Bottom => SplitDirection::Horizontal,
        }
    }

    /// Whether the dropped item goes before the target.
    pub fn inserts_before(&self) -> bool {
        matches!(self, DropZone::Left | DropZone::Top)
    }

    /// Nearest edge for a point given as fractions of the target's width and height.
    /// Ties resolve in the order left, right, top, bottom.
    pub fn nearest(fx: f32, fy: f32) -> Self {
        let distances = [
            (DropZone::Left, fx),
            (DropZone::Right, 1.0 - fx),
            (DropZone::Top, fy),
            (DropZone::Bottom, 1.0 - fy),
        ];
        let mut best = distances[0];
        for candidate in &distances[1..] {
            if candidate.1 < best.1 {
                best = *candidate;
            }
        }
        best.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_direction_serde_values() {
        assert_eq!(serde_json::to_string(&SplitDirection::Vertical).unwrap(), "\"vertical\"");
        let parsed: SplitDirection = serde_json::from_str("\"horizontal\"").unwrap();
        assert_eq!(parsed, SplitDirection::Horizontal);
    }

    #[test]
    fn drop_zone_maps_to_direction_and_order() {
        assert_eq!(DropZone::Left.direction(), SplitDirection::Vertical);
        assert_eq!(DropZone::Right.direction(), SplitDirection::Vertical);
        assert_eq!(DropZone::Top.direction(), SplitDirection::Horizontal);
        assert_eq!(DropZone::Bottom.direction(), SplitDirection::Horizontal);
        assert!(DropZone::Left.inserts_before());
        assert!(DropZone::Top.inserts_before());
        assert!(!DropZone::Right.inserts_before());
        assert!(!DropZone::Bottom.inserts_before());
    }

    #[test]
    fn nearest_edge() {
        assert_eq!(DropZone::nearest(0.05, 0.5), DropZone::Left);
        assert_eq!(DropZone::nearest(0.9, 0.4), DropZone::Right);
        assert_eq!(DropZone::nearest(0.5, 0.1), DropZone::Top);
        assert_eq!(DropZone::nearest(0.5, 0.95), DropZone::Bottom);
        // dead center ties go to the left edge
        assert_eq!(DropZone::nearest(0.5, 0.5), DropZone::Left);
    }
}
