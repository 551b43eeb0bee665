use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Axis along which a layout arranges its children.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Direction {
    #[default]
    Row,
    Column,
}

/// Where a drop landed relative to the target layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
    Center,
}

/// Whether new content goes before or after the existing content.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    Before,
    After,
}

impl Side {
    /// The direction a split towards this side produces, or `None` for the
    /// center.
    pub fn axis(self) -> Option<Direction> {
        match self {
            Side::Top | Side::Bottom => Some(Direction::Column),
            Side::Left | Side::Right => Some(Direction::Row),
            Side::Center => None,
        }
    }

    pub fn placement(self) -> Placement {
        match self {
            Side::Top | Side::Left => Placement::Before,
            Side::Bottom | Side::Right | Side::Center => Placement::After,
        }
    }
}

/// What a layout holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Tab,
    Layout,
}

#[cfg(test)]
mod tests {
    use super::*;

    mod side_operations {
        use super::*;

        #[test]
        fn edge_axes() {
            assert_eq!(Side::Top.axis(), Some(Direction::Column));
            assert_eq!(Side::Bottom.axis(), Some(Direction::Column));
            assert_eq!(Side::Left.axis(), Some(Direction::Row));
            assert_eq!(Side::Right.axis(), Some(Direction::Row));
            assert_eq!(Side::Center.axis(), None);
        }

        #[test]
        fn placement() {
            assert_eq!(Side::Top.placement(), Placement::Before);
            assert_eq!(Side::Left.placement(), Placement::Before);
            assert_eq!(Side::Bottom.placement(), Placement::After);
            assert_eq!(Side::Right.placement(), Placement::After);
        }

        #[test]
        fn parse_and_display() {
            assert_eq!("left".parse::<Side>().ok(), Some(Side::Left));
            assert!("middle".parse::<Side>().is_err());
            assert_eq!(Side::Bottom.to_string(), "bottom");
        }
    }

    mod direction_operations {
        use super::*;

        #[test]
        fn default_is_row() {
            assert_eq!(Direction::default(), Direction::Row);
        }

        #[test]
        fn serde_names() {
            let column = serde_json::to_string(&Direction::Column).unwrap();
            assert_eq!(column, "\"column\"");
            let parsed: Direction = serde_json::from_str("\"row\"").unwrap();
            assert_eq!(parsed, Direction::Row);
        }
    }
}
