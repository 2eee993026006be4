use std::fmt;

use serde::{Deserialize, Serialize};

/// Stone color. On the wire this is the single letter the engine uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    #[serde(rename = "B")]
    Black,
    #[serde(rename = "W")]
    White,
}

impl Color {
    pub fn other(self) -> Self {
        use Color::*;
        match self {
            Black => White,
            White => Black,
        }
    }

    /// Parses "B" or "W", ignoring case.
    pub fn from_initial(text: &str) -> Option<Self> {
        match text.trim() {
            "B" | "b" => Some(Self::Black),
            "W" | "w" => Some(Self::White),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Black => write!(f, "Black"),
            Color::White => write!(f, "White"),
        }
    }
}

/// An intersection on the board. The origin is shared with the engine, the
/// client never interprets it beyond range checks.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: u8,
    pub y: u8,
}

impl Point {
    pub const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// A move is either a stone on a point or a pass. Serializes as `{x,y}` or
/// `null`, which is what the engine expects.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<Point>", into = "Option<Point>")]
pub enum Move {
    Place(Point),
    Pass,
}

impl Move {
    pub fn point(self) -> Option<Point> {
        match self {
            Move::Place(point) => Some(point),
            Move::Pass => None,
        }
    }
}

impl From<Option<Point>> for Move {
    fn from(point: Option<Point>) -> Self {
        match point {
            Some(point) => Move::Place(point),
            None => Move::Pass,
        }
    }
}

impl From<Move> for Option<Point> {
    fn from(mv: Move) -> Self {
        mv.point()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Place(point) => write!(f, "{point}"),
            Move::Pass => write!(f, "PASS"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_use_single_letters() {
        assert_eq!(serde_json::to_string(&Color::Black).unwrap(), r#""B""#);
        assert_eq!(serde_json::to_string(&Color::White).unwrap(), r#""W""#);
        let white: Color = serde_json::from_str(r#""W""#).unwrap();
        assert_eq!(white, Color::White);
    }

    #[test]
    fn color_initials_ignore_case() {
        assert_eq!(Color::from_initial("b"), Some(Color::Black));
        assert_eq!(Color::from_initial("W"), Some(Color::White));
        assert_eq!(Color::from_initial("x"), None);
        assert_eq!(Color::Black.other(), Color::White);
    }

    #[test]
    fn pass_is_null() {
        assert_eq!(serde_json::to_string(&Move::Pass).unwrap(), "null");
        assert_eq!(
            serde_json::to_string(&Move::Place(Point::new(3, 4))).unwrap(),
            r#"{"x":3,"y":4}"#
        );
        let mv: Move = serde_json::from_str("null").unwrap();
        assert_eq!(mv, Move::Pass);
    }
}
