//! Integer geometry shared by every component.
//!
//! Rects are half-open: `x_max` and `y_max` are excluded, so a rect whose
//! width or height is zero covers nothing and doubles as the "no match" value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::EnumIter;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Point { Point { x, y } }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl Rect {
    pub const EMPTY: Rect = Rect {
        x_min: 0,
        y_min: 0,
        x_max: 0,
        y_max: 0,
    };

    pub fn new(x_min: i32, y_min: i32, x_max: i32, y_max: i32) -> Rect {
        Rect {
            x_min,
            y_min,
            x_max: x_max.max(x_min),
            y_max: y_max.max(y_min),
        }
    }

    pub fn from_xywh(x: i32, y: i32, width: i32, height: i32) -> Rect {
        Rect::new(x, y, x + width.max(0), y + height.max(0))
    }

    pub fn width(&self) -> i32 { self.x_max - self.x_min }

    pub fn height(&self) -> i32 { self.y_max - self.y_min }

    pub fn area(&self) -> i64 { self.width() as i64 * self.height() as i64 }

    pub fn is_empty(&self) -> bool { self.width() == 0 || self.height() == 0 }

    pub fn origin(&self) -> Point { Point::new(self.x_min, self.y_min) }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x_min && p.x < self.x_max && p.y >= self.y_min && p.y < self.y_max
    }

    pub fn intersects(&self, other: &Rect) -> bool { !self.intersection(other).is_empty() }

    pub fn intersection(&self, other: &Rect) -> Rect {
        let x_min = self.x_min.max(other.x_min);
        let y_min = self.y_min.max(other.y_min);
        let x_max = self.x_max.min(other.x_max);
        let y_max = self.y_max.min(other.y_max);
        if x_min >= x_max || y_min >= y_max {
            return Rect::EMPTY;
        }
        Rect { x_min, y_min, x_max, y_max }
    }

    /// Smallest rect covering both. Empty rects are ignored.
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Rect {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Rect {
        Rect {
            x_min: self.x_min + dx,
            y_min: self.y_min + dy,
            x_max: self.x_max + dx,
            y_max: self.y_max + dy,
        }
    }

    pub fn moved_to(&self, x: i32, y: i32) -> Rect {
        Rect::from_xywh(x, y, self.width(), self.height())
    }

    pub fn inset(&self, strut: &Strut) -> Rect {
        Rect::new(
            self.x_min + strut.left,
            self.y_min + strut.top,
            self.x_max - strut.right,
            self.y_max - strut.bottom,
        )
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.x_min + self.width() / 2,
            self.y_min + self.height() / 2,
        )
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}{:+}{:+}",
            self.width(),
            self.height(),
            self.x_min,
            self.y_min
        )
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid geometry {0:?}, expected WxH+X+Y")]
pub struct ParseRectError(String);

impl FromStr for Rect {
    type Err = ParseRectError;

    /// Parses the X geometry form `WxH+X+Y` (offsets may be negative).
    fn from_str(s: &str) -> Result<Rect, ParseRectError> {
        let err = || ParseRectError(s.to_string());
        let (w, rest) = s.split_once('x').ok_or_else(err)?;
        // Skip the first byte of each part so a leading sign stays attached.
        let sign_after = |part: &str| -> Result<usize, ParseRectError> {
            let tail = part.get(1..).ok_or_else(err)?;
            tail.find(['+', '-']).map(|i| i + 1).ok_or_else(err)
        };
        let (h, offsets) = rest.split_at(sign_after(rest)?);
        let y_split = sign_after(offsets)?;
        let (x, y) = offsets.split_at(y_split);
        let parse = |v: &str| v.parse::<i32>().map_err(|_| err());
        let (w, h) = (parse(w)?, parse(h)?);
        if w < 0 || h < 0 {
            return Err(err());
        }
        Ok(Rect::from_xywh(parse(x)?, parse(y)?, w, h))
    }
}

/// Margins reserved along the edges of the logical screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Strut {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

impl Strut {
    pub fn new(left: i32, right: i32, top: i32, bottom: i32) -> Strut {
        Strut { left, right, top, bottom }
    }

    pub fn is_empty(&self) -> bool {
        self.left <= 0 && self.right <= 0 && self.top <= 0 && self.bottom <= 0
    }

    pub fn max(&self, other: &Strut) -> Strut {
        Strut {
            left: self.left.max(other.left),
            right: self.right.max(other.right),
            top: self.top.max(other.top),
            bottom: self.bottom.max(other.bottom),
        }
    }
}

/// The part of a frame under the pointer.
///
/// The eight compass variants are resize handles. `None` means a plain move
/// (or no edge at all); `Close` and `Contents` are hit-test results that never
/// reach the geometry code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumIter, Serialize, Deserialize)]
pub enum Edge {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
    #[default]
    None,
    Close,
    Contents,
}

impl Edge {
    pub fn is_resize(self) -> bool {
        !matches!(self, Edge::None | Edge::Close | Edge::Contents)
    }

    pub fn moves_left(self) -> bool {
        matches!(self, Edge::TopLeft | Edge::Left | Edge::BottomLeft)
    }

    pub fn moves_right(self) -> bool {
        matches!(self, Edge::TopRight | Edge::Right | Edge::BottomRight)
    }

    pub fn moves_top(self) -> bool {
        matches!(self, Edge::TopLeft | Edge::Top | Edge::TopRight)
    }

    pub fn moves_bottom(self) -> bool {
        matches!(self, Edge::BottomLeft | Edge::Bottom | Edge::BottomRight)
    }

    pub fn cursor(self) -> CursorShape {
        match self {
            Edge::TopLeft => CursorShape::TopLeftCorner,
            Edge::Top => CursorShape::TopSide,
            Edge::TopRight => CursorShape::TopRightCorner,
            Edge::Right => CursorShape::RightSide,
            Edge::BottomRight => CursorShape::BottomRightCorner,
            Edge::Bottom => CursorShape::BottomSide,
            Edge::BottomLeft => CursorShape::BottomLeftCorner,
            Edge::Left => CursorShape::LeftSide,
            Edge::None => CursorShape::Move,
            Edge::Close => CursorShape::Close,
            Edge::Contents => CursorShape::Arrow,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Serialize, Deserialize)]
pub enum CursorShape {
    Arrow,
    Move,
    Close,
    TopLeftCorner,
    TopSide,
    TopRightCorner,
    RightSide,
    BottomRightCorner,
    BottomSide,
    BottomLeftCorner,
    LeftSide,
}

/// Size constraints along one axis of one window.
///
/// An `increment` of zero is deliberate: the axis keeps whatever size it was
/// placed with and every resize of it is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionLimiter {
    pub min: i32,
    pub max: Option<i32>,
    pub base: i32,
    pub increment: i32,
}

impl Default for DimensionLimiter {
    fn default() -> Self {
        DimensionLimiter {
            min: 1,
            max: None,
            base: 0,
            increment: 1,
        }
    }
}

impl DimensionLimiter {
    pub fn fixed(&self) -> bool { self.increment == 0 }

    /// Returns the allowed size closest below `proposed`, or `None` when the
    /// axis may not be resized at all.
    pub fn limit(&self, proposed: i32) -> Option<i32> {
        if self.fixed() {
            return None;
        }
        let mut size = proposed.max(self.min).max(1);
        if let Some(max) = self.max {
            size = size.min(max.max(self.min));
        }
        let steps = (size - self.base).div_euclid(self.increment);
        let mut snapped = self.base + steps * self.increment;
        if snapped < self.min || snapped < 1 {
            let bumped = snapped + self.increment;
            if self.max.is_none_or(|max| bumped <= max) {
                snapped = bumped;
            }
        }
        Some(snapped)
    }

    /// The size as the user sees it, in increments above the base size.
    pub fn units(&self, size: i32) -> i32 {
        if self.fixed() {
            return 0;
        }
        (size - self.base).div_euclid(self.increment)
    }
}

/// Frame thickness around managed content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Decoration {
    pub border: i32,
    pub title: i32,
}

impl Decoration {
    pub fn new(border: i32, title: i32) -> Decoration { Decoration { border, title } }

    /// Position of the content inside its frame.
    pub fn content_offset(&self) -> Point { Point::new(self.border, self.border + self.title) }

    pub fn outer(&self, content: Rect) -> Rect {
        Rect {
            x_min: content.x_min - self.border,
            y_min: content.y_min - self.border - self.title,
            x_max: content.x_max + self.border,
            y_max: content.y_max + self.border,
        }
    }

    pub fn content(&self, outer: Rect) -> Rect {
        Rect::new(
            outer.x_min + self.border,
            outer.y_min + self.border + self.title,
            outer.x_max - self.border,
            outer.y_max - self.border,
        )
    }

    pub fn extra_width(&self) -> i32 { 2 * self.border }

    pub fn extra_height(&self) -> i32 { 2 * self.border + self.title }
}
