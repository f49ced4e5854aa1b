//! Pointer gesture state and the pure geometry behind it.

use std::fmt;

use crate::layout_engine::Proposal;
use crate::model::{Decoration, Edge, Point, Rect, WindowId};

/// An interactive move or resize in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Drag {
    pub target: WindowId,
    pub edge: Edge,
    pub button: u8,
    /// Pointer position when the gesture started.
    pub anchor: Point,
    /// Content rect when the gesture started.
    pub start: Rect,
}

impl Drag {
    /// Where the window should go with the pointer at `pointer`. Only the
    /// sides named by the edge move; a plain move carries the whole rect.
    pub fn proposal(&self, pointer: Point) -> Proposal {
        let dx = pointer.x - self.anchor.x;
        let dy = pointer.y - self.anchor.y;
        let s = self.start;
        if !self.edge.is_resize() {
            return Proposal {
                x: s.x_min + dx,
                y: s.y_min + dy,
                width: Some(s.width()),
                height: Some(s.height()),
            };
        }

        let (mut x0, mut y0, mut x1, mut y1) = (s.x_min, s.y_min, s.x_max, s.y_max);
        if self.edge.moves_left() {
            x0 = (x0 + dx).min(x1 - 1);
        }
        if self.edge.moves_right() {
            x1 = (x1 + dx).max(x0 + 1);
        }
        if self.edge.moves_top() {
            y0 = (y0 + dy).min(y1 - 1);
        }
        if self.edge.moves_bottom() {
            y1 = (y1 + dy).max(y0 + 1);
        }
        Proposal {
            x: x0,
            y: y0,
            width: Some(x1 - x0),
            height: Some(y1 - y0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Dragging(Drag),
    MenuOpen { origin: Point, button: u8 },
    PendingClose { target: WindowId, button: u8 },
    PendingHide { target: WindowId, button: u8 },
}

impl InteractionState {
    pub fn is_idle(&self) -> bool { matches!(self, InteractionState::Idle) }

    pub fn target(&self) -> Option<WindowId> {
        match self {
            InteractionState::Dragging(drag) => Some(drag.target),
            InteractionState::PendingClose { target, .. }
            | InteractionState::PendingHide { target, .. } => Some(*target),
            InteractionState::Idle | InteractionState::MenuOpen { .. } => None,
        }
    }
}

impl fmt::Display for InteractionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InteractionState::Idle => write!(f, "idle"),
            InteractionState::Dragging(drag) => {
                write!(f, "dragging {} by {:?} with button {}", drag.target, drag.edge, drag.button)
            }
            InteractionState::MenuOpen { origin, .. } => {
                write!(f, "menu open at {},{}", origin.x, origin.y)
            }
            InteractionState::PendingClose { target, .. } => write!(f, "pending close of {target}"),
            InteractionState::PendingHide { target, .. } => write!(f, "pending hide of {target}"),
        }
    }
}

/// Which part of a frame with outer rect `outer` is under `point`.
///
/// Border strips resize; their ends, `max(title, 2 * border)` long, resize
/// diagonally. The title-height square at the left of the title bar is the
/// close box, the rest of the title bar moves. Anything else, including
/// points outside the frame, is `Contents`.
pub fn hit_test(decoration: &Decoration, outer: Rect, point: Point) -> Edge {
    if !outer.contains(point) {
        return Edge::Contents;
    }
    let (b, t) = (decoration.border, decoration.title);
    let x = point.x - outer.x_min;
    let y = point.y - outer.y_min;
    let (w, h) = (outer.width(), outer.height());
    let corner = t.max(2 * b);

    let left = x < b;
    let right = x >= w - b;
    let top = y < b;
    let bottom = y >= h - b;

    if left || right {
        let vertical = if y < corner {
            Some(true)
        } else if y >= h - corner {
            Some(false)
        } else {
            None
        };
        return match (left, vertical) {
            (true, Some(true)) => Edge::TopLeft,
            (true, Some(false)) => Edge::BottomLeft,
            (true, None) => Edge::Left,
            (false, Some(true)) => Edge::TopRight,
            (false, Some(false)) => Edge::BottomRight,
            (false, None) => Edge::Right,
        };
    }
    if top || bottom {
        return if x < corner {
            if top { Edge::TopLeft } else { Edge::BottomLeft }
        } else if x >= w - corner {
            if top { Edge::TopRight } else { Edge::BottomRight }
        } else if top {
            Edge::Top
        } else {
            Edge::Bottom
        };
    }
    if y < b + t {
        if x < b + t {
            return Edge::Close;
        }
        return Edge::None;
    }
    Edge::Contents
}

/// Geometry of the hidden-window menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuGeometry {
    pub origin: Point,
    pub row_height: i32,
    pub width: i32,
}

impl MenuGeometry {
    pub const WIDTH: i32 = 240;

    pub fn new(origin: Point, row_height: i32) -> MenuGeometry {
        MenuGeometry {
            origin,
            row_height: row_height.max(12),
            width: Self::WIDTH,
        }
    }

    pub fn item_at(&self, point: Point, count: usize) -> Option<usize> {
        let x = point.x - self.origin.x;
        let y = point.y - self.origin.y;
        if x < 0 || x >= self.width || y < 0 {
            return None;
        }
        let row = (y / self.row_height) as usize;
        (row < count).then_some(row)
    }
}
