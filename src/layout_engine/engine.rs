//! Geometry sanitization.
//!
//! Every rectangle a window is given passes through [`GeometryEngine`] first:
//! user drags, client requests, placement and re-homing after screen or strut
//! changes.

use tracing::trace;

use crate::common::config::Settings;
use crate::model::{Decoration, DimensionLimiter, Edge, ManagedWindow, Rect, ScreenLayout};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometrySettings {
    pub edge_resistance: i32,
    pub decoration: Decoration,
}

impl GeometrySettings {
    pub fn from_settings(settings: &Settings) -> GeometrySettings {
        GeometrySettings {
            edge_resistance: settings.geometry.edge_resistance.max(0),
            decoration: Decoration::new(
                settings.decoration.border_width,
                settings.decoration.title_height,
            ),
        }
    }
}

/// A requested content rectangle. Missing sizes mean "keep the current one".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Proposal {
    pub x: i32,
    pub y: i32,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

impl Proposal {
    pub fn at(x: i32, y: i32) -> Proposal {
        Proposal { x, y, width: None, height: None }
    }
}

impl From<Rect> for Proposal {
    fn from(r: Rect) -> Proposal {
        Proposal {
            x: r.x_min,
            y: r.y_min,
            width: Some(r.width()),
            height: Some(r.height()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sanitized {
    /// Content rect the window should get.
    pub rect: Rect,
    /// Whether `rect` differs from the window's current content rect.
    pub changed: bool,
}

/// Result of fitting one axis through its limiter.
#[derive(Debug, Clone, Copy)]
struct Axis {
    pos: i32,
    size: i32,
    rejected: bool,
}

impl Axis {
    fn resize(
        limiter: &DimensionLimiter,
        pos: i32,
        size: i32,
        leading_moves: bool,
        current: (i32, i32),
    ) -> Axis {
        match limiter.limit(size) {
            Some(limited) => Axis {
                // The trailing side stays where the proposal put it.
                pos: if leading_moves { pos + size - limited } else { pos },
                size: limited,
                rejected: false,
            },
            None => Axis {
                pos: current.0,
                size: current.1,
                rejected: true,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeometryEngine {
    settings: GeometrySettings,
}

impl GeometryEngine {
    pub fn new(settings: GeometrySettings) -> GeometryEngine { GeometryEngine { settings } }

    pub fn settings(&self) -> &GeometrySettings { &self.settings }

    pub fn decoration(&self) -> &Decoration { &self.settings.decoration }

    pub fn set_settings(&mut self, settings: GeometrySettings) { self.settings = settings; }

    pub fn sanitize(
        &self,
        layout: &ScreenLayout,
        window: &ManagedWindow,
        edge: Edge,
        proposal: Proposal,
    ) -> Sanitized {
        let current = window.content;
        let width = proposal.width.unwrap_or(current.width()).max(1);
        let height = proposal.height.unwrap_or(current.height()).max(1);

        let (h_axis, v_axis) = if edge.is_resize() {
            (
                Axis::resize(
                    &window.width,
                    proposal.x,
                    width,
                    edge.moves_left(),
                    (current.x_min, current.width()),
                ),
                Axis::resize(
                    &window.height,
                    proposal.y,
                    height,
                    edge.moves_top(),
                    (current.y_min, current.height()),
                ),
            )
        } else {
            (
                Axis { pos: proposal.x, size: width, rejected: false },
                Axis { pos: proposal.y, size: height, rejected: false },
            )
        };

        let mut rect = Rect::from_xywh(h_axis.pos, v_axis.pos, h_axis.size, v_axis.size);
        rect = self.ensure_visible(layout, window, rect);
        if edge == Edge::None {
            rect = self.resist(layout, window, rect);
        }

        if h_axis.rejected {
            rect = Rect::from_xywh(current.x_min, rect.y_min, current.width(), rect.height());
        }
        if v_axis.rejected {
            rect = Rect::from_xywh(rect.x_min, current.y_min, rect.width(), current.height());
        }

        let changed = rect != current;
        trace!(window = %window.id, ?edge, %rect, changed, "sanitized");
        Sanitized { rect, changed }
    }

    /// Moves `rect` (a content rect for `window`) by the smallest amount that
    /// leaves at least one pixel of its frame on some usable area.
    pub fn ensure_visible(
        &self,
        layout: &ScreenLayout,
        window: &ManagedWindow,
        rect: Rect,
    ) -> Rect {
        let outer = self.outer_of(window, rect);
        let areas = layout.areas_for(window);
        if ScreenLayout::is_visible(&outer, &areas) {
            return rect;
        }
        let best = areas
            .iter()
            .map(|area| {
                (
                    axis_delta(outer.x_min, outer.x_max, area.x_min, area.x_max),
                    axis_delta(outer.y_min, outer.y_max, area.y_min, area.y_max),
                )
            })
            .min_by_key(|(dx, dy)| dx.abs().max(dy.abs()));
        match best {
            Some((dx, dy)) => {
                trace!(window = %window.id, dx, dy, "pulled back on screen");
                rect.translate(dx, dy)
            }
            None => rect,
        }
    }

    /// Pulls edges that overshot a monitor edge by a few pixels back flush.
    ///
    /// Passes repeat until nothing moves, since a shift along one axis can
    /// bring the frame alongside another monitor. A layout that never settles,
    /// or settles off every area, leaves `rect` as it was.
    fn resist(&self, layout: &ScreenLayout, window: &ManagedWindow, rect: Rect) -> Rect {
        let threshold = self.settings.edge_resistance;
        if threshold <= 0 {
            return rect;
        }
        let areas = layout.areas_for(window);
        let start = self.outer_of(window, rect);
        let mut outer = start;

        for _ in 0..MAX_RESIST_PASSES {
            let next = resist_pass(&areas, outer, threshold);
            if next == outer {
                if !ScreenLayout::is_visible(&outer, &areas) {
                    break;
                }
                return rect.translate(outer.x_min - start.x_min, outer.y_min - start.y_min);
            }
            outer = next;
        }
        trace!(window = %window.id, "edge resistance did not settle");
        rect
    }

    fn outer_of(&self, window: &ManagedWindow, content: Rect) -> Rect {
        match window.decoration(&self.settings.decoration) {
            Some(d) => d.outer(content),
            None => content,
        }
    }
}

/// Shift along one axis that brings `[lo, hi)` to overlap `[min, max)` by at
/// least one pixel.
fn axis_delta(lo: i32, hi: i32, min: i32, max: i32) -> i32 {
    if lo >= max {
        max - 1 - lo
    } else if hi <= min {
        min + 1 - hi
    } else {
        0
    }
}

const MAX_RESIST_PASSES: usize = 8;

/// One top/bottom sweep followed by one left/right sweep over `areas`.
fn resist_pass(areas: &[Rect], mut outer: Rect, threshold: i32) -> Rect {
    for area in areas {
        if spans_overlap(outer.x_min, outer.x_max, area.x_min, area.x_max)
            && outer.height() <= area.height()
        {
            let dy = overshoot(outer.y_min, outer.y_max, area.y_min, area.y_max, threshold);
            outer = outer.translate(0, dy);
        }
    }
    for area in areas {
        if spans_overlap(outer.y_min, outer.y_max, area.y_min, area.y_max)
            && outer.width() <= area.width()
        {
            let dx = overshoot(outer.x_min, outer.x_max, area.x_min, area.x_max, threshold);
            outer = outer.translate(dx, 0);
        }
    }
    outer
}

fn spans_overlap(lo: i32, hi: i32, min: i32, max: i32) -> bool { lo < max && hi > min }

/// Shift that undoes a small outward crossing of `[min, max)` by `[lo, hi)`.
fn overshoot(lo: i32, hi: i32, min: i32, max: i32, threshold: i32) -> i32 {
    let before = min - lo;
    if before > 0 && before <= threshold {
        return before;
    }
    let after = hi - max;
    if after > 0 && after <= threshold {
        return -after;
    }
    0
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{Strut, WindowId};

    fn engine(resistance: i32) -> GeometryEngine {
        GeometryEngine::new(GeometrySettings {
            edge_resistance: resistance,
            decoration: Decoration::new(2, 10),
        })
    }

    fn single() -> ScreenLayout {
        ScreenLayout::new(Rect::from_xywh(0, 0, 1000, 800), vec![Rect::from_xywh(0, 0, 1000, 800)])
    }

    fn framed(content: Rect) -> ManagedWindow {
        let mut w = ManagedWindow::new(WindowId(1), content);
        w.frame = Some(WindowId(2));
        w
    }

    #[test]
    fn move_keeps_size_when_proposal_omits_it() {
        let w = framed(Rect::from_xywh(100, 100, 300, 200));
        let out = engine(0).sanitize(&single(), &w, Edge::None, Proposal::at(150, 160));
        assert_eq!(out.rect, Rect::from_xywh(150, 160, 300, 200));
        assert!(out.changed);

        let same = engine(0).sanitize(&single(), &w, Edge::None, w.content.into());
        assert!(!same.changed);
    }

    #[test]
    fn left_resize_snaps_and_keeps_right_edge() {
        let mut w = framed(Rect::from_xywh(100, 100, 300, 200));
        w.width = DimensionLimiter { min: 20, max: None, base: 4, increment: 10 };
        // Drag the left edge 37px to the left.
        let proposal = Proposal { x: 63, y: 100, width: Some(337), height: Some(200) };
        let out = engine(0).sanitize(&single(), &w, Edge::Left, proposal);
        assert_eq!(out.rect.width(), 334);
        assert_eq!(out.rect.x_max, 400);
    }

    #[test]
    fn fixed_axis_ignores_resize_but_other_axis_follows() {
        let mut w = framed(Rect::from_xywh(100, 100, 300, 200));
        w.width = DimensionLimiter { min: 300, max: Some(300), base: 300, increment: 0 };
        let proposal = Proposal { x: 50, y: 100, width: Some(350), height: Some(260) };
        let out = engine(0).sanitize(&single(), &w, Edge::BottomLeft, proposal);
        assert_eq!(out.rect, Rect::from_xywh(100, 100, 300, 260));
    }

    #[test]
    fn offscreen_window_comes_back_by_one_pixel() {
        let w = framed(Rect::from_xywh(100, 100, 300, 200));
        let out = engine(0).sanitize(&single(), &w, Edge::None, Proposal::at(2000, 100));
        // Frame left edge (x - border) lands on the last column.
        assert_eq!(out.rect.x_min - 2, 999);

        let out = engine(0).sanitize(&single(), &w, Edge::None, Proposal::at(-900, -900));
        let outer = Decoration::new(2, 10).outer(out.rect);
        assert_eq!((outer.x_max, outer.y_max), (1, 1));
    }

    #[test]
    fn visibility_picks_the_closest_monitor() {
        let layout = ScreenLayout::new(
            Rect::from_xywh(0, 0, 3000, 1000),
            vec![Rect::from_xywh(0, 0, 1000, 1000), Rect::from_xywh(2000, 0, 1000, 1000)],
        );
        let w = ManagedWindow::new(WindowId(1), Rect::from_xywh(0, 0, 100, 100));
        let out = engine(0).sanitize(&layout, &w, Edge::None, Proposal::at(1700, 10));
        assert_eq!(out.rect.x_min, 1901);
        let out = engine(0).sanitize(&layout, &w, Edge::None, Proposal::at(1200, 10));
        assert_eq!(out.rect.x_min, 999);
    }

    #[test]
    fn resistance_snaps_small_overshoot_only() {
        let w = ManagedWindow::new(WindowId(1), Rect::from_xywh(0, 0, 100, 100));
        let e = engine(16);
        assert_eq!(e.sanitize(&single(), &w, Edge::None, Proposal::at(-10, 50)).rect.x_min, 0);
        assert_eq!(e.sanitize(&single(), &w, Edge::None, Proposal::at(-17, 50)).rect.x_min, -17);
        assert_eq!(e.sanitize(&single(), &w, Edge::None, Proposal::at(910, 50)).rect.x_min, 900);
        assert_eq!(e.sanitize(&single(), &w, Edge::None, Proposal::at(50, 705)).rect.y_min, 700);
    }

    #[test]
    fn resistance_is_off_for_resizes() {
        let w = ManagedWindow::new(WindowId(1), Rect::from_xywh(0, 0, 100, 100));
        let proposal = Proposal { x: -10, y: 50, width: Some(110), height: Some(100) };
        let out = engine(16).sanitize(&single(), &w, Edge::Left, proposal);
        assert_eq!(out.rect.x_min, -10);
    }

    #[test]
    fn resistance_respects_struts_unless_window_has_its_own() {
        let layout = single().with_strut(Strut::new(0, 0, 30, 0));
        let w = ManagedWindow::new(WindowId(1), Rect::from_xywh(0, 100, 100, 100));
        let out = engine(16).sanitize(&layout, &w, Edge::None, Proposal::at(50, 20));
        assert_eq!(out.rect.y_min, 30);

        let mut panel = ManagedWindow::new(WindowId(3), Rect::from_xywh(0, 0, 1000, 30));
        panel.strut = Strut::new(0, 0, 30, 0);
        let out = engine(16).sanitize(&layout, &panel, Edge::None, Proposal::at(0, 0));
        assert_eq!(out.rect.y_min, 0);
    }

    #[test]
    fn resistance_settles_across_staggered_monitors() {
        let layout = ScreenLayout::new(
            Rect::from_xywh(0, 0, 2100, 1500),
            vec![
                Rect::from_xywh(0, 0, 1000, 1000),
                Rect::from_xywh(1100, 0, 1000, 1000),
                Rect::from_xywh(1195, 1000, 105, 500),
            ],
        );
        let mut w = ManagedWindow::new(WindowId(1), Rect::from_xywh(0, 0, 100, 110));
        let e = engine(16);
        // Snapping onto the second monitor's left edge lands the window over
        // the small monitor's top edge, which must be taken in the same call.
        let once = e.sanitize(&layout, &w, Edge::None, Proposal::at(1090, 990));
        assert_eq!(once.rect, Rect::from_xywh(1100, 1000, 100, 110));

        w.content = once.rect;
        let twice = e.sanitize(&layout, &w, Edge::None, once.rect.into());
        assert_eq!(twice.rect, once.rect);
        assert!(!twice.changed);
    }
}
