//! Property-based invariant tests for window geometry.
//!
//! 1. Sanitizing a move is idempotent.
//! 2. A sanitized window always keeps part of its frame on a monitor.
//! 3. Limited sizes sit on the increment grid above the base size.
//! 4. An axis with a zero increment never changes size or position.
//! 5. Remapping onto an identical area changes nothing.

use ledge_wm::layout_engine::{GeometryEngine, GeometrySettings, Proposal, remap, remap_axis};
use ledge_wm::model::{Decoration, Edge, ManagedWindow, Rect, ScreenLayout, SizeHints, WindowId};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn engine(edge_resistance: i32) -> GeometryEngine {
    GeometryEngine::new(GeometrySettings {
        edge_resistance,
        decoration: Decoration::new(2, 16),
    })
}

fn framed(content: Rect, hints: &SizeHints) -> ManagedWindow {
    let (width, height) = hints.limiters();
    ManagedWindow {
        frame: Some(WindowId(0x0100_0001)),
        width,
        height,
        ..ManagedWindow::new(WindowId(1), content)
    }
}

fn monitor_strategy() -> impl Strategy<Value = ScreenLayout> {
    (200i32..=2000, 200i32..=1500).prop_map(|(w, h)| {
        let root = Rect::from_xywh(0, 0, w, h);
        ScreenLayout::new(root, vec![root])
    })
}

/// One to three monitors side by side, all the same height.
fn row_strategy() -> impl Strategy<Value = ScreenLayout> {
    (prop::collection::vec(200i32..=1200, 1..=3), 200i32..=1200).prop_map(|(widths, h)| {
        let mut x = 0;
        let monitors: Vec<Rect> = widths
            .iter()
            .map(|&w| {
                let m = Rect::from_xywh(x, 0, w, h);
                x += w;
                m
            })
            .collect();
        ScreenLayout::new(Rect::from_xywh(0, 0, x, h), monitors)
    })
}

/// One to three monitors of any size at any offset; they may overlap, abut
/// or leave gaps.
fn staggered_strategy() -> impl Strategy<Value = ScreenLayout> {
    prop::collection::vec((0i32..=1500, 0i32..=1500, 100i32..=1200, 100i32..=1200), 1..=3)
        .prop_map(|specs| {
            let monitors: Vec<Rect> =
                specs.into_iter().map(|(x, y, w, h)| Rect::from_xywh(x, y, w, h)).collect();
            let root = monitors.iter().fold(monitors[0], |acc, m| acc.union(m));
            ScreenLayout::new(root, monitors)
        })
}

fn content_strategy() -> impl Strategy<Value = Rect> {
    (-3000i32..=5000, -3000i32..=5000, 40i32..=900, 40i32..=900)
        .prop_map(|(x, y, w, h)| Rect::from_xywh(x, y, w, h))
}

fn resize_edge_strategy() -> impl Strategy<Value = Edge> {
    prop::sample::select(vec![
        Edge::TopLeft,
        Edge::Top,
        Edge::TopRight,
        Edge::Right,
        Edge::BottomRight,
        Edge::Bottom,
        Edge::BottomLeft,
        Edge::Left,
    ])
}

fn assert_idempotent(
    engine: &GeometryEngine,
    layout: &ScreenLayout,
    start: Rect,
    target: Rect,
) -> Result<(), TestCaseError> {
    let mut window = framed(start, &SizeHints::default());
    let first = engine.sanitize(layout, &window, Edge::None, Proposal::from(target));
    window.content = first.rect;
    let second = engine.sanitize(layout, &window, Edge::None, Proposal::from(first.rect));
    prop_assert_eq!(second.rect, first.rect, "sanitize moved an already sanitized rect");
    prop_assert!(!second.changed);
    Ok(())
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Sanitize idempotence
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn sanitize_idempotent_on_one_monitor(
        layout in monitor_strategy(),
        resistance in 0i32..=16,
        start in content_strategy(),
        target in content_strategy(),
    ) {
        assert_idempotent(&engine(resistance), &layout, start, target)?;
    }

    #[test]
    fn sanitize_idempotent_on_a_row(
        layout in row_strategy(),
        start in content_strategy(),
        target in content_strategy(),
    ) {
        assert_idempotent(&engine(0), &layout, start, target)?;
    }

    #[test]
    fn sanitize_idempotent_on_staggered_monitors(
        layout in staggered_strategy(),
        resistance in 0i32..=16,
        start in content_strategy(),
        target in content_strategy(),
    ) {
        assert_idempotent(&engine(resistance), &layout, start, target)?;
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Visibility
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn sanitized_frame_stays_on_screen(
        layout in staggered_strategy(),
        resistance in 0i32..=16,
        start in content_strategy(),
        target in content_strategy(),
    ) {
        let engine = engine(resistance);
        let window = framed(start, &SizeHints::default());
        let out = engine.sanitize(&layout, &window, Edge::None, Proposal::from(target));
        let outer = engine.decoration().outer(out.rect);
        prop_assert!(
            ScreenLayout::is_visible(&outer, layout.monitors()),
            "frame {:?} left every monitor",
            outer
        );
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Increment alignment
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn limited_sizes_are_aligned(
        min in 1i32..=200,
        base in 0i32..=100,
        inc in 1i32..=30,
        max in prop::option::of(201i32..=1000),
        proposed in -100i32..=2000,
    ) {
        let hints = SizeHints {
            min: Some((min, min)),
            max: max.map(|m| (m, m)),
            base: Some((base, base)),
            increment: Some((inc, inc)),
            ..SizeHints::default()
        };
        let (limiter, _) = hints.limiters();
        let size = limiter.limit(proposed);
        prop_assert!(size.is_some());
        let size = size.unwrap_or_default();
        prop_assert_eq!((size - limiter.base).rem_euclid(limiter.increment), 0);
        if let Some(max) = limiter.max {
            prop_assert!(size <= max, "size {} above max {}", size, max);
        }
    }

    #[test]
    fn resized_windows_land_on_the_grid(
        layout in monitor_strategy(),
        base in 0i32..=40,
        inc in 1i32..=30,
        edge in resize_edge_strategy(),
        start in content_strategy(),
        target in content_strategy(),
    ) {
        let hints = SizeHints {
            base: Some((base, base)),
            increment: Some((inc, inc)),
            ..SizeHints::default()
        };
        let window = framed(start, &hints);
        let out = engine(0).sanitize(&layout, &window, edge, Proposal::from(target));
        let (width, height) = (window.width, window.height);
        if edge.moves_left() || edge.moves_right() {
            prop_assert_eq!((out.rect.width() - width.base).rem_euclid(width.increment), 0);
        }
        if edge.moves_top() || edge.moves_bottom() {
            prop_assert_eq!((out.rect.height() - height.base).rem_euclid(height.increment), 0);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Zero-increment immutability
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn fixed_width_is_never_resized(
        layout in monitor_strategy(),
        fixed in 50i32..=400,
        edge in resize_edge_strategy(),
        start in content_strategy(),
        target in content_strategy(),
    ) {
        let hints = SizeHints {
            min: Some((fixed, 1)),
            max: Some((fixed, 10_000)),
            ..SizeHints::default()
        };
        let window = framed(start, &hints);
        prop_assert!(window.width.fixed());
        let out = engine(0).sanitize(&layout, &window, edge, Proposal::from(target));
        prop_assert_eq!(out.rect.width(), start.width());
        prop_assert_eq!(out.rect.x_min, start.x_min);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Remap identity
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn remap_onto_same_area_is_identity(
        area in (0i32..=2000, 0i32..=2000, 1i32..=3000, 1i32..=3000)
            .prop_map(|(x, y, w, h)| Rect::from_xywh(x, y, w, h)),
        rect in content_strategy(),
        inc in 1i32..=20,
    ) {
        prop_assert_eq!(remap(area, area, rect, inc, inc), rect);
    }

    #[test]
    fn remap_axis_same_extent_is_identity(
        extent in 1i32..=5000,
        pos in -5000i32..=5000,
        size in 1i32..=5000,
        inc in 1i32..=20,
    ) {
        prop_assert_eq!(remap_axis(extent, extent, pos, size, inc), (pos, size));
    }
}
