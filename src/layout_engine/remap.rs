//! Carrying windows across a monitor reconfiguration.
//!
//! Each axis is remapped on its own, relative to the origin of the area the
//! window lived on. Windows hugging an edge stay on that edge; windows that
//! span the area keep spanning it; the rest keep their share of the free
//! space.

use tracing::debug;

use super::engine::GeometryEngine;
use crate::model::{Decoration, ManagedWindow, Rect, ScreenLayout, WindowId, WindowRegistry};

/// Rounds `v` down to a multiple of `inc` (toward negative infinity).
fn floor_to_inc(v: i32, inc: i32) -> i32 { v.div_euclid(inc) * inc }

fn ceil_to_inc(v: i32, inc: i32) -> i32 { -floor_to_inc(-v, inc) }

/// Remaps a window span `(pos, size)` from an axis of extent `old` to one of
/// extent `new`. `pos` is relative to the axis origin.
pub fn remap_axis(old: i32, new: i32, pos: i32, size: i32, inc: i32) -> (i32, i32) {
    if old <= 0 || new <= 0 || old == new {
        return (pos, size);
    }
    let inc = inc.max(1);
    let (o, n) = (old as i64, new as i64);

    // Too big for the new extent altogether: fill it.
    if new < old && size >= new {
        let size = size - ceil_to_inc(size - new, inc);
        return (0, size.max(1));
    }

    let near_gap = pos as i64;
    let far_gap = o - (pos as i64 + size as i64);
    let near_close = near_gap * 20 < o;
    let far_close = far_gap * 20 < o;

    if near_close && far_close {
        let size = (size + floor_to_inc(new - old, inc)).max(1);
        return ((near_gap * n / o) as i32, size);
    }

    let mut s = size;
    if new < old && (s as i64) * 10 / 9 > n {
        let target = new * 9 / 10;
        let clipped = s - ceil_to_inc(s - target, inc);
        s = if clipped >= 1 { clipped } else { target.max(1) };
    }

    let p = if near_close {
        near_gap * n / o
    } else if far_close {
        let far = far_gap * n / o;
        n - far - s as i64
    } else {
        near_gap * (n - s as i64) / (o - size as i64)
    };
    (p as i32, s)
}

/// Remaps `rect` from `old_area` to `new_area`, one axis at a time.
pub fn remap(old_area: Rect, new_area: Rect, rect: Rect, width_inc: i32, height_inc: i32) -> Rect {
    let (x, w) = remap_axis(
        old_area.width(),
        new_area.width(),
        rect.x_min - old_area.x_min,
        rect.width(),
        width_inc,
    );
    let (y, h) = remap_axis(
        old_area.height(),
        new_area.height(),
        rect.y_min - old_area.y_min,
        rect.height(),
        height_inc,
    );
    Rect::from_xywh(new_area.x_min + x, new_area.y_min + y, w, h)
}

/// New geometry for one window after a screen change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Remapped {
    pub id: WindowId,
    pub content: Rect,
    /// Remapped pre-fullscreen rect, for fullscreen windows.
    pub saved: Option<Rect>,
}

pub struct ScreenRemapper;

impl ScreenRemapper {
    /// Computes new geometry for every managed window. Nothing is applied
    /// here, so every window is remapped from the same pre-change layouts.
    pub fn plan(
        engine: &GeometryEngine,
        old: &ScreenLayout,
        new: &ScreenLayout,
        registry: &WindowRegistry,
    ) -> Vec<Remapped> {
        registry
            .iter()
            .map(|window| {
                let remapped = if window.fullscreen {
                    Remapped {
                        id: window.id,
                        content: Self::pair(
                            old.monitors(),
                            new.monitors(),
                            new.primary(),
                            window.content,
                        ),
                        saved: window.saved_content.map(|saved| {
                            let decoration = window.frame.map(|_| *engine.decoration());
                            Self::remap_rect(engine, old, new, window, decoration, saved)
                        }),
                    }
                } else {
                    Remapped {
                        id: window.id,
                        content: Self::remap_rect(
                            engine,
                            old,
                            new,
                            window,
                            window.decoration(engine.decoration()),
                            window.content,
                        ),
                        saved: None,
                    }
                };
                debug!(
                    window = %window.id,
                    from = %window.content,
                    to = %remapped.content,
                    "remapped"
                );
                remapped
            })
            .collect()
    }

    fn remap_rect(
        engine: &GeometryEngine,
        old: &ScreenLayout,
        new: &ScreenLayout,
        window: &ManagedWindow,
        decoration: Option<Decoration>,
        content: Rect,
    ) -> Rect {
        let outer = decoration.map_or(content, |d| d.outer(content));
        let old_areas = old.areas_for(window);
        let new_areas = new.areas_for(window);
        let fallback = if window.has_strut() { new.primary() } else { new.primary_area() };

        let Some(i) = ScreenLayout::best_area(&old_areas, &outer) else { return content };
        let old_area = old_areas[i];
        let new_area = new_areas.get(i).copied().unwrap_or(fallback);

        let outer = remap(
            old_area,
            new_area,
            outer,
            window.width.increment,
            window.height.increment,
        );
        let content = decoration.map_or(outer, |d| d.content(outer));
        engine.ensure_visible(new, window, content)
    }

    /// The new monitor paired with whichever old monitor holds `rect`.
    fn pair(old: &[Rect], new: &[Rect], fallback: Rect, rect: Rect) -> Rect {
        ScreenLayout::best_area(old, &rect)
            .and_then(|i| new.get(i).copied())
            .unwrap_or(fallback)
    }
}
