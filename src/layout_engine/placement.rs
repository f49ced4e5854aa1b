//! Initial placement for windows that did not ask for a position.

use super::engine::GeometryEngine;
use crate::model::{ManagedWindow, Point, Rect, ScreenLayout, WindowRegistry};

const CASCADE_STEP: i32 = 24;

/// Picks a content rect for a newly managed window.
///
/// Transients are centred over their leader. Everything else cascades down
/// and to the right from the top-left of the primary area, skipping origins
/// already taken by other windows.
pub fn place(
    engine: &GeometryEngine,
    layout: &ScreenLayout,
    registry: &WindowRegistry,
    window: &ManagedWindow,
) -> Rect {
    let decoration = window.decoration(engine.decoration());
    let outer = decoration.map_or(window.content, |d| d.outer(window.content));
    let to_content = |outer_origin: Point| {
        let offset = decoration.map(|d| d.content_offset()).unwrap_or_default();
        window.content.moved_to(outer_origin.x + offset.x, outer_origin.y + offset.y)
    };

    if let Some(leader) = window.transient_for.and_then(|id| registry.get(id)) {
        let c = leader.content.center();
        return to_content(Point::new(c.x - outer.width() / 2, c.y - outer.height() / 2));
    }

    let area = layout.primary_area();
    let taken: Vec<Point> = registry
        .iter()
        .filter(|w| w.id != window.id && !w.hidden)
        .map(|w| w.outer(engine.decoration()).origin())
        .collect();

    let step = CASCADE_STEP.max(engine.decoration().title);
    let fits = |p: Point| p.x + outer.width() <= area.x_max && p.y + outer.height() <= area.y_max;
    let mut origin = Point::new(area.x_min, area.y_min);
    for _ in 0..=taken.len() {
        if !taken.contains(&origin) {
            break;
        }
        let next = Point::new(origin.x + step, origin.y + step);
        if !fits(next) {
            origin = Point::new(area.x_min, area.y_min);
            break;
        }
        origin = next;
    }
    to_content(origin)
}
