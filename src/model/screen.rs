use serde::{Deserialize, Serialize};

use super::geometry::{Point, Rect, Strut};
use super::window::ManagedWindow;

/// The monitors making up the one logical screen, plus the space windows
/// have reserved along its edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenLayout {
    root: Rect,
    monitors: Vec<Rect>,
    strut: Strut,
}

impl ScreenLayout {
    /// Monitors may overlap or abut. An empty list means the whole root is
    /// one monitor.
    pub fn new(root: Rect, monitors: Vec<Rect>) -> ScreenLayout {
        let mut monitors: Vec<Rect> = monitors.into_iter().filter(|m| !m.is_empty()).collect();
        if monitors.is_empty() {
            monitors.push(root);
        }
        ScreenLayout { root, monitors, strut: Strut::default() }
    }

    pub fn with_strut(mut self, strut: Strut) -> ScreenLayout {
        self.strut = strut;
        self
    }

    pub fn root(&self) -> Rect { self.root }

    pub fn monitors(&self) -> &[Rect] { &self.monitors }

    pub fn strut(&self) -> Strut { self.strut }

    /// Returns whether the strut actually changed.
    pub fn set_strut(&mut self, strut: Strut) -> bool {
        if self.strut == strut {
            return false;
        }
        self.strut = strut;
        true
    }

    /// Largest monitor; ties go to the lowest y, then the lowest x.
    pub fn primary(&self) -> Rect { primary_of(&self.monitors).unwrap_or(self.root) }

    /// The root minus reserved edges.
    pub fn workarea(&self) -> Rect {
        let area = self.root.inset(&self.strut);
        if area.is_empty() { self.root } else { area }
    }

    pub fn visible_areas(&self, exclude_strut: bool) -> Vec<Rect> {
        if !exclude_strut {
            return self.monitors.clone();
        }
        let usable = self.root.inset(&self.strut);
        let areas: Vec<Rect> = self
            .monitors
            .iter()
            .map(|m| m.intersection(&usable))
            .filter(|a| !a.is_empty())
            .collect();
        if areas.is_empty() { self.monitors.clone() } else { areas }
    }

    /// Areas a window must stay visible in. A window that reserves space of
    /// its own may sit on the reserved edge.
    pub fn areas_for(&self, window: &ManagedWindow) -> Vec<Rect> {
        self.visible_areas(!window.has_strut())
    }

    /// Primary area with struts excluded, where new windows go.
    pub fn primary_area(&self) -> Rect {
        primary_of(&self.visible_areas(true)).unwrap_or(self.root)
    }

    pub fn monitor_at(&self, point: Point) -> Option<Rect> {
        self.monitors.iter().copied().find(|m| m.contains(point))
    }

    pub fn is_visible(rect: &Rect, areas: &[Rect]) -> bool {
        areas.iter().any(|a| a.intersects(rect))
    }

    /// Index of the area sharing the most with `rect`, or the nearest one when
    /// it overlaps none.
    pub fn best_area(areas: &[Rect], rect: &Rect) -> Option<usize> {
        let overlapping = areas
            .iter()
            .enumerate()
            .map(|(i, a)| (i, a.intersection(rect).area()))
            .filter(|&(_, area)| area > 0)
            .max_by(|(ia, a), (ib, b)| a.cmp(b).then(ib.cmp(ia)));
        if let Some((i, _)) = overlapping {
            return Some(i);
        }
        let c = rect.center();
        areas
            .iter()
            .enumerate()
            .min_by_key(|(_, a)| {
                let dx = distance_outside(c.x, a.x_min, a.x_max);
                let dy = distance_outside(c.y, a.y_min, a.y_max);
                dx as i64 * dx as i64 + dy as i64 * dy as i64
            })
            .map(|(i, _)| i)
    }
}

fn distance_outside(v: i32, min: i32, max: i32) -> i32 {
    if v < min {
        min - v
    } else if v >= max {
        v - max + 1
    } else {
        0
    }
}

fn primary_of(areas: &[Rect]) -> Option<Rect> {
    areas.iter().copied().min_by(|a, b| {
        b.area()
            .cmp(&a.area())
            .then(a.y_min.cmp(&b.y_min))
            .then(a.x_min.cmp(&b.x_min))
    })
}
