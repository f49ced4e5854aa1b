//! The single owner of every managed-window record.
//!
//! Other components hold only `WindowId`s and resolve them here on each use;
//! a lookup miss means the window is gone.

use tracing::trace;

use super::geometry::Strut;
use super::window::{ManagedWindow, WindowId};
use crate::common::collections::HashMap;

#[derive(Debug, Default)]
pub struct WindowRegistry {
    windows: HashMap<WindowId, ManagedWindow>,
    frames: HashMap<WindowId, WindowId>,
    /// Bottom to top.
    stacking: Vec<WindowId>,
}

impl WindowRegistry {
    pub fn new() -> WindowRegistry { WindowRegistry::default() }

    /// Adds a record on top of the stack, replacing any record for the same id.
    pub fn insert(&mut self, window: ManagedWindow) {
        let id = window.id;
        if self.windows.contains_key(&id) {
            self.remove(id);
        }
        if let Some(frame) = window.frame {
            self.frames.insert(frame, id);
        }
        self.stacking.push(id);
        self.windows.insert(id, window);
    }

    /// Removes a record and every reference to it.
    pub fn remove(&mut self, id: WindowId) -> Option<ManagedWindow> {
        let window = self.windows.remove(&id)?;
        if let Some(frame) = window.frame {
            self.frames.remove(&frame);
        }
        self.stacking.retain(|&w| w != id);
        for other in self.windows.values_mut() {
            if other.transient_for == Some(id) {
                trace!(window = %other.id, leader = %id, "dropping transient link");
                other.transient_for = None;
            }
        }
        Some(window)
    }

    /// Records a frame created after insertion.
    pub fn set_frame(&mut self, id: WindowId, frame: Option<WindowId>) {
        let Some(window) = self.windows.get_mut(&id) else { return };
        if let Some(old) = window.frame.take() {
            self.frames.remove(&old);
        }
        window.frame = frame;
        if let Some(frame) = frame {
            self.frames.insert(frame, id);
        }
    }

    pub fn get(&self, id: WindowId) -> Option<&ManagedWindow> { self.windows.get(&id) }

    pub fn get_mut(&mut self, id: WindowId) -> Option<&mut ManagedWindow> {
        self.windows.get_mut(&id)
    }

    pub fn contains(&self, id: WindowId) -> bool { self.windows.contains_key(&id) }

    pub fn len(&self) -> usize { self.windows.len() }

    pub fn is_empty(&self) -> bool { self.windows.is_empty() }

    /// Resolves a client or frame handle to the managed client.
    pub fn owner_of(&self, handle: WindowId) -> Option<WindowId> {
        if self.windows.contains_key(&handle) {
            return Some(handle);
        }
        self.frames.get(&handle).copied()
    }

    pub fn is_frame(&self, handle: WindowId) -> bool { self.frames.contains_key(&handle) }

    /// Records in stacking order, bottom first.
    pub fn iter(&self) -> impl Iterator<Item = &ManagedWindow> {
        self.stacking.iter().filter_map(|id| self.windows.get(id))
    }

    pub fn ids(&self) -> Vec<WindowId> { self.stacking.clone() }

    pub fn stacking(&self) -> &[WindowId] { &self.stacking }

    pub fn transients_of(&self, leader: WindowId) -> Vec<WindowId> {
        self.stacking
            .iter()
            .copied()
            .filter(|id| self.windows.get(id).is_some_and(|w| w.transient_for == Some(leader)))
            .collect()
    }

    /// Moves `id` to the top, then its transients above it (recursively).
    ///
    /// Returns the ids that moved, bottom first, so the caller can restack
    /// them on the server in the same order.
    pub fn raise(&mut self, id: WindowId) -> Vec<WindowId> {
        if !self.windows.contains_key(&id) {
            return Vec::new();
        }
        let mut order = vec![id];
        let mut i = 0;
        while i < order.len() {
            for t in self.transients_of(order[i]) {
                if !order.contains(&t) {
                    order.push(t);
                }
            }
            i += 1;
        }
        self.stacking.retain(|w| !order.contains(w));
        self.stacking.extend(order.iter().copied());
        order
    }

    /// Moves `id` to the bottom. Its transients stay where they are.
    pub fn lower(&mut self, id: WindowId) -> bool {
        if !self.windows.contains_key(&id) {
            return false;
        }
        self.stacking.retain(|&w| w != id);
        self.stacking.insert(0, id);
        true
    }

    pub fn aggregate_strut(&self) -> Strut {
        self.windows.values().fold(Strut::default(), |acc, w| acc.max(&w.strut))
    }

    pub fn hidden(&self) -> Vec<WindowId> {
        self.iter().filter(|w| w.hidden).map(|w| w.id).collect()
    }
}
