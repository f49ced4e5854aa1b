//! Snapshot types for the state dump.

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use super::geometry::{Rect, Strut};
use super::registry::WindowRegistry;
use super::screen::ScreenLayout;
use super::window::{ManagedWindow, WindowId, WmState};

#[derive(Debug, Clone, PartialEq)]
pub struct WindowData {
    pub id: WindowId,
    pub frame: Option<WindowId>,
    pub name: String,
    pub content: Rect,
    pub state: WmState,
    pub hidden: bool,
    pub fullscreen: bool,
    pub is_focused: bool,
    pub transient_for: Option<WindowId>,
}

impl WindowData {
    pub fn from_window(window: &ManagedWindow, focused: Option<WindowId>) -> WindowData {
        WindowData {
            id: window.id,
            frame: window.frame,
            name: window.name.clone(),
            content: window.content,
            state: window.state,
            hidden: window.hidden,
            fullscreen: window.fullscreen,
            is_focused: focused == Some(window.id),
            transient_for: window.transient_for,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayData {
    pub index: usize,
    pub frame: Rect,
    pub is_primary: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub displays: Vec<DisplayData>,
    pub strut: Strut,
    /// Bottom to top.
    pub windows: Vec<WindowData>,
    pub focus_history: Vec<WindowId>,
    pub interaction: String,
}

impl StateSnapshot {
    pub fn capture(
        layout: &ScreenLayout,
        registry: &WindowRegistry,
        focus_history: &[WindowId],
        interaction: String,
    ) -> StateSnapshot {
        let primary = layout.primary();
        let displays = layout
            .monitors()
            .iter()
            .enumerate()
            .map(|(index, &frame)| DisplayData {
                index,
                frame,
                is_primary: frame == primary,
            })
            .collect();
        let focused = focus_history.first().copied();
        StateSnapshot {
            displays,
            strut: layout.strut(),
            windows: registry.iter().map(|w| WindowData::from_window(w, focused)).collect(),
            focus_history: focus_history.to_vec(),
            interaction,
        }
    }
}

impl Serialize for WindowData {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where S: Serializer {
        #[derive(Serialize)]
        struct WindowDataSer<'a> {
            id: u32,
            frame: Option<u32>,
            name: &'a str,
            geometry: String,
            state: WmState,
            hidden: bool,
            fullscreen: bool,
            is_focused: bool,
            transient_for: Option<u32>,
        }

        let helper = WindowDataSer {
            id: self.id.as_u32(),
            frame: self.frame.map(WindowId::as_u32),
            name: &self.name,
            geometry: self.content.to_string(),
            state: self.state,
            hidden: self.hidden,
            fullscreen: self.fullscreen,
            is_focused: self.is_focused,
            transient_for: self.transient_for.map(WindowId::as_u32),
        };

        helper.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for WindowData {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where D: Deserializer<'de> {
        #[derive(Deserialize)]
        struct WindowDataDe {
            id: u32,
            frame: Option<u32>,
            name: String,
            geometry: String,
            state: WmState,
            hidden: bool,
            fullscreen: bool,
            is_focused: bool,
            transient_for: Option<u32>,
        }

        let helper = WindowDataDe::deserialize(deserializer)?;
        let content = helper.geometry.parse().map_err(de::Error::custom)?;

        Ok(WindowData {
            id: WindowId(helper.id),
            frame: helper.frame.map(WindowId),
            name: helper.name,
            content,
            state: helper.state,
            hidden: helper.hidden,
            fullscreen: helper.fullscreen,
            is_focused: helper.is_focused,
            transient_for: helper.transient_for.map(WindowId),
        })
    }
}

impl Serialize for DisplayData {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where S: Serializer {
        #[derive(Serialize)]
        struct DisplayDataSer {
            index: usize,
            geometry: String,
            is_primary: bool,
        }

        DisplayDataSer {
            index: self.index,
            geometry: self.frame.to_string(),
            is_primary: self.is_primary,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DisplayData {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where D: Deserializer<'de> {
        #[derive(Deserialize)]
        struct DisplayDataDe {
            index: usize,
            geometry: String,
            is_primary: bool,
        }

        let helper = DisplayDataDe::deserialize(deserializer)?;
        Ok(DisplayData {
            index: helper.index,
            frame: helper.geometry.parse().map_err(de::Error::custom)?,
            is_primary: helper.is_primary,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn window_data_serializes_geometry_as_x_string() {
        let data = WindowData {
            id: WindowId(0x400001),
            frame: Some(WindowId(0x200003)),
            name: "xterm".to_string(),
            content: Rect::from_xywh(10, -5, 640, 480),
            state: WmState::Normal,
            hidden: false,
            fullscreen: false,
            is_focused: true,
            transient_for: None,
        };

        let value = serde_json::to_value(&data).expect("serialize WindowData");
        let expected = json!({
            "id": 0x400001,
            "frame": 0x200003,
            "name": "xterm",
            "geometry": "640x480+10-5",
            "state": "Normal",
            "hidden": false,
            "fullscreen": false,
            "is_focused": true,
            "transient_for": null,
        });
        assert_eq!(value, expected);
        assert_eq!(serde_json::from_value::<WindowData>(value).unwrap(), data);
    }

    #[test]
    fn snapshot_marks_primary_display_and_focus() {
        let layout = ScreenLayout::new(
            Rect::from_xywh(0, 0, 2000, 1000),
            vec![Rect::from_xywh(0, 0, 800, 600), Rect::from_xywh(800, 0, 1200, 1000)],
        );
        let mut registry = WindowRegistry::new();
        registry.insert(ManagedWindow::new(WindowId(7), Rect::from_xywh(0, 0, 10, 10)));
        registry.insert(ManagedWindow::new(WindowId(8), Rect::from_xywh(0, 0, 10, 10)));

        let snap = StateSnapshot::capture(&layout, &registry, &[WindowId(8)], "Idle".into());
        assert_eq!(
            snap.displays.iter().map(|d| d.is_primary).collect::<Vec<_>>(),
            vec![false, true]
        );
        assert!(!snap.windows[0].is_focused);
        assert!(snap.windows[1].is_focused);
    }
}
