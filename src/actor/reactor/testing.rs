use std::time::Instant;

use super::{Event, Reactor};
use crate::common::config::{Config, FocusPolicy};
use crate::model::{Point, Rect, ScreenLayout, SizeHints, WindowId, WindowProperties};
use crate::sys::event::{ButtonMask, PointerEvent};
use crate::sys::window_server::{Request, ServerError, WindowServer};

pub const FRAME_BASE: u32 = 0x0100_0000;

/// Records every request instead of talking to a server.
#[derive(Default)]
pub struct RecordingServer {
    pub requests: Vec<Request>,
    pub frames_created: u32,
}

impl RecordingServer {
    pub fn take(&mut self) -> Vec<Request> { std::mem::take(&mut self.requests) }
}

impl WindowServer for RecordingServer {
    fn send(&mut self, request: Request) -> Result<(), ServerError> {
        self.requests.push(request);
        Ok(())
    }

    fn create_frame(
        &mut self,
        client: WindowId,
        _outer: Rect,
        _content_offset: Point,
    ) -> Result<WindowId, ServerError> {
        self.frames_created += 1;
        Ok(frame_of(client))
    }
}

/// The frame handle the recording server hands out for `client`.
pub fn frame_of(client: WindowId) -> WindowId { WindowId(FRAME_BASE + client.0) }

pub fn test_config(policy: FocusPolicy) -> Config {
    let mut config = Config::default();
    config.settings.focus.policy = policy;
    config.settings.decoration.border_width = 2;
    config.settings.decoration.title_height = 16;
    config.settings.geometry.edge_resistance = 0;
    config
}

pub fn single_monitor() -> ScreenLayout {
    ScreenLayout::new(Rect::from_xywh(0, 0, 1000, 800), vec![Rect::from_xywh(0, 0, 1000, 800)])
}

pub fn make_reactor(policy: FocusPolicy) -> Reactor<RecordingServer> {
    Reactor::new(test_config(policy), single_monitor(), RecordingServer::default())
}

/// Properties of a plain client that chose its own position.
pub fn positioned() -> WindowProperties {
    WindowProperties {
        size_hints: SizeHints { user_position: true, ..SizeHints::default() },
        ..WindowProperties::default()
    }
}

impl Reactor<RecordingServer> {
    pub fn manage(&mut self, id: u32, content: Rect) -> WindowId {
        self.manage_with(id, content, positioned())
    }

    pub fn manage_with(
        &mut self,
        id: u32,
        content: Rect,
        properties: WindowProperties,
    ) -> WindowId {
        let window = WindowId(id);
        self.handle_event(Event::WindowCreated {
            window,
            geometry: content,
            properties,
            existing: false,
        });
        window
    }

    pub fn content(&self, window: WindowId) -> Option<Rect> {
        self.registry().get(window).map(|w| w.content)
    }

    pub fn requests(&mut self) -> Vec<Request> { self.server_mut().take() }

    pub fn press(&mut self, window: WindowId, x: i32, y: i32, button: u8) {
        let event = PointerEvent::press(window, Point::new(x, y), button);
        self.handle_event(Event::ButtonPress(event));
    }

    pub fn release(&mut self, window: WindowId, x: i32, y: i32, button: u8) {
        let event = PointerEvent::press(window, Point::new(x, y), button);
        self.handle_event(Event::ButtonRelease(event));
    }

    pub fn motion(&mut self, window: WindowId, x: i32, y: i32, held: u8) {
        self.handle_event(Event::Motion(PointerEvent::motion(
            window,
            Point::new(x, y),
            ButtonMask::for_button(held),
        )));
    }

    pub fn enter(&mut self, window: WindowId, at: Instant) {
        self.handle_event(Event::EnterNotify { window, at });
    }
}
