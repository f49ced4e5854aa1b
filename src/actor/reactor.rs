//! The Reactor owns all window-manager state and keeps it coherent with the
//! window server.
//!
//! It takes events from the server reader, signal handlers and its own focus
//! timer, updates the model, and sends requests back out through a
//! [`WindowServer`]. Everything runs on one thread; no event is processed
//! while another is in flight.

mod events;
pub mod focus;
pub mod interaction;
mod managers;

#[cfg(test)]
mod testing;

#[cfg(test)]
mod tests;

use std::time::Instant;

use events::pointer::PointerEventHandler;
use events::screen::ScreenEventHandler;
use events::window::WindowEventHandler;
pub use focus::{FocusArbiter, Handoff};
pub use interaction::{Drag, InteractionState, hit_test};
use tracing::{debug, info, instrument, trace, warn};

use crate::actor;
use crate::common::config::{Config, FocusPolicy};
use crate::layout_engine::{GeometryEngine, GeometrySettings};
use crate::model::server::StateSnapshot;
use crate::model::{
    ManagedWindow, Protocols, Rect, ScreenLayout, SizeHints, Strut, WindowId, WindowProperties,
    WindowRegistry, WmState,
};
use crate::sys::event::PointerEvent;
use crate::sys::window_server::{FrameStyle, Request, ServerError, WindowServer};

pub type Sender = actor::Sender<Event>;
pub type Receiver = actor::Receiver<Event>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateAction {
    Remove,
    Add,
    Toggle,
}

impl StateAction {
    pub fn apply(self, current: bool) -> bool {
        match self {
            StateAction::Remove => false,
            StateAction::Add => true,
            StateAction::Toggle => !current,
        }
    }
}

/// Window states a client may ask to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetProperty {
    Fullscreen,
    Above,
    Below,
    SkipTaskbar,
    SkipPager,
    Hidden,
}

#[derive(Debug)]
pub enum Event {
    /// The monitor layout changed. Also the first event on startup.
    ScreenChanged { root: Rect, monitors: Vec<Rect> },

    /// A top-level window asked to be mapped. `existing` is set for windows
    /// found already mapped at startup, which keep their position.
    WindowCreated {
        window: WindowId,
        geometry: Rect,
        properties: WindowProperties,
        existing: bool,
    },
    WindowDestroyed(WindowId),
    WindowUnmapped(WindowId),
    WindowReparented { window: WindowId, parent: WindowId },
    ConfigureRequest {
        window: WindowId,
        geometry: Rect,
        moves: bool,
        resizes: bool,
    },
    HintsChanged(WindowId, SizeHints),
    ProtocolsChanged(WindowId, Protocols),
    StrutChanged(WindowId, Strut),
    NameChanged(WindowId, String),
    StateRequest {
        window: WindowId,
        action: StateAction,
        property: NetProperty,
    },
    ActivateRequest(WindowId),

    ButtonPress(PointerEvent),
    ButtonRelease(PointerEvent),
    Motion(PointerEvent),
    /// The pointer entered a window (client, frame or root).
    EnterNotify { window: WindowId, at: Instant },
    /// A button was pressed inside a client's own area.
    ClientClicked(WindowId),
    /// The deferred-focus timer is due.
    FocusTimer(Instant),

    DumpState,
    Restart,
    ConnectionLost(String),
}

/// Why the event loop stopped without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Restart,
    Disconnected,
}

pub struct Reactor<S: WindowServer> {
    pub config: Config,
    window_manager: managers::WindowManager,
    screen_manager: managers::ScreenManager,
    interaction_manager: managers::InteractionManager,
    focus_manager: managers::FocusManager,
    communication_manager: managers::CommunicationManager<S>,
    exit: Option<Exit>,
}

impl<S: WindowServer> Reactor<S> {
    pub fn new(config: Config, layout: ScreenLayout, server: S) -> Reactor<S> {
        let engine = GeometryEngine::new(GeometrySettings::from_settings(&config.settings));
        let arbiter = FocusArbiter::new(&config.settings.focus);
        Reactor {
            config,
            window_manager: managers::WindowManager { registry: WindowRegistry::new() },
            screen_manager: managers::ScreenManager { layout, engine },
            interaction_manager: managers::InteractionManager {
                state: InteractionState::Idle,
                menu_entries: Vec::new(),
                menu: None,
            },
            focus_manager: managers::FocusManager { arbiter },
            communication_manager: managers::CommunicationManager { server, fatal: None },
            exit: None,
        }
    }

    pub fn registry(&self) -> &WindowRegistry { &self.window_manager.registry }

    pub fn layout(&self) -> &ScreenLayout { &self.screen_manager.layout }

    pub fn interaction(&self) -> &InteractionState { &self.interaction_manager.state }

    pub fn focused(&self) -> Option<WindowId> { self.focus_manager.arbiter.focused() }

    pub fn focus_history(&self) -> &[WindowId] { self.focus_manager.arbiter.history() }

    pub fn focus_deadline(&self) -> Option<Instant> { self.focus_manager.arbiter.deadline() }

    pub fn server(&self) -> &S { &self.communication_manager.server }

    pub fn server_mut(&mut self) -> &mut S { &mut self.communication_manager.server }

    pub fn take_exit(&mut self) -> Option<Exit> { self.exit.take() }

    pub fn take_fatal(&mut self) -> Option<ServerError> { self.communication_manager.fatal.take() }

    pub async fn run(mut self, mut events: Receiver) -> Result<Exit, ServerError> {
        info!("reactor running");
        loop {
            let deadline = self.focus_deadline();
            let sleep = tokio::time::sleep_until(tokio::time::Instant::from_std(
                deadline.unwrap_or_else(Instant::now),
            ));
            tokio::select! {
                maybe = events.recv() => match maybe {
                    Some((span, event)) => {
                        let _guard = span.enter();
                        self.handle_event(event);
                    }
                    None => {
                        self.shutdown();
                        return Ok(Exit::Disconnected);
                    }
                },
                _ = sleep, if deadline.is_some() => {
                    self.handle_event(Event::FocusTimer(Instant::now()));
                }
            }

            if let Some(e) = self.take_fatal() {
                return Err(e);
            }
            if let Some(exit) = self.take_exit() {
                self.shutdown();
                return Ok(exit);
            }
        }
    }

    fn log_event(&self, event: &Event) {
        match event {
            Event::Motion(..) | Event::EnterNotify { .. } | Event::FocusTimer(..) => {
                trace!(?event, "Event")
            }
            _ => debug!(?event, "Event"),
        }
    }

    #[instrument(name = "reactor::handle_event", skip(self), fields(event = ?event))]
    pub fn handle_event(&mut self, event: Event) {
        self.log_event(&event);

        match event {
            Event::ScreenChanged { root, monitors } => {
                ScreenEventHandler::handle_screen_changed(self, root, monitors);
            }
            Event::WindowCreated { window, geometry, properties, existing } => {
                WindowEventHandler::handle_window_created(
                    self, window, geometry, properties, existing,
                );
            }
            Event::WindowDestroyed(window) => {
                WindowEventHandler::handle_window_destroyed(self, window);
            }
            Event::WindowUnmapped(window) => {
                WindowEventHandler::handle_window_unmapped(self, window);
            }
            Event::WindowReparented { window, parent } => {
                WindowEventHandler::handle_window_reparented(self, window, parent);
            }
            Event::ConfigureRequest { window, geometry, moves, resizes } => {
                WindowEventHandler::handle_configure_request(
                    self, window, geometry, moves, resizes,
                );
            }
            Event::HintsChanged(window, hints) => {
                WindowEventHandler::handle_hints_changed(self, window, hints);
            }
            Event::ProtocolsChanged(window, protocols) => {
                WindowEventHandler::handle_protocols_changed(self, window, protocols);
            }
            Event::StrutChanged(window, strut) => {
                ScreenEventHandler::handle_strut_changed(self, window, strut);
            }
            Event::NameChanged(window, name) => {
                WindowEventHandler::handle_name_changed(self, window, name);
            }
            Event::StateRequest { window, action, property } => {
                WindowEventHandler::handle_state_request(self, window, action, property);
            }
            Event::ActivateRequest(window) => {
                WindowEventHandler::handle_activate_request(self, window);
            }
            Event::ButtonPress(pointer) => PointerEventHandler::handle_button_press(self, pointer),
            Event::ButtonRelease(pointer) => {
                PointerEventHandler::handle_button_release(self, pointer)
            }
            Event::Motion(pointer) => PointerEventHandler::handle_motion(self, pointer),
            Event::EnterNotify { window, at } => {
                PointerEventHandler::handle_enter(self, window, at);
            }
            Event::ClientClicked(window) => {
                PointerEventHandler::handle_client_clicked(self, window);
            }
            Event::FocusTimer(now) => PointerEventHandler::handle_focus_timer(self, now),
            Event::DumpState => self.dump_state(),
            Event::Restart => {
                info!("restart requested");
                self.exit = Some(Exit::Restart);
            }
            Event::ConnectionLost(reason) => {
                self.communication_manager.fatal = Some(ServerError::ConnectionLost(reason));
            }
        }
    }

    fn request(&mut self, request: Request) { self.communication_manager.send(request); }

    /// Gives `window` the content rect `content` on the server. A move that
    /// keeps the size gets a synthetic notification, since the server only
    /// reports resizes.
    fn apply_geometry(&mut self, window: WindowId, content: Rect) {
        let decoration = *self.screen_manager.engine.decoration();
        let Some(w) = self.window_manager.registry.get_mut(window) else { return };
        let resized =
            w.content.width() != content.width() || w.content.height() != content.height();
        w.content = content;
        let frame = w.frame.map(|f| (f, w.outer(&decoration)));

        self.request(Request::Configure { window, frame, content });
        if resized {
            self.redraw_frame(window);
        } else {
            self.request(Request::SyntheticConfigure { window, content });
        }
    }

    fn frame_style(&self, window: &ManagedWindow) -> FrameStyle {
        let decoration = self.screen_manager.engine.decoration();
        let outer = window.outer(decoration);
        let shown = window.decoration(decoration).unwrap_or_default();
        FrameStyle {
            focused: self.focused() == Some(window.id),
            title: window.name.clone(),
            width: outer.width(),
            height: outer.height(),
            border: shown.border,
            title_height: shown.title,
        }
    }

    fn redraw_frame(&mut self, window: WindowId) {
        let Some(w) = self.window_manager.registry.get(window) else { return };
        let Some(frame) = w.frame else { return };
        let style = self.frame_style(w);
        self.request(Request::DrawFrame { frame, style });
    }

    fn focus_window(&mut self, window: WindowId) {
        if !self.window_manager.registry.get(window).is_some_and(|w| w.is_viewable()) {
            return;
        }
        if let Some(handoff) = self.focus_manager.arbiter.focus_client(window) {
            self.apply_handoff(handoff);
        }
    }

    fn unfocus_window(&mut self, window: WindowId) {
        let registry = &self.window_manager.registry;
        let handoff = self
            .focus_manager
            .arbiter
            .unfocus_client(window, |w| registry.get(w).is_some_and(|w| w.is_viewable()));
        if let Some(handoff) = handoff {
            self.apply_handoff(handoff);
        }
    }

    fn apply_handoff(&mut self, handoff: Handoff) {
        debug!(?handoff, "focus handoff");
        if let Some(previous) = handoff.previous {
            self.redraw_frame(previous);
        }
        let next = handoff.next.and_then(|id| self.window_manager.registry.get(id));
        let Some(window) = next else {
            self.request(Request::SetInputFocus(None));
            self.request(Request::SetActiveWindow(None));
            return;
        };
        let (id, accepts, take_focus) =
            (window.id, window.accepts_focus, window.protocols.take_focus);

        if accepts {
            self.request(Request::SetInputFocus(Some(id)));
        }
        if take_focus {
            self.request(Request::TakeFocus(id));
        }
        if !accepts && !take_focus {
            self.request(Request::SetInputFocus(None));
        }
        self.redraw_frame(id);
        self.request(Request::SetActiveWindow(Some(id)));
        if self.focus_manager.arbiter.policy() == FocusPolicy::Click {
            self.raise_window(id);
        }
    }

    fn raise_window(&mut self, window: WindowId) {
        let moved = self.window_manager.registry.raise(window);
        if moved.is_empty() {
            return;
        }
        let handles = moved
            .iter()
            .filter_map(|id| self.window_manager.registry.get(*id))
            .map(|w| w.frame.unwrap_or(w.id))
            .collect();
        self.request(Request::Raise(handles));
        self.publish_client_list();
    }

    fn lower_window(&mut self, window: WindowId) {
        if !self.window_manager.registry.lower(window) {
            return;
        }
        if let Some(w) = self.window_manager.registry.get(window) {
            let handle = w.frame.unwrap_or(w.id);
            self.request(Request::Lower(handle));
        }
        self.publish_client_list();
    }

    fn hide_window(&mut self, window: WindowId) {
        let Some(w) = self.window_manager.registry.get_mut(window) else { return };
        if w.hidden {
            return;
        }
        w.hidden = true;
        w.state = WmState::Iconic;
        let handle = w.frame.unwrap_or(w.id);
        info!(%window, "hiding");
        self.request(Request::Unmap(handle));
        self.request(Request::SetWmState { window, state: WmState::Iconic });
        self.publish_net_state(window);
        self.unfocus_window(window);
    }

    fn unhide_window(&mut self, window: WindowId) {
        let Some(w) = self.window_manager.registry.get_mut(window) else { return };
        if !w.hidden {
            return;
        }
        w.hidden = false;
        w.state = WmState::Normal;
        let (client, frame) = (w.id, w.frame);
        info!(%window, "unhiding");
        self.request(Request::Map(client));
        if let Some(frame) = frame {
            self.request(Request::Map(frame));
        }
        self.request(Request::SetWmState { window, state: WmState::Normal });
        self.publish_net_state(window);
        self.raise_window(window);
        self.focus_window(window);
    }

    /// Asks the client to close, or kills it if it cannot be asked.
    fn close_window(&mut self, window: WindowId) {
        let Some(w) = self.window_manager.registry.get(window) else { return };
        if w.protocols.delete_window {
            self.request(Request::Delete(window));
        } else {
            info!(%window, "client cannot be asked to close, killing it");
            self.request(Request::Kill(window));
        }
    }

    fn publish_net_state(&mut self, window: WindowId) {
        let Some(w) = self.window_manager.registry.get(window) else { return };
        let request = Request::SetNetState {
            window,
            fullscreen: w.fullscreen,
            hidden: w.hidden,
            net: w.net,
        };
        self.request(request);
    }

    fn publish_client_list(&mut self) {
        let ids = self.window_manager.registry.ids();
        self.request(Request::SetClientList(ids));
    }

    fn publish_workarea(&mut self) {
        let layout = &self.screen_manager.layout;
        let request = Request::SetWorkarea {
            workarea: layout.workarea(),
            strut: layout.strut(),
        };
        self.request(request);
    }

    fn snapshot(&self) -> StateSnapshot {
        StateSnapshot::capture(
            &self.screen_manager.layout,
            &self.window_manager.registry,
            self.focus_manager.arbiter.history(),
            self.interaction_manager.state.to_string(),
        )
    }

    fn dump_state(&self) {
        match serde_json::to_string_pretty(&self.snapshot()) {
            Ok(json) => info!("state dump:\n{json}"),
            Err(e) => warn!("failed to serialize state dump: {e}"),
        }
    }

    /// Hands every framed window back to the root where it currently is, so
    /// the next window manager (or our own re-exec) can pick it up.
    pub fn shutdown(&mut self) {
        info!("releasing managed windows");
        let windows: Vec<(WindowId, Option<WindowId>, Rect, bool)> = self
            .window_manager
            .registry
            .iter()
            .map(|w| (w.id, w.frame, w.content, !w.hidden))
            .collect();
        for (client, frame, content, mapped) in windows {
            if let Some(frame) = frame {
                self.request(Request::DestroyFrame {
                    frame,
                    client,
                    at: content.origin(),
                    mapped,
                });
            }
        }
        self.request(Request::SetInputFocus(None));
    }
}
