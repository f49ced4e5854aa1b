use tracing::{debug, error, info, trace, warn};

use super::screen::ScreenEventHandler;
use crate::actor::reactor::{NetProperty, Reactor, StateAction};
use crate::common::config::FocusPolicy;
use crate::layout_engine::{Proposal, placement};
use crate::model::{
    Edge, ManagedWindow, Protocols, Rect, ScreenLayout, SizeHints, WindowId, WindowProperties,
    WmState,
};
use crate::sys::window_server::{Request, WindowServer};

pub struct WindowEventHandler;

impl WindowEventHandler {
    pub fn handle_window_created<S: WindowServer>(
        reactor: &mut Reactor<S>,
        window: WindowId,
        geometry: Rect,
        properties: WindowProperties,
        existing: bool,
    ) {
        if let Some(w) = reactor.window_manager.registry.get(window) {
            if w.hidden {
                debug!(%window, "map request for hidden window");
                reactor.unhide_window(window);
            }
            return;
        }
        if reactor.window_manager.registry.is_frame(window) {
            return;
        }

        let mut record = ManagedWindow::from_properties(window, geometry, &properties);
        let framed = !properties.dock && !record.has_strut();
        if framed {
            let decoration = *reactor.screen_manager.engine.decoration();
            let outer = decoration.outer(geometry);
            let server = &mut reactor.communication_manager.server;
            match server.create_frame(window, outer, decoration.content_offset()) {
                Ok(frame) => record.frame = Some(frame),
                Err(e) if e.is_fatal() => {
                    error!(%window, "could not create frame: {e}");
                    reactor.communication_manager.fatal = Some(e);
                    return;
                }
                Err(e) => {
                    warn!(%window, "could not create frame, not managing: {e}");
                    return;
                }
            }
        }

        let keep_position = existing
            || properties.size_hints.has_position()
            || properties.dock
            || record.has_strut();
        let initial = if keep_position {
            geometry
        } else {
            placement::place(
                &reactor.screen_manager.engine,
                &reactor.screen_manager.layout,
                &reactor.window_manager.registry,
                &record,
            )
        };
        let has_strut = record.has_strut();
        let transient_for = record.transient_for;
        reactor.window_manager.registry.insert(record);
        info!(%window, %initial, framed, existing, "managing window");

        if has_strut {
            ScreenEventHandler::recompute_strut(reactor);
        }
        if let Some(w) = reactor.window_manager.registry.get(window) {
            let sanitized = reactor.screen_manager.engine.sanitize(
                &reactor.screen_manager.layout,
                w,
                Edge::None,
                Proposal::from(initial),
            );
            reactor.apply_geometry(window, sanitized.rect);
        }

        if properties.initially_iconic {
            if let Some(w) = reactor.window_manager.registry.get_mut(window) {
                w.hidden = true;
                w.state = WmState::Iconic;
            }
            reactor.request(Request::SetWmState { window, state: WmState::Iconic });
        } else {
            let frame = reactor.window_manager.registry.get_mut(window).and_then(|w| {
                w.state = WmState::Normal;
                w.frame
            });
            reactor.request(Request::Map(window));
            if let Some(frame) = frame {
                reactor.request(Request::Map(frame));
            }
            reactor.request(Request::SetWmState { window, state: WmState::Normal });
        }

        if properties.fullscreen {
            Self::set_fullscreen(reactor, window, true);
        }
        reactor.publish_net_state(window);
        reactor.publish_client_list();

        let focus = match reactor.focus_manager.arbiter.policy() {
            FocusPolicy::Click => true,
            FocusPolicy::Enter => transient_for.is_some() && transient_for == reactor.focused(),
        };
        if focus {
            reactor.focus_window(window);
        }
    }

    pub fn handle_window_destroyed<S: WindowServer>(reactor: &mut Reactor<S>, window: WindowId) {
        if !reactor.window_manager.registry.contains(window) {
            trace!(%window, "destroy of unmanaged window");
            return;
        }
        Self::release(reactor, window, true);
    }

    pub fn handle_window_unmapped<S: WindowServer>(reactor: &mut Reactor<S>, window: WindowId) {
        let Some(w) = reactor.window_manager.registry.get(window) else { return };
        // Hidden windows are unmapped by us.
        if w.hidden {
            trace!(%window, "unmap of hidden window");
            return;
        }
        Self::release(reactor, window, false);
    }

    pub fn handle_window_reparented<S: WindowServer>(
        reactor: &mut Reactor<S>,
        window: WindowId,
        parent: WindowId,
    ) {
        let Some(w) = reactor.window_manager.registry.get(window) else { return };
        if w.frame == Some(parent) {
            return;
        }
        debug!(%window, %parent, "client reparented away");
        Self::release(reactor, window, false);
    }

    /// A client asked for new geometry. Unmanaged windows get what they ask
    /// for; managed ones go through the same rules as interactive moves.
    pub fn handle_configure_request<S: WindowServer>(
        reactor: &mut Reactor<S>,
        window: WindowId,
        geometry: Rect,
        moves: bool,
        resizes: bool,
    ) {
        let Some(w) = reactor.window_manager.registry.get(window) else {
            reactor.request(Request::Configure { window, frame: None, content: geometry });
            return;
        };
        if w.fullscreen {
            let content = w.content;
            reactor.request(Request::SyntheticConfigure { window, content });
            return;
        }

        let current = w.content;
        let (width, height) = if resizes {
            (
                w.width.limit(geometry.width()).unwrap_or(current.width()),
                w.height.limit(geometry.height()).unwrap_or(current.height()),
            )
        } else {
            (current.width(), current.height())
        };
        let origin = if moves { geometry.origin() } else { current.origin() };
        let proposal = Proposal {
            x: origin.x,
            y: origin.y,
            width: Some(width),
            height: Some(height),
        };
        let out = reactor.screen_manager.engine.sanitize(
            &reactor.screen_manager.layout,
            w,
            Edge::None,
            proposal,
        );
        if out.changed {
            reactor.apply_geometry(window, out.rect);
        } else {
            reactor.request(Request::SyntheticConfigure { window, content: out.rect });
        }
    }

    pub fn handle_hints_changed<S: WindowServer>(
        reactor: &mut Reactor<S>,
        window: WindowId,
        hints: SizeHints,
    ) {
        let Some(w) = reactor.window_manager.registry.get_mut(window) else { return };
        (w.width, w.height) = hints.limiters();
        trace!(%window, width = ?w.width, height = ?w.height, "size hints updated");
    }

    pub fn handle_protocols_changed<S: WindowServer>(
        reactor: &mut Reactor<S>,
        window: WindowId,
        protocols: Protocols,
    ) {
        if let Some(w) = reactor.window_manager.registry.get_mut(window) {
            w.protocols = protocols;
        }
    }

    pub fn handle_name_changed<S: WindowServer>(
        reactor: &mut Reactor<S>,
        window: WindowId,
        name: String,
    ) {
        let Some(w) = reactor.window_manager.registry.get_mut(window) else { return };
        if w.name == name {
            return;
        }
        w.name = name;
        reactor.redraw_frame(window);
    }

    pub fn handle_state_request<S: WindowServer>(
        reactor: &mut Reactor<S>,
        window: WindowId,
        action: StateAction,
        property: NetProperty,
    ) {
        let Some(w) = reactor.window_manager.registry.get_mut(window) else { return };
        debug!(%window, ?action, ?property, "state request");
        match property {
            NetProperty::Fullscreen => {
                let on = action.apply(w.fullscreen);
                Self::set_fullscreen(reactor, window, on);
            }
            NetProperty::Above => {
                w.net.above = action.apply(w.net.above);
                if w.net.above {
                    w.net.below = false;
                    reactor.raise_window(window);
                }
            }
            NetProperty::Below => {
                w.net.below = action.apply(w.net.below);
                if w.net.below {
                    w.net.above = false;
                    reactor.lower_window(window);
                }
            }
            NetProperty::SkipTaskbar => w.net.skip_taskbar = action.apply(w.net.skip_taskbar),
            NetProperty::SkipPager => w.net.skip_pager = action.apply(w.net.skip_pager),
            NetProperty::Hidden => {
                if action.apply(w.hidden) {
                    reactor.hide_window(window);
                } else {
                    reactor.unhide_window(window);
                }
            }
        }
        reactor.publish_net_state(window);
    }

    pub fn handle_activate_request<S: WindowServer>(reactor: &mut Reactor<S>, window: WindowId) {
        let Some(w) = reactor.window_manager.registry.get(window) else { return };
        if w.hidden {
            reactor.unhide_window(window);
        } else {
            reactor.raise_window(window);
            reactor.focus_window(window);
        }
    }

    /// Fullscreen windows drop their decoration and cover the monitor they
    /// overlap most; leaving fullscreen restores the saved rect.
    fn set_fullscreen<S: WindowServer>(reactor: &mut Reactor<S>, window: WindowId, on: bool) {
        let decoration = *reactor.screen_manager.engine.decoration();
        let layout = &reactor.screen_manager.layout;
        let Some(w) = reactor.window_manager.registry.get_mut(window) else { return };
        if w.fullscreen == on {
            return;
        }

        let content = if on {
            let outer = w.outer(&decoration);
            let monitors = layout.monitors();
            let target = ScreenLayout::best_area(monitors, &outer)
                .map_or(layout.primary(), |i| monitors[i]);
            w.saved_content = Some(w.content);
            w.fullscreen = true;
            target
        } else {
            w.fullscreen = false;
            let saved = w.saved_content.take().unwrap_or(w.content);
            let engine = &reactor.screen_manager.engine;
            engine.sanitize(layout, w, Edge::None, Proposal::from(saved)).rect
        };
        info!(%window, fullscreen = on, %content, "fullscreen changed");

        reactor.apply_geometry(window, content);
        reactor.redraw_frame(window);
        if on {
            reactor.raise_window(window);
        }
        reactor.publish_net_state(window);
    }

    /// Stops managing `window`. A client that is still alive goes back to
    /// the root, withdrawn.
    fn release<S: WindowServer>(reactor: &mut Reactor<S>, window: WindowId, destroyed: bool) {
        reactor.request(Request::Forget(window));
        let Some(w) = reactor.window_manager.registry.remove(window) else { return };
        info!(%window, destroyed, "releasing window");

        if let Some(frame) = w.frame {
            reactor.request(Request::DestroyFrame {
                frame,
                client: window,
                at: w.content.origin(),
                mapped: false,
            });
        }
        if !destroyed {
            reactor.request(Request::SetWmState { window, state: WmState::Withdrawn });
        }
        if reactor.interaction_manager.state.target() == Some(window) {
            debug!(%window, state = %reactor.interaction_manager.state, "gesture target vanished");
            reactor.interaction_manager.reset();
        }
        reactor.interaction_manager.menu_entries.retain(|&id| id != window);

        reactor.unfocus_window(window);
        reactor.publish_client_list();
        if w.has_strut() {
            ScreenEventHandler::recompute_strut(reactor);
        }
    }
}
