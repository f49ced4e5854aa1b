use std::process::{Command, Stdio};
use std::time::Instant;

use tracing::{debug, info, trace, warn};

use crate::actor::reactor::interaction::{Drag, MenuGeometry, hit_test};
use crate::actor::reactor::{InteractionState, Reactor};
use crate::common::config::{FocusPolicy, RootAction};
use crate::model::{Edge, WindowId};
use crate::sys::event::{Modifiers, PointerEvent};
use crate::sys::window_server::{Request, WindowServer};

pub struct PointerEventHandler;

impl PointerEventHandler {
    pub fn handle_button_press<S: WindowServer>(reactor: &mut Reactor<S>, event: PointerEvent) {
        match reactor.interaction_manager.state {
            InteractionState::Idle => {}
            InteractionState::Dragging(drag) => {
                debug!(target = %drag.target, button = event.button, "second press cancels drag");
                reactor.interaction_manager.reset();
                return;
            }
            _ => return,
        }

        let registry = &reactor.window_manager.registry;
        let Some(id) = registry.owner_of(event.window) else {
            Self::root_press(reactor, event);
            return;
        };
        if !registry.is_frame(event.window) {
            return;
        }
        let Some(w) = registry.get(id) else { return };
        let decoration = *reactor.screen_manager.engine.decoration();
        let edge = hit_test(&decoration, w.outer(&decoration), event.root);
        let start = w.content;

        if reactor.focus_manager.arbiter.policy() == FocusPolicy::Click {
            reactor.focus_window(id);
        }

        let mouse = &reactor.config.settings.mouse;
        let button = event.button;
        let next = if edge == Edge::Close {
            InteractionState::PendingClose { target: id, button }
        } else if button == mouse.hide_button {
            InteractionState::PendingHide { target: id, button }
        } else if button == mouse.move_button {
            InteractionState::Dragging(Drag {
                target: id,
                edge: Edge::None,
                button,
                anchor: event.root,
                start,
            })
        } else if button == mouse.resize_button && (edge.is_resize() || edge == Edge::None) {
            reactor.raise_window(id);
            InteractionState::Dragging(Drag { target: id, edge, button, anchor: event.root, start })
        } else {
            return;
        };
        trace!(state = %next, "gesture started");
        reactor.interaction_manager.state = next;
    }

    fn root_press<S: WindowServer>(reactor: &mut Reactor<S>, event: PointerEvent) {
        match reactor.config.settings.root.action_for(event.button).clone() {
            RootAction::None => {}
            RootAction::Command(command) => spawn_command(&command),
            RootAction::Menu => {
                let entries = reactor.window_manager.registry.hidden();
                if entries.is_empty() {
                    debug!("no hidden windows, not showing menu");
                    return;
                }
                let title = reactor.screen_manager.engine.decoration().title;
                let menu = MenuGeometry::new(event.root, title);
                let names = entries
                    .iter()
                    .filter_map(|id| reactor.window_manager.registry.get(*id))
                    .map(|w| if w.name.is_empty() { w.id.to_string() } else { w.name.clone() })
                    .collect();
                reactor.request(Request::ShowMenu {
                    at: menu.origin,
                    row_height: menu.row_height,
                    width: menu.width,
                    entries: names,
                });
                reactor.interaction_manager.menu = Some(menu);
                reactor.interaction_manager.menu_entries = entries;
                reactor.interaction_manager.state =
                    InteractionState::MenuOpen { origin: event.root, button: event.button };
            }
        }
    }

    pub fn handle_button_release<S: WindowServer>(reactor: &mut Reactor<S>, event: PointerEvent) {
        let state = reactor.interaction_manager.reset();
        let decoration = *reactor.screen_manager.engine.decoration();
        match state {
            InteractionState::Idle => {}
            InteractionState::Dragging(drag) => {
                trace!(target = %drag.target, "drag finished");
            }
            InteractionState::PendingClose { target, .. } => {
                let Some(w) = reactor.window_manager.registry.get(target) else { return };
                let same_frame = w.frame.is_some() && w.frame == Some(event.window);
                let edge = hit_test(&decoration, w.outer(&decoration), event.root);
                if same_frame && edge == Edge::Close {
                    reactor.close_window(target);
                }
            }
            InteractionState::PendingHide { target, .. } => {
                let Some(w) = reactor.window_manager.registry.get(target) else { return };
                if !w.outer(&decoration).contains(event.root) {
                    return;
                }
                let lower = Modifiers::from(reactor.config.settings.mouse.lower_modifier);
                if event.modifiers.contains(lower) {
                    reactor.lower_window(target);
                } else {
                    reactor.hide_window(target);
                }
            }
            InteractionState::MenuOpen { .. } => {
                reactor.request(Request::HideMenu);
                let menu = reactor.interaction_manager.menu.take();
                let entries = std::mem::take(&mut reactor.interaction_manager.menu_entries);
                let chosen = menu
                    .and_then(|menu| menu.item_at(event.root, entries.len()))
                    .and_then(|i| entries.get(i).copied());
                if let Some(window) = chosen {
                    reactor.unhide_window(window);
                }
            }
        }
    }

    pub fn handle_motion<S: WindowServer>(reactor: &mut Reactor<S>, event: PointerEvent) {
        match reactor.interaction_manager.state {
            InteractionState::Dragging(drag) => {
                if !event.buttons.holds(drag.button) {
                    debug!(target = %drag.target, "drag button released elsewhere, aborting");
                    reactor.interaction_manager.reset();
                    return;
                }
                let Some(w) = reactor.window_manager.registry.get(drag.target) else {
                    reactor.interaction_manager.reset();
                    return;
                };
                let out = reactor.screen_manager.engine.sanitize(
                    &reactor.screen_manager.layout,
                    w,
                    drag.edge,
                    drag.proposal(event.root),
                );
                if out.changed {
                    reactor.apply_geometry(drag.target, out.rect);
                }
            }
            InteractionState::Idle => Self::update_hover(reactor, event),
            _ => {}
        }
    }

    fn update_hover<S: WindowServer>(reactor: &mut Reactor<S>, event: PointerEvent) {
        let registry = &mut reactor.window_manager.registry;
        if !registry.is_frame(event.window) {
            return;
        }
        let Some(w) = registry.owner_of(event.window).and_then(|id| registry.get_mut(id)) else {
            return;
        };
        let decoration = reactor.screen_manager.engine.decoration();
        let edge = hit_test(decoration, w.outer(decoration), event.root);
        if edge == w.hover_edge {
            return;
        }
        w.hover_edge = edge;
        let frame = event.window;
        reactor.request(Request::SetCursor { window: frame, shape: edge.cursor() });
    }

    pub fn handle_enter<S: WindowServer>(reactor: &mut Reactor<S>, window: WindowId, at: Instant) {
        if !reactor.interaction_manager.state.is_idle() {
            return;
        }
        match reactor.window_manager.registry.owner_of(window) {
            Some(id) => {
                if let Some(target) = reactor.focus_manager.arbiter.enter_window(at, id) {
                    reactor.focus_window(target);
                }
            }
            None => reactor.focus_manager.arbiter.enter_unmanaged(),
        }
    }

    pub fn handle_client_clicked<S: WindowServer>(reactor: &mut Reactor<S>, window: WindowId) {
        if reactor.focus_manager.arbiter.policy() != FocusPolicy::Click {
            return;
        }
        let Some(id) = reactor.window_manager.registry.owner_of(window) else { return };
        if reactor.focused() == Some(id) {
            reactor.raise_window(id);
        } else {
            reactor.focus_window(id);
        }
    }

    pub fn handle_focus_timer<S: WindowServer>(reactor: &mut Reactor<S>, now: Instant) {
        if let Some(window) = reactor.focus_manager.arbiter.fire(now) {
            trace!(%window, "deferred focus due");
            reactor.focus_window(window);
        }
    }
}

/// Runs `command` through the shell, detached from the event loop.
fn spawn_command(command: &str) {
    info!(command, "spawning");
    let child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .spawn();
    match child {
        Ok(mut child) => {
            std::thread::spawn(move || {
                if let Err(e) = child.wait() {
                    warn!("failed to reap child: {e}");
                }
            });
        }
        Err(e) => warn!(command, "failed to spawn: {e}"),
    }
}
