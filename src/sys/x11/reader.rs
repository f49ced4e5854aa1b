//! Turns X events into reactor events.

use std::time::Instant;

use tracing::{debug, error, info, trace, warn};
use x11rb::connection::Connection;
use x11rb::protocol::Event as XEvent;
use x11rb::protocol::xproto::{
    Allow, AtomEnum, ButtonPressEvent, ClientMessageEvent, ConfigWindow, ConfigureRequestEvent,
    ConnectionExt as _, KeyButMask, MotionNotifyEvent, NotifyDetail, NotifyMode,
    PropertyNotifyEvent, Timestamp, Window,
};

use super::{Shared, X11Error, props, watch_client};
use crate::actor::reactor::{self, Event, NetProperty, StateAction};
use crate::model::{Point, Rect, WindowId};
use crate::sys::event::{ButtonMask, Modifiers, PointerEvent};

/// `WM_CHANGE_STATE` value asking to be iconified.
const ICONIC_STATE: u32 = 3;

pub fn run(shared: &Shared, events: &reactor::Sender) {
    info!("event reader started");
    loop {
        let event = match shared.conn.wait_for_event() {
            Ok(event) => event,
            Err(e) => {
                error!("X connection failed: {e}");
                events.send(Event::ConnectionLost(e.to_string()));
                return;
            }
        };
        for translated in translate(shared, event) {
            if events.try_send(translated).is_err() {
                debug!("reactor gone, event reader exiting");
                return;
            }
        }
    }
}

fn translate(shared: &Shared, event: XEvent) -> Vec<Event> {
    let single = match event {
        XEvent::MapRequest(e) => match created(shared, e.window) {
            Ok(event) => Some(event),
            Err(e) => {
                debug!("window vanished before it could be managed: {e}");
                None
            }
        },
        XEvent::DestroyNotify(e) => Some(Event::WindowDestroyed(WindowId(e.window))),
        XEvent::UnmapNotify(e) => {
            if shared.state.lock().take_ignored_unmap(e.window) {
                trace!(window = %WindowId(e.window), "ignoring unmap caused by reparenting");
                None
            } else {
                Some(Event::WindowUnmapped(WindowId(e.window)))
            }
        }
        XEvent::ReparentNotify(e) => Some(Event::WindowReparented {
            window: WindowId(e.window),
            parent: WindowId(e.parent),
        }),
        XEvent::ConfigureRequest(e) => Some(configure_request(&e)),
        XEvent::PropertyNotify(e) => property_changed(shared, &e),
        XEvent::ClientMessage(e) => return client_message(shared, &e),
        XEvent::ButtonPress(e) => button_press(shared, &e),
        XEvent::ButtonRelease(e) => {
            owns_pointer(shared, e.event).then(|| Event::ButtonRelease(pointer(&e)))
        }
        XEvent::MotionNotify(e) => Some(Event::Motion(motion(&e))),
        XEvent::EnterNotify(e) => {
            let counts = e.mode == NotifyMode::NORMAL && e.detail != NotifyDetail::INFERIOR;
            counts.then(|| Event::EnterNotify { window: WindowId(e.event), at: Instant::now() })
        }
        XEvent::Expose(e) => {
            if e.count == 0 {
                redraw(shared, e.window);
            }
            None
        }
        XEvent::RandrScreenChangeNotify(_) => match shared.query_screen() {
            Ok((root, monitors)) => Some(Event::ScreenChanged { root, monitors }),
            Err(e) => {
                warn!("failed to query screen after change: {e}");
                None
            }
        },
        XEvent::Error(e) => {
            shared.report_error(&e);
            None
        }
        other => {
            trace!(?other, "unhandled X event");
            None
        }
    };
    single.into_iter().collect()
}

fn created(shared: &Shared, window: Window) -> Result<Event, X11Error> {
    watch_client(&shared.conn, window)?;
    let geometry = shared.conn.get_geometry(window)?.reply()?;
    let properties = props::read_properties(&shared.conn, &shared.atoms, window)?;
    Ok(Event::WindowCreated {
        window: WindowId(window),
        geometry: Rect::from_xywh(
            geometry.x.into(),
            geometry.y.into(),
            geometry.width.into(),
            geometry.height.into(),
        ),
        properties,
        existing: false,
    })
}

/// Unset fields carry the window's current values, so the rect is always
/// complete.
fn configure_request(e: &ConfigureRequestEvent) -> Event {
    let mask = e.value_mask;
    Event::ConfigureRequest {
        window: WindowId(e.window),
        geometry: Rect::from_xywh(e.x.into(), e.y.into(), e.width.into(), e.height.into()),
        moves: mask.contains(ConfigWindow::X) || mask.contains(ConfigWindow::Y),
        resizes: mask.contains(ConfigWindow::WIDTH) || mask.contains(ConfigWindow::HEIGHT),
    }
}

fn property_changed(shared: &Shared, e: &PropertyNotifyEvent) -> Option<Event> {
    let (conn, atoms) = (&shared.conn, &shared.atoms);
    let window = WindowId(e.window);
    let atom = e.atom;
    let result = if atom == u32::from(AtomEnum::WM_NORMAL_HINTS) {
        props::read_size_hints(conn, e.window).map(|h| Event::HintsChanged(window, h))
    } else if atom == atoms.WM_PROTOCOLS {
        props::read_protocols(conn, atoms, e.window).map(|p| Event::ProtocolsChanged(window, p))
    } else if atom == atoms._NET_WM_STRUT || atom == atoms._NET_WM_STRUT_PARTIAL {
        props::read_strut(conn, atoms, e.window).map(|s| Event::StrutChanged(window, s))
    } else if atom == u32::from(AtomEnum::WM_NAME) || atom == atoms._NET_WM_NAME {
        props::read_name(conn, atoms, e.window).map(|n| Event::NameChanged(window, n))
    } else {
        return None;
    };
    result
        .inspect_err(|err| debug!(%window, "failed to read changed property: {err}"))
        .ok()
}

fn client_message(shared: &Shared, e: &ClientMessageEvent) -> Vec<Event> {
    let atoms = &shared.atoms;
    let window = WindowId(e.window);
    let data = e.data.as_data32();
    if e.type_ == atoms._NET_WM_STATE {
        let action = match data[0] {
            0 => StateAction::Remove,
            1 => StateAction::Add,
            2 => StateAction::Toggle,
            other => {
                debug!(%window, action = other, "unknown _NET_WM_STATE action");
                return Vec::new();
            }
        };
        return [data[1], data[2]]
            .into_iter()
            .filter_map(|atom| net_property(shared, atom))
            .map(|property| Event::StateRequest { window, action, property })
            .collect();
    }
    if e.type_ == atoms._NET_ACTIVE_WINDOW {
        return vec![Event::ActivateRequest(window)];
    }
    if e.type_ == atoms.WM_CHANGE_STATE && data[0] == ICONIC_STATE {
        return vec![Event::StateRequest {
            window,
            action: StateAction::Add,
            property: NetProperty::Hidden,
        }];
    }
    trace!(%window, message_type = e.type_, "ignoring client message");
    Vec::new()
}

fn net_property(shared: &Shared, atom: u32) -> Option<NetProperty> {
    let atoms = &shared.atoms;
    [
        (atoms._NET_WM_STATE_FULLSCREEN, NetProperty::Fullscreen),
        (atoms._NET_WM_STATE_ABOVE, NetProperty::Above),
        (atoms._NET_WM_STATE_BELOW, NetProperty::Below),
        (atoms._NET_WM_STATE_SKIP_TASKBAR, NetProperty::SkipTaskbar),
        (atoms._NET_WM_STATE_SKIP_PAGER, NetProperty::SkipPager),
        (atoms._NET_WM_STATE_HIDDEN, NetProperty::Hidden),
    ]
    .into_iter()
    .find_map(|(known, property)| (known == atom).then_some(property))
}

/// Presses on the root or a frame go to the reactor. Presses inside a client
/// only arrive through the focus grab; they are replayed to the client.
fn button_press(shared: &Shared, e: &ButtonPressEvent) -> Option<Event> {
    if owns_pointer(shared, e.event) {
        return Some(Event::ButtonPress(pointer(e)));
    }
    if let Err(err) = replay(shared, e.time) {
        warn!("failed to replay click to client: {err}");
    }
    Some(Event::ClientClicked(WindowId(e.event)))
}

/// Whether button events on `window` are ours rather than a client's.
fn owns_pointer(shared: &Shared, window: Window) -> bool {
    window == shared.root() || shared.state.lock().frames.contains_key(&window)
}

fn replay(shared: &Shared, time: Timestamp) -> Result<(), X11Error> {
    shared.conn.allow_events(Allow::REPLAY_POINTER, time)?;
    shared.conn.flush()?;
    Ok(())
}

fn pointer(e: &ButtonPressEvent) -> PointerEvent {
    PointerEvent {
        window: WindowId(e.event),
        root: Point::new(e.root_x.into(), e.root_y.into()),
        button: e.detail,
        modifiers: modifiers(e.state),
        buttons: buttons(e.state),
    }
}

fn motion(e: &MotionNotifyEvent) -> PointerEvent {
    PointerEvent {
        window: WindowId(e.event),
        root: Point::new(e.root_x.into(), e.root_y.into()),
        button: 0,
        modifiers: modifiers(e.state),
        buttons: buttons(e.state),
    }
}

fn modifiers(state: KeyButMask) -> Modifiers { Modifiers::from_bits_truncate(u16::from(state)) }

fn buttons(state: KeyButMask) -> ButtonMask { ButtonMask::from_bits_truncate(u16::from(state)) }

fn redraw(shared: &Shared, window: Window) {
    let state = shared.state.lock();
    let result = if let Some(Some(style)) = state.frames.get(&window) {
        shared.painter.draw_frame(&shared.conn, window, style)
    } else if window == shared.menu_window
        && let Some(menu) = &state.menu
    {
        shared.painter.draw_menu(
            &shared.conn,
            window,
            menu.width,
            menu.row_height,
            &menu.entries,
        )
    } else {
        return;
    };
    if let Err(e) = result.and_then(|()| shared.conn.flush()) {
        warn!(window = %WindowId(window), "failed to redraw: {e}");
    }
}
