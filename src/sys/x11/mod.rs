//! The X11 backend.
//!
//! One connection is shared between the reader thread, which turns X events
//! into reactor events, and [`X11Server`], which carries out the reactor's
//! requests. Both sides go through [`Shared`].

mod atoms;
mod draw;
mod props;
mod reader;
mod server;

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
pub use server::X11Server;
use thiserror::Error;
use tracing::{debug, info, warn};
use x11rb::connection::Connection;
use x11rb::errors::{ConnectError, ConnectionError, ReplyError, ReplyOrIdError};
use x11rb::protocol::randr::{self, ConnectionExt as _};
use x11rb::protocol::xproto::{
    AtomEnum, ChangeWindowAttributesAux, ConnectionExt as _, CreateWindowAux, EventMask, MapState,
    PropMode, Screen, Window, WindowClass,
};
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;
use x11rb::x11_utils::X11Error as ProtocolError;

use self::atoms::Atoms;
use self::draw::{Cursors, Painter};
use crate::actor::reactor::{self, Event};
use crate::common::collections::HashMap;
use crate::common::config::DecorationSettings;
use crate::model::{CursorShape, Rect, WindowId, WmState};
use crate::sys::window_server::{FrameStyle, ServerError};

/// How long errors about a forgotten window are expected.
const FORGET_FOR: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum X11Error {
    #[error("cannot connect to the X server: {0}")]
    Connect(#[from] ConnectError),
    #[error("another window manager is running")]
    AnotherWindowManager,
    #[error("the X server has no screen {0}")]
    NoScreen(usize),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error(transparent)]
    Reply(#[from] ReplyError),
    #[error(transparent)]
    ReplyOrId(#[from] ReplyOrIdError),
}

impl X11Error {
    pub fn into_server_error(self, request: &'static str) -> ServerError {
        let refused = |e: ProtocolError| ServerError::Protocol {
            request,
            reason: format!("{:?} (bad value {:#x})", e.error_kind, e.bad_value),
        };
        match self {
            X11Error::Reply(ReplyError::X11Error(e))
            | X11Error::ReplyOrId(ReplyOrIdError::X11Error(e)) => refused(e),
            X11Error::ReplyOrId(ReplyOrIdError::IdsExhausted) => {
                ServerError::Exhausted("X resource ids".to_string())
            }
            other => ServerError::ConnectionLost(other.to_string()),
        }
    }
}

/// What the hidden-window menu currently shows.
struct MenuContents {
    width: i32,
    row_height: i32,
    entries: Vec<String>,
}

#[derive(Default)]
struct BackendState {
    /// Our frames, with the style they were last drawn in.
    frames: HashMap<Window, Option<FrameStyle>>,
    forgotten: HashMap<Window, Instant>,
    /// Unmaps we caused by reparenting a mapped window.
    ignored_unmaps: HashMap<Window, u32>,
    menu: Option<MenuContents>,
}

impl BackendState {
    fn forget(&mut self, window: Window) {
        let now = Instant::now();
        self.forgotten.retain(|_, at| now.duration_since(*at) < FORGET_FOR);
        self.forgotten.insert(window, now);
    }

    fn is_forgotten(&self, window: Window) -> bool {
        self.forgotten.get(&window).is_some_and(|at| at.elapsed() < FORGET_FOR)
    }

    /// Consumes one expected unmap of `window`, if there is one.
    fn take_ignored_unmap(&mut self, window: Window) -> bool {
        match self.ignored_unmaps.get_mut(&window) {
            Some(n) if *n > 1 => {
                *n -= 1;
                true
            }
            Some(_) => {
                self.ignored_unmaps.remove(&window);
                true
            }
            None => false,
        }
    }
}

struct Shared {
    conn: RustConnection,
    screen: Screen,
    atoms: Atoms,
    painter: Painter,
    cursors: Cursors,
    randr: bool,
    check_window: Window,
    menu_window: Window,
    state: Mutex<BackendState>,
}

impl Shared {
    fn root(&self) -> Window { self.screen.root }

    fn is_ours(&self, window: Window) -> bool {
        window == self.check_window || window == self.menu_window
    }

    /// Root size and monitor rects as the server reports them now.
    fn query_screen(&self) -> Result<(Rect, Vec<Rect>), X11Error> {
        let geometry = self.conn.get_geometry(self.root())?.reply()?;
        let root = Rect::from_xywh(0, 0, geometry.width.into(), geometry.height.into());
        if !self.randr {
            return Ok((root, Vec::new()));
        }
        let monitors = self
            .conn
            .randr_get_monitors(self.root(), true)?
            .reply()?
            .monitors
            .iter()
            .map(|m| Rect::from_xywh(m.x.into(), m.y.into(), m.width.into(), m.height.into()))
            .collect();
        Ok((root, monitors))
    }

    fn report_error(&self, error: &ProtocolError) {
        let window = error.bad_value;
        if self.state.lock().is_forgotten(window) {
            debug!(
                window = %WindowId(window),
                request = error.request_name,
                "expected error for departed window: {:?}",
                error.error_kind
            );
        } else {
            warn!(
                bad_value = error.bad_value,
                request = error.request_name,
                "X error: {:?}",
                error.error_kind
            );
        }
    }
}

/// An open connection on which we are the window manager.
pub struct Display {
    shared: Arc<Shared>,
}

impl Display {
    pub fn open(name: Option<&str>, decoration: &DecorationSettings) -> Result<Display, X11Error> {
        let (conn, screen_num) = x11rb::connect(name)?;
        let screen = conn
            .setup()
            .roots
            .get(screen_num)
            .cloned()
            .ok_or(X11Error::NoScreen(screen_num))?;
        let root = screen.root;
        become_window_manager(&conn, root)?;
        info!(screen = screen_num, root = %WindowId(root), "connected to X server");

        let atoms = Atoms::new(&conn)?.reply()?;
        let painter = Painter::new(&conn, &screen, decoration)?;
        let cursors = Cursors::new(&conn)?;
        let arrow = ChangeWindowAttributesAux::new().cursor(cursors.get(CursorShape::Arrow));
        conn.change_window_attributes(root, &arrow)?;

        let randr = match randr_version(&conn) {
            Ok((major, minor)) => {
                debug!(major, minor, "RandR");
                conn.randr_select_input(root, randr::NotifyMask::SCREEN_CHANGE)?;
                true
            }
            Err(e) => {
                warn!("RandR unavailable, treating the root as one monitor: {e}");
                false
            }
        };

        let check_window = conn.generate_id()?;
        conn.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            check_window,
            root,
            -1,
            -1,
            1,
            1,
            0,
            WindowClass::INPUT_ONLY,
            x11rb::COPY_FROM_PARENT,
            &CreateWindowAux::new().override_redirect(1),
        )?;
        for window in [root, check_window] {
            conn.change_property32(
                PropMode::REPLACE,
                window,
                atoms._NET_SUPPORTING_WM_CHECK,
                AtomEnum::WINDOW,
                &[check_window],
            )?;
        }
        conn.change_property8(
            PropMode::REPLACE,
            check_window,
            atoms._NET_WM_NAME,
            atoms.UTF8_STRING,
            b"ledge",
        )?;
        conn.change_property32(
            PropMode::REPLACE,
            root,
            atoms._NET_SUPPORTED,
            AtomEnum::ATOM,
            &atoms.supported(),
        )?;

        let menu = conn.generate_id()?;
        conn.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            menu,
            root,
            0,
            0,
            1,
            1,
            1,
            WindowClass::INPUT_OUTPUT,
            x11rb::COPY_FROM_PARENT,
            &CreateWindowAux::new()
                .override_redirect(1)
                .background_pixel(screen.black_pixel)
                .border_pixel(screen.white_pixel)
                .event_mask(EventMask::EXPOSURE),
        )?;
        conn.flush()?;

        Ok(Display {
            shared: Arc::new(Shared {
                conn,
                screen,
                atoms,
                painter,
                cursors,
                randr,
                check_window,
                menu_window: menu,
                state: Mutex::new(BackendState::default()),
            }),
        })
    }

    pub fn root(&self) -> WindowId { WindowId(self.shared.root()) }

    pub fn query_screen(&self) -> Result<(Rect, Vec<Rect>), X11Error> {
        self.shared.query_screen()
    }

    pub fn server(&self) -> X11Server { X11Server::new(self.shared.clone()) }

    /// Starts the thread that feeds X events to the reactor.
    pub fn spawn_reader(&self, events: reactor::Sender) -> std::io::Result<JoinHandle<()>> {
        let shared = self.shared.clone();
        std::thread::Builder::new()
            .name("x11-reader".to_string())
            .spawn(move || reader::run(&shared, &events))
    }

    /// Top-level windows that were already mapped (or iconified by a previous
    /// manager) when we started, as creation events.
    pub fn scan(&self) -> Result<Vec<Event>, X11Error> {
        let shared = &self.shared;
        let tree = shared.conn.query_tree(shared.root())?.reply()?;
        let mut events = Vec::new();
        for window in tree.children {
            if shared.is_ours(window) {
                continue;
            }
            match scan_window(shared, window) {
                Ok(Some(event)) => events.push(event),
                Ok(None) => {}
                Err(e) => debug!(window = %WindowId(window), "skipping window during scan: {e}"),
            }
        }
        info!(count = events.len(), "found existing windows");
        Ok(events)
    }
}

fn become_window_manager(conn: &RustConnection, root: Window) -> Result<(), X11Error> {
    let mask = EventMask::SUBSTRUCTURE_REDIRECT
        | EventMask::SUBSTRUCTURE_NOTIFY
        | EventMask::BUTTON_PRESS
        | EventMask::BUTTON_RELEASE
        | EventMask::ENTER_WINDOW
        | EventMask::PROPERTY_CHANGE;
    let aux = ChangeWindowAttributesAux::new().event_mask(mask);
    match conn.change_window_attributes(root, &aux)?.check() {
        Ok(()) => Ok(()),
        Err(ReplyError::X11Error(e)) if e.error_kind == x11rb::protocol::ErrorKind::Access => {
            Err(X11Error::AnotherWindowManager)
        }
        Err(e) => Err(e.into()),
    }
}

/// Selects the client events we follow for a window we are about to manage.
/// Done before its properties are read so no change slips between the two.
fn watch_client(conn: &RustConnection, window: Window) -> Result<(), X11Error> {
    let mask = EventMask::PROPERTY_CHANGE | EventMask::ENTER_WINDOW;
    conn.change_window_attributes(window, &ChangeWindowAttributesAux::new().event_mask(mask))?;
    Ok(())
}

fn randr_version(conn: &RustConnection) -> Result<(u32, u32), X11Error> {
    let version = conn.randr_query_version(1, 5)?.reply()?;
    Ok((version.major_version, version.minor_version))
}

fn scan_window(shared: &Shared, window: Window) -> Result<Option<Event>, X11Error> {
    let conn = &shared.conn;
    let attributes = conn.get_window_attributes(window)?.reply()?;
    if attributes.override_redirect {
        return Ok(None);
    }
    let wm_state = props::read_wm_state(conn, &shared.atoms, window)?;
    let iconic = wm_state == Some(WmState::Iconic);
    if attributes.map_state != MapState::VIEWABLE && !iconic {
        return Ok(None);
    }
    watch_client(conn, window)?;
    let geometry = conn.get_geometry(window)?.reply()?;
    let mut properties = props::read_properties(conn, &shared.atoms, window)?;
    properties.initially_iconic |= iconic;
    Ok(Some(Event::WindowCreated {
        window: WindowId(window),
        geometry: Rect::from_xywh(
            geometry.x.into(),
            geometry.y.into(),
            geometry.width.into(),
            geometry.height.into(),
        ),
        properties,
        existing: true,
    }))
}
