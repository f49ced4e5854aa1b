//! The requests the window manager makes of the window server.
//!
//! The reactor talks to the server only through [`WindowServer`], so the core
//! runs unchanged against the X11 backend or a recording double in tests.

use thiserror::Error;

use crate::model::{CursorShape, NetState, Point, Rect, Strut, WindowId, WmState};

#[derive(Debug, Error)]
pub enum ServerError {
    /// The connection is gone. Nothing can be recovered after this.
    #[error("lost connection to the window server: {0}")]
    ConnectionLost(String),
    /// The server could not allocate something we needed (ids, fonts).
    #[error("window server resources exhausted: {0}")]
    Exhausted(String),
    /// A request was refused, usually because its window is already gone.
    #[error("window server refused {request}: {reason}")]
    Protocol { request: &'static str, reason: String },
}

impl ServerError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, ServerError::ConnectionLost(_) | ServerError::Exhausted(_))
    }
}

/// How a frame should be drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameStyle {
    pub focused: bool,
    pub title: String,
    /// Outer size of the frame.
    pub width: i32,
    pub height: i32,
    pub border: i32,
    pub title_height: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Place the frame (or the bare client when unframed) so the client ends
    /// up with `content`. `frame` carries the frame's outer rect.
    Configure {
        window: WindowId,
        frame: Option<(WindowId, Rect)>,
        content: Rect,
    },
    /// Tell the client its geometry without touching the window. Needed
    /// whenever the manager moves a window without resizing it.
    SyntheticConfigure { window: WindowId, content: Rect },
    Map(WindowId),
    Unmap(WindowId),
    /// Stack the given windows on top, in order (bottom first).
    Raise(Vec<WindowId>),
    Lower(WindowId),
    /// Give keyboard focus to a window, or to nobody.
    SetInputFocus(Option<WindowId>),
    /// Ask the client to take focus itself.
    TakeFocus(WindowId),
    /// Ask the client to close gracefully.
    Delete(WindowId),
    Kill(WindowId),
    /// Give the client back to the root and destroy its frame.
    DestroyFrame { frame: WindowId, client: WindowId, at: Point, mapped: bool },
    SetCursor { window: WindowId, shape: CursorShape },
    DrawFrame { frame: WindowId, style: FrameStyle },
    SetWmState { window: WindowId, state: WmState },
    SetNetState { window: WindowId, fullscreen: bool, hidden: bool, net: NetState },
    SetActiveWindow(Option<WindowId>),
    SetClientList(Vec<WindowId>),
    SetWorkarea { workarea: Rect, strut: Strut },
    /// Pop up the hidden-window menu: one row per entry, top-left at `at`.
    ShowMenu {
        at: Point,
        row_height: i32,
        width: i32,
        entries: Vec<String>,
    },
    HideMenu,
    /// The window is about to go away; errors about it are expected from now
    /// on and should not be reported.
    Forget(WindowId),
}

impl Request {
    pub fn name(&self) -> &'static str {
        match self {
            Request::Configure { .. } => "configure",
            Request::SyntheticConfigure { .. } => "synthetic_configure",
            Request::Map(_) => "map",
            Request::Unmap(_) => "unmap",
            Request::Raise(_) => "raise",
            Request::Lower(_) => "lower",
            Request::SetInputFocus(_) => "set_input_focus",
            Request::TakeFocus(_) => "take_focus",
            Request::Delete(_) => "delete",
            Request::Kill(_) => "kill",
            Request::DestroyFrame { .. } => "destroy_frame",
            Request::SetCursor { .. } => "set_cursor",
            Request::DrawFrame { .. } => "draw_frame",
            Request::SetWmState { .. } => "set_wm_state",
            Request::SetNetState { .. } => "set_net_state",
            Request::SetActiveWindow(_) => "set_active_window",
            Request::SetClientList(_) => "set_client_list",
            Request::SetWorkarea { .. } => "set_workarea",
            Request::ShowMenu { .. } => "show_menu",
            Request::HideMenu => "hide_menu",
            Request::Forget(_) => "forget",
        }
    }
}

pub trait WindowServer {
    fn send(&mut self, request: Request) -> Result<(), ServerError>;

    /// Creates a frame for `client` at `outer`, reparenting the client into it
    /// at `content_offset`.
    fn create_frame(
        &mut self,
        client: WindowId,
        outer: Rect,
        content_offset: Point,
    ) -> Result<WindowId, ServerError>;
}
