use tracing::{error, warn};

use super::focus::FocusArbiter;
use super::interaction::{InteractionState, MenuGeometry};
use crate::layout_engine::GeometryEngine;
use crate::model::{ScreenLayout, WindowId, WindowRegistry};
use crate::sys::window_server::{Request, ServerError, WindowServer};

/// Managed window records
pub struct WindowManager {
    pub registry: WindowRegistry,
}

/// Monitor layout and the geometry rules applied against it
pub struct ScreenManager {
    pub layout: ScreenLayout,
    pub engine: GeometryEngine,
}

/// Pointer gesture state
pub struct InteractionManager {
    pub state: InteractionState,
    /// Hidden windows listed in the open menu, in display order.
    pub menu_entries: Vec<WindowId>,
    pub menu: Option<MenuGeometry>,
}

impl InteractionManager {
    pub fn reset(&mut self) -> InteractionState { std::mem::take(&mut self.state) }
}

pub struct FocusManager {
    pub arbiter: FocusArbiter,
}

/// The connection to the window server
pub struct CommunicationManager<S> {
    pub server: S,
    /// First unrecoverable error; the event loop stops once this is set.
    pub fatal: Option<ServerError>,
}

impl<S: WindowServer> CommunicationManager<S> {
    pub fn send(&mut self, request: Request) {
        if self.fatal.is_some() {
            return;
        }
        let name = request.name();
        match self.server.send(request) {
            Ok(()) => {}
            Err(e) if e.is_fatal() => {
                error!(request = name, "{e}");
                self.fatal = Some(e);
            }
            Err(e) => warn!(request = name, "{e}"),
        }
    }
}
