use std::sync::Arc;

use tracing::trace;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{
    AtomEnum, ButtonIndex, CONFIGURE_NOTIFY_EVENT, ChangeWindowAttributesAux, ClientMessageEvent,
    ConfigureNotifyEvent, ConfigureWindowAux, ConnectionExt as _, CreateWindowAux, EventMask,
    GrabMode, InputFocus, MapState, ModMask, PropMode, SetMode, StackMode, Window, WindowClass,
};
use x11rb::wrapper::ConnectionExt as _;
use x11rb::{CURRENT_TIME, NONE};

use super::draw::{clamp_u16, clamp16};
use super::{MenuContents, Shared, X11Error, props};
use crate::model::{NetState, Point, Rect, WindowId};
use crate::sys::window_server::{Request, ServerError, WindowServer};

/// Carries out reactor requests on the shared connection.
pub struct X11Server {
    shared: Arc<Shared>,
}

impl X11Server {
    pub(super) fn new(shared: Arc<Shared>) -> X11Server { X11Server { shared } }

    fn execute(&self, request: Request) -> Result<(), X11Error> {
        let shared = &*self.shared;
        let conn = &shared.conn;
        let atoms = &shared.atoms;
        match request {
            Request::Configure { window, frame, content } => match frame {
                Some((frame, outer)) => {
                    conn.configure_window(frame.0, &geometry(outer))?;
                    let inner = Rect::from_xywh(
                        content.x_min - outer.x_min,
                        content.y_min - outer.y_min,
                        content.width(),
                        content.height(),
                    );
                    conn.configure_window(window.0, &geometry(inner))?;
                }
                None => {
                    conn.configure_window(window.0, &geometry(content))?;
                }
            },
            Request::SyntheticConfigure { window, content } => {
                let event = ConfigureNotifyEvent {
                    response_type: CONFIGURE_NOTIFY_EVENT,
                    sequence: 0,
                    event: window.0,
                    window: window.0,
                    above_sibling: NONE,
                    x: clamp16(content.x_min),
                    y: clamp16(content.y_min),
                    width: clamp_u16(content.width()),
                    height: clamp_u16(content.height()),
                    border_width: 0,
                    override_redirect: false,
                };
                conn.send_event(false, window.0, EventMask::STRUCTURE_NOTIFY, event)?;
            }
            Request::Map(window) => {
                conn.map_window(window.0)?;
            }
            Request::Unmap(window) => {
                conn.unmap_window(window.0)?;
            }
            Request::Raise(windows) => {
                for window in windows {
                    let aux = ConfigureWindowAux::new().stack_mode(StackMode::ABOVE);
                    conn.configure_window(window.0, &aux)?;
                }
            }
            Request::Lower(window) => {
                let aux = ConfigureWindowAux::new().stack_mode(StackMode::BELOW);
                conn.configure_window(window.0, &aux)?;
            }
            Request::SetInputFocus(window) => {
                let target = window.map_or(shared.root(), |w| w.0);
                conn.set_input_focus(InputFocus::POINTER_ROOT, target, CURRENT_TIME)?;
            }
            Request::TakeFocus(window) => {
                self.send_protocol(window.0, atoms.WM_TAKE_FOCUS)?;
            }
            Request::Delete(window) => {
                self.send_protocol(window.0, atoms.WM_DELETE_WINDOW)?;
            }
            Request::Kill(window) => {
                conn.kill_client(window.0)?;
            }
            Request::DestroyFrame { frame, client, at, mapped } => {
                shared.state.lock().frames.remove(&frame.0);
                conn.unmap_window(frame.0)?;
                conn.reparent_window(client.0, shared.root(), clamp16(at.x), clamp16(at.y))?;
                conn.change_save_set(SetMode::DELETE, client.0)?;
                if mapped {
                    conn.map_window(client.0)?;
                }
                conn.destroy_window(frame.0)?;
            }
            Request::SetCursor { window, shape } => {
                let aux = ChangeWindowAttributesAux::new().cursor(shared.cursors.get(shape));
                conn.change_window_attributes(window.0, &aux)?;
            }
            Request::DrawFrame { frame, style } => {
                let mut state = shared.state.lock();
                shared.painter.draw_frame(conn, frame.0, &style)?;
                state.frames.insert(frame.0, Some(style));
            }
            Request::SetWmState { window, state } => {
                let value = props::wm_state_value(state);
                conn.change_property32(
                    PropMode::REPLACE,
                    window.0,
                    atoms.WM_STATE,
                    atoms.WM_STATE,
                    &[value, NONE],
                )?;
            }
            Request::SetNetState { window, fullscreen, hidden, net } => {
                let list = self.net_state_atoms(fullscreen, hidden, net);
                conn.change_property32(
                    PropMode::REPLACE,
                    window.0,
                    atoms._NET_WM_STATE,
                    AtomEnum::ATOM,
                    &list,
                )?;
            }
            Request::SetActiveWindow(window) => {
                let value = window.map_or(NONE, |w| w.0);
                conn.change_property32(
                    PropMode::REPLACE,
                    shared.root(),
                    atoms._NET_ACTIVE_WINDOW,
                    AtomEnum::WINDOW,
                    &[value],
                )?;
            }
            Request::SetClientList(windows) => {
                let ids: Vec<u32> = windows.iter().map(|w| w.0).collect();
                for property in [atoms._NET_CLIENT_LIST, atoms._NET_CLIENT_LIST_STACKING] {
                    conn.change_property32(
                        PropMode::REPLACE,
                        shared.root(),
                        property,
                        AtomEnum::WINDOW,
                        &ids,
                    )?;
                }
            }
            Request::SetWorkarea { workarea, .. } => {
                let value = workarea_value(workarea);
                conn.change_property32(
                    PropMode::REPLACE,
                    shared.root(),
                    atoms._NET_WORKAREA,
                    AtomEnum::CARDINAL,
                    &value,
                )?;
            }
            Request::ShowMenu { at, row_height, width, entries } => {
                self.show_menu(at, row_height, width, entries)?;
            }
            Request::HideMenu => {
                shared.state.lock().menu = None;
                conn.unmap_window(shared.menu_window)?;
            }
            Request::Forget(window) => {
                shared.state.lock().forget(window.0);
            }
        }
        conn.flush()?;
        Ok(())
    }

    fn send_protocol(&self, window: Window, protocol: u32) -> Result<(), X11Error> {
        let shared = &*self.shared;
        let event = ClientMessageEvent::new(
            32,
            window,
            shared.atoms.WM_PROTOCOLS,
            [protocol, CURRENT_TIME, 0, 0, 0],
        );
        shared.conn.send_event(false, window, EventMask::NO_EVENT, event)?;
        Ok(())
    }

    fn net_state_atoms(&self, fullscreen: bool, hidden: bool, net: NetState) -> Vec<u32> {
        let atoms = &self.shared.atoms;
        [
            (fullscreen, atoms._NET_WM_STATE_FULLSCREEN),
            (hidden, atoms._NET_WM_STATE_HIDDEN),
            (net.above, atoms._NET_WM_STATE_ABOVE),
            (net.below, atoms._NET_WM_STATE_BELOW),
            (net.skip_taskbar, atoms._NET_WM_STATE_SKIP_TASKBAR),
            (net.skip_pager, atoms._NET_WM_STATE_SKIP_PAGER),
        ]
        .into_iter()
        .filter_map(|(set, atom)| set.then_some(atom))
        .collect()
    }

    fn show_menu(
        &self,
        at: Point,
        row_height: i32,
        width: i32,
        entries: Vec<String>,
    ) -> Result<(), X11Error> {
        let shared = &*self.shared;
        let conn = &shared.conn;
        let menu = shared.menu_window;
        let height = row_height * entries.len() as i32;
        let aux = ConfigureWindowAux::new()
            .x(i32::from(clamp16(at.x)))
            .y(i32::from(clamp16(at.y)))
            .width(u32::from(clamp_u16(width)))
            .height(u32::from(clamp_u16(height)))
            .stack_mode(StackMode::ABOVE);
        conn.configure_window(menu, &aux)?;
        conn.map_window(menu)?;
        let mut state = shared.state.lock();
        shared.painter.draw_menu(conn, menu, width, row_height, &entries)?;
        state.menu = Some(MenuContents { width, row_height, entries });
        Ok(())
    }
}

impl WindowServer for X11Server {
    fn send(&mut self, request: Request) -> Result<(), ServerError> {
        let name = request.name();
        trace!(request = name, "X request");
        self.execute(request).map_err(|e| e.into_server_error(name))
    }

    fn create_frame(
        &mut self,
        client: WindowId,
        outer: Rect,
        content_offset: Point,
    ) -> Result<WindowId, ServerError> {
        self.frame(client.0, outer, content_offset)
            .map(WindowId)
            .map_err(|e| e.into_server_error("create_frame"))
    }
}

impl X11Server {
    fn frame(&self, client: Window, outer: Rect, offset: Point) -> Result<Window, X11Error> {
        let shared = &*self.shared;
        let conn = &shared.conn;
        let frame = conn.generate_id()?;
        let frame_mask = EventMask::SUBSTRUCTURE_REDIRECT
            | EventMask::SUBSTRUCTURE_NOTIFY
            | EventMask::EXPOSURE
            | EventMask::BUTTON_PRESS
            | EventMask::BUTTON_RELEASE
            | EventMask::POINTER_MOTION
            | EventMask::ENTER_WINDOW;
        conn.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            frame,
            shared.root(),
            clamp16(outer.x_min),
            clamp16(outer.y_min),
            clamp_u16(outer.width()),
            clamp_u16(outer.height()),
            0,
            WindowClass::INPUT_OUTPUT,
            x11rb::COPY_FROM_PARENT,
            &CreateWindowAux::new()
                .background_pixel(shared.screen.black_pixel)
                .event_mask(frame_mask),
        )?;

        let attributes = conn.get_window_attributes(client)?.reply()?;
        if attributes.map_state == MapState::VIEWABLE {
            *shared.state.lock().ignored_unmaps.entry(client).or_insert(0) += 1;
        }
        conn.change_save_set(SetMode::INSERT, client)?;
        conn.reparent_window(client, frame, clamp16(offset.x), clamp16(offset.y))?;
        // Clicks inside the client are held until we have seen them.
        conn.grab_button(
            false,
            client,
            EventMask::BUTTON_PRESS,
            GrabMode::SYNC,
            GrabMode::ASYNC,
            NONE,
            NONE,
            ButtonIndex::ANY,
            ModMask::ANY,
        )?;
        conn.configure_window(client, &ConfigureWindowAux::new().border_width(0))?;

        shared.state.lock().frames.insert(frame, None);
        conn.flush()?;
        trace!(client = %WindowId(client), frame = %WindowId(frame), "created frame");
        Ok(frame)
    }
}

fn geometry(rect: Rect) -> ConfigureWindowAux {
    ConfigureWindowAux::new()
        .x(i32::from(clamp16(rect.x_min)))
        .y(i32::from(clamp16(rect.y_min)))
        .width(u32::from(clamp_u16(rect.width())))
        .height(u32::from(clamp_u16(rect.height())))
}

/// `_NET_WORKAREA` for our single desktop.
fn workarea_value(workarea: Rect) -> [u32; 4] {
    let unsigned = |v: i32| u32::try_from(v).unwrap_or(0);
    [
        unsigned(workarea.x_min),
        unsigned(workarea.y_min),
        unsigned(workarea.width()),
        unsigned(workarea.height()),
    ]
}
