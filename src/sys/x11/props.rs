//! Reading client properties into model types.

use x11rb::properties::{WmHints, WmHintsState, WmSizeHints, WmSizeHintsSpecification};
use x11rb::protocol::xproto::{Atom, AtomEnum, ConnectionExt as _, Window};
use x11rb::rust_connection::RustConnection;

use super::X11Error;
use super::atoms::Atoms;
use crate::model::{NetState, Protocols, SizeHints, Strut, WindowId, WindowProperties, WmState};

pub fn read_properties(
    conn: &RustConnection,
    atoms: &Atoms,
    window: Window,
) -> Result<WindowProperties, X11Error> {
    let hints = WmHints::get(conn, window)?.reply()?;
    let state = read_atoms(conn, window, atoms._NET_WM_STATE)?;
    let types = read_atoms(conn, window, atoms._NET_WM_WINDOW_TYPE)?;
    let has = |atom: Atom| state.contains(&atom);

    let iconic_hint = matches!(
        hints.as_ref().and_then(|h| h.initial_state),
        Some(WmHintsState::Iconic)
    );
    Ok(WindowProperties {
        name: read_name(conn, atoms, window)?,
        size_hints: read_size_hints(conn, window)?,
        transient_for: read_transient_for(conn, window)?,
        protocols: read_protocols(conn, atoms, window)?,
        input: hints.as_ref().and_then(|h| h.input),
        strut: read_strut(conn, atoms, window)?,
        dock: types.contains(&atoms._NET_WM_WINDOW_TYPE_DOCK),
        fullscreen: has(atoms._NET_WM_STATE_FULLSCREEN),
        net: NetState {
            skip_taskbar: has(atoms._NET_WM_STATE_SKIP_TASKBAR),
            skip_pager: has(atoms._NET_WM_STATE_SKIP_PAGER),
            above: has(atoms._NET_WM_STATE_ABOVE),
            below: has(atoms._NET_WM_STATE_BELOW),
        },
        initially_iconic: iconic_hint || has(atoms._NET_WM_STATE_HIDDEN),
    })
}

pub fn read_atoms(
    conn: &RustConnection,
    window: Window,
    property: Atom,
) -> Result<Vec<Atom>, X11Error> {
    let reply = conn.get_property(false, window, property, AtomEnum::ATOM, 0, 64)?.reply()?;
    Ok(reply.value32().map(Iterator::collect).unwrap_or_default())
}

fn read_cardinals(
    conn: &RustConnection,
    window: Window,
    property: Atom,
    count: u32,
) -> Result<Vec<u32>, X11Error> {
    let reply = conn.get_property(false, window, property, AtomEnum::CARDINAL, 0, count)?.reply()?;
    Ok(reply.value32().map(Iterator::collect).unwrap_or_default())
}

/// `_NET_WM_NAME` when set, the legacy name otherwise.
pub fn read_name(
    conn: &RustConnection,
    atoms: &Atoms,
    window: Window,
) -> Result<String, X11Error> {
    let utf8 = conn
        .get_property(false, window, atoms._NET_WM_NAME, atoms.UTF8_STRING, 0, 256)?
        .reply()?;
    if !utf8.value.is_empty() {
        return Ok(String::from_utf8_lossy(&utf8.value).into_owned());
    }
    let legacy = conn
        .get_property(false, window, AtomEnum::WM_NAME, AtomEnum::ANY, 0, 256)?
        .reply()?;
    Ok(String::from_utf8_lossy(&legacy.value).into_owned())
}

pub fn read_size_hints(conn: &RustConnection, window: Window) -> Result<SizeHints, X11Error> {
    let Some(hints) = WmSizeHints::get_normal_hints(conn, window)?.reply()? else {
        return Ok(SizeHints::default());
    };
    let spec = hints.position.map(|(spec, _, _)| spec);
    Ok(SizeHints {
        min: hints.min_size,
        max: hints.max_size,
        base: hints.base_size,
        increment: hints.size_increment,
        user_position: matches!(spec, Some(WmSizeHintsSpecification::UserSpecified)),
        program_position: matches!(spec, Some(WmSizeHintsSpecification::ProgramSpecified)),
    })
}

fn read_transient_for(conn: &RustConnection, window: Window) -> Result<Option<WindowId>, X11Error> {
    let reply = conn
        .get_property(false, window, AtomEnum::WM_TRANSIENT_FOR, AtomEnum::WINDOW, 0, 1)?
        .reply()?;
    let leader = reply.value32().and_then(|mut v| v.next()).filter(|&w| w != x11rb::NONE);
    Ok(leader.map(WindowId))
}

pub fn read_protocols(
    conn: &RustConnection,
    atoms: &Atoms,
    window: Window,
) -> Result<Protocols, X11Error> {
    let listed = read_atoms(conn, window, atoms.WM_PROTOCOLS)?;
    Ok(Protocols {
        delete_window: listed.contains(&atoms.WM_DELETE_WINDOW),
        take_focus: listed.contains(&atoms.WM_TAKE_FOCUS),
    })
}

/// The partial strut wins over the plain one; only the four edge widths are
/// used.
pub fn read_strut(conn: &RustConnection, atoms: &Atoms, window: Window) -> Result<Strut, X11Error> {
    let mut values = read_cardinals(conn, window, atoms._NET_WM_STRUT_PARTIAL, 12)?;
    if values.len() < 4 {
        values = read_cardinals(conn, window, atoms._NET_WM_STRUT, 4)?;
    }
    if values.len() < 4 {
        return Ok(Strut::default());
    }
    let edge = |v: u32| i32::try_from(v).unwrap_or(0);
    Ok(Strut::new(edge(values[0]), edge(values[1]), edge(values[2]), edge(values[3])))
}

/// The ICCCM state a previous manager left on the window, if any.
pub fn read_wm_state(
    conn: &RustConnection,
    atoms: &Atoms,
    window: Window,
) -> Result<Option<WmState>, X11Error> {
    let reply = conn.get_property(false, window, atoms.WM_STATE, atoms.WM_STATE, 0, 2)?.reply()?;
    let state = reply.value32().and_then(|mut v| v.next());
    Ok(state.map(|s| match s {
        1 => WmState::Normal,
        3 => WmState::Iconic,
        _ => WmState::Withdrawn,
    }))
}

pub fn wm_state_value(state: WmState) -> u32 {
    match state {
        WmState::Withdrawn => 0,
        WmState::Normal => 1,
        WmState::Iconic => 3,
    }
}
