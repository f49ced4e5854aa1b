use std::fmt;

use serde::{Deserialize, Serialize};

use super::geometry::{Decoration, DimensionLimiter, Edge, Rect, Strut};
use super::hints::SizeHints;

/// Opaque handle the window server uses for a window. Stable for the
/// window's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowId(pub u32);

impl WindowId {
    pub const fn new(raw: u32) -> WindowId { WindowId(raw) }

    pub fn as_u32(self) -> u32 { self.0 }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:#x}", self.0) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WmState {
    #[default]
    Withdrawn,
    Iconic,
    Normal,
}

/// Protocols the client participates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Protocols {
    pub delete_window: bool,
    pub take_focus: bool,
}

/// State flags mirrored to the modern state contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NetState {
    pub skip_taskbar: bool,
    pub skip_pager: bool,
    pub above: bool,
    pub below: bool,
}

/// Everything a client told the server about itself when it asked to be
/// mapped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowProperties {
    pub name: String,
    pub size_hints: SizeHints,
    pub transient_for: Option<WindowId>,
    pub protocols: Protocols,
    /// `None` when the client left the input hint unset.
    pub input: Option<bool>,
    pub strut: Strut,
    pub dock: bool,
    pub fullscreen: bool,
    pub net: NetState,
    pub initially_iconic: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ManagedWindow {
    pub id: WindowId,
    /// Decoration window; present iff the window is framed.
    pub frame: Option<WindowId>,
    pub content: Rect,
    pub width: DimensionLimiter,
    pub height: DimensionLimiter,
    pub transient_for: Option<WindowId>,
    pub hidden: bool,
    pub fullscreen: bool,
    pub saved_content: Option<Rect>,
    pub state: WmState,
    pub strut: Strut,
    pub protocols: Protocols,
    pub accepts_focus: bool,
    pub hover_edge: Edge,
    pub net: NetState,
    pub name: String,
}

impl ManagedWindow {
    pub fn new(id: WindowId, content: Rect) -> ManagedWindow {
        ManagedWindow {
            id,
            frame: None,
            content,
            width: DimensionLimiter::default(),
            height: DimensionLimiter::default(),
            transient_for: None,
            hidden: false,
            fullscreen: false,
            saved_content: None,
            state: WmState::Withdrawn,
            strut: Strut::default(),
            protocols: Protocols::default(),
            accepts_focus: true,
            hover_edge: Edge::None,
            net: NetState::default(),
            name: String::new(),
        }
    }

    pub fn from_properties(id: WindowId, content: Rect, props: &WindowProperties) -> ManagedWindow {
        let (width, height) = props.size_hints.limiters();
        ManagedWindow {
            width,
            height,
            transient_for: props.transient_for.filter(|&leader| leader != id),
            strut: props.strut,
            protocols: props.protocols,
            // An unset input hint is read as "wants focus".
            accepts_focus: props.input.unwrap_or(true),
            net: props.net,
            name: props.name.clone(),
            ..ManagedWindow::new(id, content)
        }
    }

    pub fn is_framed(&self) -> bool { self.frame.is_some() }

    pub fn has_strut(&self) -> bool { !self.strut.is_empty() }

    /// Extent on screen, decoration included. Fullscreen windows drop theirs.
    pub fn outer(&self, decoration: &Decoration) -> Rect {
        match self.decoration(decoration) {
            Some(d) => d.outer(self.content),
            None => self.content,
        }
    }

    /// The decoration in effect for this window, if it shows one.
    pub fn decoration(&self, decoration: &Decoration) -> Option<Decoration> {
        (self.is_framed() && !self.fullscreen).then_some(*decoration)
    }

    pub fn is_viewable(&self) -> bool { self.state == WmState::Normal && !self.hidden }
}
