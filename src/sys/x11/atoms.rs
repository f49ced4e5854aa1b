x11rb::atom_manager! {
    pub Atoms: AtomsCookie {
        WM_PROTOCOLS,
        WM_DELETE_WINDOW,
        WM_TAKE_FOCUS,
        WM_STATE,
        WM_CHANGE_STATE,
        UTF8_STRING,
        _NET_SUPPORTED,
        _NET_SUPPORTING_WM_CHECK,
        _NET_WM_NAME,
        _NET_WM_STATE,
        _NET_WM_STATE_FULLSCREEN,
        _NET_WM_STATE_ABOVE,
        _NET_WM_STATE_BELOW,
        _NET_WM_STATE_SKIP_TASKBAR,
        _NET_WM_STATE_SKIP_PAGER,
        _NET_WM_STATE_HIDDEN,
        _NET_WM_WINDOW_TYPE,
        _NET_WM_WINDOW_TYPE_DOCK,
        _NET_WM_STRUT,
        _NET_WM_STRUT_PARTIAL,
        _NET_ACTIVE_WINDOW,
        _NET_CLIENT_LIST,
        _NET_CLIENT_LIST_STACKING,
        _NET_WORKAREA,
    }
}

impl Atoms {
    /// What we advertise in `_NET_SUPPORTED`.
    pub fn supported(&self) -> Vec<u32> {
        vec![
            self._NET_WM_NAME,
            self._NET_WM_STATE,
            self._NET_WM_STATE_FULLSCREEN,
            self._NET_WM_STATE_ABOVE,
            self._NET_WM_STATE_BELOW,
            self._NET_WM_STATE_SKIP_TASKBAR,
            self._NET_WM_STATE_SKIP_PAGER,
            self._NET_WM_STATE_HIDDEN,
            self._NET_WM_WINDOW_TYPE,
            self._NET_WM_WINDOW_TYPE_DOCK,
            self._NET_WM_STRUT,
            self._NET_WM_STRUT_PARTIAL,
            self._NET_ACTIVE_WINDOW,
            self._NET_CLIENT_LIST,
            self._NET_CLIENT_LIST_STACKING,
            self._NET_WORKAREA,
            self._NET_SUPPORTING_WM_CHECK,
        ]
    }
}
