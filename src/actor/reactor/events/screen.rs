use tracing::{debug, info};

use crate::actor::reactor::Reactor;
use crate::layout_engine::ScreenRemapper;
use crate::model::{Rect, ScreenLayout, Strut, WindowId};
use crate::sys::window_server::WindowServer;

pub struct ScreenEventHandler;

impl ScreenEventHandler {
    pub fn handle_screen_changed<S: WindowServer>(
        reactor: &mut Reactor<S>,
        root: Rect,
        monitors: Vec<Rect>,
    ) {
        let old = &reactor.screen_manager.layout;
        let new = ScreenLayout::new(root, monitors).with_strut(old.strut());
        if new == *old {
            debug!("screen layout unchanged");
            return;
        }
        info!(%root, monitors = ?new.monitors(), "screen layout changed");

        let plan = ScreenRemapper::plan(
            &reactor.screen_manager.engine,
            old,
            &new,
            &reactor.window_manager.registry,
        );
        reactor.screen_manager.layout = new;
        for remapped in plan {
            let Some(w) = reactor.window_manager.registry.get_mut(remapped.id) else { continue };
            if remapped.saved.is_some() {
                w.saved_content = remapped.saved;
            }
            if remapped.content != w.content {
                reactor.apply_geometry(remapped.id, remapped.content);
            }
        }
        reactor.publish_workarea();
    }

    pub fn handle_strut_changed<S: WindowServer>(
        reactor: &mut Reactor<S>,
        window: WindowId,
        strut: Strut,
    ) {
        let Some(w) = reactor.window_manager.registry.get_mut(window) else { return };
        if w.strut == strut {
            return;
        }
        debug!(%window, ?strut, "strut changed");
        w.strut = strut;
        Self::recompute_strut(reactor);
    }

    /// Re-derives the reserved margins from every managed window. When they
    /// change, the workarea is republished and windows the new margins would
    /// hide are pulled back into view.
    pub fn recompute_strut<S: WindowServer>(reactor: &mut Reactor<S>) {
        let strut = reactor.window_manager.registry.aggregate_strut();
        if !reactor.screen_manager.layout.set_strut(strut) {
            return;
        }
        info!(?strut, workarea = %reactor.screen_manager.layout.workarea(), "strut changed");
        reactor.publish_workarea();

        let moves: Vec<(WindowId, Rect)> = reactor
            .window_manager
            .registry
            .iter()
            .filter(|w| !w.fullscreen)
            .filter_map(|w| {
                let engine = &reactor.screen_manager.engine;
                let rect = engine.ensure_visible(&reactor.screen_manager.layout, w, w.content);
                (rect != w.content).then_some((w.id, rect))
            })
            .collect();
        for (window, rect) in moves {
            reactor.apply_geometry(window, rect);
        }
    }
}
