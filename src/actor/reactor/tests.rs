use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;

use super::testing::{frame_of, make_reactor, positioned};
use super::{Event, InteractionState, NetProperty, Reactor, StateAction};
use crate::common::config::FocusPolicy;
use crate::model::{
    Protocols, Rect, ScreenLayout, SizeHints, Strut, WindowId, WindowProperties, WmState,
};
use crate::sys::event::{Modifiers, PointerEvent};
use crate::sys::window_server::Request;

const ROOT: WindowId = WindowId(0x1ff);

// Border 2, title 16: a content rect at (100, 100) 200x150 has its frame at
// (98, 82)-(302, 252). The title bar runs y 84..100, the close box x 100..116.
fn content() -> Rect { Rect::from_xywh(100, 100, 200, 150) }

#[test_log::test]
fn managing_frames_and_maps_the_window() {
    let mut reactor = make_reactor(FocusPolicy::Enter);
    let a = reactor.manage(1, content());
    let requests = reactor.requests();

    let w = reactor.registry().get(a).unwrap();
    assert_eq!(w.frame, Some(frame_of(a)));
    assert_eq!(w.state, WmState::Normal);
    assert_eq!(w.content, content());
    assert!(requests.contains(&Request::Configure {
        window: a,
        frame: Some((frame_of(a), Rect::new(98, 82, 302, 252))),
        content: content(),
    }));
    assert!(requests.contains(&Request::Map(a)));
    assert!(requests.contains(&Request::Map(frame_of(a))));
    assert!(requests.contains(&Request::SetClientList(vec![a])));
    // Enter policy leaves focus to the pointer.
    assert_eq!(reactor.focused(), None);
}

#[test_log::test]
fn unpositioned_windows_are_placed_in_the_primary_area() {
    let mut reactor = make_reactor(FocusPolicy::Enter);
    let offscreen = Rect::from_xywh(-500, -500, 200, 150);
    let a = reactor.manage_with(1, offscreen, WindowProperties::default());
    let b = reactor.manage_with(2, offscreen, WindowProperties::default());
    assert_eq!(reactor.content(a), Some(Rect::from_xywh(2, 18, 200, 150)));
    assert_eq!(reactor.content(b), Some(Rect::from_xywh(26, 42, 200, 150)));
}

#[test_log::test]
fn click_policy_focuses_new_windows_and_falls_back_on_destroy() {
    let mut reactor = make_reactor(FocusPolicy::Click);
    let a = reactor.manage(1, content());
    let b = reactor.manage(2, content().translate(40, 40));
    assert_eq!(reactor.focused(), Some(b));
    assert_eq!(reactor.focus_history(), &[b, a]);

    reactor.requests();
    reactor.handle_event(Event::WindowDestroyed(b));
    let requests = reactor.requests();

    assert_eq!(requests.first(), Some(&Request::Forget(b)));
    assert!(
        requests
            .iter()
            .any(|r| matches!(r, Request::DestroyFrame { client, .. } if *client == b))
    );
    assert_eq!(reactor.focused(), Some(a));
    assert_eq!(reactor.focus_history(), &[a]);
    assert!(!reactor.registry().contains(b));
    assert!(requests.contains(&Request::SetInputFocus(Some(a))));
}

#[test_log::test]
fn clicking_a_client_focuses_and_raises_it() {
    let mut reactor = make_reactor(FocusPolicy::Click);
    let a = reactor.manage(1, content());
    let b = reactor.manage(2, content().translate(40, 40));
    assert_eq!(reactor.registry().stacking(), &[a, b]);

    reactor.handle_event(Event::ClientClicked(a));
    assert_eq!(reactor.focused(), Some(a));
    assert_eq!(reactor.registry().stacking(), &[b, a]);
}

#[test_log::test]
fn rapid_enters_defer_focus_to_the_last_window() {
    let mut reactor = make_reactor(FocusPolicy::Enter);
    let a = reactor.manage(1, content());
    let b = reactor.manage(2, content().translate(300, 0));
    let t0 = Instant::now();

    reactor.enter(frame_of(a), t0);
    assert_eq!(reactor.focused(), Some(a));

    reactor.enter(b, t0 + Duration::from_millis(10));
    assert_eq!(reactor.focused(), Some(a));
    assert_eq!(reactor.focus_deadline(), Some(t0 + Duration::from_millis(60)));

    reactor.handle_event(Event::FocusTimer(t0 + Duration::from_millis(60)));
    assert_eq!(reactor.focused(), Some(b));
    assert_eq!(reactor.focus_deadline(), None);
    assert_eq!(reactor.focus_history(), &[b, a]);
}

#[test_log::test]
fn drag_moves_the_window_until_release() {
    let mut reactor = make_reactor(FocusPolicy::Enter);
    let a = reactor.manage(1, content());
    let frame = frame_of(a);

    reactor.press(frame, 148, 92, 2);
    assert!(matches!(reactor.interaction(), InteractionState::Dragging(d) if d.target == a));

    reactor.requests();
    reactor.motion(frame, 178, 112, 2);
    assert_eq!(reactor.content(a), Some(Rect::from_xywh(130, 120, 200, 150)));
    // A pure move gets a synthetic notification.
    assert!(reactor.requests().contains(&Request::SyntheticConfigure {
        window: a,
        content: Rect::from_xywh(130, 120, 200, 150),
    }));

    reactor.release(frame, 178, 112, 2);
    assert_eq!(reactor.interaction(), &InteractionState::Idle);
}

#[test_log::test]
fn second_press_cancels_drag() {
    let mut reactor = make_reactor(FocusPolicy::Enter);
    let a = reactor.manage(1, content());
    let frame = frame_of(a);

    reactor.press(frame, 148, 92, 2);
    reactor.motion(frame, 178, 112, 2);
    reactor.press(frame, 178, 112, 1);
    assert_eq!(reactor.interaction(), &InteractionState::Idle);

    reactor.motion(frame, 400, 400, 2);
    assert_eq!(reactor.content(a), Some(Rect::from_xywh(130, 120, 200, 150)));
}

#[test_log::test]
fn motion_without_the_drag_button_aborts() {
    let mut reactor = make_reactor(FocusPolicy::Enter);
    let a = reactor.manage(1, content());
    let frame = frame_of(a);

    reactor.press(frame, 148, 92, 2);
    reactor.motion(frame, 300, 300, 0);
    assert_eq!(reactor.interaction(), &InteractionState::Idle);
    assert_eq!(reactor.content(a), Some(content()));
}

#[test_log::test]
fn resize_from_the_right_border() {
    let mut reactor = make_reactor(FocusPolicy::Enter);
    let a = reactor.manage(1, content());
    let frame = frame_of(a);

    reactor.press(frame, 301, 160, 1);
    reactor.requests();
    reactor.motion(frame, 331, 160, 1);
    assert_eq!(reactor.content(a), Some(Rect::from_xywh(100, 100, 230, 150)));
    assert!(
        reactor
            .requests()
            .iter()
            .any(|r| matches!(r, Request::DrawFrame { style, .. } if style.width == 234))
    );
}

#[test_log::test]
fn enter_is_ignored_while_dragging() {
    let mut reactor = make_reactor(FocusPolicy::Enter);
    let a = reactor.manage(1, content());
    let b = reactor.manage(2, content().translate(300, 0));

    reactor.press(frame_of(a), 148, 92, 2);
    reactor.enter(b, Instant::now());
    assert_eq!(reactor.focused(), None);
}

#[test_log::test]
fn close_box_asks_politely_when_supported() {
    let mut reactor = make_reactor(FocusPolicy::Enter);
    let polite = WindowProperties {
        protocols: Protocols { delete_window: true, take_focus: false },
        ..positioned()
    };
    let a = reactor.manage_with(1, content(), polite);
    let b = reactor.manage(2, content().translate(300, 0));

    reactor.press(frame_of(a), 105, 90, 1);
    assert!(matches!(reactor.interaction(), InteractionState::PendingClose { .. }));
    reactor.requests();
    reactor.release(frame_of(a), 106, 91, 1);
    assert_eq!(reactor.requests(), vec![Request::Delete(a)]);

    reactor.press(frame_of(b), 405, 90, 1);
    reactor.release(frame_of(b), 405, 90, 1);
    assert!(reactor.requests().contains(&Request::Kill(b)));
}

#[test_log::test]
fn releasing_outside_the_close_box_does_nothing() {
    let mut reactor = make_reactor(FocusPolicy::Enter);
    let a = reactor.manage(1, content());

    reactor.press(frame_of(a), 105, 90, 1);
    reactor.requests();
    reactor.release(frame_of(a), 200, 90, 1);
    assert!(reactor.requests().is_empty());
    assert_eq!(reactor.interaction(), &InteractionState::Idle);
}

#[test_log::test]
fn hide_then_restore_from_the_root_menu() {
    let mut reactor = make_reactor(FocusPolicy::Enter);
    let a = reactor.manage(1, content());

    reactor.press(frame_of(a), 148, 92, 3);
    reactor.release(frame_of(a), 148, 92, 3);
    let w = reactor.registry().get(a).unwrap();
    assert!(w.hidden);
    assert_eq!(w.state, WmState::Iconic);
    assert!(reactor.requests().contains(&Request::Unmap(frame_of(a))));

    // The client's own unmap of a hidden window is not a withdrawal.
    reactor.handle_event(Event::WindowUnmapped(a));
    assert!(reactor.registry().contains(a));

    reactor.press(ROOT, 500, 500, 2);
    assert!(matches!(reactor.interaction(), InteractionState::MenuOpen { .. }));
    let shown = reactor.requests();
    assert!(
        shown
            .iter()
            .any(|r| matches!(r, Request::ShowMenu { entries, .. } if entries.len() == 1))
    );

    reactor.release(ROOT, 510, 505, 2);
    let requests = reactor.requests();
    assert!(requests.contains(&Request::HideMenu));
    assert!(requests.contains(&Request::Map(a)));
    assert!(!reactor.registry().get(a).unwrap().hidden);
    assert_eq!(reactor.interaction(), &InteractionState::Idle);
}

#[test_log::test]
fn hide_button_with_lower_modifier_lowers() {
    let mut reactor = make_reactor(FocusPolicy::Enter);
    let a = reactor.manage(1, content());
    let b = reactor.manage(2, content().translate(20, 20));
    assert_eq!(reactor.registry().stacking(), &[a, b]);

    reactor.press(frame_of(b), 168, 112, 3);
    let release = PointerEvent::press(frame_of(b), crate::model::Point::new(168, 112), 3)
        .with_modifiers(Modifiers::SHIFT);
    reactor.handle_event(Event::ButtonRelease(release));
    assert_eq!(reactor.registry().stacking(), &[b, a]);
    assert!(!reactor.registry().get(b).unwrap().hidden);
}

#[test_log::test]
fn menu_does_not_open_without_hidden_windows() {
    let mut reactor = make_reactor(FocusPolicy::Enter);
    reactor.manage(1, content());
    reactor.press(ROOT, 500, 500, 2);
    assert_eq!(reactor.interaction(), &InteractionState::Idle);
}

#[test_log::test]
fn configure_request_respects_size_hints() {
    let mut reactor = make_reactor(FocusPolicy::Enter);
    let stepped = WindowProperties {
        size_hints: SizeHints {
            min: Some((100, 100)),
            increment: Some((10, 10)),
            user_position: true,
            ..SizeHints::default()
        },
        ..WindowProperties::default()
    };
    let a = reactor.manage_with(1, content(), stepped);

    reactor.handle_event(Event::ConfigureRequest {
        window: a,
        geometry: Rect::from_xywh(0, 0, 155, 155),
        moves: false,
        resizes: true,
    });
    assert_eq!(reactor.content(a), Some(Rect::from_xywh(100, 100, 150, 150)));
}

#[test_log::test]
fn unchanged_configure_request_gets_a_synthetic_reply() {
    let mut reactor = make_reactor(FocusPolicy::Enter);
    let a = reactor.manage(1, content());
    reactor.requests();

    reactor.handle_event(Event::ConfigureRequest {
        window: a,
        geometry: content(),
        moves: true,
        resizes: false,
    });
    assert_eq!(
        reactor.requests(),
        vec![Request::SyntheticConfigure { window: a, content: content() }]
    );
}

#[test_log::test]
fn unmanaged_configure_request_is_granted() {
    let mut reactor = make_reactor(FocusPolicy::Enter);
    let geometry = Rect::from_xywh(-20, -20, 5000, 5000);
    reactor.handle_event(Event::ConfigureRequest {
        window: WindowId(77),
        geometry,
        moves: true,
        resizes: true,
    });
    assert_eq!(
        reactor.requests(),
        vec![Request::Configure { window: WindowId(77), frame: None, content: geometry }]
    );
}

#[test_log::test]
fn dock_strut_pushes_hidden_windows_back_into_view() {
    let mut reactor = make_reactor(FocusPolicy::Enter);
    let a = reactor.manage(1, Rect::from_xywh(10, 5, 100, 10));
    assert_eq!(reactor.content(a), Some(Rect::from_xywh(10, 5, 100, 10)));

    let dock = WindowProperties {
        strut: Strut::new(0, 0, 30, 0),
        dock: true,
        ..WindowProperties::default()
    };
    let d = reactor.manage_with(2, Rect::from_xywh(0, 0, 1000, 30), dock);

    assert!(!reactor.registry().get(d).unwrap().is_framed());
    assert_eq!(reactor.layout().workarea(), Rect::new(0, 30, 1000, 800));
    // The frame's bottom row now overlaps the workarea by one pixel.
    assert_eq!(reactor.content(a), Some(Rect::from_xywh(10, 19, 100, 10)));

    reactor.handle_event(Event::WindowDestroyed(d));
    assert_eq!(reactor.layout().strut(), Strut::default());
    assert!(reactor.requests().contains(&Request::SetWorkarea {
        workarea: Rect::new(0, 0, 1000, 800),
        strut: Strut::default(),
    }));
}

#[test_log::test]
fn fullscreen_covers_the_monitor_and_restores() {
    let mut reactor = make_reactor(FocusPolicy::Enter);
    let a = reactor.manage(1, content());

    reactor.handle_event(Event::StateRequest {
        window: a,
        action: StateAction::Toggle,
        property: NetProperty::Fullscreen,
    });
    let w = reactor.registry().get(a).unwrap();
    assert!(w.fullscreen);
    assert_eq!(w.content, Rect::from_xywh(0, 0, 1000, 800));
    assert_eq!(w.saved_content, Some(content()));

    reactor.handle_event(Event::StateRequest {
        window: a,
        action: StateAction::Remove,
        property: NetProperty::Fullscreen,
    });
    let w = reactor.registry().get(a).unwrap();
    assert!(!w.fullscreen);
    assert_eq!(w.content, content());
}

#[test_log::test]
fn losing_a_monitor_rehomes_its_windows() {
    let root = Rect::from_xywh(0, 0, 2000, 800);
    let layout = ScreenLayout::new(
        root,
        vec![Rect::from_xywh(0, 0, 1000, 800), Rect::from_xywh(1000, 0, 1000, 800)],
    );
    let mut reactor = Reactor::new(
        super::testing::test_config(FocusPolicy::Enter),
        layout,
        super::testing::RecordingServer::default(),
    );
    let a = reactor.manage(1, content().translate(1100, 0));

    reactor.handle_event(Event::ScreenChanged {
        root: Rect::from_xywh(0, 0, 1000, 800),
        monitors: vec![Rect::from_xywh(0, 0, 1000, 800)],
    });
    assert_eq!(reactor.layout().monitors(), &[Rect::from_xywh(0, 0, 1000, 800)]);
    // Same-sized monitors: the window keeps its offset within the monitor.
    assert_eq!(reactor.content(a), Some(Rect::from_xywh(200, 100, 200, 150)));
}

#[test_log::test]
fn withdrawn_window_is_released_to_the_root() {
    let mut reactor = make_reactor(FocusPolicy::Enter);
    let a = reactor.manage(1, content());
    reactor.requests();

    reactor.handle_event(Event::WindowUnmapped(a));
    let requests = reactor.requests();
    assert_eq!(requests[0], Request::Forget(a));
    assert!(requests.contains(&Request::DestroyFrame {
        frame: frame_of(a),
        client: a,
        at: content().origin(),
        mapped: false,
    }));
    assert!(requests.contains(&Request::SetWmState { window: a, state: WmState::Withdrawn }));
    assert!(reactor.registry().is_empty());
}

#[test_log::test]
fn destroying_the_drag_target_returns_to_idle() {
    let mut reactor = make_reactor(FocusPolicy::Enter);
    let a = reactor.manage(1, content());
    reactor.press(frame_of(a), 148, 92, 2);
    reactor.handle_event(Event::WindowDestroyed(a));
    assert_eq!(reactor.interaction(), &InteractionState::Idle);
}

#[test_log::test]
fn shutdown_hands_frames_back() {
    let mut reactor = make_reactor(FocusPolicy::Enter);
    let a = reactor.manage(1, content());
    reactor.requests();
    reactor.shutdown();
    assert!(reactor.requests().contains(&Request::DestroyFrame {
        frame: frame_of(a),
        client: a,
        at: content().origin(),
        mapped: true,
    }));
}

#[test_log::test]
fn snapshot_lists_windows_bottom_to_top() {
    let mut reactor = make_reactor(FocusPolicy::Click);
    let a = reactor.manage(1, content());
    let b = reactor.manage(2, content().translate(30, 30));
    let snapshot = reactor.snapshot();
    let ids: Vec<WindowId> = snapshot.windows.iter().map(|w| w.id).collect();
    assert_eq!(ids, vec![a, b]);
    assert_eq!(snapshot.focus_history, vec![b, a]);
    assert!(snapshot.windows[1].is_focused);
    assert_eq!(snapshot.interaction, "idle");
}
