#![forbid(unsafe_code)]

//! Modal present/dismiss runs beside the stack and never touches the
//! on-leave registry.

use navkit_core::{Screen, ScreenId, StackError};
use navkit_harness::{CallLog, ScriptedHost};
use navkit_runtime::{
    CallbackKind, HostEvent, ObserverPhase, Router, RouterError, RouterFault, TransitionKind,
};

type TestRouter = Router<&'static str, ScriptedHost>;

fn rooted(host: ScriptedHost) -> (TestRouter, ScreenId) {
    let mut router = Router::new(host);
    let root = Screen::new("root");
    let id = root.id();
    router.set_root(root).unwrap();
    (router, id)
}

#[test]
fn dismissal_callback_fires_on_confirmation() {
    let log = CallLog::new();
    let (mut router, root) = rooted(ScriptedHost::animating());

    let sheet = router
        .present_with_dismiss(Screen::new("sheet"), true, log.callback("sheet"))
        .unwrap();
    router.handle_host_event(HostEvent::Completed { top: Some(sheet) });
    assert_eq!(router.modals().snapshot(), vec![sheet]);

    assert_eq!(
        router
            .dismiss_with_completion(true, log.callback("done"))
            .unwrap(),
        sheet
    );
    assert!(log.is_empty());
    router.handle_host_event(HostEvent::Completed { top: None });

    assert_eq!(log.calls(), vec!["sheet", "done"]);
    assert!(router.modals().is_empty());
    assert_eq!(router.snapshot(), vec![root]);
    assert_eq!(router.registered_callbacks(), 0);
}

#[test]
fn dismiss_without_modal_is_an_error() {
    let (mut router, _) = rooted(ScriptedHost::immediate());
    assert_eq!(router.dismiss(false), Err(RouterError::NothingPresented));
}

#[test]
fn presented_screen_cannot_join_the_stack() {
    let (mut router, _) = rooted(ScriptedHost::immediate());
    let sheet = Screen::new("sheet");
    let twin = sheet.clone();
    let id = router.present(sheet, false).unwrap();
    assert_eq!(
        router.push(twin, false),
        Err(RouterError::Stack(StackError::DuplicateIdentity(id)))
    );
}

#[test]
fn cancelled_interactive_dismiss_keeps_the_modal() {
    let log = CallLog::new();
    let (mut router, _) = rooted(ScriptedHost::immediate());
    let sheet = router
        .present_with_dismiss(Screen::new("sheet"), true, log.callback("sheet"))
        .unwrap();

    router.handle_host_event(HostEvent::InteractiveDismissBegan);
    assert_eq!(
        router.pending().map(|p| p.kind()),
        Some(TransitionKind::InteractiveDismiss)
    );
    router.handle_host_event(HostEvent::Cancelled { top: Some(sheet) });

    assert!(log.is_empty());
    assert_eq!(router.modals().top_id(), Some(sheet));

    router.handle_host_event(HostEvent::InteractiveDismissBegan);
    router.handle_host_event(HostEvent::Completed { top: None });
    assert_eq!(log.calls(), vec!["sheet"]);
    assert!(router.modals().is_empty());
}

#[test]
fn cancelled_present_drops_the_dismissal_callback() {
    let log = CallLog::new();
    let (mut router, _) = rooted(ScriptedHost::animating());
    router
        .present_with_dismiss(Screen::new("sheet"), true, log.callback("sheet"))
        .unwrap();
    router.handle_host_event(HostEvent::Cancelled { top: None });

    assert!(router.modals().is_empty());
    assert_eq!(router.phase(), ObserverPhase::Idle);
    assert_eq!(router.stats().callbacks_dropped, 1);
    assert!(log.is_empty());
}

#[test]
fn stacked_modals_dismiss_top_first() {
    let log = CallLog::new();
    let (mut router, _) = rooted(ScriptedHost::immediate());
    let first = router
        .present_with_dismiss(Screen::new("first"), false, log.callback("first"))
        .unwrap();
    router
        .present_with_dismiss(Screen::new("second"), false, log.callback("second"))
        .unwrap();

    router.dismiss(false).unwrap();
    assert_eq!(router.modals().top_id(), Some(first));
    router.dismiss(false).unwrap();
    assert_eq!(log.calls(), vec!["second", "first"]);
}

#[test]
fn panicking_dismissal_still_runs_completion() {
    let log = CallLog::new();
    let sink = navkit_harness::CollectingSink::new();
    let mut router: TestRouter = Router::new(ScriptedHost::immediate()).with_sink(sink.clone());
    router.set_root(Screen::new("root")).unwrap();
    let sheet = router
        .present_with_dismiss(Screen::new("sheet"), false, log.panicking("sheet"))
        .unwrap();

    router
        .dismiss_with_completion(false, log.callback("done"))
        .unwrap();

    assert_eq!(log.calls(), vec!["sheet", "done"]);
    assert_eq!(
        sink.faults(),
        vec![RouterFault::CallbackPanicked {
            screen: sheet,
            callback: CallbackKind::Dismiss,
            message: "sheet failed".to_string(),
        }]
    );
}
