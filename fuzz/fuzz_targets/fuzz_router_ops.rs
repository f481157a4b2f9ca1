#![no_main]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use navkit_core::{Screen, ScreenId};
use navkit_runtime::{
    HostEvent, NavigationHost, Router, RouterConfig, Transition, TransitionStart,
};

#[derive(Debug, Arbitrary)]
enum Op {
    Push { animated: bool, callback: bool },
    Pop { animated: bool },
    PopTo { index: u8, animated: bool },
    PopToRoot { animated: bool },
    SetRoot,
    Present { animated: bool },
    Dismiss { animated: bool },
    Confirm,
    Cancel,
    Completed { index: u8 },
    InteractivePop,
    InteractiveDismiss,
    Post { animated: bool },
    Poll,
}

/// Animates when told to by the input.
struct FuzzHost {
    animate: bool,
}

impl NavigationHost<u16> for FuzzHost {
    fn begin(&mut self, _transition: &Transition<'_, u16>) -> TransitionStart {
        if self.animate {
            TransitionStart::Animating
        } else {
            TransitionStart::Completed
        }
    }
}

fuzz_target!(|input: (bool, u8, Vec<Op>)| {
    let (animate, max_queued, ops) = input;
    let config = RouterConfig::new().max_queued(usize::from(max_queued % 16));
    let mut router = Router::with_config(FuzzHost { animate }, config);
    let fired: Rc<RefCell<HashMap<ScreenId, u32>>> = Rc::default();
    let mut label = 0u16;
    let mut next = || {
        label = label.wrapping_add(1);
        Screen::new(label)
    };

    let _ = router.set_root(next());
    let handle = router.handle();

    for op in ops.iter().take(256) {
        match *op {
            Op::Push { animated, callback } => {
                let screen = next();
                let id = screen.id();
                if callback {
                    let fired = Rc::clone(&fired);
                    let _ = router.push_with_leave(screen, animated, move || {
                        *fired.borrow_mut().entry(id).or_insert(0) += 1;
                    });
                } else {
                    let _ = router.push(screen, animated);
                }
            }
            Op::Pop { animated } => {
                let _ = router.pop(animated);
            }
            Op::PopTo { index, animated } => {
                let projected = router.projected_snapshot();
                if !projected.is_empty() {
                    let target = projected[usize::from(index) % projected.len()];
                    let _ = router.pop_to(target, animated);
                }
            }
            Op::PopToRoot { animated } => {
                let _ = router.pop_to_root(animated);
            }
            Op::SetRoot => {
                let _ = router.set_root(next());
            }
            Op::Present { animated } => {
                let _ = router.present(next(), animated);
            }
            Op::Dismiss { animated } => {
                let _ = router.dismiss(animated);
            }
            Op::Confirm => {
                if let Some(top) = router.pending().map(|p| p.requested_top()) {
                    router.handle_host_event(HostEvent::Completed { top });
                }
            }
            Op::Cancel => {
                if let Some(top) = router.pending().map(|p| p.before_top()) {
                    router.handle_host_event(HostEvent::Cancelled { top });
                }
            }
            Op::Completed { index } => {
                let snapshot = router.snapshot();
                let top = snapshot.get(usize::from(index) % snapshot.len().max(1)).copied();
                router.handle_host_event(HostEvent::Completed { top });
            }
            Op::InteractivePop => router.handle_host_event(HostEvent::InteractivePopBegan),
            Op::InteractiveDismiss => router.handle_host_event(HostEvent::InteractiveDismissBegan),
            Op::Post { animated } => handle.with_animation(animated).push(next()),
            Op::Poll => router.poll(),
        }

        assert!(
            fired.borrow().values().all(|&n| n == 1),
            "callback ran more than once"
        );
        let snapshot = router.snapshot();
        for (i, id) in snapshot.iter().enumerate() {
            assert!(!snapshot[i + 1..].contains(id), "duplicate identity on stack");
        }
    }
});
