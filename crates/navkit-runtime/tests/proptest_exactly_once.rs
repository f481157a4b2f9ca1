#![forbid(unsafe_code)]

//! Property tests for leave-callback delivery.
//!
//! Validates:
//! - No callback ever runs twice, whatever the interleaving of requests,
//!   confirmations, cancellations and gestures.
//! - Every callback is either run or dropped, never both, never neither.
//! - A screen that was ever committed to the stack has its callback run.
//! - Batch pops run callbacks innermost first.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use proptest::prelude::*;

use navkit_core::{Screen, ScreenId};
use navkit_harness::ScriptedHost;
use navkit_runtime::{HostEvent, ObserverPhase, Router};

// ============================================================================
// Strategy helpers
// ============================================================================

#[derive(Debug, Clone)]
enum Op {
    Push { animated: bool, callback: bool },
    Pop { animated: bool },
    PopTo { index: usize, animated: bool },
    PopToRoot { animated: bool },
    SetRoot,
    Present { animated: bool },
    Dismiss { animated: bool },
    Confirm,
    Cancel,
    InteractivePop,
    InteractiveDismiss,
    Stray,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (any::<bool>(), any::<bool>())
            .prop_map(|(animated, callback)| Op::Push { animated, callback }),
        2 => any::<bool>().prop_map(|animated| Op::Pop { animated }),
        1 => (0usize..8, any::<bool>()).prop_map(|(index, animated)| Op::PopTo { index, animated }),
        1 => any::<bool>().prop_map(|animated| Op::PopToRoot { animated }),
        1 => Just(Op::SetRoot),
        1 => any::<bool>().prop_map(|animated| Op::Present { animated }),
        1 => any::<bool>().prop_map(|animated| Op::Dismiss { animated }),
        4 => Just(Op::Confirm),
        2 => Just(Op::Cancel),
        1 => Just(Op::InteractivePop),
        1 => Just(Op::InteractiveDismiss),
        1 => Just(Op::Stray),
    ]
}

fn ops_strategy(max_len: usize) -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(op_strategy(), 1..=max_len)
}

// ============================================================================
// Model
// ============================================================================

type Fired = Rc<RefCell<Vec<ScreenId>>>;

struct Harness {
    router: Router<u32, ScriptedHost>,
    fired: Fired,
    accepted: u64,
    with_callback: HashSet<ScreenId>,
    committed: HashSet<ScreenId>,
    next: u32,
}

impl Harness {
    fn new() -> Self {
        let mut router = Router::new(ScriptedHost::animating());
        router.set_root(Screen::new(0)).unwrap();
        Self {
            router,
            fired: Fired::default(),
            accepted: 0,
            with_callback: HashSet::new(),
            committed: HashSet::new(),
            next: 1,
        }
    }

    fn screen(&mut self) -> Screen<u32> {
        self.next += 1;
        Screen::new(self.next)
    }

    fn recorder(&self, id: ScreenId) -> impl FnOnce() + 'static {
        let fired = Rc::clone(&self.fired);
        move || fired.borrow_mut().push(id)
    }

    fn confirm(&mut self) {
        if let Some(top) = self.router.pending().map(|p| p.requested_top()) {
            self.router.handle_host_event(HostEvent::Completed { top });
        }
    }

    fn apply(&mut self, op: &Op) {
        match *op {
            Op::Push { animated, callback } => {
                let screen = self.screen();
                let id = screen.id();
                if callback {
                    let cb = self.recorder(id);
                    if self.router.push_with_leave(screen, animated, cb).is_ok() {
                        self.accepted += 1;
                        self.with_callback.insert(id);
                    }
                } else {
                    let _ = self.router.push(screen, animated);
                }
            }
            Op::Pop { animated } => {
                let _ = self.router.pop(animated);
            }
            Op::PopTo { index, animated } => {
                let projected = self.router.projected_snapshot();
                if let Some(target) = projected.get(index % projected.len().max(1)) {
                    let _ = self.router.pop_to(*target, animated);
                }
            }
            Op::PopToRoot { animated } => {
                let _ = self.router.pop_to_root(animated);
            }
            Op::SetRoot => {
                let screen = self.screen();
                let _ = self.router.set_root(screen);
            }
            Op::Present { animated } => {
                let screen = self.screen();
                let cb = self.recorder(screen.id());
                if self.router.present_with_dismiss(screen, animated, cb).is_ok() {
                    self.accepted += 1;
                }
            }
            Op::Dismiss { animated } => {
                let _ = self.router.dismiss(animated);
            }
            Op::Confirm => self.confirm(),
            Op::Cancel => {
                if let Some(top) = self.router.pending().map(|p| p.before_top()) {
                    self.router.handle_host_event(HostEvent::Cancelled { top });
                }
            }
            Op::InteractivePop => self.router.handle_host_event(HostEvent::InteractivePopBegan),
            Op::InteractiveDismiss => self
                .router
                .handle_host_event(HostEvent::InteractiveDismissBegan),
            Op::Stray => self
                .router
                .handle_host_event(HostEvent::Completed { top: None }),
        }
        self.committed.extend(self.router.snapshot());
    }

    /// Confirm everything in flight, then clear both layers.
    fn settle(&mut self) {
        for _ in 0..256 {
            if self.router.phase() == ObserverPhase::Idle && self.router.pending_requests() == 0 {
                break;
            }
            self.confirm();
            self.router.poll();
            self.committed.extend(self.router.snapshot());
        }
        let root = self.screen();
        self.router.set_root(root).unwrap();
        while !self.router.modals().is_empty() {
            self.router.dismiss(false).unwrap();
        }
    }

    fn counts(&self) -> HashMap<ScreenId, usize> {
        let mut counts = HashMap::new();
        for id in self.fired.borrow().iter() {
            *counts.entry(*id).or_insert(0) += 1;
        }
        counts
    }
}

// ============================================================================
// Invariant 1: exactly once
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn callbacks_run_at_most_once_per_step(ops in ops_strategy(60)) {
        let mut harness = Harness::new();
        for op in &ops {
            harness.apply(op);
            prop_assert!(harness.counts().values().all(|&n| n == 1));
        }
    }

    #[test]
    fn every_callback_is_run_or_dropped(ops in ops_strategy(60)) {
        let mut harness = Harness::new();
        for op in &ops {
            harness.apply(op);
        }
        harness.settle();

        prop_assert_eq!(harness.router.phase(), ObserverPhase::Idle);
        prop_assert_eq!(harness.router.registered_callbacks(), 0);

        let counts = harness.counts();
        prop_assert!(counts.values().all(|&n| n == 1));

        let stats = harness.router.stats();
        let fired = harness.fired.borrow().len() as u64;
        prop_assert_eq!(stats.callbacks_resolved, fired);
        prop_assert_eq!(fired + stats.callbacks_dropped, harness.accepted);

        for id in harness.with_callback.intersection(&harness.committed) {
            prop_assert_eq!(counts.get(id).copied(), Some(1), "committed {} never left", id);
        }
    }
}

// ============================================================================
// Invariant 2: innermost first
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn batch_pop_runs_innermost_first(depth in 1usize..12, animated in any::<bool>()) {
        let mut harness = Harness::new();
        let mut pushed = Vec::new();
        for _ in 0..depth {
            let screen = harness.screen();
            let id = screen.id();
            let cb = harness.recorder(id);
            harness.router.push_with_leave(screen, false, cb).unwrap();
            pushed.push(id);
        }

        let removed = harness.router.pop_to_root(animated).unwrap();
        harness.confirm();

        pushed.reverse();
        prop_assert_eq!(&removed, &pushed);
        prop_assert_eq!(&*harness.fired.borrow(), &pushed);
    }
}
