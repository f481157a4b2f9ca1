#![forbid(unsafe_code)]

//! Transition observer: the state machine between "mutation requested" and
//! "mutation confirmed".
//!
//! # State machine
//!
//! ```text
//!            request (animated, host animating)
//!   ┌──────┐ ─────────────────────────────────▶ ┌────────────┐
//!   │ Idle │                                    │ Animating  │
//!   └──────┘ ◀───────────── cancelled ───────── └────────────┘
//!      ▲  │                                          │
//!      │  │ request (not animated)                   │ completed
//!      │  ▼                                          ▼
//!      │ ┌─────────────────────────────────────────────────┐
//!      └─│ Reconciling: removed = before − after,          │
//!        │ resolve innermost first                         │
//!        └─────────────────────────────────────────────────┘
//! ```
//!
//! # Invariants
//!
//! 1. At most one [`PendingTransition`] exists at a time.
//! 2. Nothing is resolved while `Animating`; only a confirmation moves the
//!    observer on.
//! 3. A cancellation resolves nothing and leaves the registry untouched.
//! 4. Removed identities are resolved innermost (most recently pushed)
//!    first, each exactly once.
//!
//! # Failure Modes
//!
//! - **Signal in the wrong state** (completion while idle, a top that matches
//!   neither side of the pending transition): the signal is discarded and a
//!   [`DiscardReason`] is returned for logging. It is never an error.
//! - **Panicking callback**: caught by the registry, reported to the sink,
//!   and the remaining identities are still resolved.

use navkit_core::{CompletionRegistry, ModalEntry, OnDismiss, Resolution, Screen, ScreenId};
use tracing::info_span;
use web_time::Instant;

use crate::host::{HostEvent, TransitionKind};
use crate::sink::{CallbackKind, ErrorSink, RouterFault};

/// Observable phase of a [`TransitionObserver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObserverPhase {
    /// No transition in flight; requests run immediately.
    #[default]
    Idle,
    /// A transition is animating; requests are queued.
    Animating,
    /// Removed identities are being resolved.
    Reconciling,
}

impl ObserverPhase {
    /// Stable name for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Animating => "animating",
            Self::Reconciling => "reconciling",
        }
    }
}

/// The edit to apply to the committed layers once confirmed.
pub(crate) enum StagedEdit<C> {
    Push(Screen<C>),
    Pop,
    PopTo(ScreenId),
    SetRoot(Screen<C>),
    Present(ModalEntry<C>),
    Dismiss(Option<OnDismiss>),
}

/// An in-flight mutation.
pub struct PendingTransition<C> {
    kind: TransitionKind,
    animated: bool,
    before: Vec<ScreenId>,
    requested: Vec<ScreenId>,
    edit: StagedEdit<C>,
    started: Instant,
}

impl<C> std::fmt::Debug for PendingTransition<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingTransition")
            .field("kind", &self.kind)
            .field("animated", &self.animated)
            .field("before", &self.before)
            .field("requested", &self.requested)
            .finish_non_exhaustive()
    }
}

impl<C> PendingTransition<C> {
    pub(crate) fn new(
        kind: TransitionKind,
        animated: bool,
        before: Vec<ScreenId>,
        requested: Vec<ScreenId>,
        edit: StagedEdit<C>,
    ) -> Self {
        Self {
            kind,
            animated,
            before,
            requested,
            edit,
            started: Instant::now(),
        }
    }

    /// What the transition does.
    pub fn kind(&self) -> TransitionKind {
        self.kind
    }

    /// Whether the transition was requested animated.
    pub fn animated(&self) -> bool {
        self.animated
    }

    /// Identities of the touched layer before the mutation.
    pub fn before(&self) -> &[ScreenId] {
        &self.before
    }

    /// Identities of the touched layer after the mutation, if confirmed.
    pub fn requested(&self) -> &[ScreenId] {
        &self.requested
    }

    /// Top before the mutation.
    pub fn before_top(&self) -> Option<ScreenId> {
        self.before.last().copied()
    }

    /// Top the mutation asks for.
    pub fn requested_top(&self) -> Option<ScreenId> {
        self.requested.last().copied()
    }

    /// The screen entering the touched layer, if any.
    pub fn incoming(&self) -> Option<&Screen<C>> {
        match &self.edit {
            StagedEdit::Push(screen) | StagedEdit::SetRoot(screen) => Some(screen),
            StagedEdit::Present(entry) => Some(entry.screen()),
            StagedEdit::Pop | StagedEdit::PopTo(_) | StagedEdit::Dismiss(_) => None,
        }
    }

    /// Identities the mutation removes, innermost first.
    pub fn removed(&self) -> Vec<ScreenId> {
        removed_innermost_first(&self.before, &self.requested)
    }

    pub(crate) fn elapsed_us(&self) -> u64 {
        self.started.elapsed().as_micros() as u64
    }

    pub(crate) fn into_parts(self) -> (Vec<ScreenId>, StagedEdit<C>) {
        (self.before, self.edit)
    }
}

/// `before − after` by identity, innermost (last in `before`) first.
pub fn removed_innermost_first(before: &[ScreenId], after: &[ScreenId]) -> Vec<ScreenId> {
    before
        .iter()
        .rev()
        .filter(|id| !after.contains(*id))
        .copied()
        .collect()
}

/// Why a host signal was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// A completion or cancellation arrived with nothing in flight.
    NothingPending,
    /// The reported top matches neither the requested nor the previous top.
    TopMismatch {
        expected: Option<ScreenId>,
        reported: Option<ScreenId>,
    },
    /// A gesture started while another transition was in flight.
    Busy,
    /// An interactive pop started with only the root on the stack.
    NothingToPop,
    /// An interactive dismissal started with no modal presented.
    NothingToDismiss,
}

impl DiscardReason {
    /// Stable name for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NothingPending => "nothing_pending",
            Self::TopMismatch { .. } => "top_mismatch",
            Self::Busy => "busy",
            Self::NothingToPop => "nothing_to_pop",
            Self::NothingToDismiss => "nothing_to_dismiss",
        }
    }
}

/// Outcome of feeding a confirmation signal to the observer.
pub(crate) enum Verdict<C> {
    /// Apply the edit and reconcile. The observer is now `Reconciling`.
    Commit(PendingTransition<C>),
    /// Roll back. The observer is now `Idle`.
    Cancel(PendingTransition<C>),
    /// Ignore the signal. The observer state is unchanged.
    Discard(DiscardReason),
}

/// Counters from one reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Identities that left the layer.
    pub removed: u64,
    /// Callbacks that ran (including ones that panicked).
    pub resolved: u64,
    /// Callbacks that panicked.
    pub failed: u64,
}

enum State<C> {
    Idle,
    Animating(PendingTransition<C>),
    Reconciling,
}

/// The Idle / Animating / Reconciling state machine.
pub struct TransitionObserver<C> {
    state: State<C>,
}

impl<C> std::fmt::Debug for TransitionObserver<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionObserver")
            .field("phase", &self.phase())
            .field("pending", &self.pending())
            .finish()
    }
}

impl<C> Default for TransitionObserver<C> {
    fn default() -> Self {
        Self { state: State::Idle }
    }
}

impl<C> TransitionObserver<C> {
    /// Create an idle observer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> ObserverPhase {
        match self.state {
            State::Idle => ObserverPhase::Idle,
            State::Animating(_) => ObserverPhase::Animating,
            State::Reconciling => ObserverPhase::Reconciling,
        }
    }

    /// The in-flight transition, while animating.
    pub fn pending(&self) -> Option<&PendingTransition<C>> {
        match &self.state {
            State::Animating(pending) => Some(pending),
            State::Idle | State::Reconciling => None,
        }
    }

    /// Whether requests may run now.
    #[inline]
    pub fn is_idle(&self) -> bool {
        matches!(self.state, State::Idle)
    }

    /// `Idle -> Animating`. Returns the transition back if not idle.
    pub(crate) fn begin_animating(
        &mut self,
        pending: PendingTransition<C>,
    ) -> Result<(), PendingTransition<C>> {
        if !self.is_idle() {
            return Err(pending);
        }
        self.state = State::Animating(pending);
        Ok(())
    }

    /// `Idle -> Reconciling` for transitions that complete synchronously.
    pub(crate) fn begin_reconciling(&mut self) {
        debug_assert!(self.is_idle(), "synchronous commit while busy");
        self.state = State::Reconciling;
    }

    /// `Reconciling -> Idle`.
    pub(crate) fn finish(&mut self) {
        self.state = State::Idle;
    }

    /// Feed a `Completed` or `Cancelled` signal.
    ///
    /// A `Completed` whose top equals the pre-mutation top is a cancellation:
    /// hosts that only report "now showing X" say the same thing for both.
    pub(crate) fn observe(&mut self, event: HostEvent) -> Verdict<C> {
        let (reported, completed) = match event {
            HostEvent::Completed { top } => (top, true),
            HostEvent::Cancelled { top } => (top, false),
            HostEvent::InteractivePopBegan | HostEvent::InteractiveDismissBegan => {
                return Verdict::Discard(DiscardReason::Busy);
            }
        };

        let pending = match std::mem::replace(&mut self.state, State::Idle) {
            State::Animating(pending) => pending,
            other => {
                self.state = other;
                return Verdict::Discard(DiscardReason::NothingPending);
            }
        };

        if completed && reported == pending.requested_top() {
            self.state = State::Reconciling;
            Verdict::Commit(pending)
        } else if reported == pending.before_top() {
            Verdict::Cancel(pending)
        } else {
            let expected = if completed {
                pending.requested_top()
            } else {
                pending.before_top()
            };
            self.state = State::Animating(pending);
            Verdict::Discard(DiscardReason::TopMismatch { expected, reported })
        }
    }

    /// Resolve every identity in `before − after`, innermost first.
    ///
    /// Must be called while `Reconciling`.
    pub(crate) fn reconcile(
        &self,
        before: &[ScreenId],
        after: &[ScreenId],
        registry: &mut CompletionRegistry,
        sink: &mut dyn ErrorSink,
    ) -> ReconcileReport {
        debug_assert_eq!(self.phase(), ObserverPhase::Reconciling);

        let removed = removed_innermost_first(before, after);
        let mut report = ReconcileReport {
            removed: removed.len() as u64,
            ..ReconcileReport::default()
        };
        if removed.is_empty() {
            return report;
        }

        let start = Instant::now();
        let span = info_span!(
            "navkit.reconcile",
            removed = report.removed,
            resolved = tracing::field::Empty,
            failed = tracing::field::Empty,
            duration_us = tracing::field::Empty
        );
        let _guard = span.enter();

        for id in removed {
            match registry.resolve(id) {
                Resolution::NotRegistered => {}
                Resolution::Invoked => report.resolved += 1,
                Resolution::Panicked(message) => {
                    report.resolved += 1;
                    report.failed += 1;
                    sink.report(RouterFault::CallbackPanicked {
                        screen: id,
                        callback: CallbackKind::Leave,
                        message,
                    });
                }
            }
        }

        span.record("resolved", report.resolved);
        span.record("failed", report.failed);
        span.record("duration_us", start.elapsed().as_micros() as u64);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn ids(n: usize) -> Vec<ScreenId> {
        (0..n).map(|_| ScreenId::mint()).collect()
    }

    fn pending_pop(before: &[ScreenId]) -> PendingTransition<()> {
        let requested = before[..before.len() - 1].to_vec();
        PendingTransition::new(
            TransitionKind::Pop,
            true,
            before.to_vec(),
            requested,
            StagedEdit::Pop,
        )
    }

    #[test]
    fn removed_is_innermost_first() {
        let v = ids(4);
        assert_eq!(
            removed_innermost_first(&v, &v[..1]),
            vec![v[3], v[2], v[1]]
        );
        assert!(removed_innermost_first(&v, &v).is_empty());
    }

    #[test]
    fn set_root_removes_everything_previous() {
        let v = ids(3);
        let fresh = ScreenId::mint();
        assert_eq!(removed_innermost_first(&v, &[fresh]), vec![v[2], v[1], v[0]]);
    }

    #[test]
    fn completion_while_idle_is_discarded() {
        let mut observer: TransitionObserver<()> = TransitionObserver::new();
        let verdict = observer.observe(HostEvent::Completed { top: None });
        assert!(matches!(
            verdict,
            Verdict::Discard(DiscardReason::NothingPending)
        ));
        assert_eq!(observer.phase(), ObserverPhase::Idle);
    }

    #[test]
    fn matching_completion_commits() {
        let v = ids(3);
        let mut observer = TransitionObserver::new();
        observer.begin_animating(pending_pop(&v)).unwrap();
        assert_eq!(observer.phase(), ObserverPhase::Animating);

        let verdict = observer.observe(HostEvent::Completed { top: Some(v[1]) });
        assert!(matches!(verdict, Verdict::Commit(_)));
        assert_eq!(observer.phase(), ObserverPhase::Reconciling);
        observer.finish();
        assert!(observer.is_idle());
    }

    #[test]
    fn cancellation_restores_idle() {
        let v = ids(3);
        let mut observer = TransitionObserver::new();
        observer.begin_animating(pending_pop(&v)).unwrap();

        let verdict = observer.observe(HostEvent::Cancelled { top: Some(v[2]) });
        assert!(matches!(verdict, Verdict::Cancel(_)));
        assert!(observer.is_idle());
    }

    #[test]
    fn completion_reporting_old_top_is_a_cancellation() {
        let v = ids(2);
        let mut observer = TransitionObserver::new();
        observer.begin_animating(pending_pop(&v)).unwrap();
        let verdict = observer.observe(HostEvent::Completed { top: Some(v[1]) });
        assert!(matches!(verdict, Verdict::Cancel(_)));
    }

    #[test]
    fn mismatched_top_keeps_animating() {
        let v = ids(3);
        let stranger = ScreenId::mint();
        let mut observer = TransitionObserver::new();
        observer.begin_animating(pending_pop(&v)).unwrap();

        let verdict = observer.observe(HostEvent::Completed {
            top: Some(stranger),
        });
        match verdict {
            Verdict::Discard(DiscardReason::TopMismatch { expected, reported }) => {
                assert_eq!(expected, Some(v[1]));
                assert_eq!(reported, Some(stranger));
            }
            _ => panic!("expected top mismatch"),
        }
        assert_eq!(observer.phase(), ObserverPhase::Animating);
        assert_eq!(observer.pending().map(|p| p.before_top()), Some(Some(v[2])));
    }

    #[test]
    fn second_transition_is_refused_while_animating() {
        let v = ids(3);
        let mut observer = TransitionObserver::new();
        observer.begin_animating(pending_pop(&v)).unwrap();
        assert!(observer.begin_animating(pending_pop(&v)).is_err());
    }

    #[test]
    fn reconcile_resolves_innermost_first_and_survives_panics() {
        let v = ids(4);
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut registry = CompletionRegistry::new();
        for (i, id) in v.iter().enumerate().skip(1) {
            let order = Rc::clone(&order);
            registry.register(*id, Box::new(move || order.borrow_mut().push(i)));
        }
        registry.register(v[2], Box::new(|| panic!("middle")));

        let mut faults = Vec::new();
        let mut sink = |fault: RouterFault| faults.push(fault);

        let mut observer: TransitionObserver<()> = TransitionObserver::new();
        observer.begin_reconciling();
        let report = observer.reconcile(&v, &v[..1], &mut registry, &mut sink);
        observer.finish();

        assert_eq!(
            report,
            ReconcileReport {
                removed: 3,
                resolved: 3,
                failed: 1
            }
        );
        assert_eq!(*order.borrow(), vec![3, 1]);
        assert!(registry.is_empty());
        assert_eq!(faults.len(), 1);
        assert!(matches!(
            &faults[0],
            RouterFault::CallbackPanicked { screen, .. } if *screen == v[2]
        ));
    }

    #[test]
    fn pending_accessors() {
        let v = ids(2);
        let pending = pending_pop(&v);
        assert_eq!(pending.kind(), TransitionKind::Pop);
        assert!(pending.animated());
        assert_eq!(pending.before(), &v[..]);
        assert_eq!(pending.requested(), &v[..1]);
        assert_eq!(pending.removed(), vec![v[1]]);
        assert!(pending.incoming().is_none());
    }
}
