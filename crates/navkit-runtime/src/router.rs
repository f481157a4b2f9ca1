#![forbid(unsafe_code)]

//! Router façade.
//!
//! The [`Router`] owns the committed navigation stack, the modal stack, the
//! completion registry and the transition observer. Every mutation is a
//! request: it is validated, handed to the [`NavigationHost`], and only
//! applied to the committed layers once the host confirms it.
//!
//! # Queueing
//!
//! While a transition is animating, further requests are validated against
//! the projected stack and queued FIFO. The queue drains as soon as the
//! observer returns to idle, after the reconciliation that freed it.
//!
//! # Reentrancy
//!
//! Callbacks run while the router is mutably borrowed. They talk back through
//! a [`NavHandle`], whose requests join the queue after the reconciliation
//! that ran them.

use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use navkit_core::{
    CompletionRegistry, ModalEntry, ModalStack, NavigationStack, OnDismiss, OnLeave, Resolution,
    Screen, ScreenId, StackError, invoke,
};
use tracing::{debug, debug_span, warn};

use crate::config::RouterConfig;
use crate::error::RouterError;
use crate::handle::{Mailbox, NavHandle};
use crate::host::{HostEvent, NavigationHost, Transition, TransitionKind, TransitionStart};
use crate::observer::{
    DiscardReason, ObserverPhase, PendingTransition, StagedEdit, TransitionObserver, Verdict,
};
use crate::request::{Effect, Projection, Request};
use crate::sink::{CallbackKind, ErrorSink, RouterFault, TracingSink};

/// Lifetime counters for a [`Router`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterStats {
    /// Transitions applied to the committed layers.
    pub transitions_committed: u64,
    /// Transitions the host reported as cancelled.
    pub transitions_cancelled: u64,
    /// Callbacks invoked (including ones that panicked).
    pub callbacks_resolved: u64,
    /// Callbacks dropped without being invoked.
    pub callbacks_dropped: u64,
    /// Callbacks that panicked.
    pub callback_failures: u64,
    /// Host signals discarded as inconsistent.
    pub signals_discarded: u64,
    /// Requests that waited behind an in-flight transition.
    pub requests_queued: u64,
    /// Deferred requests found invalid when dequeued.
    pub requests_rejected: u64,
}

/// Navigation router with exactly-once leave notifications.
///
/// `C` is the opaque screen content; `H` is the platform host.
pub struct Router<C, H> {
    stack: NavigationStack<Screen<C>>,
    modals: ModalStack<C>,
    registry: CompletionRegistry,
    observer: TransitionObserver<C>,
    queue: VecDeque<Request<C>>,
    projection: Projection,
    mailbox: Mailbox<C>,
    host: H,
    sink: Box<dyn ErrorSink>,
    config: RouterConfig,
    stats: RouterStats,
}

impl<C, H> fmt::Debug for Router<C, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("stack", &self.stack.snapshot())
            .field("modals", &self.modals.snapshot())
            .field("phase", &self.observer.phase())
            .field("queued", &self.queue.len())
            .field("registered", &self.registry.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<C, H: NavigationHost<C>> Router<C, H> {
    /// Create a router with an empty stack and the default configuration.
    pub fn new(host: H) -> Self {
        Self::with_config(host, RouterConfig::default())
    }

    /// Create a router with an empty stack.
    pub fn with_config(host: H, config: RouterConfig) -> Self {
        Self {
            stack: NavigationStack::new(),
            modals: ModalStack::new(),
            registry: CompletionRegistry::new(),
            observer: TransitionObserver::new(),
            queue: VecDeque::new(),
            projection: Projection::default(),
            mailbox: Rc::default(),
            host,
            sink: Box::new(TracingSink),
            config,
            stats: RouterStats::default(),
        }
    }

    /// Replace the [`ErrorSink`] (default: [`TracingSink`]).
    #[must_use]
    pub fn with_sink(mut self, sink: impl ErrorSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    // ========================================================================
    // Stack operations
    // ========================================================================

    /// Push `screen` on top of the stack.
    ///
    /// Pushing onto an empty stack makes `screen` the root.
    pub fn push(&mut self, screen: Screen<C>, animated: bool) -> Result<ScreenId, RouterError> {
        let id = screen.id();
        self.submit(Request::Push {
            screen,
            animated,
            on_leave: None,
        })?;
        Ok(id)
    }

    /// Push `screen` and run `on_leave` exactly once when it is confirmed
    /// removed from the stack.
    pub fn push_with_leave(
        &mut self,
        screen: Screen<C>,
        animated: bool,
        on_leave: impl FnOnce() + 'static,
    ) -> Result<ScreenId, RouterError> {
        let id = screen.id();
        self.submit(Request::Push {
            screen,
            animated,
            on_leave: Some(Box::new(on_leave)),
        })?;
        Ok(id)
    }

    /// Pop the top screen. Returns the identity that will leave.
    ///
    /// A queued pop is pinned to that identity. If the transition ahead of
    /// it is cancelled and a different screen ends up on top, the pop is
    /// rejected through the sink instead of removing that screen.
    pub fn pop(&mut self, animated: bool) -> Result<ScreenId, RouterError> {
        self.submit(Request::Pop {
            animated,
            expected: None,
        })?
            .screen()
            .ok_or(RouterError::Stack(StackError::EmptyStack))
    }

    /// Pop every screen above `target`. Returns the identities that will
    /// leave, innermost first. Popping to the current top is a no-op.
    pub fn pop_to(
        &mut self,
        target: ScreenId,
        animated: bool,
    ) -> Result<Vec<ScreenId>, RouterError> {
        Ok(self
            .submit(Request::PopTo { target, animated })?
            .into_removed())
    }

    /// Pop every screen above the root in one transition.
    pub fn pop_to_root(&mut self, animated: bool) -> Result<Vec<ScreenId>, RouterError> {
        Ok(self.submit(Request::PopToRoot { animated })?.into_removed())
    }

    /// Replace the whole stack with `screen`. Never animated.
    ///
    /// Every previous screen counts as removed. Returns their identities,
    /// innermost first.
    pub fn set_root(&mut self, screen: Screen<C>) -> Result<Vec<ScreenId>, RouterError> {
        Ok(self
            .submit(Request::SetRoot {
                screen,
                on_leave: None,
            })?
            .into_removed())
    }

    /// [`set_root`](Self::set_root) with an on-leave callback for the new root.
    pub fn set_root_with_leave(
        &mut self,
        screen: Screen<C>,
        on_leave: impl FnOnce() + 'static,
    ) -> Result<Vec<ScreenId>, RouterError> {
        Ok(self
            .submit(Request::SetRoot {
                screen,
                on_leave: Some(Box::new(on_leave)),
            })?
            .into_removed())
    }

    // ========================================================================
    // Modal operations
    // ========================================================================

    /// Present `screen` outside the stack.
    pub fn present(&mut self, screen: Screen<C>, animated: bool) -> Result<ScreenId, RouterError> {
        let id = screen.id();
        self.submit(Request::Present {
            screen,
            animated,
            on_dismiss: None,
        })?;
        Ok(id)
    }

    /// Present `screen` and run `on_dismiss` when its dismissal is confirmed.
    pub fn present_with_dismiss(
        &mut self,
        screen: Screen<C>,
        animated: bool,
        on_dismiss: impl FnOnce() + 'static,
    ) -> Result<ScreenId, RouterError> {
        let id = screen.id();
        self.submit(Request::Present {
            screen,
            animated,
            on_dismiss: Some(Box::new(on_dismiss)),
        })?;
        Ok(id)
    }

    /// Dismiss the top modal. Returns its identity.
    pub fn dismiss(&mut self, animated: bool) -> Result<ScreenId, RouterError> {
        self.submit(Request::Dismiss {
            animated,
            completion: None,
        })?
        .screen()
        .ok_or(RouterError::NothingPresented)
    }

    /// Dismiss the top modal and run `completion` after its own dismissal
    /// callback once the dismissal is confirmed.
    pub fn dismiss_with_completion(
        &mut self,
        animated: bool,
        completion: impl FnOnce() + 'static,
    ) -> Result<ScreenId, RouterError> {
        self.submit(Request::Dismiss {
            animated,
            completion: Some(Box::new(completion)),
        })?
        .screen()
        .ok_or(RouterError::NothingPresented)
    }

    // ========================================================================
    // Host signals
    // ========================================================================

    /// Feed a confirmation signal or gesture start from the host.
    ///
    /// Inconsistent signals are logged and discarded; they never error.
    pub fn handle_host_event(&mut self, event: HostEvent) {
        self.absorb_mailbox();
        match event {
            HostEvent::InteractivePopBegan => {
                self.begin_gesture(TransitionKind::InteractivePop, event);
            }
            HostEvent::InteractiveDismissBegan => {
                self.begin_gesture(TransitionKind::InteractiveDismiss, event);
            }
            HostEvent::Completed { .. } | HostEvent::Cancelled { .. } => {
                match self.observer.observe(event) {
                    Verdict::Commit(pending) => {
                        let span = debug_span!(
                            "navkit.transition",
                            kind = pending.kind().as_str(),
                            animated = pending.animated()
                        );
                        let _guard = span.enter();
                        self.commit(pending);
                    }
                    Verdict::Cancel(pending) => self.cancel(pending),
                    Verdict::Discard(reason) => self.discard(event, reason),
                }
            }
        }
        self.pump();
    }

    /// Run requests posted through a [`NavHandle`] outside any router call.
    pub fn poll(&mut self) {
        self.pump();
    }

    /// A handle for posting requests, usable from inside callbacks.
    pub fn handle(&self) -> NavHandle<C> {
        NavHandle::new(Rc::clone(&self.mailbox), self.config.animate_by_default)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// The committed stack.
    pub fn stack(&self) -> &NavigationStack<Screen<C>> {
        &self.stack
    }

    /// Committed identities, root first.
    pub fn snapshot(&self) -> Vec<ScreenId> {
        self.stack.snapshot()
    }

    /// The stack as it will be once the in-flight transition and every
    /// queued request commit.
    pub fn projected_snapshot(&self) -> Vec<ScreenId> {
        self.projection.stack.snapshot()
    }

    /// Top of the committed stack.
    pub fn top(&self) -> Option<&Screen<C>> {
        self.stack.top()
    }

    /// The committed modal stack.
    pub fn modals(&self) -> &ModalStack<C> {
        &self.modals
    }

    /// Observer phase.
    pub fn phase(&self) -> ObserverPhase {
        self.observer.phase()
    }

    /// The in-flight transition, if one is animating.
    pub fn pending(&self) -> Option<&PendingTransition<C>> {
        self.observer.pending()
    }

    /// Lifetime counters.
    pub fn stats(&self) -> RouterStats {
        self.stats
    }

    /// Requests waiting to run, including ones posted but not yet absorbed.
    pub fn pending_requests(&self) -> usize {
        self.queue.len() + self.mailbox.borrow().len()
    }

    /// Registered on-leave callbacks.
    pub fn registered_callbacks(&self) -> usize {
        self.registry.len()
    }

    /// Whether an on-leave callback is registered for `id`.
    pub fn has_leave_callback(&self, id: ScreenId) -> bool {
        self.registry.contains(id)
    }

    /// The navigation host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access to the navigation host.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Configuration the router was built with.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Run `request` now if idle, otherwise validate it against the
    /// projection and queue it.
    fn submit(&mut self, mut request: Request<C>) -> Result<Effect, RouterError> {
        self.pump();

        if self.observer.is_idle() {
            let effect = self.start(request)?;
            self.pump();
            return Ok(effect);
        }

        let capacity = self.config.max_queued;
        if capacity > 0 && self.queue.len() >= capacity {
            return Err(RouterError::QueueFull { capacity });
        }
        if let Request::Pop { expected, .. } = &mut request {
            *expected = self.projection.stack.top().copied();
        }
        let effect = self
            .projection
            .apply(&request, self.config.max_stack_depth)?;
        if self.config.log_transitions {
            debug!(
                kind = request.kind().as_str(),
                position = self.queue.len(),
                "navigation request queued"
            );
        }
        self.queue.push_back(request);
        self.stats.requests_queued += 1;
        Ok(effect)
    }

    /// Move handle posts onto the queue.
    fn absorb_mailbox(&mut self) {
        let posted: Vec<Request<C>> = self.mailbox.borrow_mut().drain(..).collect();
        for request in posted {
            let capacity = self.config.max_queued;
            if capacity > 0 && self.queue.len() >= capacity {
                self.reject(&request, RouterError::QueueFull { capacity });
                continue;
            }
            self.queue.push_back(request);
            if !self.observer.is_idle() {
                self.stats.requests_queued += 1;
            }
        }
    }

    /// Drain the queue while idle, then refresh the projection.
    fn pump(&mut self) {
        loop {
            self.absorb_mailbox();
            if !self.observer.is_idle() {
                break;
            }
            let Some(request) = self.queue.pop_front() else {
                break;
            };
            let kind = request.kind();
            let callbacks = request.callback_count();
            if let Err(error) = self.start(request) {
                self.stats.requests_rejected += 1;
                self.stats.callbacks_dropped += callbacks;
                self.sink.report(RouterFault::RejectedRequest { kind, error });
            }
        }
        self.rebuild_projection();
    }

    fn reject(&mut self, request: &Request<C>, error: RouterError) {
        self.stats.requests_rejected += 1;
        self.stats.callbacks_dropped += request.callback_count();
        self.sink.report(RouterFault::RejectedRequest {
            kind: request.kind(),
            error,
        });
    }

    fn committed_projection(&self) -> Projection {
        Projection::new(
            self.stack.iter().map(Screen::id).collect(),
            self.modals.snapshot(),
        )
    }

    fn rebuild_projection(&mut self) {
        let mut projection = self.committed_projection();
        if let Some(pending) = self.observer.pending() {
            if pending.kind().is_modal() {
                projection.modals = pending.requested().to_vec();
            } else {
                projection.stack = pending.requested().iter().copied().collect();
            }
        }
        for request in &self.queue {
            // Invalid entries are rejected when dequeued.
            let _ = projection.apply(request, self.config.max_stack_depth);
        }
        self.projection = projection;
    }

    /// Begin `request` against the committed layers. The observer must be
    /// idle.
    fn start(&mut self, request: Request<C>) -> Result<Effect, RouterError> {
        let mut check = self.committed_projection();
        let effect = check.apply(&request, self.config.max_stack_depth)?;

        let kind = request.kind();
        let (before, requested) = if kind.is_modal() {
            (self.modals.snapshot(), check.modals)
        } else {
            (self.stack.snapshot(), check.stack.snapshot())
        };
        if before == requested {
            return Ok(effect);
        }

        let animated = request.animated() && !self.config.reduced_motion;
        let edit = match request {
            Request::Push {
                screen, on_leave, ..
            } => {
                self.register_leave(screen.id(), on_leave);
                StagedEdit::Push(screen)
            }
            Request::Pop { .. } => StagedEdit::Pop,
            Request::PopTo { target, .. } => StagedEdit::PopTo(target),
            Request::PopToRoot { .. } => match self.stack.root() {
                Some(root) => StagedEdit::PopTo(root.id()),
                None => return Err(StackError::EmptyStack.into()),
            },
            Request::SetRoot { screen, on_leave } => {
                self.register_leave(screen.id(), on_leave);
                StagedEdit::SetRoot(screen)
            }
            Request::Present {
                screen, on_dismiss, ..
            } => StagedEdit::Present(ModalEntry::new(screen, on_dismiss)),
            Request::Dismiss { completion, .. } => StagedEdit::Dismiss(completion),
        };
        let pending = PendingTransition::new(kind, animated, before, requested, edit);

        let span = debug_span!("navkit.transition", kind = kind.as_str(), animated);
        let _guard = span.enter();

        let started = self.host.begin(&Transition {
            kind,
            animated,
            incoming: pending.incoming(),
            from: pending.before(),
            to: pending.requested(),
        });

        if animated && started == TransitionStart::Animating {
            self.enter_animating(pending);
        } else {
            self.observer.begin_reconciling();
            self.commit(pending);
        }
        Ok(effect)
    }

    fn register_leave(&mut self, id: ScreenId, on_leave: Option<OnLeave>) {
        if let Some(callback) = on_leave {
            if self.registry.register(id, callback).is_some() {
                self.stats.callbacks_dropped += 1;
            }
        }
    }

    fn enter_animating(&mut self, pending: PendingTransition<C>) {
        let kind = pending.kind();
        match self.observer.begin_animating(pending) {
            Ok(()) => self.log_phase(ObserverPhase::Animating, kind),
            Err(pending) => {
                warn!(kind = kind.as_str(), "transition began while another is in flight");
                self.cancel(pending);
            }
        }
    }

    /// Host-initiated gesture: a pending transition with no router request.
    fn begin_gesture(&mut self, kind: TransitionKind, event: HostEvent) {
        if !self.observer.is_idle() {
            self.discard(event, DiscardReason::Busy);
            return;
        }

        let (before, edit) = if kind.is_modal() {
            if self.modals.is_empty() {
                self.discard(event, DiscardReason::NothingToDismiss);
                return;
            }
            (self.modals.snapshot(), StagedEdit::Dismiss(None))
        } else {
            if self.stack.len() <= 1 {
                self.discard(event, DiscardReason::NothingToPop);
                return;
            }
            (self.stack.snapshot(), StagedEdit::Pop)
        };
        let requested = before[..before.len() - 1].to_vec();
        self.enter_animating(PendingTransition::new(kind, true, before, requested, edit));
    }

    /// Apply a confirmed transition and resolve what left. The observer must
    /// be reconciling.
    fn commit(&mut self, pending: PendingTransition<C>) {
        let kind = pending.kind();
        let elapsed_us = pending.elapsed_us();
        self.log_phase(ObserverPhase::Reconciling, kind);

        let (before, edit) = pending.into_parts();
        let applied = match edit {
            StagedEdit::Push(screen) => self.stack.push(screen),
            StagedEdit::Pop => self.stack.pop_one().map(drop),
            StagedEdit::PopTo(target) => self.stack.pop_to(target).map(drop),
            StagedEdit::SetRoot(screen) => {
                self.stack.set_root(screen);
                Ok(())
            }
            StagedEdit::Present(entry) => self.modals.push(entry),
            StagedEdit::Dismiss(completion) => {
                self.finish_dismiss(completion);
                Ok(())
            }
        };
        if let Err(err) = applied {
            warn!(kind = kind.as_str(), error = %err, "confirmed transition no longer applies");
        }

        if !kind.is_modal() {
            let after = self.stack.snapshot();
            let report =
                self.observer
                    .reconcile(&before, &after, &mut self.registry, self.sink.as_mut());
            self.stats.callbacks_resolved += report.resolved;
            self.stats.callback_failures += report.failed;
        }

        self.stats.transitions_committed += 1;
        self.observer.finish();
        if self.config.log_transitions {
            debug!(kind = kind.as_str(), elapsed_us, "transition committed");
        }
    }

    fn finish_dismiss(&mut self, completion: Option<OnDismiss>) {
        let Some(entry) = self.modals.pop() else {
            warn!("confirmed dismissal with no modal presented");
            return;
        };
        let id = entry.id();
        let (_, resolution) = entry.resolve();
        self.record(id, CallbackKind::Dismiss, resolution);
        if let Some(completion) = completion {
            let resolution = invoke(completion);
            self.record(id, CallbackKind::DismissCompletion, resolution);
        }
    }

    fn record(&mut self, screen: ScreenId, callback: CallbackKind, resolution: Resolution) {
        match resolution {
            Resolution::NotRegistered => {}
            Resolution::Invoked => self.stats.callbacks_resolved += 1,
            Resolution::Panicked(message) => {
                self.stats.callbacks_resolved += 1;
                self.stats.callback_failures += 1;
                self.sink.report(RouterFault::CallbackPanicked {
                    screen,
                    callback,
                    message,
                });
            }
        }
    }

    /// Roll back a cancelled transition. Nothing is resolved.
    fn cancel(&mut self, pending: PendingTransition<C>) {
        let kind = pending.kind();
        let (_, edit) = pending.into_parts();
        let dropped = match edit {
            StagedEdit::Push(screen) | StagedEdit::SetRoot(screen) => {
                u64::from(self.registry.drop_entry(screen.id()))
            }
            StagedEdit::Present(entry) => u64::from(entry.has_callback()),
            StagedEdit::Dismiss(completion) => u64::from(completion.is_some()),
            StagedEdit::Pop | StagedEdit::PopTo(_) => 0,
        };
        self.stats.callbacks_dropped += dropped;
        self.stats.transitions_cancelled += 1;
        self.log_phase(ObserverPhase::Idle, kind);
    }

    fn discard(&mut self, event: HostEvent, reason: DiscardReason) {
        self.stats.signals_discarded += 1;
        warn!(
            event = event.as_str(),
            reason = reason.as_str(),
            detail = ?reason,
            phase = self.observer.phase().as_str(),
            "navigation signal discarded"
        );
    }

    fn log_phase(&self, phase: ObserverPhase, kind: TransitionKind) {
        if self.config.log_transitions {
            debug!(
                phase = phase.as_str(),
                kind = kind.as_str(),
                "navigation phase changed"
            );
        }
    }
}

impl<C, H> Drop for Router<C, H> {
    fn drop(&mut self) {
        let posted: u64 = self
            .mailbox
            .borrow_mut()
            .drain(..)
            .map(|request| request.callback_count())
            .sum();
        let queued: u64 = self.queue.drain(..).map(|r| r.callback_count()).sum();
        let dropped =
            self.registry.clear() as u64 + self.modals.clear() as u64 + posted + queued;
        if dropped > 0 {
            debug!(dropped, "router dropped with outstanding callbacks");
        }
    }
}
