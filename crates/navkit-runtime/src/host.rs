#![forbid(unsafe_code)]

//! Platform seam.
//!
//! The router never assumes a requested mutation happened. It describes the
//! mutation to a [`NavigationHost`] and then waits for a [`HostEvent`] that
//! confirms or cancels it. A host that applies changes synchronously returns
//! [`TransitionStart::Completed`] from [`NavigationHost::begin`] and no event
//! is needed.
//!
//! # Confirmation signal
//!
//! `HostEvent::Completed { top }` and `HostEvent::Cancelled { top }` carry the
//! top of the layer the transition touched:
//!
//! | Transition | `top` |
//! |------------|-------|
//! | stack (push, pop, pop-to, interactive pop) | top of the navigation stack |
//! | modal (present, dismiss, interactive dismiss) | top modal, `None` when none remain |
//!
//! There is no timer anywhere in this path. A host that cannot observe the
//! end of its own animation must report it explicitly.

use navkit_core::{Screen, ScreenId};

/// What a transition does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    /// Append a screen.
    Push,
    /// Remove the top screen.
    Pop,
    /// Remove every screen above a target (includes pop-to-root).
    PopTo,
    /// Replace the whole stack.
    SetRoot,
    /// Present a screen outside the stack.
    Present,
    /// Dismiss the top presented screen.
    Dismiss,
    /// User-driven back gesture reported by the host.
    InteractivePop,
    /// User-driven dismissal gesture reported by the host.
    InteractiveDismiss,
}

impl TransitionKind {
    /// Whether the transition touches the modal layer rather than the stack.
    #[inline]
    pub fn is_modal(self) -> bool {
        matches!(
            self,
            Self::Present | Self::Dismiss | Self::InteractiveDismiss
        )
    }

    /// Whether the host started the transition.
    #[inline]
    pub fn is_interactive(self) -> bool {
        matches!(self, Self::InteractivePop | Self::InteractiveDismiss)
    }

    /// Stable name for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Pop => "pop",
            Self::PopTo => "pop_to",
            Self::SetRoot => "set_root",
            Self::Present => "present",
            Self::Dismiss => "dismiss",
            Self::InteractivePop => "interactive_pop",
            Self::InteractiveDismiss => "interactive_dismiss",
        }
    }
}

/// A mutation the router asks the host to perform.
///
/// `from` / `to` are identity snapshots of the touched layer before and after
/// the mutation: the navigation stack for stack kinds, the modal stack for
/// modal kinds.
#[derive(Debug)]
pub struct Transition<'a, C> {
    /// What the transition does.
    pub kind: TransitionKind,
    /// Whether the host may animate it. `false` means the host must apply it
    /// before `begin` returns.
    pub animated: bool,
    /// The screen entering the touched layer, for push, set-root and present.
    pub incoming: Option<&'a Screen<C>>,
    /// Layer before the mutation.
    pub from: &'a [ScreenId],
    /// Layer requested after the mutation.
    pub to: &'a [ScreenId],
}

impl<C> Transition<'_, C> {
    /// Requested top of the touched layer.
    pub fn requested_top(&self) -> Option<ScreenId> {
        self.to.last().copied()
    }
}

/// How the host took a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionStart {
    /// Applied synchronously; no confirmation event will follow.
    Completed,
    /// Animating; a [`HostEvent::Completed`] or [`HostEvent::Cancelled`] will
    /// follow.
    Animating,
}

/// Low-level notification from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// The in-flight transition finished; `top` is the resulting top.
    Completed { top: Option<ScreenId> },
    /// The in-flight transition was aborted and the layer reverted; `top` is
    /// the restored top.
    Cancelled { top: Option<ScreenId> },
    /// The user started an interactive back gesture on the stack.
    InteractivePopBegan,
    /// The user started an interactive dismissal of the top modal.
    InteractiveDismissBegan,
}

impl HostEvent {
    /// Stable name for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed { .. } => "completed",
            Self::Cancelled { .. } => "cancelled",
            Self::InteractivePopBegan => "interactive_pop_began",
            Self::InteractiveDismissBegan => "interactive_dismiss_began",
        }
    }
}

/// The platform side of a router.
pub trait NavigationHost<C> {
    /// Start performing `transition`.
    ///
    /// Non-animated transitions are treated as complete when this returns,
    /// whatever the return value.
    fn begin(&mut self, transition: &Transition<'_, C>) -> TransitionStart;
}

impl<C, H: NavigationHost<C> + ?Sized> NavigationHost<C> for Box<H> {
    fn begin(&mut self, transition: &Transition<'_, C>) -> TransitionStart {
        (**self).begin(transition)
    }
}

/// Host that applies every transition synchronously.
///
/// Useful for headless coordinators and for tests that do not care about
/// animation.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateHost;

impl<C> NavigationHost<C> for ImmediateHost {
    fn begin(&mut self, _transition: &Transition<'_, C>) -> TransitionStart {
        TransitionStart::Completed
    }
}
