#![forbid(unsafe_code)]

//! Queued navigation requests and the projection they are validated against.
//!
//! A request is checked twice: once when it is issued, against the
//! *projection* (committed layers plus the in-flight transition plus every
//! queued request), so misuse errors reach the caller synchronously; and once
//! more when it is dequeued, against the committed layers, because a
//! cancelled transition can invalidate what was queued behind it.

use navkit_core::{NavigationStack, OnDismiss, OnLeave, Screen, ScreenId, StackError};

use crate::error::RouterError;
use crate::host::TransitionKind;

/// A navigation request waiting to run.
pub(crate) enum Request<C> {
    Push {
        screen: Screen<C>,
        animated: bool,
        on_leave: Option<OnLeave>,
    },
    /// `expected` pins the screen the caller was told would leave.
    Pop {
        animated: bool,
        expected: Option<ScreenId>,
    },
    PopTo {
        target: ScreenId,
        animated: bool,
    },
    PopToRoot {
        animated: bool,
    },
    SetRoot {
        screen: Screen<C>,
        on_leave: Option<OnLeave>,
    },
    Present {
        screen: Screen<C>,
        animated: bool,
        on_dismiss: Option<OnDismiss>,
    },
    Dismiss {
        animated: bool,
        completion: Option<OnDismiss>,
    },
}

impl<C> Request<C> {
    pub(crate) fn kind(&self) -> TransitionKind {
        match self {
            Self::Push { .. } => TransitionKind::Push,
            Self::Pop { .. } => TransitionKind::Pop,
            Self::PopTo { .. } | Self::PopToRoot { .. } => TransitionKind::PopTo,
            Self::SetRoot { .. } => TransitionKind::SetRoot,
            Self::Present { .. } => TransitionKind::Present,
            Self::Dismiss { .. } => TransitionKind::Dismiss,
        }
    }

    pub(crate) fn animated(&self) -> bool {
        match self {
            Self::Push { animated, .. }
            | Self::Pop { animated, .. }
            | Self::PopTo { animated, .. }
            | Self::PopToRoot { animated }
            | Self::Present { animated, .. }
            | Self::Dismiss { animated, .. } => *animated,
            Self::SetRoot { .. } => false,
        }
    }

    /// Number of callbacks the request carries.
    pub(crate) fn callback_count(&self) -> u64 {
        let present = match self {
            Self::Push { on_leave, .. } | Self::SetRoot { on_leave, .. } => on_leave.is_some(),
            Self::Present { on_dismiss, .. } => on_dismiss.is_some(),
            Self::Dismiss { completion, .. } => completion.is_some(),
            Self::Pop { .. } | Self::PopTo { .. } | Self::PopToRoot { .. } => false,
        };
        u64::from(present)
    }
}

/// What a request does to a projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Effect {
    Pushed(ScreenId),
    Popped(ScreenId),
    /// Removed identities, innermost first.
    PoppedTo(Vec<ScreenId>),
    /// Previous identities, innermost first.
    RootSet(Vec<ScreenId>),
    Presented(ScreenId),
    Dismissed(ScreenId),
}

impl Effect {
    /// The one screen a single-screen effect is about.
    pub(crate) fn screen(&self) -> Option<ScreenId> {
        match self {
            Self::Pushed(id) | Self::Popped(id) | Self::Presented(id) | Self::Dismissed(id) => {
                Some(*id)
            }
            Self::PoppedTo(_) | Self::RootSet(_) => None,
        }
    }

    /// Identities leaving a layer, innermost first.
    pub(crate) fn into_removed(self) -> Vec<ScreenId> {
        match self {
            Self::PoppedTo(ids) | Self::RootSet(ids) => ids,
            Self::Popped(id) | Self::Dismissed(id) => vec![id],
            Self::Pushed(_) | Self::Presented(_) => Vec::new(),
        }
    }
}

/// Identity-only view of both layers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Projection {
    pub(crate) stack: NavigationStack<ScreenId>,
    pub(crate) modals: Vec<ScreenId>,
}

impl Projection {
    pub(crate) fn new(stack: NavigationStack<ScreenId>, modals: Vec<ScreenId>) -> Self {
        Self { stack, modals }
    }

    /// Apply `request`, leaving `self` untouched on error.
    pub(crate) fn apply<C>(
        &mut self,
        request: &Request<C>,
        max_depth: usize,
    ) -> Result<Effect, RouterError> {
        match request {
            Request::Push { screen, .. } => {
                let id = screen.id();
                if self.modals.contains(&id) {
                    return Err(StackError::DuplicateIdentity(id).into());
                }
                if max_depth > 0 && self.stack.len() >= max_depth {
                    return Err(RouterError::DepthExceeded { limit: max_depth });
                }
                self.stack.push(id)?;
                Ok(Effect::Pushed(id))
            }
            Request::Pop { expected, .. } => {
                if let Some(expected) = expected {
                    if self.stack.top() != Some(expected) {
                        return Err(StackError::NotFound(*expected).into());
                    }
                }
                Ok(Effect::Popped(self.stack.pop_one()?))
            }
            Request::PopTo { target, .. } => {
                let mut removed = self.stack.pop_to(*target)?;
                removed.reverse();
                Ok(Effect::PoppedTo(removed))
            }
            Request::PopToRoot { .. } => {
                let root = *self.stack.root().ok_or(StackError::EmptyStack)?;
                let mut removed = self.stack.pop_to(root)?;
                removed.reverse();
                Ok(Effect::PoppedTo(removed))
            }
            Request::SetRoot { screen, .. } => {
                let id = screen.id();
                if self.modals.contains(&id) {
                    return Err(StackError::DuplicateIdentity(id).into());
                }
                let mut previous = self.stack.set_root(id);
                previous.reverse();
                Ok(Effect::RootSet(previous))
            }
            Request::Present { screen, .. } => {
                let id = screen.id();
                if self.modals.contains(&id) || self.stack.contains(id) {
                    return Err(StackError::DuplicateIdentity(id).into());
                }
                self.modals.push(id);
                Ok(Effect::Presented(id))
            }
            Request::Dismiss { .. } => self
                .modals
                .pop()
                .map(Effect::Dismissed)
                .ok_or(RouterError::NothingPresented),
        }
    }
}
