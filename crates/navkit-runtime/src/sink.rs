#![forbid(unsafe_code)]

//! Error sink for faults that must not interrupt navigation.
//!
//! Two kinds of failure cannot be returned to a caller:
//!
//! - a coordinator callback panics during reconciliation, and
//! - a request posted through a [`NavHandle`](crate::NavHandle) turns out to
//!   be invalid when the router gets to it.
//!
//! Both are handed to an [`ErrorSink`]. The default [`TracingSink`] logs them;
//! applications can route them to crash reporting instead.

use std::fmt;

use navkit_core::ScreenId;
use tracing::{error, warn};

use crate::error::RouterError;
use crate::host::TransitionKind;

/// Which callback failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackKind {
    /// An on-leave callback from a push.
    Leave,
    /// A modal's dismissal callback from a present.
    Dismiss,
    /// The completion passed to a dismiss.
    DismissCompletion,
}

impl CallbackKind {
    /// Stable name for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Leave => "leave",
            Self::Dismiss => "dismiss",
            Self::DismissCompletion => "dismiss_completion",
        }
    }
}

/// A fault reported out of band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterFault {
    /// A callback panicked. Its registry entry was still evicted.
    CallbackPanicked {
        screen: ScreenId,
        callback: CallbackKind,
        message: String,
    },
    /// A deferred request was invalid when dequeued and was dropped.
    RejectedRequest {
        kind: TransitionKind,
        error: RouterError,
    },
}

impl fmt::Display for RouterFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CallbackPanicked {
                screen,
                callback,
                message,
            } => write!(
                f,
                "{} callback for {screen} panicked: {message}",
                callback.as_str()
            ),
            Self::RejectedRequest { kind, error } => {
                write!(f, "deferred {} rejected: {error}", kind.as_str())
            }
        }
    }
}

/// Receiver for [`RouterFault`]s.
pub trait ErrorSink {
    /// Report one fault. Must not panic.
    fn report(&mut self, fault: RouterFault);
}

impl<F: FnMut(RouterFault)> ErrorSink for F {
    fn report(&mut self, fault: RouterFault) {
        self(fault)
    }
}

/// Sink that logs faults through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn report(&mut self, fault: RouterFault) {
        match &fault {
            RouterFault::CallbackPanicked {
                screen,
                callback,
                message,
            } => error!(
                screen = screen.raw(),
                callback = callback.as_str(),
                message = %message,
                "navigation callback panicked"
            ),
            RouterFault::RejectedRequest { kind, error } => warn!(
                kind = kind.as_str(),
                error = %error,
                "deferred navigation request rejected"
            ),
        }
    }
}
