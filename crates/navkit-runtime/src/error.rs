#![forbid(unsafe_code)]

//! Errors returned synchronously by [`Router`](crate::Router) calls.

use std::fmt;

use navkit_core::StackError;

/// Misuse of a router. Always returned to the caller; confirmation races are
/// never reported this way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterError {
    /// The request is invalid against the stack it would apply to.
    Stack(StackError),
    /// `dismiss` with no presented modal.
    NothingPresented,
    /// The request queue is at `max_queued`.
    QueueFull { capacity: usize },
    /// A push would exceed `max_stack_depth`.
    DepthExceeded { limit: usize },
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stack(e) => write!(f, "{e}"),
            Self::NothingPresented => write!(f, "no modal is presented"),
            Self::QueueFull { capacity } => {
                write!(f, "request queue full ({capacity} pending)")
            }
            Self::DepthExceeded { limit } => {
                write!(f, "stack depth limit of {limit} reached")
            }
        }
    }
}

impl std::error::Error for RouterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Stack(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StackError> for RouterError {
    fn from(err: StackError) -> Self {
        Self::Stack(err)
    }
}
