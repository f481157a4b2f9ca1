#![forbid(unsafe_code)]

//! navkit public facade crate.
//!
//! Re-exports the router and its primitives, and offers a prelude for
//! coordinators.
//!
//! ```rust
//! use navkit::prelude::*;
//!
//! let mut router = Router::new(ImmediateHost);
//! let root = router.push(Screen::new("home"), false).unwrap();
//! let detail = router
//!     .push_with_leave(Screen::new("detail"), true, || println!("detail closed"))
//!     .unwrap();
//! assert_eq!(router.pop(true).unwrap(), detail);
//! assert_eq!(router.snapshot(), vec![root]);
//! ```

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use navkit_core::{
    CompletionRegistry, Identified, ModalEntry, ModalStack, NavigationStack, Resolution, Screen,
    ScreenId, StackError,
};

// --- Runtime re-exports ----------------------------------------------------

pub use navkit_runtime::{
    CallbackKind, DiscardReason, ErrorSink, HostEvent, ImmediateHost, NavHandle, NavigationHost,
    ObserverPhase, PendingTransition, Router, RouterConfig, RouterConfigError, RouterError,
    RouterFault, RouterStats, TracingSink, Transition, TransitionKind, TransitionStart,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for navkit users.
#[derive(Debug)]
pub enum Error {
    /// A router call was rejected.
    Router(RouterError),
    /// Router configuration failed to load or validate.
    Config(RouterConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Router(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Router(err) => Some(err),
            Self::Config(err) => Some(err),
        }
    }
}

impl From<RouterError> for Error {
    fn from(err: RouterError) -> Self {
        Self::Router(err)
    }
}

impl From<StackError> for Error {
    fn from(err: StackError) -> Self {
        Self::Router(err.into())
    }
}

impl From<RouterConfigError> for Error {
    fn from(err: RouterConfigError) -> Self {
        Self::Config(err)
    }
}

/// Standard result type for navkit APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Error, HostEvent, ImmediateHost, NavHandle, NavigationHost, Result, Router, RouterConfig,
        Screen, ScreenId, Transition, TransitionStart,
    };

    pub use crate::{core, runtime};
}

pub use navkit_core as core;
pub use navkit_runtime as runtime;
