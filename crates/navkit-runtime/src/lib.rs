#![forbid(unsafe_code)]

//! navkit Runtime
//!
//! The time-aware half of navkit: a router that treats every mutation as a
//! request and only believes the host's confirmation.
//!
//! # Key Components
//!
//! - [`Router`] - Public façade over the stack, modal stack and registry
//! - [`TransitionObserver`] - Idle / Animating / Reconciling state machine
//! - [`NavigationHost`] - Platform seam receiving [`Transition`]s
//! - [`HostEvent`] - Confirmation, cancellation and gesture signals
//! - [`NavHandle`] - Deferred requests from inside callbacks
//! - [`RouterConfig`] - Tunables, loadable from TOML/JSON with `router-config`
//! - [`ErrorSink`] - Out-of-band faults (callback panics, rejected requests)
//!
//! # How it fits in the system
//! `navkit-core` supplies identities, the stack and the registry. This crate
//! owns their lifecycle and the ordering guarantees; the platform only ever
//! sees [`Transition`]s and answers with [`HostEvent`]s.

pub mod config;
pub mod error;
pub mod handle;
pub mod host;
pub mod observer;
mod request;
pub mod router;
pub mod sink;

pub use config::{RouterConfig, RouterConfigError};
pub use error::RouterError;
pub use handle::NavHandle;
pub use host::{
    HostEvent, ImmediateHost, NavigationHost, Transition, TransitionKind, TransitionStart,
};
pub use observer::{
    DiscardReason, ObserverPhase, PendingTransition, ReconcileReport, TransitionObserver,
    removed_innermost_first,
};
pub use router::{Router, RouterStats};
pub use sink::{CallbackKind, ErrorSink, RouterFault, TracingSink};
