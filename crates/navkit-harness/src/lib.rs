#![forbid(unsafe_code)]

//! Test fixtures for navkit.
//!
//! - [`ScriptedHost`]: a [`NavigationHost`](navkit_runtime::NavigationHost)
//!   that records every transition and either animates or completes it.
//! - [`CallLog`]: ordered record of callback invocations.
//! - [`CollectingSink`]: an [`ErrorSink`](navkit_runtime::ErrorSink) that
//!   keeps every fault for assertions.
//! - [`capture`]: a `tracing-subscriber` layer that captures spans and events.

pub mod capture;
pub mod host;
pub mod recorder;

pub use capture::{CaptureHandle, CapturedEvent, CapturedSpan, with_captured};
pub use host::{HostMode, ScriptedHost, TransitionRecord};
pub use recorder::{CallLog, CollectingSink};
