#![forbid(unsafe_code)]

//! Core navigation primitives for navkit.
//!
//! This crate holds the pieces of a router that have no notion of time or
//! animation:
//!
//! - [`ScreenId`] / [`Screen`]: minted, never-reused identities paired with
//!   opaque host content.
//! - [`NavigationStack`]: the ordered ground truth, index 0 = root.
//! - [`CompletionRegistry`]: one-shot on-leave callbacks keyed by identity.
//! - [`ModalStack`]: screens presented outside the stack, each with an
//!   optional dismissal callback.
//!
//! # Role in navkit
//! `navkit-runtime` composes these into the transition observer and router
//! façade. Nothing here talks to a platform or a clock.

pub mod identity;
pub mod modal;
pub mod registry;
pub mod stack;

pub use identity::{Identified, Screen, ScreenId};
pub use modal::{ModalEntry, ModalStack, OnDismiss};
pub use registry::{CompletionRegistry, OnLeave, Resolution, invoke};
pub use stack::{NavigationStack, StackError};
