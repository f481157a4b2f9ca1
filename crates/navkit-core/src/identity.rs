#![forbid(unsafe_code)]

//! Screen identities.
//!
//! A [`ScreenId`] is minted exactly once per [`Screen`] from a process-wide
//! counter. Identities are never derived from where a screen lives in memory,
//! so a destroyed screen's id can never be handed to an unrelated screen and
//! a stale callback can never be misattributed.
//!
//! # Invariants
//!
//! 1. Ids are strictly increasing in minting order.
//! 2. An id is never reused for the lifetime of the process.
//! 3. Cloning a `Screen` clones its id: the clone is the *same* screen, and a
//!    stack rejects it as a duplicate.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for screen identities. Starts at 1 so `0` never appears.
static SCREEN_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Opaque, process-unique identity of a screen instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScreenId(u64);

impl ScreenId {
    /// Mint a fresh identity.
    #[must_use]
    pub fn mint() -> Self {
        Self(SCREEN_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw id value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "screen#{}", self.0)
    }
}

/// Anything that carries a [`ScreenId`].
///
/// [`NavigationStack`](crate::NavigationStack) is generic over this so the
/// router can keep both a stack of full screens and an identity-only
/// projection under the same contract.
pub trait Identified {
    /// The identity of this item.
    fn screen_id(&self) -> ScreenId;
}

impl Identified for ScreenId {
    #[inline]
    fn screen_id(&self) -> ScreenId {
        *self
    }
}

/// One unit of navigable content with a stable identity.
///
/// The router orders and tracks screens by id only; `content` is whatever the
/// host needs to render and is never inspected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen<C> {
    id: ScreenId,
    content: C,
}

impl<C> Screen<C> {
    /// Wrap `content` in a screen with a freshly minted id.
    pub fn new(content: C) -> Self {
        Self {
            id: ScreenId::mint(),
            content,
        }
    }

    /// The screen's identity.
    #[inline]
    pub fn id(&self) -> ScreenId {
        self.id
    }

    /// Borrow the host content.
    #[inline]
    pub fn content(&self) -> &C {
        &self.content
    }

    /// Mutably borrow the host content.
    #[inline]
    pub fn content_mut(&mut self) -> &mut C {
        &mut self.content
    }

    /// Consume the screen, returning its content.
    pub fn into_content(self) -> C {
        self.content
    }
}

impl<C> Identified for Screen<C> {
    #[inline]
    fn screen_id(&self) -> ScreenId {
        self.id
    }
}
