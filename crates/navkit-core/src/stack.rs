#![forbid(unsafe_code)]

//! Ordered navigation stack.
//!
//! [`NavigationStack`] is the ground-truth sequence of screens a router has
//! confirmed. Index 0 is the root.
//!
//! ```text
//! push(C)
//! ┌──────────────────────────────┐
//! │ [Root, A, B, C]              │
//! └──────────────────────────────┘
//!
//! pop_to(A)   removes [B, C]
//! ┌──────────────────────────────┐
//! │ [Root, A]                    │
//! └──────────────────────────────┘
//!
//! set_root(X) removes [Root, A]
//! ┌──────────────────────────────┐
//! │ [X]                          │
//! └──────────────────────────────┘
//! ```
//!
//! # Invariants
//!
//! 1. No two entries share a [`ScreenId`].
//! 2. Once `set_root` has been called the stack is never empty.
//! 3. The only mutations are append, truncate-from-top and full replace.
//! 4. The root is never removed by `pop_one`.

use std::fmt;

use crate::identity::{Identified, ScreenId};

/// Misuse of a [`NavigationStack`].
///
/// These indicate a coordinator bug and are always returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackError {
    /// The identity is already on the stack.
    DuplicateIdentity(ScreenId),
    /// Only the root (or nothing) remains; there is nothing to pop.
    EmptyStack,
    /// The identity is not on the stack.
    NotFound(ScreenId),
}

impl fmt::Display for StackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateIdentity(id) => write!(f, "{id} is already on the stack"),
            Self::EmptyStack => write!(f, "nothing above the root to pop"),
            Self::NotFound(id) => write!(f, "{id} is not on the stack"),
        }
    }
}

impl std::error::Error for StackError {}

/// Ordered sequence of identified items, index 0 = root.
#[derive(Clone, PartialEq, Eq)]
pub struct NavigationStack<T> {
    entries: Vec<T>,
}

impl<T: Identified> fmt::Debug for NavigationStack<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationStack")
            .field("ids", &self.snapshot())
            .finish()
    }
}

impl<T> Default for NavigationStack<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: Identified> NavigationStack<T> {
    /// Create an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stack holding only `root`.
    #[must_use]
    pub fn with_root(root: T) -> Self {
        Self {
            entries: vec![root],
        }
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Append `entry` on top.
    ///
    /// Pushing onto an empty stack makes `entry` the root.
    pub fn push(&mut self, entry: T) -> Result<(), StackError> {
        let id = entry.screen_id();
        if self.contains(id) {
            return Err(StackError::DuplicateIdentity(id));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Remove and return the top entry. The root is never popped.
    pub fn pop_one(&mut self) -> Result<T, StackError> {
        if self.entries.len() <= 1 {
            return Err(StackError::EmptyStack);
        }
        self.entries.pop().ok_or(StackError::EmptyStack)
    }

    /// Remove every entry above `id`.
    ///
    /// Returns the removed entries in stack order (outermost first). Popping
    /// to the current top removes nothing.
    pub fn pop_to(&mut self, id: ScreenId) -> Result<Vec<T>, StackError> {
        let index = self.position(id).ok_or(StackError::NotFound(id))?;
        Ok(self.entries.split_off(index + 1))
    }

    /// Replace the whole stack with `[root]`, returning the previous contents
    /// in stack order.
    pub fn set_root(&mut self, root: T) -> Vec<T> {
        std::mem::replace(&mut self.entries, vec![root])
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Ordered identities, root first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ScreenId> {
        self.entries.iter().map(Identified::screen_id).collect()
    }

    /// Number of entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the stack has no entries (only before the first root).
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The top entry.
    #[must_use]
    pub fn top(&self) -> Option<&T> {
        self.entries.last()
    }

    /// The root entry.
    #[must_use]
    pub fn root(&self) -> Option<&T> {
        self.entries.first()
    }

    /// Whether `id` is on the stack.
    #[must_use]
    pub fn contains(&self, id: ScreenId) -> bool {
        self.position(id).is_some()
    }

    /// Index of `id`, root = 0.
    #[must_use]
    pub fn position(&self, id: ScreenId) -> Option<usize> {
        self.entries.iter().position(|e| e.screen_id() == id)
    }

    /// Iterate entries root first.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }
}

/// Collects root first. Later entries whose identity is already present are
/// skipped, so the no-duplicates invariant holds for any input.
impl<T: Identified> FromIterator<T> for NavigationStack<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut stack = Self::new();
        for entry in iter {
            let _ = stack.push(entry);
        }
        stack
    }
}

impl<'a, T> IntoIterator for &'a NavigationStack<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
