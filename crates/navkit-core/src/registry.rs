#![forbid(unsafe_code)]

//! One-shot completion callbacks keyed by screen identity.
//!
//! # Invariants
//!
//! 1. At most one callback per [`ScreenId`]; registering again replaces the
//!    previous one (last writer wins) without invoking it.
//! 2. A callback is removed from the map *before* it runs, so a second
//!    `resolve` for the same id is a no-op even if the first call panicked.
//! 3. `drop_entry` and `clear` never invoke callbacks.
//!
//! # Failure Modes
//!
//! - **Callback panics**: the panic is caught and reported as
//!   [`Resolution::Panicked`]. The entry is already gone, so state stays
//!   consistent and the caller may continue resolving other ids.

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

use ahash::AHashMap;

use crate::identity::ScreenId;

/// Callback invoked once when a screen is confirmed removed from the stack.
pub type OnLeave = Box<dyn FnOnce()>;

/// Outcome of [`CompletionRegistry::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// No callback was registered (or it was already resolved).
    NotRegistered,
    /// The callback ran to completion.
    Invoked,
    /// The callback panicked; the message is extracted from the payload.
    Panicked(String),
}

impl Resolution {
    /// Whether a callback was found and run (successfully or not).
    #[must_use]
    pub fn was_registered(&self) -> bool {
        !matches!(self, Self::NotRegistered)
    }
}

/// Mapping from screen identity to its pending on-leave callback.
#[derive(Default)]
pub struct CompletionRegistry {
    entries: AHashMap<ScreenId, OnLeave>,
}

impl fmt::Debug for CompletionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.entries.keys().copied().collect();
        ids.sort_unstable();
        f.debug_struct("CompletionRegistry")
            .field("ids", &ids)
            .finish()
    }
}

impl CompletionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `callback` for `id`.
    ///
    /// Returns the callback it replaced, if any. The replaced callback is
    /// handed back rather than invoked.
    pub fn register(&mut self, id: ScreenId, callback: OnLeave) -> Option<OnLeave> {
        let previous = self.entries.insert(id, callback);
        #[cfg(feature = "tracing")]
        if previous.is_some() {
            tracing::debug!(screen = id.raw(), "on-leave callback replaced");
        }
        previous
    }

    /// Invoke and evict the callback for `id`, if one exists.
    pub fn resolve(&mut self, id: ScreenId) -> Resolution {
        match self.entries.remove(&id) {
            Some(callback) => invoke(callback),
            None => Resolution::NotRegistered,
        }
    }

    /// Evict the callback for `id` without invoking it.
    ///
    /// Returns `true` if an entry was removed.
    pub fn drop_entry(&mut self, id: ScreenId) -> bool {
        self.entries.remove(&id).is_some()
    }

    /// Drop every callback without invoking any. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    /// Whether a callback is registered for `id`.
    #[must_use]
    pub fn contains(&self, id: ScreenId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of registered callbacks.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no callbacks are registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Run a one-shot callback, catching a panic instead of unwinding through
/// the caller.
pub fn invoke(callback: Box<dyn FnOnce()>) -> Resolution {
    match catch_unwind(AssertUnwindSafe(callback)) {
        Ok(()) => Resolution::Invoked,
        Err(payload) => Resolution::Panicked(panic_message(payload.as_ref())),
    }
}

/// Best-effort string from a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counter() -> (Rc<Cell<u32>>, OnLeave) {
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        (count, Box::new(move || c.set(c.get() + 1)))
    }

    #[test]
    fn resolve_invokes_once() {
        let mut registry = CompletionRegistry::new();
        let id = ScreenId::mint();
        let (count, cb) = counter();
        registry.register(id, cb);

        assert_eq!(registry.resolve(id), Resolution::Invoked);
        assert_eq!(registry.resolve(id), Resolution::NotRegistered);
        assert_eq!(count.get(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn resolve_unknown_is_noop() {
        let mut registry = CompletionRegistry::new();
        assert_eq!(registry.resolve(ScreenId::mint()), Resolution::NotRegistered);
    }

    #[test]
    fn register_replaces_without_invoking() {
        let mut registry = CompletionRegistry::new();
        let id = ScreenId::mint();
        let (first, cb1) = counter();
        let (second, cb2) = counter();

        assert!(registry.register(id, cb1).is_none());
        let replaced = registry.register(id, cb2);
        assert!(replaced.is_some());
        drop(replaced);

        registry.resolve(id);
        assert_eq!(first.get(), 0);
        assert_eq!(second.get(), 1);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn drop_entry_never_invokes() {
        let mut registry = CompletionRegistry::new();
        let id = ScreenId::mint();
        let (count, cb) = counter();
        registry.register(id, cb);

        assert!(registry.drop_entry(id));
        assert!(!registry.drop_entry(id));
        assert_eq!(registry.resolve(id), Resolution::NotRegistered);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn panicking_callback_is_evicted() {
        let mut registry = CompletionRegistry::new();
        let id = ScreenId::mint();
        registry.register(id, Box::new(|| panic!("coordinator exploded")));

        let outcome = registry.resolve(id);
        assert_eq!(outcome, Resolution::Panicked("coordinator exploded".into()));
        assert!(outcome.was_registered());
        assert!(!registry.contains(id));
        assert_eq!(registry.resolve(id), Resolution::NotRegistered);
    }

    #[test]
    fn clear_drops_everything() {
        let mut registry = CompletionRegistry::new();
        let (count, cb) = counter();
        registry.register(ScreenId::mint(), cb);
        registry.register(ScreenId::mint(), Box::new(|| {}));

        assert_eq!(registry.clear(), 2);
        assert!(registry.is_empty());
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn invoke_reports_outcome() {
        assert_eq!(invoke(Box::new(|| {})), Resolution::Invoked);
        assert_eq!(
            invoke(Box::new(|| panic!("{} failed", "flow"))),
            Resolution::Panicked("flow failed".into())
        );
    }

    #[test]
    fn panic_message_formats() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(owned.as_ref()), "owned");
        let other: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(other.as_ref()), "non-string panic payload");
    }
}
