#![forbid(unsafe_code)]

//! Screens presented outside the navigation stack.
//!
//! A modal carries its own dismissal callback, stored with the entry rather
//! than in the [`CompletionRegistry`](crate::CompletionRegistry). Dismissing
//! a modal never touches the stack registry and vice versa.
//!
//! Modals nest LIFO: only the top modal can be dismissed.

use std::fmt;

use crate::identity::{Screen, ScreenId};
use crate::registry::{Resolution, invoke};
use crate::stack::StackError;

/// Callback invoked once when a presented screen is confirmed dismissed.
pub type OnDismiss = Box<dyn FnOnce()>;

/// A presented screen and its optional dismissal callback.
pub struct ModalEntry<C> {
    screen: Screen<C>,
    on_dismiss: Option<OnDismiss>,
}

impl<C> fmt::Debug for ModalEntry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalEntry")
            .field("id", &self.screen.id())
            .field("has_callback", &self.on_dismiss.is_some())
            .finish()
    }
}

impl<C> ModalEntry<C> {
    /// Pair a screen with its dismissal callback.
    pub fn new(screen: Screen<C>, on_dismiss: Option<OnDismiss>) -> Self {
        Self { screen, on_dismiss }
    }

    /// The presented screen's identity.
    #[inline]
    pub fn id(&self) -> ScreenId {
        self.screen.id()
    }

    /// Borrow the presented screen.
    pub fn screen(&self) -> &Screen<C> {
        &self.screen
    }

    /// Whether a dismissal callback is attached.
    pub fn has_callback(&self) -> bool {
        self.on_dismiss.is_some()
    }

    /// Split into the screen and its callback without running it.
    pub fn into_parts(self) -> (Screen<C>, Option<OnDismiss>) {
        (self.screen, self.on_dismiss)
    }

    /// Consume the entry, running its dismissal callback if present.
    ///
    /// Returns the screen so the caller can hand content back to the host.
    pub fn resolve(self) -> (Screen<C>, Resolution) {
        let resolution = self
            .on_dismiss
            .map_or(Resolution::NotRegistered, invoke);
        (self.screen, resolution)
    }
}

/// LIFO stack of presented screens.
pub struct ModalStack<C> {
    entries: Vec<ModalEntry<C>>,
}

impl<C> fmt::Debug for ModalStack<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalStack")
            .field("ids", &self.snapshot())
            .finish()
    }
}

impl<C> Default for ModalStack<C> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<C> ModalStack<C> {
    /// Create an empty modal stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Present `entry` on top of any existing modals.
    pub fn push(&mut self, entry: ModalEntry<C>) -> Result<(), StackError> {
        let id = entry.id();
        if self.contains(id) {
            return Err(StackError::DuplicateIdentity(id));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Remove the top modal without running its callback.
    pub fn pop(&mut self) -> Option<ModalEntry<C>> {
        self.entries.pop()
    }

    /// The top modal.
    #[must_use]
    pub fn top(&self) -> Option<&ModalEntry<C>> {
        self.entries.last()
    }

    /// Identity of the top modal.
    #[must_use]
    pub fn top_id(&self) -> Option<ScreenId> {
        self.entries.last().map(ModalEntry::id)
    }

    /// Whether `id` is currently presented.
    #[must_use]
    pub fn contains(&self, id: ScreenId) -> bool {
        self.entries.iter().any(|e| e.id() == id)
    }

    /// Presented identities, bottom first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ScreenId> {
        self.entries.iter().map(ModalEntry::id).collect()
    }

    /// Number of presented modals.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is presented.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every modal without running callbacks. Returns how many
    /// callbacks were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.entries.iter().filter(|e| e.has_callback()).count();
        self.entries.clear();
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn push_pop_is_lifo() {
        let mut modals = ModalStack::new();
        let a = Screen::new("a");
        let b = Screen::new("b");
        let (a_id, b_id) = (a.id(), b.id());
        modals.push(ModalEntry::new(a, None)).unwrap();
        modals.push(ModalEntry::new(b, None)).unwrap();

        assert_eq!(modals.snapshot(), vec![a_id, b_id]);
        assert_eq!(modals.top_id(), Some(b_id));
        assert_eq!(modals.pop().map(|e| e.id()), Some(b_id));
        assert_eq!(modals.top_id(), Some(a_id));
    }

    #[test]
    fn duplicate_presentation_rejected() {
        let mut modals = ModalStack::new();
        let a = Screen::new(());
        modals.push(ModalEntry::new(a.clone(), None)).unwrap();
        assert_eq!(
            modals.push(ModalEntry::new(a.clone(), None)),
            Err(StackError::DuplicateIdentity(a.id()))
        );
    }

    #[test]
    fn resolve_runs_callback_once() {
        let fired = Rc::new(Cell::new(0));
        let f = Rc::clone(&fired);
        let entry = ModalEntry::new(Screen::new(7), Some(Box::new(move || f.set(f.get() + 1))));
        let (screen, outcome) = entry.resolve();
        assert_eq!(*screen.content(), 7);
        assert_eq!(outcome, Resolution::Invoked);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn resolve_catches_panics() {
        let entry = ModalEntry::new(Screen::new(()), Some(Box::new(|| panic!("sheet"))));
        let (_, outcome) = entry.resolve();
        assert_eq!(outcome, Resolution::Panicked("sheet".into()));
    }

    #[test]
    fn clear_counts_dropped_callbacks() {
        let mut modals = ModalStack::new();
        modals
            .push(ModalEntry::new(Screen::new(()), Some(Box::new(|| unreachable!()))))
            .unwrap();
        modals.push(ModalEntry::new(Screen::new(()), None)).unwrap();
        assert_eq!(modals.clear(), 1);
        assert!(modals.is_empty());
    }
}
