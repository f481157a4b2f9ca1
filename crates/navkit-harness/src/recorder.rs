#![forbid(unsafe_code)]

//! Recorders for callback order and out-of-band faults.

use std::cell::RefCell;
use std::rc::Rc;

use navkit_runtime::{ErrorSink, RouterFault};

/// Shared, ordered log of callback names.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Rc<RefCell<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A callback that appends `name` when run.
    pub fn callback(&self, name: impl Into<String>) -> impl FnOnce() + 'static {
        let calls = Rc::clone(&self.calls);
        let name = name.into();
        move || calls.borrow_mut().push(name)
    }

    /// A callback that appends `name` and then panics.
    pub fn panicking(&self, name: impl Into<String>) -> impl FnOnce() + 'static {
        let calls = Rc::clone(&self.calls);
        let name = name.into();
        move || {
            calls.borrow_mut().push(name.clone());
            panic!("{name} failed");
        }
    }

    /// Names in invocation order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// How many times `name` ran.
    pub fn count(&self, name: &str) -> usize {
        self.calls.borrow().iter().filter(|c| *c == name).count()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }
}

/// Sink that keeps every fault. Clones share storage.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    faults: Rc<RefCell<Vec<RouterFault>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn faults(&self) -> Vec<RouterFault> {
        self.faults.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.faults.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.faults.borrow().is_empty()
    }
}

impl ErrorSink for CollectingSink {
    fn report(&mut self, fault: RouterFault) {
        self.faults.borrow_mut().push(fault);
    }
}
