#![forbid(unsafe_code)]

//! Cloneable request handle.
//!
//! Callbacks run while the router is mutably borrowed, so they cannot call
//! the router directly. A [`NavHandle`] posts requests into a mailbox that
//! the router drains after the current reconciliation and at the start of
//! every public call. Posted requests are validated when they run; invalid
//! ones are reported to the router's [`ErrorSink`](crate::ErrorSink).

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use navkit_core::{Screen, ScreenId};

use crate::request::Request;

pub(crate) type Mailbox<C> = Rc<RefCell<VecDeque<Request<C>>>>;

/// Posts navigation requests to a [`Router`](crate::Router) from anywhere on
/// its thread, including from inside navigation callbacks.
pub struct NavHandle<C> {
    mailbox: Mailbox<C>,
    animate: bool,
}

impl<C> Clone for NavHandle<C> {
    fn clone(&self) -> Self {
        Self {
            mailbox: Rc::clone(&self.mailbox),
            animate: self.animate,
        }
    }
}

impl<C> fmt::Debug for NavHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavHandle")
            .field("posted", &self.posted())
            .field("animate", &self.animate)
            .finish()
    }
}

impl<C> NavHandle<C> {
    pub(crate) fn new(mailbox: Mailbox<C>, animate: bool) -> Self {
        Self { mailbox, animate }
    }

    /// A handle that posts with the given animation flag.
    #[must_use]
    pub fn with_animation(&self, animate: bool) -> Self {
        Self {
            mailbox: Rc::clone(&self.mailbox),
            animate,
        }
    }

    /// Animation flag carried by posted requests.
    pub fn animates(&self) -> bool {
        self.animate
    }

    /// Requests posted but not yet taken by the router.
    pub fn posted(&self) -> usize {
        self.mailbox.borrow().len()
    }

    fn post(&self, request: Request<C>) {
        self.mailbox.borrow_mut().push_back(request);
    }

    /// Post a push.
    pub fn push(&self, screen: Screen<C>) {
        self.post(Request::Push {
            screen,
            animated: self.animate,
            on_leave: None,
        });
    }

    /// Post a push with an on-leave callback.
    pub fn push_with_leave(&self, screen: Screen<C>, on_leave: impl FnOnce() + 'static) {
        self.post(Request::Push {
            screen,
            animated: self.animate,
            on_leave: Some(Box::new(on_leave)),
        });
    }

    /// Post a pop.
    pub fn pop(&self) {
        self.post(Request::Pop {
            animated: self.animate,
            expected: None,
        });
    }

    /// Post a pop back to `target`.
    pub fn pop_to(&self, target: ScreenId) {
        self.post(Request::PopTo {
            target,
            animated: self.animate,
        });
    }

    /// Post a pop back to the root.
    pub fn pop_to_root(&self) {
        self.post(Request::PopToRoot {
            animated: self.animate,
        });
    }

    /// Post a stack replacement.
    pub fn set_root(&self, screen: Screen<C>) {
        self.post(Request::SetRoot {
            screen,
            on_leave: None,
        });
    }

    /// Post a stack replacement with an on-leave callback for the new root.
    pub fn set_root_with_leave(&self, screen: Screen<C>, on_leave: impl FnOnce() + 'static) {
        self.post(Request::SetRoot {
            screen,
            on_leave: Some(Box::new(on_leave)),
        });
    }

    /// Post a modal presentation.
    pub fn present(&self, screen: Screen<C>) {
        self.post(Request::Present {
            screen,
            animated: self.animate,
            on_dismiss: None,
        });
    }

    /// Post a modal presentation with a dismissal callback.
    pub fn present_with_dismiss(&self, screen: Screen<C>, on_dismiss: impl FnOnce() + 'static) {
        self.post(Request::Present {
            screen,
            animated: self.animate,
            on_dismiss: Some(Box::new(on_dismiss)),
        });
    }

    /// Post a dismissal of the top modal.
    pub fn dismiss(&self) {
        self.post(Request::Dismiss {
            animated: self.animate,
            completion: None,
        });
    }

    /// Post a dismissal with a completion.
    pub fn dismiss_with_completion(&self, completion: impl FnOnce() + 'static) {
        self.post(Request::Dismiss {
            animated: self.animate,
            completion: Some(Box::new(completion)),
        });
    }
}
