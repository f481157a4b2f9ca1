#![forbid(unsafe_code)]

//! Scripted platform host.

use std::collections::VecDeque;

use navkit_core::ScreenId;
use navkit_runtime::{HostEvent, NavigationHost, Transition, TransitionKind, TransitionStart};

/// How a [`ScriptedHost`] takes animated transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostMode {
    /// Report animated transitions as animating; the test confirms them.
    #[default]
    Animate,
    /// Apply everything synchronously.
    Complete,
}

/// One transition as the host saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRecord {
    pub kind: TransitionKind,
    pub animated: bool,
    pub incoming: Option<ScreenId>,
    pub from: Vec<ScreenId>,
    pub to: Vec<ScreenId>,
}

impl TransitionRecord {
    /// The signal a host sends when this transition finishes.
    pub fn completed(&self) -> HostEvent {
        HostEvent::Completed {
            top: self.to.last().copied(),
        }
    }

    /// The signal a host sends when this transition is aborted.
    pub fn cancelled(&self) -> HostEvent {
        HostEvent::Cancelled {
            top: self.from.last().copied(),
        }
    }
}

/// Host that records transitions and answers from a script.
#[derive(Debug, Default)]
pub struct ScriptedHost {
    mode: HostMode,
    script: VecDeque<TransitionStart>,
    records: Vec<TransitionRecord>,
}

impl ScriptedHost {
    /// Host that animates every animated transition.
    pub fn animating() -> Self {
        Self::default()
    }

    /// Host that completes every transition synchronously.
    pub fn immediate() -> Self {
        Self {
            mode: HostMode::Complete,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> HostMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: HostMode) {
        self.mode = mode;
    }

    /// Answer the next `begin` with `start`, ahead of the mode.
    pub fn script(&mut self, start: TransitionStart) {
        self.script.push_back(start);
    }

    /// Every transition begun so far.
    pub fn records(&self) -> &[TransitionRecord] {
        &self.records
    }

    /// The most recent transition.
    pub fn last(&self) -> Option<&TransitionRecord> {
        self.records.last()
    }

    /// Completion signal for the most recent transition.
    pub fn confirm_last(&self) -> Option<HostEvent> {
        self.last().map(TransitionRecord::completed)
    }

    /// Cancellation signal for the most recent transition.
    pub fn cancel_last(&self) -> Option<HostEvent> {
        self.last().map(TransitionRecord::cancelled)
    }

    /// Kinds of every transition begun, in order.
    pub fn kinds(&self) -> Vec<TransitionKind> {
        self.records.iter().map(|r| r.kind).collect()
    }
}

impl<C> NavigationHost<C> for ScriptedHost {
    fn begin(&mut self, transition: &Transition<'_, C>) -> TransitionStart {
        self.records.push(TransitionRecord {
            kind: transition.kind,
            animated: transition.animated,
            incoming: transition.incoming.map(|screen| screen.id()),
            from: transition.from.to_vec(),
            to: transition.to.to_vec(),
        });
        if let Some(start) = self.script.pop_front() {
            return start;
        }
        match self.mode {
            HostMode::Animate => TransitionStart::Animating,
            HostMode::Complete => TransitionStart::Completed,
        }
    }
}
