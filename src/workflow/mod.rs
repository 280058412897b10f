//! Two-step delete confirmation workflow.
//!
//! The only safeguard against irreversible loss: a destructive mutation on a
//! file or note must pass `request` and then two `advance` calls. `cancel`
//! returns to idle from any state with nothing deleted. One pending target
//! at a time.
//!
//! The machine itself is side-effect free: the second `advance` reports
//! `Execute(target)` and the ops layer performs the actual mutation.

use std::sync::Mutex;

/// What kind of record a pending deletion targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    File,
    Note,
}

/// The record a pending deletion targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteTarget {
    pub kind: TargetKind,
    pub id: i64,
}

#[derive(Debug)]
enum DeleteState {
    Idle,
    Requested(DeleteTarget),
    Confirmed(DeleteTarget),
}

/// Outcome of an `advance` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Nothing pending; the call was a no-op
    Ignored,
    /// First confirmation given; a second, stronger one is now required
    NowConfirmed,
    /// Second confirmation given; the caller must perform the deletion
    Execute(DeleteTarget),
}

/// State machine `Idle → Requested → Confirmed → Idle`.
pub struct DeleteWorkflow {
    state: Mutex<DeleteState>,
}

impl DeleteWorkflow {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DeleteState::Idle),
        }
    }

    /// Record a deletion target. Only honored from idle; returns whether the
    /// request was accepted.
    pub fn request(&self, kind: TargetKind, id: i64) -> bool {
        let mut state = self.state.lock().expect("delete workflow lock poisoned");
        match *state {
            DeleteState::Idle => {
                *state = DeleteState::Requested(DeleteTarget { kind, id });
                true
            }
            _ => false,
        }
    }

    /// Move the pending deletion one step forward.
    pub fn advance(&self) -> Advance {
        let mut state = self.state.lock().expect("delete workflow lock poisoned");
        match *state {
            DeleteState::Idle => Advance::Ignored,
            DeleteState::Requested(target) => {
                *state = DeleteState::Confirmed(target);
                Advance::NowConfirmed
            }
            DeleteState::Confirmed(target) => {
                *state = DeleteState::Idle;
                Advance::Execute(target)
            }
        }
    }

    /// Discard the pending target from any state. No partial deletion occurs.
    pub fn cancel(&self) {
        *self.state.lock().expect("delete workflow lock poisoned") = DeleteState::Idle;
    }

    /// The target currently awaiting confirmation, if any.
    pub fn pending(&self) -> Option<DeleteTarget> {
        match *self.state.lock().expect("delete workflow lock poisoned") {
            DeleteState::Idle => None,
            DeleteState::Requested(target) | DeleteState::Confirmed(target) => Some(target),
        }
    }
}

impl Default for DeleteWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_confirmations_then_execute() {
        let workflow = DeleteWorkflow::new();
        assert!(workflow.request(TargetKind::File, 42));

        assert_eq!(workflow.advance(), Advance::NowConfirmed);
        assert_eq!(
            workflow.advance(),
            Advance::Execute(DeleteTarget {
                kind: TargetKind::File,
                id: 42
            })
        );
        // Back to idle afterwards.
        assert_eq!(workflow.advance(), Advance::Ignored);
        assert!(workflow.pending().is_none());
    }

    #[test]
    fn test_cancel_from_any_state() {
        let workflow = DeleteWorkflow::new();

        workflow.request(TargetKind::Note, 7);
        workflow.cancel();
        assert!(workflow.pending().is_none());

        workflow.request(TargetKind::Note, 7);
        workflow.advance();
        workflow.cancel();
        assert_eq!(workflow.advance(), Advance::Ignored);
    }

    #[test]
    fn test_single_pending_target() {
        let workflow = DeleteWorkflow::new();
        assert!(workflow.request(TargetKind::File, 1));
        assert!(!workflow.request(TargetKind::Note, 2));
        assert_eq!(
            workflow.pending(),
            Some(DeleteTarget {
                kind: TargetKind::File,
                id: 1
            })
        );
    }
}
