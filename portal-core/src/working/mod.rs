// Working state of in-flight backend operations.
//
// Every tracked operation owns one `WorkingState`. Transitions replace the whole entry for the
// addressed operation; the reducer never touches any other key.

pub mod watcher;

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    FetchingUser,
    UpdatingUser,
    FetchingClinic,
    FetchingPatient,
    FetchingPatientFromClinic,
    UpdatingClinicPatient,
    FetchingPatientInvites,
    AcceptingPatientInvitation,
    DeletingPatientInvitation,
    SendingInvite,
    SendingClinicInvite,
    FetchingTideDashboardPatients,
    FetchingDevices,
    CreatingPrescription,
    CreatingPrescriptionRevision,
}

impl Operation {
    pub const ALL: [Operation; 15] = [
        Operation::FetchingUser,
        Operation::UpdatingUser,
        Operation::FetchingClinic,
        Operation::FetchingPatient,
        Operation::FetchingPatientFromClinic,
        Operation::UpdatingClinicPatient,
        Operation::FetchingPatientInvites,
        Operation::AcceptingPatientInvitation,
        Operation::DeletingPatientInvitation,
        Operation::SendingInvite,
        Operation::SendingClinicInvite,
        Operation::FetchingTideDashboardPatients,
        Operation::FetchingDevices,
        Operation::CreatingPrescription,
        Operation::CreatingPrescriptionRevision,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingState {
    pub in_progress: bool,
    /// `None` means the state was never initialised and must not produce a toast.
    pub completed: Option<bool>,
    pub notification: Option<Notification>,
}

impl Default for WorkingState {
    fn default() -> Self {
        Self::idle()
    }
}

impl WorkingState {
    pub fn idle() -> Self {
        Self { in_progress: false, completed: Some(false), notification: None }
    }

    pub fn in_progress() -> Self {
        Self { in_progress: true, completed: Some(false), notification: None }
    }

    pub fn succeeded() -> Self {
        Self { in_progress: false, completed: Some(true), notification: None }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            in_progress: false,
            completed: Some(false),
            notification: Some(Notification { message: message.into() }),
        }
    }

    pub fn unknown() -> Self {
        Self { in_progress: false, completed: None, notification: None }
    }
}

/// Fetchers dispatch only when the operation is idle: not running, not yet completed and
/// not holding an unacknowledged failure.
pub fn should_fetch(state: &WorkingState) -> bool {
    !state.in_progress && state.completed != Some(true) && state.notification.is_none()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkingAction {
    Request(Operation),
    Success(Operation),
    Failure(Operation, String),
    Reset(Operation),
}

impl WorkingAction {
    pub fn operation(&self) -> Operation {
        match self {
            WorkingAction::Request(op)
            | WorkingAction::Success(op)
            | WorkingAction::Failure(op, _)
            | WorkingAction::Reset(op) => *op,
        }
    }
}

/// Working state of every tracked operation. Operations never dispatched read as idle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingStates {
    states: BTreeMap<Operation, WorkingState>,
}

impl WorkingStates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, op: Operation) -> WorkingState {
        self.states.get(&op).cloned().unwrap_or_default()
    }

    /// Apply `action`, returning the next value. `self` is left as it was.
    pub fn reduce(&self, action: &WorkingAction) -> WorkingStates {
        let op = action.operation();
        let next_state = match action {
            WorkingAction::Request(_) => WorkingState::in_progress(),
            WorkingAction::Success(_) => WorkingState::succeeded(),
            WorkingAction::Failure(_, message) => WorkingState::failed(message.clone()),
            WorkingAction::Reset(_) => WorkingState::idle(),
        };
        debug!("[PHASE: working] [STEP: reduce] {:?} -> {:?}", action, next_state);

        let mut next = self.clone();
        next.states.insert(op, next_state);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_operations_are_idle() {
        let states = WorkingStates::new();
        assert_eq!(states.get(Operation::FetchingUser), WorkingState::idle());
        assert!(should_fetch(&states.get(Operation::FetchingUser)));
    }

    #[test]
    fn transitions_replace_the_whole_entry() {
        let states = WorkingStates::new()
            .reduce(&WorkingAction::Request(Operation::SendingInvite))
            .reduce(&WorkingAction::Failure(Operation::SendingInvite, "Nope".into()));
        assert_eq!(states.get(Operation::SendingInvite), WorkingState::failed("Nope"));

        let states = states
            .reduce(&WorkingAction::Request(Operation::SendingInvite))
            .reduce(&WorkingAction::Success(Operation::SendingInvite));
        assert_eq!(
            states.get(Operation::SendingInvite),
            WorkingState::succeeded(),
            "a stale notification must not survive a later success"
        );
    }

    #[test]
    fn reduce_touches_only_the_addressed_operation() {
        let before = WorkingStates::new()
            .reduce(&WorkingAction::Success(Operation::FetchingClinic))
            .reduce(&WorkingAction::Failure(Operation::FetchingPatient, "gone".into()));
        let after = before.reduce(&WorkingAction::Request(Operation::FetchingUser));

        for op in Operation::ALL {
            if op != Operation::FetchingUser {
                assert_eq!(before.get(op), after.get(op), "{:?} changed", op);
            }
        }
        assert!(after.get(Operation::FetchingUser).in_progress);
    }

    #[test]
    fn should_fetch_only_when_idle() {
        assert!(should_fetch(&WorkingState::idle()));
        assert!(!should_fetch(&WorkingState::in_progress()));
        assert!(!should_fetch(&WorkingState::succeeded()));
        assert!(!should_fetch(&WorkingState::failed("error")));
        assert!(should_fetch(&WorkingStates::new()
            .reduce(&WorkingAction::Success(Operation::FetchingDevices))
            .reduce(&WorkingAction::Reset(Operation::FetchingDevices))
            .get(Operation::FetchingDevices)));
    }
}
