// Settlement detection and toasts.
//
// A page observes the working state of the operations it started on every update. The
// watcher compares each observation with the previous `in_progress` for that operation and
// reports a settlement exactly once, on the transition away from in-progress.

use std::collections::HashMap;
use std::sync::Mutex;

use log::{info, warn};
use serde::Serialize;
use uuid::Uuid;

use super::{Operation, WorkingState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ToastVariant {
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub message: String,
    pub variant: ToastVariant,
}

pub trait ToastSink {
    fn show(&self, toast: Toast);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Succeeded,
    Failed { message: Option<String> },
}

#[derive(Debug, Default)]
pub struct AsyncResultWatcher {
    previous_in_progress: HashMap<Operation, bool>,
}

impl AsyncResultWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `state` for `op` and report a settlement if it just finished.
    pub fn observe(&mut self, op: Operation, state: &WorkingState) -> Option<Settlement> {
        let previous = self.previous_in_progress.insert(op, state.in_progress);

        // First observation, still running, or nothing was running before.
        if previous != Some(true) || state.in_progress {
            return None;
        }

        match state.completed {
            Some(true) => Some(Settlement::Succeeded),
            Some(false) => Some(Settlement::Failed {
                message: state.notification.as_ref().map(|n| n.message.clone()),
            }),
            None => None,
        }
    }

    /// Observe and act: run `on_complete` and show `success_message` on success, show a danger
    /// toast with the notification message on failure.
    pub fn handle<F: FnOnce()>(
        &mut self,
        op: Operation,
        state: &WorkingState,
        success_message: Option<&str>,
        on_complete: F,
        sink: &dyn ToastSink,
    ) -> Option<Settlement> {
        let settlement = self.observe(op, state)?;
        match &settlement {
            Settlement::Succeeded => {
                info!("[PHASE: working] [STEP: settle] {:?} succeeded", op);
                on_complete();
                if let Some(message) = success_message {
                    sink.show(Toast { message: message.to_string(), variant: ToastVariant::Success });
                }
            }
            Settlement::Failed { message } => {
                warn!("[PHASE: working] [STEP: settle] {:?} failed: {:?}", op, message);
                if let Some(message) = message {
                    sink.show(Toast { message: message.clone(), variant: ToastVariant::Danger });
                }
            }
        }
        Some(settlement)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueuedToast {
    pub id: Uuid,
    #[serde(flatten)]
    pub toast: Toast,
}

/// Toast sink that keeps toasts until the host drains them.
#[derive(Debug, Default)]
pub struct ToastQueue {
    toasts: Mutex<Vec<QueuedToast>>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<QueuedToast> {
        let mut toasts = self.toasts.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *toasts)
    }

    pub fn len(&self) -> usize {
        self.toasts.lock().map(|t| t.len()).unwrap_or_else(|e| e.into_inner().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ToastSink for ToastQueue {
    fn show(&self, toast: Toast) {
        let mut toasts = self.toasts.lock().unwrap_or_else(|e| e.into_inner());
        toasts.push(QueuedToast { id: Uuid::new_v4(), toast });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn first_observation_never_acts() {
        let mut watcher = AsyncResultWatcher::new();
        assert_eq!(watcher.observe(Operation::FetchingUser, &WorkingState::succeeded()), None);
        assert_eq!(watcher.observe(Operation::FetchingUser, &WorkingState::failed("x")), None);
    }

    #[test]
    fn success_runs_callback_and_toasts_once() {
        let mut watcher = AsyncResultWatcher::new();
        let queue = ToastQueue::new();
        let calls = Cell::new(0);
        let op = Operation::AcceptingPatientInvitation;

        watcher.handle(op, &WorkingState::idle(), Some("Accepted"), || calls.set(calls.get() + 1), &queue);
        watcher.handle(op, &WorkingState::in_progress(), Some("Accepted"), || calls.set(calls.get() + 1), &queue);
        let settled =
            watcher.handle(op, &WorkingState::succeeded(), Some("Accepted"), || calls.set(calls.get() + 1), &queue);
        watcher.handle(op, &WorkingState::succeeded(), Some("Accepted"), || calls.set(calls.get() + 1), &queue);

        assert_eq!(settled, Some(Settlement::Succeeded));
        assert_eq!(calls.get(), 1, "on_complete should run exactly once");
        let toasts = queue.drain();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].toast, Toast { message: "Accepted".into(), variant: ToastVariant::Success });
        assert!(queue.is_empty());
    }

    #[test]
    fn success_without_message_shows_no_toast() {
        let mut watcher = AsyncResultWatcher::new();
        let queue = ToastQueue::new();
        let op = Operation::FetchingPatientInvites;
        watcher.handle(op, &WorkingState::in_progress(), None, || {}, &queue);
        assert_eq!(watcher.handle(op, &WorkingState::succeeded(), None, || {}, &queue), Some(Settlement::Succeeded));
        assert!(queue.is_empty());
    }

    #[test]
    fn failure_shows_danger_toast() {
        let mut watcher = AsyncResultWatcher::new();
        let queue = ToastQueue::new();
        let op = Operation::DeletingPatientInvitation;
        watcher.observe(op, &WorkingState::in_progress());
        let called = Cell::new(false);
        watcher.handle(op, &WorkingState::failed("Could not delete"), Some("Deleted"), || called.set(true), &queue);

        assert!(!called.get());
        let toasts = queue.drain();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].toast.variant, ToastVariant::Danger);
        assert_eq!(toasts[0].toast.message, "Could not delete");
    }

    #[test]
    fn unknown_completion_is_ignored() {
        let mut watcher = AsyncResultWatcher::new();
        watcher.observe(Operation::SendingInvite, &WorkingState::in_progress());
        assert_eq!(watcher.observe(Operation::SendingInvite, &WorkingState::unknown()), None);
    }

    #[test]
    fn operations_settle_independently() {
        let mut watcher = AsyncResultWatcher::new();
        watcher.observe(Operation::FetchingClinic, &WorkingState::in_progress());
        watcher.observe(Operation::FetchingPatient, &WorkingState::in_progress());

        assert_eq!(
            watcher.observe(Operation::FetchingClinic, &WorkingState::succeeded()),
            Some(Settlement::Succeeded)
        );
        assert_eq!(
            watcher.observe(Operation::FetchingPatient, &WorkingState::failed("boom")),
            Some(Settlement::Failed { message: Some("boom".into()) })
        );
    }
}
