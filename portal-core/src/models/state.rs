// Application state (in-memory)
//
// NOTE: This is NOT persisted; it holds the working state of every tracked backend operation
// for the lifetime of the session. The lock is only held to swap values, never across an await.

use std::future::Future;

use log::{info, warn};
use tokio::sync::Mutex;

use crate::working::{Operation, WorkingAction, WorkingState, WorkingStates};

#[derive(Debug, Default)]
pub struct AppState {
    inner: Mutex<AppStateInner>,
}

#[derive(Debug, Default)]
struct AppStateInner {
    working: WorkingStates,
}

impl AppState {
    pub async fn dispatch(&self, action: WorkingAction) {
        let mut inner = self.inner.lock().await;
        inner.working = inner.working.reduce(&action);
    }

    pub async fn working(&self, op: Operation) -> WorkingState {
        self.inner.lock().await.working.get(op)
    }

    pub async fn snapshot(&self) -> WorkingStates {
        self.inner.lock().await.working.clone()
    }

    /// Dispatch request, run `fut`, then dispatch success or failure. The error is returned to
    /// the caller after its message has been recorded as the operation's notification.
    pub async fn track<T, E, F>(&self, op: Operation, fut: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        self.dispatch(WorkingAction::Request(op)).await;
        info!("[PHASE: working] [STEP: request] {:?} started", op);

        let result = fut.await;
        match &result {
            Ok(_) => self.dispatch(WorkingAction::Success(op)).await,
            Err(e) => {
                warn!("[PHASE: working] [STEP: failure] {:?} failed: {}", op, e);
                self.dispatch(WorkingAction::Failure(op, e.to_string())).await;
            }
        }
        result
    }
}
