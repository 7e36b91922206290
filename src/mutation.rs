//! Single-flight lifecycle wrapper around one asynchronous operation.
//!
//! A [`MutationController`] owns exactly one [`MutationState`] slot. Each accepted submission
//! moves the slot to `Pending` and then to exactly one terminal state, `Succeeded` or `Failed`.
//! While a submission is `Pending`, further submissions are rejected with
//! [`ClientError::Busy`] and the state is left untouched; the in-flight call is never cancelled
//! or duplicated. Validation happens in the workflow clients before a controller is involved,
//! so local input errors never pass through `Pending`.
//!
//! State changes are published through a [`tokio::sync::watch`] channel so callers can either
//! read [`MutationController::current_state`] or await transitions via
//! [`MutationController::subscribe`].

use crate::workflows::ClientError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Lifecycle of the latest submission on a controller.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationState<T> {
    /// Nothing submitted yet.
    Idle,
    /// A submission is in flight.
    Pending,
    /// The latest submission completed successfully.
    Succeeded(T),
    /// The latest submission failed.
    Failed(ClientError),
}

impl<T> Default for MutationState<T> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<T> MutationState<T> {
    /// Whether nothing has been submitted yet.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Whether a submission is in flight.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Whether the latest submission reached a terminal state.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Failed(_))
    }

    /// Success value, if the latest submission succeeded.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Succeeded(value) => Some(value),
            _ => None,
        }
    }

    /// Error, if the latest submission failed.
    pub fn error(&self) -> Option<&ClientError> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }
}

/// One asynchronous operation a controller can drive.
#[async_trait]
pub trait Mutation<I, O>: Send + Sync {
    /// Perform the operation once. Called at most once per accepted submission.
    async fn execute(&self, input: I) -> Result<O, ClientError>;
}

/// Single-flight controller holding the state of one workflow.
pub struct MutationController<I, O> {
    name: &'static str,
    operation: Arc<dyn Mutation<I, O>>,
    state: Arc<watch::Sender<MutationState<O>>>,
}

impl<I, O> MutationController<I, O>
where
    I: Send + 'static,
    O: Clone + Send + Sync + 'static,
{
    /// Wrap `operation`; `name` labels log events.
    pub fn new(name: &'static str, operation: Arc<dyn Mutation<I, O>>) -> Self {
        let (sender, _) = watch::channel(MutationState::Idle);
        Self {
            name,
            operation,
            state: Arc::new(sender),
        }
    }

    /// Snapshot of the current state.
    pub fn current_state(&self) -> MutationState<O> {
        self.state.borrow().clone()
    }

    /// Whether a submission is in flight.
    pub fn is_pending(&self) -> bool {
        self.state.borrow().is_pending()
    }

    /// Receiver notified on every state transition.
    pub fn subscribe(&self) -> watch::Receiver<MutationState<O>> {
        self.state.subscribe()
    }

    /// Start the operation in the background and return immediately.
    ///
    /// Returns [`ClientError::Busy`] without side effects when a submission is already
    /// pending. The outcome is observed through the state; the returned handle resolves once
    /// the state is terminal. Must be called from within a Tokio runtime.
    pub fn submit(&self, input: I) -> Result<JoinHandle<()>, ClientError> {
        let guard = self.begin()?;
        let operation = Arc::clone(&self.operation);
        Ok(tokio::spawn(async move {
            let result = operation.execute(input).await;
            guard.finish(result);
        }))
    }

    /// Run the operation to completion, updating the state along the way.
    ///
    /// Same single-flight rule as [`Self::submit`]. If the returned future is dropped before
    /// completing, the state becomes `Failed` rather than staying `Pending`.
    pub async fn run(&self, input: I) -> Result<O, ClientError> {
        let guard = self.begin()?;
        let result = self.operation.execute(input).await;
        guard.finish(result.clone());
        result
    }

    fn begin(&self) -> Result<PendingGuard<O>, ClientError> {
        let mut accepted = false;
        self.state.send_if_modified(|state| {
            if state.is_pending() {
                return false;
            }
            *state = MutationState::Pending;
            accepted = true;
            true
        });

        if !accepted {
            tracing::warn!(
                mutation = self.name,
                "Rejected submission while another request is in flight"
            );
            return Err(ClientError::Busy);
        }

        tracing::debug!(mutation = self.name, "Mutation pending");
        Ok(PendingGuard {
            name: self.name,
            state: Some(Arc::clone(&self.state)),
        })
    }
}

/// Ensures an accepted submission always leaves `Pending`.
struct PendingGuard<O> {
    name: &'static str,
    state: Option<Arc<watch::Sender<MutationState<O>>>>,
}

impl<O> PendingGuard<O> {
    fn finish(mut self, result: Result<O, ClientError>) {
        let Some(state) = self.state.take() else {
            return;
        };
        match result {
            Ok(value) => {
                tracing::debug!(mutation = self.name, "Mutation succeeded");
                state.send_replace(MutationState::Succeeded(value));
            }
            Err(error) => {
                tracing::warn!(mutation = self.name, error = %error, "Mutation failed");
                state.send_replace(MutationState::Failed(error));
            }
        }
    }
}

impl<O> Drop for PendingGuard<O> {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            tracing::warn!(
                mutation = self.name,
                "Mutation dropped before completing"
            );
            state.send_replace(MutationState::Failed(ClientError::RequestFailed {
                status: None,
                message: "Request was interrupted before completing".into(),
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Doubles its input; fails on zero. Optionally waits on a gate before answering.
    #[derive(Default)]
    struct Doubler {
        calls: AtomicUsize,
        gate: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl Mutation<u32, u32> for Doubler {
        async fn execute(&self, input: u32) -> Result<u32, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if input == 0 {
                Err(ClientError::RequestFailed {
                    status: Some(500),
                    message: "zero".into(),
                })
            } else {
                Ok(input * 2)
            }
        }
    }

    fn plain() -> Arc<dyn Mutation<u32, u32>> {
        Arc::new(Doubler::default())
    }

    fn gated() -> (Arc<Doubler>, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let op = Arc::new(Doubler {
            calls: AtomicUsize::new(0),
            gate: Some(Arc::clone(&gate)),
        });
        (op, gate)
    }

    #[tokio::test]
    async fn starts_idle() {
        let controller = MutationController::new("test", plain());
        assert!(controller.current_state().is_idle());
        assert!(!controller.is_pending());
    }

    #[tokio::test]
    async fn run_reaches_succeeded() {
        let controller = MutationController::new("test", plain());
        assert_eq!(controller.run(21).await, Ok(42));
        assert_eq!(controller.current_state(), MutationState::Succeeded(42));
    }

    #[tokio::test]
    async fn failed_state_never_carries_a_value() {
        let controller = MutationController::new("test", plain());
        let error = controller.run(0).await.unwrap_err();
        let state = controller.current_state();
        assert_eq!(state.error(), Some(&error));
        assert_eq!(state.value(), None);

        controller.run(1).await.expect("second run");
        let state = controller.current_state();
        assert_eq!(state.value(), Some(&2));
        assert_eq!(state.error(), None);
    }

    #[tokio::test]
    async fn second_submit_while_pending_is_rejected() {
        let (op, gate) = gated();
        let controller = MutationController::new("test", op.clone() as Arc<dyn Mutation<u32, u32>>);

        let handle = controller.submit(5).expect("first submit accepted");
        assert!(controller.is_pending());

        assert_eq!(controller.submit(7).unwrap_err(), ClientError::Busy);
        assert_eq!(controller.run(9).await.unwrap_err(), ClientError::Busy);
        assert!(controller.is_pending());

        gate.notify_one();
        handle.await.expect("task");

        assert_eq!(controller.current_state(), MutationState::Succeeded(10));
        assert_eq!(op.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn resubmission_discards_previous_outcome() {
        let (op, gate) = gated();
        let controller = MutationController::new("test", op as Arc<dyn Mutation<u32, u32>>);

        gate.notify_one();
        controller.run(0).await.unwrap_err();
        assert!(controller.current_state().error().is_some());

        let handle = controller.submit(3).expect("accepted after failure");
        assert_eq!(controller.current_state(), MutationState::Pending);

        gate.notify_one();
        handle.await.expect("task");
        assert_eq!(controller.current_state(), MutationState::Succeeded(6));
    }

    #[tokio::test]
    async fn subscribers_observe_terminal_state() {
        let (op, gate) = gated();
        let controller = MutationController::new("test", op as Arc<dyn Mutation<u32, u32>>);
        let mut receiver = controller.subscribe();

        controller.submit(4).expect("accepted");
        gate.notify_one();

        let settled = receiver
            .wait_for(MutationState::is_settled)
            .await
            .expect("sender alive")
            .clone();
        assert_eq!(settled, MutationState::Succeeded(8));
    }

    #[tokio::test]
    async fn dropped_run_settles_as_failed() {
        let (op, _gate) = gated();
        let controller = MutationController::new("test", op as Arc<dyn Mutation<u32, u32>>);

        let outcome = tokio::time::timeout(Duration::from_millis(20), controller.run(1)).await;
        assert!(outcome.is_err(), "gate never opens, so the run times out");

        let state = controller.current_state();
        assert_eq!(
            state.error().map(ClientError::kind),
            Some(crate::workflows::ErrorKind::RequestFailed)
        );
        controller.submit(1).expect("controller usable again");
    }
}
