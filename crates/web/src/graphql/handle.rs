//! Observable query executions.
//!
//! A [`QueryHandle`] publishes the lifecycle of one execution over a
//! `tokio::sync::watch` channel. Transitions are strictly ordered: a handle
//! starts in `Loading` (or directly in `Success` on a cache hit) and then
//! publishes exactly one terminal state.

use std::future::Future;
use std::sync::Arc;

use futures::Stream;
use tokio::sync::watch;
use tokio::task::AbortHandle;

use super::ClientError;

/// Lifecycle state of one query execution.
#[derive(Debug, Default)]
pub enum QueryState<T> {
    /// Not yet issued.
    #[default]
    Idle,
    /// Request in flight.
    Loading,
    /// Response received and decoded.
    Success(Arc<T>),
    /// Transport, protocol or application failure.
    Failed(Arc<ClientError>),
}

// Manual impl so `T` itself need not be `Clone`.
impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Idle => Self::Idle,
            Self::Loading => Self::Loading,
            Self::Success(data) => Self::Success(Arc::clone(data)),
            Self::Failed(error) => Self::Failed(Arc::clone(error)),
        }
    }
}

impl<T> QueryState<T> {
    /// Whether the request is in flight.
    #[must_use]
    pub const fn loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// The failure, if the execution failed.
    #[must_use]
    pub fn error(&self) -> Option<&ClientError> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// The decoded payload, if the execution succeeded.
    #[must_use]
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success(data) => Some(data),
            _ => None,
        }
    }

    /// Whether this is `Success` or `Failed`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Success(_) | Self::Failed(_))
    }

    /// Short lowercase name of the state.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Success(_) => "success",
            Self::Failed(_) => "failed",
        }
    }

    fn from_result(result: Result<T, ClientError>) -> Self {
        match result {
            Ok(data) => Self::Success(Arc::new(data)),
            Err(error) => Self::Failed(Arc::new(error)),
        }
    }
}

/// Aborts the request task when the last owner goes away.
#[derive(Debug)]
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Live view of one query execution.
///
/// Dropping the handle (or the stream returned by [`subscribe`]) before the
/// response arrives cancels the request; the late response is discarded.
///
/// [`subscribe`]: QueryHandle::subscribe
#[derive(Debug)]
pub struct QueryHandle<T> {
    initial: QueryState<T>,
    receiver: watch::Receiver<QueryState<T>>,
    _task: Option<AbortOnDrop>,
}

impl<T> QueryHandle<T>
where
    T: Send + Sync + 'static,
{
    /// A handle whose execution already finished (e.g., a cache hit).
    pub(crate) fn ready(result: Result<T, ClientError>) -> Self {
        let state = QueryState::from_result(result);
        let (_sender, receiver) = watch::channel(state.clone());

        Self {
            initial: state,
            receiver,
            _task: None,
        }
    }

    /// A handle in `Loading` that settles when `request` completes.
    ///
    /// Must be called from within a Tokio runtime.
    pub(crate) fn spawn<F>(request: F) -> Self
    where
        F: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        let (sender, receiver) = watch::channel(QueryState::Loading);

        let task = tokio::spawn(async move {
            let state = QueryState::from_result(request.await);
            // No receivers left means the consumer unsubscribed; drop the result.
            let _ = sender.send(state);
        });

        Self {
            initial: QueryState::Loading,
            receiver,
            _task: Some(AbortOnDrop(task.abort_handle())),
        }
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> QueryState<T> {
        self.receiver.borrow().clone()
    }

    /// Wait for the terminal state.
    ///
    /// Returns `Failed(Interrupted)` if the request task ended without
    /// publishing a result.
    pub async fn settled(mut self) -> QueryState<T> {
        loop {
            let current = self.receiver.borrow_and_update().clone();
            if current.is_terminal() {
                return current;
            }
            if self.receiver.changed().await.is_err() {
                let last = self.receiver.borrow().clone();
                return if last.is_terminal() {
                    last
                } else {
                    QueryState::Failed(Arc::new(ClientError::Interrupted))
                };
            }
        }
    }

    /// Stream every state transition, starting with the state the handle
    /// was created in and ending after the terminal state.
    ///
    /// Like [`settled`](QueryHandle::settled), a request task that ends
    /// without publishing a result is reported as `Failed(Interrupted)`.
    ///
    /// Dropping the stream unsubscribes and cancels an in-flight request.
    pub fn subscribe(self) -> impl Stream<Item = QueryState<T>> + Send + 'static {
        let Self {
            initial,
            mut receiver,
            _task: task,
        } = self;

        async_stream::stream! {
            // Keep the request alive for as long as someone is listening.
            let _task = task;

            let done = initial.is_terminal();
            yield initial;

            if !done {
                let next = if receiver.changed().await.is_ok() {
                    receiver.borrow_and_update().clone()
                } else {
                    let last = receiver.borrow().clone();
                    if last.is_terminal() {
                        last
                    } else {
                        QueryState::Failed(Arc::new(ClientError::Interrupted))
                    }
                };
                yield next;
            }
        }
    }

    /// Stop observing the execution, cancelling it if still in flight.
    pub fn unsubscribe(self) {
        drop(self);
    }
}
