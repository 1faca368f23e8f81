//! Task sets and error streams.
//!
//! A task reports genuine faults through an [`ErrorSender`] and signals
//! completion by returning, which drops its sender. All tasks of one set share
//! a single channel, so the set's [`ErrorStream`] closes exactly when every
//! task has returned.
//!
//! ```text
//! run_set(parent, [t1, t2, t3])
//!     scope = parent.child_token()
//!     t1 ─┐
//!     t2 ─┼── mpsc ──► ErrorStream   (None once all three returned)
//!     t3 ─┘
//! first task to return cancels `scope` → the others wind down
//! ```

use std::future::Future;

use futures_util::future::BoxFuture;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const ERROR_BUFFER: usize = 16;

/// A genuine fault reported by a task.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{task}: {message}")]
pub struct TaskError {
    pub task: String,
    pub message: String,
}

impl TaskError {
    pub fn new(task: impl Into<String>, message: impl ToString) -> Self {
        Self {
            task: task.into(),
            message: message.to_string(),
        }
    }
}

/// Receiving end of a task set. `None` from `recv` is the clean-completion marker.
pub type ErrorStream = mpsc::Receiver<TaskError>;

/// Sending end handed to each task.
pub type ErrorSender = mpsc::Sender<TaskError>;

/// A unit of work run inside a task set.
pub trait Task: Send + 'static {
    /// Name used in logs.
    fn name(&self) -> String;

    /// Run until done or until `scope` is cancelled.
    fn run(self: Box<Self>, scope: CancellationToken, errors: ErrorSender) -> BoxFuture<'static, ()>;
}

/// Adapts an async closure into a [`Task`].
pub struct TaskFn<F> {
    name: String,
    f: F,
}

impl<F> TaskFn<F> {
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self { name: name.into(), f }
    }

    pub fn boxed<Fut>(name: impl Into<String>, f: F) -> Box<dyn Task>
    where
        F: FnOnce(CancellationToken, ErrorSender) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Box::new(Self::new(name, f))
    }
}

impl<F, Fut> Task for TaskFn<F>
where
    F: FnOnce(CancellationToken, ErrorSender) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn name(&self) -> String {
        self.name.clone()
    }

    fn run(self: Box<Self>, scope: CancellationToken, errors: ErrorSender) -> BoxFuture<'static, ()> {
        Box::pin((self.f)(scope, errors))
    }
}

/// Run `tasks` concurrently and fan their errors into one stream.
///
/// The set lives in a child scope of `parent`: cancelling `parent` stops every
/// task, and the first task to return cancels its siblings.
pub fn run_set(parent: &CancellationToken, tasks: Vec<Box<dyn Task>>) -> ErrorStream {
    let scope = parent.child_token();
    let (tx, rx) = mpsc::channel(ERROR_BUFFER);

    for task in tasks {
        let name = task.name();
        let scope = scope.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let _ends_set = scope.clone().drop_guard();
            task.run(scope, tx).await;
            tracing::trace!(task = %name, "Task finished");
        });
    }

    rx
}

/// Process-wide collector of forwarded errors.
///
/// Every error is logged as it arrives; [`ErrorSink::close`] waits for all
/// senders to go away and returns what was collected.
pub struct ErrorSink {
    tx: ErrorSender,
    drain: JoinHandle<Vec<TaskError>>,
}

impl ErrorSink {
    pub fn spawn() -> Self {
        let (tx, mut rx) = mpsc::channel::<TaskError>(ERROR_BUFFER);
        let drain = tokio::spawn(async move {
            let mut seen = Vec::new();
            while let Some(err) = rx.recv().await {
                tracing::error!(task = %err.task, error = %err.message, "Task reported an error");
                seen.push(err);
            }
            seen
        });
        Self { tx, drain }
    }

    pub fn sender(&self) -> ErrorSender {
        self.tx.clone()
    }

    /// Drop the sink's own sender and wait for every other sender to close.
    pub async fn close(self) -> Vec<TaskError> {
        drop(self.tx);
        self.drain.await.unwrap_or_default()
    }
}

/// Forward one error, tolerating a sink that is already gone.
pub async fn forward(sink: &ErrorSender, err: TaskError) {
    if let Err(mpsc::error::SendError(err)) = sink.send(err).await {
        tracing::warn!(task = %err.task, error = %err.message, "Error sink closed, dropping error");
    }
}
