//! Per-run execution context: cancellation signal and progress sink.
//!
//! One `ExecutionContext` is threaded through an entire run. The engine
//! checks the cancellation token at the top of each per-node iteration;
//! the node lifecycle checks it again before computing; long-running
//! node computations should check it themselves.

use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use crate::error::{GraphError, Result};

/// Trait for receiving human-readable progress messages.
///
/// Progress is advisory: messages may be dropped or ignored without
/// affecting correctness.
pub trait ProgressSink: Send + Sync {
    /// Report a status message
    fn report(&self, message: &str);
}

/// A no-op progress sink that discards all messages
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn report(&self, _message: &str) {}
}

/// A vector-based progress sink that collects messages.
///
/// Useful for testing to verify progress was reported correctly.
pub struct VecProgressSink {
    messages: Mutex<Vec<String>>,
}

impl VecProgressSink {
    pub fn new() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
        }
    }

    /// Get all collected messages
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    /// Clear all collected messages
    pub fn clear(&self) {
        self.messages.lock().unwrap().clear();
    }
}

impl Default for VecProgressSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for VecProgressSink {
    fn report(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

/// A progress sink that routes messages to the `log` crate
pub struct LogProgressSink;

impl ProgressSink for LogProgressSink {
    fn report(&self, message: &str) {
        log::info!("{}", message);
    }
}

/// The per-run bundle of cancellation signal and progress sink
#[derive(Clone)]
pub struct ExecutionContext {
    execution_id: String,
    cancellation: CancellationToken,
    progress: Arc<dyn ProgressSink>,
}

impl ExecutionContext {
    /// Create a context with a fresh execution id, a fresh cancellation
    /// token, and no progress reporting.
    pub fn new() -> Self {
        Self {
            execution_id: format!("exec-{}", uuid::Uuid::new_v4()),
            cancellation: CancellationToken::new(),
            progress: Arc::new(NullProgressSink),
        }
    }

    /// Use the given cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Use the given progress sink
    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = sink;
        self
    }

    /// The unique id of this run
    pub fn execution_id(&self) -> &str {
        &self.execution_id
    }

    /// The cancellation token threaded through this run
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Error early when cancellation has been requested
    pub fn check_cancelled(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(GraphError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Report an advisory progress message
    pub fn report_progress(&self, message: impl AsRef<str>) {
        self.progress.report(message.as_ref());
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}
