//! Failure Logger
//!
//! Sink for failures that must never reach the caller (retention passes).

use std::fmt::Debug;

/// Receives best-effort failures
pub trait FailureLogger: Send + Sync + Debug {
    fn error(&self, message: &str);
}

/// Default logger, forwards to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl FailureLogger for TracingLogger {
    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }
}
