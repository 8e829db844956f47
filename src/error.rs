use thiserror::Error;

/// Result type for pipeline lifetime operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors raised by the pipeline machinery itself.
///
/// User errors never appear here: transform errors are absorbed by the
/// stage's error policy and consumer errors are returned by `consume`
/// unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Stage workers were still running when the wait deadline passed
    #[error("timed out waiting for {active} stage worker(s) to exit")]
    QuiescenceTimeout { active: usize },
}

/// Why a guarded enqueue did not deliver its value
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EmitError {
    #[error("cancellation signalled before the value was enqueued")]
    Cancelled,

    #[error("downstream handle was dropped")]
    Disconnected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_names_worker_count() {
        let err = PipelineError::QuiescenceTimeout { active: 3 };
        assert_eq!(
            err.to_string(),
            "timed out waiting for 3 stage worker(s) to exit"
        );
    }
}
