//! Error types for the HAL crate.

use thiserror::Error;

/// Errors that can occur while submitting or executing a pulse program.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RuntimeError {
    /// Control runtime is not available.
    #[error("Runtime not available: {0}")]
    RuntimeUnavailable(String),

    /// Program submission failed.
    #[error("Program submission failed: {0}")]
    SubmissionFailed(String),

    /// Program execution failed.
    #[error("Job failed: {0}")]
    JobFailed(String),

    /// Job was cancelled.
    #[error("Job cancelled")]
    JobCancelled,

    /// Job not found.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Results of the job were already handed out.
    #[error("Results of job {0} were already retrieved")]
    ResultsTaken(String),

    /// The program is structurally invalid (empty, dangling stream, ...).
    #[error("Invalid program: {0}")]
    InvalidProgram(String),

    /// The program plays an operation the runtime does not know.
    #[error("Unknown operation '{operation}' on element '{element}'")]
    UnknownOperation {
        /// Element the operation was played on.
        element: String,
        /// Operation name.
        operation: String,
    },

    /// Stream processing could not shape the saved values.
    #[error("Stream '{stream}': {reason}")]
    Stream {
        /// Stream name.
        stream: String,
        /// What went wrong.
        reason: String,
    },

    /// A named result is missing from the result handles.
    #[error("No result named '{0}'")]
    MissingResult(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Timeout waiting for job.
    #[error("Timeout waiting for job {0}")]
    Timeout(String),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
