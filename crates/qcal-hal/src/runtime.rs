//! Control runtime trait.
//!
//! The [`ControlRuntime`] trait is the seam between experiment code and the
//! system that compiles and plays pulse programs:
//!
//! ```text
//!   submit() ──→ status() ──→ results()
//!   (async)      (async)      (async)
//!          └── wait_for_all_values() ──┘
//! ```
//!
//! | Method | Kind | Required | Returns |
//! |--------|------|----------|---------|
//! | `name()` | sync | yes | `&str` |
//! | `submit()` | async | yes | `RuntimeResult<JobId>` |
//! | `status()` | async | yes | `RuntimeResult<JobStatus>` |
//! | `results()` | async | yes | `RuntimeResult<ResultHandles>` |
//! | `cancel()` | async | yes | `RuntimeResult<()>` |
//! | `wait_for_all_values()` | async | provided | `RuntimeResult<ResultHandles>` |
//! | `execute()` | async | provided | `RuntimeResult<ResultHandles>` |

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{RuntimeError, RuntimeResult};
use crate::job::{JobId, JobStatus};
use crate::program::Program;
use crate::result::ResultHandles;

/// Polling cadence used by [`ControlRuntime::wait_for_all_values`].
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    /// Delay between two status queries.
    pub interval: Duration,
    /// Number of status queries before giving up.
    pub max_polls: u32,
}

impl Default for PollPolicy {
    /// 500ms poll, 5 minutes total.
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            max_polls: 600,
        }
    }
}

/// A system that executes pulse programs and streams back results.
///
/// # Contract
///
/// - `submit()` MUST validate the program and return a job in a non-terminal
///   or `Completed` state.
/// - `results()` MUST only succeed once status is `Completed`.
/// - Job status transitions are monotonic (see [`crate::job`]).
#[async_trait]
pub trait ControlRuntime: Send + Sync {
    /// Get the name of this runtime.
    fn name(&self) -> &str;

    /// Polling cadence for [`Self::wait_for_all_values`].
    fn poll_policy(&self) -> PollPolicy {
        PollPolicy::default()
    }

    /// Submit a program for execution.
    async fn submit(&self, program: &Program) -> RuntimeResult<JobId>;

    /// Get the status of a job.
    async fn status(&self, job_id: &JobId) -> RuntimeResult<JobStatus>;

    /// Get the results of a completed job.
    ///
    /// Runtimes may hand results out once and release them afterwards.
    async fn results(&self, job_id: &JobId) -> RuntimeResult<ResultHandles>;

    /// Cancel a job.
    async fn cancel(&self, job_id: &JobId) -> RuntimeResult<()>;

    /// Block until every stream of the job has been processed and return
    /// the results.
    async fn wait_for_all_values(&self, job_id: &JobId) -> RuntimeResult<ResultHandles> {
        use tokio::time::sleep;

        let policy = self.poll_policy();

        for _ in 0..policy.max_polls {
            let status = self.status(job_id).await?;

            match status {
                JobStatus::Completed => return self.results(job_id).await,
                JobStatus::Failed(msg) => return Err(RuntimeError::JobFailed(msg)),
                JobStatus::Cancelled => return Err(RuntimeError::JobCancelled),
                JobStatus::Queued | JobStatus::Running => {
                    debug!("Job {} still {}", job_id, status);
                    sleep(policy.interval).await;
                }
            }
        }

        Err(RuntimeError::Timeout(job_id.0.clone()))
    }

    /// Submit a program and wait for its results.
    async fn execute(&self, program: &Program) -> RuntimeResult<ResultHandles> {
        let job_id = self.submit(program).await?;
        self.wait_for_all_values(&job_id).await
    }
}
