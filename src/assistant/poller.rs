//! Poll a run until it leaves the pending statuses or the budget expires.

use std::time::Instant;

use crate::assistant::provider::AssistantApi;
use crate::assistant::types::Run;
use crate::config::PollingConfig;
use crate::error::ApiError;

/// Drives one polling session over a run.
///
/// The session ends as soon as the status is non-pending, including
/// `RequiresAction`, which the caller must service before the run can truly
/// finish. Elapsed time is wall-clock, measured from the first poll request;
/// reaching the budget exactly counts as a timeout.
#[derive(Debug, Clone)]
pub struct RunPoller {
    config: PollingConfig,
}

impl RunPoller {
    pub fn new(config: PollingConfig) -> Self {
        Self { config }
    }

    /// Wait until `run` reaches a non-pending status, updating it in place.
    pub async fn wait(
        &self,
        api: &dyn AssistantApi,
        thread_id: &str,
        run: &mut Run,
    ) -> Result<(), ApiError> {
        let started = Instant::now();
        let mut cycles: u32 = 0;

        while run.status.is_pending() {
            let waited = started.elapsed();
            if waited >= self.config.timeout {
                tracing::warn!(
                    run_id = %run.id,
                    waited_ms = waited.as_millis() as u64,
                    "run polling exceeded its wall-clock budget"
                );
                return Err(ApiError::PollTimeout {
                    waited,
                    budget: self.config.timeout,
                });
            }

            tokio::time::sleep(self.config.interval).await;
            *run = api.get_run(thread_id, &run.id).await?;
            cycles += 1;
            tracing::debug!(
                run_id = %run.id,
                status = ?run.status,
                cycles,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "polled run status"
            );
        }

        Ok(())
    }
}
