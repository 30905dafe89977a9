//! Bounded servicing of `requires_action` run states.

use crate::assistant::provider::AssistantApi;
use crate::assistant::types::{Run, RunStatus};
use crate::context::servicer::ToolCallServicer;
use crate::error::ApiError;

/// What a dispatch attempt decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Tool outputs were submitted; the run should be polled again.
    Serviced,
    /// The retry budget is spent; stop servicing and read whatever result
    /// steps exist (best-effort, known degraded outcome).
    BudgetExhausted,
}

/// Services a run's pending tool calls, at most `max_retries` times per
/// orchestration attempt.
pub struct ActionDispatcher {
    servicer: ToolCallServicer,
    max_retries: u32,
    attempts: u32,
}

impl ActionDispatcher {
    pub fn new(servicer: ToolCallServicer, max_retries: u32) -> Self {
        Self {
            servicer,
            max_retries,
            attempts: 0,
        }
    }

    /// Handle one `requires_action` observation.
    ///
    /// On servicing, the run's status is reset to `Unknown` and its
    /// required action cleared, so the next polling session treats it as
    /// pending again and stale tool calls are never re-serviced.
    pub async fn dispatch(
        &mut self,
        api: &dyn AssistantApi,
        thread_id: &str,
        run: &mut Run,
    ) -> Result<ActionOutcome, ApiError> {
        self.attempts += 1;
        if self.attempts > self.max_retries {
            tracing::warn!(
                run_id = %run.id,
                attempts = self.attempts,
                max_retries = self.max_retries,
                "action-required budget spent, passing the run through unserviced"
            );
            return Ok(ActionOutcome::BudgetExhausted);
        }

        let calls = run
            .required_action
            .take()
            .map(|action| action.submit_tool_outputs.tool_calls)
            .unwrap_or_default();
        tracing::info!(
            run_id = %run.id,
            tool_calls = calls.len(),
            attempt = self.attempts,
            "servicing run tool calls"
        );

        let outputs = self.servicer.service(&calls);
        api.submit_tool_outputs(thread_id, &run.id, &outputs).await?;
        run.status = RunStatus::Unknown;
        Ok(ActionOutcome::Serviced)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::assistant::testing::{FakeApi, run_requiring, tool_call};
    use crate::source::FsSourceTree;

    fn dispatcher(max_retries: u32) -> ActionDispatcher {
        let dir = std::env::temp_dir();
        let servicer = ToolCallServicer::new(Arc::new(FsSourceTree::new(dir)));
        ActionDispatcher::new(servicer, max_retries)
    }

    fn action_run() -> Run {
        run_requiring(vec![tool_call("c1", "get_context", "{}")])
    }

    #[tokio::test]
    async fn services_within_budget_and_resets_status() {
        let api = FakeApi::new();
        let mut run = action_run();
        let outcome = dispatcher(1).dispatch(&api, "t1", &mut run).await.unwrap();

        assert_eq!(outcome, ActionOutcome::Serviced);
        assert_eq!(run.status, RunStatus::Unknown);
        assert!(run.required_action.is_none());

        let submissions = api.submissions.lock().unwrap();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0][0].tool_call_id, "c1");
    }

    #[tokio::test]
    async fn second_and_third_observations_are_passed_through() {
        let api = FakeApi::new();
        let mut dispatcher = dispatcher(1);

        let mut run = action_run();
        assert_eq!(
            dispatcher.dispatch(&api, "t1", &mut run).await.unwrap(),
            ActionOutcome::Serviced
        );

        for _ in 0..2 {
            let mut run = action_run();
            assert_eq!(
                dispatcher.dispatch(&api, "t1", &mut run).await.unwrap(),
                ActionOutcome::BudgetExhausted
            );
            // Still requires_action: nothing was serviced or cleared.
            assert_eq!(run.status, RunStatus::RequiresAction);
            assert!(run.required_action.is_some());
        }

        assert_eq!(api.submissions.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn submission_failure_propagates() {
        let api = FakeApi::new();
        api.fail_submissions.store(true, Ordering::SeqCst);
        let mut run = action_run();
        let err = dispatcher(1).dispatch(&api, "t1", &mut run).await.unwrap_err();
        assert!(matches!(err, ApiError::RequestFailed { .. }));
    }
}
