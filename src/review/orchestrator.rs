//! Top-level review driver.
//!
//! One orchestration runs strictly sequentially on its worker: thread
//! resolution, run creation, polling, bounded action servicing, then step
//! retrieval. Only transport failures and poll timeouts surface; everything
//! context-related degrades inside the run.

use std::sync::Arc;
use std::time::Duration;

use crate::assistant::dispatcher::ActionOutcome;
use crate::assistant::poller::RunPoller;
use crate::assistant::provider::AssistantApi;
use crate::assistant::types::{RunStep, StepStatus};
use crate::config::ReviewerConfig;
use crate::context::policy::CodeContextPolicy;
use crate::error::{ApiError, ReviewError};
use crate::review::threads::ThreadStore;

/// What kind of change event triggered the review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChangeKind {
    /// A new patch set was pushed.
    #[default]
    PatchSet,
    /// Someone replied to one of our review comments.
    CommentReply,
}

/// Per-run input, passed explicitly down the call chain.
#[derive(Debug, Clone)]
pub struct ReviewRequest {
    /// Fully assembled request text (diff, instructions, prior comments).
    pub text: String,
    /// Drop the subject's persisted thread and start over. Ignored for
    /// comment replies, which always continue the existing conversation.
    pub fresh_thread: bool,
    pub change_kind: ChangeKind,
}

impl ReviewRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fresh_thread: false,
            change_kind: ChangeKind::PatchSet,
        }
    }

    /// Force a fresh conversation thread.
    pub fn fresh(mut self) -> Self {
        self.fresh_thread = true;
        self
    }

    /// Mark this as a comment-reply event.
    pub fn as_reply(mut self) -> Self {
        self.change_kind = ChangeKind::CommentReply;
        self
    }
}

/// Drives a review run to a usable result.
pub struct ReviewOrchestrator {
    api: Arc<dyn AssistantApi>,
    policy: Arc<dyn CodeContextPolicy>,
    threads: Arc<dyn ThreadStore>,
    assistant_id: String,
    poller: RunPoller,
    step_retries: u32,
    step_retry_interval: Duration,
}

impl ReviewOrchestrator {
    pub fn new(
        api: Arc<dyn AssistantApi>,
        policy: Arc<dyn CodeContextPolicy>,
        threads: Arc<dyn ThreadStore>,
        config: &ReviewerConfig,
    ) -> Self {
        Self {
            api,
            policy,
            threads,
            assistant_id: config.assistant.assistant_id.clone(),
            poller: RunPoller::new(config.polling.clone()),
            step_retries: config.step_retries,
            step_retry_interval: config.step_retry_interval,
        }
    }

    /// Run one review to completion and return the run's result steps.
    pub async fn resolve_review(
        &self,
        subject: &str,
        request: &ReviewRequest,
    ) -> Result<Vec<RunStep>, ReviewError> {
        self.policy.prepare(subject).await?;

        let thread_id = self.thread_for(subject, request).await?;
        self.api
            .add_message(&thread_id, &request.text)
            .await
            .map_err(ReviewError::from)?;

        let tools = self.policy.advertised_tools();
        let mut run = self
            .api
            .create_run(&thread_id, &self.assistant_id, &tools)
            .await
            .map_err(ReviewError::from)?;
        tracing::info!(
            subject,
            thread_id = %thread_id,
            run_id = %run.id,
            mode = ?self.policy.mode(),
            "review run started"
        );

        let mut dispatcher = self.policy.new_dispatcher();
        loop {
            self.poller
                .wait(self.api.as_ref(), &thread_id, &mut run)
                .await
                .map_err(ReviewError::from)?;

            if !self.policy.run_action_required(&run) {
                break;
            }
            let Some(dispatcher) = dispatcher.as_mut() else {
                break;
            };
            match dispatcher
                .dispatch(self.api.as_ref(), &thread_id, &mut run)
                .await
                .map_err(ReviewError::from)?
            {
                ActionOutcome::Serviced => continue,
                ActionOutcome::BudgetExhausted => break,
            }
        }
        tracing::info!(run_id = %run.id, status = ?run.status, "run polling finished");

        self.retrieve_steps(&thread_id, &run.id).await
    }

    /// Best-effort cancellation. A run whose first result step already
    /// completed is left alone; failures are logged, never raised.
    pub async fn cancel_run(&self, thread_id: &str, run_id: &str) {
        match self.api.list_run_steps(thread_id, run_id).await {
            Ok(steps) => {
                if steps
                    .first()
                    .is_some_and(|step| step.status == StepStatus::Completed)
                {
                    tracing::debug!(run_id, "first result step already completed, not cancelling");
                    return;
                }
            }
            Err(e) => {
                tracing::warn!(run_id, error = %e, "could not inspect run steps before cancel");
            }
        }
        match self.api.cancel_run(thread_id, run_id).await {
            Ok(status) => tracing::info!(run_id, status = ?status, "run cancellation requested"),
            Err(e) => tracing::warn!(run_id, error = %e, "run cancellation failed"),
        }
    }

    async fn thread_for(
        &self,
        subject: &str,
        request: &ReviewRequest,
    ) -> Result<String, ReviewError> {
        let fresh = request.fresh_thread && request.change_kind != ChangeKind::CommentReply;
        if !fresh {
            if let Some(thread_id) = self.threads.get(subject) {
                tracing::debug!(subject, thread_id = %thread_id, "reusing persisted thread");
                return Ok(thread_id);
            }
        }

        let thread_id = self.api.create_thread().await.map_err(ReviewError::from)?;
        self.threads.put(subject, &thread_id);
        tracing::info!(subject, thread_id = %thread_id, fresh, "created conversation thread");
        Ok(thread_id)
    }

    async fn retrieve_steps(
        &self,
        thread_id: &str,
        run_id: &str,
    ) -> Result<Vec<RunStep>, ReviewError> {
        for attempt in 1..=self.step_retries {
            match self.api.list_run_steps(thread_id, run_id).await {
                Ok(steps) if !steps.is_empty() => {
                    tracing::debug!(run_id, steps = steps.len(), attempt, "run steps retrieved");
                    return Ok(steps);
                }
                Ok(_) => {
                    tracing::debug!(run_id, attempt, "run has no steps yet");
                }
                Err(e) => {
                    tracing::warn!(run_id, attempt, error = %e, "step retrieval failed");
                }
            }
            if attempt < self.step_retries {
                tokio::time::sleep(self.step_retry_interval).await;
            }
        }
        Err(ReviewError::ConnectionFailed(ApiError::RequestFailed {
            reason: format!("no run steps after {} attempts", self.step_retries),
        }))
    }
}
