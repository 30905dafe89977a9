//! The seam between the orchestration logic and the remote service.
//!
//! Everything above this trait is testable against an in-process fake;
//! `OpenAiAssistantClient` is the production implementation.

use async_trait::async_trait;

use crate::assistant::types::{AssistantTool, Run, RunStatus, RunStep, ToolOutput};
use crate::error::ApiError;

/// Client surface of the remote assistant service.
#[async_trait]
pub trait AssistantApi: Send + Sync {
    /// Create a conversation thread, returning its id.
    async fn create_thread(&self) -> Result<String, ApiError>;

    /// Append a user message to a thread, returning the message id.
    async fn add_message(&self, thread_id: &str, content: &str) -> Result<String, ApiError>;

    /// Start a run on a thread with the given assistant and tool set.
    async fn create_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
        tools: &[AssistantTool],
    ) -> Result<Run, ApiError>;

    /// Fetch the current state of a run.
    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ApiError>;

    /// Request cancellation of a run, returning its reported status.
    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<RunStatus, ApiError>;

    /// Fetch the ordered result steps of a run.
    async fn list_run_steps(&self, thread_id: &str, run_id: &str)
    -> Result<Vec<RunStep>, ApiError>;

    /// Submit one batch of tool outputs for a run waiting on them.
    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<(), ApiError>;

    /// Upload a source file for retrieval-backed context, returning the
    /// file id. Only the upload-all policy uses this.
    async fn upload_file(&self, filename: &str, content: String) -> Result<String, ApiError>;
}
