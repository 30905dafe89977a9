//! Scriptable in-process fake of the assistant service, for tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;

use crate::assistant::provider::AssistantApi;
use crate::assistant::types::{
    AssistantTool, FunctionCall, Run, RunStatus, RunStep, StepDetails, StepStatus, SubmitToolOutputs,
    RequiredAction, ToolCallItem, ToolOutput,
};
use crate::error::ApiError;

/// One scripted reply to a `list_run_steps` call.
pub enum StepsReply {
    Steps(Vec<RunStep>),
    Empty,
    Fail,
}

/// Fake `AssistantApi` that replays scripted run states and records
/// everything the code under test sends.
#[derive(Default)]
pub struct FakeApi {
    /// Runs returned by successive `get_run` calls. When exhausted,
    /// `get_run` reports `in_progress` forever.
    pub runs: Mutex<VecDeque<Run>>,
    /// Replies returned by successive `list_run_steps` calls. When
    /// exhausted, the listing is empty.
    pub steps_replies: Mutex<VecDeque<StepsReply>>,
    /// The run handed out by `create_run`. Defaults to a queued `run_1`.
    pub initial_run: Mutex<Option<Run>>,

    pub threads_created: AtomicU32,
    pub messages: Mutex<Vec<(String, String)>>,
    pub run_tools: Mutex<Vec<AssistantTool>>,
    pub submissions: Mutex<Vec<Vec<ToolOutput>>>,
    pub cancels: Mutex<Vec<String>>,
    pub uploads: Mutex<Vec<String>>,
    pub fail_submissions: AtomicBool,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_run(&self, run: Run) {
        self.runs.lock().unwrap().push_back(run);
    }

    pub fn push_status(&self, status: RunStatus) {
        self.push_run(run_with(status));
    }

    pub fn push_steps(&self, reply: StepsReply) {
        self.steps_replies.lock().unwrap().push_back(reply);
    }
}

/// A `run_1` with the given status and no pending action.
pub fn run_with(status: RunStatus) -> Run {
    Run {
        id: "run_1".to_string(),
        status,
        required_action: None,
    }
}

/// A `run_1` in `requires_action` carrying the given tool calls.
pub fn run_requiring(calls: Vec<ToolCallItem>) -> Run {
    Run {
        id: "run_1".to_string(),
        status: RunStatus::RequiresAction,
        required_action: Some(RequiredAction {
            kind: "submit_tool_outputs".to_string(),
            submit_tool_outputs: SubmitToolOutputs { tool_calls: calls },
        }),
    }
}

/// A tool call invoking `name` with raw JSON arguments.
pub fn tool_call(id: &str, name: &str, arguments: &str) -> ToolCallItem {
    ToolCallItem {
        id: id.to_string(),
        function: FunctionCall {
            name: name.to_string(),
            arguments: arguments.to_string(),
        },
    }
}

/// A completed message-creation step.
pub fn completed_step(id: &str) -> RunStep {
    RunStep {
        id: id.to_string(),
        status: StepStatus::Completed,
        step_details: StepDetails {
            kind: "message_creation".to_string(),
            ..Default::default()
        },
    }
}

#[async_trait]
impl AssistantApi for FakeApi {
    async fn create_thread(&self) -> Result<String, ApiError> {
        let n = self.threads_created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("t{}", n))
    }

    async fn add_message(&self, thread_id: &str, content: &str) -> Result<String, ApiError> {
        let mut messages = self.messages.lock().unwrap();
        messages.push((thread_id.to_string(), content.to_string()));
        Ok(format!("msg_{}", messages.len()))
    }

    async fn create_run(
        &self,
        _thread_id: &str,
        _assistant_id: &str,
        tools: &[AssistantTool],
    ) -> Result<Run, ApiError> {
        self.run_tools.lock().unwrap().extend_from_slice(tools);
        Ok(self
            .initial_run
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| run_with(RunStatus::Queued)))
    }

    async fn get_run(&self, _thread_id: &str, run_id: &str) -> Result<Run, ApiError> {
        Ok(self.runs.lock().unwrap().pop_front().unwrap_or(Run {
            id: run_id.to_string(),
            status: RunStatus::InProgress,
            required_action: None,
        }))
    }

    async fn cancel_run(&self, _thread_id: &str, run_id: &str) -> Result<RunStatus, ApiError> {
        self.cancels.lock().unwrap().push(run_id.to_string());
        Ok(RunStatus::Cancelling)
    }

    async fn list_run_steps(
        &self,
        _thread_id: &str,
        _run_id: &str,
    ) -> Result<Vec<RunStep>, ApiError> {
        match self.steps_replies.lock().unwrap().pop_front() {
            Some(StepsReply::Steps(steps)) => Ok(steps),
            Some(StepsReply::Empty) | None => Ok(Vec::new()),
            Some(StepsReply::Fail) => Err(ApiError::RequestFailed {
                reason: "scripted failure".to_string(),
            }),
        }
    }

    async fn submit_tool_outputs(
        &self,
        _thread_id: &str,
        _run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<(), ApiError> {
        if self.fail_submissions.load(Ordering::SeqCst) {
            return Err(ApiError::RequestFailed {
                reason: "scripted submission failure".to_string(),
            });
        }
        self.submissions.lock().unwrap().push(outputs.to_vec());
        Ok(())
    }

    async fn upload_file(&self, filename: &str, _content: String) -> Result<String, ApiError> {
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push(filename.to_string());
        Ok(format!("file_{}", uploads.len()))
    }
}
