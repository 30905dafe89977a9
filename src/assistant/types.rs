//! Wire model for the remote assistant service.
//!
//! Field names follow the assistants-style JSON surface; everything the
//! orchestrator does not interpret stays opaque (`serde_json::Value`).

use serde::{Deserialize, Serialize};

/// Lifecycle status of a run.
///
/// Anything the service invents later deserializes as `Unknown`, which the
/// poller treats as still pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    Cancelling,
    Completed,
    Cancelled,
    Failed,
    RequiresAction,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Whether the poller should keep waiting on this status.
    pub fn is_pending(self) -> bool {
        matches!(
            self,
            RunStatus::Queued | RunStatus::InProgress | RunStatus::Cancelling | RunStatus::Unknown
        )
    }

    /// Whether the run can no longer change state.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Cancelled | RunStatus::Failed
        )
    }
}

/// One bounded execution of the assistant against a thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    pub status: RunStatus,
    /// Only meaningful while `status == RequiresAction`; cleared by the
    /// dispatcher once serviced so stale tool calls are never re-serviced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_action: Option<RequiredAction>,
}

impl Run {
    /// The pending tool calls, if the run is waiting on any.
    pub fn pending_tool_calls(&self) -> &[ToolCallItem] {
        self.required_action
            .as_ref()
            .map(|a| a.submit_tool_outputs.tool_calls.as_slice())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequiredAction {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub submit_tool_outputs: SubmitToolOutputs,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitToolOutputs {
    pub tool_calls: Vec<ToolCallItem>,
}

/// A structured request emitted by the remote assistant mid-run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallItem {
    pub id: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// Raw JSON arguments string, decoded by the servicer.
    pub arguments: String,
}

/// Locally produced answer to one tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub output: String,
}

/// Status of an individual run step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    InProgress,
    Completed,
    Cancelled,
    Failed,
    Expired,
    #[serde(other)]
    Unknown,
}

/// One ordered result step of a finished (or finishing) run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStep {
    pub id: String,
    pub status: StepStatus,
    #[serde(default)]
    pub step_details: StepDetails,
}

/// Step payload. The orchestrator hands this through to the host verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepDetails {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_creation: Option<MessageCreation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageCreation {
    pub message_id: String,
}

/// Capability attached to a run, decided by the code-context policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssistantTool {
    Function { function: ToolSchema },
    FileSearch,
}

impl AssistantTool {
    /// Declare a function tool from its schema.
    pub fn function(schema: ToolSchema) -> Self {
        AssistantTool::Function { function: schema }
    }
}

/// Definition of a function tool's parameters using JSON Schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl ToolSchema {
    /// Create a new tool schema with an empty parameter object.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        }
    }

    /// Set the parameters schema.
    pub fn with_parameters(mut self, parameters: serde_json::Value) -> Self {
        self.parameters = parameters;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_status_deserializes_and_stays_pending() {
        let status: RunStatus = serde_json::from_str("\"expired_v2\"").unwrap();
        assert_eq!(status, RunStatus::Unknown);
        assert!(status.is_pending());
        assert!(!status.is_terminal());
    }

    #[test]
    fn requires_action_is_neither_pending_nor_terminal() {
        assert!(!RunStatus::RequiresAction.is_pending());
        assert!(!RunStatus::RequiresAction.is_terminal());
    }

    #[test]
    fn run_deserializes_with_required_action() {
        let run: Run = serde_json::from_value(serde_json::json!({
            "id": "run_1",
            "status": "requires_action",
            "required_action": {
                "type": "submit_tool_outputs",
                "submit_tool_outputs": {
                    "tool_calls": [{
                        "id": "call_1",
                        "function": {"name": "get_context", "arguments": "{}"}
                    }]
                }
            }
        }))
        .unwrap();
        assert_eq!(run.status, RunStatus::RequiresAction);
        assert_eq!(run.pending_tool_calls().len(), 1);
        assert_eq!(run.pending_tool_calls()[0].id, "call_1");
    }

    #[test]
    fn file_search_tool_serializes_with_type_tag() {
        let json = serde_json::to_value(AssistantTool::FileSearch).unwrap();
        assert_eq!(json, serde_json::json!({"type": "file_search"}));
    }

    #[test]
    fn function_tool_carries_schema() {
        let tool = AssistantTool::function(ToolSchema::new("get_context", "Fetch a definition"));
        let json = serde_json::to_value(&tool).unwrap();
        assert_eq!(json["type"], "function");
        assert_eq!(json["function"]["name"], "get_context");
    }
}
