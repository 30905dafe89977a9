//! Code-context policy: whether and how the assistant gets source access.
//!
//! Three strategies, selected once per deployment:
//! - **NoContext**: the assistant reviews the diff blind.
//! - **OnDemand**: the assistant may call `get_context` mid-run and the
//!   dispatcher answers from the source tree.
//! - **UploadAll**: the whole tree is uploaded up front and the assistant
//!   searches it; nothing is serviced mid-run.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::assistant::dispatcher::ActionDispatcher;
use crate::assistant::provider::AssistantApi;
use crate::assistant::types::{AssistantTool, Run, RunStatus, ToolSchema};
use crate::context::servicer::{CONTEXT_FUNCTION, ToolCallServicer};
use crate::error::ReviewError;
use crate::source::SourceTree;

/// Which policy a deployment runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeContextMode {
    None,
    OnDemand,
    UploadAll,
}

impl FromStr for CodeContextMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "none" | "off" => Ok(CodeContextMode::None),
            "on_demand" | "ondemand" => Ok(CodeContextMode::OnDemand),
            "upload_all" | "uploadall" => Ok(CodeContextMode::UploadAll),
            other => Err(format!("unknown context mode '{other}'")),
        }
    }
}

/// Strategy controlling the assistant's access to source code.
#[async_trait]
pub trait CodeContextPolicy: Send + Sync {
    fn mode(&self) -> CodeContextMode;

    /// Tools attached to every run started under this policy.
    fn advertised_tools(&self) -> Vec<AssistantTool>;

    /// Whether this run is waiting on something we should service.
    fn run_action_required(&self, run: &Run) -> bool;

    /// A fresh dispatcher for one orchestration attempt, if this policy
    /// services actions at all.
    fn new_dispatcher(&self) -> Option<ActionDispatcher>;

    /// Hook before the run starts; the upload-all policy ships the tree
    /// here, the others do nothing.
    async fn prepare(&self, subject: &str) -> Result<(), ReviewError>;
}

/// Build the policy for a mode.
pub fn policy_for(
    mode: CodeContextMode,
    api: Arc<dyn AssistantApi>,
    tree: Arc<dyn SourceTree>,
    max_action_retries: u32,
) -> Arc<dyn CodeContextPolicy> {
    match mode {
        CodeContextMode::None => Arc::new(NoContextPolicy),
        CodeContextMode::OnDemand => Arc::new(OnDemandPolicy {
            tree,
            max_action_retries,
        }),
        CodeContextMode::UploadAll => Arc::new(UploadAllPolicy {
            api,
            tree,
            uploaded: Mutex::new(HashSet::new()),
        }),
    }
}

/// The assistant gets nothing beyond the review request itself.
pub struct NoContextPolicy;

#[async_trait]
impl CodeContextPolicy for NoContextPolicy {
    fn mode(&self) -> CodeContextMode {
        CodeContextMode::None
    }

    fn advertised_tools(&self) -> Vec<AssistantTool> {
        Vec::new()
    }

    fn run_action_required(&self, _run: &Run) -> bool {
        false
    }

    fn new_dispatcher(&self) -> Option<ActionDispatcher> {
        None
    }

    async fn prepare(&self, _subject: &str) -> Result<(), ReviewError> {
        Ok(())
    }
}

/// The assistant may look definitions up mid-run.
pub struct OnDemandPolicy {
    tree: Arc<dyn SourceTree>,
    max_action_retries: u32,
}

#[async_trait]
impl CodeContextPolicy for OnDemandPolicy {
    fn mode(&self) -> CodeContextMode {
        CodeContextMode::OnDemand
    }

    fn advertised_tools(&self) -> Vec<AssistantTool> {
        vec![AssistantTool::function(context_tool_schema())]
    }

    fn run_action_required(&self, run: &Run) -> bool {
        run.status == RunStatus::RequiresAction
    }

    fn new_dispatcher(&self) -> Option<ActionDispatcher> {
        Some(ActionDispatcher::new(
            ToolCallServicer::new(self.tree.clone()),
            self.max_action_retries,
        ))
    }

    async fn prepare(&self, _subject: &str) -> Result<(), ReviewError> {
        Ok(())
    }
}

/// The whole tree is uploaded once per subject; the assistant searches it.
pub struct UploadAllPolicy {
    api: Arc<dyn AssistantApi>,
    tree: Arc<dyn SourceTree>,
    uploaded: Mutex<HashSet<String>>,
}

#[async_trait]
impl CodeContextPolicy for UploadAllPolicy {
    fn mode(&self) -> CodeContextMode {
        CodeContextMode::UploadAll
    }

    fn advertised_tools(&self) -> Vec<AssistantTool> {
        vec![AssistantTool::FileSearch]
    }

    fn run_action_required(&self, _run: &Run) -> bool {
        false
    }

    fn new_dispatcher(&self) -> Option<ActionDispatcher> {
        None
    }

    async fn prepare(&self, subject: &str) -> Result<(), ReviewError> {
        if self.uploaded.lock().unwrap().contains(subject) {
            tracing::debug!(subject, "source tree already uploaded for subject");
            return Ok(());
        }

        let files = self.tree.all_files().unwrap_or_default();
        let mut shipped = 0usize;
        for path in &files {
            let content = match self.tree.read_file(path) {
                Ok(Some(content)) => content,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "skipping unreadable file in upload");
                    continue;
                }
            };
            self.api.upload_file(path, content).await?;
            shipped += 1;
        }
        tracing::info!(subject, files = shipped, "uploaded source tree for subject");

        self.uploaded.lock().unwrap().insert(subject.to_string());
        Ok(())
    }
}

fn context_tool_schema() -> ToolSchema {
    ToolSchema::new(
        CONTEXT_FUNCTION,
        "Fetch the definition of a named entity from the repository under review.",
    )
    .with_parameters(serde_json::json!({
        "type": "object",
        "properties": {
            "filename": {
                "type": "string",
                "description": "Path of the file that references the entity, relative to the repository root"
            },
            "entityCategory": {
                "type": "string",
                "enum": ["callable", "data", "type"],
                "description": "Kind of definition wanted"
            },
            "contextRequiredEntity": {
                "type": "string",
                "description": "Dot-qualified name of the entity"
            }
        },
        "required": ["filename", "entityCategory", "contextRequiredEntity"]
    }))
}
