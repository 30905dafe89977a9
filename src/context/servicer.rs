//! Turns a batch of pending tool calls into a batch of tool outputs.
//!
//! Outputs preserve input order and ids. Only the code-context function is
//! interpreted; anything else gets an empty output so newly introduced
//! remote tools cannot break an in-flight review.

use std::sync::Arc;

use crate::assistant::types::{ToolCallItem, ToolOutput};
use crate::context::locator::{CodeContextRequest, LocatorFactory};
use crate::source::SourceTree;

/// Function name the assistant is told to call for code context.
pub const CONTEXT_FUNCTION: &str = "get_context";

/// Alias the remote model substitutes when it bundles several calls into
/// one; serviced exactly like the primary name.
pub const CONTEXT_FUNCTION_ALIAS: &str = "multi_tool_use.parallel";

/// Services pending tool calls against the source tree.
pub struct ToolCallServicer {
    factory: LocatorFactory,
}

impl ToolCallServicer {
    pub fn new(tree: Arc<dyn SourceTree>) -> Self {
        Self {
            factory: LocatorFactory::new(tree),
        }
    }

    /// Produce one output per input call, in the same order.
    pub fn service(&self, calls: &[ToolCallItem]) -> Vec<ToolOutput> {
        calls
            .iter()
            .map(|call| ToolOutput {
                tool_call_id: call.id.clone(),
                output: self.service_one(call),
            })
            .collect()
    }

    fn service_one(&self, call: &ToolCallItem) -> String {
        let name = call.function.name.as_str();
        if name != CONTEXT_FUNCTION && name != CONTEXT_FUNCTION_ALIAS {
            tracing::debug!(function = name, "unrecognized tool call, returning empty output");
            return String::new();
        }

        let request: CodeContextRequest = match serde_json::from_str(&call.function.arguments) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(
                    function = name,
                    error = %e,
                    "tool call arguments did not decode as a context request"
                );
                return String::new();
            }
        };

        match self.factory.get(&request) {
            Ok(locator) => locator.find_definition(&request).unwrap_or_default(),
            Err(e) => {
                tracing::debug!(
                    filename = %request.filename,
                    category = %request.entity_category,
                    error = %e,
                    "context lookup unsupported, returning empty output"
                );
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::assistant::testing::tool_call;
    use crate::source::FsSourceTree;
    use std::fs;
    use tempfile::tempdir;

    fn servicer_with(files: &[(&str, &str)]) -> (tempfile::TempDir, ToolCallServicer) {
        let dir = tempdir().unwrap();
        for (path, content) in files {
            let full = dir.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, content).unwrap();
        }
        let tree: Arc<dyn SourceTree> = Arc::new(FsSourceTree::new(dir.path()));
        (dir, ToolCallServicer::new(tree))
    }

    fn context_args(filename: &str, entity: &str) -> String {
        serde_json::json!({
            "filename": filename,
            "entityCategory": "callable",
            "contextRequiredEntity": entity,
        })
        .to_string()
    }

    #[test]
    fn outputs_preserve_order_and_ids() {
        let (_dir, servicer) = servicer_with(&[("pkg/util.py", "def helper(): ...\n")]);
        let calls = vec![
            tool_call("c1", CONTEXT_FUNCTION, &context_args("pkg/util.py", "pkg.util.helper")),
            tool_call("c2", "weather_report", "{}"),
            tool_call("c3", CONTEXT_FUNCTION, &context_args("pkg/util.py", "pkg.util.absent")),
        ];

        let outputs = servicer.service(&calls);

        let ids: Vec<&str> = outputs.iter().map(|o| o.tool_call_id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);
        assert_eq!(outputs[0].output, "def helper(): ...");
        assert_eq!(outputs[1].output, "");
        assert_eq!(outputs[2].output, "");
    }

    #[test]
    fn alias_is_serviced_like_the_primary_name() {
        let (_dir, servicer) = servicer_with(&[("pkg/util.py", "def helper(): ...\n")]);
        let calls = vec![tool_call(
            "c1",
            CONTEXT_FUNCTION_ALIAS,
            &context_args("pkg/util.py", "pkg.util.helper"),
        )];
        let outputs = servicer.service(&calls);
        assert_eq!(outputs[0].output, "def helper(): ...");
    }

    #[test]
    fn undecodable_arguments_degrade_to_empty_output() {
        let (_dir, servicer) = servicer_with(&[]);
        let calls = vec![tool_call("c1", CONTEXT_FUNCTION, "{\"tool_uses\": []}")];
        let outputs = servicer.service(&calls);
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].output, "");
    }

    #[test]
    fn unsupported_language_degrades_to_empty_output() {
        let (_dir, servicer) = servicer_with(&[("main.zig", "fn helper() void {}\n")]);
        let calls = vec![tool_call(
            "c1",
            CONTEXT_FUNCTION,
            &context_args("main.zig", "main.helper"),
        )];
        let outputs = servicer.service(&calls);
        assert_eq!(outputs[0].output, "");
    }
}
