//! reviewclaw: drives a remote assistant service through a multi-step
//! review run and answers its mid-run requests for source-code context.
//!
//! The host review system hands `ReviewOrchestrator::resolve_review` a
//! subject key and an assembled request; it gets back the run's ordered
//! result steps or a single connection-failure error. Everything in
//! between lives here: thread reuse, run polling, bounded tool-call
//! servicing, and the symbol lookups that answer `get_context` calls.

pub mod assistant;
pub mod config;
pub mod context;
pub mod error;
pub mod review;
pub mod source;

pub use assistant::{AssistantApi, OpenAiAssistantClient};
pub use config::ReviewerConfig;
pub use context::{CodeContextMode, policy_for};
pub use error::{ApiError, ReviewError};
pub use review::{ReviewOrchestrator, ReviewRequest};
pub use source::{FsSourceTree, SourceTree};
