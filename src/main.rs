//! One-shot CLI for running a review against the configured assistant.
//!
//! The event-listener deployment embeds the library directly; this binary
//! exists for manual runs and deployment smoke checks.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;

use reviewclaw::config::ReviewerConfig;
use reviewclaw::context::policy_for;
use reviewclaw::review::{
    InMemoryThreadStore, JsonThreadStore, ReviewOrchestrator, ReviewRequest, ThreadStore,
};
use reviewclaw::OpenAiAssistantClient;
use reviewclaw::source::{FsSourceTree, SourceTree};

#[derive(Parser)]
#[command(name = "reviewclaw", version, about = "AI code-review companion")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one review and print the resulting run steps as JSON
    Review {
        /// Review subject key (one conversation thread per subject)
        #[arg(long)]
        subject: String,

        /// File holding the assembled review request text
        #[arg(long)]
        request_file: PathBuf,

        /// Drop the subject's persisted thread and start over
        #[arg(long)]
        fresh: bool,

        /// Treat this as a reply to an earlier review comment
        #[arg(long)]
        reply: bool,

        /// Root of the source tree under review (defaults to config)
        #[arg(long)]
        source_root: Option<PathBuf>,
    },

    /// Print the effective configuration (API key redacted)
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut config = ReviewerConfig::from_env();

    match cli.command {
        Command::Review {
            subject,
            request_file,
            fresh,
            reply,
            source_root,
        } => {
            if let Some(root) = source_root {
                config.source_root = root;
            }

            let text = std::fs::read_to_string(&request_file)
                .with_context(|| format!("failed to read {}", request_file.display()))?;

            let api = Arc::new(
                OpenAiAssistantClient::new(config.assistant.clone())
                    .context("assistant client configuration is incomplete")?,
            );
            let tree: Arc<dyn SourceTree> = Arc::new(FsSourceTree::new(&config.source_root));
            let threads: Arc<dyn ThreadStore> = match &config.thread_state_file {
                Some(path) => Arc::new(
                    JsonThreadStore::open(path)
                        .with_context(|| format!("failed to open {}", path.display()))?,
                ),
                None => Arc::new(InMemoryThreadStore::new()),
            };
            let policy = policy_for(
                config.context_mode,
                api.clone(),
                tree,
                config.max_action_retries,
            );

            let orchestrator = ReviewOrchestrator::new(api, policy, threads, &config);
            let mut request = ReviewRequest::new(text);
            if fresh {
                request = request.fresh();
            }
            if reply {
                request = request.as_reply();
            }

            let steps = orchestrator.resolve_review(&subject, &request).await?;
            println!("{}", serde_json::to_string_pretty(&steps)?);
        }

        Command::Config => {
            println!("base_url:           {}", config.assistant.base_url);
            println!(
                "api_key:            {}",
                if config.assistant.api_key.is_some() {
                    "<set>"
                } else {
                    "<unset>"
                }
            );
            println!("assistant_id:       {}", config.assistant.assistant_id);
            println!("context_mode:       {:?}", config.context_mode);
            println!("poll_timeout:       {:?}", config.polling.timeout);
            println!("poll_interval:      {:?}", config.polling.interval);
            println!("max_action_retries: {}", config.max_action_retries);
            println!("step_retries:       {}", config.step_retries);
            println!("source_root:        {}", config.source_root.display());
            println!(
                "thread_state:       {}",
                config
                    .thread_state_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "<in-memory>".to_string())
            );
        }
    }

    Ok(())
}
