//! Assistants-API client implementation.
//!
//! Thin reqwest wrapper over the thread/run surface: create threads and
//! messages, start and poll runs, submit tool outputs, fetch result steps.
//! All orchestration logic lives above the `AssistantApi` seam.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::assistant::provider::AssistantApi;
use crate::assistant::types::{AssistantTool, Run, RunStatus, RunStep, ToolOutput};
use crate::config::AssistantConfig;
use crate::error::ApiError;

/// Production client for an assistants-style service.
#[derive(Debug)]
pub struct OpenAiAssistantClient {
    client: Client,
    config: AssistantConfig,
}

impl OpenAiAssistantClient {
    /// Create a new client. Fails if no API key is configured.
    pub fn new(config: AssistantConfig) -> Result<Self, ApiError> {
        if config.api_key.is_none() {
            return Err(ApiError::AuthFailed);
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Ok(Self { client, config })
    }

    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn api_key(&self) -> String {
        self.config
            .api_key
            .as_ref()
            .map(|k| k.expose_secret().to_string())
            .unwrap_or_default()
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.api_url(path))
            .header("Authorization", format!("Bearer {}", self.api_key()))
            .header("OpenAI-Beta", "assistants=v2")
    }

    async fn execute<R: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<R, ApiError> {
        let response = request.send().await.map_err(|e| {
            tracing::error!("Assistant service request failed: {}", e);
            ApiError::RequestFailed {
                reason: e.to_string(),
            }
        })?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .map(std::time::Duration::from_secs);
        let body = response.text().await.unwrap_or_default();

        tracing::debug!(status = %status, body = %body, "assistant service response");

        if !status.is_success() {
            if status.as_u16() == 401 {
                return Err(ApiError::AuthFailed);
            }
            if status.as_u16() == 429 {
                return Err(ApiError::RateLimited { retry_after });
            }
            return Err(ApiError::RequestFailed {
                reason: format!("HTTP {}: {}", status, body),
            });
        }

        serde_json::from_str(&body).map_err(|e| ApiError::InvalidResponse {
            reason: format!("JSON parse error: {}. Raw: {}", e, body),
        })
    }
}

#[async_trait]
impl AssistantApi for OpenAiAssistantClient {
    async fn create_thread(&self) -> Result<String, ApiError> {
        let created: ObjectRef = self
            .execute(
                self.request(reqwest::Method::POST, "threads")
                    .json(&serde_json::json!({})),
            )
            .await?;
        Ok(created.id)
    }

    async fn add_message(&self, thread_id: &str, content: &str) -> Result<String, ApiError> {
        let path = format!("threads/{}/messages", thread_id);
        let created: ObjectRef = self
            .execute(
                self.request(reqwest::Method::POST, &path)
                    .json(&serde_json::json!({"role": "user", "content": content})),
            )
            .await?;
        Ok(created.id)
    }

    async fn create_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
        tools: &[AssistantTool],
    ) -> Result<Run, ApiError> {
        let path = format!("threads/{}/runs", thread_id);
        let mut body = serde_json::json!({"assistant_id": assistant_id});
        if !tools.is_empty() {
            body["tools"] = serde_json::to_value(tools).map_err(|e| ApiError::InvalidResponse {
                reason: format!("tool serialization failed: {}", e),
            })?;
        }
        self.execute(self.request(reqwest::Method::POST, &path).json(&body))
            .await
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ApiError> {
        let path = format!("threads/{}/runs/{}", thread_id, run_id);
        self.execute(self.request(reqwest::Method::GET, &path))
            .await
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<RunStatus, ApiError> {
        let path = format!("threads/{}/runs/{}/cancel", thread_id, run_id);
        let run: Run = self
            .execute(
                self.request(reqwest::Method::POST, &path)
                    .json(&serde_json::json!({})),
            )
            .await?;
        Ok(run.status)
    }

    async fn list_run_steps(
        &self,
        thread_id: &str,
        run_id: &str,
    ) -> Result<Vec<RunStep>, ApiError> {
        let path = format!("threads/{}/runs/{}/steps", thread_id, run_id);
        let listing: Listing<RunStep> = self
            .execute(self.request(reqwest::Method::GET, &path))
            .await?;
        Ok(listing.data)
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<(), ApiError> {
        let path = format!("threads/{}/runs/{}/submit_tool_outputs", thread_id, run_id);
        let _: Run = self
            .execute(
                self.request(reqwest::Method::POST, &path)
                    .json(&serde_json::json!({"tool_outputs": outputs})),
            )
            .await?;
        Ok(())
    }

    async fn upload_file(&self, filename: &str, content: String) -> Result<String, ApiError> {
        let part = reqwest::multipart::Part::text(content)
            .file_name(filename.to_string())
            .mime_str("text/plain")
            .map_err(|e| ApiError::RequestFailed {
                reason: e.to_string(),
            })?;
        let form = reqwest::multipart::Form::new()
            .text("purpose", "assistants")
            .part("file", part);
        let uploaded: ObjectRef = self
            .execute(self.request(reqwest::Method::POST, "files").multipart(form))
            .await?;
        Ok(uploaded.id)
    }
}

#[derive(Debug, Deserialize)]
struct ObjectRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Listing<T> {
    data: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_key() -> AssistantConfig {
        AssistantConfig::default()
            .with_api_key("sk-test")
            .with_assistant_id("asst_1")
    }

    #[test]
    fn missing_api_key_is_auth_failure() {
        let err = OpenAiAssistantClient::new(AssistantConfig::default()).unwrap_err();
        assert!(matches!(err, ApiError::AuthFailed));
    }

    #[test]
    fn api_url_joins_without_double_slash() {
        let client = OpenAiAssistantClient::new(
            config_with_key().with_base_url("http://localhost:9000/v1/"),
        )
        .unwrap();
        assert_eq!(
            client.api_url("/threads"),
            "http://localhost:9000/v1/threads"
        );
    }
}
