//! Reqwest-based chat backend adapter.
//!
//! Speaks a function-call JSON API: every query, mutation and action is a
//! `POST {base}/api/{kind}` with `{"path", "args", "format": "json"}` and
//! answers `{"status": "success", "value"}` or
//! `{"status": "error", "errorMessage"}`. Uploads go straight to the URL
//! returned by `files:generateUploadUrl`.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::{ChatConfig, DEFAULT_UPLOAD_CHUNK_BYTES};
use crate::error::{classify_reqwest_error, BackendError, ChatError, ChatResult};
use crate::models::{parse_each, StreamCursor, StreamDelta};
use crate::traits::{ChatBackend, MessagePage, ProgressFn, SendRequest, UploadTarget, UploadedFile};

pub const CREATE_THREAD_PATH: &str = "threads:create";
pub const LIST_MESSAGES_PATH: &str = "messages:list";
pub const LIST_DELTAS_PATH: &str = "messages:listDeltas";
pub const GENERATE_UPLOAD_URL_PATH: &str = "files:generateUploadUrl";
pub const SEND_MESSAGE_PATH: &str = "messages:send";

#[derive(Debug, Clone, Copy)]
enum FunctionKind {
    Query,
    Mutation,
    Action,
}

impl FunctionKind {
    fn as_str(self) -> &'static str {
        match self {
            FunctionKind::Query => "query",
            FunctionKind::Mutation => "mutation",
            FunctionKind::Action => "action",
        }
    }
}

/// Envelope every function call answers with
#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum FunctionResponse {
    Success {
        #[serde(default)]
        value: Value,
    },
    Error {
        #[serde(rename = "errorMessage", default)]
        error_message: String,
    },
}

/// Chat backend over HTTP.
///
/// # Example
///
/// ```ignore
/// use chatline::adapters::HttpChatBackend;
///
/// let backend = HttpChatBackend::new("https://example.convex.cloud")
///     .with_auth_token("token");
/// let page = backend.list_messages("thread-1", 50).await?;
/// ```
#[derive(Debug, Clone)]
pub struct HttpChatBackend {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
    chunk_bytes: usize,
}

impl HttpChatBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Use a preconfigured client (timeouts, proxies, TLS settings).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token: None,
            chunk_bytes: DEFAULT_UPLOAD_CHUNK_BYTES,
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_chunk_bytes(mut self, chunk_bytes: usize) -> Self {
        self.chunk_bytes = chunk_bytes.max(1);
        self
    }

    /// Build from config; fails when no backend URL is configured.
    pub fn from_config(config: &ChatConfig) -> ChatResult<Self> {
        let base_url = config.backend_url.clone().ok_or_else(|| ChatError::Config {
            key: crate::config::ENV_BACKEND_URL.to_string(),
            message: "no backend URL configured".to_string(),
        })?;
        let mut backend = Self::new(base_url).with_chunk_bytes(config.upload_chunk_bytes);
        if let Some(token) = &config.auth_token {
            backend = backend.with_auth_token(token.clone());
        }
        Ok(backend)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        kind: FunctionKind,
        path: &str,
        args: Value,
    ) -> Result<T, BackendError> {
        let url = format!("{}/api/{}", self.base_url, kind.as_str());
        let body = json!({ "path": path, "args": args, "format": "json" });

        let response = self
            .authorize(self.client.post(&url).json(&body))
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e, &url))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(path, status = status.as_u16(), "Backend call failed");
            return Err(BackendError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: FunctionResponse = response
            .json()
            .await
            .map_err(|e| classify_reqwest_error(&e, &url))?;

        match envelope {
            FunctionResponse::Success { value } => {
                serde_json::from_value(value).map_err(|e| BackendError::InvalidResponse {
                    message: format!("{}: {}", path, e),
                })
            }
            FunctionResponse::Error { error_message } => Err(BackendError::Rejected {
                path: path.to_string(),
                message: error_message,
            }),
        }
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn create_thread(&self) -> Result<String, BackendError> {
        self.call(FunctionKind::Mutation, CREATE_THREAD_PATH, json!({}))
            .await
    }

    async fn list_messages(
        &self,
        thread_id: &str,
        page_size: usize,
    ) -> Result<MessagePage, BackendError> {
        let args = json!({
            "threadId": thread_id,
            "paginationOpts": { "numItems": page_size, "cursor": null },
        });
        self.call(FunctionKind::Query, LIST_MESSAGES_PATH, args).await
    }

    async fn list_deltas(
        &self,
        thread_id: &str,
        cursors: &[StreamCursor],
    ) -> Result<Vec<StreamDelta>, BackendError> {
        if cursors.is_empty() {
            return Ok(Vec::new());
        }
        let args = json!({ "threadId": thread_id, "cursors": cursors });
        let values: Vec<Value> = self.call(FunctionKind::Query, LIST_DELTAS_PATH, args).await?;
        Ok(parse_each(values, "stream delta"))
    }

    async fn generate_upload_url(&self) -> Result<UploadTarget, BackendError> {
        let url: String = self
            .call(FunctionKind::Mutation, GENERATE_UPLOAD_URL_PATH, json!({}))
            .await?;
        Ok(UploadTarget { url })
    }

    async fn upload(
        &self,
        target: &UploadTarget,
        bytes: Bytes,
        content_type: &str,
        progress: ProgressFn,
    ) -> Result<UploadedFile, BackendError> {
        let total = bytes.len() as u64;
        let chunks: Vec<Bytes> = (0..bytes.len())
            .step_by(self.chunk_bytes)
            .map(|start| bytes.slice(start..(start + self.chunk_bytes).min(bytes.len())))
            .collect();

        progress(0, total);
        let mut sent = 0u64;
        let body = futures::stream::iter(chunks).map(move |chunk| {
            sent += chunk.len() as u64;
            progress(sent, total);
            Ok::<Bytes, std::io::Error>(chunk)
        });

        let response = self
            .authorize(
                self.client
                    .post(&target.url)
                    .header(reqwest::header::CONTENT_TYPE, content_type)
                    .header(reqwest::header::CONTENT_LENGTH, total)
                    .body(reqwest::Body::wrap_stream(body)),
            )
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e, &target.url))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<UploadedFile>()
            .await
            .map_err(|e| BackendError::InvalidResponse {
                message: format!("upload response: {}", e),
            })
    }

    async fn send_message(
        &self,
        thread_id: &str,
        request: SendRequest,
    ) -> Result<(), BackendError> {
        let args = json!({
            "threadId": thread_id,
            "prompt": request.prompt,
            "fileIds": request.file_ids,
        });
        let _: Value = self
            .call(FunctionKind::Action, SEND_MESSAGE_PATH, args)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_response_parsing() {
        let ok: FunctionResponse =
            serde_json::from_str(r#"{"status":"success","value":"t1"}"#).unwrap();
        assert!(matches!(ok, FunctionResponse::Success { value } if value == "t1"));

        let err: FunctionResponse =
            serde_json::from_str(r#"{"status":"error","errorMessage":"nope"}"#).unwrap();
        assert!(matches!(err, FunctionResponse::Error { error_message } if error_message == "nope"));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let backend = HttpChatBackend::new("http://localhost:3210/");
        assert_eq!(backend.base_url(), "http://localhost:3210");
    }

    #[test]
    fn test_from_config_requires_url() {
        let err = HttpChatBackend::from_config(&ChatConfig::default()).unwrap_err();
        assert!(matches!(err, ChatError::Config { .. }));

        let config = ChatConfig::default().with_backend_url("http://localhost:3210");
        assert!(HttpChatBackend::from_config(&config).is_ok());
    }

    #[tokio::test]
    async fn test_empty_cursors_skip_request() {
        // Nothing listens here; a request would fail.
        let backend = HttpChatBackend::new("http://127.0.0.1:9");
        let deltas = backend.list_deltas("t1", &[]).await.unwrap();
        assert!(deltas.is_empty());
    }
}
