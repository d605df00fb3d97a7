//! Chat-completion client for OpenAI-compatible endpoints (Groq by default)

use crate::config::{ApiConfig, SamplingConfig};
use crate::error::{Result, ResumeMatcherError};
use async_stream::try_stream;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use log::{debug, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::time::Duration;

pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// One system message and one user message, with sampling settings
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub system: String,
    pub prompt: String,
    pub sampling: SamplingConfig,
}

/// Anything that can answer a chat request, in one piece or as a stream
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<String>;

    async fn stream(&self, request: &ChatRequest) -> Result<ChunkStream>;
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: Delta,
}

#[derive(Debug, Deserialize)]
struct Delta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// A decoded server-sent event line
#[derive(Debug, Clone, PartialEq)]
pub enum SseLine {
    Delta(String),
    Done,
    Ignored,
}

/// Decode one `data:` line of a streamed completion
pub fn parse_sse_line(line: &str) -> SseLine {
    let Some(data) = line.trim().strip_prefix("data:") else {
        return SseLine::Ignored;
    };
    let data = data.trim();

    if data == "[DONE]" {
        return SseLine::Done;
    }
    if data.is_empty() {
        return SseLine::Ignored;
    }

    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .filter(|text| !text.is_empty())
            .map(SseLine::Delta)
            .unwrap_or(SseLine::Ignored),
        Err(e) => {
            debug!("Failed to parse stream data: {} - {}", e, data);
            SseLine::Ignored
        }
    }
}

/// Reject a credential that cannot be valid, before any network activity
pub fn validate_credential(api_key: &str, prefix: &str) -> Result<()> {
    if api_key.trim().is_empty() {
        return Err(ResumeMatcherError::Credential("no API key provided".to_string()));
    }
    if !api_key.starts_with(prefix) {
        return Err(ResumeMatcherError::Credential(format!(
            "API key must start with '{}'",
            prefix
        )));
    }
    Ok(())
}

pub struct GroqClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl std::fmt::Debug for GroqClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl GroqClient {
    /// Build a client and confirm the credential with one minimal call.
    /// A malformed credential fails before any request is sent.
    pub async fn connect(api_key: &str, api: &ApiConfig, probe_model: &str) -> Result<Self> {
        validate_credential(api_key, &api.key_prefix)?;

        let mut builder = Client::builder();
        if let Some(secs) = api.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let client = Self {
            client: builder.build()?,
            api_key: api_key.to_string(),
            endpoint: format!("{}/chat/completions", api.base_url.trim_end_matches('/')),
        };

        let probe = ChatRequest {
            model: probe_model.to_string(),
            system: String::new(),
            prompt: "test".to_string(),
            sampling: SamplingConfig { temperature: 0.0, max_tokens: 5 },
        };
        client.complete(&probe).await.map_err(|e| match e {
            ResumeMatcherError::Api { status: 401, message } | ResumeMatcherError::Api { status: 403, message } => {
                ResumeMatcherError::Credential(format!("credential rejected: {}", message))
            }
            other => other,
        })?;

        info!("Connected to {}", client.endpoint);
        Ok(client)
    }

    async fn send(&self, request: &ChatRequest, stream: bool) -> Result<reqwest::Response> {
        let mut messages = Vec::with_capacity(2);
        if !request.system.is_empty() {
            messages.push(Message { role: "system", content: &request.system });
        }
        messages.push(Message { role: "user", content: &request.prompt });

        let body = CompletionRequest {
            model: &request.model,
            messages,
            temperature: request.sampling.temperature,
            max_tokens: request.sampling.max_tokens,
            stream,
        };

        debug!(
            "Sending chat request: model={}, temperature={}, max_tokens={}, stream={}",
            request.model, request.sampling.temperature, request.sampling.max_tokens, stream
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(ResumeMatcherError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl ChatBackend for GroqClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let response: CompletionResponse = self.send(request, false).await?.json().await?;

        if let Some(usage) = &response.usage {
            debug!(
                "Chat call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ResumeMatcherError::parse("LLM returned empty content", ""))
    }

    async fn stream(&self, request: &ChatRequest) -> Result<ChunkStream> {
        let bytes = self.send(request, true).await?.bytes_stream();
        Ok(Box::pin(sse_text_stream(bytes)))
    }
}

/// Turn a raw event-stream body into its text deltas. Lines may be split
/// across network chunks, so bytes are buffered until a newline arrives.
pub fn sse_text_stream<S, B>(bytes: S) -> impl Stream<Item = Result<String>> + Send
where
    S: Stream<Item = std::result::Result<B, reqwest::Error>> + Send + 'static,
    B: AsRef<[u8]> + Send,
{
    try_stream! {
        let mut bytes = Box::pin(bytes);
        let mut pending: Vec<u8> = Vec::new();
        let mut finished = false;

        'read: while let Some(chunk) = bytes.next().await {
            pending.extend_from_slice(chunk?.as_ref());

            while let Some(pos) = pending.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = pending.drain(..=pos).collect();
                match parse_sse_line(&String::from_utf8_lossy(&line)) {
                    SseLine::Delta(text) => yield text,
                    SseLine::Done => {
                        finished = true;
                        break 'read;
                    }
                    SseLine::Ignored => {}
                }
            }
        }

        // A body cut without a trailing newline still carries its last line
        if !finished {
            if let SseLine::Delta(text) = parse_sse_line(&String::from_utf8_lossy(&pending)) {
                yield text;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_sse_delta_line() {
        let line = r#"data: {"id":"x","choices":[{"index":0,"delta":{"content":"{\"sc"}}]}"#;
        assert_eq!(parse_sse_line(line), SseLine::Delta("{\"sc".to_string()));
    }

    #[test]
    fn test_sse_done_and_noise() {
        assert_eq!(parse_sse_line("data: [DONE]"), SseLine::Done);
        assert_eq!(parse_sse_line(": keep-alive"), SseLine::Ignored);
        assert_eq!(parse_sse_line(""), SseLine::Ignored);
        assert_eq!(parse_sse_line("data: not json"), SseLine::Ignored);
        assert_eq!(
            parse_sse_line(r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#),
            SseLine::Ignored
        );
    }

    #[test]
    fn test_credential_prefix() {
        assert!(validate_credential("gsk_abc", "gsk_").is_ok());
        assert!(matches!(
            validate_credential("", "gsk_"),
            Err(ResumeMatcherError::Credential(_))
        ));
    }

    #[tokio::test]
    async fn test_sse_stream_reassembles_split_lines() {
        let body: Vec<std::result::Result<Vec<u8>, reqwest::Error>> = vec![
            Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"{\\\"sc\"}}]}\n\nda".to_vec()),
            Ok(b"ta: {\"choices\":[{\"delta\":{\"content\":\"ore_global\\\": 80}\"}}]}\n\n".to_vec()),
            Ok(b"data: [DONE]\n\ndata: {\"choices\":[{\"delta\":{\"content\":\"late\"}}]}\n".to_vec()),
        ];

        let chunks: Vec<String> = sse_text_stream(futures::stream::iter(body))
            .map(|chunk| chunk.unwrap())
            .collect()
            .await;
        assert_eq!(chunks, vec!["{\"sc".to_string(), "ore_global\": 80}".to_string()]);
    }

    #[tokio::test]
    async fn test_sse_stream_keeps_unterminated_last_line() {
        let body: Vec<std::result::Result<&'static [u8], reqwest::Error>> = vec![
            Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"A\"}}]}\n\n"),
            Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"B\"}}]}"),
        ];

        let chunks: Vec<String> = sse_text_stream(futures::stream::iter(body))
            .map(|chunk| chunk.unwrap())
            .collect()
            .await;
        assert_eq!(chunks, vec!["A".to_string(), "B".to_string()]);
    }

    #[tokio::test]
    async fn test_nothing_after_done_is_emitted() {
        let body: Vec<std::result::Result<&'static [u8], reqwest::Error>> = vec![Ok(
            b"data: {\"choices\":[{\"delta\":{\"content\":\"A\"}}]}\n\ndata: [DONE]\n\ndata: {\"choices\":[{\"delta\":{\"content\":\"}\"}}]}",
        )];

        let chunks: Vec<String> = sse_text_stream(futures::stream::iter(body))
            .map(|chunk| chunk.unwrap())
            .collect()
            .await;
        assert_eq!(chunks, vec!["A".to_string()]);
    }

    #[tokio::test]
    async fn test_malformed_credential_fails_before_network() {
        let mut api = Config::default().api;
        // Closed local port: any request would fail with a Network error
        api.base_url = "http://127.0.0.1:9".to_string();

        let err = GroqClient::connect("abc123", &api, "llama-3.3-70b-versatile")
            .await
            .unwrap_err();
        assert!(matches!(err, ResumeMatcherError::Credential(_)));
    }
}
