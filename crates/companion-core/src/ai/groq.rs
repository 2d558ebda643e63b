use reqwest::Client;
use serde::{Deserialize, Serialize};
use anyhow::{Result, anyhow};
use futures_util::StreamExt;

use crate::prompt::PromptMessage;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "deepseek-r1-distill-llama-70b";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

#[derive(Serialize)]
struct GroqRequest<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
    temperature: f32,
    stream: bool,
}

#[derive(Deserialize)]
struct GroqChoice {
    message: GroqResponseMessage,
}

#[derive(Deserialize)]
struct GroqResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct GroqResponse {
    choices: Vec<GroqChoice>,
}

#[derive(Deserialize)]
struct GroqStreamChunk {
    #[serde(default)]
    choices: Vec<GroqStreamChoice>,
}

#[derive(Deserialize)]
struct GroqStreamChoice {
    #[serde(default)]
    delta: GroqDelta,
}

#[derive(Deserialize, Default)]
struct GroqDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Client for Groq's OpenAI-compatible chat-completion endpoint
#[derive(Clone)]
pub struct GroqClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GroqClient {
    pub fn new(api_key: &str) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: &str, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn send(&self, request: &GroqRequest<'_>) -> Result<reqwest::Response> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self.client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            tracing::error!(%status, "completion request failed");
            return Err(anyhow!("Groq API error {}: {}", status, text));
        }

        Ok(response)
    }

    /// Single-shot completion, returns the whole message content
    pub async fn complete(
        &self,
        model: &str,
        temperature: f32,
        messages: &[PromptMessage],
    ) -> Result<String> {
        let request = GroqRequest {
            model,
            messages,
            temperature,
            stream: false,
        };

        let response = self.send(&request).await?;
        let groq_response: GroqResponse = response.json().await?;
        Ok(groq_response.choices.into_iter().next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }

    /// Streaming completion. Each content delta is handed to `on_chunk` as it
    /// arrives; the concatenated text is returned when the stream ends.
    pub async fn stream<F>(
        &self,
        model: &str,
        temperature: f32,
        messages: &[PromptMessage],
        mut on_chunk: F,
    ) -> Result<String>
    where
        F: FnMut(&str),
    {
        let request = GroqRequest {
            model,
            messages,
            temperature,
            stream: true,
        };

        tracing::info!(model, messages = messages.len(), "streaming completion");
        let response = self.send(&request).await?;

        let mut full_response = String::new();
        let mut byte_stream = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();

        let mut done = false;

        'read: while let Some(result) = byte_stream.next().await {
            let bytes = result.map_err(|e| anyhow!("Stream read error: {}", e))?;
            buffer.extend_from_slice(&bytes);

            // Process complete SSE lines
            while let Some(line_end) = buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=line_end).collect();
                if handle_sse_bytes(&line, &mut full_response, &mut on_chunk)? {
                    done = true;
                    break 'read;
                }
            }
        }

        // The server may close without a trailing newline after the last event
        if !done && !buffer.is_empty() {
            handle_sse_bytes(&buffer, &mut full_response, &mut on_chunk)?;
        }

        tracing::info!(chars = full_response.len(), "completion finished");
        Ok(full_response)
    }

    pub fn list_models() -> Vec<String> {
        vec![DEFAULT_MODEL.to_string()]
    }
}

/// Feed one raw SSE line through the parser. Returns true on `[DONE]`.
fn handle_sse_bytes<F>(line: &[u8], full_response: &mut String, on_chunk: &mut F) -> Result<bool>
where
    F: FnMut(&str),
{
    let line = String::from_utf8_lossy(line);
    match parse_sse_line(line.trim())? {
        SseLine::Content(chunk) => {
            on_chunk(&chunk);
            full_response.push_str(&chunk);
            Ok(false)
        }
        SseLine::Done => Ok(true),
        SseLine::Skip => Ok(false),
    }
}

#[derive(Debug, PartialEq)]
enum SseLine {
    Content(String),
    Done,
    Skip,
}

fn parse_sse_line(line: &str) -> Result<SseLine> {
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(SseLine::Skip);
    };
    let data = data.trim_start();

    if data == "[DONE]" {
        return Ok(SseLine::Done);
    }

    let chunk: GroqStreamChunk = serde_json::from_str(data)
        .map_err(|e| anyhow!("Failed to parse stream event: {}", e))?;

    Ok(chunk.choices.into_iter().next()
        .and_then(|c| c.delta.content)
        .filter(|c| !c.is_empty())
        .map(SseLine::Content)
        .unwrap_or(SseLine::Skip))
}
