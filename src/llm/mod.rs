use std::fmt;

use anyhow::{Context, Result, anyhow, bail};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const OPENROUTER_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Enumerates the supported LLM backends behind the shared utility.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LlmProvider {
    Gemini,
    OpenRouter,
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmProvider::Gemini => write!(f, "gemini"),
            LlmProvider::OpenRouter => write!(f, "openrouter"),
        }
    }
}

/// Defines the shape of a chat-style interaction with an LLM.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub images: Vec<ImageAttachment>,
}

impl LlmRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            images: Vec::new(),
        }
    }

    pub fn with_images(mut self, images: Vec<ImageAttachment>) -> Self {
        self.images = images;
        self
    }
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub text: String,
}

impl ChatMessage {
    pub fn new(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum MessageRole {
    System,
    User,
}

impl MessageRole {
    fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
        }
    }
}

/// Image pinned to the last user message of a request.
#[derive(Debug, Clone)]
pub struct ImageAttachment {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageAttachment {
    pub fn new(content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            content_type: content_type.into(),
            bytes,
        }
    }

    fn base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }
}

/// Captures basic token usage metrics associated with a call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: usize,
    pub response_tokens: usize,
    pub total_tokens: usize,
}

#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub token_usage: TokenUsage,
    pub provider: LlmProvider,
    pub model: String,
}

/// Main entry point for invoking providers.
#[derive(Clone)]
pub struct LlmClient {
    http: Client,
    config: LlmConfig,
}

#[derive(Clone, Default)]
struct LlmConfig {
    gemini_api_key: Option<String>,
    openrouter_api_key: Option<String>,
    openrouter_referer: Option<String>,
    openrouter_title: Option<String>,
}

impl LlmClient {
    /// Build a client using environment variables.
    pub fn from_env() -> Result<Self> {
        let gemini_api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .ok();
        let openrouter_api_key = std::env::var("OPENROUTER_API_KEY").ok();
        let openrouter_referer = std::env::var("OPENROUTER_HTTP_REFERER").ok();
        let openrouter_title = std::env::var("OPENROUTER_X_TITLE").ok();

        let http = Client::builder()
            .user_agent(concat!("glassygrad/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            config: LlmConfig {
                gemini_api_key,
                openrouter_api_key,
                openrouter_referer,
                openrouter_title,
            },
        })
    }

    /// Execute a request against the provider encoded in the model name.
    pub async fn execute(&self, request: LlmRequest) -> Result<LlmResponse> {
        let model = request.model.clone();
        let (provider, provider_model) = parse_model_provider(&model)?;

        match provider {
            LlmProvider::Gemini => self.execute_gemini(provider_model, &request).await,
            LlmProvider::OpenRouter => self.execute_openrouter(provider_model, &request).await,
        }
    }

    async fn execute_gemini(&self, model: &str, request: &LlmRequest) -> Result<LlmResponse> {
        let Some(api_key) = self.config.gemini_api_key.as_ref() else {
            bail!("GEMINI_API_KEY is not configured but required for Gemini requests");
        };

        let payload = build_gemini_payload(request);
        let response = self
            .http
            .post(format!("{GEMINI_ENDPOINT}/{model}:generateContent"))
            .header("x-goog-api-key", api_key)
            .json(&payload)
            .send()
            .await?;

        let body = read_json_body(response, LlmProvider::Gemini).await?;
        let (text, usage) = extract_gemini_text_and_usage(&body)
            .ok_or_else(|| anyhow!("unexpected Gemini response payload: {}", body))?;

        Ok(LlmResponse {
            token_usage: fill_usage(usage, request, &text),
            text,
            provider: LlmProvider::Gemini,
            model: model.to_string(),
        })
    }

    async fn execute_openrouter(&self, model: &str, request: &LlmRequest) -> Result<LlmResponse> {
        let Some(api_key) = self.config.openrouter_api_key.as_ref() else {
            bail!("OPENROUTER_API_KEY is not configured but required for OpenRouter requests");
        };

        let payload = json!({
            "model": model,
            "messages": build_chat_messages(request),
        });

        let mut req_builder = self
            .http
            .post(OPENROUTER_ENDPOINT)
            .bearer_auth(api_key)
            .json(&payload);

        if let Some(referer) = &self.config.openrouter_referer {
            req_builder = req_builder.header("HTTP-Referer", referer);
        }

        if let Some(title) = &self.config.openrouter_title {
            req_builder = req_builder.header("X-Title", title);
        }

        let response = req_builder.send().await?;
        let body = read_json_body(response, LlmProvider::OpenRouter).await?;
        let (text, usage) = extract_chat_text_and_usage(&body)
            .ok_or_else(|| anyhow!("unexpected OpenRouter response payload: {}", body))?;

        Ok(LlmResponse {
            token_usage: fill_usage(usage, request, &text),
            text,
            provider: LlmProvider::OpenRouter,
            model: model.to_string(),
        })
    }
}

async fn read_json_body(response: reqwest::Response, provider: LlmProvider) -> Result<Value> {
    let status = response.status();
    let response_text = response.text().await.context("failed to read response body")?;
    let body: Value = serde_json::from_str(&response_text).with_context(|| {
        let preview = if response_text.len() > 500 {
            let cut = (0..=500)
                .rev()
                .find(|idx| response_text.is_char_boundary(*idx))
                .unwrap_or(0);
            format!("{}...", &response_text[..cut])
        } else {
            response_text.clone()
        };
        format!("failed to parse {provider} response as JSON. Response body: {preview}")
    })?;
    if !status.is_success() {
        bail!("{provider} call failed with status {status}: {body}");
    }
    Ok(body)
}

/// Gemini `generateContent` body. System messages become the system
/// instruction; images travel as raw base64 `inlineData` ahead of the text.
fn build_gemini_payload(request: &LlmRequest) -> Value {
    let system_text = request
        .messages
        .iter()
        .filter(|m| m.role == MessageRole::System)
        .map(|m| m.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut contents: Vec<Value> = request
        .messages
        .iter()
        .filter(|m| m.role != MessageRole::System)
        .map(|m| json!({ "role": "user", "parts": [{ "text": m.text }] }))
        .collect();

    if !request.images.is_empty() {
        let target = match contents.iter().rposition(|c| c["role"] == "user") {
            Some(idx) => idx,
            None => {
                contents.push(json!({ "role": "user", "parts": [] }));
                contents.len() - 1
            }
        };
        if let Some(parts) = contents[target]["parts"].as_array_mut() {
            let images = request.images.iter().map(|image| {
                json!({
                    "inlineData": {
                        "mimeType": image.content_type,
                        "data": image.base64(),
                    }
                })
            });
            let text_parts = std::mem::take(parts);
            parts.extend(images);
            parts.extend(text_parts);
        }
    }

    let mut payload = json!({ "contents": contents });
    if !system_text.is_empty() {
        payload["systemInstruction"] = json!({ "parts": [{ "text": system_text }] });
    }
    payload
}

/// OpenAI-compatible message list; images are attached to the last user message.
fn build_chat_messages(request: &LlmRequest) -> Vec<Value> {
    let mut messages: Vec<Value> = request
        .messages
        .iter()
        .map(|msg| {
            if request.images.is_empty() {
                json!({ "role": msg.role.as_str(), "content": msg.text })
            } else {
                json!({
                    "role": msg.role.as_str(),
                    "content": [{ "type": "text", "text": msg.text }],
                })
            }
        })
        .collect();

    if request.images.is_empty() {
        return messages;
    }

    let target = match messages.iter().rposition(|m| m["role"] == "user") {
        Some(idx) => idx,
        None => {
            // Create empty user entry to pin uploads
            messages.push(json!({ "role": "user", "content": [] }));
            messages.len() - 1
        }
    };

    if let Some(content) = messages[target]["content"].as_array_mut() {
        for image in &request.images {
            let data_url = format!("data:{};base64,{}", image.content_type, image.base64());
            content.push(json!({
                "type": "image_url",
                "image_url": { "url": data_url }
            }));
        }
    }

    messages
}

fn fill_usage(usage: Option<TokenUsage>, request: &LlmRequest, text: &str) -> TokenUsage {
    let prompt_tokens = approximate_token_count(
        &request
            .messages
            .iter()
            .map(|m| m.text.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
    );
    let response_tokens = approximate_token_count(text);

    let mut token_usage = usage.unwrap_or_default();
    if token_usage.prompt_tokens == 0 {
        token_usage.prompt_tokens = prompt_tokens;
    }
    if token_usage.response_tokens == 0 {
        token_usage.response_tokens = response_tokens;
    }
    token_usage.total_tokens = token_usage.prompt_tokens + token_usage.response_tokens;
    token_usage
}

fn extract_gemini_text_and_usage(value: &Value) -> Option<(String, Option<TokenUsage>)> {
    let payload = serde_json::from_value::<GeminiPayload>(value.clone()).ok()?;
    if payload.candidates.is_empty() && payload.prompt_feedback.is_none() {
        return None;
    }

    let text = payload
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    let usage = payload.usage_metadata.map(|usage| TokenUsage {
        prompt_tokens: usage.prompt_token_count.unwrap_or_default(),
        response_tokens: usage.candidates_token_count.unwrap_or_default(),
        total_tokens: usage.total_token_count.unwrap_or_default(),
    });

    Some((text, usage))
}

fn extract_chat_text_and_usage(value: &Value) -> Option<(String, Option<TokenUsage>)> {
    let chat = serde_json::from_value::<OpenAiChatCompletionPayload>(value.clone()).ok()?;
    if chat.choices.is_empty() {
        return None;
    }

    let text = chat
        .choices
        .into_iter()
        .find_map(|choice| choice.message.content)
        .unwrap_or_default();

    let usage = chat.usage.map(|usage| TokenUsage {
        prompt_tokens: usage.prompt_tokens.unwrap_or_default(),
        response_tokens: usage.completion_tokens.unwrap_or_default(),
        total_tokens: usage.total_tokens.unwrap_or_default(),
    });

    Some((text, usage))
}

pub fn parse_model_provider(model: &str) -> Result<(LlmProvider, &str)> {
    let (provider, name) = model.split_once('/').ok_or_else(|| {
        anyhow!("model must be prefixed with provider, e.g. 'gemini/gemini-3-flash-preview'")
    })?;

    if name.trim().is_empty() {
        bail!("model name is required after provider prefix");
    }

    match provider {
        "gemini" => Ok((LlmProvider::Gemini, name)),
        "openrouter" => Ok((LlmProvider::OpenRouter, name)),
        other => bail!("unsupported provider prefix: {other}"),
    }
}

fn approximate_token_count(input: &str) -> usize {
    input.split_whitespace().count()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPayload {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsage>,
    /// Present without candidates when the prompt itself was blocked.
    #[serde(default)]
    prompt_feedback: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: Option<usize>,
    #[serde(default)]
    candidates_token_count: Option<usize>,
    #[serde(default)]
    total_token_count: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChatCompletionPayload {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiChatMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    #[serde(default)]
    prompt_tokens: Option<usize>,
    #[serde(default)]
    completion_tokens: Option<usize>,
    #[serde(default)]
    total_tokens: Option<usize>,
}
