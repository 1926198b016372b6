//! LLM agent module for summarization.
//!
//! Builds the instruction for the requested [`SummaryMode`] and hands it to a
//! [`LanguageModel`]. Gemini and OpenAI-compatible endpoints are supported.

use crate::config::{AgentConfig, Config, ConfigError};
use crate::summary::SummaryMode;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Generation can take a while for long pages
const LLM_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("LLM request failed: {0}")]
    RequestFailed(String),
    #[error("LLM service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to parse response: {0}")]
    ParseError(String),
    #[error("LLM response contained no text")]
    EmptyResponse,
    #[error("configuration error: {0}")]
    ConfigError(#[from] ConfigError),
}

/// Sampling parameters sent with every request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl From<&AgentConfig> for GenerationParams {
    fn from(config: &AgentConfig) -> Self {
        Self {
            max_output_tokens: config.max_output_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
        }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        (&AgentConfig::default()).into()
    }
}

/// A hosted model that turns one user prompt into one piece of text.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, AgentError>;
}

/// Summarise `text` in the requested style. The model's answer is returned verbatim.
pub async fn summarize(
    model: &dyn LanguageModel,
    text: &str,
    mode: SummaryMode,
    config: &AgentConfig,
) -> Result<String, AgentError> {
    let prompt = build_prompt(text, mode, config.persona.as_deref());
    let params = GenerationParams::from(config);

    info!(mode = %mode, prompt_chars = prompt.chars().count(), "requesting summary");
    let summary = model.generate(&prompt, &params).await?;
    debug!(summary_chars = summary.chars().count(), "summary received");

    Ok(summary)
}

/// Build the instruction for `mode` with `text` embedded
pub fn build_prompt(text: &str, mode: SummaryMode, persona: Option<&str>) -> String {
    let instruction = match mode {
        SummaryMode::OneLine => {
            "Please provide a single, concise one-line summary (maximum 2 sentences) of the following content.\n\
             The summary should capture the main point or takeaway."
        }
        SummaryMode::Detailed => {
            "Please provide a detailed summary of the following content in 2-3 paragraphs.\n\
             The summary should:\n\
             - Cover the main ideas and key points\n\
             - Maintain the logical flow of the original content\n\
             - Be informative yet concise"
        }
    };
    let answer_label = match mode {
        SummaryMode::OneLine => "One-line summary:",
        SummaryMode::Detailed => "Detailed summary:",
    };

    let mut prompt = String::with_capacity(text.len() + 400);
    if let Some(persona) = persona.filter(|p| !p.trim().is_empty()) {
        prompt.push_str(persona.trim());
        prompt.push_str("\n\n");
    }
    prompt.push_str(instruction);
    prompt.push_str("\n\nContent:\n");
    prompt.push_str(text);
    prompt.push_str("\n\n");
    prompt.push_str(answer_label);
    prompt
}

/// Build the model client for the configured provider
pub fn from_config(config: &Config) -> Result<Box<dyn LanguageModel>, AgentError> {
    let api_key = config.api_key()?;
    let agent = &config.agent;

    let model: Box<dyn LanguageModel> = match agent.provider.as_str() {
        "gemini" => Box::new(
            GeminiClient::new(api_key, &agent.model)?
                .base_url(agent.base_url.as_deref().unwrap_or(GEMINI_BASE_URL)),
        ),
        "openai" => Box::new(
            OpenAiClient::new(api_key, &agent.model)?
                .base_url(agent.base_url.as_deref().unwrap_or(OPENAI_BASE_URL)),
        ),
        other => return Err(ConfigError::UnknownProvider(other.to_string()).into()),
    };
    Ok(model)
}

fn http_client() -> Result<Client, AgentError> {
    Client::builder()
        .timeout(LLM_TIMEOUT)
        .build()
        .map_err(|e| AgentError::RequestFailed(e.to_string()))
}

/// Send a request and decode a JSON body, turning non-2xx answers into errors
async fn send_json<R: DeserializeOwned>(request: RequestBuilder) -> Result<R, AgentError> {
    let response = request
        .send()
        .await
        .map_err(|e| AgentError::RequestFailed(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AgentError::Status {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json()
        .await
        .map_err(|e| AgentError::ParseError(e.to_string()))
}

/// Google Gemini `generateContent` client
pub struct GeminiClient {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str) -> Result<Self, AgentError> {
        Ok(Self {
            http: http_client()?,
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: GEMINI_BASE_URL.to_string(),
        })
    }

    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    role: &'a str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, AgentError> {
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart { text: prompt }],
            }],
            generation_config: GeminiGenerationConfig {
                max_output_tokens: params.max_output_tokens,
                temperature: params.temperature,
                top_p: params.top_p,
            },
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let request = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body);

        let response: GeminiResponse = send_json(request).await?;
        response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
            .ok_or(AgentError::EmptyResponse)
    }
}

/// OpenAI-compatible `chat/completions` client
pub struct OpenAiClient {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: &str, model: &str) -> Result<Self, AgentError> {
        Ok(Self {
            http: http_client()?,
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: OPENAI_BASE_URL.to_string(),
        })
    }

    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, AgentError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: params.max_output_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let request = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body);

        let response: ChatResponse = send_json(request).await?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(AgentError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records what it was asked and answers with a canned reply
    struct EchoModel {
        reply: String,
        seen: Mutex<Vec<(String, GenerationParams)>>,
    }

    #[async_trait]
    impl LanguageModel for EchoModel {
        async fn generate(
            &self,
            prompt: &str,
            params: &GenerationParams,
        ) -> Result<String, AgentError> {
            self.seen
                .lock()
                .unwrap()
                .push((prompt.to_string(), *params));
            Ok(self.reply.clone())
        }
    }

    #[test]
    fn prompts_differ_only_in_instruction() {
        let body = "Rust 2024 edition ships with async closures.";
        let short = build_prompt(body, SummaryMode::OneLine, None);
        let long = build_prompt(body, SummaryMode::Detailed, None);

        assert_ne!(short, long);
        assert!(short.contains(body));
        assert!(long.contains(body));
        assert!(short.contains("maximum 2 sentences"));
        assert!(long.contains("2-3 paragraphs"));
        assert!(short.ends_with("One-line summary:"));
        assert!(long.ends_with("Detailed summary:"));
    }

    #[test]
    fn persona_is_prepended_when_set() {
        let prompt = build_prompt("text", SummaryMode::OneLine, Some("You are a librarian."));
        assert!(prompt.starts_with("You are a librarian.\n\nPlease provide"));

        let blank = build_prompt("text", SummaryMode::OneLine, Some("  "));
        assert!(blank.starts_with("Please provide"));
    }

    #[tokio::test]
    async fn summarize_returns_model_text_verbatim() {
        let model = EchoModel {
            reply: "  A summary, untouched.\n".to_string(),
            seen: Mutex::new(Vec::new()),
        };
        let config = AgentConfig::default();

        let summary = summarize(&model, "page text", SummaryMode::Detailed, &config)
            .await
            .unwrap();
        assert_eq!(summary, "  A summary, untouched.\n");

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (prompt, params) = &seen[0];
        assert!(prompt.contains("page text"));
        assert_eq!(params.max_output_tokens, 1000);
        assert!((params.temperature - 0.3).abs() < f32::EPSILON);
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn log_fields_count_characters_not_bytes() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let model = EchoModel {
            reply: "résumé".to_string(),
            seen: Mutex::new(Vec::new()),
        };
        let config = AgentConfig::default();
        let text = "Café crème, naïve façade. 日本語のテキスト";
        summarize(&model, text, SummaryMode::OneLine, &config)
            .await
            .unwrap();

        let expected = build_prompt(text, SummaryMode::OneLine, None).chars().count();
        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains(&format!("prompt_chars={expected}")), "{output}");
        assert!(output.contains("summary_chars=6"), "{output}");
    }

    #[test]
    fn from_config_requires_a_key() {
        let config = Config::default();
        assert!(matches!(
            from_config(&config),
            Err(AgentError::ConfigError(ConfigError::MissingApiKey(_)))
        ));
    }
}
