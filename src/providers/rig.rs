//! rig-core integration for LLM-backed diff summarization.
//!
//! Uses rig-core's provider clients and Agent abstraction for multi-provider
//! support. Currently supports: Anthropic, OpenAI, Gemini, DeepSeek, Groq,
//! and any OpenAI-compatible API.

use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers;

use crate::config::ProviderConfig;
use crate::models::{DiffText, ProviderName, SummaryResult};

use super::prompt::{SYSTEM_PROMPT, build_user_prompt};
use super::retry::RetryPolicy;
use super::{ProviderError, Summarizer};

/// Maximum tokens per LLM completion response.
const MAX_TOKENS: u64 = 4096;

/// Maximum length of LLM response text to include in parse error messages.
const PARSE_ERROR_PREVIEW_LEN: usize = 2000;

/// Build an agent with the summary output schema and prompt it once.
macro_rules! prompt_summary {
    ($client:expr, $model:expr, $system:expr, $user:expr, $label:expr) => {{
        let agent = $client
            .agent($model)
            .preamble($system)
            .temperature(0.0)
            .max_tokens(MAX_TOKENS)
            .output_schema::<SummaryResult>()
            .build();
        agent
            .prompt($user)
            .await
            .map_err(|e| ProviderError::ApiError(format!("{} API error: {e}", $label)))
    }};
}

/// Create a rig-core client using the `Client::new(api_key)` convention.
macro_rules! new_client {
    ($provider_mod:path, $api_key:expr, $label:expr) => {{
        <$provider_mod>::new($api_key).map_err(|e| {
            ProviderError::ApiError(format!("failed to create {} client: {e}", $label))
        })
    }};
}

/// rig-core based summarizer.
///
/// The provider name in config selects which rig-core provider to use.
pub struct RigSummarizer {
    config: ProviderConfig,
    max_diff_chars: usize,
    retry: RetryPolicy,
}

impl RigSummarizer {
    /// Create a new summarizer; fails fast when no API key is configured.
    pub fn new(config: ProviderConfig, max_diff_chars: usize) -> Result<Self, ProviderError> {
        if config.api_key.is_none() {
            return Err(ProviderError::NotConfigured(format!(
                "no API key found for provider '{}'. Set {} or {}.",
                config.name,
                crate::constants::ENV_API_KEY,
                config.name.api_key_env_var(),
            )));
        }
        let retry = RetryPolicy {
            max_attempts: config.max_attempts,
            attempt_timeout: config.timeout(),
            ..RetryPolicy::default()
        };
        Ok(Self {
            config,
            max_diff_chars,
            retry,
        })
    }

    /// Build an OpenAI-style client, optionally with a custom base URL.
    fn build_openai_client(
        &self,
        api_key: &str,
    ) -> Result<providers::openai::CompletionsClient, ProviderError> {
        let mut builder = providers::openai::CompletionsClient::builder().api_key(api_key);
        if let Some(ref base_url) = self.config.base_url {
            builder = builder.base_url(base_url);
        }
        let client: providers::openai::CompletionsClient = builder
            .build()
            .map_err(|e| ProviderError::ApiError(format!("failed to create OpenAI client: {e}")))?;
        Ok(client)
    }

    /// Require `base_url` for OpenAI-compatible providers.
    fn require_base_url(&self) -> Result<&str, ProviderError> {
        self.config.base_url.as_deref().ok_or_else(|| {
            ProviderError::NotConfigured(
                "openai-compatible provider requires base_url to be set".to_string(),
            )
        })
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::NotConfigured("missing API key".to_string()))
    }

    /// Make a completion call through rig-core and return the raw response text.
    async fn call_rig(&self, system_prompt: &str, user_prompt: &str) -> Result<String, ProviderError> {
        let api_key = self.api_key()?;
        let model = self.config.model.as_str();

        match self.config.name {
            ProviderName::Anthropic => {
                let client: providers::anthropic::Client = providers::anthropic::Client::builder()
                    .api_key(api_key)
                    .build()
                    .map_err(|e| {
                        ProviderError::ApiError(format!("failed to create Anthropic client: {e}"))
                    })?;
                prompt_summary!(client, model, system_prompt, user_prompt, "Anthropic")
            }
            ProviderName::OpenAI => {
                let client = self.build_openai_client(api_key)?;
                prompt_summary!(client, model, system_prompt, user_prompt, "OpenAI")
            }
            ProviderName::Gemini => {
                let client = new_client!(providers::gemini::Client, api_key, "Gemini")?;
                prompt_summary!(client, model, system_prompt, user_prompt, "Gemini")
            }
            ProviderName::DeepSeek => {
                let client = new_client!(providers::deepseek::Client, api_key, "DeepSeek")?;
                prompt_summary!(client, model, system_prompt, user_prompt, "DeepSeek")
            }
            ProviderName::Groq => {
                let client = new_client!(providers::groq::Client, api_key, "Groq")?;
                prompt_summary!(client, model, system_prompt, user_prompt, "Groq")
            }
            ProviderName::OpenAICompatible => {
                let base_url = self.require_base_url()?;
                let client: providers::openai::CompletionsClient =
                    providers::openai::CompletionsClient::builder()
                        .api_key(api_key)
                        .base_url(base_url)
                        .build()
                        .map_err(|e| {
                            ProviderError::ApiError(format!(
                                "failed to create OpenAI-compatible client: {e}"
                            ))
                        })?;
                prompt_summary!(
                    client,
                    model,
                    system_prompt,
                    user_prompt,
                    "OpenAI-compatible"
                )
            }
        }
    }
}

#[async_trait]
impl Summarizer for RigSummarizer {
    async fn summarize(&self, diff: &DiffText) -> Result<SummaryResult, ProviderError> {
        let user_prompt = build_user_prompt(diff, self.max_diff_chars);
        tracing::debug!(
            provider = %self.config.name,
            model = %self.config.model,
            diff_bytes = diff.len(),
            "requesting summary"
        );

        let started = std::time::Instant::now();
        let this = self;
        let user_prompt = user_prompt.as_str();
        let summary = self
            .retry
            .run(move || async move {
                let response = this.call_rig(SYSTEM_PROMPT, user_prompt).await?;
                parse_summary_response(&response)
            })
            .await?;
        tracing::debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            items = summary.item_count(),
            "summary received"
        );
        Ok(summary)
    }
}

/// Parse the LLM response text into a [`SummaryResult`].
///
/// The JSON object may arrive bare or inside a Markdown code fence, but
/// the object itself must match the schema exactly: no missing lists and
/// no extra keys.
pub fn parse_summary_response(response: &str) -> Result<SummaryResult, ProviderError> {
    let trimmed = response.trim();

    if trimmed.is_empty() {
        return Err(ProviderError::ParseError("LLM returned an empty response".to_string()));
    }

    let mut last_err = None;
    for candidate in extract_json_candidates(trimmed) {
        match serde_json::from_str::<SummaryResult>(&candidate) {
            Ok(summary) => return Ok(summary),
            Err(e) => last_err = Some(e),
        }
    }

    let reason = last_err
        .map(|e| e.to_string())
        .unwrap_or_else(|| "no JSON object found".to_string());
    Err(ProviderError::ParseError(format!(
        "response does not match the summary schema ({reason}). Response: {}",
        preview(response)
    )))
}

fn preview(text: &str) -> &str {
    let mut end = text.len().min(PARSE_ERROR_PREVIEW_LEN);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Regex for extracting content inside markdown code fences.
///
/// The closing ``` must appear at the start of a line to avoid matching
/// triple-backticks embedded inside JSON string values.
static FENCE_RE: std::sync::LazyLock<regex::Regex> = std::sync::LazyLock::new(|| {
    regex::Regex::new(r"(?s)```(?:json)?\s*\n(.*?)\n```").expect("fence regex is valid")
});

/// Extract candidate JSON strings from a response.
///
/// Returns the trimmed response itself, the span from the first `{` to the
/// last `}`, and any content inside markdown code fences.
fn extract_json_candidates(text: &str) -> Vec<String> {
    let mut candidates = vec![text.to_string()];

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            candidates.push(text[start..=end].to_string());
        }
    }

    for cap in FENCE_RE.captures_iter(text) {
        if let Some(inner) = cap.get(1) {
            let inner_trimmed = inner.as_str().trim();
            if !inner_trimmed.is_empty() {
                candidates.push(inner_trimmed.to_string());
            }
        }
    }

    candidates
}
