//! Translation service: a bounded LRU cache in front of an
//! OpenAI-compatible chat-completions backend.
//!
//! The service never raises across its boundary. A cache hit returns
//! immediately with no external call; a miss issues exactly one call, and a
//! failed call loses that line (the dispatch worker does not retry).

use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::cache::{CacheKey, TranslationCache};
use crate::pipeline::ErrorSignal;
use crate::settings::TargetLanguage;

pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const SYSTEM_PROMPT: &str = "You are a helpful translation assistant. \
Translate game chat while preserving tone, slang, and meaning.";
const TEMPERATURE: f32 = 0.2;
const MAX_TOKENS: u32 = 800;
const COMPONENT: &str = "translator";

/// One fully-formed request to the external chat-completion service.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// The opaque external-call boundary. Implementations must not panic; all
/// failures come back as an error message.
pub trait TranslationBackend: Send {
    fn complete(&self, request: &ChatRequest) -> Result<String, String>;
}

fn build_user_prompt(text: &str, language: TargetLanguage) -> String {
    format!(
        "Translate the following chat message to {}. Preserve tone and slang. \
Only return the translation text.\n\nMessage: {}",
        language, text
    )
}

/// Caching wrapper over a [`TranslationBackend`].
///
/// Owned exclusively by the dispatch worker, so the cache needs no locking.
pub struct Translator {
    backend: Box<dyn TranslationBackend>,
    cache: TranslationCache,
    model: String,
}

impl Translator {
    pub fn new(backend: Box<dyn TranslationBackend>, model: impl Into<String>) -> Self {
        Self {
            backend,
            cache: TranslationCache::default(),
            model: model.into(),
        }
    }

    pub fn with_cache(mut self, cache: TranslationCache) -> Self {
        self.cache = cache;
        self
    }

    /// Translates one line, consulting the cache first.
    pub fn translate(
        &mut self,
        text: &str,
        language: TargetLanguage,
    ) -> Result<String, ErrorSignal> {
        let key = CacheKey::new(language.as_str(), text);
        if let Some(cached) = self.cache.get(&key) {
            debug!("Translation cache hit for '{}'", text);
            return Ok(cached);
        }

        let request = ChatRequest {
            system_prompt: SYSTEM_PROMPT.to_string(),
            user_prompt: build_user_prompt(text, language),
            model: self.model.clone(),
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        match self.backend.complete(&request) {
            Ok(translated) => {
                let translated = translated.trim().to_string();
                self.cache.put(key, translated.clone());
                Ok(translated)
            }
            Err(message) => Err(ErrorSignal::new(COMPONENT, message)),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

/// Production backend: posts to an OpenAI-compatible `/chat/completions`
/// endpoint.
///
/// The client is built without a request timeout; a call that never returns
/// stalls the dispatch loop until it does.
pub struct OpenAiBackend {
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
    base_url: String,
}

impl OpenAiBackend {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, String> {
        let headers = build_headers(api_key)?;
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {}", e))?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| format!("Failed to build async runtime: {}", e))?;

        Ok(Self {
            client,
            runtime,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

fn build_headers(api_key: &str) -> Result<HeaderMap, String> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if !api_key.is_empty() {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| format!("Invalid authorization header value: {}", e))?,
        );
    }
    Ok(headers)
}

impl TranslationBackend for OpenAiBackend {
    fn complete(&self, request: &ChatRequest) -> Result<String, String> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!("Sending chat completion request to: {}", url);

        let body = ChatCompletionRequest {
            model: request.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system_prompt.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.user_prompt.clone(),
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        self.runtime.block_on(async {
            let response = self
                .client
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(|e| format!("HTTP request failed: {}", e))?;

            let status = response.status();
            if !status.is_success() {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Failed to read error response".to_string());
                return Err(format!(
                    "API request failed with status {}: {}",
                    status, error_text
                ));
            }

            let completion: ChatCompletionResponse = response
                .json()
                .await
                .map_err(|e| format!("Failed to parse API response: {}", e))?;

            completion
                .choices
                .first()
                .and_then(|choice| choice.message.content.clone())
                .ok_or_else(|| "API response contained no message content".to_string())
        })
    }
}
