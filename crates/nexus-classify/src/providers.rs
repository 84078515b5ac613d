//! Remote classifier calls.
//!
//! One non-streaming request per classification. Gemini uses
//! `generateContent`, OpenAI and Groq share the chat-completions format,
//! Anthropic uses the Messages API.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::ClassifyError;
use crate::parse::parse_diagnosis;
use crate::prompt::{build_user_prompt, system_prompt};
use crate::types::{ClassifyRequest, Credential, Diagnosis, ImageAttachment, LLMProvider};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const GROQ_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";

const TEMPERATURE: f64 = 0.2;
const MAX_TOKENS: usize = 1024;

/// Key checks are a single small request.
const KEY_TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Where each provider's completion endpoint lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Model collection; `/{model}:generateContent` is appended.
    pub gemini: String,
    pub openai: String,
    pub groq: String,
    pub anthropic: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            gemini: GEMINI_BASE_URL.to_string(),
            openai: OPENAI_URL.to_string(),
            groq: GROQ_URL.to_string(),
            anthropic: ANTHROPIC_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// Every provider behind one gateway, using the providers' own paths.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            gemini: format!("{}/v1beta/models", base),
            openai: format!("{}/v1/chat/completions", base),
            groq: format!("{}/openai/v1/chat/completions", base),
            anthropic: format!("{}/v1/messages", base),
        }
    }
}

/// HTTP client with a whole-request timeout.
pub fn build_client(timeout: Duration) -> Client {
    Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
        warn!("Falling back to default HTTP client: {}", e);
        Client::new()
    })
}

/// Classify a complaint with the remote model.
pub async fn classify_remote(
    client: &Client,
    endpoints: &Endpoints,
    req: &ClassifyRequest<'_>,
    credential: &Credential,
) -> Result<Diagnosis, ClassifyError> {
    if credential.api_key.trim().is_empty() {
        return Err(ClassifyError::MissingCredential);
    }
    let text = complete(client, endpoints, req, credential).await?;
    debug!("Remote classifier replied with {} chars", text.len());
    parse_diagnosis(&text)
}

async fn complete(
    client: &Client,
    endpoints: &Endpoints,
    req: &ClassifyRequest<'_>,
    credential: &Credential,
) -> Result<String, ClassifyError> {
    let body = request_body(credential.provider, &credential.model, req);
    let key = credential.api_key.as_str();

    debug!(
        "Classifying via {} with model {}",
        credential.provider, credential.model
    );

    let request = match credential.provider {
        LLMProvider::Gemini => client
            .post(format!(
                "{}/{}:generateContent",
                endpoints.gemini, credential.model
            ))
            .header("x-goog-api-key", key),
        LLMProvider::OpenAI => client
            .post(&endpoints.openai)
            .header("Authorization", format!("Bearer {}", key)),
        LLMProvider::Groq => client
            .post(&endpoints.groq)
            .header("Authorization", format!("Bearer {}", key)),
        LLMProvider::Anthropic => client
            .post(&endpoints.anthropic)
            .header("x-api-key", key)
            .header("anthropic-version", "2023-06-01"),
    };

    let response = request
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(ClassifyError::Api { status, body });
    }

    let payload: Value = response
        .json()
        .await
        .map_err(|e| ClassifyError::Parse(e.to_string()))?;

    extract_text(credential.provider, &payload)
        .ok_or_else(|| ClassifyError::Parse("reply has no text content".into()))
}

/// JSON body for one classification request.
pub(crate) fn request_body(provider: LLMProvider, model: &str, req: &ClassifyRequest<'_>) -> Value {
    let prompt = build_user_prompt(req);

    match provider {
        LLMProvider::Gemini => {
            let mut parts = vec![json!({ "text": prompt })];
            if let Some(image) = req.image {
                parts.push(json!({
                    "inline_data": {
                        "mime_type": image.mime_type,
                        "data": BASE64.encode(&image.data),
                    }
                }));
            }
            json!({
                "systemInstruction": { "parts": [{ "text": system_prompt() }] },
                "contents": [{ "role": "user", "parts": parts }],
                "generationConfig": {
                    "temperature": TEMPERATURE,
                    "responseMimeType": "application/json",
                },
            })
        }
        LLMProvider::OpenAI | LLMProvider::Groq => {
            // Groq's hosted models are text-only, so the image is dropped there.
            let user_content = match (provider, req.image) {
                (LLMProvider::OpenAI, Some(image)) => json!([
                    { "type": "text", "text": prompt },
                    { "type": "image_url", "image_url": { "url": data_url(image) } },
                ]),
                _ => json!(prompt),
            };
            json!({
                "model": model,
                "messages": [
                    { "role": "system", "content": system_prompt() },
                    { "role": "user", "content": user_content },
                ],
                "temperature": TEMPERATURE,
                "max_tokens": MAX_TOKENS,
            })
        }
        LLMProvider::Anthropic => {
            let mut content = Vec::new();
            if let Some(image) = req.image {
                content.push(json!({
                    "type": "image",
                    "source": {
                        "type": "base64",
                        "media_type": image.mime_type,
                        "data": BASE64.encode(&image.data),
                    }
                }));
            }
            content.push(json!({ "type": "text", "text": prompt }));
            json!({
                "model": model,
                "system": system_prompt(),
                "messages": [{ "role": "user", "content": content }],
                "temperature": TEMPERATURE,
                "max_tokens": MAX_TOKENS,
            })
        }
    }
}

/// Pull the reply text out of a provider response.
pub(crate) fn extract_text(provider: LLMProvider, payload: &Value) -> Option<String> {
    let text = match provider {
        LLMProvider::Gemini => payload["candidates"][0]["content"]["parts"]
            .as_array()?
            .iter()
            .filter_map(|p| p["text"].as_str())
            .collect::<String>(),
        LLMProvider::OpenAI | LLMProvider::Groq => {
            payload["choices"][0]["message"]["content"].as_str()?.to_string()
        }
        LLMProvider::Anthropic => payload["content"]
            .as_array()?
            .iter()
            .filter(|b| b["type"] == "text")
            .filter_map(|b| b["text"].as_str())
            .collect::<String>(),
    };
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn data_url(image: &ImageAttachment) -> String {
    format!("data:{};base64,{}", image.mime_type, BASE64.encode(&image.data))
}

/// Test an API key by making a minimal request.
pub async fn test_api_key(provider: LLMProvider, api_key: &str) -> Result<(), String> {
    let client = build_client(KEY_TEST_TIMEOUT);
    check_api_key(&client, &Endpoints::default(), provider, api_key).await
}

/// Key check against explicit endpoints. The client's timeout bounds the
/// whole check.
pub async fn check_api_key(
    client: &Client,
    endpoints: &Endpoints,
    provider: LLMProvider,
    api_key: &str,
) -> Result<(), String> {
    let request = match provider {
        LLMProvider::Gemini => client
            .get(&endpoints.gemini)
            .header("x-goog-api-key", api_key),
        LLMProvider::OpenAI => client
            .get(models_url(&endpoints.openai))
            .header("Authorization", format!("Bearer {}", api_key)),
        LLMProvider::Groq => client
            .get(models_url(&endpoints.groq))
            .header("Authorization", format!("Bearer {}", api_key)),
        LLMProvider::Anthropic => client
            .post(&endpoints.anthropic)
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&json!({
                "model": "claude-3-5-haiku-20241022",
                "max_tokens": 1,
                "messages": [{"role": "user", "content": "Hi"}],
            })),
    };
    let resp = request.send().await.map_err(|e| e.to_string())?;

    // Anthropic answers 400 for a valid key with a quota or model problem.
    let accepted = resp.status().is_success()
        || (provider == LLMProvider::Anthropic && resp.status().as_u16() == 400);
    if accepted {
        Ok(())
    } else {
        Err(format!("API returned status {}", resp.status()))
    }
}

/// Chat-completions URL to the sibling model listing.
fn models_url(completions_url: &str) -> String {
    completions_url.replace("/chat/completions", "/models")
}
