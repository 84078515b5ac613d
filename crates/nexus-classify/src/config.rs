//! Classifier provider configuration and credential selection.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::{Credential, LLMProvider};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-lite-001";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-haiku-20241022";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";

/// Stored classifier configuration (persisted to classifier-config.json).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_preferred")]
    pub preferred_provider: String,
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub anthropic_api_key: Option<String>,
    #[serde(default)]
    pub groq_api_key: Option<String>,
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default = "default_anthropic_model")]
    pub anthropic_model: String,
    #[serde(default = "default_groq_model")]
    pub groq_model: String,
    /// Path to config file for saving.
    #[serde(skip)]
    pub config_path: PathBuf,
}

fn default_preferred() -> String {
    "auto".into()
}
fn default_gemini_model() -> String {
    DEFAULT_GEMINI_MODEL.into()
}
fn default_openai_model() -> String {
    DEFAULT_OPENAI_MODEL.into()
}
fn default_anthropic_model() -> String {
    DEFAULT_ANTHROPIC_MODEL.into()
}
fn default_groq_model() -> String {
    DEFAULT_GROQ_MODEL.into()
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            preferred_provider: default_preferred(),
            gemini_api_key: None,
            openai_api_key: None,
            anthropic_api_key: None,
            groq_api_key: None,
            gemini_model: default_gemini_model(),
            openai_model: default_openai_model(),
            anthropic_model: default_anthropic_model(),
            groq_model: default_groq_model(),
            config_path: PathBuf::new(),
        }
    }
}

/// Public view of the config (keys masked).
#[derive(Debug, Clone, Serialize)]
pub struct ClassifierConfigResponse {
    #[serde(rename = "preferredProvider")]
    pub preferred_provider: String,
    #[serde(rename = "geminiConfigured")]
    pub gemini_configured: bool,
    #[serde(rename = "openaiConfigured")]
    pub openai_configured: bool,
    #[serde(rename = "anthropicConfigured")]
    pub anthropic_configured: bool,
    #[serde(rename = "groqConfigured")]
    pub groq_configured: bool,
    #[serde(rename = "geminiModel")]
    pub gemini_model: String,
    #[serde(rename = "openaiModel")]
    pub openai_model: String,
    #[serde(rename = "anthropicModel")]
    pub anthropic_model: String,
    #[serde(rename = "groqModel")]
    pub groq_model: String,
    #[serde(rename = "activeProvider")]
    pub active_provider: Option<String>,
}

/// Config update request. Absent fields are left as they are.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassifierConfigUpdate {
    #[serde(rename = "preferredProvider")]
    pub preferred_provider: Option<String>,
    #[serde(rename = "geminiApiKey")]
    pub gemini_api_key: Option<String>,
    #[serde(rename = "openaiApiKey")]
    pub openai_api_key: Option<String>,
    #[serde(rename = "anthropicApiKey")]
    pub anthropic_api_key: Option<String>,
    #[serde(rename = "groqApiKey")]
    pub groq_api_key: Option<String>,
    #[serde(rename = "geminiModel")]
    pub gemini_model: Option<String>,
    #[serde(rename = "openaiModel")]
    pub openai_model: Option<String>,
    #[serde(rename = "anthropicModel")]
    pub anthropic_model: Option<String>,
    #[serde(rename = "groqModel")]
    pub groq_model: Option<String>,
}

impl ClassifierConfig {
    /// Load config from file, falling back to env vars and defaults.
    pub fn load(config_path: &Path) -> Self {
        let mut config: ClassifierConfig = std::fs::read_to_string(config_path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default();

        config.config_path = config_path.to_path_buf();

        // Env vars as fallback for API keys
        if config.gemini_api_key.is_none() {
            config.gemini_api_key = std::env::var("GEMINI_API_KEY")
                .or_else(|_| std::env::var("GOOGLE_API_KEY"))
                .ok();
        }
        if config.openai_api_key.is_none() {
            config.openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        }
        if config.anthropic_api_key.is_none() {
            config.anthropic_api_key = std::env::var("ANTHROPIC_API_KEY").ok();
        }
        if config.groq_api_key.is_none() {
            config.groq_api_key = std::env::var("GROQ_API_KEY").ok();
        }

        config
    }

    /// Save config to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(&self.config_path, json)?;
        info!("Saved classifier config to {}", self.config_path.display());
        Ok(())
    }

    /// Apply an update, merging with existing config. Blank keys clear the
    /// stored key.
    pub fn apply_update(&mut self, update: &ClassifierConfigUpdate) {
        if let Some(p) = &update.preferred_provider {
            self.preferred_provider = p.clone();
        }
        for (slot, value) in [
            (&mut self.gemini_api_key, &update.gemini_api_key),
            (&mut self.openai_api_key, &update.openai_api_key),
            (&mut self.anthropic_api_key, &update.anthropic_api_key),
            (&mut self.groq_api_key, &update.groq_api_key),
        ] {
            if let Some(k) = value {
                *slot = Some(k.trim().to_string()).filter(|k| !k.is_empty());
            }
        }
        if let Some(m) = &update.gemini_model {
            self.gemini_model = m.clone();
        }
        if let Some(m) = &update.openai_model {
            self.openai_model = m.clone();
        }
        if let Some(m) = &update.anthropic_model {
            self.anthropic_model = m.clone();
        }
        if let Some(m) = &update.groq_model {
            self.groq_model = m.clone();
        }
    }

    pub fn model_for(&self, provider: LLMProvider) -> &str {
        match provider {
            LLMProvider::Gemini => &self.gemini_model,
            LLMProvider::OpenAI => &self.openai_model,
            LLMProvider::Anthropic => &self.anthropic_model,
            LLMProvider::Groq => &self.groq_model,
        }
    }

    fn key_for(&self, provider: LLMProvider) -> Option<&String> {
        match provider {
            LLMProvider::Gemini => self.gemini_api_key.as_ref(),
            LLMProvider::OpenAI => self.openai_api_key.as_ref(),
            LLMProvider::Anthropic => self.anthropic_api_key.as_ref(),
            LLMProvider::Groq => self.groq_api_key.as_ref(),
        }
    }

    fn credential(&self, provider: LLMProvider) -> Option<Credential> {
        self.key_for(provider)
            .filter(|k| !k.trim().is_empty())
            .map(|k| Credential {
                provider,
                model: self.model_for(provider).to_string(),
                api_key: k.clone(),
            })
    }

    /// Credential for a key supplied with a single request. Uses the
    /// preferred provider unless one is given, Gemini in auto mode.
    pub fn credential_with_key(&self, provider: Option<LLMProvider>, api_key: &str) -> Credential {
        let provider = provider
            .or_else(|| self.preferred_provider.parse().ok())
            .unwrap_or(LLMProvider::Gemini);
        Credential {
            provider,
            model: self.model_for(provider).to_string(),
            api_key: api_key.trim().to_string(),
        }
    }

    /// Resolve which provider, model and key to use.
    pub fn resolve_credential(&self) -> Option<Credential> {
        // Explicit preference
        if self.preferred_provider != "auto" {
            return self
                .preferred_provider
                .parse()
                .ok()
                .and_then(|p| self.credential(p));
        }

        // Auto mode: Gemini > Anthropic > Groq > OpenAI
        [
            LLMProvider::Gemini,
            LLMProvider::Anthropic,
            LLMProvider::Groq,
            LLMProvider::OpenAI,
        ]
        .into_iter()
        .find_map(|p| self.credential(p))
    }

    /// Build the public config response (no API keys exposed).
    pub fn to_response(&self) -> ClassifierConfigResponse {
        ClassifierConfigResponse {
            preferred_provider: self.preferred_provider.clone(),
            gemini_configured: self.gemini_api_key.is_some(),
            openai_configured: self.openai_api_key.is_some(),
            anthropic_configured: self.anthropic_api_key.is_some(),
            groq_configured: self.groq_api_key.is_some(),
            gemini_model: self.gemini_model.clone(),
            openai_model: self.openai_model.clone(),
            anthropic_model: self.anthropic_model.clone(),
            groq_model: self.groq_model.clone(),
            active_provider: self.resolve_credential().map(|c| c.provider.to_string()),
        }
    }
}
