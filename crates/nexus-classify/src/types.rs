//! Classifier input and output types.

use serde::{Deserialize, Serialize};

use nexus_store::{TicketStatus, Urgency};

/// Remote LLM provider identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LLMProvider {
    Gemini,
    OpenAI,
    Anthropic,
    Groq,
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::Gemini => write!(f, "gemini"),
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::Anthropic => write!(f, "anthropic"),
            LLMProvider::Groq => write!(f, "groq"),
        }
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(LLMProvider::Gemini),
            "openai" => Ok(LLMProvider::OpenAI),
            "anthropic" => Ok(LLMProvider::Anthropic),
            "groq" => Ok(LLMProvider::Groq),
            other => Err(format!("Unknown provider: {}", other)),
        }
    }
}

/// Everything needed for one remote call.
#[derive(Debug, Clone)]
pub struct Credential {
    pub provider: LLMProvider,
    pub model: String,
    pub api_key: String,
}

/// Screenshot or photo attached to a complaint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    /// MIME type, e.g. `image/png`.
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Input to the remote classifier.
#[derive(Debug, Clone)]
pub struct ClassifyRequest<'a> {
    pub text: &'a str,
    pub channel: &'a str,
    /// Summary of open High/Critical tickets, or "System healthy".
    pub active_incidents: &'a str,
    pub image: Option<&'a ImageAttachment>,
}

/// Structured reading of a complaint, merged into a ticket by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub summary: String,
    pub urgency: Urgency,
    pub department: String,
    pub response: String,
    pub sentiment: String,
    pub rca_hypothesis: String,
    pub slack_draft: String,
    pub is_duplicate: bool,
    /// `Open` normally; `Ignored` for input too short to act on.
    pub status: TicketStatus,
}

/// Which path produced a diagnosis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierSource {
    Remote,
    Fallback,
}
