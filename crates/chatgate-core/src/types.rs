//! Conversation and backend descriptor types.

use serde::{Deserialize, Serialize};

/// Speaker role in a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// One turn of a conversation. Immutable once created; the ordered
/// sequence of turns forms the history supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Backend vendor identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    Groq,
    OpenAi,
    Anthropic,
    Gemini,
    Cohere,
    /// The ChatGPT web UI, reachable only through browser automation.
    #[serde(rename = "chatgpt-web")]
    ChatGptWeb,
}

impl std::fmt::Display for Vendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Vendor::Groq => write!(f, "groq"),
            Vendor::OpenAi => write!(f, "openai"),
            Vendor::Anthropic => write!(f, "anthropic"),
            Vendor::Gemini => write!(f, "gemini"),
            Vendor::Cohere => write!(f, "cohere"),
            Vendor::ChatGptWeb => write!(f, "chatgpt-web"),
        }
    }
}

/// Pricing/capability tier of a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Standard,
    Light,
}

/// Resolved backend for one logical model key. Constructed once at process
/// start; never mutated. Multiple logical keys may map to the same
/// vendor/model pair (legacy aliasing).
#[derive(Debug, Clone, Serialize)]
pub struct BackendDescriptor {
    pub vendor: Vendor,
    pub model_id: &'static str,
    pub logical_key: &'static str,
    pub tier: ModelTier,
}

impl BackendDescriptor {
    pub fn is_light(&self) -> bool {
        self.tier == ModelTier::Light
    }
}

/// Uniform result of one generation call, whichever channel served it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Whitespace-trimmed reply. May be empty, never absent.
    pub reply_text: String,
    /// The backend model identifier actually used; may differ from the
    /// requested one through fallback.
    pub resolved_model_id: String,
    /// True when the reply was returned before it was confirmed stable
    /// (browser channel hit its stall timeout).
    pub degraded: bool,
}

impl GenerationResult {
    pub fn complete(reply: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            reply_text: reply.into(),
            resolved_model_id: model.into(),
            degraded: false,
        }
    }
}
