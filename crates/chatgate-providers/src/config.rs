//! Provider credential persistence and lookup.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use chatgate_core::Vendor;

/// Accepted env var spellings per vendor, canonical name first. Variants
/// exist because previously deployed installations exported them.
const OPENAI_ENV: &[&str] = &["OPENAI_API_KEY", "GPT_API_KEY"];
const GROQ_ENV: &[&str] = &["GROQ_API_KEY", "GROQAPIKEY", "GROQ_APIKEY", "GROQ_KEY", "GSK_KEY"];
const ANTHROPIC_ENV: &[&str] = &["ANTHROPIC_API_KEY", "CLAUDE_API_KEY"];
const GEMINI_ENV: &[&str] = &["GOOGLE_API_KEY", "GEMINI_API_KEY", "GOOGLE_GENAI_API_KEY"];
const COHERE_ENV: &[&str] = &["COHERE_API_KEY"];

fn env_any(names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|n| std::env::var(n).ok().filter(|v| !v.is_empty()))
}

/// Stored provider credentials (persisted to llm-config.json).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub groq_api_key: Option<String>,
    #[serde(default)]
    pub anthropic_api_key: Option<String>,
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default)]
    pub cohere_api_key: Option<String>,
    /// Path to config file for saving.
    #[serde(skip)]
    pub config_path: PathBuf,
}

impl ProviderConfig {
    /// Load config from file, falling back to env vars for absent keys.
    pub fn load(config_path: &Path) -> Self {
        let mut config: ProviderConfig = std::fs::read_to_string(config_path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default();

        config.config_path = config_path.to_path_buf();

        if config.openai_api_key.is_none() {
            config.openai_api_key = env_any(OPENAI_ENV);
        }
        if config.groq_api_key.is_none() {
            config.groq_api_key = env_any(GROQ_ENV);
        }
        if config.anthropic_api_key.is_none() {
            config.anthropic_api_key = env_any(ANTHROPIC_ENV);
        }
        if config.gemini_api_key.is_none() {
            config.gemini_api_key = env_any(GEMINI_ENV);
        }
        if config.cohere_api_key.is_none() {
            config.cohere_api_key = env_any(COHERE_ENV);
        }

        config
    }

    /// Save config to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(&self.config_path, json)?;
        info!("Saved provider config to {}", self.config_path.display());
        Ok(())
    }

    /// Apply an update, merging with existing config.
    pub fn apply_update(&mut self, update: &ProviderConfigUpdate) {
        if let Some(k) = &update.openai_api_key {
            self.openai_api_key = Some(k.clone());
        }
        if let Some(k) = &update.groq_api_key {
            self.groq_api_key = Some(k.clone());
        }
        if let Some(k) = &update.anthropic_api_key {
            self.anthropic_api_key = Some(k.clone());
        }
        if let Some(k) = &update.gemini_api_key {
            self.gemini_api_key = Some(k.clone());
        }
        if let Some(k) = &update.cohere_api_key {
            self.cohere_api_key = Some(k.clone());
        }
    }

    /// The stored credential for an HTTP vendor. None for the browser
    /// vendor, which authenticates through its persisted session instead.
    pub fn key_for(&self, vendor: Vendor) -> Option<&str> {
        match vendor {
            Vendor::OpenAi => self.openai_api_key.as_deref(),
            Vendor::Groq => self.groq_api_key.as_deref(),
            Vendor::Anthropic => self.anthropic_api_key.as_deref(),
            Vendor::Gemini => self.gemini_api_key.as_deref(),
            Vendor::Cohere => self.cohere_api_key.as_deref(),
            Vendor::ChatGptWeb => None,
        }
    }

    /// Canonical env var name for a vendor, used in actionable errors.
    pub fn env_var_for(vendor: Vendor) -> &'static str {
        match vendor {
            Vendor::OpenAi => OPENAI_ENV[0],
            Vendor::Groq => GROQ_ENV[0],
            Vendor::Anthropic => ANTHROPIC_ENV[0],
            Vendor::Gemini => GEMINI_ENV[0],
            Vendor::Cohere => COHERE_ENV[0],
            Vendor::ChatGptWeb => "browser session (run `chatgate login`)",
        }
    }

    /// Build the public config response (no API keys exposed).
    pub fn to_response(&self) -> ProviderConfigResponse {
        ProviderConfigResponse {
            openai_configured: self.openai_api_key.is_some(),
            groq_configured: self.groq_api_key.is_some(),
            anthropic_configured: self.anthropic_api_key.is_some(),
            gemini_configured: self.gemini_api_key.is_some(),
            cohere_configured: self.cohere_api_key.is_some(),
        }
    }
}

/// Credential update request (keys only ever flow inward).
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfigUpdate {
    #[serde(rename = "openaiApiKey")]
    pub openai_api_key: Option<String>,
    #[serde(rename = "groqApiKey")]
    pub groq_api_key: Option<String>,
    #[serde(rename = "anthropicApiKey")]
    pub anthropic_api_key: Option<String>,
    #[serde(rename = "geminiApiKey")]
    pub gemini_api_key: Option<String>,
    #[serde(rename = "cohereApiKey")]
    pub cohere_api_key: Option<String>,
}

/// Masked config response.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderConfigResponse {
    #[serde(rename = "openaiConfigured")]
    pub openai_configured: bool,
    #[serde(rename = "groqConfigured")]
    pub groq_configured: bool,
    #[serde(rename = "anthropicConfigured")]
    pub anthropic_configured: bool,
    #[serde(rename = "geminiConfigured")]
    pub gemini_configured: bool,
    #[serde(rename = "cohereConfigured")]
    pub cohere_configured: bool,
}
