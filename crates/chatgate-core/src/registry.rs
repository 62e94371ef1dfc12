//! Logical model registry.
//!
//! Maps stable caller-facing keys to concrete vendor/model pairs. The
//! lower half of the table is legacy aliases kept so previously issued
//! keys keep working; removing one breaks any caller that recorded it.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::types::{BackendDescriptor, ModelTier, Vendor};

const DEFAULT_KEY: &str = "grok";

static REGISTRY: Lazy<HashMap<&'static str, BackendDescriptor>> = Lazy::new(|| {
    let mut table = HashMap::new();
    let mut entry = |key, vendor, model_id, tier| {
        table.insert(
            key,
            BackendDescriptor {
                vendor,
                model_id,
                logical_key: key,
                tier,
            },
        );
    };

    // Best model per vendor for normal chat.
    entry("grok", Vendor::Groq, "llama-3.3-70b-versatile", ModelTier::Standard);
    entry("gpt-5", Vendor::OpenAi, "gpt-5", ModelTier::Standard);
    entry("claude-sonnet", Vendor::Anthropic, "claude-3-5-sonnet-20240620", ModelTier::Standard);
    entry("gemini-pro", Vendor::Gemini, "gemini-2.5-pro", ModelTier::Standard);
    entry("cohere-plus", Vendor::Cohere, "command-r-plus", ModelTier::Standard);

    // Browser-automated ChatGPT web session (no API access).
    entry("chatgpt", Vendor::ChatGptWeb, "chatgpt-web", ModelTier::Standard);

    // Legacy / cheap aliases so old chats still work.
    entry("gpt-4o", Vendor::OpenAi, "gpt-4o", ModelTier::Light);
    entry("claude-haiku", Vendor::Anthropic, "claude-3-haiku-20240307", ModelTier::Light);
    entry("gemini-flash", Vendor::Gemini, "gemini-2.5-flash", ModelTier::Light);
    entry("cohere-mini", Vendor::Cohere, "command-r", ModelTier::Light);
    entry("grok-light", Vendor::Groq, "llama-3.3-70b-versatile", ModelTier::Light);

    table
});

/// The descriptor used when a key is unknown or empty.
pub fn default_descriptor() -> &'static BackendDescriptor {
    &REGISTRY[DEFAULT_KEY]
}

/// Resolve a logical key to its backend descriptor. Total: trims and
/// lowercases the key, and falls back to the default for anything
/// unrecognized.
pub fn resolve(logical_key: &str) -> &'static BackendDescriptor {
    let key = logical_key.trim().to_lowercase();
    REGISTRY.get(key.as_str()).unwrap_or_else(default_descriptor)
}

/// All registry entries, primary keys first, for model-picker listings.
pub fn all_descriptors() -> Vec<&'static BackendDescriptor> {
    let mut entries: Vec<_> = REGISTRY.values().collect();
    entries.sort_by_key(|d| (d.tier == ModelTier::Light, d.logical_key));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_key_falls_back_to_default() {
        for key in ["unknown-key-xyz", "", "   ", "gpt-99"] {
            let resolved = resolve(key);
            assert_eq!(resolved.logical_key, "grok");
            assert_eq!(resolved.vendor, Vendor::Groq);
            assert_eq!(resolved.model_id, "llama-3.3-70b-versatile");
        }
    }

    #[test]
    fn test_key_normalization() {
        assert_eq!(resolve("  GPT-5 ").logical_key, "gpt-5");
        assert_eq!(resolve("Claude-Sonnet").vendor, Vendor::Anthropic);
    }

    /// Regression guard: legacy aliases must keep their documented
    /// vendor/model pairs.
    #[test]
    fn test_legacy_aliases_keep_canonical_mapping() {
        let cases = [
            ("gpt-4o", Vendor::OpenAi, "gpt-4o"),
            ("claude-haiku", Vendor::Anthropic, "claude-3-haiku-20240307"),
            ("gemini-flash", Vendor::Gemini, "gemini-2.5-flash"),
            ("cohere-mini", Vendor::Cohere, "command-r"),
            ("grok-light", Vendor::Groq, "llama-3.3-70b-versatile"),
        ];
        for (key, vendor, model) in cases {
            let d = resolve(key);
            assert_eq!(d.vendor, vendor, "alias {} vendor drifted", key);
            assert_eq!(d.model_id, model, "alias {} model drifted", key);
            assert!(d.is_light(), "alias {} lost its light tier", key);
        }
    }

    #[test]
    fn test_aliases_may_share_backends() {
        let primary = resolve("grok");
        let alias = resolve("grok-light");
        assert_eq!(primary.vendor, alias.vendor);
        assert_eq!(primary.model_id, alias.model_id);
        assert_ne!(primary.logical_key, alias.logical_key);
    }

    #[test]
    fn test_browser_vendor_registered() {
        let d = resolve("chatgpt");
        assert_eq!(d.vendor, Vendor::ChatGptWeb);
    }

    #[test]
    fn test_all_descriptors_lists_primaries_first() {
        let all = all_descriptors();
        assert!(!all.is_empty());
        let first_light = all.iter().position(|d| d.is_light()).unwrap();
        assert!(all[..first_light].iter().all(|d| !d.is_light()));
        assert!(all[first_light..].iter().all(|d| d.is_light()));
    }
}
