//! Routes generation calls to the backend a logical key resolves to.

use std::sync::Arc;

use parking_lot::RwLock;
use reqwest::Client;
use tracing::debug;

use chatgate_browser::BrowserChannel;
use chatgate_core::{registry, ConversationTurn, Error, GenerationResult, Result, Vendor};
use chatgate_providers::{adapters, ProviderConfig};

/// Resolves logical keys and invokes the matching channel. Owns the
/// shared HTTP client and the browser channel; constructed once at
/// startup and injected wherever generation is needed.
pub struct Dispatcher {
    client: Client,
    providers: Arc<RwLock<ProviderConfig>>,
    browser: BrowserChannel,
}

impl Dispatcher {
    pub fn new(providers: Arc<RwLock<ProviderConfig>>, browser: BrowserChannel) -> Self {
        Self {
            client: Client::new(),
            providers,
            browser,
        }
    }

    pub fn browser(&self) -> &BrowserChannel {
        &self.browser
    }

    /// Generate a reply for the conversation using the backend the key
    /// resolves to. No retries here — retry policy, where one exists,
    /// lives inside the individual channel.
    pub async fn generate(
        &self,
        logical_key: &str,
        prompt: &str,
        history: &[ConversationTurn],
    ) -> Result<GenerationResult> {
        let descriptor = registry::resolve(logical_key);
        debug!(
            "Resolved '{}' -> {} / {}",
            logical_key, descriptor.vendor, descriptor.model_id
        );

        match descriptor.vendor {
            Vendor::ChatGptWeb => {
                self.browser
                    .generate(descriptor.logical_key, prompt, history)
                    .await
            }
            vendor => {
                let api_key = self
                    .providers
                    .read()
                    .key_for(vendor)
                    .map(str::to_string)
                    .ok_or_else(|| {
                        Error::ConfigurationMissing(format!(
                            "{} not set (required for the {} backend)",
                            ProviderConfig::env_var_for(vendor),
                            vendor
                        ))
                    })?;

                let reply = adapters::generate(
                    &self.client,
                    vendor,
                    &api_key,
                    descriptor.model_id,
                    prompt,
                    history,
                )
                .await?;

                Ok(GenerationResult::complete(reply.reply, reply.model))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatgate_browser::{BrowserConfig, SessionStore};

    fn dispatcher_without_credentials(dir: &std::path::Path) -> Dispatcher {
        // Built from defaults, not from the environment, so the test is
        // hermetic regardless of what keys the host exports.
        let providers = Arc::new(RwLock::new(ProviderConfig::default()));
        let store = SessionStore::new(dir.join("browser-session.json"));
        let browser = BrowserChannel::new(BrowserConfig::default(), store);
        Dispatcher::new(providers, browser)
    }

    #[tokio::test]
    async fn test_unknown_key_routes_to_default_vendor() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = dispatcher_without_credentials(dir.path());

        // The default backend is Groq; with no credential the call fails
        // with an actionable ConfigurationMissing naming the env var.
        let err = dispatcher
            .generate("unknown-key-xyz", "hello", &[])
            .await
            .unwrap_err();
        match err {
            Error::ConfigurationMissing(msg) => {
                assert!(msg.contains("GROQ_API_KEY"));
                assert!(msg.contains("groq"));
            }
            other => panic!("expected ConfigurationMissing, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_browser_key_routes_to_browser_channel() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = dispatcher_without_credentials(dir.path());

        // No persisted session: the browser channel fails fast with the
        // login instruction, proving the route went to the browser.
        let err = dispatcher.generate("chatgpt", "hello", &[]).await.unwrap_err();
        match err {
            Error::ConfigurationMissing(msg) => assert!(msg.contains("chatgate login")),
            other => panic!("expected ConfigurationMissing, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_credential_names_the_vendor_env_var() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = dispatcher_without_credentials(dir.path());

        for (key, env_var) in [
            ("gpt-5", "OPENAI_API_KEY"),
            ("claude-sonnet", "ANTHROPIC_API_KEY"),
            ("gemini-pro", "GOOGLE_API_KEY"),
            ("cohere-plus", "COHERE_API_KEY"),
        ] {
            let err = dispatcher.generate(key, "hi", &[]).await.unwrap_err();
            match err {
                Error::ConfigurationMissing(msg) => {
                    assert!(msg.contains(env_var), "{} missing {}", key, env_var)
                }
                other => panic!("expected ConfigurationMissing, got {:?}", other),
            }
        }
    }
}
