//! Shared application state.

use std::sync::Arc;

use parking_lot::RwLock;

use chatgate_browser::{BrowserChannel, BrowserConfig, SessionStore};
use chatgate_core::ChatGateConfig;
use chatgate_gateway::Dispatcher;
use chatgate_providers::ProviderConfig;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: ChatGateConfig,
    pub provider_config: Arc<RwLock<ProviderConfig>>,
    pub dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(config: ChatGateConfig) -> Self {
        let provider_config = Arc::new(RwLock::new(ProviderConfig::load(
            &config.data_paths.llm_config_file,
        )));

        let store = SessionStore::new(&config.data_paths.browser_session_file);
        let browser = BrowserChannel::new(BrowserConfig::default(), store);

        let dispatcher = Dispatcher::new(provider_config.clone(), browser);

        Self {
            config,
            provider_config,
            dispatcher,
        }
    }
}
