use std::sync::Arc;

use crate::config::Config;
use crate::llm::{ChatModel, ProviderChain, ProviderStatus};
use crate::services::{ExplainService, HintService};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Availability snapshot of the configured providers, taken at startup.
    pub providers: Arc<Vec<ProviderStatus>>,
    pub hints: HintService,
    pub explainer: ExplainService,
}

impl AppState {
    pub fn new(config: Config, chain: ProviderChain) -> Self {
        let providers = chain.status();
        let llm: Arc<dyn ChatModel> = Arc::new(chain);
        let hints = HintService::new(Arc::clone(&llm), &config.generation);
        let explainer = ExplainService::new(llm, &config.generation);

        Self {
            config: Arc::new(config),
            providers: Arc::new(providers),
            hints,
            explainer,
        }
    }
}
