use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::config::Config;
use crate::conversation::engine::{Collaborators, EngineSettings};
use crate::conversation::registry::SessionRegistry;
use crate::llm_client::{self, LlmClient};
use crate::questions::backend::Backend;
use crate::questions::selector::MIN_QUESTIONS;
use crate::sentiment::LexiconSentimentScorer;
use crate::storage::LocalJsonStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Live sessions. Each session picks up the backend, scorer and store the
    /// registry was built with.
    pub registry: SessionRegistry,
    pub config: Config,
}

impl AppState {
    pub fn from_config(config: Config) -> Result<Self> {
        let backend = match &config.anthropic_api_key {
            Some(key) => {
                let llm = LlmClient::new(key.clone(), config.llm_api_url.clone())?
                    .with_max_retries(config.llm_max_retries);
                info!("LLM client initialized (model: {})", llm_client::MODEL);
                Backend::Generative(Arc::new(llm))
            }
            None => {
                info!("ANTHROPIC_API_KEY not set; sessions run rule-based");
                Backend::RuleBased
            }
        };

        let store = LocalJsonStore::new(config.data_dir.clone());
        info!("Transcripts for consenting candidates go to {}", store.base_dir().display());

        let deps = Collaborators {
            backend,
            sentiment: Arc::new(LexiconSentimentScorer),
            store: Arc::new(store),
            settings: EngineSettings {
                min_questions: MIN_QUESTIONS,
                max_questions: config.question_count,
                backend_timeout: config.llm_timeout,
                sentiment_timeout: config.sentiment_timeout,
            },
        };

        Ok(AppState {
            registry: SessionRegistry::new(deps),
            config,
        })
    }
}
