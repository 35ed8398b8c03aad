// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Store bootstrap shared by the dashboard and the CLI

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{AppConfig, GenerationProvider, GenerationSettings, ProviderCredentials, StoreBackend};
use crate::errors::CoreError;
use crate::generation::{anthropic, ollama, AnthropicGenerator, Generator, OllamaGenerator};
use crate::ingest::{IngestEngine, IngestOptions, IngestReport};
use crate::query::SearchService;
use crate::records::JsonlSource;
use crate::store::{CollectionConfig, InMemoryStore, VectorStore, WeaviateStore};

/// Client-side generator for stores without a generative module
pub fn build_generator(
    settings: &GenerationSettings,
    credentials: &ProviderCredentials,
) -> Option<Arc<dyn Generator>> {
    let built: Result<Arc<dyn Generator>, _> = match settings.provider {
        GenerationProvider::None => return None,
        GenerationProvider::Anthropic => AnthropicGenerator::new(
            credentials.anthropic_api_key.clone().unwrap_or_default(),
            settings.model.as_deref().unwrap_or(anthropic::DEFAULT_MODEL),
        )
        .map(|g| Arc::new(g) as Arc<dyn Generator>),
        GenerationProvider::Ollama => OllamaGenerator::new(
            settings.ollama_endpoint.as_str(),
            settings.model.as_deref().unwrap_or(ollama::DEFAULT_MODEL),
        )
        .map(|g| Arc::new(g) as Arc<dyn Generator>),
    };

    match built {
        Ok(generator) => Some(generator),
        Err(e) => {
            warn!("Generation disabled: {}", e);
            None
        }
    }
}

/// A connected store plus everything derived from the configuration
pub struct App {
    pub config: AppConfig,
    pub store: Arc<dyn VectorStore>,
    memory: Option<InMemoryStore>,
    /// Result of loading `SEED_PATH` into the memory backend
    pub seed_report: Option<IngestReport>,
}

impl App {
    /// Connect to the configured backend. The memory backend also gets its
    /// collection created and seeded.
    pub async fn bootstrap(config: AppConfig) -> Result<Self, CoreError> {
        match config.store.backend {
            StoreBackend::Weaviate => {
                let store = WeaviateStore::new(
                    &config.store.url,
                    config.store.timeout,
                    &config.credentials.headers(),
                )
                .map_err(|e| CoreError::backend("connect", e))?;
                info!("Using Weaviate at {}", config.store.url);

                Ok(Self {
                    config,
                    store: Arc::new(store),
                    memory: None,
                    seed_report: None,
                })
            }
            StoreBackend::Memory => {
                let mut memory = InMemoryStore::default();
                if let Some(generator) = build_generator(&config.generation, &config.credentials) {
                    memory = memory.with_generator(generator);
                }
                let store: Arc<dyn VectorStore> = Arc::new(memory.clone());
                let mut app = Self {
                    config,
                    store,
                    memory: Some(memory),
                    seed_report: None,
                };
                info!("Using in-memory store");

                app.store
                    .create_collection(&app.collection_config())
                    .await
                    .map_err(|e| CoreError::backend("create_collection", e))?;

                if let Some(path) = app.config.store.seed_path.clone() {
                    info!("Seeding {} from {}", app.config.store.collection, path.display());
                    let rows = JsonlSource::open(&path)?;
                    let report = app
                        .ingest_engine()
                        .ingest_iter(rows, IngestOptions::fixed_size(&app.config.ingest))
                        .await?;
                    info!(
                        "Seeded {} records ({} skipped)",
                        report.submitted, report.skipped
                    );
                    app.seed_report = Some(report);
                }
                Ok(app)
            }
        }
    }

    pub fn collection(&self) -> &str {
        &self.config.store.collection
    }

    /// Schema for the configured collection on the active backend
    pub fn collection_config(&self) -> CollectionConfig {
        match &self.memory {
            Some(memory) => memory.support_chat_config(&self.config.store.collection),
            None => CollectionConfig::support_chat(
                self.config.store.collection.as_str(),
                self.config.store.preset,
            ),
        }
    }

    pub fn search_service(&self) -> SearchService {
        SearchService::new(
            self.store.clone(),
            self.config.store.collection.as_str(),
            self.config.query.clone(),
        )
    }

    pub fn ingest_engine(&self) -> IngestEngine {
        IngestEngine::new(self.store.clone(), self.config.store.collection.as_str())
    }
}
