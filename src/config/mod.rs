// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Application configuration
//!
//! Loaded once by the binaries from environment variables (after `.env` is
//! applied) and passed explicitly into the store, services and poller.
//! Library code never reads the environment itself.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::records::TEXT_WITH_METADATA_VECTOR;
use crate::store::ProviderPreset;

/// Which store implementation the binaries talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Weaviate,
    /// Process-local store, optionally seeded from a JSONL file
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "weaviate" => Ok(StoreBackend::Weaviate),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    pub url: String,
    pub collection: String,
    pub timeout: Duration,
    /// Embedding/generation modules used when creating the collection
    pub preset: ProviderPreset,
    /// JSONL rows loaded into the memory backend at startup
    pub seed_path: Option<PathBuf>,
}

/// Provider API keys, forwarded to the store as request headers
#[derive(Debug, Clone, Default)]
pub struct ProviderCredentials {
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub cohere_api_key: Option<String>,
}

impl ProviderCredentials {
    /// `X-<Provider>-Api-Key` headers for every configured key
    pub fn headers(&self) -> Vec<(String, String)> {
        [
            ("X-Anthropic-Api-Key", &self.anthropic_api_key),
            ("X-OpenAI-Api-Key", &self.openai_api_key),
            ("X-Cohere-Api-Key", &self.cohere_api_key),
        ]
        .into_iter()
        .filter_map(|(name, key)| {
            key.as_ref()
                .filter(|k| !k.is_empty())
                .map(|k| (name.to_string(), k.clone()))
        })
        .collect()
    }
}

/// Client-side generator for the memory backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationProvider {
    None,
    Anthropic,
    Ollama,
}

impl FromStr for GenerationProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "" => Ok(GenerationProvider::None),
            "anthropic" | "claude" => Ok(GenerationProvider::Anthropic),
            "ollama" => Ok(GenerationProvider::Ollama),
            other => Err(format!("unknown generation provider '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub provider: GenerationProvider,
    /// Overrides the provider's default model
    pub model: Option<String>,
    pub ollama_endpoint: String,
}

#[derive(Debug, Clone)]
pub struct IngestSettings {
    pub batch_size: usize,
    pub requests_per_minute: u32,
    pub max_objects: usize,
    pub max_text_length: usize,
}

#[derive(Debug, Clone)]
pub struct QuerySettings {
    pub default_limit: usize,
    /// Bounded wait for grouped generation
    pub generation_timeout: Duration,
    pub target_vector: String,
}

#[derive(Debug, Clone)]
pub struct PollerSettings {
    pub interval: Duration,
    pub capacity: usize,
    pub pprof_url: String,
    pub pprof_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub bind_address: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreSettings,
    pub credentials: ProviderCredentials,
    pub generation: GenerationSettings,
    pub ingest: IngestSettings,
    pub query: QuerySettings,
    pub poller: PollerSettings,
    pub server: ServerSettings,
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|e| {
            warn!("Ignoring {}={:?}: {}", key, raw, e);
            default
        }),
        Err(_) => default,
    }
}

fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            store: StoreSettings {
                backend: env_parse("STORE_BACKEND", defaults.store.backend),
                url: env_string("WEAVIATE_URL", &defaults.store.url),
                collection: env_string("COLLECTION_NAME", &defaults.store.collection),
                timeout: Duration::from_secs(env_parse(
                    "WEAVIATE_TIMEOUT_SECS",
                    defaults.store.timeout.as_secs(),
                )),
                preset: env_parse("EMBEDDING_PROVIDER", defaults.store.preset),
                seed_path: env::var("SEED_PATH").ok().map(PathBuf::from),
            },
            credentials: ProviderCredentials {
                anthropic_api_key: env::var("ANTHROPIC_API_KEY").ok(),
                openai_api_key: env::var("OPENAI_API_KEY").ok(),
                cohere_api_key: env::var("COHERE_API_KEY").ok(),
            },
            generation: GenerationSettings {
                provider: env_parse("GENERATION_PROVIDER", defaults.generation.provider),
                model: env::var("GENERATION_MODEL").ok(),
                ollama_endpoint: env_string("OLLAMA_ENDPOINT", &defaults.generation.ollama_endpoint),
            },
            ingest: IngestSettings {
                batch_size: env_parse("INGEST_BATCH_SIZE", defaults.ingest.batch_size),
                requests_per_minute: env_parse(
                    "INGEST_REQUESTS_PER_MINUTE",
                    defaults.ingest.requests_per_minute,
                ),
                max_objects: env_parse("INGEST_MAX_OBJECTS", defaults.ingest.max_objects),
                max_text_length: env_parse(
                    "INGEST_MAX_TEXT_LENGTH",
                    defaults.ingest.max_text_length,
                ),
            },
            query: QuerySettings {
                default_limit: env_parse("QUERY_DEFAULT_LIMIT", defaults.query.default_limit),
                generation_timeout: Duration::from_secs(env_parse(
                    "GENERATION_TIMEOUT_SECS",
                    defaults.query.generation_timeout.as_secs(),
                )),
                target_vector: defaults.query.target_vector,
            },
            poller: PollerSettings {
                interval: Duration::from_secs(env_parse(
                    "POLL_INTERVAL_SECS",
                    defaults.poller.interval.as_secs(),
                )),
                capacity: defaults.poller.capacity,
                pprof_url: env_string("PPROF_HEAP_URL", &defaults.poller.pprof_url),
                pprof_timeout: defaults.poller.pprof_timeout,
            },
            server: ServerSettings {
                bind_address: env_string("DASHBOARD_ADDR", &defaults.server.bind_address),
            },
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.store.collection.is_empty() {
            return Err("Collection name must not be empty".to_string());
        }
        if self.ingest.batch_size == 0 {
            return Err("Batch size must be greater than 0".to_string());
        }
        if self.ingest.requests_per_minute == 0 {
            return Err("Requests per minute must be greater than 0".to_string());
        }
        if self.ingest.max_text_length == 0 {
            return Err("Max text length must be greater than 0".to_string());
        }
        if !(1..=20).contains(&self.query.default_limit) {
            return Err("Default query limit must be between 1 and 20".to_string());
        }
        if self.poller.interval.is_zero() {
            return Err("Poll interval must be greater than 0".to_string());
        }
        if self.poller.capacity == 0 {
            return Err("Poller capacity must be greater than 0".to_string());
        }
        if self.generation.provider == GenerationProvider::Anthropic
            && self.credentials.anthropic_api_key.is_none()
        {
            return Err("GENERATION_PROVIDER=anthropic requires ANTHROPIC_API_KEY".to_string());
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreSettings {
                backend: StoreBackend::Weaviate,
                url: "http://localhost:8080".to_string(),
                collection: "SupportChat".to_string(),
                timeout: Duration::from_secs(60),
                preset: ProviderPreset::Cohere,
                seed_path: None,
            },
            credentials: ProviderCredentials::default(),
            generation: GenerationSettings {
                provider: GenerationProvider::None,
                model: None,
                ollama_endpoint: "http://localhost:11434".to_string(),
            },
            ingest: IngestSettings {
                batch_size: 200,
                requests_per_minute: 4800,
                max_objects: 200_000,
                max_text_length: 8000,
            },
            query: QuerySettings {
                default_limit: 5,
                generation_timeout: Duration::from_secs(30),
                target_vector: TEXT_WITH_METADATA_VECTOR.to_string(),
            },
            poller: PollerSettings {
                interval: Duration::from_secs(2),
                capacity: 50,
                pprof_url: "http://localhost:6060/debug/pprof/heap".to_string(),
                pprof_timeout: Duration::from_secs(10),
            },
            server: ServerSettings {
                bind_address: "127.0.0.1:8501".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.store.collection, "SupportChat");
        assert_eq!(config.ingest.batch_size, 200);
        assert_eq!(config.ingest.requests_per_minute, 4800);
        assert_eq!(config.ingest.max_text_length, 8000);
        assert_eq!(config.poller.capacity, 50);
        assert_eq!(config.query.target_vector, "text_with_metadata");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_headers_only_for_present_keys() {
        let credentials = ProviderCredentials {
            cohere_api_key: Some("co-key".to_string()),
            openai_api_key: Some(String::new()),
            ..Default::default()
        };
        let headers = credentials.headers();
        assert_eq!(headers, vec![("X-Cohere-Api-Key".to_string(), "co-key".to_string())]);
    }

    #[test]
    fn test_validation_zero_batch() {
        let mut config = AppConfig::default();
        config.ingest.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_default_limit_range() {
        let mut config = AppConfig::default();
        config.query.default_limit = 21;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_anthropic_needs_key() {
        let mut config = AppConfig::default();
        config.generation.provider = GenerationProvider::Anthropic;
        assert!(config.validate().is_err());
        config.credentials.anthropic_api_key = Some("sk".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!("Memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert!("sqlite".parse::<StoreBackend>().is_err());
    }
}
