// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Collection schema and request/response types for the store boundary

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::records::{ConversationRecord, TEXT_VECTOR, TEXT_WITH_METADATA_VECTOR};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Text,
    Int,
    Date,
}

impl DataType {
    pub fn as_weaviate(&self) -> &'static str {
        match self {
            DataType::Text => "text",
            DataType::Int => "int",
            DataType::Date => "date",
        }
    }
}

/// How a text property is indexed for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tokenization {
    /// Split into lowercased words
    Word,
    /// Whole value, verbatim
    Field,
}

impl Tokenization {
    pub fn as_weaviate(&self) -> &'static str {
        match self {
            Tokenization::Word => "word",
            Tokenization::Field => "field",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    pub name: String,
    pub data_type: DataType,
    pub tokenization: Option<Tokenization>,
}

impl PropertySchema {
    fn text(name: &str) -> Self {
        Self {
            name: name.to_string(),
            data_type: DataType::Text,
            tokenization: Some(Tokenization::Word),
        }
    }

    fn of(name: &str, data_type: DataType) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            tokenization: None,
        }
    }
}

/// Store-side module that computes vectors or text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Module name, e.g. `text2vec-cohere`
    pub module: String,
    pub model: Option<String>,
    pub api_endpoint: Option<String>,
}

/// One named vector space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedVectorConfig {
    pub name: String,
    /// Properties concatenated to produce the vector
    pub source_properties: Vec<String>,
    pub dimensions: usize,
    pub vectorizer: ModuleConfig,
}

/// Embedding/generation provider families the collection can be set up with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderPreset {
    Cohere,
    OpenAi,
    Ollama,
}

impl ProviderPreset {
    fn vectorizer(&self) -> (ModuleConfig, usize) {
        match self {
            ProviderPreset::Cohere => (
                ModuleConfig {
                    module: "text2vec-cohere".to_string(),
                    model: Some("embed-multilingual-light-v3.0".to_string()),
                    api_endpoint: None,
                },
                384,
            ),
            ProviderPreset::OpenAi => (
                ModuleConfig {
                    module: "text2vec-openai".to_string(),
                    model: Some("text-embedding-3-small".to_string()),
                    api_endpoint: None,
                },
                1536,
            ),
            ProviderPreset::Ollama => (
                ModuleConfig {
                    module: "text2vec-ollama".to_string(),
                    model: Some("nomic-embed-text".to_string()),
                    api_endpoint: Some("http://host.docker.internal:11434".to_string()),
                },
                768,
            ),
        }
    }

    fn generative(&self) -> ModuleConfig {
        match self {
            ProviderPreset::Cohere => ModuleConfig {
                module: "generative-cohere".to_string(),
                model: Some("command-r".to_string()),
                api_endpoint: None,
            },
            ProviderPreset::OpenAi => ModuleConfig {
                module: "generative-openai".to_string(),
                model: Some("gpt-3.5-turbo-16k".to_string()),
                api_endpoint: None,
            },
            ProviderPreset::Ollama => ModuleConfig {
                module: "generative-ollama".to_string(),
                model: Some("gemma2:2b".to_string()),
                api_endpoint: Some("http://host.docker.internal:11434".to_string()),
            },
        }
    }
}

impl FromStr for ProviderPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cohere" => Ok(ProviderPreset::Cohere),
            "openai" => Ok(ProviderPreset::OpenAi),
            "ollama" => Ok(ProviderPreset::Ollama),
            other => Err(format!(
                "unknown provider '{}', choose from cohere, openai, ollama",
                other
            )),
        }
    }
}

/// Full collection definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionConfig {
    pub name: String,
    pub properties: Vec<PropertySchema>,
    pub vectors: Vec<NamedVectorConfig>,
    pub generative: Option<ModuleConfig>,
    pub multi_tenancy: bool,
}

impl CollectionConfig {
    /// Support-chat collection: four properties and the two named vector
    /// spaces, `text` and `text_with_metadata`
    pub fn support_chat(name: impl Into<String>, preset: ProviderPreset) -> Self {
        let (vectorizer, dimensions) = preset.vectorizer();
        Self::support_chat_with(name, vectorizer, dimensions, Some(preset.generative()))
    }

    pub fn support_chat_with(
        name: impl Into<String>,
        vectorizer: ModuleConfig,
        dimensions: usize,
        generative: Option<ModuleConfig>,
    ) -> Self {
        Self {
            name: name.into(),
            properties: vec![
                PropertySchema::text("text"),
                PropertySchema::of("dialogue_id", DataType::Int),
                PropertySchema::text("company_author"),
                PropertySchema::of("created_at", DataType::Date),
            ],
            vectors: vec![
                NamedVectorConfig {
                    name: TEXT_VECTOR.to_string(),
                    source_properties: vec!["text".to_string()],
                    dimensions,
                    vectorizer: vectorizer.clone(),
                },
                NamedVectorConfig {
                    name: TEXT_WITH_METADATA_VECTOR.to_string(),
                    source_properties: vec!["text".to_string(), "company_author".to_string()],
                    dimensions,
                    vectorizer,
                },
            ],
            generative,
            multi_tenancy: false,
        }
    }

    pub fn vector(&self, name: &str) -> Option<&NamedVectorConfig> {
        self.vectors.iter().find(|v| v.name == name)
    }

    pub fn property(&self, name: &str) -> Option<&PropertySchema> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Tokenization used when filtering on `name`, `Field` if unspecified
    pub fn tokenization(&self, name: &str) -> Tokenization {
        self.property(name)
            .and_then(|p| p.tokenization)
            .unwrap_or(Tokenization::Field)
    }
}

/// Filter expression for queries
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Wildcard match on a text property
    Like { property: String, pattern: String },
}

/// Hybrid (keyword + vector) retrieval request
#[derive(Debug, Clone, PartialEq)]
pub struct HybridQuery {
    pub query: String,
    /// 0.0 = pure keyword, 1.0 = pure vector
    pub alpha: f32,
    pub target_vector: String,
    pub filter: Option<Filter>,
    pub limit: usize,
    /// Instruction for one synthesized answer over the whole result set
    pub grouped_task: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredObject {
    pub record: ConversationRecord,
    pub score: f32,
}

#[derive(Debug, Clone, Default)]
pub struct QueryResponse {
    pub objects: Vec<ScoredObject>,
    pub generated: Option<String>,
    /// Set when a grouped task was requested but generation failed
    pub generation_error: Option<String>,
}

/// Per-object failure inside a batch submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectFailure {
    pub id: Uuid,
    pub message: String,
}

/// Result of one batch submission
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    pub succeeded: Vec<Uuid>,
    pub failed: Vec<ObjectFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopOccurrence {
    pub value: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub name: String,
    pub status: String,
    pub version: Option<String>,
    pub object_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantInfo {
    pub name: String,
    pub activity_status: String,
}
