// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Process-local vector store
//!
//! Mirrors the behaviour of the real backend closely enough to exercise every
//! pipeline offline:
//! - BM25 keyword scoring over `text` and `company_author`
//! - cosine similarity on the target named vector
//! - relative-score fusion weighted by `alpha`
//! - store-side vectorization for objects submitted without vectors
//! - per-object validation failures inside a batch

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::errors::StoreError;
use super::filter::WildcardPattern;
use super::types::{
    BatchOutcome, CollectionConfig, DataType, Filter, HybridQuery, ModuleConfig, NodeInfo,
    ObjectFailure, QueryResponse, ScoredObject, TenantInfo, TopOccurrence,
};
use super::VectorStore;
use crate::embeddings::{cosine_similarity, tokenize, HashingVectorizer, Vectorizer};
use crate::generation::{join_context, rag_prompt, Generator};
use crate::records::{ConversationRecord, RecordProperties};

const BM25_K1: f32 = 1.2;
const BM25_B: f32 = 0.75;

struct MemoryCollection {
    config: CollectionConfig,
    /// Insertion order; re-inserting an id replaces in place
    objects: Vec<ConversationRecord>,
    index: HashMap<Uuid, usize>,
    tenants: Vec<TenantInfo>,
}

impl MemoryCollection {
    fn new(config: CollectionConfig) -> Self {
        Self {
            config,
            objects: Vec::new(),
            index: HashMap::new(),
            tenants: Vec::new(),
        }
    }

    fn upsert(&mut self, record: ConversationRecord) {
        match self.index.get(&record.id) {
            Some(&pos) => self.objects[pos] = record,
            None => {
                self.index.insert(record.id, self.objects.len());
                self.objects.push(record);
            }
        }
    }
}

#[derive(Clone)]
pub struct InMemoryStore {
    collections: Arc<RwLock<HashMap<String, MemoryCollection>>>,
    vectorizer: Arc<dyn Vectorizer>,
    generator: Option<Arc<dyn Generator>>,
}

impl InMemoryStore {
    pub fn new(vectorizer: Arc<dyn Vectorizer>) -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
            vectorizer,
            generator: None,
        }
    }

    /// Attach the generative module used for grouped tasks
    pub fn with_generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Support-chat collection sized for this store's vectorizer
    pub fn support_chat_config(&self, name: &str) -> CollectionConfig {
        CollectionConfig::support_chat_with(
            name,
            ModuleConfig {
                module: "text2vec-hashing".to_string(),
                model: None,
                api_endpoint: None,
            },
            self.vectorizer.dimensions(),
            None,
        )
    }

    /// Register tenants on a multi-tenant collection
    pub async fn add_tenants(&self, collection: &str, names: &[&str]) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let coll = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;
        if !coll.config.multi_tenancy {
            return Err(StoreError::InvalidConfig(format!(
                "multi-tenancy is not enabled for {}",
                collection
            )));
        }
        for name in names {
            coll.tenants.push(TenantInfo {
                name: name.to_string(),
                activity_status: "HOT".to_string(),
            });
        }
        Ok(())
    }

    /// Check an object against the schema and fill in missing vectors
    fn prepare_object(
        &self,
        config: &CollectionConfig,
        mut record: ConversationRecord,
    ) -> Result<ConversationRecord, String> {
        if let Some(name) = record.vectors.keys().find(|n| config.vector(n).is_none()) {
            return Err(format!("unknown vector space '{}'", name));
        }

        for space in &config.vectors {
            match record.vectors.get(&space.name) {
                Some(vector) => {
                    if vector.len() != space.dimensions {
                        return Err(format!(
                            "vector '{}' has {} dimensions, expected {}",
                            space.name,
                            vector.len(),
                            space.dimensions
                        ));
                    }
                    if vector.iter().any(|v| !v.is_finite()) {
                        return Err(format!("vector '{}' contains NaN or Infinity", space.name));
                    }
                }
                None => {
                    if self.vectorizer.dimensions() != space.dimensions {
                        return Err(format!(
                            "no vector supplied for '{}' and the vectorizer produces {}D, expected {}D",
                            space.name,
                            self.vectorizer.dimensions(),
                            space.dimensions
                        ));
                    }
                    let source = space
                        .source_properties
                        .iter()
                        .filter_map(|p| property_text(&record.properties, p))
                        .collect::<Vec<_>>()
                        .join(" ");
                    let vector = self.vectorizer.vectorize(&source);
                    record.vectors.insert(space.name.clone(), vector);
                }
            }
        }
        Ok(record)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(Arc::new(HashingVectorizer::default()))
    }
}

fn property_text(properties: &RecordProperties, name: &str) -> Option<String> {
    match name {
        "text" => Some(properties.text.clone()),
        "company_author" => Some(properties.company_author.clone()),
        "dialogue_id" => Some(properties.dialogue_id.to_string()),
        "created_at" => Some(properties.created_at.to_rfc3339()),
        _ => None,
    }
}

/// Min-max normalise scores into [0, 1]; a flat set maps to 1.0
fn normalize(scores: &[(usize, f32)]) -> HashMap<usize, f32> {
    let min = scores.iter().map(|(_, s)| *s).fold(f32::INFINITY, f32::min);
    let max = scores.iter().map(|(_, s)| *s).fold(f32::NEG_INFINITY, f32::max);
    let range = max - min;
    scores
        .iter()
        .map(|(i, s)| {
            let norm = if range > 0.0 { (s - min) / range } else { 1.0 };
            (*i, norm)
        })
        .collect()
}

/// BM25 over `text` + `company_author`, statistics taken from the whole
/// collection. Only candidates with a positive score are returned.
fn bm25_scores(
    objects: &[ConversationRecord],
    candidates: &[usize],
    terms: &[String],
) -> Vec<(usize, f32)> {
    if terms.is_empty() || objects.is_empty() {
        return Vec::new();
    }

    let docs: Vec<Vec<String>> = objects
        .iter()
        .map(|o| {
            let mut tokens = tokenize(&o.properties.text);
            tokens.extend(tokenize(&o.properties.company_author));
            tokens
        })
        .collect();

    let n = docs.len() as f32;
    let avgdl = docs.iter().map(|d| d.len()).sum::<usize>() as f32 / n;

    let idf: HashMap<&str, f32> = terms
        .iter()
        .map(|term| {
            let df = docs.iter().filter(|d| d.contains(term)).count() as f32;
            let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();
            (term.as_str(), idf)
        })
        .collect();

    candidates
        .iter()
        .filter_map(|&i| {
            let doc = &docs[i];
            let len = doc.len() as f32;
            let score: f32 = terms
                .iter()
                .map(|term| {
                    let tf = doc.iter().filter(|t| *t == term).count() as f32;
                    if tf == 0.0 {
                        return 0.0;
                    }
                    let norm = BM25_K1 * (1.0 - BM25_B + BM25_B * len / avgdl.max(1.0));
                    idf[term.as_str()] * tf * (BM25_K1 + 1.0) / (tf + norm)
                })
                .sum();
            (score > 0.0).then_some((i, score))
        })
        .collect()
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn is_ready(&self) -> Result<bool, StoreError> {
        Ok(true)
    }

    async fn collection_exists(&self, collection: &str) -> Result<bool, StoreError> {
        Ok(self.collections.read().await.contains_key(collection))
    }

    async fn create_collection(&self, config: &CollectionConfig) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        if collections.contains_key(&config.name) {
            return Err(StoreError::CollectionExists(config.name.clone()));
        }
        if config.vectors.iter().any(|v| v.dimensions == 0) {
            return Err(StoreError::InvalidConfig(
                "vector dimensions must be > 0".to_string(),
            ));
        }
        collections.insert(config.name.clone(), MemoryCollection::new(config.clone()));
        Ok(())
    }

    async fn delete_collection(&self, collection: &str) -> Result<(), StoreError> {
        self.collections.write().await.remove(collection);
        Ok(())
    }

    async fn multi_tenancy_enabled(&self, collection: &str) -> Result<bool, StoreError> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .map(|c| c.config.multi_tenancy)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))
    }

    async fn object_exists(&self, collection: &str, id: Uuid) -> Result<bool, StoreError> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .map(|c| c.index.contains_key(&id))
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))
    }

    async fn insert_batch(
        &self,
        collection: &str,
        objects: Vec<ConversationRecord>,
    ) -> Result<BatchOutcome, StoreError> {
        let mut collections = self.collections.write().await;
        let coll = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;

        let mut outcome = BatchOutcome::default();
        for record in objects {
            let id = record.id;
            match self.prepare_object(&coll.config, record) {
                Ok(prepared) => {
                    coll.upsert(prepared);
                    outcome.succeeded.push(id);
                }
                Err(message) => {
                    debug!("Rejected object {}: {}", id, message);
                    outcome.failed.push(ObjectFailure { id, message });
                }
            }
        }
        Ok(outcome)
    }

    async fn hybrid_query(
        &self,
        collection: &str,
        query: &HybridQuery,
    ) -> Result<QueryResponse, StoreError> {
        let objects = {
            let collections = self.collections.read().await;
            let coll = collections
                .get(collection)
                .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;

            let space = coll.config.vector(&query.target_vector).ok_or_else(|| {
                StoreError::Query(format!("unknown target vector '{}'", query.target_vector))
            })?;

            let filter = match &query.filter {
                Some(Filter::Like { property, pattern }) => {
                    let schema = coll.config.property(property).ok_or_else(|| {
                        StoreError::Query(format!("unknown property '{}'", property))
                    })?;
                    if schema.data_type != DataType::Text {
                        return Err(StoreError::Query(format!(
                            "Like filter requires a text property, '{}' is not",
                            property
                        )));
                    }
                    let compiled = WildcardPattern::compile(pattern)
                        .map_err(|e| StoreError::Query(e.to_string()))?;
                    Some((property.clone(), compiled, coll.config.tokenization(property)))
                }
                None => None,
            };

            let candidates: Vec<usize> = coll
                .objects
                .iter()
                .enumerate()
                .filter(|(_, o)| match &filter {
                    Some((property, pattern, tokenization)) => {
                        property_text(&o.properties, property)
                            .map(|v| pattern.matches_property(&v, *tokenization))
                            .unwrap_or(false)
                    }
                    None => true,
                })
                .map(|(i, _)| i)
                .collect();

            let alpha = query.alpha.clamp(0.0, 1.0);
            let mut fused: HashMap<usize, f32> = HashMap::new();

            if alpha < 1.0 {
                let keyword = bm25_scores(&coll.objects, &candidates, &tokenize(&query.query));
                for (i, norm) in normalize(&keyword) {
                    *fused.entry(i).or_insert(0.0) += (1.0 - alpha) * norm;
                }
            }

            if alpha > 0.0 {
                if self.vectorizer.dimensions() != space.dimensions {
                    return Err(StoreError::Query(format!(
                        "query vectorizer produces {}D but '{}' is {}D",
                        self.vectorizer.dimensions(),
                        space.name,
                        space.dimensions
                    )));
                }
                let query_vector = self.vectorizer.vectorize(&query.query);
                let similarity: Vec<(usize, f32)> = candidates
                    .iter()
                    .filter_map(|&i| {
                        coll.objects[i]
                            .vectors
                            .get(&space.name)
                            .map(|v| (i, cosine_similarity(&query_vector, v)))
                    })
                    .collect();
                for (i, norm) in normalize(&similarity) {
                    *fused.entry(i).or_insert(0.0) += alpha * norm;
                }
            }

            let mut ranked: Vec<(usize, f32)> = fused.into_iter().collect();
            ranked.sort_by(|a, b| {
                b.1.partial_cmp(&a.1)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.0.cmp(&b.0))
            });
            ranked.truncate(query.limit);

            ranked
                .into_iter()
                .map(|(i, score)| ScoredObject {
                    record: coll.objects[i].clone(),
                    score,
                })
                .collect::<Vec<_>>()
        };

        let mut response = QueryResponse {
            objects,
            ..Default::default()
        };

        if let Some(task) = &query.grouped_task {
            match &self.generator {
                Some(generator) => {
                    let context = join_context(
                        response
                            .objects
                            .iter()
                            .map(|o| o.record.properties.text.as_str()),
                    );
                    match generator.generate(&rag_prompt(task, &context)).await {
                        Ok(text) => response.generated = Some(text),
                        Err(e) => response.generation_error = Some(e.to_string()),
                    }
                }
                None => {
                    response.generation_error =
                        Some("no generative module configured".to_string());
                }
            }
        }

        Ok(response)
    }

    async fn top_occurrences(
        &self,
        collection: &str,
        property: &str,
        limit: usize,
        min_occurrences: Option<u64>,
    ) -> Result<Vec<TopOccurrence>, StoreError> {
        let collections = self.collections.read().await;
        let coll = collections
            .get(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;
        match coll.config.property(property) {
            Some(schema) if schema.data_type == DataType::Text => {}
            _ => {
                return Err(StoreError::Query(format!(
                    "'{}' is not a text property",
                    property
                )))
            }
        }

        let mut counts: Vec<TopOccurrence> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for object in &coll.objects {
            let Some(value) = property_text(&object.properties, property) else {
                continue;
            };
            match positions.get(&value) {
                Some(&pos) => counts[pos].count += 1,
                None => {
                    positions.insert(value.clone(), counts.len());
                    counts.push(TopOccurrence { value, count: 1 });
                }
            }
        }

        // stable: equal counts keep first-seen order
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        if let Some(min) = min_occurrences {
            counts.retain(|o| o.count >= min);
        }
        counts.truncate(limit);
        Ok(counts)
    }

    async fn total_count(&self, collection: &str) -> Result<u64, StoreError> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .map(|c| c.objects.len() as u64)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))
    }

    async fn nodes(&self) -> Result<Vec<NodeInfo>, StoreError> {
        let collections = self.collections.read().await;
        let object_count = collections.values().map(|c| c.objects.len() as u64).sum();
        Ok(vec![NodeInfo {
            name: "node1".to_string(),
            status: "HEALTHY".to_string(),
            version: Some("in-memory".to_string()),
            object_count: Some(object_count),
        }])
    }

    async fn tenants(&self, collection: &str) -> Result<Vec<TenantInfo>, StoreError> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .map(|c| c.tenants.clone())
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))
    }

    async fn iterate(
        &self,
        collection: &str,
        after: Option<Uuid>,
        page_size: usize,
    ) -> Result<Vec<ConversationRecord>, StoreError> {
        let collections = self.collections.read().await;
        let coll = collections
            .get(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;

        let mut ids: Vec<Uuid> = coll
            .index
            .keys()
            .copied()
            .filter(|id| after.map_or(true, |cursor| *id > cursor))
            .collect();
        ids.sort();
        ids.truncate(page_size);

        Ok(ids
            .into_iter()
            .map(|id| coll.objects[coll.index[&id]].clone())
            .collect())
    }
}
