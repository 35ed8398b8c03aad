// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Weaviate REST + GraphQL backend

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use super::errors::StoreError;
use super::types::{
    BatchOutcome, CollectionConfig, Filter, HybridQuery, NodeInfo, ObjectFailure, QueryResponse,
    ScoredObject, TenantInfo, TopOccurrence,
};
use super::VectorStore;
use crate::records::{
    ConversationRecord, NamedVectors, RecordProperties, TEXT_VECTOR, TEXT_WITH_METADATA_VECTOR,
};

const PROPERTY_FIELDS: &str = "text dialogue_id company_author created_at";

pub struct WeaviateStore {
    base_url: String,
    http_client: Client,
}

impl WeaviateStore {
    /// Create a client for the instance at `base_url`.
    ///
    /// `headers` are sent on every request; provider API keys travel this way
    /// (`X-Cohere-Api-Key`, `X-OpenAI-Api-Key`, ...).
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        headers: &[(String, String)],
    ) -> Result<Self, StoreError> {
        let mut default_headers = HeaderMap::new();
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| StoreError::InvalidConfig(format!("header {}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| StoreError::InvalidConfig(format!("header value: {}", e)))?;
            default_headers.insert(name, value);
        }

        let http_client = Client::builder()
            .timeout(timeout)
            .default_headers(default_headers)
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn graphql(&self, query: String) -> Result<Value, StoreError> {
        debug!("GraphQL: {}", query);
        let response = self
            .http_client
            .post(self.url("/v1/graphql"))
            .json(&json!({ "query": query }))
            .send()
            .await?;
        let body: Value = check(response).await?.json().await?;

        if let Some(errors) = body.get("errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                let message = errors
                    .iter()
                    .filter_map(|e| e.get("message").and_then(Value::as_str))
                    .collect::<Vec<_>>()
                    .join("; ");
                return Err(StoreError::Query(message));
            }
        }
        body.get("data")
            .cloned()
            .ok_or_else(|| StoreError::MalformedResponse("missing data".to_string()))
    }

    async fn schema(&self, collection: &str) -> Result<Value, StoreError> {
        let response = self
            .http_client
            .get(self.url(&format!("/v1/schema/{}", collection)))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::CollectionNotFound(collection.to_string()));
        }
        Ok(check(response).await?.json().await?)
    }
}

/// Turn a non-2xx response into `StoreError::Backend`
async fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(StoreError::Backend {
        status: status.as_u16(),
        message,
    })
}

/// Quote a string as a GraphQL string literal
fn quote(value: &str) -> String {
    // JSON string escaping is a valid GraphQL string literal
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

fn schema_body(config: &CollectionConfig) -> Value {
    let properties: Vec<Value> = config
        .properties
        .iter()
        .map(|p| {
            let mut prop = json!({
                "name": p.name,
                "dataType": [p.data_type.as_weaviate()],
            });
            if let Some(tokenization) = p.tokenization {
                prop["tokenization"] = json!(tokenization.as_weaviate());
            }
            prop
        })
        .collect();

    let mut vector_config = Map::new();
    for space in &config.vectors {
        let mut settings = json!({ "properties": space.source_properties });
        if let Some(model) = &space.vectorizer.model {
            settings["model"] = json!(model);
        }
        if let Some(endpoint) = &space.vectorizer.api_endpoint {
            settings["apiEndpoint"] = json!(endpoint);
        }
        let mut vectorizer = Map::new();
        vectorizer.insert(space.vectorizer.module.clone(), settings);
        vector_config.insert(
            space.name.clone(),
            json!({
                "vectorizer": vectorizer,
                "vectorIndexType": "hnsw",
            }),
        );
    }

    let mut body = json!({
        "class": config.name,
        "properties": properties,
        "vectorConfig": vector_config,
        "multiTenancyConfig": { "enabled": config.multi_tenancy },
    });

    if let Some(generative) = &config.generative {
        let mut settings = Map::new();
        if let Some(model) = &generative.model {
            settings.insert("model".to_string(), json!(model));
        }
        if let Some(endpoint) = &generative.api_endpoint {
            settings.insert("apiEndpoint".to_string(), json!(endpoint));
        }
        let mut module_config = Map::new();
        module_config.insert(generative.module.clone(), Value::Object(settings));
        body["moduleConfig"] = Value::Object(module_config);
    }
    body
}

fn object_body(collection: &str, record: &ConversationRecord) -> Value {
    let mut object = json!({
        "class": collection,
        "id": record.id.to_string(),
        "properties": {
            "text": record.properties.text,
            "dialogue_id": record.properties.dialogue_id,
            "company_author": record.properties.company_author,
            "created_at": record.properties.created_at.to_rfc3339(),
        },
    });
    if !record.vectors.is_empty() {
        object["vectors"] = json!(record.vectors);
    }
    object
}

fn hybrid_graphql(collection: &str, query: &HybridQuery) -> String {
    let mut args = format!(
        "hybrid: {{query: {}, alpha: {}, targetVectors: [{}]}}",
        quote(&query.query),
        query.alpha,
        quote(&query.target_vector)
    );
    if let Some(Filter::Like { property, pattern }) = &query.filter {
        args.push_str(&format!(
            ", where: {{path: [{}], operator: Like, valueText: {}}}",
            quote(property),
            quote(pattern)
        ));
    }
    args.push_str(&format!(", limit: {}", query.limit));

    let generate = match &query.grouped_task {
        Some(task) => format!(
            " generate(groupedResult: {{task: {}}}) {{ groupedResult error }}",
            quote(task)
        ),
        None => String::new(),
    };

    format!(
        "{{ Get {{ {}({}) {{ {} _additional {{ id score vectors {{ {} {} }}{} }} }} }} }}",
        collection, args, PROPERTY_FIELDS, TEXT_VECTOR, TEXT_WITH_METADATA_VECTOR, generate
    )
}

fn parse_properties(value: &Value) -> Result<RecordProperties, StoreError> {
    let text_field = |name: &str| -> Result<String, StoreError> {
        value
            .get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| StoreError::MalformedResponse(format!("missing property {}", name)))
    };

    // ints come back as floats through GraphQL
    let dialogue_id = value
        .get("dialogue_id")
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
        .ok_or_else(|| StoreError::MalformedResponse("missing property dialogue_id".to_string()))?;

    let raw_created = text_field("created_at")?;
    let created_at = DateTime::parse_from_rfc3339(&raw_created)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::MalformedResponse(format!("created_at {}: {}", raw_created, e)))?;

    Ok(RecordProperties {
        text: text_field("text")?,
        dialogue_id,
        company_author: text_field("company_author")?,
        created_at,
    })
}

fn parse_id(value: Option<&Value>) -> Result<Uuid, StoreError> {
    value
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| StoreError::MalformedResponse("missing or invalid id".to_string()))
}

fn parse_vectors(value: Option<&Value>) -> NamedVectors {
    let mut vectors = NamedVectors::new();
    if let Some(map) = value.and_then(Value::as_object) {
        for (name, v) in map {
            if let Some(items) = v.as_array() {
                let vector = items
                    .iter()
                    .filter_map(Value::as_f64)
                    .map(|f| f as f32)
                    .collect();
                vectors.insert(name.clone(), vector);
            }
        }
    }
    vectors
}

fn parse_hybrid_response(data: &Value, collection: &str) -> Result<QueryResponse, StoreError> {
    let hits = data
        .get("Get")
        .and_then(|g| g.get(collection))
        .and_then(Value::as_array)
        .ok_or_else(|| StoreError::MalformedResponse("missing Get result".to_string()))?;

    let mut response = QueryResponse::default();
    for hit in hits {
        let additional = hit.get("_additional").unwrap_or(&Value::Null);
        let id = parse_id(additional.get("id"))?;
        let score = match additional.get("score") {
            Some(Value::String(s)) => s.parse::<f32>().unwrap_or(0.0),
            Some(v) => v.as_f64().unwrap_or(0.0) as f32,
            None => 0.0,
        };

        if let Some(generate) = additional.get("generate").filter(|g| !g.is_null()) {
            if let Some(text) = generate.get("groupedResult").and_then(Value::as_str) {
                response.generated.get_or_insert_with(|| text.to_string());
            }
            if let Some(error) = generate.get("error").and_then(Value::as_str) {
                response.generation_error.get_or_insert_with(|| error.to_string());
            }
        }

        response.objects.push(ScoredObject {
            record: ConversationRecord {
                id,
                properties: parse_properties(hit)?,
                vectors: parse_vectors(additional.get("vectors")),
            },
            score,
        });
    }
    Ok(response)
}

fn parse_batch_response(body: &Value) -> Result<BatchOutcome, StoreError> {
    let items = body
        .as_array()
        .ok_or_else(|| StoreError::MalformedResponse("batch response is not a list".to_string()))?;

    let mut outcome = BatchOutcome::default();
    for item in items {
        let id = parse_id(item.get("id"))?;
        let errors: Vec<&str> = item
            .pointer("/result/errors/error")
            .and_then(Value::as_array)
            .map(|errs| {
                errs.iter()
                    .filter_map(|e| e.get("message").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default();

        if errors.is_empty() {
            outcome.succeeded.push(id);
        } else {
            outcome.failed.push(ObjectFailure {
                id,
                message: errors.join("; "),
            });
        }
    }
    Ok(outcome)
}

#[async_trait]
impl VectorStore for WeaviateStore {
    async fn is_ready(&self) -> Result<bool, StoreError> {
        let response = self
            .http_client
            .get(self.url("/v1/.well-known/ready"))
            .send()
            .await?;
        Ok(response.status().is_success())
    }

    async fn collection_exists(&self, collection: &str) -> Result<bool, StoreError> {
        match self.schema(collection).await {
            Ok(_) => Ok(true),
            Err(StoreError::CollectionNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn create_collection(&self, config: &CollectionConfig) -> Result<(), StoreError> {
        if self.collection_exists(&config.name).await? {
            return Err(StoreError::CollectionExists(config.name.clone()));
        }
        let response = self
            .http_client
            .post(self.url("/v1/schema"))
            .json(&schema_body(config))
            .send()
            .await?;
        check(response).await?;
        info!("Created collection {}", config.name);
        Ok(())
    }

    async fn delete_collection(&self, collection: &str) -> Result<(), StoreError> {
        let response = self
            .http_client
            .delete(self.url(&format!("/v1/schema/{}", collection)))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        check(response).await?;
        info!("Deleted collection {}", collection);
        Ok(())
    }

    async fn multi_tenancy_enabled(&self, collection: &str) -> Result<bool, StoreError> {
        let schema = self.schema(collection).await?;
        Ok(schema
            .pointer("/multiTenancyConfig/enabled")
            .and_then(Value::as_bool)
            .unwrap_or(false))
    }

    async fn object_exists(&self, collection: &str, id: Uuid) -> Result<bool, StoreError> {
        let response = self
            .http_client
            .head(self.url(&format!("/v1/objects/{}/{}", collection, id)))
            .send()
            .await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            s if s.is_success() => Ok(true),
            _ => check(response).await.map(|_| false),
        }
    }

    async fn insert_batch(
        &self,
        collection: &str,
        objects: Vec<ConversationRecord>,
    ) -> Result<BatchOutcome, StoreError> {
        if objects.is_empty() {
            return Ok(BatchOutcome::default());
        }
        let body: Vec<Value> = objects.iter().map(|o| object_body(collection, o)).collect();
        let response = self
            .http_client
            .post(self.url("/v1/batch/objects"))
            .json(&json!({ "objects": body }))
            .send()
            .await?;
        let result: Value = check(response).await?.json().await?;
        parse_batch_response(&result)
    }

    async fn hybrid_query(
        &self,
        collection: &str,
        query: &HybridQuery,
    ) -> Result<QueryResponse, StoreError> {
        let data = self.graphql(hybrid_graphql(collection, query)).await?;
        parse_hybrid_response(&data, collection)
    }

    async fn top_occurrences(
        &self,
        collection: &str,
        property: &str,
        limit: usize,
        min_occurrences: Option<u64>,
    ) -> Result<Vec<TopOccurrence>, StoreError> {
        let query = format!(
            "{{ Aggregate {{ {} {{ {} {{ topOccurrences(limit: {}) {{ value occurs }} }} }} }} }}",
            collection, property, limit
        );
        let data = self.graphql(query).await?;
        let entries = data
            .pointer(&format!("/Aggregate/{}/0/{}/topOccurrences", collection, property))
            .and_then(Value::as_array)
            .ok_or_else(|| StoreError::MalformedResponse("missing topOccurrences".to_string()))?;

        let mut occurrences: Vec<TopOccurrence> = entries
            .iter()
            .filter_map(|e| {
                Some(TopOccurrence {
                    value: e.get("value")?.as_str()?.to_string(),
                    count: e.get("occurs")?.as_u64()?,
                })
            })
            .collect();
        if let Some(min) = min_occurrences {
            occurrences.retain(|o| o.count >= min);
        }
        Ok(occurrences)
    }

    async fn total_count(&self, collection: &str) -> Result<u64, StoreError> {
        let query = format!("{{ Aggregate {{ {} {{ meta {{ count }} }} }} }}", collection);
        let data = self.graphql(query).await?;
        data.pointer(&format!("/Aggregate/{}/0/meta/count", collection))
            .and_then(Value::as_u64)
            .ok_or_else(|| StoreError::MalformedResponse("missing meta count".to_string()))
    }

    async fn nodes(&self) -> Result<Vec<NodeInfo>, StoreError> {
        let response = self
            .http_client
            .get(self.url("/v1/nodes?output=verbose"))
            .send()
            .await?;
        let body: Value = check(response).await?.json().await?;
        let nodes = body
            .get("nodes")
            .and_then(Value::as_array)
            .ok_or_else(|| StoreError::MalformedResponse("missing nodes".to_string()))?;

        Ok(nodes
            .iter()
            .map(|n| NodeInfo {
                name: n.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
                status: n.get("status").and_then(Value::as_str).unwrap_or("UNKNOWN").to_string(),
                version: n.get("version").and_then(Value::as_str).map(str::to_string),
                object_count: n.pointer("/stats/objectCount").and_then(Value::as_u64),
            })
            .collect())
    }

    async fn tenants(&self, collection: &str) -> Result<Vec<TenantInfo>, StoreError> {
        let response = self
            .http_client
            .get(self.url(&format!("/v1/schema/{}/tenants", collection)))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::CollectionNotFound(collection.to_string()));
        }
        let body: Value = check(response).await?.json().await?;
        let tenants = body
            .as_array()
            .ok_or_else(|| StoreError::MalformedResponse("tenants is not a list".to_string()))?;

        Ok(tenants
            .iter()
            .filter_map(|t| {
                Some(TenantInfo {
                    name: t.get("name")?.as_str()?.to_string(),
                    activity_status: t
                        .get("activityStatus")
                        .and_then(Value::as_str)
                        .unwrap_or("HOT")
                        .to_string(),
                })
            })
            .collect())
    }

    async fn iterate(
        &self,
        collection: &str,
        after: Option<Uuid>,
        page_size: usize,
    ) -> Result<Vec<ConversationRecord>, StoreError> {
        let mut url = format!(
            "/v1/objects?class={}&limit={}&include=vector",
            collection, page_size
        );
        if let Some(cursor) = after {
            url.push_str(&format!("&after={}", cursor));
        }
        let response = self.http_client.get(self.url(&url)).send().await?;
        let body: Value = check(response).await?.json().await?;

        let objects = body
            .get("objects")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        objects
            .iter()
            .map(|o| {
                Ok(ConversationRecord {
                    id: parse_id(o.get("id"))?,
                    properties: parse_properties(o.get("properties").unwrap_or(&Value::Null))?,
                    vectors: parse_vectors(o.get("vectors")),
                })
            })
            .collect()
    }
}
