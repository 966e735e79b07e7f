//! Elasticsearch adapter (REST over reqwest)
//!
//! Commits share an index with other document types and are told apart by
//! `content_type = "git_commit"`; clearing only deletes that slice.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use devtrail_core::config::ElasticsearchConfig;
use devtrail_core::{CommitRecord, CommitType};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::{json, Value};

use crate::backend::Backend;
use crate::error::StoreError;
use crate::store::{CommitStore, RepositoryActivity, StoreSummary, UpsertOutcome};

const BACKEND: Backend = Backend::Elasticsearch;

/// Marker value of `content_type` for commit documents
pub const CONTENT_TYPE: &str = "git_commit";

pub struct ElasticsearchStore {
    client: reqwest::Client,
    base_url: String,
    index: String,
    username: Option<String>,
    password: Option<String>,
    aggregation_size: usize,
}

/// Field mapping of commit documents
pub fn commit_mapping() -> Value {
    json!({
        "properties": {
            "content_type": {"type": "keyword"},
            "content": {"type": "text", "analyzer": "standard"},
            "memory_id": {"type": "keyword"},
            "created_at": {"type": "date"},
            "tags": {"type": "keyword"},
            "sentiment": {"type": "keyword"},
            "complexity": {"type": "keyword"},
            "commit_hash": {"type": "keyword"},
            "repository_name": {"type": "keyword"},
            "commit_type": {"type": "keyword"},
            "author_name": {"type": "keyword"},
            "author_email": {"type": "keyword"},
            "files_changed": {"type": "integer"},
            "lines_added": {"type": "integer"},
            "lines_deleted": {"type": "integer"},
            "primary_language": {"type": "keyword"},
            "commit_message": {"type": "text", "analyzer": "standard"}
        }
    })
}

/// Search document for one commit
pub fn commit_document(record: &CommitRecord) -> Value {
    let complexity = if record.commit_type == CommitType::Feature {
        "medium"
    } else {
        "low"
    };
    json!({
        "content_type": CONTENT_TYPE,
        "content": record.search_content(),
        "memory_id": record.memory_id,
        "created_at": record.timestamp.to_rfc3339(),
        "tags": [
            "git-commit",
            record.repository,
            record.commit_type.as_str(),
            format!("language-{}", record.primary_language),
        ],
        "sentiment": "neutral",
        "complexity": complexity,
        "commit_hash": record.hash,
        "repository_name": record.repository,
        "commit_type": record.commit_type.as_str(),
        "author_name": record.author_name,
        "author_email": record.author_email_anonymized,
        "files_changed": record.files_changed,
        "lines_added": record.lines_added,
        "lines_deleted": record.lines_deleted,
        "primary_language": record.primary_language,
        "commit_message": record.message_sanitized,
    })
}

fn marker_query() -> Value {
    json!({"term": {"content_type": CONTENT_TYPE}})
}

/// Aggregation request body for `summary_aggregates`
pub fn aggregation_request(size: usize) -> Value {
    json!({
        "size": 0,
        "query": marker_query(),
        "aggs": {
            "repositories": {
                "terms": {"field": "repository_name", "size": size},
                "aggs": {
                    "lines_added": {"sum": {"field": "lines_added"}},
                    "lines_deleted": {"sum": {"field": "lines_deleted"}}
                }
            },
            "authors": {"terms": {"field": "author_name", "size": size}},
            "languages": {"terms": {"field": "primary_language", "size": size}},
            "commit_types": {"terms": {"field": "commit_type", "size": size}}
        }
    })
}

/// Parsed `aggregations` section of a search response
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ParsedAggregations {
    pub by_repository: BTreeMap<String, RepositoryActivity>,
    pub by_author: BTreeMap<String, u64>,
    pub by_language: BTreeMap<String, u64>,
    pub by_commit_type: BTreeMap<String, u64>,
}

/// Reads the aggregations of an [`aggregation_request`] response.
///
/// Fails when a terms aggregation left documents outside its buckets,
/// since partial buckets would show up as missing keys.
pub fn parse_aggregations(response: &Value) -> Result<ParsedAggregations, String> {
    let aggs = response
        .get("aggregations")
        .ok_or_else(|| "response has no aggregations".to_string())?;

    let mut parsed = ParsedAggregations::default();
    for bucket in buckets(aggs, "repositories")? {
        let (key, commits) = key_and_count(bucket)?;
        parsed.by_repository.insert(
            key,
            RepositoryActivity {
                commits,
                lines_added: sum_value(bucket, "lines_added"),
                lines_deleted: sum_value(bucket, "lines_deleted"),
            },
        );
    }
    for bucket in buckets(aggs, "authors")? {
        let (key, n) = key_and_count(bucket)?;
        parsed.by_author.insert(key, n);
    }
    for bucket in buckets(aggs, "languages")? {
        let (key, n) = key_and_count(bucket)?;
        parsed.by_language.insert(key, n);
    }
    for bucket in buckets(aggs, "commit_types")? {
        let (key, n) = key_and_count(bucket)?;
        parsed.by_commit_type.insert(key, n);
    }
    Ok(parsed)
}

fn buckets<'a>(aggs: &'a Value, name: &str) -> Result<&'a Vec<Value>, String> {
    let agg = aggs
        .get(name)
        .ok_or_else(|| format!("aggregation {} missing", name))?;
    let other = agg
        .get("sum_other_doc_count")
        .and_then(|n| n.as_u64())
        .unwrap_or(0);
    if other > 0 {
        return Err(format!(
            "aggregation {} left {} commits outside its buckets; raise elasticsearch.aggregation_size",
            name, other
        ));
    }
    agg.get("buckets")
        .and_then(|b| b.as_array())
        .ok_or_else(|| format!("aggregation {} has no buckets", name))
}

fn key_and_count(bucket: &Value) -> Result<(String, u64), String> {
    let key = bucket
        .get("key")
        .and_then(|k| k.as_str())
        .ok_or_else(|| "bucket without string key".to_string())?;
    let count = bucket
        .get("doc_count")
        .and_then(|c| c.as_u64())
        .ok_or_else(|| format!("bucket {} without doc_count", key))?;
    Ok((key.to_string(), count))
}

/// Sum aggregations come back as floats
fn sum_value(bucket: &Value, name: &str) -> u64 {
    bucket
        .get(name)
        .and_then(|s| s.get("value"))
        .and_then(|v| v.as_f64())
        .map(|v| v.max(0.0).round() as u64)
        .unwrap_or(0)
}

impl ElasticsearchStore {
    pub async fn connect(config: &ElasticsearchConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::connection(BACKEND, e))?;

        let store = Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            index: config.index.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            aggregation_size: config.aggregation_size,
        };

        let info = store
            .request(Method::GET, "")
            .send()
            .await
            .map_err(|e| StoreError::connection(BACKEND, e))?;
        if !info.status().is_success() {
            return Err(StoreError::connection(
                BACKEND,
                format!("{} returned {}", store.base_url, info.status()),
            ));
        }
        let info: Value = info.json().await.unwrap_or(Value::Null);
        log::info!(
            "Connected to Elasticsearch {}",
            info["version"]["number"].as_str().unwrap_or("(unknown version)")
        );
        Ok(store)
    }

    /// Request against `{base_url}/{path}` with credentials applied.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = if path.is_empty() {
            format!("{}/", self.base_url)
        } else {
            format!("{}/{}", self.base_url, path)
        };
        let builder = self.client.request(method, url);
        match &self.username {
            Some(user) => builder.basic_auth(user, self.password.as_ref()),
            None => builder,
        }
    }

    /// Sends a JSON body and returns the decoded response on 2xx.
    async fn send_json(
        &self,
        method: Method,
        path: &str,
        body: &Value,
    ) -> Result<Value, (Option<StatusCode>, String)> {
        let response = self
            .request(method, path)
            .json(body)
            .send()
            .await
            .map_err(|e| (None, e.to_string()))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| (Some(status), e.to_string()))?;
        if !status.is_success() {
            return Err((Some(status), text));
        }
        serde_json::from_str(&text).map_err(|e| (Some(status), e.to_string()))
    }

    async fn index_exists(&self) -> Result<bool, StoreError> {
        let response = self
            .request(Method::HEAD, &self.index)
            .send()
            .await
            .map_err(|e| StoreError::schema(BACKEND, e))?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            s if s.is_success() => Ok(true),
            s => Err(StoreError::schema(BACKEND, format!("HEAD {} returned {}", self.index, s))),
        }
    }
}

#[async_trait]
impl CommitStore for ElasticsearchStore {
    fn backend(&self) -> Backend {
        BACKEND
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        if !self.index_exists().await? {
            let body = json!({"mappings": commit_mapping()});
            match self.send_json(Method::PUT, &self.index, &body).await {
                Ok(_) => {
                    log::info!("elasticsearch: created index {}", self.index);
                    return Ok(());
                }
                Err((_, text)) if text.contains("resource_already_exists_exception") => {
                    log::warn!("elasticsearch: index {} appeared concurrently", self.index);
                }
                Err((_, text)) => return Err(StoreError::schema(BACKEND, text)),
            }
        }

        let path = format!("{}/_mapping", self.index);
        self.send_json(Method::PUT, &path, &commit_mapping())
            .await
            .map_err(|(_, text)| StoreError::schema(BACKEND, text))?;
        log::info!("elasticsearch: commit mapping applied to {}", self.index);
        Ok(())
    }

    async fn clear_prior_import(&self) -> Result<u64, StoreError> {
        let path = format!("{}/_delete_by_query?refresh=true", self.index);
        let body = json!({"query": marker_query()});
        match self.send_json(Method::POST, &path, &body).await {
            Ok(response) => Ok(response["deleted"].as_u64().unwrap_or(0)),
            Err((Some(StatusCode::NOT_FOUND), _)) => Ok(0),
            Err((_, text)) => Err(StoreError::write(BACKEND, text)),
        }
    }

    async fn upsert_batch(&self, records: &[CommitRecord]) -> Result<UpsertOutcome, StoreError> {
        let mut outcome = UpsertOutcome::default();

        for record in records {
            let path = format!("{}/_doc/{}", self.index, record.memory_id);
            match self.send_json(Method::PUT, &path, &commit_document(record)).await {
                Ok(_) => {
                    outcome.imported += 1;
                    log::debug!("elasticsearch: indexed {}", record.memory_id);
                }
                Err((_, text)) => {
                    log::warn!("elasticsearch: failed to index {}: {}", record.short_hash(), text);
                    outcome.skipped += 1;
                }
            }
        }

        let path = format!("{}/_refresh", self.index);
        self.send_json(Method::POST, &path, &json!({}))
            .await
            .map_err(|(_, text)| StoreError::write(BACKEND, text))?;
        Ok(outcome)
    }

    async fn summary_aggregates(&self) -> Result<StoreSummary, StoreError> {
        let count_path = format!("{}/_count", self.index);
        let count = self
            .send_json(Method::POST, &count_path, &json!({"query": marker_query()}))
            .await
            .map_err(|(_, text)| StoreError::query(BACKEND, text))?;
        let total = count["count"]
            .as_u64()
            .ok_or_else(|| StoreError::query(BACKEND, "count response without count"))?;

        let search_path = format!("{}/_search", self.index);
        let response = self
            .send_json(
                Method::POST,
                &search_path,
                &aggregation_request(self.aggregation_size),
            )
            .await
            .map_err(|(_, text)| StoreError::query(BACKEND, text))?;
        let parsed = parse_aggregations(&response).map_err(|e| StoreError::query(BACKEND, e))?;

        Ok(StoreSummary {
            total,
            by_repository: parsed.by_repository,
            by_author: parsed.by_author,
            by_language: parsed.by_language,
            by_commit_type: parsed.by_commit_type,
            temporal_edges: None,
        })
    }
}
