//! Pipeline configuration
//!
//! Settings come from an optional TOML file; every section has defaults so
//! an empty file (or no file) is valid. Connection targets and credentials
//! can be overridden from the environment:
//!
//! | Variable | Overrides |
//! |---|---|
//! | `DEVTRAIL_PG_URL` | `postgres.url` |
//! | `DEVTRAIL_PG_PASSWORD` | `postgres.password` |
//! | `DEVTRAIL_NEO4J_URI` | `neo4j.uri` |
//! | `DEVTRAIL_NEO4J_PASSWORD` | `neo4j.password` |
//! | `DEVTRAIL_ES_URL` | `elasticsearch.url` |
//! | `DEVTRAIL_ES_PASSWORD` | `elasticsearch.password` |
//! | `DEVTRAIL_EMBEDDING_URL` | `embedding.url` |

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::CoreError;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "devtrail.toml";

/// How per-commit line statistics are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatMode {
    /// Numeric insertions/deletions from the diff
    #[default]
    Exact,
    /// Count `+`/`-` glyphs in the rendered `--stat` bars
    Glyph,
}

impl FromStr for StatMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exact" => Ok(StatMode::Exact),
            "glyph" => Ok(StatMode::Glyph),
            other => Err(CoreError::Config(format!("unknown stat mode: {}", other))),
        }
    }
}

/// Which commit pairs may be linked by a temporal edge in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemporalScope {
    /// Only commits of the same repository
    #[default]
    Repository,
    /// Any two commits, across repositories
    Global,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub extract: ExtractConfig,
    pub postgres: PostgresConfig,
    pub neo4j: Neo4jConfig,
    pub elasticsearch: ElasticsearchConfig,
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Directory whose children are scanned for repositories
    pub root: PathBuf,
    pub since_days: u32,
    pub exclude: BTreeSet<String>,
    pub stat_mode: StatMode,
    /// Interchange file written by extraction and read by imports
    pub output: PathBuf,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("projects"),
            since_days: 14,
            exclude: BTreeSet::new(),
            stat_mode: StatMode::Exact,
            output: PathBuf::from("git_commits_for_import.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PostgresConfig {
    /// Full connection URL; takes precedence over the discrete fields
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// `disable`, `prefer` or `require`
    pub ssl_mode: String,
    pub table: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            database: "claude_mem".to_string(),
            ssl_mode: "prefer".to_string(),
            table: "git_commits".to_string(),
            max_connections: 5,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Neo4jConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connections: usize,
    pub timeout_secs: u64,
    /// Two commits closer than this are linked by `FOLLOWED_BY`
    pub temporal_window_hours: u32,
    pub temporal_scope: TemporalScope,
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: String::new(),
            database: "neo4j".to_string(),
            max_connections: 4,
            timeout_secs: 10,
            temporal_window_hours: 24,
            temporal_scope: TemporalScope::Repository,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ElasticsearchConfig {
    pub url: String,
    /// Index shared with other document content types
    pub index: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Bucket count for terms aggregations
    pub aggregation_size: usize,
    pub timeout_secs: u64,
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
            index: "memory_analysis".to_string(),
            username: None,
            password: None,
            aggregation_size: 1000,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub url: String,
    pub model: String,
    /// Vector length; also sizes the relational embedding column
    pub dims: usize,
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:11434/api/embeddings".to_string(),
            model: "nomic-embed-text".to_string(),
            dims: 768,
            timeout_secs: 30,
        }
    }
}

impl Settings {
    /// Loads settings from `path`, or from [`DEFAULT_CONFIG_FILE`] when it
    /// exists, then applies environment overrides.
    ///
    /// An explicitly given path that does not exist is an error; a missing
    /// default file is not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        };
        settings.apply_env_overrides(|key| std::env::var(key).ok());
        settings.check()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::from_toml_str(&text).with_context(|| format!("Failed to parse config file {:?}", path))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(text).context("Invalid TOML")?;
        Ok(settings)
    }

    /// Overrides connection fields with values returned by `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("DEVTRAIL_PG_URL") {
            self.postgres.url = Some(v);
        }
        if let Some(v) = lookup("DEVTRAIL_PG_PASSWORD") {
            self.postgres.password = v;
        }
        if let Some(v) = lookup("DEVTRAIL_NEO4J_URI") {
            self.neo4j.uri = v;
        }
        if let Some(v) = lookup("DEVTRAIL_NEO4J_PASSWORD") {
            self.neo4j.password = v;
        }
        if let Some(v) = lookup("DEVTRAIL_ES_URL") {
            self.elasticsearch.url = v;
        }
        if let Some(v) = lookup("DEVTRAIL_ES_PASSWORD") {
            self.elasticsearch.password = Some(v);
        }
        if let Some(v) = lookup("DEVTRAIL_EMBEDDING_URL") {
            self.embedding.url = v;
        }
    }

    fn check(&self) -> Result<(), CoreError> {
        if self.embedding.dims == 0 {
            return Err(CoreError::Config("embedding.dims must be positive".to_string()));
        }
        if self.neo4j.temporal_window_hours == 0 {
            return Err(CoreError::Config(
                "neo4j.temporal_window_hours must be positive".to_string(),
            ));
        }
        let table_ok = !self.postgres.table.is_empty()
            && self
                .postgres
                .table
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !table_ok {
            return Err(CoreError::Config(format!(
                "postgres.table must be a plain identifier, got {:?}",
                self.postgres.table
            )));
        }
        Ok(())
    }
}
