//! Backend identity

use std::fmt;
use std::str::FromStr;

/// The three store families a batch is replicated into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Backend {
    /// PostgreSQL + pgvector
    Postgres,
    /// Neo4j
    Neo4j,
    /// Elasticsearch
    Elasticsearch,
}

impl Backend {
    pub const ALL: [Backend; 3] = [Backend::Postgres, Backend::Neo4j, Backend::Elasticsearch];

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Postgres => "postgres",
            Backend::Neo4j => "neo4j",
            Backend::Elasticsearch => "elasticsearch",
        }
    }

    /// Role the backend plays in analysis
    pub fn role(&self) -> &'static str {
        match self {
            Backend::Postgres => "relational",
            Backend::Neo4j => "graph",
            Backend::Elasticsearch => "search",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Backend::Postgres),
            "neo4j" => Ok(Backend::Neo4j),
            "elasticsearch" | "es" => Ok(Backend::Elasticsearch),
            other => Err(format!("unknown backend: {}", other)),
        }
    }
}
