use std::fmt;

use sea_orm::{DbErr, sqlx};
use thiserror::Error;

use crate::config::ConfigError;

/// The statement an error came from, as printed in log lines.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum QueryKind {
    CreateTable,
    DropTable,
    Insert,
    Update,
    Delete,
    Select,
    Raw(String),
}

impl QueryKind {
    /// Names a raw statement after its leading keyword, e.g. `"truncate t"` is `Truncate`.
    pub fn raw(sql: &str) -> Self {
        let keyword = sql.split_whitespace().next().unwrap_or_default().to_lowercase();
        let mut chars = keyword.chars();
        let name = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => "Raw".to_string(),
        };
        QueryKind::Raw(name)
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKind::CreateTable => f.write_str("CreateTable"),
            QueryKind::DropTable => f.write_str("DropTable"),
            QueryKind::Insert => f.write_str("Insert"),
            QueryKind::Update => f.write_str("Update"),
            QueryKind::Delete => f.write_str("Delete"),
            QueryKind::Select => f.write_str("Select"),
            QueryKind::Raw(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("pool unavailable: {0}")]
    PoolUnavailable(#[from] ConfigError),

    #[error("pool unavailable: invalid connection url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("no connection: {0}")]
    Acquire(#[from] sqlx::Error),

    #[error("no connection: {0}")]
    Connect(#[source] DbErr),

    #[error("{kind}, execution failed: {source}")]
    Query {
        kind: QueryKind,
        #[source]
        source: DbErr,
    },

    #[error("failed to start database runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

impl DbError {
    pub fn query(kind: QueryKind) -> impl FnOnce(DbErr) -> Self {
        move |source| DbError::Query { kind, source }
    }

    pub fn is_pool_unavailable(&self) -> bool {
        matches!(self, DbError::PoolUnavailable(_) | DbError::InvalidUrl { .. })
    }

    /// True for every failure that leaves the session without a connection.
    pub fn is_no_connection(&self) -> bool {
        self.is_pool_unavailable() || matches!(self, DbError::Acquire(_) | DbError::Connect(_))
    }
}

pub type DbResult<T> = Result<T, DbError>;
