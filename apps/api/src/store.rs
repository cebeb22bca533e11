//! Session-keyed storage for the most recent CV analysis.
//!
//! Each session holds at most one analysis; a new write replaces the previous one.
//! Both backends expire entries after the configured TTL.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::{Cache, CacheBuilder};
use redis::aio::MultiplexedConnection;
use thiserror::Error;
use tracing::{debug, info};

use crate::pipeline::schema::CvAnalysis;

/// Session used when a caller does not identify itself.
pub const DEFAULT_SESSION: &str = "default";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait AnalysisStore: Send + Sync {
    async fn get(&self, session: &str) -> Result<Option<CvAnalysis>, StoreError>;
    async fn put(&self, session: &str, analysis: CvAnalysis) -> Result<(), StoreError>;
}

/// Process-local store. Sessions are isolated; writes within a session are last-write-wins.
///
/// Bounded by `capacity` sessions, and each entry expires `ttl` after it was written.
pub struct MemoryAnalysisStore {
    entries: Cache<String, CvAnalysis>,
}

impl MemoryAnalysisStore {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        let entries = CacheBuilder::new(capacity).time_to_live(ttl).build();
        Self { entries }
    }

    #[cfg(test)]
    async fn len(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }
}

#[async_trait]
impl AnalysisStore for MemoryAnalysisStore {
    async fn get(&self, session: &str) -> Result<Option<CvAnalysis>, StoreError> {
        Ok(self.entries.get(session).await)
    }

    async fn put(&self, session: &str, analysis: CvAnalysis) -> Result<(), StoreError> {
        self.entries.insert(session.to_string(), analysis).await;
        debug!("Stored CV analysis for session {session}");
        Ok(())
    }
}

/// Redis-backed store shared across instances. Entries expire after `ttl_secs`.
pub struct RedisAnalysisStore {
    conn: MultiplexedConnection,
    ttl_secs: u64,
}

impl RedisAnalysisStore {
    pub async fn connect(redis_url: &str, ttl_secs: u64) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        info!("Redis analysis store connected");
        Ok(Self { conn, ttl_secs })
    }
}

fn session_key(session: &str) -> String {
    format!("cv_analysis:{session}")
}

#[async_trait]
impl AnalysisStore for RedisAnalysisStore {
    async fn get(&self, session: &str) -> Result<Option<CvAnalysis>, StoreError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("GET")
            .arg(session_key(session))
            .query_async(&mut conn)
            .await?;

        match value {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, session: &str, analysis: CvAnalysis) -> Result<(), StoreError> {
        let json = serde_json::to_string(&analysis)?;

        let mut conn = self.conn.clone();
        redis::cmd("SETEX")
            .arg(session_key(session))
            .arg(self.ttl_secs)
            .arg(json)
            .query_async::<_, ()>(&mut conn)
            .await?;

        debug!("Stored CV analysis for session {session} in Redis");
        Ok(())
    }
}
