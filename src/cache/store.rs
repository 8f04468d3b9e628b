use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use dashmap::DashMap;
use redis::{aio::ConnectionManager, AsyncCommands};
use time::OffsetDateTime;

/// Backing key-value store for the cache service. Values are opaque strings;
/// eviction is entirely the store's concern.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> anyhow::Result<()>;
    async fn delete(&self, key: &str) -> anyhow::Result<()>;
    async fn ping(&self) -> anyhow::Result<()>;
}

/// Redis-backed store sharing one multiplexed connection.
#[derive(Clone)]
pub struct RedisStore {
    con: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(url).context("parse redis url")?;
        let con = ConnectionManager::new(client)
            .await
            .context("connect to redis")?;
        Ok(Self { con })
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let mut con = self.con.clone();
        let value: Option<String> = con.get(key).await.context("redis get")?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> anyhow::Result<()> {
        let mut con = self.con.clone();
        match ttl {
            Some(ttl) => {
                let _: () = con
                    .set_ex(key, value, ttl.as_secs())
                    .await
                    .context("redis set_ex")?;
            }
            None => {
                let _: () = con.set(key, value).await.context("redis set")?;
            }
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        let mut con = self.con.clone();
        let _: () = con.del(key).await.context("redis del")?;
        Ok(())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        let mut con = self.con.clone();
        let reply: String = redis::cmd("PING")
            .query_async(&mut con)
            .await
            .context("redis ping")?;
        anyhow::ensure!(reply == "PONG", "unexpected ping reply: {reply}");
        Ok(())
    }
}

#[derive(Clone)]
struct Entry {
    value: String,
    expires_at: Option<OffsetDateTime>,
}

/// In-memory store with lazy per-entry expiry. Local-dev and test fallback.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        if let Some(entry) = self.entries.get(key) {
            if let Some(expires_at) = entry.expires_at {
                if OffsetDateTime::now_utc() > expires_at {
                    drop(entry);
                    self.entries.remove(key);
                    return Ok(None);
                }
            }
            return Ok(Some(entry.value.clone()));
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> anyhow::Result<()> {
        let entry = Entry {
            value: value.to_string(),
            expires_at: ttl.map(|ttl| OffsetDateTime::now_utc() + ttl),
        };
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
