use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use crate::cache::store::CacheStore;

/// Facade over the backing store. Values are JSON-encoded on the way in and
/// decoded on the way out; keys share a single flat namespace.
#[derive(Clone)]
pub struct CacheService {
    store: Arc<dyn CacheStore>,
}

impl CacheService {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn CacheStore {
        self.store.as_ref()
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> anyhow::Result<Option<T>> {
        match self.store.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// When `ttl` is omitted the backing store's configured default applies.
    pub async fn set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> anyhow::Result<()> {
        let raw = serde_json::to_string(value)?;
        self.store.set(key, &raw, ttl).await
    }

    pub async fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.store.delete(key).await
    }

    /// Costs one full read; the backing store has no cheaper existence
    /// primitive wired up here.
    pub async fn has(&self, key: &str) -> anyhow::Result<bool> {
        Ok(self.store.get(key).await?.is_some())
    }

    /// Sequential per-key reads; not atomic as a batch.
    pub async fn get_many<T: DeserializeOwned>(
        &self,
        keys: &[String],
    ) -> anyhow::Result<HashMap<String, Option<T>>> {
        let mut result = HashMap::with_capacity(keys.len());
        for key in keys {
            result.insert(key.clone(), self.get(key).await?);
        }
        Ok(result)
    }

    /// Sequential per-key writes; a failure mid-batch leaves earlier keys set.
    pub async fn set_many<T: Serialize>(
        &self,
        entries: &HashMap<String, T>,
        ttl: Option<Duration>,
    ) -> anyhow::Result<()> {
        for (key, value) in entries {
            self.set(key, value, ttl).await?;
        }
        Ok(())
    }

    pub async fn delete_many(&self, keys: &[String]) -> anyhow::Result<()> {
        for key in keys {
            self.delete(key).await?;
        }
        Ok(())
    }

    /// The backing store offers no efficient bulk clear; a full key scan is
    /// deliberately not attempted.
    pub async fn reset(&self) {
        warn!("cache reset is not supported by the backing store");
    }
}
