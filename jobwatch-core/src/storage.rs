use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::job::{AccessCredential, FeedQuery, Job};

pub const FEEDS_KEY: &str = "feeds";
pub const ACCESS_KEY: &str = "access";
pub const FAVORITES_KEY: &str = "favorites";
pub const TRASH_KEY: &str = "trash";
pub const CACHE_KEY: &str = "cache";
pub const BADGE_KEY: &str = "badge";

/// Key-value store shared by the daemon and the authorization CLI.
///
/// Everything lives in one JSON object. Writes go to `<file>.json.tmp` first and
/// are renamed into place; a corrupted main file falls back to the temp copy.
#[derive(Debug, Clone)]
pub struct Store {
    inner: Arc<RwLock<Map<String, Value>>>,
    path: Option<PathBuf>,
}

impl Store {
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Map::new())),
            path: None,
        }
    }

    pub async fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let data = read_with_tmp_fallback(&path).await;
        Self {
            inner: Arc::new(RwLock::new(data)),
            path: Some(path),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Re-reads the backing file so entries written by other processes become visible.
    pub async fn reload(&self) {
        if let Some(path) = &self.path {
            let data = read_with_tmp_fallback(path).await;
            *self.inner.write().await = data;
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let inner = self.inner.read().await;
        let value = inner.get(key)?.clone();
        drop(inner);
        if value.is_null() {
            return None;
        }
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(key, error = %e, "ignoring malformed store entry");
                None
            }
        }
    }

    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value)?;
        self.inner.write().await.insert(key.to_owned(), value);
        self.persist().await
    }

    async fn persist(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            debug!("store is in-memory only; skipping persist");
            return Ok(());
        };
        let bytes = {
            let inner = self.inner.read().await;
            serde_json::to_vec_pretty(&*inner)?
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    pub async fn feeds(&self) -> Option<FeedQuery> {
        self.get::<FeedQuery>(FEEDS_KEY)
            .await
            .filter(FeedQuery::is_configured)
    }

    pub async fn set_feeds(&self, feeds: &FeedQuery) -> Result<(), StoreError> {
        self.set(FEEDS_KEY, feeds).await
    }

    pub async fn access(&self) -> Option<AccessCredential> {
        self.get::<AccessCredential>(ACCESS_KEY)
            .await
            .filter(AccessCredential::is_present)
    }

    pub async fn set_access(&self, access: &AccessCredential) -> Result<(), StoreError> {
        self.set(ACCESS_KEY, access).await
    }

    pub async fn favorites(&self) -> Vec<Job> {
        self.get(FAVORITES_KEY).await.unwrap_or_default()
    }

    pub async fn trash(&self) -> Vec<Job> {
        self.get(TRASH_KEY).await.unwrap_or_default()
    }

    pub async fn cache(&self) -> Vec<Job> {
        self.get(CACHE_KEY).await.unwrap_or_default()
    }

    pub async fn set_cache(&self, jobs: &[Job]) -> Result<(), StoreError> {
        self.set(CACHE_KEY, jobs).await
    }

    pub async fn badge(&self) -> Option<String> {
        self.get(BADGE_KEY).await
    }

    pub async fn set_badge(&self, text: &str) -> Result<(), StoreError> {
        self.set(BADGE_KEY, text).await
    }
}

async fn read_with_tmp_fallback(path: &Path) -> Map<String, Value> {
    match tokio::fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<Map<String, Value>>(&bytes) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, path = %path.display(), "failed to parse store, trying tmp fallback");
                let tmp = path.with_extension("json.tmp");
                match tokio::fs::read(&tmp).await {
                    Ok(tmp_bytes) => serde_json::from_slice(&tmp_bytes).unwrap_or_default(),
                    Err(_) => Map::new(),
                }
            }
        },
        Err(_) => Map::new(),
    }
}
