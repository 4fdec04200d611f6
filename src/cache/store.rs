use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{debug, warn};

use super::keys::Bucket;
use crate::error::Result;
use crate::models::{LibraryId, ShowId};

/// Normalizes a server URL (lowercase, trailing slashes stripped) and
/// truncates its SHA-256 digest to 6 hex bytes, for cache-directory
/// namespacing (spec §4.2/§6.2).
pub fn server_cache_prefix(server_url: &str) -> String {
    let normalized = server_url.trim_end_matches('/').to_ascii_lowercase();
    let digest = Sha256::digest(normalized.as_bytes());
    digest.iter().take(6).map(|b| format!("{b:02x}")).collect()
}

/// Persistent hierarchical key-value cache with a write-through in-memory
/// hot layer (spec §4.2). One store instance is scoped to one server.
pub struct CacheStore {
    pool: Option<SqlitePool>,
    hot: RwLock<HashMap<(String, String), String>>,
}

impl CacheStore {
    /// Opens (creating if absent) the sqlite-backed store at
    /// `<cache_root>/<server_prefix>/store.db`. `cache_root = None` runs in
    /// memory-only mode: no persistence, same in-process behavior.
    pub async fn open(cache_root: Option<&Path>, server_url: &str) -> Result<Self> {
        let Some(root) = cache_root else {
            return Ok(Self {
                pool: None,
                hot: RwLock::new(HashMap::new()),
            });
        };

        let dir = root.join(server_cache_prefix(server_url));
        std::fs::create_dir_all(&dir)
            .map_err(|e| crate::error::KinoError::Cache(format!("failed to create cache dir: {e}")))?;
        cleanup_legacy_json(&dir);

        let db_path = dir.join("store.db");
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().max_connections(4).connect_with(options).await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cache_entries (
                bucket TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (bucket, key)
            )
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self {
            pool: Some(pool),
            hot: RwLock::new(HashMap::new()),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            pool: None,
            hot: RwLock::new(HashMap::new()),
        }
    }

    fn hot_key(bucket: Bucket, key: &str) -> (String, String) {
        (bucket.as_str().to_string(), key.to_string())
    }

    /// Returns the deserialized value, promoting a persistent-store hit into
    /// the hot layer. A deserialization failure is treated as a miss rather
    /// than propagated (spec §4.2: the caller just re-fetches).
    pub async fn get<T: DeserializeOwned>(&self, bucket: Bucket, key: &str) -> Option<T> {
        let hot_key = Self::hot_key(bucket, key);
        if let Some(raw) = self.hot.read().unwrap().get(&hot_key).cloned() {
            return serde_json::from_str(&raw).ok();
        }

        let pool = self.pool.as_ref()?;
        let row = sqlx::query_as::<_, (String,)>(
            "SELECT value FROM cache_entries WHERE bucket = ? AND key = ?",
        )
        .bind(bucket.as_str())
        .bind(key)
        .fetch_optional(pool)
        .await
        .ok()??;

        match serde_json::from_str::<T>(&row.0) {
            Ok(value) => {
                self.hot.write().unwrap().insert(hot_key, row.0);
                Some(value)
            }
            Err(err) => {
                warn!(bucket = bucket.as_str(), key, error = %err, "cache deserialization failed, treating as miss");
                None
            }
        }
    }

    pub async fn set<T: Serialize>(&self, bucket: Bucket, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.hot
            .write()
            .unwrap()
            .insert(Self::hot_key(bucket, key), raw.clone());

        if let Some(pool) = &self.pool {
            sqlx::query(
                r#"
                INSERT INTO cache_entries (bucket, key, value) VALUES (?, ?, ?)
                ON CONFLICT(bucket, key) DO UPDATE SET value = excluded.value
                "#,
            )
            .bind(bucket.as_str())
            .bind(key)
            .bind(raw)
            .execute(pool)
            .await?;
        }
        Ok(())
    }

    pub async fn delete(&self, bucket: Bucket, key: &str) -> Result<()> {
        self.hot.write().unwrap().remove(&Self::hot_key(bucket, key));
        if let Some(pool) = &self.pool {
            sqlx::query("DELETE FROM cache_entries WHERE bucket = ? AND key = ?")
                .bind(bucket.as_str())
                .bind(key)
                .execute(pool)
                .await?;
        }
        Ok(())
    }

    pub async fn delete_prefix(&self, bucket: Bucket, prefix: &str) -> Result<()> {
        {
            let mut hot = self.hot.write().unwrap();
            let doomed: Vec<(String, String)> = hot
                .keys()
                .filter(|(b, k)| b == bucket.as_str() && k.starts_with(prefix))
                .cloned()
                .collect();
            for key in doomed {
                hot.remove(&key);
            }
        }
        if let Some(pool) = &self.pool {
            sqlx::query("DELETE FROM cache_entries WHERE bucket = ? AND key LIKE ?")
                .bind(bucket.as_str())
                .bind(format!("{}%", prefix.replace('%', "\\%")))
                .execute(pool)
                .await?;
        }
        Ok(())
    }

    pub async fn invalidate_all(&self) -> Result<()> {
        self.hot.write().unwrap().clear();
        if let Some(pool) = &self.pool {
            sqlx::query("DELETE FROM cache_entries").execute(pool).await?;
        }
        Ok(())
    }

    /// `true` iff the cached `lib:{L}:ts` row is at least as fresh as
    /// `server_ts` (spec §4.2).
    pub async fn is_valid(&self, library_id: &LibraryId, server_ts: i64) -> bool {
        let key = super::keys::content_ts(library_id);
        self.get::<i64>(Bucket::Content, &key).await.is_some_and(|ts| ts >= server_ts)
    }

    pub async fn invalidate_library(&self, library_id: &LibraryId) -> Result<()> {
        let prefix = super::keys::library_prefix(library_id);
        self.delete_prefix(Bucket::Content, &prefix).await?;
        self.delete_prefix(Bucket::Seasons, &prefix).await?;
        self.delete_prefix(Bucket::Episodes, &prefix).await?;
        debug!(library_id = %library_id, "invalidated library cache");
        Ok(())
    }

    pub async fn invalidate_show(&self, library_id: &LibraryId, show_id: &ShowId) -> Result<()> {
        let seasons_key = super::keys::show_prefix(library_id, show_id);
        self.delete(Bucket::Seasons, &seasons_key).await?;
        let episode_prefix = super::keys::season_prefix(library_id, show_id);
        self.delete_prefix(Bucket::Episodes, &episode_prefix).await?;
        Ok(())
    }

    pub async fn invalidate_season(
        &self,
        library_id: &LibraryId,
        show_id: &ShowId,
        season_number: u32,
    ) -> Result<()> {
        let key = super::keys::episodes_for_season(library_id, show_id, season_number);
        self.delete(Bucket::Episodes, &key).await
    }
}

fn cleanup_legacy_json(dir: &Path) {
    let Ok(entries) = std::fs::read_dir(dir) else { return };
    for entry in entries.flatten() {
        let path: PathBuf = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            if std::fs::remove_file(&path).is_ok() {
                debug!(path = %path.display(), "removed legacy flat-cache file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Sample {
        n: u32,
    }

    #[tokio::test]
    async fn memory_only_store_round_trips() {
        let store = CacheStore::in_memory();
        store.set(Bucket::Content, "lib:1:ts", &42i64).await.unwrap();
        let value: Option<i64> = store.get(Bucket::Content, "lib:1:ts").await;
        assert_eq!(value, Some(42));
    }

    #[tokio::test]
    async fn delete_prefix_clears_matching_hot_entries() {
        let store = CacheStore::in_memory();
        store.set(Bucket::Content, "lib:1:movies", &Sample { n: 1 }).await.unwrap();
        store.set(Bucket::Content, "lib:1:ts", &1i64).await.unwrap();
        store.set(Bucket::Content, "lib:2:movies", &Sample { n: 2 }).await.unwrap();

        store.delete_prefix(Bucket::Content, "lib:1:").await.unwrap();

        assert!(store.get::<Sample>(Bucket::Content, "lib:1:movies").await.is_none());
        assert!(store.get::<i64>(Bucket::Content, "lib:1:ts").await.is_none());
        assert!(store.get::<Sample>(Bucket::Content, "lib:2:movies").await.is_some());
    }

    #[tokio::test]
    async fn is_valid_compares_against_stored_timestamp() {
        let store = CacheStore::in_memory();
        let lib = LibraryId::new("7");
        assert!(!store.is_valid(&lib, 100).await);
        store.set(Bucket::Content, &super::super::keys::content_ts(&lib), &100i64).await.unwrap();
        assert!(store.is_valid(&lib, 100).await);
        assert!(!store.is_valid(&lib, 101).await);
    }

    #[tokio::test]
    async fn invalidate_all_clears_every_bucket() {
        let store = CacheStore::in_memory();
        store.set(Bucket::Libraries, "list", &vec![1, 2]).await.unwrap();
        store.set(Bucket::Playlists, "list", &vec![3]).await.unwrap();
        store.invalidate_all().await.unwrap();
        assert!(store.get::<Vec<i32>>(Bucket::Libraries, "list").await.is_none());
        assert!(store.get::<Vec<i32>>(Bucket::Playlists, "list").await.is_none());
    }

    #[test]
    fn server_cache_prefix_is_six_hex_bytes_and_normalizes_case_and_slash() {
        let a = server_cache_prefix("HTTP://Example.com/");
        let b = server_cache_prefix("http://example.com");
        assert_eq!(a, b);
        assert_eq!(a.len(), 12);
    }
}
