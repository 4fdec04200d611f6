use std::collections::HashSet;
use std::sync::Arc;

use tracing::warn;

use crate::backends::traits::{MediaAdapter, PlaylistRepository};
use crate::cache::{keys, Bucket, CacheStore};
use crate::error::Result;
use crate::models::{MediaItem, MediaItemId, Playlist, PlaylistId};

/// Two-level playlist sync: the list of playlists, then a best-effort fetch
/// of each playlist's items (spec §4.4).
pub struct PlaylistService {
    adapter: Arc<dyn MediaAdapter>,
    store: Arc<CacheStore>,
}

impl PlaylistService {
    pub fn new(adapter: Arc<dyn MediaAdapter>, store: Arc<CacheStore>) -> Self {
        Self { adapter, store }
    }

    pub async fn get_cached_playlists(&self) -> Option<Vec<Playlist>> {
        self.store.get(Bucket::Playlists, &keys::playlists_list()).await
    }

    pub async fn sync_playlists(&self) -> Result<Vec<Playlist>> {
        let playlists = self.adapter.get_playlists().await?;
        self.store.set(Bucket::Playlists, &keys::playlists_list(), &playlists).await?;

        for playlist in &playlists {
            match self.adapter.get_playlist_items(&playlist.id).await {
                Ok(items) => {
                    let key = keys::playlist_items(&playlist.id);
                    if let Err(err) = self.store.set(Bucket::Playlists, &key, &items).await {
                        warn!(playlist = %playlist.id, error = %err, "failed to cache playlist items");
                    }
                }
                Err(err) => {
                    warn!(playlist = %playlist.id, error = %err, "failed to fetch playlist items, skipping");
                }
            }
        }

        Ok(playlists)
    }

    pub async fn get_cached_playlist_items(&self, playlist_id: &PlaylistId) -> Option<Vec<MediaItem>> {
        self.store.get(Bucket::Playlists, &keys::playlist_items(playlist_id)).await
    }

    pub async fn fetch_playlist_items(&self, playlist_id: &PlaylistId) -> Result<Vec<MediaItem>> {
        let items = self.adapter.get_playlist_items(playlist_id).await?;
        self.store
            .set(Bucket::Playlists, &keys::playlist_items(playlist_id), &items)
            .await?;
        Ok(items)
    }

    /// Cache-backed membership query (spec §4.4): syncs playlists first if
    /// they aren't cached, then walks every cached item sequence.
    pub async fn get_playlist_membership(&self, item_id: &MediaItemId) -> Result<HashSet<PlaylistId>> {
        let playlists = match self.get_cached_playlists().await {
            Some(cached) => cached,
            None => self.sync_playlists().await?,
        };

        let mut membership = HashSet::new();
        for playlist in &playlists {
            let items = match self.get_cached_playlist_items(&playlist.id).await {
                Some(items) => items,
                None => self.fetch_playlist_items(&playlist.id).await.unwrap_or_default(),
            };
            if items.iter().any(|item| &item.id == item_id) {
                membership.insert(playlist.id.clone());
            }
        }
        Ok(membership)
    }

    pub async fn create(&self, title: &str, initial_items: &[MediaItemId]) -> Result<Playlist> {
        let playlist = self.adapter.create(title, initial_items).await?;
        self.invalidate_list().await?;
        Ok(playlist)
    }

    pub async fn add(&self, playlist_id: &PlaylistId, item_ids: &[MediaItemId]) -> Result<()> {
        self.adapter.add(playlist_id, item_ids).await?;
        self.invalidate_items(playlist_id).await
    }

    pub async fn remove(&self, playlist_id: &PlaylistId, item_id: &MediaItemId) -> Result<()> {
        self.adapter.remove(playlist_id, item_id).await?;
        self.invalidate_items(playlist_id).await
    }

    pub async fn delete(&self, playlist_id: &PlaylistId) -> Result<()> {
        self.adapter.delete(playlist_id).await?;
        self.store.delete(Bucket::Playlists, &keys::playlist_items(playlist_id)).await?;
        self.invalidate_list().await
    }

    async fn invalidate_list(&self) -> Result<()> {
        self.store.delete(Bucket::Playlists, &keys::playlists_list()).await
    }

    async fn invalidate_items(&self, playlist_id: &PlaylistId) -> Result<()> {
        self.store.delete(Bucket::Playlists, &keys::playlist_items(playlist_id)).await
    }
}
