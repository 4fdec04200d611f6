use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::backends::traits::{LibraryRepository, MediaAdapter};
use crate::cache::{keys, Bucket, CacheStore};
use crate::error::{KinoError, Result};
use crate::models::{Library, LibraryId, LibraryKind, MediaItem, MixedItem, Show, ShowId};
use crate::services::sync_types::{ProgressSink, SyncBatch, SyncProgress};

/// Default page size for every paginated library fetch (spec §4.3).
const PAGE_SIZE: u32 = 50;
/// After this many consecutive failed pages, a sync gives up (spec §4.1/§4.3.1).
const MAX_CONSECUTIVE_SKIPS: u32 = 10;

/// Bridges a [`MediaAdapter`] and a [`CacheStore`] for one backend, driving
/// the freshness-gated sync algorithm and its cache-only counterpart.
pub struct LibraryService {
    adapter: Arc<dyn MediaAdapter>,
    store: Arc<CacheStore>,
}

impl LibraryService {
    pub fn new(adapter: Arc<dyn MediaAdapter>, store: Arc<CacheStore>) -> Self {
        Self { adapter, store }
    }

    pub async fn get_libraries(&self) -> Result<Vec<Library>> {
        let key = keys::libraries_list();
        if let Some(cached) = self.store.get::<Vec<Library>>(Bucket::Libraries, &key).await {
            return Ok(cached);
        }
        let libraries = self.adapter.get_libraries().await?;
        self.store.set(Bucket::Libraries, &key, &libraries).await?;
        Ok(libraries)
    }

    /// The core freshness-gated algorithm from spec §4.3.1.
    pub async fn sync_library(
        &self,
        library: &Library,
        cancel: &CancellationToken,
        sink: &mut ProgressSink,
    ) -> Result<()> {
        if self.store.is_valid(&library.id, library.server_updated_at).await {
            let cached_count = self.cached_content_len(library).await;
            sink.push(SyncProgress::cache_hit(cached_count));
            return Ok(());
        }
        self.fetch_library(library, cancel, sink).await
    }

    /// Unconditional fetch, skipping the freshness gate (spec §4.3.2), used
    /// for explicit user-initiated refresh.
    pub async fn fetch_library(
        &self,
        library: &Library,
        cancel: &CancellationToken,
        sink: &mut ProgressSink,
    ) -> Result<()> {
        match library.kind {
            LibraryKind::Movie => self.sync_movies(library, cancel, sink).await,
            LibraryKind::Show => self.sync_shows(library, cancel, sink).await,
            LibraryKind::Mixed => self.sync_mixed(library, cancel, sink).await,
            LibraryKind::Playlist => Err(KinoError::Unsupported(
                "a playlist pseudo-library has no content to sync".into(),
            )),
        }
    }

    async fn cached_content_len(&self, library: &Library) -> usize {
        match library.kind {
            LibraryKind::Movie => self
                .get_cached_movies(&library.id)
                .await
                .map(|v| v.len())
                .unwrap_or(0),
            LibraryKind::Show => self
                .get_cached_shows(&library.id)
                .await
                .map(|v| v.len())
                .unwrap_or(0),
            LibraryKind::Mixed => self
                .get_cached_mixed(&library.id)
                .await
                .map(|v| v.len())
                .unwrap_or(0),
            LibraryKind::Playlist => 0,
        }
    }

    async fn sync_movies(
        &self,
        library: &Library,
        cancel: &CancellationToken,
        sink: &mut ProgressSink,
    ) -> Result<()> {
        let mut accumulator = Vec::new();
        let mut offset = 0u32;
        let mut consecutive_skips = 0u32;
        let mut total = 0usize;

        loop {
            if cancel.is_cancelled() {
                return Err(KinoError::ServerOffline);
            }
            match self.adapter.get_movies(&library.id, offset, PAGE_SIZE).await {
                Ok(page) => {
                    consecutive_skips = 0;
                    total = page.total;
                    let batch = page.items.clone();
                    let batch_len = batch.len();
                    accumulator.extend(page.items);
                    let done = accumulator.len() >= total || batch_len == 0;
                    sink.push(SyncProgress::batch(accumulator.len(), total, done, SyncBatch::Movies(batch)));
                    if done {
                        break;
                    }
                    offset += PAGE_SIZE;
                }
                Err(err) => {
                    warn!(library = %library.id, offset, error = %err, "skipping failed movie page");
                    consecutive_skips += 1;
                    if consecutive_skips > MAX_CONSECUTIVE_SKIPS {
                        sink.push(SyncProgress::failed(accumulator.len(), total, err.clone()));
                        return Err(err);
                    }
                    offset += PAGE_SIZE;
                }
            }
        }

        self.store
            .set(Bucket::Content, &keys::content_movies(&library.id), &accumulator)
            .await?;
        self.store
            .set(Bucket::Content, &keys::content_ts(&library.id), &library.server_updated_at)
            .await?;
        Ok(())
    }

    async fn sync_shows(
        &self,
        library: &Library,
        cancel: &CancellationToken,
        sink: &mut ProgressSink,
    ) -> Result<()> {
        let mut accumulator = Vec::new();
        let mut offset = 0u32;
        let mut consecutive_skips = 0u32;
        let mut total = 0usize;

        loop {
            if cancel.is_cancelled() {
                return Err(KinoError::ServerOffline);
            }
            match self.adapter.get_shows(&library.id, offset, PAGE_SIZE).await {
                Ok(page) => {
                    consecutive_skips = 0;
                    total = page.total;
                    let batch = page.items.clone();
                    let batch_len = batch.len();
                    accumulator.extend(page.items);
                    let done = accumulator.len() >= total || batch_len == 0;
                    sink.push(SyncProgress::batch(accumulator.len(), total, done, SyncBatch::Shows(batch)));
                    if done {
                        break;
                    }
                    offset += PAGE_SIZE;
                }
                Err(err) => {
                    warn!(library = %library.id, offset, error = %err, "skipping failed show page");
                    consecutive_skips += 1;
                    if consecutive_skips > MAX_CONSECUTIVE_SKIPS {
                        sink.push(SyncProgress::failed(accumulator.len(), total, err.clone()));
                        return Err(err);
                    }
                    offset += PAGE_SIZE;
                }
            }
        }

        self.store
            .set(Bucket::Content, &keys::content_shows(&library.id), &accumulator)
            .await?;
        self.store
            .set(Bucket::Content, &keys::content_ts(&library.id), &library.server_updated_at)
            .await?;
        Ok(())
    }

    async fn sync_mixed(
        &self,
        library: &Library,
        cancel: &CancellationToken,
        sink: &mut ProgressSink,
    ) -> Result<()> {
        let mut accumulator = Vec::new();
        let mut offset = 0u32;
        let mut consecutive_skips = 0u32;
        let mut total = 0usize;

        loop {
            if cancel.is_cancelled() {
                return Err(KinoError::ServerOffline);
            }
            match self.adapter.get_library_content(&library.id, offset, PAGE_SIZE).await {
                Ok(page) => {
                    consecutive_skips = 0;
                    total = page.total;
                    let batch = page.items.clone();
                    let batch_len = batch.len();
                    accumulator.extend(page.items);
                    let done = accumulator.len() >= total || batch_len == 0;
                    sink.push(SyncProgress::batch(accumulator.len(), total, done, SyncBatch::Mixed(batch)));
                    if done {
                        break;
                    }
                    offset += PAGE_SIZE;
                }
                Err(err) => {
                    warn!(library = %library.id, offset, error = %err, "skipping failed mixed-content page");
                    consecutive_skips += 1;
                    if consecutive_skips > MAX_CONSECUTIVE_SKIPS {
                        sink.push(SyncProgress::failed(accumulator.len(), total, err.clone()));
                        return Err(err);
                    }
                    offset += PAGE_SIZE;
                }
            }
        }

        self.store
            .set(Bucket::Content, &keys::content_mixed(&library.id), &accumulator)
            .await?;
        self.store
            .set(Bucket::Content, &keys::content_ts(&library.id), &library.server_updated_at)
            .await?;
        Ok(())
    }

    pub async fn get_cached_movies(&self, library_id: &LibraryId) -> Option<Vec<MediaItem>> {
        self.store.get(Bucket::Content, &keys::content_movies(library_id)).await
    }

    pub async fn get_cached_shows(&self, library_id: &LibraryId) -> Option<Vec<Show>> {
        self.store.get(Bucket::Content, &keys::content_shows(library_id)).await
    }

    pub async fn get_cached_mixed(&self, library_id: &LibraryId) -> Option<Vec<MixedItem>> {
        self.store.get(Bucket::Content, &keys::content_mixed(library_id)).await
    }

    /// Fetches seasons from the network and caches them; seasons are never
    /// populated during a library sync (spec §4.9).
    pub async fn fetch_seasons(&self, library_id: &LibraryId, show_id: &ShowId) -> Result<Vec<crate::models::Season>> {
        let seasons = self.adapter.get_seasons(show_id).await?;
        let key = keys::seasons_for_show(library_id, show_id);
        self.store.set(Bucket::Seasons, &key, &seasons).await?;
        Ok(seasons)
    }

    pub async fn get_cached_seasons(
        &self,
        library_id: &LibraryId,
        show_id: &ShowId,
    ) -> Option<Vec<crate::models::Season>> {
        self.store
            .get(Bucket::Seasons, &keys::seasons_for_show(library_id, show_id))
            .await
    }

    pub async fn fetch_episodes(
        &self,
        library_id: &LibraryId,
        show_id: &ShowId,
        season_number: u32,
    ) -> Result<Vec<MediaItem>> {
        let episodes = self.adapter.get_episodes(show_id, season_number).await?;
        let key = keys::episodes_for_season(library_id, show_id, season_number);
        self.store.set(Bucket::Episodes, &key, &episodes).await?;
        Ok(episodes)
    }

    pub async fn get_cached_episodes(
        &self,
        library_id: &LibraryId,
        show_id: &ShowId,
        season_number: u32,
    ) -> Option<Vec<MediaItem>> {
        self.store
            .get(Bucket::Episodes, &keys::episodes_for_season(library_id, show_id, season_number))
            .await
    }

    /// Invalidation surface (spec §4.3.4): every cascade entry also persists
    /// the cache-store side effect, so the next cache-only read is a miss.
    pub async fn invalidate_library(&self, library_id: &LibraryId) -> Result<()> {
        self.store.invalidate_library(library_id).await
    }

    pub async fn invalidate_show(&self, library_id: &LibraryId, show_id: &ShowId) -> Result<()> {
        self.store.invalidate_show(library_id, show_id).await
    }

    pub async fn invalidate_season(
        &self,
        library_id: &LibraryId,
        show_id: &ShowId,
        season_number: u32,
    ) -> Result<()> {
        self.store.invalidate_season(library_id, show_id, season_number).await
    }

    pub async fn mark_played(&self, item_id: &crate::models::MediaItemId) -> Result<()> {
        use crate::backends::traits::MetadataRepository;
        self.adapter.mark_played(item_id).await.map_err(|e| {
            error!(item_id = %item_id, error = %e, "failed to mark item played");
            e
        })
    }

    pub async fn mark_unplayed(&self, item_id: &crate::models::MediaItemId) -> Result<()> {
        use crate::backends::traits::MetadataRepository;
        self.adapter.mark_unplayed(item_id).await
    }

    pub async fn resolve_playable_url(&self, item_id: &crate::models::MediaItemId) -> Result<String> {
        use crate::backends::traits::MetadataRepository;
        self.adapter.resolve_playable_url(item_id).await
    }
}
