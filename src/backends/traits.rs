use async_trait::async_trait;

use crate::error::Result;
use crate::models::{BackendId, Library, LibraryId, MediaItem, MediaItemId, Playlist, PlaylistId, Season, Show, ShowId, MixedItem};

/// A page of server results plus the server-declared (or inferred) total,
/// as returned by every paginated adapter call (spec §4.1).
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
}

/// Capability: enumerate and page through a server's content hierarchy.
#[async_trait]
pub trait LibraryRepository: Send + Sync {
    async fn get_libraries(&self) -> Result<Vec<Library>>;

    /// `limit = 0` means "server default" (spec §4.1).
    async fn get_movies(&self, library_id: &LibraryId, offset: u32, limit: u32) -> Result<Page<MediaItem>>;

    async fn get_shows(&self, library_id: &LibraryId, offset: u32, limit: u32) -> Result<Page<Show>>;

    async fn get_library_content(
        &self,
        library_id: &LibraryId,
        offset: u32,
        limit: u32,
    ) -> Result<Page<MixedItem>>;

    async fn get_seasons(&self, show_id: &ShowId) -> Result<Vec<Season>>;

    async fn get_episodes(&self, show_id: &ShowId, season_number: u32) -> Result<Vec<MediaItem>>;
}

/// Capability: resolve a playable URL and toggle watched state.
#[async_trait]
pub trait MetadataRepository: Send + Sync {
    async fn resolve_playable_url(&self, item_id: &MediaItemId) -> Result<String>;

    async fn mark_played(&self, item_id: &MediaItemId) -> Result<()>;

    async fn mark_unplayed(&self, item_id: &MediaItemId) -> Result<()>;
}

/// Capability: playlist CRUD (spec §4.1). Backends differ on empty-playlist
/// creation; that asymmetry is surfaced through `Unsupported`, not hidden.
#[async_trait]
pub trait PlaylistRepository: Send + Sync {
    async fn get_playlists(&self) -> Result<Vec<Playlist>>;

    async fn get_playlist_items(&self, playlist_id: &PlaylistId) -> Result<Vec<MediaItem>>;

    async fn create(&self, title: &str, initial_items: &[MediaItemId]) -> Result<Playlist>;

    async fn add(&self, playlist_id: &PlaylistId, item_ids: &[MediaItemId]) -> Result<()>;

    async fn remove(&self, playlist_id: &PlaylistId, item_id: &MediaItemId) -> Result<()>;

    async fn delete(&self, playlist_id: &PlaylistId) -> Result<()>;
}

/// The full capability set a protocol variant must implement (spec §4.1,
/// §9.1 "adapter selection at runtime" — a sum of adapters behind one
/// abstract capability, never subclassing).
#[async_trait]
pub trait MediaAdapter: LibraryRepository + MetadataRepository + PlaylistRepository {
    fn backend_id(&self) -> &BackendId;
}
