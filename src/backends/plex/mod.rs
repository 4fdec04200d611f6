mod api;
mod types;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use self::api::PlexApi;
use self::types::{PlexDirectory, PlexMetadata};
use crate::backends::traits::{LibraryRepository, MediaAdapter, MetadataRepository, Page, PlaylistRepository};
use crate::error::{KinoError, Result};
use crate::models::{
    BackendId, EpisodeExtras, Library, LibraryId, LibraryKind, MediaItem, MediaItemId, MediaType,
    MixedItem, Playlist, PlaylistId, PlaylistKind, Season, SeasonId, Show, ShowId,
};

fn unix_to_datetime(secs: Option<i64>) -> Option<DateTime<Utc>> {
    secs.filter(|s| *s > 0).and_then(|s| DateTime::from_timestamp(s, 0))
}

/// Directly maps the wire `type` to a library kind; `None` means the wire
/// type is neither `movie` nor `show` and needs the mixed-detection probe
/// (spec §4.1: "mixed is recognized by presence of both content types under
/// the same parent", never a default).
fn library_kind_from_plex(kind: &str) -> Option<LibraryKind> {
    match kind {
        "movie" => Some(LibraryKind::Movie),
        "show" => Some(LibraryKind::Show),
        _ => None,
    }
}

fn convert_library(dir: PlexDirectory, kind: LibraryKind) -> Library {
    Library {
        id: LibraryId::new(dir.key),
        name: dir.title,
        kind,
        server_updated_at: dir.updated_at,
    }
}

/// Converts a Plex metadata record into a domain movie. `parent_library_id`
/// is threaded through because Plex's item payloads don't echo the section
/// key that was queried.
fn convert_movie(meta: PlexMetadata, library_id: &LibraryId) -> MediaItem {
    let view_offset_ms = meta.view_offset.unwrap_or(0).max(0) as u64;
    let duration_ms = meta.duration.unwrap_or(0).max(0) as u64;
    MediaItem {
        id: MediaItemId::new(meta.rating_key),
        title: meta.title,
        sort_title: meta.title_sort.unwrap_or_default(),
        parent_library_id: library_id.clone(),
        summary: meta.summary.unwrap_or_default(),
        release_year: meta.year.map(|y| y.max(0) as u32),
        duration: Duration::from_millis(duration_ms),
        view_offset: Duration::from_millis(view_offset_ms),
        is_played: meta.view_count.unwrap_or(0) > 0,
        media_type: MediaType::Movie,
        episode: None,
        thumbnail_url: meta.thumb,
        art_url: meta.art,
        media_url: String::new(),
        added_at: unix_to_datetime(meta.added_at),
        updated_at: unix_to_datetime(meta.updated_at),
    }
}

fn convert_episode(meta: PlexMetadata, library_id: &LibraryId, season_number: u32) -> MediaItem {
    let view_offset_ms = meta.view_offset.unwrap_or(0).max(0) as u64;
    let duration_ms = meta.duration.unwrap_or(0).max(0) as u64;
    let episode_number = meta.index.unwrap_or(0).max(0) as u32;
    let show_id = meta
        .parent_rating_key
        .clone()
        .map(ShowId::new)
        .unwrap_or_default();
    let show_title = meta.parent_title.clone().unwrap_or_default();
    MediaItem {
        id: MediaItemId::new(meta.rating_key.clone()),
        title: meta.title,
        sort_title: meta.title_sort.unwrap_or_default(),
        parent_library_id: library_id.clone(),
        summary: meta.summary.unwrap_or_default(),
        release_year: meta.year.map(|y| y.max(0) as u32),
        duration: Duration::from_millis(duration_ms),
        view_offset: Duration::from_millis(view_offset_ms),
        is_played: meta.view_count.unwrap_or(0) > 0,
        media_type: MediaType::Episode,
        episode: Some(EpisodeExtras {
            show_title,
            show_id,
            season_number,
            episode_number,
            season_id: SeasonId::new(meta.rating_key),
        }),
        thumbnail_url: meta.thumb,
        art_url: meta.art,
        media_url: String::new(),
        added_at: unix_to_datetime(meta.added_at),
        updated_at: unix_to_datetime(meta.updated_at),
    }
}

fn convert_show(meta: PlexMetadata, library_id: &LibraryId) -> Show {
    let leaf_count = meta.leaf_count.unwrap_or(0).max(0) as u32;
    let viewed = meta.viewed_leaf_count.unwrap_or(0).max(0) as u32;
    Show {
        id: ShowId::new(meta.rating_key),
        title: meta.title,
        sort_title: meta.title_sort.unwrap_or_default(),
        library_id: library_id.clone(),
        summary: meta.summary.unwrap_or_default(),
        year: meta.year.map(|y| y.max(0) as u32),
        season_count: meta.child_count.unwrap_or(0).max(0) as u32,
        episode_count: leaf_count,
        unwatched_count: leaf_count.saturating_sub(viewed),
        added_at: unix_to_datetime(meta.added_at),
        updated_at: unix_to_datetime(meta.updated_at),
    }
}

fn convert_season(meta: PlexMetadata, show_id: &ShowId, show_title: &str) -> Season {
    let leaf_count = meta.leaf_count.unwrap_or(0).max(0) as u32;
    let viewed = meta.viewed_leaf_count.unwrap_or(0).max(0) as u32;
    let season_number = meta.index.unwrap_or(0).max(0) as u32;
    Season {
        id: SeasonId::new(meta.rating_key),
        show_id: show_id.clone(),
        show_title: show_title.to_string(),
        season_number,
        label: Season::label_for(season_number),
        episode_count: leaf_count,
        unwatched_count: leaf_count.saturating_sub(viewed),
        added_at: unix_to_datetime(meta.added_at),
        updated_at: unix_to_datetime(meta.updated_at),
    }
}

fn convert_playlist(meta: PlexMetadata) -> Playlist {
    let kind = match meta.kind.as_str() {
        "audio" => PlaylistKind::Audio,
        "photo" => PlaylistKind::Photo,
        _ => PlaylistKind::Video,
    };
    Playlist {
        id: PlaylistId::new(meta.rating_key),
        title: meta.title,
        kind,
        is_smart: meta.smart.unwrap_or(0) != 0,
        item_count: meta.leaf_count.unwrap_or(0).max(0) as u32,
        total_duration: Duration::from_millis(meta.duration.unwrap_or(0).max(0) as u64),
        updated_at: unix_to_datetime(meta.updated_at).unwrap_or_else(Utc::now),
    }
}

/// Adapts a single Plex Media Server to the shared repository capability
/// traits. Holds one [`PlexApi`] client and a [`CancellationToken`] shared
/// across every in-flight request issued through it.
pub struct PlexAdapter {
    api: PlexApi,
    backend_id: BackendId,
    cancel: CancellationToken,
}

impl PlexAdapter {
    pub fn new(backend_id: BackendId, base_url: String, token: String, cancel: CancellationToken) -> Self {
        Self {
            api: PlexApi::new(base_url, token),
            backend_id,
            cancel,
        }
    }

    async fn find_show_meta(&self, show_id: &ShowId) -> Result<PlexMetadata> {
        let container = self.api.get_metadata(&self.cancel, show_id.as_str()).await?;
        container
            .metadata
            .into_iter()
            .next()
            .ok_or_else(|| KinoError::ItemNotFound(show_id.to_string()))
    }

    /// Probes an ambiguous section's content for both movies and shows
    /// (spec §4.1's "mixed" rule). `None` means neither the direct type map
    /// nor this probe recognized the section, so it is excluded entirely.
    async fn detect_mixed_kind(&self, library_key: &str) -> Result<Option<LibraryKind>> {
        let container = self
            .api
            .get_section_content(&self.cancel, library_key, 0, 100, None)
            .await?;
        let has_movie = container.metadata.iter().any(|m| m.kind == "movie");
        let has_show = container.metadata.iter().any(|m| m.kind == "show");
        Ok(if has_movie && has_show { Some(LibraryKind::Mixed) } else { None })
    }
}

#[async_trait]
impl LibraryRepository for PlexAdapter {
    async fn get_libraries(&self) -> Result<Vec<Library>> {
        let dirs = self.api.get_libraries(&self.cancel).await?;
        let mut libraries = Vec::new();
        for (key, title, kind, updated_at) in dirs {
            let resolved = match library_kind_from_plex(&kind) {
                Some(resolved) => Some(resolved),
                None => self.detect_mixed_kind(&key).await?,
            };
            if let Some(resolved) = resolved {
                libraries.push(convert_library(PlexDirectory { key, title, kind, updated_at }, resolved));
            }
        }
        Ok(libraries)
    }

    async fn get_movies(&self, library_id: &LibraryId, offset: u32, limit: u32) -> Result<Page<MediaItem>> {
        let container = self
            .api
            .get_section_content(&self.cancel, library_id.as_str(), offset, limit, Some(1))
            .await?;
        let items: Vec<MediaItem> = container
            .metadata
            .into_iter()
            .map(|m| convert_movie(m, library_id))
            .collect();
        let total = container.total_size.or(container.size).map(|t| t as usize).unwrap_or(items.len());
        Ok(Page { items, total })
    }

    async fn get_shows(&self, library_id: &LibraryId, offset: u32, limit: u32) -> Result<Page<Show>> {
        let container = self
            .api
            .get_section_content(&self.cancel, library_id.as_str(), offset, limit, Some(2))
            .await?;
        let items: Vec<Show> = container
            .metadata
            .into_iter()
            .map(|m| convert_show(m, library_id))
            .collect();
        let total = container.total_size.or(container.size).map(|t| t as usize).unwrap_or(items.len());
        Ok(Page { items, total })
    }

    async fn get_library_content(
        &self,
        library_id: &LibraryId,
        offset: u32,
        limit: u32,
    ) -> Result<Page<MixedItem>> {
        let container = self
            .api
            .get_section_content(&self.cancel, library_id.as_str(), offset, limit, None)
            .await?;
        let items: Vec<MixedItem> = container
            .metadata
            .into_iter()
            .map(|m| match m.kind.as_str() {
                "show" => MixedItem::Show(convert_show(m, library_id)),
                _ => MixedItem::Movie(convert_movie(m, library_id)),
            })
            .collect();
        let total = container.total_size.or(container.size).map(|t| t as usize).unwrap_or(items.len());
        Ok(Page { items, total })
    }

    async fn get_seasons(&self, show_id: &ShowId) -> Result<Vec<Season>> {
        let show_meta = self.find_show_meta(show_id).await?;
        let show_title = show_meta.title.clone();
        let container = self.api.get_children(&self.cancel, show_id.as_str()).await?;
        Ok(container
            .metadata
            .into_iter()
            .map(|m| convert_season(m, show_id, &show_title))
            .collect())
    }

    async fn get_episodes(&self, show_id: &ShowId, season_number: u32) -> Result<Vec<MediaItem>> {
        let seasons_container = self.api.get_children(&self.cancel, show_id.as_str()).await?;
        let season_meta = seasons_container
            .metadata
            .into_iter()
            .find(|m| m.index.unwrap_or(-1) == season_number as i64)
            .ok_or_else(|| KinoError::ItemNotFound(format!("{show_id}:season:{season_number}")))?;

        let library_id = LibraryId::default();
        let episodes = self
            .api
            .get_children(&self.cancel, &season_meta.rating_key)
            .await?;
        Ok(episodes
            .metadata
            .into_iter()
            .map(|m| convert_episode(m, &library_id, season_number))
            .collect())
    }
}

#[async_trait]
impl MetadataRepository for PlexAdapter {
    async fn resolve_playable_url(&self, item_id: &MediaItemId) -> Result<String> {
        let container = self.api.get_metadata(&self.cancel, item_id.as_str()).await?;
        let meta = container
            .metadata
            .into_iter()
            .next()
            .ok_or_else(|| KinoError::ItemNotFound(item_id.to_string()))?;
        let part_key = meta
            .media
            .first()
            .and_then(|m| m.part.first())
            .and_then(|p| p.key.clone())
            .ok_or_else(|| KinoError::MalformedResponse(format!("no media part for {item_id}")))?;
        Ok(self.api.build_stream_url(&part_key))
    }

    async fn mark_played(&self, item_id: &MediaItemId) -> Result<()> {
        self.api.set_played(&self.cancel, item_id.as_str(), true).await
    }

    async fn mark_unplayed(&self, item_id: &MediaItemId) -> Result<()> {
        self.api.set_played(&self.cancel, item_id.as_str(), false).await
    }
}

#[async_trait]
impl PlaylistRepository for PlexAdapter {
    async fn get_playlists(&self) -> Result<Vec<Playlist>> {
        let container = self.api.get_playlists(&self.cancel).await?;
        Ok(container.metadata.into_iter().map(convert_playlist).collect())
    }

    async fn get_playlist_items(&self, playlist_id: &PlaylistId) -> Result<Vec<MediaItem>> {
        let container = self
            .api
            .get_playlist_items(&self.cancel, playlist_id.as_str())
            .await?;
        let library_id = LibraryId::default();
        Ok(container
            .metadata
            .into_iter()
            .map(|m| match m.kind.as_str() {
                "episode" => convert_episode(m, &library_id, 0),
                _ => convert_movie(m, &library_id),
            })
            .collect())
    }

    /// Plex refuses to create a playlist without at least one seed item
    /// (spec §4.1); the caller must supply `initial_items`.
    async fn create(&self, title: &str, initial_items: &[MediaItemId]) -> Result<Playlist> {
        let first = initial_items
            .first()
            .ok_or_else(|| KinoError::Unsupported("Plex requires at least one item to create a playlist".into()))?;
        let uri = format!("library://{first}/item");
        let container = self.api.create_playlist(&self.cancel, title, &uri).await?;
        let meta = container
            .metadata
            .into_iter()
            .next()
            .ok_or_else(|| KinoError::MalformedResponse("playlist creation returned no metadata".into()))?;
        let playlist = convert_playlist(meta);

        for item in initial_items.iter().skip(1) {
            let uri = format!("library://{item}/item");
            self.api
                .add_to_playlist(&self.cancel, playlist.id.as_str(), &uri)
                .await?;
        }
        Ok(playlist)
    }

    async fn add(&self, playlist_id: &PlaylistId, item_ids: &[MediaItemId]) -> Result<()> {
        for item in item_ids {
            let uri = format!("library://{item}/item");
            self.api
                .add_to_playlist(&self.cancel, playlist_id.as_str(), &uri)
                .await?;
        }
        Ok(())
    }

    async fn remove(&self, playlist_id: &PlaylistId, item_id: &MediaItemId) -> Result<()> {
        self.api
            .remove_from_playlist(&self.cancel, playlist_id.as_str(), item_id.as_str())
            .await
    }

    async fn delete(&self, playlist_id: &PlaylistId) -> Result<()> {
        self.api.delete_playlist(&self.cancel, playlist_id.as_str()).await
    }
}

impl MediaAdapter for PlexAdapter {
    fn backend_id(&self) -> &BackendId {
        &self.backend_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(rating_key: &str, title: &str, kind: &str) -> PlexMetadata {
        PlexMetadata {
            rating_key: rating_key.to_string(),
            title: title.to_string(),
            title_sort: None,
            kind: kind.to_string(),
            summary: None,
            year: Some(2020),
            duration: Some(3_600_000),
            view_offset: Some(0),
            view_count: None,
            thumb: None,
            art: None,
            added_at: Some(1_700_000_000),
            updated_at: Some(1_700_000_000),
            parent_rating_key: Some("500".into()),
            parent_title: Some("A Show".into()),
            parent_index: Some(1),
            index: Some(3),
            leaf_count: Some(10),
            viewed_leaf_count: Some(4),
            child_count: Some(2),
            smart: None,
            media: vec![],
        }
    }

    #[test]
    fn library_kind_maps_movie_and_show_and_leaves_others_unmapped() {
        assert_eq!(library_kind_from_plex("movie"), Some(LibraryKind::Movie));
        assert_eq!(library_kind_from_plex("show"), Some(LibraryKind::Show));
        // "artist" and other wire types are neither movie nor show directly;
        // "mixed" is only assigned via the content-probing rule, not here.
        assert_eq!(library_kind_from_plex("artist"), None);
    }

    #[test]
    fn convert_movie_marks_played_from_view_count() {
        let mut m = meta("100", "A Movie", "movie");
        m.view_count = Some(2);
        let movie = convert_movie(m, &LibraryId::new("1"));
        assert!(movie.is_played);
        assert_eq!(movie.duration, Duration::from_secs(3600));
    }

    #[test]
    fn convert_episode_populates_show_linkage() {
        let m = meta("200", "Pilot", "episode");
        let ep = convert_episode(m, &LibraryId::new("1"), 1);
        let extras = ep.episode.expect("episode extras");
        assert_eq!(extras.show_id.as_str(), "500");
        assert_eq!(extras.show_title, "A Show");
        assert_eq!(extras.episode_number, 3);
    }

    #[test]
    fn convert_show_computes_unwatched_from_leaf_counts() {
        let show = convert_show(meta("300", "A Show", "show"), &LibraryId::new("1"));
        assert_eq!(show.episode_count, 10);
        assert_eq!(show.unwatched_count, 6);
        assert_eq!(show.season_count, 2);
    }
}
