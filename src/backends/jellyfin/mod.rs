mod api;
mod types;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use self::api::JellyfinApi;
use self::types::JellyfinItem;
use crate::backends::traits::{LibraryRepository, MediaAdapter, MetadataRepository, Page, PlaylistRepository};
use crate::error::{KinoError, Result};
use crate::models::{
    BackendId, EpisodeExtras, Library, LibraryId, LibraryKind, MediaItem, MediaItemId, MediaType,
    MixedItem, Playlist, PlaylistId, PlaylistKind, Season, SeasonId, Show, ShowId,
};

fn parse_rfc3339(raw: &Option<String>) -> Option<DateTime<Utc>> {
    raw.as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Directly maps the wire `CollectionType` to a library kind; `None` means
/// the view is neither a movies nor a tvshows collection and needs the
/// mixed-detection probe (spec §4.1: "mixed is recognized by presence of
/// both content types under the same parent", never a default).
fn library_kind_from_collection_type(collection_type: &Option<String>) -> Option<LibraryKind> {
    match collection_type.as_deref() {
        Some("movies") => Some(LibraryKind::Movie),
        Some("tvshows") => Some(LibraryKind::Show),
        _ => None,
    }
}

fn ticks_to_duration(ticks: Option<u64>) -> Duration {
    Duration::from_secs(ticks.unwrap_or(0) / 10_000_000)
}

fn convert_movie(item: JellyfinItem, library_id: &LibraryId, image_url: Option<String>) -> MediaItem {
    let user_data = item.user_data.clone().unwrap_or_default();
    MediaItem {
        id: MediaItemId::new(item.id),
        title: item.name,
        sort_title: String::new(),
        parent_library_id: library_id.clone(),
        summary: item.overview.unwrap_or_default(),
        release_year: item.production_year,
        duration: ticks_to_duration(item.run_time_ticks),
        view_offset: ticks_to_duration(user_data.playback_position_ticks),
        is_played: user_data.played,
        media_type: MediaType::Movie,
        episode: None,
        thumbnail_url: image_url,
        art_url: None,
        media_url: String::new(),
        added_at: parse_rfc3339(&item.date_created),
        updated_at: parse_rfc3339(&item.date_created),
    }
}

fn convert_episode(
    item: JellyfinItem,
    library_id: &LibraryId,
    season_number: u32,
    image_url: Option<String>,
) -> MediaItem {
    let user_data = item.user_data.clone().unwrap_or_default();
    let season_id = item.parent_id.clone().map(SeasonId::new).unwrap_or_default();
    let show_id = item.series_id.clone().map(ShowId::new).unwrap_or_default();
    let show_title = item.series_name.clone().unwrap_or_default();
    MediaItem {
        id: MediaItemId::new(item.id),
        title: item.name,
        sort_title: String::new(),
        parent_library_id: library_id.clone(),
        summary: item.overview.unwrap_or_default(),
        release_year: item.production_year,
        duration: ticks_to_duration(item.run_time_ticks),
        view_offset: ticks_to_duration(user_data.playback_position_ticks),
        is_played: user_data.played,
        media_type: MediaType::Episode,
        episode: Some(EpisodeExtras {
            show_title,
            show_id,
            season_number,
            episode_number: item.index_number.unwrap_or(0).max(0) as u32,
            season_id,
        }),
        thumbnail_url: image_url,
        art_url: None,
        media_url: String::new(),
        added_at: parse_rfc3339(&item.date_created),
        updated_at: parse_rfc3339(&item.date_created),
    }
}

fn convert_show(item: JellyfinItem, library_id: &LibraryId, image_url: Option<String>) -> Show {
    let _ = &image_url;
    Show {
        id: ShowId::new(item.id),
        title: item.name,
        sort_title: String::new(),
        library_id: library_id.clone(),
        summary: item.overview.unwrap_or_default(),
        year: item.production_year,
        season_count: item.child_count.unwrap_or(0).max(0) as u32,
        episode_count: 0,
        unwatched_count: 0,
        added_at: parse_rfc3339(&item.date_created),
        updated_at: parse_rfc3339(&item.date_created),
    }
}

fn convert_season(item: JellyfinItem, show_id: &ShowId, show_title: &str) -> Season {
    let episode_count = item.child_count.unwrap_or(0).max(0) as u32;
    let season_number = item.index_number.unwrap_or(0).max(0) as u32;
    Season {
        id: SeasonId::new(item.id),
        show_id: show_id.clone(),
        show_title: show_title.to_string(),
        season_number,
        label: Season::label_for(season_number),
        episode_count,
        unwatched_count: episode_count,
        added_at: parse_rfc3339(&item.date_created),
        updated_at: parse_rfc3339(&item.date_created),
    }
}

fn convert_playlist(item: JellyfinItem) -> Playlist {
    Playlist {
        id: PlaylistId::new(item.id),
        title: item.name,
        kind: PlaylistKind::Video,
        is_smart: false,
        item_count: item.child_count.unwrap_or(0).max(0) as u32,
        total_duration: Duration::ZERO,
        updated_at: parse_rfc3339(&item.date_created).unwrap_or_else(Utc::now),
    }
}

/// Adapts a single Jellyfin server to the shared repository capability
/// traits, scoped to one authenticated user.
pub struct JellyfinAdapter {
    api: JellyfinApi,
    backend_id: BackendId,
    cancel: CancellationToken,
}

impl JellyfinAdapter {
    pub fn new(
        backend_id: BackendId,
        base_url: String,
        api_key: String,
        user_id: String,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            api: JellyfinApi::new(base_url, api_key, user_id),
            backend_id,
            cancel,
        }
    }

    fn image_url(&self, item: &JellyfinItem) -> Option<String> {
        self.api.build_image_url(&item.id, item.image_tags.primary.as_deref())
    }

    /// Probes an ambiguous view's content for both movies and series (spec
    /// §4.1's "mixed" rule). `None` means neither the direct collection-type
    /// map nor this probe recognized the view, so it is excluded entirely.
    async fn detect_mixed_kind(&self, view_id: &str) -> Result<Option<LibraryKind>> {
        let response = self
            .api
            .get_items(&self.cancel, view_id, "Movie,Series", 0, 100)
            .await?;
        let has_movie = response.items.iter().any(|i| i.item_type.as_deref() == Some("Movie"));
        let has_show = response.items.iter().any(|i| i.item_type.as_deref() == Some("Series"));
        Ok(if has_movie && has_show { Some(LibraryKind::Mixed) } else { None })
    }
}

#[async_trait]
impl LibraryRepository for JellyfinAdapter {
    async fn get_libraries(&self) -> Result<Vec<Library>> {
        let views = self.api.get_libraries(&self.cancel).await?;
        let mut libraries = Vec::new();
        for (id, name, collection_type) in views {
            let resolved = match library_kind_from_collection_type(&collection_type) {
                Some(resolved) => Some(resolved),
                None => self.detect_mixed_kind(&id).await?,
            };
            if let Some(kind) = resolved {
                libraries.push(Library {
                    id: LibraryId::new(id),
                    name,
                    kind,
                    server_updated_at: 0,
                });
            }
        }
        Ok(libraries)
    }

    async fn get_movies(&self, library_id: &LibraryId, offset: u32, limit: u32) -> Result<Page<MediaItem>> {
        let response = self
            .api
            .get_items(&self.cancel, library_id.as_str(), "Movie", offset, limit)
            .await?;
        let items: Vec<MediaItem> = response
            .items
            .into_iter()
            .map(|item| {
                let image_url = self.image_url(&item);
                convert_movie(item, library_id, image_url)
            })
            .collect();
        let total = if response.total_record_count > 0 {
            response.total_record_count as usize
        } else {
            items.len()
        };
        Ok(Page { items, total })
    }

    async fn get_shows(&self, library_id: &LibraryId, offset: u32, limit: u32) -> Result<Page<Show>> {
        let response = self
            .api
            .get_items(&self.cancel, library_id.as_str(), "Series", offset, limit)
            .await?;
        let items: Vec<Show> = response
            .items
            .into_iter()
            .map(|item| {
                let image_url = self.image_url(&item);
                convert_show(item, library_id, image_url)
            })
            .collect();
        let total = if response.total_record_count > 0 {
            response.total_record_count as usize
        } else {
            items.len()
        };
        Ok(Page { items, total })
    }

    async fn get_library_content(
        &self,
        library_id: &LibraryId,
        offset: u32,
        limit: u32,
    ) -> Result<Page<MixedItem>> {
        let response = self
            .api
            .get_items(&self.cancel, library_id.as_str(), "Movie,Series", offset, limit)
            .await?;
        let items: Vec<MixedItem> = response
            .items
            .into_iter()
            .map(|item| {
                let image_url = self.image_url(&item);
                match item.item_type.as_deref() {
                    Some("Series") => MixedItem::Show(convert_show(item, library_id, image_url)),
                    _ => MixedItem::Movie(convert_movie(item, library_id, image_url)),
                }
            })
            .collect();
        let total = if response.total_record_count > 0 {
            response.total_record_count as usize
        } else {
            items.len()
        };
        Ok(Page { items, total })
    }

    async fn get_seasons(&self, show_id: &ShowId) -> Result<Vec<Season>> {
        let show_item = self.api.get_item(&self.cancel, show_id.as_str()).await?;
        let show_title = show_item.name.clone();
        let response = self.api.get_seasons(&self.cancel, show_id.as_str()).await?;
        Ok(response
            .items
            .into_iter()
            .map(|item| convert_season(item, show_id, &show_title))
            .collect())
    }

    async fn get_episodes(&self, show_id: &ShowId, season_number: u32) -> Result<Vec<MediaItem>> {
        let seasons = self.api.get_seasons(&self.cancel, show_id.as_str()).await?;
        let season_item = seasons
            .items
            .into_iter()
            .find(|item| item.index_number.unwrap_or(-1) == season_number as i32)
            .ok_or_else(|| KinoError::ItemNotFound(format!("{show_id}:season:{season_number}")))?;

        let library_id = LibraryId::default();
        let response = self
            .api
            .get_items(&self.cancel, &season_item.id, "Episode", 0, 0)
            .await?;
        Ok(response
            .items
            .into_iter()
            .map(|item| {
                let image_url = self.image_url(&item);
                convert_episode(item, &library_id, season_number, image_url)
            })
            .collect())
    }
}

#[async_trait]
impl MetadataRepository for JellyfinAdapter {
    async fn resolve_playable_url(&self, item_id: &MediaItemId) -> Result<String> {
        let playback = self.api.get_playback_info(&self.cancel, item_id.as_str()).await?;
        let source = playback
            .media_sources
            .first()
            .ok_or_else(|| KinoError::MalformedResponse(format!("no media source for {item_id}")))?;
        Ok(self.api.build_stream_url(item_id.as_str(), &source.id))
    }

    async fn mark_played(&self, item_id: &MediaItemId) -> Result<()> {
        self.api.mark_as_watched(&self.cancel, item_id.as_str()).await
    }

    async fn mark_unplayed(&self, item_id: &MediaItemId) -> Result<()> {
        self.api.mark_as_unwatched(&self.cancel, item_id.as_str()).await
    }
}

#[async_trait]
impl PlaylistRepository for JellyfinAdapter {
    async fn get_playlists(&self) -> Result<Vec<Playlist>> {
        let response = self.api.get_playlists(&self.cancel).await?;
        Ok(response.items.into_iter().map(convert_playlist).collect())
    }

    async fn get_playlist_items(&self, playlist_id: &PlaylistId) -> Result<Vec<MediaItem>> {
        let response = self
            .api
            .get_playlist_items(&self.cancel, playlist_id.as_str())
            .await?;
        let library_id = LibraryId::default();
        Ok(response
            .items
            .into_iter()
            .map(|item| {
                let image_url = self.image_url(&item);
                match item.item_type.as_deref() {
                    Some("Episode") => convert_episode(item, &library_id, 0, image_url),
                    _ => convert_movie(item, &library_id, image_url),
                }
            })
            .collect())
    }

    /// Jellyfin allows creating a playlist with zero initial items, unlike Plex.
    async fn create(&self, title: &str, initial_items: &[MediaItemId]) -> Result<Playlist> {
        let ids: Vec<String> = initial_items.iter().map(|id| id.to_string()).collect();
        let playlist_id = self.api.create_playlist(&self.cancel, title, &ids).await?;
        let item = self.api.get_item(&self.cancel, &playlist_id).await?;
        Ok(convert_playlist(item))
    }

    async fn add(&self, playlist_id: &PlaylistId, item_ids: &[MediaItemId]) -> Result<()> {
        let ids: Vec<String> = item_ids.iter().map(|id| id.to_string()).collect();
        self.api.add_to_playlist(&self.cancel, playlist_id.as_str(), &ids).await
    }

    async fn remove(&self, playlist_id: &PlaylistId, item_id: &MediaItemId) -> Result<()> {
        self.api
            .remove_from_playlist(&self.cancel, playlist_id.as_str(), item_id.as_str())
            .await
    }

    async fn delete(&self, playlist_id: &PlaylistId) -> Result<()> {
        self.api.delete_item(&self.cancel, playlist_id.as_str()).await
    }
}

impl MediaAdapter for JellyfinAdapter {
    fn backend_id(&self) -> &BackendId {
        &self.backend_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, name: &str) -> JellyfinItem {
        JellyfinItem {
            id: id.to_string(),
            name: name.to_string(),
            item_type: Some("Movie".into()),
            production_year: Some(2021),
            index_number: Some(4),
            parent_index_number: Some(2),
            premiere_date: None,
            date_created: None,
            run_time_ticks: Some(72_000_000_000),
            overview: Some("summary".into()),
            image_tags: types::ImageTags { primary: Some("abc".into()) },
            user_data: Some(types::UserData {
                played: true,
                play_count: 1,
                playback_position_ticks: Some(600_000_000),
            }),
            series_name: Some("A Show".into()),
            series_id: Some("900".into()),
            parent_id: Some("901".into()),
            child_count: Some(6),
            is_folder: false,
        }
    }

    #[test]
    fn library_kind_maps_collection_types_and_leaves_others_unmapped() {
        assert_eq!(
            library_kind_from_collection_type(&Some("movies".into())),
            Some(LibraryKind::Movie)
        );
        assert_eq!(
            library_kind_from_collection_type(&Some("tvshows".into())),
            Some(LibraryKind::Show)
        );
        // "music" and other collection types are neither movies nor tvshows
        // directly; "mixed" is only assigned via the content-probing rule.
        assert_eq!(library_kind_from_collection_type(&Some("music".into())), None);
        assert_eq!(library_kind_from_collection_type(&None), None);
    }

    #[test]
    fn ticks_convert_to_seconds() {
        let movie = convert_movie(item("1", "A Movie"), &LibraryId::new("l1"), None);
        assert_eq!(movie.duration, Duration::from_secs(7200));
        assert_eq!(movie.view_offset, Duration::from_secs(60));
        assert!(movie.is_played);
    }

    #[test]
    fn episode_conversion_threads_show_linkage() {
        let ep = convert_episode(item("2", "Pilot"), &LibraryId::new("l1"), 2, None);
        let extras = ep.episode.expect("episode extras");
        assert_eq!(extras.show_id.as_str(), "900");
        assert_eq!(extras.season_id.as_str(), "901");
        assert_eq!(extras.episode_number, 4);
    }
}
