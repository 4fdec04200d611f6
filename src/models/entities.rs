use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::ids::{LibraryId, MediaItemId, PlaylistId, SeasonId, ShowId};

/// A top-level container on the media server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Library {
    pub id: LibraryId,
    pub name: String,
    pub kind: LibraryKind,
    /// The server's own content-change timestamp; drives freshness (§3.1).
    /// The client never invents this value.
    pub server_updated_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryKind {
    Movie,
    Show,
    Mixed,
    Playlist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Episode,
}

/// Extra attributes only present when `media_type == Episode`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeExtras {
    pub show_title: String,
    pub show_id: ShowId,
    pub season_number: u32,
    pub episode_number: u32,
    /// The season this episode belongs to; doubles as `MediaItem::parent_id`.
    pub season_id: SeasonId,
}

/// A playable leaf: a movie or an episode (spec §3.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: MediaItemId,
    pub title: String,
    pub sort_title: String,
    pub parent_library_id: LibraryId,
    pub summary: String,
    pub release_year: Option<u32>,
    pub duration: Duration,
    pub view_offset: Duration,
    pub is_played: bool,
    pub media_type: MediaType,
    pub episode: Option<EpisodeExtras>,
    pub thumbnail_url: Option<String>,
    pub art_url: Option<String>,
    /// Resolved direct-play URL; empty until `resolve_playable_url` is called.
    pub media_url: String,
    pub added_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl MediaItem {
    /// Enforces the invariant from §3.1: episode extras are present iff
    /// `media_type == Episode`.
    pub fn is_consistent(&self) -> bool {
        match self.media_type {
            MediaType::Episode => self.episode.is_some(),
            MediaType::Movie => self.episode.is_none(),
        }
    }

    pub fn parent_id(&self) -> Option<&SeasonId> {
        self.episode.as_ref().map(|e| &e.season_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Show {
    pub id: ShowId,
    pub title: String,
    pub sort_title: String,
    pub library_id: LibraryId,
    pub summary: String,
    pub year: Option<u32>,
    pub season_count: u32,
    pub episode_count: u32,
    pub unwatched_count: u32,
    pub added_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Show {
    /// `0 <= unwatched_count <= episode_count` (§3.1 invariant).
    pub fn is_consistent(&self) -> bool {
        self.unwatched_count <= self.episode_count
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Season {
    pub id: SeasonId,
    pub show_id: ShowId,
    pub show_title: String,
    /// 0 = specials.
    pub season_number: u32,
    /// "Season N", or "Specials" for season 0 (spec §3.1: every `ListItem`
    /// exposes a meaningful title, not the parent show's).
    pub label: String,
    pub episode_count: u32,
    pub unwatched_count: u32,
    pub added_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Season {
    pub fn label_for(season_number: u32) -> String {
        if season_number == 0 {
            "Specials".to_string()
        } else {
            format!("Season {season_number}")
        }
    }

    pub fn display_title(&self) -> String {
        self.label.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaylistKind {
    Video,
    Audio,
    Photo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: PlaylistId,
    pub title: String,
    pub kind: PlaylistKind,
    pub is_smart: bool,
    pub item_count: u32,
    pub total_duration: Duration,
    pub updated_at: DateTime<Utc>,
}

/// The tagged-sum representation of a mixed library's content (§3.3): a
/// library row may hold either a movie or a show, never discriminated by
/// field-set, only by this explicit tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "item")]
pub enum MixedItem {
    Movie(MediaItem),
    Show(Show),
}

/// Derived watch status (§3.2). Never persisted; always recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WatchStatus {
    Watched,
    InProgress,
    Unwatched,
}

pub fn media_item_watch_status(item: &MediaItem) -> WatchStatus {
    if item.is_played {
        return WatchStatus::Watched;
    }
    if item.view_offset > Duration::ZERO {
        return WatchStatus::InProgress;
    }
    WatchStatus::Unwatched
}

pub fn show_watch_status(show: &Show) -> WatchStatus {
    if show.unwatched_count == 0 {
        WatchStatus::Watched
    } else if show.unwatched_count < show.episode_count {
        WatchStatus::InProgress
    } else {
        WatchStatus::Unwatched
    }
}

pub fn season_watch_status(season: &Season) -> WatchStatus {
    if season.unwatched_count == 0 {
        WatchStatus::Watched
    } else if season.unwatched_count < season.episode_count {
        WatchStatus::InProgress
    } else {
        WatchStatus::Unwatched
    }
}

/// The capability every entity kind exposes to the column stack and search
/// layers (spec §3.1, "ListItem capability").
pub trait ListItem {
    fn get_id(&self) -> String;
    fn get_title(&self) -> &str;
    fn get_sort_title(&self) -> &str;
    fn get_description(&self) -> &str;
    fn get_item_type(&self) -> ItemType;
    fn get_watch_status(&self) -> WatchStatus;
    fn can_drill_down(&self) -> bool;
    fn get_added_at(&self) -> Option<DateTime<Utc>>;
    fn get_updated_at(&self) -> Option<DateTime<Utc>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemType {
    Library,
    Movie,
    Episode,
    Show,
    Season,
    Playlist,
}

impl ListItem for Library {
    fn get_id(&self) -> String {
        self.id.as_str().to_string()
    }
    fn get_title(&self) -> &str {
        &self.name
    }
    fn get_sort_title(&self) -> &str {
        &self.name
    }
    fn get_description(&self) -> &str {
        ""
    }
    fn get_item_type(&self) -> ItemType {
        ItemType::Library
    }
    fn get_watch_status(&self) -> WatchStatus {
        WatchStatus::Unwatched
    }
    fn can_drill_down(&self) -> bool {
        true
    }
    fn get_added_at(&self) -> Option<DateTime<Utc>> {
        None
    }
    fn get_updated_at(&self) -> Option<DateTime<Utc>> {
        None
    }
}

impl ListItem for MediaItem {
    fn get_id(&self) -> String {
        self.id.as_str().to_string()
    }
    fn get_title(&self) -> &str {
        &self.title
    }
    fn get_sort_title(&self) -> &str {
        &self.sort_title
    }
    fn get_description(&self) -> &str {
        &self.summary
    }
    fn get_item_type(&self) -> ItemType {
        match self.media_type {
            MediaType::Movie => ItemType::Movie,
            MediaType::Episode => ItemType::Episode,
        }
    }
    fn get_watch_status(&self) -> WatchStatus {
        media_item_watch_status(self)
    }
    fn can_drill_down(&self) -> bool {
        false
    }
    fn get_added_at(&self) -> Option<DateTime<Utc>> {
        self.added_at
    }
    fn get_updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl ListItem for Show {
    fn get_id(&self) -> String {
        self.id.as_str().to_string()
    }
    fn get_title(&self) -> &str {
        &self.title
    }
    fn get_sort_title(&self) -> &str {
        &self.sort_title
    }
    fn get_description(&self) -> &str {
        &self.summary
    }
    fn get_item_type(&self) -> ItemType {
        ItemType::Show
    }
    fn get_watch_status(&self) -> WatchStatus {
        show_watch_status(self)
    }
    fn can_drill_down(&self) -> bool {
        true
    }
    fn get_added_at(&self) -> Option<DateTime<Utc>> {
        self.added_at
    }
    fn get_updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl ListItem for Season {
    fn get_id(&self) -> String {
        self.id.as_str().to_string()
    }
    fn get_title(&self) -> &str {
        &self.label
    }
    fn get_sort_title(&self) -> &str {
        &self.show_title
    }
    fn get_description(&self) -> &str {
        ""
    }
    fn get_item_type(&self) -> ItemType {
        ItemType::Season
    }
    fn get_watch_status(&self) -> WatchStatus {
        season_watch_status(self)
    }
    fn can_drill_down(&self) -> bool {
        true
    }
    fn get_added_at(&self) -> Option<DateTime<Utc>> {
        self.added_at
    }
    fn get_updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl ListItem for Playlist {
    fn get_id(&self) -> String {
        self.id.as_str().to_string()
    }
    fn get_title(&self) -> &str {
        &self.title
    }
    fn get_sort_title(&self) -> &str {
        &self.title
    }
    fn get_description(&self) -> &str {
        ""
    }
    fn get_item_type(&self) -> ItemType {
        ItemType::Playlist
    }
    fn get_watch_status(&self) -> WatchStatus {
        WatchStatus::Unwatched
    }
    fn can_drill_down(&self) -> bool {
        true
    }
    fn get_added_at(&self) -> Option<DateTime<Utc>> {
        None
    }
    fn get_updated_at(&self) -> Option<DateTime<Utc>> {
        Some(self.updated_at)
    }
}

impl MixedItem {
    pub fn title(&self) -> &str {
        match self {
            MixedItem::Movie(m) => &m.title,
            MixedItem::Show(s) => &s.title,
        }
    }
}

impl ListItem for MixedItem {
    fn get_id(&self) -> String {
        match self {
            MixedItem::Movie(m) => m.get_id(),
            MixedItem::Show(s) => s.get_id(),
        }
    }
    fn get_title(&self) -> &str {
        match self {
            MixedItem::Movie(m) => m.get_title(),
            MixedItem::Show(s) => s.get_title(),
        }
    }
    fn get_sort_title(&self) -> &str {
        match self {
            MixedItem::Movie(m) => m.get_sort_title(),
            MixedItem::Show(s) => s.get_sort_title(),
        }
    }
    fn get_description(&self) -> &str {
        match self {
            MixedItem::Movie(m) => m.get_description(),
            MixedItem::Show(s) => s.get_description(),
        }
    }
    fn get_item_type(&self) -> ItemType {
        match self {
            MixedItem::Movie(m) => m.get_item_type(),
            MixedItem::Show(s) => s.get_item_type(),
        }
    }
    fn get_watch_status(&self) -> WatchStatus {
        match self {
            MixedItem::Movie(m) => m.get_watch_status(),
            MixedItem::Show(s) => s.get_watch_status(),
        }
    }
    fn can_drill_down(&self) -> bool {
        match self {
            MixedItem::Movie(m) => m.can_drill_down(),
            MixedItem::Show(s) => s.can_drill_down(),
        }
    }
    fn get_added_at(&self) -> Option<DateTime<Utc>> {
        match self {
            MixedItem::Movie(m) => m.get_added_at(),
            MixedItem::Show(s) => s.get_added_at(),
        }
    }
    fn get_updated_at(&self) -> Option<DateTime<Utc>> {
        match self {
            MixedItem::Movie(m) => m.get_updated_at(),
            MixedItem::Show(s) => s.get_updated_at(),
        }
    }
}
