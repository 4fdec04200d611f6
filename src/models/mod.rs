mod credentials;
mod entities;
mod ids;

pub use credentials::Credentials;
pub use entities::{
    media_item_watch_status, season_watch_status, show_watch_status, EpisodeExtras, ItemType,
    Library, LibraryKind, ListItem, MediaItem, MediaType, MixedItem, Playlist, PlaylistKind,
    Season, Show, WatchStatus,
};
pub use ids::{BackendId, LibraryId, MediaItemId, PlaylistId, SeasonId, ShowId};
