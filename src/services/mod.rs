pub mod library;
pub mod playback;
pub mod playlist;
pub mod search;
pub mod sync_types;

pub use library::LibraryService;
pub use playback::PlaybackService;
pub use playlist::PlaylistService;
pub use search::{filter_items, fuzzy_match, FilterItem, FilterResult, SearchService};
pub use sync_types::{LibrarySyncState, ProgressSink, SyncBatch, SyncProgress, SyncStatus, SyncStatusTracker};
