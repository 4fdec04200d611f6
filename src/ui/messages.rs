use crate::error::KinoError;
use crate::models::{Library, LibraryId, MediaItem, MediaItemId, MixedItem, Playlist, PlaylistId, Season, Show, ShowId};
use crate::navigation::AwaitKind;
use crate::services::SyncProgress;

/// The opaque message taxonomy the single-threaded event loop dispatches
/// (spec §2 component 9, §5 "the UI runs as a single-threaded cooperative
/// event loop processing discrete messages").
#[derive(Debug, Clone)]
pub enum Message {
    /// A terminal input event was read.
    Input(InputEvent),
    /// The periodic render/spinner tick.
    Tick,
    /// A library sync emitted a progress frame.
    SyncProgress { library_id: LibraryId, progress: SyncProgress },
    /// A column's content finished loading.
    LoadCompleted(LoadCompletion),
    /// A column's content failed to load.
    LoadFailed { kind: AwaitKind, id: String, error: KinoError },
    /// A background operation (mark played, playlist mutation, playback
    /// launch) finished.
    OperationCompleted(OperationResult),
    /// A modal dialog produced a user decision.
    ModalAction(ModalAction),
    /// A transient status line's display window elapsed (spec §7, 3-5s).
    StatusExpired,
}

#[derive(Debug, Clone)]
pub enum InputEvent {
    Up,
    Down,
    DrillIn,
    DrillOut,
    FilterChar(char),
    FilterBackspace,
    FilterToggle,
    PlayOrMark,
    Cancel,
    Quit,
}

#[derive(Debug, Clone)]
pub enum LoadCompletion {
    Libraries(Vec<Library>),
    Movies { library_id: LibraryId, items: Vec<MediaItem> },
    Shows { library_id: LibraryId, items: Vec<Show> },
    Mixed { library_id: LibraryId, items: Vec<MixedItem> },
    Seasons { show_id: ShowId, items: Vec<Season> },
    Episodes { show_id: ShowId, season_number: u32, items: Vec<MediaItem> },
    Playlists(Vec<Playlist>),
    PlaylistItems { playlist_id: PlaylistId, items: Vec<MediaItem> },
}

impl LoadCompletion {
    /// The `(kind, id)` pair a nav plan matches against (spec §4.8).
    pub fn await_pair(&self) -> (AwaitKind, String) {
        match self {
            LoadCompletion::Libraries(_) => (AwaitKind::None, String::new()),
            LoadCompletion::Movies { library_id, .. } => (AwaitKind::Movies, library_id.to_string()),
            LoadCompletion::Shows { library_id, .. } => (AwaitKind::Shows, library_id.to_string()),
            LoadCompletion::Mixed { library_id, .. } => (AwaitKind::Mixed, library_id.to_string()),
            LoadCompletion::Seasons { show_id, .. } => (AwaitKind::Seasons, show_id.to_string()),
            LoadCompletion::Episodes { show_id, .. } => (AwaitKind::Episodes, show_id.to_string()),
            LoadCompletion::Playlists(_) => (AwaitKind::None, String::new()),
            LoadCompletion::PlaylistItems { .. } => (AwaitKind::None, String::new()),
        }
    }
}

#[derive(Debug, Clone)]
pub enum OperationResult {
    Played { item_id: MediaItemId, result: Result<(), KinoError> },
    Unplayed { item_id: MediaItemId, result: Result<(), KinoError> },
    PlaybackLaunched { item_id: MediaItemId, result: Result<(), KinoError> },
    PlaylistCreated(Result<Playlist, KinoError>),
    PlaylistMutated { playlist_id: PlaylistId, result: Result<(), KinoError> },
}

#[derive(Debug, Clone)]
pub enum ModalAction {
    ConfirmDelete { playlist_id: PlaylistId },
    Dismiss,
    ReauthenticateAccepted,
}
