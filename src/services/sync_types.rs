use std::collections::{HashMap, VecDeque};

use crate::error::KinoError;
use crate::models::{LibraryId, MediaItem, MixedItem, Show};

/// The newly-fetched page carried by a progress event (spec §4.3.1 step 2:
/// `items = this-batch`), tagged by which `get-{kind}` entry point produced
/// it. Cache-hit and failure events carry no batch.
#[derive(Debug, Clone)]
pub enum SyncBatch {
    Empty,
    Movies(Vec<MediaItem>),
    Shows(Vec<Show>),
    Mixed(Vec<MixedItem>),
}

/// One frame of sync progress for a single library (spec §4.3.1). Progress
/// events for a given sync are emitted in strictly increasing `loaded` order;
/// the final event has `done = true` and no further events follow it.
#[derive(Debug, Clone)]
pub struct SyncProgress {
    pub loaded: usize,
    pub total: usize,
    pub done: bool,
    pub from_cache: bool,
    pub items: SyncBatch,
    pub error: Option<KinoError>,
}

impl SyncProgress {
    pub fn cache_hit(count: usize) -> Self {
        Self {
            loaded: count,
            total: count,
            done: true,
            from_cache: true,
            items: SyncBatch::Empty,
            error: None,
        }
    }

    pub fn batch(loaded: usize, total: usize, done: bool, items: SyncBatch) -> Self {
        Self {
            loaded,
            total,
            done,
            from_cache: false,
            items,
            error: None,
        }
    }

    pub fn failed(loaded: usize, total: usize, error: KinoError) -> Self {
        Self {
            loaded,
            total,
            done: true,
            from_cache: false,
            items: SyncBatch::Empty,
            error: Some(error),
        }
    }
}

/// Bounded drop-oldest sink (spec §4.3.1, §5: "the UI only needs the latest +
/// done"). Unlike an mpsc channel, a full sink never blocks the producer.
pub struct ProgressSink {
    events: VecDeque<SyncProgress>,
    capacity: usize,
}

impl ProgressSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, event: SyncProgress) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn drain(&mut self) -> Vec<SyncProgress> {
        self.events.drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for ProgressSink {
    fn default() -> Self {
        Self::new(16)
    }
}

/// Mirrors the teacher's `SyncStatus` (`services/core/sync.rs`), reworked
/// around this spec's freshness-gated algorithm instead of an always-fetch
/// loop: a library that short-circuits on a cache hit is `Completed`
/// immediately, with no `InProgress` frame in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Idle,
    InProgress,
    Completed,
    Failed,
}

#[derive(Debug, Clone)]
pub struct LibrarySyncState {
    pub status: SyncStatus,
    pub loaded: usize,
    pub total: usize,
    pub error: Option<KinoError>,
}

impl Default for LibrarySyncState {
    fn default() -> Self {
        Self {
            status: SyncStatus::Idle,
            loaded: 0,
            total: 0,
            error: None,
        }
    }
}

/// Structured sync status surface (spec-supplemented ambient feature): a
/// per-library status folded from `SyncProgress` events on the UI thread,
/// so a frontend can render a status line per library without re-deriving
/// it from raw progress frames.
#[derive(Debug, Clone, Default)]
pub struct SyncStatusTracker {
    states: HashMap<LibraryId, LibrarySyncState>,
}

impl SyncStatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one progress event for `library_id` into its tracked state.
    pub fn record(&mut self, library_id: LibraryId, progress: &SyncProgress) {
        let state = self.states.entry(library_id).or_default();
        state.loaded = progress.loaded;
        state.total = progress.total;
        state.error = progress.error.clone();
        state.status = match (&progress.error, progress.done) {
            (Some(_), _) => SyncStatus::Failed,
            (None, true) => SyncStatus::Completed,
            (None, false) => SyncStatus::InProgress,
        };
    }

    pub fn get(&self, library_id: &LibraryId) -> Option<&LibrarySyncState> {
        self.states.get(library_id)
    }

    pub fn states(&self) -> &HashMap<LibraryId, LibrarySyncState> {
        &self.states
    }
}
