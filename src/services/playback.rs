use std::sync::Arc;

use crate::backends::traits::{MediaAdapter, MetadataRepository};
use crate::error::Result;
use crate::models::MediaItem;
use crate::player::PlayerLauncher;

/// Given a `MediaItem` and a resume flag: resolves the play URL through the
/// adapter, then hands off to the external player (spec §4.6). On adapter
/// failure the error is surfaced untouched — no retries, the user retries.
pub struct PlaybackService {
    adapter: Arc<dyn MediaAdapter>,
    launcher: PlayerLauncher,
}

impl PlaybackService {
    pub fn new(adapter: Arc<dyn MediaAdapter>, launcher: PlayerLauncher) -> Self {
        Self { adapter, launcher }
    }

    /// `resume` picks `item.view_offset` as the start offset; otherwise 0.
    pub async fn play(&self, item: &MediaItem, resume: bool) -> Result<()> {
        let start_offset = if resume { item.view_offset.as_secs() } else { 0 };
        let url = self.adapter.resolve_playable_url(&item.id).await?;
        self.launcher.launch(&url, start_offset)
    }

    /// The resume decision the drill rule in spec §4.9 makes for a leaf
    /// item: resume iff it has progress and isn't already fully watched.
    pub fn should_resume(item: &MediaItem) -> bool {
        item.view_offset.as_secs() > 0 && !item.is_played
    }

    pub async fn mark_played(&self, item: &MediaItem) -> Result<()> {
        self.adapter.mark_played(&item.id).await
    }

    pub async fn mark_unplayed(&self, item: &MediaItem) -> Result<()> {
        self.adapter.mark_unplayed(&item.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MediaItemId, MediaType};
    use std::time::Duration;

    fn item(view_offset_secs: u64, is_played: bool) -> MediaItem {
        MediaItem {
            id: MediaItemId::new("m1"),
            title: "Arrival".into(),
            sort_title: "arrival".into(),
            parent_library_id: crate::models::LibraryId::new("l1"),
            summary: String::new(),
            release_year: None,
            duration: Duration::from_secs(7200),
            view_offset: Duration::from_secs(view_offset_secs),
            is_played,
            media_type: MediaType::Movie,
            episode: None,
            thumbnail_url: None,
            art_url: None,
            media_url: String::new(),
            added_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn resumes_only_when_progress_exists_and_unwatched() {
        assert!(PlaybackService::should_resume(&item(120, false)));
        assert!(!PlaybackService::should_resume(&item(0, false)));
        assert!(!PlaybackService::should_resume(&item(120, true)));
    }
}
