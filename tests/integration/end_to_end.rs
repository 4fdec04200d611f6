use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use kino::backends::traits::{LibraryRepository, MediaAdapter, MetadataRepository, Page, PlaylistRepository};
use kino::cache::{keys, Bucket, CacheStore};
use kino::error::{KinoError, Result};
use kino::models::{
    BackendId, Library, LibraryId, LibraryKind, MediaItem, MediaItemId, MediaType, MixedItem, Playlist,
    PlaylistId, Season, Show, ShowId,
};
use kino::navigation::{
    advance_nav_plan_after_load, AdvanceOutcome, AwaitKind, Column, ColumnItems, ColumnStack, NavDriller, NavPlan,
    NavTarget,
};
use kino::services::sync_types::ProgressSink;
use kino::services::{LibraryService, PlaylistService};

fn movie(id: &str, title: &str) -> MediaItem {
    MediaItem {
        id: MediaItemId::new(id),
        title: title.to_string(),
        sort_title: title.to_string(),
        parent_library_id: LibraryId::new("1"),
        summary: String::new(),
        release_year: None,
        duration: std::time::Duration::from_secs(0),
        view_offset: std::time::Duration::from_secs(0),
        is_played: false,
        media_type: MediaType::Movie,
        episode: None,
        thumbnail_url: None,
        art_url: None,
        media_url: String::new(),
        added_at: None,
        updated_at: None,
    }
}

/// A two-library backend whose total page count and failure behavior are
/// driven by the test, used across the cold/warm-start and cancellation
/// scenarios (spec §8.4 #1, #2, #6).
struct ScriptedAdapter {
    backend_id: BackendId,
    total_movies: usize,
    page_size: u32,
    pages_served: AtomicUsize,
    fail_after_pages: Option<usize>,
}

#[async_trait]
impl LibraryRepository for ScriptedAdapter {
    async fn get_libraries(&self) -> Result<Vec<Library>> {
        Ok(vec![Library {
            id: LibraryId::new("1"),
            name: "Movies".into(),
            kind: LibraryKind::Movie,
            server_updated_at: 100,
        }])
    }

    async fn get_movies(&self, _library_id: &LibraryId, offset: u32, _limit: u32) -> Result<Page<MediaItem>> {
        let served = self.pages_served.fetch_add(1, Ordering::SeqCst);
        if let Some(limit) = self.fail_after_pages {
            if served >= limit {
                return Err(KinoError::ServerOffline);
            }
        }
        let start = offset as usize;
        let end = (start + self.page_size as usize).min(self.total_movies);
        let items = (start..end).map(|i| movie(&i.to_string(), &format!("Movie {i}"))).collect();
        Ok(Page { items, total: self.total_movies })
    }

    async fn get_shows(&self, _library_id: &LibraryId, _offset: u32, _limit: u32) -> Result<Page<Show>> {
        Ok(Page { items: vec![], total: 0 })
    }

    async fn get_library_content(&self, _library_id: &LibraryId, _offset: u32, _limit: u32) -> Result<Page<MixedItem>> {
        Ok(Page { items: vec![], total: 0 })
    }

    async fn get_seasons(&self, _show_id: &ShowId) -> Result<Vec<Season>> {
        Ok(vec![])
    }

    async fn get_episodes(&self, _show_id: &ShowId, _season_number: u32) -> Result<Vec<MediaItem>> {
        Ok(vec![])
    }
}

#[async_trait]
impl MetadataRepository for ScriptedAdapter {
    async fn resolve_playable_url(&self, _item_id: &MediaItemId) -> Result<String> {
        Ok(String::new())
    }
    async fn mark_played(&self, _item_id: &MediaItemId) -> Result<()> {
        Ok(())
    }
    async fn mark_unplayed(&self, _item_id: &MediaItemId) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl PlaylistRepository for ScriptedAdapter {
    async fn get_playlists(&self) -> Result<Vec<Playlist>> {
        Ok(vec![])
    }
    async fn get_playlist_items(&self, _playlist_id: &PlaylistId) -> Result<Vec<MediaItem>> {
        Ok(vec![])
    }
    async fn create(&self, _title: &str, _initial_items: &[MediaItemId]) -> Result<Playlist> {
        Err(KinoError::Unsupported("not used in this scenario".into()))
    }
    async fn add(&self, _playlist_id: &PlaylistId, _item_ids: &[MediaItemId]) -> Result<()> {
        Ok(())
    }
    async fn remove(&self, _playlist_id: &PlaylistId, _item_id: &MediaItemId) -> Result<()> {
        Ok(())
    }
    async fn delete(&self, _playlist_id: &PlaylistId) -> Result<()> {
        Ok(())
    }
}

impl MediaAdapter for ScriptedAdapter {
    fn backend_id(&self) -> &BackendId {
        &self.backend_id
    }
}

fn movie_library() -> Library {
    Library {
        id: LibraryId::new("1"),
        name: "Movies".into(),
        kind: LibraryKind::Movie,
        server_updated_at: 100,
    }
}

/// Scenario 1: cold start against an empty cache paginates to completion and
/// leaves the `ts` row and content row both present.
#[tokio::test]
async fn cold_start_syncs_both_pages_and_persists_ts_row() {
    let store = Arc::new(CacheStore::in_memory());
    let adapter = Arc::new(ScriptedAdapter {
        backend_id: BackendId::new("b1"),
        total_movies: 75,
        page_size: 50,
        pages_served: AtomicUsize::new(0),
        fail_after_pages: None,
    });
    let service = LibraryService::new(adapter, store.clone());
    let cancel = CancellationToken::new();
    let mut sink = ProgressSink::default();

    service.sync_library(&movie_library(), &cancel, &mut sink).await.unwrap();

    let events = sink.drain();
    assert_eq!(events.len(), 2, "one progress event per page");
    assert!(events.last().unwrap().done);
    assert_eq!(events.last().unwrap().loaded, 75);

    let cached: Vec<MediaItem> = store.get(Bucket::Content, &keys::content_movies(&LibraryId::new("1"))).await.unwrap();
    assert_eq!(cached.len(), 75);
    let ts: i64 = store.get(Bucket::Content, &keys::content_ts(&LibraryId::new("1"))).await.unwrap();
    assert_eq!(ts, 100);
}

/// Scenario 2: warm start with a fresh `ts` row never calls the adapter and
/// reports a single from-cache progress event.
#[tokio::test]
async fn warm_start_skips_network_when_ts_is_fresh() {
    let store = Arc::new(CacheStore::in_memory());
    let lib_id = LibraryId::new("1");
    store.set(Bucket::Content, &keys::content_movies(&lib_id), &vec![movie("0", "Cached")]).await.unwrap();
    store.set(Bucket::Content, &keys::content_ts(&lib_id), &100i64).await.unwrap();

    let adapter = Arc::new(ScriptedAdapter {
        backend_id: BackendId::new("b1"),
        total_movies: 75,
        page_size: 50,
        pages_served: AtomicUsize::new(0),
        fail_after_pages: None,
    });
    let service = LibraryService::new(adapter.clone(), store);
    let cancel = CancellationToken::new();
    let mut sink = ProgressSink::default();

    service.sync_library(&movie_library(), &cancel, &mut sink).await.unwrap();

    assert_eq!(adapter.pages_served.load(Ordering::SeqCst), 0, "no paginated fetch should occur");
    let events = sink.drain();
    assert_eq!(events.len(), 1);
    assert!(events[0].from_cache);
    assert!(events[0].done);
}

/// Scenario 4: cascade invalidation clears the content, season, and episode
/// rows for a library in one call.
#[tokio::test]
async fn cascade_invalidation_clears_shows_seasons_and_episodes() {
    let store = Arc::new(CacheStore::in_memory());
    let lib_id = LibraryId::new("L");
    let show_id = ShowId::new("S");

    store.set(Bucket::Content, &keys::content_shows(&lib_id), &Vec::<Show>::new()).await.unwrap();
    store.set(Bucket::Seasons, &keys::seasons_for_show(&lib_id, &show_id), &Vec::<Season>::new()).await.unwrap();
    store.set(Bucket::Episodes, &keys::episodes_for_season(&lib_id, &show_id, 1), &Vec::<MediaItem>::new()).await.unwrap();
    store.set(Bucket::Episodes, &keys::episodes_for_season(&lib_id, &show_id, 2), &Vec::<MediaItem>::new()).await.unwrap();

    store.invalidate_library(&lib_id).await.unwrap();

    assert!(store.get::<Vec<Show>>(Bucket::Content, &keys::content_shows(&lib_id)).await.is_none());
    assert!(store.get::<Vec<Season>>(Bucket::Seasons, &keys::seasons_for_show(&lib_id, &show_id)).await.is_none());
    assert!(store
        .get::<Vec<MediaItem>>(Bucket::Episodes, &keys::episodes_for_season(&lib_id, &show_id, 1))
        .await
        .is_none());
    assert!(store
        .get::<Vec<MediaItem>>(Bucket::Episodes, &keys::episodes_for_season(&lib_id, &show_id, 2))
        .await
        .is_none());
}

/// Scenario 6: cancelling mid-sync leaves no partial write and a retry
/// starts from offset 0 again.
#[tokio::test]
async fn cancelling_mid_sync_leaves_the_store_untouched() {
    let store = Arc::new(CacheStore::in_memory());
    let adapter = Arc::new(ScriptedAdapter {
        backend_id: BackendId::new("b1"),
        total_movies: 200,
        page_size: 50,
        pages_served: AtomicUsize::new(0),
        fail_after_pages: None,
    });
    let service = LibraryService::new(adapter.clone(), store.clone());
    let cancel = CancellationToken::new();
    cancel.cancel();
    let mut sink = ProgressSink::default();

    let result = service.sync_library(&movie_library(), &cancel, &mut sink).await;
    assert!(result.is_err());

    let lib_id = LibraryId::new("1");
    assert!(store.get::<Vec<MediaItem>>(Bucket::Content, &keys::content_movies(&lib_id)).await.is_none());
    assert!(store.get::<i64>(Bucket::Content, &keys::content_ts(&lib_id)).await.is_none());
    assert!(!store.is_valid(&lib_id, 100).await);
}

/// Scenario 5: creating a playlist on a backend that only allows non-empty
/// playlists invalidates the cached list so the next read refetches it.
#[tokio::test]
async fn creating_a_playlist_invalidates_the_cached_list() {
    struct PlexLikeAdapter {
        backend_id: BackendId,
    }

    #[async_trait]
    impl LibraryRepository for PlexLikeAdapter {
        async fn get_libraries(&self) -> Result<Vec<Library>> {
            Ok(vec![])
        }
        async fn get_movies(&self, _l: &LibraryId, _o: u32, _li: u32) -> Result<Page<MediaItem>> {
            Ok(Page { items: vec![], total: 0 })
        }
        async fn get_shows(&self, _l: &LibraryId, _o: u32, _li: u32) -> Result<Page<Show>> {
            Ok(Page { items: vec![], total: 0 })
        }
        async fn get_library_content(&self, _l: &LibraryId, _o: u32, _li: u32) -> Result<Page<MixedItem>> {
            Ok(Page { items: vec![], total: 0 })
        }
        async fn get_seasons(&self, _s: &ShowId) -> Result<Vec<Season>> {
            Ok(vec![])
        }
        async fn get_episodes(&self, _s: &ShowId, _n: u32) -> Result<Vec<MediaItem>> {
            Ok(vec![])
        }
    }

    #[async_trait]
    impl MetadataRepository for PlexLikeAdapter {
        async fn resolve_playable_url(&self, _i: &MediaItemId) -> Result<String> {
            Ok(String::new())
        }
        async fn mark_played(&self, _i: &MediaItemId) -> Result<()> {
            Ok(())
        }
        async fn mark_unplayed(&self, _i: &MediaItemId) -> Result<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl PlaylistRepository for PlexLikeAdapter {
        async fn get_playlists(&self) -> Result<Vec<Playlist>> {
            Ok(vec![Playlist {
                id: PlaylistId::new("p1"),
                title: "Favorites".into(),
                kind: kino::models::PlaylistKind::Video,
                is_smart: false,
                item_count: 1,
                total_duration: std::time::Duration::from_secs(60),
                updated_at: chrono::Utc::now(),
            }])
        }
        async fn get_playlist_items(&self, _playlist_id: &PlaylistId) -> Result<Vec<MediaItem>> {
            Ok(vec![movie("m1", "Seed")])
        }
        // Plex-style backends reject empty playlists; `create` requires a
        // non-empty `initial_items` and mirrors that in the returned row.
        async fn create(&self, title: &str, initial_items: &[MediaItemId]) -> Result<Playlist> {
            if initial_items.is_empty() {
                return Err(KinoError::Unsupported("empty playlist creation is rejected".into()));
            }
            Ok(Playlist {
                id: PlaylistId::new("p1"),
                title: title.to_string(),
                kind: kino::models::PlaylistKind::Video,
                is_smart: false,
                item_count: initial_items.len() as u32,
                total_duration: std::time::Duration::from_secs(0),
                updated_at: chrono::Utc::now(),
            })
        }
        async fn add(&self, _playlist_id: &PlaylistId, _item_ids: &[MediaItemId]) -> Result<()> {
            Ok(())
        }
        async fn remove(&self, _playlist_id: &PlaylistId, _item_id: &MediaItemId) -> Result<()> {
            Ok(())
        }
        async fn delete(&self, _playlist_id: &PlaylistId) -> Result<()> {
            Ok(())
        }
    }

    impl MediaAdapter for PlexLikeAdapter {
        fn backend_id(&self) -> &BackendId {
            &self.backend_id
        }
    }

    let store = Arc::new(CacheStore::in_memory());
    let adapter = Arc::new(PlexLikeAdapter { backend_id: BackendId::new("b1") });
    let service = PlaylistService::new(adapter, store.clone());

    store
        .set(Bucket::Playlists, &keys::playlists_list(), &Vec::<Playlist>::new())
        .await
        .unwrap();

    let result = service.create("", &[]).await;
    assert!(result.is_err(), "empty initial items must be rejected on this backend");

    let created = service.create("Favorites", &[MediaItemId::new("m1")]).await.unwrap();
    assert_eq!(created.item_count, 1);

    assert!(
        store.get::<Vec<Playlist>>(Bucket::Playlists, &keys::playlists_list()).await.is_none(),
        "the cached playlist list must be invalidated after create"
    );

    let refreshed = service.sync_playlists().await.unwrap();
    assert_eq!(refreshed.len(), 1);
    assert_eq!(refreshed[0].title, "Favorites");
}

/// Scenario 3: a deep-link nav plan drills library -> shows -> seasons ->
/// episodes, landing on the target episode without ever showing a stale
/// selection, and aborts cleanly if a step's target can't be found.
struct ScriptedDriller {
    selects: Vec<bool>,
    drills: Vec<(AwaitKind, String)>,
    refreshed: usize,
}

impl NavDriller for ScriptedDriller {
    fn select_on_top(&mut self, _stack: &mut ColumnStack, _target_id: &str) -> bool {
        self.selects.remove(0)
    }

    fn drill_selected(&mut self, _stack: &mut ColumnStack) -> (AwaitKind, String) {
        self.drills.remove(0)
    }

    fn refresh_inspector(&mut self, _stack: &ColumnStack) {
        self.refreshed += 1;
    }
}

fn stack_with_one_column() -> ColumnStack {
    let mut stack = ColumnStack::new();
    stack.reset(Column::new("Libraries", ColumnItems::Libraries(vec![])));
    stack
}

#[tokio::test]
async fn deep_link_plan_drills_through_every_level_without_a_stale_selection() {
    let mut stack = stack_with_one_column();
    let mut driller = ScriptedDriller {
        selects: vec![true, true, true, true],
        drills: vec![
            (AwaitKind::Shows, "breaking-bad".into()),
            (AwaitKind::Seasons, "season-3".into()),
            (AwaitKind::Episodes, "s03e05".into()),
        ],
        refreshed: 0,
    };

    let mut plan = Some(NavPlan::new(
        vec![
            NavTarget::select("breaking-bad"),
            NavTarget::select("season-3"),
            NavTarget::select("s03e05"),
            NavTarget::land(),
        ],
        AwaitKind::Shows,
        "breaking-bad".into(),
    ));

    let outcome = advance_nav_plan_after_load(&mut plan, &mut stack, &mut driller, AwaitKind::Shows, "breaking-bad");
    assert_eq!(outcome, AdvanceOutcome::Continued);
    assert!(plan.is_some());

    let outcome = advance_nav_plan_after_load(&mut plan, &mut stack, &mut driller, AwaitKind::Seasons, "season-3");
    assert_eq!(outcome, AdvanceOutcome::Continued);
    assert!(plan.is_some());

    let outcome = advance_nav_plan_after_load(&mut plan, &mut stack, &mut driller, AwaitKind::Episodes, "s03e05");
    assert_eq!(outcome, AdvanceOutcome::Completed);
    assert!(plan.is_none(), "a completed plan clears itself");
    assert_eq!(driller.refreshed, 1, "the inspector refreshes exactly once, on completion");
}

#[tokio::test]
async fn deep_link_plan_cancels_with_an_error_when_a_step_cannot_select() {
    let mut stack = stack_with_one_column();
    let mut driller = ScriptedDriller { selects: vec![false], drills: vec![], refreshed: 0 };

    let mut plan = Some(NavPlan::new(
        vec![NavTarget::select("missing-show"), NavTarget::land()],
        AwaitKind::Shows,
        "missing-show".into(),
    ));

    let outcome = advance_nav_plan_after_load(&mut plan, &mut stack, &mut driller, AwaitKind::Shows, "missing-show");
    assert_eq!(outcome, AdvanceOutcome::SelectionFailed);
    assert!(plan.is_none(), "the plan is cancelled rather than left dangling");
}
