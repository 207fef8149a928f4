use super::*;
use async_trait::async_trait;
use chrono::Duration as ChronoDuration;
use media_retention_config::{Config, SharedConfig};
use media_retention_models::{JobStatus, RequestStatus, Requester};
use media_retention_sources::{MovieCatalog, RequestSource, SourceError, TvCatalog, WatchHistorySource};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex as StdMutex;
use tokio::sync::Notify;
use crate::cache::TtlCache;

// ----- mock collaborators -----

#[derive(Default)]
struct MockMovies {
    movies: StdMutex<Vec<CatalogMovie>>,
    deleted: StdMutex<Vec<u64>>,
    fail_list: bool,
    fail_delete_for: Option<u64>,
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

#[async_trait]
impl MovieCatalog for MockMovies {
    fn source_name(&self) -> &str {
        "radarr"
    }

    async fn list_movies(&self) -> Result<Vec<CatalogMovie>, SourceError> {
        if let Some((entered, release)) = &self.gate {
            entered.notify_one();
            release.notified().await;
        }
        if self.fail_list {
            return Err(SourceError::new("radarr", "connection refused"));
        }
        Ok(self.movies.lock().unwrap().clone())
    }

    async fn delete_movie(&self, id: u64, _delete_files: bool) -> Result<(), SourceError> {
        if self.fail_delete_for == Some(id) {
            return Err(SourceError::new("radarr", "delete rejected"));
        }
        self.deleted.lock().unwrap().push(id);
        self.movies.lock().unwrap().retain(|m| m.id != id);
        Ok(())
    }
}

#[derive(Default)]
struct MockShows {
    name: Option<&'static str>,
    series: Vec<CatalogSeries>,
    deleted: StdMutex<Vec<u64>>,
}

#[async_trait]
impl TvCatalog for MockShows {
    fn source_name(&self) -> &str {
        self.name.unwrap_or("sonarr")
    }

    async fn list_series(&self) -> Result<Vec<CatalogSeries>, SourceError> {
        Ok(self.series.clone())
    }

    async fn delete_series(&self, id: u64, _delete_files: bool) -> Result<(), SourceError> {
        self.deleted.lock().unwrap().push(id);
        Ok(())
    }
}

#[derive(Default)]
struct MockHistory {
    name: &'static str,
    records: StdMutex<Vec<PlayRecord>>,
    fail: bool,
    fail_refresh: bool,
    refreshes: AtomicUsize,
}

#[async_trait]
impl WatchHistorySource for MockHistory {
    fn source_name(&self) -> &str {
        self.name
    }

    async fn list_played(&self) -> Result<Vec<PlayRecord>, SourceError> {
        if self.fail {
            return Err(SourceError::new(self.name, "timeout"));
        }
        Ok(self.records.lock().unwrap().clone())
    }

    async fn refresh_library(&self) -> Result<(), SourceError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        if self.fail_refresh {
            return Err(SourceError::new(self.name, "refresh failed"));
        }
        Ok(())
    }
}

#[derive(Default)]
struct MockRequests {
    requests: StdMutex<Vec<MediaRequest>>,
}

#[async_trait]
impl RequestSource for MockRequests {
    fn source_name(&self) -> &str {
        "overseerr"
    }

    async fn list_requests(&self) -> Result<Vec<MediaRequest>, SourceError> {
        Ok(self.requests.lock().unwrap().clone())
    }
}

// ----- fixtures -----

fn movie(id: u64, title: &str, tmdb: u64, added_days_ago: i64) -> CatalogMovie {
    CatalogMovie {
        id,
        title: title.to_string(),
        year: Some(2001),
        tmdb_id: Some(tmdb),
        imdb_id: None,
        tags: Vec::new(),
        has_file: true,
        path: Some(format!("/movies/{}", title)),
        size_on_disk: 4_000_000_000,
        added: Utc::now() - ChronoDuration::days(added_days_ago),
    }
}

fn series(id: u64, title: &str, tvdb: u64, added_days_ago: i64) -> CatalogSeries {
    CatalogSeries {
        id,
        title: title.to_string(),
        year: Some(2004),
        tvdb_id: Some(tvdb),
        imdb_id: None,
        tags: Vec::new(),
        path: Some(format!("/tv/{}", title)),
        size_on_disk: 20_000_000_000,
        episode_file_count: 12,
        added: Utc::now() - ChronoDuration::days(added_days_ago),
    }
}

fn played(media_type: MediaType, title: &str, id: u64, days_ago: i64, count: u32) -> PlayRecord {
    let mut ids = media_retention_models::MediaIds::default();
    match media_type {
        MediaType::Movie => ids.tmdb_id = Some(id),
        MediaType::Show => ids.tvdb_id = Some(id),
    }
    PlayRecord {
        media_type,
        server_id: format!("srv-{}", id),
        title: title.to_string(),
        year: None,
        ids,
        last_played: Some(Utc::now() - ChronoDuration::days(days_ago)),
        play_count: count,
    }
}

fn request(media_type: MediaType, id: u64, status: RequestStatus, user_id: u64) -> MediaRequest {
    let mut ids = media_retention_models::MediaIds::default();
    match media_type {
        MediaType::Movie => ids.tmdb_id = Some(id),
        MediaType::Show => ids.tvdb_id = Some(id),
    }
    MediaRequest {
        media_type,
        ids,
        status,
        requested_by: Some(Requester {
            user_id: Some(user_id),
            ..Requester::default()
        }),
    }
}

struct Harness {
    engine: Arc<SyncEngine>,
    config: Arc<SharedConfig>,
    cache: Arc<TtlCache>,
    _dir: tempfile::TempDir,
}

fn harness(config: Config, sources: SourceSet) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let config = Arc::new(SharedConfig::new(config));
    let exclusions = Arc::new(ExclusionStore::load(&dir.path().join("exclusions.json")).unwrap());
    let jobs = Arc::new(JobLedger::load(&dir.path().join("jobs.json"), 20).unwrap());
    let cache = Arc::new(TtlCache::new(Duration::from_secs(300)));
    let engine = Arc::new(SyncEngine::new(config.clone(), sources, exclusions, jobs, cache.clone()));
    Harness {
        engine,
        config,
        cache,
        _dir: dir,
    }
}

fn deleting_config() -> Config {
    let mut config = Config::default();
    config.app.enable_deletion = true;
    config.app.dry_run = false;
    config
}

// ----- ingest -----

#[tokio::test]
async fn test_ingest_skips_items_without_files() {
    let mut missing = movie(2, "Ronin", 8195, 10);
    missing.has_file = false;
    let movies = Arc::new(MockMovies {
        movies: StdMutex::new(vec![movie(1, "Heat", 949, 10), missing]),
        ..MockMovies::default()
    });
    let mut empty_show = series(5, "Lost", 73739, 10);
    empty_show.episode_file_count = 0;
    let shows = Arc::new(MockShows {
        series: vec![series(4, "The Wire", 79126, 10), empty_show],
        ..MockShows::default()
    });
    let h = harness(
        Config::default(),
        SourceSet::new().with_movie_catalog(movies).with_tv_catalog(shows),
    );

    assert_eq!(h.engine.ingest_movies().await.unwrap(), 1);
    assert_eq!(h.engine.ingest_shows().await.unwrap(), 1);

    let heat = h.engine.get_media_by_id("radarr-1").await.unwrap();
    assert_eq!(heat.ids.movie_catalog_id, Some(1));
    assert_eq!(heat.ids.tmdb_id, Some(949));
    assert!(h.engine.get_media_by_id("radarr-2").await.is_none());
    let wire = h.engine.get_media_by_id("sonarr-4").await.unwrap();
    assert_eq!(wire.ids.tv_catalog_id, Some(4));
    assert_eq!(h.engine.get_media_count().await, 2);
}

#[tokio::test]
async fn test_catalogs_sharing_a_name_never_merge_items() {
    let movies = Arc::new(MockMovies {
        movies: StdMutex::new(vec![movie(5, "Heat", 949, 10)]),
        ..MockMovies::default()
    });
    let shows = Arc::new(MockShows {
        name: Some("radarr"),
        series: vec![series(5, "The Wire", 79126, 10)],
        ..MockShows::default()
    });
    let h = harness(
        Config::default(),
        SourceSet::new().with_movie_catalog(movies.clone()).with_tv_catalog(shows.clone()),
    );

    let job = h.engine.full_reconciliation().await.unwrap();
    assert_eq!(job.summary["movies"], serde_json::json!(1));
    assert_eq!(job.summary["shows"], serde_json::json!(0));
    assert_eq!(h.engine.get_media_count().await, 1);

    let heat = h.engine.get_media_by_id("radarr-5").await.unwrap();
    assert_eq!(heat.media_type, MediaType::Movie);
    assert_eq!(heat.title, "Heat");
    assert_eq!(heat.ids.movie_catalog_id, Some(5));
    assert!(heat.ids.tv_catalog_id.is_none());

    h.engine.delete_media("radarr-5", false).await.unwrap();
    assert_eq!(*movies.deleted.lock().unwrap(), vec![5]);
    assert!(shows.deleted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_reingest_is_idempotent_and_keeps_watch_state() {
    let movies = Arc::new(MockMovies {
        movies: StdMutex::new(vec![movie(1, "Heat", 949, 10)]),
        ..MockMovies::default()
    });
    let history = Arc::new(MockHistory {
        name: "plex",
        records: StdMutex::new(vec![played(MediaType::Movie, "Heat", 949, 3, 2)]),
        ..MockHistory::default()
    });
    let h = harness(
        Config::default(),
        SourceSet::new().with_movie_catalog(movies).with_watch_history(history),
    );

    h.engine.ingest_movies().await.unwrap();
    h.engine.sync_watch_history().await.unwrap();
    let first = h.engine.get_media_library_snapshot().await;

    h.engine.ingest_movies().await.unwrap();
    let second = h.engine.get_media_library_snapshot().await;
    assert_eq!(first, second);
    assert_eq!(second["radarr-1"].watch_count, 2);
}

#[tokio::test]
async fn test_ingest_drops_items_removed_upstream() {
    let movies = Arc::new(MockMovies {
        movies: StdMutex::new(vec![movie(1, "Heat", 949, 10), movie(2, "Ronin", 8195, 10)]),
        ..MockMovies::default()
    });
    let h = harness(Config::default(), SourceSet::new().with_movie_catalog(movies.clone()));

    h.engine.ingest_movies().await.unwrap();
    movies.movies.lock().unwrap().retain(|m| m.id != 2);
    h.engine.ingest_movies().await.unwrap();

    assert!(h.engine.get_media_by_id("radarr-1").await.is_some());
    assert!(h.engine.get_media_by_id("radarr-2").await.is_none());
}

// ----- matching -----

#[tokio::test]
async fn test_watch_history_match_states() {
    let movies = Arc::new(MockMovies {
        movies: StdMutex::new(vec![
            movie(1, "Heat", 949, 10),
            movie(2, "Ronin", 8195, 10),
            movie(3, "Collateral", 1538, 10),
        ]),
        ..MockMovies::default()
    });
    let history = Arc::new(MockHistory {
        name: "plex",
        records: StdMutex::new(vec![
            played(MediaType::Movie, "Heat", 949, 3, 2),
            // Same title, different id: metadata drift between systems
            played(MediaType::Movie, "RONIN", 99999, 1, 1),
        ]),
        ..MockHistory::default()
    });
    let h = harness(
        Config::default(),
        SourceSet::new().with_movie_catalog(movies).with_watch_history(history),
    );

    h.engine.ingest_movies().await.unwrap();
    assert_eq!(h.engine.sync_watch_history().await.unwrap(), 1);

    let heat = h.engine.get_media_by_id("radarr-1").await.unwrap();
    assert_eq!(heat.watch_match, Some(MatchStatus::Matched));
    assert_eq!(heat.watch_count, 2);
    assert_eq!(heat.ids.server_id.as_deref(), Some("srv-949"));
    assert!(heat.last_watched.is_some());

    let ronin = h.engine.get_media_by_id("radarr-2").await.unwrap();
    assert_eq!(ronin.watch_match, Some(MatchStatus::MetadataMismatch));
    assert!(ronin.watch_match_detail.unwrap().contains("tmdb 8195"));
    // A title-only match never counts as watched
    assert!(ronin.last_watched.is_none());

    let collateral = h.engine.get_media_by_id("radarr-3").await.unwrap();
    assert_eq!(collateral.watch_match, Some(MatchStatus::NotFound));
}

#[tokio::test]
async fn test_secondary_watch_history_merges() {
    let movies = Arc::new(MockMovies {
        movies: StdMutex::new(vec![movie(1, "Heat", 949, 100), movie(2, "Ronin", 8195, 100)]),
        ..MockMovies::default()
    });
    let primary = Arc::new(MockHistory {
        name: "plex",
        records: StdMutex::new(vec![played(MediaType::Movie, "Heat", 949, 30, 5)]),
        ..MockHistory::default()
    });
    let secondary = Arc::new(MockHistory {
        name: "jellyfin",
        records: StdMutex::new(vec![
            played(MediaType::Movie, "Heat", 949, 2, 1),
            played(MediaType::Movie, "Ronin", 8195, 10, 3),
        ]),
        ..MockHistory::default()
    });
    let h = harness(
        Config::default(),
        SourceSet::new()
            .with_movie_catalog(movies)
            .with_watch_history(primary)
            .with_secondary_watch_history(secondary),
    );

    h.engine.ingest_movies().await.unwrap();
    h.engine.sync_watch_history().await.unwrap();
    assert_eq!(h.engine.sync_secondary_watch_history().await.unwrap(), 2);

    let heat = h.engine.get_media_by_id("radarr-1").await.unwrap();
    assert_eq!(heat.watch_count, 5);
    let days_since = (Utc::now() - heat.last_watched.unwrap()).num_days();
    assert_eq!(days_since, 2);

    let ronin = h.engine.get_media_by_id("radarr-2").await.unwrap();
    assert_eq!(ronin.watch_match, Some(MatchStatus::Matched));
    assert_eq!(ronin.watch_count, 3);
}

#[tokio::test]
async fn test_requests_mark_only_approved_or_available() {
    let movies = Arc::new(MockMovies {
        movies: StdMutex::new(vec![movie(1, "Heat", 949, 10), movie(2, "Ronin", 8195, 10)]),
        ..MockMovies::default()
    });
    let shows = Arc::new(MockShows {
        series: vec![series(4, "The Wire", 79126, 10)],
        ..MockShows::default()
    });
    let requests = Arc::new(MockRequests {
        requests: StdMutex::new(vec![
            request(MediaType::Movie, 949, RequestStatus::Approved, 42),
            request(MediaType::Movie, 8195, RequestStatus::Pending, 7),
            request(MediaType::Show, 79126, RequestStatus::Available, 9),
        ]),
    });
    let h = harness(
        Config::default(),
        SourceSet::new()
            .with_movie_catalog(movies)
            .with_tv_catalog(shows)
            .with_requests(requests.clone()),
    );

    h.engine.ingest_movies().await.unwrap();
    h.engine.ingest_shows().await.unwrap();
    assert_eq!(h.engine.sync_requests().await.unwrap(), 2);

    let heat = h.engine.get_media_by_id("radarr-1").await.unwrap();
    assert!(heat.is_requested);
    assert_eq!(heat.requested_by.unwrap().user_id, Some(42));
    assert!(!h.engine.get_media_by_id("radarr-2").await.unwrap().is_requested);
    assert!(h.engine.get_media_by_id("sonarr-4").await.unwrap().is_requested);

    // Requests that disappear upstream clear the flag on the next pass
    requests.requests.lock().unwrap().clear();
    assert_eq!(h.engine.sync_requests().await.unwrap(), 0);
    let heat = h.engine.get_media_by_id("radarr-1").await.unwrap();
    assert!(!heat.is_requested);
    assert!(heat.requested_by.is_none());
}

// ----- full reconciliation -----

#[tokio::test]
async fn test_full_reconciliation_dry_run_reports_candidates() {
    let movies = Arc::new(MockMovies {
        movies: StdMutex::new(vec![movie(1, "Heat", 949, 120), movie(2, "Ronin", 8195, 10)]),
        ..MockMovies::default()
    });
    let h = harness(Config::default(), SourceSet::new().with_movie_catalog(movies.clone()));

    let job = h.engine.full_reconciliation().await.unwrap();
    assert_eq!(job.kind, JobKind::FullSync);
    assert_eq!(job.status, JobStatus::Completed);
    assert!(job.error.is_none());
    assert_eq!(job.summary["movies"], serde_json::json!(2));
    assert_eq!(job.summary["scheduled_deletions"], serde_json::json!(1));
    assert_eq!(job.summary["deleted"], serde_json::json!(0));
    assert_eq!(job.summary["dry_run"], serde_json::json!(true));
    assert_eq!(job.summary["deletion_enabled"], serde_json::json!(false));
    assert_eq!(job.summary["candidates"][0]["id"], serde_json::json!("radarr-1"));

    // Dry run leaves the catalog and collection untouched
    assert!(movies.deleted.lock().unwrap().is_empty());
    assert_eq!(h.engine.get_media_count().await, 2);

    let heat = h.engine.get_media_by_id("radarr-1").await.unwrap();
    assert!(heat.delete_after.is_some());
    assert!(heat.deletion_reason.unwrap().contains("90d"));

    let stored = h.engine.jobs().get_latest().unwrap();
    assert_eq!(stored.id, job.id);
    assert_eq!(stored.status, JobStatus::Completed);
    assert!(h.engine.get_status().await.last_full_sync.is_some());
}

#[tokio::test]
async fn test_full_reconciliation_deletes_when_enabled() {
    let movies = Arc::new(MockMovies {
        movies: StdMutex::new(vec![movie(1, "Heat", 949, 120), movie(2, "Ronin", 8195, 10)]),
        ..MockMovies::default()
    });
    let shows = Arc::new(MockShows {
        series: vec![series(4, "The Wire", 79126, 400)],
        ..MockShows::default()
    });
    let history = Arc::new(MockHistory {
        name: "plex",
        ..MockHistory::default()
    });
    let h = harness(
        deleting_config(),
        SourceSet::new()
            .with_movie_catalog(movies.clone())
            .with_tv_catalog(shows.clone())
            .with_watch_history(history.clone()),
    );

    let job = h.engine.full_reconciliation().await.unwrap();
    assert_eq!(job.summary["deleted"], serde_json::json!(2));
    assert_eq!(*movies.deleted.lock().unwrap(), vec![1]);
    assert_eq!(*shows.deleted.lock().unwrap(), vec![4]);
    assert_eq!(history.refreshes.load(Ordering::SeqCst), 2);

    let remaining: Vec<String> = h.engine.get_media_list().await.into_iter().map(|i| i.id).collect();
    assert_eq!(remaining, vec!["radarr-2".to_string()]);
}

#[tokio::test]
async fn test_failing_source_does_not_abort_run() {
    let movies = Arc::new(MockMovies {
        fail_list: true,
        ..MockMovies::default()
    });
    let shows = Arc::new(MockShows {
        series: vec![series(4, "The Wire", 79126, 10)],
        ..MockShows::default()
    });
    let history = Arc::new(MockHistory {
        name: "plex",
        fail: true,
        ..MockHistory::default()
    });
    let h = harness(
        Config::default(),
        SourceSet::new()
            .with_movie_catalog(movies)
            .with_tv_catalog(shows)
            .with_watch_history(history),
    );

    let job = h.engine.full_reconciliation().await.unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    // Only the last error is kept
    let error = job.error.unwrap();
    assert!(error.contains("plex"));
    assert!(error.contains("timeout"));
    assert!(job.summary.get("movies").is_none());
    assert_eq!(job.summary["shows"], serde_json::json!(1));
    assert!(h.engine.get_media_by_id("sonarr-4").await.is_some());
}

#[tokio::test]
async fn test_full_reconciliation_clears_cache() {
    let movies = Arc::new(MockMovies {
        movies: StdMutex::new(vec![movie(1, "Heat", 949, 80)]),
        ..MockMovies::default()
    });
    let h = harness(Config::default(), SourceSet::new().with_movie_catalog(movies.clone()));

    h.engine.full_reconciliation().await.unwrap();
    let leaving = h.engine.get_leaving_soon(None).await;
    assert_eq!(leaving.len(), 1);
    assert!(!h.cache.is_empty());

    movies.movies.lock().unwrap().clear();
    h.engine.full_reconciliation().await.unwrap();
    assert!(h.cache.is_empty());
    assert!(h.engine.get_leaving_soon(None).await.is_empty());
}

#[tokio::test]
async fn test_incremental_reconciliation_clears_cache() {
    let movies = Arc::new(MockMovies {
        movies: StdMutex::new(vec![movie(1, "Heat", 949, 80)]),
        ..MockMovies::default()
    });
    let history = Arc::new(MockHistory {
        name: "plex",
        ..MockHistory::default()
    });
    let h = harness(
        Config::default(),
        SourceSet::new().with_movie_catalog(movies).with_watch_history(history.clone()),
    );

    h.engine.full_reconciliation().await.unwrap();
    assert_eq!(h.engine.get_leaving_soon(None).await.len(), 1);

    // A fresh watch pushes the deletion time out of the window
    history.records.lock().unwrap().push(played(MediaType::Movie, "Heat", 949, 1, 1));
    h.engine.incremental_reconciliation().await.unwrap();
    assert!(h.cache.is_empty());
    assert!(h.engine.get_leaving_soon(None).await.is_empty());
}

#[tokio::test]
async fn test_config_change_invalidates_leaving_soon() {
    let movies = Arc::new(MockMovies {
        movies: StdMutex::new(vec![movie(1, "Heat", 949, 80)]),
        ..MockMovies::default()
    });
    let h = harness(Config::default(), SourceSet::new().with_movie_catalog(movies));

    h.engine.full_reconciliation().await.unwrap();
    assert_eq!(h.engine.get_leaving_soon(None).await.len(), 1);

    let mut config = Config::default();
    config.rules.movie_retention = "never".to_string();
    h.config.replace(config);
    assert!(h.engine.get_leaving_soon(None).await.is_empty());
}

#[tokio::test]
async fn test_concurrent_reconciliation_is_rejected() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let movies = Arc::new(MockMovies {
        movies: StdMutex::new(vec![movie(1, "Heat", 949, 10)]),
        gate: Some((entered.clone(), release.clone())),
        ..MockMovies::default()
    });
    let h = harness(Config::default(), SourceSet::new().with_movie_catalog(movies));

    let first = h.engine.trigger_full_reconciliation();
    entered.notified().await;

    assert!(matches!(
        h.engine.full_reconciliation().await,
        Err(EngineError::ReconciliationInProgress)
    ));
    assert!(matches!(
        h.engine.incremental_reconciliation().await,
        Err(EngineError::ReconciliationInProgress)
    ));

    release.notify_one();
    first.await.unwrap();
    assert_eq!(h.engine.get_media_count().await, 1);
    assert_eq!(h.engine.jobs().get_recent(10).len(), 1);
}

// ----- incremental -----

#[tokio::test]
async fn test_incremental_only_refreshes_watch_history() {
    let movies = Arc::new(MockMovies {
        movies: StdMutex::new(vec![movie(1, "Heat", 949, 120)]),
        ..MockMovies::default()
    });
    let history = Arc::new(MockHistory {
        name: "plex",
        ..MockHistory::default()
    });
    let h = harness(
        Config::default(),
        SourceSet::new()
            .with_movie_catalog(movies.clone())
            .with_watch_history(history.clone()),
    );
    h.engine.full_reconciliation().await.unwrap();
    let scheduled_before = h.engine.get_media_by_id("radarr-1").await.unwrap().delete_after;

    movies.movies.lock().unwrap().push(movie(2, "Ronin", 8195, 10));
    history
        .records
        .lock()
        .unwrap()
        .push(played(MediaType::Movie, "Heat", 949, 1, 1));

    let job = h.engine.incremental_reconciliation().await.unwrap();
    assert_eq!(job.kind, JobKind::IncrementalSync);
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.summary["watch_history"], serde_json::json!(1));

    // No catalog ingest and no policy pass
    assert_eq!(h.engine.get_media_count().await, 1);
    let heat = h.engine.get_media_by_id("radarr-1").await.unwrap();
    assert_eq!(heat.watch_count, 1);
    assert_eq!(heat.delete_after, scheduled_before);
    assert!(h.engine.get_status().await.last_incremental_sync.is_some());
}

#[tokio::test]
async fn test_incremental_failure_marks_job_failed() {
    let history = Arc::new(MockHistory {
        name: "plex",
        fail: true,
        ..MockHistory::default()
    });
    let h = harness(Config::default(), SourceSet::new().with_watch_history(history));

    let job = h.engine.incremental_reconciliation().await.unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error.unwrap().contains("timeout"));
    assert_eq!(h.engine.jobs().get(&job.id).unwrap().status, JobStatus::Failed);
}

// ----- deletion -----

#[tokio::test]
async fn test_delete_media_without_catalog_owner_only_drops_entry() {
    let movies = Arc::new(MockMovies::default());
    let h = harness(Config::default(), SourceSet::new().with_movie_catalog(movies.clone()));
    let orphan = MediaItem::new("radarr-9".to_string(), MediaType::Movie, "Orphan".to_string(), Utc::now());
    h.engine.media.write().await.insert(orphan.id.clone(), orphan);

    h.engine.delete_media("radarr-9", false).await.unwrap();
    assert!(movies.deleted.lock().unwrap().is_empty());
    assert!(h.engine.get_media_by_id("radarr-9").await.is_none());
}

#[tokio::test]
async fn test_delete_media_simulate_and_not_found() {
    let movies = Arc::new(MockMovies {
        movies: StdMutex::new(vec![movie(1, "Heat", 949, 10)]),
        ..MockMovies::default()
    });
    let h = harness(Config::default(), SourceSet::new().with_movie_catalog(movies.clone()));
    h.engine.ingest_movies().await.unwrap();

    h.engine.delete_media("radarr-1", true).await.unwrap();
    assert!(movies.deleted.lock().unwrap().is_empty());
    assert!(h.engine.get_media_by_id("radarr-1").await.is_some());

    assert!(matches!(
        h.engine.delete_media("radarr-404", false).await,
        Err(EngineError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_refresh_failure_does_not_fail_deletion() {
    let movies = Arc::new(MockMovies {
        movies: StdMutex::new(vec![movie(1, "Heat", 949, 10)]),
        ..MockMovies::default()
    });
    let history = Arc::new(MockHistory {
        name: "plex",
        fail_refresh: true,
        ..MockHistory::default()
    });
    let h = harness(
        Config::default(),
        SourceSet::new().with_movie_catalog(movies.clone()).with_watch_history(history.clone()),
    );
    h.engine.ingest_movies().await.unwrap();

    h.engine.delete_media("radarr-1", false).await.unwrap();
    assert_eq!(*movies.deleted.lock().unwrap(), vec![1]);
    assert_eq!(history.refreshes.load(Ordering::SeqCst), 1);
    assert!(h.engine.get_media_by_id("radarr-1").await.is_none());
}

#[tokio::test]
async fn test_execute_deletions_skips_failures() {
    let movies = Arc::new(MockMovies {
        movies: StdMutex::new(vec![
            movie(1, "Heat", 949, 200),
            movie(2, "Ronin", 8195, 200),
            movie(3, "Collateral", 1538, 200),
        ]),
        fail_delete_for: Some(2),
        ..MockMovies::default()
    });
    let h = harness(Config::default(), SourceSet::new().with_movie_catalog(movies.clone()));
    h.engine.ingest_movies().await.unwrap();
    h.engine.apply_policy().await;

    let (count, mut candidates) = h.engine.compute_deletion_candidates().await;
    assert_eq!(count, 3);
    let mut blank = candidates[0].clone();
    blank.id = String::new();
    candidates.push(blank);

    let (deleted, items) = h.engine.execute_deletions(&candidates, false).await;
    assert_eq!(deleted, 2);
    let mut ids: Vec<String> = items.into_iter().map(|c| c.id).collect();
    ids.sort();
    assert_eq!(ids, vec!["radarr-1".to_string(), "radarr-3".to_string()]);
    assert!(h.engine.get_media_by_id("radarr-2").await.is_some());
}

#[tokio::test]
async fn test_no_candidates_on_empty_collection() {
    let h = harness(Config::default(), SourceSet::new());
    let (count, candidates) = h.engine.compute_deletion_candidates().await;
    assert_eq!(count, 0);
    assert!(candidates.is_empty());
}

// ----- exclusions -----

#[tokio::test]
async fn test_exclusion_round_trip() {
    let movies = Arc::new(MockMovies {
        movies: StdMutex::new(vec![movie(1, "Heat", 949, 200)]),
        ..MockMovies::default()
    });
    let h = harness(Config::default(), SourceSet::new().with_movie_catalog(movies));
    h.engine.full_reconciliation().await.unwrap();
    assert_eq!(h.engine.compute_deletion_candidates().await.0, 1);

    let record = h.engine.add_exclusion("radarr-1", "family favourite", "admin").await.unwrap();
    assert_eq!(record.external_id, "radarr-1");
    assert_eq!(record.source, "radarr");
    assert_eq!(record.excluded_by, "admin");

    let heat = h.engine.get_media_by_id("radarr-1").await.unwrap();
    assert!(heat.is_excluded);
    assert!(heat.delete_after.is_none());
    assert_eq!(h.engine.compute_deletion_candidates().await.0, 0);

    // Exclusions survive a full pass
    h.engine.full_reconciliation().await.unwrap();
    assert_eq!(h.engine.compute_deletion_candidates().await.0, 0);
    assert_eq!(h.engine.get_status().await.excluded, 1);

    h.engine.remove_exclusion("radarr-1").await.unwrap();
    let heat = h.engine.get_media_by_id("radarr-1").await.unwrap();
    assert!(!heat.is_excluded);
    assert!(heat.delete_after.is_some());
    assert!(h.engine.exclusions().get("radarr-1").is_none());
    assert_eq!(h.engine.compute_deletion_candidates().await.0, 1);
}

#[tokio::test]
async fn test_exclusion_of_unknown_item_is_not_found() {
    let h = harness(Config::default(), SourceSet::new());
    assert!(matches!(
        h.engine.add_exclusion("radarr-1", "", "admin").await,
        Err(EngineError::NotFound(_))
    ));
    assert!(matches!(
        h.engine.remove_exclusion("radarr-1").await,
        Err(EngineError::NotFound(_))
    ));
    assert!(h.engine.exclusions().is_empty());
}

// ----- lifecycle and status -----

#[tokio::test]
async fn test_start_stop() {
    let mut config = Config::default();
    config.sync.auto_start = false;
    let h = harness(config, SourceSet::new());

    h.engine.start().await.unwrap();
    assert!(h.engine.is_running().await);
    assert!(matches!(h.engine.start().await, Err(EngineError::AlreadyRunning)));

    h.engine.stop().await;
    assert!(!h.engine.is_running().await);
    // Stopping twice is a no-op
    h.engine.stop().await;

    h.engine.start().await.unwrap();
    assert!(h.engine.get_status().await.running);
    h.engine.stop().await;
}

fn jobs_of(h: &Harness, kind: JobKind) -> usize {
    h.engine.jobs().get_recent(20).iter().filter(|j| j.kind == kind).count()
}

#[tokio::test(start_paused = true)]
async fn test_timers_run_reconciliations_until_stopped() {
    let movies = Arc::new(MockMovies {
        movies: StdMutex::new(vec![movie(1, "Heat", 949, 10)]),
        ..MockMovies::default()
    });
    let mut config = Config::default();
    config.sync.full_interval_minutes = 60;
    config.sync.incremental_interval_minutes = 25;
    let h = harness(config, SourceSet::new().with_movie_catalog(movies));

    h.engine.start().await.unwrap();

    // auto_start launches a full pass straight away
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(jobs_of(&h, JobKind::FullSync), 1);
    assert_eq!(jobs_of(&h, JobKind::IncrementalSync), 0);
    assert_eq!(h.engine.get_media_count().await, 1);

    // Ticks at 25 and 50 minutes, then the first full tick at 60
    tokio::time::sleep(Duration::from_secs(61 * 60)).await;
    assert_eq!(jobs_of(&h, JobKind::FullSync), 2);
    assert_eq!(jobs_of(&h, JobKind::IncrementalSync), 2);
    assert!(h.engine.get_status().await.last_incremental_sync.is_some());
    assert!(h.engine.jobs().get_recent(20).iter().all(|j| j.status == JobStatus::Completed));

    h.engine.stop().await;
    tokio::time::sleep(Duration::from_secs(3 * 60 * 60)).await;
    assert_eq!(jobs_of(&h, JobKind::FullSync), 2);
    assert_eq!(jobs_of(&h, JobKind::IncrementalSync), 2);
}

#[tokio::test]
async fn test_status_counts_and_intervals() {
    let movies = Arc::new(MockMovies {
        movies: StdMutex::new(vec![movie(1, "Heat", 949, 10), movie(2, "Ronin", 8195, 10)]),
        ..MockMovies::default()
    });
    let shows = Arc::new(MockShows {
        series: vec![series(4, "The Wire", 79126, 10)],
        ..MockShows::default()
    });
    let h = harness(
        Config::default(),
        SourceSet::new().with_movie_catalog(movies).with_tv_catalog(shows),
    );
    h.engine.full_reconciliation().await.unwrap();

    let mut config = Config::default();
    config.sync.full_interval_minutes = 120;
    h.config.replace(config);

    let status = h.engine.get_status().await;
    assert!(!status.running);
    assert_eq!(status.total, 3);
    assert_eq!(status.movies, 2);
    assert_eq!(status.shows, 1);
    assert_eq!(status.excluded, 0);
    assert_eq!(status.full_interval_minutes, 120);
    assert_eq!(status.incremental_interval_minutes, 15);
    assert!(status.last_incremental_sync.is_none());
}
