use chrono::{DateTime, Utc};
use media_retention_config::ConfigProvider;
use media_retention_models::{
    CatalogMovie, CatalogSeries, DeletionCandidate, ExclusionRecord, Job, JobKind, MatchStatus, MediaItem,
    MediaRequest, MediaType, PlayRecord,
};
use media_retention_sources::SourceSet;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use crate::cache::SharedCache;
use crate::error::EngineError;
use crate::exclusions::ExclusionStore;
use crate::jobs::JobLedger;
use crate::matching::{index_requests, match_key, WatchIndex, WatchMatch};
use crate::rules::RulesEngine;

/// Cap on the candidate list stored in a job summary
pub const MAX_CANDIDATE_PREVIEW: usize = 50;

/// Start/stop state, guarded separately from the media collection
#[derive(Default)]
struct EngineControl {
    running: bool,
    stop: Option<CancellationToken>,
    loops: Vec<JoinHandle<()>>,
}

#[derive(Default)]
struct RunTimes {
    last_full: Option<DateTime<Utc>>,
    last_incremental: Option<DateTime<Utc>>,
}

/// Point-in-time view of the engine for status queries
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub running: bool,
    pub total: usize,
    pub movies: usize,
    pub shows: usize,
    pub excluded: usize,
    pub full_interval_minutes: u64,
    pub incremental_interval_minutes: u64,
    pub last_full_sync: Option<DateTime<Utc>>,
    pub last_incremental_sync: Option<DateTime<Utc>>,
}

/// Owns the canonical media collection and reconciles it against the
/// configured sources
pub struct SyncEngine {
    media: RwLock<HashMap<String, MediaItem>>,
    control: Mutex<EngineControl>,
    run_guard: Mutex<()>,
    run_times: RwLock<RunTimes>,
    sources: SourceSet,
    config: Arc<dyn ConfigProvider>,
    rules: RulesEngine,
    exclusions: Arc<ExclusionStore>,
    jobs: Arc<JobLedger>,
    cache: Arc<dyn SharedCache>,
}

impl SyncEngine {
    pub fn new(
        config: Arc<dyn ConfigProvider>,
        sources: SourceSet,
        exclusions: Arc<ExclusionStore>,
        jobs: Arc<JobLedger>,
        cache: Arc<dyn SharedCache>,
    ) -> Self {
        Self {
            media: RwLock::new(HashMap::new()),
            control: Mutex::new(EngineControl::default()),
            run_guard: Mutex::new(()),
            run_times: RwLock::new(RunTimes::default()),
            sources,
            rules: RulesEngine::new(config.clone()),
            config,
            exclusions,
            jobs,
            cache,
        }
    }

    pub fn rules(&self) -> &RulesEngine {
        &self.rules
    }

    pub fn exclusions(&self) -> &ExclusionStore {
        &self.exclusions
    }

    pub fn jobs(&self) -> &JobLedger {
        &self.jobs
    }

    // ----- lifecycle -----

    /// Arm the full and incremental timers
    ///
    /// Intervals are read from the configuration once, here; changing them
    /// takes effect on the next `start`.
    pub async fn start(self: &Arc<Self>) -> Result<(), EngineError> {
        let mut control = self.control.lock().await;
        if control.running {
            return Err(EngineError::AlreadyRunning);
        }

        let config = self.config.snapshot();
        let stop = CancellationToken::new();
        let full_every = config.sync.full_interval();
        let incremental_every = config.sync.incremental_interval();

        control.loops = vec![
            tokio::spawn(Arc::clone(self).run_loop(JobKind::FullSync, full_every, stop.clone())),
            tokio::spawn(Arc::clone(self).run_loop(JobKind::IncrementalSync, incremental_every, stop.clone())),
        ];
        control.stop = Some(stop);
        control.running = true;

        info!(
            operation = "engine_start",
            full_interval_secs = full_every.as_secs(),
            incremental_interval_secs = incremental_every.as_secs(),
            auto_start = config.sync.auto_start,
            "Sync engine started"
        );

        if config.sync.auto_start {
            self.trigger_full_reconciliation();
        }
        Ok(())
    }

    /// Stop the timers. Runs already in flight are allowed to finish.
    pub async fn stop(&self) {
        let mut control = self.control.lock().await;
        if !control.running {
            return;
        }
        control.running = false;
        if let Some(stop) = control.stop.take() {
            stop.cancel();
        }
        // Loops exit on their own once they observe the signal
        control.loops.clear();
        info!(operation = "engine_stop", "Sync engine stopped");
    }

    pub async fn is_running(&self) -> bool {
        self.control.lock().await.running
    }

    async fn run_loop(self: Arc<Self>, kind: JobKind, every: Duration, stop: CancellationToken) {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = stop.cancelled() => {
                    debug!(kind = ?kind, "Reconciliation loop stopping");
                    break;
                }
                _ = ticker.tick() => {
                    let result = match kind {
                        JobKind::FullSync => self.full_reconciliation().await,
                        JobKind::IncrementalSync => self.incremental_reconciliation().await,
                    };
                    match result {
                        Ok(_) => {}
                        Err(EngineError::ReconciliationInProgress) => {
                            debug!(kind = ?kind, "Skipping scheduled run: another reconciliation is in progress");
                        }
                        Err(e) => error!(kind = ?kind, error = %e, "Scheduled reconciliation failed"),
                    }
                }
            }
        }
    }

    /// Launch a full reconciliation in the background and return at once
    pub fn trigger_full_reconciliation(self: &Arc<Self>) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            match engine.full_reconciliation().await {
                Ok(job) => debug!(job_id = %job.id, "Triggered reconciliation finished"),
                Err(EngineError::ReconciliationInProgress) => {
                    info!("Reconciliation already in progress; trigger ignored")
                }
                Err(e) => error!(error = %e, "Triggered reconciliation failed"),
            }
        })
    }

    // ----- reconciliation -----

    /// Ingest every source, apply exclusions and policy, and delete due items
    /// when deletion is enabled outside dry-run
    ///
    /// A failing source does not stop the run; the job still completes and
    /// carries the last error seen.
    #[instrument(skip(self))]
    pub async fn full_reconciliation(&self) -> Result<Job, EngineError> {
        let _running = self
            .run_guard
            .try_lock()
            .map_err(|_| EngineError::ReconciliationInProgress)?;
        let start = Instant::now();
        let config = self.config.snapshot();
        let mut job = Job::start(JobKind::FullSync);
        self.record_job(&job, true);

        info!(
            operation = "full_sync_start",
            job_id = %job.id,
            sources = ?self.sources.source_names(),
            "Starting full reconciliation"
        );

        let mut last_error: Option<String> = None;
        let mut note = |step: &str, result: Result<usize, EngineError>, job: &mut Job| match result {
            Ok(count) => job.record(step, count),
            Err(e) => {
                error!(operation = "ingest", step, status = "error", error = %e, "Reconciliation step failed");
                last_error = Some(e.to_string());
            }
        };

        note("movies", self.ingest_movies().await, &mut job);
        note("shows", self.ingest_shows().await, &mut job);
        note("watch_history", self.sync_watch_history().await, &mut job);
        note("watch_history_secondary", self.sync_secondary_watch_history().await, &mut job);
        note("requests", self.sync_requests().await, &mut job);

        let excluded_changes = self.apply_exclusions().await;
        let scheduled = self.apply_policy().await;
        let (due, candidates) = self.compute_deletion_candidates().await;
        debug!(excluded_changes, scheduled, due, "Policy applied");

        let deletion_enabled = config.app.enable_deletion;
        let dry_run = config.app.dry_run;
        let deleted = if deletion_enabled && !dry_run {
            self.execute_deletions(&candidates, false).await.0
        } else {
            if due > 0 {
                info!(
                    due,
                    deletion_enabled,
                    dry_run,
                    "Deletion candidates found; not deleting"
                );
            }
            0
        };

        job.record("scheduled_deletions", due);
        job.record("deleted", deleted);
        job.record("dry_run", dry_run);
        job.record("deletion_enabled", deletion_enabled);
        let preview: Vec<&DeletionCandidate> = candidates.iter().take(MAX_CANDIDATE_PREVIEW).collect();
        match serde_json::to_value(&preview) {
            Ok(value) => job.record("candidates", value),
            Err(e) => warn!("Failed to serialize candidate preview: {}", e),
        }

        job.complete(last_error);
        self.record_job(&job, false);
        self.run_times.write().await.last_full = Some(Utc::now());
        self.cache.clear();

        let items = self.get_media_count().await;
        info!(
            operation = "full_sync_complete",
            job_id = %job.id,
            duration_ms = start.elapsed().as_millis(),
            items,
            scheduled_deletions = due,
            deleted,
            error = ?job.error,
            "Full reconciliation completed"
        );
        Ok(job)
    }

    /// Refresh watch history from the primary source only
    #[instrument(skip(self))]
    pub async fn incremental_reconciliation(&self) -> Result<Job, EngineError> {
        let _running = self
            .run_guard
            .try_lock()
            .map_err(|_| EngineError::ReconciliationInProgress)?;
        let start = Instant::now();
        let mut job = Job::start(JobKind::IncrementalSync);
        self.record_job(&job, true);

        match self.sync_watch_history().await {
            Ok(matched) => {
                job.record("watch_history", matched);
                job.complete(None);
            }
            Err(e) => {
                error!(operation = "incremental_sync", error = %e, "Watch history refresh failed");
                job.fail(e.to_string());
            }
        }

        self.record_job(&job, false);
        self.run_times.write().await.last_incremental = Some(Utc::now());
        self.cache.clear();
        info!(
            operation = "incremental_sync_complete",
            job_id = %job.id,
            duration_ms = start.elapsed().as_millis(),
            status = ?job.status,
            "Incremental reconciliation completed"
        );
        Ok(job)
    }

    /// Ledger writes never fail the run they describe
    fn record_job(&self, job: &Job, is_new: bool) {
        let result = if is_new {
            self.jobs.add(job.clone())
        } else {
            self.jobs.update(job.clone())
        };
        if let Err(e) = result {
            warn!(job_id = %job.id, error = %e, "Failed to record job");
        }
    }

    // ----- ingest -----

    /// Pull the movie catalog; returns the number of movies held on disk
    pub async fn ingest_movies(&self) -> Result<usize, EngineError> {
        let Some(catalog) = self.sources.movie_catalog.clone() else {
            debug!("No movie catalog configured");
            return Ok(0);
        };
        let source = catalog.source_name().to_string();
        let movies = catalog.list_movies().await?;
        let listed = movies.len();
        let fresh: Vec<MediaItem> = movies
            .iter()
            .filter(|m| m.has_file)
            .map(|m| movie_item(&source, m))
            .collect();

        let held = self.replace_owned(&source, MediaType::Movie, fresh).await;
        info!(operation = "ingest", source = %source, listed, held, "Ingested movie catalog");
        Ok(held)
    }

    /// Pull the TV catalog; returns the number of series with files on disk
    pub async fn ingest_shows(&self) -> Result<usize, EngineError> {
        let Some(catalog) = self.sources.tv_catalog.clone() else {
            debug!("No TV catalog configured");
            return Ok(0);
        };
        let source = catalog.source_name().to_string();
        let series = catalog.list_series().await?;
        let listed = series.len();
        let fresh: Vec<MediaItem> = series
            .iter()
            .filter(|s| s.has_files())
            .map(|s| series_item(&source, s))
            .collect();

        let held = self.replace_owned(&source, MediaType::Show, fresh).await;
        info!(operation = "ingest", source = %source, listed, held, "Ingested TV catalog");
        Ok(held)
    }

    /// Replace every entry a catalog owns with its fresh listing
    ///
    /// Fields the catalog does not own (watch, request and derived state)
    /// survive from the previous entry. Entries the catalog no longer lists
    /// are dropped. A fresh item whose id is already held by the other media
    /// type is skipped, so two catalogs sharing a name never merge entries.
    async fn replace_owned(&self, source: &str, media_type: MediaType, fresh: Vec<MediaItem>) -> usize {
        let prefix = format!("{}-", source);
        let mut media = self.media.write().await;
        let before = media.len();
        {
            let fresh_ids: HashSet<&str> = fresh.iter().map(|item| item.id.as_str()).collect();
            media.retain(|id, item| {
                item.media_type != media_type || !id.starts_with(&prefix) || fresh_ids.contains(id.as_str())
            });
        }
        let pruned = before - media.len();
        if pruned > 0 {
            info!(source = %source, pruned, "Dropped items no longer listed by catalog");
        }

        let mut held = 0;
        for mut item in fresh {
            if media.get(&item.id).is_some_and(|existing| existing.media_type != media_type) {
                warn!(
                    source = %source,
                    item = %item.id,
                    title = %item.title,
                    "Id already held by another catalog; skipping item"
                );
                continue;
            }
            if let Some(previous) = media.remove(&item.id) {
                carry_over(&mut item, previous);
            }
            media.insert(item.id.clone(), item);
            held += 1;
        }
        held
    }

    // ----- watch history -----

    /// Match the collection against the primary watch-history source;
    /// returns the number of exact matches
    pub async fn sync_watch_history(&self) -> Result<usize, EngineError> {
        let Some(history) = self.sources.watch_history.clone() else {
            debug!("No watch-history source configured");
            return Ok(0);
        };
        let records = history.list_played().await?;
        let matched = self.match_to_watch_history(&records).await;
        info!(
            operation = "watch_history",
            source = %history.source_name(),
            records = records.len(),
            matched,
            "Matched watch history"
        );
        Ok(matched)
    }

    pub async fn match_to_watch_history(&self, records: &[PlayRecord]) -> usize {
        let index = WatchIndex::build(records);
        let mut media = self.media.write().await;
        let mut matched = 0;

        for item in media.values_mut() {
            match index.lookup(item) {
                WatchMatch::Exact(record) => {
                    item.last_watched = record.last_played;
                    item.watch_count = record.play_count;
                    item.ids.server_id = Some(record.server_id.clone());
                    item.watch_match = Some(MatchStatus::Matched);
                    item.watch_match_detail = None;
                    matched += 1;
                }
                WatchMatch::TitleOnly(record) => {
                    let detail = format!(
                        "title matches server item {} ('{}') but ids differ: catalog {} vs server {}",
                        record.server_id,
                        record.title,
                        describe_matching_id(item.media_type, item.matching_id()),
                        describe_matching_id(record.media_type, record.media_type.matching_id(&record.ids)),
                    );
                    debug!(item = %item.id, "{}", detail);
                    item.watch_match = Some(MatchStatus::MetadataMismatch);
                    item.watch_match_detail = Some(detail);
                }
                WatchMatch::None => {
                    item.watch_match = Some(MatchStatus::NotFound);
                    item.watch_match_detail = Some(format!(
                        "no watch-history entry for {}",
                        describe_matching_id(item.media_type, item.matching_id())
                    ));
                }
            }
        }
        matched
    }

    /// Merge a second watch-history source into already matched data;
    /// returns the number of items it matched
    pub async fn sync_secondary_watch_history(&self) -> Result<usize, EngineError> {
        let Some(history) = self.sources.watch_history_secondary.clone() else {
            debug!("No secondary watch-history source configured");
            return Ok(0);
        };
        let records = history.list_played().await?;
        let index = WatchIndex::build(&records);

        let mut media = self.media.write().await;
        let mut matched = 0;
        for item in media.values_mut() {
            let Some(record) = index.lookup_exact(item) else {
                continue;
            };
            if record.last_played > item.last_watched {
                item.last_watched = record.last_played;
            }
            item.watch_count = item.watch_count.max(record.play_count);
            if item.ids.server_id.is_none() {
                item.ids.server_id = Some(record.server_id.clone());
            }
            if item.watch_match != Some(MatchStatus::Matched) {
                item.watch_match = Some(MatchStatus::Matched);
                item.watch_match_detail = None;
            }
            matched += 1;
        }

        info!(
            operation = "watch_history",
            source = %history.source_name(),
            records = records.len(),
            matched,
            "Merged secondary watch history"
        );
        Ok(matched)
    }

    // ----- requests -----

    /// Pull requests and mark requested items; returns the number marked
    pub async fn sync_requests(&self) -> Result<usize, EngineError> {
        let Some(requests) = self.sources.requests.clone() else {
            debug!("No request source configured");
            return Ok(0);
        };
        let listed = requests.list_requests().await?;
        let marked = self.match_to_request_source(&listed).await;
        info!(
            operation = "requests",
            source = %requests.source_name(),
            requests = listed.len(),
            marked,
            "Matched requests"
        );
        Ok(marked)
    }

    pub async fn match_to_request_source(&self, requests: &[MediaRequest]) -> usize {
        let index = index_requests(requests);
        let mut media = self.media.write().await;
        let mut marked = 0;

        for item in media.values_mut() {
            let request = match_key(item.media_type, &item.ids).and_then(|key| index.get(&key));
            match request {
                Some(request) => {
                    item.is_requested = true;
                    item.requested_by = request.requested_by.clone();
                    marked += 1;
                }
                None => {
                    item.is_requested = false;
                    item.requested_by = None;
                }
            }
        }
        marked
    }

    // ----- policy -----

    /// Sync `is_excluded` with the exclusion store; returns how many changed
    pub async fn apply_exclusions(&self) -> usize {
        let mut media = self.media.write().await;
        let mut changed = 0;
        for item in media.values_mut() {
            let excluded = self.exclusions.is_excluded(&item.id);
            if item.is_excluded != excluded {
                item.is_excluded = excluded;
                changed += 1;
            }
        }
        changed
    }

    /// Evaluate policy for every item; returns how many have a deletion time
    pub async fn apply_policy(&self) -> usize {
        let now = Utc::now();
        let mut media = self.media.write().await;
        media
            .values_mut()
            .map(|item| self.rules.apply_to(item, now))
            .filter(|scheduled| *scheduled)
            .count()
    }

    pub async fn compute_deletion_candidates(&self) -> (usize, Vec<DeletionCandidate>) {
        let media = self.media.read().await;
        let candidates = self.rules.get_deletion_candidates(media.values(), Utc::now());
        (candidates.len(), candidates)
    }

    // ----- deletion -----

    /// Delete each candidate in turn; failures are logged and skipped
    pub async fn execute_deletions(
        &self,
        candidates: &[DeletionCandidate],
        simulate: bool,
    ) -> (usize, Vec<DeletionCandidate>) {
        let mut deleted = Vec::new();
        for candidate in candidates {
            if candidate.id.is_empty() {
                warn!(title = %candidate.title, "Skipping deletion candidate without an id");
                continue;
            }
            match self.delete_media(&candidate.id, simulate).await {
                Ok(()) => deleted.push(candidate.clone()),
                Err(e) => {
                    warn!(item = %candidate.id, title = %candidate.title, error = %e, "Deletion failed; skipping")
                }
            }
        }
        info!(
            operation = "execute_deletions",
            requested = candidates.len(),
            deleted = deleted.len(),
            simulate,
            "Deletions executed"
        );
        (deleted.len(), deleted)
    }

    /// Remove one item from its owning catalog(s) and from the collection
    pub async fn delete_media(&self, id: &str, simulate: bool) -> Result<(), EngineError> {
        let item = self
            .get_media_by_id(id)
            .await
            .ok_or_else(|| EngineError::NotFound(format!("media {}", id)))?;

        if simulate {
            info!(
                operation = "delete_media",
                simulate = true,
                item = %item.id,
                title = %item.title,
                "Would delete media"
            );
            return Ok(());
        }

        if let Some(movie_id) = item.ids.movie_catalog_id {
            let catalog = self.sources.movie_catalog.as_ref().ok_or_else(|| unconfigured("movie catalog"))?;
            catalog.delete_movie(movie_id, true).await?;
        }
        if let Some(series_id) = item.ids.tv_catalog_id {
            let catalog = self.sources.tv_catalog.as_ref().ok_or_else(|| unconfigured("TV catalog"))?;
            catalog.delete_series(series_id, true).await?;
        }
        if !item.ids.has_catalog_owner() {
            warn!(item = %item.id, "Item has no owning catalog; removing from collection only");
        }

        if let Some(history) = &self.sources.watch_history {
            if let Err(e) = history.refresh_library().await {
                warn!(source = %history.source_name(), error = %e, "Library refresh after deletion failed");
            }
        }

        self.media.write().await.remove(id);
        self.cache.clear();
        info!(operation = "delete_media", item = %item.id, title = %item.title, "Deleted media");
        Ok(())
    }

    // ----- exclusions -----

    /// Protect an item from deletion and persist the exclusion
    pub async fn add_exclusion(&self, id: &str, reason: &str, actor: &str) -> Result<ExclusionRecord, EngineError> {
        let mut media = self.media.write().await;
        let item = media
            .get_mut(id)
            .ok_or_else(|| EngineError::NotFound(format!("media {}", id)))?;

        let record = ExclusionRecord {
            external_id: item.id.clone(),
            source: owning_source(&item.id),
            media_type: item.media_type,
            title: item.title.clone(),
            excluded_at: Utc::now(),
            excluded_by: actor.to_string(),
            reason: reason.to_string(),
        };
        self.exclusions.add(record.clone())?;
        item.is_excluded = true;
        item.clear_schedule();
        self.cache.clear();

        info!(operation = "exclusion_add", item = %id, actor = %actor, "Excluded media from deletion");
        Ok(record)
    }

    /// Lift an exclusion and re-evaluate the item immediately
    pub async fn remove_exclusion(&self, id: &str) -> Result<(), EngineError> {
        let mut media = self.media.write().await;
        let item = media
            .get_mut(id)
            .ok_or_else(|| EngineError::NotFound(format!("media {}", id)))?;

        self.exclusions.remove(id)?;
        item.is_excluded = false;
        self.rules.apply_to(item, Utc::now());
        self.cache.clear();

        info!(operation = "exclusion_remove", item = %id, "Removed exclusion");
        Ok(())
    }

    // ----- read side -----

    pub async fn get_media_list(&self) -> Vec<MediaItem> {
        let media = self.media.read().await;
        let mut items: Vec<MediaItem> = media.values().cloned().collect();
        items.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
        items
    }

    pub async fn get_media_by_id(&self, id: &str) -> Option<MediaItem> {
        self.media.read().await.get(id).cloned()
    }

    pub async fn get_media_count(&self) -> usize {
        self.media.read().await.len()
    }

    /// Copy of the whole collection for downstream consumers
    pub async fn get_media_library_snapshot(&self) -> HashMap<String, MediaItem> {
        self.media.read().await.clone()
    }

    pub async fn get_status(&self) -> EngineStatus {
        let running = self.is_running().await;
        let config = self.config.snapshot();
        let (total, movies, shows, excluded) = {
            let media = self.media.read().await;
            let movies = media.values().filter(|i| i.media_type == MediaType::Movie).count();
            let excluded = media.values().filter(|i| i.is_excluded).count();
            (media.len(), movies, media.len() - movies, excluded)
        };
        let times = self.run_times.read().await;

        EngineStatus {
            running,
            total,
            movies,
            shows,
            excluded,
            full_interval_minutes: config.sync.full_interval_minutes,
            incremental_interval_minutes: config.sync.incremental_interval_minutes,
            last_full_sync: times.last_full,
            last_incremental_sync: times.last_incremental,
        }
    }

    /// Items due within `window_days` (default `app.leaving_soon_days`)
    pub async fn get_leaving_soon(&self, window_days: Option<u32>) -> Vec<MediaItem> {
        let window = window_days.unwrap_or_else(|| self.config.snapshot().app.leaving_soon_days);
        let key = format!("leaving_soon:{}:{}", self.config.generation(), window);

        if let Some(cached) = self.cache.get(&key) {
            match serde_json::from_value::<Vec<MediaItem>>(cached) {
                Ok(items) => return items,
                Err(e) => debug!("Discarding cached leaving-soon list: {}", e),
            }
        }

        let items = {
            let media = self.media.read().await;
            self.rules.get_leaving_soon(media.values(), window, Utc::now())
        };
        if let Ok(value) = serde_json::to_value(&items) {
            self.cache.insert(&key, value);
        }
        items
    }
}

fn movie_item(source: &str, movie: &CatalogMovie) -> MediaItem {
    let mut item = MediaItem::new(
        format!("{}-{}", source, movie.id),
        MediaType::Movie,
        movie.title.clone(),
        movie.added,
    );
    item.year = movie.year;
    item.tags = movie.tags.iter().cloned().collect();
    item.ids.tmdb_id = movie.tmdb_id;
    item.ids.imdb_id = movie.imdb_id.clone();
    item.ids.movie_catalog_id = Some(movie.id);
    item.file_path = movie.path.clone();
    item.file_size = movie.size_on_disk;
    item
}

fn series_item(source: &str, series: &CatalogSeries) -> MediaItem {
    let mut item = MediaItem::new(
        format!("{}-{}", source, series.id),
        MediaType::Show,
        series.title.clone(),
        series.added,
    );
    item.year = series.year;
    item.tags = series.tags.iter().cloned().collect();
    item.ids.tvdb_id = series.tvdb_id;
    item.ids.imdb_id = series.imdb_id.clone();
    item.ids.tv_catalog_id = Some(series.id);
    item.file_path = series.path.clone();
    item.file_size = series.size_on_disk;
    item
}

/// Keep the state other sources and passes contributed to an entry
fn carry_over(item: &mut MediaItem, previous: MediaItem) {
    item.ids.merge(&previous.ids);
    item.last_watched = previous.last_watched;
    item.watch_count = previous.watch_count;
    item.is_requested = previous.is_requested;
    item.requested_by = previous.requested_by;
    item.is_excluded = previous.is_excluded;
    item.delete_after = previous.delete_after;
    item.days_until_due = previous.days_until_due;
    item.deletion_reason = previous.deletion_reason;
    item.watch_match = previous.watch_match;
    item.watch_match_detail = previous.watch_match_detail;
}

/// Catalog name an id was derived from (`<source>-<native id>`)
fn owning_source(id: &str) -> String {
    id.rsplit_once('-')
        .map(|(source, _)| source.to_string())
        .unwrap_or_default()
}

fn describe_matching_id(media_type: MediaType, id: Option<u64>) -> String {
    let field = match media_type {
        MediaType::Movie => "tmdb",
        MediaType::Show => "tvdb",
    };
    match id {
        Some(id) => format!("{} {}", field, id),
        None => format!("no {} id", field),
    }
}

fn unconfigured(what: &str) -> EngineError {
    EngineError::SourceUnavailable {
        source_name: what.to_string(),
        message: "not configured".to_string(),
    }
}

#[cfg(test)]
mod tests;
