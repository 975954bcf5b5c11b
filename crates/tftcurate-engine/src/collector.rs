//! The collection engine.
//!
//! Drives one cycle through its state machine: discover ranked players,
//! fetch their time-bounded match histories, claim match IDs through the
//! registry, fetch details on a bounded worker pool, retry what failed
//! retryably, and emit the collection artifact. Progress checkpoints
//! periodically and on auth expiry or interruption so a rerun resumes
//! where it stopped.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::anyhow;
use chrono::{SecondsFormat, Utc};
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;

use tftcurate_client::{ApiError, RiotClient};
use tftcurate_registry::{ClaimOutcome, MatchStatus, Registry};
use tftcurate_types::artifact::{
    CollectionArtifact, CollectionInfo, CollectionMethod, CollectionStats, IncompleteMatchNote,
    IncompleteMatchPolicy, MatchRecord, PlayerRecord,
};
use tftcurate_types::canonical::content_hash;
use tftcurate_types::checkpoint::CheckpointSnapshot;
use tftcurate_types::ids::{CycleId, MatchId, Puuid, Region};
use tftcurate_types::riot::{LeagueEntry, MatchDetail, EXPECTED_PARTICIPANTS};
use tftcurate_types::tier::{ladder, Tier, TierDivision};
use tftcurate_types::window::CycleWindow;

use crate::checkpoint::CheckpointStore;
use crate::errors::EngineError;

/// Collector parameters for one cycle.
#[derive(Debug, Clone)]
pub struct CollectorSettings {
    pub cycle: CycleId,
    pub region: Region,
    pub method: CollectionMethod,
    pub tiers: Vec<Tier>,
    pub policy: IncompleteMatchPolicy,
    pub workers: usize,
    pub checkpoint_interval: u64,
    pub match_history_depth: u32,
    pub max_entry_pages: u32,
    pub data_version: String,
}

/// Summary of a completed collection.
#[derive(Debug, Clone)]
pub struct CollectOutcome {
    pub artifact_path: PathBuf,
    pub players: usize,
    pub matches: usize,
    pub api_calls_saved: u64,
    pub total_errors: u64,
    pub registry_counts: BTreeMap<MatchStatus, u64>,
}

/// One cycle's collection run.
pub struct CollectionEngine {
    client: Arc<RiotClient>,
    registry: Arc<dyn Registry>,
    store: CheckpointStore,
    settings: CollectorSettings,
    out_path: PathBuf,
    cancel: watch::Receiver<bool>,
}

impl CollectionEngine {
    #[must_use]
    pub fn new(
        client: Arc<RiotClient>,
        registry: Arc<dyn Registry>,
        store: CheckpointStore,
        settings: CollectorSettings,
        out_path: PathBuf,
        cancel: watch::Receiver<bool>,
    ) -> Self {
        Self {
            client,
            registry,
            store,
            settings,
            out_path,
            cancel,
        }
    }

    fn cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Save a checkpoint and convert an interruption into its engine error.
    fn interrupt(
        &self,
        snapshot: &CheckpointSnapshot,
        err: EngineError,
    ) -> EngineError {
        if let Err(save_err) = self.store.save(snapshot) {
            tracing::error!("Failed to save checkpoint during interruption: {save_err}");
        }
        err
    }

    /// Run the cycle to completion (or to a resumable interruption).
    ///
    /// # Errors
    ///
    /// `AuthExpired` and `Interrupted` are resumable (checkpoint written);
    /// `Invariant` means the artifact was withheld; everything else is
    /// infrastructure.
    pub async fn run(&self) -> Result<CollectOutcome, EngineError> {
        let started = Instant::now();
        let window = CycleWindow::for_cycle(&self.settings.cycle, self.settings.method);

        let mut snapshot = match self.store.load()? {
            Some(snapshot) if snapshot.cycle_id == self.settings.cycle => {
                tracing::info!(
                    cycle = %self.settings.cycle,
                    players = snapshot.players.len(),
                    matches = snapshot.matches.len(),
                    pending = snapshot.pending_matches.len(),
                    "Resuming collection from checkpoint"
                );
                snapshot
            }
            _ => CheckpointSnapshot::empty(self.settings.cycle.clone()),
        };

        tracing::info!(
            cycle = %self.settings.cycle,
            region = %self.settings.region,
            method = %self.settings.method,
            window_start_ms = window.start_ms,
            window_end_ms = window.end_ms,
            "Starting collection cycle"
        );

        if !snapshot.discovery_complete {
            self.discover_players(&mut snapshot).await?;
            snapshot.discovery_complete = true;
            self.store.save(&snapshot)?;
        }

        self.fetch_histories(&mut snapshot, &window).await?;
        self.store.save(&snapshot)?;

        let shared = Arc::new(Mutex::new(snapshot));
        self.fetch_details(&shared, &window).await?;
        self.retry_failed(&shared, &window).await?;

        let snapshot = Arc::try_unwrap(shared)
            .map_err(|_| EngineError::Infrastructure(anyhow!("collector state still shared")))?
            .into_inner()
            .map_err(|_| EngineError::Infrastructure(anyhow!("collector state lock poisoned")))?;

        self.emit(snapshot, &window, started)
    }

    // -----------------------------------------------------------------------
    // DISCOVER_PLAYERS
    // -----------------------------------------------------------------------

    async fn discover_players(
        &self,
        snapshot: &mut CheckpointSnapshot,
    ) -> Result<(), EngineError> {
        let buckets = ladder(&self.settings.tiers);
        let resume_at = snapshot
            .cursor_tier_division
            .and_then(|cursor| buckets.iter().position(|b| *b == cursor).map(|i| i + 1))
            .unwrap_or(0);

        for bucket in buckets.iter().skip(resume_at) {
            if self.cancelled() {
                return Err(self.interrupt(snapshot, EngineError::Interrupted));
            }

            let before = snapshot.players.len();
            if bucket.division.is_none() {
                self.enumerate_apex(snapshot, *bucket).await?;
            } else {
                self.enumerate_divided(snapshot, *bucket).await?;
            }

            snapshot.cursor_tier_division = Some(*bucket);
            tracing::info!(
                bucket = %bucket,
                new_players = snapshot.players.len() - before,
                "League bucket enumerated"
            );
        }
        Ok(())
    }

    async fn enumerate_apex(
        &self,
        snapshot: &mut CheckpointSnapshot,
        bucket: TierDivision,
    ) -> Result<(), EngineError> {
        match self.client.apex_league(bucket.tier).await {
            Ok(league) => {
                let entries = league.entries.clone();
                snapshot
                    .leaderboards
                    .get_or_insert_with(BTreeMap::new)
                    .insert(bucket.tier.as_str().to_ascii_lowercase(), league);
                for entry in entries {
                    self.note_player(snapshot, &entry, bucket).await?;
                }
                Ok(())
            }
            Err(e) if e.is_auth_expired() => {
                Err(self.interrupt(snapshot, EngineError::AuthExpired))
            }
            Err(e) => {
                tracing::warn!(bucket = %bucket, "Skipping league bucket: {e}");
                Ok(())
            }
        }
    }

    async fn enumerate_divided(
        &self,
        snapshot: &mut CheckpointSnapshot,
        bucket: TierDivision,
    ) -> Result<(), EngineError> {
        for page in 1..=self.settings.max_entry_pages {
            match self.client.league_entries(bucket, page).await {
                Ok(entries) => {
                    if entries.is_empty() {
                        return Ok(());
                    }
                    for entry in &entries {
                        self.note_player(snapshot, entry, bucket).await?;
                    }
                }
                Err(e) if e.is_auth_expired() => {
                    return Err(self.interrupt(snapshot, EngineError::AuthExpired));
                }
                Err(e) => {
                    tracing::warn!(bucket = %bucket, page, "Skipping league page: {e}");
                    return Ok(());
                }
            }
        }
        tracing::debug!(bucket = %bucket, "Pagination cap reached");
        Ok(())
    }

    async fn note_player(
        &self,
        snapshot: &mut CheckpointSnapshot,
        entry: &LeagueEntry,
        bucket: TierDivision,
    ) -> Result<(), EngineError> {
        if entry.puuid.is_empty() || snapshot.players.contains_key(&entry.puuid) {
            return Ok(());
        }
        snapshot.players.insert(
            entry.puuid.clone(),
            PlayerRecord {
                puuid: entry.puuid.clone(),
                tier: entry.tier.or(Some(bucket.tier)),
                rank: entry.rank.or(bucket.division),
                league_points: entry.league_points,
                summoner_id: entry.summoner_id.clone(),
                match_ids: Vec::new(),
            },
        );
        registry_seen(
            self.registry.clone(),
            Puuid::new(&entry.puuid),
            self.settings.cycle.clone(),
        )
        .await
    }

    // -----------------------------------------------------------------------
    // FETCH_MATCH_HISTORIES
    // -----------------------------------------------------------------------

    async fn fetch_histories(
        &self,
        snapshot: &mut CheckpointSnapshot,
        window: &CycleWindow,
    ) -> Result<(), EngineError> {
        let todo: Vec<String> = snapshot
            .players
            .keys()
            .filter(|p| !snapshot.processed_players.contains(*p))
            .cloned()
            .collect();
        if todo.is_empty() {
            return Ok(());
        }
        tracing::info!(players = todo.len(), "Fetching match histories");

        let mut processed_since_save = 0u64;
        for puuid_str in todo {
            if self.cancelled() {
                return Err(self.interrupt(snapshot, EngineError::Interrupted));
            }

            let puuid = Puuid::new(&puuid_str);
            match self
                .client
                .match_ids(&puuid, window, self.settings.match_history_depth)
                .await
            {
                Ok(ids) => {
                    if let Some(player) = snapshot.players.get_mut(&puuid_str) {
                        player.match_ids = ids.clone();
                    }
                    for id in ids {
                        let match_id = MatchId::new(&id);
                        let outcome = registry_claim(
                            self.registry.clone(),
                            match_id,
                            self.settings.cycle.clone(),
                        )
                        .await?;
                        if outcome == ClaimOutcome::Claimed {
                            snapshot.pending_matches.push(id);
                            snapshot.detail_calls_scheduled += 1;
                        }
                    }
                }
                Err(e) if e.is_auth_expired() => {
                    return Err(self.interrupt(snapshot, EngineError::AuthExpired));
                }
                Err(e) => {
                    tracing::warn!(puuid = %puuid, "Match history fetch failed: {e}");
                    snapshot.error_account.record_player(e.category(), &puuid);
                }
            }

            snapshot.processed_players.insert(puuid_str);
            processed_since_save += 1;
            if processed_since_save % self.settings.checkpoint_interval == 0 {
                self.store.save(snapshot)?;
            }
        }

        tracing::info!(
            unique_pending = snapshot.pending_matches.len(),
            scheduled = snapshot.detail_calls_scheduled,
            "Match histories fetched"
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // FETCH_MATCH_DETAILS
    // -----------------------------------------------------------------------

    async fn fetch_details(
        &self,
        shared: &Arc<Mutex<CheckpointSnapshot>>,
        window: &CycleWindow,
    ) -> Result<(), EngineError> {
        let queue: Vec<MatchId> = {
            let state = shared
                .lock()
                .map_err(|_| EngineError::Infrastructure(anyhow!("state lock poisoned")))?;
            state.pending_matches.iter().map(MatchId::new).collect()
        };
        if queue.is_empty() {
            return Ok(());
        }
        tracing::info!(
            pending = queue.len(),
            workers = self.settings.workers,
            "Fetching match details"
        );

        let semaphore = Arc::new(Semaphore::new(self.settings.workers.max(1)));
        let auth_expired = Arc::new(AtomicBool::new(false));
        let mut join_set: JoinSet<Result<(), EngineError>> = JoinSet::new();

        for match_id in queue {
            if self.cancelled() || auth_expired.load(Ordering::SeqCst) {
                break;
            }
            let permit = semaphore.clone().acquire_owned().await.map_err(|e| {
                EngineError::Infrastructure(anyhow!("worker semaphore closed: {e}"))
            })?;

            let worker = DetailWorker {
                client: self.client.clone(),
                registry: self.registry.clone(),
                store: self.store.clone(),
                shared: shared.clone(),
                cycle: self.settings.cycle.clone(),
                policy: self.settings.policy,
                checkpoint_interval: self.settings.checkpoint_interval,
                window: *window,
            };
            let auth_flag = auth_expired.clone();
            let cancel = self.cancel.clone();

            join_set.spawn(async move {
                let _permit = permit;
                if *cancel.borrow() || auth_flag.load(Ordering::SeqCst) {
                    return Ok(());
                }
                worker.fetch_one(&match_id, &auth_flag).await
            });
        }

        let mut first_error: Option<EngineError> = None;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::error!("Detail worker failed: {e}");
                    if first_error.is_none() {
                        first_error = Some(e);
                        join_set.abort_all();
                    }
                }
                Err(join_err) if join_err.is_cancelled() && first_error.is_some() => {}
                Err(join_err) => {
                    return Err(EngineError::Infrastructure(anyhow!(
                        "detail worker panicked: {join_err}"
                    )));
                }
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        let state = shared
            .lock()
            .map_err(|_| EngineError::Infrastructure(anyhow!("state lock poisoned")))?;
        if auth_expired.load(Ordering::SeqCst) {
            return Err(self.interrupt(&state, EngineError::AuthExpired));
        }
        if self.cancelled() {
            return Err(self.interrupt(&state, EngineError::Interrupted));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Automatic retry sweep
    // -----------------------------------------------------------------------

    async fn retry_failed(
        &self,
        shared: &Arc<Mutex<CheckpointSnapshot>>,
        window: &CycleWindow,
    ) -> Result<(), EngineError> {
        let retryable: Vec<MatchId> = {
            let state = shared
                .lock()
                .map_err(|_| EngineError::Infrastructure(anyhow!("state lock poisoned")))?;
            state
                .error_account
                .retryable_match_ids()
                .into_iter()
                .filter(|id| !state.matches.contains_key(id.as_str()))
                .collect()
        };
        if retryable.is_empty() {
            return Ok(());
        }
        tracing::info!(count = retryable.len(), "Retrying failed matches");

        let auth_flag = AtomicBool::new(false);
        let worker = DetailWorker {
            client: self.client.clone(),
            registry: self.registry.clone(),
            store: self.store.clone(),
            shared: shared.clone(),
            cycle: self.settings.cycle.clone(),
            policy: self.settings.policy,
            checkpoint_interval: self.settings.checkpoint_interval,
            window: *window,
        };

        let mut recovered = 0usize;
        for match_id in retryable {
            if self.cancelled() || auth_flag.load(Ordering::SeqCst) {
                break;
            }
            registry_claim(
                self.registry.clone(),
                match_id.clone(),
                self.settings.cycle.clone(),
            )
            .await?;
            worker.fetch_one(&match_id, &auth_flag).await?;

            let mut state = shared
                .lock()
                .map_err(|_| EngineError::Infrastructure(anyhow!("state lock poisoned")))?;
            if state.matches.contains_key(match_id.as_str()) {
                state.error_account.forget_match(&match_id);
                recovered += 1;
            }
        }
        if recovered > 0 {
            tracing::info!(recovered, "Retry sweep recovered matches");
        }

        let state = shared
            .lock()
            .map_err(|_| EngineError::Infrastructure(anyhow!("state lock poisoned")))?;
        if auth_flag.load(Ordering::SeqCst) {
            return Err(self.interrupt(&state, EngineError::AuthExpired));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // EMIT
    // -----------------------------------------------------------------------

    fn emit(
        &self,
        snapshot: CheckpointSnapshot,
        window: &CycleWindow,
        started: Instant,
    ) -> Result<CollectOutcome, EngineError> {
        // A checkpoint must survive a failed emit.
        self.store.save(&snapshot)?;

        let players_with_no_matches = snapshot
            .players
            .values()
            .filter(|p| p.match_ids.is_empty())
            .count() as u64;
        let total_refs: u64 = snapshot
            .players
            .values()
            .map(|p| p.match_ids.len() as u64)
            .sum();

        let mut players = snapshot.players;
        for m in snapshot.matches.values() {
            for p in &m.info.participants {
                players
                    .entry(p.puuid.clone())
                    .or_insert_with(|| PlayerRecord {
                        puuid: p.puuid.clone(),
                        ..PlayerRecord::default()
                    });
            }
        }

        let collection_info = CollectionInfo {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            extraction_location: self.settings.region.as_str().to_string(),
            data_version: self.settings.data_version.clone(),
            collection_method: self.settings.method,
            incomplete_match_policy: self.settings.policy,
            cycle: self.settings.cycle.clone(),
            window_start_ms: window.start_ms,
            window_end_ms: window.end_ms,
            dataset_hash: None,
        };

        let mut artifact = CollectionArtifact::new(collection_info);
        artifact.players = players;
        artifact.matches = snapshot.matches;
        artifact.leaderboards = snapshot.leaderboards;
        artifact.error_summary = snapshot.error_account.summary();
        artifact.collection_stats = CollectionStats {
            players_processed: snapshot.processed_players.len() as u64,
            total_match_ids_collected: total_refs,
            unique_matches_fetched: snapshot.matches_collected,
            api_calls_saved: total_refs.saturating_sub(snapshot.detail_calls_scheduled),
            players_with_no_matches,
            incomplete_matches: snapshot.incomplete_notes,
            collection_time_seconds: started.elapsed().as_secs_f64(),
        };

        artifact.validate()?;

        let value = serde_json::to_value(&artifact)
            .map_err(|e| EngineError::Infrastructure(anyhow!("artifact serialization: {e}")))?;
        artifact.collection_info.dataset_hash = Some(content_hash(&value));

        if let Some(parent) = self.out_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| EngineError::Infrastructure(anyhow!("artifact dir: {e}")))?;
        }
        let body = serde_json::to_vec_pretty(&artifact)
            .map_err(|e| EngineError::Infrastructure(anyhow!("artifact serialization: {e}")))?;
        let tmp = self.out_path.with_extension("json.tmp");
        std::fs::write(&tmp, body)
            .map_err(|e| EngineError::Infrastructure(anyhow!("artifact write: {e}")))?;
        std::fs::rename(&tmp, &self.out_path)
            .map_err(|e| EngineError::Infrastructure(anyhow!("artifact rename: {e}")))?;

        self.store.delete()?;

        let registry_counts = self.registry.counts_by_status()?;
        let outcome = CollectOutcome {
            artifact_path: self.out_path.clone(),
            players: artifact.players.len(),
            matches: artifact.matches.len(),
            api_calls_saved: artifact.collection_stats.api_calls_saved,
            total_errors: artifact.error_summary.total_errors,
            registry_counts,
        };
        tracing::info!(
            cycle = %self.settings.cycle,
            players = outcome.players,
            matches = outcome.matches,
            api_calls_saved = outcome.api_calls_saved,
            total_errors = outcome.total_errors,
            "Collection artifact emitted"
        );
        Ok(outcome)
    }
}

// ---------------------------------------------------------------------------
// Detail fetch worker
// ---------------------------------------------------------------------------

/// Everything one detail fetch needs; cheap to clone into tasks.
struct DetailWorker {
    client: Arc<RiotClient>,
    registry: Arc<dyn Registry>,
    store: CheckpointStore,
    shared: Arc<Mutex<CheckpointSnapshot>>,
    cycle: CycleId,
    policy: IncompleteMatchPolicy,
    checkpoint_interval: u64,
    window: CycleWindow,
}

impl DetailWorker {
    /// Fetch one match and fold the outcome into the shared state.
    async fn fetch_one(
        &self,
        match_id: &MatchId,
        auth_flag: &AtomicBool,
    ) -> Result<(), EngineError> {
        match self.client.match_detail(match_id).await {
            Ok(detail) => self.record_success(match_id, detail).await,
            Err(e) if e.is_auth_expired() => {
                auth_flag.store(true, Ordering::SeqCst);
                Ok(())
            }
            Err(e) => self.record_failure(match_id, &e).await,
        }
    }

    async fn record_success(
        &self,
        match_id: &MatchId,
        detail: MatchDetail,
    ) -> Result<(), EngineError> {
        let in_window = self.window.contains(detail.info.game_datetime);
        let participant_count = detail.info.participants.len();
        let incomplete = participant_count < EXPECTED_PARTICIPANTS;

        // Registry first, outside the state lock.
        if in_window && incomplete {
            registry_incomplete(self.registry.clone(), match_id.clone(), self.cycle.clone())
                .await?;
        } else {
            registry_complete(self.registry.clone(), match_id.clone(), self.cycle.clone())
                .await?;
        }

        let to_save = {
            let mut state = self
                .shared
                .lock()
                .map_err(|_| EngineError::Infrastructure(anyhow!("state lock poisoned")))?;
            state.pending_matches.retain(|m| m != match_id.as_str());
            state.matches_collected += 1;

            if in_window {
                if incomplete {
                    state.incomplete_notes.push(IncompleteMatchNote {
                        match_id: match_id.as_str().to_string(),
                        participant_count,
                        queue_id: detail.info.queue_id,
                    });
                }
                let include = !(incomplete && self.policy == IncompleteMatchPolicy::Filter);
                if include {
                    let flagged = incomplete && self.policy == IncompleteMatchPolicy::Mark;
                    let record = MatchRecord {
                        match_id: match_id.as_str().to_string(),
                        data_version: detail.metadata.data_version.clone(),
                        is_incomplete: flagged.then_some(true),
                        incomplete_reasons: if flagged {
                            vec![format!(
                                "only {participant_count} participants (expected {EXPECTED_PARTICIPANTS})"
                            )]
                        } else {
                            Vec::new()
                        },
                        info: detail.info,
                    };
                    state.matches.insert(match_id.as_str().to_string(), record);
                }
            } else {
                tracing::debug!(
                    match_id = %match_id,
                    game_datetime = detail.info.game_datetime,
                    "Match outside cycle window, excluded from artifact"
                );
            }

            (self.checkpoint_interval > 0
                && state.matches_collected % self.checkpoint_interval == 0)
                .then(|| state.clone())
        };

        if let Some(snapshot) = to_save {
            tracing::info!(
                collected = snapshot.matches_collected,
                "Periodic checkpoint"
            );
            self.store.save(&snapshot)?;
        }
        Ok(())
    }

    async fn record_failure(&self, match_id: &MatchId, err: &ApiError) -> Result<(), EngineError> {
        let category = err.category();
        tracing::warn!(match_id = %match_id, category = %category, "Match detail fetch failed: {err}");
        registry_fail(self.registry.clone(), match_id.clone(), category).await?;

        let mut state = self
            .shared
            .lock()
            .map_err(|_| EngineError::Infrastructure(anyhow!("state lock poisoned")))?;
        state.pending_matches.retain(|m| m != match_id.as_str());
        state.error_account.record_match(category, match_id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Registry helpers (blocking SQLite off the async workers)
// ---------------------------------------------------------------------------

async fn registry_claim(
    registry: Arc<dyn Registry>,
    match_id: MatchId,
    cycle: CycleId,
) -> Result<ClaimOutcome, EngineError> {
    tokio::task::spawn_blocking(move || registry.claim(&match_id, &cycle))
        .await
        .map_err(|e| EngineError::Infrastructure(anyhow!("claim task panicked: {e}")))?
        .map_err(EngineError::from)
}

async fn registry_complete(
    registry: Arc<dyn Registry>,
    match_id: MatchId,
    cycle: CycleId,
) -> Result<(), EngineError> {
    tokio::task::spawn_blocking(move || registry.complete(&match_id, &cycle))
        .await
        .map_err(|e| EngineError::Infrastructure(anyhow!("complete task panicked: {e}")))?
        .map_err(EngineError::from)
}

async fn registry_incomplete(
    registry: Arc<dyn Registry>,
    match_id: MatchId,
    cycle: CycleId,
) -> Result<(), EngineError> {
    tokio::task::spawn_blocking(move || registry.mark_incomplete(&match_id, &cycle))
        .await
        .map_err(|e| EngineError::Infrastructure(anyhow!("mark_incomplete task panicked: {e}")))?
        .map_err(EngineError::from)
}

async fn registry_fail(
    registry: Arc<dyn Registry>,
    match_id: MatchId,
    category: tftcurate_types::error::ErrorCategory,
) -> Result<(), EngineError> {
    tokio::task::spawn_blocking(move || registry.fail(&match_id, category))
        .await
        .map_err(|e| EngineError::Infrastructure(anyhow!("fail task panicked: {e}")))?
        .map_err(EngineError::from)
}

async fn registry_seen(
    registry: Arc<dyn Registry>,
    puuid: Puuid,
    cycle: CycleId,
) -> Result<(), EngineError> {
    tokio::task::spawn_blocking(move || registry.seen_player(&puuid, &cycle))
        .await
        .map_err(|e| EngineError::Infrastructure(anyhow!("seen_player task panicked: {e}")))?
        .map_err(EngineError::from)
}
