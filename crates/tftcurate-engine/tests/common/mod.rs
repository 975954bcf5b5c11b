//! Scripted upstream-API fixture shared by the integration tests.

// Not every test file exercises every helper.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path as UrlPath, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use tftcurate_engine::config::types::{CycleSelection, PipelineConfig};
use tftcurate_types::ids::CycleId;
use tftcurate_types::tier::Tier;

/// Scriptable API state: leagues, histories, details, and failure
/// injection.
#[derive(Default)]
pub struct FixtureState {
    pub apex: Mutex<HashMap<String, Value>>,
    pub histories: Mutex<HashMap<String, Vec<String>>>,
    pub details: Mutex<HashMap<String, Value>>,
    /// Successful (200) detail responses served, per match ID.
    pub detail_success_hits: Mutex<HashMap<String, usize>>,
    /// Every detail call, successful or not.
    pub detail_total_hits: AtomicUsize,
    /// Detail calls served before the API starts returning 403.
    pub auth_fail_after: AtomicUsize,
}

pub struct Fixture {
    pub state: Arc<FixtureState>,
    pub base: String,
}

impl Fixture {
    pub async fn start() -> Self {
        let state = Arc::new(FixtureState {
            auth_fail_after: AtomicUsize::new(usize::MAX),
            ..FixtureState::default()
        });

        let app = Router::new()
            .route("/tft/league/v1/:tier", get(apex_league))
            .route("/tft/league/v1/entries/:tier/:division", get(league_entries))
            .route("/tft/match/v1/matches/by-puuid/:puuid/ids", get(match_ids))
            .route("/tft/match/v1/matches/:id", get(match_detail))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { state, base }
    }

    /// Seed a challenger league with the given player PUUIDs.
    pub fn seed_challenger(&self, puuids: &[&str]) {
        let entries: Vec<Value> = puuids
            .iter()
            .enumerate()
            .map(|(i, puuid)| {
                json!({
                    "puuid": puuid,
                    "summonerId": format!("summoner-{puuid}"),
                    "leaguePoints": 900 - i as u32,
                    "rank": "I",
                })
            })
            .collect();
        self.state.apex.lock().unwrap().insert(
            "challenger".to_string(),
            json!({"tier": "CHALLENGER", "entries": entries}),
        );
    }

    /// Seed a player's match history.
    pub fn seed_history(&self, puuid: &str, ids: &[&str]) {
        self.state.histories.lock().unwrap().insert(
            puuid.to_string(),
            ids.iter().map(|s| (*s).to_string()).collect(),
        );
    }

    /// Seed a full match detail with one placement per participant.
    pub fn seed_match(&self, id: &str, game_datetime: i64, placements: &[(&str, u8)]) {
        let participants: Vec<Value> = placements
            .iter()
            .map(|(puuid, placement)| {
                json!({
                    "puuid": puuid,
                    "placement": placement,
                    "level": 8,
                    "gold_left": 3,
                    "last_round": 31,
                    "traits": [{"name": "Sentinel", "num_units": 4, "tier_current": 2}],
                    "units": [{"character_id": "TFT12_Ahri", "itemNames": [], "tier": 2}],
                    "augments": []
                })
            })
            .collect();
        let detail = json!({
            "metadata": {
                "match_id": id,
                "data_version": "6",
                "participants": placements.iter().map(|(p, _)| *p).collect::<Vec<_>>()
            },
            "info": {
                "game_datetime": game_datetime,
                "game_length": 1843.5,
                "game_version": "Version 14.21",
                "queue_id": 1100,
                "tft_set_number": 12,
                "tft_game_type": "standard",
                "participants": participants
            }
        });
        self.state
            .details
            .lock()
            .unwrap()
            .insert(id.to_string(), detail);
    }

    /// Seed a match with eight placements 1..=8; participants are
    /// `seed` plus generated opponents.
    pub fn seed_full_match(&self, id: &str, game_datetime: i64, seed: &str) {
        let opponents: Vec<String> =
            (2..=8).map(|n| format!("{seed}-opp{n}")).collect();
        let mut placements: Vec<(&str, u8)> = vec![(seed, 1)];
        for (i, opponent) in opponents.iter().enumerate() {
            placements.push((opponent.as_str(), u8::try_from(i + 2).unwrap()));
        }
        self.seed_match(id, game_datetime, &placements);
    }

    /// Successful detail fetch count for a match.
    pub fn success_hits(&self, id: &str) -> usize {
        self.state
            .detail_success_hits
            .lock()
            .unwrap()
            .get(id)
            .copied()
            .unwrap_or(0)
    }

    /// Start failing detail calls with 403 after `calls` have been served.
    pub fn expire_auth_after(&self, calls: usize) {
        self.state.auth_fail_after.store(calls, Ordering::SeqCst);
    }

    /// Stop injecting auth failures (fresh credential).
    pub fn renew_auth(&self) {
        self.state
            .auth_fail_after
            .store(usize::MAX, Ordering::SeqCst);
    }
}

async fn apex_league(
    State(state): State<Arc<FixtureState>>,
    UrlPath(tier): UrlPath<String>,
) -> Json<Value> {
    let leagues = state.apex.lock().unwrap();
    Json(leagues.get(&tier).cloned().unwrap_or_else(|| {
        json!({"tier": tier.to_ascii_uppercase(), "entries": []})
    }))
}

async fn league_entries(
    State(_state): State<Arc<FixtureState>>,
    UrlPath((_tier, _division)): UrlPath<(String, String)>,
    Query(_params): Query<HashMap<String, String>>,
) -> Json<Value> {
    Json(json!([]))
}

async fn match_ids(
    State(state): State<Arc<FixtureState>>,
    UrlPath(puuid): UrlPath<String>,
) -> Json<Value> {
    let histories = state.histories.lock().unwrap();
    Json(json!(histories.get(&puuid).cloned().unwrap_or_default()))
}

async fn match_detail(
    State(state): State<Arc<FixtureState>>,
    UrlPath(id): UrlPath<String>,
) -> (StatusCode, Json<Value>) {
    let served = state.detail_total_hits.fetch_add(1, Ordering::SeqCst);
    if served >= state.auth_fail_after.load(Ordering::SeqCst) {
        return (StatusCode::FORBIDDEN, Json(json!({"status": 403})));
    }

    let details = state.details.lock().unwrap();
    match details.get(&id) {
        Some(detail) => {
            *state
                .detail_success_hits
                .lock()
                .unwrap()
                .entry(id)
                .or_insert(0) += 1;
            (StatusCode::OK, Json(detail.clone()))
        }
        None => (StatusCode::NOT_FOUND, Json(json!({"status": 404}))),
    }
}

/// Pipeline configuration pointed at the fixture and a temp data root.
pub fn test_config(root: &Path, base: &str, cycle: &str) -> PipelineConfig {
    std::env::set_var("RIOT_API_KEY", "RGAPI-test");

    let mut config = PipelineConfig::default();
    config.pipeline = "fixture".to_string();
    config.collection_date = Some(CycleSelection(vec![CycleId::new(cycle).unwrap()]));
    config.data_root = root.to_path_buf();
    config.api.platform_base = Some(base.to_string());
    config.api.regional_base = Some(base.to_string());
    config.api.rate_limit = 100_000;
    config.api.requests_per_second = 10_000;
    config.collection.tiers = vec![Tier::Challenger];
    config.collection.workers = 2;
    config
}

/// Midnight UTC of a cycle date, in epoch milliseconds.
pub fn cycle_start_ms(cycle: &str) -> i64 {
    let date = CycleId::new(cycle).unwrap().date();
    date.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp_millis()
}

/// Cancellation token that never fires.
pub fn no_cancel() -> tokio::sync::watch::Receiver<bool> {
    let (tx, rx) = tokio::sync::watch::channel(false);
    // Keep the sender alive for the duration of the test.
    std::mem::forget(tx);
    rx
}
