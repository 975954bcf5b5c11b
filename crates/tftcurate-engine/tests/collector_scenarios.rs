//! End-to-end collector scenarios against the scripted API fixture.

mod common;

use common::{cycle_start_ms, no_cancel, test_config, Fixture};
use tftcurate_engine::pipeline::run_collect;
use tftcurate_engine::EngineError;
use tftcurate_registry::MatchStatus;
use tftcurate_types::artifact::{CollectionArtifact, IncompleteMatchPolicy};
use tftcurate_types::ids::CycleId;

const CYCLE: &str = "20251101";

fn read_artifact(path: &std::path::Path) -> CollectionArtifact {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

#[tokio::test]
async fn happy_path_single_cycle() {
    let fixture = Fixture::start().await;
    let noon = cycle_start_ms(CYCLE) + 12 * 3_600_000;

    fixture.seed_challenger(&["p1", "p2"]);
    fixture.seed_history("p1", &["LA2_1", "LA2_2", "LA2_3"]);
    fixture.seed_history("p2", &["LA2_4", "LA2_5", "LA2_6"]);
    for n in 1..=6 {
        let seed = if n <= 3 { "p1" } else { "p2" };
        fixture.seed_full_match(&format!("LA2_{n}"), noon, seed);
    }

    let root = tempfile::tempdir().unwrap();
    let config = test_config(root.path(), &fixture.base, CYCLE);
    let cycle = CycleId::new(CYCLE).unwrap();

    let outcome = run_collect(&config, &cycle, &no_cancel())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(outcome.matches, 6);
    assert_eq!(outcome.total_errors, 0);
    assert_eq!(outcome.registry_counts[&MatchStatus::Complete], 6);

    let artifact = read_artifact(&outcome.artifact_path);
    assert_eq!(artifact.matches.len(), 6);
    assert!(artifact.players.contains_key("p1"));
    assert!(artifact.players.contains_key("p2"));
    assert_eq!(artifact.error_summary.total_errors, 0);
    assert!(artifact.collection_info.dataset_hash.is_some());
    assert_eq!(artifact.collection_stats.unique_matches_fetched, 6);
    assert_eq!(artifact.collection_stats.api_calls_saved, 0);
    // Leaderboard snapshot retained.
    assert!(artifact
        .leaderboards
        .as_ref()
        .unwrap()
        .contains_key("challenger"));
    // Participant puuid closure: every participant resolves.
    for m in artifact.matches.values() {
        for p in &m.info.participants {
            assert!(artifact.players.contains_key(&p.puuid));
        }
    }

    // Checkpoint removed on success.
    let checkpoint = outcome
        .artifact_path
        .with_file_name(format!("tft_collection_{CYCLE}_checkpoint.json"));
    assert!(!checkpoint.exists());
}

#[tokio::test]
async fn dedup_skips_already_complete_matches() {
    let fixture = Fixture::start().await;
    let day1 = cycle_start_ms("20251101") + 3_600_000;
    let day2 = cycle_start_ms("20251102") + 3_600_000;

    fixture.seed_challenger(&["p1"]);
    fixture.seed_history("p1", &["LA2_1", "LA2_2", "LA2_3", "LA2_4", "LA2_5"]);
    for n in 1..=5 {
        fixture.seed_full_match(&format!("LA2_{n}"), day1, "p1");
    }

    let root = tempfile::tempdir().unwrap();
    let config = test_config(root.path(), &fixture.base, "20251101");
    let cycle1 = CycleId::new("20251101").unwrap();
    let outcome1 = run_collect(&config, &cycle1, &no_cancel())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome1.matches, 5);

    // Next cycle rediscovers the same five plus two new matches.
    fixture.seed_history(
        "p1",
        &["LA2_1", "LA2_2", "LA2_3", "LA2_4", "LA2_5", "LA2_6", "LA2_7"],
    );
    fixture.seed_full_match("LA2_6", day2, "p1");
    fixture.seed_full_match("LA2_7", day2, "p1");

    let config2 = test_config(root.path(), &fixture.base, "20251102");
    let cycle2 = CycleId::new("20251102").unwrap();
    let outcome2 = run_collect(&config2, &cycle2, &no_cancel())
        .await
        .unwrap()
        .unwrap();

    // Detail requests went out only for the two new matches.
    for n in 1..=5 {
        assert_eq!(fixture.success_hits(&format!("LA2_{n}")), 1, "LA2_{n}");
    }
    assert_eq!(fixture.success_hits("LA2_6"), 1);
    assert_eq!(fixture.success_hits("LA2_7"), 1);

    let artifact2 = read_artifact(&outcome2.artifact_path);
    assert_eq!(artifact2.matches.len(), 2);
    assert!(artifact2.matches.contains_key("LA2_6"));
    assert!(artifact2.matches.contains_key("LA2_7"));
    assert_eq!(artifact2.collection_stats.api_calls_saved, 5);
    assert_eq!(outcome2.registry_counts[&MatchStatus::Complete], 7);
}

#[tokio::test]
async fn auth_expiry_checkpoints_and_resumes() {
    let fixture = Fixture::start().await;
    let noon = cycle_start_ms(CYCLE) + 12 * 3_600_000;

    fixture.seed_challenger(&["p1", "p2"]);
    fixture.seed_history("p1", &["LA2_1", "LA2_2", "LA2_3"]);
    fixture.seed_history("p2", &["LA2_4", "LA2_5", "LA2_6"]);
    for n in 1..=6 {
        let seed = if n <= 3 { "p1" } else { "p2" };
        fixture.seed_full_match(&format!("LA2_{n}"), noon, seed);
    }

    let root = tempfile::tempdir().unwrap();
    let config = test_config(root.path(), &fixture.base, CYCLE);
    let cycle = CycleId::new(CYCLE).unwrap();
    let paths_raw = root
        .path()
        .join("data/raw")
        .join(format!("tft_collection_{CYCLE}.json"));
    let paths_checkpoint = root
        .path()
        .join("data/raw")
        .join(format!("tft_collection_{CYCLE}_checkpoint.json"));

    // Credential dies after three served detail calls.
    fixture.expire_auth_after(3);
    let err = run_collect(&config, &cycle, &no_cancel())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::AuthExpired));
    assert_eq!(err.exit_code(), tftcurate_engine::EXIT_RESUMABLE);
    assert!(paths_checkpoint.exists(), "checkpoint must survive auth expiry");
    assert!(!paths_raw.exists(), "no artifact on interruption");

    // Fresh credential: the rerun resumes from the checkpoint.
    fixture.renew_auth();
    let outcome = run_collect(&config, &cycle, &no_cancel())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(outcome.matches, 6);
    assert!(!paths_checkpoint.exists());
    let artifact = read_artifact(&outcome.artifact_path);
    assert_eq!(artifact.matches.len(), 6);
    // Resume equivalence: no match was detail-fetched twice.
    for n in 1..=6 {
        assert_eq!(fixture.success_hits(&format!("LA2_{n}")), 1, "LA2_{n}");
    }
}

#[tokio::test]
async fn incomplete_match_policies() {
    for policy in [
        IncompleteMatchPolicy::Mark,
        IncompleteMatchPolicy::Filter,
        IncompleteMatchPolicy::Identify,
    ] {
        let fixture = Fixture::start().await;
        let noon = cycle_start_ms(CYCLE) + 12 * 3_600_000;

        fixture.seed_challenger(&["p1"]);
        fixture.seed_history("p1", &["LA2_1"]);
        fixture.seed_match(
            "LA2_1",
            noon,
            &[
                ("p1", 1),
                ("o2", 2),
                ("o3", 3),
                ("o4", 4),
                ("o5", 5),
                ("o6", 6),
            ],
        );

        let root = tempfile::tempdir().unwrap();
        let mut config = test_config(root.path(), &fixture.base, CYCLE);
        config.collection.incomplete_match_policy = policy;
        let cycle = CycleId::new(CYCLE).unwrap();

        let outcome = run_collect(&config, &cycle, &no_cancel())
            .await
            .unwrap()
            .unwrap();
        let artifact = read_artifact(&outcome.artifact_path);

        // Common to every policy: registry INCOMPLETE, empty error
        // summary, a note in collection stats.
        assert_eq!(
            outcome.registry_counts[&MatchStatus::Incomplete], 1,
            "{policy}"
        );
        assert_eq!(artifact.error_summary.total_errors, 0, "{policy}");
        assert_eq!(artifact.collection_stats.incomplete_matches.len(), 1);
        assert_eq!(
            artifact.collection_stats.incomplete_matches[0].participant_count,
            6
        );

        match policy {
            IncompleteMatchPolicy::Mark => {
                let m = &artifact.matches["LA2_1"];
                assert_eq!(m.is_incomplete, Some(true));
                assert!(!m.incomplete_reasons.is_empty());
                assert_eq!(
                    artifact.collection_info.incomplete_match_policy,
                    IncompleteMatchPolicy::Mark
                );
            }
            IncompleteMatchPolicy::Filter => {
                assert!(!artifact.matches.contains_key("LA2_1"), "filter drops");
            }
            IncompleteMatchPolicy::Identify => {
                let m = &artifact.matches["LA2_1"];
                assert_eq!(m.is_incomplete, None, "identify retains unflagged");
            }
        }
    }
}

#[tokio::test]
async fn invariant_violation_withholds_artifact() {
    let fixture = Fixture::start().await;
    let noon = cycle_start_ms(CYCLE) + 12 * 3_600_000;

    fixture.seed_challenger(&["p1"]);
    fixture.seed_history("p1", &["LA2_1"]);
    // Duplicate placement 1 violates the placement permutation invariant.
    fixture.seed_match(
        "LA2_1",
        noon,
        &[
            ("p1", 1),
            ("o2", 1),
            ("o3", 3),
            ("o4", 4),
            ("o5", 5),
            ("o6", 6),
            ("o7", 7),
            ("o8", 8),
        ],
    );

    let root = tempfile::tempdir().unwrap();
    let config = test_config(root.path(), &fixture.base, CYCLE);
    let cycle = CycleId::new(CYCLE).unwrap();

    let err = run_collect(&config, &cycle, &no_cancel())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Invariant(_)));
    assert!(err.to_string().contains("duplicate placement"));

    let raw = root
        .path()
        .join("data/raw")
        .join(format!("tft_collection_{CYCLE}.json"));
    let checkpoint = root
        .path()
        .join("data/raw")
        .join(format!("tft_collection_{CYCLE}_checkpoint.json"));
    assert!(!raw.exists(), "no artifact may be published");
    assert!(checkpoint.exists(), "checkpoint preserved for inspection");
}

#[tokio::test]
async fn out_of_window_matches_are_excluded_but_registered() {
    let fixture = Fixture::start().await;
    let noon = cycle_start_ms(CYCLE) + 12 * 3_600_000;
    let prior_week = noon - 9 * 86_400_000;

    fixture.seed_challenger(&["p1"]);
    fixture.seed_history("p1", &["LA2_IN", "LA2_OUT"]);
    fixture.seed_full_match("LA2_IN", noon, "p1");
    fixture.seed_full_match("LA2_OUT", prior_week, "p1");

    let root = tempfile::tempdir().unwrap();
    let config = test_config(root.path(), &fixture.base, CYCLE);
    let cycle = CycleId::new(CYCLE).unwrap();

    let outcome = run_collect(&config, &cycle, &no_cancel())
        .await
        .unwrap()
        .unwrap();
    let artifact = read_artifact(&outcome.artifact_path);

    assert!(artifact.matches.contains_key("LA2_IN"));
    assert!(!artifact.matches.contains_key("LA2_OUT"));
    // The registry still learned about the excluded match.
    assert_eq!(outcome.registry_counts[&MatchStatus::Complete], 2);
}

#[tokio::test]
async fn not_found_matches_are_failed_and_accounted() {
    let fixture = Fixture::start().await;
    let noon = cycle_start_ms(CYCLE) + 12 * 3_600_000;

    fixture.seed_challenger(&["p1"]);
    fixture.seed_history("p1", &["LA2_1", "LA2_GONE"]);
    fixture.seed_full_match("LA2_1", noon, "p1");
    // LA2_GONE is never seeded: the fixture answers 404.

    let root = tempfile::tempdir().unwrap();
    let config = test_config(root.path(), &fixture.base, CYCLE);
    let cycle = CycleId::new(CYCLE).unwrap();

    let outcome = run_collect(&config, &cycle, &no_cancel())
        .await
        .unwrap()
        .unwrap();
    let artifact = read_artifact(&outcome.artifact_path);

    // The cycle continues despite the 404.
    assert!(artifact.matches.contains_key("LA2_1"));
    assert_eq!(artifact.error_summary.total_errors, 1);
    let not_found = &artifact.error_summary.errors_by_category
        [&tftcurate_types::error::ErrorCategory::NotFound];
    assert_eq!(not_found.match_ids, vec!["LA2_GONE"]);
    assert_eq!(outcome.registry_counts[&MatchStatus::Failed], 1);
}
