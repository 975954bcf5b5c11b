//! Orchestrator scenarios: the full stage DAG, skip logic, the quality
//! gate, and provenance checksums.

mod common;

use std::time::SystemTime;

use common::{cycle_start_ms, no_cancel, test_config, Fixture};
use tftcurate_engine::pipeline::{run_cycle, StageStatus};
use tftcurate_engine::paths::CyclePaths;
use tftcurate_engine::EngineError;
use tftcurate_types::artifact::IncompleteMatchPolicy;
use tftcurate_types::ids::CycleId;

const CYCLE: &str = "20251101";

fn seed_happy_fixture(fixture: &Fixture) {
    let noon = cycle_start_ms(CYCLE) + 12 * 3_600_000;
    fixture.seed_challenger(&["p1", "p2"]);
    fixture.seed_history("p1", &["LA2_1", "LA2_2"]);
    fixture.seed_history("p2", &["LA2_3"]);
    for n in 1..=3 {
        let seed = if n <= 2 { "p1" } else { "p2" };
        fixture.seed_full_match(&format!("LA2_{n}"), noon, seed);
    }
}

fn mtime(path: &std::path::Path) -> SystemTime {
    std::fs::metadata(path).unwrap().modified().unwrap()
}

#[tokio::test]
async fn full_dag_produces_every_output_and_is_idempotent() {
    let fixture = Fixture::start().await;
    seed_happy_fixture(&fixture);

    let root = tempfile::tempdir().unwrap();
    let config = test_config(root.path(), &fixture.base, CYCLE);
    let cycle = CycleId::new(CYCLE).unwrap();
    let paths = CyclePaths::new(root.path(), cycle.clone());

    let report = run_cycle(&config, None, &cycle, &no_cancel()).await.unwrap();
    for stage in &report.stages {
        assert_eq!(stage.status, StageStatus::Completed, "{}", stage.name);
    }

    for output in [
        paths.raw(),
        paths.validated(),
        paths.transformed(),
        paths.validation_report(),
        paths.quality_report(),
        paths.cross_cycle_report(),
        paths.parquet_matches(),
        paths.parquet_participants(),
        paths.backup(),
        paths.backup_metadata(),
        paths.provenance(),
        paths.log(),
    ] {
        assert!(output.exists(), "missing output: {}", output.display());
    }

    // Second invocation performs no work.
    let raw_before = mtime(&paths.raw());
    let prov_before = mtime(&paths.provenance());
    let report2 = run_cycle(&config, None, &cycle, &no_cancel()).await.unwrap();
    for stage in &report2.stages {
        assert_eq!(stage.status, StageStatus::Skipped, "{}", stage.name);
    }
    assert_eq!(mtime(&paths.raw()), raw_before);
    assert_eq!(mtime(&paths.provenance()), prov_before);
}

#[tokio::test]
async fn provenance_entities_carry_checksums_and_track_changes() {
    let fixture = Fixture::start().await;
    seed_happy_fixture(&fixture);

    let root = tempfile::tempdir().unwrap();
    let config = test_config(root.path(), &fixture.base, CYCLE);
    let cycle = CycleId::new(CYCLE).unwrap();
    let paths = CyclePaths::new(root.path(), cycle.clone());

    run_cycle(&config, None, &cycle, &no_cancel()).await.unwrap();

    let doc: serde_json::Value =
        serde_json::from_slice(&std::fs::read(paths.provenance()).unwrap()).unwrap();
    let entities = doc["entity"].as_object().unwrap();
    let activities = doc["activity"].as_object().unwrap();
    let agents = doc["agent"].as_object().unwrap();

    assert!(entities.contains_key("entity:raw_collection"));
    assert!(entities.contains_key("entity:validated"));
    assert!(entities.contains_key("entity:parquet_matches"));
    assert!(entities.contains_key("entity:provenance"));
    assert_eq!(agents.len(), 4);
    assert!(activities.contains_key("activity:workflow"));
    assert!(activities.contains_key("activity:collect"));

    // Every file entity carries a 64-hex checksum and timestamps; the
    // workflow activity spans its stages.
    let sha_before = entities["entity:validated"]["tft:sha256"]
        .as_str()
        .unwrap()
        .to_string();
    assert_eq!(sha_before.len(), 64);
    assert!(activities["activity:validate"]["prov:startedAtTime"].is_string());

    // Rewriting an input changes its entity checksum on the next run.
    std::thread::sleep(std::time::Duration::from_millis(20));
    let mut body = std::fs::read_to_string(paths.validated()).unwrap();
    body.push('\n');
    std::fs::write(paths.validated(), body).unwrap();

    run_cycle(&config, None, &cycle, &no_cancel()).await.unwrap();
    let doc2: serde_json::Value =
        serde_json::from_slice(&std::fs::read(paths.provenance()).unwrap()).unwrap();
    let sha_after = doc2["entity"]["entity:validated"]["tft:sha256"]
        .as_str()
        .unwrap();
    assert_ne!(sha_before, sha_after);
}

#[tokio::test]
async fn quality_gate_blocks_low_scoring_cycles() {
    let fixture = Fixture::start().await;
    let noon = cycle_start_ms(CYCLE) + 12 * 3_600_000;

    // A single six-participant match drags completeness to zero.
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
    config.collection.incomplete_match_policy = IncompleteMatchPolicy::Mark;
    config.quality.quality_threshold = 0.95;
    let cycle = CycleId::new(CYCLE).unwrap();
    let paths = CyclePaths::new(root.path(), cycle.clone());

    let err = run_cycle(&config, None, &cycle, &no_cancel())
        .await
        .unwrap_err();
    match err {
        EngineError::Stage { stage, .. } => assert_eq!(stage, "quality"),
        other => panic!("expected quality stage failure, got {other}"),
    }

    let report: serde_json::Value =
        serde_json::from_slice(&std::fs::read(paths.quality_report()).unwrap()).unwrap();
    assert_eq!(report["passed"], false);
    assert!(report["score"].as_f64().unwrap() < 0.95);
    // Fan-out stages never ran.
    assert!(!paths.parquet_matches().exists());
    assert!(!paths.provenance().exists());
}

#[tokio::test]
async fn cross_cycle_report_compares_against_previous_cycle() {
    let fixture = Fixture::start().await;
    let day1 = cycle_start_ms("20251101") + 3_600_000;
    let day2 = cycle_start_ms("20251102") + 3_600_000;

    fixture.seed_challenger(&["p1"]);
    fixture.seed_history("p1", &["LA2_1"]);
    fixture.seed_full_match("LA2_1", day1, "p1");

    let root = tempfile::tempdir().unwrap();
    let cycle1 = CycleId::new("20251101").unwrap();
    let config1 = test_config(root.path(), &fixture.base, "20251101");
    run_cycle(&config1, None, &cycle1, &no_cancel()).await.unwrap();

    let paths1 = CyclePaths::new(root.path(), cycle1);
    let report1: serde_json::Value =
        serde_json::from_slice(&std::fs::read(paths1.cross_cycle_report()).unwrap()).unwrap();
    assert!(report1["baseline_cycle"].is_null());

    fixture.seed_history("p1", &["LA2_2"]);
    fixture.seed_full_match("LA2_2", day2, "p1");
    let cycle2 = CycleId::new("20251102").unwrap();
    let config2 = test_config(root.path(), &fixture.base, "20251102");
    run_cycle(&config2, None, &cycle2, &no_cancel()).await.unwrap();

    let paths2 = CyclePaths::new(root.path(), cycle2);
    let report2: serde_json::Value =
        serde_json::from_slice(&std::fs::read(paths2.cross_cycle_report()).unwrap()).unwrap();
    assert_eq!(report2["baseline_cycle"], "20251101");
    let comparison = &report2["comparison"];
    assert_eq!(comparison["matches_current"], 1);
    assert_eq!(comparison["matches_baseline"], 1);
    assert_eq!(comparison["shared_matches"], 0);
    assert!(comparison["shared_players"].as_u64().unwrap() >= 1);
}
