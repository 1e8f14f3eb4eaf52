//! End-to-end: drive the register fixture through a real `Controller` round
//! and confirm the recorded history checks out linearizable, exercising the
//! full `Controller -> Recorder -> read_events -> fray-checker` pipeline
//! rather than a hand-built history.

use std::sync::Arc;
use std::time::Duration;

use fray_checker::check;
use fray_controller::{Controller, ControllerConfig};
use fray_core::db::Db;
use fray_models::register::{RegisterModel, RegisterParser};
use fray_registry::Registry;
use fray_testkit::{RegisterFixture, RegisterFixtureClientCreator};

#[tokio::test]
async fn concurrent_register_workload_is_linearizable() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = RegisterFixture::new(0);
    let db_name = fixture.name().to_string();

    let mut registry = Registry::new();
    registry.register_db(fixture.clone()).unwrap();

    let config = ControllerConfig {
        nodes: vec!["n1".to_string(), "n2".to_string(), "n3".to_string()],
        db_name,
        request_count: 60,
        round_time: Duration::from_secs(5),
        rounds: 1,
        history_base: dir.path().join("register").to_string_lossy().to_string(),
    };

    let creator = RegisterFixtureClientCreator::new(fixture);
    let mut controller = Controller::new(config, Arc::new(registry), &creator);
    let report = controller.run().await.unwrap();

    assert_eq!(report.rounds.len(), 1);
    let round = &report.rounds[0];
    assert_eq!(round.requests_issued, 60);

    let mut parser = RegisterParser;
    let entries = fray_history::read_events(&round.history_path, &mut parser).unwrap();
    assert!(!entries.is_empty());

    let model = RegisterModel::new(0);
    assert!(check(&model, &entries), "real register fixture should always linearize");
}
