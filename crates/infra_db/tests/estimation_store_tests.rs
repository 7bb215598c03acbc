//! PostgreSQL adapter integration tests
//!
//! These start a PostgreSQL container and need a local Docker daemon:
//! `cargo test -p infra_db -- --ignored`

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use uuid::Uuid;

use core_kernel::{Currency, DetectionId, HealthCheckable};
use domain_estimation::{
    DetectionPort, EstimateTotals, EstimationBuilder, EstimationPort, LineItem, Severity,
};
use infra_db::repositories::detection::{NewDamage, NewDetection};
use infra_db::{PostgresDetectionAdapter, PostgresEstimationAdapter};
use test_utils::{assert_estimation_invariants, create_isolated_test_database, EngineFixtures, MoneyFixtures};

async fn seed_detection(adapter: &PostgresDetectionAdapter) -> DetectionId {
    let id = Uuid::new_v4();
    adapter
        .repository()
        .insert(
            &NewDetection {
                id,
                image_path: Some("uploads/car.jpg".to_string()),
                original_filename: Some("car.jpg".to_string()),
                model_version: Some("yolov8n".to_string()),
                created_at: Utc::now(),
            },
            &[
                NewDamage {
                    id: Uuid::new_v4(),
                    damage_type: "damaged_bumper".to_string(),
                    severity: Some("moderate".to_string()),
                    confidence: 0.91,
                    bbox_x: 0.1,
                    bbox_y: 0.5,
                    bbox_width: 0.3,
                    bbox_height: 0.3,
                    affected_part: Some("bumper".to_string()),
                },
                NewDamage {
                    id: Uuid::new_v4(),
                    damage_type: "dent_or_scratch".to_string(),
                    severity: None,
                    confidence: 0.6,
                    bbox_x: 0.4,
                    bbox_y: 0.4,
                    bbox_width: 0.1,
                    bbox_height: 0.1,
                    affected_part: None,
                },
            ],
        )
        .await
        .expect("seed detection");
    DetectionId::from(id)
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn detection_round_trips_with_damage_order() {
    let db = create_isolated_test_database().await.expect("test database");
    let adapter = PostgresDetectionAdapter::new(db.pool().clone());
    let id = seed_detection(&adapter).await;

    let detection = adapter.get_detection(id, None).await.unwrap();

    assert_eq!(detection.total_damages(), 2);
    assert_eq!(detection.damages[0].severity, Some(Severity::Moderate));
    assert_eq!(detection.damages[1].severity, None);
    assert!(adapter.health_check().await.is_healthy());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn missing_detection_is_not_found() {
    let db = create_isolated_test_database().await.expect("test database");
    let adapter = PostgresDetectionAdapter::new(db.pool().clone());

    let error = adapter.get_detection(DetectionId::new(), None).await.unwrap_err();
    assert!(error.is_not_found());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn estimations_are_appended_and_read_newest_first() {
    let db = create_isolated_test_database().await.expect("test database");
    let detections = PostgresDetectionAdapter::new(db.pool().clone());
    let estimations = PostgresEstimationAdapter::new(db.pool().clone());
    let detection_id = seed_detection(&detections).await;
    let detection = detections.get_detection(detection_id, None).await.unwrap();

    let table = EngineFixtures::standard_table();
    let damage = &detection.damages[0];
    let rule = table.lookup(damage.damage_type, Severity::Moderate).unwrap();
    let items = vec![LineItem::calculate(
        damage,
        Severity::Moderate,
        rule,
        MoneyFixtures::usd_labor_rate(),
        true,
    )
    .unwrap()];

    let older = EstimationBuilder::new(detection_id)
        .labor_rate(MoneyFixtures::usd_labor_rate())
        .totals(EstimateTotals::aggregate(&items, dec!(20), Currency::USD).unwrap())
        .line_items(items.clone())
        .created_at(Utc::now() - Duration::hours(1))
        .build()
        .unwrap();
    let newer = EstimationBuilder::new(detection_id)
        .labor_rate(MoneyFixtures::usd_labor_rate())
        .totals(EstimateTotals::aggregate(&items, dec!(10), Currency::USD).unwrap())
        .line_items(items)
        .build()
        .unwrap();

    estimations.save_estimation(&older, None).await.unwrap();
    estimations.save_estimation(&newer, None).await.unwrap();

    let history = estimations.history_for_detection(detection_id, None).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id(), newer.id());
    assert_eq!(history[1].id(), older.id());

    let latest = estimations
        .latest_for_detection(detection_id, None)
        .await
        .unwrap()
        .expect("latest estimation");
    assert_eq!(latest.total_cost().amount(), dec!(1127.50));
    assert_eq!(latest.line_items(), newer.line_items());
    assert_estimation_invariants(&latest);

    let count = estimations
        .repository()
        .count_for_detection(*detection_id.as_uuid())
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn estimation_for_unknown_detection_is_rejected() {
    let db = create_isolated_test_database().await.expect("test database");
    let estimations = PostgresEstimationAdapter::new(db.pool().clone());
    let estimation = EstimationBuilder::new(DetectionId::new())
        .labor_rate(MoneyFixtures::usd_labor_rate())
        .totals(EstimateTotals::aggregate(&[], dec!(20), Currency::USD).unwrap())
        .build()
        .unwrap();

    let error = estimations.save_estimation(&estimation, None).await.unwrap_err();
    assert!(!error.is_not_found());
    assert!(estimations
        .history_for_detection(estimation.detection_id(), None)
        .await
        .unwrap()
        .is_empty());
}
