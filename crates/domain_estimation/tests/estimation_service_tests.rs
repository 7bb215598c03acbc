//! Estimation service integration tests
//!
//! Runs the full pipeline against the in-memory ports.

use std::collections::HashSet;

use proptest::prelude::*;
use rust_decimal::Decimal;
use tokio::task::JoinSet;
use rust_decimal_macros::dec;

use core_kernel::{DetectionId, MoneyError};
use domain_estimation::{EstimationError, Severity};
use test_utils::{
    assert_amount, assert_estimation_invariants, assert_no_paint, detection_strategy,
    markup_strategy, scaled_labor_rate_strategy, BoxFixtures, DamageFixtures, DetectionFixtures,
    EngineFixtures, TestDamageBuilder, TestDetectionBuilder, TestEngineBuilder,
    TestEstimationRequestBuilder,
};

mod worked_examples {
    use super::*;

    #[tokio::test]
    async fn moderate_bumper_with_default_settings() {
        let detection = DetectionFixtures::single_bumper();
        let engine = TestEngineBuilder::new().with_detection(detection.clone()).build().await;

        let estimation = engine
            .service
            .estimate(TestEstimationRequestBuilder::new(detection.id).build())
            .await
            .unwrap();

        let item = &estimation.line_items()[0];
        assert_amount(&item.parts_cost, dec!(400));
        assert_amount(&item.labor_cost, dec!(225));
        assert_amount(&item.paint_cost, dec!(400));
        assert_amount(&item.subtotal, dec!(1025));
        assert_amount(&estimation.markup(), dec!(205));
        assert_amount(&estimation.total_cost(), dec!(1230));
        assert_eq!(estimation.estimated_labor_hours(), dec!(3.0));
        assert_estimation_invariants(&estimation);
    }

    #[tokio::test]
    async fn paint_exclusion_applies_to_every_line_item() {
        let detection = DetectionFixtures::bumper_and_dent();
        let engine = TestEngineBuilder::new().with_detection(detection.clone()).build().await;

        let estimation = engine
            .service
            .estimate(TestEstimationRequestBuilder::new(detection.id).without_paint().build())
            .await
            .unwrap();

        assert_eq!(estimation.line_items().len(), 2);
        assert_amount(&estimation.line_items()[0].subtotal, dec!(625));
        assert_amount(&estimation.line_items()[1].subtotal, dec!(87.5));
        assert_no_paint(&estimation);
        assert_amount(&estimation.markup(), dec!(142.50));
        assert_amount(&estimation.total_cost(), dec!(855.00));
        assert_estimation_invariants(&estimation);
    }

    #[tokio::test]
    async fn overrides_replace_defaults() {
        let detection = DetectionFixtures::single_bumper();
        let engine = TestEngineBuilder::new().with_detection(detection.clone()).build().await;

        let estimation = engine
            .service
            .estimate(
                TestEstimationRequestBuilder::new(detection.id)
                    .with_labor_rate(dec!(100))
                    .with_markup(dec!(0))
                    .build(),
            )
            .await
            .unwrap();

        assert_amount(&estimation.labor_rate(), dec!(100));
        assert_amount(&estimation.labor_cost(), dec!(300));
        assert!(estimation.markup().is_zero());
        assert_amount(&estimation.total_cost(), dec!(1100));
    }

    #[tokio::test]
    async fn detection_without_damages_yields_zero_estimate() {
        let detection = DetectionFixtures::empty();
        let engine = TestEngineBuilder::new().with_detection(detection.clone()).build().await;

        let estimation = engine
            .service
            .estimate(TestEstimationRequestBuilder::new(detection.id).build())
            .await
            .unwrap();

        assert!(estimation.line_items().is_empty());
        assert!(estimation.total_cost().is_zero());
        assert_eq!(engine.estimations.count().await, 1);
    }

    #[tokio::test]
    async fn unclassified_damage_uses_bounding_box() {
        let damage = DamageFixtures::unclassified(
            domain_estimation::DamageType::DamagedDoor,
            BoxFixtures::large(),
        );
        let detection = TestDetectionBuilder::new().with_damage(damage).build();
        let engine = TestEngineBuilder::new().with_detection(detection.clone()).build().await;

        let estimation = engine
            .service
            .estimate(TestEstimationRequestBuilder::new(detection.id).build())
            .await
            .unwrap();

        let item = &estimation.line_items()[0];
        assert_eq!(item.severity, Severity::Severe);
        assert_amount(&item.parts_cost, dec!(800));
        assert_eq!(item.affected_part.as_deref(), Some("door"));
    }
}

mod failures {
    use super::*;

    #[tokio::test]
    async fn unknown_detection_is_not_found() {
        let engine = TestEngineBuilder::new().build().await;
        let missing = DetectionId::new();

        let error = engine
            .service
            .estimate(TestEstimationRequestBuilder::new(missing).build())
            .await
            .unwrap_err();

        assert!(matches!(error, EstimationError::DetectionNotFound(id) if id == missing));
        assert!(error.is_not_found());
    }

    #[tokio::test]
    async fn negative_labor_rate_records_nothing() {
        let detection = DetectionFixtures::single_bumper();
        let engine = TestEngineBuilder::new().with_detection(detection.clone()).build().await;

        let error = engine
            .service
            .estimate(
                TestEstimationRequestBuilder::new(detection.id)
                    .with_labor_rate(dec!(-5))
                    .build(),
            )
            .await
            .unwrap_err();

        match error {
            EstimationError::InvalidOverride { field, .. } => assert_eq!(field, "labor_rate_override"),
            other => panic!("expected InvalidOverride, got {:?}", other),
        }
        assert_eq!(engine.estimations.count().await, 0);
    }

    #[tokio::test]
    async fn oversized_labor_rate_is_an_error_not_a_panic() {
        let detection = DetectionFixtures::single_bumper();
        let engine = TestEngineBuilder::new().with_detection(detection.clone()).build().await;

        let error = engine
            .service
            .estimate(
                TestEstimationRequestBuilder::new(detection.id)
                    .with_labor_rate(Decimal::MAX / dec!(2))
                    .build(),
            )
            .await
            .unwrap_err();

        assert!(matches!(error, EstimationError::Financial(MoneyError::Overflow(_))));
        assert!(error.is_client_error());
        assert_eq!(engine.estimations.count().await, 0);
    }

    #[tokio::test]
    async fn invalid_override_is_reported_before_detection_lookup() {
        let engine = TestEngineBuilder::new().build().await;

        let error = engine
            .service
            .estimate(
                TestEstimationRequestBuilder::new(DetectionId::new())
                    .with_markup(dec!(150))
                    .build(),
            )
            .await
            .unwrap_err();

        assert!(matches!(error, EstimationError::InvalidOverride { ref field, .. } if field == "markup_override"));
    }

    #[tokio::test]
    async fn markup_above_one_hundred_is_rejected() {
        let detection = DetectionFixtures::single_bumper();
        let engine = TestEngineBuilder::new().with_detection(detection.clone()).build().await;

        let result = engine
            .service
            .estimate(TestEstimationRequestBuilder::new(detection.id).with_markup(dec!(150)).build())
            .await;

        assert!(matches!(result, Err(EstimationError::InvalidOverride { .. })));
        assert_eq!(engine.estimations.count().await, 0);
    }

    #[tokio::test]
    async fn missing_cost_rule_leaves_no_partial_estimation() {
        let detection = DetectionFixtures::bumper_and_dent();
        let engine = TestEngineBuilder::new()
            .with_table(EngineFixtures::bumper_only_table())
            .with_detection(detection.clone())
            .build()
            .await;

        let error = engine
            .service
            .estimate(TestEstimationRequestBuilder::new(detection.id).build())
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            EstimationError::CostRuleMissing {
                damage_type: domain_estimation::DamageType::DentOrScratch,
                severity: Severity::Minor,
            }
        ));
        assert_eq!(engine.estimations.count().await, 0);
    }

    #[tokio::test]
    async fn storage_failure_is_reported() {
        let detection = DetectionFixtures::single_bumper();
        let engine = TestEngineBuilder::new().with_detection(detection.clone()).build().await;
        engine.estimations.fail_writes(true);

        let error = engine
            .service
            .estimate(TestEstimationRequestBuilder::new(detection.id).build())
            .await
            .unwrap_err();

        assert!(matches!(error, EstimationError::PersistenceFailure(_)));
        assert!(matches!(
            engine.service.get_estimation(detection.id).await,
            Err(EstimationError::EstimationNotFound(_))
        ));
    }
}

mod retrieval {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_estimates_are_recorded_independently() {
        const REQUESTS: usize = 16;
        let detection = DetectionFixtures::bumper_and_dent();
        let engine = TestEngineBuilder::new().with_detection(detection.clone()).build().await;

        let mut tasks = JoinSet::new();
        for i in 0..REQUESTS {
            let service = engine.service.clone();
            let request = if i % 2 == 0 {
                TestEstimationRequestBuilder::new(detection.id).build()
            } else {
                TestEstimationRequestBuilder::new(detection.id).without_paint().build()
            };
            tasks.spawn(async move { service.estimate(request).await });
        }

        let mut ids = HashSet::new();
        while let Some(joined) = tasks.join_next().await {
            let estimation = joined.unwrap().unwrap();
            assert_estimation_invariants(&estimation);
            ids.insert(estimation.id());
        }

        assert_eq!(ids.len(), REQUESTS);
        assert_eq!(engine.estimations.count().await, REQUESTS);
        let history = engine.service.get_estimation_history(detection.id).await.unwrap();
        assert_eq!(history.len(), REQUESTS);
        assert!(history.iter().all(|e| ids.contains(&e.id())));
    }

    #[tokio::test]
    async fn get_estimation_before_any_estimate() {
        let detection = DetectionFixtures::single_bumper();
        let engine = TestEngineBuilder::new().with_detection(detection.clone()).build().await;

        let result = engine.service.get_estimation(detection.id).await;
        assert!(matches!(result, Err(EstimationError::EstimationNotFound(id)) if id == detection.id));
    }

    #[tokio::test]
    async fn reestimating_keeps_history() {
        let detection = DetectionFixtures::single_bumper();
        let engine = TestEngineBuilder::new().with_detection(detection.clone()).build().await;

        let first = engine
            .service
            .estimate(TestEstimationRequestBuilder::new(detection.id).build())
            .await
            .unwrap();
        let second = engine
            .service
            .estimate(TestEstimationRequestBuilder::new(detection.id).with_markup(dec!(10)).build())
            .await
            .unwrap();

        assert_ne!(first.id(), second.id());
        let latest = engine.service.get_estimation(detection.id).await.unwrap();
        assert_eq!(latest.id(), second.id());

        let history = engine.service.get_estimation_history(detection.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id(), second.id());
        assert_eq!(history[1].id(), first.id());
    }

    #[tokio::test]
    async fn history_of_unestimated_detection_is_empty() {
        let engine = TestEngineBuilder::new().build().await;
        let history = engine.service.get_estimation_history(DetectionId::new()).await.unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn summary_reports_breakdown_and_latest_total() {
        let severe_window = TestDamageBuilder::new()
            .with_type(domain_estimation::DamageType::DamagedWindow)
            .unclassified()
            .with_bbox(BoxFixtures::large())
            .build();
        let detection = TestDetectionBuilder::new()
            .with_damages(DetectionFixtures::bumper_and_dent().damages)
            .with_damage(severe_window)
            .build();
        let engine = TestEngineBuilder::new().with_detection(detection.clone()).build().await;

        let before = engine.service.get_summary(detection.id).await.unwrap();
        assert_eq!(before.total_damages, 3);
        assert!(before.total_cost.is_zero());
        assert_eq!(before.severity_breakdown[&Severity::Minor], 1);
        assert_eq!(before.severity_breakdown[&Severity::Moderate], 1);
        assert_eq!(before.severity_breakdown[&Severity::Severe], 1);
        assert_eq!(before.estimated_repair_time, "1 day");

        let estimation = engine
            .service
            .estimate(TestEstimationRequestBuilder::new(detection.id).build())
            .await
            .unwrap();
        let after = engine.service.get_summary(detection.id).await.unwrap();

        // 3.0 + 0.5 + 2.0 labor hours
        assert_eq!(estimation.estimated_labor_hours(), dec!(5.5));
        assert_eq!(after.total_cost, estimation.total_cost());
        assert_eq!(after.estimated_repair_time, "1 day");
    }

    #[tokio::test]
    async fn summary_of_unknown_detection() {
        let engine = TestEngineBuilder::new().build().await;
        let result = engine.service.get_summary(DetectionId::new()).await;
        assert!(matches!(result, Err(EstimationError::DetectionNotFound(_))));
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn estimates_satisfy_arithmetic_invariants(
        detection in detection_strategy(6),
        markup in markup_strategy(),
        include_paint in any::<bool>(),
    ) {
        let estimation = runtime().block_on(async {
            let engine = TestEngineBuilder::new().with_detection(detection.clone()).build().await;
            let mut request = TestEstimationRequestBuilder::new(detection.id).with_markup(markup);
            if !include_paint {
                request = request.without_paint();
            }
            engine.service.estimate(request.build()).await
        }).unwrap();

        assert_estimation_invariants(&estimation);
        prop_assert_eq!(estimation.line_items().len(), detection.total_damages());
        if !include_paint {
            prop_assert!(estimation.paint_cost().is_zero());
        }
    }

    #[test]
    fn labor_cost_scales_with_labor_rate(
        detection in detection_strategy(6),
        (rate, factor) in scaled_labor_rate_strategy(),
    ) {
        let (base, scaled) = runtime().block_on(async {
            let engine = TestEngineBuilder::new().with_detection(detection.clone()).build().await;
            let base = engine.service
                .estimate(TestEstimationRequestBuilder::new(detection.id).with_labor_rate(rate).build())
                .await;
            let scaled = engine.service
                .estimate(TestEstimationRequestBuilder::new(detection.id).with_labor_rate(rate * factor).build())
                .await;
            (base, scaled)
        });
        let (base, scaled) = (base.unwrap(), scaled.unwrap());

        prop_assert_eq!(scaled.labor_cost().amount(), base.labor_cost().amount() * factor);
        prop_assert_eq!(scaled.parts_cost(), base.parts_cost());
        prop_assert_eq!(scaled.paint_cost(), base.paint_cost());
    }

    #[test]
    fn estimation_is_deterministic(detection in detection_strategy(6)) {
        let (a, b) = runtime().block_on(async {
            let engine = TestEngineBuilder::new().with_detection(detection.clone()).build().await;
            let request = TestEstimationRequestBuilder::new(detection.id).build();
            (
                engine.service.estimate(request.clone()).await,
                engine.service.estimate(request).await,
            )
        });
        let (a, b) = (a.unwrap(), b.unwrap());

        prop_assert_eq!(a.line_items(), b.line_items());
        prop_assert_eq!(a.total_cost(), b.total_cost());
        prop_assert!(a.total_cost().amount() >= Decimal::ZERO);
    }
}
