//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Covers:
//! - the demo feature bundle and model agree with each other
//! - telemetry → features → classifier → decision → session summary
//! - recorded telemetry replayed through the ingestion pipeline

#[cfg(test)]
mod fixtures {
    use std::path::PathBuf;
    use std::sync::Arc;

    use contracts::FeatureConfig;
    use decision::LinearSoftmaxClassifier;

    pub fn demo_path(file: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../demos").join(file)
    }

    pub fn demo_config() -> Arc<FeatureConfig> {
        Arc::new(config_loader::ConfigLoader::load_from_path(&demo_path("posture.toml")).unwrap())
    }

    pub fn demo_model() -> Arc<LinearSoftmaxClassifier> {
        Arc::new(LinearSoftmaxClassifier::load(&demo_path("model.json")).unwrap())
    }
}

#[cfg(test)]
mod contract_tests {
    use super::fixtures::*;
    use feature_engine::FeaturePipeline;

    #[test]
    fn test_demo_model_matches_config() {
        let config = demo_config();
        let model = demo_model();

        assert_eq!(model.feature_count(), config.feature_columns.len());
        assert_eq!(model.labels(), config.class_labels.as_slice());
    }

    #[test]
    fn test_demo_features_are_producible() {
        let pipeline = FeaturePipeline::new(demo_config()).unwrap();
        let available = pipeline.available_features();
        for column in &pipeline.config().feature_columns {
            assert!(available.contains(column), "{column} is never produced");
        }
    }

    #[test]
    fn test_demo_config_round_trips_through_toml() {
        let config = demo_config();
        let toml = config_loader::ConfigLoader::to_toml(&config).unwrap();
        let reloaded =
            config_loader::ConfigLoader::load_from_str(&toml, config_loader::ConfigFormat::Toml).unwrap();
        assert_eq!(reloaded.feature_columns, config.feature_columns);
        assert_eq!(reloaded.pca, config.pca);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{Classifier, ManualClock, SensorEvent, SensorSource, StreamKind};
    use feature_engine::{FeaturePipeline, SampleBuffer};
    use ingestion::{
        write_recording, IngestionPipeline, JsonlReplaySource, ReplayConfig, SyntheticConfig,
        SyntheticGenerator,
    };
    use monitor::{CycleOutcome, MonitorSettings, PostureMonitor};

    use super::fixtures::*;

    fn posture_events(posture: &str, ticks: usize) -> Vec<SensorEvent> {
        let config = SyntheticConfig {
            jitter: 0.0,
            ..SyntheticConfig::for_posture(posture).unwrap().with_seed(11)
        };
        SyntheticGenerator::new(config).generate(ticks)
    }

    fn manual_monitor(clock: Arc<ManualClock>) -> PostureMonitor {
        let classifier: Arc<dyn Classifier> = demo_model();
        PostureMonitor::new(
            demo_config(),
            classifier,
            clock,
            MonitorSettings::default().with_period(Duration::from_secs(3600)),
        )
        .unwrap()
    }

    /// Synthetic telemetry → feature vector → demo model → decision
    #[test]
    fn test_synthetic_postures_are_recognized() {
        let config = demo_config();
        let pipeline = FeaturePipeline::new(config.clone()).unwrap();
        let model = demo_model();
        let policy = decision::DecisionPolicy::new(config.class_labels.clone());

        for posture in ingestion::POSTURE_PRESETS {
            let mut buffer = SampleBuffer::from_config(&config);
            for event in posture_events(posture, 60) {
                buffer.record(event.kind, event.timestamp_ns, event.values);
            }

            let vector = pipeline
                .build(&buffer.snapshot())
                .unwrap_or_else(|| panic!("no vector for {posture}"));
            assert_eq!(vector.len(), config.feature_columns.len());

            let prediction = decision::classify_and_decide(model.as_ref(), &policy, &vector.values).unwrap();
            assert_eq!(prediction.label, posture);
            assert!(prediction.confidence > 0.9, "{posture}: {}", prediction.confidence);
        }
    }

    #[tokio::test]
    async fn test_session_summary_for_steady_posture() {
        let clock = Arc::new(ManualClock::new());
        let monitor = manual_monitor(clock.clone());
        let mut predictions = monitor.start().unwrap();

        // under trim + window: nothing to classify yet
        for event in posture_events("slouching", 10) {
            monitor.record(event);
        }
        assert_eq!(monitor.run_cycle(), CycleOutcome::InsufficientData);
        assert!(monitor.latest().is_collecting());

        for event in posture_events("slouching", 60).into_iter().skip(40) {
            monitor.record(event);
        }
        for _ in 0..5 {
            assert_eq!(monitor.run_cycle(), CycleOutcome::Predicted);
        }
        clock.advance(Duration::from_secs(30));

        let result = monitor.stop().unwrap();
        assert_eq!(result.total_duration, 30);
        assert_eq!(result.breakdown.len(), 1);
        assert_eq!(result.duration_of("slouching"), 30);
        assert_eq!(result.breakdown[0].percentage, 100.0);

        let mut delivered = Vec::new();
        while let Some(prediction) = predictions.recv().await {
            delivered.push(prediction.label);
        }
        assert_eq!(delivered, vec!["slouching"; 5]);
    }

    /// Recording → JSONL replay → ingestion pipeline → monitor
    #[tokio::test]
    async fn test_replayed_recording_through_ingestion() {
        let events = posture_events("leaning_back", 50);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.jsonl");
        write_recording(&path, &events).unwrap();

        let replay = JsonlReplaySource::load(
            &path,
            "replay",
            ReplayConfig {
                speed_multiplier: f64::INFINITY,
                ..ReplayConfig::default()
            },
        )
        .unwrap();
        assert_eq!(replay.events().len(), events.len());
        assert_eq!(replay.kinds().len(), StreamKind::ALL.len());

        let mut ingestion = IngestionPipeline::new(4096);
        ingestion
            .register_source("replay".to_string(), Box::new(replay), None)
            .unwrap();
        let rx = ingestion.take_receiver().unwrap();

        let clock = Arc::new(ManualClock::new());
        let monitor = manual_monitor(clock.clone());
        let mut predictions = monitor.start().unwrap();
        let forwarding = monitor.attach(rx);
        ingestion.start_all();

        let expected = events.len();
        let mut buffered = 0;
        for _ in 0..500 {
            buffered = monitor.buffer_stats().streams.iter().map(|s| s.depth).sum::<usize>();
            if buffered == expected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(buffered, expected);

        assert_eq!(monitor.run_cycle(), CycleOutcome::Predicted);
        assert_eq!(predictions.recv().await.unwrap().label, "leaning_back");

        clock.advance(Duration::from_millis(4_200));
        let result = monitor.stop().unwrap();
        ingestion.stop_all();

        assert_eq!(result.total_duration, 4);
        assert_eq!(result.duration_of("leaning_back"), 4);
        assert_eq!(forwarding.await.unwrap(), expected as u64);
        assert_eq!(ingestion.metrics().snapshot().events_dropped, 0);
    }
}
