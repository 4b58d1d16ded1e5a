//! Feature pipeline: buffer snapshot → ordered feature vector.

use std::collections::HashMap;
use std::sync::Arc;

use contracts::{
    BucketedSeries, ContractError, FeatureConfig, FeatureVector, RollingFeatureMap, SensorSample,
    StreamKind, StreamSpec, ORIENTATION_COLUMNS, ORIENTATION_STREAM_KEY,
};
use tracing::{debug, instrument, trace};

use crate::buffer::BufferSnapshot;
use crate::bucket::BucketAggregator;
use crate::orientation::resolve_sample;
use crate::pca::MotionPcaProjector;
use crate::rolling::RollingStatsComputer;
use crate::scaler::Scaler;
use crate::synchronizer::StreamSynchronizer;

/// Intermediate products of one build, for diagnostics
#[derive(Debug, Clone, Default)]
pub struct PipelineTrace {
    /// Scaled bucket count per motion stream
    pub motion_buckets: HashMap<StreamKind, usize>,
    /// Joined (projected) motion rows
    pub projected_rows: usize,
    /// Scaled orientation buckets
    pub orientation_buckets: usize,
    /// Rolling rows per group
    pub motion_rolling_rows: usize,
    pub orientation_rolling_rows: usize,
    /// Final vector, if one could be assembled
    pub vector: Option<FeatureVector>,
}

/// Composes aggregation, scaling, orientation, projection, rolling stats and
/// synchronization
#[derive(Debug, Clone)]
pub struct FeaturePipeline {
    config: Arc<FeatureConfig>,
    aggregator: BucketAggregator,
    scaler: Scaler,
    projector: MotionPcaProjector,
    rolling: RollingStatsComputer,
    synchronizer: StreamSynchronizer,
    motion_columns: Vec<String>,
    orientation_columns: Vec<String>,
}

impl FeaturePipeline {
    /// Build the pipeline stages for a configuration
    ///
    /// # Errors
    /// `ConfigValidation` if the PCA bundle is malformed.
    pub fn new(config: Arc<FeatureConfig>) -> Result<Self, ContractError> {
        let projector = MotionPcaProjector::from_config(&config)?;
        Ok(Self {
            aggregator: BucketAggregator::new(config.interval, config.trim_seconds),
            scaler: Scaler::from_config(&config),
            rolling: RollingStatsComputer::new(config.window_size),
            synchronizer: StreamSynchronizer::new(config.feature_columns.clone(), config.interval),
            motion_columns: projector.output_columns(),
            orientation_columns: config.orientation_columns(),
            projector,
            config,
        })
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Feature names the motion group rolls over
    pub fn motion_columns(&self) -> &[String] {
        &self.motion_columns
    }

    /// Feature names the orientation group rolls over
    pub fn orientation_columns(&self) -> &[String] {
        &self.orientation_columns
    }

    /// Every feature name the pipeline can emit, motion group first
    pub fn available_features(&self) -> Vec<String> {
        let motion = self.motion_columns.iter().map(|c| (&self.config.motion_group, c));
        let orientation = self
            .orientation_columns
            .iter()
            .map(|c| (&self.config.orientation_group, c));
        motion
            .chain(orientation)
            .flat_map(|(group, column)| {
                [format!("{group}_{column}_mean"), format!("{group}_{column}_std")]
            })
            .collect()
    }

    /// Build the feature vector for one cycle
    ///
    /// `None` whenever data is insufficient; never an error.
    pub fn build(&self, snapshot: &BufferSnapshot) -> Option<FeatureVector> {
        self.build_traced(snapshot).vector
    }

    /// Same as [`build`](Self::build), keeping intermediate counts
    #[instrument(
        level = "debug",
        name = "feature_pipeline_build",
        skip(self, snapshot),
        fields(samples = snapshot.total_samples())
    )]
    pub fn build_traced(&self, snapshot: &BufferSnapshot) -> PipelineTrace {
        let mut report = PipelineTrace::default();

        // Motion branch
        let mut motion: HashMap<StreamKind, BucketedSeries> = HashMap::new();
        for kind in StreamKind::MOTION {
            let series = self.scaled_series(kind.key(), snapshot.samples(kind), &self.config.stream_spec(kind));
            report.motion_buckets.insert(kind, series.len());
            motion.insert(kind, series);
        }
        let projected = self.projector.project(&motion, self.config.interval);
        report.projected_rows = projected.len();
        let motion_stats = self
            .rolling
            .compute(&self.config.motion_group, &projected, &self.motion_columns);
        report.motion_rolling_rows = motion_stats.len();

        // Orientation branch
        let orientation = self.orientation_series(snapshot.samples(StreamKind::RotationVector));
        report.orientation_buckets = orientation.len();
        let orientation_stats =
            self.rolling
                .compute(&self.config.orientation_group, &orientation, &self.orientation_columns);
        report.orientation_rolling_rows = orientation_stats.len();

        report.vector = self.synchronize(&motion_stats, &orientation_stats);
        match &report.vector {
            Some(vector) => trace!(bucket_time = vector.bucket_time, len = vector.len(), "feature vector built"),
            None => debug!(
                projected = report.projected_rows,
                orientation = report.orientation_buckets,
                motion_rows = report.motion_rolling_rows,
                orientation_rows = report.orientation_rolling_rows,
                window = self.rolling.window_size(),
                "insufficient data for feature vector"
            ),
        }
        report
    }

    fn scaled_series(&self, stream_key: &str, samples: &[SensorSample], spec: &StreamSpec) -> BucketedSeries {
        let mut series = self.aggregator.aggregate(samples, spec);
        self.scaler.scale_series(stream_key, &mut series);
        series
    }

    /// Resolve → aggregate → scale → keep the configured subset
    fn orientation_series(&self, rotation: &[SensorSample]) -> BucketedSeries {
        let resolved: Vec<SensorSample> = rotation.iter().filter_map(resolve_sample).collect();
        let spec = StreamSpec::plain(&ORIENTATION_COLUMNS);
        let mut series = self.scaled_series(ORIENTATION_STREAM_KEY, &resolved, &spec);
        for bucket in series.iter_mut() {
            bucket
                .values
                .retain(|column, _| self.orientation_columns.contains(column));
        }
        series
    }

    fn synchronize(&self, motion: &RollingFeatureMap, orientation: &RollingFeatureMap) -> Option<FeatureVector> {
        self.synchronizer.synchronize(&[motion, orientation])
    }
}
