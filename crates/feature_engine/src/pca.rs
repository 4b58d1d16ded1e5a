//! Motion branch projection.
//!
//! Joins the scaled accelerometer, gyroscope and gravity series on their
//! common bucket keys, then either projects each joined row onto the trained
//! PCA basis or, without a bundle, forwards the raw joined columns.

use std::collections::HashMap;

use contracts::{
    Bucket, BucketKey, BucketedSeries, ColumnRef, ContractError, FeatureConfig, FeatureRow,
    PcaBundle, StreamKind,
};
use nalgebra::{DMatrix, DVector};
use tracing::trace;

#[derive(Debug, Clone)]
enum Projection {
    Pca {
        inputs: Vec<ColumnRef>,
        components: DMatrix<f64>,
        mean: DVector<f64>,
        names: Vec<String>,
    },
    Raw {
        /// `(stream, column, "<stream>_<column>")`
        columns: Vec<(StreamKind, String, String)>,
    },
}

/// Projects synchronized motion buckets
#[derive(Debug, Clone)]
pub struct MotionPcaProjector {
    projection: Projection,
}

impl MotionPcaProjector {
    /// Build from a PCA bundle
    ///
    /// # Errors
    /// `ConfigValidation` when the bundle shapes are inconsistent or an input
    /// does not name a motion stream column.
    pub fn from_bundle(bundle: &PcaBundle) -> Result<Self, ContractError> {
        let n = bundle.input_columns.len();
        let k = bundle.component_count;

        let inputs = bundle
            .input_columns
            .iter()
            .map(|spec| {
                ColumnRef::parse(spec)
                    .filter(|c| c.stream.is_motion())
                    .ok_or_else(|| {
                        ContractError::config_validation(
                            "pca.input_columns",
                            format!("'{spec}' is not a motion stream column"),
                        )
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if bundle.component_matrix.len() != k || bundle.component_matrix.iter().any(|row| row.len() != n) {
            return Err(ContractError::config_validation(
                "pca.component_matrix",
                format!("expected {k}x{n} matrix"),
            ));
        }
        if bundle.mean_vector.len() != n {
            return Err(ContractError::config_validation(
                "pca.mean_vector",
                format!("expected {n} entries, got {}", bundle.mean_vector.len()),
            ));
        }

        let flat: Vec<f64> = bundle.component_matrix.iter().flatten().copied().collect();
        Ok(Self {
            projection: Projection::Pca {
                inputs,
                components: DMatrix::from_row_slice(k, n, &flat),
                mean: DVector::from_column_slice(&bundle.mean_vector),
                names: (0..k).map(|i| bundle.component_name(i)).collect(),
            },
        })
    }

    /// Forward raw joined columns of the configured motion stream layouts
    pub fn raw(config: &FeatureConfig) -> Self {
        let mut columns = Vec::new();
        for kind in StreamKind::MOTION {
            let spec = config.stream_spec(kind);
            let names = spec
                .columns
                .iter()
                .chain(spec.magnitude.as_ref().map(|m| &m.name));
            for column in names {
                columns.push((kind, column.clone(), format!("{}_{column}", kind.key())));
            }
        }
        Self {
            projection: Projection::Raw { columns },
        }
    }

    /// Projector for a feature configuration (PCA when a bundle is present)
    pub fn from_config(config: &FeatureConfig) -> Result<Self, ContractError> {
        match &config.pca {
            Some(bundle) => Self::from_bundle(bundle),
            None => Ok(Self::raw(config)),
        }
    }

    /// Names of the columns every output row carries
    pub fn output_columns(&self) -> Vec<String> {
        match &self.projection {
            Projection::Pca { names, .. } => names.clone(),
            Projection::Raw { columns } => columns.iter().map(|(_, _, name)| name.clone()).collect(),
        }
    }

    /// Project the common buckets of the three motion series
    ///
    /// Empty when the series share no bucket. A common bucket missing a
    /// required input column is skipped.
    pub fn project(&self, motion: &HashMap<StreamKind, BucketedSeries>, interval: f64) -> BucketedSeries {
        let indexed: Vec<HashMap<BucketKey, &Bucket>> = StreamKind::MOTION
            .iter()
            .map(|kind| {
                motion
                    .get(kind)
                    .map(|series| series.iter().map(|b| (b.key, b)).collect())
                    .unwrap_or_default()
            })
            .collect();

        let Some(first) = motion.get(&StreamKind::MOTION[0]) else {
            return Vec::new();
        };

        let mut rows = Vec::new();
        for key in first.iter().map(|b| b.key) {
            let joined: Option<Vec<&Bucket>> = indexed.iter().map(|index| index.get(&key).copied()).collect();
            let Some(joined) = joined else {
                continue;
            };
            let lookup = |stream: StreamKind, column: &str| {
                let position = StreamKind::MOTION.iter().position(|k| *k == stream)?;
                joined[position].value(column)
            };
            match self.row(lookup) {
                Some(values) => rows.push(Bucket::new(key, interval, values)),
                None => trace!(bucket = key.0, "motion bucket missing projector input"),
            }
        }
        rows
    }

    fn row(&self, lookup: impl Fn(StreamKind, &str) -> Option<f64>) -> Option<FeatureRow> {
        match &self.projection {
            Projection::Pca {
                inputs,
                components,
                mean,
                names,
            } => {
                let raw = inputs
                    .iter()
                    .map(|input| lookup(input.stream, &input.column))
                    .collect::<Option<Vec<f64>>>()?;
                let scores = components * (DVector::from_vec(raw) - mean);
                Some(names.iter().cloned().zip(scores.iter().copied()).collect())
            }
            Projection::Raw { columns } => columns
                .iter()
                .map(|(stream, column, name)| lookup(*stream, column).map(|v| (name.clone(), v)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(key: i64, values: &[(&str, f64)]) -> Bucket {
        Bucket::new(
            BucketKey(key),
            0.5,
            values.iter().map(|(c, v)| (c.to_string(), *v)).collect(),
        )
    }

    fn bundle() -> PcaBundle {
        PcaBundle {
            input_columns: vec![
                "accelerometer.x".into(),
                "gyroscope.x".into(),
                "gravity.x".into(),
            ],
            component_matrix: vec![vec![1.0, 0.0, 0.0], vec![0.5, 0.5, 1.0]],
            mean_vector: vec![0.5, 0.25, 0.0],
            output_prefix: "motion".into(),
            component_count: 2,
        }
    }

    fn motion(keys: [&[i64]; 3], x: [f64; 3]) -> HashMap<StreamKind, BucketedSeries> {
        StreamKind::MOTION
            .into_iter()
            .zip(keys)
            .zip(x)
            .map(|((kind, keys), x)| (kind, keys.iter().map(|k| bucket(*k, &[("x", x)])).collect()))
            .collect()
    }

    #[test]
    fn test_projection_values_and_names() {
        let projector = MotionPcaProjector::from_bundle(&bundle()).unwrap();
        let rows = projector.project(&motion([&[0], &[0], &[0]], [1.0, 0.75, 2.0]), 0.5);

        assert_eq!(rows.len(), 1);
        // centered = [0.5, 0.5, 2.0]
        assert_eq!(rows[0].value("motion_pc1"), Some(0.5));
        assert_eq!(rows[0].value("motion_pc2"), Some(2.5));
        assert_eq!(projector.output_columns(), vec!["motion_pc1", "motion_pc2"]);
    }

    #[test]
    fn test_mean_vector_projects_to_zero() {
        let projector = MotionPcaProjector::from_bundle(&bundle()).unwrap();
        let rows = projector.project(&motion([&[3], &[3], &[3]], [0.5, 0.25, 0.0]), 0.5);

        assert_eq!(rows[0].value("motion_pc1"), Some(0.0));
        assert_eq!(rows[0].value("motion_pc2"), Some(0.0));
    }

    #[test]
    fn test_only_common_keys_projected() {
        let projector = MotionPcaProjector::from_bundle(&bundle()).unwrap();
        let rows = projector.project(&motion([&[0, 1, 2], &[1, 2], &[2, 3]], [0.0; 3]), 0.5);

        let keys: Vec<i64> = rows.iter().map(|b| b.key.0).collect();
        assert_eq!(keys, vec![2]);
        assert_eq!(rows[0].time, 1.0);
    }

    #[test]
    fn test_disjoint_streams_emit_nothing() {
        let projector = MotionPcaProjector::from_bundle(&bundle()).unwrap();
        assert!(projector.project(&motion([&[0], &[1], &[2]], [0.0; 3]), 0.5).is_empty());
        assert!(projector.project(&HashMap::new(), 0.5).is_empty());
    }

    #[test]
    fn test_missing_input_column_skips_bucket() {
        let projector = MotionPcaProjector::from_bundle(&bundle()).unwrap();
        let mut series = motion([&[0], &[0], &[0]], [0.0; 3]);
        series.insert(StreamKind::Gravity, vec![bucket(0, &[("y", 1.0)])]);
        assert!(projector.project(&series, 0.5).is_empty());
    }

    #[test]
    fn test_bad_shape_rejected() {
        let mut bad = bundle();
        bad.mean_vector.push(1.0);
        assert!(MotionPcaProjector::from_bundle(&bad).is_err());

        let mut bad = bundle();
        bad.input_columns[0] = "rotation_vector.x".into();
        assert!(MotionPcaProjector::from_bundle(&bad).is_err());
    }

    #[test]
    fn test_raw_mode_joins_columns() {
        let config: FeatureConfig = serde_json::from_value(serde_json::json!({
            "ranges": {},
            "interval": 0.5,
            "trim_seconds": 0.0,
            "window_size": 1,
            "class_labels": ["a"],
            "feature_columns": ["motion_accelerometer_x_mean"],
            "streams": {
                "accelerometer": { "columns": ["x"] },
                "gyroscope": { "columns": ["x"] },
                "gravity": { "columns": ["x"] }
            }
        }))
        .unwrap();
        let projector = MotionPcaProjector::from_config(&config).unwrap();
        let rows = projector.project(&motion([&[0], &[0], &[0]], [1.0, 2.0, 3.0]), 0.5);

        assert_eq!(
            projector.output_columns(),
            vec!["accelerometer_x", "gyroscope_x", "gravity_x"]
        );
        assert_eq!(rows[0].value("gyroscope_x"), Some(2.0));
    }
}
