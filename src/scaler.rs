use ndarray::{ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::model::Normalizer;

/// Z-score normalization with per-feature population statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub means: Vec<f64>,
    pub scales: Vec<f64>,
}

impl StandardScaler {
    pub fn dimensions(&self) -> usize {
        self.means.len()
    }
}

impl Normalizer for StandardScaler {
    fn fit(features: ArrayView2<f64>) -> Self {
        let rows = features.nrows().max(1) as f64;

        let means: Vec<f64> = features
            .axis_iter(Axis(1))
            .map(|column| column.sum() / rows)
            .collect();

        let scales = features
            .axis_iter(Axis(1))
            .zip(&means)
            .map(|(column, &mean)| {
                let variance = column.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / rows;
                let std_dev = variance.sqrt();

                // constant columns pass through centered
                if std_dev > f64::EPSILON {
                    std_dev
                } else {
                    1.0
                }
            })
            .collect();

        Self { means, scales }
    }

    fn transform_row(&self, row: ArrayView1<f64>) -> Vec<f64> {
        row.iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(&x, (&mean, &scale))| (x - mean) / scale)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fit_population_statistics() {
        let features = array![[40.0, 1.0], [60.0, 1.0], [50.0, 0.0]];
        let scaler = StandardScaler::fit(features.view());

        assert!((scaler.means[0] - 50.0).abs() < 1e-12);
        assert!((scaler.scales[0] - (200.0_f64 / 3.0).sqrt()).abs() < 1e-12);
        assert!((scaler.means[1] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_transformed_columns_are_standardized() {
        let features = array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0], [4.0, 40.0]];
        let scaler = StandardScaler::fit(features.view());
        let scaled = scaler.transform(features.view());

        for column in scaled.axis_iter(Axis(1)) {
            let mean = column.sum() / 4.0;
            let variance = column.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / 4.0;
            assert!(mean.abs() < 1e-12);
            assert!((variance - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_constant_column_has_no_nan() {
        let features = array![[5.0, 1.0], [5.0, 2.0]];
        let scaler = StandardScaler::fit(features.view());
        let row = scaler.transform_row(array![5.0, 1.5].view());

        assert_eq!(scaler.scales[0], 1.0);
        assert_eq!(row, vec![0.0, 0.0]);
    }
}
