use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::decision_tree::{DecisionTree, TreeParams};
use crate::model::Classifier;
use crate::parse::Diagnosis;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

/// Bagged CART trees with `sqrt(features)` candidates per split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    trees: Vec<DecisionTree>,
    dimensions: usize,
}

impl RandomForest {
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            trees: Vec::new(),
            dimensions: 0,
        }
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    pub fn feature_importances(&self) -> Vec<f64> {
        let mut importances = vec![0.0; self.dimensions];

        for tree in &self.trees {
            for (total, value) in importances.iter_mut().zip(tree.feature_importances()) {
                *total += value;
            }
        }

        let sum: f64 = importances.iter().sum();
        if sum > 0.0 {
            for importance in &mut importances {
                *importance /= sum;
            }
        }

        importances
    }

    fn max_features(dimensions: usize) -> usize {
        #[allow(clippy::cast_possible_truncation)]
        #[allow(clippy::cast_sign_loss)]
        let max_features = (dimensions as f64).sqrt() as usize;

        max_features.max(1)
    }
}

impl Classifier for RandomForest {
    fn fit(&mut self, features: ArrayView2<f64>, labels: &[Diagnosis]) {
        let samples = features.nrows();
        self.dimensions = features.ncols();
        self.trees.clear();

        if samples == 0 {
            return;
        }

        let tree_params = TreeParams {
            max_depth: self.params.max_depth,
            min_samples_split: self.params.min_samples_split,
            max_features: Some(Self::max_features(self.dimensions)),
        };

        let mut rng = StdRng::seed_from_u64(self.params.seed);

        for _ in 0..self.params.n_estimators {
            let bootstrap: Vec<usize> = (0..samples).map(|_| rng.gen_range(0..samples)).collect();
            let mut tree_rng = StdRng::seed_from_u64(rng.gen());

            let tree = DecisionTree::fit(features, labels, &bootstrap, tree_params, &mut tree_rng);
            self.trees.push(tree);
        }

        debug!(
            trees = self.trees.len(),
            nodes = self.trees.iter().map(DecisionTree::node_count).sum::<usize>(),
            "random forest fitted"
        );
    }

    fn predict_proba(&self, features: ArrayView1<f64>) -> [f64; Diagnosis::COUNT] {
        if self.trees.is_empty() {
            return [0.5; Diagnosis::COUNT];
        }

        let row = features.to_vec();
        let mut probabilities = [0.0; Diagnosis::COUNT];

        for tree in &self.trees {
            for (total, p) in probabilities.iter_mut().zip(tree.predict_proba(&row)) {
                *total += p;
            }
        }

        let trees = self.trees.len() as f64;
        probabilities.map(|p| p / trees)
    }
}
