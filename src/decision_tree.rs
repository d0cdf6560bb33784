use ndarray::ArrayView2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::parse::Diagnosis;

type ClassCounts = [f64; Diagnosis::COUNT];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Features tried per split; `None` tries all of them.
    pub max_features: Option<usize>,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            max_features: None,
        }
    }
}

/// Nodes live in a flat arena; children are indices into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        probabilities: ClassCounts,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    importances: Vec<f64>,
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

fn gini(counts: &ClassCounts) -> f64 {
    let total: f64 = counts.iter().sum();
    if total == 0.0 {
        return 0.0;
    }

    1.0 - counts.iter().map(|c| (c / total).powi(2)).sum::<f64>()
}

fn class_counts(labels: &[Diagnosis], indices: &[usize]) -> ClassCounts {
    let mut counts = [0.0; Diagnosis::COUNT];
    for &i in indices {
        counts[labels[i].index()] += 1.0;
    }
    counts
}

struct Builder<'a, 'b> {
    features: ArrayView2<'a, f64>,
    labels: &'b [Diagnosis],
    params: TreeParams,
    nodes: Vec<Node>,
    importances: Vec<f64>,
}

impl DecisionTree {
    /// Grows a tree on the rows named by `indices`; repeated indices weigh
    /// a row more, which is how bootstrap samples are passed in.
    pub fn fit(
        features: ArrayView2<f64>,
        labels: &[Diagnosis],
        indices: &[usize],
        params: TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let mut builder = Builder {
            features,
            labels,
            params,
            nodes: Vec::new(),
            importances: vec![0.0; features.ncols()],
        };

        builder.grow(indices, 0, rng);

        let total: f64 = builder.importances.iter().sum();
        if total > 0.0 {
            for importance in &mut builder.importances {
                *importance /= total;
            }
        }

        Self {
            nodes: builder.nodes,
            importances: builder.importances,
        }
    }

    pub fn predict_proba(&self, row: &[f64]) -> ClassCounts {
        let mut index = 0;

        loop {
            match self.nodes.get(index) {
                Some(Node::Leaf { probabilities }) => return *probabilities,
                Some(&Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    index = if row[feature] <= threshold { left } else { right };
                }
                None => return [0.5; Diagnosis::COUNT],
            }
        }
    }

    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl Builder<'_, '_> {
    fn grow(&mut self, indices: &[usize], depth: usize, rng: &mut StdRng) -> usize {
        let counts = class_counts(self.labels, indices);
        let node_impurity = gini(&counts);
        let node_index = self.push_leaf(&counts);

        let depth_exhausted = self.params.max_depth.is_some_and(|max| depth >= max);
        if depth_exhausted
            || indices.len() < self.params.min_samples_split
            || node_impurity <= f64::EPSILON
        {
            return node_index;
        }

        let Some(split) = self.best_split(indices, rng) else {
            return node_index;
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .copied()
            .partition(|&i| self.features[(i, split.feature)] <= split.threshold);

        let samples = indices.len() as f64;
        self.importances[split.feature] += samples * node_impurity - samples * split.impurity;

        let left = self.grow(&left_indices, depth + 1, rng);
        let right = self.grow(&right_indices, depth + 1, rng);

        self.nodes[node_index] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };

        node_index
    }

    fn push_leaf(&mut self, counts: &ClassCounts) -> usize {
        let total: f64 = counts.iter().sum();
        let probabilities = if total > 0.0 {
            counts.map(|c| c / total)
        } else {
            [0.5; Diagnosis::COUNT]
        };

        self.nodes.push(Node::Leaf { probabilities });
        self.nodes.len() - 1
    }

    /// Samples features in random order and keeps the lowest weighted Gini;
    /// constant features are skipped without counting toward `max_features`.
    fn best_split(&self, indices: &[usize], rng: &mut StdRng) -> Option<Split> {
        let dimensions = self.features.ncols();
        let max_features = self.params.max_features.unwrap_or(dimensions).max(1);

        let mut order: Vec<usize> = (0..dimensions).collect();
        order.shuffle(rng);

        let mut evaluated = 0;
        let mut best: Option<Split> = None;

        for feature in order {
            if evaluated >= max_features && best.is_some() {
                break;
            }

            let Some(candidate) = self.best_split_on(feature, indices) else {
                continue;
            };
            evaluated += 1;

            if best.is_none_or(|current| candidate.impurity < current.impurity) {
                best = Some(candidate);
            }
        }

        best
    }

    fn best_split_on(&self, feature: usize, indices: &[usize]) -> Option<Split> {
        let mut values: Vec<(f64, Diagnosis)> = indices
            .iter()
            .map(|&i| (self.features[(i, feature)], self.labels[i]))
            .collect();
        values.sort_by(|a, b| a.0.total_cmp(&b.0));

        let total = class_counts(self.labels, indices);
        let samples = values.len() as f64;
        let mut left = [0.0; Diagnosis::COUNT];
        let mut best: Option<Split> = None;

        for window in 0..values.len().saturating_sub(1) {
            let (value, label) = values[window];
            left[label.index()] += 1.0;

            let next = values[window + 1].0;
            if next <= value {
                continue;
            }

            let mut right = total;
            for (r, l) in right.iter_mut().zip(left) {
                *r -= l;
            }

            let left_samples: f64 = left.iter().sum();
            let right_samples = samples - left_samples;
            let impurity = (left_samples * gini(&left) + right_samples * gini(&right)) / samples;

            if best.is_none_or(|current| impurity < current.impurity) {
                let midpoint = value + (next - value) / 2.0;
                let threshold = if midpoint < next { midpoint } else { value };

                best = Some(Split {
                    feature,
                    threshold,
                    impurity,
                });
            }
        }

        best
    }
}
