use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::model::Classifier;
use crate::parse::Diagnosis;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    pub learning_rate: f64,
    pub elastic_net_regularization: f64,
    pub epochs: usize,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            elastic_net_regularization: 0.001,
            epochs: 1000,
        }
    }
}

/// Full-batch gradient descent on the logistic loss with an elastic-net
/// penalty on the weights (the bias is not penalized).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub params: LogisticParams,
    pub weights: Array1<f64>,
    pub bias: f64,
}

fn sigmoid(value: f64) -> f64 {
    1.0 / (1.0 + (-value).exp())
}

impl LogisticRegression {
    pub fn new(params: LogisticParams) -> Self {
        Self {
            params,
            weights: Array1::zeros(0),
            bias: 0.0,
        }
    }

    fn decision_function(&self, features: ArrayView1<f64>) -> f64 {
        features.dot(&self.weights) + self.bias
    }

    fn step(&mut self, features: ArrayView2<f64>, labels: &[Diagnosis]) {
        let (mut gradient, bias_gradient) = self.logistic_loss_gradient(features, labels);

        gradient += &self.elastic_net_regularization_gradient();

        self.weights = &self.weights - self.params.learning_rate * gradient;
        self.bias -= self.params.learning_rate * bias_gradient;
    }

    #[allow(clippy::float_cmp)]
    fn elastic_net_regularization_gradient(&self) -> Array1<f64> {
        // subgradient of |w| is taken as 0 at w = 0
        let l1_term = self
            .weights
            .mapv(|w| if w == 0.0 { 0.0 } else { w.signum() });
        let l2_term = self.weights.clone();

        self.params.elastic_net_regularization * (l1_term + 2.0 * l2_term)
    }

    // d/dw log(1 + exp(-y * f(x))) = -y * x * (1 - sigmoid(y * f(x)))
    fn logistic_loss_gradient(
        &self,
        features: ArrayView2<f64>,
        labels: &[Diagnosis],
    ) -> (Array1<f64>, f64) {
        let mut gradient = Array1::zeros(features.ncols());
        let mut bias_gradient = 0.0;
        let n_samples = features.nrows().max(1) as f64;

        for (sample, diagnosis) in features.rows().into_iter().zip(labels) {
            let label = diagnosis.sign();
            let margin = label * self.decision_function(sample);
            let coefficient = -label * (1.0 - sigmoid(margin));

            gradient.zip_mut_with(&sample, |current_gradient, &feature_value| {
                *current_gradient += coefficient * feature_value;
            });
            bias_gradient += coefficient;
        }

        (gradient / n_samples, bias_gradient / n_samples)
    }
}

impl Classifier for LogisticRegression {
    fn fit(&mut self, features: ArrayView2<f64>, labels: &[Diagnosis]) {
        self.weights = Array1::zeros(features.ncols());
        self.bias = 0.0;

        for _ in 0..self.params.epochs {
            self.step(features, labels);
        }
    }

    fn predict_proba(&self, features: ArrayView1<f64>) -> [f64; Diagnosis::COUNT] {
        if self.weights.len() != features.len() {
            return [0.5; Diagnosis::COUNT];
        }

        let disease = sigmoid(self.decision_function(features));
        [1.0 - disease, disease]
    }
}
