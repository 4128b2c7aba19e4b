//! Robust multiple linear regression

use crate::core::{Error, Result};
use crate::linalg::{solve, Matrix, Solution};
use crate::ransac::Estimator;
use serde::{Deserialize, Serialize};

/// `y = intercept + coefficients · x`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearModel {
    pub fn predict(&self, x: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(x)
                .map(|(b, v)| b * v)
                .sum::<f64>()
    }
}

/// Least-squares line/hyperplane estimator scored by absolute residual
///
/// ```
/// use svmkit::ransac::{LinearRegressionEstimator, Ransac, RansacConfig};
///
/// let inputs: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
/// let mut outputs: Vec<f64> = (0..10).map(|i| 2.0 * i as f64 + 1.0).collect();
/// outputs[4] = 100.0;
///
/// let estimator = LinearRegressionEstimator::new(&inputs, &outputs).unwrap();
/// let config = RansacConfig::new(estimator.min_samples(), 0.1);
/// let result = Ransac::new(estimator, config).run(inputs.len()).unwrap().unwrap();
/// assert_eq!(result.inliers.len(), 9);
/// assert!(!result.inliers.contains(&4));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct LinearRegressionEstimator<'a> {
    inputs: &'a [Vec<f64>],
    outputs: &'a [f64],
    dim: usize,
}

impl<'a> LinearRegressionEstimator<'a> {
    pub fn new(inputs: &'a [Vec<f64>], outputs: &'a [f64]) -> Result<Self> {
        let first = inputs.first().ok_or(Error::EmptyDataset)?;
        if outputs.len() != inputs.len() {
            return Err(Error::DimensionMismatch {
                expected: inputs.len(),
                actual: outputs.len(),
            });
        }
        let dim = first.len();
        if let Some(row) = inputs.iter().find(|row| row.len() != dim) {
            return Err(Error::DimensionMismatch {
                expected: dim,
                actual: row.len(),
            });
        }
        Ok(Self {
            inputs,
            outputs,
            dim,
        })
    }

    /// Points needed to determine the model: one per coefficient plus the intercept
    pub fn min_samples(&self) -> usize {
        self.dim + 1
    }

    pub fn residual(&self, model: &LinearModel, i: usize) -> f64 {
        (self.outputs[i] - model.predict(&self.inputs[i])).abs()
    }

    /// Least-squares fit over the consensus set
    pub fn refit(&self, inliers: &[usize]) -> Result<LinearModel> {
        let solution = self.least_squares(inliers)?;
        if solution.rank < self.min_samples() {
            return Err(Error::RankDeficient {
                rank: solution.rank,
                required: self.min_samples(),
            });
        }
        Ok(self.model_from(&solution))
    }

    fn least_squares(&self, indices: &[usize]) -> Result<Solution> {
        let cols = self.dim + 1;
        let mut design = Matrix::zeros(indices.len(), cols);
        let mut rhs = Matrix::zeros(indices.len(), 1);
        for (r, &i) in indices.iter().enumerate() {
            design[(r, 0)] = 1.0;
            for (c, &v) in self.inputs[i].iter().enumerate() {
                design[(r, c + 1)] = v;
            }
            rhs[(r, 0)] = self.outputs[i];
        }
        solve(&design, &rhs)
    }

    fn model_from(&self, solution: &Solution) -> LinearModel {
        LinearModel {
            intercept: solution.x[(0, 0)],
            coefficients: (1..=self.dim).map(|c| solution.x[(c, 0)]).collect(),
        }
    }
}

impl Estimator for LinearRegressionEstimator<'_> {
    type Model = LinearModel;

    /// `Ok(None)` when the sampled points do not determine a unique model
    fn fit(&self, sample: &[usize]) -> Result<Option<LinearModel>> {
        let solution = self.least_squares(sample)?;
        if solution.rank < self.min_samples() {
            return Ok(None);
        }
        Ok(Some(self.model_from(&solution)))
    }

    fn inliers(&self, model: &LinearModel, threshold: f64) -> Vec<usize> {
        (0..self.inputs.len())
            .filter(|&i| self.residual(model, i) <= threshold)
            .collect()
    }
}
