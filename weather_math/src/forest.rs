//! Multi-output random forest regression
//!
//! An ensemble of bootstrap-sampled CART trees. Every tree predicts the full
//! target vector, so a single forest covers all targets at once.

use crate::tree::{RegressionTree, TreeSettings};
use crate::{check_matrices, MathError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Hyperparameters of a random forest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    /// Number of trees in the ensemble
    pub n_estimators: usize,
    /// Maximum tree depth, `None` for fully grown trees
    pub max_depth: Option<usize>,
    /// Minimum number of rows required to split a node
    pub min_samples_split: usize,
    /// Minimum number of rows in each leaf
    pub min_samples_leaf: usize,
    /// Draw a bootstrap sample per tree
    pub bootstrap: bool,
    /// Seed for the master random generator
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            bootstrap: true,
            seed: 42,
        }
    }
}

impl ForestParams {
    /// Create parameters with the given ensemble size and seed
    pub fn new(n_estimators: usize, seed: u64) -> Result<Self> {
        let params = Self {
            n_estimators,
            seed,
            ..Self::default()
        };
        params.validate()?;
        Ok(params)
    }

    /// Limit the depth of every tree
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(MathError::InvalidInput(
                "A forest needs at least one tree".to_string(),
            ));
        }
        if self.min_samples_split < 2 {
            return Err(MathError::InvalidInput(
                "min_samples_split must be at least 2".to_string(),
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(MathError::InvalidInput(
                "min_samples_leaf must be at least 1".to_string(),
            ));
        }
        if self.max_depth == Some(0) {
            return Err(MathError::InvalidInput(
                "max_depth must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Fit a forest on a row-major feature matrix `x` and target matrix `y`
    pub fn fit(&self, x: &[Vec<f64>], y: &[Vec<f64>]) -> Result<RandomForestRegressor> {
        self.validate()?;
        let (n_features, n_outputs) = check_matrices(x, y)?;

        let settings = TreeSettings {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
        };

        let n_rows = x.len();
        let mut master = StdRng::seed_from_u64(self.seed);
        let mut trees = Vec::with_capacity(self.n_estimators);
        let mut importances = vec![0.0; n_features];

        for _ in 0..self.n_estimators {
            let mut rng = StdRng::seed_from_u64(master.gen());
            let samples: Vec<usize> = if self.bootstrap {
                (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect()
            } else {
                (0..n_rows).collect()
            };

            let tree = RegressionTree::build(x, y, samples, &settings);

            let tree_total: f64 = tree.importances().iter().sum();
            if tree_total > 0.0 {
                for (acc, v) in importances.iter_mut().zip(tree.importances()) {
                    *acc += v / tree_total;
                }
            }

            trees.push(tree);
        }

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|v| *v /= total);
        }

        log::debug!(
            "Fitted random forest: {} trees, {} rows, {} features, {} outputs",
            trees.len(),
            n_rows,
            n_features,
            n_outputs
        );

        Ok(RandomForestRegressor {
            params: self.clone(),
            trees,
            n_features,
            n_outputs,
            feature_importances: importances,
        })
    }
}

/// A fitted random forest. Immutable once built.
#[derive(Debug, Clone)]
pub struct RandomForestRegressor {
    params: ForestParams,
    trees: Vec<RegressionTree>,
    n_features: usize,
    n_outputs: usize,
    feature_importances: Vec<f64>,
}

impl RandomForestRegressor {
    /// Predict the target vector for a single row
    pub fn predict_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.n_features {
            return Err(MathError::InvalidInput(format!(
                "Expected {} features, got {}",
                self.n_features,
                row.len()
            )));
        }
        if row.iter().any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(
                "Cannot predict from non-finite features".to_string(),
            ));
        }

        let mut prediction = vec![0.0; self.n_outputs];
        for tree in &self.trees {
            for (acc, v) in prediction.iter_mut().zip(tree.predict(row)) {
                *acc += v;
            }
        }

        let n_trees = self.trees.len() as f64;
        prediction.iter_mut().for_each(|v| *v /= n_trees);

        Ok(prediction)
    }

    /// Predict target vectors for a batch of rows
    pub fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        x.iter().map(|row| self.predict_row(row)).collect()
    }

    /// Normalised mean impurity decrease per feature
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    /// Parameters the forest was fitted with
    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_outputs(&self) -> usize {
        self.n_outputs
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}
