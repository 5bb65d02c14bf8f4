//! CART regression tree with a multi-output squared-error criterion

/// Minimum squared-error reduction for a split to be kept, relative to the node's score
const MIN_RELATIVE_GAIN: f64 = 1e-9;

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeSettings {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

#[derive(Debug, Clone, Copy)]
struct BestSplit {
    feature: usize,
    threshold: f64,
    score: f64,
}

/// A fitted regression tree stored as a flat node arena
#[derive(Debug, Clone)]
pub(crate) struct RegressionTree {
    nodes: Vec<Node>,
    /// Total squared-error reduction attributed to each feature
    importances: Vec<f64>,
}

impl RegressionTree {
    /// Grow a tree on the rows listed in `samples` (duplicates allowed).
    ///
    /// Inputs are assumed validated by the caller: rectangular and finite.
    pub(crate) fn build(
        x: &[Vec<f64>],
        y: &[Vec<f64>],
        samples: Vec<usize>,
        settings: &TreeSettings,
    ) -> Self {
        let n_features = x.first().map_or(0, Vec::len);
        let n_outputs = y.first().map_or(0, Vec::len);

        let mut nodes = Vec::new();
        let mut importances = vec![0.0; n_features];

        // Explicit work stack: unlimited-depth trees on monotone data can get
        // deeper than the call stack allows.
        nodes.push(Node::Leaf { value: Vec::new() });
        let mut stack = vec![(0usize, samples, 0usize)];

        while let Some((node_idx, samples, depth)) = stack.pop() {
            let sums = output_sums(y, &samples, n_outputs);
            let n = samples.len() as f64;
            let mean: Vec<f64> = sums.iter().map(|s| s / n).collect();

            let pure = samples
                .iter()
                .all(|&s| y[s].iter().zip(mean.iter()).all(|(v, m)| v == m));

            let can_split = !pure
                && samples.len() >= settings.min_samples_split
                && samples.len() >= 2 * settings.min_samples_leaf
                && settings.max_depth.map_or(true, |max| depth < max);

            let split = if can_split {
                best_split(x, y, &samples, &sums, settings.min_samples_leaf)
            } else {
                None
            };

            let parent_score = sums.iter().map(|s| s * s / n).sum::<f64>();
            let min_gain = MIN_RELATIVE_GAIN * parent_score.max(1.0);

            match split {
                Some(best) if best.score - parent_score > min_gain => {
                    importances[best.feature] += best.score - parent_score;

                    let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
                        .into_iter()
                        .partition(|&s| x[s][best.feature] <= best.threshold);

                    let left = nodes.len();
                    nodes.push(Node::Leaf { value: Vec::new() });
                    let right = nodes.len();
                    nodes.push(Node::Leaf { value: Vec::new() });

                    nodes[node_idx] = Node::Split {
                        feature: best.feature,
                        threshold: best.threshold,
                        left,
                        right,
                    };

                    stack.push((right, right_samples, depth + 1));
                    stack.push((left, left_samples, depth + 1));
                }
                _ => {
                    nodes[node_idx] = Node::Leaf { value: mean };
                }
            }
        }

        Self { nodes, importances }
    }

    /// Route a row to its leaf and return the leaf's output vector
    pub(crate) fn predict(&self, row: &[f64]) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub(crate) fn importances(&self) -> &[f64] {
        &self.importances
    }

    #[cfg(test)]
    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

fn output_sums(y: &[Vec<f64>], samples: &[usize], n_outputs: usize) -> Vec<f64> {
    let mut sums = vec![0.0; n_outputs];
    for &s in samples {
        for (acc, v) in sums.iter_mut().zip(y[s].iter()) {
            *acc += v;
        }
    }
    sums
}

/// Find the split maximising `Σ_k sumL_k²/nL + sumR_k²/nR`.
///
/// Summed squared error is `Σy² - Σ_k sum_k²/n`, so maximising this score is the
/// same as minimising the children's squared error.
fn best_split(
    x: &[Vec<f64>],
    y: &[Vec<f64>],
    samples: &[usize],
    sums: &[f64],
    min_samples_leaf: usize,
) -> Option<BestSplit> {
    let n = samples.len();
    let n_features = x[samples[0]].len();
    let mut best: Option<BestSplit> = None;
    let mut order = samples.to_vec();
    let mut left_sums = vec![0.0; sums.len()];

    for feature in 0..n_features {
        order.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));
        left_sums.iter_mut().for_each(|v| *v = 0.0);

        for i in 0..n - 1 {
            for (acc, v) in left_sums.iter_mut().zip(y[order[i]].iter()) {
                *acc += v;
            }

            let n_left = i + 1;
            let n_right = n - n_left;
            if n_left < min_samples_leaf || n_right < min_samples_leaf {
                continue;
            }

            let current = x[order[i]][feature];
            let next = x[order[i + 1]][feature];
            if next <= current {
                continue;
            }

            let score: f64 = left_sums
                .iter()
                .zip(sums.iter())
                .map(|(l, t)| {
                    let r = t - l;
                    l * l / n_left as f64 + r * r / n_right as f64
                })
                .sum();

            if best.map_or(true, |b| score > b.score) {
                let mut threshold = current + (next - current) / 2.0;
                if threshold >= next {
                    threshold = current;
                }
                best = Some(BestSplit {
                    feature,
                    threshold,
                    score,
                });
            }
        }
    }

    best
}
