//! CART regression tree stored as a flat node array.
//!
//! Splits minimise the summed squared error of the two children. Candidate
//! thresholds are midpoints between consecutive distinct feature values,
//! scanned in sorted order with running sums.

use crate::domain::ml::{FeatureVector, NUM_FEATURES};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 10,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

/// Children always sit at higher indices than their parent; the root is node 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum TreeNode {
    Leaf {
        value: f64,
        n_samples: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        n_samples: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
    /// Impurity decrease per feature, normalized to sum 1 (all zero for a single leaf)
    importances: Vec<f64>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    n_left: usize,
    children_sse: f64,
}

struct TreeBuilder<'a> {
    features: &'a [FeatureVector],
    targets: &'a [f64],
    params: &'a TreeParams,
    nodes: Vec<TreeNode>,
    importances: [f64; NUM_FEATURES],
}

impl RegressionTree {
    /// Fits a tree on the rows listed in `samples`. Rows may repeat (bootstrap draws).
    pub fn fit(
        features: &[FeatureVector],
        targets: &[f64],
        mut samples: Vec<usize>,
        params: &TreeParams,
    ) -> Self {
        let mut builder = TreeBuilder {
            features,
            targets,
            params,
            nodes: Vec::new(),
            importances: [0.0; NUM_FEATURES],
        };
        if !samples.is_empty() {
            builder.grow(&mut samples, 0);
        }

        let total: f64 = builder.importances.iter().sum();
        let importances = if total > 0.0 {
            builder.importances.iter().map(|v| v / total).collect()
        } else {
            vec![0.0; NUM_FEATURES]
        };

        Self {
            nodes: builder.nodes,
            importances,
        }
    }

    pub fn predict_one(&self, features: &FeatureVector) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf { value, .. }) => return *value,
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                }) => {
                    idx = if features.get(*feature) <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                None => return f64::NAN,
            }
        }
    }

    pub fn importances(&self) -> &[f64] {
        &self.importances
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, TreeNode::Leaf { .. }))
            .count()
    }

    /// Number of split levels on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[TreeNode], idx: usize) -> usize {
            match nodes.get(idx) {
                Some(TreeNode::Split { left, right, .. }) => {
                    1 + walk(nodes, *left).max(walk(nodes, *right))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        if self.importances.len() != NUM_FEATURES
            || self.importances.iter().any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err("invalid tree feature importances".to_string());
        }

        let len = self.nodes.len();
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Leaf { value, .. } => {
                    if !value.is_finite() {
                        return Err(format!("leaf {} has a non-finite value", idx));
                    }
                }
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    if *feature >= NUM_FEATURES {
                        return Err(format!("node {} splits on unknown feature {}", idx, feature));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {} has a non-finite threshold", idx));
                    }
                    let in_range = |child: usize| child > idx && child < len;
                    if !in_range(*left) || !in_range(*right) {
                        return Err(format!("node {} has out-of-range children", idx));
                    }
                }
            }
        }
        Ok(())
    }
}

impl TreeBuilder<'_> {
    fn x(&self, row: usize, feature: usize) -> f64 {
        self.features[row].get(feature)
    }

    fn grow(&mut self, samples: &mut [usize], depth: usize) -> usize {
        let n = samples.len();
        let mean = samples.iter().map(|&i| self.targets[i]).sum::<f64>() / n as f64;
        let node_sse: f64 = samples
            .iter()
            .map(|&i| (self.targets[i] - mean).powi(2))
            .sum();

        let id = self.nodes.len();
        self.nodes.push(TreeNode::Leaf {
            value: mean,
            n_samples: n,
        });

        if depth >= self.params.max_depth
            || n < self.params.min_samples_split
            || n < 2 * self.params.min_samples_leaf
            || node_sse <= 0.0
        {
            return id;
        }

        let best = match self.find_best_split(samples, mean) {
            Some(split) if split.children_sse < node_sse => split,
            _ => return id,
        };

        self.importances[best.feature] += node_sse - best.children_sse;

        let feature = best.feature;
        samples.sort_by(|&a, &b| self.x(a, feature).total_cmp(&self.x(b, feature)));
        let (left_rows, right_rows) = samples.split_at_mut(best.n_left);
        let left = self.grow(left_rows, depth + 1);
        let right = self.grow(right_rows, depth + 1);

        self.nodes[id] = TreeNode::Split {
            feature,
            threshold: best.threshold,
            left,
            right,
            n_samples: n,
        };
        id
    }

    fn find_best_split(&self, samples: &[usize], mean: f64) -> Option<SplitCandidate> {
        let n = samples.len();
        let min_leaf = self.params.min_samples_leaf.max(1);
        // Targets are centred on the node mean to keep the running sums small
        let total_sum: f64 = samples.iter().map(|&i| self.targets[i] - mean).sum();
        let total_sq: f64 = samples
            .iter()
            .map(|&i| (self.targets[i] - mean).powi(2))
            .sum();

        let mut best: Option<SplitCandidate> = None;
        let mut order = samples.to_vec();

        for feature in 0..NUM_FEATURES {
            order.sort_by(|&a, &b| self.x(a, feature).total_cmp(&self.x(b, feature)));

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            for pos in 0..n - 1 {
                let y = self.targets[order[pos]] - mean;
                left_sum += y;
                left_sq += y * y;

                let n_left = pos + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let here = self.x(order[pos], feature);
                let next = self.x(order[pos + 1], feature);
                if here == next {
                    continue;
                }

                let right_sum = total_sum - left_sum;
                let right_sq = total_sq - left_sq;
                let sse = (left_sq - left_sum * left_sum / n_left as f64)
                    + (right_sq - right_sum * right_sum / n_right as f64);

                if best.as_ref().is_none_or(|b| sse < b.children_sse) {
                    let mut threshold = here / 2.0 + next / 2.0;
                    if threshold >= next {
                        threshold = here;
                    }
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        n_left,
                        children_sse: sse.max(0.0),
                    });
                }
            }
        }

        best
    }
}
