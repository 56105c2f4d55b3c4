//! Pre-trained classifiers and the toxicity prediction they produce.
//!
//! Models are stored as JSON documents tagged by `"kind"` ([`ModelSpec`]) and
//! compiled once into a [`Classifier`]. Compilation checks the document's
//! internal consistency and decides whether the model can estimate class
//! probabilities:
//!
//! | kind                  | capability     | output                                   |
//! |-----------------------|----------------|------------------------------------------|
//! | `logistic_regression` | probabilistic  | sigmoid of the linear decision value     |
//! | `linear_svc`          | label only     | sign of the linear decision value        |
//! | `decision_tree`       | probabilistic  | normalised class counts of the leaf      |
//! | `random_forest`       | probabilistic  | mean of the tree probabilities           |
//! | `stacking`            | as final model | final model over base-model scores       |
//!
//! The compiled [`Classifier`] implements linfa's [`PredictInplace`], so a
//! batch of samples goes through [`linfa::traits::Predict`].
//!
//! ```
//! use ndarray::array;
//! use stack_tox::models::{predict_toxicity, Classifier, ModelSpec};
//!
//! let spec: ModelSpec = serde_json::from_str(
//!     r#"{"kind": "logistic_regression", "coef": [2.0, -1.0], "intercept": 0.0}"#,
//! ).unwrap();
//! let model = Classifier::from_spec(spec).unwrap();
//! let prediction = predict_toxicity(&array![1.0, 0.0], &model).unwrap();
//! assert_eq!(prediction.to_string(), "Prediction: Toxic (Confidence: 0.88)");
//! ```

use std::fmt;

use linfa::traits::PredictInplace;
use ndarray::{Array1, ArrayBase, ArrayView1, Data, Ix2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from compiling or evaluating a classifier.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The feature vector has the wrong length for the model.
    #[error("model expects {expected} features, got {found}")]
    DimensionMismatch {
        /// Features the model was trained on (or the smallest count it reads).
        expected: usize,
        /// Length of the vector handed in.
        found: usize,
    },

    /// The model document is inconsistent.
    #[error("invalid model: {0}")]
    InvalidModel(String),
}

fn invalid(msg: impl Into<String>) -> ModelError {
    ModelError::InvalidModel(msg.into())
}

// ─────────────────────────────────────────────────────────────────────────────
// Serialized form
// ─────────────────────────────────────────────────────────────────────────────
fn binary_classes() -> Vec<i64> {
    vec![0, 1]
}

/// A serialized classifier, tagged by `"kind"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    /// Binary logistic regression.
    LogisticRegression(LinearSpec),
    /// Binary linear support vector classifier.
    LinearSvc(LinearSpec),
    /// A single decision tree.
    DecisionTree(TreeSpec),
    /// A bagged ensemble of decision trees.
    RandomForest(ForestSpec),
    /// A stacked ensemble.
    Stacking(StackingSpec),
}

/// Weights of a binary linear model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearSpec {
    /// One weight per feature.
    pub coef: Vec<f64>,
    /// Bias term.
    #[serde(default)]
    pub intercept: f64,
    /// Negative and positive class, in that order.
    #[serde(default = "binary_classes")]
    pub classes: Vec<i64>,
}

/// One node of a decision tree. Nodes without children are leaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Feature tested at a split.
    #[serde(default)]
    pub feature: Option<usize>,
    /// Samples with `x[feature] <= threshold` go left.
    #[serde(default)]
    pub threshold: f64,
    /// Index of the left child.
    #[serde(default)]
    pub left: Option<usize>,
    /// Index of the right child.
    #[serde(default)]
    pub right: Option<usize>,
    /// Training class counts (or fractions) reaching a leaf.
    #[serde(default)]
    pub value: Vec<f64>,
}

/// A decision tree as a flat node array, root first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeSpec {
    /// Nodes; children always come after their parent.
    pub nodes: Vec<TreeNode>,
    /// Class label of each `value` column.
    #[serde(default = "binary_classes")]
    pub classes: Vec<i64>,
}

/// A random forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestSpec {
    /// Member trees; all must share the same classes.
    pub trees: Vec<TreeSpec>,
}

/// A stacked ensemble: base models feed a final model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackingSpec {
    /// Base models, in the order their scores are stacked.
    pub estimators: Vec<ModelSpec>,
    /// Model trained on the stacked scores.
    pub final_estimator: Box<ModelSpec>,
    /// Append the original features after the base scores.
    #[serde(default)]
    pub passthrough: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Capabilities
// ─────────────────────────────────────────────────────────────────────────────
/// A model that can assign a class label.
pub trait LabelModel: fmt::Debug {
    /// Features the model expects, when it is fixed.
    fn n_features(&self) -> Option<usize>;

    /// Raw class label for one sample.
    fn predict_label(&self, x: ArrayView1<'_, f64>) -> Result<i64, ModelError>;

    /// Scores this model contributes when it is a stacking base model.
    fn meta_features(&self, x: ArrayView1<'_, f64>) -> Result<Vec<f64>, ModelError>;
}

/// A model that can also estimate class probabilities.
pub trait ProbabilisticModel: LabelModel {
    /// Class labels, in probability-column order.
    fn classes(&self) -> &[i64];

    /// One probability per class, summing to 1.
    fn predict_proba(&self, x: ArrayView1<'_, f64>) -> Result<Array1<f64>, ModelError>;
}

/// Label of the most probable class (first on ties).
fn most_probable(classes: &[i64], proba: &Array1<f64>) -> i64 {
    let mut best = 0;
    for (i, &p) in proba.iter().enumerate() {
        if p > proba[best] {
            best = i;
        }
    }
    classes[best]
}

/// Stacking scores of a probabilistic model: the positive-class column for
/// binary models, every column otherwise.
fn proba_meta_features(model: &dyn ProbabilisticModel, x: ArrayView1<'_, f64>) -> Result<Vec<f64>, ModelError> {
    let proba = model.predict_proba(x)?;
    if proba.len() == 2 {
        Ok(vec![proba[1]])
    } else {
        Ok(proba.to_vec())
    }
}

fn check_len(expected: usize, x: ArrayView1<'_, f64>) -> Result<(), ModelError> {
    if x.len() == expected {
        Ok(())
    } else {
        Err(ModelError::DimensionMismatch {
            expected,
            found: x.len(),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Linear models
// ─────────────────────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
struct LinearModel {
    coef: Array1<f64>,
    intercept: f64,
    classes: [i64; 2],
}

impl LinearModel {
    fn compile(spec: LinearSpec) -> Result<Self, ModelError> {
        if spec.coef.is_empty() {
            return Err(invalid("linear model has no coefficients"));
        }
        let classes = match spec.classes.as_slice() {
            &[negative, positive] => [negative, positive],
            other => {
                return Err(invalid(format!(
                    "linear model needs exactly 2 classes, found {}",
                    other.len()
                )))
            }
        };
        Ok(LinearModel {
            coef: Array1::from(spec.coef),
            intercept: spec.intercept,
            classes,
        })
    }

    fn decision(&self, x: ArrayView1<'_, f64>) -> Result<f64, ModelError> {
        check_len(self.coef.len(), x)?;
        Ok(self.coef.dot(&x) + self.intercept)
    }
}

#[derive(Debug, Clone)]
struct LogisticRegression(LinearModel);

impl LabelModel for LogisticRegression {
    fn n_features(&self) -> Option<usize> {
        Some(self.0.coef.len())
    }

    fn predict_label(&self, x: ArrayView1<'_, f64>) -> Result<i64, ModelError> {
        Ok(most_probable(self.classes(), &self.predict_proba(x)?))
    }

    fn meta_features(&self, x: ArrayView1<'_, f64>) -> Result<Vec<f64>, ModelError> {
        proba_meta_features(self, x)
    }
}

impl ProbabilisticModel for LogisticRegression {
    fn classes(&self) -> &[i64] {
        &self.0.classes
    }

    fn predict_proba(&self, x: ArrayView1<'_, f64>) -> Result<Array1<f64>, ModelError> {
        let z = self.0.decision(x)?;
        let positive = 1.0 / (1.0 + (-z).exp());
        Ok(Array1::from(vec![1.0 - positive, positive]))
    }
}

#[derive(Debug, Clone)]
struct LinearSvc(LinearModel);

impl LabelModel for LinearSvc {
    fn n_features(&self) -> Option<usize> {
        Some(self.0.coef.len())
    }

    fn predict_label(&self, x: ArrayView1<'_, f64>) -> Result<i64, ModelError> {
        let [negative, positive] = self.0.classes;
        Ok(if self.0.decision(x)? > 0.0 { positive } else { negative })
    }

    fn meta_features(&self, x: ArrayView1<'_, f64>) -> Result<Vec<f64>, ModelError> {
        Ok(vec![self.0.decision(x)?])
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Trees
// ─────────────────────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf(Array1<f64>),
}

#[derive(Debug, Clone)]
struct DecisionTree {
    nodes: Vec<Node>,
    classes: Vec<i64>,
}

impl DecisionTree {
    fn compile(spec: TreeSpec) -> Result<Self, ModelError> {
        if spec.nodes.is_empty() {
            return Err(invalid("decision tree has no nodes"));
        }
        if spec.classes.is_empty() {
            return Err(invalid("decision tree has no classes"));
        }
        let n_nodes = spec.nodes.len();
        let n_classes = spec.classes.len();
        let nodes = spec
            .nodes
            .into_iter()
            .enumerate()
            .map(|(index, node)| match (node.left, node.right) {
                (Some(left), Some(right)) => {
                    let feature = node
                        .feature
                        .ok_or_else(|| invalid(format!("split node {index} has no feature")))?;
                    // children after parents keeps traversal finite
                    if left <= index || right <= index || left >= n_nodes || right >= n_nodes {
                        return Err(invalid(format!("node {index} has an invalid child index")));
                    }
                    Ok(Node::Split {
                        feature,
                        threshold: node.threshold,
                        left,
                        right,
                    })
                }
                (None, None) => {
                    let total: f64 = node.value.iter().sum();
                    if node.value.len() != n_classes || !(total > 0.0) {
                        return Err(invalid(format!(
                            "leaf {index} needs {n_classes} positive class counts"
                        )));
                    }
                    Ok(Node::Leaf(Array1::from(node.value) / total))
                }
                _ => Err(invalid(format!("node {index} has only one child"))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DecisionTree {
            nodes,
            classes: spec.classes,
        })
    }

    fn leaf(&self, x: ArrayView1<'_, f64>) -> Result<&Array1<f64>, ModelError> {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf(proba) => return Ok(proba),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = *x.get(*feature).ok_or(ModelError::DimensionMismatch {
                        expected: feature + 1,
                        found: x.len(),
                    })?;
                    index = if value <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

impl LabelModel for DecisionTree {
    fn n_features(&self) -> Option<usize> {
        None
    }

    fn predict_label(&self, x: ArrayView1<'_, f64>) -> Result<i64, ModelError> {
        Ok(most_probable(&self.classes, self.leaf(x)?))
    }

    fn meta_features(&self, x: ArrayView1<'_, f64>) -> Result<Vec<f64>, ModelError> {
        proba_meta_features(self, x)
    }
}

impl ProbabilisticModel for DecisionTree {
    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn predict_proba(&self, x: ArrayView1<'_, f64>) -> Result<Array1<f64>, ModelError> {
        self.leaf(x).cloned()
    }
}

#[derive(Debug, Clone)]
struct RandomForest {
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    fn compile(spec: ForestSpec) -> Result<Self, ModelError> {
        let trees = spec
            .trees
            .into_iter()
            .map(DecisionTree::compile)
            .collect::<Result<Vec<_>, _>>()?;
        let Some(first) = trees.first() else {
            return Err(invalid("random forest has no trees"));
        };
        if trees.iter().any(|t| t.classes != first.classes) {
            return Err(invalid("random forest trees disagree on classes"));
        }
        Ok(RandomForest { trees })
    }
}

impl LabelModel for RandomForest {
    fn n_features(&self) -> Option<usize> {
        None
    }

    fn predict_label(&self, x: ArrayView1<'_, f64>) -> Result<i64, ModelError> {
        Ok(most_probable(self.classes(), &self.predict_proba(x)?))
    }

    fn meta_features(&self, x: ArrayView1<'_, f64>) -> Result<Vec<f64>, ModelError> {
        proba_meta_features(self, x)
    }
}

impl ProbabilisticModel for RandomForest {
    fn classes(&self) -> &[i64] {
        &self.trees[0].classes
    }

    fn predict_proba(&self, x: ArrayView1<'_, f64>) -> Result<Array1<f64>, ModelError> {
        let mut sum: Array1<f64> = Array1::zeros(self.classes().len());
        for tree in &self.trees {
            sum += tree.leaf(x)?;
        }
        Ok(sum / self.trees.len() as f64)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Stacking
// ─────────────────────────────────────────────────────────────────────────────
#[derive(Debug)]
struct Stacking {
    estimators: Vec<Classifier>,
    final_estimator: Box<Classifier>,
    passthrough: bool,
}

impl Stacking {
    fn compile(spec: StackingSpec) -> Result<Self, ModelError> {
        if spec.estimators.is_empty() {
            return Err(invalid("stacking ensemble has no base estimators"));
        }
        let estimators = spec
            .estimators
            .into_iter()
            .map(Classifier::from_spec)
            .collect::<Result<Vec<_>, _>>()?;
        let final_estimator = Box::new(Classifier::from_spec(*spec.final_estimator)?);
        Ok(Stacking {
            estimators,
            final_estimator,
            passthrough: spec.passthrough,
        })
    }

    /// Base-model scores, optionally followed by the raw features.
    fn stacked(&self, x: ArrayView1<'_, f64>) -> Result<Array1<f64>, ModelError> {
        let mut meta = Vec::new();
        for estimator in &self.estimators {
            meta.extend(estimator.meta_features(x)?);
        }
        if self.passthrough {
            meta.extend(x.iter().copied());
        }
        Ok(Array1::from(meta))
    }
}

impl LabelModel for Stacking {
    fn n_features(&self) -> Option<usize> {
        self.estimators.iter().find_map(Classifier::n_features)
    }

    fn predict_label(&self, x: ArrayView1<'_, f64>) -> Result<i64, ModelError> {
        self.final_estimator.predict_label(self.stacked(x)?.view())
    }

    fn meta_features(&self, x: ArrayView1<'_, f64>) -> Result<Vec<f64>, ModelError> {
        self.final_estimator.meta_features(self.stacked(x)?.view())
    }
}

impl ProbabilisticModel for Stacking {
    fn classes(&self) -> &[i64] {
        match self.final_estimator.as_ref() {
            Classifier::Probabilistic(model) => model.classes(),
            Classifier::LabelOnly(_) => &[],
        }
    }

    fn predict_proba(&self, x: ArrayView1<'_, f64>) -> Result<Array1<f64>, ModelError> {
        match self.final_estimator.predict_proba(self.stacked(x)?.view()) {
            Some(proba) => proba,
            None => Err(invalid("final estimator has no probability estimates")),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Classifier
// ─────────────────────────────────────────────────────────────────────────────
/// A compiled classifier, split by whether it estimates probabilities.
#[derive(Debug)]
pub enum Classifier {
    /// Labels plus class probabilities.
    Probabilistic(Box<dyn ProbabilisticModel>),
    /// Labels only.
    LabelOnly(Box<dyn LabelModel>),
}

impl Classifier {
    /// Compile a model document.
    pub fn from_spec(spec: ModelSpec) -> Result<Self, ModelError> {
        Ok(match spec {
            ModelSpec::LogisticRegression(s) => {
                Classifier::Probabilistic(Box::new(LogisticRegression(LinearModel::compile(s)?)))
            }
            ModelSpec::LinearSvc(s) => {
                Classifier::LabelOnly(Box::new(LinearSvc(LinearModel::compile(s)?)))
            }
            ModelSpec::DecisionTree(s) => {
                Classifier::Probabilistic(Box::new(DecisionTree::compile(s)?))
            }
            ModelSpec::RandomForest(s) => {
                Classifier::Probabilistic(Box::new(RandomForest::compile(s)?))
            }
            ModelSpec::Stacking(s) => {
                let stack = Stacking::compile(s)?;
                if stack.final_estimator.is_probabilistic() {
                    Classifier::Probabilistic(Box::new(stack))
                } else {
                    Classifier::LabelOnly(Box::new(stack))
                }
            }
        })
    }

    /// Whether [`Classifier::predict_proba`] returns estimates.
    pub fn is_probabilistic(&self) -> bool {
        matches!(self, Classifier::Probabilistic(_))
    }

    /// Features the model expects, when it is fixed.
    pub fn n_features(&self) -> Option<usize> {
        match self {
            Classifier::Probabilistic(m) => m.n_features(),
            Classifier::LabelOnly(m) => m.n_features(),
        }
    }

    /// Raw class label for one sample.
    pub fn predict_label(&self, x: ArrayView1<'_, f64>) -> Result<i64, ModelError> {
        match self {
            Classifier::Probabilistic(m) => m.predict_label(x),
            Classifier::LabelOnly(m) => m.predict_label(x),
        }
    }

    /// Class probabilities, or `None` for label-only models.
    pub fn predict_proba(&self, x: ArrayView1<'_, f64>) -> Option<Result<Array1<f64>, ModelError>> {
        match self {
            Classifier::Probabilistic(m) => Some(m.predict_proba(x)),
            Classifier::LabelOnly(_) => None,
        }
    }

    fn meta_features(&self, x: ArrayView1<'_, f64>) -> Result<Vec<f64>, ModelError> {
        match self {
            Classifier::Probabilistic(m) => m.meta_features(x),
            Classifier::LabelOnly(m) => m.meta_features(x),
        }
    }
}

impl<D: Data<Elem = f64>> PredictInplace<ArrayBase<D, Ix2>, Array1<i64>> for Classifier {
    fn predict_inplace<'a>(&'a self, x: &'a ArrayBase<D, Ix2>, y: &mut Array1<i64>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );
        if let Some(n_features) = self.n_features() {
            assert_eq!(
                x.ncols(),
                n_features,
                "Number of data features must match the number of features the model was trained with."
            );
        }
        for (row, target) in x.rows().into_iter().zip(y.iter_mut()) {
            *target = self
                .predict_label(row)
                .unwrap_or_else(|err| panic!("prediction failed: {err}"));
        }
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<i64> {
        Array1::zeros(x.nrows())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Toxicity prediction
// ─────────────────────────────────────────────────────────────────────────────
/// The two output categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToxicityLabel {
    /// Raw prediction `1`.
    Toxic,
    /// Any other raw prediction.
    NonToxic,
}

impl ToxicityLabel {
    /// Map a raw class label.
    pub fn from_raw(raw: i64) -> Self {
        if raw == 1 {
            ToxicityLabel::Toxic
        } else {
            ToxicityLabel::NonToxic
        }
    }
}

impl fmt::Display for ToxicityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ToxicityLabel::Toxic => "Toxic",
            ToxicityLabel::NonToxic => "Non-Toxic",
        })
    }
}

/// Label plus the probability of the chosen class, when available.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Predicted category.
    pub label: ToxicityLabel,
    /// Largest class probability, in `[0, 1]`.
    pub confidence: Option<f64>,
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.confidence {
            Some(c) => write!(f, "Prediction: {} (Confidence: {:.2})", self.label, c),
            None => write!(f, "Prediction: {}", self.label),
        }
    }
}

/// Classify one preprocessed feature vector.
pub fn predict_toxicity(features: &Array1<f64>, model: &Classifier) -> Result<Prediction, ModelError> {
    let label = ToxicityLabel::from_raw(model.predict_label(features.view())?);
    let confidence = match model.predict_proba(features.view()) {
        Some(proba) => Some(proba?.fold(0.0_f64, |acc, &p| acc.max(p))),
        None => None,
    };
    Ok(Prediction { label, confidence })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use linfa::traits::Predict;
    use ndarray::{array, Array2};

    fn compile(json: &str) -> Classifier {
        Classifier::from_spec(serde_json::from_str(json).unwrap()).unwrap()
    }

    fn threshold_tree() -> &'static str {
        r#"{"kind": "decision_tree", "nodes": [
            {"feature": 0, "threshold": 0.5, "left": 1, "right": 2},
            {"value": [8, 2]},
            {"value": [1, 3]}
        ]}"#
    }

    #[test]
    fn single_leaf_tree_reports_majority_class() {
        let model = compile(r#"{"kind": "decision_tree", "nodes": [{"value": [9, 1]}]}"#);
        let p = predict_toxicity(&array![0.3, -1.2], &model).unwrap();
        assert_eq!(p.label, ToxicityLabel::NonToxic);
        assert_eq!(p.to_string(), "Prediction: Non-Toxic (Confidence: 0.90)");
    }

    #[test]
    fn tree_goes_left_on_equal_threshold() {
        let model = compile(threshold_tree());
        let left = model.predict_proba(array![0.5].view()).unwrap().unwrap();
        assert_relative_eq!(left[0], 0.8);
        let right = predict_toxicity(&array![0.6], &model).unwrap();
        assert_eq!(right.label, ToxicityLabel::Toxic);
        assert_relative_eq!(right.confidence.unwrap(), 0.75);
    }

    #[test]
    fn tree_reports_short_input() {
        let model = compile(threshold_tree());
        let empty = Array1::<f64>::zeros(0);
        assert!(matches!(
            model.predict_label(empty.view()),
            Err(ModelError::DimensionMismatch { expected: 1, found: 0 })
        ));
    }

    #[test]
    fn linear_svc_has_no_confidence() {
        let model = compile(r#"{"kind": "linear_svc", "coef": [1.0, 1.0], "intercept": -1.0}"#);
        assert!(!model.is_probabilistic());
        let p = predict_toxicity(&array![1.0, 1.0], &model).unwrap();
        assert_eq!(p.label, ToxicityLabel::Toxic);
        assert_eq!(p.confidence, None);
        assert_eq!(p.to_string(), "Prediction: Toxic");
    }

    #[test]
    fn logistic_regression_probabilities_sum_to_one() {
        let model = compile(r#"{"kind": "logistic_regression", "coef": [0.5], "intercept": -1.0}"#);
        let proba = model.predict_proba(array![2.0].view()).unwrap().unwrap();
        assert_relative_eq!(proba.sum(), 1.0);
        assert_relative_eq!(proba[1], 0.5);
        assert!(matches!(
            model.predict_label(array![1.0, 2.0].view()),
            Err(ModelError::DimensionMismatch { expected: 1, found: 2 })
        ));
    }

    #[test]
    fn forest_averages_trees() {
        let model = compile(
            r#"{"kind": "random_forest", "trees": [
                {"nodes": [{"value": [1, 0]}]},
                {"nodes": [{"value": [1, 3]}]}
            ]}"#,
        );
        let proba = model.predict_proba(array![0.0].view()).unwrap().unwrap();
        assert_relative_eq!(proba[0], 0.625);
        assert_relative_eq!(proba[1], 0.375);
    }

    #[test]
    fn stacking_feeds_base_scores_to_final_model() {
        let model = compile(&format!(
            r#"{{"kind": "stacking",
                "estimators": [
                    {},
                    {{"kind": "linear_svc", "coef": [2.0], "intercept": 0.0}}
                ],
                "final_estimator": {{"kind": "logistic_regression", "coef": [4.0, 1.0, 0.0], "intercept": -2.0}},
                "passthrough": true}}"#,
            threshold_tree()
        ));
        assert!(model.is_probabilistic());
        assert_eq!(model.n_features(), Some(1));
        // tree gives 0.75, svc gives 1.2, passthrough 0.6
        let z: f64 = 4.0 * 0.75 + 1.2 - 2.0;
        let proba = model.predict_proba(array![0.6].view()).unwrap().unwrap();
        assert_relative_eq!(proba[1], 1.0 / (1.0 + (-z).exp()), epsilon = 1e-12);
    }

    #[test]
    fn stacking_with_label_only_final_is_label_only() {
        let model = compile(
            r#"{"kind": "stacking",
                "estimators": [{"kind": "logistic_regression", "coef": [1.0]}],
                "final_estimator": {"kind": "linear_svc", "coef": [1.0], "intercept": -0.5}}"#,
        );
        assert!(!model.is_probabilistic());
        assert_eq!(model.predict_label(array![5.0].view()).unwrap(), 1);
    }

    #[test]
    fn inconsistent_documents_are_rejected() {
        let bad = [
            r#"{"kind": "decision_tree", "nodes": []}"#,
            r#"{"kind": "decision_tree", "nodes": [{"feature": 0, "left": 0, "right": 1}, {"value": [1, 1]}]}"#,
            r#"{"kind": "decision_tree", "nodes": [{"feature": 0, "left": 1}, {"value": [1, 1]}]}"#,
            r#"{"kind": "decision_tree", "nodes": [{"value": [0, 0]}]}"#,
            r#"{"kind": "linear_svc", "coef": []}"#,
            r#"{"kind": "logistic_regression", "coef": [1.0], "classes": [0, 1, 2]}"#,
            r#"{"kind": "random_forest", "trees": []}"#,
        ];
        for json in bad {
            let spec: ModelSpec = serde_json::from_str(json).unwrap();
            assert!(
                matches!(Classifier::from_spec(spec), Err(ModelError::InvalidModel(_))),
                "accepted {json}"
            );
        }
    }

    #[test]
    fn batch_prediction_through_linfa() {
        let model = compile(threshold_tree());
        let x = Array2::from_shape_vec((3, 1), vec![0.1, 0.9, 0.5]).unwrap();
        let labels: Array1<i64> = model.predict(&x);
        assert_eq!(labels, array![0, 1, 0]);
    }

    #[test]
    #[should_panic(expected = "Number of data features must match")]
    fn batch_prediction_rejects_wrong_width() {
        let model = compile(r#"{"kind": "logistic_regression", "coef": [1.0, 1.0], "intercept": 10.0}"#);
        let x = Array2::from_shape_vec((1, 3), vec![0.0, 0.0, 0.0]).unwrap();
        let _: Array1<i64> = model.predict(&x);
    }

    #[test]
    #[should_panic(expected = "prediction failed")]
    fn batch_prediction_panics_on_missing_tree_feature() {
        let model = compile(threshold_tree());
        let x = Array2::<f64>::zeros((2, 0));
        let _: Array1<i64> = model.predict(&x);
    }

    #[test]
    fn raw_labels_map_to_categories() {
        assert_eq!(ToxicityLabel::from_raw(1), ToxicityLabel::Toxic);
        assert_eq!(ToxicityLabel::from_raw(0), ToxicityLabel::NonToxic);
        assert_eq!(ToxicityLabel::from_raw(-1), ToxicityLabel::NonToxic);
        assert_eq!(ToxicityLabel::NonToxic.to_string(), "Non-Toxic");
    }
}
