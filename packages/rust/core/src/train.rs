//! Engagement classifier training.
//!
//! Consumes the modeling-ready table and fits a binary classifier over
//! article titles: label = claps above the configured threshold. Titles
//! are hashed bag-of-words features; the model is a logistic regression
//! fit by gradient descent and serialized as JSON.
//!
//! The orchestrator only depends on the [`ModelTrainer`] trait so tests
//! can swap the collaborator out.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::info;

use storypulse_shared::{Result, StorypulseError, csv};

/// Hashed feature space dimension.
const FEATURE_DIM: usize = 4096;

/// Gradient descent passes over the training set.
const EPOCHS: usize = 40;

/// Learning rate.
const LEARNING_RATE: f64 = 0.3;

/// File name of the serialized classifier.
const MODEL_FILE: &str = "engagement_classifier.json";

/// Fits and serializes a classifier from a modeling-ready table.
pub trait ModelTrainer {
    fn train(&self, dataset: &Path) -> Result<TrainOutcome>;
}

/// Result of one training stage.
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    /// Location of the serialized classifier.
    pub model_path: PathBuf,
    /// Held-out evaluation metrics.
    pub metrics: Metrics,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Held-out evaluation metrics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Metrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Serialized classifier artifact.
#[derive(Debug, Serialize, Deserialize)]
pub struct EngagementModel {
    pub feature_dim: usize,
    pub weights: Vec<f64>,
    pub bias: f64,
    /// Clap threshold the labels were derived from.
    pub clap_threshold: i64,
}

impl EngagementModel {
    /// Score a title: (high-engagement prediction, probability).
    pub fn predict(&self, title: &str) -> (bool, f64) {
        let features = featurize(title, self.feature_dim);
        let mut z = self.bias;
        for &idx in &features {
            z += self.weights[idx];
        }
        let p = sigmoid(z);
        (p >= 0.5, p)
    }
}

/// Stock trainer: seeded shuffle/split, hashed bag-of-words logistic
/// regression over titles.
pub struct TitleClassifierTrainer {
    models_dir: PathBuf,
    clap_threshold: i64,
    test_fraction: f64,
    seed: u64,
}

impl TitleClassifierTrainer {
    pub fn new(
        models_dir: impl Into<PathBuf>,
        clap_threshold: i64,
        test_fraction: f64,
        seed: u64,
    ) -> Self {
        Self {
            models_dir: models_dir.into(),
            clap_threshold,
            test_fraction,
            seed,
        }
    }

    fn read_dataset(&self, dataset: &Path) -> Result<Vec<(String, bool)>> {
        let content =
            std::fs::read_to_string(dataset).map_err(|e| StorypulseError::io(dataset, e))?;

        let mut examples = Vec::new();
        for line in content.lines().skip(1) {
            if line.is_empty() {
                continue;
            }
            let fields = csv::split_line(line);
            if fields.len() < 3 {
                continue;
            }
            let claps: i64 = fields[2].parse().unwrap_or(0);
            examples.push((fields[1].clone(), claps > self.clap_threshold));
        }
        Ok(examples)
    }
}

impl ModelTrainer for TitleClassifierTrainer {
    fn train(&self, dataset: &Path) -> Result<TrainOutcome> {
        let mut examples = self.read_dataset(dataset)?;
        if examples.len() < 4 {
            return Err(StorypulseError::validation(format!(
                "dataset too small to train on ({} rows)",
                examples.len()
            )));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        examples.shuffle(&mut rng);

        let test_len = ((examples.len() as f64 * self.test_fraction).round() as usize)
            .clamp(1, examples.len() - 1);
        let (test, train) = examples.split_at(test_len);

        // Logistic regression, per-example gradient updates.
        let mut weights = vec![0.0f64; FEATURE_DIM];
        let mut bias = 0.0f64;

        for _ in 0..EPOCHS {
            for (title, label) in train {
                let features = featurize(title, FEATURE_DIM);
                let mut z = bias;
                for &idx in &features {
                    z += weights[idx];
                }
                let gradient = sigmoid(z) - if *label { 1.0 } else { 0.0 };
                for &idx in &features {
                    weights[idx] -= LEARNING_RATE * gradient;
                }
                bias -= LEARNING_RATE * gradient;
            }
        }

        let model = EngagementModel {
            feature_dim: FEATURE_DIM,
            weights,
            bias,
            clap_threshold: self.clap_threshold,
        };

        let metrics = evaluate(&model, test);
        info!(
            accuracy = metrics.accuracy,
            precision = metrics.precision,
            recall = metrics.recall,
            f1 = metrics.f1,
            train_rows = train.len(),
            test_rows = test.len(),
            "model evaluation"
        );

        std::fs::create_dir_all(&self.models_dir)
            .map_err(|e| StorypulseError::io(&self.models_dir, e))?;
        let model_path = self.models_dir.join(MODEL_FILE);
        let json = serde_json::to_string(&model)
            .map_err(|e| StorypulseError::validation(format!("model serialization: {e}")))?;
        std::fs::write(&model_path, json).map_err(|e| StorypulseError::io(&model_path, e))?;

        info!(path = %model_path.display(), "model saved");

        Ok(TrainOutcome {
            model_path,
            metrics,
            train_rows: train.len(),
            test_rows: test.len(),
        })
    }
}

/// Hashed bag-of-words indices for a title: lowercased, punctuation
/// stripped, one index per token occurrence.
fn featurize(title: &str, dim: usize) -> Vec<usize> {
    title
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|token| {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            (hasher.finish() as usize) % dim
        })
        .collect()
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn evaluate(model: &EngagementModel, test: &[(String, bool)]) -> Metrics {
    let (mut tp, mut fp, mut tn, mut fn_) = (0usize, 0usize, 0usize, 0usize);
    for (title, label) in test {
        let (pred, _) = model.predict(title);
        match (pred, *label) {
            (true, true) => tp += 1,
            (true, false) => fp += 1,
            (false, false) => tn += 1,
            (false, true) => fn_ += 1,
        }
    }

    let ratio = |num: usize, den: usize| {
        if den == 0 { 0.0 } else { num as f64 / den as f64 }
    };
    let accuracy = ratio(tp + tn, test.len());
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1 = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };

    Metrics {
        accuracy,
        precision,
        recall,
        f1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_dataset(dir: &Path, rows: &[(&str, i64)]) -> PathBuf {
        let path = dir.join("articles_processed.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "date,title,claps,responses,author_name,reading_time_mins").unwrap();
        for (title, claps) in rows {
            writeln!(f, "01/01/2024,{title},{claps},1,jdoe,4").unwrap();
        }
        path
    }

    /// Dataset with a perfectly separable vocabulary so the fit converges.
    fn separable_rows() -> Vec<(&'static str, i64)> {
        let mut rows = Vec::new();
        for _ in 0..10 {
            rows.push(("viral growth hacking secrets", 2000));
            rows.push(("explosive startup success story", 1500));
            rows.push(("boring quarterly meeting notes", 3));
            rows.push(("mundane status update report", 7));
        }
        rows
    }

    #[test]
    fn training_learns_separable_titles() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = write_dataset(dir.path(), &separable_rows());

        let trainer = TitleClassifierTrainer::new(dir.path().join("models"), 500, 0.2, 42);
        let outcome = trainer.train(&dataset).expect("train");

        assert!(outcome.model_path.exists());
        assert!(outcome.metrics.accuracy > 0.9, "{:?}", outcome.metrics);
        assert!(outcome.test_rows >= 1);

        // The serialized artifact round-trips and predicts sensibly.
        let json = std::fs::read_to_string(&outcome.model_path).unwrap();
        let model: EngagementModel = serde_json::from_str(&json).unwrap();
        let (high, p_high) = model.predict("viral growth hacking secrets");
        let (low, p_low) = model.predict("boring quarterly meeting notes");
        assert!(high);
        assert!(!low);
        assert!(p_high > p_low);
    }

    #[test]
    fn split_is_deterministic_for_a_seed() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = write_dataset(dir.path(), &separable_rows());

        let trainer = TitleClassifierTrainer::new(dir.path().join("m1"), 500, 0.25, 7);
        let a = trainer.train(&dataset).unwrap();
        let trainer = TitleClassifierTrainer::new(dir.path().join("m2"), 500, 0.25, 7);
        let b = trainer.train(&dataset).unwrap();

        assert_eq!(a.metrics.accuracy, b.metrics.accuracy);
        assert_eq!(a.test_rows, b.test_rows);
    }

    #[test]
    fn tiny_dataset_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = write_dataset(dir.path(), &[("only one", 10)]);
        let trainer = TitleClassifierTrainer::new(dir.path(), 500, 0.2, 42);
        let err = trainer.train(&dataset).expect_err("too small");
        assert!(err.to_string().contains("too small"));
    }

    #[test]
    fn featurize_is_stable_and_bounded() {
        let a = featurize("Rust, Rust & more rust!", 64);
        assert_eq!(a.len(), 4);
        assert!(a.iter().all(|&i| i < 64));
        // Same token hashes to the same slot.
        assert_eq!(a[0], a[1]);
        assert_eq!(a[0], a[3]);
    }
}
