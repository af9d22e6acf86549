//! Integration tests for classifiers, resampling and evaluation

use fraud_baseline::evaluation::evaluate;
use fraud_baseline::synthetic::{class_counts, Sampler, Smote};
use fraud_baseline::training::{
    default_models, make_logistic_regression, Classifier, RandomForest,
};
use fraud_baseline::config::BaselineConfig;
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Two Gaussian-ish blobs with a 9:1 imbalance
fn imbalanced_blobs(n: usize, seed: u64) -> (Array2<f64>, Array1<i64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut x = Array2::zeros((n, 4));
    let mut y = Array1::zeros(n);
    for i in 0..n {
        let positive = i % 10 == 0;
        let shift = if positive { 2.0 } else { 0.0 };
        for j in 0..4 {
            x[[i, j]] = shift + rng.gen_range(-1.0..1.0);
        }
        y[i] = positive as i64;
    }
    (x, y)
}

// ============================================================================
// Classifiers
// ============================================================================

#[test]
fn test_both_default_models_rank_well() {
    let (x_train, y_train) = imbalanced_blobs(400, 1);
    let (x_test, y_test) = imbalanced_blobs(200, 2);
    let config = BaselineConfig::default().with_forest_n_estimators(25);

    for (name, kind) in default_models(&config) {
        let mut model = kind.build();
        model.fit(&x_train, &y_train).unwrap();

        let proba = model.positive_proba(&x_test, 1).unwrap();
        let pred = model.predict(&x_test).unwrap();
        let report = evaluate(&y_test, &pred, &proba).unwrap();

        assert!(report.roc_auc > 0.95, "{} roc_auc {}", name, report.roc_auc);
        assert!(report.average_precision > 0.7, "{} ap {}", name, report.average_precision);
    }
}

#[test]
fn test_balanced_logreg_recalls_minority() {
    let (x, y) = imbalanced_blobs(500, 3);
    let mut model = make_logistic_regression();
    model.fit(&x, &y).unwrap();

    let pred = model.predict(&x).unwrap();
    let positives = y.iter().filter(|&&v| v == 1).count();
    let caught = pred.iter().zip(y.iter()).filter(|(&p, &t)| p == 1 && t == 1).count();
    assert!(caught as f64 / positives as f64 > 0.8);
}

#[test]
fn test_forest_is_reproducible() {
    let (x, y) = imbalanced_blobs(150, 4);
    let fit = || {
        let mut rf = RandomForest::new_classifier(12)
            .with_balanced_subsample(true)
            .with_random_state(42);
        rf.fit(&x, &y).unwrap();
        rf.predict_proba(&x).unwrap()
    };
    assert_eq!(fit(), fit());
}

// ============================================================================
// Resampling
// ============================================================================

#[test]
fn test_smote_ratio_on_training_data() {
    let (x, y) = imbalanced_blobs(1000, 5);
    let mut smote = Smote::new()
        .with_sampling_strategy(0.2)
        .with_k_neighbors(5)
        .with_seed(42);

    // 900 negatives, 100 positives: target floor(0.2 * 900) = 180
    let result = smote.fit_resample(&x, &y).unwrap();
    let counts = class_counts(&result.y);
    assert_eq!(counts[&0], 900);
    assert_eq!(counts[&1], 180);

    let share = counts[&1] as f64 / result.y.len() as f64;
    assert!((share - 0.2 / 1.2).abs() < 0.01);
}

// ============================================================================
// Evaluation
// ============================================================================

#[test]
fn test_perfect_classifier_scores_one() {
    let y = Array1::from_vec(vec![0i64, 0, 1, 0, 1, 0, 0, 1]);
    let proba = y.mapv(|v| v as f64);
    let report = evaluate(&y, &y, &proba).unwrap();

    assert_eq!(report.roc_auc, 1.0);
    assert_eq!(report.average_precision, 1.0);
}

#[test]
fn test_majority_only_classifier_has_zero_minority_recall() {
    let y = Array1::from_vec(vec![0i64, 0, 0, 0, 1, 0, 0, 1]);
    let pred = Array1::zeros(y.len());
    let proba = Array1::from_elem(y.len(), 0.1);
    let report = evaluate(&y, &pred, &proba).unwrap();

    assert_eq!(report.recall_of(1), Some(0.0));
    assert_eq!(report.recall_of(0), Some(1.0));
    let text = report.to_string();
    assert!(text.contains("           1     0.0000    0.0000    0.0000         2"));
}
