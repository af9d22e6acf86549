//! End-to-end tests: CSV on disk through both models to the printed reports

use fraud_baseline::cli::{render_run, Cli};
use fraud_baseline::config::BaselineConfig;
use fraud_baseline::pipeline::{run, ModelRun};
use clap::Parser;
use std::io::Write;
use tempfile::NamedTempFile;

/// 1000 rows, 50 of them fraud, with the two scaled columns and a few
/// passthrough features
fn fraud_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Time,V1,V2,V3,Amount,Class").unwrap();
    for i in 0..1000 {
        let fraud = i % 20 == 7;
        let jitter = ((i * 37) % 101) as f64 / 101.0;
        let (v1, v2, v3, amount) = if fraud {
            (-3.0 + jitter, 2.5 - jitter, 1.0 + jitter, 150.0 + (i % 90) as f64)
        } else {
            (0.5 * jitter, -0.5 * jitter, jitter - 0.5, ((i * 13) % 120) as f64)
        };
        writeln!(
            file,
            "{},{},{},{},{},{}",
            i * 60,
            v1,
            v2,
            v3,
            amount,
            fraud as i32
        )
        .unwrap();
    }
    file
}

/// 950 legit and 50 fraud rows with only `Time` and `Amount` as features.
/// Every `missing_every`-th row (if any) gets an empty `Time` and a `NaN`
/// `Amount`.
fn two_column_csv(missing_every: Option<usize>) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Time,Amount,Class").unwrap();
    for i in 0..1000 {
        let fraud = i % 20 == 3;
        let amount = if fraud {
            format!("{}", 180.0 + (i % 70) as f64 + 0.5)
        } else {
            format!("{}", ((i * 13) % 140) as f64 + 0.25)
        };
        let missing = missing_every.map_or(false, |k| i % k == 0 && !fraud);
        if missing {
            writeln!(file, ",NaN,{}", fraud as i32).unwrap();
        } else {
            writeln!(file, "{},{},{}", i * 60, amount, fraud as i32).unwrap();
        }
    }
    file
}

fn config_for(file: &NamedTempFile) -> BaselineConfig {
    BaselineConfig::new()
        .with_data_path(file.path())
        .with_forest_n_estimators(20)
}

fn assert_block(text: &str, name: &str, smote: &str) {
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "");
    assert_eq!(lines[1], format!("=== {} (SMOTE={}) ===", name, smote));
    assert!(lines[2].starts_with("ROC-AUC : "));
    assert!(lines[3].starts_with("PR  AUC: "));
    assert!(lines.iter().any(|l| l.trim_start().starts_with("0 ")));
    assert!(lines.iter().any(|l| l.trim_start().starts_with("1 ")));
    assert!(lines.iter().any(|l| l.trim_start().starts_with("accuracy")));
    assert!(lines.iter().any(|l| l.trim_start().starts_with("weighted avg")));
}

// ============================================================================
// Without resampling
// ============================================================================

#[test]
fn test_two_blocks_without_smote() {
    let file = fraud_csv();
    let runs = run(&config_for(&file), false).unwrap();
    assert_eq!(runs.len(), 2);

    assert_block(&render_run(&runs[0], false), "LogReg", "False");
    assert_block(&render_run(&runs[1], false), "RandForest", "False");

    for r in &runs {
        // 20% of 1000 rows, stratified: 10 fraud rows held out
        assert_eq!(r.report.summary.support, 200);
        let fraud_support = r.report.summary.classes.iter().find(|c| c.label == 1).unwrap().support;
        assert_eq!(fraud_support, 10);

        assert!((0.0..=1.0).contains(&r.report.roc_auc));
        assert!((0.0..=1.0).contains(&r.report.average_precision));
        assert!(r.report.roc_auc > 0.9, "{} roc_auc {}", r.name, r.report.roc_auc);

        assert_eq!(r.training_class_counts[&0], 760);
        assert_eq!(r.training_class_counts[&1], 40);
    }
}

#[test]
fn test_two_feature_table_with_default_models() {
    let file = two_column_csv(None);
    let config = BaselineConfig::new().with_data_path(file.path());
    assert_eq!(config.forest_n_estimators, 300);

    let runs = run(&config, false).unwrap();
    assert_eq!(runs.len(), 2);

    let text: String = runs.iter().map(|r| render_run(r, false)).collect::<Vec<_>>().join("\n");
    assert_eq!(text.matches("ROC-AUC").count(), 2);
    assert_eq!(text.matches("PR  AUC").count(), 2);

    assert_block(&render_run(&runs[0], false), "LogReg", "False");
    assert_block(&render_run(&runs[1], false), "RandForest", "False");
    for r in &runs {
        assert!(r.report.roc_auc > 0.9, "{} roc_auc {}", r.name, r.report.roc_auc);
    }
}

#[test]
fn test_missing_values_are_imputed() {
    // 1 in 25 legit rows has an empty Time and a NaN Amount
    let file = two_column_csv(Some(25));

    for use_smote in [false, true] {
        let runs = run(&config_for(&file), use_smote).unwrap();
        for r in &runs {
            assert!(r.report.roc_auc.is_finite() && r.report.average_precision.is_finite());
            assert!(r.report.roc_auc > 0.9, "{} roc_auc {}", r.name, r.report.roc_auc);
            assert!(r.report.summary.accuracy > 0.5, "{} accuracy {}", r.name, r.report.summary.accuracy);
        }
    }
}

#[test]
fn test_repeated_runs_are_identical() {
    let file = fraud_csv();
    let config = config_for(&file);
    let first: Vec<String> = run(&config, false).unwrap().iter().map(|r| r.to_string()).collect();
    let second: Vec<String> = run(&config, false).unwrap().iter().map(|r| r.to_string()).collect();
    assert_eq!(first, second);
}

// ============================================================================
// With resampling
// ============================================================================

#[test]
fn test_smote_changes_training_only() {
    let file = fraud_csv();
    let runs = run(&config_for(&file), true).unwrap();

    assert_block(&render_run(&runs[0], false), "LogReg", "True");
    assert_block(&render_run(&runs[1], false), "RandForest", "True");

    for r in &runs {
        assert!(r.smote);
        // floor(0.2 * 760) fraud rows after oversampling
        assert_eq!(r.training_class_counts[&0], 760);
        assert_eq!(r.training_class_counts[&1], 152);

        let total: usize = r.training_class_counts.values().sum();
        let share = r.training_class_counts[&1] as f64 / total as f64;
        assert!((share - 0.2 / 1.2).abs() < 0.005);

        // Held-out split untouched
        assert_eq!(r.report.summary.support, 200);
    }
}

// ============================================================================
// Failure and serialization
// ============================================================================

#[test]
fn test_missing_file_fails_before_any_output() {
    let config = BaselineConfig::new().with_data_path("/no/such/creditcard.csv");
    assert!(run(&config, false).is_err());

    let cli = Cli::parse_from(["fraud-baseline", "--data", "/no/such/creditcard.csv"]);
    assert!(fraud_baseline::cli::cmd_run(&cli).is_err());
}

#[test]
fn test_model_run_json() {
    let file = fraud_csv();
    let runs = run(&config_for(&file), false).unwrap();

    let json = serde_json::to_string(&runs[0]).unwrap();
    let back: ModelRun = serde_json::from_str(&json).unwrap();
    assert_eq!(back.name, "LogReg");
    assert_eq!(back.training_class_counts, runs[0].training_class_counts);
    assert!((back.report.roc_auc - runs[0].report.roc_auc).abs() < 1e-12);
}
