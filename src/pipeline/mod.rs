//! Fit/predict pipeline: preprocess -> optional SMOTE -> classify
//!
//! The resampling stage only runs inside `fit`. Prediction goes straight
//! from the fitted preprocessor to the classifier.

mod runner;

pub use runner::{run, ModelRun};

use crate::config::POSITIVE_LABEL;
use crate::error::{BaselineError, Result};
use crate::preprocessing::ColumnTransformer;
use crate::synthetic::{class_counts, Sampler, Smote};
use crate::training::Classifier;
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info};

/// A preprocessor, an optional training-only resampler and a classifier
pub struct Pipeline {
    preprocessor: ColumnTransformer,
    resampler: Option<Smote>,
    classifier: Box<dyn Classifier>,
    training_class_counts: BTreeMap<i64, usize>,
    is_fitted: bool,
}

impl Pipeline {
    /// Pipeline without resampling
    pub fn new(preprocessor: ColumnTransformer, classifier: Box<dyn Classifier>) -> Self {
        Self {
            preprocessor,
            resampler: None,
            classifier,
            training_class_counts: BTreeMap::new(),
            is_fitted: false,
        }
    }

    /// Insert a SMOTE stage between preprocessing and the classifier
    pub fn with_resampler(mut self, smote: Smote) -> Self {
        self.resampler = Some(smote);
        self
    }

    /// Whether a resampling stage is present
    pub fn uses_resampling(&self) -> bool {
        self.resampler.is_some()
    }

    /// Class counts of the rows the classifier was trained on, after any
    /// resampling
    pub fn training_class_counts(&self) -> &BTreeMap<i64, usize> {
        &self.training_class_counts
    }

    /// Fit every stage on the training frame
    pub fn fit(&mut self, df: &DataFrame, y: &Array1<i64>) -> Result<&mut Self> {
        if df.height() != y.len() {
            return Err(BaselineError::ShapeError {
                expected: format!("{} labels", df.height()),
                actual: format!("{} labels", y.len()),
            });
        }

        let start = Instant::now();
        let x = self.preprocessor.fit_transform(df)?;

        let (x_train, y_train) = match self.resampler.as_mut() {
            Some(smote) => {
                let resampled = smote.fit_resample(&x, y)?;
                (resampled.x, resampled.y)
            }
            None => (x, y.clone()),
        };

        self.training_class_counts = class_counts(&y_train);
        debug!(
            rows = x_train.nrows(),
            features = x_train.ncols(),
            class_counts = ?self.training_class_counts,
            "Training classifier"
        );

        self.classifier.fit(&x_train, &y_train)?;
        self.is_fitted = true;

        info!(
            model = self.classifier.name(),
            smote = self.uses_resampling(),
            elapsed_secs = start.elapsed().as_secs_f64(),
            "Fitted pipeline"
        );
        Ok(self)
    }

    fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(BaselineError::ModelNotFitted);
        }
        self.preprocessor.transform(df)
    }

    /// Hard class predictions
    pub fn predict(&self, df: &DataFrame) -> Result<Array1<i64>> {
        self.classifier.predict(&self.transform(df)?)
    }

    /// Class probabilities, columns ordered as `classes()`
    pub fn predict_proba(&self, df: &DataFrame) -> Result<Array2<f64>> {
        self.classifier.predict_proba(&self.transform(df)?)
    }

    /// Probability of the fraud class for each row
    pub fn predict_positive_proba(&self, df: &DataFrame) -> Result<Array1<f64>> {
        self.classifier.positive_proba(&self.transform(df)?, POSITIVE_LABEL)
    }

    /// Classes seen by the classifier
    pub fn classes(&self) -> &[i64] {
        self.classifier.classes()
    }
}
