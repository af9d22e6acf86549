//! Missing value imputation

use crate::error::{BaselineError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Median imputer for numeric columns. Fill values are learned at fit time.
///
/// Both nulls and NaN count as missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Imputer {
    fill_values: Vec<(String, f64)>,
    is_fitted: bool,
}

/// Null or NaN becomes `None`
fn observed(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

impl Imputer {
    /// Create an unfitted median imputer
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit the imputer to the given columns
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        self.fill_values.clear();

        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| BaselineError::FeatureNotFound(col_name.to_string()))?
                .cast(&DataType::Float64)?;

            let fill_value = self.compute_fill_value(col_name, column.f64()?)?;
            self.fill_values.push((col_name.to_string(), fill_value));
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Replace missing values in the fitted columns
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(BaselineError::ModelNotFitted);
        }

        let mut result = df.clone();

        for (col_name, fill_value) in &self.fill_values {
            let column = df
                .column(col_name)
                .map_err(|_| BaselineError::FeatureNotFound(col_name.clone()))?
                .cast(&DataType::Float64)?;

            let filled: Float64Chunked = column
                .f64()?
                .into_iter()
                .map(|opt| Some(observed(opt).unwrap_or(*fill_value)))
                .collect();

            result.with_column(filled.with_name(column.name().clone()).into_series())?;
        }

        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Learned fill value for a column
    pub fn fill_value(&self, column: &str) -> Option<f64> {
        self.fill_values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| *v)
    }

    fn compute_fill_value(&self, col_name: &str, ca: &Float64Chunked) -> Result<f64> {
        let present: Float64Chunked = ca.into_iter().map(observed).collect();

        present.median().ok_or_else(|| {
            BaselineError::PreprocessingError(format!(
                "column '{}' has no observed values to impute from",
                col_name
            ))
        })
    }
}
