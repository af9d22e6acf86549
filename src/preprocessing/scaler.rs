//! Feature scaling

use crate::error::{BaselineError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Parameters for a fitted column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    /// Column mean
    pub center: f64,
    /// Population std, 1.0 for constant columns
    pub scale: f64,
}

/// Standard scaler: (x - mean) / std
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scaler {
    params: Vec<(String, ScalerParams)>,
    is_fitted: bool,
}

impl Scaler {
    /// Create an unfitted scaler
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit the scaler to the given columns. Nulls are ignored.
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        self.params.clear();

        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| BaselineError::FeatureNotFound(col_name.to_string()))?
                .cast(&DataType::Float64)?;

            let params = compute_params(column.f64()?);
            self.params.push((col_name.to_string(), params));
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Scale the fitted columns, leaving all others untouched
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(BaselineError::ModelNotFitted);
        }

        let mut result = df.clone();
        for (col_name, params) in &self.params {
            let column = df
                .column(col_name)
                .map_err(|_| BaselineError::FeatureNotFound(col_name.clone()))?
                .cast(&DataType::Float64)?;

            let scaled: Float64Chunked = column
                .f64()?
                .into_iter()
                .map(|opt| opt.map(|v| (v - params.center) / params.scale))
                .collect();

            result.with_column(scaled.with_name(column.name().clone()).into_series())?;
        }

        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Fitted parameters for a column
    pub fn params(&self, column: &str) -> Option<ScalerParams> {
        self.params
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, p)| *p)
    }
}

fn compute_params(ca: &Float64Chunked) -> ScalerParams {
    let values: Vec<f64> = ca.into_iter().flatten().collect();
    if values.is_empty() {
        return ScalerParams { center: 0.0, scale: 1.0 };
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    // Population variance (ddof = 0)
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std = var.sqrt();
    ScalerParams {
        center: mean,
        scale: if std == 0.0 { 1.0 } else { std },
    }
}
