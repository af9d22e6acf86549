//! Column-wise preprocessing: impute then scale a fixed set of columns,
//! pass every other column through unchanged.

use crate::error::{BaselineError, Result};
use super::{imputer::Imputer, scaler::Scaler};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Column transformer with a numeric sub-pipeline and a passthrough remainder.
///
/// Output layout is the transformed columns first (in the order given),
/// then the remainder in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnTransformer {
    columns: Vec<String>,
    imputer: Imputer,
    scaler: Scaler,
    remainder: Vec<String>,
    is_fitted: bool,
}

impl ColumnTransformer {
    /// Create an unfitted transformer that median-imputes and standardizes `columns`
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            imputer: Imputer::new(),
            scaler: Scaler::new(),
            remainder: Vec::new(),
            is_fitted: false,
        }
    }

    /// Learn fill values and scaling parameters from training data
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        let cols: Vec<&str> = self.columns.iter().map(|s| s.as_str()).collect();

        let imputed = self.imputer.fit_transform(df, &cols)?;
        self.scaler.fit(&imputed, &cols)?;

        self.remainder = df
            .get_column_names()
            .into_iter()
            .filter(|name| !self.columns.iter().any(|c| c.as_str() == name.as_str()))
            .map(|name| name.to_string())
            .collect();

        debug!(
            transformed = ?self.columns,
            n_passthrough = self.remainder.len(),
            "Fitted column transformer"
        );

        self.is_fitted = true;
        Ok(self)
    }

    /// Apply the fitted transformation and return a dense feature matrix
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(BaselineError::ModelNotFitted);
        }

        let imputed = self.imputer.transform(df)?;
        let scaled = self.scaler.transform(&imputed)?;

        columns_to_array2(&scaled, &self.feature_names())
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<Array2<f64>> {
        self.fit(df)?;
        self.transform(df)
    }

    /// Output column names, in matrix column order
    pub fn feature_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .chain(self.remainder.iter())
            .cloned()
            .collect()
    }

    /// Columns passed through unchanged (known after fit)
    pub fn passthrough_columns(&self) -> &[String] {
        &self.remainder
    }

    /// Fitted imputer
    pub fn imputer(&self) -> &Imputer {
        &self.imputer
    }

    /// Fitted scaler
    pub fn scaler(&self) -> &Scaler {
        &self.scaler
    }
}

/// Extract named columns from a DataFrame into a row-major `Array2<f64>`.
///
/// A null or NaN here means a missing or non-numeric value in a column that
/// no imputer covers, which the estimators cannot consume.
pub fn columns_to_array2(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|col_name| {
            let column = df
                .column(col_name)
                .map_err(|_| BaselineError::FeatureNotFound(col_name.clone()))?
                .cast(&DataType::Float64)?;
            let ca = column.f64()?;
            let n_missing = ca
                .into_iter()
                .filter(|v| v.map_or(true, f64::is_nan))
                .count();
            if n_missing > 0 {
                return Err(BaselineError::DataError(format!(
                    "column '{}' has {} missing or non-numeric values",
                    col_name, n_missing
                )));
            }
            Ok(ca.into_iter().flatten().collect())
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| col_refs[c][r]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        df!(
            "Time" => &[Some(0.0), Some(10.0), None, Some(30.0)],
            "V1" => &[1.0, 2.0, 3.0, 4.0],
            "Amount" => &[Some(100.0), None, Some(300.0), Some(500.0)]
        )
        .unwrap()
    }

    #[test]
    fn test_output_layout() {
        let mut ct = ColumnTransformer::new(&["Time", "Amount"]);
        let x = ct.fit_transform(&frame()).unwrap();

        assert_eq!(x.dim(), (4, 3));
        assert_eq!(ct.feature_names(), vec!["Time", "Amount", "V1"]);
        // Passthrough column is unchanged
        assert_eq!(x.column(2).to_vec(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_transformed_columns_are_standardized() {
        let mut ct = ColumnTransformer::new(&["Time", "Amount"]);
        let x = ct.fit_transform(&frame()).unwrap();

        for j in 0..2 {
            let col = x.column(j);
            let mean = col.sum() / col.len() as f64;
            let var = col.mapv(|v| (v - mean).powi(2)).sum() / col.len() as f64;
            assert!(mean.abs() < 1e-9, "column {} mean {}", j, mean);
            assert!((var - 1.0).abs() < 1e-9, "column {} var {}", j, var);
        }
        // Median of [0, 10, 30] fills the missing Time
        assert_eq!(ct.imputer().fill_value("Time"), Some(10.0));
    }

    #[test]
    fn test_null_in_passthrough_is_error() {
        let df = df!(
            "Time" => &[0.0, 1.0],
            "Amount" => &[1.0, 2.0],
            "V1" => &[Some(1.0), None]
        )
        .unwrap();
        let mut ct = ColumnTransformer::new(&["Time", "Amount"]);
        assert!(matches!(ct.fit_transform(&df), Err(BaselineError::DataError(_))));
    }

    #[test]
    fn test_nan_in_scaled_column_is_imputed() {
        let df = df!(
            "Time" => &[0.0, 1.0, 2.0, 3.0],
            "Amount" => &[2.0, f64::NAN, 4.0, 9.0]
        )
        .unwrap();
        let mut ct = ColumnTransformer::new(&["Time", "Amount"]);
        let x = ct.fit_transform(&df).unwrap();

        assert_eq!(ct.imputer().fill_value("Amount"), Some(4.0));
        let params = ct.scaler().params("Amount").unwrap();
        assert!(params.center.is_finite() && params.scale.is_finite());
        assert!(x.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_nan_in_passthrough_is_error() {
        let df = df!(
            "Time" => &[0.0, 1.0],
            "Amount" => &[1.0, 2.0],
            "V1" => &[f64::NAN, 1.0]
        )
        .unwrap();
        let mut ct = ColumnTransformer::new(&["Time", "Amount"]);
        assert!(matches!(ct.fit_transform(&df), Err(BaselineError::DataError(_))));
    }

    #[test]
    fn test_transform_before_fit() {
        let ct = ColumnTransformer::new(&["Time"]);
        assert!(matches!(ct.transform(&frame()), Err(BaselineError::ModelNotFitted)));
    }
}
