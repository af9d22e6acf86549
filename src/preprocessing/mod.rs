//! Data preprocessing module
//!
//! - Median imputation of missing values (null or NaN)
//! - Standard scaling
//! - A column transformer that applies both to selected columns and passes
//!   the rest through

mod column_transformer;
mod imputer;
mod scaler;

pub use column_transformer::{columns_to_array2, ColumnTransformer};
pub use imputer::Imputer;
pub use scaler::{Scaler, ScalerParams};

use crate::config::SCALED_COLUMNS;

/// Build the unfitted preprocessing stage: median-impute then standardize
/// `Time` and `Amount`; all other columns pass through.
pub fn build_preprocessor() -> ColumnTransformer {
    ColumnTransformer::new(&SCALED_COLUMNS)
}

/// Same stage for an explicit set of scaled columns
pub fn build_preprocessor_for(columns: &[String]) -> ColumnTransformer {
    let cols: Vec<&str> = columns.iter().map(|c| c.as_str()).collect();
    ColumnTransformer::new(&cols)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_build_preprocessor_targets_time_and_amount() {
        let df = df!(
            "Time" => &[0.0, 2.0, 4.0],
            "V1" => &[0.5, -0.5, 0.0],
            "V2" => &[1.0, 1.0, 1.0],
            "Amount" => &[1.0, 1.0, 4.0]
        )
        .unwrap();

        let mut pre = build_preprocessor();
        let x = pre.fit_transform(&df).unwrap();

        assert_eq!(pre.feature_names(), vec!["Time", "Amount", "V1", "V2"]);
        assert_eq!(pre.passthrough_columns(), &["V1".to_string(), "V2".to_string()]);
        assert_eq!(x.column(2).to_vec(), vec![0.5, -0.5, 0.0]);
    }

    #[test]
    fn test_build_preprocessor_for_custom_columns() {
        let df = df!("a" => &[1.0, 3.0], "b" => &[7.0, 8.0]).unwrap();
        let mut pre = build_preprocessor_for(&["b".to_string()]);
        let x = pre.fit_transform(&df).unwrap();
        assert_eq!(pre.feature_names(), vec!["b", "a"]);
        assert_eq!(x.column(0).to_vec(), vec![-1.0, 1.0]);
    }

    #[test]
    fn test_build_preprocessor_is_fresh_each_call() {
        let a = build_preprocessor();
        let b = build_preprocessor();
        assert!(a.passthrough_columns().is_empty());
        assert!(b.passthrough_columns().is_empty());
    }
}
