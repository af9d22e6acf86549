//! Data loading utilities

use crate::config::{DEFAULT_DATA_PATH, LABEL_COLUMN};
use crate::error::{BaselineError, Result};
use ndarray::Array1;
use polars::prelude::*;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Cell values read as missing, in addition to empty fields
pub const NA_VALUES: [&str; 15] = [
    "NaN", "nan", "-NaN", "-nan", "NA", "N/A", "n/a", "#N/A", "<NA>", "NULL", "null", "None",
    "#NA", "1.#IND", "1.#QNAN",
];

/// CSV loader for labeled transaction tables
pub struct DataLoader {
    /// Column that must be present
    label_column: String,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a new data loader expecting the default label column
    pub fn new() -> Self {
        Self {
            label_column: LABEL_COLUMN.to_string(),
        }
    }

    /// Set the required label column
    pub fn with_label_column(mut self, label: impl Into<String>) -> Self {
        self.label_column = label.into();
        self
    }

    /// Load a comma-separated file with a header row and check the label column.
    ///
    /// Empty fields and the tokens in [`NA_VALUES`] load as nulls.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let start = Instant::now();

        let null_values = NullValues::AllColumns(NA_VALUES.iter().map(|v| (*v).into()).collect());

        // Full scan: integer-looking prefixes of float columns otherwise fail to parse.
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None)
            .with_parse_options(CsvParseOptions::default().with_null_values(Some(null_values)))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;

        if df.get_column_index(&self.label_column).is_none() {
            return Err(BaselineError::MissingColumn(self.label_column.clone()));
        }

        info!(
            path = %path.display(),
            rows = df.height(),
            cols = df.width(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded dataset"
        );

        Ok(df)
    }
}

/// Load `path` (or the default location) with the default label column.
pub fn load_data(path: Option<&Path>) -> Result<DataFrame> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_DATA_PATH));
    DataLoader::new().load(path)
}

/// Separate the label column from the features.
///
/// Labels are read through a Float64 cast so `0`, `"0"` and `0.0` are all
/// accepted; they must be non-null integers.
pub fn split_features_and_labels(df: &DataFrame, label: &str) -> Result<(DataFrame, Array1<i64>)> {
    let column = df
        .column(label)
        .map_err(|_| BaselineError::MissingColumn(label.to_string()))?;

    let as_f64 = column.cast(&DataType::Float64)?;
    let labels = as_f64
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| match value {
            Some(v) if v.fract() == 0.0 => Ok(v as i64),
            Some(v) => Err(BaselineError::DataError(format!(
                "label '{}' has non-integer value {} at row {}",
                label, v, row
            ))),
            None => Err(BaselineError::DataError(format!(
                "label '{}' is missing or non-numeric at row {}",
                label, row
            ))),
        })
        .collect::<Result<Vec<i64>>>()?;

    let features = df.drop(label)?;

    let n_positive = labels.iter().filter(|&&y| y == 1).count();
    debug!(
        n_features = features.width(),
        n_rows = labels.len(),
        n_positive,
        "Separated features from labels"
    );

    Ok((features, Array1::from_vec(labels)))
}
