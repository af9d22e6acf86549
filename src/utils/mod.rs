//! Utility functions and types

pub mod data_loader;

pub use data_loader::{load_data, split_features_and_labels, DataLoader};
