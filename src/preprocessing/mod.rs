//! Data preprocessing module
//!
//! Turns a raw [`Dataset`](crate::data::Dataset) into a normalized feature matrix:
//! - Mean imputation of unknown measurements
//! - IQR clipping of one skew-prone feature
//! - Min-max scaling to `[0, 1]`
//!
//! The fitted [`MinMaxScaler`] is kept and reused unchanged at inference.

mod config;
mod imputer;
mod preparer;
mod scaler;
pub mod outlier;

pub use config::PreprocessingConfig;
pub use imputer::{ImputedFeature, MeanImputer};
pub use outlier::{IqrClipper, OutlierBounds};
pub use preparer::{ClipSummary, FeaturePreparer, PreparationReport, PreparedData};
pub use scaler::MinMaxScaler;
