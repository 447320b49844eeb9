//! Inference service
//!
//! [`DiagnosisEngine`] loads a trained artifact set once and serves
//! diagnoses and recommendations from it without further mutation.

mod engine;
mod recommendation;

pub use engine::{BatchSummary, DiagnosisEngine, DiagnosisResult};
pub use recommendation::{advice_for, Recommendation, BENIGN_ADVICE, MALIGNANT_ADVICE};
