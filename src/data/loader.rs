//! CSV loading for cytology records

use super::{Dataset, Sample, FEATURE_NAMES, LABEL_COLUMN};
use crate::error::{CytodxError, Result};
use csv::StringRecord;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Reads header-bearing CSV files into [`Dataset`]s
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    /// Token recorded as an unknown value
    missing_marker: String,
    /// Feature columns to read, in order
    feature_columns: Vec<String>,
    label_column: String,
    delimiter: u8,
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetLoader {
    pub fn new() -> Self {
        Self {
            missing_marker: "?".to_string(),
            feature_columns: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            label_column: LABEL_COLUMN.to_string(),
            delimiter: b',',
        }
    }

    pub fn with_missing_marker(mut self, marker: impl Into<String>) -> Self {
        self.missing_marker = marker.into();
        self
    }

    pub fn with_feature_columns(mut self, columns: Vec<String>) -> Self {
        self.feature_columns = columns;
        self
    }

    pub fn with_label_column(mut self, column: impl Into<String>) -> Self {
        self.label_column = column.into();
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Load a labelled dataset from disk, dropping exact duplicate rows
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Dataset> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            CytodxError::DataError(format!("failed to open {}: {}", path.display(), e))
        })?;
        let dataset = self.load_from_reader(file)?;
        info!(path = %path.display(), rows = dataset.n_samples(), "loaded dataset");
        Ok(dataset)
    }

    /// Load a labelled dataset from any reader, dropping exact duplicate rows
    pub fn load_from_reader<R: Read>(&self, reader: R) -> Result<Dataset> {
        let mut reader = self.reader_builder().from_reader(reader);
        let headers = reader.headers()?.clone();

        let label_idx = find_column(&headers, &self.label_column).ok_or_else(|| {
            CytodxError::TrainingDataError(format!("missing label column '{}'", self.label_column))
        })?;
        let feature_indices = self.feature_indices(&headers)?;

        let mut samples = Vec::new();
        for (row_idx, record) in reader.records().enumerate() {
            let record = record?;
            let line = row_idx + 2;

            let raw_label = record.get(label_idx).unwrap_or_default().trim();
            let label = parse_label(raw_label).ok_or_else(|| {
                CytodxError::DataError(format!("invalid label '{}' on line {}", raw_label, line))
            })?;

            let features = feature_indices
                .iter()
                .map(|&idx| self.parse_cell(record.get(idx).unwrap_or_default(), line))
                .collect::<Result<Vec<_>>>()?;

            samples.push(Sample::new(features, label));
        }

        if samples.is_empty() {
            return Err(CytodxError::TrainingDataError("dataset contains no rows".to_string()));
        }

        let raw = Dataset::new(self.feature_columns.clone(), samples)?;
        let dataset = raw.deduplicated();
        let dropped = raw.n_samples() - dataset.n_samples();
        if dropped > 0 {
            info!(dropped, "removed duplicate rows");
        }
        Ok(dataset)
    }

    /// Load unlabelled feature vectors (for batch scoring).
    ///
    /// A label column is ignored when present; unknown markers are rejected.
    pub fn load_feature_rows(&self, path: impl AsRef<Path>) -> Result<Vec<Vec<f64>>> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            CytodxError::DataError(format!("failed to open {}: {}", path.display(), e))
        })?;
        let mut reader = self.reader_builder().from_reader(file);
        let headers = reader.headers()?.clone();
        let feature_indices = self.feature_indices(&headers)?;

        let mut rows = Vec::new();
        for (row_idx, record) in reader.records().enumerate() {
            let record = record?;
            let line = row_idx + 2;
            let row = feature_indices
                .iter()
                .map(|&idx| {
                    self.parse_cell(record.get(idx).unwrap_or_default(), line)?
                        .ok_or_else(|| {
                            CytodxError::InvalidInput(format!(
                                "unknown value on line {}; inference requires every feature",
                                line
                            ))
                        })
                })
                .collect::<Result<Vec<_>>>()?;
            rows.push(row);
        }

        debug!(path = %path.display(), rows = rows.len(), "loaded feature rows");
        Ok(rows)
    }

    fn reader_builder(&self) -> csv::ReaderBuilder {
        let mut builder = csv::ReaderBuilder::new();
        builder
            .delimiter(self.delimiter)
            .has_headers(true)
            .trim(csv::Trim::All);
        builder
    }

    fn feature_indices(&self, headers: &StringRecord) -> Result<Vec<usize>> {
        self.feature_columns
            .iter()
            .map(|name| {
                find_column(headers, name).ok_or_else(|| {
                    CytodxError::TrainingDataError(format!("missing feature column '{}'", name))
                })
            })
            .collect()
    }

    fn parse_cell(&self, raw: &str, line: usize) -> Result<Option<f64>> {
        let raw = raw.trim();
        if raw.is_empty() || raw == self.missing_marker {
            return Ok(None);
        }
        raw.parse::<f64>().map(Some).map_err(|_| {
            CytodxError::DataError(format!("invalid number '{}' on line {}", raw, line))
        })
    }
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name))
}

/// Class labels are whole numbers; `4.0` is accepted, `4.3` is not
fn parse_label(raw: &str) -> Option<i32> {
    if let Ok(label) = raw.parse::<i32>() {
        return Some(label);
    }
    let value = raw.parse::<f64>().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= i32::MAX as f64 {
        Some(value as i32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "id,Clump_thickness,Uniformity_of_cell_size,Uniformity_of_cell_shape,Marginal_adhesion,Single_epithelial_cell_size,Bare_nuclei,Bland_chromatin,Normal_nucleoli,Mitoses,Class";

    #[test]
    fn test_load_marks_unknown_and_drops_duplicates() {
        let csv = format!(
            "{}\n1,5,1,1,1,2,?,3,1,1,2\n2,5,1,1,1,2,?,3,1,1,2\n3,8,10,10,8,7,10,9,7,1,4\n",
            HEADER
        );
        let ds = DatasetLoader::new().load_from_reader(csv.as_bytes()).unwrap();

        // rows 1 and 2 differ only in the ignored id column
        assert_eq!(ds.n_samples(), 2);
        assert_eq!(ds.samples()[0].features[5], None);
        assert_eq!(ds.labels(), vec![2, 4]);
    }

    #[test]
    fn test_missing_label_column() {
        let csv = "Clump_thickness,Mitoses\n1,1\n";
        let result = DatasetLoader::new().load_from_reader(csv.as_bytes());
        assert!(matches!(result, Err(CytodxError::TrainingDataError(_))));
    }

    #[test]
    fn test_invalid_label() {
        let csv = format!("{}\n1,5,1,1,1,2,1,3,1,1,3\n", HEADER);
        let result = DatasetLoader::new().load_from_reader(csv.as_bytes());
        assert!(matches!(result, Err(CytodxError::TrainingDataError(_))));
    }

    #[test]
    fn test_empty_file() {
        let result = DatasetLoader::new().load_from_reader(HEADER.as_bytes());
        assert!(matches!(result, Err(CytodxError::TrainingDataError(_))));
    }

    #[test]
    fn test_fractional_label_rejected() {
        for label in ["2.4", "4.3", "inf"] {
            let csv = format!("{}\n1,5,1,1,1,2,1,3,1,1,{}\n", HEADER, label);
            let result = DatasetLoader::new().load_from_reader(csv.as_bytes());
            assert!(matches!(result, Err(CytodxError::DataError(_))), "label {}", label);
        }

        let csv = format!("{}\n1,5,1,1,1,2,1,3,1,1,4.0\n", HEADER);
        let ds = DatasetLoader::new().load_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(ds.labels(), vec![4]);
    }
}
