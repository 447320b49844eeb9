//! Integration test: CSV loading and feature preparation

use cytodx::data::{Dataset, DatasetLoader, Sample, FEATURE_NAMES};
use cytodx::error::CytodxError;
use cytodx::preprocessing::{FeaturePreparer, PreprocessingConfig};
use ndarray::Array1;
use std::io::Write;

const HEADER: &str = "Sample_code_number,Clump_thickness,Uniformity_of_cell_size,Uniformity_of_cell_shape,Marginal_adhesion,Single_epithelial_cell_size,Bare_nuclei,Bland_chromatin,Normal_nucleoli,Mitoses,Class";

fn write_csv(rows: &[&str]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    for row in rows {
        writeln!(file, "{}", row).unwrap();
    }
    file.flush().unwrap();
    file
}

fn sample_rows() -> Vec<&'static str> {
    vec![
        "1000025,5,1,1,1,2,1,3,1,1,2",
        "1002945,5,4,4,5,7,10,3,2,1,2",
        "1015425,3,1,1,1,2,2,3,1,1,2",
        "1016277,6,8,8,1,3,4,3,7,1,2",
        "1017023,4,1,1,3,2,?,3,1,1,2",
        "1017122,8,10,10,8,7,10,9,7,1,4",
        "1018099,1,1,1,1,2,10,3,1,1,2",
        "1018561,2,1,2,1,2,1,3,1,1,2",
        "1033078,2,1,1,1,2,1,1,1,5,2",
        "1035283,1,1,1,1,1,?,3,1,1,2",
        "1036172,2,1,1,1,2,1,2,1,1,2",
        "1041801,5,3,3,3,2,3,4,4,1,4",
        "1043999,1,1,1,1,2,3,3,1,1,2",
        "1044572,8,7,5,10,7,9,5,5,4,4",
        "1047630,7,4,6,4,6,1,4,3,1,4",
        "1048672,4,1,1,1,2,1,2,1,1,2",
        "1049815,4,1,1,1,2,1,3,1,1,2",
        "1050670,10,7,7,6,4,10,4,1,2,4",
        "1050718,6,1,1,1,2,1,3,1,1,2",
        "1054590,7,3,2,10,5,10,5,4,4,4",
    ]
}

#[test]
fn test_full_preparation_from_csv() {
    let file = write_csv(&sample_rows());
    let dataset = DatasetLoader::new().load(file.path()).unwrap();

    assert_eq!(dataset.n_samples(), 20);
    assert_eq!(dataset.n_features(), 9);
    assert_eq!(dataset.missing_counts()[5], 2);

    let prepared = FeaturePreparer::default().prepare(&dataset).unwrap();

    // Bare_nuclei imputed with the mean of the 18 observed values
    assert_eq!(prepared.report.imputed.len(), 1);
    let imputed = &prepared.report.imputed[0];
    assert_eq!(imputed.feature, "Bare_nuclei");
    assert_eq!(imputed.n_imputed, 2);
    let observed = [1.0, 10.0, 2.0, 4.0, 10.0, 10.0, 1.0, 1.0, 1.0, 3.0, 3.0, 9.0, 1.0, 1.0, 1.0, 10.0, 1.0, 10.0];
    let mean = observed.iter().sum::<f64>() / observed.len() as f64;
    assert!((imputed.fill_value - mean).abs() < 1e-12);

    // Mitoses is mostly 1 (IQR = 0), so every value above 1 is clipped
    let clip = prepared.report.clipped.as_ref().unwrap();
    assert_eq!(clip.feature, "Mitoses");
    assert_eq!(clip.bounds.upper, 1.0);
    assert_eq!(clip.n_clipped, 4);

    assert_eq!(prepared.n_samples(), 20);
    assert!(prepared.features.iter().all(|&v| (0.0..=1.0).contains(&v)));
}

#[test]
fn test_scaler_reused_outside_training_range() {
    let file = write_csv(&sample_rows());
    let dataset = DatasetLoader::new().load(file.path()).unwrap();
    let prepared = FeaturePreparer::default().prepare(&dataset).unwrap();

    let beyond = Array1::from(vec![20.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
    let scaled = prepared.scaler.transform_row(beyond.view()).unwrap();
    assert!(scaled[0] > 1.0);
    assert!(scaled[1] < 0.0);
}

#[test]
fn test_custom_missing_marker() {
    let rows: Vec<String> = sample_rows().iter().map(|r| r.replace('?', "NA")).collect();
    let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
    let file = write_csv(&refs);

    let config = PreprocessingConfig::default().with_missing_marker("NA");
    let dataset = DatasetLoader::new()
        .with_missing_marker(config.missing_marker.clone())
        .load(file.path())
        .unwrap();
    assert_eq!(dataset.missing_counts()[5], 2);

    // the default marker would treat "NA" as a malformed number
    let result = DatasetLoader::new().load(file.path());
    assert!(matches!(result, Err(CytodxError::DataError(_))));
}

#[test]
fn test_clipping_disabled() {
    let file = write_csv(&sample_rows());
    let dataset = DatasetLoader::new().load(file.path()).unwrap();
    let config = PreprocessingConfig::default().with_clip_feature(None);

    let prepared = FeaturePreparer::new(config).prepare(&dataset).unwrap();
    assert!(prepared.report.clipped.is_none());
}

#[test]
fn test_feature_without_observations_fails() {
    let samples = vec![
        Sample::new(vec![Some(1.0), None], 2),
        Sample::new(vec![Some(5.0), None], 4),
    ];
    let dataset = Dataset::new(vec!["Clump_thickness".into(), "Bare_nuclei".into()], samples).unwrap();

    let result = FeaturePreparer::default().prepare(&dataset);
    assert!(matches!(result, Err(CytodxError::TrainingDataError(_))));
}

#[test]
fn test_invalid_label_rejected() {
    let file = write_csv(&["1,5,1,1,1,2,1,3,1,1,3"]);
    let result = DatasetLoader::new().load(file.path());
    assert!(matches!(result, Err(CytodxError::TrainingDataError(_))));
}

#[test]
fn test_constant_feature_scales_to_zero() {
    let samples: Vec<Sample> = (0..6)
        .map(|i| {
            let mut row = [1.0; 9];
            row[0] = i as f64;
            Sample::complete(&row, if i < 3 { 2 } else { 4 })
        })
        .collect();
    let dataset = Dataset::with_standard_schema(samples).unwrap();
    let prepared = FeaturePreparer::default().prepare(&dataset).unwrap();

    assert_eq!(prepared.feature_names, FEATURE_NAMES.iter().map(|s| s.to_string()).collect::<Vec<_>>());
    assert!(prepared.features.column(1).iter().all(|&v| v == 0.0));
    assert_eq!(prepared.features[[5, 0]], 1.0);
}
