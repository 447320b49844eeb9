//! cytodx CLI Module
//!
//! Command-line interface for training, diagnosis and dataset inspection.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::PipelineConfig;
use crate::data::{Dataset, DatasetLoader, Diagnosis};
use crate::export::ArtifactStore;
use crate::inference::{BatchSummary, DiagnosisEngine};
use crate::pipeline::TrainingPipeline;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString    { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(&format!("{:<20}", key)), val.white())
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn diagnosis_label(diagnosis: Diagnosis) -> ColoredString {
    match diagnosis {
        Diagnosis::Benign => ok(diagnosis.as_str()).bold(),
        Diagnosis::Malignant => diagnosis.as_str().red().bold(),
    }
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "cytodx")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Breast-tissue cytology diagnosis: model search, artifacts and inference")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search both model grids and save the artifact set
    Train {
        /// Labelled CSV with the nine cytology features and a Class column
        #[arg(short, long)]
        data: PathBuf,

        /// Artifact directory to write
        #[arg(short, long, default_value = "models")]
        output: PathBuf,

        /// Pipeline configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Diagnose one sample with the cluster model
    Diagnose {
        /// Artifact directory
        #[arg(short, long, default_value = "models")]
        models: PathBuf,

        /// Comma-separated feature values in schema order
        #[arg(short, long, value_delimiter = ',', num_args = 1.., allow_negative_numbers = true)]
        features: Vec<f64>,
    },

    /// Diagnose every row of a CSV
    Batch {
        /// Artifact directory
        #[arg(short, long, default_value = "models")]
        models: PathBuf,

        /// CSV with the nine cytology feature columns
        #[arg(short, long)]
        data: PathBuf,
    },

    /// Forest-based recommendation for one sample
    Recommend {
        /// Artifact directory
        #[arg(short, long, default_value = "models")]
        models: PathBuf,

        /// Comma-separated feature values in schema order
        #[arg(short, long, value_delimiter = ',', num_args = 1.., allow_negative_numbers = true)]
        features: Vec<f64>,
    },

    /// Show the stored feature-importance ranking
    Importance {
        /// Artifact directory
        #[arg(short, long, default_value = "models")]
        models: PathBuf,
    },

    /// Show dataset information
    Info {
        /// Labelled CSV
        #[arg(short, long)]
        data: PathBuf,
    },
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Train { data, output, config } => cmd_train(&data, &output, config.as_deref()),
        Commands::Diagnose { models, features } => cmd_diagnose(&models, &features),
        Commands::Batch { models, data } => cmd_batch(&models, &data),
        Commands::Recommend { models, features } => cmd_recommend(&models, &features),
        Commands::Importance { models } => cmd_importance(&models),
        Commands::Info { data } => cmd_info(&data),
    }
}

fn load_engine(models: &Path) -> anyhow::Result<DiagnosisEngine> {
    step_run("Loading artifacts");
    let start = Instant::now();
    let engine = DiagnosisEngine::load(models)?;
    step_done(&format!("{} features in {:?}", engine.n_features(), start.elapsed()));
    Ok(engine)
}

fn load_dataset(path: &Path, config: &PipelineConfig) -> anyhow::Result<Dataset> {
    step_run("Loading data");
    let start = Instant::now();
    let dataset = DatasetLoader::new()
        .with_missing_marker(config.preprocessing.missing_marker.clone())
        .load(path)?;
    step_done(&format!(
        "{} rows × {} features in {:?}",
        dataset.n_samples(),
        dataset.n_features(),
        start.elapsed()
    ));
    Ok(dataset)
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(data_path: &Path, output: &Path, config_path: Option<&Path>) -> anyhow::Result<()> {
    section("Train");

    let config = match config_path {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    let dataset = load_dataset(data_path, &config)?;

    step_run(&format!(
        "Searching {} cluster and {} forest configurations",
        config.cluster_search.grid().len(),
        config.forest_search.grid().len()
    ));
    let store = ArtifactStore::new(output);
    let (_, report) = TrainingPipeline::new(config).train_and_save(&dataset, &store)?;
    step_done(&format!("{:.1}s", report.elapsed_secs));

    section("Cluster model");
    println!("  {}", kv("configuration", &report.best_cluster.config.to_string()));
    println!("  {}", kv("accuracy", &format!("{:.4}", report.best_cluster.accuracy)));
    println!("  {}", kv("silhouette", &format!("{:.4}", report.best_cluster.silhouette)));
    println!("  {}", kv("calinski-harabasz", &format!("{:.2}", report.best_cluster.calinski_harabasz)));
    if report.cluster_failures > 0 {
        println!("  {}", kv("failed configs", &report.cluster_failures.to_string()));
    }
    for (cluster, diagnosis) in &report.cluster_map {
        println!("  {} {}", muted(&format!("cluster {:<12}", cluster)), diagnosis_label(*diagnosis));
    }

    section("Forest");
    println!("  {}", kv("configuration", &report.best_forest.config.to_string()));
    println!(
        "  {}",
        kv(
            "cv accuracy",
            &format!("{:.4} ± {:.4}", report.best_forest.cv.mean_score, report.best_forest.cv.std_score)
        )
    );
    if report.forest_failures > 0 {
        println!("  {}", kv("failed configs", &report.forest_failures.to_string()));
    }

    println!();
    println!("  {} artifacts saved to {}", ok("✓"), store.dir().display().to_string().white().bold());
    println!();
    Ok(())
}

pub fn cmd_diagnose(models: &Path, features: &[f64]) -> anyhow::Result<()> {
    section("Diagnose");
    let engine = load_engine(models)?;
    let result = engine.diagnose_one(features)?;

    println!();
    println!("  {} {}", muted(&format!("{:<20}", "diagnosis")), diagnosis_label(result.diagnosis));
    println!("  {}", kv("confidence", &format!("{:.4}", result.confidence)));
    println!("  {}", kv("cluster", &result.cluster.to_string()));
    println!();
    Ok(())
}

pub fn cmd_batch(models: &Path, data_path: &Path) -> anyhow::Result<()> {
    section("Batch diagnose");
    let engine = load_engine(models)?;

    step_run("Reading samples");
    let rows = DatasetLoader::new().load_feature_rows(data_path)?;
    step_done(&format!("{} rows", rows.len()));

    let start = Instant::now();
    let results = engine.diagnose_batch(&rows)?;
    let elapsed = start.elapsed();

    println!();
    println!("  {:<10} {:<12} {:>10}", muted("patient"), muted("diagnosis"), muted("confidence"));
    println!("  {}", dim(&"─".repeat(34)));
    for (idx, result) in results.iter().enumerate() {
        println!(
            "  {:<10} {:<12} {:>10.4}",
            idx + 1,
            diagnosis_label(result.diagnosis),
            result.confidence
        );
    }
    println!("  {}", dim(&"─".repeat(34)));

    let summary = BatchSummary::from_results(&results);
    println!("  {}", kv("total patients", &summary.total_patients.to_string()));
    println!("  {}", kv("benign", &summary.benign.to_string()));
    println!("  {}", kv("malignant", &summary.malignant.to_string()));
    println!("  {}", kv("mean confidence", &format!("{:.4}", summary.mean_confidence)));
    println!("  {}", kv("time", &format!("{:?}", elapsed)));
    println!();
    Ok(())
}

pub fn cmd_recommend(models: &Path, features: &[f64]) -> anyhow::Result<()> {
    section("Recommend");
    let engine = load_engine(models)?;
    let recommendation = engine.recommend(features)?;

    println!();
    println!("  {} {}", muted(&format!("{:<20}", "forest diagnosis")), diagnosis_label(recommendation.diagnosis));
    println!("  {}", kv("confidence", &format!("{:.4}", recommendation.confidence)));
    println!();
    for line in recommendation.advice.lines() {
        if line.ends_with(':') {
            println!("  {}", line.white().bold());
        } else {
            println!("  {}", line);
        }
    }
    println!();
    Ok(())
}

pub fn cmd_importance(models: &Path) -> anyhow::Result<()> {
    section("Feature importance");
    let engine = load_engine(models)?;

    println!();
    for entry in engine.feature_importance().entries() {
        let bar = "█".repeat((entry.importance * 40.0).round() as usize);
        println!("  {:<28} {:>7.4}  {}", entry.feature, entry.importance, accent(&bar));
    }
    println!();
    Ok(())
}

pub fn cmd_info(data_path: &Path) -> anyhow::Result<()> {
    section("Dataset info");
    let dataset = load_dataset(data_path, &PipelineConfig::default())?;

    let labels = dataset.labels();
    let malignant = labels.iter().filter(|&&l| l == Diagnosis::Malignant.class()).count();

    println!();
    println!("  {}", kv("samples", &dataset.n_samples().to_string()));
    println!("  {}", kv("benign", &(labels.len() - malignant).to_string()));
    println!("  {}", kv("malignant", &malignant.to_string()));
    println!();
    println!("  {:<28} {:>8}", muted("feature"), muted("missing"));
    println!("  {}", dim(&"─".repeat(37)));
    for (name, missing) in dataset.feature_names().iter().zip(dataset.missing_counts()) {
        let count = if missing > 0 { missing.to_string().yellow() } else { missing.to_string().normal() };
        println!("  {:<28} {:>8}", name, count);
    }
    println!();
    Ok(())
}
