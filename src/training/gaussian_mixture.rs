//! Gaussian mixture model fit by expectation-maximisation
//!
//! Each initialisation seeds responsibilities from a k-means run; the
//! initialisation reaching the highest lower bound (mean log-likelihood)
//! is kept. Four covariance parameterisations are supported:
//!
//! - `Full`: each component has its own unrestricted covariance
//! - `Tied`: all components share one covariance
//! - `Diagonal`: per-component axis-aligned variances
//! - `Spherical`: one variance per component

use super::clustering::KMeans;
use super::linalg::{cholesky, log_det_from_cholesky, logsumexp, solve_lower};
use crate::error::{CytodxError, Result};
use ndarray::{Array1, Array2, Axis, Zip};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

const LN_2PI: f64 = 1.837_877_066_409_345_5;

/// Shape constraint on component covariances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CovarianceType {
    Full,
    Tied,
    Diagonal,
    Spherical,
}

impl CovarianceType {
    /// All shapes in search order
    pub const ALL: [CovarianceType; 4] = [
        CovarianceType::Full,
        CovarianceType::Tied,
        CovarianceType::Diagonal,
        CovarianceType::Spherical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CovarianceType::Full => "full",
            CovarianceType::Tied => "tied",
            CovarianceType::Diagonal => "diag",
            CovarianceType::Spherical => "spherical",
        }
    }
}

impl fmt::Display for CovarianceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CovarianceType {
    type Err = CytodxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "full" => Ok(CovarianceType::Full),
            "tied" => Ok(CovarianceType::Tied),
            "diag" | "diagonal" => Ok(CovarianceType::Diagonal),
            "spherical" => Ok(CovarianceType::Spherical),
            other => Err(CytodxError::ConfigError(format!("unknown covariance type '{}'", other))),
        }
    }
}

/// Fitted covariance parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Covariances {
    /// One d×d matrix per component
    Full(Vec<Array2<f64>>),
    /// One shared d×d matrix
    Tied(Array2<f64>),
    /// k×d variances
    Diagonal(Array2<f64>),
    /// One variance per component
    Spherical(Array1<f64>),
}

/// Per-component quantities needed to evaluate the log-density
enum Factor {
    Cholesky(Array2<f64>),
    Variances(Array1<f64>),
}

struct ComponentDensity {
    factor: Factor,
    log_det: f64,
}

struct FitState {
    weights: Array1<f64>,
    means: Array2<f64>,
    covariances: Covariances,
    lower_bound: f64,
    converged: bool,
    n_iter: usize,
}

/// Gaussian mixture model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaussianMixture {
    pub n_components: usize,
    pub covariance_type: CovarianceType,
    pub max_iter: usize,
    pub n_init: usize,
    pub tol: f64,
    /// Added to covariance diagonals to keep them positive definite
    pub reg_covar: f64,
    pub random_state: Option<u64>,
    weights: Option<Array1<f64>>,
    means: Option<Array2<f64>>,
    covariances: Option<Covariances>,
    lower_bound: Option<f64>,
    converged: bool,
    n_iter: usize,
    n_features: usize,
    pub is_fitted: bool,
}

impl GaussianMixture {
    pub fn new(n_components: usize, covariance_type: CovarianceType) -> Self {
        Self {
            n_components,
            covariance_type,
            max_iter: 200,
            n_init: 10,
            tol: 1e-3,
            reg_covar: 1e-6,
            random_state: Some(42),
            weights: None,
            means: None,
            covariances: None,
            lower_bound: None,
            converged: false,
            n_iter: 0,
            n_features: 0,
            is_fitted: false,
        }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    pub fn with_reg_covar(mut self, reg_covar: f64) -> Self {
        self.reg_covar = reg_covar;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Fit the mixture, keeping the best of `n_init` initialisations
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        if self.n_components == 0 {
            return Err(CytodxError::TrainingError("n_components must be at least 1".to_string()));
        }
        if n_samples < self.n_components {
            return Err(CytodxError::TrainingError(format!(
                "n_samples ({}) < n_components ({})",
                n_samples, self.n_components
            )));
        }
        if self.n_init == 0 || self.max_iter == 0 {
            return Err(CytodxError::TrainingError(
                "n_init and max_iter must be at least 1".to_string(),
            ));
        }

        let base_seed = self.random_state.unwrap_or(42);
        let starts = (0..self.n_init)
            .map(|init| (init, self.fit_single(x, base_seed.wrapping_add(init as u64))));
        let best = best_start(starts)?;
        if !best.converged {
            warn!(
                n_components = self.n_components,
                covariance = %self.covariance_type,
                max_iter = self.max_iter,
                "best initialisation did not converge"
            );
        }

        self.weights = Some(best.weights);
        self.means = Some(best.means);
        self.covariances = Some(best.covariances);
        self.lower_bound = Some(best.lower_bound);
        self.converged = best.converged;
        self.n_iter = best.n_iter;
        self.n_features = x.ncols();
        self.is_fitted = true;
        Ok(self)
    }

    fn fit_single(&self, x: &Array2<f64>, seed: u64) -> Result<FitState> {
        let mut kmeans = KMeans::new(self.n_components).with_random_state(seed);
        kmeans.fit(x)?;
        let labels = kmeans.labels.as_ref().ok_or(CytodxError::ModelNotFitted)?;

        let mut resp = Array2::<f64>::zeros((x.nrows(), self.n_components));
        for (i, &c) in labels.iter().enumerate() {
            resp[[i, c]] = 1.0;
        }

        let (mut weights, mut means, mut covariances) = self.m_step(x, &resp);
        let mut lower_bound = f64::NEG_INFINITY;
        let mut converged = false;
        let mut n_iter = 0;

        for iter in 1..=self.max_iter {
            let prev = lower_bound;
            let densities = component_densities(&covariances, self.n_components, x.ncols())?;
            let (log_prob_norm, log_resp) = e_step(x, &weights, &means, &densities);
            resp = log_resp.mapv(f64::exp);
            let params = self.m_step(x, &resp);
            weights = params.0;
            means = params.1;
            covariances = params.2;

            lower_bound = log_prob_norm;
            n_iter = iter;
            if (lower_bound - prev).abs() < self.tol {
                converged = true;
                break;
            }
        }

        if !lower_bound.is_finite() {
            return Err(CytodxError::TrainingError(format!(
                "log-likelihood diverged for seed {}",
                seed
            )));
        }

        Ok(FitState {
            weights,
            means,
            covariances,
            lower_bound,
            converged,
            n_iter,
        })
    }

    /// Maximisation step: weights, means and covariances from responsibilities
    fn m_step(&self, x: &Array2<f64>, resp: &Array2<f64>) -> (Array1<f64>, Array2<f64>, Covariances) {
        let (n_samples, n_features) = x.dim();
        let k = self.n_components;

        let nk = resp.sum_axis(Axis(0)) + 10.0 * f64::EPSILON;
        let means = resp.t().dot(x) / &nk.view().insert_axis(Axis(1));

        let weighted_scatter = |c: usize| -> Array2<f64> {
            let diff = x - &means.row(c);
            let weighted = &diff * &resp.column(c).insert_axis(Axis(1));
            weighted.t().dot(&diff)
        };

        let covariances = match self.covariance_type {
            CovarianceType::Full => Covariances::Full(
                (0..k)
                    .map(|c| {
                        let mut cov = weighted_scatter(c) / nk[c];
                        cov.diag_mut().mapv_inplace(|v| v + self.reg_covar);
                        cov
                    })
                    .collect(),
            ),
            CovarianceType::Tied => {
                let mut cov = Array2::<f64>::zeros((n_features, n_features));
                for c in 0..k {
                    cov += &weighted_scatter(c);
                }
                cov /= nk.sum();
                cov.diag_mut().mapv_inplace(|v| v + self.reg_covar);
                Covariances::Tied(cov)
            }
            CovarianceType::Diagonal | CovarianceType::Spherical => {
                let mut vars = Array2::<f64>::zeros((k, n_features));
                for c in 0..k {
                    let diff = x - &means.row(c);
                    let sq = &diff.mapv(|v| v * v) * &resp.column(c).insert_axis(Axis(1));
                    let mut row = sq.sum_axis(Axis(0)) / nk[c];
                    row.mapv_inplace(|v| v + self.reg_covar);
                    vars.row_mut(c).assign(&row);
                }
                if self.covariance_type == CovarianceType::Diagonal {
                    Covariances::Diagonal(vars)
                } else {
                    Covariances::Spherical(vars.mean_axis(Axis(1)).unwrap_or_else(|| Array1::zeros(k)))
                }
            }
        };

        let weights = &nk / n_samples as f64;
        (weights, means, covariances)
    }

    fn fitted(&self) -> Result<(&Array1<f64>, &Array2<f64>, &Covariances)> {
        match (&self.weights, &self.means, &self.covariances) {
            (Some(w), Some(m), Some(c)) => Ok((w, m, c)),
            _ => Err(CytodxError::ModelNotFitted),
        }
    }

    fn log_resp(&self, x: &Array2<f64>) -> Result<(f64, Array2<f64>)> {
        let (weights, means, covariances) = self.fitted()?;
        if x.ncols() != self.n_features {
            return Err(CytodxError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }
        let densities = component_densities(covariances, self.n_components, self.n_features)?;
        Ok(e_step(x, weights, means, &densities))
    }

    /// Posterior probability of each component (rows sum to 1)
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (_, log_resp) = self.log_resp(x)?;
        Ok(log_resp.mapv(f64::exp))
    }

    /// Most probable component per sample
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>> {
        let (_, log_resp) = self.log_resp(x)?;
        Ok(log_resp.map_axis(Axis(1), |row| argmax(row.iter().copied())))
    }

    /// Mean log-likelihood of the data under the model
    pub fn score(&self, x: &Array2<f64>) -> Result<f64> {
        Ok(self.log_resp(x)?.0)
    }

    pub fn weights(&self) -> Option<&Array1<f64>> {
        self.weights.as_ref()
    }

    pub fn means(&self) -> Option<&Array2<f64>> {
        self.means.as_ref()
    }

    pub fn covariances(&self) -> Option<&Covariances> {
        self.covariances.as_ref()
    }

    /// Lower bound reached by the kept initialisation
    pub fn lower_bound(&self) -> Option<f64> {
        self.lower_bound
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

fn component_densities(covariances: &Covariances, k: usize, d: usize) -> Result<Vec<ComponentDensity>> {
    match covariances {
        Covariances::Full(covs) => covs
            .iter()
            .map(|cov| {
                let l = cholesky(cov.view())?;
                let log_det = log_det_from_cholesky(l.view());
                Ok(ComponentDensity { factor: Factor::Cholesky(l), log_det })
            })
            .collect(),
        Covariances::Tied(cov) => {
            let l = cholesky(cov.view())?;
            let log_det = log_det_from_cholesky(l.view());
            Ok((0..k)
                .map(|_| ComponentDensity { factor: Factor::Cholesky(l.clone()), log_det })
                .collect())
        }
        Covariances::Diagonal(vars) => vars
            .rows()
            .into_iter()
            .map(|row| variance_density(row.to_owned()))
            .collect(),
        Covariances::Spherical(vars) => vars
            .iter()
            .map(|&v| variance_density(Array1::from_elem(d, v)))
            .collect(),
    }
}

fn variance_density(vars: Array1<f64>) -> Result<ComponentDensity> {
    if vars.iter().any(|&v| v <= 0.0 || !v.is_finite()) {
        return Err(CytodxError::TrainingError(
            "component variance is not positive".to_string(),
        ));
    }
    let log_det = vars.iter().map(|v| v.ln()).sum();
    Ok(ComponentDensity { factor: Factor::Variances(vars), log_det })
}

/// Expectation step: mean log-likelihood and log-responsibilities
fn e_step(
    x: &Array2<f64>,
    weights: &Array1<f64>,
    means: &Array2<f64>,
    densities: &[ComponentDensity],
) -> (f64, Array2<f64>) {
    let n_features = x.ncols() as f64;
    let log_weights = weights.mapv(f64::ln);
    let mut log_resp = Array2::<f64>::zeros((x.nrows(), densities.len()));
    let mut log_norm = Array1::<f64>::zeros(x.nrows());

    Zip::from(log_resp.rows_mut())
        .and(&mut log_norm)
        .and(x.rows())
        .par_for_each(|mut out, norm, sample| {
            for (c, density) in densities.iter().enumerate() {
                let diff = &sample - &means.row(c);
                let maha = match &density.factor {
                    Factor::Cholesky(l) => {
                        let z = solve_lower(l.view(), diff.view());
                        z.dot(&z)
                    }
                    Factor::Variances(vars) => diff.iter().zip(vars.iter()).map(|(d, v)| d * d / v).sum(),
                };
                out[c] = log_weights[c] - 0.5 * (n_features * LN_2PI + density.log_det + maha);
            }
            *norm = logsumexp(out.view());
            out.mapv_inplace(|v| v - *norm);
        });

    (log_norm.mean().unwrap_or(f64::NEG_INFINITY), log_resp)
}

/// Highest lower bound among the initialisations that fit; errors only when all of them failed
fn best_start(starts: impl Iterator<Item = (usize, Result<FitState>)>) -> Result<FitState> {
    let mut best: Option<FitState> = None;
    let mut last_error = None;

    for (init, state) in starts {
        let state = match state {
            Ok(state) => state,
            Err(e) => {
                warn!(init, error = %e, "mixture initialisation failed");
                last_error = Some(e);
                continue;
            }
        };
        debug!(
            init,
            lower_bound = state.lower_bound,
            n_iter = state.n_iter,
            converged = state.converged,
            "mixture initialisation finished"
        );
        if best.as_ref().map_or(true, |b| state.lower_bound > b.lower_bound) {
            best = Some(state);
        }
    }

    match (best, last_error) {
        (Some(best), _) => Ok(best),
        (None, Some(e)) => Err(e),
        (None, None) => Err(CytodxError::TrainingError("no initialisation ran".to_string())),
    }
}

fn argmax(values: impl Iterator<Item = f64>) -> usize {
    let mut best = 0;
    let mut best_val = f64::NEG_INFINITY;
    for (i, v) in values.enumerate() {
        if v > best_val {
            best_val = v;
            best = i;
        }
    }
    best
}
