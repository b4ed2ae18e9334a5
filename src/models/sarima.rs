//! Seasonal ARIMA estimated as a Kalman-filter state-space model
//!
//! The model is SARIMA(p,d,q)(P,D,Q)[s]: the multiplicative AR and MA lag
//! polynomials are expanded into single polynomials, differencing is applied
//! up front, and the resulting ARMA process is put in Harvey state-space
//! form. Coefficients are estimated by maximum likelihood with the
//! innovation variance concentrated out. Missing observations skip the
//! filter's measurement update, so gaps in the series are treated as
//! unobserved rather than zero.

use crate::error::{ForecastError, Result};
use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
use crate::series::DailySeries;
use argmin::core::{CostFunction, Error as ArgminError, Executor, Gradient, State};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::quasinewton::LBFGS;
use nalgebra::{DMatrix, DVector};

const MAX_ITERS: u64 = 100;
const LBFGS_HISTORY: usize = 10;
const TOL_GRAD: f64 = 1e-6;
const TOL_COST: f64 = 1e-9;
const GRAD_STEP: f64 = 1e-5;
const LARGE_COST: f64 = 1e30;
const MIN_VARIANCE: f64 = 1e-12;
const DIFFUSE_VARIANCE: f64 = 1e4;

/// Non-seasonal and seasonal orders of a SARIMA model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SarimaOrder {
    /// AR order (p)
    pub p: usize,
    /// Differencing order (d)
    pub d: usize,
    /// MA order (q)
    pub q: usize,
    /// Seasonal AR order (P)
    pub seasonal_p: usize,
    /// Seasonal differencing order (D)
    pub seasonal_d: usize,
    /// Seasonal MA order (Q)
    pub seasonal_q: usize,
    /// Seasonal period in days (s)
    pub period: usize,
}

impl SarimaOrder {
    /// Non-seasonal ARIMA(p,d,q) order.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self {
            p,
            d,
            q,
            seasonal_p: 0,
            seasonal_d: 0,
            seasonal_q: 0,
            period: 0,
        }
    }

    /// Add a seasonal (P,D,Q)[s] component.
    pub fn with_seasonal(
        mut self,
        seasonal_p: usize,
        seasonal_d: usize,
        seasonal_q: usize,
        period: usize,
    ) -> Self {
        self.seasonal_p = seasonal_p;
        self.seasonal_d = seasonal_d;
        self.seasonal_q = seasonal_q;
        self.period = period;
        self
    }

    fn is_seasonal(&self) -> bool {
        self.seasonal_p > 0 || self.seasonal_d > 0 || self.seasonal_q > 0
    }

    fn param_count(&self) -> usize {
        self.p + self.q + self.seasonal_p + self.seasonal_q
    }

    /// Observations needed before a fit is attempted.
    fn min_observations(&self) -> usize {
        self.p
            + self.d
            + self.q
            + self.period * (self.seasonal_p + self.seasonal_d + self.seasonal_q)
            + 1
    }
}

/// SARIMA model specification, trained into a [`TrainedSarimaModel`].
#[derive(Debug, Clone)]
pub struct SarimaModel {
    name: String,
    order: SarimaOrder,
}

impl SarimaModel {
    /// Create a new SARIMA model with the given orders.
    pub fn new(order: SarimaOrder) -> Result<Self> {
        if order.is_seasonal() && order.period < 2 {
            return Err(ForecastError::ValidationError(format!(
                "seasonal components require a period of at least 2, got {}",
                order.period
            )));
        }

        let name = if order.is_seasonal() {
            format!(
                "SARIMA({},{},{})({},{},{})[{}]",
                order.p,
                order.d,
                order.q,
                order.seasonal_p,
                order.seasonal_d,
                order.seasonal_q,
                order.period
            )
        } else {
            format!("ARIMA({},{},{})", order.p, order.d, order.q)
        };

        Ok(Self { name, order })
    }

    /// The configured orders.
    pub fn order(&self) -> &SarimaOrder {
        &self.order
    }

    /// Maximum-likelihood estimation of the unconstrained parameters.
    fn estimate(&self, series: &[Option<f64>]) -> Result<Vec<f64>> {
        let n_params = self.order.param_count();
        if n_params == 0 {
            return Ok(Vec::new());
        }

        // A zero-variance series makes the likelihood flat in the
        // coefficients; any value gives the same fit.
        if observed_variance(series) < MIN_VARIANCE {
            return Ok(vec![0.0; n_params]);
        }

        let problem = SarimaLikelihood {
            series: series.to_vec(),
            order: self.order.clone(),
        };
        let init = vec![0.0; n_params];

        let linesearch = MoreThuenteLineSearch::new()
            .with_c(1e-4, 0.9)
            .map_err(|e| optimizer_error(&self.name, &e))?;
        let solver = LBFGS::new(linesearch, LBFGS_HISTORY)
            .with_tolerance_grad(TOL_GRAD)
            .map_err(|e| optimizer_error(&self.name, &e))?
            .with_tolerance_cost(TOL_COST)
            .map_err(|e| optimizer_error(&self.name, &e))?;

        let outcome = Executor::new(problem, solver)
            .configure(|state| state.param(init).max_iters(MAX_ITERS))
            .run()
            .map_err(|e| optimizer_error(&self.name, &e))?;

        outcome
            .state
            .get_best_param()
            .or_else(|| outcome.state.get_param())
            .cloned()
            .ok_or_else(|| {
                ForecastError::ForecastingError(format!(
                    "{}: optimizer returned no parameters",
                    self.name
                ))
            })
    }
}

fn optimizer_error(name: &str, err: &ArgminError) -> ForecastError {
    ForecastError::ForecastingError(format!("{}: estimation failed: {}", name, err))
}

impl ForecastModel for SarimaModel {
    type Trained = TrainedSarimaModel;

    fn train(&self, series: &DailySeries) -> Result<TrainedSarimaModel> {
        let raw: Vec<Option<f64>> = series.values().to_vec();
        let observed = raw.iter().flatten().count();
        if observed == 0 {
            return Err(ForecastError::ForecastingError(format!(
                "{}: series has no observations",
                self.name
            )));
        }
        if observed < self.order.min_observations() {
            return Err(ForecastError::ValidationError(format!(
                "Insufficient data for {}. Need at least {} observations, have {}.",
                self.name,
                self.order.min_observations(),
                observed
            )));
        }

        // Differencing stages; each keeps the levels it consumed so the
        // forecast can be integrated back.
        let mut stage_levels: Vec<(usize, Vec<Option<f64>>)> = Vec::new();
        let mut stationary = raw;
        for _ in 0..self.order.d {
            stage_levels.push((1, stationary.clone()));
            stationary = difference(&stationary, 1);
        }
        for _ in 0..self.order.seasonal_d {
            stage_levels.push((self.order.period, stationary.clone()));
            stationary = difference(&stationary, self.order.period);
        }
        if stationary.iter().flatten().next().is_none() {
            return Err(ForecastError::ForecastingError(format!(
                "{}: differencing left no observations",
                self.name
            )));
        }

        let params = self.estimate(&stationary)?;
        let coefficients = Coefficients::from_params(&params, &self.order);
        let filter = kalman_filter(&stationary, &coefficients);
        if !filter.nll.is_finite() || filter.nll >= LARGE_COST {
            return Err(ForecastError::ForecastingError(format!(
                "{}: model failed to converge",
                self.name
            )));
        }

        // Replace gaps on the stationary scale with the filter's one-step
        // predictions, then rebuild each level stage bottom-up the same way.
        let filled: Vec<f64> = stationary
            .iter()
            .zip(filter.predictions.iter())
            .map(|(observation, prediction)| observation.unwrap_or(*prediction))
            .collect();

        let mut filled_diff = filled.clone();
        let mut stages = Vec::with_capacity(stage_levels.len());
        for (lag, levels) in stage_levels.iter().rev() {
            let filled_levels = fill_levels(levels, *lag, &filled_diff);
            filled_diff = filled_levels.clone();
            stages.push(FilledStage {
                lag: *lag,
                levels: filled_levels,
            });
        }

        Ok(TrainedSarimaModel {
            name: self.name.clone(),
            transition: filter.transition,
            state: filter.state,
            ar_coefficients: coefficients.ar,
            ma_coefficients: coefficients.ma,
            sigma2: filter.sigma2,
            stationary: filled,
            stages,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// One undone differencing stage: the levels it consumed, gaps filled.
#[derive(Debug, Clone)]
struct FilledStage {
    lag: usize,
    levels: Vec<f64>,
}

/// Trained SARIMA model
#[derive(Debug, Clone)]
pub struct TrainedSarimaModel {
    name: String,
    transition: DMatrix<f64>,
    state: DVector<f64>,
    ar_coefficients: Vec<f64>,
    ma_coefficients: Vec<f64>,
    sigma2: f64,
    stationary: Vec<f64>,
    stages: Vec<FilledStage>,
}

impl TrainedSarimaModel {
    /// Expanded AR lag-polynomial coefficients.
    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coefficients
    }

    /// Expanded MA lag-polynomial coefficients.
    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coefficients
    }

    /// Estimated innovation variance.
    pub fn innovation_variance(&self) -> f64 {
        self.sigma2
    }
}

impl TrainedForecastModel for TrainedSarimaModel {
    fn forecast(&self, horizons: usize) -> Result<ForecastResult> {
        if horizons == 0 {
            return ForecastResult::new(Vec::new(), 0);
        }

        // State prediction on the stationary scale.
        let mut state = self.state.clone();
        let mut future = Vec::with_capacity(horizons);
        for _ in 0..horizons {
            state = &self.transition * &state;
            future.push(state[0]);
        }

        // Undo the differencing, innermost stage outward (`stages` is stored
        // in that order). Each stage extends its level history with
        // lag-offset sums of the stage below.
        let mut diffs = self.stationary.clone();
        diffs.extend(&future);
        for stage in self.stages.iter() {
            let mut levels = stage.levels.clone();
            for _ in 0..horizons {
                let t = levels.len();
                let next = levels[t - stage.lag] + diffs[t - stage.lag];
                levels.push(next);
            }
            diffs = levels;
        }

        let values = diffs[diffs.len() - horizons..].to_vec();
        ForecastResult::new(values, horizons)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Lag-`lag` difference, propagating missingness.
fn difference(values: &[Option<f64>], lag: usize) -> Vec<Option<f64>> {
    if values.len() <= lag {
        return Vec::new();
    }
    (lag..values.len())
        .map(|t| match (values[t], values[t - lag]) {
            (Some(current), Some(previous)) => Some(current - previous),
            _ => None,
        })
        .collect()
}

/// Fill gaps in a level series from its (already filled) differences.
///
/// Observed levels always win; a missing level at `t` becomes the filled
/// level one lag back plus the corresponding difference. Missing levels
/// before the first lag fall back to the first observed value.
fn fill_levels(levels: &[Option<f64>], lag: usize, filled_diff: &[f64]) -> Vec<f64> {
    let fallback = levels.iter().flatten().next().copied().unwrap_or(0.0);
    let mut filled: Vec<f64> = Vec::with_capacity(levels.len());
    for (t, level) in levels.iter().enumerate() {
        let value = match level {
            Some(v) => *v,
            None if t >= lag => filled[t - lag] + filled_diff[t - lag],
            None => fallback,
        };
        filled.push(value);
    }
    filled
}

/// Expanded multiplicative lag polynomials.
#[derive(Debug, Clone)]
struct Coefficients {
    ar: Vec<f64>,
    ma: Vec<f64>,
}

impl Coefficients {
    /// Map unconstrained parameters into (-1, 1) and expand the seasonal
    /// polynomial products into flat coefficient vectors.
    fn from_params(params: &[f64], order: &SarimaOrder) -> Self {
        let constrained: Vec<f64> = params.iter().map(|v| v.tanh()).collect();
        let (ar, rest) = constrained.split_at(order.p);
        let (ma, rest) = rest.split_at(order.q);
        let (seasonal_ar, seasonal_ma) = rest.split_at(order.seasonal_p);

        // phi(B) = 1 - sum phi_i B^i, so AR coefficients carry a sign flip
        // in polynomial form; theta(B) = 1 + sum theta_i B^i does not.
        let ar_poly = polynomial_product(ar, seasonal_ar, order.period, -1.0);
        let ma_poly = polynomial_product(ma, seasonal_ma, order.period, 1.0);

        let ar_full = ar_poly.iter().skip(1).map(|c| -c).collect();
        let ma_full = ma_poly.iter().skip(1).copied().collect();
        Self {
            ar: ar_full,
            ma: ma_full,
        }
    }
}

/// Product of a non-seasonal and a seasonal lag polynomial, both written as
/// `1 + sign*c_1 B^step + ...`, returned with its leading 1.
fn polynomial_product(plain: &[f64], seasonal: &[f64], period: usize, sign: f64) -> Vec<f64> {
    let a = lag_polynomial(plain, 1, sign);
    let b = lag_polynomial(seasonal, period.max(1), sign);
    convolve(&a, &b)
}

fn lag_polynomial(coefficients: &[f64], step: usize, sign: f64) -> Vec<f64> {
    let mut poly = vec![0.0; coefficients.len() * step + 1];
    poly[0] = 1.0;
    for (i, c) in coefficients.iter().enumerate() {
        poly[(i + 1) * step] = sign * c;
    }
    poly
}

fn convolve(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

fn observed_variance(series: &[Option<f64>]) -> f64 {
    let observed: Vec<f64> = series.iter().flatten().copied().collect();
    if observed.is_empty() {
        return 0.0;
    }
    let mean = observed.iter().sum::<f64>() / observed.len() as f64;
    observed.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / observed.len() as f64
}

struct FilterOutcome {
    nll: f64,
    sigma2: f64,
    transition: DMatrix<f64>,
    state: DVector<f64>,
    predictions: Vec<f64>,
}

/// Kalman filter over an ARMA process in Harvey state-space form, with the
/// innovation variance concentrated out (the filter runs at unit variance).
/// Missing observations take the time update only.
fn kalman_filter(series: &[Option<f64>], coefficients: &Coefficients) -> FilterOutcome {
    let r = coefficients
        .ar
        .len()
        .max(coefficients.ma.len() + 1)
        .max(1);

    let mut transition = DMatrix::zeros(r, r);
    for (i, phi) in coefficients.ar.iter().enumerate() {
        transition[(i, 0)] = *phi;
    }
    for i in 0..r - 1 {
        transition[(i, i + 1)] = 1.0;
    }

    let mut impact = DVector::zeros(r);
    impact[0] = 1.0;
    for (i, theta) in coefficients.ma.iter().enumerate() {
        impact[i + 1] = *theta;
    }
    let process = &impact * impact.transpose();

    let mut state = DVector::zeros(r);
    let mut cov = stationary_covariance(&transition, &process)
        .unwrap_or_else(|| DMatrix::identity(r, r) * DIFFUSE_VARIANCE);

    let mut predictions = Vec::with_capacity(series.len());
    let mut scaled_ssq = 0.0;
    let mut log_variance_sum = 0.0;
    let mut n_observed = 0usize;

    for observation in series {
        state = &transition * &state;
        cov = &transition * &cov * transition.transpose() + &process;

        let predicted = state[0];
        predictions.push(predicted);

        if let Some(y) = observation {
            let variance = cov[(0, 0)];
            if !variance.is_finite() || variance <= 0.0 {
                return FilterOutcome {
                    nll: LARGE_COST,
                    sigma2: 0.0,
                    transition,
                    state,
                    predictions,
                };
            }

            let innovation = y - predicted;
            let gain = cov.column(0).clone_owned() / variance;
            state += &gain * innovation;
            let top_row = cov.row(0).clone_owned();
            cov -= gain * top_row;

            scaled_ssq += innovation * innovation / variance;
            log_variance_sum += variance.ln();
            n_observed += 1;
        }
    }

    if n_observed == 0 {
        return FilterOutcome {
            nll: LARGE_COST,
            sigma2: 0.0,
            transition,
            state,
            predictions,
        };
    }

    let n = n_observed as f64;
    let sigma2 = (scaled_ssq / n).max(MIN_VARIANCE);
    let nll = 0.5 * n * ((2.0 * std::f64::consts::PI).ln() + 1.0 + sigma2.ln())
        + 0.5 * log_variance_sum;

    FilterOutcome {
        nll,
        sigma2,
        transition,
        state,
        predictions,
    }
}

/// Stationary state covariance from the discrete Lyapunov equation
/// `P = T P T' + Q`, solved via vec(P) = (I - T (x) T)^{-1} vec(Q).
fn stationary_covariance(
    transition: &DMatrix<f64>,
    process: &DMatrix<f64>,
) -> Option<DMatrix<f64>> {
    let r = transition.nrows();
    let kron = transition.kronecker(transition);
    let system = DMatrix::identity(r * r, r * r) - kron;
    let q_vec = DVector::from_column_slice(process.as_slice());

    let solution = system.lu().solve(&q_vec)?;
    if solution.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let cov = DMatrix::from_column_slice(r, r, solution.as_slice());
    if cov[(0, 0)] < 0.0 {
        return None;
    }
    Some((&cov + cov.transpose()) * 0.5)
}

/// Negative log-likelihood surface for the optimizer.
#[derive(Clone)]
struct SarimaLikelihood {
    series: Vec<Option<f64>>,
    order: SarimaOrder,
}

impl SarimaLikelihood {
    fn nll(&self, params: &[f64]) -> f64 {
        if params.iter().any(|v| !v.is_finite()) {
            return LARGE_COST;
        }
        let coefficients = Coefficients::from_params(params, &self.order);
        let outcome = kalman_filter(&self.series, &coefficients);
        if outcome.nll.is_finite() {
            outcome.nll
        } else {
            LARGE_COST
        }
    }
}

impl CostFunction for SarimaLikelihood {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> std::result::Result<Self::Output, ArgminError> {
        Ok(self.nll(param))
    }
}

impl Gradient for SarimaLikelihood {
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    fn gradient(&self, param: &Self::Param) -> std::result::Result<Self::Gradient, ArgminError> {
        let mut grad = vec![0.0; param.len()];
        for i in 0..param.len() {
            let step = GRAD_STEP * (1.0 + param[i].abs());
            let mut plus = param.clone();
            let mut minus = param.clone();
            plus[i] += step;
            minus[i] -= step;
            grad[i] = (self.nll(&plus) - self.nll(&minus)) / (2.0 * step);
        }
        Ok(grad)
    }
}
