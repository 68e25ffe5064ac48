//! Fitting diffusion models to measured profiles.
//!
//! A [`ResidualModel`] turns a [`ParameterSet`] into `model - observed`.
//! [`fit`] hands the free parameters of the set to the Levenberg-Marquardt
//! minimizer through [`ParameterProblem`], which re-derives linked
//! parameters at every evaluation, and writes the best-fit values and
//! standard errors back into the set.

use log::{debug, info, warn};
use ndarray::{Array1, Array2};
use std::fmt;

use crate::diffusion::{
    check_paired, residuals_1d, residuals_3d_npi, residuals_3d_wb, Observation, ProfileOptions, RayPaths,
};
use crate::error::{DiffusionError, Result};
use crate::lm::{ConvergenceStatus, LevenbergMarquardt, LmConfig};
use crate::parameters::ParameterSet;
use crate::problem::Problem;
use crate::setup::{names, BlockParams, Profile1dSetup};
use crate::uncertainty::{calculate_correlation, standard_errors_from_covariance, UncertaintyCalculator};

/// Anything that compares a parameterized model with data.
pub trait ResidualModel: Sync {
    /// `model - observed` for the given parameter values.
    fn residuals(&self, params: &ParameterSet) -> Result<Array1<f64>>;

    /// Length of the vector returned by [`residuals`](Self::residuals).
    fn residual_count(&self) -> usize;
}

/// Adapts a [`ResidualModel`] to the optimizer's flat [`Problem`] interface.
///
/// The optimizer sees only the free parameters, in the internal (bounds
/// transformed) space. Fixed and linked parameters come from the template.
pub struct ParameterProblem<'a, M: ResidualModel> {
    model: &'a M,
    template: ParameterSet,
    free_count: usize,
}

impl<'a, M: ResidualModel> ParameterProblem<'a, M> {
    pub fn new(model: &'a M, template: ParameterSet) -> Self {
        let free_count = template.free_count();
        Self {
            model,
            template,
            free_count,
        }
    }

    /// The template with `internal` written into its free parameters.
    pub fn parameters_at(&self, internal: &Array1<f64>) -> Result<ParameterSet> {
        let mut params = self.template.clone();
        params.set_free_internal_values(&internal.to_vec())?;
        Ok(params)
    }

    /// Starting point of the template in internal space.
    pub fn initial_internal(&self) -> Result<Array1<f64>> {
        Ok(Array1::from(self.template.free_internal_values()?))
    }
}

impl<M: ResidualModel> Problem for ParameterProblem<'_, M> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let set = self.parameters_at(params)?;
        self.model.residuals(&set)
    }

    fn parameter_count(&self) -> usize {
        self.free_count
    }

    fn residual_count(&self) -> usize {
        self.model.residual_count()
    }
}

/// Outcome of a successful [`fit`].
#[derive(Debug, Clone)]
pub struct FitReport {
    /// Always true for a returned report; failures are errors
    pub success: bool,
    pub status: ConvergenceStatus,
    pub message: String,
    /// Number of accepted optimizer steps
    pub iterations: usize,
    pub func_evals: usize,
    /// Number of residuals
    pub ndata: usize,
    /// Number of free parameters
    pub nvarys: usize,
    /// Residual sum of squares at the solution
    pub rss: f64,
    /// `rss / (ndata - nvarys)`, NaN when there are no degrees of freedom
    pub redchi: f64,
    /// Names of the free parameters, in covariance order
    pub free_names: Vec<String>,
    /// Covariance of the free parameters in external units
    pub covariance: Option<Array2<f64>>,
    /// Correlation of the free parameters, same order as `free_names`
    pub correlation: Option<Array2<f64>>,
    pub residuals: Array1<f64>,
    /// The fitted set, with standard errors on the free parameters
    pub params: ParameterSet,
}

impl FitReport {
    /// Standard error of a free parameter.
    pub fn stderr(&self, name: &str) -> Option<f64> {
        self.params.stderr(name).ok().flatten()
    }

    /// Correlation between two free parameters.
    pub fn correlation(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.free_names.iter().position(|n| n == a)?;
        let j = self.free_names.iter().position(|n| n == b)?;
        self.correlation.as_ref().map(|c| c[[i, j]])
    }
}

impl fmt::Display for FitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Fit Report:")?;
        writeln!(f, "  Message: {}", self.message)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.func_evals)?;
        writeln!(f, "  Data points: {}, free parameters: {}", self.ndata, self.nvarys)?;
        writeln!(f, "  Residual sum of squares: {:.6e}", self.rss)?;
        writeln!(f, "  Reduced chi-square: {:.6e}", self.redchi)?;
        for param in self.params.iter() {
            match param.stderr {
                Some(stderr) => writeln!(f, "  {} = {:.6} +/- {:.6}", param.name(), param.value(), stderr)?,
                None => writeln!(f, "  {} = {:.6}", param.name(), param.value())?,
            }
        }
        if let Some(correlation) = &self.correlation {
            for i in 0..self.nvarys {
                for j in (i + 1)..self.nvarys {
                    writeln!(
                        f,
                        "  C({}, {}) = {:+.4}",
                        self.free_names[i], self.free_names[j], correlation[[i, j]]
                    )?;
                }
            }
        }
        Ok(())
    }
}

/// Least-squares fit of `model` over the free parameters of `params`.
///
/// On success the best-fit values are written into `params`, free
/// parameters get a standard error, and fixed and linked parameters have
/// theirs cleared. On failure `params` is left untouched and the error says
/// why: [`DiffusionError::ConvergenceFailure`] when the optimizer stopped
/// without converging, [`DiffusionError::SingularMatrix`] when a free
/// parameter has no effect on the residuals at the solution.
///
/// # Examples
///
/// ```
/// use hydiff_rs::diffusion::{evaluate_1d, ProfileOptions};
/// use hydiff_rs::fit::{fit, Profile1dData};
/// use hydiff_rs::lm::LmConfig;
/// use hydiff_rs::setup::{names, setup_1d};
///
/// let truth = setup_1d(200.0, -13.0, 3600.0).unwrap();
/// let profile = evaluate_1d(&truth, &ProfileOptions::default()).unwrap();
/// let data = Profile1dData::new(profile.positions.to_vec(), profile.values.to_vec())
///     .unwrap()
///     .with_options(ProfileOptions::default().with_center_positions(false));
///
/// let mut params = setup_1d(200.0, -13.5, 3600.0).unwrap();
/// fit(&mut params, &data, &LmConfig::default()).unwrap();
/// assert!((params.value(names::LOG10_DIFFUSIVITY).unwrap() + 13.0).abs() < 1e-3);
/// ```
pub fn fit<M: ResidualModel>(params: &mut ParameterSet, model: &M, config: &LmConfig) -> Result<FitReport> {
    let nvarys = params.free_count();
    if nvarys == 0 {
        return Err(DiffusionError::InvalidInput(
            "no free parameters to fit".to_string(),
        ));
    }
    let free_names = params.free_names();
    debug!("fit: {} free parameters {:?}, {} residuals", nvarys, free_names, model.residual_count());

    let problem = ParameterProblem::new(model, params.clone());
    let result = LevenbergMarquardt::with_config(config.clone()).minimize(&problem, problem.initial_internal()?)?;
    if !result.success {
        return Err(DiffusionError::ConvergenceFailure {
            message: result.message,
            iterations: result.iterations,
        });
    }

    let mut fitted = problem.parameters_at(&result.params)?;
    let ndata = result.residuals.len();
    let (redchi, covariance) = match UncertaintyCalculator::new(ndata, nvarys, result.cost) {
        Some(calc) => {
            let internal = calc.calculate_covariance(&result.jacobian)?;
            // Chain rule from internal to external parameter space
            let scale = fitted.free_derivatives()?;
            let external = Array2::from_shape_fn((nvarys, nvarys), |(i, j)| scale[i] * internal[[i, j]] * scale[j]);
            (calc.redchi, Some(external))
        }
        None => {
            warn!(
                "fit: {} residuals for {} free parameters, standard errors are undefined",
                ndata, nvarys
            );
            (f64::NAN, None)
        }
    };

    let stderrs = covariance.as_ref().map(standard_errors_from_covariance);
    let correlation = covariance.as_ref().map(calculate_correlation);
    for name in fitted.names() {
        let stderr = free_names
            .iter()
            .position(|free| *free == name)
            .and_then(|i| stderrs.as_ref().map(|e| e[i]));
        fitted.set_stderr(&name, stderr)?;
    }

    info!(
        "fit: {} after {} iterations, rss {:.6e}",
        result.message, result.iterations, result.cost
    );
    *params = fitted.clone();

    Ok(FitReport {
        success: true,
        status: result.status,
        message: result.message,
        iterations: result.iterations,
        func_evals: result.func_evals,
        ndata,
        nvarys,
        rss: result.cost,
        redchi,
        free_names,
        covariance,
        correlation,
        residuals: result.residuals,
        params: fitted,
    })
}

/// Residuals of `model` at `params` and their sum of squares, without fitting.
pub fn diffusion_residuals<M: ResidualModel>(params: &ParameterSet, model: &M) -> Result<(Array1<f64>, f64)> {
    let residuals = model.residuals(params)?;
    let rss: f64 = residuals.iter().map(|r| r * r).sum();
    Ok((residuals, rss))
}

/// One measured profile across a slab.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile1dData {
    pub observation: Observation,
    pub options: ProfileOptions,
}

impl Profile1dData {
    /// Positions are microns from one face unless the options say otherwise.
    pub fn new(positions_microns: Vec<f64>, values: Vec<f64>) -> Result<Self> {
        Ok(Self {
            observation: Observation::new(positions_microns, values)?,
            options: ProfileOptions::default(),
        })
    }

    pub fn with_options(mut self, options: ProfileOptions) -> Self {
        self.options = options;
        self
    }
}

impl ResidualModel for Profile1dData {
    fn residuals(&self, params: &ParameterSet) -> Result<Array1<f64>> {
        residuals_1d(
            params,
            &self.observation.positions,
            &self.observation.values,
            &self.options,
        )
    }

    fn residual_count(&self) -> usize {
        self.observation.len()
    }
}

/// Best fit of a single profile.
#[derive(Debug, Clone)]
pub struct ProfileFit {
    pub log10_diffusivity: f64,
    pub log10_diffusivity_stderr: Option<f64>,
    pub initial_value: f64,
    pub initial_value_stderr: Option<f64>,
    pub rss: f64,
    pub report: FitReport,
}

/// Fit the diffusivity (and, if the setup says so, the initial and final
/// levels) of one profile, starting from the values in `setup`.
pub fn fit_profile_1d(data: &Profile1dData, setup: &Profile1dSetup, config: &LmConfig) -> Result<ProfileFit> {
    let mut params = setup.build()?;
    let report = fit(&mut params, data, config)?;
    let (_, rss) = diffusion_residuals(&params, data)?;

    info!(
        "profile fit: log10 D = {:.3} m2/s, initial value {:.3}, rss {:.4}",
        params.value(names::LOG10_DIFFUSIVITY)?,
        params.value(names::INITIAL_VALUE)?,
        rss
    );
    Ok(ProfileFit {
        log10_diffusivity: params.value(names::LOG10_DIFFUSIVITY)?,
        log10_diffusivity_stderr: params.stderr(names::LOG10_DIFFUSIVITY)?,
        initial_value: params.value(names::INITIAL_VALUE)?,
        initial_value_stderr: params.stderr(names::INITIAL_VALUE)?,
        rss,
        report,
    })
}

fn check_three(observations: &[Observation]) -> Result<[Observation; 3]> {
    for obs in observations {
        check_paired(obs.positions.len(), obs.values.len())?;
    }
    observations.to_vec().try_into().map_err(|v: Vec<Observation>| {
        DiffusionError::DimensionMismatch(format!(
            "expected observations along 3 axes, got {}",
            v.len()
        ))
    })
}

/// Whole-block profiles measured along a, b and c.
#[derive(Debug, Clone, PartialEq)]
pub struct WholeBlockData {
    pub observations: [Observation; 3],
    pub raypaths: RayPaths,
    pub options: ProfileOptions,
    /// Positions run from `-L/2` to `L/2` instead of from the face.
    pub centered_positions: bool,
}

impl WholeBlockData {
    pub fn new(observations: &[Observation], raypaths: RayPaths) -> Result<Self> {
        Ok(Self {
            observations: check_three(observations)?,
            raypaths,
            options: ProfileOptions::default(),
            centered_positions: false,
        })
    }

    pub fn with_options(mut self, options: ProfileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_centered_positions(mut self, centered: bool) -> Self {
        self.centered_positions = centered;
        self
    }
}

impl ResidualModel for WholeBlockData {
    fn residuals(&self, params: &ParameterSet) -> Result<Array1<f64>> {
        if !self.centered_positions {
            return residuals_3d_wb(params, &self.raypaths, &self.observations, &self.options);
        }

        let lengths = BlockParams::from_set(params)?.lengths;
        let shifted: Vec<Observation> = self
            .observations
            .iter()
            .zip(lengths.iter())
            .map(|(obs, length)| Observation {
                positions: obs.positions.iter().map(|x| x + length / 2.0).collect(),
                values: obs.values.clone(),
            })
            .collect();
        residuals_3d_wb(params, &self.raypaths, &shifted, &self.options)
    }

    fn residual_count(&self) -> usize {
        self.observations.iter().map(Observation::len).sum()
    }
}

/// Centerline profiles along a, b and c of a sectioned block.
#[derive(Debug, Clone, PartialEq)]
pub struct NpiData {
    pub observations: [Observation; 3],
    pub options: ProfileOptions,
}

impl NpiData {
    pub fn new(observations: &[Observation]) -> Result<Self> {
        Ok(Self {
            observations: check_three(observations)?,
            options: ProfileOptions::default(),
        })
    }

    pub fn with_options(mut self, options: ProfileOptions) -> Self {
        self.options = options;
        self
    }
}

impl ResidualModel for NpiData {
    fn residuals(&self, params: &ParameterSet) -> Result<Array1<f64>> {
        residuals_3d_npi(params, &self.observations, &self.options)
    }

    fn residual_count(&self) -> usize {
        self.observations.iter().map(Observation::len).sum()
    }
}

/// Per-axis diffusivities of a whole-block fit.
#[derive(Debug, Clone)]
pub struct WholeBlockFit {
    pub log10_diffusivities: [f64; 3],
    /// `None` for diffusivities that were fixed or linked
    pub stderrs: [Option<f64>; 3],
    pub initial_value: f64,
    pub report: FitReport,
}

/// Fit the three diffusivities of a block, honoring the linkage and fixed
/// parameters already present in `params`.
pub fn fit_whole_block(data: &WholeBlockData, params: &mut ParameterSet, config: &LmConfig) -> Result<WholeBlockFit> {
    let report = fit(params, data, config)?;

    let mut log10_diffusivities = [0.0; 3];
    let mut stderrs = [None; 3];
    for (k, name) in names::LOG10_DIFFUSIVITIES.iter().enumerate() {
        log10_diffusivities[k] = params.value(name)?;
        stderrs[k] = params.stderr(name)?;
    }
    info!(
        "whole-block fit ({}): log10 D = {:.3}, {:.3}, {:.3}",
        data.raypaths, log10_diffusivities[0], log10_diffusivities[1], log10_diffusivities[2]
    );

    Ok(WholeBlockFit {
        log10_diffusivities,
        stderrs,
        initial_value: params.value(names::INITIAL_VALUE)?,
        report,
    })
}
