//! Entry points of the solver.
//!
//! ```rust, ignore
//! use RustedIntegra::numerical::Integral_api::solve;
//! use RustedIntegra::symbolic::coordinate_transform::CoordinateSystem;
//! use RustedIntegra::symbolic::symbolic_triple::IntegrationLimits;
//! use RustedIntegra::Utils::config::SolverConfig;
//! let limits = IntegrationLimits::from_text(("0", "1"), ("0", "2*pi"), ("0", "pi")).unwrap();
//! let result = solve("1", &limits, CoordinateSystem::Spherical, &SolverConfig::default());
//! assert!(result.success);
//! ```
//! `solve` always tries the stepwise symbolic integrator first and falls back to nested
//! adaptive quadrature once; the symbolic trace is returned either way.
use crate::Utils::config::SolverConfig;
use crate::Utils::logger::{elapsed_time, init_logger, statistics_table};
use crate::errors::IntegraError;
use crate::numerical::numeric_triple::integrate_numeric;
use crate::numerical::visualization::{Sampler, VisualizationPayload};
use crate::symbolic::coordinate_transform::{CoordinateSystem, transform};
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_triple::{
    IntegrationLimits, IntegrationStep, SymbolicOutcome, integrate_symbolic,
};
use log::{error, info, warn};
use rayon::prelude::*;
use std::time::{Duration, Instant};
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Method {
    #[strum(to_string = "Symbolic")]
    Symbolic,
    #[strum(to_string = "Numeric (Gauss-Kronrod)")]
    Numeric,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolveResult {
    pub success: bool,
    pub value: Option<f64>,
    /// closed form, symbolic path only
    pub exact: Option<Expr>,
    pub latex: Option<String>,
    pub method: Option<Method>,
    /// symbolic trace, complete or up to the failing step
    pub steps: Vec<IntegrationStep>,
    pub elapsed: Duration,
    pub coordinate_system: CoordinateSystem,
    pub jacobian: Expr,
    /// error bound of the numeric path
    pub error_estimate: Option<f64>,
    /// why the symbolic path gave up, when the numeric path took over
    pub symbolic_failure: Option<IntegraError>,
    pub numeric_notes: Vec<String>,
    pub error: Option<IntegraError>,
}

impl SolveResult {
    fn empty(system: CoordinateSystem) -> Self {
        SolveResult {
            success: false,
            value: None,
            exact: None,
            latex: None,
            method: None,
            steps: Vec::new(),
            elapsed: Duration::ZERO,
            coordinate_system: system,
            jacobian: system.spec().jacobian(),
            error_estimate: None,
            symbolic_failure: None,
            numeric_notes: Vec::new(),
            error: None,
        }
    }

    /// name/value rows for the statistics table
    pub fn summary_rows(&self) -> Vec<(String, String)> {
        let mut rows = vec![
            ("coordinate system".to_string(), self.coordinate_system.to_string()),
            ("jacobian".to_string(), self.jacobian.to_string()),
            ("success".to_string(), self.success.to_string()),
        ];
        if let Some(method) = self.method {
            rows.push(("method".to_string(), method.to_string()));
        }
        if let Some(value) = self.value {
            rows.push(("value".to_string(), value.to_string()));
        }
        if let Some(exact) = &self.exact {
            rows.push(("exact".to_string(), exact.to_string()));
        }
        if let Some(estimate) = self.error_estimate {
            rows.push(("error estimate".to_string(), format!("{:e}", estimate)));
        }
        let completed = self.steps.iter().filter(|s| s.is_completed()).count();
        rows.push((
            "symbolic steps completed".to_string(),
            format!("{} of 3", completed),
        ));
        if let Some(reason) = &self.symbolic_failure {
            rows.push(("symbolic failure".to_string(), reason.to_string()));
        }
        if let Some(err) = &self.error {
            rows.push(("error".to_string(), err.to_string()));
        }
        rows.push((
            "elapsed, ms".to_string(),
            self.elapsed.as_millis().to_string(),
        ));
        rows
    }
}

/// Integrates `text` over `limits`: symbolic first, numeric once if that fails.
pub fn solve(
    text: &str,
    limits: &IntegrationLimits,
    system: CoordinateSystem,
    config: &SolverConfig,
) -> SolveResult {
    let start = Instant::now();
    let mut result = SolveResult::empty(system);
    let parsed = match Expr::parse_expression(text) {
        Ok(expr) => expr,
        Err(err) => {
            error!("{}", err);
            result.error = Some(err);
            result.elapsed = start.elapsed();
            return result;
        }
    };
    let (expr, jacobian) = transform(&parsed, system);
    result.jacobian = jacobian.clone();

    let reason = match integrate_symbolic(&expr, &jacobian, limits, system, config) {
        SymbolicOutcome::Solved {
            exact,
            value,
            steps,
        } => {
            result.success = true;
            result.value = Some(value);
            result.latex = Some(exact.to_latex());
            result.exact = Some(exact);
            result.method = Some(Method::Symbolic);
            result.steps = steps;
            result.elapsed = start.elapsed();
            return result;
        }
        SymbolicOutcome::Failed { reason, steps } => {
            result.steps = steps;
            reason
        }
    };

    warn!("symbolic integration failed ({}), switching to numeric", reason);
    match integrate_numeric(&expr, &jacobian, limits, system, config) {
        Ok(numeric) => {
            result.success = true;
            result.value = Some(numeric.value);
            result.latex = Some(Expr::Const(numeric.value).to_latex());
            result.method = Some(Method::Numeric);
            result.error_estimate = Some(numeric.error_estimate);
            result.numeric_notes = numeric.notes;
        }
        Err(numeric_err) => {
            let err = numeric_err.with_symbolic_reason(&reason);
            error!("{}", err);
            result.error = Some(err);
        }
    }
    result.symbolic_failure = Some(reason);
    result.elapsed = start.elapsed();
    result
}

/// Solves independent requests on the rayon pool; results keep the input order.
pub fn solve_many(tasks: &[TripleIntegral]) -> Vec<SolveResult> {
    tasks
        .par_iter()
        .map(|task| solve(&task.function, &task.limits, task.system, &task.config))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Validation {
    pub valid: bool,
    pub canonical_form: Option<String>,
    pub rendered_form: Option<String>,
    pub free_variables: Vec<String>,
    pub error: Option<IntegraError>,
}

/// Parse-only check of a function text.
pub fn validate(text: &str) -> Validation {
    match Expr::parse_expression(text) {
        Ok(expr) => Validation {
            valid: true,
            canonical_form: Some(expr.to_string()),
            rendered_form: Some(expr.to_latex()),
            free_variables: expr.free_variables().into_iter().collect(),
            error: None,
        },
        Err(err) => Validation {
            valid: false,
            canonical_form: None,
            rendered_form: None,
            free_variables: Vec::new(),
            error: Some(err),
        },
    }
}

/// Sample data for rendering `text` over the box of `limits`.
pub fn sample(
    text: &str,
    limits: &IntegrationLimits,
    system: CoordinateSystem,
    resolution: usize,
) -> Result<VisualizationPayload, IntegraError> {
    sample_with_config(
        text,
        limits,
        system,
        &SolverConfig {
            resolution,
            ..SolverConfig::default()
        },
    )
}

/// Like [`sample`], taking resolution and seed from `config`.
pub fn sample_with_config(
    text: &str,
    limits: &IntegrationLimits,
    system: CoordinateSystem,
    config: &SolverConfig,
) -> Result<VisualizationPayload, IntegraError> {
    let parsed = Expr::parse_expression(text)?;
    let (expr, _) = transform(&parsed, system);
    let sampler = Sampler::new(&expr, limits, system, config.resolution, config.seed)?;
    Ok(sampler.payload())
}

/// A triple integral task: input, configuration and, after `solve`, the result.
#[derive(Debug, Clone)]
pub struct TripleIntegral {
    pub function: String,
    pub limits: IntegrationLimits,
    pub system: CoordinateSystem,
    pub config: SolverConfig,
    /// "debug", "info", "warn", "error" or "off"; None means info
    pub loglevel: Option<String>,
    pub result: Option<SolveResult>,
}

impl TripleIntegral {
    pub fn new(function: &str, limits: IntegrationLimits, system: CoordinateSystem) -> Self {
        TripleIntegral {
            function: function.to_string(),
            limits,
            system,
            config: SolverConfig::default(),
            loglevel: None,
            result: None,
        }
    }

    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_loglevel(mut self, loglevel: &str) -> Self {
        self.loglevel = Some(loglevel.to_string());
        self
    }

    /// Installs the terminal logger, solves and logs the statistics table.
    pub fn solve(&mut self) -> &SolveResult {
        if let Err(err) = init_logger(self.loglevel.as_deref()) {
            match init_logger(None) {
                Ok(_) => warn!("{}; logging at info level", err),
                Err(fallback) => eprintln!("{}; {}", err, fallback),
            }
        }
        info!(
            "solving ∫∫∫ {} in {} coordinates",
            self.function, self.system
        );
        let result = solve(&self.function, &self.limits, self.system, &self.config);
        elapsed_time(result.elapsed);
        info!(
            "\n \n CALC STATISTICS \n \n {}",
            statistics_table(&result.summary_rows())
        );
        for step in &result.steps {
            info!("{}", step);
        }
        self.result.insert(result)
    }

    pub fn get_result(&self) -> Option<&SolveResult> {
        self.result.as_ref()
    }

    pub fn sample(&self) -> Result<VisualizationPayload, IntegraError> {
        sample_with_config(&self.function, &self.limits, self.system, &self.config)
    }
}
