//! Numeric fallback: nested adaptive quadrature of `f·J` over the bound box.
//!
//! Samples that come out non-finite (log of a non-positive number, 0/0, overflow) are
//! replaced by 0.0 and counted. This zeroes singular contributions silently; the count is
//! reported so callers can see it happened.
use crate::Utils::config::SolverConfig;
use crate::errors::IntegraError;
use crate::numerical::adaptive_quadrature::{QuadOptions, triple_quad};
use crate::symbolic::coordinate_transform::CoordinateSystem;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_triple::IntegrationLimits;
use log::{info, warn};
use std::cell::Cell;

pub const METHOD_NAME: &str = "Numeric (Gauss-Kronrod)";

#[derive(Debug, Clone, PartialEq)]
pub struct NumericOutcome {
    pub value: f64,
    pub error_estimate: f64,
    pub evaluations: usize,
    /// samples replaced by 0.0
    pub zeroed_samples: usize,
    pub notes: Vec<String>,
}

impl From<&SolverConfig> for QuadOptions {
    fn from(config: &SolverConfig) -> Self {
        QuadOptions {
            epsabs: config.epsabs,
            epsrel: config.epsrel,
            limit: config.max_subdivisions,
        }
    }
}

/// Integrates `expr·jacobian` numerically; `expr` is in the native variables of `system`.
/// The x-slot variable is the outermost one.
pub fn integrate_numeric(
    expr: &Expr,
    jacobian: &Expr,
    limits: &IntegrationLimits,
    system: CoordinateSystem,
    config: &SolverConfig,
) -> Result<NumericOutcome, IntegraError> {
    let spec = system.spec();
    let integrand = expr.clone() * jacobian.clone();
    let compiled = integrand.compile(&spec.slot_variables)?;
    let [x, y, z] = limits.numeric()?;
    let options = QuadOptions::from(config);

    let zeroed = Cell::new(0usize);
    let guarded = |u: f64, v: f64, w: f64| {
        let value = compiled.eval(&[u, v, w]);
        if value.is_finite() {
            value
        } else {
            zeroed.set(zeroed.get() + 1);
            0.0
        }
    };
    info!(
        "numeric pass ({}): {} over {:?} x {:?} x {:?}",
        system, integrand, x, y, z
    );
    let result = triple_quad(guarded, x, y, z, &options)?;

    if result.evaluations > 0 && zeroed.get() == result.evaluations {
        return Err(IntegraError::numeric_failure(format!(
            "all {} samples of {} were non-finite",
            result.evaluations, integrand
        )));
    }
    if zeroed.get() > 0 {
        warn!(
            "{} of {} samples were non-finite and counted as 0",
            zeroed.get(),
            result.evaluations
        );
    }

    let mut notes = vec![
        format!("{} over {:?} x {:?} x {:?}", METHOD_NAME, x, y, z),
        format!(
            "epsabs = {:e}, epsrel = {:e}, limit = {}",
            options.epsabs, options.epsrel, options.limit
        ),
        format!("{} evaluations", result.evaluations),
    ];
    if zeroed.get() > 0 {
        notes.push(format!("{} non-finite samples replaced by 0", zeroed.get()));
    }
    if result.unconverged_inner > 0 {
        notes.push(format!(
            "{} inner integrations stopped above tolerance",
            result.unconverged_inner
        ));
    }
    info!(
        "numeric pass done: {} ± {:e}",
        result.value, result.error
    );
    Ok(NumericOutcome {
        value: result.value,
        error_estimate: result.error,
        evaluations: result.evaluations,
        zeroed_samples: zeroed.get(),
        notes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::coordinate_transform::transform;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn numeric(text: &str, limits: &IntegrationLimits, system: CoordinateSystem) -> Result<NumericOutcome, IntegraError> {
        let parsed = Expr::parse_expression(text).unwrap();
        let (expr, jacobian) = transform(&parsed, system);
        integrate_numeric(&expr, &jacobian, limits, system, &SolverConfig::default())
    }

    #[test]
    fn test_no_closed_form_integrand() {
        let outcome = numeric("exp(y^2)", &IntegrationLimits::default(), CoordinateSystem::Cartesian).unwrap();
        assert_relative_eq!(outcome.value, 1.4626517459071816, epsilon = 1e-10);
        assert!(outcome.error_estimate.is_finite());
        assert_eq!(outcome.zeroed_samples, 0);
    }

    #[test]
    fn test_removable_singularity_on_a_node() {
        // the center node of the first rule lands on x = 0 where sin(x)/x is 0/0
        let limits = IntegrationLimits::new((-1.0, 1.0), (0.0, 1.0), (0.0, 1.0));
        let outcome = numeric("sin(x)/x", &limits, CoordinateSystem::Cartesian).unwrap();
        assert!(outcome.zeroed_samples > 0);
        assert_relative_eq!(outcome.value, 1.892166140734366, epsilon = 1e-9);
    }

    #[test]
    fn test_log_singularity_is_finite() {
        let limits = IntegrationLimits::new((-1.0, 1.0), (0.0, 1.0), (0.0, 1.0));
        let outcome = numeric("log(abs(x))", &limits, CoordinateSystem::Cartesian).unwrap();
        assert_relative_eq!(outcome.value, -2.0, epsilon = 1e-8);
        // log(x) is NaN on the negative half and -inf at 0: those samples are zeroed
        let outcome = numeric("log(x)", &limits, CoordinateSystem::Cartesian).unwrap();
        assert!(outcome.value.is_finite());
        assert!(outcome.zeroed_samples > 0);
        assert_relative_eq!(outcome.value, -1.0, epsilon = 1e-8);
    }

    #[test]
    fn test_cylinder_volume_numeric() {
        let limits = IntegrationLimits::default_for(CoordinateSystem::Cylindrical);
        let outcome = numeric("1", &limits, CoordinateSystem::Cylindrical).unwrap();
        assert_relative_eq!(outcome.value, 12.0 * PI, epsilon = 1e-9);
        assert!(outcome.notes[0].starts_with(METHOD_NAME));
    }

    #[test]
    fn test_every_sample_non_finite_fails() {
        let result = numeric("log(-1 - x^2)", &IntegrationLimits::default(), CoordinateSystem::Cartesian);
        assert!(matches!(
            result,
            Err(IntegraError::NumericConvergenceFailure { .. })
        ));
    }

    #[test]
    fn test_unknown_variable_is_an_evaluation_error() {
        let result = numeric("x*ρ", &IntegrationLimits::default(), CoordinateSystem::Cartesian);
        assert!(matches!(result, Err(IntegraError::EvaluationFailure(_))));
    }
}
