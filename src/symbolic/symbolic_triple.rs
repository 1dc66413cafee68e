//! Stepwise definite triple integration with an inspectable trace.
//!
//! The integrand `f·J` is integrated one native variable at a time, innermost first, in the
//! order fixed by the coordinate system. Every attempt is recorded as an [`IntegrationStep`];
//! a failed attempt ends the pass but the steps completed before it are kept.
//!
//! The wall-time ceiling is checked before each step after the first and once more after the
//! last one, never inside a step.
use crate::Utils::config::SolverConfig;
use crate::errors::IntegraError;
use crate::symbolic::coordinate_transform::CoordinateSystem;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::utils::round_to_significant;
use log::{debug, info, warn};
use std::fmt;
use std::time::{Duration, Instant};

/// Bound pairs of the x-, y- and z-slot. Each bound is a variable-free expression.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrationLimits {
    pub x: (Expr, Expr),
    pub y: (Expr, Expr),
    pub z: (Expr, Expr),
}

/// Missing bounds mean the unit box [0,1]³.
impl Default for IntegrationLimits {
    fn default() -> Self {
        let unit = (Expr::Const(0.0), Expr::Const(1.0));
        IntegrationLimits {
            x: unit.clone(),
            y: unit.clone(),
            z: unit,
        }
    }
}

impl IntegrationLimits {
    pub fn new(x: (f64, f64), y: (f64, f64), z: (f64, f64)) -> Self {
        let pair = |(lo, hi): (f64, f64)| (Expr::Const(lo), Expr::Const(hi));
        IntegrationLimits {
            x: pair(x),
            y: pair(y),
            z: pair(z),
        }
    }

    /// Parses bounds such as `"0"` or `"2*pi"`. A bound with a free variable is rejected.
    pub fn from_text(x: (&str, &str), y: (&str, &str), z: (&str, &str)) -> Result<Self, IntegraError> {
        let bound = |text: &str| -> Result<Expr, IntegraError> {
            let expr = Expr::parse_expression(text)?;
            let free = expr.free_variables();
            if !free.is_empty() {
                return Err(IntegraError::parse_error(
                    text,
                    format!("integration bounds must be numbers, found variables {:?}", free),
                ));
            }
            Ok(expr.simplify())
        };
        Ok(IntegrationLimits {
            x: (bound(x.0)?, bound(x.1)?),
            y: (bound(y.0)?, bound(y.1)?),
            z: (bound(z.0)?, bound(z.1)?),
        })
    }

    /// The default region of a coordinate system (cylinder, ball, box).
    pub fn default_for(system: CoordinateSystem) -> Self {
        let [x, y, z] = system
            .spec()
            .default_limits
            .map(|(lo, hi)| (lo.to_expr(), hi.to_expr()));
        IntegrationLimits { x, y, z }
    }

    pub fn slot(&self, index: usize) -> &(Expr, Expr) {
        match index {
            0 => &self.x,
            1 => &self.y,
            _ => &self.z,
        }
    }

    /// Bounds as numbers, slot order.
    pub fn numeric(&self) -> Result<[(f64, f64); 3], IntegraError> {
        let mut out = [(0.0, 0.0); 3];
        for (i, pair) in out.iter_mut().enumerate() {
            let (lo, hi) = self.slot(i);
            *pair = (lo.eval_constant()?, hi.eval_constant()?);
        }
        Ok(out)
    }
}

/// One entry of the audit trail.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrationStep {
    pub variable: String,
    pub lower: Expr,
    pub upper: Expr,
    pub integrand: Expr,
    pub result: Option<Expr>,
    pub failure: Option<String>,
}

impl IntegrationStep {
    pub fn is_completed(&self) -> bool {
        self.result.is_some()
    }
}

impl fmt::Display for IntegrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "∫ d{} over [{}, {}] of {}",
            self.variable, self.lower, self.upper, self.integrand
        )?;
        match (&self.result, &self.failure) {
            (Some(result), _) => write!(f, " = {}", result),
            (None, Some(failure)) => write!(f, " failed: {}", failure),
            (None, None) => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SymbolicOutcome {
    Solved {
        exact: Expr,
        value: f64,
        steps: Vec<IntegrationStep>,
    },
    Failed {
        reason: IntegraError,
        steps: Vec<IntegrationStep>,
    },
}

impl SymbolicOutcome {
    pub fn steps(&self) -> &[IntegrationStep] {
        match self {
            SymbolicOutcome::Solved { steps, .. } | SymbolicOutcome::Failed { steps, .. } => steps,
        }
    }

    pub fn is_solved(&self) -> bool {
        matches!(self, SymbolicOutcome::Solved { .. })
    }
}

fn check_ceiling(elapsed: Duration, config: &SolverConfig) -> Result<(), IntegraError> {
    if elapsed > config.timeout {
        return Err(IntegraError::SymbolicTimeout {
            elapsed_secs: elapsed.as_secs_f64(),
            ceiling_secs: config.timeout.as_secs_f64(),
        });
    }
    Ok(())
}

/// Integrates `expr·jacobian` over `limits` in the fixed variable order of `system`.
///
/// `expr` must already be written in the native variables of `system`
/// (see [`crate::symbolic::coordinate_transform::transform`]).
pub fn integrate_symbolic(
    expr: &Expr,
    jacobian: &Expr,
    limits: &IntegrationLimits,
    system: CoordinateSystem,
    config: &SolverConfig,
) -> SymbolicOutcome {
    let spec = system.spec();
    let start = Instant::now();
    let mut current = (expr.clone() * jacobian.clone()).simplify();
    let mut steps: Vec<IntegrationStep> = Vec::with_capacity(3);
    info!("symbolic pass ({}): integrand {}", system, current);

    for (index, &slot) in spec.integration_order.iter().enumerate() {
        let variable = spec.slot_variables[slot];
        let (lower, upper) = limits.slot(slot);
        let mut step = IntegrationStep {
            variable: variable.to_string(),
            lower: lower.clone(),
            upper: upper.clone(),
            integrand: current.clone(),
            result: None,
            failure: None,
        };

        if index > 0 {
            if let Err(reason) = check_ceiling(start.elapsed(), config) {
                warn!("step {} (d{}): {}", index + 1, variable, reason);
                step.failure = Some(reason.to_string());
                steps.push(step);
                return SymbolicOutcome::Failed { reason, steps };
            }
        }

        match current.definite_integrate(variable, lower, upper) {
            Ok(result) => {
                debug!("step {} (d{}): {}", index + 1, variable, result);
                step.result = Some(result.clone());
                steps.push(step);
                current = result;
            }
            Err(reason) => {
                warn!("step {} (d{}): {}", index + 1, variable, reason);
                step.failure = Some(reason.to_string());
                steps.push(step);
                return SymbolicOutcome::Failed { reason, steps };
            }
        }
    }

    // an overrunning last step also hands over to the numeric path
    if let Err(reason) = check_ceiling(start.elapsed(), config) {
        warn!("after step {}: {}", steps.len(), reason);
        return SymbolicOutcome::Failed { reason, steps };
    }

    match current.eval_constant() {
        Ok(value) => {
            let value = round_to_significant(value, config.precision_digits);
            info!("symbolic pass done: {} = {}", current, value);
            SymbolicOutcome::Solved {
                exact: current,
                value,
                steps,
            }
        }
        Err(reason) => {
            warn!("symbolic result {} cannot be evaluated: {}", current, reason);
            SymbolicOutcome::Failed { reason, steps }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::coordinate_transform::transform;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn run(text: &str, limits: &IntegrationLimits, system: CoordinateSystem) -> SymbolicOutcome {
        let parsed = Expr::parse_expression(text).unwrap();
        let (expr, jacobian) = transform(&parsed, system);
        integrate_symbolic(&expr, &jacobian, limits, system, &SolverConfig::default())
    }

    fn value_of(outcome: &SymbolicOutcome) -> f64 {
        match outcome {
            SymbolicOutcome::Solved { value, .. } => *value,
            SymbolicOutcome::Failed { reason, .. } => panic!("symbolic pass failed: {}", reason),
        }
    }

    #[test]
    fn test_unit_cube_is_exactly_one() {
        let outcome = run("1", &IntegrationLimits::default(), CoordinateSystem::Cartesian);
        match &outcome {
            SymbolicOutcome::Solved { exact, value, steps } => {
                assert_eq!(*exact, Expr::Const(1.0));
                assert_eq!(*value, 1.0);
                assert_eq!(steps.len(), 3);
                let order: Vec<&str> = steps.iter().map(|s| s.variable.as_str()).collect();
                assert_eq!(order, vec!["z", "y", "x"]);
            }
            SymbolicOutcome::Failed { reason, .. } => panic!("{}", reason),
        }
    }

    #[test]
    fn test_cartesian_boxes() {
        let limits = IntegrationLimits::new((0.0, 2.0), (0.0, 3.0), (0.0, 4.0));
        assert_eq!(value_of(&run("1", &limits, CoordinateSystem::Cartesian)), 24.0);
        let limits = IntegrationLimits::new((0.0, 2.0), (0.0, 1.0), (0.0, 1.0));
        assert_eq!(value_of(&run("x", &limits, CoordinateSystem::Cartesian)), 2.0);
        assert_relative_eq!(
            value_of(&run("x*x", &limits, CoordinateSystem::Cartesian)),
            8.0 / 3.0,
            epsilon = 1e-14
        );
        let limits = IntegrationLimits::new((-1.0, 1.0), (-1.0, 1.0), (-1.0, 1.0));
        assert_eq!(value_of(&run("5", &limits, CoordinateSystem::Cartesian)), 40.0);
    }

    #[test]
    fn test_cylinder_volume() {
        let limits = IntegrationLimits::default_for(CoordinateSystem::Cylindrical);
        let outcome = run("1", &limits, CoordinateSystem::Cylindrical);
        let order: Vec<&str> = outcome.steps().iter().map(|s| s.variable.as_str()).collect();
        assert_eq!(order, vec!["z", "θ", "r"]);
        assert_relative_eq!(value_of(&outcome), 12.0 * PI, epsilon = 1e-12);
    }

    #[test]
    fn test_sphere_volume() {
        for radius in [1.0_f64, 2.0] {
            let limits = IntegrationLimits::from_text(
                ("0", &radius.to_string()),
                ("0", "2*pi"),
                ("0", "pi"),
            )
            .unwrap();
            let outcome = run("1", &limits, CoordinateSystem::Spherical);
            let order: Vec<&str> = outcome.steps().iter().map(|s| s.variable.as_str()).collect();
            assert_eq!(order, vec!["φ", "θ", "ρ"]);
            assert_relative_eq!(
                value_of(&outcome),
                4.0 / 3.0 * PI * radius.powi(3),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_failure_keeps_completed_steps() {
        let outcome = run("exp(y^2)", &IntegrationLimits::default(), CoordinateSystem::Cartesian);
        match outcome {
            SymbolicOutcome::Failed { reason, steps } => {
                assert!(matches!(
                    reason,
                    IntegraError::SymbolicIntegrationFailure { ref variable, .. } if variable == "y"
                ));
                assert_eq!(steps.len(), 2);
                assert!(steps[0].is_completed());
                assert!(!steps[1].is_completed());
                assert!(steps[1].failure.is_some());
            }
            SymbolicOutcome::Solved { .. } => panic!("exp(y^2) has no elementary antiderivative"),
        }
    }

    #[test]
    fn test_timeout_is_checked_between_steps_only() {
        let config = SolverConfig {
            timeout: Duration::ZERO,
            ..SolverConfig::default()
        };
        let expr = Expr::parse_expression("x").unwrap();
        let outcome = integrate_symbolic(
            &expr,
            &Expr::Const(1.0),
            &IntegrationLimits::default(),
            CoordinateSystem::Cartesian,
            &config,
        );
        match outcome {
            SymbolicOutcome::Failed { reason, steps } => {
                assert!(matches!(reason, IntegraError::SymbolicTimeout { .. }));
                assert_eq!(steps.len(), 2);
                assert!(steps[0].is_completed());
                assert!(steps[1].failure.is_some());
            }
            SymbolicOutcome::Solved { .. } => panic!("zero ceiling must stop after the first step"),
        }
    }

    #[test]
    fn test_evaluation_failure_is_distinct() {
        // every step integrates, but (-1)^1.5 has no real value
        let limits = IntegrationLimits::new((-1.0, 0.0), (0.0, 1.0), (0.0, 1.0));
        let outcome = run("sqrt(x)", &limits, CoordinateSystem::Cartesian);
        match outcome {
            SymbolicOutcome::Failed { reason, steps } => {
                assert!(matches!(reason, IntegraError::EvaluationFailure(_)));
                assert_eq!(steps.len(), 3);
                assert!(steps.iter().all(IntegrationStep::is_completed));
            }
            SymbolicOutcome::Solved { value, .. } => panic!("sqrt(x) over [-1,0] evaluated to {}", value),
        }
    }

    #[test]
    fn test_pole_inside_box_stops_the_last_step() {
        for (text, x) in [("1/x", (-1.0, 1.0)), ("1/x^2", (-1.0, 1.0)), ("1/x", (0.0, 1.0)), ("tan(x)", (0.0, 2.0))] {
            let limits = IntegrationLimits::new(x, (0.0, 1.0), (0.0, 1.0));
            match run(text, &limits, CoordinateSystem::Cartesian) {
                SymbolicOutcome::Failed { reason, steps } => {
                    assert!(matches!(
                        reason,
                        IntegraError::SymbolicIntegrationFailure { ref variable, .. } if variable == "x"
                    ));
                    assert_eq!(steps.len(), 3);
                    assert!(steps[1].is_completed());
                    assert!(!steps[2].is_completed());
                }
                SymbolicOutcome::Solved { value, .. } => {
                    panic!("{} over {:?} reported {}", text, x, value)
                }
            }
        }
    }

    #[test]
    fn test_coordinate_changes_stay_exact() {
        let limits = IntegrationLimits::default_for(CoordinateSystem::Spherical);
        let outcome = run("x^2 + y^2 + z^2", &limits, CoordinateSystem::Spherical);
        assert_relative_eq!(value_of(&outcome), 128.0 * PI / 5.0, epsilon = 1e-12);

        let outcome = run("x*y", &limits, CoordinateSystem::Spherical);
        assert_relative_eq!(value_of(&outcome), 0.0, epsilon = 1e-12);

        let limits = IntegrationLimits::default_for(CoordinateSystem::Cylindrical);
        let outcome = run("sqrt(x^2 + y^2)", &limits, CoordinateSystem::Cylindrical);
        assert_relative_eq!(value_of(&outcome), 16.0 * PI, epsilon = 1e-12);
        let outcome = run("z*sqrt(x^2 + y^2)", &limits, CoordinateSystem::Cylindrical);
        assert_relative_eq!(value_of(&outcome), 24.0 * PI, epsilon = 1e-12);
    }

    #[test]
    fn test_ceiling() {
        let config = SolverConfig {
            timeout: Duration::from_secs(1),
            ..SolverConfig::default()
        };
        assert!(check_ceiling(Duration::from_millis(999), &config).is_ok());
        assert!(matches!(
            check_ceiling(Duration::from_millis(1001), &config),
            Err(IntegraError::SymbolicTimeout { ceiling_secs, .. }) if ceiling_secs == 1.0
        ));
    }

    #[test]
    fn test_limits() {
        let limits = IntegrationLimits::from_text(("0", "2pi"), ("-1", "1"), ("0", "e")).unwrap();
        let numeric = limits.numeric().unwrap();
        assert_relative_eq!(numeric[0].1, 2.0 * PI);
        assert_eq!(numeric[1], (-1.0, 1.0));
        assert_relative_eq!(numeric[2].1, std::f64::consts::E);
        assert!(matches!(
            IntegrationLimits::from_text(("0", "x"), ("0", "1"), ("0", "1")),
            Err(IntegraError::ParseError { .. })
        ));
        assert_eq!(
            IntegrationLimits::default().numeric().unwrap(),
            [(0.0, 1.0); 3]
        );
    }

    #[test]
    fn test_step_display() {
        let outcome = run("2", &IntegrationLimits::default(), CoordinateSystem::Cartesian);
        let line = outcome.steps()[0].to_string();
        assert!(line.starts_with("∫ dz over [0, 1]"));
        assert!(line.ends_with("= 2"));
    }
}
