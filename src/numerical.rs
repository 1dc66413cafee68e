/// Gauss-Kronrod G7/K15 adaptive quadrature, one-dimensional and nested over a box
pub mod adaptive_quadrature;
/// numeric fallback of the triple integral: guarded evaluation and nested quadrature
pub mod numeric_triple;
/// surface slices, scatter samples and region wireframe for external plotting
pub mod visualization;
/// solve, validate and sample entry points; the TripleIntegral task
///# Example
/// ```
/// use RustedIntegra::numerical::Integral_api::{solve, Method};
/// use RustedIntegra::symbolic::coordinate_transform::CoordinateSystem;
/// use RustedIntegra::symbolic::symbolic_triple::IntegrationLimits;
/// use RustedIntegra::Utils::config::SolverConfig;
/// let limits = IntegrationLimits::new((0.0, 2.0), (0.0, 3.0), (0.0, 4.0));
/// let result = solve("1", &limits, CoordinateSystem::Cartesian, &SolverConfig::default());
/// assert_eq!(result.value, Some(24.0));
/// assert_eq!(result.method, Some(Method::Symbolic));
/// ```
pub mod Integral_api;
/// integrals with known values
pub mod reference_cases;
