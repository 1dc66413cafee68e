//! Globally adaptive Gauss-Kronrod quadrature (G7/K15) and its nested triple form.
//!
//! The interval with the largest error estimate is bisected until the summed error drops
//! below `max(epsabs, epsrel·|I|)` or the subdivision budget is spent. The error of one
//! interval is |K15 - G7| rescaled the way QUADPACK's qk15 does it, with a roundoff floor.
use crate::errors::IntegraError;
use log::{debug, warn};
use std::cell::Cell;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Kronrod abscissae on [0, 1]; the odd entries are the Gauss points.
const XGK: [f64; 8] = [
    0.991455371120812639206854697526329,
    0.949107912342758524526189684047851,
    0.864864423359769072789712788640926,
    0.741531185599394439863864773280788,
    0.586087235467691130294144838258730,
    0.405845151377397166906606412076961,
    0.207784955007898467600689403773245,
    0.000000000000000000000000000000000,
];

const WGK: [f64; 8] = [
    0.022935322010529224963732008058970,
    0.063092092629978553290700663189204,
    0.104790010322250183839876322541518,
    0.140653259715525918745189590510238,
    0.169004726639267902826583426598550,
    0.190350578064785409913256402421014,
    0.204432940075298892414161999234649,
    0.209482141084727828012999174891714,
];

/// Gauss weights for XGK[1], XGK[3], XGK[5] and the center.
const WG: [f64; 4] = [
    0.129484966168869693270611432679082,
    0.279705391489276667901467771423780,
    0.381830050505118944950369775488975,
    0.417959183673469387755102040816327,
];

const ROUNDOFF: f64 = 50.0 * f64::EPSILON;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadOptions {
    pub epsabs: f64,
    pub epsrel: f64,
    /// maximal number of subintervals of one adaptive run
    pub limit: usize,
}

impl Default for QuadOptions {
    fn default() -> Self {
        QuadOptions {
            epsabs: 1e-12,
            epsrel: 1e-10,
            limit: 200,
        }
    }
}

impl QuadOptions {
    pub fn tolerance(&self, value: f64) -> f64 {
        self.epsabs.max(self.epsrel * value.abs())
    }
}

/// One application of the 15-point rule.
#[derive(Debug, Clone, Copy)]
pub struct RuleEstimate {
    pub value: f64,
    pub error: f64,
}

/// Kronrod value of ∫ f over [a, b] with its error estimate.
pub fn g7k15<F: Fn(f64) -> f64>(f: &F, a: f64, b: f64) -> RuleEstimate {
    let center = 0.5 * (a + b);
    let half = 0.5 * (b - a);
    let f_center = f(center);
    let mut kronrod = WGK[7] * f_center;
    let mut gauss = WG[3] * f_center;
    let mut resabs = kronrod.abs();
    let mut samples = [(0.0, 0.0); 7];
    for (j, sample) in samples.iter_mut().enumerate() {
        let dx = half * XGK[j];
        let (f1, f2) = (f(center - dx), f(center + dx));
        kronrod += WGK[j] * (f1 + f2);
        resabs += WGK[j] * (f1.abs() + f2.abs());
        if j % 2 == 1 {
            gauss += WG[j / 2] * (f1 + f2);
        }
        *sample = (f1, f2);
    }
    let mean = 0.5 * kronrod;
    let mut resasc = WGK[7] * (f_center - mean).abs();
    for (j, (f1, f2)) in samples.iter().enumerate() {
        resasc += WGK[j] * ((f1 - mean).abs() + (f2 - mean).abs());
    }
    let (value, resabs, resasc) = (kronrod * half, resabs * half.abs(), resasc * half.abs());
    let mut error = ((kronrod - gauss) * half).abs();
    if resasc != 0.0 && error != 0.0 {
        error = resasc * (1.0f64).min((200.0 * error / resasc).powf(1.5));
    }
    if resabs > f64::MIN_POSITIVE / ROUNDOFF {
        error = error.max(ROUNDOFF * resabs);
    }
    RuleEstimate { value, error }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadResult {
    pub value: f64,
    pub error: f64,
    pub intervals: usize,
    pub converged: bool,
}

#[derive(Debug, Clone, Copy)]
struct Interval {
    a: f64,
    b: f64,
    estimate: RuleEstimate,
}

impl PartialEq for Interval {
    fn eq(&self, other: &Self) -> bool {
        self.estimate.error == other.estimate.error
    }
}

impl Eq for Interval {}

impl PartialOrd for Interval {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// max-heap on the error estimate
impl Ord for Interval {
    fn cmp(&self, other: &Self) -> Ordering {
        self.estimate
            .error
            .partial_cmp(&other.estimate.error)
            .unwrap_or(Ordering::Equal)
    }
}

/// Adaptive integration of `f` over [a, b].
///
/// Never fails by itself: a run that spends its budget, or whose worst interval cannot be
/// bisected any further, is returned with `converged = false`.
pub fn adaptive_quad<F: Fn(f64) -> f64>(f: &F, a: f64, b: f64, options: &QuadOptions) -> QuadResult {
    if a == b {
        return QuadResult {
            value: 0.0,
            error: 0.0,
            intervals: 0,
            converged: true,
        };
    }
    let first = g7k15(f, a, b);
    let mut heap = BinaryHeap::with_capacity(options.limit + 1);
    heap.push(Interval { a, b, estimate: first });
    let mut value = first.value;
    let mut error = first.error;

    while error > options.tolerance(value) && heap.len() < options.limit.max(1) {
        let Some(worst) = heap.pop() else { break };
        let mid = 0.5 * (worst.a + worst.b);
        if mid == worst.a || mid == worst.b {
            // interval exhausted by floating point resolution
            heap.push(worst);
            break;
        }
        let left = g7k15(f, worst.a, mid);
        let right = g7k15(f, mid, worst.b);
        value += left.value + right.value - worst.estimate.value;
        error += left.error + right.error - worst.estimate.error;
        heap.push(Interval { a: worst.a, b: mid, estimate: left });
        heap.push(Interval { a: mid, b: worst.b, estimate: right });
    }

    // re-sum to drop the drift of the running totals
    let value: f64 = heap.iter().map(|i| i.estimate.value).sum();
    let error: f64 = heap.iter().map(|i| i.estimate.error).sum();
    QuadResult {
        value,
        error,
        intervals: heap.len(),
        converged: error <= options.tolerance(value),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TripleQuadResult {
    pub value: f64,
    /// error bound reported by the outermost integration
    pub error: f64,
    pub evaluations: usize,
    /// inner runs that returned without reaching the tolerance
    pub unconverged_inner: usize,
}

/// ∫∫∫ f(x, y, z) dz dy dx over a box, x outermost (varies slowest) and z innermost.
///
/// Inner runs that miss the tolerance are counted and logged; only the outer run decides
/// success. A non-finite total or an unconverged outer run is a `NumericConvergenceFailure`.
pub fn triple_quad<F>(
    f: F,
    x: (f64, f64),
    y: (f64, f64),
    z: (f64, f64),
    options: &QuadOptions,
) -> Result<TripleQuadResult, IntegraError>
where
    F: Fn(f64, f64, f64) -> f64,
{
    let evaluations = Cell::new(0usize);
    let unconverged = Cell::new(0usize);
    let inner_run = |result: QuadResult| {
        if !result.converged {
            unconverged.set(unconverged.get() + 1);
        }
        result.value
    };
    let over_z = |xv: f64, yv: f64| {
        inner_run(adaptive_quad(
            &|zv: f64| {
                evaluations.set(evaluations.get() + 1);
                f(xv, yv, zv)
            },
            z.0,
            z.1,
            options,
        ))
    };
    let over_yz = |xv: f64| inner_run(adaptive_quad(&|yv: f64| over_z(xv, yv), y.0, y.1, options));
    let outer = adaptive_quad(&over_yz, x.0, x.1, options);

    debug!(
        "triple quadrature: {} evaluations, {} outer intervals",
        evaluations.get(),
        outer.intervals
    );
    if unconverged.get() > 0 {
        warn!(
            "{} inner quadratures stopped above tolerance",
            unconverged.get()
        );
    }
    if !outer.value.is_finite() {
        return Err(IntegraError::numeric_failure(format!(
            "quadrature produced a non-finite value ({})",
            outer.value
        )));
    }
    if !outer.converged {
        return Err(IntegraError::numeric_failure(format!(
            "no convergence after {} subintervals: estimate {} with error {:e} above tolerance {:e}",
            outer.intervals,
            outer.value,
            outer.error,
            options.tolerance(outer.value)
        )));
    }
    Ok(TripleQuadResult {
        value: outer.value,
        error: outer.error,
        evaluations: evaluations.get(),
        unconverged_inner: unconverged.get(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{E, PI};

    #[test]
    fn test_rule_is_exact_for_polynomials() {
        let estimate = g7k15(&|x: f64| x.powi(13) + x * x, 0.0, 1.0);
        assert_relative_eq!(estimate.value, 1.0 / 14.0 + 1.0 / 3.0, epsilon = 1e-15);
        assert!(estimate.error < 1e-13);
    }

    #[test]
    fn test_adaptive_smooth_functions() {
        let options = QuadOptions::default();
        let result = adaptive_quad(&|x: f64| x.sin(), 0.0, PI, &options);
        assert!(result.converged);
        assert_relative_eq!(result.value, 2.0, epsilon = 1e-12);
        let result = adaptive_quad(&|x: f64| x.exp(), 0.0, 1.0, &options);
        assert_relative_eq!(result.value, E - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_adaptive_reversed_and_empty_interval() {
        let options = QuadOptions::default();
        let result = adaptive_quad(&|x: f64| x, 1.0, 0.0, &options);
        assert_relative_eq!(result.value, -0.5, epsilon = 1e-15);
        let result = adaptive_quad(&|x: f64| x, 1.0, 1.0, &options);
        assert_eq!(result.value, 0.0);
        assert!(result.converged);
    }

    #[test]
    fn test_adaptive_endpoint_singularity() {
        // ∫₀¹ ln x dx = -1
        let options = QuadOptions::default();
        let result = adaptive_quad(&|x: f64| x.ln(), 0.0, 1.0, &options);
        assert!(result.converged);
        assert!(result.intervals > 1);
        assert_relative_eq!(result.value, -1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_budget_exhaustion_is_reported() {
        let options = QuadOptions {
            limit: 2,
            ..QuadOptions::default()
        };
        let result = adaptive_quad(&|x: f64| (1.0 / x).sin(), 0.001, 1.0, &options);
        assert!(!result.converged);
        assert!(result.intervals <= 2);
    }

    #[test]
    fn test_triple_quad_box() {
        let result = triple_quad(
            |x, y, z| x * y * z,
            (0.0, 2.0),
            (0.0, 3.0),
            (0.0, 4.0),
            &QuadOptions::default(),
        )
        .unwrap();
        // (2²/2)(3²/2)(4²/2) = 2·4.5·8
        assert_relative_eq!(result.value, 72.0, epsilon = 1e-10);
        assert!(result.error.is_finite());
        assert_eq!(result.evaluations, 15 * 15 * 15);
    }

    #[test]
    fn test_triple_quad_argument_order() {
        // only z is integrated over [0, 2]; swapping the slots would give a different value
        let result = triple_quad(
            |_x, _y, z| z,
            (0.0, 1.0),
            (0.0, 1.0),
            (0.0, 2.0),
            &QuadOptions::default(),
        )
        .unwrap();
        assert_relative_eq!(result.value, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_triple_quad_non_finite_total_fails() {
        let result = triple_quad(
            |_x, _y, _z| f64::NAN,
            (0.0, 1.0),
            (0.0, 1.0),
            (0.0, 1.0),
            &QuadOptions::default(),
        );
        assert!(matches!(
            result,
            Err(IntegraError::NumericConvergenceFailure { .. })
        ));
    }
}
