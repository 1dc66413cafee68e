//! Coordinate systems as fixed data.
//!
//! Every system is described by one `CoordinateSpec`: which native variable each input slot
//! (x-slot, y-slot, z-slot) carries, the order in which the slots are integrated, the
//! Cartesian substitution rules and the Jacobian. Nothing here is derived at runtime.
use crate::errors::IntegraError;
use crate::symbolic::symbolic_engine::{Expr, PHI, R, RHO, THETA, X, Y, Z};
use std::f64::consts::PI;
use std::str::FromStr;
use strum_macros::{Display, EnumIter, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum CoordinateSystem {
    #[strum(to_string = "cartesian", serialize = "cartesianas", serialize = "rectangular")]
    Cartesian,
    #[strum(to_string = "cylindrical", serialize = "cilindricas", serialize = "cylinder")]
    Cylindrical,
    #[strum(to_string = "spherical", serialize = "esfericas", serialize = "sphere")]
    Spherical,
}

/// A default bound: `value` or `value·π`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    Number(f64),
    PiTimes(f64),
}

impl Bound {
    pub fn to_expr(self) -> Expr {
        match self {
            Bound::Number(v) => Expr::Const(v),
            Bound::PiTimes(k) if k == 1.0 => Expr::Pi,
            Bound::PiTimes(k) => Expr::Const(k) * Expr::Pi,
        }
    }

    pub fn value(self) -> f64 {
        match self {
            Bound::Number(v) => v,
            Bound::PiTimes(k) => k * PI,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateSpec {
    pub system: CoordinateSystem,
    /// native variable carried by the x-, y- and z-slot
    pub slot_variables: [&'static str; 3],
    /// slot indices, innermost integration first
    pub integration_order: [usize; 3],
    pub axis_labels: [&'static str; 3],
    pub default_limits: [(Bound, Bound); 3],
}

const CARTESIAN: CoordinateSpec = CoordinateSpec {
    system: CoordinateSystem::Cartesian,
    slot_variables: [X, Y, Z],
    integration_order: [2, 1, 0],
    axis_labels: ["x", "y", "z"],
    default_limits: [
        (Bound::Number(-2.0), Bound::Number(2.0)),
        (Bound::Number(-2.0), Bound::Number(2.0)),
        (Bound::Number(-2.0), Bound::Number(2.0)),
    ],
};

const CYLINDRICAL: CoordinateSpec = CoordinateSpec {
    system: CoordinateSystem::Cylindrical,
    slot_variables: [R, THETA, Z],
    integration_order: [2, 1, 0],
    axis_labels: ["r (radius)", "θ (azimuth)", "z (height)"],
    default_limits: [
        (Bound::Number(0.0), Bound::Number(2.0)),
        (Bound::Number(0.0), Bound::PiTimes(2.0)),
        (Bound::Number(0.0), Bound::Number(3.0)),
    ],
};

const SPHERICAL: CoordinateSpec = CoordinateSpec {
    system: CoordinateSystem::Spherical,
    slot_variables: [RHO, THETA, PHI],
    integration_order: [2, 1, 0],
    axis_labels: ["ρ (radius)", "θ (azimuth)", "φ (polar angle)"],
    default_limits: [
        (Bound::Number(0.0), Bound::Number(2.0)),
        (Bound::Number(0.0), Bound::PiTimes(2.0)),
        (Bound::Number(0.0), Bound::PiTimes(1.0)),
    ],
};

impl CoordinateSystem {
    /// Looks a system up by its tag; synonyms and case are accepted.
    pub fn from_tag(tag: &str) -> Result<Self, IntegraError> {
        CoordinateSystem::from_str(tag.trim())
            .map_err(|_| IntegraError::UnsupportedCoordinateSystem(tag.to_string()))
    }

    pub fn spec(self) -> &'static CoordinateSpec {
        match self {
            CoordinateSystem::Cartesian => &CARTESIAN,
            CoordinateSystem::Cylindrical => &CYLINDRICAL,
            CoordinateSystem::Spherical => &SPHERICAL,
        }
    }
}

impl CoordinateSpec {
    /// x, y, z in terms of the native variables
    pub fn substitutions(&self) -> Vec<(&'static str, Expr)> {
        let sin = |v: &str| Expr::sin(Expr::var(v).boxed());
        let cos = |v: &str| Expr::cos(Expr::var(v).boxed());
        match self.system {
            CoordinateSystem::Cartesian => Vec::new(),
            CoordinateSystem::Cylindrical => vec![
                (X, Expr::var(R) * cos(THETA)),
                (Y, Expr::var(R) * sin(THETA)),
            ],
            CoordinateSystem::Spherical => vec![
                (X, Expr::var(RHO) * sin(PHI) * cos(THETA)),
                (Y, Expr::var(RHO) * sin(PHI) * sin(THETA)),
                (Z, Expr::var(RHO) * cos(PHI)),
            ],
        }
    }

    /// volume factor: 1, r, ρ²·sin(φ)
    pub fn jacobian(&self) -> Expr {
        match self.system {
            CoordinateSystem::Cartesian => Expr::Const(1.0),
            CoordinateSystem::Cylindrical => Expr::var(R),
            CoordinateSystem::Spherical => {
                Expr::var(RHO).pow(Expr::Const(2.0)) * Expr::sin(Expr::var(PHI).boxed())
            }
        }
    }

    /// native variables in integration order, innermost first
    pub fn variables_in_order(&self) -> [&'static str; 3] {
        self.integration_order.map(|slot| self.slot_variables[slot])
    }
}

/// Rewrites a Cartesian expression in the native variables of `system` and returns it with the
/// system's Jacobian. Pure substitution; nothing is simplified.
pub fn transform(expr: &Expr, system: CoordinateSystem) -> (Expr, Expr) {
    let spec = system.spec();
    let transformed = spec
        .substitutions()
        .iter()
        .fold(expr.clone(), |acc, (var, replacement)| {
            acc.substitute_variable(var, replacement)
        });
    (transformed, spec.jacobian())
}

/// Converts a point given in slot order (x-slot, y-slot, z-slot) to the Cartesian display frame.
pub fn to_cartesian(system: CoordinateSystem, point: [f64; 3]) -> [f64; 3] {
    let [u, v, w] = point;
    match system {
        CoordinateSystem::Cartesian => point,
        CoordinateSystem::Cylindrical => [u * v.cos(), u * v.sin(), w],
        CoordinateSystem::Spherical => [u * w.sin() * v.cos(), u * w.sin() * v.sin(), u * w.cos()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::HashMap;
    use strum::IntoEnumIterator;

    #[test]
    fn test_jacobian_table() {
        assert_eq!(CoordinateSystem::Cartesian.spec().jacobian(), Expr::Const(1.0));
        assert_eq!(CoordinateSystem::Cylindrical.spec().jacobian(), Expr::var(R));
        assert_eq!(
            CoordinateSystem::Spherical.spec().jacobian(),
            Expr::parse_expression("ρ^2*sin(φ)").unwrap()
        );
    }

    #[test]
    fn test_tags_and_synonyms() {
        assert_eq!(CoordinateSystem::from_tag("cartesian").unwrap(), CoordinateSystem::Cartesian);
        assert_eq!(CoordinateSystem::from_tag("Cilindricas").unwrap(), CoordinateSystem::Cylindrical);
        assert_eq!(CoordinateSystem::from_tag(" esfericas ").unwrap(), CoordinateSystem::Spherical);
        assert_eq!(CoordinateSystem::Spherical.to_string(), "spherical");
        assert!(matches!(
            CoordinateSystem::from_tag("polar"),
            Err(IntegraError::UnsupportedCoordinateSystem(tag)) if tag == "polar"
        ));
    }

    #[test]
    fn test_integration_order_is_z_y_x_slots() {
        for system in CoordinateSystem::iter() {
            assert_eq!(system.spec().integration_order, [2, 1, 0]);
        }
        assert_eq!(CoordinateSystem::Cartesian.spec().variables_in_order(), [Z, Y, X]);
        assert_eq!(CoordinateSystem::Cylindrical.spec().variables_in_order(), [Z, THETA, R]);
        assert_eq!(CoordinateSystem::Spherical.spec().variables_in_order(), [PHI, THETA, RHO]);
    }

    #[test]
    fn test_transform_matches_point_conversion() {
        let expr = Expr::parse_expression("x + 2y + 3z").unwrap();
        for system in CoordinateSystem::iter() {
            let (transformed, _) = transform(&expr, system);
            let native = [1.3, 0.7, 0.4];
            let [x, y, z] = to_cartesian(system, native);
            let spec = system.spec();
            let values: HashMap<String, f64> = spec
                .slot_variables
                .iter()
                .zip(native)
                .map(|(name, value)| (name.to_string(), value))
                .collect();
            let value = transformed
                .set_variable_from_map(&values)
                .eval_constant()
                .unwrap();
            assert_relative_eq!(value, x + 2.0 * y + 3.0 * z, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_transform_leaves_no_cartesian_variables() {
        let expr = Expr::parse_expression("x*y*z").unwrap();
        let (transformed, jacobian) = transform(&expr, CoordinateSystem::Spherical);
        for var in [X, Y, Z] {
            assert!(!transformed.contains_variable(var));
        }
        assert!(jacobian.contains_variable(RHO));
        let (cyl, _) = transform(&expr, CoordinateSystem::Cylindrical);
        assert!(cyl.contains_variable(Z));
    }

    #[test]
    fn test_default_limits() {
        let spec = CoordinateSystem::Cylindrical.spec();
        assert_relative_eq!(spec.default_limits[1].1.value(), 2.0 * PI);
        assert_eq!(spec.default_limits[1].1.to_expr(), Expr::Const(2.0) * Expr::Pi);
        assert_eq!(CoordinateSystem::Spherical.spec().default_limits[2].1.to_expr(), Expr::Pi);
    }
}
