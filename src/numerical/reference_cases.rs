//! Integrals with known values, shared by the tests, the demo binary and the benchmark.
use crate::errors::IntegraError;
use crate::numerical::Integral_api::{Method, TripleIntegral};
use crate::symbolic::coordinate_transform::CoordinateSystem;
use crate::symbolic::symbolic_triple::IntegrationLimits;
use std::f64::consts::PI;

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceCase {
    pub name: &'static str,
    pub function: &'static str,
    pub system: CoordinateSystem,
    /// bound texts of the x-, y- and z-slot
    pub bounds: [(&'static str, &'static str); 3],
    pub expected: f64,
    /// path expected to produce the value
    pub method: Method,
}

impl ReferenceCase {
    pub fn limits(&self) -> Result<IntegrationLimits, IntegraError> {
        let [x, y, z] = self.bounds;
        IntegrationLimits::from_text(x, y, z)
    }

    pub fn task(&self) -> Result<TripleIntegral, IntegraError> {
        Ok(TripleIntegral::new(self.function, self.limits()?, self.system))
    }
}

const UNIT: (&str, &str) = ("0", "1");

pub fn reference_cases() -> Vec<ReferenceCase> {
    use CoordinateSystem::*;
    vec![
        ReferenceCase {
            name: "unit cube",
            function: "1",
            system: Cartesian,
            bounds: [UNIT; 3],
            expected: 1.0,
            method: Method::Symbolic,
        },
        ReferenceCase {
            name: "box volume",
            function: "1",
            system: Cartesian,
            bounds: [("0", "2"), ("0", "3"), ("0", "4")],
            expected: 24.0,
            method: Method::Symbolic,
        },
        ReferenceCase {
            name: "linear integrand",
            function: "x",
            system: Cartesian,
            bounds: [("0", "2"), UNIT, UNIT],
            expected: 2.0,
            method: Method::Symbolic,
        },
        ReferenceCase {
            name: "constant over symmetric box",
            function: "5",
            system: Cartesian,
            bounds: [("-1", "1"); 3],
            expected: 40.0,
            method: Method::Symbolic,
        },
        ReferenceCase {
            name: "square",
            function: "x*x",
            system: Cartesian,
            bounds: [("0", "2"), UNIT, UNIT],
            expected: 8.0 / 3.0,
            method: Method::Symbolic,
        },
        ReferenceCase {
            name: "cylinder volume",
            function: "1",
            system: Cylindrical,
            bounds: [("0", "2"), ("0", "2*pi"), ("0", "3")],
            expected: 12.0 * PI,
            method: Method::Symbolic,
        },
        ReferenceCase {
            name: "unit ball volume",
            function: "1",
            system: Spherical,
            bounds: [("0", "1"), ("0", "2*pi"), ("0", "pi")],
            expected: 4.0 / 3.0 * PI,
            method: Method::Symbolic,
        },
        ReferenceCase {
            name: "ball volume, R = 2",
            function: "1",
            system: Spherical,
            bounds: [("0", "2"), ("0", "2*pi"), ("0", "pi")],
            expected: 32.0 / 3.0 * PI,
            method: Method::Symbolic,
        },
        ReferenceCase {
            name: "no elementary antiderivative",
            function: "exp(y^2)",
            system: Cartesian,
            bounds: [UNIT; 3],
            expected: 1.4626517459071816,
            method: Method::Numeric,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_limits_parse() {
        for case in reference_cases() {
            let limits = case.limits().unwrap();
            assert!(limits.numeric().is_ok(), "{}", case.name);
        }
    }

    #[test]
    fn test_cylinder_case_uses_the_default_region() {
        let case = reference_cases()
            .into_iter()
            .find(|c| c.name == "cylinder volume")
            .unwrap();
        assert_eq!(
            case.limits().unwrap().numeric().unwrap(),
            IntegrationLimits::default_for(CoordinateSystem::Cylindrical)
                .numeric()
                .unwrap()
        );
    }
}
