#![allow(non_snake_case)]
use RustedIntegra::Utils::config::SolverConfig;
use RustedIntegra::Utils::logger::{init_logger, statistics_table};
use RustedIntegra::numerical::Integral_api::{TripleIntegral, sample, solve_many, validate};
use RustedIntegra::numerical::reference_cases::reference_cases;
use RustedIntegra::symbolic::coordinate_transform::{CoordinateSystem, transform};
use RustedIntegra::symbolic::symbolic_engine::Expr;
use RustedIntegra::symbolic::symbolic_triple::IntegrationLimits;
use itertools::Itertools;
use std::path::Path;

fn main() {
    let example = 7;
    match example {
        0 => {
            // PARSING: notation normalization and validation
            for input in ["2x sen(y)^2", "(x+1)(y+1)", "xsin(y)", "ρ^2 sin(φ)", "log(x) + ln(e)", "2q"] {
                let validation = validate(input);
                if validation.valid {
                    println!(
                        "{} -> {} | latex {} | variables {}",
                        input,
                        validation.canonical_form.unwrap_or_default(),
                        validation.rendered_form.unwrap_or_default(),
                        validation.free_variables.iter().join(", ")
                    );
                } else {
                    println!("{} rejected: {:?}", input, validation.error);
                }
            }
        }
        1 => {
            // CARTESIAN: ∫∫∫ x*y*z over [0,2]x[0,3]x[0,4]
            let mut task = TripleIntegral::new(
                "x*y*z",
                IntegrationLimits::new((0.0, 2.0), (0.0, 3.0), (0.0, 4.0)),
                CoordinateSystem::Cartesian,
            )
            .with_loglevel("info");
            let result = task.solve();
            println!("value = {:?}, exact = {:?}", result.value, result.latex);
        }
        2 => {
            // CYLINDRICAL: volume of the default cylinder r <= 2, 0 <= z <= 3
            let mut task = TripleIntegral::new(
                "1",
                IntegrationLimits::default_for(CoordinateSystem::Cylindrical),
                CoordinateSystem::Cylindrical,
            );
            let result = task.solve();
            for step in &result.steps {
                println!("{}", step);
            }
            println!("volume = {:?} ({:?})", result.value, result.latex);
        }
        3 => {
            // SPHERICAL: ball of radius 2 and the transform it runs on
            let parsed = Expr::parse_expression("x^2 + y^2 + z^2").unwrap();
            let (expr, jacobian) = transform(&parsed, CoordinateSystem::Spherical);
            println!("x^2+y^2+z^2 = {} with jacobian {}", expr.simplify(), jacobian);
            let limits = IntegrationLimits::from_text(("0", "2"), ("0", "2*pi"), ("0", "pi")).unwrap();
            let mut task = TripleIntegral::new("1", limits, CoordinateSystem::Spherical);
            let result = task.solve();
            println!("volume = {:?}, 4/3 π 2^3 = {}", result.value, 32.0 / 3.0 * std::f64::consts::PI);
        }
        4 => {
            // FALLBACK: exp(y^2) has no elementary antiderivative, the numeric path takes over
            let mut task = TripleIntegral::new("exp(y^2)", IntegrationLimits::default(), CoordinateSystem::Cartesian)
                .with_loglevel("debug");
            let result = task.solve();
            println!(
                "value = {:?} ± {:?}, symbolic gave up: {:?}",
                result.value, result.error_estimate, result.symbolic_failure
            );
            for note in &result.numeric_notes {
                println!("{}", note);
            }
        }
        5 => {
            // SAMPLER: slices, scatter points and wireframe of a spherical integrand
            let limits = IntegrationLimits::default_for(CoordinateSystem::Spherical);
            let payload = sample("x^2 + y^2", &limits, CoordinateSystem::Spherical, 24).unwrap();
            println!("{:?}", payload.statistics);
            for (start, end) in payload.wireframe.lines() {
                println!("{:?} -> {:?}", start, end);
            }
            match payload.save_samples_csv(Path::new(".")) {
                Ok(path) => println!("samples saved to {}", path.display()),
                Err(err) => println!("{}", err),
            }
        }
        6 => {
            // CONFIGURATION from TOML: a tight time ceiling stops the symbolic pass after step 1
            let config = SolverConfig::from_toml_str("[solver]\ntimeout_secs = 0.0\nepsrel = 1e-8\n").unwrap();
            let mut task = TripleIntegral::new("x*y", IntegrationLimits::default(), CoordinateSystem::Cartesian)
                .with_config(config);
            let result = task.solve();
            println!("{:?} via {:?}", result.value, result.method);
        }
        7 => {
            // REFERENCE CASES solved in parallel
            let _ = init_logger(Some("warn"));
            let cases = reference_cases();
            let tasks: Vec<TripleIntegral> = cases.iter().filter_map(|case| case.task().ok()).collect();
            let results = solve_many(&tasks);
            let rows: Vec<(String, String)> = cases
                .iter()
                .zip(&results)
                .map(|(case, result)| {
                    (
                        case.name.to_string(),
                        format!(
                            "{:?} via {:?} (expected {})",
                            result.value, result.method, case.expected
                        ),
                    )
                })
                .collect();
            println!("{}", statistics_table(&rows));
        }
        _ => {
            println!("example {} does not exist", example);
        }
    }
}
