//! Solver configuration passed explicitly to every solve call.
//!
//! Can be read from TOML; every key lives in a `[solver]` table and is optional:
//! ```toml
//! [solver]
//! timeout_secs = 45.0
//! precision_digits = 15
//! epsabs = 1e-12
//! epsrel = 1e-10
//! max_subdivisions = 200
//! resolution = 30
//! seed = 42
//! ```
use crate::errors::IntegraError;
use log::info;
use std::path::Path;
use std::time::Duration;
use toml::{Table, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// wall-time ceiling of the symbolic pass, checked between integration steps
    pub timeout: Duration,
    /// significant digits of the symbolic value
    pub precision_digits: u32,
    pub epsabs: f64,
    pub epsrel: f64,
    /// interval budget of each one-dimensional adaptive quadrature
    pub max_subdivisions: usize,
    /// grid size of the visualization sampler
    pub resolution: usize,
    /// seed of the scatter sample generator
    pub seed: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            timeout: Duration::from_secs(45),
            precision_digits: 15,
            epsabs: 1e-12,
            epsrel: 1e-10,
            max_subdivisions: 200,
            resolution: 30,
            seed: 42,
        }
    }
}

fn get_float(table: &Table, key: &str) -> Result<Option<f64>, IntegraError> {
    match table.get(key) {
        None => Ok(None),
        Some(Value::Float(v)) => Ok(Some(*v)),
        Some(Value::Integer(v)) => Ok(Some(*v as f64)),
        Some(other) => Err(IntegraError::Config(format!(
            "{} must be a number, found {}",
            key,
            other.type_str()
        ))),
    }
}

fn get_unsigned(table: &Table, key: &str) -> Result<Option<u64>, IntegraError> {
    match table.get(key) {
        None => Ok(None),
        Some(Value::Integer(v)) if *v >= 0 => Ok(Some(*v as u64)),
        Some(other) => Err(IntegraError::Config(format!(
            "{} must be a non-negative integer, found {}",
            key, other
        ))),
    }
}

impl SolverConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, IntegraError> {
        let root = text
            .parse::<Table>()
            .map_err(|e| IntegraError::Config(e.to_string()))?;
        let mut config = SolverConfig::default();
        let solver = match root.get("solver") {
            None => return Ok(config),
            Some(Value::Table(table)) => table,
            Some(_) => return Err(IntegraError::Config("[solver] must be a table".to_string())),
        };
        if let Some(secs) = get_float(solver, "timeout_secs")? {
            config.timeout = Duration::try_from_secs_f64(secs)
                .map_err(|e| IntegraError::Config(format!("timeout_secs: {}", e)))?;
        }
        if let Some(digits) = get_unsigned(solver, "precision_digits")? {
            if !(1..=17).contains(&digits) {
                return Err(IntegraError::Config(format!(
                    "precision_digits must be within 1..=17, found {}",
                    digits
                )));
            }
            config.precision_digits = digits as u32;
        }
        for (key, slot) in [("epsabs", &mut config.epsabs), ("epsrel", &mut config.epsrel)] {
            if let Some(tol) = get_float(solver, key)? {
                if !(tol >= 0.0 && tol.is_finite()) {
                    return Err(IntegraError::Config(format!("{} must be >= 0, found {}", key, tol)));
                }
                *slot = tol;
            }
        }
        if let Some(limit) = get_unsigned(solver, "max_subdivisions")? {
            config.max_subdivisions = limit.max(1) as usize;
        }
        if let Some(resolution) = get_unsigned(solver, "resolution")? {
            config.resolution = resolution.max(1) as usize;
        }
        if let Some(seed) = get_unsigned(solver, "seed")? {
            config.seed = seed;
        }
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, IntegraError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| IntegraError::Config(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_toml_str(&text)?;
        info!("solver configuration loaded from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_reference_configuration() {
        let config = SolverConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(45));
        assert_eq!(config.precision_digits, 15);
        assert_eq!(config.epsabs, 1e-12);
        assert_eq!(config.epsrel, 1e-10);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SolverConfig::from_toml_str(
            "[solver]\ntimeout_secs = 2\nepsrel = 1e-8\nunknown_key = true\n",
        )
        .unwrap();
        assert_eq!(config.timeout, Duration::from_secs(2));
        assert_eq!(config.epsrel, 1e-8);
        assert_eq!(config.epsabs, 1e-12);
        assert_eq!(config.seed, 42);
        assert_eq!(SolverConfig::from_toml_str("").unwrap(), SolverConfig::default());
    }

    #[test]
    fn test_wrong_types_are_config_errors() {
        for text in [
            "[solver]\nepsabs = \"small\"",
            "[solver]\nprecision_digits = 40",
            "[solver]\nseed = -1",
            "solver = 3",
            "[solver\n",
        ] {
            assert!(
                matches!(SolverConfig::from_toml_str(text), Err(IntegraError::Config(_))),
                "{} accepted",
                text
            );
        }
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[solver]\nresolution = 12\nseed = 7").unwrap();
        let config = SolverConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.resolution, 12);
        assert_eq!(config.seed, 7);
        assert!(SolverConfig::from_toml_file(Path::new("/nonexistent/solver.toml")).is_err());
    }
}
