//! Error kinds shared by the parser, the integrators and the public API.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntegraError {
    /// malformed or out-of-alphabet input, reported with the offending text
    #[error("Parse error in '{input}': {message}")]
    ParseError { input: String, message: String },
    #[error("Unsupported coordinate system: {0}")]
    UnsupportedCoordinateSystem(String),
    /// recoverable: triggers the numeric fallback
    #[error("Cannot integrate with respect to {variable}: {reason}")]
    SymbolicIntegrationFailure { variable: String, reason: String },
    /// recoverable, handled exactly like a failed integration step
    #[error("Symbolic integration timed out after {elapsed_secs:.3} s (ceiling {ceiling_secs:.3} s)")]
    SymbolicTimeout { elapsed_secs: f64, ceiling_secs: f64 },
    /// the final symbolic expression could not be turned into a number
    #[error("Evaluation failed: {0}")]
    EvaluationFailure(String),
    /// a single bad sample; absorbed by the quadrature guard and never escalated
    #[error("Numeric evaluation failed: {0}")]
    NumericEvaluationFailure(String),
    /// both strategies exhausted
    #[error("Both methods failed. Symbolic: {symbolic}; numeric: {numeric}")]
    NumericConvergenceFailure { symbolic: String, numeric: String },
    #[error("Configuration error: {0}")]
    Config(String),
    /// sample export failed
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for IntegraError {
    fn from(e: std::io::Error) -> Self {
        IntegraError::Io(e.to_string())
    }
}

impl From<csv::Error> for IntegraError {
    fn from(e: csv::Error) -> Self {
        IntegraError::Io(e.to_string())
    }
}

impl IntegraError {
    pub fn parse_error(input: &str, message: impl Into<String>) -> Self {
        IntegraError::ParseError {
            input: input.to_string(),
            message: message.into(),
        }
    }

    pub fn unsupported(variable: &str, reason: impl Into<String>) -> Self {
        IntegraError::SymbolicIntegrationFailure {
            variable: variable.to_string(),
            reason: reason.into(),
        }
    }

    /// Failure of the numeric strategy alone; the symbolic reason is filled in by
    /// [`IntegraError::with_symbolic_reason`] once both strategies are exhausted.
    pub fn numeric_failure(reason: impl Into<String>) -> Self {
        IntegraError::NumericConvergenceFailure {
            symbolic: String::new(),
            numeric: reason.into(),
        }
    }

    pub fn with_symbolic_reason(self, symbolic: &IntegraError) -> Self {
        let numeric = match self {
            IntegraError::NumericConvergenceFailure { numeric, .. } => numeric,
            other => other.to_string(),
        };
        IntegraError::NumericConvergenceFailure {
            symbolic: symbolic.to_string(),
            numeric,
        }
    }

    /// true for the failures that hand the request over to the numeric integrator
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            IntegraError::SymbolicIntegrationFailure { .. }
                | IntegraError::SymbolicTimeout { .. }
                | IntegraError::EvaluationFailure(_)
                | IntegraError::NumericEvaluationFailure(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_details() {
        let e = IntegraError::parse_error("x+)", "unbalanced brackets");
        assert_eq!(e.to_string(), "Parse error in 'x+)': unbalanced brackets");
        let e = IntegraError::NumericConvergenceFailure {
            symbolic: "no antiderivative".to_string(),
            numeric: "no convergence".to_string(),
        };
        assert!(e.to_string().contains("no antiderivative"));
        assert!(e.to_string().contains("no convergence"));
    }

    #[test]
    fn test_recoverable_kinds() {
        assert!(IntegraError::unsupported("x", "exp(x^2)").is_recoverable());
        assert!(
            IntegraError::SymbolicTimeout {
                elapsed_secs: 50.0,
                ceiling_secs: 45.0
            }
            .is_recoverable()
        );
        assert!(!IntegraError::UnsupportedCoordinateSystem("polar".to_string()).is_recoverable());
        assert!(!IntegraError::parse_error("?", "bad").is_recoverable());
    }

    #[test]
    fn test_numeric_failure_takes_symbolic_reason() {
        let symbolic = IntegraError::unsupported("y", "exp(y^2)");
        let e = IntegraError::numeric_failure("200 subdivisions exhausted").with_symbolic_reason(&symbolic);
        match e {
            IntegraError::NumericConvergenceFailure { symbolic, numeric } => {
                assert!(symbolic.contains("exp(y^2)"));
                assert_eq!(numeric, "200 subdivisions exhausted");
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
