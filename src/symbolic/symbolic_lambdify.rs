use crate::errors::IntegraError;
use crate::symbolic::symbolic_engine::Expr;
use std::f64::consts::{E, PI};

/// Compiled form of an expression: variables are resolved to slots of the argument slice
/// once, so evaluation never looks names up.
#[derive(Clone, Debug)]
pub enum Lambda {
    Var(usize),
    Const(f64),
    Add(Box<Lambda>, Box<Lambda>),
    Sub(Box<Lambda>, Box<Lambda>),
    Mul(Box<Lambda>, Box<Lambda>),
    Div(Box<Lambda>, Box<Lambda>),
    Pow(Box<Lambda>, Box<Lambda>),
    /// integer power, evaluated with powi
    Powi(Box<Lambda>, i32),
    Exp(Box<Lambda>),
    Ln(Box<Lambda>),
    Sin(Box<Lambda>),
    Cos(Box<Lambda>),
    Tg(Box<Lambda>),
    ArcSin(Box<Lambda>),
    ArcCos(Box<Lambda>),
    ArcTg(Box<Lambda>),
    Sinh(Box<Lambda>),
    Cosh(Box<Lambda>),
    Tanh(Box<Lambda>),
    Sqrt(Box<Lambda>),
    Abs(Box<Lambda>),
}

impl Expr {
    /// LAMBDIFICATION - Converting Symbolic Expressions to Executable Functions

    /// Resolves every variable to its position in `vars`.
    pub fn compile(&self, vars: &[&str]) -> Result<Lambda, IntegraError> {
        let unary = |e: &Expr, f: fn(Box<Lambda>) -> Lambda| -> Result<Lambda, IntegraError> {
            Ok(f(Box::new(e.compile(vars)?)))
        };
        let lambda = match self {
            Expr::Var(name) => {
                let idx = vars.iter().position(|&v| v == name).ok_or_else(|| {
                    IntegraError::EvaluationFailure(format!(
                        "variable {} has no value (known: {:?})",
                        name, vars
                    ))
                })?;
                Lambda::Var(idx)
            }
            Expr::Const(v) => Lambda::Const(*v),
            Expr::Pi => Lambda::Const(PI),
            Expr::E => Lambda::Const(E),
            Expr::Add(a, b) => Lambda::Add(Box::new(a.compile(vars)?), Box::new(b.compile(vars)?)),
            Expr::Sub(a, b) => Lambda::Sub(Box::new(a.compile(vars)?), Box::new(b.compile(vars)?)),
            Expr::Mul(a, b) => Lambda::Mul(Box::new(a.compile(vars)?), Box::new(b.compile(vars)?)),
            Expr::Div(a, b) => Lambda::Div(Box::new(a.compile(vars)?), Box::new(b.compile(vars)?)),
            Expr::Pow(a, b) => match b.as_ref() {
                Expr::Const(n) if n.fract() == 0.0 && n.abs() <= i32::MAX as f64 => {
                    Lambda::Powi(Box::new(a.compile(vars)?), *n as i32)
                }
                _ => Lambda::Pow(Box::new(a.compile(vars)?), Box::new(b.compile(vars)?)),
            },
            Expr::Exp(e) => unary(e.as_ref(), Lambda::Exp)?,
            Expr::Ln(e) => unary(e.as_ref(), Lambda::Ln)?,
            Expr::sin(e) => unary(e.as_ref(), Lambda::Sin)?,
            Expr::cos(e) => unary(e.as_ref(), Lambda::Cos)?,
            Expr::tg(e) => unary(e.as_ref(), Lambda::Tg)?,
            Expr::arcsin(e) => unary(e.as_ref(), Lambda::ArcSin)?,
            Expr::arccos(e) => unary(e.as_ref(), Lambda::ArcCos)?,
            Expr::arctg(e) => unary(e.as_ref(), Lambda::ArcTg)?,
            Expr::sinh(e) => unary(e.as_ref(), Lambda::Sinh)?,
            Expr::cosh(e) => unary(e.as_ref(), Lambda::Cosh)?,
            Expr::tanh(e) => unary(e.as_ref(), Lambda::Tanh)?,
            Expr::sqrt(e) => unary(e.as_ref(), Lambda::Sqrt)?,
            Expr::abs(e) => unary(e.as_ref(), Lambda::Abs)?,
        };
        Ok(lambda)
    }

    /// Converts the expression into a thread-safe closure over `vars`, in that order.
    ///
    /// # Examples
    /// ```rust, ignore
    /// let f = Expr::parse_expression("x^2 + y").unwrap();
    /// let func = f.lambdify(&["x", "y"]).unwrap();
    /// assert_eq!(func(&[3.0, 1.0]), 10.0);
    /// ```
    pub fn lambdify(
        &self,
        vars: &[&str],
    ) -> Result<Box<dyn Fn(&[f64]) -> f64 + Send + Sync>, IntegraError> {
        let compiled = self.compile(vars)?;
        Ok(Box::new(move |args: &[f64]| compiled.eval(args)))
    }

    /// Numerical value of an expression without free variables.
    ///
    /// Fails with `EvaluationFailure` when a variable is left or the value is not finite.
    pub fn eval_constant(&self) -> Result<f64, IntegraError> {
        let free = self.free_variables();
        if !free.is_empty() {
            return Err(IntegraError::EvaluationFailure(format!(
                "{} still depends on {:?}",
                self, free
            )));
        }
        let value = self.compile(&[])?.eval(&[]);
        if value.is_finite() {
            Ok(value)
        } else {
            Err(IntegraError::EvaluationFailure(format!(
                "{} evaluates to {}",
                self, value
            )))
        }
    }
}

impl Lambda {
    #[inline(always)]
    pub fn eval(&self, args: &[f64]) -> f64 {
        match self {
            Lambda::Var(i) => args[*i],
            Lambda::Const(v) => *v,
            Lambda::Add(a, b) => a.eval(args) + b.eval(args),
            Lambda::Sub(a, b) => a.eval(args) - b.eval(args),
            Lambda::Mul(a, b) => a.eval(args) * b.eval(args),
            Lambda::Div(a, b) => a.eval(args) / b.eval(args),
            Lambda::Pow(a, b) => a.eval(args).powf(b.eval(args)),
            Lambda::Powi(a, n) => a.eval(args).powi(*n),
            Lambda::Exp(e) => e.eval(args).exp(),
            Lambda::Ln(e) => e.eval(args).ln(),
            Lambda::Sin(e) => e.eval(args).sin(),
            Lambda::Cos(e) => e.eval(args).cos(),
            Lambda::Tg(e) => e.eval(args).tan(),
            Lambda::ArcSin(e) => e.eval(args).asin(),
            Lambda::ArcCos(e) => e.eval(args).acos(),
            Lambda::ArcTg(e) => e.eval(args).atan(),
            Lambda::Sinh(e) => e.eval(args).sinh(),
            Lambda::Cosh(e) => e.eval(args).cosh(),
            Lambda::Tanh(e) => e.eval(args).tanh(),
            Lambda::Sqrt(e) => e.eval(args).sqrt(),
            Lambda::Abs(e) => e.eval(args).abs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::symbolic_engine::{PHI, RHO};
    use approx::assert_relative_eq;

    #[test]
    fn test_lambdify_variable_order() {
        let expr = Expr::parse_expression("x^2 + 2y - z").unwrap();
        let f = expr.lambdify(&["z", "y", "x"]).unwrap();
        assert_relative_eq!(f(&[1.0, 2.0, 3.0]), 9.0 + 4.0 - 1.0);
    }

    #[test]
    fn test_lambdify_greek_variables() {
        let expr = Expr::parse_expression("rho^2*sin(phi)").unwrap();
        let f = expr.lambdify(&[RHO, PHI]).unwrap();
        assert_relative_eq!(f(&[2.0, PI / 2.0]), 4.0, epsilon = 1e-15);
    }

    #[test]
    fn test_lambdify_unknown_variable() {
        let expr = Expr::parse_expression("x + y").unwrap();
        assert!(matches!(
            expr.lambdify(&["x"]),
            Err(IntegraError::EvaluationFailure(_))
        ));
    }

    #[test]
    fn test_integer_powers_of_negative_bases() {
        let expr = Expr::parse_expression("x^3").unwrap();
        let f = expr.lambdify(&["x"]).unwrap();
        assert_relative_eq!(f(&[-2.0]), -8.0);
    }

    #[test]
    fn test_eval_constant() {
        let expr = Expr::parse_expression("4/3*pi*2^3").unwrap();
        assert_relative_eq!(expr.eval_constant().unwrap(), 32.0 / 3.0 * PI, epsilon = 1e-12);
        let expr = Expr::parse_expression("log(0)").unwrap();
        assert!(matches!(
            expr.eval_constant(),
            Err(IntegraError::EvaluationFailure(_))
        ));
        let expr = Expr::parse_expression("x + 1").unwrap();
        assert!(expr.eval_constant().is_err());
    }

    #[test]
    fn test_non_finite_samples_are_returned_as_is() {
        let expr = Expr::parse_expression("sin(x)/x").unwrap();
        let f = expr.lambdify(&["x"]).unwrap();
        assert!(f(&[0.0]).is_nan());
    }
}
