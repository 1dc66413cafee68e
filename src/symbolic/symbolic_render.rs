//! Textual and typeset rendering of expressions.
//!
//! `Display` gives the canonical form: fully parenthesized and written in the input
//! language, so that parsing the rendered text gives back the same tree.
//! `to_latex` gives the typeset form shown next to results.
use crate::symbolic::symbolic_engine::{Expr, PHI, RHO, THETA};
use std::fmt;

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Var(name) => write!(f, "{}", name),
            // negative numbers keep their own brackets so the sign stays attached
            Expr::Const(val) if val.is_sign_negative() => write!(f, "({})", val),
            Expr::Const(val) => write!(f, "{}", val),
            Expr::Pi => write!(f, "π"),
            Expr::E => write!(f, "e"),
            Expr::Add(lhs, rhs) => write!(f, "({} + {})", lhs, rhs),
            Expr::Sub(lhs, rhs) => write!(f, "({} - {})", lhs, rhs),
            Expr::Mul(lhs, rhs) => write!(f, "({} * {})", lhs, rhs),
            Expr::Div(lhs, rhs) => write!(f, "({} / {})", lhs, rhs),
            Expr::Pow(base, exp) => write!(f, "({} ^ {})", base, exp),
            _ => match (self.function_name(), self.function_arg()) {
                (Some(name), Some(arg)) => write!(f, "{}({})", name, arg),
                _ => unreachable!("every remaining variant is a one-argument function"),
            },
        }
    }
}

// binding strength used to decide where the typeset form needs brackets
fn latex_precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Add(_, _) | Expr::Sub(_, _) => 1,
        Expr::Mul(_, _) => 2,
        Expr::Const(val) if val.is_sign_negative() => 2,
        Expr::Div(_, _) => 3,
        Expr::Pow(_, _) => 4,
        _ => 5,
    }
}

fn latex_number(val: f64) -> String {
    if val.is_finite() && val.fract() == 0.0 && val.abs() < 1e15 {
        format!("{}", val as i64)
    } else {
        format!("{}", val)
    }
}

impl Expr {
    /// Typeset (LaTeX) form of the expression.
    pub fn to_latex(&self) -> String {
        match self {
            Expr::Var(name) => match name.as_str() {
                THETA => "\\theta".to_string(),
                PHI => "\\phi".to_string(),
                RHO => "\\rho".to_string(),
                _ => name.clone(),
            },
            Expr::Const(val) => latex_number(*val),
            Expr::Pi => "\\pi".to_string(),
            Expr::E => "e".to_string(),
            Expr::Add(lhs, rhs) => format!("{} + {}", lhs.to_latex(), rhs.to_latex()),
            Expr::Sub(lhs, rhs) => {
                format!("{} - {}", lhs.to_latex(), wrap_latex(rhs, 2))
            }
            Expr::Mul(lhs, rhs) => match lhs.as_ref() {
                Expr::Const(c) if *c == -1.0 => format!("-{}", wrap_latex(rhs, 2)),
                _ => format!("{} \\cdot {}", wrap_latex(lhs, 2), wrap_latex(rhs, 2)),
            },
            Expr::Div(lhs, rhs) => format!("\\frac{{{}}}{{{}}}", lhs.to_latex(), rhs.to_latex()),
            Expr::Pow(base, exp) => {
                format!("{}^{{{}}}", wrap_latex(base, 5), exp.to_latex())
            }
            Expr::Exp(arg) => format!("e^{{{}}}", arg.to_latex()),
            Expr::sqrt(arg) => format!("\\sqrt{{{}}}", arg.to_latex()),
            Expr::abs(arg) => format!("\\left|{}\\right|", arg.to_latex()),
            _ => {
                let command = match self {
                    Expr::Ln(_) => "\\ln",
                    Expr::sin(_) => "\\sin",
                    Expr::cos(_) => "\\cos",
                    Expr::tg(_) => "\\tan",
                    Expr::arcsin(_) => "\\arcsin",
                    Expr::arccos(_) => "\\arccos",
                    Expr::arctg(_) => "\\arctan",
                    Expr::sinh(_) => "\\sinh",
                    Expr::cosh(_) => "\\cosh",
                    _ => "\\tanh",
                };
                let arg = self.function_arg().map(|a| a.to_latex()).unwrap_or_default();
                format!("{}\\left({}\\right)", command, arg)
            }
        }
    }
}

fn wrap_latex(expr: &Expr, min_precedence: u8) -> String {
    if latex_precedence(expr) < min_precedence {
        format!("\\left({}\\right)", expr.to_latex())
    } else {
        expr.to_latex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_fully_parenthesized() {
        let expr = Expr::var("x") + Expr::Const(2.0) * Expr::var("y");
        assert_eq!(expr.to_string(), "(x + (2 * y))");
        let expr = Expr::sin(Expr::var(THETA).boxed()).pow(Expr::Const(2.0));
        assert_eq!(expr.to_string(), "(sin(θ) ^ 2)");
    }

    #[test]
    fn test_display_negative_constant_in_brackets() {
        let expr = -Expr::var("x");
        assert_eq!(expr.to_string(), "((-1) * x)");
        assert_eq!(Expr::Const(0.5).to_string(), "0.5");
    }

    #[test]
    fn test_display_constants_and_functions() {
        let expr = Expr::Pi * Expr::Ln(Expr::E.boxed()) + Expr::arctg(Expr::var("z").boxed());
        assert_eq!(expr.to_string(), "((π * log(e)) + atan(z))");
    }

    #[test]
    fn test_latex_forms() {
        let expr = Expr::var(RHO).pow(Expr::Const(2.0)) * Expr::sin(Expr::var(PHI).boxed());
        assert_eq!(expr.to_latex(), "\\rho^{2} \\cdot \\sin\\left(\\phi\\right)");
        let frac = Expr::Const(4.0) / Expr::Const(3.0) * Expr::Pi;
        assert_eq!(frac.to_latex(), "\\frac{4}{3} \\cdot \\pi");
        let sum = (Expr::var("x") + Expr::Const(1.0)) * Expr::var("y");
        assert_eq!(sum.to_latex(), "\\left(x + 1\\right) \\cdot y");
        assert_eq!((-Expr::var("x")).to_latex(), "-x");
        assert_eq!(Expr::sqrt(Expr::var("r").boxed()).to_latex(), "\\sqrt{r}");
    }
}
