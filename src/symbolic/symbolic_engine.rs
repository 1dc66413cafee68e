//! # Symbolic Engine Module
//!
//! Core symbolic expression type of the crate. Every integrand, Jacobian, bound and
//! intermediate result of the stepwise integrator is an `Expr` tree.
//!
//! ## Main Structures and Methods
//!
//! ### `Expr` Enum
//! - **Variables**: `Var(String)` over the closed alphabet `x, y, z, r, θ, φ, ρ`
//! - **Constants**: `Const(f64)`, and the named constants `Pi` and `E`
//! - **Operations**: `Add`, `Sub`, `Mul`, `Div`, `Pow`
//! - **Functions**: `Exp`, `Ln`, `sin`, `cos`, `tg`, `arcsin`, `arccos`, `arctg`,
//!   `sinh`, `cosh`, `tanh`, `sqrt`, `abs`
//!
//! ### Key Methods
//! - `substitute_variable(var, expr)` - replace a variable by an expression (coordinate change, bounds)
//! - `set_variable(var, value)` - replace a variable by a number
//! - `free_variables()` - sorted set of variables used by the expression
//! - `map_args(f)` - rebuild a node from transformed children
//!
//! Negation has no own variant: `-e` is `Mul(Const(-1), e)`.
#![allow(non_camel_case_types)]

use std::collections::{BTreeSet, HashMap};
use std::f64::consts::{E, PI};

pub const X: &str = "x";
pub const Y: &str = "y";
pub const Z: &str = "z";
pub const R: &str = "r";
pub const THETA: &str = "θ";
pub const PHI: &str = "φ";
pub const RHO: &str = "ρ";

/// the only variable names an expression may contain
pub const VARIABLE_ALPHABET: [&str; 7] = [X, Y, Z, R, THETA, PHI, RHO];

/// Symbolic expression tree.
///
/// # Examples
/// ```rust, ignore
/// use RustedIntegra::symbolic::symbolic_engine::Expr;
/// let x = Expr::var("x");
/// let expr = Expr::Add(Box::new(x), Box::new(Expr::Const(2.0)));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// variable from the closed alphabet
    Var(String),
    /// numerical constant
    Const(f64),
    /// π
    Pi,
    /// Euler's number e
    E,
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    /// base ^ exponent
    Pow(Box<Expr>, Box<Expr>),
    /// e^x
    Exp(Box<Expr>),
    /// natural logarithm, written `log` in the input language
    Ln(Box<Expr>),
    sin(Box<Expr>),
    cos(Box<Expr>),
    /// tangent, written `tan` in the input language
    tg(Box<Expr>),
    arcsin(Box<Expr>),
    arccos(Box<Expr>),
    /// arctangent, written `atan` in the input language
    arctg(Box<Expr>),
    sinh(Box<Expr>),
    cosh(Box<Expr>),
    tanh(Box<Expr>),
    sqrt(Box<Expr>),
    abs(Box<Expr>),
}

impl std::ops::Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Expr::Add(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Sub for Expr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Expr::Sub(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Mul for Expr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Expr::Mul(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Div for Expr {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Expr::Div(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Expr::Mul(Box::new(Expr::Const(-1.0)), Box::new(self))
    }
}

impl Expr {
    /// BASIC FEATURES

    pub fn var(name: &str) -> Expr {
        Expr::Var(name.to_string())
    }

    /// Wraps the expression in a Box for the recursive variants.
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    pub fn pow(self, rhs: Expr) -> Expr {
        Expr::Pow(self.boxed(), rhs.boxed())
    }

    pub fn exp(self) -> Expr {
        Expr::Exp(self.boxed())
    }

    pub fn ln(self) -> Expr {
        Expr::Ln(self.boxed())
    }

    /// true if expression is exactly Const(0.0)
    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Const(val) if *val == 0.0)
    }

    /// true if expression is exactly Const(1.0)
    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Const(val) if *val == 1.0)
    }

    /// Numerical value of a number-like leaf: constants, π and e.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Expr::Const(val) => Some(*val),
            Expr::Pi => Some(PI),
            Expr::E => Some(E),
            _ => None,
        }
    }

    /// Name used by the input language for one-argument functions.
    pub fn function_name(&self) -> Option<&'static str> {
        let name = match self {
            Expr::Exp(_) => "exp",
            Expr::Ln(_) => "log",
            Expr::sin(_) => "sin",
            Expr::cos(_) => "cos",
            Expr::tg(_) => "tan",
            Expr::arcsin(_) => "asin",
            Expr::arccos(_) => "acos",
            Expr::arctg(_) => "atan",
            Expr::sinh(_) => "sinh",
            Expr::cosh(_) => "cosh",
            Expr::tanh(_) => "tanh",
            Expr::sqrt(_) => "sqrt",
            Expr::abs(_) => "abs",
            _ => return None,
        };
        Some(name)
    }

    /// Builds a one-argument function node from its input-language name.
    pub fn from_function_name(name: &str, arg: Expr) -> Option<Expr> {
        let arg = arg.boxed();
        let expr = match name {
            "exp" => Expr::Exp(arg),
            "log" => Expr::Ln(arg),
            "sin" => Expr::sin(arg),
            "cos" => Expr::cos(arg),
            "tan" => Expr::tg(arg),
            "asin" => Expr::arcsin(arg),
            "acos" => Expr::arccos(arg),
            "atan" => Expr::arctg(arg),
            "sinh" => Expr::sinh(arg),
            "cosh" => Expr::cosh(arg),
            "tanh" => Expr::tanh(arg),
            "sqrt" => Expr::sqrt(arg),
            "abs" => Expr::abs(arg),
            _ => return None,
        };
        Some(expr)
    }

    /// Argument of a one-argument function node.
    pub fn function_arg(&self) -> Option<&Expr> {
        match self {
            Expr::Exp(e)
            | Expr::Ln(e)
            | Expr::sin(e)
            | Expr::cos(e)
            | Expr::tg(e)
            | Expr::arcsin(e)
            | Expr::arccos(e)
            | Expr::arctg(e)
            | Expr::sinh(e)
            | Expr::cosh(e)
            | Expr::tanh(e)
            | Expr::sqrt(e)
            | Expr::abs(e) => Some(e),
            _ => None,
        }
    }

    /// Rebuilds this node with every direct child replaced by `f(child)`.
    pub fn map_args<F: FnMut(&Expr) -> Expr>(&self, mut f: F) -> Expr {
        match self {
            Expr::Var(_) | Expr::Const(_) | Expr::Pi | Expr::E => self.clone(),
            Expr::Add(lhs, rhs) => Expr::Add(f(lhs).boxed(), f(rhs).boxed()),
            Expr::Sub(lhs, rhs) => Expr::Sub(f(lhs).boxed(), f(rhs).boxed()),
            Expr::Mul(lhs, rhs) => Expr::Mul(f(lhs).boxed(), f(rhs).boxed()),
            Expr::Div(lhs, rhs) => Expr::Div(f(lhs).boxed(), f(rhs).boxed()),
            Expr::Pow(base, exp) => Expr::Pow(f(base).boxed(), f(exp).boxed()),
            Expr::Exp(e) => Expr::Exp(f(e).boxed()),
            Expr::Ln(e) => Expr::Ln(f(e).boxed()),
            Expr::sin(e) => Expr::sin(f(e).boxed()),
            Expr::cos(e) => Expr::cos(f(e).boxed()),
            Expr::tg(e) => Expr::tg(f(e).boxed()),
            Expr::arcsin(e) => Expr::arcsin(f(e).boxed()),
            Expr::arccos(e) => Expr::arccos(f(e).boxed()),
            Expr::arctg(e) => Expr::arctg(f(e).boxed()),
            Expr::sinh(e) => Expr::sinh(f(e).boxed()),
            Expr::cosh(e) => Expr::cosh(f(e).boxed()),
            Expr::tanh(e) => Expr::tanh(f(e).boxed()),
            Expr::sqrt(e) => Expr::sqrt(f(e).boxed()),
            Expr::abs(e) => Expr::abs(f(e).boxed()),
        }
    }

    /// Direct children of this node.
    pub fn args(&self) -> Vec<&Expr> {
        match self {
            Expr::Var(_) | Expr::Const(_) | Expr::Pi | Expr::E => Vec::new(),
            Expr::Add(lhs, rhs)
            | Expr::Sub(lhs, rhs)
            | Expr::Mul(lhs, rhs)
            | Expr::Div(lhs, rhs)
            | Expr::Pow(lhs, rhs) => vec![lhs.as_ref(), rhs.as_ref()],
            _ => self.function_arg().into_iter().collect(),
        }
    }

    /// Substitutes a variable with a constant value throughout the expression.
    pub fn set_variable(&self, var: &str, value: f64) -> Expr {
        match self {
            Expr::Var(name) if name == var => Expr::Const(value),
            _ => self.map_args(|e| e.set_variable(var, value)),
        }
    }

    /// Substitutes every variable found in `var_map` with its value.
    pub fn set_variable_from_map(&self, var_map: &HashMap<String, f64>) -> Expr {
        match self {
            Expr::Var(name) => match var_map.get(name) {
                Some(value) => Expr::Const(*value),
                None => self.clone(),
            },
            _ => self.map_args(|e| e.set_variable_from_map(var_map)),
        }
    }

    /// substitute a variable with an expression
    pub fn substitute_variable(&self, var: &str, expr: &Expr) -> Expr {
        match self {
            Expr::Var(name) if name == var => expr.clone(),
            _ => self.map_args(|e| e.substitute_variable(var, expr)),
        }
    }

    /// check if the expression contains a variable
    pub fn contains_variable(&self, var_name: &str) -> bool {
        match self {
            Expr::Var(name) => name == var_name,
            _ => self.args().iter().any(|e| e.contains_variable(var_name)),
        }
    }

    /// Sorted, deduplicated names of the variables used by the expression.
    pub fn free_variables(&self) -> BTreeSet<String> {
        let mut vars = BTreeSet::new();
        self.collect_variables(&mut vars);
        vars
    }

    fn collect_variables(&self, vars: &mut BTreeSet<String>) {
        match self {
            Expr::Var(name) => {
                vars.insert(name.clone());
            }
            _ => {
                for arg in self.args() {
                    arg.collect_variables(vars);
                }
            }
        }
    }

    /// true when the expression has no free variables
    pub fn is_constant(&self) -> bool {
        match self {
            Expr::Var(_) => false,
            _ => self.args().iter().all(|e| e.is_constant()),
        }
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        1 + self.args().iter().map(|e| e.node_count()).sum::<usize>()
    }
}
