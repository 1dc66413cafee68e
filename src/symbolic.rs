#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
/// a module turns a String expression into a symbolic expression
///
///# Example
/// ```
/// use RustedIntegra::symbolic::symbolic_engine::Expr;
/// let parsed = Expr::parse_expression("2x sen(y)^2").unwrap();
/// println!("parsed expression {}", parsed);
/// let f = parsed.lambdify(&["x", "y"]).unwrap();
/// assert_eq!(f(&[1.0, 0.0]), 0.0);
/// ```
/// ________________________________________________________________________________________________________________________________
pub mod parse_expr;
///____________________________________________________________________________________________________________________________
/// # Symbolic engine
/// the expression tree over the variables x, y, z, r, θ, φ, ρ and the constants π, e:
/// constructors, operator overloading, substitution, free variables
pub mod symbolic_engine;
/// canonical text (Display) and LaTeX rendering
pub mod symbolic_render;
/// rule-based simplification and expansion
///# Example
/// ```
/// use RustedIntegra::symbolic::symbolic_engine::Expr;
/// let expr = Expr::parse_expression("x + x + 2*3").unwrap();
/// assert_eq!(expr.simplify(), Expr::parse_expression("2x + 6").unwrap().simplify());
/// ```
pub mod symbolic_simplify;
/// antiderivatives and definite integrals with respect to one variable
///# Example
/// ```
/// use RustedIntegra::symbolic::symbolic_engine::Expr;
/// let expr = Expr::parse_expression("x*exp(x)").unwrap();
/// let area = expr.definite_integrate("x", &Expr::Const(0.0), &Expr::Const(1.0)).unwrap();
/// assert!((area.eval_constant().unwrap() - 1.0).abs() < 1e-12);
/// ```
pub mod symbolic_integration;
/// compiling expressions into closures and evaluating constant expressions
pub mod symbolic_lambdify;
/// cartesian, cylindrical and spherical coordinates: substitutions, Jacobians, variable order
pub mod coordinate_transform;
/// stepwise definite triple integration with a trace
pub mod symbolic_triple;
pub mod utils;
