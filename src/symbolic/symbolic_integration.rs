use crate::errors::IntegraError;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_simplify::{flatten_add, flatten_mul, split_coefficient};
use log::debug;
use std::f64::consts::{FRAC_PI_2, PI};

fn cannot_integrate(var: &str, expr: &Expr) -> IntegraError {
    IntegraError::unsupported(var, format!("no antiderivative found for {}", expr))
}

/// Coefficients (a, b) of an expression of the form a*var + b, with a and b free of `var`.
///
/// The coefficients may be symbolic: `x*y + 2` gives `(y, 2)` with respect to `x`.
/// Returns `None` when the expression is not linear in `var`.
pub fn linear_coefficients(expr: &Expr, var: &str) -> Option<(Expr, Expr)> {
    fn walk(expr: &Expr, var: &str) -> Option<(Expr, Expr)> {
        if !expr.contains_variable(var) {
            return Some((Expr::Const(0.0), expr.clone()));
        }
        match expr {
            Expr::Var(_) => Some((Expr::Const(1.0), Expr::Const(0.0))),
            Expr::Add(lhs, rhs) => {
                let (a1, b1) = walk(lhs, var)?;
                let (a2, b2) = walk(rhs, var)?;
                Some((a1 + a2, b1 + b2))
            }
            Expr::Sub(lhs, rhs) => {
                let (a1, b1) = walk(lhs, var)?;
                let (a2, b2) = walk(rhs, var)?;
                Some((a1 - a2, b1 - b2))
            }
            Expr::Mul(lhs, rhs) if !lhs.contains_variable(var) => {
                let (a, b) = walk(rhs, var)?;
                Some((*lhs.clone() * a, *lhs.clone() * b))
            }
            Expr::Mul(lhs, rhs) if !rhs.contains_variable(var) => {
                let (a, b) = walk(lhs, var)?;
                Some((a * *rhs.clone(), b * *rhs.clone()))
            }
            Expr::Div(lhs, rhs) if !rhs.contains_variable(var) => {
                let (a, b) = walk(lhs, var)?;
                Some((a / *rhs.clone(), b / *rhs.clone()))
            }
            _ => None,
        }
    }
    let (a, b) = walk(expr, var)?;
    let a = a.simplify();
    if a.is_zero() {
        return None;
    }
    Some((a, b.simplify()))
}

// n for var^n with a numeric exponent
fn power_of_var(expr: &Expr, var: &str) -> Option<f64> {
    match expr {
        Expr::Var(name) if name == var => Some(1.0),
        Expr::Pow(base, exp) => match (base.as_ref(), exp.as_ref()) {
            (Expr::Var(name), Expr::Const(n)) if name == var => Some(*n),
            _ => None,
        },
        _ => None,
    }
}

// argument of a log, looking through abs: log(u) and log(|u|)
fn log_argument(expr: &Expr) -> Option<&Expr> {
    match expr {
        Expr::Ln(arg) => match arg.as_ref() {
            Expr::abs(inner) => Some(inner),
            other => Some(other),
        },
        _ => None,
    }
}

// (exponent m, argument u) for sin(u)^m, m = 1 for plain sin(u)
fn sin_power(expr: &Expr) -> Option<(f64, &Expr)> {
    match expr {
        Expr::sin(u) => Some((1.0, u)),
        Expr::Pow(base, exp) => match (base.as_ref(), exp.as_ref()) {
            (Expr::sin(u), Expr::Const(m)) => Some((*m, u)),
            _ => None,
        },
        _ => None,
    }
}

fn cos_power(expr: &Expr) -> Option<(f64, &Expr)> {
    match expr {
        Expr::cos(u) => Some((1.0, u)),
        Expr::Pow(base, exp) => match (base.as_ref(), exp.as_ref()) {
            (Expr::cos(u), Expr::Const(m)) => Some((*m, u)),
            _ => None,
        },
        _ => None,
    }
}

// Some(true) when `expr` has a zero for `var` in [lo, hi], None when the zeros cannot be located
fn vanishes_within(expr: &Expr, var: &str, lo: f64, hi: f64) -> Option<bool> {
    if !expr.contains_variable(var) {
        return Some(false);
    }
    if let Some((a, b)) = linear_coefficients(expr, var) {
        let root = -b.eval_constant().ok()? / a.eval_constant().ok()?;
        return Some(lo <= root && root <= hi);
    }
    match expr {
        Expr::Mul(lhs, rhs) => match (
            vanishes_within(lhs, var, lo, hi),
            vanishes_within(rhs, var, lo, hi),
        ) {
            (Some(true), _) | (_, Some(true)) => Some(true),
            (Some(false), Some(false)) => Some(false),
            _ => None,
        },
        // c^u with c > 0
        Expr::Pow(base, _) if base.eval_constant().is_ok_and(|c| c > 0.0) => Some(false),
        Expr::Pow(base, exp) if exp.as_number().is_some_and(|n| n > 0.0) => {
            vanishes_within(base, var, lo, hi)
        }
        Expr::sqrt(u) | Expr::abs(u) => vanishes_within(u, var, lo, hi),
        Expr::Exp(_) | Expr::cosh(_) => Some(false),
        Expr::sin(u) => periodic_zero_within(u, var, lo, hi, 0.0),
        Expr::cos(u) => periodic_zero_within(u, var, lo, hi, FRAC_PI_2),
        _ => quadratic_zero_within(expr, var, lo, hi),
    }
}

// zeros of sin (offset 0) or cos (offset π/2) of a linear argument lie at offset + kπ
fn periodic_zero_within(u: &Expr, var: &str, lo: f64, hi: f64, offset: f64) -> Option<bool> {
    let (a, b) = linear_coefficients(u, var)?;
    let (a, b) = (a.eval_constant().ok()?, b.eval_constant().ok()?);
    let (p, q) = (a * lo + b, a * hi + b);
    let (u_lo, u_hi) = (p.min(q), p.max(q));
    let k = ((u_lo - offset) / PI).ceil();
    Some(offset + k * PI <= u_hi)
}

// k·var² + c with numeric k and c
fn quadratic_zero_within(expr: &Expr, var: &str, lo: f64, hi: f64) -> Option<bool> {
    let mut terms = Vec::new();
    flatten_add(expr, &mut terms);
    let (mut k, mut c) = (0.0, 0.0);
    for term in &terms {
        let (coeff, rest) = split_coefficient(term);
        match rest {
            None => c += coeff,
            Some(rest) if power_of_var(&rest, var) == Some(2.0) => k += coeff,
            Some(rest) if !rest.contains_variable(var) => c += coeff * rest.eval_constant().ok()?,
            Some(_) => return None,
        }
    }
    if k == 0.0 {
        return None;
    }
    let square = -c / k;
    if square < 0.0 {
        return Some(false);
    }
    let root = square.sqrt();
    Some([-root, root].iter().any(|r| lo <= *r && *r <= hi))
}

/// Rejects integrands with a non-integrable singularity in [lo, hi]: a zero of a denominator,
/// of the base of uⁿ with n <= -1, or of cos u under tan u. A singular point whose position
/// cannot be determined is rejected as well.
fn check_singularities(expr: &Expr, var: &str, lo: f64, hi: f64) -> Result<(), IntegraError> {
    if !expr.contains_variable(var) {
        return Ok(());
    }
    let vanishing = match expr {
        Expr::Pow(base, exp) if exp.as_number().is_some_and(|n| n <= -1.0) => {
            Some(base.as_ref().clone())
        }
        Expr::Div(_, den) => Some(den.as_ref().clone()),
        Expr::tg(u) => Some(Expr::cos(u.clone())),
        _ => None,
    };
    if let Some(vanishing) = vanishing {
        match vanishes_within(&vanishing, var, lo, hi) {
            Some(false) => {}
            Some(true) => {
                return Err(IntegraError::unsupported(
                    var,
                    format!("{} is singular where {} = 0 in [{}, {}]", expr, vanishing, lo, hi),
                ));
            }
            None => {
                return Err(IntegraError::unsupported(
                    var,
                    format!("cannot locate the zeros of {} on [{}, {}]", vanishing, lo, hi),
                ));
            }
        }
    }
    for arg in expr.args() {
        check_singularities(arg, var, lo, hi)?;
    }
    Ok(())
}

impl Expr {
    /// SYMBOLIC INTEGRATION

    /// Indefinite integral with respect to `var`, without constant of integration.
    ///
    /// Handles linearity, factors free of `var`, powers, elementary functions of linear
    /// arguments, and the usual product patterns (u-substitution for sinᵐ·cos, integration by
    /// parts for polynomial·exp/sin/cos and xⁿ·ln x, exp·sin, exp·cos, product-to-sum for two
    /// trigonometric factors). When nothing matches, the expanded form is tried once more;
    /// otherwise the result is `SymbolicIntegrationFailure`.
    pub fn integrate(&self, var: &str) -> Result<Expr, IntegraError> {
        let expr = self.simplify();
        match expr.integrate_sum(var) {
            Ok(result) => Ok(result.simplify()),
            Err(err) => {
                let expanded = expr.expand();
                if expanded == expr {
                    return Err(err);
                }
                debug!("retrying ∫ d{} on expanded form {}", var, expanded);
                expanded
                    .integrate_sum(var)
                    .map(|result| result.simplify())
                    .map_err(|_| err)
            }
        }
    }

    /// F(upper) - F(lower) for the antiderivative F; the bounds may be expressions.
    ///
    /// With numeric bounds the integrand must be free of non-integrable singularities on the
    /// closed interval, otherwise the result is `SymbolicIntegrationFailure`.
    pub fn definite_integrate(
        &self,
        var: &str,
        lower: &Expr,
        upper: &Expr,
    ) -> Result<Expr, IntegraError> {
        let antiderivative = self.integrate(var)?;
        if let (Ok(lo), Ok(hi)) = (lower.eval_constant(), upper.eval_constant()) {
            check_singularities(&self.simplify(), var, lo.min(hi), lo.max(hi))?;
        }
        let at_upper = antiderivative.substitute_variable(var, upper);
        let at_lower = antiderivative.substitute_variable(var, lower);
        Ok((at_upper - at_lower).simplify())
    }

    // ∫ (f + g) dx = ∫ f dx + ∫ g dx
    fn integrate_sum(&self, var: &str) -> Result<Expr, IntegraError> {
        let mut terms = Vec::new();
        flatten_add(self, &mut terms);
        let mut parts = Vec::with_capacity(terms.len());
        for term in &terms {
            parts.push(term.integrate_term(var)?);
        }
        Ok(parts
            .into_iter()
            .reduce(|a, b| a + b)
            .unwrap_or(Expr::Const(0.0)))
    }

    // ∫ c * f dx = c * ∫ f dx for every factor c free of var
    fn integrate_term(&self, var: &str) -> Result<Expr, IntegraError> {
        if !self.contains_variable(var) {
            return Ok(self.clone() * Expr::var(var));
        }
        let (coeff, rest) = split_coefficient(self);
        let Some(rest) = rest else {
            return Ok(Expr::Const(coeff) * Expr::var(var));
        };
        let mut factors = Vec::new();
        flatten_mul(&rest, &mut factors);
        let (free, dependent): (Vec<Expr>, Vec<Expr>) =
            factors.into_iter().partition(|f| !f.contains_variable(var));
        let integral = match dependent.as_slice() {
            [single] => single.integrate_single(var)?,
            [first, second] => Self::integrate_pair(first, second, var)
                .or_else(|| Self::integrate_pair(second, first, var))
                .ok_or_else(|| cannot_integrate(var, self))?,
            _ => return Err(cannot_integrate(var, self)),
        };
        let constant = free
            .into_iter()
            .fold(Expr::Const(coeff), |acc, factor| acc * factor);
        Ok(constant * integral)
    }

    fn linear_in(&self, var: &str) -> Result<(Expr, Expr), IntegraError> {
        linear_coefficients(self, var).ok_or_else(|| {
            IntegraError::unsupported(var, format!("{} is not linear in {}", self, var))
        })
    }

    // one factor depending on var
    fn integrate_single(&self, var: &str) -> Result<Expr, IntegraError> {
        let x = Expr::var(var);
        match self {
            // ∫ x dx = x²/2
            Expr::Var(_) => Ok(x.pow(Expr::Const(2.0)) / Expr::Const(2.0)),
            Expr::Add(_, _) | Expr::Sub(_, _) | Expr::Mul(_, _) => self.integrate(var),
            Expr::Pow(base, exp) => self.integrate_power(base, exp, var),
            Expr::Div(num, den) if !num.contains_variable(var) => {
                Ok(*num.clone() * den.integrate_reciprocal(var)?)
            }
            // ∫ e^(ax+b) dx = e^(ax+b)/a
            Expr::Exp(u) => {
                let (a, _) = u.linear_in(var)?;
                Ok(self.clone() / a)
            }
            // ∫ ln(u) dx = (u ln u - u)/a, the same with |u|
            Expr::Ln(_) => {
                let u = log_argument(self).ok_or_else(|| cannot_integrate(var, self))?;
                let (a, _) = u.linear_in(var)?;
                Ok((u.clone() * self.clone() - u.clone()) / a)
            }
            Expr::sin(u) => {
                let (a, _) = u.linear_in(var)?;
                Ok(-Expr::cos(u.clone()) / a)
            }
            Expr::cos(u) => {
                let (a, _) = u.linear_in(var)?;
                Ok(Expr::sin(u.clone()) / a)
            }
            // ∫ tan(u) dx = -ln|cos u|/a
            Expr::tg(u) => {
                let (a, _) = u.linear_in(var)?;
                Ok(-Expr::Ln(Expr::abs(Expr::cos(u.clone()).boxed()).boxed()) / a)
            }
            Expr::sinh(u) => {
                let (a, _) = u.linear_in(var)?;
                Ok(Expr::cosh(u.clone()) / a)
            }
            Expr::cosh(u) => {
                let (a, _) = u.linear_in(var)?;
                Ok(Expr::sinh(u.clone()) / a)
            }
            Expr::tanh(u) => {
                let (a, _) = u.linear_in(var)?;
                Ok(Expr::Ln(Expr::cosh(u.clone()).boxed()) / a)
            }
            // ∫ sqrt(u) dx = 2/3 u^(3/2) / a
            Expr::sqrt(u) => {
                let (a, _) = u.linear_in(var)?;
                Ok(Expr::Const(2.0) * u.as_ref().clone().pow(Expr::Const(1.5))
                    / (Expr::Const(3.0) * a))
            }
            Expr::abs(u) => {
                let (a, _) = u.linear_in(var)?;
                Ok(u.as_ref().clone() * self.clone() / (Expr::Const(2.0) * a))
            }
            Expr::arcsin(u) | Expr::arccos(u) | Expr::arctg(u) => {
                let (a, _) = u.linear_in(var)?;
                let u = u.as_ref().clone();
                let one_minus_sq =
                    Expr::sqrt((Expr::Const(1.0) - u.clone().pow(Expr::Const(2.0))).boxed());
                let result = match self {
                    Expr::arcsin(_) => u * self.clone() + one_minus_sq,
                    Expr::arccos(_) => u * self.clone() - one_minus_sq,
                    _ => {
                        u.clone() * self.clone()
                            - Expr::Ln((Expr::Const(1.0) + u.pow(Expr::Const(2.0))).boxed())
                                / Expr::Const(2.0)
                    }
                };
                Ok(result / a)
            }
            _ => Err(cannot_integrate(var, self)),
        }
    }

    fn integrate_power(&self, base: &Expr, exp: &Expr, var: &str) -> Result<Expr, IntegraError> {
        if !exp.contains_variable(var) {
            let n = exp
                .as_number()
                .ok_or_else(|| cannot_integrate(var, self))?;
            if let Some((a, _)) = linear_coefficients(base, var) {
                // ∫ u^-1 dx = ln|u|/a
                if n == -1.0 {
                    return Ok(Expr::Ln(Expr::abs(base.clone().boxed()).boxed()) / a);
                }
                // ∫ u^n dx = u^(n+1)/((n+1) a)
                return Ok(base.clone().pow(Expr::Const(n + 1.0)) / (Expr::Const(n + 1.0) * a));
            }
            // sin²ᵏ⁺¹u = (1 - cos²u)ᵏ sin u, cos²ᵏ⁺¹u = (1 - sin²u)ᵏ cos u
            if n >= 3.0 && n.fract() == 0.0 && n % 2.0 == 1.0 {
                let (u, other) = match base {
                    Expr::sin(u) => (u, Expr::cos(u.clone())),
                    Expr::cos(u) => (u, Expr::sin(u.clone())),
                    _ => return Err(cannot_integrate(var, self)),
                };
                u.linear_in(var)?;
                let reduced = (Expr::Const(1.0) - other.pow(Expr::Const(2.0)))
                    .pow(Expr::Const((n - 1.0) / 2.0))
                    * base.clone();
                return reduced.expand().integrate(var);
            }
            if n == 2.0 {
                // sin²u = u/2 - sin(2u)/4, cos²u = u/2 + sin(2u)/4
                let half_angle = match base {
                    Expr::sin(u) => Some((u, -1.0)),
                    Expr::cos(u) => Some((u, 1.0)),
                    _ => None,
                };
                if let Some((u, sign)) = half_angle {
                    let (a, _) = u.linear_in(var)?;
                    let double = Expr::sin((Expr::Const(2.0) * u.as_ref().clone()).boxed());
                    return Ok(Expr::var(var) / Expr::Const(2.0)
                        + Expr::Const(sign) * double / (Expr::Const(4.0) * a));
                }
            }
            return Err(cannot_integrate(var, self));
        }
        // ∫ c^(ax+b) dx = c^(ax+b)/(a ln c)
        if !base.contains_variable(var) {
            let (a, _) = exp.linear_in(var)?;
            return Ok(self.clone() / (a * Expr::Ln(base.clone().boxed())));
        }
        Err(cannot_integrate(var, self))
    }

    // ∫ 1/q dx
    fn integrate_reciprocal(&self, var: &str) -> Result<Expr, IntegraError> {
        if let Some((a, _)) = linear_coefficients(self, var) {
            return Ok(Expr::Ln(Expr::abs(self.clone().boxed()).boxed()) / a);
        }
        // ∫ 1/(k x² + c) dx = atan(x sqrt(k/c)) / sqrt(k c) for k, c > 0
        let mut terms = Vec::new();
        flatten_add(self, &mut terms);
        let mut k = None;
        let mut c = 0.0;
        for term in &terms {
            let (coeff, rest) = split_coefficient(term);
            match rest {
                None => c += coeff,
                Some(rest) if power_of_var(&rest, var) == Some(2.0) && k.is_none() => {
                    k = Some(coeff)
                }
                Some(rest) if !rest.contains_variable(var) => match rest.eval_constant() {
                    Ok(value) => c += coeff * value,
                    Err(_) => return Err(cannot_integrate(var, &self.clone().pow(Expr::Const(-1.0)))),
                },
                Some(_) => return Err(cannot_integrate(var, &self.clone().pow(Expr::Const(-1.0)))),
            }
        }
        match k {
            Some(k) if k > 0.0 && c > 0.0 => {
                let arg = Expr::var(var) * Expr::Const((k / c).sqrt());
                Ok(Expr::arctg(arg.boxed()) / Expr::Const((k * c).sqrt()))
            }
            _ => Err(cannot_integrate(
                var,
                &(Expr::Const(1.0) / self.clone()),
            )),
        }
    }

    // two factors depending on var, in this order
    fn integrate_pair(f: &Expr, g: &Expr, var: &str) -> Option<Expr> {
        Self::integrate_trig_power_times_derivative(f, g, var)
            .or_else(|| Self::integrate_power_times_abs(f, g, var))
            .or_else(|| Self::integrate_log_times_power(f, g, var))
            .or_else(|| Self::integrate_by_parts(f, g, var))
            .or_else(|| Self::integrate_exp_times_trig(f, g, var))
            .or_else(|| Self::integrate_trig_product(f, g, var))
            .or_else(|| Self::integrate_exp_product(f, g, var))
    }

    // ∫ sinᵐ(u) cos(u) dx = sinᵐ⁺¹(u)/((m+1) a), ∫ cosᵐ(u) sin(u) dx = -cosᵐ⁺¹(u)/((m+1) a)
    fn integrate_trig_power_times_derivative(f: &Expr, g: &Expr, var: &str) -> Option<Expr> {
        let (m, u, sign, base) = match (sin_power(f), cos_power(f), g) {
            (Some((m, u)), _, Expr::cos(v)) if u == v.as_ref() => {
                (m, u, 1.0, Expr::sin(u.clone().boxed()))
            }
            (_, Some((m, u)), Expr::sin(v)) if u == v.as_ref() => {
                (m, u, -1.0, Expr::cos(u.clone().boxed()))
            }
            _ => return None,
        };
        if m == -1.0 {
            return None;
        }
        let (a, _) = linear_coefficients(u, var)?;
        Some(Expr::Const(sign) * base.pow(Expr::Const(m + 1.0)) / (Expr::Const(m + 1.0) * a))
    }

    // ∫ xⁿ |x| dx = xⁿ⁺¹ |x| / (n+2) for integer n >= 0
    fn integrate_power_times_abs(f: &Expr, g: &Expr, var: &str) -> Option<Expr> {
        let n = power_of_var(f, var)?;
        if n < 0.0 || n.fract() != 0.0 {
            return None;
        }
        match g {
            Expr::abs(u) if **u == Expr::var(var) => Some(
                Expr::var(var).pow(Expr::Const(n + 1.0)) * g.clone() / Expr::Const(n + 2.0),
            ),
            _ => None,
        }
    }

    // ∫ xⁿ ln x dx = xⁿ⁺¹ ln x/(n+1) - xⁿ⁺¹/(n+1)², ∫ ln x / x dx = ln²x / 2
    fn integrate_log_times_power(f: &Expr, g: &Expr, var: &str) -> Option<Expr> {
        let arg = log_argument(f)?;
        if *arg != Expr::var(var) {
            return None;
        }
        let n = power_of_var(g, var)?;
        if n == -1.0 {
            return Some(f.clone().pow(Expr::Const(2.0)) / Expr::Const(2.0));
        }
        let next = Expr::var(var).pow(Expr::Const(n + 1.0));
        Some(
            next.clone() * f.clone() / Expr::Const(n + 1.0)
                - next / Expr::Const((n + 1.0) * (n + 1.0)),
        )
    }

    // ∫ xⁿ g dx = xⁿ G - n ∫ xⁿ⁻¹ G dx with G = ∫ g dx, for g = exp, sin, cos, sinh, cosh
    fn integrate_by_parts(f: &Expr, g: &Expr, var: &str) -> Option<Expr> {
        let n = power_of_var(f, var)?;
        if n < 1.0 || n.fract() != 0.0 {
            return None;
        }
        if !matches!(
            g,
            Expr::Exp(_) | Expr::sin(_) | Expr::cos(_) | Expr::sinh(_) | Expr::cosh(_)
        ) {
            return None;
        }
        let big_g = g.integrate_single(var).ok()?.simplify();
        let lower = Expr::var(var).pow(Expr::Const(n - 1.0)) * big_g.clone();
        let rest = lower.integrate(var).ok()?;
        Some(f.clone() * big_g - Expr::Const(n) * rest)
    }

    // ∫ e^u sin v dx = e^u (a sin v - c cos v)/(a² + c²), ∫ e^u cos v dx = e^u (a cos v + c sin v)/(a² + c²)
    fn integrate_exp_times_trig(f: &Expr, g: &Expr, var: &str) -> Option<Expr> {
        let Expr::Exp(u) = f else {
            return None;
        };
        let (v, is_sin) = match g {
            Expr::sin(v) => (v, true),
            Expr::cos(v) => (v, false),
            _ => return None,
        };
        let (a, _) = linear_coefficients(u, var)?;
        let (c, _) = linear_coefficients(v, var)?;
        let sin_v = Expr::sin(v.clone());
        let cos_v = Expr::cos(v.clone());
        let numerator = if is_sin {
            a.clone() * sin_v - c.clone() * cos_v
        } else {
            a.clone() * cos_v + c.clone() * sin_v
        };
        let denominator = a.clone() * a + c.clone() * c;
        Some(f.clone() * numerator / denominator)
    }

    // product-to-sum for two sin/cos factors with different linear arguments
    fn integrate_trig_product(f: &Expr, g: &Expr, var: &str) -> Option<Expr> {
        let (p, q) = match (f, g) {
            (Expr::sin(p) | Expr::cos(p), Expr::sin(q) | Expr::cos(q)) => (p, q),
            _ => return None,
        };
        if p == q {
            return None;
        }
        linear_coefficients(p, var)?;
        linear_coefficients(q, var)?;
        let (p, q) = (p.as_ref().clone(), q.as_ref().clone());
        let diff = (p.clone() - q.clone()).simplify().boxed();
        let sum = (p + q).simplify().boxed();
        let half = Expr::Const(0.5);
        let rewritten = match (f, g) {
            // sin p cos q = [sin(p+q) + sin(p-q)]/2
            (Expr::sin(_), Expr::cos(_)) => half * (Expr::sin(sum) + Expr::sin(diff)),
            // cos p sin q = [sin(p+q) - sin(p-q)]/2
            (Expr::cos(_), Expr::sin(_)) => half * (Expr::sin(sum) - Expr::sin(diff)),
            // sin p sin q = [cos(p-q) - cos(p+q)]/2
            (Expr::sin(_), Expr::sin(_)) => half * (Expr::cos(diff) - Expr::cos(sum)),
            // cos p cos q = [cos(p-q) + cos(p+q)]/2
            _ => half * (Expr::cos(diff) + Expr::cos(sum)),
        };
        rewritten.integrate(var).ok()
    }

    // e^u e^v = e^(u+v)
    fn integrate_exp_product(f: &Expr, g: &Expr, var: &str) -> Option<Expr> {
        match (f, g) {
            (Expr::Exp(u), Expr::Exp(v)) => Expr::Exp((*u.clone() + *v.clone()).simplify().boxed())
                .integrate(var)
                .ok(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{E, PI};

    fn parse(s: &str) -> Expr {
        Expr::parse_expression(s).unwrap()
    }

    fn definite(s: &str, var: &str, lower: Expr, upper: Expr) -> f64 {
        parse(s)
            .definite_integrate(var, &lower, &upper)
            .unwrap()
            .eval_constant()
            .unwrap()
    }

    fn unit(s: &str) -> f64 {
        definite(s, "x", Expr::Const(0.0), Expr::Const(1.0))
    }

    #[test]
    fn test_integrate_constant_and_free_factors() {
        assert_eq!(parse("5").integrate("x").unwrap(), parse("5x").simplify());
        assert_eq!(parse("y").integrate("x").unwrap(), parse("x*y").simplify());
        let value = parse("3*y*x")
            .definite_integrate("x", &Expr::Const(0.0), &Expr::Const(2.0))
            .unwrap();
        assert_eq!(value, parse("6y").simplify());
    }

    #[test]
    fn test_integrate_powers() {
        assert_relative_eq!(
            definite("x^2", "x", Expr::Const(0.0), Expr::Const(2.0)),
            8.0 / 3.0,
            epsilon = 1e-14
        );
        assert_relative_eq!(unit("x^3 + 2x + 1"), 0.25 + 1.0 + 1.0, epsilon = 1e-14);
        assert_relative_eq!(
            definite("1/x", "x", Expr::Const(1.0), Expr::E),
            1.0,
            epsilon = 1e-14
        );
        assert_relative_eq!(unit("sqrt(x)"), 2.0 / 3.0, epsilon = 1e-14);
        assert_relative_eq!(unit("(2x+1)^3"), (81.0 - 1.0) / 8.0, epsilon = 1e-12);
        assert_relative_eq!(unit("2^x"), 1.0 / 2f64.ln(), epsilon = 1e-14);
    }

    #[test]
    fn test_integrate_elementary_functions() {
        assert_relative_eq!(unit("exp(2x)"), (E * E - 1.0) / 2.0, epsilon = 1e-14);
        assert_relative_eq!(
            definite("log(x)", "x", Expr::Const(1.0), Expr::E),
            1.0,
            epsilon = 1e-14
        );
        assert_relative_eq!(unit("cosh(x)"), 1f64.sinh(), epsilon = 1e-14);
        assert_relative_eq!(unit("atan(x)"), PI / 4.0 - 2f64.ln() / 2.0, epsilon = 1e-14);
        assert_relative_eq!(unit("asin(x)"), PI / 2.0 - 1.0, epsilon = 1e-14);
        assert_relative_eq!(unit("tan(x)"), -(1f64.cos().ln()), epsilon = 1e-14);
        assert_relative_eq!(unit("1/(x^2+1)"), PI / 4.0, epsilon = 1e-14);
    }

    #[test]
    fn test_sin_over_half_period_is_exact() {
        let value = parse("sin(x)")
            .definite_integrate("x", &Expr::Const(0.0), &Expr::Pi)
            .unwrap();
        assert_eq!(value, Expr::Const(2.0));
    }

    #[test]
    fn test_log_abs_over_symmetric_interval() {
        let value = definite("log(abs(x))", "x", Expr::Const(-1.0), Expr::Const(1.0));
        assert_relative_eq!(value, -2.0, epsilon = 1e-14);
    }

    #[test]
    fn test_product_patterns() {
        assert_relative_eq!(unit("x*exp(x)"), 1.0, epsilon = 1e-14);
        assert_relative_eq!(
            definite("x^2*sin(x)", "x", Expr::Const(0.0), Expr::Pi),
            PI * PI - 4.0,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            definite("sin(x)^2", "x", Expr::Const(0.0), Expr::Pi),
            PI / 2.0,
            epsilon = 1e-14
        );
        assert_relative_eq!(
            definite("sin(x)^2*cos(x)", "x", Expr::Const(0.0), Expr::Pi / Expr::Const(2.0)),
            1.0 / 3.0,
            epsilon = 1e-14
        );
        assert_relative_eq!(
            definite("exp(x)*sin(x)", "x", Expr::Const(0.0), Expr::Pi),
            (PI.exp() + 1.0) / 2.0,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            definite("x*log(x)", "x", Expr::Const(1.0), Expr::Const(2.0)),
            2.0 * 2f64.ln() - 0.75,
            epsilon = 1e-14
        );
        assert_relative_eq!(
            definite("sin(2x)*cos(x)", "x", Expr::Const(0.0), Expr::Pi / Expr::Const(2.0)),
            2.0 / 3.0,
            epsilon = 1e-14
        );
        assert_relative_eq!(unit("x*(x+1)"), 1.0 / 3.0 + 0.5, epsilon = 1e-14);
    }

    #[test]
    fn test_symbolic_linear_coefficient() {
        // ∫ cos(xy) dx over [0, 1] = sin(y)/y
        let value = parse("cos(x*y)")
            .definite_integrate("x", &Expr::Const(0.0), &Expr::Const(1.0))
            .unwrap()
            .set_variable("y", 2.0)
            .eval_constant()
            .unwrap();
        assert_relative_eq!(value, 2f64.sin() / 2.0, epsilon = 1e-14);
    }

    #[test]
    fn test_bounds_may_be_expressions() {
        // ∫ 1 dz from 0 to x*y
        let value = parse("1")
            .definite_integrate("z", &Expr::Const(0.0), &parse("x*y"))
            .unwrap();
        assert_eq!(value, parse("x*y").simplify());
    }

    #[test]
    fn test_linear_coefficients() {
        let (a, b) = linear_coefficients(&parse("3x + 2y - 1"), "x").unwrap();
        assert_eq!(a, Expr::Const(3.0));
        assert_eq!(b, parse("2y - 1").simplify());
        assert!(linear_coefficients(&parse("x^2"), "x").is_none());
        assert!(linear_coefficients(&parse("x*y"), "y").is_some());
        assert!(linear_coefficients(&parse("x - x"), "x").is_none());
    }

    #[test]
    fn test_integration_failures() {
        for s in ["exp(x^2)", "sin(x)/x", "x^x", "sin(x)*cos(x)*exp(x)*log(x)"] {
            let result = parse(s).integrate("x");
            assert!(
                matches!(result, Err(IntegraError::SymbolicIntegrationFailure { ref variable, .. }) if variable == "x"),
                "{} unexpectedly integrated: {:?}",
                s,
                result
            );
        }
    }

    #[test]
    fn test_poles_inside_interval_are_rejected() {
        let cases = [
            ("1/x", -1.0, 1.0),
            ("1/x^2", -1.0, 1.0),
            ("1/x", 0.0, 1.0),
            ("1/(x^2-1)", 0.0, 2.0),
            ("tan(x)", 0.0, 2.0),
            ("1/sin(x)", 3.0, 4.0),
        ];
        for (s, lo, hi) in cases {
            let result = parse(s).definite_integrate("x", &Expr::Const(lo), &Expr::Const(hi));
            assert!(
                matches!(result, Err(IntegraError::SymbolicIntegrationFailure { ref variable, .. }) if variable == "x"),
                "{} over [{}, {}]: {:?}",
                s,
                lo,
                hi,
                result
            );
        }
        // the zero of x - y cannot be placed while y is free
        assert!(parse("1/(x-y)")
            .definite_integrate("x", &Expr::Const(0.0), &Expr::Const(1.0))
            .is_err());
    }

    #[test]
    fn test_poles_outside_interval_are_kept() {
        assert_relative_eq!(
            definite("1/x^2", "x", Expr::Const(1.0), Expr::Const(2.0)),
            0.5,
            epsilon = 1e-14
        );
        assert_relative_eq!(
            definite("1/x", "x", Expr::Const(-2.0), Expr::Const(-1.0)),
            -(2f64.ln()),
            epsilon = 1e-14
        );
        assert_relative_eq!(
            definite("tan(x)", "x", Expr::Const(2.0), Expr::Const(3.0)),
            2f64.cos().abs().ln() - 3f64.cos().abs().ln(),
            epsilon = 1e-14
        );
        // x^(-1/2) is integrable at 0
        assert_relative_eq!(unit("x^(-0.5)"), 2.0, epsilon = 1e-14);
    }

    #[test]
    fn test_odd_trig_powers() {
        assert_relative_eq!(
            definite("sin(x)^3", "x", Expr::Const(0.0), Expr::Pi),
            4.0 / 3.0,
            epsilon = 1e-14
        );
        assert_relative_eq!(
            definite("cos(x)^3", "x", Expr::Const(0.0), Expr::Pi / Expr::Const(2.0)),
            2.0 / 3.0,
            epsilon = 1e-14
        );
        assert_relative_eq!(
            definite("sin(2x)^5", "x", Expr::Const(0.0), Expr::Pi / Expr::Const(2.0)),
            8.0 / 15.0,
            epsilon = 1e-13
        );
    }

    #[test]
    fn test_power_times_abs() {
        assert_relative_eq!(
            definite("x*abs(x)", "x", Expr::Const(-1.0), Expr::Const(2.0)),
            7.0 / 3.0,
            epsilon = 1e-14
        );
    }
}
