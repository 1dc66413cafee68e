//! # Symbolic Expression Simplification Module
//!
//! Algebraic simplification of `Expr` trees. `simplify` is repeated until the tree stops
//! changing, so simplifying an already simplified expression returns it unchanged.
//!
//! ## Simplification Strategy
//!
//! 1. **Constant Folding**: arithmetic on numbers is evaluated when the result is finite
//! 2. **Algebraic Identities**: x + 0 = x, x * 1 = x, x^0 = 1, ln(e^x) = x, ...
//! 3. **Like Term Collection**: sums are flattened and terms with the same symbolic part are
//!    merged (3x + 2x = 5x); the merge table is a `BTreeMap` so the output order is fixed
//! 4. **Power Collection**: products are flattened and equal bases merged (x * x^2 = x^3)
//! 5. **Exact Trigonometry**: sin, cos and tan at integer and half-integer multiples of π
//! 6. **Pythagorean Collection**: `a·sin²u + a·cos²u = a` inside sums, and `sqrt(u²) = |u|`
//!
//! π and e are kept symbolic: `2*π` stays `2*π` and only becomes a number on evaluation.
//!
//! `expand` additionally distributes products over sums and small integer powers of sums.

use crate::symbolic::symbolic_engine::Expr;
use std::collections::BTreeMap;

/// upper bound on `simplify_` passes; every pass either shrinks or reorders the tree
const MAX_SIMPLIFY_PASSES: usize = 32;
/// largest integer power of a sum that `expand` multiplies out
const MAX_EXPANDED_POWER: f64 = 8.0;

// -0.0 renders as "(-0)"; keep zeros positive
fn number(val: f64) -> Expr {
    Expr::Const(val + 0.0)
}

fn folded(val: f64) -> Option<Expr> {
    if val.is_finite() { Some(number(val)) } else { None }
}

fn is_integer(val: f64) -> bool {
    val.is_finite() && val.fract() == 0.0
}

impl Expr {
    //___________________________________SIMPLIFICATION____________________________________

    /// Public interface for expression simplification: `simplify_` repeated to a fixpoint.
    pub fn simplify(&self) -> Expr {
        let mut current = self.simplify_();
        for _ in 0..MAX_SIMPLIFY_PASSES {
            let next = current.simplify_();
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    /// One bottom-up simplification pass.
    pub fn simplify_(&self) -> Expr {
        match self {
            Expr::Var(_) | Expr::Pi | Expr::E => self.clone(),
            Expr::Const(val) => number(*val),
            Expr::Add(_, _) | Expr::Sub(_, _) => Self::simplify_sum(self),
            Expr::Mul(_, _) => Self::simplify_product(self),
            Expr::Div(lhs, rhs) => Self::simplify_division(lhs.simplify_(), rhs.simplify_()),
            Expr::Pow(base, exp) => Self::simplify_power(base.simplify_(), exp.simplify_()),
            _ => {
                let expr = self.map_args(|arg| arg.simplify_());
                Self::simplify_function(expr)
            }
        }
    }

    fn simplify_sum(expr: &Expr) -> Expr {
        let mut terms = Vec::new();
        flatten_add(expr, &mut terms);
        let terms: Vec<Expr> = terms.iter().map(|t| t.simplify_()).collect();
        // a simplified term may itself be a sum (distributed -1)
        let mut flat = Vec::with_capacity(terms.len());
        for term in &terms {
            flatten_add(term, &mut flat);
        }

        let mut constant = 0.0;
        let mut like_terms: BTreeMap<String, (f64, Expr)> = BTreeMap::new();
        for term in flat {
            let (coeff, rest) = split_coefficient(&term);
            match rest {
                None => constant += coeff,
                Some(rest) => {
                    let entry = like_terms.entry(rest.to_string()).or_insert((0.0, rest));
                    entry.0 += coeff;
                }
            }
        }
        if !constant.is_finite() || like_terms.values().any(|(c, _)| !c.is_finite()) {
            return expr.map_args(|arg| arg.simplify_());
        }
        Self::collect_pythagorean(&mut like_terms, &mut constant);

        let mut result: Option<Expr> = None;
        let surviving = like_terms
            .into_values()
            .filter(|(coeff, _)| *coeff != 0.0)
            .map(|(coeff, rest)| (coeff, Some(rest)));
        let constant_term = if constant != 0.0 { Some((constant, None)) } else { None };
        for (coeff, rest) in surviving.chain(constant_term) {
            result = Some(match result {
                None => build_term(coeff, rest),
                Some(acc) if coeff < 0.0 => Expr::Sub(acc.boxed(), build_term(-coeff, rest).boxed()),
                Some(acc) => Expr::Add(acc.boxed(), build_term(coeff, rest).boxed()),
            });
        }
        result.unwrap_or(Expr::Const(0.0))
    }

    // a·P·sinⁿu + a·P·sinⁿ⁻²u·cos²u = a·P·sinⁿ⁻²u, merged until no such pair is left
    fn collect_pythagorean(like_terms: &mut BTreeMap<String, (f64, Expr)>, constant: &mut f64) {
        while let Some((sin_key, cos_key, common)) = Self::find_pythagorean_pair(like_terms) {
            let c_sin = like_terms.get(&sin_key).map_or(0.0, |(c, _)| *c);
            let c_cos = like_terms.get(&cos_key).map_or(0.0, |(c, _)| *c);
            let shared = if c_sin.abs() <= c_cos.abs() { c_sin } else { c_cos };
            for key in [&sin_key, &cos_key] {
                if let Some(entry) = like_terms.get_mut(key) {
                    entry.0 -= shared;
                }
            }
            let (coeff, rest) = split_coefficient(&common);
            match rest {
                None => *constant += shared * coeff,
                Some(rest) => {
                    let entry = like_terms.entry(rest.to_string()).or_insert((0.0, rest));
                    entry.0 += shared * coeff;
                }
            }
        }
    }

    // (key of the sin term, key of its cos partner, common part) for the first matching pair
    fn find_pythagorean_pair(
        like_terms: &BTreeMap<String, (f64, Expr)>,
    ) -> Option<(String, String, Expr)> {
        for (key, (coeff, rest)) in like_terms {
            if *coeff == 0.0 {
                continue;
            }
            let mut factors = Vec::new();
            flatten_mul(rest, &mut factors);
            for (i, factor) in factors.iter().enumerate() {
                let Expr::Pow(base, exp) = factor else {
                    continue;
                };
                let (Expr::sin(u), Expr::Const(n)) = (base.as_ref(), exp.as_ref()) else {
                    continue;
                };
                if *n < 2.0 || !is_integer(*n) {
                    continue;
                }
                let lowered = Expr::Pow(base.clone(), number(n - 2.0).boxed());
                let mut common = factors.clone();
                common[i] = lowered;
                let mut partner = common.clone();
                partner.push(Expr::Pow(Expr::cos(u.clone()).boxed(), number(2.0).boxed()));
                let partner_key = Self::product_of(partner).to_string();
                match like_terms.get(&partner_key) {
                    Some((other, _)) if *other != 0.0 && other.signum() == coeff.signum() => {
                        return Some((key.clone(), partner_key, Self::product_of(common)));
                    }
                    _ => {}
                }
            }
        }
        None
    }

    fn product_of(factors: Vec<Expr>) -> Expr {
        factors
            .into_iter()
            .reduce(|a, b| Expr::Mul(a.boxed(), b.boxed()))
            .map_or(Expr::Const(1.0), |product| Self::simplify_product(&product))
    }

    fn simplify_product(expr: &Expr) -> Expr {
        let mut raw = Vec::new();
        flatten_mul(expr, &mut raw);

        let mut coeff = 1.0;
        // (base, numeric exponent) pairs; equal bases are merged
        let mut powers: Vec<(Expr, f64)> = Vec::new();
        let mut others: Vec<Expr> = Vec::new();
        for factor in raw.iter().map(|f| f.simplify_()) {
            let mut inner = Vec::new();
            flatten_mul(&factor, &mut inner);
            for factor in inner {
                match factor {
                    Expr::Const(c) => coeff *= c,
                    Expr::Pow(ref base, ref exp) => match exp.as_ref() {
                        Expr::Const(n) => push_power(&mut powers, base.as_ref().clone(), *n),
                        _ => others.push(factor.clone()),
                    },
                    other => push_power(&mut powers, other, 1.0),
                }
            }
        }
        if coeff == 0.0 {
            return Expr::Const(0.0);
        }
        if !coeff.is_finite() {
            return expr.map_args(|arg| arg.simplify_());
        }

        let mut factors: Vec<Expr> = powers
            .into_iter()
            .filter(|(_, n)| *n != 0.0)
            .map(|(base, n)| {
                if n == 1.0 {
                    base
                } else {
                    Self::simplify_power(base, Expr::Const(n))
                }
            })
            .collect();
        factors.extend(others);
        // merged powers may fold to plain numbers (sqrt(2)^2)
        let mut symbolic = Vec::with_capacity(factors.len());
        for factor in factors {
            match factor {
                Expr::Const(c) => coeff *= c,
                other => symbolic.push(other),
            }
        }
        if coeff == 0.0 {
            return Expr::Const(0.0);
        }
        symbolic.sort_by_cached_key(|f| (factor_rank(f), f.to_string()));
        build_term(coeff, symbolic.into_iter().reduce(|a, b| Expr::Mul(a.boxed(), b.boxed())))
    }

    fn simplify_division(lhs: Expr, rhs: Expr) -> Expr {
        match (&lhs, &rhs) {
            (Expr::Const(a), Expr::Const(b)) if *b != 0.0 => {
                folded(a / b).unwrap_or(Expr::Div(lhs.boxed(), rhs.boxed()))
            }
            (_, Expr::Const(b)) if *b == 1.0 => lhs,
            (Expr::Const(a), _) if *a == 0.0 => Expr::Const(0.0),
            _ if lhs == rhs => Expr::Const(1.0),
            (_, Expr::Const(b)) if *b != 0.0 => {
                Self::simplify_product(&Expr::Mul(number(1.0 / b).boxed(), lhs.boxed()))
            }
            // a / x^n = a * x^-n, so that x^3 / x collects to x^2
            (_, Expr::Var(_)) => {
                let inverse = Expr::Pow(rhs.boxed(), Expr::Const(-1.0).boxed());
                Self::simplify_product(&Expr::Mul(lhs.boxed(), inverse.boxed()))
            }
            (_, Expr::Pow(base, exp)) if matches!(exp.as_ref(), Expr::Const(_)) => {
                let n = exp.as_number().unwrap_or(1.0);
                let inverse = Expr::Pow(base.clone(), Expr::Const(-n).boxed());
                Self::simplify_product(&Expr::Mul(lhs.boxed(), inverse.boxed()))
            }
            // a / (p / q) = a * q / p
            (_, Expr::Div(p, q)) => {
                Self::simplify_division(Expr::Mul(lhs.boxed(), q.clone()).simplify_(), *p.clone())
            }
            _ => {
                // pull the numeric coefficient of the numerator out of the fraction
                let (coeff, rest) = split_coefficient(&lhs);
                match rest {
                    Some(rest) if coeff != 1.0 => build_term(
                        coeff,
                        Some(Expr::Div(rest.boxed(), rhs.boxed())),
                    ),
                    _ => Expr::Div(lhs.boxed(), rhs.boxed()),
                }
            }
        }
    }

    fn simplify_power(base: Expr, exp: Expr) -> Expr {
        match (&base, &exp) {
            (_, Expr::Const(n)) if *n == 0.0 => Expr::Const(1.0),
            (_, Expr::Const(n)) if *n == 1.0 => base,
            (Expr::Const(b), _) if *b == 1.0 => Expr::Const(1.0),
            (Expr::Const(b), Expr::Const(n)) if *b == 0.0 && *n > 0.0 => Expr::Const(0.0),
            (Expr::Const(b), Expr::Const(n)) => {
                folded(b.powf(*n)).unwrap_or(Expr::Pow(base.boxed(), exp.boxed()))
            }
            (Expr::E, _) => Expr::Exp(exp.boxed()),
            // (b^m)^n = b^(m*n) holds for integer n
            (Expr::Pow(inner, m), Expr::Const(n)) if is_integer(*n) => match m.as_ref() {
                Expr::Const(m) => Self::simplify_power(*inner.clone(), number(m * n)),
                _ => Expr::Pow(base.boxed(), exp.boxed()),
            },
            // sqrt(b)^(2k) = b^k
            (Expr::sqrt(inner), Expr::Const(n)) if is_integer(*n / 2.0) => {
                Self::simplify_power(*inner.clone(), number(n / 2.0))
            }
            (Expr::Exp(arg), Expr::Const(n)) => Expr::Exp(
                Self::simplify_product(&Expr::Mul(number(*n).boxed(), arg.clone())).boxed(),
            ),
            _ => Expr::Pow(base.boxed(), exp.boxed()),
        }
    }

    fn simplify_function(expr: Expr) -> Expr {
        let Some(arg) = expr.function_arg() else {
            return expr;
        };
        // inverse pairs and exact values first
        match (&expr, arg) {
            (Expr::Exp(_), Expr::Ln(inner)) => return *inner.clone(),
            (Expr::Ln(_), Expr::Exp(inner)) => return *inner.clone(),
            (Expr::Ln(_), Expr::E) => return Expr::Const(1.0),
            (Expr::abs(_), Expr::abs(_)) => return arg.clone(),
            // sqrt(u²) = |u|
            (Expr::sqrt(_), Expr::Pow(inner, exp)) if matches!(exp.as_ref(), Expr::Const(n) if *n == 2.0) => {
                return Expr::abs(inner.clone());
            }
            _ => {}
        }
        if let Some(k) = pi_multiple(arg) {
            if let Some(value) = exact_trig(&expr, k) {
                return value;
            }
        }
        if let Expr::Const(c) = arg {
            let value = match expr {
                Expr::Exp(_) => c.exp(),
                Expr::Ln(_) => c.ln(),
                Expr::sin(_) => c.sin(),
                Expr::cos(_) => c.cos(),
                Expr::tg(_) => c.tan(),
                Expr::arcsin(_) => c.asin(),
                Expr::arccos(_) => c.acos(),
                Expr::arctg(_) => c.atan(),
                Expr::sinh(_) => c.sinh(),
                Expr::cosh(_) => c.cosh(),
                Expr::tanh(_) => c.tanh(),
                Expr::sqrt(_) => c.sqrt(),
                _ => c.abs(),
            };
            if let Some(value) = folded(value) {
                return value;
            }
        }
        expr
    }

    //___________________________________EXPANSION____________________________________

    /// Distributes products over sums, then simplifies.
    ///
    /// `(x + 1)^2 * y` becomes `x^2*y + 2*x*y + y`. Powers of sums are multiplied out only
    /// for integer exponents up to 8.
    pub fn expand(&self) -> Expr {
        self.simplify().expand_().simplify()
    }

    fn expand_(&self) -> Expr {
        match self {
            Expr::Add(_, _) | Expr::Sub(_, _) => self.map_args(|arg| arg.expand_()),
            Expr::Mul(lhs, rhs) => distribute(&lhs.expand_(), &rhs.expand_()),
            Expr::Div(lhs, rhs) => {
                let mut terms = Vec::new();
                flatten_add(&lhs.expand_(), &mut terms);
                sum_of(
                    terms
                        .into_iter()
                        .map(|t| Expr::Div(t.boxed(), rhs.clone()))
                        .collect(),
                )
            }
            Expr::Pow(base, exp) => {
                let base = base.expand_();
                match exp.as_ref() {
                    Expr::Const(n)
                        if is_integer(*n)
                            && *n >= 2.0
                            && *n <= MAX_EXPANDED_POWER
                            && matches!(base, Expr::Add(_, _) | Expr::Sub(_, _)) =>
                    {
                        let mut acc = base.clone();
                        for _ in 1..(*n as usize) {
                            acc = distribute(&acc, &base).simplify();
                        }
                        acc
                    }
                    Expr::Const(_) => match &base {
                        // (a*b)^n = a^n * b^n
                        Expr::Mul(a, b) => {
                            Expr::Pow(a.clone(), exp.clone()).expand_()
                                * Expr::Pow(b.clone(), exp.clone()).expand_()
                        }
                        _ => Expr::Pow(base.clone().boxed(), exp.clone()),
                    },
                    _ => Expr::Pow(base.boxed(), exp.clone()),
                }
            }
            _ => self.map_args(|arg| arg.expand_()),
        }
    }
}

/// Numeric coefficient and symbolic remainder of a simplified term: `3*x*y` → `(3, x*y)`.
pub(crate) fn split_coefficient(term: &Expr) -> (f64, Option<Expr>) {
    match term {
        Expr::Const(c) => (*c, None),
        Expr::Mul(lhs, rhs) => match lhs.as_ref() {
            Expr::Const(c) => {
                let (inner, rest) = split_coefficient(rhs);
                (c * inner, rest)
            }
            _ => (1.0, Some(term.clone())),
        },
        _ => (1.0, Some(term.clone())),
    }
}

fn build_term(coeff: f64, rest: Option<Expr>) -> Expr {
    match rest {
        None => number(coeff),
        Some(rest) if coeff == 1.0 => rest,
        Some(rest) => Expr::Mul(number(coeff).boxed(), rest.boxed()),
    }
}

fn push_power(powers: &mut Vec<(Expr, f64)>, base: Expr, n: f64) {
    match powers.iter_mut().find(|(b, _)| *b == base) {
        Some(entry) => entry.1 += n,
        None => powers.push((base, n)),
    }
}

// named constants lead a product, then everything else in text order
fn factor_rank(factor: &Expr) -> u8 {
    match factor {
        Expr::Pi | Expr::E => 0,
        Expr::Pow(base, _) if matches!(base.as_ref(), Expr::Pi | Expr::E) => 0,
        _ => 1,
    }
}

// k for arguments of the form k*π
fn pi_multiple(arg: &Expr) -> Option<f64> {
    match arg {
        Expr::Pi => Some(1.0),
        Expr::Const(c) if *c == 0.0 => Some(0.0),
        Expr::Mul(lhs, rhs) => match (lhs.as_ref(), rhs.as_ref()) {
            (Expr::Const(c), Expr::Pi) | (Expr::Pi, Expr::Const(c)) => Some(*c),
            _ => None,
        },
        _ => None,
    }
}

fn exact_trig(func: &Expr, k: f64) -> Option<Expr> {
    let twice = 2.0 * k;
    if !is_integer(twice) {
        return None;
    }
    let whole = is_integer(k);
    // (-1)^k for integer k, (-1)^(k - 1/2) for half-integer k
    let m = if whole { k } else { k - 0.5 };
    let sign = if (m as i64).rem_euclid(2) == 0 { 1.0 } else { -1.0 };
    match func {
        Expr::sin(_) if whole => Some(Expr::Const(0.0)),
        Expr::sin(_) => Some(Expr::Const(sign)),
        Expr::cos(_) if whole => Some(Expr::Const(sign)),
        Expr::cos(_) => Some(Expr::Const(0.0)),
        Expr::tg(_) if whole => Some(Expr::Const(0.0)),
        _ => None,
    }
}

/// Flattens nested sums into a list of terms; `a - b` contributes `a` and `-1*b`,
/// and `-1*(a + b)` contributes `-1*a` and `-1*b`.
pub(crate) fn flatten_add(expr: &Expr, out: &mut Vec<Expr>) {
    match expr {
        Expr::Add(a, b) => {
            flatten_add(a, out);
            flatten_add(b, out);
        }
        Expr::Sub(a, b) => {
            flatten_add(a, out);
            let mut negated = Vec::new();
            flatten_add(b, &mut negated);
            out.extend(negated.into_iter().map(|t| -t));
        }
        Expr::Mul(lhs, rhs)
            if matches!(lhs.as_ref(), Expr::Const(c) if *c == -1.0)
                && matches!(rhs.as_ref(), Expr::Add(_, _) | Expr::Sub(_, _)) =>
        {
            let mut inner = Vec::new();
            flatten_add(rhs, &mut inner);
            out.extend(inner.into_iter().map(|t| -t));
        }
        _ => out.push(expr.clone()),
    }
}

/// Flattens nested products into a list of factors.
pub(crate) fn flatten_mul(expr: &Expr, out: &mut Vec<Expr>) {
    match expr {
        Expr::Mul(a, b) => {
            flatten_mul(a, out);
            flatten_mul(b, out);
        }
        _ => out.push(expr.clone()),
    }
}

fn sum_of(terms: Vec<Expr>) -> Expr {
    terms
        .into_iter()
        .reduce(|a, b| Expr::Add(a.boxed(), b.boxed()))
        .unwrap_or(Expr::Const(0.0))
}

// (a1 + a2 + ..) * (b1 + b2 + ..) as a sum of pairwise products
fn distribute(lhs: &Expr, rhs: &Expr) -> Expr {
    let mut left = Vec::new();
    let mut right = Vec::new();
    flatten_add(lhs, &mut left);
    flatten_add(rhs, &mut right);
    if left.len() == 1 && right.len() == 1 {
        return Expr::Mul(lhs.clone().boxed(), rhs.clone().boxed());
    }
    let mut products = Vec::with_capacity(left.len() * right.len());
    for a in &left {
        for b in &right {
            products.push(distribute(a, b));
        }
    }
    sum_of(products)
}
