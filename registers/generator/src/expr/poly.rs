// Licensed under the Apache-2.0 license

//! Sum-of-monomials normal form.
//!
//! A [`Poly`] maps each monomial (a sorted product of atoms raised to
//! positive powers) to a non-zero integer coefficient. Atoms are the parts
//! of an expression that do not distribute: symbols, non-foldable powers,
//! inexact quotients and `max`. All arithmetic is checked; `None` means an
//! intermediate constant overflowed.

use std::collections::BTreeMap;

use super::{compare, Comparison, Expr};

/// Polynomials raised to a constant power are expanded up to this exponent.
const MAX_EXPANSION: u32 = 8;

type Monomial = Vec<(Expr, u32)>;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(super) struct Poly {
    terms: BTreeMap<Monomial, i128>,
}

impl Poly {
    fn constant(c: i128) -> Poly {
        let mut terms = BTreeMap::new();
        if c != 0 {
            terms.insert(Monomial::new(), c);
        }
        Poly { terms }
    }

    fn atom(atom: Expr) -> Poly {
        Poly {
            terms: BTreeMap::from([(vec![(atom, 1)], 1)]),
        }
    }

    fn as_constant(&self) -> Option<i128> {
        match self.terms.len() {
            0 => Some(0),
            1 => self.terms.get(&Monomial::new()).copied(),
            _ => None,
        }
    }

    /// Split off the constant term.
    fn split_constant(&self) -> (i128, Poly) {
        let mut rest = self.clone();
        let c = rest.terms.remove(&Monomial::new()).unwrap_or(0);
        (c, rest)
    }

    fn accumulate(&mut self, monomial: Monomial, coeff: i128) -> Option<()> {
        let entry = self.terms.entry(monomial).or_insert(0);
        *entry = entry.checked_add(coeff)?;
        self.terms.retain(|_, c| *c != 0);
        Some(())
    }

    fn add(mut self, other: &Poly) -> Option<Poly> {
        for (monomial, coeff) in &other.terms {
            self.accumulate(monomial.clone(), *coeff)?;
        }
        Some(self)
    }

    fn scale(mut self, k: i128) -> Option<Poly> {
        if k == 0 {
            return Some(Poly::default());
        }
        for coeff in self.terms.values_mut() {
            *coeff = coeff.checked_mul(k)?;
        }
        Some(self)
    }

    fn mul(&self, other: &Poly) -> Option<Poly> {
        let mut out = Poly::default();
        for (ma, ca) in &self.terms {
            for (mb, cb) in &other.terms {
                out.accumulate(merge(ma, mb)?, ca.checked_mul(*cb)?)?;
            }
        }
        Some(out)
    }

    fn pow(&self, n: u32) -> Option<Poly> {
        if let [(monomial, coeff)] = self.terms.iter().collect::<Vec<_>>().as_slice() {
            let monomial = monomial
                .iter()
                .map(|(atom, e)| Some((atom.clone(), e.checked_mul(n)?)))
                .collect::<Option<Monomial>>()?;
            let mut out = Poly::default();
            out.accumulate(monomial, coeff.checked_pow(n)?)?;
            return Some(out);
        }
        let mut out = Poly::constant(1);
        for _ in 0..n {
            out = out.mul(self)?;
        }
        Some(out)
    }

    /// Divide every coefficient by `d`, if all of them are multiples of it
    /// and no quotient overflows.
    fn divide_exact(&self, d: i128) -> Option<Poly> {
        let terms = self
            .terms
            .iter()
            .map(|(m, c)| match c.checked_rem(d)? {
                0 => Some((m.clone(), c.checked_div(d)?)),
                _ => None,
            })
            .collect::<Option<_>>()?;
        Some(Poly { terms })
    }

    /// Non-constant terms in monomial order, then the constant.
    pub(super) fn to_expr(&self) -> Expr {
        let mut terms: Vec<Expr> = self
            .terms
            .iter()
            .filter(|(m, _)| !m.is_empty())
            .map(|(m, c)| term(m, *c))
            .collect();
        if let Some(c) = self.terms.get(&Monomial::new()) {
            terms.push(Expr::Int(*c));
        }
        match terms.len() {
            0 => Expr::Int(0),
            1 => terms.remove(0),
            _ => Expr::Add(terms),
        }
    }
}

fn term(monomial: &Monomial, coeff: i128) -> Expr {
    let mut factors = Vec::new();
    if coeff != 1 {
        factors.push(Expr::Int(coeff));
    }
    for (atom, e) in monomial {
        factors.push(match e {
            1 => atom.clone(),
            e => Expr::pow(atom.clone(), Expr::Int(i128::from(*e))),
        });
    }
    match factors.len() {
        1 => factors.remove(0),
        _ => Expr::Mul(factors),
    }
}

fn merge(a: &Monomial, b: &Monomial) -> Option<Monomial> {
    let mut out: BTreeMap<Expr, u32> = BTreeMap::new();
    for (atom, e) in a.iter().chain(b) {
        let entry = out.entry(atom.clone()).or_insert(0);
        *entry = entry.checked_add(*e)?;
    }
    Some(out.into_iter().collect())
}

pub(super) fn normalize(expr: &Expr) -> Option<Poly> {
    match expr {
        Expr::Int(n) => Some(Poly::constant(*n)),
        Expr::Sym(_) => Some(Poly::atom(expr.clone())),
        Expr::Add(terms) => terms
            .iter()
            .try_fold(Poly::default(), |acc, t| acc.add(&normalize(t)?)),
        Expr::Mul(factors) => factors
            .iter()
            .try_fold(Poly::constant(1), |acc, f| acc.mul(&normalize(f)?)),
        Expr::Pow(base, exp) => power(base, exp),
        Expr::Div(num, den) => divide(num, den),
        Expr::Max(args) => maximum(args),
    }
}

fn power(base: &Expr, exp: &Expr) -> Option<Poly> {
    let base = normalize(base)?;
    let exp = normalize(exp)?;
    let opaque = |base: &Poly, exp: &Poly| Poly::atom(Expr::pow(base.to_expr(), exp.to_expr()));

    if let Some(n) = exp.as_constant() {
        if n == 0 {
            return Some(Poly::constant(1));
        }
        if let Ok(n) = u32::try_from(n) {
            if base.terms.len() <= 1 || n <= MAX_EXPANSION {
                return base.pow(n);
            }
        }
        return Some(opaque(&base, &exp));
    }

    match base.as_constant() {
        Some(1) => Some(Poly::constant(1)),
        Some(b) if b >= 2 => {
            // b**(k + c) == b**c * b**k
            let (c, rest) = exp.split_constant();
            let scale = u32::try_from(c).ok().and_then(|c| b.checked_pow(c));
            match scale {
                Some(scale) if c > 0 => opaque(&base, &rest).scale(scale),
                _ => Some(opaque(&base, &exp)),
            }
        }
        _ => Some(opaque(&base, &exp)),
    }
}

fn divide(num: &Expr, den: &Expr) -> Option<Poly> {
    let num = normalize(num)?;
    let den = normalize(den)?;
    if let Some(q) = den.as_constant().and_then(|d| num.divide_exact(d)) {
        return Some(q);
    }
    Some(Poly::atom(Expr::div(num.to_expr(), den.to_expr())))
}

fn maximum(args: &[Expr]) -> Option<Poly> {
    let mut constant: Option<i128> = None;
    let mut candidates = Vec::new();
    for arg in args {
        match normalize(arg)?.to_expr() {
            Expr::Max(inner) => candidates.extend(inner),
            Expr::Int(n) => constant = Some(constant.map_or(n, |c| c.max(n))),
            e => candidates.push(e),
        }
    }
    // Flattened inner maxima may carry their own constant.
    candidates.retain(|e| match e {
        Expr::Int(n) => {
            constant = Some(constant.map_or(*n, |c| c.max(*n)));
            false
        }
        _ => true,
    });
    candidates.extend(constant.map(Expr::Int));
    candidates.sort();
    candidates.dedup();

    let kept: Vec<Expr> = candidates
        .iter()
        .filter(|e| {
            !candidates
                .iter()
                .any(|other| compare(e, other) == Comparison::Less)
        })
        .cloned()
        .collect();
    match kept.as_slice() {
        [] => None,
        [single] => normalize(single),
        _ => Some(Poly::atom(Expr::Max(kept))),
    }
}
