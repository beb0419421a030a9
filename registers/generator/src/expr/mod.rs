// Licensed under the Apache-2.0 license

//! Symbolic bit-position expressions.
//!
//! Bit positions in a register specification are either plain integers or
//! small formulas over platform parameters, e.g. `XLEN-1` or `8*w - 1`.
//! [`Expr`] is an immutable tree over integers, named symbols, `+`, `*`,
//! `/`, `**` and `max(...)`. Subtraction is addition of a negated term.
//!
//! [`Expr::simplify`] rewrites a tree into a canonical form: constants are
//! folded, sums and products are flattened and distributed, like terms are
//! collected (so `a - a` cancels), `2**(k + c)` is split into `2**c * 2**k`,
//! and `max` drops arguments that are provably dominated. Two expressions are
//! equal exactly when their canonical forms are structurally equal.
//!
//! ## Module Organization
//!
//! - `parse`: text to [`Expr`] (winnow)
//! - `poly`: the sum-of-monomials normal form behind [`Expr::simplify`]
//! - [`render`]: lowering to C and Scala source text

mod parse;
mod poly;
pub mod render;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{Error, Result};

pub use render::{Dialect, Renderer};

/// Outcome of comparing two expressions.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Comparison {
    Less,
    Equal,
    Greater,
    /// The difference does not simplify to an integer.
    Indeterminate,
}

impl From<std::cmp::Ordering> for Comparison {
    fn from(ordering: std::cmp::Ordering) -> Self {
        match ordering {
            std::cmp::Ordering::Less => Comparison::Less,
            std::cmp::Ordering::Equal => Comparison::Equal,
            std::cmp::Ordering::Greater => Comparison::Greater,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Expr {
    Int(i128),
    Sym(String),
    Add(Vec<Expr>),
    Mul(Vec<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Max(Vec<Expr>),
}

/// Parse `text` and return its canonical form.
pub fn simplify(text: &str) -> Result<Expr> {
    Ok(Expr::parse(text)?.simplify())
}

/// Order `a` relative to `b` by simplifying `a - b`.
pub fn compare(a: &Expr, b: &Expr) -> Comparison {
    match (a.clone() - b.clone()).simplify() {
        Expr::Int(n) => n.cmp(&0).into(),
        _ => Comparison::Indeterminate,
    }
}

impl Expr {
    /// Parse `text` without simplifying it.
    pub fn parse(text: &str) -> Result<Expr> {
        parse::parse(text)
    }

    pub fn sym(name: &str) -> Expr {
        Expr::Sym(name.to_string())
    }

    pub fn pow(base: Expr, exponent: Expr) -> Expr {
        Expr::Pow(Box::new(base), Box::new(exponent))
    }

    pub fn div(numerator: Expr, denominator: Expr) -> Expr {
        Expr::Div(Box::new(numerator), Box::new(denominator))
    }

    pub fn max(args: Vec<Expr>) -> Expr {
        Expr::Max(args)
    }

    /// Return the canonical form of this expression.
    ///
    /// If an intermediate constant overflows `i128` the expression is
    /// returned unchanged, which makes every comparison against it
    /// indeterminate.
    pub fn simplify(&self) -> Expr {
        match poly::normalize(self) {
            Some(poly) => poly.to_expr(),
            None => {
                log::warn!("integer overflow while simplifying {self}");
                self.clone()
            }
        }
    }

    /// The value of this expression, if it is a literal integer.
    pub fn as_int(&self) -> Option<i128> {
        match self {
            Expr::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.simplify().as_int().is_some()
    }

    pub fn to_numeric(&self) -> Result<i128> {
        self.simplify()
            .as_int()
            .ok_or_else(|| Error::NotNumeric(self.to_string()))
    }

    /// Replace every bound symbol by its value and simplify.
    pub fn substitute(&self, values: &BTreeMap<String, i64>) -> Expr {
        self.replace(values).simplify()
    }

    fn replace(&self, values: &BTreeMap<String, i64>) -> Expr {
        let all = |items: &[Expr]| items.iter().map(|e| e.replace(values)).collect();
        match self {
            Expr::Int(_) => self.clone(),
            Expr::Sym(name) => values
                .get(name)
                .map_or_else(|| self.clone(), |v| Expr::Int(i128::from(*v))),
            Expr::Add(terms) => Expr::Add(all(terms)),
            Expr::Mul(factors) => Expr::Mul(all(factors)),
            Expr::Max(args) => Expr::Max(all(args)),
            Expr::Pow(b, e) => Expr::pow(b.replace(values), e.replace(values)),
            Expr::Div(n, d) => Expr::div(n.replace(values), d.replace(values)),
        }
    }

    /// Every symbol this expression depends on.
    pub fn symbols(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols(&self, out: &mut BTreeSet<String>) {
        match self {
            Expr::Int(_) => {}
            Expr::Sym(name) => {
                out.insert(name.clone());
            }
            Expr::Add(items) | Expr::Mul(items) | Expr::Max(items) => {
                items.iter().for_each(|e| e.collect_symbols(out));
            }
            Expr::Pow(a, b) | Expr::Div(a, b) => {
                a.collect_symbols(out);
                b.collect_symbols(out);
            }
        }
    }

    /// If this term prints with a leading minus, the term without it.
    pub(crate) fn negated_term(&self) -> Option<Expr> {
        match self {
            Expr::Int(n) if *n < 0 => n.checked_neg().map(Expr::Int),
            Expr::Mul(factors) => match factors.split_first() {
                Some((Expr::Int(-1), rest)) => Some(match rest {
                    [single] => single.clone(),
                    _ => Expr::Mul(rest.to_vec()),
                }),
                Some((Expr::Int(c), rest)) if *c < 0 => {
                    let mut out = vec![Expr::Int(c.checked_neg()?)];
                    out.extend_from_slice(rest);
                    Some(Expr::Mul(out))
                }
                _ => None,
            },
            _ => None,
        }
    }

    fn precedence(&self) -> u8 {
        if self.negated_term().is_some() {
            return SUM;
        }
        match self {
            Expr::Add(_) => SUM,
            Expr::Mul(_) | Expr::Div(..) => PRODUCT,
            Expr::Pow(..) => POWER,
            Expr::Int(_) | Expr::Sym(_) | Expr::Max(_) => ATOM,
        }
    }
}

pub(crate) const SUM: u8 = 1;
pub(crate) const PRODUCT: u8 = 2;
pub(crate) const POWER: u8 = 3;
pub(crate) const ATOM: u8 = 4;

impl From<i64> for Expr {
    fn from(val: i64) -> Self {
        Expr::Int(val.into())
    }
}

impl std::ops::Add for Expr {
    type Output = Expr;
    fn add(self, rhs: Expr) -> Expr {
        Expr::Add(vec![self, rhs])
    }
}

impl std::ops::Sub for Expr {
    type Output = Expr;
    fn sub(self, rhs: Expr) -> Expr {
        Expr::Add(vec![self, -rhs])
    }
}

impl std::ops::Mul for Expr {
    type Output = Expr;
    fn mul(self, rhs: Expr) -> Expr {
        Expr::Mul(vec![self, rhs])
    }
}

impl std::ops::Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        match self {
            Expr::Int(n) => match n.checked_neg() {
                Some(n) => Expr::Int(n),
                None => Expr::Mul(vec![Expr::Int(-1), Expr::Int(n)]),
            },
            e => Expr::Mul(vec![Expr::Int(-1), e]),
        }
    }
}

struct Operand<'a>(&'a Expr, u8);

impl fmt::Display for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.precedence() < self.1 {
            write!(f, "({})", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Prints in the syntax accepted by [`Expr::parse`].
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Int(n) => write!(f, "{n}"),
            Expr::Sym(name) => write!(f, "{name}"),
            Expr::Add(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    if i == 0 {
                        write!(f, "{term}")?;
                    } else if let Some(positive) = term.negated_term() {
                        write!(f, " - {}", Operand(&positive, PRODUCT))?;
                    } else {
                        write!(f, " + {}", Operand(term, PRODUCT))?;
                    }
                }
                Ok(())
            }
            Expr::Mul(factors) => {
                if let Some(positive) = self.negated_term() {
                    return write!(f, "-{}", Operand(&positive, PRODUCT));
                }
                for (i, factor) in factors.iter().enumerate() {
                    if i > 0 {
                        write!(f, "*")?;
                    }
                    write!(f, "{}", Operand(factor, POWER))?;
                }
                Ok(())
            }
            Expr::Pow(base, exp) => {
                write!(f, "{}**{}", Operand(base, ATOM), Operand(exp, ATOM))
            }
            Expr::Div(num, den) => {
                write!(f, "{}/{}", Operand(num, PRODUCT), Operand(den, POWER))
            }
            Expr::Max(args) => {
                write!(f, "max(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Expr {
        simplify(text).unwrap()
    }

    #[test]
    fn test_constant_folding() {
        assert_eq!(s("1 + 2*3"), Expr::Int(7));
        assert_eq!(s("2**10 - 1"), Expr::Int(1023));
        assert_eq!(s("0x20 / 4"), Expr::Int(8));
        assert_eq!(s("max(3, 9, 4)"), Expr::Int(9));
        assert_eq!(s("-(3 - 5)"), Expr::Int(2));
    }

    #[test]
    fn test_cancellation() {
        assert_eq!(s("XLEN - XLEN"), Expr::Int(0));
        assert_eq!(s("(XLEN - 1) - (XLEN - 8)"), Expr::Int(7));
        assert_eq!(s("8*(w - 1) - (8*w - 8)"), Expr::Int(0));
        assert_eq!(s("2**(w + 2) - 4*2**w"), Expr::Int(0));
    }

    #[test]
    fn test_canonical_text() {
        assert_eq!(s("8*w - 1").to_string(), "8*w - 1");
        assert_eq!(s("-1 + w*8").to_string(), "8*w - 1");
        assert_eq!(s("1 + XLEN - 1 - 0").to_string(), "XLEN");
        assert_eq!(s("2**(k+1)").to_string(), "2*2**k");
        assert_eq!(s("max(w, 3) + 1").to_string(), "max(3, w) + 1");
        assert_eq!(s("a - b").to_string(), "a - b");
    }

    #[test]
    fn test_display_reparses() {
        for text in [
            "8*w - 1",
            "2**(k - 1) - 1",
            "max(a, 2*b) - 3",
            "(a + 1)/(b + 2)",
            "-w**2 + 5",
            "x*y - 2*x",
        ] {
            let e = s(text);
            assert_eq!(s(&e.to_string()), e, "{text}");
        }
    }

    #[test]
    fn test_compare_numeric_agrees_with_integers() {
        for m in -5i128..=5 {
            for n in -5i128..=5 {
                let got = compare(&Expr::Int(m), &Expr::Int(n));
                assert_eq!(got, Comparison::from(m.cmp(&n)), "{m} vs {n}");
            }
        }
    }

    #[test]
    fn test_compare_symbolic() {
        assert_eq!(compare(&s("XLEN"), &s("XLEN - 1")), Comparison::Greater);
        assert_eq!(compare(&s("XLEN - 8"), &s("XLEN")), Comparison::Less);
        assert_eq!(compare(&s("2*w"), &s("w + w")), Comparison::Equal);
        assert_eq!(compare(&s("XLEN"), &s("32")), Comparison::Indeterminate);
    }

    #[test]
    fn test_max_drops_dominated() {
        assert_eq!(s("max(w, w - 1)"), s("w"));
        assert_eq!(s("max(w + 2, w, 1)").to_string(), "max(1, w + 2)");
    }

    #[test]
    fn test_substitute_and_numeric() {
        let e = s("8*w - 1");
        assert!(e.to_numeric().is_err());
        let values = BTreeMap::from([("w".to_string(), 4)]);
        assert_eq!(e.substitute(&values).to_numeric().unwrap(), 31);
    }

    #[test]
    fn test_symbols() {
        let e = s("max(a, b) + 2**c - a");
        let syms: Vec<_> = e.symbols().into_iter().collect();
        assert_eq!(syms, ["a", "b", "c"]);
    }

    #[test]
    fn test_inexact_division_is_not_numeric() {
        assert!(s("3/2").to_numeric().is_err());
        assert_eq!(s("(4*w + 8)/4").to_string(), "w + 2");
    }

    #[test]
    fn test_extreme_constants_do_not_panic() {
        assert_eq!(s("2**64 - 1"), Expr::Int(0xffff_ffff_ffff_ffff));
        assert_eq!(s("(-9223372036854775807 - 1) / -1"), Expr::Int(1 << 63));

        // Beyond i128 the quotient and negation stay symbolic.
        let min = Expr::Int(i128::MIN);
        assert_eq!(-min.clone(), Expr::Mul(vec![Expr::Int(-1), min.clone()]));
        assert_eq!(min.negated_term(), None);
        let quotient = Expr::div(min.clone(), Expr::Int(-1)).simplify();
        assert!(quotient.as_int().is_none());
        assert!((-min).simplify().as_int().is_none());
    }

    #[test]
    fn test_parse_errors() {
        assert!(Expr::parse("8w").is_err());
        assert!(Expr::parse("1 +").is_err());
        assert!(Expr::parse("max()").is_err());
        assert!(Expr::parse("").is_err());
    }
}
