// Licensed under the Apache-2.0 license

//! Lowering expressions to target-language source text.
//!
//! `2**k` becomes a left shift of one and `max(a, b)` becomes a conditional
//! expression (C) or `math.max` call (Scala). Neither target has an N-ary
//! max, so `max` with more than two arguments is rejected with
//! [`Error::Unsupported`].

use super::{Expr, ATOM, POWER, PRODUCT, SUM};
use crate::error::{Error, Result};

/// Constant powers up to this exponent are rendered as repeated products.
const MAX_REPEATED_PRODUCT: i128 = 4;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Dialect {
    /// C preprocessor and C source. `wide` selects `ULL` over `U` suffixes.
    C { wide: bool },
    Scala,
}

/// Renders expressions for one [`Dialect`], mapping each symbol through a
/// caller-supplied function.
pub struct Renderer<'a> {
    dialect: Dialect,
    symbol: Box<dyn Fn(&str) -> String + 'a>,
}

impl<'a> Renderer<'a> {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            symbol: Box::new(|name: &str| name.to_string()),
        }
    }

    pub fn c(wide: bool) -> Self {
        Self::new(Dialect::C { wide })
    }

    pub fn scala() -> Self {
        Self::new(Dialect::Scala)
    }

    /// Use `symbol` to render symbol names, e.g. `XLEN` to
    /// `context.XLEN.value`.
    pub fn with_symbols(mut self, symbol: impl Fn(&str) -> String + 'a) -> Self {
        self.symbol = Box::new(symbol);
        self
    }

    pub fn render(&self, expr: &Expr) -> Result<String> {
        Ok(self.render_prec(expr)?.0)
    }

    /// Render and parenthesize the result if it contains an operator, so it
    /// can be substituted into another macro body safely.
    pub fn render_operand(&self, expr: &Expr) -> Result<String> {
        Ok(parenthesize(&self.render(expr)?))
    }

    /// Format a non-negative integer literal: decimal up to 9, hex above.
    pub fn literal(&self, value: u64) -> String {
        let digits = if value > 9 {
            format!("0x{value:x}")
        } else {
            format!("{value}")
        };
        match self.dialect {
            Dialect::C { wide: true } => format!("{digits}ULL"),
            Dialect::C { wide: false } => format!("{digits}U"),
            Dialect::Scala if value > i32::MAX as u64 => format!("{digits}L"),
            Dialect::Scala => digits,
        }
    }

    fn operand(&self, expr: &Expr, min: u8) -> Result<String> {
        let (text, prec) = self.render_prec(expr)?;
        Ok(if prec < min { format!("({text})") } else { text })
    }

    fn render_prec(&self, expr: &Expr) -> Result<(String, u8)> {
        if let Expr::Int(n) = expr {
            return self.integer(*n);
        }
        if let Some(positive) = expr.negated_term() {
            return Ok((format!("-{}", self.operand(&positive, PRODUCT)?), SUM));
        }
        Ok(match expr {
            Expr::Int(n) => self.integer(*n)?,
            Expr::Sym(name) => ((self.symbol)(name), ATOM),
            Expr::Add(terms) => {
                let mut out = String::new();
                for (i, term) in terms.iter().enumerate() {
                    if i == 0 {
                        out += &self.render_prec(term)?.0;
                    } else if let Some(positive) = term.negated_term() {
                        out += &format!(" - {}", self.operand(&positive, PRODUCT)?);
                    } else {
                        out += &format!(" + {}", self.operand(term, PRODUCT)?);
                    }
                }
                (out, SUM)
            }
            Expr::Mul(factors) => {
                let parts = factors
                    .iter()
                    .map(|f| self.operand(f, POWER))
                    .collect::<Result<Vec<_>>>()?;
                (parts.join(" * "), PRODUCT)
            }
            Expr::Div(num, den) => (
                format!(
                    "{} / {}",
                    self.operand(num, PRODUCT)?,
                    self.operand(den, POWER)?
                ),
                PRODUCT,
            ),
            Expr::Pow(base, exp) => (self.power(expr, base, exp)?, ATOM),
            Expr::Max(args) => self.maximum(expr, args)?,
        })
    }

    /// Literals are limited to the 64-bit range of the generated C types.
    fn integer(&self, n: i128) -> Result<(String, u8)> {
        let value = u64::try_from(n.unsigned_abs())
            .map_err(|_| Error::Unsupported(format!("literal {n} exceeds 64 bits")))?;
        Ok(if n < 0 {
            (format!("-{}", self.literal(value)), SUM)
        } else {
            (self.literal(value), ATOM)
        })
    }

    fn power(&self, expr: &Expr, base: &Expr, exp: &Expr) -> Result<String> {
        match (base, exp) {
            (Expr::Int(2), _) => {
                let one = self.literal(1);
                Ok(format!("({one} << {})", self.operand(exp, ATOM)?))
            }
            (_, Expr::Int(n)) if (1..=MAX_REPEATED_PRODUCT).contains(n) => {
                let factor = self.operand(base, ATOM)?;
                let parts = vec![factor; *n as usize];
                Ok(format!("({})", parts.join(" * ")))
            }
            _ => Err(Error::Unsupported(format!("power {expr}"))),
        }
    }

    fn maximum(&self, expr: &Expr, args: &[Expr]) -> Result<(String, u8)> {
        match args {
            [single] => self.render_prec(single),
            [a, b] => {
                let a = self.operand(a, ATOM)?;
                let b = self.operand(b, ATOM)?;
                Ok(match self.dialect {
                    Dialect::C { .. } => (format!("({a} > {b} ? {a} : {b})"), ATOM),
                    Dialect::Scala => (format!("math.max({a}, {b})"), ATOM),
                })
            }
            _ => Err(Error::Unsupported(format!(
                "{expr}: max of {} arguments",
                args.len()
            ))),
        }
    }
}

/// Wrap `text` in parentheses unless it is a single token or already
/// enclosed by one matching pair.
pub fn parenthesize(text: &str) -> String {
    let has_operator = text
        .chars()
        .any(|c| matches!(c, '+' | '-' | '*' | '/' | '<' | '>' | '?' | ':' | '&' | '|' | '~' | ' '));
    if !has_operator || is_enclosed(text) {
        text.to_string()
    } else {
        format!("({text})")
    }
}

fn is_enclosed(text: &str) -> bool {
    if !text.starts_with('(') || !text.ends_with(')') {
        return false;
    }
    let mut depth = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return i == text.len() - 1;
                }
            }
            _ => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::simplify;
    use std::collections::BTreeMap;

    #[test]
    fn test_literals() {
        assert_eq!(Renderer::c(false).literal(9), "9U");
        assert_eq!(Renderer::c(false).literal(0xf0), "0xf0U");
        assert_eq!(Renderer::c(true).literal(31), "0x1fULL");
        assert_eq!(Renderer::scala().literal(64), "0x40");
    }

    #[test]
    fn test_extreme_literals() {
        let e = simplify("-9223372036854775807 - 1").unwrap();
        assert_eq!(
            Renderer::c(true).render(&e).unwrap(),
            "-0x8000000000000000ULL"
        );
        let e = simplify("2**64 - 1").unwrap();
        assert_eq!(
            Renderer::c(true).render(&e).unwrap(),
            "0xffffffffffffffffULL"
        );
        assert!(matches!(
            Renderer::c(true).render(&simplify("2**64").unwrap()),
            Err(Error::Unsupported(_))
        ));
        assert!(matches!(
            Renderer::c(true).render(&Expr::Int(i128::MIN)),
            Err(Error::Unsupported(_))
        ));
    }

    #[test]
    fn test_c_sum() {
        let e = simplify("8*w - 1").unwrap();
        assert_eq!(Renderer::c(false).render(&e).unwrap(), "8U * w - 1U");
        assert_eq!(
            Renderer::c(false).render_operand(&e).unwrap(),
            "(8U * w - 1U)"
        );
    }

    #[test]
    fn test_shift_form() {
        let e = simplify("2**k - 1").unwrap();
        assert_eq!(Renderer::c(true).render(&e).unwrap(), "(1ULL << k) - 1ULL");
        let e = simplify("2**(k - 1)").unwrap();
        assert_eq!(Renderer::c(false).render(&e).unwrap(), "(1U << (k - 1U))");
    }

    #[test]
    fn test_symbol_renderer() {
        let e = simplify("XLEN - 1").unwrap();
        let r = Renderer::c(false).with_symbols(|s| format!("context.{s}.value"));
        assert_eq!(r.render(&e).unwrap(), "context.XLEN.value - 1U");
    }

    #[test]
    fn test_max_forms() {
        let e = simplify("max(a, b)").unwrap();
        assert_eq!(Renderer::c(false).render(&e).unwrap(), "(a > b ? a : b)");
        assert_eq!(Renderer::scala().render(&e).unwrap(), "math.max(a, b)");
        let e = simplify("max(a, b, c)").unwrap();
        assert!(matches!(
            Renderer::c(false).render(&e),
            Err(Error::Unsupported(_))
        ));
    }

    #[test]
    fn test_round_trip_with_bound_symbols() {
        // Plain rendering with symbols replaced by their values must
        // evaluate to the same number as substituting directly.
        let e = simplify("8*w - 1").unwrap();
        let text = Renderer::scala()
            .with_symbols(|s| if s == "w" { "4".into() } else { s.into() })
            .render(&e)
            .unwrap();
        assert_eq!(simplify(&text).unwrap(), Expr::Int(31));
        let values = BTreeMap::from([("w".to_string(), 4)]);
        assert_eq!(e.substitute(&values), Expr::Int(31));
    }

    #[test]
    fn test_parenthesize() {
        assert_eq!(parenthesize("0xf0U"), "0xf0U");
        assert_eq!(parenthesize("(1U << k)"), "(1U << k)");
        assert_eq!(parenthesize("(a) - (b)"), "((a) - (b))");
        assert_eq!(parenthesize("XLEN - 1"), "(XLEN - 1)");
    }
}
