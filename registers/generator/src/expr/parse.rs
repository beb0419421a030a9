// Licensed under the Apache-2.0 license

//! Expression grammar.
//!
//! ```text
//! sum     := product (('+' | '-') product)*
//! product := unary (('*' | '/') unary)*
//! unary   := '-' unary | power
//! power   := atom ('**' unary)?
//! atom    := integer | 'max' '(' sum (',' sum)* ')' | identifier | '(' sum ')'
//! ```
//!
//! Integers are decimal or `0x` hexadecimal.

use winnow::ascii::{digit1, hex_digit1, multispace0};
use winnow::combinator::{alt, delimited, not, opt, preceded, repeat, separated, terminated};
use winnow::error::{ContextError, ErrMode, ModalResult};
use winnow::token::{one_of, take_while};
use winnow::Parser;

use super::Expr;
use crate::error::{Error, Result};

pub(super) fn parse(text: &str) -> Result<Expr> {
    delimited(multispace0, sum, multispace0)
        .parse(text)
        .map_err(|e| Error::Expression {
            text: text.to_string(),
            detail: e.to_string(),
        })
}

fn ws<'a, O, P>(inner: P) -> impl Parser<&'a str, O, ErrMode<ContextError>>
where
    P: Parser<&'a str, O, ErrMode<ContextError>>,
{
    delimited(multispace0, inner, multispace0)
}

fn sum(input: &mut &str) -> ModalResult<Expr> {
    let first = product.parse_next(input)?;
    let rest: Vec<(char, Expr)> =
        repeat(0.., (ws(one_of(['+', '-'])), product)).parse_next(input)?;
    Ok(rest.into_iter().fold(first, |acc, (op, rhs)| match op {
        '+' => acc + rhs,
        _ => acc - rhs,
    }))
}

fn product(input: &mut &str) -> ModalResult<Expr> {
    let first = unary.parse_next(input)?;
    let rest: Vec<(char, Expr)> = repeat(
        0..,
        (ws(alt((terminated('*', not('*')), '/'))), unary),
    )
    .parse_next(input)?;
    Ok(rest.into_iter().fold(first, |acc, (op, rhs)| match op {
        '*' => acc * rhs,
        _ => Expr::div(acc, rhs),
    }))
}

fn unary(input: &mut &str) -> ModalResult<Expr> {
    alt((preceded(ws('-'), unary).map(|e| -e), power)).parse_next(input)
}

fn power(input: &mut &str) -> ModalResult<Expr> {
    let base = atom.parse_next(input)?;
    let exponent = opt(preceded(ws("**"), unary)).parse_next(input)?;
    Ok(match exponent {
        Some(exponent) => Expr::pow(base, exponent),
        None => base,
    })
}

fn atom(input: &mut &str) -> ModalResult<Expr> {
    ws(alt((
        integer,
        call_or_symbol,
        delimited('(', sum, ws(')')),
    )))
    .parse_next(input)
}

fn integer(input: &mut &str) -> ModalResult<Expr> {
    alt((
        preceded(alt(("0x", "0X")), hex_digit1)
            .try_map(|digits: &str| i128::from_str_radix(digits, 16)),
        digit1.try_map(|digits: &str| digits.parse::<i128>()),
    ))
    .map(Expr::Int)
    .parse_next(input)
}

fn call_or_symbol(input: &mut &str) -> ModalResult<Expr> {
    let name = identifier.parse_next(input)?;
    if name.eq_ignore_ascii_case("max") {
        let args: Vec<Expr> =
            delimited(ws('('), separated(1.., sum, ws(',')), ws(')')).parse_next(input)?;
        return Ok(Expr::Max(args));
    }
    Ok(Expr::Sym(name.to_string()))
}

fn identifier<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence() {
        let e = parse("1 + 2 * 3 ** 2").unwrap();
        assert_eq!(
            e,
            Expr::Int(1) + Expr::Int(2) * Expr::pow(Expr::Int(3), Expr::Int(2))
        );
    }

    #[test]
    fn test_power_is_right_associative() {
        let e = parse("2**3**2").unwrap();
        assert_eq!(e.simplify(), Expr::Int(512));
    }

    #[test]
    fn test_symbols_and_hex() {
        let e = parse(" XLEN_2 - 0x1f ").unwrap();
        assert_eq!(e, Expr::sym("XLEN_2") - Expr::Int(31));
    }

    #[test]
    fn test_max_call() {
        let e = parse("Max(a, b + 1)").unwrap();
        assert_eq!(e, Expr::Max(vec![Expr::sym("a"), Expr::sym("b") + Expr::Int(1)]));
    }

    #[test]
    fn test_error_names_text() {
        match parse("3 ** ") {
            Err(Error::Expression { text, .. }) => assert_eq!(text, "3 ** "),
            other => panic!("unexpected {other:?}"),
        }
    }
}
