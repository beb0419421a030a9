// Licensed under the Apache-2.0 license

//! Layout validation.
//!
//! Walking fields from the highest low bit down, each field must end exactly
//! one bit below the previous field's low bit, and the last field must start
//! at bit 0. Symbolic positions are handled with the expression engine:
//!
//! - `previous_low > high` must hold. If the comparison cannot be decided the
//!   check is skipped and a warning is logged.
//! - `previous_low - high` must be 1 whenever it resolves to a number.
//! - The lowest field's low bit must simplify to exactly 0. An undecidable
//!   lowest bit is a failure.

use crate::error::{LayoutDetail, LayoutError, Result};
use crate::expr::{compare, Comparison, Expr};
use crate::types::{Group, Register};

/// Check every register of `group`, stopping at the first failure.
pub fn validate(group: &Group) -> Result<()> {
    for register in &group.registers {
        check(register)?;
    }
    Ok(())
}

/// Prove that the fields of `register` tile `[0, width - 1]`.
pub fn check(register: &Register) -> std::result::Result<(), LayoutError> {
    log::debug!("checking layout of {}", register.name);
    let error = |field: &str, detail| LayoutError {
        register: register.name.clone(),
        field: field.to_string(),
        detail,
    };

    let mut previous: Option<&Expr> = None;
    let mut lowest = None;
    for field in register.fields() {
        if let Some(previous) = previous {
            let relation = format!("({previous}) > ({})", field.high);
            match compare(previous, &field.high) {
                Comparison::Greater => {}
                Comparison::Indeterminate => log::warn!(
                    "{}: cannot prove {relation} for field {}; skipping overlap check",
                    register.name,
                    field.name
                ),
                Comparison::Less | Comparison::Equal => {
                    return Err(error(&field.name, LayoutDetail::Overlap(relation)));
                }
            }

            let delta = (previous.clone() - field.high.clone()).simplify();
            match delta {
                Expr::Int(1) => {}
                Expr::Int(_) => {
                    let text = format!("({previous}) - ({}) = {delta}", field.high);
                    return Err(error(&field.name, LayoutDetail::Gap(text)));
                }
                _ => log::warn!(
                    "{}: cannot prove field {} abuts the field above it ({previous} - {} = {delta})",
                    register.name,
                    field.name,
                    field.high
                ),
            }
        }
        previous = Some(&field.low);
        lowest = Some(field);
    }

    match lowest {
        Some(field) if field.low != Expr::Int(0) => Err(error(
            &field.name,
            LayoutDetail::NotZeroTerminated(field.low.to_string()),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Field;

    fn init_logger() {
        let _ = simple_logger::SimpleLogger::new()
            .with_level(log::LevelFilter::Debug)
            .init();
    }

    fn register(fields: &[(&str, &str)]) -> Register {
        let mut reg = Register::new("ctrl");
        for (name, bits) in fields {
            reg.add_field(Field::from_bits(name, bits).unwrap());
        }
        reg
    }

    #[test]
    fn test_contiguous_passes() {
        let reg = register(&[("a", "31:16"), ("b", "15:8"), ("c", "7:0")]);
        check(&reg).unwrap();
    }

    #[test]
    fn test_gap_names_field() {
        let reg = register(&[("a", "31:16"), ("c", "7:0")]);
        let err = check(&reg).unwrap_err();
        assert_eq!(err.register, "ctrl");
        assert_eq!(err.field, "c");
        assert!(matches!(err.detail, LayoutDetail::Gap(_)));
    }

    #[test]
    fn test_overlap() {
        let reg = register(&[("a", "31:8"), ("b", "15:0")]);
        let err = check(&reg).unwrap_err();
        assert_eq!(err.field, "b");
        assert!(matches!(err.detail, LayoutDetail::Overlap(_)));
    }

    #[test]
    fn test_not_zero_terminated() {
        let reg = register(&[("a", "31:16"), ("b", "15:4")]);
        let err = check(&reg).unwrap_err();
        assert_eq!(err.field, "b");
        assert!(matches!(err.detail, LayoutDetail::NotZeroTerminated(_)));
    }

    #[test]
    fn test_empty_register_passes() {
        check(&Register::new("empty")).unwrap();
    }

    #[test]
    fn test_symbolic_layout() {
        let reg = register(&[("hi", "XLEN-1:8"), ("lo", "7:0")]);
        check(&reg).unwrap();
        let reg = register(&[("top", "2*w-1:w"), ("bottom", "w-1:0")]);
        check(&reg).unwrap();
    }

    #[test]
    fn test_symbolic_gap() {
        let reg = register(&[("top", "2*w-1:w+1"), ("bottom", "w-1:0")]);
        let err = check(&reg).unwrap_err();
        assert_eq!(err.field, "bottom");
        assert!(matches!(err.detail, LayoutDetail::Gap(_)));
    }

    #[test]
    fn test_unprovable_adjacency_passes() {
        init_logger();
        let reg = register(&[("hi", "XLEN-1:w"), ("lo", "w-1:0")]);
        check(&reg).unwrap();
        // w and v are unrelated, so neither ordering nor adjacency can be
        // proven; the check logs and moves on.
        let reg = register(&[("hi", "XLEN-1:w"), ("lo", "v-1:0")]);
        check(&reg).unwrap();
    }

    #[test]
    fn test_numeric_delta_still_fails() {
        let reg = register(&[("hi", "XLEN-1:w+2"), ("lo", "w:0")]);
        let err = check(&reg).unwrap_err();
        assert_eq!(err.field, "lo");
        assert!(matches!(err.detail, LayoutDetail::Gap(_)));
    }

    #[test]
    fn test_symbolic_lowest_bit_fails_closed() {
        let reg = register(&[("top", "w+7:w")]);
        let err = check(&reg).unwrap_err();
        assert!(matches!(err.detail, LayoutDetail::NotZeroTerminated(_)));
    }
}
