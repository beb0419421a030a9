// Licensed under the Apache-2.0 license

//! Core data types for a register specification.
//!
//! ## Architecture Overview
//!
//! ```text
//! Group                       # one specification file
//! └── registers: Vec<Register>
//!     └── fields: Vec<Field>  # kept in descending low-bit order
//!         └── values: Vec<Value>
//! ```
//!
//! Fields do not point back at their register. Anything that needs the
//! owning register or group (prefixed identifiers, literal width) takes it
//! as an explicit argument.

use crate::error::{Error, Result};
use crate::expr::{compare, Comparison, Expr};
use crate::util::{c_identifier, label};

//=============================================================================
// Group
//=============================================================================

/// The registers of one specification, with shared formatting options.
#[derive(Clone, Debug, Default)]
pub struct Group {
    pub name: String,
    /// Cross-reference label of the index table.
    pub label: String,
    /// Prepended to every generated constant name.
    pub prefix: String,
    pub description: String,
    pub skip_index: bool,
    pub skip_access: bool,
    pub skip_reset: bool,
    /// Section depth of register headings in the documentation.
    pub depth: u32,
    pub registers: Vec<Register>,
}

impl Group {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            depth: 3,
            ..Default::default()
        }
    }

    pub fn add_register(&mut self, register: Register) {
        self.registers.push(register);
    }

    /// `<PREFIX><REGISTER>` in upper case, the stem of every constant
    /// generated for `register`.
    pub fn constant_stem(&self, register: &Register) -> String {
        c_identifier(&format!("{}{}", self.prefix, register.identifier())).to_uppercase()
    }
}

//=============================================================================
// Register
//=============================================================================

/// Register address: an expression, or text naming an external symbol.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Address {
    Expr(Expr),
    External(String),
}

impl Address {
    /// Parse `text` as an expression, falling back to external text.
    pub fn parse(text: &str) -> Self {
        match Expr::parse(text) {
            Ok(expr) => Address::Expr(expr.simplify()),
            Err(_) => Address::External(text.trim().to_string()),
        }
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Address::Expr(Expr::Int(n)) if *n > 9 => write!(f, "{n:#x}"),
            Address::Expr(expr) => write!(f, "{expr}"),
            Address::External(text) => write!(f, "{text}"),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Register {
    pub name: String,
    /// Short mnemonic, e.g. `dmcontrol`.
    pub short: Option<String>,
    pub description: String,
    pub address: Option<Address>,
    /// One-line summary for the index table.
    pub summary: Option<String>,
    /// Whether constants are generated for this register.
    pub define: bool,
    fields: Vec<Field>,
}

impl Register {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            define: true,
            ..Default::default()
        }
    }

    /// Fields in descending low-bit order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Insert `field` before the first field whose low bit is provably
    /// lower. Fields whose order cannot be proven keep insertion order.
    pub fn add_field(&mut self, field: Field) {
        let position = self
            .fields
            .iter()
            .position(|f| compare(&field.low, &f.low) == Comparison::Greater)
            .unwrap_or(self.fields.len());
        self.fields.insert(position, field);
    }

    pub fn remove_field(&mut self, name: &str) -> Option<Field> {
        let index = self.fields.iter().position(|f| f.name == name)?;
        Some(self.fields.remove(index))
    }

    /// `max(high bits) + 1`, or 0 for a register without fields.
    pub fn width(&self) -> Expr {
        if self.fields.is_empty() {
            return Expr::Int(0);
        }
        let highs = self.fields.iter().map(|f| f.high.clone()).collect();
        (Expr::max(highs) + Expr::Int(1)).simplify()
    }

    /// True unless the width is provably at most 32 bits.
    pub fn is_wide(&self) -> bool {
        !matches!(
            compare(&self.width(), &Expr::Int(32)),
            Comparison::Less | Comparison::Equal
        )
    }

    /// Anchor label derived from the short name, or the full name.
    pub fn label(&self) -> String {
        label(self.short.as_deref().unwrap_or(&self.name))
    }

    /// Short name, or the label when there is none.
    pub fn identifier(&self) -> String {
        self.short.clone().unwrap_or_else(|| self.label())
    }
}

//=============================================================================
// Field
//=============================================================================

#[derive(Clone, Debug)]
pub struct Field {
    pub name: String,
    pub low: Expr,
    /// Inclusive.
    pub high: Expr,
    pub reset: String,
    pub access: String,
    pub description: String,
    pub summary: Option<String>,
    /// Whether constants are generated for this field.
    pub define: bool,
    values: Vec<Value>,
}

impl Field {
    pub fn new(name: &str, high: Expr, low: Expr) -> Self {
        Self {
            name: name.to_string(),
            low: low.simplify(),
            high: high.simplify(),
            reset: String::new(),
            access: String::new(),
            description: String::new(),
            summary: None,
            define: name != "0",
            values: Vec::new(),
        }
    }

    /// Build a field from bit-range text: `"n"` or `"high:low"`.
    pub fn from_bits(name: &str, bits: &str) -> Result<Self> {
        let parts: Vec<&str> = bits.split(':').collect();
        let (high, low) = match parts.as_slice() {
            [bit] => (*bit, *bit),
            [high, low] => (*high, *low),
            _ => {
                return Err(Error::SpecStructure(format!(
                    "field {name}: bit range {bits:?} must be \"n\" or \"high:low\""
                )))
            }
        };
        Ok(Self::new(name, Expr::parse(high)?, Expr::parse(low)?))
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Append `value`, rejecting a name or code already used by another
    /// non-duplicate value of this field.
    pub fn add_value(&mut self, value: Value) -> Result<()> {
        if !value.duplicate {
            for existing in self.values.iter().filter(|v| !v.duplicate) {
                if existing.name == value.name {
                    return Err(Error::DuplicateValue {
                        field: self.name.clone(),
                        what: "name",
                        key: value.name,
                    });
                }
                if let (Some(a), Some(b)) = (&existing.code, &value.code) {
                    if a.overlaps(b) {
                        return Err(Error::DuplicateValue {
                            field: self.name.clone(),
                            what: "code",
                            key: b.to_string(),
                        });
                    }
                }
            }
        }
        self.values.push(value);
        Ok(())
    }

    /// `high - low + 1`
    pub fn length(&self) -> Expr {
        (self.high.clone() - self.low.clone() + Expr::Int(1)).simplify()
    }

    /// `(2**length - 1) << low`
    pub fn mask(&self) -> Expr {
        let ones = Expr::pow(Expr::Int(2), self.length()) - Expr::Int(1);
        (ones * Expr::pow(Expr::Int(2), self.low.clone())).simplify()
    }

    /// True if the field is provably a single bit wide.
    pub fn is_single_bit(&self) -> bool {
        self.length() == Expr::Int(1)
    }

    pub fn is_read_only(&self) -> bool {
        self.access.eq_ignore_ascii_case("R")
    }
}

//=============================================================================
// Value
//=============================================================================

/// A single code or an inclusive range of codes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValueCode {
    Single(u64),
    Range(u64, u64),
}

impl ValueCode {
    /// Parse `"n"` or `"lo-hi"`; both ends may be `0x` hex.
    pub fn parse(text: &str) -> Result<Self> {
        let number = |t: &str| {
            let t = t.trim();
            let parsed = match t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
                Some(hex) => u64::from_str_radix(hex, 16),
                None => t.parse(),
            };
            parsed.map_err(|_| Error::SpecStructure(format!("bad value code {text:?}")))
        };
        match text.split_once('-') {
            Some((lo, hi)) => {
                let (lo, hi) = (number(lo)?, number(hi)?);
                if lo > hi {
                    return Err(Error::SpecStructure(format!(
                        "value range {text:?} is empty"
                    )));
                }
                Ok(ValueCode::Range(lo, hi))
            }
            None => Ok(ValueCode::Single(number(text)?)),
        }
    }

    pub fn bounds(&self) -> (u64, u64) {
        match *self {
            ValueCode::Single(v) => (v, v),
            ValueCode::Range(lo, hi) => (lo, hi),
        }
    }

    pub fn overlaps(&self, other: &ValueCode) -> bool {
        let (a_lo, a_hi) = self.bounds();
        let (b_lo, b_hi) = other.bounds();
        a_lo <= b_hi && b_lo <= a_hi
    }
}

impl std::fmt::Display for ValueCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueCode::Single(v) => write!(f, "{v}"),
            ValueCode::Range(lo, hi) => write!(f, "{lo}-{hi}"),
        }
    }
}

/// A named value a field may hold.
#[derive(Clone, Debug, Default)]
pub struct Value {
    pub name: String,
    pub code: Option<ValueCode>,
    pub description: String,
    /// An intentional alias, exempt from uniqueness checks.
    pub duplicate: bool,
}

impl Value {
    pub fn new(name: &str, code: Option<ValueCode>) -> Self {
        Self {
            name: name.to_string(),
            code,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::simplify;

    fn field(name: &str, bits: &str) -> Field {
        Field::from_bits(name, bits).unwrap()
    }

    #[test]
    fn test_fields_sorted_by_low_bit() {
        let mut reg = Register::new("r");
        reg.add_field(field("lo", "7:0"));
        reg.add_field(field("hi", "31:16"));
        reg.add_field(field("mid", "15:8"));
        let names: Vec<_> = reg.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["hi", "mid", "lo"]);
    }

    #[test]
    fn test_indeterminate_order_keeps_insertion_order() {
        let mut reg = Register::new("r");
        reg.add_field(field("top", "XLEN-1:XLEN-8"));
        reg.add_field(field("bottom", "7:0"));
        let names: Vec<_> = reg.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["top", "bottom"]);
    }

    #[test]
    fn test_width() {
        let mut reg = Register::new("r");
        assert_eq!(reg.width(), Expr::Int(0));
        reg.add_field(field("a", "63:32"));
        reg.add_field(field("b", "31:0"));
        assert_eq!(reg.width(), Expr::Int(64));
        assert!(reg.is_wide());

        let mut reg = Register::new("r");
        reg.add_field(field("a", "31:0"));
        assert!(!reg.is_wide());

        let mut reg = Register::new("r");
        reg.add_field(field("a", "XLEN-1:0"));
        assert_eq!(reg.width(), simplify("XLEN").unwrap());
        assert!(reg.is_wide());
    }

    #[test]
    fn test_length_and_mask() {
        let f = field("f", "7:4");
        assert_eq!(f.length(), Expr::Int(4));
        assert_eq!(f.mask(), Expr::Int(0xf0));
        assert!(field("b", "3").is_single_bit());
        let f = field("x", "XLEN-1:XLEN-4");
        assert_eq!(f.length(), Expr::Int(4));
        assert!(!f.mask().is_numeric());
    }

    #[test]
    fn test_64_bit_masks() {
        assert_eq!(field("all", "63:0").mask(), Expr::Int(0xffff_ffff_ffff_ffff));
        assert_eq!(field("hi", "63:32").mask(), Expr::Int(0xffff_ffff_0000_0000));
        assert_eq!(field("top", "63").mask(), Expr::Int(0x8000_0000_0000_0000));
    }

    #[test]
    fn test_bad_bits() {
        assert!(matches!(
            Field::from_bits("f", "7:4:0"),
            Err(Error::SpecStructure(_))
        ));
        assert!(matches!(
            Field::from_bits("f", "7:"),
            Err(Error::Expression { .. })
        ));
    }

    #[test]
    fn test_reserved_field_not_defined() {
        assert!(!field("0", "3:0").define);
        assert!(field("en", "3:0").define);
    }

    #[test]
    fn test_duplicate_values() {
        let mut f = field("mode", "1:0");
        f.add_value(Value::new("off", Some(ValueCode::Single(0)))).unwrap();
        f.add_value(Value::new("on", Some(ValueCode::Range(1, 2)))).unwrap();
        assert!(matches!(
            f.add_value(Value::new("off", Some(ValueCode::Single(3)))),
            Err(Error::DuplicateValue { what: "name", .. })
        ));
        assert!(matches!(
            f.add_value(Value::new("half", Some(ValueCode::Single(2)))),
            Err(Error::DuplicateValue { what: "code", .. })
        ));
        let alias = Value {
            duplicate: true,
            ..Value::new("off", Some(ValueCode::Single(0)))
        };
        f.add_value(alias).unwrap();
        assert_eq!(f.values().len(), 3);
    }

    #[test]
    fn test_value_code_parse() {
        assert_eq!(ValueCode::parse("0x1f").unwrap(), ValueCode::Single(31));
        assert_eq!(ValueCode::parse("2-5").unwrap(), ValueCode::Range(2, 5));
        assert!(ValueCode::parse("5-2").is_err());
        assert!(ValueCode::parse("x").is_err());
    }

    #[test]
    fn test_identifiers() {
        let mut group = Group::new("Debug");
        group.prefix = "DM_".to_string();
        let mut reg = Register::new("Debug Module Control");
        assert_eq!(group.constant_stem(&reg), "DM_DEBUGMODULECONTROL");
        reg.short = Some("dmcontrol".to_string());
        assert_eq!(group.constant_stem(&reg), "DM_DMCONTROL");
        assert_eq!(reg.label(), "dmcontrol");
    }

    #[test]
    fn test_address() {
        assert_eq!(Address::parse("0x7b0").to_string(), "0x7b0");
        assert_eq!(Address::parse("base + 4").to_string(), "base + 4");
        assert_eq!(
            Address::parse("CSR_DCSR@1"),
            Address::External("CSR_DCSR@1".to_string())
        );
    }
}
