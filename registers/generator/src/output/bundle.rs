// Licensed under the Apache-2.0 license

//! Chisel bundles, one class per register with its fields declared from the
//! most significant bit down.

use std::collections::BTreeSet;
use std::io::Write;

use super::ValidatedGroup;
use crate::error::{Error, Result};
use crate::expr::{Expr, Renderer};
use crate::types::Register;
use crate::util::{camel_case, scala_identifier};

#[derive(Clone, Debug)]
pub struct BundleConfig {
    /// Scala package of the generated file. Empty for none.
    pub package: String,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self::new("registers")
    }
}

impl BundleConfig {
    pub fn new(package: &str) -> Self {
        Self {
            package: package.to_string(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum Kind {
    Bool,
    UInt(String),
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct Entry {
    name: String,
    kind: Kind,
}

fn uint(width: &Expr) -> Result<Kind> {
    Ok(match width.as_int() {
        Some(n) => Kind::UInt(n.to_string()),
        None => Kind::UInt(format!("({})", Renderer::scala().render(width)?)),
    })
}

/// Bundle entries of `register`, high to low. Bits not covered by an
/// emitted field become `reservedN` entries so later fields keep their
/// positions.
fn entries(register: &Register) -> Result<Vec<Entry>> {
    let mut out = Vec::new();
    let mut reserved = 0;
    let mut reserve = |out: &mut Vec<Entry>, width: &Expr| -> Result<()> {
        out.push(Entry {
            name: format!("reserved{reserved}"),
            kind: uint(width)?,
        });
        reserved += 1;
        Ok(())
    };

    let Some(first) = register.fields().first() else {
        return Ok(out);
    };
    let mut top = first.high.clone();
    for field in register.fields() {
        let gap = (top.clone() - field.high.clone()).simplify();
        if gap != Expr::Int(0) {
            reserve(&mut out, &gap)?;
        }
        if !field.define {
            reserve(&mut out, &field.length())?;
        } else if field.is_single_bit() {
            out.push(Entry {
                name: scala_identifier(&field.name),
                kind: Kind::Bool,
            });
        } else {
            out.push(Entry {
                name: scala_identifier(&field.name),
                kind: uint(&field.length())?,
            });
        }
        top = (field.low.clone() - Expr::Int(1)).simplify();
    }
    let trailing = (top + Expr::Int(1)).simplify();
    if trailing != Expr::Int(0) {
        reserve(&mut out, &trailing)?;
    }

    let mut seen = BTreeSet::new();
    for entry in &out {
        if !seen.insert(entry.name.as_str()) {
            return Err(Error::SpecStructure(format!(
                "register {}: bundle field {} is declared twice",
                register.name, entry.name
            )));
        }
    }
    Ok(out)
}

fn write_bundle(register: &Register, out: &mut dyn Write) -> Result<()> {
    let class = format!("{}Fields", camel_case(&register.identifier()));
    log::debug!("{}: bundle {class}", register.name);
    let symbols: BTreeSet<String> = register
        .fields()
        .iter()
        .flat_map(|f| f.low.symbols().into_iter().chain(f.high.symbols()))
        .collect();
    let params: Vec<String> = symbols.iter().map(|s| format!("{s}: Int")).collect();
    if params.is_empty() {
        writeln!(out, "class {class} extends Bundle {{")?;
    } else {
        writeln!(out, "class {class}({}) extends Bundle {{", params.join(", "))?;
    }
    for entry in entries(register)? {
        match entry.kind {
            Kind::Bool => writeln!(out, "  val {} = Bool()", entry.name)?,
            Kind::UInt(width) => writeln!(out, "  val {} = UInt({width}.W)", entry.name)?,
        }
    }
    writeln!(out, "}}")?;
    Ok(())
}

/// Write one bundle class for every emitted register that has fields.
pub fn write_bundles(
    groups: &[ValidatedGroup],
    config: &BundleConfig,
    out: &mut dyn Write,
) -> Result<()> {
    if !config.package.is_empty() {
        writeln!(out, "package {}", config.package)?;
        writeln!(out)?;
    }
    writeln!(out, "import chisel3._")?;
    for group in groups {
        for register in &group.registers {
            if !register.define || register.fields().is_empty() {
                continue;
            }
            writeln!(out)?;
            write_bundle(register, out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Field, Group};

    fn register(name: &str, fields: &[(&str, &str)]) -> Register {
        let mut r = Register::new(name);
        for (name, bits) in fields {
            r.add_field(Field::from_bits(name, bits).unwrap());
        }
        r
    }

    fn names(register: &Register) -> Vec<String> {
        entries(register)
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect()
    }

    #[test]
    fn test_reserved_entries() {
        let r = register("ctl", &[("go", "31"), ("0", "30:2"), ("mode", "1:0")]);
        let entries = entries(&r).unwrap();
        assert_eq!(
            entries,
            [
                Entry {
                    name: "go".to_string(),
                    kind: Kind::Bool
                },
                Entry {
                    name: "reserved0".to_string(),
                    kind: Kind::UInt("29".to_string())
                },
                Entry {
                    name: "mode".to_string(),
                    kind: Kind::UInt("2".to_string())
                },
            ]
        );
    }

    #[test]
    fn test_gap_and_trailing_reservation() {
        let r = register("ctl", &[("a", "15:12"), ("b", "7:4")]);
        assert_eq!(names(&r), ["a", "reserved0", "b", "reserved1"]);
        let entries = entries(&r).unwrap();
        assert_eq!(entries[1].kind, Kind::UInt("4".to_string()));
        assert_eq!(entries[3].kind, Kind::UInt("4".to_string()));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let r = register("ctl", &[("a b", "1"), ("a.b", "0")]);
        assert!(matches!(entries(&r), Err(Error::SpecStructure(_))));

        let r = register("ctl", &[("reserved0", "7:4"), ("0", "3:0")]);
        match entries(&r) {
            Err(Error::SpecStructure(message)) => assert!(message.contains("reserved0")),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_write_bundles() {
        let mut group = Group::new("g");
        group.add_register(register("data", &[("hi", "XLEN-1:8"), ("lo", "7:0")]));
        let mut ctl = register("Control", &[("type", "1"), ("en", "0")]);
        ctl.short = Some("dmcontrol".to_string());
        group.add_register(ctl);
        group.add_register(Register::new("empty"));
        let groups = [ValidatedGroup::new(group).unwrap()];

        let mut buf = Vec::new();
        write_bundles(&groups, &BundleConfig::new("debug"), &mut buf).unwrap();
        let expected = "\
package debug

import chisel3._

class DataFields(XLEN: Int) extends Bundle {
  val hi = UInt((XLEN - 8).W)
  val lo = UInt(8.W)
}

class DmcontrolFields extends Bundle {
  val type_ = Bool()
  val en = Bool()
}
";
        assert_eq!(String::from_utf8(buf).unwrap(), expected);
    }
}
