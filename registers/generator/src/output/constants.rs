// Licensed under the Apache-2.0 license

//! C constants: register addresses, field offset/length/mask and field
//! values.
//!
//! Every definition from every group is collected before anything is
//! written, so a name produced twice is suppressed everywhere rather than
//! emitted with whichever value came last.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

use crate::error::Result;
use crate::expr::Renderer;
use crate::types::{Address, Group, ValueCode};
use crate::util::c_identifier;

/// Outcome of writing a [`ConstantTable`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ConstantReport {
    /// Stems with at least one suppressed constant, sorted.
    pub ambiguous: Vec<String>,
}

#[derive(Debug)]
struct Block {
    comment: String,
    /// `<PREFIX><REGISTER>[_<FIELD>[_<VALUE>]]`, used to report collisions.
    stem: String,
    constants: Vec<(String, String)>,
}

/// Constants of one or more groups, in definition order.
#[derive(Debug, Default)]
pub struct ConstantTable {
    blocks: Vec<Block>,
    counts: BTreeMap<String, usize>,
}

impl ConstantTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the constants of `group`. Fails if an expression cannot be
    /// rendered in C.
    pub fn add_group(&mut self, group: &Group) -> Result<()> {
        for register in &group.registers {
            log::debug!("collecting constants of {}", register.name);
            let stem = group.constant_stem(register);
            let renderer = Renderer::c(register.is_wide());

            if let (true, Some(address)) = (register.define, &register.address) {
                let value = match address {
                    Address::Expr(expr) => renderer.render_operand(expr)?,
                    Address::External(text) => text.clone(),
                };
                self.push(
                    register.name.clone(),
                    stem.clone(),
                    vec![(format!("{stem}_ADDRESS"), value)],
                );
            }

            for field in register.fields().iter().filter(|f| f.define) {
                let field_stem = format!("{stem}_{}", c_identifier(&field.name).to_uppercase());
                let constants = vec![
                    (
                        format!("{field_stem}_OFFSET"),
                        renderer.render_operand(&field.low)?,
                    ),
                    (
                        format!("{field_stem}_LENGTH"),
                        renderer.render_operand(&field.length())?,
                    ),
                    (
                        format!("{field_stem}_MASK"),
                        renderer.render_operand(&field.mask())?,
                    ),
                ];
                self.push(field.description.clone(), field_stem.clone(), constants);

                for value in field.values() {
                    let Some(code) = value.code else {
                        continue;
                    };
                    let value_stem =
                        format!("{field_stem}_{}", c_identifier(&value.name).to_uppercase());
                    let constants = match code {
                        ValueCode::Single(v) => vec![(value_stem.clone(), renderer.literal(v))],
                        ValueCode::Range(lo, hi) => vec![
                            (format!("{value_stem}_START"), renderer.literal(lo)),
                            (format!("{value_stem}_END"), renderer.literal(hi)),
                        ],
                    };
                    self.push(value.description.clone(), value_stem, constants);
                }
            }
        }
        Ok(())
    }

    fn push(&mut self, comment: String, stem: String, constants: Vec<(String, String)>) {
        for (name, _) in &constants {
            *self.counts.entry(name.clone()).or_default() += 1;
        }
        self.blocks.push(Block {
            comment,
            stem,
            constants,
        });
    }

    /// Write every constant with exactly one producer as a `#define`.
    pub fn write(&self, out: &mut dyn Write) -> Result<ConstantReport> {
        let mut ambiguous = BTreeSet::new();
        for block in &self.blocks {
            let unique: Vec<_> = block
                .constants
                .iter()
                .filter(|(name, _)| self.counts.get(name) == Some(&1))
                .collect();
            if unique.len() < block.constants.len() {
                ambiguous.insert(block.stem.clone());
            }
            if unique.is_empty() {
                continue;
            }
            write_comment(&block.comment, out)?;
            for (name, value) in unique {
                writeln!(out, "#define {name} {value}")?;
            }
        }
        for stem in &ambiguous {
            log::warn!("{stem}: constant names are ambiguous, omitting them");
        }
        Ok(ConstantReport {
            ambiguous: ambiguous.into_iter().collect(),
        })
    }
}

fn write_comment(text: &str, out: &mut dyn Write) -> Result<()> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(());
    }
    let text = text.replace("*/", "* /");
    let mut lines = text.lines();
    match (lines.next(), lines.next()) {
        (Some(line), None) => writeln!(out, "/* {line} */")?,
        _ => {
            writeln!(out, "/*")?;
            for line in text.lines() {
                writeln!(out, " * {}", line.trim_end())?;
            }
            writeln!(out, " */")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Field, Register, Value};

    fn field(name: &str, bits: &str, description: &str) -> Field {
        let mut f = Field::from_bits(name, bits).unwrap();
        f.description = description.to_string();
        f
    }

    fn write(groups: &[&Group]) -> (String, ConstantReport) {
        let mut table = ConstantTable::new();
        for group in groups {
            table.add_group(group).unwrap();
        }
        let mut buf = Vec::new();
        let report = table.write(&mut buf).unwrap();
        (String::from_utf8(buf).unwrap(), report)
    }

    fn control_group() -> Group {
        let mut group = Group::new("Debug");
        group.prefix = "DM_".to_string();
        let mut r = Register::new("Debug Module Control");
        r.short = Some("dmcontrol".to_string());
        r.address = Some(Address::parse("0x10"));
        r.add_field(field("haltreq", "31", "Halt request."));
        r.add_field(field("0", "30:2", ""));
        let mut hasel = field("hasel", "1:0", "Hart array select.");
        hasel
            .add_value(Value::new("single", Some(ValueCode::Single(0))))
            .unwrap();
        let mut multiple = Value::new("multiple", Some(ValueCode::Range(1, 3)));
        multiple.description = "Every selected hart\nin the array.".to_string();
        hasel.add_value(multiple).unwrap();
        r.add_field(hasel);
        group.add_register(r);
        group
    }

    #[test]
    fn test_constants() {
        let (out, report) = write(&[&control_group()]);
        assert!(report.ambiguous.is_empty());
        let expected = "\
/* Debug Module Control */
#define DM_DMCONTROL_ADDRESS 0x10U
/* Halt request. */
#define DM_DMCONTROL_HALTREQ_OFFSET 0x1fU
#define DM_DMCONTROL_HALTREQ_LENGTH 1U
#define DM_DMCONTROL_HALTREQ_MASK 0x80000000U
/* Hart array select. */
#define DM_DMCONTROL_HASEL_OFFSET 0U
#define DM_DMCONTROL_HASEL_LENGTH 2U
#define DM_DMCONTROL_HASEL_MASK 3U
#define DM_DMCONTROL_HASEL_SINGLE 0U
/*
 * Every selected hart
 * in the array.
 */
#define DM_DMCONTROL_HASEL_MULTIPLE_START 1U
#define DM_DMCONTROL_HASEL_MULTIPLE_END 3U
";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_symbolic_constants_are_wide_and_parenthesized() {
        let mut group = Group::new("g");
        let mut r = Register::new("data");
        r.add_field(field("hi", "XLEN-1:8", ""));
        r.add_field(field("lo", "7:0", ""));
        group.add_register(r);
        let (out, _) = write(&[&group]);
        assert!(out.contains("#define DATA_HI_OFFSET 8ULL\n"));
        assert!(out.contains("#define DATA_HI_LENGTH (XLEN - 8ULL)\n"));
        assert!(out.contains("#define DATA_LO_MASK 0xffULL\n"));
    }

    #[test]
    fn test_64_bit_masks_fold() {
        let mut group = Group::new("g");
        let mut r = Register::new("wide");
        r.add_field(field("hi", "63:32", ""));
        r.add_field(field("lo", "31:0", ""));
        group.add_register(r);
        let mut r = Register::new("full");
        r.add_field(field("all", "63:0", ""));
        group.add_register(r);
        let (out, _) = write(&[&group]);
        assert!(out.contains("#define WIDE_HI_MASK 0xffffffff00000000ULL\n"));
        assert!(out.contains("#define FULL_ALL_MASK 0xffffffffffffffffULL\n"));
        assert!(!out.contains("<<"));
    }

    #[test]
    fn test_external_address_verbatim() {
        let mut group = Group::new("g");
        let mut r = Register::new("dcsr");
        r.address = Some(Address::parse("CSR_DCSR@1"));
        group.add_register(r);
        let (out, _) = write(&[&group]);
        assert_eq!(out, "/* dcsr */\n#define DCSR_ADDRESS CSR_DCSR@1\n");
    }

    #[test]
    fn test_undefined_register_has_no_address() {
        let mut group = Group::new("g");
        let mut r = Register::new("hidden");
        r.address = Some(Address::parse("4"));
        r.define = false;
        r.add_field(field("en", "0", ""));
        group.add_register(r);
        let (out, _) = write(&[&group]);
        assert!(!out.contains("ADDRESS"));
        assert!(out.contains("#define HIDDEN_EN_OFFSET 0U\n"));
    }

    #[test]
    fn test_collision_suppresses_both() {
        let mut first = Group::new("a");
        let mut r = Register::new("dm");
        r.add_field(field("en", "0", "First."));
        first.add_register(r);

        let mut second = Group::new("b");
        let mut r = Register::new("DM");
        r.add_field(field("en", "0", "Second."));
        r.add_field(field("go", "1", ""));
        second.add_register(r);

        let (out, report) = write(&[&first, &second]);
        assert_eq!(report.ambiguous, ["DM_EN"]);
        assert!(!out.contains("DM_EN"));
        assert!(!out.contains("First."));
        assert!(out.contains("#define DM_GO_OFFSET 1U\n"));
    }

    #[test]
    fn test_output_is_deterministic() {
        let group = control_group();
        assert_eq!(write(&[&group]).0, write(&[&group]).0);
    }
}
