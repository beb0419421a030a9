// Licensed under the Apache-2.0 license

//! LaTeX documentation: the register index, per-register detail blocks and
//! the `\defregname`/`\deffieldname` macro definitions.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::io::Write;

use crate::error::Result;
use crate::expr::{compare, Comparison};
use crate::types::{Address, Field, Group, Register, Value};
use crate::util::latex_identifier_parts;

/// Total width of one bit-diagram table, in ex.
const LAYOUT_WIDTH: f64 = 80.0;
/// Width assumed for a field whose length is symbolic.
const SYMBOLIC_FIELD_WIDTH: f64 = 20.0;
/// Length drawn by the `register` package for a field of symbolic length.
const SYMBOLIC_REGFIELD_BITS: i128 = 10;

/// Detail block layout.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DocStyle {
    /// Hand-built bit diagrams and a field table.
    #[default]
    Custom,
    /// The LaTeX `register` package. Symbolic lengths are drawn as 10 bits.
    RegisterPackage,
}

//=============================================================================
// Index
//=============================================================================

/// Registers ordered by address.
///
/// Addresses are compared symbolically; pairs that cannot be ordered that
/// way (external symbols, undecidable differences) fall back to comparing
/// their text. The sort is a stable insertion sort, so equal addresses keep
/// file order.
pub fn sorted_by_address(registers: &[Register]) -> Vec<&Register> {
    let mut sorted: Vec<&Register> = Vec::with_capacity(registers.len());
    for register in registers {
        let position = sorted
            .iter()
            .position(|r| compare_address(register, r) == Ordering::Less)
            .unwrap_or(sorted.len());
        sorted.insert(position, register);
    }
    sorted
}

fn compare_address(a: &Register, b: &Register) -> Ordering {
    if let (Some(Address::Expr(x)), Some(Address::Expr(y))) = (&a.address, &b.address) {
        match compare(x, y) {
            Comparison::Less => return Ordering::Less,
            Comparison::Equal => return Ordering::Equal,
            Comparison::Greater => return Ordering::Greater,
            Comparison::Indeterminate => {}
        }
    }
    address_text(a).cmp(&address_text(b))
}

fn address_text(register: &Register) -> String {
    register
        .address
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_default()
}

pub fn write_index(group: &Group, out: &mut dyn Write) -> Result<()> {
    if group.skip_index {
        return Ok(());
    }
    if !group.description.is_empty() {
        writeln!(out, "{}", group.description)?;
    }
    let summaries = group.registers.iter().any(|r| r.summary.is_some());
    writeln!(out, "\\begin{{table}}[htp]")?;
    writeln!(out, "   \\begin{{center}}")?;
    writeln!(out, "      \\caption{{{}}}", group.name)?;
    writeln!(out, "      \\label{{{}}}", group.label)?;
    if summaries {
        writeln!(out, "      \\begin{{tabular}}{{|r|l|l|}}")?;
        writeln!(out, "      \\hline")?;
        writeln!(out, "      Address & Name & Description \\\\")?;
    } else {
        writeln!(out, "      \\begin{{tabular}}{{|r|l|}}")?;
        writeln!(out, "      \\hline")?;
        writeln!(out, "      Address & Name \\\\")?;
    }
    writeln!(out, "      \\hline")?;
    for register in sorted_by_address(&group.registers) {
        let address = address_text(register);
        let name = if register.define {
            format!("\\hyperref[{}]{{{}}}", register.label(), register.name)
        } else {
            register.name.clone()
        };
        if summaries {
            let summary = register.summary.as_deref().unwrap_or_default();
            writeln!(out, "{address} & {name} & {summary} \\\\")?;
        } else {
            writeln!(out, "{address} & {name} \\\\")?;
        }
    }
    writeln!(out, "         \\hline")?;
    writeln!(out, "      \\end{{tabular}}")?;
    writeln!(out, "   \\end{{center}}")?;
    writeln!(out, "\\end{{table}}")?;
    Ok(())
}

//=============================================================================
// Detail blocks
//=============================================================================

fn section_command(depth: u32) -> &'static str {
    match depth {
        0 | 1 => "section",
        2 => "subsection",
        3 => "subsubsection",
        _ => "paragraph",
    }
}

pub fn write_details(group: &Group, style: DocStyle, out: &mut dyn Write) -> Result<()> {
    if style == DocStyle::RegisterPackage {
        writeln!(out, "%\\usepackage{{register}}")?;
    }
    for register in &group.registers {
        if register.fields().is_empty() && register.description.is_empty() {
            log::debug!("{}: no fields or description, no detail block", register.name);
            continue;
        }
        match style {
            DocStyle::Custom => write_custom(group, register, out)?,
            DocStyle::RegisterPackage => write_register_package(group, register, out)?,
        }
    }
    Ok(())
}

fn write_custom(group: &Group, register: &Register, out: &mut dyn Write) -> Result<()> {
    let heading = match (&register.short, &register.address) {
        (Some(short), Some(address)) => {
            format!("{} ({{\\tt {short}}}, at {address})", register.name)
        }
        (Some(short), None) => format!("{} ({{\\tt {short}}})", register.name),
        (None, Some(address)) => format!("{} (at {address})", register.name),
        (None, None) => register.name.clone(),
    };
    writeln!(out, "\\{}{{{heading}}}", section_command(group.depth))?;
    if register.define {
        writeln!(out, "\\label{{{}}}", register.label())?;
    }
    writeln!(out, "{}", register.description)?;

    if !register.fields().is_empty() {
        writeln!(out, "\\begin{{center}}")?;
        for fields in split_fields(register.fields()) {
            write_bit_diagram(fields, out)?;
        }
        writeln!(out, "\\end{{center}}")?;
    }
    write_field_table(group, register, out)?;
    writeln!(out)?;
    Ok(())
}

fn column_width(field: &Field) -> f64 {
    let bits = field
        .length()
        .as_int()
        .map_or(SYMBOLIC_FIELD_WIDTH, |l| l as f64);
    let labels = (field.low.to_string().len() + field.high.to_string().len()) as f64 * 1.2;
    bits.max(field.name.len() as f64).max(labels)
}

/// Pack fields left to right into tables no wider than the layout width,
/// splitting only between fields.
pub fn split_fields(fields: &[Field]) -> Vec<&[Field]> {
    let mut tables = Vec::new();
    let mut start = 0;
    let mut width = 0.0;
    for (i, field) in fields.iter().enumerate() {
        let w = 3.0 + column_width(field);
        if i > start && width + w > LAYOUT_WIDTH {
            tables.push(&fields[start..i]);
            start = i;
            width = 0.0;
        }
        width += w;
    }
    if start < fields.len() {
        tables.push(&fields[start..]);
    }
    tables
}

fn write_bit_diagram(fields: &[Field], out: &mut dyn Write) -> Result<()> {
    let mut columns = String::new();
    for field in fields {
        let width = column_width(field);
        let high = field.high.to_string().len() as f64;
        let low = field.low.to_string().len() as f64;
        columns += &format!("p{{{:.1} ex}}", width * high / (low + high));
        columns += &format!("p{{{:.1} ex}}", width * low / (low + high));
    }
    writeln!(out, "\\begin{{tabular}}{{{columns}}}")?;

    // Bit positions
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            writeln!(out, "&")?;
        }
        if field.high == field.low {
            writeln!(out, "\\multicolumn{{2}}{{c}}{{\\scriptsize {}}}", field.high)?;
        } else {
            writeln!(out, "{{\\scriptsize {}}} &", field.high)?;
            writeln!(out, "\\multicolumn{{1}}{{r}}{{\\scriptsize {}}}", field.low)?;
        }
    }
    writeln!(out, "\\\\")?;
    writeln!(out, "         \\hline")?;

    // Field names
    for (i, field) in fields.iter().enumerate() {
        let cols = if i == 0 {
            "|c|"
        } else {
            writeln!(out, "&")?;
            "c|"
        };
        writeln!(out, "\\multicolumn{{2}}{{{cols}}}{{$|{}|$}}", field.name)?;
    }
    writeln!(out, "\\\\")?;
    writeln!(out, "         \\hline")?;

    // Lengths
    let lengths: Vec<String> = fields
        .iter()
        .map(|f| format!("\\multicolumn{{2}}{{c}}{{\\scriptsize {}}}", f.length()))
        .collect();
    writeln!(out, "{}", lengths.join(" & "))?;
    writeln!(out, "\\\\")?;
    writeln!(out, "   \\end{{tabular}}")?;
    Ok(())
}

fn value_text(value: &Value) -> String {
    match &value.code {
        Some(code) => format!("{code} ({}): {}", value.name, value.description),
        None => format!("{}: {}", value.name, value.description),
    }
}

fn field_description(field: &Field) -> String {
    let mut text = field.description.clone();
    for value in field.values() {
        if !text.is_empty() {
            text += "\n\n";
        }
        text += &value_text(value);
    }
    text
}

fn write_field_table(group: &Group, register: &Register, out: &mut dyn Write) -> Result<()> {
    let fields = register.fields();
    let read_only = !fields.is_empty() && fields.iter().all(Field::is_read_only);
    if read_only {
        writeln!(out, "This entire register is read-only.")?;
    }

    let mut columns = vec![("l", "Field"), ("p{0.5\\textwidth}", "Description")];
    let show_access = !group.skip_access && !read_only;
    if show_access {
        columns.push(("c", "Access"));
    }
    if !group.skip_reset {
        columns.push(("l", "Reset"));
    }

    let described: Vec<&Field> = fields
        .iter()
        .filter(|f| !f.description.is_empty() || !f.values().is_empty())
        .collect();
    if described.is_empty() {
        return Ok(());
    }

    let specs: Vec<&str> = columns.iter().map(|c| c.0).collect();
    let headings: Vec<&str> = columns.iter().map(|c| c.1).collect();
    writeln!(out, "\\tabletail{{\\hline \\multicolumn{{{}}}{{|r|}}", columns.len())?;
    writeln!(out, "   {{{{Continued on next page}}}} \\\\ \\hline}}")?;
    writeln!(out, "\\begin{{center}}")?;
    writeln!(out, "   \\begin{{xtabular}}{{|{}|}}", specs.join("|"))?;
    writeln!(out, "   \\hline")?;
    writeln!(out, "   {}\\\\", headings.join(" & "))?;
    writeln!(out, "   \\hline")?;
    for field in described {
        let mut cells = vec![field_description(field)];
        if show_access {
            cells.push(field.access.clone());
        }
        if !group.skip_reset {
            cells.push(field.reset.clone());
        }
        writeln!(out, "   |{}| & {}\\\\", field.name, cells.join(" & "))?;
        writeln!(out, "   \\hline")?;
    }
    writeln!(out, "   \\end{{xtabular}}")?;
    writeln!(out, "\\end{{center}}")?;
    Ok(())
}

fn write_register_package(group: &Group, register: &Register, out: &mut dyn Write) -> Result<()> {
    let section = section_command(group.depth);
    match &register.short {
        Some(short) => writeln!(out, "\\{section}{{{} ({short})}}", register.name)?,
        None => writeln!(out, "\\{section}{{{}}}", register.name)?,
    }
    writeln!(out, "{}", register.description)?;
    if register.fields().is_empty() {
        return Ok(());
    }

    let address = address_text(register);
    writeln!(out, "\\begin{{register}}{{H}}{{{}}}{{{address}}}", register.name)?;
    writeln!(out, "   \\label{{reg:{}}}{{}}", register.label())?;
    for field in register.fields() {
        let length = field.length().as_int().unwrap_or(SYMBOLIC_REGFIELD_BITS);
        writeln!(
            out,
            "   \\regfield{{{}}}{{{length}}}{{{}}}{{{{{}}}}}",
            field.name, field.low, field.reset
        )?;
    }
    writeln!(out, "   \\begin{{regdesc}}")?;
    writeln!(out, "      \\begin{{reglist}}")?;
    for field in register.fields() {
        if !field.description.is_empty() {
            writeln!(
                out,
                "      \\item[{}] ({}) {}",
                field.name, field.access, field.description
            )?;
        }
    }
    writeln!(out, "      \\end{{reglist}}")?;
    writeln!(out, "   \\end{{regdesc}}")?;
    writeln!(out, "\\end{{register}}")?;
    writeln!(out)?;
    Ok(())
}

//=============================================================================
// Definitions
//=============================================================================

fn macro_identifier(text: &str) -> String {
    let parts: Vec<&str> = text.split_whitespace().collect();
    latex_identifier_parts(&parts)
}

/// Write `\defregname` for every emitted register and `\deffieldname` for
/// every described, emitted field. A field macro shared by several
/// registers is written once.
pub fn write_definitions(group: &Group, out: &mut dyn Write) -> Result<()> {
    let mut seen = BTreeSet::new();
    for register in &group.registers {
        if register.define {
            let shown = register.identifier();
            writeln!(
                out,
                "\\defregname{{\\R{}}}{{\\hyperref[{}]{{{shown}}}}}",
                macro_identifier(&shown),
                register.label()
            )?;
        }
        for field in register.fields() {
            if field.description.is_empty() || !field.define {
                continue;
            }
            let ident = macro_identifier(&field.name);
            if seen.insert(ident.clone()) {
                writeln!(out, "\\deffieldname{{\\F{ident}}}{{{}}}", field.name)?;
            }
        }
    }
    Ok(())
}
