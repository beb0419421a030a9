// Licensed under the Apache-2.0 license

//! Context-resolved field getters for registers whose bit positions depend
//! on runtime parameters.
//!
//! Every emitted register gets a stable ordinal and a chain of getters, one
//! per emitted field, lowest field first. A getter takes a context holding
//! the bound parameter values, asserts that every parameter its field needs
//! is bound, and returns the resolved field together with the next getter:
//!
//! ```text
//! get_reg_info(REG_DATA_ORDINAL)
//!   └── get_data_lo(ctx) → { "lo", 0, 7 }  ──► get_data_hi
//!       get_data_hi(ctx) → { "hi", 8, XLEN - 1 } ──► NULL
//! ```
//!
//! [`RegisterGetters::resolve`] walks the same chain in Rust.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

use super::ValidatedGroup;
use crate::error::{Error, Result};
use crate::expr::{Expr, Renderer};
use crate::types::Field;

/// Fields wider than this get no value-name table.
const MAX_TABLE_BITS: i128 = 8;

/// Names of the generated C types and functions.
///
/// # Example
///
/// ```
/// use regspec_generator::output::GetterConfig;
///
/// let config = GetterConfig::new("dm");
/// assert_eq!(config.header_guard, "DM_GETTERS_H");
/// assert_eq!(config.header_name, "dm_getters.h");
/// ```
#[derive(Clone, Debug)]
pub struct GetterConfig {
    /// Prefix of every generated type and of `get_<prefix>_info`.
    pub prefix: String,
    pub header_guard: String,
    /// Header included by the implementation file.
    pub header_name: String,
}

impl Default for GetterConfig {
    fn default() -> Self {
        Self::new("reg")
    }
}

impl GetterConfig {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            header_guard: format!("{}_GETTERS_H", prefix.to_uppercase()),
            header_name: format!("{prefix}_getters.h"),
        }
    }

    pub fn with_header_guard(mut self, guard: &str) -> Self {
        self.header_guard = guard.to_string();
        self
    }

    pub fn with_header_name(mut self, name: &str) -> Self {
        self.header_name = name.to_string();
        self
    }
}

/// Symbol values supplied by the caller of a getter chain.
#[derive(Clone, Debug, Default)]
pub struct Context {
    values: BTreeMap<String, i64>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(mut self, symbol: &str, value: i64) -> Self {
        self.values.insert(symbol.to_string(), value);
        self
    }

    pub fn is_set(&self, symbol: &str) -> bool {
        self.values.contains_key(symbol)
    }
}

/// One link of a getter chain.
#[derive(Clone, Debug)]
pub struct FieldGetter {
    pub name: String,
    /// C function name.
    pub function: String,
    pub low: Expr,
    pub high: Expr,
    /// Value name per code, for narrow fields with named values.
    pub values: Option<Vec<Option<String>>>,
    /// C table name, meaningful when `values` is set.
    pub values_table: String,
    /// Symbols that must be bound before the field can be resolved.
    pub required: BTreeSet<String>,
}

impl FieldGetter {
    fn new(field: &Field, stem: &str) -> Self {
        let ident = format!("{stem}_{}", crate::util::c_identifier(&field.name).to_lowercase());
        let mut required = field.low.symbols();
        required.extend(field.high.symbols());
        Self {
            name: field.name.clone(),
            function: format!("get_{ident}"),
            low: field.low.clone(),
            high: field.high.clone(),
            values: value_table(field),
            values_table: format!("{ident}_values"),
            required,
        }
    }
}

/// Code-indexed value names, if the field is at most eight bits wide and
/// has at least one value with a code.
fn value_table(field: &Field) -> Option<Vec<Option<String>>> {
    let bits = field.length().as_int()?;
    if !(1..=MAX_TABLE_BITS).contains(&bits) {
        return None;
    }
    let mut table: Vec<Option<String>> = vec![None; 1 << bits];
    for value in field.values() {
        let Some(code) = value.code else {
            continue;
        };
        let (lo, hi) = code.bounds();
        let end = usize::try_from(hi).map_or(usize::MAX, |h| h.saturating_add(1));
        for slot in table.iter_mut().take(end).skip(lo as usize) {
            slot.get_or_insert_with(|| value.name.clone());
        }
    }
    table.iter().any(Option::is_some).then_some(table)
}

/// A field resolved against a [`Context`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolvedField {
    pub name: String,
    pub lsb: i64,
    pub msb: i64,
    pub values: Option<Vec<Option<String>>>,
}

/// The ordinal and getter chain of one register.
#[derive(Clone, Debug)]
pub struct RegisterGetters {
    /// Enumerant naming this register, e.g. `REG_DM_DATA_ORDINAL`.
    pub ordinal: String,
    /// Short name, or the full name.
    pub name: String,
    /// Lowest field first.
    pub chain: Vec<FieldGetter>,
}

impl RegisterGetters {
    /// Walk the chain, resolving each field's bit positions in `context`.
    ///
    /// Fails with [`Error::UnresolvedSymbol`] at the first field that needs a
    /// symbol the context does not bind.
    pub fn resolve(&self, context: &Context) -> Result<Vec<ResolvedField>> {
        let mut fields = Vec::with_capacity(self.chain.len());
        for getter in &self.chain {
            if let Some(symbol) = getter.required.iter().find(|s| !context.is_set(s)) {
                return Err(Error::UnresolvedSymbol {
                    register: self.name.clone(),
                    field: getter.name.clone(),
                    symbol: symbol.clone(),
                });
            }
            fields.push(ResolvedField {
                name: getter.name.clone(),
                lsb: position(&getter.low, context)?,
                msb: position(&getter.high, context)?,
                values: getter.values.clone(),
            });
        }
        Ok(fields)
    }
}

fn position(bit: &Expr, context: &Context) -> Result<i64> {
    let value = bit.substitute(&context.values).to_numeric()?;
    i64::try_from(value).map_err(|_| Error::NotNumeric(bit.to_string()))
}

/// Getter chains for every emitted register of a set of groups, in group
/// and file order.
#[derive(Clone, Debug)]
pub struct GetterTable {
    config: GetterConfig,
    registers: Vec<RegisterGetters>,
    symbols: BTreeSet<String>,
}

impl GetterTable {
    /// Build the chains. Fails if two registers or fields fold to the same
    /// C name.
    pub fn new(groups: &[ValidatedGroup], config: GetterConfig) -> Result<Self> {
        let upper = config.prefix.to_uppercase();
        let mut seen = BTreeSet::from([
            format!("{upper}_ORDINAL_COUNT"),
            format!("get_{}_info", config.prefix),
        ]);
        let mut claim = |name: &str| {
            if seen.insert(name.to_string()) {
                Ok(())
            } else {
                Err(Error::SpecStructure(format!(
                    "generated getter name {name} is not unique"
                )))
            }
        };

        let mut registers = Vec::new();
        let mut symbols = BTreeSet::new();
        for group in groups {
            for register in group.registers.iter().filter(|r| r.define) {
                let stem = group.constant_stem(register);
                let ordinal = format!("{upper}_{stem}_ORDINAL");
                claim(&ordinal)?;
                let stem = stem.to_lowercase();
                let mut chain = Vec::new();
                for field in register.fields().iter().rev().filter(|f| f.define) {
                    let getter = FieldGetter::new(field, &stem);
                    claim(&getter.function)?;
                    claim(&getter.values_table)?;
                    symbols.extend(getter.required.iter().cloned());
                    chain.push(getter);
                }
                log::debug!("{ordinal}: {} getters", chain.len());
                registers.push(RegisterGetters {
                    ordinal,
                    name: register.short.clone().unwrap_or_else(|| register.name.clone()),
                    chain,
                });
            }
        }
        Ok(Self {
            config,
            registers,
            symbols,
        })
    }

    pub fn registers(&self) -> &[RegisterGetters] {
        &self.registers
    }

    /// Symbols referenced by any field, sorted.
    pub fn symbols(&self) -> &BTreeSet<String> {
        &self.symbols
    }

    /// The register with enumerant value `ordinal`.
    pub fn lookup(&self, ordinal: usize) -> Option<&RegisterGetters> {
        self.registers.get(ordinal)
    }

    pub fn write_header(&self, out: &mut dyn Write) -> Result<()> {
        let p = &self.config.prefix;
        let guard = &self.config.header_guard;
        writeln!(out, "#ifndef {guard}")?;
        writeln!(out, "#define {guard}")?;
        writeln!(out)?;

        writeln!(out, "typedef enum {{")?;
        for (i, register) in self.registers.iter().enumerate() {
            writeln!(out, "    {} = {i},", register.ordinal)?;
        }
        writeln!(out, "    {}_ORDINAL_COUNT", p.to_uppercase())?;
        writeln!(out, "}} {p}_ordinal_t;")?;
        writeln!(out)?;

        writeln!(out, "typedef struct {{")?;
        writeln!(out, "    unsigned int value;")?;
        writeln!(out, "    int is_set;")?;
        writeln!(out, "}} {p}_context_value_t;")?;
        writeln!(out)?;
        writeln!(out, "typedef struct {{")?;
        if self.symbols.is_empty() {
            writeln!(out, "    char reserved;")?;
        }
        for symbol in &self.symbols {
            writeln!(out, "    {p}_context_value_t {symbol};")?;
        }
        writeln!(out, "}} {p}_context_t;")?;
        writeln!(out)?;

        writeln!(out, "typedef struct {{")?;
        writeln!(out, "    const char *name;")?;
        writeln!(out, "    unsigned int lsb;")?;
        writeln!(out, "    unsigned int msb;")?;
        writeln!(out, "    const char **values;")?;
        writeln!(out, "}} {p}_field_info_t;")?;
        writeln!(out)?;
        writeln!(out, "struct {p}_field_list;")?;
        writeln!(
            out,
            "typedef struct {p}_field_list (*{p}_field_getter_t)({p}_context_t context);"
        )?;
        writeln!(out)?;
        writeln!(out, "typedef struct {p}_field_list {{")?;
        writeln!(out, "    {p}_field_info_t field;")?;
        writeln!(out, "    {p}_field_getter_t get_next;")?;
        writeln!(out, "}} {p}_field_list_t;")?;
        writeln!(out)?;
        writeln!(out, "typedef struct {{")?;
        writeln!(out, "    const char *name;")?;
        writeln!(out, "    {p}_field_getter_t get_fields_head;")?;
        writeln!(out, "}} {p}_info_t;")?;
        writeln!(out)?;
        writeln!(out, "const {p}_info_t *get_{p}_info({p}_ordinal_t ordinal);")?;
        writeln!(out)?;
        writeln!(out, "#endif /* {guard} */")?;
        Ok(())
    }

    pub fn write_impl(&self, out: &mut dyn Write) -> Result<()> {
        let p = &self.config.prefix;
        let renderer = Renderer::c(false).with_symbols(|s| format!("context.{s}.value"));
        writeln!(out, "#include <assert.h>")?;
        writeln!(out, "#include <stddef.h>")?;
        writeln!(out, "#include \"{}\"", self.config.header_name)?;

        for register in &self.registers {
            writeln!(out)?;
            for getter in &register.chain {
                if let Some(values) = &getter.values {
                    writeln!(out, "static const char *{}[] = {{", getter.values_table)?;
                    for value in values {
                        match value {
                            Some(name) => writeln!(out, "    \"{name}\",")?,
                            None => writeln!(out, "    NULL,")?,
                        }
                    }
                    writeln!(out, "}};")?;
                }
            }

            // Each getter refers to the next one, so define them last first.
            for (i, getter) in register.chain.iter().enumerate().rev() {
                let next = register
                    .chain
                    .get(i + 1)
                    .map_or("NULL", |g| g.function.as_str());
                let values = match getter.values {
                    Some(_) => getter.values_table.as_str(),
                    None => "NULL",
                };
                writeln!(
                    out,
                    "static {p}_field_list_t {}({p}_context_t context)",
                    getter.function
                )?;
                writeln!(out, "{{")?;
                writeln!(out, "    (void)context;")?;
                for symbol in &getter.required {
                    writeln!(out, "    assert(context.{symbol}.is_set);")?;
                }
                writeln!(out, "    {p}_field_list_t result = {{")?;
                writeln!(out, "        .field = {{")?;
                writeln!(out, "            .name = \"{}\",", getter.name)?;
                writeln!(out, "            .lsb = {},", renderer.render(&getter.low)?)?;
                writeln!(out, "            .msb = {},", renderer.render(&getter.high)?)?;
                writeln!(out, "            .values = {values},")?;
                writeln!(out, "        }},")?;
                writeln!(out, "        .get_next = {next},")?;
                writeln!(out, "    }};")?;
                writeln!(out, "    return result;")?;
                writeln!(out, "}}")?;
            }
        }

        writeln!(out)?;
        if self.registers.is_empty() {
            writeln!(out, "const {p}_info_t *get_{p}_info({p}_ordinal_t ordinal)")?;
            writeln!(out, "{{")?;
            writeln!(out, "    (void)ordinal;")?;
            writeln!(out, "    return NULL;")?;
            writeln!(out, "}}")?;
            return Ok(());
        }
        writeln!(out, "static const {p}_info_t {p}_info[] = {{")?;
        for register in &self.registers {
            let head = register
                .chain
                .first()
                .map_or("NULL", |g| g.function.as_str());
            writeln!(
                out,
                "    [{}] = {{ .name = \"{}\", .get_fields_head = {head} }},",
                register.ordinal, register.name
            )?;
        }
        writeln!(out, "}};")?;
        writeln!(out)?;
        writeln!(out, "const {p}_info_t *get_{p}_info({p}_ordinal_t ordinal)")?;
        writeln!(out, "{{")?;
        writeln!(
            out,
            "    if ((unsigned int)ordinal >= (unsigned int){}_ORDINAL_COUNT) {{",
            p.to_uppercase()
        )?;
        writeln!(out, "        return NULL;")?;
        writeln!(out, "    }}")?;
        writeln!(out, "    return &{p}_info[ordinal];")?;
        writeln!(out, "}}")?;
        Ok(())
    }
}
