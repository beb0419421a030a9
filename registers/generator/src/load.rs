// Licensed under the Apache-2.0 license

//! Reading register specifications from TOML.
//!
//! ```toml
//! name = "Debug Module"
//! prefix = "DM_"
//!
//! [[register]]
//! name = "Debug Module Control"
//! short = "dmcontrol"
//! address = 0x10
//!
//! [[register.field]]
//! name = "hasel"
//! bits = "1:0"
//!
//! [[register.field.value]]
//! name = "single"
//! code = 0
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::output::ValidatedGroup;
use crate::types::{Address, Field, Group, Register, Value, ValueCode};
use crate::util::label;

/// A value written either as a TOML integer or as text.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Text(String),
}

impl Scalar {
    fn text(&self) -> String {
        match self {
            Scalar::Int(n) => n.to_string(),
            Scalar::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct GroupSpec {
    name: String,
    label: Option<String>,
    prefix: String,
    description: String,
    skip_index: bool,
    skip_access: bool,
    skip_reset: bool,
    depth: Option<u32>,
    #[serde(rename = "register")]
    registers: Vec<RegisterSpec>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RegisterSpec {
    name: String,
    short: Option<String>,
    description: String,
    address: Option<Scalar>,
    summary: Option<String>,
    define: Option<bool>,
    #[serde(rename = "field")]
    fields: Vec<FieldSpec>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FieldSpec {
    name: String,
    bits: Option<Scalar>,
    reset: Option<Scalar>,
    access: String,
    description: String,
    summary: Option<String>,
    define: Option<bool>,
    #[serde(rename = "value")]
    values: Vec<ValueSpec>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ValueSpec {
    name: String,
    code: Option<Scalar>,
    description: String,
    duplicate: bool,
}

fn required(what: &str, text: &str) -> Result<()> {
    if text.trim().is_empty() {
        Err(Error::SpecStructure(format!("{what} has no name")))
    } else {
        Ok(())
    }
}

impl GroupSpec {
    fn into_group(self) -> Result<Group> {
        let mut group = Group::new(&self.name);
        group.label = self.label.unwrap_or_else(|| label(&self.name));
        group.prefix = self.prefix;
        group.description = self.description;
        group.skip_index = self.skip_index;
        group.skip_access = self.skip_access;
        group.skip_reset = self.skip_reset;
        if let Some(depth) = self.depth {
            group.depth = depth;
        }
        for register in self.registers {
            group.add_register(register.into_register()?);
        }
        Ok(group)
    }
}

impl RegisterSpec {
    fn into_register(self) -> Result<Register> {
        required("register", &self.name)?;
        let mut register = Register::new(&self.name);
        register.short = self.short;
        register.description = self.description;
        register.address = self.address.map(|a| Address::parse(&a.text()));
        register.summary = self.summary;
        register.define = self.define.unwrap_or(true);
        for field in self.fields {
            let field = field
                .into_field()
                .map_err(|e| match e {
                    Error::SpecStructure(msg) => {
                        Error::SpecStructure(format!("register {}: {msg}", self.name))
                    }
                    other => other,
                })?;
            register.add_field(field);
        }
        Ok(register)
    }
}

impl FieldSpec {
    fn into_field(self) -> Result<Field> {
        required("field", &self.name)?;
        let bits = self.bits.ok_or_else(|| {
            Error::SpecStructure(format!("field {} has no bit range", self.name))
        })?;
        let mut field = Field::from_bits(&self.name, &bits.text())?;
        field.reset = self.reset.map(|r| r.text()).unwrap_or_default();
        field.access = self.access;
        field.description = self.description;
        field.summary = self.summary;
        if let Some(define) = self.define {
            field.define = define;
        }
        for value in self.values {
            required("value", &value.name)?;
            let code = match value.code {
                Some(Scalar::Int(n)) => Some(ValueCode::Single(u64::try_from(n).map_err(
                    |_| Error::SpecStructure(format!("value {}: negative code {n}", value.name)),
                )?)),
                Some(Scalar::Text(text)) => Some(ValueCode::parse(&text)?),
                None => None,
            };
            let mut v = Value::new(&value.name, code);
            v.description = value.description;
            v.duplicate = value.duplicate;
            field.add_value(v)?;
        }
        Ok(field)
    }
}

/// Parse and validate one specification.
pub fn load_str(text: &str) -> Result<ValidatedGroup> {
    let spec: GroupSpec = toml::from_str(text)?;
    let group = spec.into_group()?;
    log::debug!(
        "loaded {} with {} registers",
        group.name,
        group.registers.len()
    );
    ValidatedGroup::new(group)
}

pub fn load_file(path: &Path) -> Result<ValidatedGroup> {
    let text = std::fs::read_to_string(path)?;
    load_str(&text)
}
