// Licensed under the Apache-2.0 license

//! Generated artifacts.
//!
//! ## Code Generation Flow
//!
//! ```text
//! Group → validate() → ValidatedGroup → Emitter::emit → io::Write
//!                                       ├── Index / Documentation  (LaTeX)
//!                                       ├── Definitions            (LaTeX macros)
//!                                       ├── Constants              (C #defines)
//!                                       ├── GettersHeader / Impl   (C accessors)
//!                                       └── Bundle                 (Chisel)
//! ```
//!
//! Emitters only read the validated groups and write in a fixed order, so
//! identical input always produces identical output.

pub mod bundle;
pub mod constants;
pub mod doc;
pub mod getters;

use std::io::Write;
use std::ops::Deref;

use crate::error::Result;
use crate::types::Group;
use crate::validate::validate;

pub use bundle::BundleConfig;
pub use constants::{ConstantReport, ConstantTable};
pub use doc::DocStyle;
pub use getters::{GetterConfig, GetterTable};

/// A group whose register layouts have been proven consistent.
#[derive(Clone, Debug)]
pub struct ValidatedGroup(Group);

impl ValidatedGroup {
    pub fn new(group: Group) -> Result<Self> {
        validate(&group)?;
        Ok(Self(group))
    }

    pub fn into_inner(self) -> Group {
        self.0
    }
}

impl Deref for ValidatedGroup {
    type Target = Group;
    fn deref(&self) -> &Group {
        &self.0
    }
}

/// The artifacts the generator can produce. Each variant writes one stream.
#[derive(Clone, Debug)]
pub enum Emitter {
    /// Address-sorted register index table.
    Index,
    /// Per-register detail blocks.
    Documentation(DocStyle),
    /// `\defregname` / `\deffieldname` macros.
    Definitions,
    /// C constants for every group, with ambiguous names suppressed.
    Constants,
    GettersHeader(GetterConfig),
    GettersImpl(GetterConfig),
    /// Chisel bundles.
    Bundle(BundleConfig),
}

impl Emitter {
    /// Write this artifact for `groups` to `out` and flush it.
    ///
    /// Only [`Emitter::Constants`] produces a non-empty report.
    pub fn emit(&self, groups: &[ValidatedGroup], out: &mut dyn Write) -> Result<ConstantReport> {
        let mut report = ConstantReport::default();
        match self {
            Emitter::Index => {
                for group in groups {
                    doc::write_index(group, out)?;
                }
            }
            Emitter::Documentation(style) => {
                for group in groups {
                    doc::write_details(group, *style, out)?;
                }
            }
            Emitter::Definitions => {
                for group in groups {
                    doc::write_definitions(group, out)?;
                }
            }
            Emitter::Constants => {
                let mut table = ConstantTable::new();
                for group in groups {
                    table.add_group(group)?;
                }
                report = table.write(out)?;
            }
            Emitter::GettersHeader(config) => {
                GetterTable::new(groups, config.clone())?.write_header(out)?;
            }
            Emitter::GettersImpl(config) => {
                GetterTable::new(groups, config.clone())?.write_impl(out)?;
            }
            Emitter::Bundle(config) => {
                bundle::write_bundles(groups, config, out)?;
            }
        }
        out.flush()?;
        Ok(report)
    }
}
