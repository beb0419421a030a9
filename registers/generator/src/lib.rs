// Licensed under the Apache-2.0 license

//! Register specification model, layout validator and code generators.
//!
//! A specification describes a group of registers whose fields may sit at
//! symbolic bit positions (`XLEN-1:8`). The crate proves each register's
//! fields tile it exactly and then generates LaTeX documentation, C
//! constants, C context getters and Chisel bundles from the validated
//! model.
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use regspec_generator::{load_file, Emitter};
//!
//! let group = load_file(Path::new("hw/debug_module.toml")).unwrap();
//! let mut out = std::io::stdout();
//! let report = Emitter::Constants.emit(&[group], &mut out).unwrap();
//! assert!(report.ambiguous.is_empty());
//! ```
//!
//! ## Module Organization
//!
//! - [`expr`]: Symbolic bit-position expressions ([`Expr`], [`compare`])
//! - [`types`]: Groups, registers, fields and values
//! - [`validate`]: Layout checks ([`validate()`], [`check`])
//! - [`load`]: TOML specification reader
//! - [`output`]: The emitters ([`Emitter`])
//! - [`util`]: Identifier folding for generated names

pub mod error;
pub mod expr;
pub mod load;
pub mod output;
pub mod types;
pub mod util;
pub mod validate;


pub use error::{Error, LayoutDetail, LayoutError, Result};
pub use expr::{compare, simplify, Comparison, Expr};
pub use load::{load_file, load_str};
pub use output::{
    BundleConfig, ConstantReport, DocStyle, Emitter, GetterConfig, GetterTable, ValidatedGroup,
};
pub use types::{Address, Field, Group, Register, Value, ValueCode};
pub use validate::{check, validate};
