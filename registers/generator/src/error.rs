// Licensed under the Apache-2.0 license

//! Error taxonomy for the register generator.
//!
//! Every variant except [`Error::Io`] and [`Error::Toml`] is fatal for the
//! specification being processed: nothing is emitted for an input that
//! produced one of them.

use thiserror::Error;

/// Why a register's fields fail to tile it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LayoutDetail {
    /// `previous_low > high` evaluated to false.
    Overlap(String),
    /// `previous_low - high` resolved to a number other than 1.
    Gap(String),
    /// The lowest field does not provably start at bit 0.
    NotZeroTerminated(String),
}

impl std::fmt::Display for LayoutDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutDetail::Overlap(expr) => write!(f, "overlap: {expr} is false"),
            LayoutDetail::Gap(expr) => write!(f, "gap: {expr} is not 1"),
            LayoutDetail::NotZeroTerminated(low) => {
                write!(f, "not defined down to bit 0 (lowest bit is {low})")
            }
        }
    }
}

/// A register whose fields do not exactly cover `[0, width - 1]`.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("register {register}, field {field}: {detail}")]
pub struct LayoutError {
    pub register: String,
    pub field: String,
    pub detail: LayoutDetail,
}

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed spec structure, e.g. a bit range with three parts.
    #[error("malformed specification: {0}")]
    SpecStructure(String),

    #[error("cannot parse expression {text:?}: {detail}")]
    Expression { text: String, detail: String },

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("field {field}: duplicate value {what} {key}")]
    DuplicateValue {
        field: String,
        what: &'static str,
        key: String,
    },

    #[error("register {register}, field {field}: symbol {symbol} is not bound")]
    UnresolvedSymbol {
        register: String,
        field: String,
        symbol: String,
    },

    #[error("expression {0} is not numeric")]
    NotNumeric(String),

    #[error("cannot render {0}")]
    Unsupported(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
