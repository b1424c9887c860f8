//! Error types for type building, packing, and bitfile parsing, plus the
//! non-fatal warning channel used by the codec.

use std::fmt;

use thiserror::Error;

/// Errors produced while resolving a declarative schema node into a
/// [crate::types::Type]. All of these are fatal: no partial type tree is
/// ever returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// The schema declares a kind this crate has no representation for
    /// (e.g. complex fixed point, or an unrecognized numeric tag).
    #[error("unsupported type: {0}")]
    UnsupportedType(String),
    /// The schema comes from a compiler version this crate does not
    /// support (an FXP declaration without a Signed field).
    #[error("unsupported schema: {0}")]
    UnsupportedSchema(String),
    /// Two direct members of the same cluster share a name.
    #[error("cluster '{cluster}' contains multiple members named '{member}'")]
    DuplicateMemberName { cluster: String, member: String },
    /// A declaration is structurally broken (missing or non-numeric field).
    #[error("malformed schema: {0}")]
    MalformedSchema(String),
}

/// Errors produced when packing a [crate::value::Value] whose shape does not
/// match the type tree. Well-shaped values never fail to pack.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackError {
    /// The value variant does not match the type variant.
    #[error("'{name}' expects a {expected} value, got {got}")]
    Shape {
        name: String,
        expected: &'static str,
        got: &'static str,
    },
    /// A cluster value has no entry for a declared member.
    #[error("cluster '{cluster}' value is missing member '{member}'")]
    MissingMember { cluster: String, member: String },
    /// An array value has the wrong number of elements.
    #[error("array '{name}' expects {expected} elements, got {got}")]
    ArrayLength {
        name: String,
        expected: usize,
        got: usize,
    },
}

/// Errors produced while parsing a `.lvbitx` bitfile.
#[derive(Debug, Error)]
pub enum BitfileError {
    #[error("failed to read bitfile: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse bitfile XML: {0}")]
    Xml(#[from] roxmltree::Error),
    /// Carried for registers and FIFOs whose type cannot be built; the
    /// bitfile parser downgrades this case to a logged skip.
    #[error(transparent)]
    Type(#[from] TypeError),
    #[error("bitfile is missing element '{0}'")]
    MissingElement(&'static str),
    #[error("bitfile element '{element}' has non-numeric text '{text}'")]
    InvalidNumber { element: &'static str, text: String },
    /// Two registers share a name; lookup by name would be ambiguous.
    #[error("bitfile contains multiple registers named '{0}'")]
    DuplicateRegister(String),
}

/// A non-fatal condition raised while packing. The operation still
/// completes; the warning describes how the input was adjusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// The value was clamped to the representable range or rounded to a
    /// multiple of the FXP delta.
    Coerced { name: String },
    /// An overflow-enabled FXP was packed without an overflow flag; false
    /// was assumed.
    OverflowDefaulted { name: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::Coerced { name } => {
                write!(f, "'{name}' could not be represented exactly and was coerced")
            }
            Warning::OverflowDefaulted { name } => {
                write!(f, "'{name}' was packed without an overflow status, assuming false")
            }
        }
    }
}

/// Sink for pack-time warnings. Every pushed warning is also emitted through
/// [log::warn] so callers that ignore the sink still see the condition.
#[derive(Debug, Default)]
pub struct Warnings {
    items: Vec<Warning>,
}

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, warning: Warning) {
        log::warn!("{warning}");
        self.items.push(warning);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Warning> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<Warning> {
        self.items
    }
}
