//! The immutable type tree describing a packed register, FIFO, or cluster
//! member. Built once from a schema, then shared read-only by every pack
//! and unpack call.

use crate::{errors::TypeError, fxp::Fxp};

/// Width of an IEEE-754 floating point field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatWidth {
    /// Single precision (`SGL`), 32 bits.
    Sgl,
    /// Double precision (`DBL`), 64 bits.
    Dbl,
}

impl FloatWidth {
    pub fn bits(self) -> usize {
        match self {
            FloatWidth::Sgl => 32,
            FloatWidth::Dbl => 64,
        }
    }
}

/// A named node of the type tree. Names may be empty, e.g. for anonymous
/// array element types.
#[derive(Debug, Clone, PartialEq)]
pub struct Type {
    pub name: String,
    pub kind: TypeKind,
}

/// The closed set of supported type kinds. There is no extensibility
/// mechanism: anything a schema declares beyond these fails to build.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    /// Single bit, false/true.
    Bool,
    /// Signed or unsigned integer of 1..=64 bits.
    Numeric { signed: bool, bits: u32 },
    /// IEEE-754 float, reinterpreted bit-exactly.
    Float(FloatWidth),
    /// Zero-width placeholder used in descriptive clusters; never occupies
    /// blob space and never reaches hardware.
    String,
    /// Fixed-point number with derived range, see [Fxp].
    Fxp(Fxp),
    /// Ordered aggregate of named members. The first declared member
    /// occupies the most significant bits of the blob.
    Cluster(Vec<Type>),
    /// Fixed-length repetition of one element type; index 0 is most
    /// significant.
    Array { element: Box<Type>, length: usize },
}

impl Type {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Type { name: name.into(), kind }
    }

    /// Builds a cluster, rejecting duplicate names among direct members.
    /// Uniqueness is not transitive: a nested cluster may reuse a name.
    pub fn cluster(name: impl Into<String>, members: Vec<Type>) -> Result<Self, TypeError> {
        let name = name.into();
        for (index, member) in members.iter().enumerate() {
            if members[..index].iter().any(|other| other.name == member.name) {
                return Err(TypeError::DuplicateMemberName {
                    cluster: name,
                    member: member.name.clone(),
                });
            }
        }
        Ok(Type { name, kind: TypeKind::Cluster(members) })
    }

    pub fn array(name: impl Into<String>, element: Type, length: usize) -> Self {
        Type {
            name: name.into(),
            kind: TypeKind::Array { element: Box::new(element), length },
        }
    }

    /// Number of bits this type occupies in a packed blob. Always derived
    /// from the children, never stored.
    pub fn size_in_bits(&self) -> usize {
        self.kind.size_in_bits()
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, TypeKind::Array { .. })
    }

    pub fn is_fxp(&self) -> bool {
        matches!(self.kind, TypeKind::Fxp(_))
    }

    /// Composite types are transferred word-by-word rather than through the
    /// driver's scalar entry points.
    pub fn is_composite(&self) -> bool {
        matches!(self.kind, TypeKind::Cluster(_) | TypeKind::Array { .. })
    }
}

impl TypeKind {
    pub fn size_in_bits(&self) -> usize {
        match self {
            TypeKind::Bool => 1,
            TypeKind::Numeric { bits, .. } => *bits as usize,
            TypeKind::Float(width) => width.bits(),
            TypeKind::String => 0,
            TypeKind::Fxp(fxp) => fxp.size_in_bits(),
            TypeKind::Cluster(members) => members.iter().map(Type::size_in_bits).sum(),
            TypeKind::Array { element, length } => length * element.size_in_bits(),
        }
    }

    /// Short label used in pack-error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypeKind::Bool => "bool",
            TypeKind::Numeric { signed: true, .. } => "signed integer",
            TypeKind::Numeric { signed: false, .. } => "unsigned integer",
            TypeKind::Float(_) => "float",
            TypeKind::String => "string",
            TypeKind::Fxp(_) => "fixed-point",
            TypeKind::Cluster(_) => "cluster",
            TypeKind::Array { .. } => "array",
        }
    }
}
