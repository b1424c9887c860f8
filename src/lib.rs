//! # lvbits
//!
//! A packed-bitfield type system and codec for LabVIEW FPGA bitfiles.
//!
//! A `.lvbitx` file declares the types of the FPGA's host-visible registers
//! and FIFOs: bools, integers, IEEE floats, fixed-point numbers with
//! arbitrary word/radix geometry, and nested clusters and arrays. This
//! crate builds an immutable [types::Type] tree from those declarations and
//! converts bidirectionally between packed bit blobs (arbitrary-width
//! unsigned integers) and structured [value::Value]s, using exact rational
//! arithmetic for the fixed-point scaling.
//!
//! ## Example
//!
//! ```
//! use num_bigint::BigUint;
//!
//! let xml = "<FXP><Name>level</Name><Signed>true</Signed>\
//!            <WordLength>4</WordLength><IntegerWordLength>2</IntegerWordLength></FXP>";
//! let doc = roxmltree::Document::parse(xml).unwrap();
//! let ty = lvbits::parse_type(doc.root_element()).unwrap();
//!
//! // 0b0111 is the largest positive word: 7 * delta, delta = 0.25.
//! let value = ty.unpack(&BigUint::from(0b0111u32));
//! assert_eq!(
//!     value,
//!     lvbits::Value::Fxp(num_rational::BigRational::new(7.into(), 4.into()))
//! );
//! ```

pub mod bitfile;
pub mod bits;
mod codec;
pub mod errors;
pub mod fxp;
pub mod schema;
pub mod types;
pub mod value;

pub use bitfile::{Bitfile, Fifo, Register};
pub use errors::{BitfileError, PackError, TypeError, Warning, Warnings};
pub use fxp::Fxp;
pub use schema::parse_type;
pub use types::{FloatWidth, Type, TypeKind};
pub use value::Value;
