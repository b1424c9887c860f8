//! Pack and unpack between bit blobs and [Value]s.
//!
//! Bit numbering: bit 0 is the least significant bit of the blob. Cluster
//! members and array elements are positioned by closed-form offsets: a
//! member's offset is the summed width of everything declared after it, so
//! the first declared member lands in the most significant bits.
//!
//! Both directions are pure functions of (type, input) and are safe to call
//! concurrently on a shared type tree.

use indexmap::IndexMap;
use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::{
    bits,
    errors::{PackError, Warnings},
    types::{FloatWidth, Type, TypeKind},
    value::Value,
};

impl Type {
    /// Unpacks a blob whose low [Type::size_in_bits] bits hold a packed
    /// value. Bits above that count are ignored. Unpacking never fails.
    pub fn unpack(&self, blob: &BigUint) -> Value {
        match &self.kind {
            TypeKind::Bool => Value::Bool(blob.bit(0)),
            TypeKind::Numeric { signed, bits: width } => {
                let raw = bits::low_u64(&(blob & bits::mask(*width as usize)));
                if *signed {
                    Value::I64(bits::sign_extend(raw, *width as usize))
                } else {
                    Value::U64(raw)
                }
            }
            TypeKind::Float(width) => {
                let raw = bits::low_u64(&(blob & bits::mask(width.bits())));
                match width {
                    FloatWidth::Sgl => Value::F32(f32::from_bits(raw as u32)),
                    FloatWidth::Dbl => Value::F64(f64::from_bits(raw)),
                }
            }
            TypeKind::String => Value::Str(String::new()),
            TypeKind::Fxp(fxp) => match fxp.decode(blob) {
                (Some(overflow), value) => Value::FxpOverflow(overflow, value),
                (None, value) => Value::Fxp(value),
            },
            TypeKind::Cluster(members) => {
                let mut offset = self.size_in_bits();
                let mut result = IndexMap::with_capacity(members.len());
                for member in members {
                    offset -= member.size_in_bits();
                    let field = (blob >> offset) & bits::mask(member.size_in_bits());
                    result.insert(member.name.clone(), member.unpack(&field));
                }
                Value::Cluster(result)
            }
            TypeKind::Array { element, length } => {
                let element_bits = element.size_in_bits();
                let values = (0..*length)
                    .map(|index| {
                        let offset = (length - 1 - index) * element_bits;
                        element.unpack(&((blob >> offset) & bits::mask(element_bits)))
                    })
                    .collect();
                Value::Array(values)
            }
        }
    }

    /// Packs a value into a blob of [Type::size_in_bits] bits. Fails only
    /// when the value's shape does not match the type; out-of-range and
    /// inexact FXP values are coerced with a warning instead.
    pub fn pack(&self, value: &Value, warnings: &mut Warnings) -> Result<BigUint, PackError> {
        match (&self.kind, value) {
            (TypeKind::Bool, Value::Bool(flag)) => {
                Ok(if *flag { BigUint::one() } else { BigUint::zero() })
            }
            (TypeKind::Numeric { bits: width, .. }, Value::U64(raw)) => {
                Ok(BigUint::from(*raw) & bits::mask(*width as usize))
            }
            (TypeKind::Numeric { bits: width, .. }, Value::I64(raw)) => {
                Ok(BigUint::from(*raw as u64) & bits::mask(*width as usize))
            }
            (TypeKind::Float(FloatWidth::Sgl), Value::F32(raw)) => {
                Ok(BigUint::from(raw.to_bits()))
            }
            (TypeKind::Float(FloatWidth::Dbl), Value::F64(raw)) => {
                Ok(BigUint::from(raw.to_bits()))
            }
            (TypeKind::String, Value::Str(_)) => Ok(BigUint::zero()),
            (TypeKind::Fxp(fxp), Value::Fxp(rational)) => {
                Ok(fxp.encode(rational, None, &self.name, warnings))
            }
            (TypeKind::Fxp(fxp), Value::FxpOverflow(overflow, rational))
                if fxp.overflow_enabled() =>
            {
                Ok(fxp.encode(rational, Some(*overflow), &self.name, warnings))
            }
            (TypeKind::Cluster(members), Value::Cluster(entries)) => {
                let mut blob = BigUint::zero();
                let mut offset = self.size_in_bits();
                for member in members {
                    offset -= member.size_in_bits();
                    let entry = entries.get(&member.name).ok_or_else(|| {
                        PackError::MissingMember {
                            cluster: self.name.clone(),
                            member: member.name.clone(),
                        }
                    })?;
                    blob |= member.pack(entry, warnings)? << offset;
                }
                Ok(blob)
            }
            (TypeKind::Array { element, length }, Value::Array(values)) => {
                if values.len() != *length {
                    return Err(PackError::ArrayLength {
                        name: self.name.clone(),
                        expected: *length,
                        got: values.len(),
                    });
                }
                let element_bits = element.size_in_bits();
                let mut blob = BigUint::zero();
                for (index, entry) in values.iter().enumerate() {
                    let offset = (length - 1 - index) * element_bits;
                    blob |= element.pack(entry, warnings)? << offset;
                }
                Ok(blob)
            }
            _ => Err(PackError::Shape {
                name: self.name.clone(),
                expected: self.kind.kind_name(),
                got: value.kind_name(),
            }),
        }
    }
}
