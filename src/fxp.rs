//! Fixed-point numeric engine.
//!
//! An FXP value is an integer word of `word_length` bits scaled by
//! `delta = 2^(integer_word_length - word_length)`. The integer word length
//! may be negative (all bits fractional) or exceed the word length (all bits
//! integer, conceptually zero-padded), so delta can be astronomically large
//! or small; all scaling runs over exact [BigRational] arithmetic because
//! native floats silently corrupt extreme geometries.

use num_bigint::{BigInt, BigUint};
use num_rational::BigRational;
use num_traits::{One, Zero};

use crate::{
    bits,
    errors::{TypeError, Warning, Warnings},
};

/// Fixed-point geometry with derived range information.
///
/// `delta`, `minimum`, and `maximum` are always recomputed from the
/// geometry. Bitfiles also persist them, but those values are known to be
/// wrong, so they are never trusted.
#[derive(Debug, Clone, PartialEq)]
pub struct Fxp {
    word_length: u32,
    integer_word_length: i32,
    signed: bool,
    overflow_enabled: bool,
    delta: BigRational,
    minimum: BigRational,
    maximum: BigRational,
}

impl Fxp {
    pub fn new(
        word_length: u32,
        integer_word_length: i32,
        signed: bool,
        overflow_enabled: bool,
    ) -> Result<Self, TypeError> {
        if !(1..=64).contains(&word_length) {
            return Err(TypeError::MalformedSchema(format!(
                "FXP word length {word_length} is outside 1..=64"
            )));
        }
        let delta = calculate_delta(word_length, integer_word_length);
        let magnitude_bits = if signed { word_length - 1 } else { word_length };
        let minimum = if signed {
            -(BigRational::from_integer(BigInt::one() << magnitude_bits) * &delta)
        } else {
            BigRational::zero()
        };
        let maximum =
            BigRational::from_integer((BigInt::one() << magnitude_bits) - 1) * &delta;
        Ok(Fxp {
            word_length,
            integer_word_length,
            signed,
            overflow_enabled,
            delta,
            minimum,
            maximum,
        })
    }

    pub fn word_length(&self) -> u32 {
        self.word_length
    }

    pub fn integer_word_length(&self) -> i32 {
        self.integer_word_length
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }

    pub fn overflow_enabled(&self) -> bool {
        self.overflow_enabled
    }

    /// Quantization step: the smallest representable increment.
    pub fn delta(&self) -> &BigRational {
        &self.delta
    }

    pub fn minimum(&self) -> &BigRational {
        &self.minimum
    }

    pub fn maximum(&self) -> &BigRational {
        &self.maximum
    }

    /// Transmitted width: the word plus the overflow bit when enabled. The
    /// overflow bit sits directly above the word as the most significant
    /// bit of the field.
    pub fn size_in_bits(&self) -> usize {
        self.word_length as usize + usize::from(self.overflow_enabled)
    }

    /// Decodes a raw field into `(overflow, value)`. The overflow flag is
    /// `None` unless overflow status is enabled for this geometry.
    pub fn decode(&self, raw: &BigUint) -> (Option<bool>, BigRational) {
        let raw = raw & bits::mask(self.size_in_bits());
        let overflow = self
            .overflow_enabled
            .then(|| raw.bit(self.word_length as u64));
        let word = &raw & bits::mask(self.word_length as usize);
        let unscaled = if self.signed {
            bits::twos_complement_decode(&word, self.word_length as usize)
        } else {
            BigInt::from(word)
        };
        (overflow, BigRational::from_integer(unscaled) * &self.delta)
    }

    /// Encodes `value` into a raw field of [Fxp::size_in_bits] bits.
    ///
    /// Values outside `[minimum, maximum]` are clamped, and values that are
    /// not an exact multiple of delta are truncated toward zero; both cases
    /// push a [Warning::Coerced] and still produce the nearest
    /// representation. When overflow status is enabled but no flag is
    /// supplied, false is assumed with a [Warning::OverflowDefaulted].
    pub fn encode(
        &self,
        value: &BigRational,
        overflow: Option<bool>,
        name: &str,
        warnings: &mut Warnings,
    ) -> BigUint {
        let overflow = match (self.overflow_enabled, overflow) {
            (true, Some(flag)) => flag,
            (true, None) => {
                warnings.push(Warning::OverflowDefaulted { name: name.to_string() });
                false
            }
            (false, _) => false,
        };

        let clamped = if value < &self.minimum {
            warnings.push(Warning::Coerced { name: name.to_string() });
            self.minimum.clone()
        } else if value > &self.maximum {
            warnings.push(Warning::Coerced { name: name.to_string() });
            self.maximum.clone()
        } else {
            value.clone()
        };

        let quotient = &clamped / &self.delta;
        let raw = quotient.trunc();
        if raw != quotient {
            warnings.push(Warning::Coerced { name: name.to_string() });
        }

        let mut encoded =
            bits::twos_complement_encode(&raw.to_integer(), self.word_length as usize);
        if overflow {
            encoded |= BigUint::one() << self.word_length;
        }
        encoded
    }
}

fn calculate_delta(word_length: u32, integer_word_length: i32) -> BigRational {
    let exponent = i64::from(integer_word_length) - i64::from(word_length);
    if exponent >= 0 {
        BigRational::from_integer(BigInt::one() << exponent as usize)
    } else {
        BigRational::new(BigInt::one(), BigInt::one() << (-exponent) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rational(numerator: i64, denominator: i64) -> BigRational {
        BigRational::new(BigInt::from(numerator), BigInt::from(denominator))
    }

    #[test]
    fn test_derived_range_signed() {
        // WL=4, IWL=2: delta 0.25, range [-2, 1.75].
        let fxp = Fxp::new(4, 2, true, false).unwrap();
        assert_eq!(fxp.delta(), &rational(1, 4));
        assert_eq!(fxp.minimum(), &rational(-2, 1));
        assert_eq!(fxp.maximum(), &rational(7, 4));
        assert_eq!(fxp.size_in_bits(), 4);
    }

    #[test]
    fn test_derived_range_unsigned() {
        // WL=32, IWL=16: delta 2^-16, range [0, 65536 - 2^-16].
        let fxp = Fxp::new(32, 16, false, false).unwrap();
        assert_eq!(fxp.delta(), &rational(1, 65536));
        assert_eq!(fxp.minimum(), &BigRational::zero());
        assert_eq!(fxp.maximum(), &rational((1i64 << 32) - 1, 65536));
    }

    #[test]
    fn test_negative_integer_word_length() {
        // The whole field is fractional: IWL=-2 shifts the range below 2^-2.
        let fxp = Fxp::new(3, -2, false, false).unwrap();
        assert_eq!(fxp.delta(), &rational(1, 32));
        assert_eq!(fxp.maximum(), &rational(7, 32));
    }

    #[test]
    fn test_integer_word_length_beyond_word() {
        // All-integer field, conceptually zero-padded: delta is 2^(IWL-WL).
        let fxp = Fxp::new(4, 10, false, false).unwrap();
        assert_eq!(fxp.delta(), &rational(64, 1));
        assert_eq!(fxp.maximum(), &rational(15 * 64, 1));
    }

    #[test]
    fn test_extreme_geometry_is_exact() {
        // IWL far beyond WL: delta has hundreds of bits and must stay exact.
        let fxp = Fxp::new(8, 500, false, false).unwrap();
        let expected = BigRational::from_integer(BigInt::one() << 492);
        assert_eq!(fxp.delta(), &expected);
        let (_, value) = fxp.decode(&BigUint::from(3u32));
        assert_eq!(value, expected * BigRational::from_integer(BigInt::from(3)));
    }

    #[test]
    fn test_word_length_out_of_range() {
        assert!(matches!(
            Fxp::new(65, 0, false, false),
            Err(TypeError::MalformedSchema(_))
        ));
        assert!(matches!(
            Fxp::new(0, 0, false, false),
            Err(TypeError::MalformedSchema(_))
        ));
    }

    #[test]
    fn test_decode_twos_complement_with_overflow_bit() {
        // WL=15, IWL=15, signed, overflow: the MSB of the 16-bit field is
        // the overflow status, the rest is a two's-complement word.
        let fxp = Fxp::new(15, 15, true, true).unwrap();
        let raw = BigUint::from(0b1110_0100_1001_0110u32);
        let (overflow, value) = fxp.decode(&raw);
        assert_eq!(overflow, Some(true));
        assert_eq!(value, rational(-7018, 1));
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let fxp = Fxp::new(16, 8, true, false).unwrap();
        for value in [rational(-128, 1), rational(-1, 1), rational(0, 1), rational(511, 256)] {
            let mut warnings = Warnings::new();
            let raw = fxp.encode(&value, None, "fxp", &mut warnings);
            assert!(warnings.is_empty());
            assert_eq!(fxp.decode(&raw), (None, value));
        }
    }

    #[test]
    fn test_encode_clamps_above_maximum() {
        // WL=1, IWL=1, signed: minimum -1, maximum 0, delta 1.
        let fxp = Fxp::new(1, 1, true, false).unwrap();
        assert_eq!(fxp.minimum(), &rational(-1, 1));
        assert_eq!(fxp.maximum(), &BigRational::zero());

        let mut warnings = Warnings::new();
        let raw = fxp.encode(&rational(5, 1), None, "fxp", &mut warnings);
        assert_eq!(raw, BigUint::zero());
        assert_eq!(warnings.into_vec(), vec![Warning::Coerced { name: "fxp".into() }]);
    }

    #[test]
    fn test_encode_clamps_below_minimum() {
        let fxp = Fxp::new(1, 1, false, false).unwrap();
        let mut warnings = Warnings::new();
        let raw = fxp.encode(&rational(-42, 1), None, "fxp", &mut warnings);
        assert_eq!(raw, BigUint::zero());
        assert_eq!(warnings.len(), 1);

        let mut warnings = Warnings::new();
        let raw = fxp.encode(&BigRational::one(), None, "fxp", &mut warnings);
        assert_eq!(raw, BigUint::one());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_encode_quantization_loss_warns() {
        // Delta is 0.25; 0.3 truncates toward zero to raw 1 (0.25).
        let fxp = Fxp::new(4, 2, true, false).unwrap();
        let mut warnings = Warnings::new();
        let raw = fxp.encode(&rational(3, 10), None, "fxp", &mut warnings);
        assert_eq!(raw, BigUint::one());
        assert_eq!(warnings.len(), 1);

        // Negative values also truncate toward zero: -0.3 packs as -0.25.
        let mut warnings = Warnings::new();
        let raw = fxp.encode(&rational(-3, 10), None, "fxp", &mut warnings);
        assert_eq!(fxp.decode(&raw), (None, rational(-1, 4)));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_encode_defaults_missing_overflow() {
        let fxp = Fxp::new(4, 4, true, true).unwrap();
        let mut warnings = Warnings::new();
        let raw = fxp.encode(&rational(3, 1), None, "fxp", &mut warnings);
        assert_eq!(raw, BigUint::from(3u32));
        assert_eq!(
            warnings.into_vec(),
            vec![Warning::OverflowDefaulted { name: "fxp".into() }]
        );
    }

    #[test]
    fn test_encode_sets_overflow_bit() {
        let fxp = Fxp::new(4, 4, true, true).unwrap();
        let mut warnings = Warnings::new();
        let raw = fxp.encode(&rational(-1, 1), Some(true), "fxp", &mut warnings);
        // Two's complement of -1 over 4 bits plus the overflow bit at bit 4.
        assert_eq!(raw, BigUint::from(0b1_1111u32));
        assert!(warnings.is_empty());
    }
}
