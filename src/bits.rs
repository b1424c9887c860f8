//! Low-level bit utilities over arbitrary-width unsigned integers.
//!
//! A bit blob is a [BigUint] whose low `size_in_bits` bits hold a packed
//! value; bit 0 is the least significant bit.

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Zero};

/// Returns a mask with the low `bits` bits set.
pub fn mask(bits: usize) -> BigUint {
    (BigUint::one() << bits) - 1u32
}

/// Returns the low 64 bits of `value`. Callers must have masked `value` to
/// at most 64 bits for the result to be exact.
pub fn low_u64(value: &BigUint) -> u64 {
    value.iter_u64_digits().next().unwrap_or(0)
}

/// Sign-extends the low `bits` of `value` to a full `i64`.
pub fn sign_extend(value: u64, bits: usize) -> i64 {
    let shift = 64 - bits;
    ((value << shift) as i64) >> shift
}

/// Decodes the low `bits` of `raw` as a two's-complement integer.
pub fn twos_complement_decode(raw: &BigUint, bits: usize) -> BigInt {
    let m = mask(bits);
    let word = raw & &m;
    if bits > 0 && word.bit(bits as u64 - 1) {
        -BigInt::from((word ^ m) + 1u32)
    } else {
        BigInt::from(word)
    }
}

/// Encodes `value` as a two's-complement word of `bits` bits. The magnitude
/// is reduced modulo 2^bits.
pub fn twos_complement_encode(value: &BigInt, bits: usize) -> BigUint {
    let magnitude = value.magnitude() & mask(bits);
    if value.sign() == Sign::Minus && !magnitude.is_zero() {
        (BigUint::one() << bits) - magnitude
    } else {
        magnitude
    }
}

/// Serializes a blob of `size_in_bits` bits into `ceil(size_in_bits / 32)`
/// left-justified u32 words: the most significant bits occupy the first
/// word and unused bits are zero-padded at the low end of the final word.
/// This is the layout the FPGA driver expects for fixed-point and composite
/// register transfers.
pub fn to_fpga_words(blob: &BigUint, size_in_bits: usize) -> Vec<u32> {
    let count = size_in_bits.div_ceil(32);
    let shifted = (blob & mask(size_in_bits)) << (count * 32 - size_in_bits);
    (0..count)
        .map(|i| low_u64(&((&shifted >> ((count - 1 - i) * 32)) & mask(32))) as u32)
        .collect()
}

/// Reassembles a blob of `size_in_bits` bits from the word layout produced
/// by [to_fpga_words].
pub fn from_fpga_words(words: &[u32], size_in_bits: usize) -> BigUint {
    let mut value = BigUint::zero();
    for &word in words {
        value = (value << 32) | BigUint::from(word);
    }
    (value >> (words.len() * 32).saturating_sub(size_in_bits)) & mask(size_in_bits)
}
