//! Dispersion multiplier: the strictly-positive bit-pattern comparison at
//! the bottom of the correlation stack.
//!
//! Two words are "multiplied" into a scalar whose magnitude grows with their
//! bitwise similarity and never reaches zero. Dividing such a product by the
//! larger of the two self-products then yields a normalized ratio in
//! `(0, 1]`: for strictly positive per-bit values,
//! `f·g <= max(f·f, g·g)`, so equal words produce exactly `1` without any
//! min/max rescaling.

use crate::types::MultiplyMode;

/// Per-bit prime weights, one per bit lane of a 32-bit word.
///
/// The first 32 primes at or above 1033. The table is part of the wire-level
/// contract: two implementations comparing the same words must agree
/// bit-for-bit on the scores.
pub const PRIMES: [u32; 32] = [
    1033, 1039, 1049, 1051, 1061, 1063, 1069, 1087, 1091, 1093, 1097, 1103, 1109, 1117, 1123,
    1129, 1151, 1153, 1163, 1171, 1181, 1187, 1193, 1201, 1213, 1217, 1223, 1229, 1231, 1237,
    1249, 1259,
];

/// Multiply two words over their low `bit_size` bits.
///
/// Always returns at least `1.0`, so the value is safe as a numerator or
/// denominator of the normalized ratio.
pub fn multiply_bits(mode: MultiplyMode, a: u32, b: u32, bit_size: u32) -> f32 {
    debug_assert!((1..=32).contains(&bit_size));

    let mut acc: u32 = 0;

    match mode {
        MultiplyMode::InvXorPrime => {
            // The xor is counted inverted: zero difference on a bit lane
            // contributes that lane's weight, so the smaller the difference,
            // the larger the product.
            let x = a ^ b;
            for i in 0..bit_size {
                if x & (1 << i) == 0 {
                    acc += PRIMES[i as usize];
                }
            }
        }
        MultiplyMode::DispersedPrime => {
            // A plain xor can give a low-dispersion result; mapping each bit
            // to a prime (set) or a small even value (clear) widens the
            // output spectrum for low-match inputs.
            for i in 0..bit_size {
                let va = if a & (1 << i) != 0 {
                    PRIMES[i as usize]
                } else {
                    (i + 1) * 2
                };
                let vb = if b & (1 << i) != 0 {
                    PRIMES[i as usize]
                } else {
                    (i + 1) * 2
                };
                acc += va * vb;
            }
        }
    }

    if acc == 0 {
        1.0
    } else {
        acc as f32
    }
}

/// Normalized correlation of two words, in `(0, 1]`.
///
/// `max_a` and `max_b` are the self-products `multiply_bits(m, a, a, s)` and
/// `multiply_bits(m, b, b, s)`, precomputed by the caller since one of them
/// is usually reused across many calls. With `linear` the quadratic ratio is
/// taken back to a linear scale by a square root.
pub fn corr_value(
    mode: MultiplyMode,
    a: u32,
    b: u32,
    bit_size: u32,
    max_a: f32,
    max_b: f32,
    linear: bool,
) -> f32 {
    let corr = multiply_bits(mode, a, b, bit_size) / max_a.max(max_b);

    debug_assert!(corr > 0.0 && corr <= 1.0);

    if linear {
        corr.sqrt()
    } else {
        corr
    }
}
