//! Per-position correlator.
//!
//! For every bit position of the stream this computes a normalized
//! similarity between the syncseq and the window starting there, and applies
//! the noise-floor cutoff. The output array is the single input of every
//! aggregation strategy.
//!
//! Certainty tolerance of the raw values is around a third of the syncseq
//! length: with a 20-bit syncseq, more than ~6-7 inverted bits per
//! occurrence makes single positions indistinguishable from noise, which is
//! what the mean-based aggregation phases exist to recover from.

use crate::multiply::{corr_value, multiply_bits};
use crate::stream::BitStream;
use crate::types::{CorrParams, CorrStats, Syncseq};

/// Correlate the syncseq against every stream position.
///
/// Returns exactly `stream.bit_len()` values, each either `0` (below the
/// noise floor) or in `(0, 1]`. Windows near the stream tail read into the
/// zero padding; positions at or past the stream length are never emitted.
pub(crate) fn correlate(
    stream: &BitStream,
    syncseq: Syncseq,
    params: &CorrParams,
    stats: &mut CorrStats,
) -> Vec<f32> {
    let n = stream.bit_len();
    let mask = syncseq.mask();
    let bit_size = syncseq.bit_size();

    let syncseq_absmax = multiply_bits(params.multiply_mode, syncseq.value(), syncseq.value(), bit_size);

    let mut values = Vec::with_capacity(n as usize);

    let mut min_value = f32::MAX;
    let mut max_value = 0.0f32;
    let mut num_calc = 0usize;

    for i in 0..n {
        let window = stream.window(i, mask);
        let window_absmax = multiply_bits(params.multiply_mode, window, window, bit_size);

        let value = corr_value(
            params.multiply_mode,
            syncseq.value(),
            window,
            bit_size,
            syncseq_absmax,
            window_absmax,
            params.use_linear_corr,
        );

        min_value = min_value.min(value);
        max_value = max_value.max(value);

        if value >= params.corr_min {
            values.push(value);
            num_calc += 1;
        } else {
            values.push(0.0);
        }
    }

    stats.min_corr_value = min_value;
    stats.max_corr_value = max_value;
    stats.num_corr_values_calc = num_calc;

    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MultiplyMode;
    use pretty_assertions::assert_eq;

    fn params() -> CorrParams {
        CorrParams::new()
    }

    #[test]
    fn test_one_value_per_stream_bit() {
        let stream = BitStream::new(&[0x00, 0xA5, 0xFF]).unwrap();
        let syncseq = Syncseq::new(0xA5, 8).unwrap();
        let mut stats = CorrStats::default();

        let values = correlate(&stream, syncseq, &params(), &mut stats);
        assert_eq!(values.len(), 24);
        assert_eq!(stats.num_corr_values_calc, 24);
    }

    #[test]
    fn test_values_in_contract_range() {
        let stream = BitStream::new(&[0x3C, 0x7E, 0x81, 0x11]).unwrap();
        let syncseq = Syncseq::new(0x5A, 8).unwrap();
        let mut stats = CorrStats::default();

        for linear in [false, true] {
            let mut p = params();
            p.use_linear_corr = linear;
            let values = correlate(&stream, syncseq, &p, &mut stats);
            assert!(values.iter().all(|&v| v == 0.0 || (v > 0.0 && v <= 1.0)));
        }
    }

    #[test]
    fn test_exact_window_scores_one() {
        // syncseq 0xA5 planted at bit 8
        let stream = BitStream::new(&[0x00, 0xA5, 0x00]).unwrap();
        let syncseq = Syncseq::new(0xA5, 8).unwrap();
        let mut stats = CorrStats::default();

        for linear in [false, true] {
            let mut p = params();
            p.use_linear_corr = linear;
            let values = correlate(&stream, syncseq, &p, &mut stats);
            assert_eq!(values[8], 1.0);
            assert!(values.iter().enumerate().all(|(i, &v)| i == 8 || v < 1.0));
        }
        assert_eq!(stats.max_corr_value, 1.0);
    }

    #[test]
    fn test_noise_floor_zeroes_positions() {
        let stream = BitStream::new(&[0x00, 0xA5, 0x00]).unwrap();
        let syncseq = Syncseq::new(0xA5, 8).unwrap();
        let mut stats = CorrStats::default();

        let mut p = params();
        p.corr_min = 0.99;
        let values = correlate(&stream, syncseq, &p, &mut stats);

        assert_eq!(stats.num_corr_values_calc, 1);
        assert!(values.iter().enumerate().all(|(i, &v)| (i == 8) == (v != 0.0)));
        // min/max statistics are taken before the cutoff
        assert!(stats.min_corr_value > 0.0);
        assert!(stats.min_corr_value < 0.99);
    }

    #[test]
    fn test_dispersed_mode_stays_in_range() {
        let stream = BitStream::new(&[0x12, 0x34, 0x56, 0x78]).unwrap();
        let syncseq = Syncseq::new(0xB7, 8).unwrap();
        let mut stats = CorrStats::default();

        let mut p = params();
        p.multiply_mode = MultiplyMode::DispersedPrime;
        let values = correlate(&stream, syncseq, &p, &mut stats);
        assert!(values.iter().all(|&v| v == 0.0 || (v > 0.0 && v <= 1.0)));
    }
}
