//! Syncscan - Syncseq Location in Noisy Bit Streams
//!
//! This library locates a known short synchronization pattern (the
//! "syncseq") embedded periodically inside a noisy binary bit stream and
//! reports the bit offset and repetition period at which it occurs.
//!
//! # Features
//!
//! - **Noise tolerance**: single-bit inversion noise up to roughly a third
//!   of the syncseq length per occurrence is absorbed by the per-position
//!   correlator, and up to two thirds by the mean-based aggregation
//! - **Three strategies**: weighted mean sums, mean-deviation minimization,
//!   and a linear-memory autocorrelation sweep, all behind one entry point
//! - **Deterministic output**: candidate order and tie-breaks are exact, so
//!   two runs over the same input agree bit-for-bit
//! - **Bounded resources**: per-period top lists and a byte budget keep the
//!   quadratic candidate space inside a configured memory cap
//!
//! # Quick Start
//!
//! ```rust
//! use syncscan::{locate_syncseq, BitStream, CorrParams, Syncseq};
//!
//! fn main() -> Result<(), syncscan::SyncscanError> {
//!     // a stream with 0xA5 planted at offset 7, period 20
//!     let data = vec![0u8; 8];
//!     let mut stream = BitStream::new(&data)?;
//!     let syncseq = Syncseq::new(0xA5, 8)?;
//!     syncscan::gen::write_syncseq(&mut stream, syncseq, 7, None, 20, None)?;
//!
//!     let mut params = CorrParams::new();
//!     params.min_repeat = 2;
//!     let result = locate_syncseq(&stream, syncseq, &params)?;
//!     if let Some((offset, period, repeats)) = result.candidates.best() {
//!         println!("syncseq at bit {offset}, period {period}, seen {repeats} times");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Search model
//!
//! The engine first computes a normalized similarity `c(i)` in `(0, 1]` for
//! every bit position, then aggregates those values across candidate
//! `(offset, period)` pairs. Search bounds that contradict the stream
//! geometry raise `input_inconsistency` instead of erroring, and a byte
//! budget can stop the sweep early with a partial, consistent result.

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::similar_names)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

mod aggregate;
mod correlator;
mod rank;
mod timing;

pub mod diagnostics;
pub mod error;
pub mod formatter;
pub mod gen;
pub mod multiply;
pub mod stream;
pub mod types;

pub use error::{Result, SyncscanError};
pub use formatter::{HumanFormatter, JsonFormatter, ReportFormatter, ShortFormatter};
pub use stream::BitStream;
pub use types::{
    AutocorrCandidate, CalcPhase, CandidateSet, CorrParams, CorrStats, Correlation,
    DeviatCandidate, ImplToken, MeanCandidate, MultiplyMode, Syncseq,
};

use timing::{finalize_fractions, PhaseTimer};

/// Locate the syncseq in a bit stream.
///
/// This is the primary entry point. It computes the per-position
/// correlation array, derives effective search bounds from the caller's
/// requests, runs the strategy selected by [`CorrParams::impl_token`], and
/// returns the ranked candidates together with statistics and timings.
///
/// # Arguments
///
/// * `stream` - The bit stream to search
/// * `syncseq` - The syncseq word and its bit length
/// * `params` - Search parameters
///
/// # Returns
///
/// * `Ok(Correlation)` - Candidates, the correlation array, and statistics.
///   Contradicting search bounds leave `stats.input_inconsistency` set with
///   an empty candidate list; an exhausted byte budget leaves
///   `stats.accum_corr_mean_quit` set with the partial candidate list.
/// * `Err(SyncscanError)` - The stream cannot hold a single syncseq window
///   (a caller contract violation, not a search failure)
///
/// # Example
///
/// ```rust
/// use syncscan::{locate_syncseq, BitStream, CorrParams, Syncseq};
///
/// let stream = BitStream::new(&[0x00, 0xA5, 0x00, 0x00, 0xA5, 0x00])?;
/// let syncseq = Syncseq::new(0xA5, 8)?;
/// let result = locate_syncseq(&stream, syncseq, &CorrParams::new())?;
/// # Ok::<(), syncscan::SyncscanError>(())
/// ```
pub fn locate_syncseq(
    stream: &BitStream,
    syncseq: Syncseq,
    params: &CorrParams,
) -> Result<Correlation> {
    if stream.bit_len() <= u64::from(syncseq.bit_size()) {
        return Err(SyncscanError::StreamTooShort {
            stream_bits: stream.bit_len(),
            syncseq_bits: syncseq.bit_size(),
        });
    }

    let all_timer = PhaseTimer::start();

    let mut stats = CorrStats {
        used_corr_value: params.corr_min,
        used_corr_mean: params.corr_mean_min,
        min_corr_value: f32::MAX,
        ..CorrStats::default()
    };
    let mut phases = Vec::with_capacity(4);

    let phase_timer = PhaseTimer::start();
    let corr_values = correlator::correlate(stream, syncseq, params, &mut stats);
    phase_timer.finish("corr values", &mut phases);

    let candidates = match aggregate::derive_bounds(
        stream.bit_len(),
        syncseq.bit_size(),
        params,
        &mut stats,
    ) {
        None => CandidateSet::empty(params.impl_token),
        Some(bounds) => match params.impl_token {
            ImplToken::MaxWeightedSumOfCorrMean => {
                stats.accum_corr_mean_calc = true;
                CandidateSet::WeightedMean(aggregate::weighted_mean::run(
                    &corr_values,
                    stream.bit_len(),
                    &bounds,
                    params,
                    &mut stats,
                    &mut phases,
                ))
            }
            ImplToken::MinSumOfCorrMeanDeviat => {
                stats.accum_corr_mean_calc = true;
                CandidateSet::MeanDeviat(aggregate::mean_deviat::run(
                    &corr_values,
                    stream.bit_len(),
                    &bounds,
                    params,
                    &mut stats,
                    &mut phases,
                ))
            }
            ImplToken::MaxWeightedAutocorrOfCorrValues => {
                CandidateSet::Autocorr(aggregate::autocorr::run(
                    &corr_values,
                    stream.bit_len(),
                    &bounds,
                    params,
                    &mut stats,
                    &mut phases,
                ))
            }
        },
    };

    let total_secs = all_timer.finish("all", &mut phases);
    finalize_fractions(total_secs, &mut phases);

    if stats.min_corr_value > stats.max_corr_value {
        stats.min_corr_value = 0.0;
    }
    stats.phases = phases;

    Ok(Correlation {
        corr_values,
        candidates,
        stats,
    })
}

/// Locate the syncseq in a raw byte buffer.
///
/// Convenience wrapper over [`locate_syncseq`] that treats every bit of
/// `data` as the stream.
pub fn locate_in_bytes(data: &[u8], syncseq: Syncseq, params: &CorrParams) -> Result<Correlation> {
    let stream = BitStream::new(data)?;
    locate_syncseq(&stream, syncseq, params)
}

/// Get version information for this library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }

    #[test]
    fn test_stream_shorter_than_syncseq_is_rejected() {
        let stream = BitStream::with_bit_len(&[0xFF], 8).unwrap();
        let syncseq = Syncseq::new(0xFF, 8).unwrap();
        let err = locate_syncseq(&stream, syncseq, &CorrParams::new());
        assert!(matches!(err, Err(SyncscanError::StreamTooShort { .. })));
    }

    #[test]
    fn test_inconsistency_keeps_corr_values() {
        // N = M + 1: two positions exist but no period fits
        let stream = BitStream::with_bit_len(&[0x01, 0x00], 2).unwrap();
        let syncseq = Syncseq::new(0x1, 1).unwrap();

        let result = locate_syncseq(&stream, syncseq, &CorrParams::new()).unwrap();
        assert!(result.stats.input_inconsistency);
        assert!(result.candidates.is_empty());
        assert_eq!(result.corr_values.len(), 2);
    }

    #[test]
    fn test_exact_plant_is_found() {
        let mut stream = BitStream::zeroed(64).unwrap();
        let syncseq = Syncseq::new(0xA5, 8).unwrap();
        gen::write_syncseq(&mut stream, syncseq, 7, None, 20, None).unwrap();

        let mut params = CorrParams::new();
        params.min_repeat = 2;
        params.max_repeat = Some(3);
        params.use_linear_corr = true;

        let result = locate_syncseq(&stream, syncseq, &params).unwrap();
        assert_eq!(result.candidates.best(), Some((7, 20, 3)));
        match &result.candidates {
            CandidateSet::WeightedMean(list) => {
                assert_eq!(list.len(), 1);
                assert_eq!(list[0].corr_mean, 1.0);
            }
            other => panic!("unexpected candidate set: {other:?}"),
        }
    }

    #[test]
    fn test_determinism_across_runs() {
        let mut stream = BitStream::zeroed(256).unwrap();
        let syncseq = Syncseq::new(0x2CD, 10).unwrap();
        gen::write_syncseq(&mut stream, syncseq, 11, None, 50, None).unwrap();

        let mut params = CorrParams::new();
        params.return_sorted = true;
        params.corr_mean_min = 0.5;

        let first = locate_syncseq(&stream, syncseq, &params).unwrap();
        let second = locate_syncseq(&stream, syncseq, &params).unwrap();

        assert_eq!(first.corr_values, second.corr_values);
        match (&first.candidates, &second.candidates) {
            (CandidateSet::WeightedMean(a), CandidateSet::WeightedMean(b)) => {
                assert_eq!(a, b);
            }
            other => panic!("unexpected candidate sets: {other:?}"),
        }
    }

    #[test]
    fn test_phases_end_with_all() {
        let stream = BitStream::new(&[0x12, 0x34, 0x56, 0x78]).unwrap();
        let syncseq = Syncseq::new(0x9, 4).unwrap();
        let result = locate_syncseq(&stream, syncseq, &CorrParams::new()).unwrap();

        let phases = &result.stats.phases;
        assert!(phases.len() >= 2);
        assert_eq!(phases[0].name, "corr values");
        assert_eq!(phases.last().unwrap().name, "all");
    }

    #[test]
    fn test_sorted_first_equals_single_best() {
        let mut stream = BitStream::zeroed(96).unwrap();
        let syncseq = Syncseq::new(0x35, 6).unwrap();
        gen::write_syncseq(&mut stream, syncseq, 5, None, 24, None).unwrap();

        let mut params = CorrParams::new();
        params.min_repeat = 2;
        params.corr_mean_min = 0.9;

        let single = locate_syncseq(&stream, syncseq, &params).unwrap();

        params.return_sorted = true;
        let sorted = locate_syncseq(&stream, syncseq, &params).unwrap();

        assert_eq!(single.candidates.best(), sorted.candidates.best());
    }
}
