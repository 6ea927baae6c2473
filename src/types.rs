//! Core types for the syncscan engine.
//!
//! This module defines all fundamental types used to describe a correlation
//! search: the syncseq word, the search parameters, the ranked candidate
//! records produced by the three aggregation strategies, and the statistics
//! block returned alongside every result.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, SyncscanError};

/// Aggregation strategy selector.
///
/// All three strategies consume the same per-position correlation array and
/// produce a ranked list of `(offset, period)` candidates; they differ in the
/// score they rank by and in their time/memory trade-offs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImplToken {
    /// Maximize the weighted sum of correlation means over offset groups.
    ///
    /// The most noise-tolerant strategy: offsets that repeat at a short
    /// period also match at integer multiples of it, and the weighted-sum
    /// roll-up promotes such offsets over accidental long-period matches.
    #[default]
    MaxWeightedSumOfCorrMean,
    /// Minimize the per-candidate sum of deviations from the mean.
    MinSumOfCorrMeanDeviat,
    /// Maximize the weighted autocorrelation of the correlation array.
    ///
    /// Linear in memory and quadratic in time; reports the period only
    /// (candidate offsets are all zero).
    MaxWeightedAutocorrOfCorrValues,
}

impl fmt::Display for ImplToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImplToken::MaxWeightedSumOfCorrMean => write!(f, "max-weighted-sum-of-corr-mean"),
            ImplToken::MinSumOfCorrMeanDeviat => write!(f, "min-sum-of-corr-mean-deviat"),
            ImplToken::MaxWeightedAutocorrOfCorrValues => {
                write!(f, "max-weighted-autocorr-of-corr-values")
            }
        }
    }
}

/// Bit-pattern multiplication method used by the dispersion multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MultiplyMode {
    /// Weighted count of equal bits: sum the prime weights over the zero bits
    /// of `a ^ b`. Cheap, and self-multiplication yields a constant maximum.
    #[default]
    InvXorPrime,
    /// Per-bit dispersed products: each operand bit maps to its prime weight
    /// (set) or a small even value (clear) before multiplying. More work per
    /// call, wider spread of output values for low-match inputs.
    DispersedPrime,
}

impl fmt::Display for MultiplyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MultiplyMode::InvXorPrime => write!(f, "inv-xor-prime"),
            MultiplyMode::DispersedPrime => write!(f, "dispersed-prime"),
        }
    }
}

/// A syncseq word: up to 32 bits known to both the sender and this engine.
///
/// The word is compared against the stream in little-endian bit order: bit
/// `i` of the word lines up with stream bit `offset + i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Syncseq {
    value: u32,
    bit_size: u32,
}

impl Syncseq {
    /// Create a syncseq from a word and an explicit bit size.
    ///
    /// The word is masked to `bit_size` bits. Returns an error when the bit
    /// size is outside `1..=32` or the masked word is zero.
    pub fn new(value: u32, bit_size: u32) -> Result<Self> {
        if !(1..=32).contains(&bit_size) {
            return Err(SyncscanError::InvalidSyncseqBitSize { bit_size });
        }
        let masked = value & Self::mask_for(bit_size);
        if masked == 0 {
            return Err(SyncscanError::ZeroSyncseq { bit_size });
        }
        Ok(Self {
            value: masked,
            bit_size,
        })
    }

    /// The masked syncseq word.
    pub fn value(&self) -> u32 {
        self.value
    }

    /// The syncseq length in bits.
    pub fn bit_size(&self) -> u32 {
        self.bit_size
    }

    /// Bit mask covering the syncseq width.
    pub fn mask(&self) -> u32 {
        Self::mask_for(self.bit_size)
    }

    fn mask_for(bit_size: u32) -> u32 {
        (!(!0u64 << bit_size)) as u32
    }
}

impl fmt::Display for Syncseq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}/{}", self.value, self.bit_size)
    }
}

/// Search parameters for a correlation run.
///
/// Snapshot semantics: the engine reads the parameters once at entry and
/// never mutates them. Period and repeat bounds are caller *requests*; the
/// engine derives effective bounds from them and flags an inconsistency when
/// the derivation would tighten an explicit request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrParams {
    /// Aggregation strategy.
    pub impl_token: ImplToken,
    /// Bit-pattern multiplication method.
    pub multiply_mode: MultiplyMode,
    /// Noise-floor cutoff: per-position values below this are zeroed.
    pub corr_min: f32,
    /// Minimum mean for a candidate to enter the ranked set.
    pub corr_mean_min: f32,
    /// Requested minimum period; defaults to twice the syncseq bit size.
    pub min_period: Option<u32>,
    /// Requested maximum period; defaults to the stream length minus one.
    pub max_period: Option<u32>,
    /// Minimum number of repeats past the first occurrence; zero is
    /// normalized to one.
    pub min_repeat: u32,
    /// Maximum number of repeats walked per candidate; `None` is unlimited.
    pub max_repeat: Option<u32>,
    /// Cap on whole periods fitting between stream start and an offset.
    ///
    /// `Some(0)` admits one period excluding the first bit of the second,
    /// `Some(1)` includes that bit, `Some(k)` admits `k` periods including
    /// the first bit of the `k+1`-th, `None` admits every offset.
    pub max_periods_in_offset: Option<u32>,
    /// Bound on the per-period top list of candidate means.
    pub max_corr_values_per_period: usize,
    /// Byte budget for the accumulated candidate set; reaching it stops the
    /// period sweep early with `accum_corr_mean_quit` raised.
    pub max_corr_mean_bytes: usize,
    /// Take the square root of each ratio to return to a linear scale.
    pub use_linear_corr: bool,
    /// Abort a candidate as soon as a filtered (zero) position is walked.
    pub skip_on_filtered: bool,
    /// Rank by plain mean instead of running the weighted-sum roll-up.
    pub skip_weighted_sum: bool,
    /// Order the per-period top list by mean instead of deviation.
    ///
    /// Only meaningful for [`ImplToken::MinSumOfCorrMeanDeviat`]; truncation
    /// of the per-period list may then drop low-deviation candidates.
    pub sort_by_mean_first: bool,
    /// Return the whole ranked list instead of the single best candidate.
    pub return_sorted: bool,
}

impl CorrParams {
    /// Parameters with default settings.
    pub fn new() -> Self {
        Self {
            impl_token: ImplToken::MaxWeightedSumOfCorrMean,
            multiply_mode: MultiplyMode::InvXorPrime,
            corr_min: 0.0,
            corr_mean_min: 0.81,
            min_period: None,
            max_period: None,
            min_repeat: 1,
            max_repeat: None,
            max_periods_in_offset: None,
            max_corr_values_per_period: 16,
            max_corr_mean_bytes: 400 * 1024 * 1024,
            use_linear_corr: false,
            skip_on_filtered: false,
            skip_weighted_sum: false,
            sort_by_mean_first: false,
            return_sorted: false,
        }
    }

    /// Parameters tuned for noisy streams.
    ///
    /// Applies the noise-floor cutoff, aborts candidates that walk a
    /// filtered position, and ranks on the linear scale.
    pub fn noise_tolerant() -> Self {
        Self {
            corr_min: 0.70,
            use_linear_corr: true,
            skip_on_filtered: true,
            ..Self::new()
        }
    }

    /// Parameters for an exhaustive sorted report.
    pub fn exhaustive() -> Self {
        Self {
            corr_mean_min: 0.0,
            return_sorted: true,
            ..Self::new()
        }
    }
}

impl Default for CorrParams {
    fn default() -> Self {
        Self::new()
    }
}

/// Candidate ranked by autocorrelation score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutocorrCandidate {
    /// First-occurrence bit offset (always zero for this strategy).
    pub offset: u32,
    /// Repetition period in bits.
    pub period: u32,
    /// Number of non-zero products accumulated into the score.
    pub num_corr: u32,
    /// Weighted autocorrelation score.
    pub corr_value: f32,
}

/// Candidate ranked by weighted sum of correlation means.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeanCandidate {
    /// First-occurrence bit offset.
    pub offset: u32,
    /// Repetition period in bits.
    pub period: u32,
    /// Number of non-zero correlations behind the mean.
    pub num_corr: u32,
    /// Correlation mean over the walked positions.
    pub corr_mean: f32,
    /// Weighted mean sum assigned by the roll-up pass.
    pub corr_mean_sum: f32,
}

/// Candidate ranked by mean-deviation sum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviatCandidate {
    /// First-occurrence bit offset.
    pub offset: u32,
    /// Repetition period in bits.
    pub period: u32,
    /// Number of non-zero correlations behind the mean.
    pub num_corr: u32,
    /// Correlation mean over the walked positions.
    pub corr_mean: f32,
    /// Mean absolute deviation from the mean.
    pub corr_mean_deviat_sum: f32,
}

/// The candidate list produced by a correlation run.
///
/// Exactly one variant is populated, selected by [`CorrParams::impl_token`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSet {
    /// Output of [`ImplToken::MaxWeightedSumOfCorrMean`].
    WeightedMean(Vec<MeanCandidate>),
    /// Output of [`ImplToken::MinSumOfCorrMeanDeviat`].
    MeanDeviat(Vec<DeviatCandidate>),
    /// Output of [`ImplToken::MaxWeightedAutocorrOfCorrValues`].
    Autocorr(Vec<AutocorrCandidate>),
}

impl CandidateSet {
    /// Create the empty set matching a strategy.
    pub fn empty(impl_token: ImplToken) -> Self {
        match impl_token {
            ImplToken::MaxWeightedSumOfCorrMean => CandidateSet::WeightedMean(Vec::new()),
            ImplToken::MinSumOfCorrMeanDeviat => CandidateSet::MeanDeviat(Vec::new()),
            ImplToken::MaxWeightedAutocorrOfCorrValues => CandidateSet::Autocorr(Vec::new()),
        }
    }

    /// Number of candidates in the populated list.
    pub fn len(&self) -> usize {
        match self {
            CandidateSet::WeightedMean(v) => v.len(),
            CandidateSet::MeanDeviat(v) => v.len(),
            CandidateSet::Autocorr(v) => v.len(),
        }
    }

    /// Whether the populated list is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(offset, period, num_corr)` of the top-ranked candidate, if any.
    pub fn best(&self) -> Option<(u32, u32, u32)> {
        match self {
            CandidateSet::WeightedMean(v) => {
                v.first().map(|c| (c.offset, c.period, c.num_corr))
            }
            CandidateSet::MeanDeviat(v) => v.first().map(|c| (c.offset, c.period, c.num_corr)),
            CandidateSet::Autocorr(v) => v.first().map(|c| (c.offset, c.period, c.num_corr)),
        }
    }
}

/// Wall-clock accounting for one phase of a correlation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalcPhase {
    /// Phase name.
    pub name: String,
    /// Phase duration in seconds.
    pub duration_secs: f64,
    /// Fraction of the whole run spent in this phase, in `[0, 1]`.
    pub fraction_of_total: f32,
}

/// Statistics and flags returned alongside every correlation result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorrStats {
    /// Per-phase timing breakdown, ending with the `all` phase.
    pub phases: Vec<CalcPhase>,

    /// Noise-floor cutoff the run was performed with.
    pub used_corr_value: f32,
    /// Smallest per-position correlation observed before filtering.
    pub min_corr_value: f32,
    /// Largest per-position correlation observed.
    pub max_corr_value: f32,
    /// Mean cutoff the run was performed with.
    pub used_corr_mean: f32,
    /// Smallest computed candidate mean.
    pub min_corr_mean: f32,
    /// Largest computed candidate mean.
    pub max_corr_mean: f32,
    /// Smallest single deviation from a candidate mean.
    pub min_corr_mean_deviat: f32,
    /// Largest single deviation from a candidate mean.
    pub max_corr_mean_deviat: f32,

    /// Effective minimum period derived from the caller bounds.
    pub min_period: u32,
    /// Effective maximum period derived from the caller bounds.
    pub max_period: u32,
    /// Normalized minimum repeat count the sweep was performed with.
    pub used_repeat: u32,

    /// Per-position correlations that survived the noise floor.
    pub num_corr_values_calc: usize,
    /// Iterations over per-position correlations during aggregation.
    pub num_corr_values_iterated: usize,
    /// Candidate means that passed the mean cutoff.
    pub num_corr_means_calc: usize,
    /// Candidate means examined during aggregation.
    pub num_corr_means_iterated: usize,

    /// High-water mark of candidate storage, in bytes.
    pub used_corr_mean_bytes: usize,
    /// Accumulated candidate storage compared against the byte budget.
    pub accum_corr_mean_bytes: usize,

    /// Caller bounds contradicted the derived bounds; outputs are empty.
    pub input_inconsistency: bool,
    /// A mean-accumulating strategy ran.
    pub accum_corr_mean_calc: bool,
    /// The byte budget stopped the period sweep early; outputs are partial.
    pub accum_corr_mean_quit: bool,
}

/// Complete result of a correlation run.
#[derive(Debug, Clone, Serialize)]
pub struct Correlation {
    /// Per-position correlation array, one entry per stream bit.
    ///
    /// Skipped during serialization: the array is as long as the stream.
    #[serde(skip_serializing)]
    pub corr_values: Vec<f32>,
    /// The ranked candidate list.
    pub candidates: CandidateSet,
    /// Statistics, flags and timings.
    pub stats: CorrStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_syncseq_masking() {
        let s = Syncseq::new(0xFFFF_FFA5, 8).unwrap();
        assert_eq!(s.value(), 0xA5);
        assert_eq!(s.bit_size(), 8);
        assert_eq!(s.mask(), 0xFF);
    }

    #[test]
    fn test_syncseq_full_width() {
        let s = Syncseq::new(0xDEAD_BEEF, 32).unwrap();
        assert_eq!(s.value(), 0xDEAD_BEEF);
        assert_eq!(s.mask(), 0xFFFF_FFFF);
    }

    #[test]
    fn test_syncseq_rejects_bad_bit_size() {
        assert!(Syncseq::new(1, 0).is_err());
        assert!(Syncseq::new(1, 33).is_err());
    }

    #[test]
    fn test_syncseq_rejects_zero_word() {
        // 0x100 masked to 8 bits is zero
        assert!(Syncseq::new(0x100, 8).is_err());
    }

    #[test]
    fn test_params_presets() {
        let default = CorrParams::new();
        let noisy = CorrParams::noise_tolerant();
        let full = CorrParams::exhaustive();

        assert!(noisy.corr_min > default.corr_min);
        assert!(noisy.use_linear_corr);
        assert!(noisy.skip_on_filtered);
        assert!(full.return_sorted);
        assert_eq!(full.corr_mean_min, 0.0);
    }

    #[test]
    fn test_candidate_set_shapes() {
        let set = CandidateSet::empty(ImplToken::MinSumOfCorrMeanDeviat);
        assert!(matches!(set, CandidateSet::MeanDeviat(_)));
        assert!(set.is_empty());
        assert_eq!(set.best(), None);
    }

    #[test]
    fn test_impl_token_display() {
        assert_eq!(
            ImplToken::MaxWeightedSumOfCorrMean.to_string(),
            "max-weighted-sum-of-corr-mean"
        );
        assert_eq!(MultiplyMode::DispersedPrime.to_string(), "dispersed-prime");
    }
}
