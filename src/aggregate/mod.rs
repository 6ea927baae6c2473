//! Candidate aggregation over the per-position correlation array.
//!
//! Three interchangeable strategies share one preamble: the caller's period
//! and repeat bounds are turned into effective bounds, contradictions
//! between the two raise the inconsistency flag, and the sweep itself walks
//! periods from the effective maximum down to the effective minimum under a
//! byte budget for the accumulated candidate set.

pub(crate) mod autocorr;
pub(crate) mod mean_deviat;
pub(crate) mod weighted_mean;

use crate::types::{CorrParams, CorrStats};

/// Effective search bounds derived once at engine entry.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SweepBounds {
    /// Effective minimum period, in bits.
    pub min_period: u64,
    /// Effective maximum period, in bits.
    pub max_period: u64,
    /// Normalized minimum repeat count (at least 1).
    pub min_repeat: u32,
    /// Effective repeat cap; `u32::MAX` when the caller set no limit.
    pub max_repeat: u32,
}

/// Derive effective bounds from the caller's requests.
///
/// Returns `None` after raising the inconsistency flag when honoring the
/// stream geometry would tighten an explicit caller bound: a silently
/// narrowed search field would look like a clean "not found".
pub(crate) fn derive_bounds(
    stream_bit_size: u64,
    syncseq_bit_size: u32,
    params: &CorrParams,
    stats: &mut CorrStats,
) -> Option<SweepBounds> {
    debug_assert!(stream_bit_size > syncseq_bit_size as u64);

    // The minimum repeat count has priority over everything else.
    let min_repeat = params.min_repeat.max(1);
    let max_repeat = params
        .max_repeat
        .map_or(u32::MAX, |r| r.max(min_repeat));

    // An unspecified minimum defaults to twice the syncseq length; an
    // explicit one may not undercut syncseq length + 1. Both are capped by
    // the last addressable period.
    let mut min_period = params
        .min_period
        .map_or(u64::from(syncseq_bit_size) * 2, |p| {
            u64::from(p.max(syncseq_bit_size + 1))
        })
        .min(stream_bit_size - 1);
    let mut max_period = params
        .max_period
        .map_or(stream_bit_size.saturating_mul(2), |p| {
            u64::from(p.max(syncseq_bit_size + 1))
        })
        .min(stream_bit_size - 1);

    max_period = max_period.max(min_period);

    // Enough stream must remain for the required repeats.
    let max_period_for_min_repeat = (stream_bit_size - 1) / u64::from(min_repeat);
    min_period = min_period.min(max_period_for_min_repeat);
    max_period = max_period.min(max_period_for_min_repeat);

    min_period = min_period.min(u64::from(u32::MAX));
    max_period = max_period.min(u64::from(u32::MAX));

    stats.min_period = min_period as u32;
    stats.max_period = max_period as u32;
    stats.used_repeat = min_repeat;

    if let Some(p) = params.min_period {
        if p != 0 && u64::from(p) < min_period {
            stats.input_inconsistency = true;
            return None;
        }
    }
    if let Some(p) = params.max_period {
        if max_period < u64::from(p) {
            stats.input_inconsistency = true;
            return None;
        }
    }
    if params.min_repeat != 0
        && max_period * u64::from(params.min_repeat) >= stream_bit_size
    {
        stats.input_inconsistency = true;
        return None;
    }
    if u64::from(syncseq_bit_size) >= min_period {
        // not enough room between occurrences for a single window
        stats.input_inconsistency = true;
        return None;
    }

    Some(SweepBounds {
        min_period,
        max_period,
        min_repeat,
        max_repeat,
    })
}

/// Whether the offset sweep for `period` is exhausted at offset `i`.
///
/// Offsets are walked in ascending order, so the first offset past the
/// periods-in-offset cap or without room for the required repeats ends the
/// sweep for this period.
pub(crate) fn offset_sweep_done(
    i: u64,
    period: u64,
    stream_bit_size: u64,
    min_repeat: u32,
    max_periods_in_offset: Option<u32>,
) -> bool {
    if let Some(max_periods) = max_periods_in_offset {
        if max_periods > 0 {
            // N periods including the first bit of the N+1-th
            if i / period >= u64::from(max_periods) && i % period != 0 {
                return true;
            }
        } else if i / period >= 1 {
            // one period excluding the first bit of the second
            return true;
        }
    }

    // not enough repeats remain past this offset
    u64::from(min_repeat) >= (stream_bit_size - i + period - 1) / period
}

/// Byte accounting for the accumulated candidate set.
#[derive(Debug, Default)]
pub(crate) struct ByteBudget {
    used: usize,
    accum: usize,
}

impl ByteBudget {
    /// Record the candidate set size after a period flush; returns `true`
    /// when the budget is exhausted and the sweep must stop.
    pub(crate) fn charge(&mut self, entries: usize, entry_size: usize, budget: usize) -> bool {
        let bytes = entries * entry_size;
        self.used = self.used.max(bytes);
        self.accum = self.accum.max(bytes);
        self.accum >= budget
    }

    pub(crate) fn write_to(&self, stats: &mut CorrStats) {
        stats.used_corr_mean_bytes = self.used;
        stats.accum_corr_mean_bytes = self.accum;
    }
}
