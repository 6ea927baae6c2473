//! Strategy C: maximum weighted autocorrelation of the correlation array.
//!
//! Instead of walking `(offset, period)` pairs, the correlation array is
//! multiplied with shifted copies of itself. Each shift is a period
//! candidate; the first occurrence offset is not recovered (candidates all
//! report offset zero). Linear in memory, quadratic in time, and sensitive
//! to noise left under the floor cutoff, but with no candidate-set growth to
//! budget for.

use crate::aggregate::SweepBounds;
use crate::rank::{sort_ranked, take_best};
use crate::timing::PhaseTimer;
use crate::types::{AutocorrCandidate, CalcPhase, CorrParams, CorrStats};

/// Run the shifted self-correlation aggregation.
pub(crate) fn run(
    values: &[f32],
    stream_bit_size: u64,
    bounds: &SweepBounds,
    params: &CorrParams,
    stats: &mut CorrStats,
    phases: &mut Vec<CalcPhase>,
) -> Vec<AutocorrCandidate> {
    let timer = PhaseTimer::start();
    let n = stream_bit_size;

    let min_shift = bounds.min_period.min(n - 1);
    let mut max_shift = n - 1;
    if params.max_repeat.is_some() {
        max_shift = max_shift.min(
            bounds
                .max_period
                .saturating_mul(u64::from(bounds.max_repeat)),
        );
    }

    let mut num_shifts = (max_shift + 1).max(min_shift + 1);

    // Shifting shrinks the effective stream; the caller bounds that were
    // consistent against the full length may not be against the shrunken
    // window, so they are re-checked here.
    if n < bounds.min_period + num_shifts {
        num_shifts = n - bounds.min_period;

        let repeat = u64::from(params.min_repeat.max(1));
        let over = |p: u32| -> bool {
            let stride = if params.min_repeat != 0 {
                u64::from(p) * repeat
            } else {
                u64::from(p)
            };
            stride >= num_shifts
        };
        let inconsistent = params.max_period.map_or(false, over)
            || params.min_period.map_or(false, |p| p != 0 && over(p));

        if inconsistent {
            stats.input_inconsistency = true;
            timer.finish("corr autocorr", phases);
            return Vec::new();
        }
    }

    let shifts = num_shifts as usize;
    let base = bounds.min_period as usize;
    let total_values = base + shifts;

    let mut candidates: Vec<AutocorrCandidate> = (0..shifts)
        .map(|i| AutocorrCandidate {
            offset: 0,
            period: (bounds.min_period + i as u64) as u32,
            num_corr: 0,
            corr_value: 0.0,
        })
        .collect();

    let mut squares = vec![0.0f32; total_values];
    for (square, &value) in squares.iter_mut().zip(values) {
        *square = value * value;
    }

    // prefix/suffix accumulators keep the denominator pass linear
    let mut denom_window = vec![0.0f32; shifts];
    let mut denom_tail = vec![0.0f32; shifts];
    let mut window_acc = 0.0f32;
    let mut tail_acc = 0.0f32;
    for i in 0..shifts {
        window_acc += squares[i];
        tail_acc += squares[base + shifts - i - 1];
        denom_window[shifts - i - 1] = window_acc;
        denom_tail[shifts - i - 1] = tail_acc;
    }

    let mut num_values_iter = 0usize;

    let mut remaining = num_shifts;
    let mut shift = bounds.min_period;
    let mut index = 0usize;
    while shift <= max_shift && remaining >= min_shift {
        let mut numerator = 0.0f32;
        let mut num_corr = 0u32;

        for j in 0..remaining as usize {
            let product = values[j] * values[j + shift as usize];
            if product != 0.0 {
                numerator += product;
                num_corr += 1;
            }
            num_values_iter += 1;
        }

        // the window count renormalizes the score across shrinking windows;
        // no square root since the values are only compared to each other
        let denom = denom_window[index].max(denom_tail[index]);
        if denom > 0.0 {
            candidates[index].corr_value = numerator * total_values as f32 / denom;
        }
        candidates[index].num_corr = num_corr;

        index += 1;
        if index >= shifts {
            break;
        }
        shift += 1;
        remaining -= 1;
    }

    stats.num_corr_values_iterated = num_values_iter;

    if params.return_sorted {
        sort_ranked(
            &mut candidates,
            |c| c.corr_value,
            false,
            |c| (c.offset, c.period),
        );
    } else {
        take_best(
            &mut candidates,
            |c| c.corr_value,
            false,
            |c| (c.offset, c.period),
        );
    }

    timer.finish("corr autocorr", phases);

    candidates
}
