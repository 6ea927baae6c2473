//! Strategy B: minimum sum of deviations from the correlation mean.
//!
//! Same sweep and filters as the weighted-mean strategy, but each candidate
//! that passes the mean cutoff is re-walked to accumulate the absolute
//! deviations of its correlations from the mean. A genuine repetition has
//! uniformly high correlations and therefore a small deviation sum; an
//! accidental match of the same mean tends to mix high and low values.

use crate::aggregate::{offset_sweep_done, ByteBudget, SweepBounds};
use crate::rank::{sort_ranked, take_best};
use crate::timing::PhaseTimer;
use crate::types::{CalcPhase, CorrParams, CorrStats, DeviatCandidate};

/// Per-offset accumulator inside a single period.
#[derive(Debug, Clone, Copy)]
struct OffsetMeanDeviat {
    corr_mean: f32,
    corr_mean_deviat_sum: f32,
    num_corr: u32,
    offset: u64,
}

/// Run the mean-deviation aggregation.
pub(crate) fn run(
    values: &[f32],
    stream_bit_size: u64,
    bounds: &SweepBounds,
    params: &CorrParams,
    stats: &mut CorrStats,
    phases: &mut Vec<CalcPhase>,
) -> Vec<DeviatCandidate> {
    let timer = PhaseTimer::start();

    let mut candidates: Vec<DeviatCandidate> = Vec::new();

    let mut num_values_iter = 0usize;
    let mut num_means_calc = 0usize;
    let mut num_means_iter = 0usize;

    let mut min_mean = f32::MAX;
    let mut max_mean = 0.0f32;
    let mut min_deviat = f32::MAX;
    let mut max_deviat = 0.0f32;

    let mut budget = ByteBudget::default();

    let mut top_per_period: Vec<OffsetMeanDeviat> =
        Vec::with_capacity(params.max_corr_values_per_period + 1);

    let mut period = bounds.max_period;
    while period >= bounds.min_period {
        top_per_period.clear();

        'offsets: for i in 0..stream_bit_size - 1 {
            if offset_sweep_done(
                i,
                period,
                stream_bit_size,
                bounds.min_repeat,
                params.max_periods_in_offset,
            ) {
                break;
            }

            let first = values[i as usize];
            if params.skip_on_filtered && first == 0.0 {
                continue 'offsets;
            }

            let mut acc = OffsetMeanDeviat {
                corr_mean: first,
                corr_mean_deviat_sum: 0.0,
                num_corr: u32::from(first != 0.0),
                offset: i,
            };
            num_values_iter += 1;

            let mut j = i + period;
            let mut repeat = 0u32;
            while j < stream_bit_size && repeat < bounds.max_repeat {
                let next = values[j as usize];
                if params.skip_on_filtered && next == 0.0 {
                    continue 'offsets;
                }
                if next != 0.0 {
                    acc.corr_mean += next;
                    acc.num_corr += 1;
                }
                num_values_iter += 1;
                j += period;
                repeat += 1;
            }

            if acc.num_corr >= 1 + bounds.min_repeat {
                acc.corr_mean /= acc.num_corr as f32;

                min_mean = min_mean.min(acc.corr_mean);
                max_mean = max_mean.max(acc.corr_mean);

                if acc.corr_mean >= params.corr_mean_min {
                    // deviation re-walk over the same positions
                    if first != 0.0 {
                        let deviat = (acc.corr_mean - first).abs();
                        acc.corr_mean_deviat_sum += deviat;
                        min_deviat = min_deviat.min(deviat);
                        max_deviat = max_deviat.max(deviat);
                    }

                    let mut j = i + period;
                    let mut repeat = 0u32;
                    while j < stream_bit_size && repeat < bounds.max_repeat {
                        let next = values[j as usize];
                        if next != 0.0 {
                            let deviat = (acc.corr_mean - next).abs();
                            acc.corr_mean_deviat_sum += deviat;
                            min_deviat = min_deviat.min(deviat);
                            max_deviat = max_deviat.max(deviat);
                        }
                        j += period;
                        repeat += 1;
                    }

                    // mean of the deviations, not their raw sum
                    acc.corr_mean_deviat_sum /= acc.num_corr as f32;

                    let pos = if params.sort_by_mean_first {
                        // may truncate away low-deviation candidates; the
                        // trade-off is documented on the flag
                        top_per_period.partition_point(|e| e.corr_mean >= acc.corr_mean)
                    } else {
                        top_per_period.partition_point(|e| {
                            e.corr_mean_deviat_sum <= acc.corr_mean_deviat_sum
                        })
                    };
                    top_per_period.insert(pos, acc);
                    top_per_period.truncate(params.max_corr_values_per_period);

                    num_means_calc += 1;
                }
            }

            num_means_iter += 1;
        }

        for entry in &top_per_period {
            candidates.push(DeviatCandidate {
                offset: entry.offset as u32,
                period: period as u32,
                num_corr: entry.num_corr,
                corr_mean: entry.corr_mean,
                corr_mean_deviat_sum: entry.corr_mean_deviat_sum,
            });
        }

        if budget.charge(
            candidates.len(),
            std::mem::size_of::<DeviatCandidate>(),
            params.max_corr_mean_bytes,
        ) {
            stats.accum_corr_mean_quit = true;
            break;
        }

        period -= 1;
    }

    timer.finish("corr mean deviat values", phases);

    if min_mean > max_mean {
        min_mean = 0.0;
    }
    if min_deviat > max_deviat {
        min_deviat = 0.0;
    }
    stats.min_corr_mean = min_mean;
    stats.max_corr_mean = max_mean;
    stats.min_corr_mean_deviat = min_deviat;
    stats.max_corr_mean_deviat = max_deviat;
    stats.num_corr_values_iterated = num_values_iter;
    stats.num_corr_means_calc = num_means_calc;
    stats.num_corr_means_iterated = num_means_iter;
    budget.write_to(stats);

    if candidates.is_empty() {
        return candidates;
    }

    let timer = PhaseTimer::start();
    if params.return_sorted {
        sort_ranked(
            &mut candidates,
            |c| c.corr_mean_deviat_sum,
            true,
            |c| (c.offset, c.period),
        );
    } else {
        take_best(
            &mut candidates,
            |c| c.corr_mean_deviat_sum,
            true,
            |c| (c.offset, c.period),
        );
    }
    timer.finish("corr min mean deviat", phases);

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::derive_bounds;
    use pretty_assertions::assert_eq;

    fn run_on(values: &[f32], params: &CorrParams) -> (Vec<DeviatCandidate>, CorrStats) {
        let mut stats = CorrStats::default();
        let mut phases = Vec::new();
        let n = values.len() as u64;
        let bounds = derive_bounds(n, 2, params, &mut stats).unwrap();
        let out = run(values, n, &bounds, params, &mut stats, &mut phases);
        (out, stats)
    }

    #[test]
    fn test_uniform_repetition_has_zero_deviation() {
        // ones at 1, 5, 9, 13; noise elsewhere differs per position
        let mut values = vec![0.3f32; 16];
        for &i in &[1usize, 5, 9, 13] {
            values[i] = 1.0;
        }
        values[2] = 0.6;
        values[7] = 0.2;

        let mut params = CorrParams::new();
        params.min_period = Some(4);
        params.max_period = Some(4);
        params.min_repeat = 2;
        params.corr_mean_min = 0.9;

        let (out, stats) = run_on(&values, &params);
        assert_eq!(out.len(), 1);
        assert_eq!((out[0].offset, out[0].period), (1, 4));
        assert_eq!(out[0].num_corr, 4);
        assert_eq!(out[0].corr_mean, 1.0);
        assert_eq!(out[0].corr_mean_deviat_sum, 0.0);
        assert_eq!(stats.min_corr_mean_deviat, 0.0);
    }

    #[test]
    fn test_mixed_values_rank_behind_uniform() {
        let mut values = vec![0.5f32; 24];
        // uniform candidate at offset 0, period 8
        values[0] = 0.9;
        values[8] = 0.9;
        values[16] = 0.9;
        // same mean at offset 1, but spread out
        values[1] = 1.0;
        values[9] = 0.9;
        values[17] = 0.8;

        let mut params = CorrParams::new();
        params.min_period = Some(8);
        params.max_period = Some(8);
        params.min_repeat = 2;
        params.corr_mean_min = 0.85;
        params.return_sorted = true;

        let (out, _) = run_on(&values, &params);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].offset, 0);
        assert!(out[0].corr_mean_deviat_sum < 1e-6);
        assert_eq!(out[1].offset, 1);
        assert!(out[1].corr_mean_deviat_sum > out[0].corr_mean_deviat_sum);
    }

    #[test]
    fn test_argmin_tie_breaks_to_lowest_offset() {
        let mut values = vec![0.1f32; 20];
        // two identical uniform candidates at offsets 2 and 3
        for &i in &[2usize, 7, 12, 17] {
            values[i] = 0.95;
        }
        for &i in &[3usize, 8, 13, 18] {
            values[i] = 0.95;
        }

        let mut params = CorrParams::new();
        params.min_period = Some(5);
        params.max_period = Some(5);
        params.min_repeat = 2;
        params.corr_mean_min = 0.9;

        let (out, _) = run_on(&values, &params);
        assert_eq!(out.len(), 1);
        assert_eq!((out[0].offset, out[0].period), (2, 5));
    }
}
