//! Strategy A: maximum weighted sum of correlation means.
//!
//! The sweep accumulates, for every admitted `(offset, period)` pair, the
//! mean of the non-zero correlations along `offset, offset+period, …`. A
//! per-period top list bounds memory, and a three-phase post-pass rolls
//! means up across periods that are integer multiples of each other within
//! the same offset: an offset that truly repeats at period `p` also shows
//! up at `2p`, `3p`, … and the roll-up rewards exactly that, while
//! count-normalization keeps accidental long-period matches from riding
//! along.

use crate::aggregate::{offset_sweep_done, ByteBudget, SweepBounds};
use crate::rank::{sort_ranked, take_best};
use crate::timing::PhaseTimer;
use crate::types::{CalcPhase, CorrParams, CorrStats, MeanCandidate};

/// Per-offset accumulator inside a single period.
#[derive(Debug, Clone, Copy)]
struct OffsetMean {
    corr_mean: f32,
    num_corr: u32,
    offset: u64,
}

/// Run the weighted-mean-sum aggregation.
pub(crate) fn run(
    values: &[f32],
    stream_bit_size: u64,
    bounds: &SweepBounds,
    params: &CorrParams,
    stats: &mut CorrStats,
    phases: &mut Vec<CalcPhase>,
) -> Vec<MeanCandidate> {
    let timer = PhaseTimer::start();

    let mut candidates: Vec<MeanCandidate> = Vec::new();

    let mut num_values_iter = 0usize;
    let mut num_means_calc = 0usize;
    let mut num_means_iter = 0usize;

    let mut min_mean = f32::MAX;
    let mut max_mean = 0.0f32;

    let mut budget = ByteBudget::default();

    // reused across periods
    let mut top_per_period: Vec<OffsetMean> =
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

            let mut acc = OffsetMean {
                corr_mean: first,
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
                    let pos = top_per_period
                        .partition_point(|e| e.corr_mean >= acc.corr_mean);
                    top_per_period.insert(pos, acc);
                    top_per_period.truncate(params.max_corr_values_per_period);

                    num_means_calc += 1;
                }
            }

            num_means_iter += 1;
        }

        for entry in &top_per_period {
            candidates.push(MeanCandidate {
                offset: entry.offset as u32,
                period: period as u32,
                num_corr: entry.num_corr,
                corr_mean: entry.corr_mean,
                corr_mean_sum: 0.0,
            });
        }

        if budget.charge(
            candidates.len(),
            std::mem::size_of::<MeanCandidate>(),
            params.max_corr_mean_bytes,
        ) {
            stats.accum_corr_mean_quit = true;
            break;
        }

        period -= 1;
    }

    timer.finish("corr mean values", phases);

    if min_mean > max_mean {
        min_mean = 0.0;
    }
    stats.min_corr_mean = min_mean;
    stats.max_corr_mean = max_mean;
    stats.num_corr_values_iterated = num_values_iter;
    stats.num_corr_means_calc = num_means_calc;
    stats.num_corr_means_iterated = num_means_iter;
    budget.write_to(stats);

    if candidates.is_empty() {
        return candidates;
    }

    if params.skip_weighted_sum {
        let timer = PhaseTimer::start();
        if params.return_sorted {
            sort_ranked(
                &mut candidates,
                |c| c.corr_mean,
                false,
                |c| (c.offset, c.period),
            );
        } else {
            take_best(
                &mut candidates,
                |c| c.corr_mean,
                false,
                |c| (c.offset, c.period),
            );
        }
        timer.finish("corr max mean", phases);
    } else {
        let timer = PhaseTimer::start();
        weighted_sum_roll_up(&mut candidates);

        if params.return_sorted {
            sort_ranked(
                &mut candidates,
                |c| c.corr_mean_sum,
                false,
                |c| (c.offset, c.period),
            );
        } else {
            take_best(
                &mut candidates,
                |c| c.corr_mean_sum,
                false,
                |c| (c.offset, c.period),
            );
        }
        timer.finish("corr weighted means sum", phases);
    }

    candidates
}

/// The three-phase weighted-sum computation.
///
/// Phase 1 groups the set into equal-offset runs with periods descending
/// inside each run. Phase 2 walks forward: every run member except the last
/// carries `mean * (num_corr - 1)`, and the run-final member (the run's
/// minimum period) collects its own mean plus every run member whose period
/// it divides, normalized by its own `num_corr - 1`. Phase 3 walks
/// backwards and propagates the collected sum to the run members whose
/// period is a multiple of the run's minimum period; the rest fall back to
/// their plain mean.
fn weighted_sum_roll_up(list: &mut [MeanCandidate]) {
    let len = list.len();
    if len == 0 {
        return;
    }

    // phase 1: offset groups, periods descending within a group
    list.sort_by(|a, b| a.offset.cmp(&b.offset).then(b.period.cmp(&a.period)));

    // phase 2: forward roll-up
    let mut first = 0usize;
    for next in 1..len {
        let prev = next - 1;
        if list[prev].offset == list[next].offset {
            list[prev].corr_mean_sum = list[prev].corr_mean * (list[prev].num_corr - 1) as f32;
        } else {
            list[prev].corr_mean_sum = list[prev].corr_mean;
            let denom = (list[prev].num_corr - 1) as f32;
            for it in first..prev {
                if list[it].period % list[prev].period == 0 {
                    list[prev].corr_mean_sum += list[it].corr_mean_sum / denom;
                }
            }
            first = next;
        }
    }

    let last = len - 1;
    list[last].corr_mean_sum = list[last].corr_mean;
    let denom = (list[last].num_corr - 1) as f32;
    for it in first..last {
        if list[it].period % list[last].period == 0 {
            list[last].corr_mean_sum += list[it].corr_mean_sum / denom;
        }
    }

    // phase 3: reverse propagation within each offset run
    let mut first_r = len - 1;
    for k in (1..len).rev() {
        if list[k].offset == list[k - 1].offset {
            if list[k - 1].period % list[first_r].period == 0 {
                list[k - 1].corr_mean_sum = list[first_r].corr_mean_sum;
            } else {
                list[k - 1].corr_mean_sum = list[k - 1].corr_mean;
            }
        } else {
            first_r = k - 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn candidate(offset: u32, period: u32, num_corr: u32, mean: f32) -> MeanCandidate {
        MeanCandidate {
            offset,
            period,
            num_corr,
            corr_mean: mean,
            corr_mean_sum: 0.0,
        }
    }

    #[test]
    fn test_roll_up_groups_multiples() {
        // the documented reference table: offsets 10 and 100 repeat at
        // multiple periods, offsets 20 and 30 are accidental singles
        let mut list = vec![
            candidate(20, 33, 30, 0.850),
            candidate(10, 200, 5, 0.845),
            candidate(30, 90, 11, 0.841),
            candidate(10, 100, 11, 0.836),
            candidate(100, 165, 6, 0.831),
            candidate(100, 55, 17, 0.823),
        ];

        weighted_sum_roll_up(&mut list);
        sort_ranked(
            &mut list,
            |c| c.corr_mean_sum,
            false,
            |c| (c.offset, c.period),
        );

        // 0.836 + 0.845 * (5 - 1) / (11 - 1)
        let sum_10 = 0.836 + 0.845 * 4.0 / 10.0;
        // 0.823 + 0.831 * (6 - 1) / (17 - 1)
        let sum_100 = 0.823 + 0.831 * 5.0 / 16.0;

        assert_eq!(list[0].offset, 10);
        assert_eq!(list[0].period, 100);
        assert!((list[0].corr_mean_sum - sum_10).abs() < 1e-6);
        assert_eq!(list[1].offset, 10);
        assert_eq!(list[1].period, 200);
        assert!((list[1].corr_mean_sum - sum_10).abs() < 1e-6);

        assert_eq!(list[2].offset, 100);
        assert_eq!(list[2].period, 55);
        assert!((list[2].corr_mean_sum - sum_100).abs() < 1e-6);
        assert_eq!(list[3].offset, 100);
        assert_eq!(list[3].period, 165);
        assert!((list[3].corr_mean_sum - sum_100).abs() < 1e-6);

        // singles keep their plain mean
        assert_eq!(list[4].offset, 20);
        assert!((list[4].corr_mean_sum - 0.850).abs() < 1e-6);
        assert_eq!(list[5].offset, 30);
        assert!((list[5].corr_mean_sum - 0.841).abs() < 1e-6);
    }

    #[test]
    fn test_roll_up_non_multiple_resets_to_mean() {
        // periods 90 and 55 share an offset but are not multiples of 55
        let mut list = vec![
            candidate(40, 90, 4, 0.9),
            candidate(40, 55, 6, 0.7),
        ];
        weighted_sum_roll_up(&mut list);

        let p55 = list.iter().find(|c| c.period == 55).unwrap();
        let p90 = list.iter().find(|c| c.period == 90).unwrap();
        // run-final member keeps only its own mean, 90 is not a multiple
        assert!((p55.corr_mean_sum - 0.7).abs() < 1e-6);
        // the reverse pass resets 90 to its plain mean
        assert!((p90.corr_mean_sum - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_roll_up_single_entry() {
        let mut list = vec![candidate(5, 50, 3, 0.6)];
        weighted_sum_roll_up(&mut list);
        assert!((list[0].corr_mean_sum - 0.6).abs() < 1e-6);
    }
}
