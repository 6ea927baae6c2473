//! False-positive statistics against a known ground truth.
//!
//! Test and debug tooling: given the offsets where the syncseq was actually
//! planted, the per-position correlation array is partitioned into ranked
//! views that show how far the noise floor is from the true peaks. Not
//! called by the engine or the CLI.

use serde::Serialize;

use crate::types::{DeviatCandidate, MeanCandidate};

/// Ranked partitions of the correlation array against the ground truth.
///
/// All ranked arrays have the requested size and are zero-filled past their
/// populated prefix. Equal values resolve deterministically toward earlier
/// stream positions.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RankedStats {
    /// Number of ground-truth positions seen in the array.
    pub true_num: usize,
    /// Correlations at non-true positions, descending.
    pub false_max_corr: Vec<f32>,
    /// Positions behind `false_max_corr`.
    pub false_max_index: Vec<usize>,
    /// Correlations at true positions, ascending (worst first).
    pub true_max_corr: Vec<f32>,
    /// Positions behind `true_max_corr`.
    pub true_max_index: Vec<usize>,
    /// Top correlations over all positions with true positions zeroed out,
    /// descending: what a ranked window would report as false positives.
    pub false_in_true_max_corr: Vec<f32>,
    /// Positions behind `false_in_true_max_corr`.
    pub false_in_true_max_index: Vec<usize>,
    /// True-position correlations pushed out of the ranked window.
    pub saved_true_corr: Vec<f32>,
    /// Positions behind `saved_true_corr`.
    pub saved_true_index: Vec<usize>,
}

/// A ranked candidate tagged against the ground truth.
#[derive(Debug, Clone, Serialize)]
pub struct TaggedCandidate<T> {
    /// The candidate as ranked by the engine.
    pub candidate: T,
    /// Whether its offset is one of the ground-truth positions.
    pub is_true: bool,
}

/// Partition the top `top_k` correlations against `true_positions`.
pub fn false_positive_stats(
    corr_values: &[f32],
    true_positions: &[u32],
    top_k: usize,
) -> RankedStats {
    let mut stats = RankedStats {
        true_num: 0,
        false_max_corr: vec![0.0; top_k],
        false_max_index: vec![0; top_k],
        true_max_corr: vec![0.0; top_k],
        true_max_index: vec![0; top_k],
        false_in_true_max_corr: vec![0.0; top_k],
        false_in_true_max_index: vec![0; top_k],
        saved_true_corr: Vec::new(),
        saved_true_index: Vec::new(),
    };

    if corr_values.is_empty() || top_k == 0 {
        return stats;
    }

    let is_true = |index: usize| true_positions.iter().any(|&t| t as usize == index);

    stats.false_max_corr[0] = corr_values[0];
    stats.true_max_corr[0] = corr_values[0];
    stats.false_in_true_max_corr[0] = corr_values[0];

    if is_true(0) {
        stats.true_num += 1;
    } else {
        stats.true_max_corr[0] = 0.0;
    }

    for i in 1..corr_values.len() {
        let v = corr_values[i];
        let i_is_true = is_true(i);

        // ranked window over all positions, strict compare keeps equal
        // values stable toward earlier positions
        let mut placed = false;
        for j in 0..top_k {
            if stats.false_in_true_max_corr[j] < v {
                placed = true;

                if stats.false_in_true_max_corr[j] != 0.0 {
                    // a true value shifted off the end is restored later
                    let last = top_k - 1;
                    if stats.false_in_true_max_corr[last] != 0.0
                        && is_true(stats.false_in_true_max_index[last])
                    {
                        stats
                            .saved_true_corr
                            .push(stats.false_in_true_max_corr[last]);
                        stats
                            .saved_true_index
                            .push(stats.false_in_true_max_index[last]);
                    }

                    for k in (j + 1..top_k).rev() {
                        if stats.false_in_true_max_corr[k - 1] != 0.0 {
                            stats.false_in_true_max_corr[k] =
                                stats.false_in_true_max_corr[k - 1];
                            stats.false_in_true_max_index[k] =
                                stats.false_in_true_max_index[k - 1];
                        }
                    }
                }

                stats.false_in_true_max_corr[j] = v;
                stats.false_in_true_max_index[j] = i;
                break;
            }
        }

        if i_is_true {
            stats.true_num += 1;

            if !placed {
                stats.saved_true_corr.push(v);
                stats.saved_true_index.push(i);
            }

            // true positions rank ascending: the weakest true peak first
            for j in 0..top_k {
                if stats.true_max_corr[j] == 0.0 || stats.true_max_corr[j] > v {
                    if stats.true_max_corr[j] != 0.0 {
                        for k in (j + 1..top_k).rev() {
                            stats.true_max_corr[k] = stats.true_max_corr[k - 1];
                            stats.true_max_index[k] = stats.true_max_index[k - 1];
                        }
                    }
                    stats.true_max_corr[j] = v;
                    stats.true_max_index[j] = i;
                    break;
                }
            }
        } else {
            for j in 0..top_k {
                if stats.false_max_corr[j] < v {
                    if stats.false_max_corr[j] != 0.0 {
                        for k in (j + 1..top_k).rev() {
                            stats.false_max_corr[k] = stats.false_max_corr[k - 1];
                            stats.false_max_index[k] = stats.false_max_index[k - 1];
                        }
                    }
                    stats.false_max_corr[j] = v;
                    stats.false_max_index[j] = i;
                    break;
                }
            }
        }
    }

    // true positions read as zero in the false-positive view
    for j in 0..top_k {
        if stats.false_in_true_max_corr[j] != 0.0 && is_true(stats.false_in_true_max_index[j]) {
            stats.false_in_true_max_corr[j] = 0.0;
            stats.false_in_true_max_index[j] = 0;
        }
    }

    // the window tail only held values that were shifted out; clear one
    // slot per saved entry
    let mut j = top_k - 1;
    for _ in 0..stats.saved_true_corr.len() {
        stats.false_in_true_max_corr[j] = 0.0;
        stats.false_in_true_max_index[j] = 0;
        if j == 0 {
            break;
        }
        j -= 1;
    }

    stats
}

/// Tag the top `top_k` mean candidates against the ground truth.
pub fn tag_mean_candidates(
    candidates: &[MeanCandidate],
    true_positions: &[u32],
    top_k: usize,
) -> Vec<TaggedCandidate<MeanCandidate>> {
    candidates
        .iter()
        .take(top_k)
        .map(|c| TaggedCandidate {
            candidate: *c,
            is_true: true_positions.contains(&c.offset),
        })
        .collect()
}

/// Tag the top `top_k` deviation candidates against the ground truth.
pub fn tag_deviat_candidates(
    candidates: &[DeviatCandidate],
    true_positions: &[u32],
    top_k: usize,
) -> Vec<TaggedCandidate<DeviatCandidate>> {
    candidates
        .iter()
        .take(top_k)
        .map(|c| TaggedCandidate {
            candidate: *c,
            is_true: true_positions.contains(&c.offset),
        })
        .collect()
}
