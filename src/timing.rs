//! Phase timing for correlation runs.
//!
//! Durations come from the monotonic clock; a duration can never be
//! negative, and fractions are computed once against the whole-run phase
//! after all phases are recorded.

use std::time::Instant;

use crate::types::CalcPhase;

/// Running timer for a single named phase.
pub(crate) struct PhaseTimer {
    start: Instant,
}

impl PhaseTimer {
    pub(crate) fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Stop the timer and append the phase record.
    pub(crate) fn finish(self, name: &str, phases: &mut Vec<CalcPhase>) -> f64 {
        let duration_secs = self.start.elapsed().as_secs_f64();
        phases.push(CalcPhase {
            name: name.to_owned(),
            duration_secs,
            fraction_of_total: 0.0,
        });
        duration_secs
    }
}

/// Fill in every phase's fraction of the whole run.
pub(crate) fn finalize_fractions(total_secs: f64, phases: &mut [CalcPhase]) {
    for phase in phases {
        phase.fraction_of_total = if total_secs > 0.0 {
            (phase.duration_secs / total_secs) as f32
        } else {
            0.0
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_recorded_in_order() {
        let mut phases = Vec::new();
        PhaseTimer::start().finish("first", &mut phases);
        let total = PhaseTimer::start().finish("all", &mut phases);
        finalize_fractions(total.max(f64::MIN_POSITIVE), &mut phases);

        assert_eq!(phases.len(), 2);
        assert_eq!(phases[0].name, "first");
        assert_eq!(phases[1].name, "all");
        assert!(phases.iter().all(|p| p.duration_secs >= 0.0));
        assert!(phases.iter().all(|p| p.fraction_of_total >= 0.0));
    }

    #[test]
    fn test_zero_total_yields_zero_fractions() {
        let mut phases = vec![CalcPhase {
            name: "corr values".into(),
            duration_secs: 0.0,
            fraction_of_total: 0.5,
        }];
        finalize_fractions(0.0, &mut phases);
        assert_eq!(phases[0].fraction_of_total, 0.0);
    }
}
