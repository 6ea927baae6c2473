//! Output formatters for correlation results.
//!
//! Trait-based formatters render a [`Correlation`] for the CLI and for
//! embedding callers: human-readable text, JSON, and a compact single line.

use crate::types::{CalcPhase, CandidateSet, Correlation};

/// Trait for rendering correlation results.
pub trait ReportFormatter {
    /// Render the one-line outcome summary.
    fn format_summary(&self, result: &Correlation) -> String;

    /// Render the candidate list, if this format shows one.
    fn format_candidates(&self, candidates: &CandidateSet) -> Option<String>;

    /// Render the phase timing table, if this format shows one.
    fn format_phases(&self, phases: &[CalcPhase]) -> Option<String>;

    /// Render the complete report.
    ///
    /// Default implementation concatenates the component outputs.
    fn format_report(&self, result: &Correlation) -> String {
        let mut parts = vec![self.format_summary(result)];
        if let Some(s) = self.format_candidates(&result.candidates) {
            parts.push(s);
        }
        if let Some(s) = self.format_phases(&result.stats.phases) {
            parts.push(s);
        }
        parts.join("")
    }
}

/// Human-readable output formatter.
#[derive(Debug, Clone)]
pub struct HumanFormatter {
    /// Show the phase timing table and per-run counters.
    pub verbose: bool,
    /// Cap on printed candidates; `None` prints the whole list.
    pub max_candidates: Option<usize>,
}

impl Default for HumanFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl HumanFormatter {
    /// Create a formatter with default settings.
    pub fn new() -> Self {
        Self {
            verbose: false,
            max_candidates: Some(10),
        }
    }

    /// Create a verbose formatter.
    pub fn verbose() -> Self {
        Self {
            verbose: true,
            max_candidates: None,
        }
    }
}

impl ReportFormatter for HumanFormatter {
    fn format_summary(&self, result: &Correlation) -> String {
        let stats = &result.stats;
        let mut out = String::new();

        if stats.input_inconsistency {
            out.push_str("Result: input inconsistency, search bounds contradict the stream\n");
            return out;
        }

        match result.candidates.best() {
            Some((offset, period, num_corr)) => {
                out.push_str(&format!(
                    "Result: offset {offset}, period {period} ({num_corr} correlations)\n"
                ));
            }
            None => out.push_str("Result: no candidate passed the filters\n"),
        }

        out.push_str(&format!(
            "Periods searched: {}..={}, min repeat {}\n",
            stats.min_period, stats.max_period, stats.used_repeat
        ));
        out.push_str(&format!(
            "Correlation range: {:.4}..{:.4}\n",
            stats.min_corr_value, stats.max_corr_value
        ));

        if stats.accum_corr_mean_calc {
            out.push_str(&format!(
                "Mean range: {:.4}..{:.4}\n",
                stats.min_corr_mean, stats.max_corr_mean
            ));
        }
        if stats.accum_corr_mean_quit {
            out.push_str("Note: candidate memory budget reached, result is partial\n");
        }

        if self.verbose {
            out.push_str(&format!(
                "Counters: {} values kept, {} iterated, {} means kept, {} examined\n",
                stats.num_corr_values_calc,
                stats.num_corr_values_iterated,
                stats.num_corr_means_calc,
                stats.num_corr_means_iterated
            ));
            out.push_str(&format!(
                "Memory: {} bytes used, {} accumulated\n",
                stats.used_corr_mean_bytes, stats.accum_corr_mean_bytes
            ));
        }

        out
    }

    fn format_candidates(&self, candidates: &CandidateSet) -> Option<String> {
        if candidates.is_empty() || candidates.len() == 1 {
            return None;
        }

        let cap = self.max_candidates.unwrap_or(usize::MAX);
        let mut out = String::from("Candidates:\n");

        match candidates {
            CandidateSet::WeightedMean(list) => {
                for c in list.iter().take(cap) {
                    out.push_str(&format!(
                        "  offset {:>8}  period {:>8}  n {:>4}  mean {:.4}  sum {:.4}\n",
                        c.offset, c.period, c.num_corr, c.corr_mean, c.corr_mean_sum
                    ));
                }
            }
            CandidateSet::MeanDeviat(list) => {
                for c in list.iter().take(cap) {
                    out.push_str(&format!(
                        "  offset {:>8}  period {:>8}  n {:>4}  mean {:.4}  deviat {:.4}\n",
                        c.offset, c.period, c.num_corr, c.corr_mean, c.corr_mean_deviat_sum
                    ));
                }
            }
            CandidateSet::Autocorr(list) => {
                for c in list.iter().take(cap) {
                    out.push_str(&format!(
                        "  period {:>8}  n {:>4}  score {:.4}\n",
                        c.period, c.num_corr, c.corr_value
                    ));
                }
            }
        }

        if candidates.len() > cap {
            out.push_str(&format!("  ... {} more\n", candidates.len() - cap));
        }

        Some(out)
    }

    fn format_phases(&self, phases: &[CalcPhase]) -> Option<String> {
        if !self.verbose || phases.is_empty() {
            return None;
        }

        let mut out = String::from("Phases:\n");
        for phase in phases {
            out.push_str(&format!(
                "  {:<26} {:>10.6}s  {:>5.1}%\n",
                phase.name,
                phase.duration_secs,
                phase.fraction_of_total * 100.0
            ));
        }
        Some(out)
    }
}

/// JSON output formatter.
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    /// Pretty-print the output.
    pub pretty: bool,
}

impl JsonFormatter {
    /// Create a compact JSON formatter.
    pub fn new() -> Self {
        Self { pretty: false }
    }
}

impl ReportFormatter for JsonFormatter {
    fn format_summary(&self, result: &Correlation) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(result)
        } else {
            serde_json::to_string(result)
        };
        rendered.unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
    }

    fn format_candidates(&self, _candidates: &CandidateSet) -> Option<String> {
        None
    }

    fn format_phases(&self, _phases: &[CalcPhase]) -> Option<String> {
        None
    }
}

/// Compact single-line formatter.
#[derive(Debug, Clone, Default)]
pub struct ShortFormatter;

impl ReportFormatter for ShortFormatter {
    fn format_summary(&self, result: &Correlation) -> String {
        if result.stats.input_inconsistency {
            return "inconsistent\n".to_owned();
        }
        match result.candidates.best() {
            Some((offset, period, num_corr)) => {
                format!("{offset} {period} {num_corr}\n")
            }
            None => "none\n".to_owned(),
        }
    }

    fn format_candidates(&self, _candidates: &CandidateSet) -> Option<String> {
        None
    }

    fn format_phases(&self, _phases: &[CalcPhase]) -> Option<String> {
        None
    }
}
