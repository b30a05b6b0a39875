use std::collections::VecDeque;
use std::time::Duration;

use topdown_kernel::TickStats;

/// One profiled tick: wall time plus the grid work it caused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSample {
    pub tick: u64,
    pub elapsed: Duration,
    pub stats: TickStats,
}

impl TickSample {
    /// Cells entered plus cells left across all entities.
    pub fn cell_changes(&self) -> usize {
        self.stats.cells_added + self.stats.cells_removed
    }
}

/// Timing and regrid counts per tick.
///
/// Timing statistics cover the most recent `window` ticks; regrid and
/// cell-change rates cover the whole run.
#[derive(Debug)]
pub struct TickProfile {
    recent: VecDeque<TickSample>,
    window: usize,
    ticks: u64,
    total_regridded: u64,
    total_cell_changes: u64,
}

impl TickProfile {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            recent: VecDeque::with_capacity(window),
            window,
            ticks: 0,
            total_regridded: 0,
            total_cell_changes: 0,
        }
    }

    pub fn record(&mut self, tick: u64, elapsed: Duration, stats: TickStats) {
        let sample = TickSample {
            tick,
            elapsed,
            stats,
        };
        self.ticks += 1;
        self.total_regridded += stats.regridded as u64;
        self.total_cell_changes += sample.cell_changes() as u64;
        if self.recent.len() == self.window {
            self.recent.pop_front();
        }
        self.recent.push_back(sample);
    }

    /// Ticks recorded over the whole run.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Samples still in the window, oldest first.
    pub fn recent(&self) -> impl Iterator<Item = &TickSample> {
        self.recent.iter()
    }

    pub fn mean_elapsed(&self) -> Duration {
        if self.recent.is_empty() {
            return Duration::ZERO;
        }
        self.recent.iter().map(|s| s.elapsed).sum::<Duration>() / self.recent.len() as u32
    }

    /// Slowest tick in the window; the latest one wins a tie.
    pub fn slowest(&self) -> Option<&TickSample> {
        self.recent.iter().max_by_key(|s| s.elapsed)
    }

    pub fn regrids_per_tick(&self) -> f64 {
        rate(self.total_regridded, self.ticks)
    }

    pub fn cell_changes_per_tick(&self) -> f64 {
        rate(self.total_cell_changes, self.ticks)
    }

    pub fn report(&self) -> ProfileReport {
        ProfileReport {
            ticks: self.ticks,
            mean_elapsed: self.mean_elapsed(),
            slowest: self.slowest().map(|s| (s.tick, s.elapsed)),
            regrids_per_tick: self.regrids_per_tick(),
            cell_changes_per_tick: self.cell_changes_per_tick(),
        }
    }
}

fn rate(total: u64, ticks: u64) -> f64 {
    if ticks == 0 {
        0.0
    } else {
        total as f64 / ticks as f64
    }
}

/// Snapshot of a [`TickProfile`] for printing.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileReport {
    pub ticks: u64,
    pub mean_elapsed: Duration,
    /// `(tick, elapsed)` of the slowest tick in the window.
    pub slowest: Option<(u64, Duration)>,
    pub regrids_per_tick: f64,
    pub cell_changes_per_tick: f64,
}

impl std::fmt::Display for ProfileReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Profile: ticks={} avg={:?}", self.ticks, self.mean_elapsed)?;
        if let Some((tick, elapsed)) = self.slowest {
            write!(f, " slowest=tick {tick} ({elapsed:?})")?;
        }
        write!(
            f,
            " regrids/tick={:.2} cell_changes/tick={:.2}",
            self.regrids_per_tick, self.cell_changes_per_tick
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(regridded: usize, added: usize, removed: usize) -> TickStats {
        TickStats {
            regridded,
            cells_added: added,
            cells_removed: removed,
            ..TickStats::default()
        }
    }

    #[test]
    fn rates_cover_whole_run() {
        let mut profile = TickProfile::new(2);
        profile.record(1, Duration::from_millis(4), stats(2, 2, 1));
        profile.record(2, Duration::from_millis(2), stats(0, 0, 0));
        profile.record(3, Duration::from_millis(6), stats(1, 1, 2));

        assert_eq!(profile.ticks(), 3);
        assert_eq!(profile.regrids_per_tick(), 1.0);
        assert_eq!(profile.cell_changes_per_tick(), 2.0);
    }

    #[test]
    fn timing_covers_only_the_window() {
        let mut profile = TickProfile::new(2);
        profile.record(1, Duration::from_millis(9), stats(0, 0, 0));
        profile.record(2, Duration::from_millis(2), stats(0, 0, 0));
        profile.record(3, Duration::from_millis(4), stats(0, 0, 0));

        let ticks: Vec<u64> = profile.recent().map(|s| s.tick).collect();
        assert_eq!(ticks, vec![2, 3]);
        assert_eq!(profile.mean_elapsed(), Duration::from_millis(3));
        // Tick 1 was slower but has left the window.
        assert_eq!(profile.slowest().map(|s| s.tick), Some(3));
    }

    #[test]
    fn slowest_prefers_latest_on_tie() {
        let mut profile = TickProfile::new(4);
        profile.record(5, Duration::from_millis(3), stats(0, 0, 0));
        profile.record(6, Duration::from_millis(3), stats(0, 0, 0));
        assert_eq!(profile.slowest().map(|s| s.tick), Some(6));
    }

    #[test]
    fn empty_profile_reports_zero() {
        let profile = TickProfile::new(0);
        let report = profile.report();
        assert_eq!(report.ticks, 0);
        assert_eq!(report.mean_elapsed, Duration::ZERO);
        assert_eq!(report.slowest, None);
        assert_eq!(report.regrids_per_tick, 0.0);
        assert!(!report.to_string().contains("slowest"));
    }

    #[test]
    fn report_names_slowest_tick() {
        let mut profile = TickProfile::new(8);
        profile.record(1, Duration::from_millis(1), stats(4, 4, 0));
        profile.record(2, Duration::from_millis(5), stats(0, 0, 0));
        let text = profile.report().to_string();
        assert!(text.contains("ticks=2"));
        assert!(text.contains("slowest=tick 2"));
        assert!(text.contains("regrids/tick=2.00"));
        assert!(text.contains("cell_changes/tick=2.00"));
    }
}
