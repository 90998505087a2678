//! Windowed aggregation that turns outcome samples into histogram bars.

use std::{collections::BTreeMap, time::Duration};

use rollout_reef_core::{BarSegment, Category, HistogramBar, StatusCode, HISTOGRAM_WINDOW};

#[derive(Clone, Copy, Debug, Default)]
struct StatusCounts {
    total: u64,
    ok: u64,
    err: u64,
}

/// Accumulates (category, status) samples until the window elapses.
///
/// A bar is snapshotted only when the window crosses [`HISTOGRAM_WINDOW`]
/// with at least one sample; the accumulation map and timer reset on every
/// crossing regardless of whether a bar was emitted.
#[derive(Debug, Default)]
pub(crate) struct HistogramWindow {
    counts: BTreeMap<Category, StatusCounts>,
    elapsed: Duration,
}

impl HistogramWindow {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records one sample, creating the category entry if absent.
    pub(crate) fn record(&mut self, category: Category, status: StatusCode) {
        let counts = self.counts.entry(category).or_default();
        counts.total += 1;
        match status {
            StatusCode::Ok => counts.ok += 1,
            StatusCode::ServerError => counts.err += 1,
        }
    }

    /// Accumulates elapsed time, snapshotting a bar once the window elapses.
    pub(crate) fn advance(&mut self, dt: Duration) -> Option<HistogramBar> {
        self.elapsed = self.elapsed.saturating_add(dt);
        if self.elapsed <= HISTOGRAM_WINDOW {
            return None;
        }

        self.elapsed = Duration::ZERO;
        let total: u64 = self.counts.values().map(|counts| counts.total).sum();
        if total == 0 {
            self.counts.clear();
            return None;
        }

        let denominator = total as f32;
        let segments: Vec<BarSegment> = self
            .counts
            .iter()
            .map(|(category, counts)| {
                BarSegment::new(
                    *category,
                    counts.total as f32 / denominator,
                    counts.ok as f32 / denominator,
                    counts.err as f32 / denominator,
                )
            })
            .collect();
        self.counts.clear();

        Some(HistogramBar::from_segments(segments))
    }

    /// Number of samples currently pending in the window.
    pub(crate) fn pending_total(&self) -> u64 {
        self.counts.values().map(|counts| counts.total).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flush_emits_one_sorted_bar_and_clears_the_window() {
        let mut window = HistogramWindow::new();
        window.record(Category::Blue, StatusCode::Ok);
        window.record(Category::Blue, StatusCode::Ok);
        window.record(Category::Yellow, StatusCode::ServerError);

        let bar = window
            .advance(Duration::from_millis(3_001))
            .expect("window past threshold with samples must emit a bar");

        let segments = bar.segments();
        assert_eq!(segments.len(), 2);

        assert_eq!(segments[0].category, Category::Blue);
        assert!((segments[0].share - 2.0 / 3.0).abs() < 1e-6);
        assert!((segments[0].ok_share - 2.0 / 3.0).abs() < 1e-6);
        assert!(segments[0].err_share.abs() < 1e-6);

        assert_eq!(segments[1].category, Category::Yellow);
        assert!((segments[1].share - 1.0 / 3.0).abs() < 1e-6);
        assert!(segments[1].ok_share.abs() < 1e-6);
        assert!((segments[1].err_share - 1.0 / 3.0).abs() < 1e-6);

        assert_eq!(window.pending_total(), 0, "accumulation map must be empty");
    }

    #[test]
    fn sub_threshold_advance_preserves_pending_counts() {
        let mut window = HistogramWindow::new();
        window.record(Category::Blue, StatusCode::Ok);

        assert!(window.advance(Duration::from_millis(2_999)).is_none());
        assert_eq!(window.pending_total(), 1);
    }

    #[test]
    fn crossing_with_no_samples_resets_the_timer_without_a_bar() {
        let mut window = HistogramWindow::new();
        assert!(window.advance(Duration::from_millis(3_100)).is_none());

        // The timer restarted on the crossing, so a fresh sample needs a
        // full window before it can flush.
        window.record(Category::Blue, StatusCode::Ok);
        assert!(window.advance(Duration::from_millis(2_900)).is_none());
        assert_eq!(window.pending_total(), 1);
    }

    #[test]
    fn windows_do_not_leak_samples_into_each_other() {
        let mut window = HistogramWindow::new();

        window.record(Category::Blue, StatusCode::Ok);
        let first = window
            .advance(Duration::from_millis(3_100))
            .expect("first window flush");
        assert!((first.segments()[0].ok_share - 1.0).abs() < 1e-6);

        window.record(Category::Yellow, StatusCode::ServerError);
        window.record(Category::Yellow, StatusCode::Ok);
        let second = window
            .advance(Duration::from_millis(3_100))
            .expect("second window flush");

        let segments = second.segments();
        assert_eq!(segments.len(), 1, "first window's category must not leak");
        assert_eq!(segments[0].category, Category::Yellow);
        assert!((segments[0].share - 1.0).abs() < 1e-6);
        assert!((segments[0].ok_share - 0.5).abs() < 1e-6);
        assert!((segments[0].err_share - 0.5).abs() < 1e-6);
    }

    #[test]
    fn exact_threshold_does_not_flush() {
        let mut window = HistogramWindow::new();
        window.record(Category::Blue, StatusCode::Ok);
        assert!(
            window.advance(HISTOGRAM_WINDOW).is_none(),
            "the window flushes strictly after the threshold"
        );
    }
}
