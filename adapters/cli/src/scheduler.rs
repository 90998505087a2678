//! Cooperative scheduler for the two periodic loops.
//!
//! The original page drove its render and request loops from independent
//! wall-clock timers. Here both cadences are explicit periodic tasks advanced
//! from a single execution context; the world and system contracts stay safe
//! under arbitrary interleaving, so a multi-threaded executor could replace
//! this scheduler without touching them.

use std::time::Duration;

use rollout_reef_core::{FRAME_PERIOD, PROBE_PERIOD};

/// Accumulator-driven periodic task.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PeriodicTask {
    period: Duration,
    accumulator: Duration,
}

impl PeriodicTask {
    pub(crate) const fn new(period: Duration) -> Self {
        Self {
            period,
            accumulator: Duration::ZERO,
        }
    }

    /// Accumulates elapsed time and returns how many periods completed,
    /// retaining the remainder for the next advance.
    pub(crate) fn fire_count(&mut self, dt: Duration) -> u32 {
        if self.period.is_zero() {
            return 0;
        }

        self.accumulator = self.accumulator.saturating_add(dt);
        let mut fires = 0;
        while self.accumulator >= self.period {
            self.accumulator -= self.period;
            fires += 1;
        }
        fires
    }
}

/// Work owed to the two loops after an advance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct ScheduledWork {
    /// Completed render periods. A windowed run redraws once per display
    /// frame regardless, so values above one mean the display fell behind
    /// the nominal cadence.
    pub(crate) render_frames: u32,
    /// Probes the traffic system should dispatch.
    pub(crate) probe_dispatches: u32,
}

/// The two cooperatively scheduled periodic tasks of the visualization.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Scheduler {
    render: PeriodicTask,
    probe: PeriodicTask,
}

impl Scheduler {
    pub(crate) const fn new() -> Self {
        Self {
            render: PeriodicTask::new(FRAME_PERIOD),
            probe: PeriodicTask::new(PROBE_PERIOD),
        }
    }

    pub(crate) fn advance(&mut self, dt: Duration) -> ScheduledWork {
        ScheduledWork {
            render_frames: self.render.fire_count(dt),
            probe_dispatches: self.probe.fire_count(dt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tasks_fire_once_per_completed_period() {
        let mut task = PeriodicTask::new(Duration::from_millis(300));
        assert_eq!(task.fire_count(Duration::from_millis(1_000)), 3);
    }

    #[test]
    fn tasks_retain_the_remainder_between_advances() {
        let mut task = PeriodicTask::new(Duration::from_millis(300));
        assert_eq!(task.fire_count(Duration::from_millis(250)), 0);
        assert_eq!(task.fire_count(Duration::from_millis(100)), 1);
        assert_eq!(task.fire_count(Duration::from_millis(250)), 1);
    }

    #[test]
    fn zero_period_tasks_never_fire() {
        let mut task = PeriodicTask::new(Duration::ZERO);
        assert_eq!(task.fire_count(Duration::from_secs(60)), 0);
    }

    #[test]
    fn the_scheduler_advances_both_loops_from_one_clock() {
        let mut scheduler = Scheduler::new();
        let work = scheduler.advance(Duration::from_millis(600));

        assert_eq!(work.probe_dispatches, 2);
        assert_eq!(work.render_frames, 60);
    }
}
