use std::time::{Duration, Instant};

/// Decides when the host should issue the next redraw.
///
/// Without a cap every redraw opportunity renders (the display's refresh
/// paces the loop). With a cap, frames are spaced at least `1 / fps` apart.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    interval: Option<Duration>,
    next_due: Option<Instant>,
}

impl FrameScheduler {
    /// Non-finite or non-positive caps are treated as uncapped.
    pub fn new(target_fps: Option<f32>) -> Self {
        let interval = target_fps
            .filter(|fps| fps.is_finite() && *fps > 0.0)
            .map(|fps| Duration::from_secs_f64(1.0 / f64::from(fps)));
        Self {
            interval,
            next_due: None,
        }
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    pub fn ready_for_frame(&self, now: Instant) -> bool {
        match self.next_due {
            Some(due) => now >= due,
            None => true,
        }
    }

    /// Records a rendered frame at `now` and schedules the next one.
    pub fn mark_rendered(&mut self, now: Instant) {
        let Some(interval) = self.interval else {
            return;
        };
        // Keep a steady cadence, but never try to catch up on missed frames.
        let next = match self.next_due {
            Some(due) if due + interval > now => due + interval,
            _ => now + interval,
        };
        self.next_due = Some(next);
    }

    /// When the next capped frame is due; `None` when uncapped or due now.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_due
    }
}

/// Wall-clock time since the simulation started.
#[derive(Debug, Clone, Copy)]
pub struct SimulationClock {
    origin: Instant,
}

impl SimulationClock {
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncapped_scheduler_is_always_ready() {
        let mut scheduler = FrameScheduler::new(None);
        let now = Instant::now();
        assert!(scheduler.ready_for_frame(now));
        scheduler.mark_rendered(now);
        assert!(scheduler.ready_for_frame(now));
        assert_eq!(scheduler.next_deadline(), None);
    }

    #[test]
    fn capped_scheduler_waits_for_interval() {
        let mut scheduler = FrameScheduler::new(Some(10.0));
        let start = Instant::now();
        assert!(scheduler.ready_for_frame(start));
        scheduler.mark_rendered(start);

        assert!(!scheduler.ready_for_frame(start + Duration::from_millis(50)));
        assert!(scheduler.ready_for_frame(start + Duration::from_millis(100)));
        assert_eq!(
            scheduler.next_deadline(),
            Some(start + Duration::from_millis(100))
        );
    }

    #[test]
    fn late_frames_do_not_accumulate_debt() {
        let mut scheduler = FrameScheduler::new(Some(10.0));
        let start = Instant::now();
        scheduler.mark_rendered(start);
        let late = start + Duration::from_millis(500);
        scheduler.mark_rendered(late);
        assert_eq!(
            scheduler.next_deadline(),
            Some(late + Duration::from_millis(100))
        );
    }

    #[test]
    fn invalid_caps_are_ignored() {
        assert!(FrameScheduler::new(Some(0.0)).interval().is_none());
        assert!(FrameScheduler::new(Some(-5.0)).interval().is_none());
        assert!(FrameScheduler::new(Some(f32::NAN)).interval().is_none());
    }
}
