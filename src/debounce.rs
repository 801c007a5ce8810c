use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::source::ChangeNotice;

/// Default debounce interval for search-query edits.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Notices per coalescing window beyond which the batch collapses into a
/// single full-refresh of the root.
pub const DEFAULT_FLOOD_THRESHOLD: usize = 100;

/// Trailing-edge timer: schedule on event, cancel-and-reschedule on repeat,
/// fire once quiescent.
///
/// Synchronous and poll-driven; the host's event loop calls `poll` (or checks
/// `deadline`) from its tick. No threads, no timers held across await points.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Record an event: push the deadline out to `now + delay`.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
        trace!("debounce rescheduled");
    }

    /// True while an event is pending.
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// The instant the pending event fires, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fire if quiescent past the deadline. Returns true at most once per
    /// scheduled burst.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(d) if now >= d => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Drop any pending event without firing.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Force the pending event to fire now. Returns whether one was pending.
    pub fn flush(&mut self) -> bool {
        self.deadline.take().is_some()
    }
}

/// Coalesces hierarchy-mutation notices so a burst triggers one rebuild, not
/// one per notice.
///
/// When a window collects more than `flood_threshold` notices, the batch
/// collapses into a single deletion-free full refresh marker (a `Created`
/// notice for the root), since replaying the individual paths costs more than
/// one rebuild.
#[derive(Debug)]
pub struct NoticeCoalescer {
    timer: Debouncer,
    pending: Vec<ChangeNotice>,
    flood_threshold: usize,
    root: PathBuf,
}

impl NoticeCoalescer {
    pub fn new(delay: Duration, flood_threshold: usize, root: PathBuf) -> Self {
        Self {
            timer: Debouncer::new(delay),
            pending: Vec::new(),
            flood_threshold,
            root,
        }
    }

    /// Buffer a notice and restart the quiescence window.
    pub fn push(&mut self, notice: ChangeNotice, now: Instant) {
        self.pending.push(notice);
        self.timer.schedule(now);
    }

    pub fn is_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drain the batch once the window is quiescent; `None` until then.
    pub fn poll(&mut self, now: Instant) -> Option<Vec<ChangeNotice>> {
        if !self.timer.poll(now) {
            return None;
        }
        Some(self.drain())
    }

    /// Drain immediately regardless of the timer.
    pub fn flush(&mut self) -> Option<Vec<ChangeNotice>> {
        if self.pending.is_empty() {
            return None;
        }
        self.timer.cancel();
        Some(self.drain())
    }

    fn drain(&mut self) -> Vec<ChangeNotice> {
        let batch = std::mem::take(&mut self.pending);
        if batch.len() > self.flood_threshold {
            trace!(count = batch.len(), "notice flood collapsed to root refresh");
            vec![ChangeNotice::Created(self.root.clone())]
        } else {
            batch
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(300);

    #[test]
    fn fires_once_after_quiescence() {
        let mut d = Debouncer::new(DELAY);
        let t0 = Instant::now();
        d.schedule(t0);
        assert!(!d.poll(t0));
        assert!(!d.poll(t0 + Duration::from_millis(299)));
        assert!(d.poll(t0 + Duration::from_millis(300)));
        // Only once per burst.
        assert!(!d.poll(t0 + Duration::from_millis(301)));
    }

    #[test]
    fn reschedule_pushes_deadline_out() {
        let mut d = Debouncer::new(DELAY);
        let t0 = Instant::now();
        d.schedule(t0);
        d.schedule(t0 + Duration::from_millis(200));
        assert!(!d.poll(t0 + Duration::from_millis(400)));
        assert!(d.poll(t0 + Duration::from_millis(500)));
    }

    #[test]
    fn cancel_and_flush() {
        let mut d = Debouncer::new(DELAY);
        let t0 = Instant::now();
        d.schedule(t0);
        d.cancel();
        assert!(!d.poll(t0 + DELAY));

        d.schedule(t0);
        assert!(d.flush());
        assert!(!d.is_pending());
        assert!(!d.flush());
    }

    #[test]
    fn coalescer_batches_notices_into_one_drain() {
        let t0 = Instant::now();
        let mut c = NoticeCoalescer::new(DELAY, 100, PathBuf::from("root"));
        c.push(ChangeNotice::Created(PathBuf::from("root/a")), t0);
        c.push(
            ChangeNotice::Deleted(PathBuf::from("root/b")),
            t0 + Duration::from_millis(50),
        );
        assert!(c.poll(t0 + Duration::from_millis(100)).is_none());
        let batch = c.poll(t0 + Duration::from_millis(400)).unwrap();
        assert_eq!(batch.len(), 2);
        // Nothing left afterwards.
        assert!(c.poll(t0 + Duration::from_secs(10)).is_none());
    }

    #[test]
    fn flood_collapses_to_root_refresh() {
        let t0 = Instant::now();
        let mut c = NoticeCoalescer::new(DELAY, 3, PathBuf::from("root"));
        for i in 0..5 {
            c.push(ChangeNotice::Created(PathBuf::from(format!("root/f{i}"))), t0);
        }
        let batch = c.poll(t0 + DELAY).unwrap();
        assert_eq!(batch, vec![ChangeNotice::Created(PathBuf::from("root"))]);
    }

    #[test]
    fn coalescer_flush_drains_early() {
        let t0 = Instant::now();
        let mut c = NoticeCoalescer::new(DELAY, 100, PathBuf::from("root"));
        assert!(c.flush().is_none());
        c.push(ChangeNotice::Deleted(PathBuf::from("root/x")), t0);
        let batch = c.flush().unwrap();
        assert_eq!(batch.len(), 1);
        assert!(!c.is_pending());
    }
}
