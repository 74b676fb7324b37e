use std::time::{Duration, Instant};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Repeating one-second schedule driven by the caller's clock.
///
/// Each firing schedules the next one a full period after the moment it
/// was observed, so scheduling jitter accumulates as drift and missed
/// periods are never caught up. A countdown driven by this loses time
/// against the wall clock under load; that approximation is accepted.
#[derive(Debug, Clone)]
pub struct Ticker {
    period: Duration,
    next: Option<Instant>,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self { period, next: None }
    }

    pub fn next_fire(&self) -> Option<Instant> {
        self.next
    }

    /// Arms the ticker if `active`, cancels it otherwise. Arming an
    /// already armed ticker keeps its schedule.
    pub fn sync(&mut self, active: bool, now: Instant) {
        match (active, self.next) {
            (true, None) => self.next = Some(now + self.period),
            (false, Some(_)) => self.next = None,
            _ => {}
        }
    }

    pub fn cancel(&mut self) {
        self.next = None;
    }

    /// Fires at most once per call, however late `now` is.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next {
            Some(at) if now >= at => {
                self.next = Some(now + self.period);
                true
            }
            _ => false,
        }
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new(TICK_PERIOD)
    }
}

/// One-shot timer.
#[derive(Debug, Clone, Default)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    pub fn set(&mut self, now: Instant, after: Duration) {
        self.at = Some(now + after);
    }

    pub fn cancel(&mut self) {
        self.at = None;
    }

    pub fn is_pending(&self) -> bool {
        self.at.is_some()
    }

    pub fn at(&self) -> Option<Instant> {
        self.at
    }

    /// True exactly once, on the first poll at or after the deadline.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.at {
            Some(at) if now >= at => {
                self.at = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_per_period() {
        let t0 = Instant::now();
        let mut ticker = Ticker::default();
        ticker.sync(true, t0);

        assert!(!ticker.poll(t0 + Duration::from_millis(999)));
        assert!(ticker.poll(t0 + Duration::from_secs(1)));
        assert!(!ticker.poll(t0 + Duration::from_millis(1500)));
        assert!(ticker.poll(t0 + Duration::from_secs(2)));
    }

    #[test]
    fn late_polls_do_not_catch_up() {
        let t0 = Instant::now();
        let mut ticker = Ticker::default();
        ticker.sync(true, t0);

        let late = t0 + Duration::from_secs(5);
        assert!(ticker.poll(late));
        assert!(!ticker.poll(late));
        assert_eq!(ticker.next_fire(), Some(late + TICK_PERIOD));
    }

    #[test]
    fn sync_keeps_schedule_and_cancels_when_inactive() {
        let t0 = Instant::now();
        let mut ticker = Ticker::default();
        ticker.sync(true, t0);
        ticker.sync(true, t0 + Duration::from_millis(500));
        assert_eq!(ticker.next_fire(), Some(t0 + TICK_PERIOD));

        ticker.sync(false, t0);
        assert_eq!(ticker.next_fire(), None);
        assert!(!ticker.poll(t0 + Duration::from_secs(10)));
    }

    #[test]
    fn deadline_fires_exactly_once() {
        let t0 = Instant::now();
        let mut deadline = Deadline::default();
        deadline.set(t0, Duration::from_secs(3));

        assert!(!deadline.poll(t0 + Duration::from_secs(2)));
        assert!(deadline.poll(t0 + Duration::from_secs(3)));
        assert!(!deadline.poll(t0 + Duration::from_secs(4)));
        assert!(!deadline.is_pending());
    }

    #[test]
    fn cancelled_deadline_never_fires() {
        let t0 = Instant::now();
        let mut deadline = Deadline::default();
        deadline.set(t0, Duration::from_secs(3));
        deadline.cancel();
        assert!(!deadline.poll(t0 + Duration::from_secs(10)));
    }
}
