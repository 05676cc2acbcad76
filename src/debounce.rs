use std::time::{Duration, Instant};

/// Holds back a value until no newer value has arrived for a fixed idle
/// period.  Pushing a value replaces the held one and restarts the period.
#[derive(Clone, Debug)]
pub struct Debouncer<T> {
    idle: Duration,
    pending: Option<Pending<T>>,
}

#[derive(Clone, Debug)]
struct Pending<T> {
    value: T,
    deadline: Instant,
}

impl<T> Debouncer<T> {
    pub fn new(idle: Duration) -> Debouncer<T> {
        Debouncer {
            idle,
            pending: None,
        }
    }

    pub fn push(&mut self, value: T, now: Instant) {
        let deadline = now.checked_add(self.idle).unwrap_or(now);
        self.pending = Some(Pending { value, deadline });
    }

    /// The value that will be released next
    pub fn last_value(&self) -> Option<&T> {
        self.pending.as_ref().map(|p| &p.value)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.pending.as_ref().is_some_and(|p| p.deadline <= now)
    }

    /// Release the held value if its idle period has passed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        if self.is_due(now) {
            self.flush()
        } else {
            None
        }
    }

    /// Release the held value immediately
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|p| p.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDLE: Duration = Duration::from_millis(500);

    #[test]
    fn test_burst_yields_last_value_once() {
        let mut saves = Vec::new();
        let mut debouncer = Debouncer::new(IDLE);
        let t0 = Instant::now();
        debouncer.push("a", t0);
        debouncer.push("b", t0 + Duration::from_millis(100));
        debouncer.push("c", t0 + Duration::from_millis(200));
        for ms in (0..2000).step_by(50) {
            if let Some(v) = debouncer.poll(t0 + Duration::from_millis(ms)) {
                saves.push(v);
            }
        }
        assert_eq!(saves, ["c"]);
    }

    #[test]
    fn test_push_restarts_idle_period() {
        let mut debouncer = Debouncer::new(IDLE);
        let t0 = Instant::now();
        debouncer.push(1, t0);
        assert_eq!(debouncer.deadline(), Some(t0 + IDLE));
        let t1 = t0 + Duration::from_millis(400);
        debouncer.push(2, t1);
        assert_eq!(debouncer.poll(t0 + IDLE), None);
        assert_eq!(debouncer.last_value(), Some(&2));
        assert_eq!(debouncer.poll(t1 + IDLE), Some(2));
        assert_eq!(debouncer.last_value(), None);
        assert_eq!(debouncer.poll(t1 + IDLE * 4), None);
    }

    #[test]
    fn test_flush() {
        let mut debouncer = Debouncer::new(IDLE);
        assert_eq!(debouncer.flush(), None::<u8>);
        debouncer.push(7, Instant::now());
        assert_eq!(debouncer.flush(), Some(7));
        assert_eq!(debouncer.deadline(), None);
    }
}
