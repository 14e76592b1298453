use std::time::{Duration, Instant};

/// Inactivity window before a search term takes effect.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(400);

/// Coalesces a stream of raw input values into one committed value per
/// burst: every new input supersedes the pending one and restarts the
/// delay. Time is passed in by the caller, so the stage is not tied to
/// any particular clock or event loop.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<Pending>,
}

#[derive(Debug)]
struct Pending {
    value: String,
    deadline: Instant,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    /// Record a raw input. Cancels any pending value.
    pub fn input(&mut self, value: impl Into<String>, now: Instant) {
        self.pending = Some(Pending {
            value: value.into(),
            deadline: now + self.delay,
        });
    }

    /// Deadline of the pending value, if any. Drivers sleep until this.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// Emit the pending value once its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match &self.pending {
            Some(pending) if now >= pending.deadline => self.pending.take().map(|p| p.value),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(400);

    #[test]
    fn test_nothing_pending_initially() {
        let mut debouncer = Debouncer::new(DELAY);
        assert!(debouncer.is_idle());
        assert_eq!(debouncer.poll(Instant::now()), None);
    }

    #[test]
    fn test_value_held_until_deadline() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);

        debouncer.input("tem", start);
        assert_eq!(debouncer.poll(start + Duration::from_millis(399)), None);
        assert_eq!(debouncer.poll(start + DELAY), Some("tem".to_string()));
        assert!(debouncer.is_idle());
    }

    #[test]
    fn test_superseding_input_restarts_the_delay() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);

        debouncer.input("tem", start);
        debouncer.input("temple", start + Duration::from_millis(300));

        // The first value's deadline passes but it was superseded.
        assert_eq!(debouncer.poll(start + DELAY), None);
        assert_eq!(
            debouncer.poll(start + Duration::from_millis(700)),
            Some("temple".to_string())
        );
    }

    #[test]
    fn test_emits_once_per_burst() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);

        debouncer.input("temple", start);
        assert_eq!(debouncer.poll(start + DELAY), Some("temple".to_string()));
        assert_eq!(debouncer.poll(start + DELAY * 2), None);
    }
}
