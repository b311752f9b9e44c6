use std::time::{Duration, Instant};

/// Cooldown gate between consecutive report attempts.
///
/// The gate is purely time-based: payload identity never enters into it. The
/// loop must `commit` after every attempted report that passed the gate,
/// success or failure alike, and never on a gated-out tick.
#[derive(Debug, Clone)]
pub struct ScanDebouncer {
    last_scan: Option<Instant>,
    cooldown: Duration,
}

impl ScanDebouncer {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            last_scan: None,
            cooldown,
        }
    }

    pub fn with_last_scan(cooldown: Duration, last_scan: Instant) -> Self {
        Self {
            last_scan: Some(last_scan),
            cooldown,
        }
    }

    /// True iff more than `cooldown` has elapsed since the last commit.
    /// No side effect.
    pub fn should_report(&self, now: Instant) -> bool {
        match self.last_scan {
            None => true,
            Some(last) => now.saturating_duration_since(last) > self.cooldown,
        }
    }

    pub fn commit(&mut self, now: Instant) {
        self.last_scan = Some(now);
    }

    pub fn last_scan(&self) -> Option<Instant> {
        self.last_scan
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_scan_always_passes() {
        let debounce = ScanDebouncer::new(Duration::from_secs(3));
        assert!(debounce.should_report(Instant::now()));
    }

    #[test]
    fn boundary_is_strict() {
        let base = Instant::now();
        let cooldown = Duration::from_secs(3);
        let debounce = ScanDebouncer::with_last_scan(cooldown, base);

        assert!(!debounce.should_report(base + cooldown));
        assert!(debounce.should_report(base + cooldown + Duration::from_millis(1)));
    }

    #[test]
    fn commit_closes_the_gate_immediately() {
        let base = Instant::now();
        let mut debounce = ScanDebouncer::new(Duration::ZERO);

        assert!(debounce.should_report(base));
        debounce.commit(base);
        // Even a zero cooldown blocks a re-check at the same instant.
        assert!(!debounce.should_report(base));
        assert!(debounce.should_report(base + Duration::from_nanos(1)));
    }

    #[test]
    fn predicate_has_no_side_effect() {
        let base = Instant::now();
        let debounce = ScanDebouncer::new(Duration::from_secs(3));

        for _ in 0..3 {
            assert!(debounce.should_report(base));
        }
        assert!(debounce.last_scan().is_none());
    }
}
