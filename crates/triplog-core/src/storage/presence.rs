//! Bounded-rate storage presence polling.

use crate::config::PRESENCE_POLL_MS;

use super::StorageMedium;

/// An insertion-state transition observed by a poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresenceChange {
    Inserted,
    Removed,
}

/// Polls the medium no more often than the configured interval and reports
/// transitions. Presence state is mutated here and nowhere else.
pub struct PresenceMonitor {
    inserted: bool,
    last_probe_ms: Option<u64>,
}

impl PresenceMonitor {
    pub const fn new() -> Self {
        Self {
            inserted: false,
            last_probe_ms: None,
        }
    }

    pub fn inserted(&self) -> bool {
        self.inserted
    }

    /// Probe if the polling interval has elapsed; returns the transition if
    /// this poll observed one.
    pub fn poll<M: StorageMedium>(
        &mut self,
        medium: &mut M,
        now_ms: u64,
    ) -> Option<PresenceChange> {
        if let Some(last) = self.last_probe_ms {
            if now_ms.wrapping_sub(last) < PRESENCE_POLL_MS {
                return None;
            }
        }
        self.last_probe_ms = Some(now_ms);

        let present = medium.probe();
        if present == self.inserted {
            return None;
        }
        self.inserted = present;
        Some(if present {
            PresenceChange::Inserted
        } else {
            PresenceChange::Removed
        })
    }
}

impl Default for PresenceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::mock::MockMedium;

    #[test]
    fn first_poll_probes_and_reports_insertion() {
        let mut medium = MockMedium::with_card();
        let mut monitor = PresenceMonitor::new();

        assert_eq!(monitor.poll(&mut medium, 0), Some(PresenceChange::Inserted));
        assert!(monitor.inserted());
        assert_eq!(medium.probes, 1);
    }

    #[test]
    fn probes_are_rate_limited() {
        let mut medium = MockMedium::with_card();
        let mut monitor = PresenceMonitor::new();

        monitor.poll(&mut medium, 0);
        assert_eq!(monitor.poll(&mut medium, PRESENCE_POLL_MS - 1), None);
        assert_eq!(medium.probes, 1);

        monitor.poll(&mut medium, PRESENCE_POLL_MS);
        assert_eq!(medium.probes, 2);
    }

    #[test]
    fn removal_and_reinsertion_are_both_reported() {
        let mut medium = MockMedium::with_card();
        let mut monitor = PresenceMonitor::new();

        monitor.poll(&mut medium, 0);
        medium.inserted = false;
        assert_eq!(
            monitor.poll(&mut medium, PRESENCE_POLL_MS),
            Some(PresenceChange::Removed)
        );

        medium.inserted = true;
        assert_eq!(
            monitor.poll(&mut medium, 2 * PRESENCE_POLL_MS),
            Some(PresenceChange::Inserted)
        );
    }

    #[test]
    fn steady_state_reports_nothing() {
        let mut medium = MockMedium::with_card();
        let mut monitor = PresenceMonitor::new();

        monitor.poll(&mut medium, 0);
        assert_eq!(monitor.poll(&mut medium, PRESENCE_POLL_MS), None);
        assert_eq!(monitor.poll(&mut medium, 2 * PRESENCE_POLL_MS), None);
    }
}
