use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Which rate limiter a caller is asking about. Command re-invocation and
/// selection commits cool down independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownKind {
    Command,
    Selection,
}

/// Per-player rate limiters keyed by session slot. `try_acquire` is an
/// atomic check-and-set: two racing events for the same slot can never both
/// observe an expired deadline.
#[derive(Debug)]
pub struct CooldownGate {
    command: DashMap<i32, Instant>,
    selection: DashMap<i32, Instant>,
    command_window: Duration,
    selection_window: Duration,
}

impl CooldownGate {
    pub fn new(command_window: Duration, selection_window: Duration) -> Self {
        Self {
            command: DashMap::new(),
            selection: DashMap::new(),
            command_window,
            selection_window,
        }
    }

    /// Ok resets the deadline to `now + window`. Err carries the remaining
    /// wait and leaves the stored deadline untouched; being throttled is a
    /// normal outcome, not an error.
    pub fn try_acquire(&self, kind: CooldownKind, slot: i32, now: Instant) -> Result<(), Duration> {
        let (map, window) = match kind {
            CooldownKind::Command => (&self.command, self.command_window),
            CooldownKind::Selection => (&self.selection, self.selection_window),
        };
        match map.entry(slot) {
            Entry::Occupied(mut occupied) => {
                let deadline = *occupied.get();
                if now < deadline {
                    return Err(deadline - now);
                }
                occupied.insert(now + window);
                Ok(())
            }
            Entry::Vacant(vacant) => {
                vacant.insert(now + window);
                Ok(())
            }
        }
    }

    /// Forgets a slot's deadlines so a reused slot starts clean.
    pub fn clear(&self, slot: i32) {
        self.command.remove(&slot);
        self.selection.remove(&slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> CooldownGate {
        CooldownGate::new(Duration::from_secs(30), Duration::from_secs(5))
    }

    #[test]
    fn first_acquire_succeeds_and_arms_the_window() {
        let gate = gate();
        let now = Instant::now();
        assert!(gate.try_acquire(CooldownKind::Selection, 1, now).is_ok());

        let remaining = gate
            .try_acquire(CooldownKind::Selection, 1, now + Duration::from_secs(2))
            .unwrap_err();
        assert!(remaining > Duration::ZERO);
        assert!(remaining < Duration::from_secs(5));
        assert_eq!(remaining, Duration::from_secs(3));
    }

    #[test]
    fn failed_acquire_does_not_extend_the_deadline() {
        let gate = gate();
        let now = Instant::now();
        gate.try_acquire(CooldownKind::Selection, 1, now).unwrap();
        let _ = gate.try_acquire(CooldownKind::Selection, 1, now + Duration::from_secs(1));
        assert!(
            gate.try_acquire(CooldownKind::Selection, 1, now + Duration::from_secs(5))
                .is_ok()
        );
    }

    #[test]
    fn keyspaces_are_independent() {
        let gate = gate();
        let now = Instant::now();
        gate.try_acquire(CooldownKind::Selection, 1, now).unwrap();
        assert!(gate.try_acquire(CooldownKind::Command, 1, now).is_ok());
    }

    #[test]
    fn slots_are_independent() {
        let gate = gate();
        let now = Instant::now();
        gate.try_acquire(CooldownKind::Command, 1, now).unwrap();
        assert!(gate.try_acquire(CooldownKind::Command, 2, now).is_ok());
    }

    #[test]
    fn clear_resets_a_slot() {
        let gate = gate();
        let now = Instant::now();
        gate.try_acquire(CooldownKind::Selection, 1, now).unwrap();
        gate.clear(1);
        assert!(gate.try_acquire(CooldownKind::Selection, 1, now).is_ok());
    }
}
