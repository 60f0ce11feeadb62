use crate::scheduler::ActiveCharacter;
use std::time::Instant;

/// Whole-word expiry check: a single overdue character fails the word.
pub fn word_expired(active: &[ActiveCharacter], now: Instant) -> bool {
    active.iter().any(|c| c.is_expired(now))
}

/// Number of active characters past their deadline.
pub fn stale_count(active: &[ActiveCharacter], now: Instant) -> usize {
    active.iter().filter(|c| c.is_expired(now)).count()
}
