use brailler::game::Effect;
use std::time::{Duration, Instant};

/// Dots wait this long before flying into place.
pub const ENTRY_DELAY: Duration = Duration::from_millis(500);
pub const ENTRY_DURATION: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy)]
struct FlyIn {
    index: usize,
    started_at: Instant,
    reported: bool,
}

/// Entry animations of the characters on screen. Each spawned index reports
/// completion exactly once.
#[derive(Debug, Default)]
pub struct AnimationTracker {
    flights: Vec<FlyIn>,
}

impl AnimationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_effect(&mut self, effect: &Effect, now: Instant) {
        match effect {
            Effect::NewWord(_) | Effect::PhaseChanged(_) => self.clear(),
            Effect::Spawned { index, .. } => self.flights.push(FlyIn {
                index: *index,
                started_at: now,
                reported: false,
            }),
            _ => {}
        }
    }

    pub fn clear(&mut self) {
        self.flights.clear();
    }

    /// 0.0 until the delay passes, then linear up to 1.0.
    pub fn entry_progress(&self, index: usize, now: Instant) -> f64 {
        let Some(flight) = self.flights.iter().find(|f| f.index == index) else {
            return 1.0;
        };

        let elapsed = now.saturating_duration_since(flight.started_at);
        if elapsed <= ENTRY_DELAY {
            return 0.0;
        }
        ((elapsed - ENTRY_DELAY).as_secs_f64() / ENTRY_DURATION.as_secs_f64()).min(1.0)
    }

    /// Indices whose entry animation finished since the last call.
    pub fn update(&mut self, now: Instant) -> Vec<usize> {
        self.flights
            .iter_mut()
            .filter(|f| {
                !f.reported && now.saturating_duration_since(f.started_at) >= ENTRY_DELAY + ENTRY_DURATION
            })
            .map(|f| {
                f.reported = true;
                f.index
            })
            .collect()
    }
}
