use std::time::Duration;

/// Pause between revealing the answer and applying a mark made on a hidden card.
pub const DEFAULT_REVEAL_DELAY: Duration = Duration::from_millis(600);

/// Tunables for a study session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    reveal_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reveal_delay: DEFAULT_REVEAL_DELAY,
        }
    }
}

impl SessionConfig {
    /// Config that commits marks immediately, without the reveal pause.
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            reveal_delay: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn with_reveal_delay(mut self, delay: Duration) -> Self {
        self.reveal_delay = delay;
        self
    }

    #[must_use]
    pub fn reveal_delay(&self) -> Duration {
        self.reveal_delay
    }

    /// Returns true when marks on a hidden card are deferred.
    #[must_use]
    pub fn defers_marks(&self) -> bool {
        !self.reveal_delay.is_zero()
    }
}
