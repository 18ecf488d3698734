use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Pausable match clock.
///
/// Elapsed time is derived from timestamps rather than counted ticks, so a
/// restored clock keeps running from where the last snapshot left it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MatchClock {
    running_since: Option<DateTime<Utc>>,
    accumulated_ms: i64,
}

impl MatchClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets and starts counting from `now`
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.accumulated_ms = 0;
        self.running_since = Some(now);
    }

    pub fn pause(&mut self, now: DateTime<Utc>) {
        if let Some(since) = self.running_since.take() {
            self.accumulated_ms = self.accumulated_ms.saturating_add(running_ms(since, now));
        }
    }

    pub fn resume(&mut self, now: DateTime<Utc>) {
        if self.running_since.is_none() {
            self.running_since = Some(now);
        }
    }

    pub fn stop(&mut self, now: DateTime<Utc>) {
        self.pause(now);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        let running = self
            .running_since
            .map(|since| running_ms(since, now))
            .unwrap_or_default();
        let total = self.accumulated_ms.saturating_add(running).min(MAX_ELAPSED_MS);
        Duration::try_milliseconds(total).unwrap_or_default()
    }

    /// Clamps restored values: accumulated time into `0..=MAX_ELAPSED_MS`,
    /// and a start time in the future back to `now`.
    pub fn normalize(&mut self, now: DateTime<Utc>) {
        self.accumulated_ms = self.accumulated_ms.clamp(0, MAX_ELAPSED_MS);
        if let Some(since) = self.running_since {
            if since > now {
                self.running_since = Some(now);
            }
        }
    }
}

/// Upper bound on reported match time (one year)
pub const MAX_ELAPSED_MS: i64 = 365 * 24 * 60 * 60 * 1000;

fn running_ms(since: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    now.signed_duration_since(since).num_milliseconds().max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000 + seconds, 0).unwrap()
    }

    #[test]
    fn elapsed_excludes_paused_time() {
        let mut clock = MatchClock::new();
        clock.start(at(0));
        clock.pause(at(30));
        clock.resume(at(90));

        assert!(clock.is_running());
        assert_eq!(clock.elapsed(at(100)).num_seconds(), 40);
    }

    #[test]
    fn stop_freezes_elapsed_time() {
        let mut clock = MatchClock::new();
        clock.start(at(0));
        clock.stop(at(12));

        assert!(!clock.is_running());
        assert_eq!(clock.elapsed(at(500)).num_seconds(), 12);
    }

    #[test]
    fn huge_accumulated_time_does_not_overflow() {
        let clock = MatchClock {
            running_since: Some(at(-1_000_000)),
            accumulated_ms: i64::MAX,
        };

        assert_eq!(clock.elapsed(at(0)).num_milliseconds(), MAX_ELAPSED_MS);
    }

    #[test]
    fn normalize_clamps_restored_values() {
        let mut clock = MatchClock {
            running_since: Some(at(600)),
            accumulated_ms: -40,
        };
        clock.normalize(at(0));

        assert_eq!(clock.accumulated_ms, 0);
        assert_eq!(clock.elapsed(at(5)).num_seconds(), 5);

        let mut clock = MatchClock {
            running_since: None,
            accumulated_ms: i64::MAX,
        };
        clock.normalize(at(0));
        assert_eq!(clock.accumulated_ms, MAX_ELAPSED_MS);
    }

    #[test]
    fn resume_while_running_is_ignored() {
        let mut clock = MatchClock::new();
        clock.start(at(0));
        clock.resume(at(50));

        assert_eq!(clock.elapsed(at(60)).num_seconds(), 60);
    }
}
