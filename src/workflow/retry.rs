use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::config::PacingConfig;
use crate::gateway::types::Envelope;

/// Random pause inserted between remote calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Jitter {
    min: Duration,
    max: Duration,
}

impl Jitter {
    pub fn new(min: Duration, max: Duration) -> Self {
        if max < min {
            Self { min: max, max: min }
        } else {
            Self { min, max }
        }
    }

    pub fn from_secs_f64(min: f64, max: f64) -> Self {
        Self::new(
            Duration::from_secs_f64(min.max(0.0)),
            Duration::from_secs_f64(max.max(0.0)),
        )
    }

    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// Uniform sample from `[min, max]`.
    pub fn sample(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let secs = rand::rng().random_range(self.min.as_secs_f64()..=self.max.as_secs_f64());
        Duration::from_secs_f64(secs)
    }

    pub async fn pause(&self) {
        let delay = self.sample();
        if delay.is_zero() {
            return;
        }
        tracing::debug!(delay_ms = delay.as_millis() as u64, "Pacing before next call");
        tokio::time::sleep(delay).await;
    }
}

impl From<&PacingConfig> for Jitter {
    fn from(config: &PacingConfig) -> Self {
        Self::from_secs_f64(config.jitter_min_secs, config.jitter_max_secs)
    }
}

/// Result of driving an action through a [`RetryPolicy`].
#[derive(Debug, Clone, PartialEq)]
pub struct RetryOutcome {
    pub attempts_used: u32,
    pub successes: u32,
    /// Envelope of the final attempt; `None` only when no attempt was made.
    pub last_result: Option<Envelope>,
    pub reached: bool,
}

impl RetryOutcome {
    /// Message explaining the last attempt's outcome.
    pub fn last_message(&self) -> String {
        self.last_result
            .as_ref()
            .map(|e| e.msg.clone())
            .unwrap_or_else(|| "no attempt was made".to_string())
    }
}

/// Attempt an action up to `max_attempts` times until it has succeeded
/// `required` times, pausing between attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub required: u32,
    pub max_attempts: u32,
    pub jitter: Jitter,
}

impl RetryPolicy {
    pub fn new(required: u32, max_attempts: u32, jitter: Jitter) -> Self {
        Self {
            required,
            max_attempts,
            jitter,
        }
    }

    /// Run `action`, passing the zero-based attempt index.
    ///
    /// Stops as soon as the success threshold is met; otherwise every attempt,
    /// including the last, is followed by a pause.
    pub async fn run<F, Fut>(&self, mut action: F) -> RetryOutcome
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Envelope>,
    {
        let mut outcome = RetryOutcome {
            attempts_used: 0,
            successes: 0,
            last_result: None,
            reached: self.required == 0,
        };

        while !outcome.reached && outcome.attempts_used < self.max_attempts {
            let envelope = action(outcome.attempts_used).await;
            outcome.attempts_used += 1;
            if envelope.is_success() {
                outcome.successes += 1;
            }

            tracing::debug!(
                attempt = outcome.attempts_used,
                max_attempts = self.max_attempts,
                successes = outcome.successes,
                required = self.required,
                ok = envelope.is_success(),
                "Retry attempt finished"
            );

            outcome.last_result = Some(envelope);
            outcome.reached = outcome.successes >= self.required;

            if !outcome.reached {
                self.jitter.pause().await;
            }
        }

        outcome
    }
}
