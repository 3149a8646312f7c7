use std::future::Future;

use crate::gateway::types::{Envelope, LikeOperation};

use super::retry::{Jitter, RetryOutcome};

/// Full like→unlike cycles required by the forum task.
pub const REQUIRED_CYCLES: u32 = 5;

/// Iterations allowed to complete them.
pub const MAX_ITERATIONS: u32 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleState {
    ReadyToLike,
    ReadyToUnlike,
}

/// Alternates like and unlike calls on one post.
///
/// A cycle counts only once its unlike succeeds. A failed like leaves the
/// machine in [`ToggleState::ReadyToLike`]; a failed unlike leaves it in
/// [`ToggleState::ReadyToUnlike`] so the next iteration retries the unlike
/// instead of liking again.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngagementMachine {
    pub required: u32,
    pub max_iterations: u32,
    pub jitter: Jitter,
}

impl EngagementMachine {
    pub fn new(jitter: Jitter) -> Self {
        Self {
            required: REQUIRED_CYCLES,
            max_iterations: MAX_ITERATIONS,
            jitter,
        }
    }

    pub fn with_budget(required: u32, max_iterations: u32, jitter: Jitter) -> Self {
        Self {
            required,
            max_iterations,
            jitter,
        }
    }

    pub async fn run<F, Fut>(&self, mut toggle: F) -> RetryOutcome
    where
        F: FnMut(LikeOperation) -> Fut,
        Fut: Future<Output = Envelope>,
    {
        let mut state = ToggleState::ReadyToLike;
        let mut outcome = RetryOutcome {
            attempts_used: 0,
            successes: 0,
            last_result: None,
            reached: self.required == 0,
        };

        while !outcome.reached && outcome.attempts_used < self.max_iterations {
            if state == ToggleState::ReadyToLike {
                let liked = toggle(LikeOperation::Like).await;
                let ok = liked.is_success();
                outcome.last_result = Some(liked);
                if ok {
                    state = ToggleState::ReadyToUnlike;
                    self.jitter.pause().await;
                }
            }

            if state == ToggleState::ReadyToUnlike {
                let unliked = toggle(LikeOperation::Unlike).await;
                if unliked.is_success() {
                    outcome.successes += 1;
                    state = ToggleState::ReadyToLike;
                }
                outcome.last_result = Some(unliked);
            }

            self.jitter.pause().await;
            outcome.attempts_used += 1;
            outcome.reached = outcome.successes >= self.required;

            tracing::debug!(
                iteration = outcome.attempts_used,
                cycles = outcome.successes,
                state = ?state,
                "Like toggle iteration finished"
            );
        }

        outcome
    }
}
