use std::fmt;

use crate::gateway::types::Envelope;

/// Recorded steps of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    CheckIn,
    SignIn,
    ForumList,
    PostDetail,
    SharePost,
    LikePost,
}

impl Stage {
    pub fn key(self) -> &'static str {
        match self {
            Stage::CheckIn => "checkin",
            Stage::SignIn => "sign_in",
            Stage::ForumList => "forum_list",
            Stage::PostDetail => "post_detail",
            Stage::SharePost => "share_post",
            Stage::LikePost => "like_post",
        }
    }

    pub fn success_message(self) -> &'static str {
        match self {
            Stage::CheckIn => "Check-in reward claimed",
            Stage::SignIn => "Community sign-in done",
            Stage::ForumList => "Forum posts listed",
            Stage::PostDetail => "Posts read",
            Stage::SharePost => "Post shared",
            Stage::LikePost => "Post liked",
        }
    }

    pub fn failure_message(self) -> &'static str {
        match self {
            Stage::CheckIn => "Check-in reward failed",
            Stage::SignIn => "Community sign-in failed",
            Stage::ForumList => "Listing forum posts failed",
            Stage::PostDetail => "Reading posts failed",
            Stage::SharePost => "Sharing post failed",
            Stage::LikePost => "Liking post failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Why a stage gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The single call the stage makes was not successful.
    Rejected,
    /// The retry or toggle budget ran out before enough successes.
    Exhausted,
    /// Input the stage depends on was absent or malformed.
    Precondition,
}

/// A decisive failure of one stage. Recorded, never raised on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFailure {
    pub stage: Stage,
    pub kind: FailureKind,
    pub reason: String,
}

impl StageFailure {
    pub fn new(stage: Stage, kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            stage,
            kind,
            reason: reason.into(),
        }
    }

    pub fn rejected(stage: Stage, envelope: &Envelope) -> Self {
        Self::new(stage, FailureKind::Rejected, envelope.msg.clone())
    }

    pub fn precondition(stage: Stage, reason: impl Into<String>) -> Self {
        Self::new(stage, FailureKind::Precondition, reason)
    }
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.stage.failure_message(), self.reason)
    }
}

/// Every stage failure of a run, raised once after all stages ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateFailure {
    pub failures: Vec<StageFailure>,
}

impl fmt::Display for AggregateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.failures.iter().map(|e| e.to_string()).collect();
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for AggregateFailure {}

/// Accumulated result of one run.
#[derive(Debug, Default)]
pub struct WorkflowOutcome {
    successes: Vec<(Stage, String)>,
    failures: Vec<StageFailure>,
}

impl WorkflowOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a stage success. A stage recorded twice keeps its first
    /// position and takes the latest message.
    pub fn record_success(&mut self, stage: Stage) {
        let message = stage.success_message().to_string();
        tracing::info!(stage = %stage, "{message}");
        match self.successes.iter_mut().find(|(s, _)| *s == stage) {
            Some(entry) => entry.1 = message,
            None => self.successes.push((stage, message)),
        }
    }

    pub fn record_failure(&mut self, failure: StageFailure) {
        tracing::warn!(
            stage = %failure.stage,
            kind = ?failure.kind,
            reason = %failure.reason,
            "Stage failed"
        );
        self.failures.push(failure);
    }

    pub fn record(&mut self, stage: Stage, result: Result<(), StageFailure>) {
        match result {
            Ok(()) => self.record_success(stage),
            Err(failure) => self.record_failure(failure),
        }
    }

    pub fn successes(&self) -> impl Iterator<Item = (Stage, &str)> {
        self.successes.iter().map(|(s, m)| (*s, m.as_str()))
    }

    pub fn failures(&self) -> &[StageFailure] {
        &self.failures
    }

    pub fn is_success(&self, stage: Stage) -> bool {
        self.successes.iter().any(|(s, _)| *s == stage)
    }

    /// Success messages joined in execution order, or `None` when nothing
    /// succeeded.
    pub fn summary(&self) -> Option<String> {
        if self.successes.is_empty() {
            return None;
        }
        let messages: Vec<&str> = self.successes.iter().map(|(_, m)| m.as_str()).collect();
        Some(format!("{}!", messages.join(", ")))
    }

    /// Consume the outcome: the summary when every stage succeeded,
    /// otherwise the aggregate of all recorded failures.
    pub fn into_result(self) -> Result<Option<String>, AggregateFailure> {
        if self.failures.is_empty() {
            Ok(self.summary())
        } else {
            Err(AggregateFailure {
                failures: self.failures,
            })
        }
    }
}
