use crate::gateway::kurobbs::{mapper, KurobbsApi};
use crate::gateway::types::{Envelope, PostDetail, PostSummary};

use super::engagement::EngagementMachine;
use super::orchestrator::primary_role;
use super::retry::{Jitter, RetryOutcome, RetryPolicy};
use super::types::{FailureKind, Stage, StageFailure, WorkflowOutcome};

/// Posts from the listing that may be opened.
pub const MAX_POSTS_TO_READ: u32 = 5;

/// Post details that must load before the post is shared.
pub const REQUIRED_READS: u32 = 3;

/// Browse the forum, read posts, share one and toggle a like on it.
///
/// Sub-steps depend on each other: the first decisive failure is recorded
/// and the rest of the task is skipped.
pub struct ForumTask<'a> {
    api: &'a KurobbsApi<'a>,
    jitter: Jitter,
}

impl<'a> ForumTask<'a> {
    pub fn new(api: &'a KurobbsApi<'a>, jitter: Jitter) -> Self {
        Self { api, jitter }
    }

    pub async fn run(&self, outcome: &mut WorkflowOutcome) {
        if let Err(failure) = self.execute(outcome).await {
            outcome.record_failure(failure);
        }
    }

    async fn execute(&self, outcome: &mut WorkflowOutcome) -> Result<(), StageFailure> {
        let posts = self.list_posts().await?;
        outcome.record_success(Stage::ForumList);

        let detail = self.read_posts(&posts).await?;
        outcome.record_success(Stage::PostDetail);

        self.share(&detail).await?;
        outcome.record_success(Stage::SharePost);

        self.toggle_like(&detail).await?;
        outcome.record_success(Stage::LikePost);

        Ok(())
    }

    async fn list_posts(&self) -> Result<Vec<PostSummary>, StageFailure> {
        let role = primary_role(self.api, Stage::ForumList).await?;
        tracing::info!(game_id = role.game_id(), forum_id = role.forum_id(), "Listing forum posts");

        let reply = self.api.forum_list(&role).await;
        if !reply.is_success() {
            return Err(StageFailure::rejected(Stage::ForumList, &reply));
        }

        let posts = mapper::map_post_list(&reply)
            .map_err(|e| StageFailure::precondition(Stage::ForumList, e.to_string()))?;
        if posts.is_empty() {
            return Err(StageFailure::precondition(
                Stage::ForumList,
                "listing returned no posts",
            ));
        }

        Ok(posts)
    }

    async fn read_posts(&self, posts: &[PostSummary]) -> Result<PostDetail, StageFailure> {
        let max_attempts = MAX_POSTS_TO_READ.min(posts.len() as u32);
        let policy = RetryPolicy::new(REQUIRED_READS, max_attempts, self.jitter);
        let api = self.api;

        let result = policy
            .run(move |i| api.post_detail(&posts[i as usize]))
            .await;
        let last = exhausted_unless_reached(Stage::PostDetail, result)?;

        mapper::map_post_detail(&last)
            .map_err(|e| StageFailure::precondition(Stage::PostDetail, e.to_string()))
    }

    async fn share(&self, detail: &PostDetail) -> Result<(), StageFailure> {
        let policy = RetryPolicy::new(1, 1, self.jitter);
        let api = self.api;

        let result = policy.run(move |_| api.share(detail)).await;
        exhausted_unless_reached(Stage::SharePost, result).map(|_| ())
    }

    async fn toggle_like(&self, detail: &PostDetail) -> Result<(), StageFailure> {
        let machine = EngagementMachine::new(self.jitter);
        let api = self.api;

        let result = machine.run(move |op| api.like(detail, op)).await;
        exhausted_unless_reached(Stage::LikePost, result).map(|_| ())
    }
}

fn exhausted_unless_reached(
    stage: Stage,
    result: RetryOutcome,
) -> Result<Envelope, StageFailure> {
    let reason = result.last_message();
    match result.last_result {
        Some(last) if result.reached => Ok(last),
        _ => {
            tracing::debug!(
                stage = %stage,
                attempts = result.attempts_used,
                successes = result.successes,
                "Attempt budget exhausted"
            );
            Err(StageFailure::new(stage, FailureKind::Exhausted, reason))
        }
    }
}
