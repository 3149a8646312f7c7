use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::gateway::kurobbs::api::request_month;
use crate::gateway::kurobbs::{mapper, KurobbsApi};
use crate::gateway::types::Role;
use crate::gateway::Gateway;
use crate::notify::Notifier;

use super::forum::ForumTask;
use super::retry::Jitter;
use super::types::{Stage, StageFailure, WorkflowOutcome};

/// First role bound to the account, needed by `stage`.
pub(crate) async fn primary_role(
    api: &KurobbsApi<'_>,
    stage: Stage,
) -> std::result::Result<Role, StageFailure> {
    let reply = api.role_list().await;
    if !reply.is_success() {
        return Err(StageFailure::precondition(
            stage,
            format!("role lookup failed: {}", reply.msg),
        ));
    }

    let roles = mapper::map_roles(&reply)
        .map_err(|e| StageFailure::precondition(stage, format!("role lookup failed: {e}")))?;

    roles
        .into_iter()
        .next()
        .ok_or_else(|| StageFailure::precondition(stage, "account has no game roles"))
}

/// Runs check-in, community sign-in and the forum task for one account.
pub struct Orchestrator<'a> {
    api: KurobbsApi<'a>,
    jitter: Jitter,
    clock: fn() -> DateTime<Utc>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(gateway: &'a dyn Gateway, jitter: Jitter) -> Self {
        Self {
            api: KurobbsApi::new(gateway),
            jitter,
            clock: Utc::now,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Run every stage in order. A failed stage never stops the next one.
    pub async fn run(&self) -> WorkflowOutcome {
        let mut outcome = WorkflowOutcome::new();

        let checked_in = self.check_in().await;
        outcome.record(Stage::CheckIn, checked_in);

        let signed_in = self.sign_in().await;
        outcome.record(Stage::SignIn, signed_in);

        ForumTask::new(&self.api, self.jitter)
            .run(&mut outcome)
            .await;

        outcome
    }

    async fn check_in(&self) -> std::result::Result<(), StageFailure> {
        let role = primary_role(&self.api, Stage::CheckIn).await?;
        let month = request_month((self.clock)());
        tracing::info!(game_id = role.game_id(), month = %month, "Claiming check-in reward");

        let reply = self.api.check_in(&role, &month).await;
        if reply.is_success() {
            Ok(())
        } else {
            Err(StageFailure::rejected(Stage::CheckIn, &reply))
        }
    }

    async fn sign_in(&self) -> std::result::Result<(), StageFailure> {
        let reply = self.api.sign_in().await;
        if reply.is_success() {
            Ok(())
        } else {
            Err(StageFailure::rejected(Stage::SignIn, &reply))
        }
    }
}

/// Deliver the single notification of a run and turn recorded failures into
/// the run's error.
///
/// Returns the summary that was delivered, if any.
pub async fn report(
    outcome: WorkflowOutcome,
    notifier: &dyn Notifier,
) -> Result<Option<String>> {
    let partial_summary = outcome.summary();

    match outcome.into_result() {
        Ok(Some(summary)) => {
            notifier.notify(&summary).await?;
            Ok(Some(summary))
        }
        Ok(None) => {
            tracing::info!("Nothing to report");
            Ok(None)
        }
        Err(aggregate) => {
            if let Some(summary) = partial_summary {
                tracing::info!("{summary}");
            }
            let text = aggregate.to_string();
            tracing::error!(failures = aggregate.failures.len(), "{text}");
            if let Err(e) = notifier.notify(&text).await {
                tracing::error!(error = %e, "Failed to deliver failure notification");
            }
            Err(AppError::Workflow(aggregate))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::types::Endpoint;
    use crate::workflow::testing::{ok_with, rejected, RecordingNotifier, ScriptedGateway};
    use crate::workflow::types::FailureKind;
    use serde_json::json;

    fn script_all_successful(gateway: &ScriptedGateway) {
        gateway.always(
            Endpoint::RoleList,
            ok_with(json!([{"gameId": 3, "serverId": "s1", "roleId": 7, "userId": 8}])),
        );
        gateway.always(Endpoint::CheckIn, ok_with(json!(null)));
        gateway.always(Endpoint::SignIn, ok_with(json!(null)));
        gateway.always(
            Endpoint::ForumList,
            ok_with(json!({"postList": [
                {"postId": 1}, {"postId": 2}, {"postId": 3}, {"postId": 4}, {"postId": 5}
            ]})),
        );
        gateway.always(
            Endpoint::PostDetail,
            ok_with(json!({
                "gameId": 3,
                "postDetail": {"gameForumId": 9, "id": 1, "postType": 1, "postUserId": 99}
            })),
        );
        gateway.always(Endpoint::ShareTask, ok_with(json!(null)));
        gateway.always(Endpoint::Like, ok_with(json!(null)));
    }

    fn fixed_clock() -> DateTime<Utc> {
        use chrono::TimeZone;
        Utc.with_ymd_and_hms(2024, 3, 31, 20, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_all_stages_succeed_in_order() {
        let gateway = ScriptedGateway::new();
        script_all_successful(&gateway);

        for _ in 0..2 {
            let outcome = Orchestrator::new(&gateway, Jitter::none()).run().await;
            let stages: Vec<Stage> = outcome.successes().map(|(s, _)| s).collect();

            assert_eq!(
                stages,
                vec![
                    Stage::CheckIn,
                    Stage::SignIn,
                    Stage::ForumList,
                    Stage::PostDetail,
                    Stage::SharePost,
                    Stage::LikePost,
                ]
            );
            assert!(outcome.failures().is_empty());
            assert_eq!(
                outcome.summary().as_deref(),
                Some("Check-in reward claimed, Community sign-in done, Forum posts listed, Posts read, Post shared, Post liked!")
            );
        }
    }

    #[tokio::test]
    async fn test_check_in_uses_role_and_service_month() {
        let gateway = ScriptedGateway::new();
        script_all_successful(&gateway);

        Orchestrator::new(&gateway, Jitter::none())
            .with_clock(fixed_clock)
            .run()
            .await;

        let form = gateway.forms(Endpoint::CheckIn).remove(0);
        assert!(form.contains(&("reqMonth", "04".to_string())));
        assert!(form.contains(&("serverId", "s1".to_string())));
        assert!(form.contains(&("roleId", "7".to_string())));
    }

    #[tokio::test]
    async fn test_failed_check_in_does_not_stop_later_stages() {
        let gateway = ScriptedGateway::new();
        script_all_successful(&gateway);
        gateway.always(Endpoint::CheckIn, rejected("token expired"));

        let outcome = Orchestrator::new(&gateway, Jitter::none()).run().await;

        assert!(!outcome.is_success(Stage::CheckIn));
        assert!(outcome.is_success(Stage::SignIn));
        assert!(outcome.is_success(Stage::LikePost));
        let summary = outcome.summary().unwrap();
        assert!(summary.contains("Community sign-in done"));
        assert!(summary.contains("Post liked"));

        let aggregate = outcome.into_result().unwrap_err();
        assert_eq!(aggregate.failures.len(), 1);
        assert_eq!(aggregate.failures[0].stage, Stage::CheckIn);
        assert_eq!(aggregate.to_string(), "Check-in reward failed, token expired");
    }

    #[tokio::test]
    async fn test_failed_listing_records_single_forum_failure() {
        let gateway = ScriptedGateway::new();
        script_all_successful(&gateway);
        gateway.always(Endpoint::ForumList, rejected("server busy"));

        let outcome = Orchestrator::new(&gateway, Jitter::none()).run().await;

        assert_eq!(outcome.failures().len(), 1);
        assert_eq!(outcome.failures()[0].stage, Stage::ForumList);
        assert_eq!(gateway.count(Endpoint::ShareTask), 0);
        assert_eq!(gateway.count(Endpoint::Like), 0);
        assert!(outcome.is_success(Stage::CheckIn));
        assert!(outcome.is_success(Stage::SignIn));
    }

    #[tokio::test]
    async fn test_role_lookup_failure_is_precondition_of_each_stage() {
        let gateway = ScriptedGateway::new();
        script_all_successful(&gateway);
        gateway.always(Endpoint::RoleList, ok_with(json!([])));

        let outcome = Orchestrator::new(&gateway, Jitter::none()).run().await;

        let failures = outcome.failures();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].stage, Stage::CheckIn);
        assert_eq!(failures[0].kind, FailureKind::Precondition);
        assert_eq!(failures[1].stage, Stage::ForumList);
        assert!(outcome.is_success(Stage::SignIn));
        assert!(gateway.forms(Endpoint::CheckIn).is_empty());
        assert!(gateway.forms(Endpoint::ForumList).is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_is_recorded_as_stage_failure() {
        let gateway = ScriptedGateway::new();
        script_all_successful(&gateway);
        gateway.always_fail(Endpoint::SignIn);

        let outcome = Orchestrator::new(&gateway, Jitter::none()).run().await;

        let failures = outcome.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].stage, Stage::SignIn);
        assert!(failures[0].reason.contains("/user/signIn"));
        assert!(outcome.is_success(Stage::CheckIn));
        assert!(outcome.is_success(Stage::LikePost));
    }

    #[tokio::test]
    async fn test_report_delivers_summary_once() {
        let gateway = ScriptedGateway::new();
        script_all_successful(&gateway);
        let notifier = RecordingNotifier::default();

        let outcome = Orchestrator::new(&gateway, Jitter::none()).run().await;
        let expected = outcome.summary();
        let delivered = report(outcome, &notifier).await.unwrap();

        assert_eq!(delivered, expected);
        assert_eq!(notifier.messages(), vec![expected.unwrap()]);
    }

    #[tokio::test]
    async fn test_report_delivers_only_failure_text() {
        let gateway = ScriptedGateway::new();
        script_all_successful(&gateway);
        gateway.always(Endpoint::SignIn, rejected("already signed"));
        let notifier = RecordingNotifier::default();

        let outcome = Orchestrator::new(&gateway, Jitter::none()).run().await;
        let err = report(outcome, &notifier).await.unwrap_err();

        assert!(matches!(err, AppError::Workflow(_)));
        let messages = notifier.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0], "Community sign-in failed, already signed");
        assert_eq!(err.to_string(), messages[0]);
    }

    #[tokio::test]
    async fn test_report_with_nothing_to_say_is_silent() {
        let notifier = RecordingNotifier::default();

        let delivered = report(WorkflowOutcome::new(), &notifier).await.unwrap();

        assert!(delivered.is_none());
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_summary_delivery_failure_is_an_error() {
        let mut outcome = WorkflowOutcome::new();
        outcome.record_success(Stage::SignIn);
        let notifier = RecordingNotifier::failing();

        let err = report(outcome, &notifier).await.unwrap_err();

        assert!(matches!(err, AppError::Notification(_)));
    }
}
