use chrono::{DateTime, Datelike, FixedOffset, Offset, Utc};

use crate::gateway::types::{
    Endpoint, Envelope, FormBody, LikeOperation, PostDetail, PostSummary, Role,
};
use crate::gateway::Gateway;

/// Game id used when looking up the account's roles.
pub const ROLE_LOOKUP_GAME_ID: i64 = 3;

/// Game id submitted for the community sign-in.
pub const COMMUNITY_GAME_ID: i64 = 2;

/// Typed operations over a [`Gateway`].
///
/// Transport failures are folded into envelopes without a `success` flag
/// so callers only ever reason about envelopes.
pub struct KurobbsApi<'a> {
    gateway: &'a dyn Gateway,
}

impl<'a> KurobbsApi<'a> {
    pub fn new(gateway: &'a dyn Gateway) -> Self {
        Self { gateway }
    }

    async fn call(&self, endpoint: Endpoint, form: FormBody) -> Envelope {
        match self.gateway.call(endpoint, form).await {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(endpoint = %endpoint, error = %e, "Remote call did not complete");
                Envelope::transport_failure(&e)
            }
        }
    }

    pub async fn role_list(&self) -> Envelope {
        self.call(
            Endpoint::RoleList,
            vec![("gameId", ROLE_LOOKUP_GAME_ID.to_string())],
        )
        .await
    }

    pub async fn check_in(&self, role: &Role, month: &str) -> Envelope {
        let mut form: FormBody = vec![("gameId", role.game_id().to_string())];
        if let Some(server_id) = &role.server_id {
            form.push(("serverId", server_id.to_string()));
        }
        form.push((
            "roleId",
            role.role_id
                .as_ref()
                .map_or_else(|| "0".to_string(), |id| id.to_string()),
        ));
        form.push((
            "userId",
            role.user_id
                .as_ref()
                .map_or_else(|| "0".to_string(), |id| id.to_string()),
        ));
        form.push(("reqMonth", month.to_string()));

        self.call(Endpoint::CheckIn, form).await
    }

    pub async fn sign_in(&self) -> Envelope {
        self.call(
            Endpoint::SignIn,
            vec![("gameId", COMMUNITY_GAME_ID.to_string())],
        )
        .await
    }

    pub async fn forum_list(&self, role: &Role) -> Envelope {
        self.call(
            Endpoint::ForumList,
            vec![
                ("forumId", role.forum_id().to_string()),
                ("gameId", role.game_id().to_string()),
                ("pageIndex", "1".to_string()),
                ("pageSize", "20".to_string()),
                ("searchType", "2".to_string()),
                ("timeType", "0".to_string()),
                ("topicId", "0".to_string()),
            ],
        )
        .await
    }

    pub async fn post_detail(&self, post: &PostSummary) -> Envelope {
        self.call(
            Endpoint::PostDetail,
            vec![
                ("isOnlyPublisher", "0".to_string()),
                ("postId", post.post_id.to_string()),
                ("showOrderType", "2".to_string()),
            ],
        )
        .await
    }

    pub async fn like(&self, post: &PostDetail, operation: LikeOperation) -> Envelope {
        self.call(
            Endpoint::Like,
            vec![
                ("forumId", post.forum_id.to_string()),
                ("gameId", post.game_id.to_string()),
                ("likeType", "1".to_string()),
                ("operateType", operation.operate_type().to_string()),
                ("postCommentId", "0".to_string()),
                ("postCommentReplyId", "0".to_string()),
                ("postId", post.post_id.to_string()),
                ("postType", post.post_type.to_string()),
                ("toUserId", post.author_id.to_string()),
            ],
        )
        .await
    }

    pub async fn share(&self, post: &PostDetail) -> Envelope {
        self.call(Endpoint::ShareTask, vec![("gameId", post.game_id.to_string())])
            .await
    }
}

/// Two-digit month of `now` on the service's calendar (UTC+8).
pub fn request_month(now: DateTime<Utc>) -> String {
    let offset = FixedOffset::east_opt(8 * 3600).unwrap_or_else(|| Utc.fix());
    format!("{:02}", now.with_timezone(&offset).month())
}
