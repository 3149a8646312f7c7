use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Status code reported by envelopes synthesised from transport failures.
pub const TRANSPORT_FAILURE_CODE: i64 = -1;

/// Form-encoded request body, in field order.
pub type FormBody = Vec<(&'static str, String)>;

/// Normalised reply of every remote call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub code: i64,
    pub msg: String,
    /// Absent when the call itself failed, or when the service did not
    /// evaluate the request.
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    /// Set only on envelopes standing in for a call that never got a reply.
    #[serde(skip)]
    pub(crate) transport_failed: bool,
}

impl Envelope {
    pub fn is_success(&self) -> bool {
        self.success == Some(true)
    }

    /// Envelope standing in for a call that never produced a reply.
    pub fn transport_failure(error: &AppError) -> Self {
        Self {
            code: TRANSPORT_FAILURE_CODE,
            msg: error.to_string(),
            success: None,
            data: None,
            transport_failed: true,
        }
    }

    pub fn is_transport_failure(&self) -> bool {
        self.transport_failed
    }
}

/// Remote operations offered by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    RoleList,
    CheckIn,
    SignIn,
    ForumList,
    PostDetail,
    Like,
    ShareTask,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::RoleList => "/user/role/findRoleList",
            Endpoint::CheckIn => "/encourage/signIn/v2",
            Endpoint::SignIn => "/user/signIn",
            Endpoint::ForumList => "/forum/list",
            Endpoint::PostDetail => "/forum/getPostDetail",
            Endpoint::Like => "/forum/like",
            Endpoint::ShareTask => "/encourage/level/shareTask",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Identifier that the service sends either as a number or as a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemoteId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteId::Number(n) => write!(f, "{n}"),
            RemoteId::Text(s) => f.write_str(s),
        }
    }
}

/// An in-game role bound to the account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[serde(default)]
    pub game_id: Option<i64>,
    #[serde(default)]
    pub server_id: Option<RemoteId>,
    #[serde(default)]
    pub role_id: Option<RemoteId>,
    #[serde(default)]
    pub user_id: Option<RemoteId>,
}

impl Role {
    pub const DEFAULT_GAME_ID: i64 = 2;

    pub fn game_id(&self) -> i64 {
        self.game_id.unwrap_or(Self::DEFAULT_GAME_ID)
    }

    /// Forum board that belongs to this role's game.
    pub fn forum_id(&self) -> i64 {
        if self.game_id() == 2 {
            2
        } else {
            9
        }
    }
}

/// Listing entry of a forum board.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub post_id: RemoteId,
}

/// The parts of a post detail reply needed to share and like the post.
#[derive(Debug, Clone, PartialEq)]
pub struct PostDetail {
    pub game_id: RemoteId,
    pub forum_id: RemoteId,
    pub post_id: RemoteId,
    pub post_type: RemoteId,
    pub author_id: RemoteId,
}

/// `operateType` of a like submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeOperation {
    Like,
    Unlike,
}

impl LikeOperation {
    pub fn operate_type(self) -> u8 {
        match self {
            LikeOperation::Like => 1,
            LikeOperation::Unlike => 2,
        }
    }
}

impl fmt::Display for LikeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LikeOperation::Like => f.write_str("like"),
            LikeOperation::Unlike => f.write_str("unlike"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_success_requires_explicit_true() {
        let ok: Envelope =
            serde_json::from_str(r#"{"code":200,"msg":"ok","success":true}"#).unwrap();
        let rejected: Envelope =
            serde_json::from_str(r#"{"code":1511,"msg":"already","success":false}"#).unwrap();
        let unevaluated: Envelope =
            serde_json::from_str(r#"{"code":220,"msg":"token expired"}"#).unwrap();

        assert!(ok.is_success());
        assert!(!rejected.is_success());
        assert!(!unevaluated.is_success());
        assert!(unevaluated.success.is_none());
        assert!(unevaluated.data.is_none());
    }

    #[test]
    fn test_envelope_missing_msg_does_not_decode() {
        assert!(serde_json::from_str::<Envelope>(r#"{"code":200}"#).is_err());
    }

    #[test]
    fn test_transport_failure_envelope() {
        let error = AppError::Transport {
            endpoint: Endpoint::SignIn.to_string(),
            message: "connection refused".to_string(),
        };
        let envelope = Envelope::transport_failure(&error);
        assert!(!envelope.is_success());
        assert!(envelope.is_transport_failure());
        assert!(envelope.msg.contains("/user/signIn"));
        assert!(envelope.msg.contains("connection refused"));
    }

    #[test]
    fn test_remote_reply_is_never_a_transport_failure() {
        let reply: Envelope =
            serde_json::from_str(r#"{"code":-1,"msg":"system busy"}"#).unwrap();
        assert_eq!(reply.code, TRANSPORT_FAILURE_CODE);
        assert!(reply.success.is_none());
        assert!(!reply.is_transport_failure());
    }

    #[test]
    fn test_remote_id_accepts_numbers_and_strings() {
        let ids: Vec<RemoteId> = serde_json::from_str(r#"[123, "1234567890123456789"]"#).unwrap();
        assert_eq!(ids[0].to_string(), "123");
        assert_eq!(ids[1].to_string(), "1234567890123456789");
    }

    #[test]
    fn test_forum_id_follows_game() {
        let role = |game_id| Role {
            game_id,
            server_id: None,
            role_id: None,
            user_id: None,
        };
        assert_eq!(role(Some(2)).forum_id(), 2);
        assert_eq!(role(Some(3)).forum_id(), 9);
        assert_eq!(role(None).forum_id(), 2);
    }
}
