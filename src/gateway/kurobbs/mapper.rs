use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::gateway::types::{Endpoint, Envelope, PostDetail, PostSummary, RemoteId, Role};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ForumListData {
    #[serde(default)]
    post_list: Vec<PostSummary>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostDetailData {
    game_id: RemoteId,
    post_detail: PostDetailBody,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostDetailBody {
    game_forum_id: RemoteId,
    id: RemoteId,
    post_type: RemoteId,
    post_user_id: RemoteId,
}

fn decode<T: DeserializeOwned>(endpoint: Endpoint, envelope: &Envelope) -> Result<T> {
    let data = match &envelope.data {
        Some(Value::Null) | None => {
            return Err(AppError::Payload {
                endpoint: endpoint.to_string(),
                message: "reply carries no data".to_string(),
            })
        }
        Some(data) => data.clone(),
    };

    serde_json::from_value(data).map_err(|e| AppError::Payload {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })
}

pub fn map_roles(envelope: &Envelope) -> Result<Vec<Role>> {
    decode(Endpoint::RoleList, envelope)
}

pub fn map_post_list(envelope: &Envelope) -> Result<Vec<PostSummary>> {
    decode::<ForumListData>(Endpoint::ForumList, envelope).map(|data| data.post_list)
}

pub fn map_post_detail(envelope: &Envelope) -> Result<PostDetail> {
    let data: PostDetailData = decode(Endpoint::PostDetail, envelope)?;
    Ok(PostDetail {
        game_id: data.game_id,
        forum_id: data.post_detail.game_forum_id,
        post_id: data.post_detail.id,
        post_type: data.post_detail.post_type,
        author_id: data.post_detail.post_user_id,
    })
}
