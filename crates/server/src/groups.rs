//! Group API endpoints

use api_types::group::{GroupNew, GroupView, MemberAdd};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use sea_orm::EntityTrait;

use crate::{ServerError, server::ServerState, user};
use engine::EngineError;

fn to_view(group: engine::Group) -> GroupView {
    GroupView {
        id: group.id,
        name: group.name,
        description: group.description,
        owner_id: group.owner_id,
        member_ids: group.member_ids,
    }
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<GroupNew>,
) -> Result<(StatusCode, Json<GroupView>), ServerError> {
    let group = state
        .engine
        .new_group(
            &payload.name,
            payload.description.as_deref().unwrap_or(""),
            &user.username,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(to_view(group))))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
) -> Result<Json<GroupView>, ServerError> {
    let group = state.engine.group(&group_id).await?;
    // Non-members see the same 404 as a missing group.
    if !group.is_member(&user.username) {
        return Err(EngineError::KeyNotFound("group not exists".to_string()).into());
    }

    Ok(Json(to_view(group)))
}

pub async fn add_member(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
    Json(payload): Json<MemberAdd>,
) -> Result<Json<GroupView>, ServerError> {
    if user::Entity::find_by_id(&payload.user_id)
        .one(&state.db)
        .await?
        .is_none()
    {
        return Err(EngineError::KeyNotFound("user not exists".to_string()).into());
    }

    let group = state
        .engine
        .add_group_member(&group_id, &payload.user_id, &user.username)
        .await?;

    Ok(Json(to_view(group)))
}
