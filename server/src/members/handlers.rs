//! Project Member Handlers

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use super::error::MemberResult;
use super::service::RemovalOutcome;
use super::types::{
    AddMemberRequest, MemberListQuery, MemberView, RemoveMemberResponse, UpdateMemberRequest,
};
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::permissions::Actor;

/// List members of a project
#[utoipa::path(
    get,
    path = "/api/projects/{id}/members",
    tag = "members",
    params(("id" = Uuid, Path, description = "Project ID"), MemberListQuery),
    responses(
        (status = 200, body = Vec<MemberView>),
        (status = 404, description = "Project not found"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state))]
pub async fn list_members(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
    Query(params): Query<MemberListQuery>,
) -> MemberResult<Json<Vec<MemberView>>> {
    let members = state
        .members
        .list(&Actor::from(&auth), project_id, params.query.as_deref())
        .await?;

    Ok(Json(members.into_iter().map(MemberView::from).collect()))
}

/// Get a single project member
#[utoipa::path(
    get,
    path = "/api/projects/{id}/members/{user_id}",
    tag = "members",
    params(
        ("id" = Uuid, Path, description = "Project ID"),
        ("user_id" = Uuid, Path, description = "User ID"),
    ),
    responses(
        (status = 200, body = MemberView),
        (status = 404, description = "Project or member not found"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state))]
pub async fn get_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, user_id)): Path<(Uuid, Uuid)>,
) -> MemberResult<Json<MemberView>> {
    let member = state
        .members
        .get(&Actor::from(&auth), project_id, user_id)
        .await?;

    Ok(Json(member.into()))
}

/// Add a member, or change the access level of an existing one
#[utoipa::path(
    post,
    path = "/api/projects/{id}/members",
    tag = "members",
    params(("id" = Uuid, Path, description = "Project ID")),
    request_body = AddMemberRequest,
    responses(
        (status = 201, description = "Member created", body = MemberView),
        (status = 200, description = "Existing member updated", body = MemberView),
        (status = 400, description = "Missing parameter"),
        (status = 403, description = "Not a project administrator"),
        (status = 404, description = "Project or user not found"),
        (status = 422, description = "Invalid access level"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, body))]
pub async fn add_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
    body: Bytes,
) -> MemberResult<(StatusCode, Json<MemberView>)> {
    let request = AddMemberRequest::from_body(&body);
    let upserted = state
        .members
        .add(&Actor::from(&auth), project_id, &request)
        .await?;

    let status = if upserted.is_created() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(upserted.into_member().into())))
}

/// Update a member's access level
#[utoipa::path(
    put,
    path = "/api/projects/{id}/members/{user_id}",
    tag = "members",
    params(
        ("id" = Uuid, Path, description = "Project ID"),
        ("user_id" = Uuid, Path, description = "User ID"),
    ),
    request_body = UpdateMemberRequest,
    responses(
        (status = 200, body = MemberView),
        (status = 400, description = "Missing parameter"),
        (status = 403, description = "Not a project administrator"),
        (status = 404, description = "Project or member not found"),
        (status = 422, description = "Invalid access level"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, body))]
pub async fn update_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, user_id)): Path<(Uuid, Uuid)>,
    body: Bytes,
) -> MemberResult<Json<MemberView>> {
    let request = UpdateMemberRequest::from_body(&body);
    let member = state
        .members
        .update(&Actor::from(&auth), project_id, user_id, &request)
        .await?;

    Ok(Json(member.into()))
}

/// Remove a member from a project
///
/// Removing a user who is not a member succeeds with `removed: false`.
#[utoipa::path(
    delete,
    path = "/api/projects/{id}/members/{user_id}",
    tag = "members",
    params(
        ("id" = Uuid, Path, description = "Project ID"),
        ("user_id" = Uuid, Path, description = "User ID"),
    ),
    responses(
        (status = 200, body = RemoveMemberResponse),
        (status = 403, description = "Not a project administrator"),
        (status = 404, description = "Project not found"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state))]
pub async fn remove_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, user_id)): Path<(Uuid, Uuid)>,
) -> MemberResult<Json<RemoveMemberResponse>> {
    let outcome = state
        .members
        .remove(&Actor::from(&auth), project_id, user_id)
        .await?;

    let message = match outcome {
        RemovalOutcome::Removed(_) => "Member removed",
        RemovalOutcome::NotMember { .. } => "Access revoked",
    };

    Ok(Json(RemoveMemberResponse {
        removed: outcome.is_removed(),
        user_id: outcome.user_id(),
        message: message.to_string(),
    }))
}
