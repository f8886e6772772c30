use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use blunest_db::entities::group_member::MemberStatus;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiResult;
use crate::middleware::AuthUser;
use crate::models::{
    AddMemberFromLeadRequest, ApiResponse, CreateGroupRequest, ErrorResponse, GroupMember,
    GroupView, GroupWithMembers, JoinGroupRequest, JoinGroupResponse, PropertyGroup,
    UpdateGroupRequest, UpdateMemberStatusRequest,
};
use crate::notifications::{notify_quietly, NewNotification};
use crate::services::groups::{self, GroupUpdate, JoinRequest, Membership};
use crate::AppState;

fn membership_response(membership: Membership) -> JoinGroupResponse {
    JoinGroupResponse {
        member: membership.member.into(),
        group: membership.group.into(),
    }
}

/// Get the investment group of a property
#[utoipa::path(
    get,
    path = "/api/properties/{id_or_slug}/group",
    params(
        ("id_or_slug" = String, Path, description = "Property id or slug")
    ),
    responses(
        (status = 200, description = "Group with approved members, or null", body = GroupView),
        (status = 404, description = "Property not found", body = ErrorResponse)
    ),
    tag = "groups"
)]
pub async fn get_group(
    State(state): State<Arc<AppState>>,
    Path(id_or_slug): Path<String>,
) -> ApiResult<Json<ApiResponse<GroupView>>> {
    debug!("Getting group for property: {}", id_or_slug);

    let group = groups::group_view(&state.db, &id_or_slug)
        .await?
        .map(|(group, members)| GroupWithMembers {
            group: group.into(),
            members: members.into_iter().map(GroupMember::from).collect(),
        });

    Ok(Json(ApiResponse::new(GroupView { group })))
}

/// Join the investment group of a property
#[utoipa::path(
    post,
    path = "/api/properties/{id_or_slug}/group",
    params(
        ("id_or_slug" = String, Path, description = "Property id or slug")
    ),
    request_body = JoinGroupRequest,
    responses(
        (status = 201, description = "Joined; membership pending review", body = JoinGroupResponse),
        (status = 400, description = "Already joined, group full or locked", body = ErrorResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 404, description = "Property not found", body = ErrorResponse),
        (status = 409, description = "Concurrent group creation, retry", body = ErrorResponse)
    ),
    tag = "groups"
)]
pub async fn join_group(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id_or_slug): Path<String>,
    Json(req): Json<JoinGroupRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<JoinGroupResponse>>)> {
    req.validate()?;

    let membership = groups::join_group(
        &state.db,
        &id_or_slug,
        JoinRequest {
            user_id: user.user_id,
            full_name: req.full_name.trim().to_string(),
            email: req.email.trim().to_lowercase(),
            phone: req.phone.or(user.phone),
            investment_amount: req.investment_amount,
        },
    )
    .await?;

    notify_quietly(
        &state.db,
        &state.notifications,
        NewNotification::new(
            user.user_id,
            "group",
            "Group join request received",
            format!(
                "Your request to join the investment group is pending review. {} of {} slots are now filled.",
                membership.group.filled_slots, membership.group.total_slots
            ),
        )
        .with_link(format!("/properties/{}", id_or_slug)),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(membership_response(membership))),
    ))
}

/// Create a group for a property (admin)
#[utoipa::path(
    post,
    path = "/api/admin/groups",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created", body = PropertyGroup),
        (status = 404, description = "Property not found", body = ErrorResponse),
        (status = 409, description = "Group already exists", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn create_group(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateGroupRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<PropertyGroup>>)> {
    req.validate()?;

    let group = groups::create_group(&state.db, &req.property_id, req.total_slots).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::new(group.into()))))
}

/// Update slots, lock or status of a group (admin)
#[utoipa::path(
    patch,
    path = "/api/admin/groups/{id}",
    params(
        ("id" = Uuid, Path, description = "Group ID")
    ),
    request_body = UpdateGroupRequest,
    responses(
        (status = 200, description = "Group updated", body = PropertyGroup),
        (status = 400, description = "Total slots below filled slots", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn update_group(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateGroupRequest>,
) -> ApiResult<Json<ApiResponse<PropertyGroup>>> {
    req.validate()?;

    let group = groups::update_group(
        &state.db,
        id,
        GroupUpdate {
            total_slots: req.total_slots,
            is_locked: req.is_locked,
            status: req.status,
        },
    )
    .await?;

    Ok(Json(ApiResponse::new(group.into())))
}

/// List every member of a group (admin)
#[utoipa::path(
    get,
    path = "/api/admin/groups/{id}/members",
    params(
        ("id" = Uuid, Path, description = "Group ID")
    ),
    responses(
        (status = 200, description = "Members in join order", body = [GroupMember]),
        (status = 404, description = "Group not found", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn list_group_members(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<GroupMember>>>> {
    let members = groups::list_members(&state.db, id).await?;

    Ok(Json(ApiResponse::new(
        members.into_iter().map(GroupMember::from).collect(),
    )))
}

/// Add the user behind a lead to the property's group (admin)
#[utoipa::path(
    post,
    path = "/api/admin/groups/add-member",
    request_body = AddMemberFromLeadRequest,
    responses(
        (status = 201, description = "Approved member added", body = JoinGroupResponse),
        (status = 400, description = "Lead incomplete, already joined, group full or locked", body = ErrorResponse),
        (status = 404, description = "Lead not found", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn add_member_from_lead(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddMemberFromLeadRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<JoinGroupResponse>>)> {
    let membership = groups::add_member_from_lead(&state.db, req.lead_id).await?;

    if let Some(user_id) = membership.member.user_id {
        notify_quietly(
            &state.db,
            &state.notifications,
            NewNotification::new(
                user_id,
                "group",
                "Added to an investment group",
                "Our team has added you to a property investment group.",
            )
            .with_link(format!("/properties/{}", membership.group.property_id)),
        )
        .await;
    }

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(membership_response(membership))),
    ))
}

/// Approve or reject a member (admin)
#[utoipa::path(
    patch,
    path = "/api/admin/group-members/{id}",
    params(
        ("id" = Uuid, Path, description = "Member ID")
    ),
    request_body = UpdateMemberStatusRequest,
    responses(
        (status = 200, description = "Member updated", body = JoinGroupResponse),
        (status = 400, description = "Group full or locked", body = ErrorResponse),
        (status = 404, description = "Member not found", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn update_member_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateMemberStatusRequest>,
) -> ApiResult<Json<ApiResponse<JoinGroupResponse>>> {
    let membership = groups::set_member_status(&state.db, id, req.status).await?;

    if let Some(user_id) = membership.member.user_id {
        let (title, message) = match req.status {
            MemberStatus::Approved => (
                "Group membership approved",
                "Your membership in the investment group has been approved.",
            ),
            MemberStatus::Rejected => (
                "Group membership declined",
                "Your request to join the investment group was not approved.",
            ),
            MemberStatus::Pending => (
                "Group membership under review",
                "Your investment group membership is being reviewed again.",
            ),
        };

        notify_quietly(
            &state.db,
            &state.notifications,
            NewNotification::new(user_id, "group", title, message)
                .with_link(format!("/properties/{}", membership.group.property_id)),
        )
        .await;
    }

    Ok(Json(ApiResponse::new(membership_response(membership))))
}

/// Remove a member from its group (admin)
#[utoipa::path(
    delete,
    path = "/api/admin/group-members/{id}",
    params(
        ("id" = Uuid, Path, description = "Member ID")
    ),
    responses(
        (status = 200, description = "Member removed; returns the group", body = PropertyGroup),
        (status = 404, description = "Member not found", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn remove_member(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<PropertyGroup>>> {
    let group = groups::remove_member(&state.db, id).await?;

    Ok(Json(ApiResponse::new(group.into())))
}
