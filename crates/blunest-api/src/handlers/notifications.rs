use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive},
        Sse,
    },
    Extension, Json,
};
use blunest_db::entities::notification;
use futures::stream::Stream;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::models::{
    ApiResponse, CreateNotificationRequest, EmailQueued, EmailRequest, ErrorResponse,
    MarkAllReadResponse, Notification, NotificationListQuery,
};
use crate::notifications::{notify, NewNotification};
use crate::services::email::{render, EmailTemplate};
use crate::AppState;

const DEFAULT_LIST_LIMIT: u64 = 50;
const MAX_LIST_LIMIT: u64 = 100;

/// List the caller's notifications
#[utoipa::path(
    get,
    path = "/api/notifications",
    params(
        ("unread_only" = Option<bool>, Query, description = "Only unread notifications"),
        ("limit" = Option<u64>, Query, description = "Maximum results (default 50, max 100)")
    ),
    responses(
        (status = 200, description = "Notifications, newest first", body = [Notification]),
        (status = 401, description = "Authentication required", body = ErrorResponse)
    ),
    tag = "notifications"
)]
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<NotificationListQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Notification>>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);

    let mut select =
        notification::Entity::find().filter(notification::Column::UserId.eq(user.user_id));
    if query.unread_only {
        select = select.filter(notification::Column::IsRead.eq(false));
    }

    let rows = select
        .order_by_desc(notification::Column::CreatedAt)
        .limit(limit)
        .all(&state.db)
        .await?;

    Ok(Json(ApiResponse::new(
        rows.into_iter().map(Notification::from).collect(),
    )))
}

/// Mark one of the caller's notifications as read
#[utoipa::path(
    post,
    path = "/api/notifications/{id}/read",
    params(
        ("id" = Uuid, Path, description = "Notification ID")
    ),
    responses(
        (status = 200, description = "Notification marked read", body = Notification),
        (status = 404, description = "Notification not found", body = ErrorResponse)
    ),
    tag = "notifications"
)]
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Notification>>> {
    let existing = notification::Entity::find_by_id(id)
        .filter(notification::Column::UserId.eq(user.user_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| {
            ApiError::not_found("Notification not found").with_code("NOTIFICATION_NOT_FOUND")
        })?;

    if existing.is_read {
        return Ok(Json(ApiResponse::new(existing.into())));
    }

    let mut active: notification::ActiveModel = existing.into();
    active.is_read = Set(true);
    let updated = active.update(&state.db).await?;

    Ok(Json(ApiResponse::new(updated.into())))
}

/// Mark every unread notification of the caller as read
#[utoipa::path(
    post,
    path = "/api/notifications/read-all",
    responses(
        (status = 200, description = "Number of notifications updated", body = MarkAllReadResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse)
    ),
    tag = "notifications"
)]
pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<MarkAllReadResponse>>> {
    let result = notification::Entity::update_many()
        .col_expr(notification::Column::IsRead, Expr::value(true))
        .filter(notification::Column::UserId.eq(user.user_id))
        .filter(notification::Column::IsRead.eq(false))
        .exec(&state.db)
        .await?;

    debug!(
        "Marked {} notification(s) read for {}",
        result.rows_affected, user.user_id
    );

    Ok(Json(ApiResponse::new(MarkAllReadResponse {
        updated: result.rows_affected,
    })))
}

/// Server-Sent Events stream of the caller's new notifications
#[utoipa::path(
    get,
    path = "/api/notifications/stream",
    responses(
        (status = 200, description = "text/event-stream of `notification` events", content_type = "text/event-stream"),
        (status = 401, description = "Authentication required", body = ErrorResponse)
    ),
    tag = "notifications"
)]
pub async fn notification_stream(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let user_id = user.user_id;
    info!("Notification stream opened for {}", user_id);

    let broadcast_stream = BroadcastStream::new(state.notifications.subscribe());

    let stream = futures::stream::once(async move {
        Ok(Event::default().event("connected").data(user_id.to_string()))
    })
    .chain(broadcast_stream.filter_map(move |result| {
        let notification = match result {
            Ok(notification) if notification.user_id == user_id => notification,
            Ok(_) => return None,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!("Notification stream for {} skipped {} event(s)", user_id, skipped);
                return None;
            }
        };

        match Event::default().event("notification").json_data(&notification) {
            Ok(event) => Some(Ok(event)),
            Err(_) => None,
        }
    }));

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Create and push a notification to a user (admin)
#[utoipa::path(
    post,
    path = "/api/admin/notifications",
    request_body = CreateNotificationRequest,
    responses(
        (status = 201, description = "Notification created", body = Notification),
        (status = 400, description = "Validation failed", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn create_notification(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateNotificationRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Notification>>)> {
    req.validate()?;

    let mut new = NewNotification::new(
        req.user_id,
        req.kind.unwrap_or_else(|| "system".to_string()),
        req.title,
        req.message,
    );
    if let Some(link) = req.link {
        new = new.with_link(link);
    }

    let created = notify(&state.db, &state.notifications, new).await?;
    info!("Notification {} sent to {}", created.id, created.user_id);

    Ok((StatusCode::CREATED, Json(ApiResponse::new(created))))
}

/// Render a transactional email and queue it for delivery
#[utoipa::path(
    post,
    path = "/api/notifications/email",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Email queued", body = EmailQueued),
        (status = 400, description = "Unknown email type or invalid recipient", body = ErrorResponse)
    ),
    tag = "notifications"
)]
pub async fn send_email(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EmailRequest>,
) -> ApiResult<Json<ApiResponse<EmailQueued>>> {
    req.validate()?;

    let template: EmailTemplate = req
        .template
        .parse()
        .map_err(|e: String| ApiError::bad_request(e).with_code("UNKNOWN_EMAIL_TYPE"))?;

    let email = render(template, &req.data, &state.config.site_url);
    info!(
        "Queued {} email to {}: {}",
        template, req.to, email.subject
    );
    debug!("Email body:\n{}", email.text);

    Ok(Json(ApiResponse::new(EmailQueued {
        to: req.to,
        subject: email.subject,
        status: "queued".to_string(),
    })))
}
