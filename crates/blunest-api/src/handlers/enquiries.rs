use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use blunest_db::entities::{
    contact_message, enquiry, enquiry::EnquiryStatus, newsletter_subscriber, property,
    property_lead, property_lead::LeadStatus, property_lead::LeadType,
};
use blunest_db::is_unique_violation;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::middleware::MaybeUser;
use crate::models::{
    page_params, ApiResponse, ContactMessage, ContactRequest, CreateEnquiryRequest,
    CreateLeadRequest, Enquiry, ErrorResponse, Lead, LeadListQuery, NewsletterRequest,
    NewsletterResponse, Paginated, Pagination, StatusListQuery, UpdateLeadRequest,
    UpdateStatusRequest,
};
use crate::notifications::{notify_quietly, NewNotification};
use crate::services::groups::find_property;
use crate::AppState;

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Submit an enquiry about a property
#[utoipa::path(
    post,
    path = "/api/enquiries",
    request_body = CreateEnquiryRequest,
    responses(
        (status = 201, description = "Enquiry recorded", body = Enquiry),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Property not found", body = ErrorResponse),
        (status = 429, description = "Too many requests", body = ErrorResponse)
    ),
    tag = "enquiries"
)]
pub async fn create_enquiry(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    Json(req): Json<CreateEnquiryRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Enquiry>>)> {
    req.validate()?;

    let user_id = user.map(|u| u.user_id);
    let email = req.email.trim().to_lowercase();
    let message = optional_text(req.message);

    let txn = state.db.begin().await?;
    let property = find_property(&txn, &req.property_id).await?;

    let now = Utc::now();
    let model = enquiry::ActiveModel {
        id: Set(Uuid::new_v4()),
        property_id: Set(property.id),
        user_id: Set(user_id),
        full_name: Set(req.full_name.trim().to_string()),
        email: Set(email.clone()),
        phone: Set(req.phone.trim().to_string()),
        message: Set(message.clone()),
        investment_amount: Set(req.investment_amount),
        status: Set(EnquiryStatus::New),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    property_lead::ActiveModel {
        id: Set(Uuid::new_v4()),
        property_id: Set(Some(property.id)),
        user_id: Set(user_id),
        lead_type: Set(LeadType::Enquiry),
        full_name: Set(model.full_name.clone()),
        email: Set(email),
        phone: Set(Some(model.phone.clone())),
        message: Set(message),
        status: Set(LeadStatus::New),
        notes: Set(None),
        assigned_to: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    info!("Enquiry {} received for property {}", model.id, property.id);

    if let Some(owner_id) = property.owner_id {
        notify_quietly(
            &state.db,
            &state.notifications,
            NewNotification::new(
                owner_id,
                "enquiry",
                "New enquiry",
                format!("{} enquired about {}", model.full_name, property.title),
            )
            .with_link("/admin/enquiries"),
        )
        .await;
    }

    Ok((StatusCode::CREATED, Json(ApiResponse::new(model.into()))))
}

/// Record a lead from an interest action
#[utoipa::path(
    post,
    path = "/api/leads",
    request_body = CreateLeadRequest,
    responses(
        (status = 201, description = "Lead recorded", body = Lead),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Property not found", body = ErrorResponse)
    ),
    tag = "enquiries"
)]
pub async fn create_lead(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    Json(req): Json<CreateLeadRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Lead>>)> {
    req.validate()?;

    if let Some(property_id) = req.property_id {
        if property::Entity::find_by_id(property_id)
            .one(&state.db)
            .await?
            .is_none()
        {
            return Err(ApiError::not_found("Property not found").with_code("PROPERTY_NOT_FOUND"));
        }
    }

    let now = Utc::now();
    let model = property_lead::ActiveModel {
        id: Set(Uuid::new_v4()),
        property_id: Set(req.property_id),
        user_id: Set(user.map(|u| u.user_id)),
        lead_type: Set(req.lead_type),
        full_name: Set(req.full_name.trim().to_string()),
        email: Set(req.email.trim().to_lowercase()),
        phone: Set(optional_text(req.phone)),
        message: Set(optional_text(req.message)),
        status: Set(LeadStatus::New),
        notes: Set(None),
        assigned_to: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    info!("Lead {} ({:?}) recorded", model.id, model.lead_type);
    Ok((StatusCode::CREATED, Json(ApiResponse::new(model.into()))))
}

/// Send a message through the contact form
#[utoipa::path(
    post,
    path = "/api/contact",
    request_body = ContactRequest,
    responses(
        (status = 201, description = "Message received", body = ContactMessage),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 429, description = "Too many requests", body = ErrorResponse)
    ),
    tag = "enquiries"
)]
pub async fn submit_contact(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ContactRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<ContactMessage>>)> {
    req.validate()?;

    let now = Utc::now();
    let model = contact_message::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(req.name.trim().to_string()),
        email: Set(req.email.trim().to_lowercase()),
        phone: Set(optional_text(req.phone)),
        subject: Set(req.subject.trim().to_string()),
        message: Set(req.message.trim().to_string()),
        status: Set(EnquiryStatus::New),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    info!("Contact message {} received", model.id);
    Ok((StatusCode::CREATED, Json(ApiResponse::new(model.into()))))
}

/// Subscribe to the newsletter
#[utoipa::path(
    post,
    path = "/api/newsletter/subscribe",
    request_body = NewsletterRequest,
    responses(
        (status = 201, description = "Subscribed", body = NewsletterResponse),
        (status = 200, description = "Resubscribed", body = NewsletterResponse),
        (status = 409, description = "Already subscribed", body = ErrorResponse),
        (status = 429, description = "Too many requests", body = ErrorResponse)
    ),
    tag = "enquiries"
)]
pub async fn subscribe_newsletter(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewsletterRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<NewsletterResponse>>)> {
    req.validate()?;

    let email = req.email.trim().to_lowercase();
    let already_subscribed = || {
        ApiError::conflict("This email is already subscribed").with_code("ALREADY_SUBSCRIBED")
    };

    let existing = newsletter_subscriber::Entity::find()
        .filter(newsletter_subscriber::Column::Email.eq(email.as_str()))
        .one(&state.db)
        .await?;

    match existing {
        Some(subscriber) if subscriber.subscribed => Err(already_subscribed()),
        Some(subscriber) => {
            let mut active: newsletter_subscriber::ActiveModel = subscriber.into();
            active.subscribed = Set(true);
            active.updated_at = Set(Utc::now());
            active.update(&state.db).await?;

            info!("Newsletter resubscription: {}", email);
            Ok((
                StatusCode::OK,
                Json(ApiResponse::new(NewsletterResponse {
                    email,
                    status: "resubscribed".to_string(),
                    message: "Welcome back! You have been resubscribed.".to_string(),
                })),
            ))
        }
        None => {
            let now = Utc::now();
            newsletter_subscriber::ActiveModel {
                id: Set(Uuid::new_v4()),
                email: Set(email.clone()),
                subscribed: Set(true),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&state.db)
            .await
            .map_err(|e| if is_unique_violation(&e) { already_subscribed() } else { e.into() })?;

            info!("Newsletter subscription: {}", email);
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse::new(NewsletterResponse {
                    email,
                    status: "subscribed".to_string(),
                    message: "Thanks for subscribing!".to_string(),
                })),
            ))
        }
    }
}

/// List enquiries (admin)
#[utoipa::path(
    get,
    path = "/api/admin/enquiries",
    params(
        ("status" = Option<String>, Query, description = "new, in_progress or closed"),
        ("page" = Option<u64>, Query, description = "Page number, from 1"),
        ("limit" = Option<u64>, Query, description = "Page size, 1 to 100")
    ),
    responses(
        (status = 200, description = "Paginated enquiries", body = [Enquiry]),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn list_enquiries(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatusListQuery>,
) -> ApiResult<Json<Paginated<Enquiry>>> {
    debug!("Listing enquiries: {:?}", query);

    let (page, limit) = page_params(query.page, query.limit);

    let mut select = enquiry::Entity::find();
    if let Some(status) = query.status {
        select = select.filter(enquiry::Column::Status.eq(status));
    }

    let paginator = select
        .order_by_desc(enquiry::Column::CreatedAt)
        .paginate(&state.db, limit);
    let total = paginator.num_items().await?;
    let rows = paginator.fetch_page(page - 1).await?;

    Ok(Json(Paginated::new(
        rows.into_iter().map(Enquiry::from).collect(),
        Pagination::new(page, limit, total),
    )))
}

/// Update the status of an enquiry (admin)
#[utoipa::path(
    patch,
    path = "/api/admin/enquiries/{id}",
    params(
        ("id" = Uuid, Path, description = "Enquiry ID")
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Enquiry updated", body = Enquiry),
        (status = 404, description = "Enquiry not found", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn update_enquiry_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Json<ApiResponse<Enquiry>>> {
    let existing = enquiry::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Enquiry not found").with_code("ENQUIRY_NOT_FOUND"))?;

    let mut active: enquiry::ActiveModel = existing.into();
    active.status = Set(req.status);
    active.updated_at = Set(Utc::now());
    let model = active.update(&state.db).await?;

    info!("Enquiry {} set to {:?}", id, req.status);
    Ok(Json(ApiResponse::new(model.into())))
}

/// List leads (admin)
#[utoipa::path(
    get,
    path = "/api/admin/leads",
    params(
        ("property_id" = Option<Uuid>, Query, description = "Filter by property"),
        ("lead_type" = Option<String>, Query, description = "Filter by lead type"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("page" = Option<u64>, Query, description = "Page number, from 1"),
        ("limit" = Option<u64>, Query, description = "Page size, 1 to 100")
    ),
    responses(
        (status = 200, description = "Paginated leads", body = [Lead]),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn list_leads(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LeadListQuery>,
) -> ApiResult<Json<Paginated<Lead>>> {
    debug!("Listing leads: {:?}", query);

    use property_lead::Column;

    let (page, limit) = page_params(query.page, query.limit);

    let mut condition = Condition::all();
    if let Some(property_id) = query.property_id {
        condition = condition.add(Column::PropertyId.eq(property_id));
    }
    if let Some(lead_type) = query.lead_type {
        condition = condition.add(Column::LeadType.eq(lead_type));
    }
    if let Some(status) = query.status {
        condition = condition.add(Column::Status.eq(status));
    }

    let paginator = property_lead::Entity::find()
        .filter(condition)
        .order_by_desc(Column::CreatedAt)
        .paginate(&state.db, limit);
    let total = paginator.num_items().await?;
    let rows = paginator.fetch_page(page - 1).await?;

    Ok(Json(Paginated::new(
        rows.into_iter().map(Lead::from).collect(),
        Pagination::new(page, limit, total),
    )))
}

/// Update status, notes or assignee of a lead (admin)
#[utoipa::path(
    patch,
    path = "/api/admin/leads/{id}",
    params(
        ("id" = Uuid, Path, description = "Lead ID")
    ),
    request_body = UpdateLeadRequest,
    responses(
        (status = 200, description = "Lead updated", body = Lead),
        (status = 404, description = "Lead not found", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn update_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateLeadRequest>,
) -> ApiResult<Json<ApiResponse<Lead>>> {
    let existing = property_lead::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Lead not found").with_code("LEAD_NOT_FOUND"))?;

    let mut active: property_lead::ActiveModel = existing.into();
    if let Some(status) = req.status {
        active.status = Set(status);
    }
    if let Some(notes) = req.notes {
        active.notes = Set(optional_text(Some(notes)));
    }
    if let Some(assigned_to) = req.assigned_to {
        active.assigned_to = Set(Some(assigned_to));
    }
    active.updated_at = Set(Utc::now());

    let model = active.update(&state.db).await?;

    info!("Lead {} updated", id);
    Ok(Json(ApiResponse::new(model.into())))
}

/// List contact messages (admin)
#[utoipa::path(
    get,
    path = "/api/admin/contact-messages",
    params(
        ("status" = Option<String>, Query, description = "new, in_progress or closed"),
        ("page" = Option<u64>, Query, description = "Page number, from 1"),
        ("limit" = Option<u64>, Query, description = "Page size, 1 to 100")
    ),
    responses(
        (status = 200, description = "Paginated contact messages", body = [ContactMessage]),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn list_contact_messages(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatusListQuery>,
) -> ApiResult<Json<Paginated<ContactMessage>>> {
    let (page, limit) = page_params(query.page, query.limit);

    let mut select = contact_message::Entity::find();
    if let Some(status) = query.status {
        select = select.filter(contact_message::Column::Status.eq(status));
    }

    let paginator = select
        .order_by_desc(contact_message::Column::CreatedAt)
        .paginate(&state.db, limit);
    let total = paginator.num_items().await?;
    let rows = paginator.fetch_page(page - 1).await?;

    Ok(Json(Paginated::new(
        rows.into_iter().map(ContactMessage::from).collect(),
        Pagination::new(page, limit, total),
    )))
}

/// Update the status of a contact message (admin)
#[utoipa::path(
    patch,
    path = "/api/admin/contact-messages/{id}",
    params(
        ("id" = Uuid, Path, description = "Message ID")
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Message updated", body = ContactMessage),
        (status = 404, description = "Message not found", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn update_contact_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Json<ApiResponse<ContactMessage>>> {
    let existing = contact_message::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Message not found").with_code("MESSAGE_NOT_FOUND"))?;

    let mut active: contact_message::ActiveModel = existing.into();
    active.status = Set(req.status);
    active.updated_at = Set(Utc::now());
    let model = active.update(&state.db).await?;

    Ok(Json(ApiResponse::new(model.into())))
}
