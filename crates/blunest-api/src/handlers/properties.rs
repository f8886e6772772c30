use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use blunest_db::entities::{
    category, property, property::PropertyStatus, property_image, property_specification,
};
use blunest_db::is_unique_violation;
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::middleware::AdminUser;
use crate::models::{
    page_params, ApiResponse, Category, CreateCategoryRequest, CreatePropertyRequest,
    CreateSpecificationRequest, ErrorResponse, FeaturedProperties, ImageInput, MessageResponse,
    Paginated, Pagination, Property, PropertyDetail, PropertyImage, PropertyListQuery,
    PropertySpecification, UpdatePropertyRequest, UpdateSpecificationRequest,
};
use crate::services::groups::find_property;
use crate::services::slug::{slugify, unique_slug};
use crate::AppState;

/// Featured listings returned by the public endpoint
const FEATURED_LIMIT: u64 = 6;

async fn load_detail<C: ConnectionTrait>(db: &C, model: property::Model) -> ApiResult<PropertyDetail> {
    let images = model
        .find_related(property_image::Entity)
        .order_by_asc(property_image::Column::OrderIndex)
        .all(db)
        .await?;

    let specifications = load_specifications(db, model.id).await?;

    let category = match model.category_id {
        Some(id) => category::Entity::find_by_id(id).one(db).await?,
        None => None,
    };

    Ok(PropertyDetail {
        property: model.into(),
        images: images.into_iter().map(PropertyImage::from).collect(),
        specifications,
        category: category.map(Category::from),
    })
}

async fn load_specifications<C: ConnectionTrait>(
    db: &C,
    property_id: Uuid,
) -> ApiResult<Vec<PropertySpecification>> {
    use property_specification::Column;

    let rows = property_specification::Entity::find()
        .filter(Column::PropertyId.eq(property_id))
        .order_by_asc(Column::Category)
        .order_by_asc(Column::DisplayOrder)
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await?;

    Ok(rows.into_iter().map(PropertySpecification::from).collect())
}

async fn ensure_property<C: ConnectionTrait>(db: &C, id: Uuid) -> ApiResult<()> {
    if property::Entity::find_by_id(id).one(db).await?.is_none() {
        return Err(ApiError::not_found("Property not found").with_code("PROPERTY_NOT_FOUND"));
    }
    Ok(())
}

async fn find_specification<C: ConnectionTrait>(
    db: &C,
    property_id: Uuid,
    spec_id: Uuid,
) -> ApiResult<property_specification::Model> {
    property_specification::Entity::find_by_id(spec_id)
        .filter(property_specification::Column::PropertyId.eq(property_id))
        .one(db)
        .await?
        .ok_or_else(|| {
            ApiError::not_found("Specification not found").with_code("SPECIFICATION_NOT_FOUND")
        })
}

async fn ensure_category<C: ConnectionTrait>(db: &C, category_id: Option<Uuid>) -> ApiResult<()> {
    if let Some(id) = category_id {
        if category::Entity::find_by_id(id).one(db).await?.is_none() {
            return Err(ApiError::invalid_field("category_id", "Category not found"));
        }
    }
    Ok(())
}

async fn replace_images<C: ConnectionTrait>(
    db: &C,
    property_id: Uuid,
    images: &[ImageInput],
) -> ApiResult<()> {
    property_image::Entity::delete_many()
        .filter(property_image::Column::PropertyId.eq(property_id))
        .exec(db)
        .await?;

    for (index, image) in images.iter().enumerate() {
        property_image::ActiveModel {
            id: Set(Uuid::new_v4()),
            property_id: Set(property_id),
            url: Set(image.url.clone()),
            alt_text: Set(image.alt_text.clone()),
            order_index: Set(index as i32),
            is_primary: Set(index == 0),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await?;
    }

    Ok(())
}

fn slug_conflict() -> ApiError {
    ApiError::conflict("A property with this slug already exists").with_code("SLUG_TAKEN")
}

async fn invalidate_listing_caches(state: &AppState) {
    state.featured_cache.invalidate().await;
    state.dashboard_cache.invalidate().await;
}

/// List properties
#[utoipa::path(
    get,
    path = "/api/properties",
    params(
        ("category_id" = Option<Uuid>, Query, description = "Filter by category"),
        ("location" = Option<String>, Query, description = "Substring match on location"),
        ("min_price" = Option<f64>, Query, description = "Minimum price"),
        ("max_price" = Option<f64>, Query, description = "Maximum price"),
        ("bedrooms" = Option<i32>, Query, description = "Exact bedroom count"),
        ("property_type" = Option<String>, Query, description = "Property type"),
        ("status" = Option<String>, Query, description = "Listing status (default: available)"),
        ("page" = Option<u64>, Query, description = "Page number, from 1"),
        ("limit" = Option<u64>, Query, description = "Page size, 1 to 100")
    ),
    responses(
        (status = 200, description = "Paginated properties", body = [Property]),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "properties"
)]
pub async fn list_properties(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PropertyListQuery>,
) -> ApiResult<Json<Paginated<Property>>> {
    debug!("Listing properties with filters: {:?}", query);

    use property::Column;

    let (page, limit) = page_params(query.page, query.limit);

    let mut condition = Condition::all()
        .add(Column::Status.eq(query.status.unwrap_or(PropertyStatus::Available)));

    if let Some(category_id) = query.category_id {
        condition = condition.add(Column::CategoryId.eq(category_id));
    }

    if let Some(location) = query.location.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
        condition = condition.add(Column::Location.contains(location));
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    if let Some(bedrooms) = query.bedrooms {
        condition = condition.add(Column::Bedrooms.eq(bedrooms));
    }

    if let Some(ref property_type) = query.property_type {
        condition = condition.add(Column::PropertyType.eq(property_type.as_str()));
    }

    let paginator = property::Entity::find()
        .filter(condition)
        .order_by_desc(Column::CreatedAt)
        .paginate(&state.db, limit);

    let total = paginator.num_items().await?;
    let rows = paginator.fetch_page(page - 1).await?;

    Ok(Json(Paginated::new(
        rows.into_iter().map(Property::from).collect(),
        Pagination::new(page, limit, total),
    )))
}

/// Featured available properties
#[utoipa::path(
    get,
    path = "/api/properties/featured",
    responses(
        (status = 200, description = "Featured properties", body = FeaturedProperties),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "properties"
)]
pub async fn featured_properties(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ApiResponse<FeaturedProperties>>> {
    if let Some(properties) = state.featured_cache.get().await {
        debug!("Serving {} featured properties from cache", properties.len());
        return Ok(Json(ApiResponse::new(FeaturedProperties {
            properties,
            cached: true,
        })));
    }

    let properties: Vec<Property> = property::Entity::find()
        .filter(property::Column::IsFeatured.eq(true))
        .filter(property::Column::Status.eq(PropertyStatus::Available))
        .order_by_desc(property::Column::CreatedAt)
        .limit(FEATURED_LIMIT)
        .all(&state.db)
        .await?
        .into_iter()
        .map(Property::from)
        .collect();

    state.featured_cache.set(properties.clone()).await;

    Ok(Json(ApiResponse::new(FeaturedProperties {
        properties,
        cached: false,
    })))
}

/// Get a property by id or slug
#[utoipa::path(
    get,
    path = "/api/properties/{id_or_slug}",
    params(
        ("id_or_slug" = String, Path, description = "Property id or slug")
    ),
    responses(
        (status = 200, description = "Property with images, specifications and category", body = PropertyDetail),
        (status = 404, description = "Property not found", body = ErrorResponse)
    ),
    tag = "properties"
)]
pub async fn get_property(
    State(state): State<Arc<AppState>>,
    Path(id_or_slug): Path<String>,
) -> ApiResult<Json<ApiResponse<PropertyDetail>>> {
    debug!("Getting property: {}", id_or_slug);

    let mut model = find_property(&state.db, &id_or_slug).await?;

    property::Entity::update_many()
        .col_expr(property::Column::Views, Expr::col(property::Column::Views).add(1))
        .filter(property::Column::Id.eq(model.id))
        .exec(&state.db)
        .await?;
    model.views += 1;

    Ok(Json(ApiResponse::new(load_detail(&state.db, model).await?)))
}

/// List categories
#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "All categories by name", body = [Category]),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "properties"
)]
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ApiResponse<Vec<Category>>>> {
    let categories = category::Entity::find()
        .order_by_asc(category::Column::Name)
        .all(&state.db)
        .await?;

    Ok(Json(ApiResponse::new(
        categories.into_iter().map(Category::from).collect(),
    )))
}

/// Create a property (admin)
#[utoipa::path(
    post,
    path = "/api/admin/properties",
    request_body = CreatePropertyRequest,
    responses(
        (status = 201, description = "Property created", body = PropertyDetail),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 409, description = "Slug already taken", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn create_property(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminUser>,
    Json(req): Json<CreatePropertyRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<PropertyDetail>>)> {
    req.validate()?;

    let txn = state.db.begin().await?;
    ensure_category(&txn, req.category_id).await?;

    let base = slugify(req.slug.as_deref().unwrap_or(&req.title));
    let slug = unique_slug::<property::Entity, _>(&txn, property::Column::Slug, &base).await?;

    let featured_image = req
        .featured_image
        .clone()
        .or_else(|| req.images.first().map(|image| image.url.clone()));

    let now = Utc::now();
    let model = property::ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(Some(admin.user_id)),
        category_id: Set(req.category_id),
        title: Set(req.title.trim().to_string()),
        slug: Set(slug),
        description: Set(req.description),
        location: Set(req.location),
        city: Set(req.city),
        state: Set(req.state),
        latitude: Set(req.latitude),
        longitude: Set(req.longitude),
        price: Set(req.price),
        bedrooms: Set(req.bedrooms),
        bathrooms: Set(req.bathrooms),
        area_sqft: Set(req.area_sqft),
        property_type: Set(req.property_type),
        featured_image: Set(featured_image),
        amenities: Set(json!(req.amenities)),
        status: Set(req.status.unwrap_or(PropertyStatus::Available)),
        is_featured: Set(req.is_featured),
        views: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await
    .map_err(|e| if is_unique_violation(&e) { slug_conflict() } else { e.into() })?;

    replace_images(&txn, model.id, &req.images).await?;
    let detail = load_detail(&txn, model).await?;
    txn.commit().await?;

    invalidate_listing_caches(&state).await;
    info!(
        "Property {} ({}) created by {}",
        detail.property.id, detail.property.slug, admin.user_id
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::new(detail))))
}

/// Update a property (admin)
#[utoipa::path(
    put,
    path = "/api/admin/properties/{id}",
    params(
        ("id" = Uuid, Path, description = "Property ID")
    ),
    request_body = UpdatePropertyRequest,
    responses(
        (status = 200, description = "Property updated", body = PropertyDetail),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Property not found", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn update_property(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePropertyRequest>,
) -> ApiResult<Json<ApiResponse<PropertyDetail>>> {
    req.validate()?;

    let txn = state.db.begin().await?;

    let existing = property::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("Property not found").with_code("PROPERTY_NOT_FOUND"))?;

    ensure_category(&txn, req.category_id).await?;

    let new_slug = match req.slug.as_deref().map(slugify) {
        Some(slug) if slug != existing.slug => {
            Some(unique_slug::<property::Entity, _>(&txn, property::Column::Slug, &slug).await?)
        }
        _ => None,
    };

    let mut active: property::ActiveModel = existing.into();

    if let Some(slug) = new_slug {
        active.slug = Set(slug);
    }
    if let Some(title) = req.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = req.description {
        active.description = Set(description);
    }
    if let Some(location) = req.location {
        active.location = Set(location);
    }
    if let Some(city) = req.city {
        active.city = Set(Some(city));
    }
    if let Some(state_name) = req.state {
        active.state = Set(Some(state_name));
    }
    if let Some(latitude) = req.latitude {
        active.latitude = Set(Some(latitude));
    }
    if let Some(longitude) = req.longitude {
        active.longitude = Set(Some(longitude));
    }
    if let Some(price) = req.price {
        active.price = Set(price);
    }
    if let Some(bedrooms) = req.bedrooms {
        active.bedrooms = Set(bedrooms);
    }
    if let Some(bathrooms) = req.bathrooms {
        active.bathrooms = Set(bathrooms);
    }
    if let Some(area_sqft) = req.area_sqft {
        active.area_sqft = Set(area_sqft);
    }
    if let Some(property_type) = req.property_type {
        active.property_type = Set(property_type);
    }
    if let Some(category_id) = req.category_id {
        active.category_id = Set(Some(category_id));
    }
    if let Some(featured_image) = req.featured_image {
        active.featured_image = Set(Some(featured_image));
    }
    if let Some(amenities) = req.amenities {
        active.amenities = Set(json!(amenities));
    }
    if let Some(status) = req.status {
        active.status = Set(status);
    }
    if let Some(is_featured) = req.is_featured {
        active.is_featured = Set(is_featured);
    }
    active.updated_at = Set(Utc::now());

    let model = active
        .update(&txn)
        .await
        .map_err(|e| if is_unique_violation(&e) { slug_conflict() } else { e.into() })?;

    if let Some(images) = req.images {
        replace_images(&txn, model.id, &images).await?;
    }

    let detail = load_detail(&txn, model).await?;
    txn.commit().await?;

    invalidate_listing_caches(&state).await;
    info!("Property {} updated", id);

    Ok(Json(ApiResponse::new(detail)))
}

/// Delete a property (admin)
#[utoipa::path(
    delete,
    path = "/api/admin/properties/{id}",
    params(
        ("id" = Uuid, Path, description = "Property ID")
    ),
    responses(
        (status = 200, description = "Property deleted", body = MessageResponse),
        (status = 404, description = "Property not found", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn delete_property(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<MessageResponse>>> {
    let result = property::Entity::delete_by_id(id).exec(&state.db).await?;

    if result.rows_affected == 0 {
        return Err(ApiError::not_found("Property not found").with_code("PROPERTY_NOT_FOUND"));
    }

    invalidate_listing_caches(&state).await;
    info!("Property {} deleted", id);

    Ok(Json(ApiResponse::new(MessageResponse::new(
        "Property deleted successfully",
    ))))
}

/// Create a category (admin)
#[utoipa::path(
    post,
    path = "/api/admin/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 409, description = "Slug already taken", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Category>>)> {
    req.validate()?;

    let slug = slugify(req.slug.as_deref().unwrap_or(&req.name));
    if slug.is_empty() {
        return Err(ApiError::invalid_field("slug", "Slug must contain letters or digits"));
    }

    let model = category::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(req.name.trim().to_string()),
        slug: Set(slug),
        description: Set(req.description),
        icon: Set(req.icon),
        created_at: Set(Utc::now()),
    }
    .insert(&state.db)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::conflict("A category with this slug already exists")
                .with_code("CATEGORY_EXISTS")
        } else {
            e.into()
        }
    })?;

    info!("Category {} created", model.slug);
    Ok((StatusCode::CREATED, Json(ApiResponse::new(model.into()))))
}

/// List a property's specifications (admin)
#[utoipa::path(
    get,
    path = "/api/admin/properties/{id}/specifications",
    params(
        ("id" = Uuid, Path, description = "Property ID")
    ),
    responses(
        (status = 200, description = "Specifications by category and display order", body = [PropertySpecification]),
        (status = 404, description = "Property not found", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn list_specifications(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<PropertySpecification>>>> {
    ensure_property(&state.db, id).await?;
    Ok(Json(ApiResponse::new(load_specifications(&state.db, id).await?)))
}

/// Add a specification to a property (admin)
#[utoipa::path(
    post,
    path = "/api/admin/properties/{id}/specifications",
    params(
        ("id" = Uuid, Path, description = "Property ID")
    ),
    request_body = CreateSpecificationRequest,
    responses(
        (status = 201, description = "Specification created", body = PropertySpecification),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Property not found", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn create_specification(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateSpecificationRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<PropertySpecification>>)> {
    req.validate()?;
    ensure_property(&state.db, id).await?;

    let now = Utc::now();
    let model = property_specification::ActiveModel {
        id: Set(Uuid::new_v4()),
        property_id: Set(id),
        category: Set(req.category.trim().to_string()),
        label: Set(req.label.trim().to_string()),
        value: Set(req.value),
        display_order: Set(req.display_order),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    info!("Specification {} added to property {}", model.id, id);
    Ok((StatusCode::CREATED, Json(ApiResponse::new(model.into()))))
}

/// Update a specification (admin)
#[utoipa::path(
    put,
    path = "/api/admin/properties/{id}/specifications/{spec_id}",
    params(
        ("id" = Uuid, Path, description = "Property ID"),
        ("spec_id" = Uuid, Path, description = "Specification ID")
    ),
    request_body = UpdateSpecificationRequest,
    responses(
        (status = 200, description = "Specification updated", body = PropertySpecification),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Specification not found", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn update_specification(
    State(state): State<Arc<AppState>>,
    Path((id, spec_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateSpecificationRequest>,
) -> ApiResult<Json<ApiResponse<PropertySpecification>>> {
    req.validate()?;

    let mut active: property_specification::ActiveModel =
        find_specification(&state.db, id, spec_id).await?.into();

    if let Some(category) = req.category {
        active.category = Set(category.trim().to_string());
    }
    if let Some(label) = req.label {
        active.label = Set(label.trim().to_string());
    }
    if let Some(value) = req.value {
        active.value = Set(value);
    }
    if let Some(display_order) = req.display_order {
        active.display_order = Set(display_order);
    }
    active.updated_at = Set(Utc::now());

    let model = active.update(&state.db).await?;
    Ok(Json(ApiResponse::new(model.into())))
}

/// Delete a specification (admin)
#[utoipa::path(
    delete,
    path = "/api/admin/properties/{id}/specifications/{spec_id}",
    params(
        ("id" = Uuid, Path, description = "Property ID"),
        ("spec_id" = Uuid, Path, description = "Specification ID")
    ),
    responses(
        (status = 200, description = "Specification deleted", body = MessageResponse),
        (status = 404, description = "Specification not found", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn delete_specification(
    State(state): State<Arc<AppState>>,
    Path((id, spec_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<ApiResponse<MessageResponse>>> {
    let spec = find_specification(&state.db, id, spec_id).await?;
    spec.delete(&state.db).await?;

    info!("Specification {} removed from property {}", spec_id, id);
    Ok(Json(ApiResponse::new(MessageResponse::new(
        "Specification deleted successfully",
    ))))
}
