use axum::{
    extract::{Path, State},
    Json,
};
use blunest_db::entities::{city, city_location, property_configuration};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{ApiResponse, City, CityLocation, Configuration, ErrorResponse};
use crate::AppState;

/// Cities offered by the search filters
#[utoipa::path(
    get,
    path = "/api/search/cities",
    responses(
        (status = 200, description = "Active cities in display order", body = [City])
    ),
    tag = "directory"
)]
pub async fn list_cities(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ApiResponse<Vec<City>>>> {
    let cities = city::Entity::find()
        .filter(city::Column::IsActive.eq(true))
        .order_by_asc(city::Column::DisplayOrder)
        .order_by_asc(city::Column::Name)
        .all(&state.db)
        .await?;

    Ok(Json(ApiResponse::new(cities.into_iter().map(City::from).collect())))
}

/// Localities of one city
#[utoipa::path(
    get,
    path = "/api/search/locations/{city_id}",
    params(
        ("city_id" = Uuid, Path, description = "City ID")
    ),
    responses(
        (status = 200, description = "Active localities in display order", body = [CityLocation]),
        (status = 404, description = "City not found", body = ErrorResponse)
    ),
    tag = "directory"
)]
pub async fn list_locations(
    State(state): State<Arc<AppState>>,
    Path(city_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<CityLocation>>>> {
    let city = city::Entity::find_by_id(city_id)
        .filter(city::Column::IsActive.eq(true))
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("City not found").with_code("CITY_NOT_FOUND"))?;

    let locations = city_location::Entity::find()
        .filter(city_location::Column::CityId.eq(city.id))
        .filter(city_location::Column::IsActive.eq(true))
        .order_by_asc(city_location::Column::DisplayOrder)
        .order_by_asc(city_location::Column::Name)
        .all(&state.db)
        .await?;

    Ok(Json(ApiResponse::new(
        locations.into_iter().map(CityLocation::from).collect(),
    )))
}

/// Unit configurations such as "2 BHK"
#[utoipa::path(
    get,
    path = "/api/search/configurations",
    responses(
        (status = 200, description = "Active configurations in display order", body = [Configuration])
    ),
    tag = "directory"
)]
pub async fn list_configurations(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ApiResponse<Vec<Configuration>>>> {
    let configurations = property_configuration::Entity::find()
        .filter(property_configuration::Column::IsActive.eq(true))
        .order_by_asc(property_configuration::Column::DisplayOrder)
        .all(&state.db)
        .await?;

    Ok(Json(ApiResponse::new(
        configurations.into_iter().map(Configuration::from).collect(),
    )))
}
