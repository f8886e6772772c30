use axum::{extract::State, Extension, Json};
use blunest_db::entities::{enquiry, property, property::PropertyStatus, user};
use chrono::{Duration, Utc};
use sea_orm::{
    sea_query::Expr, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::ApiResult;
use crate::middleware::AdminUser;
use crate::models::{
    ApiResponse, DashboardStats, DashboardTotals, ErrorResponse, MessageResponse, Property,
    SalesAnalytics, UserProfile,
};
use crate::AppState;

const FEATURED_ON_DASHBOARD: u64 = 3;
const RECENT_USERS: u64 = 4;
const NEW_ENQUIRY_WINDOW_DAYS: i64 = 30;

/// Share of `part` in `total` as a percentage with one decimal
fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 / total as f64 * 1000.0).round() / 10.0
}

async fn count_by_status(db: &DatabaseConnection, status: PropertyStatus) -> ApiResult<u64> {
    Ok(property::Entity::find()
        .filter(property::Column::Status.eq(status))
        .count(db)
        .await?)
}

async fn load_stats(db: &DatabaseConnection) -> ApiResult<DashboardStats> {
    let total_properties = property::Entity::find().count(db).await?;
    let on_sale = count_by_status(db, PropertyStatus::Available).await?;
    let sold = count_by_status(db, PropertyStatus::Sold).await?;

    let since = Utc::now() - Duration::days(NEW_ENQUIRY_WINDOW_DAYS);
    let new_enquiries = enquiry::Entity::find()
        .filter(enquiry::Column::CreatedAt.gte(since))
        .count(db)
        .await?;

    let total_users = user::Entity::find().count(db).await?;

    let total_revenue = property::Entity::find()
        .select_only()
        .column_as(Expr::col(property::Column::Price).sum(), "revenue")
        .filter(property::Column::Status.eq(PropertyStatus::Sold))
        .into_tuple::<Option<f64>>()
        .one(db)
        .await?
        .flatten()
        .unwrap_or(0.0);

    let featured_properties = property::Entity::find()
        .filter(property::Column::IsFeatured.eq(true))
        .order_by_desc(property::Column::CreatedAt)
        .limit(FEATURED_ON_DASHBOARD)
        .all(db)
        .await?
        .into_iter()
        .map(Property::from)
        .collect();

    let recent_users = user::Entity::find()
        .order_by_desc(user::Column::CreatedAt)
        .limit(RECENT_USERS)
        .all(db)
        .await?
        .into_iter()
        .map(UserProfile::from)
        .collect();

    Ok(DashboardStats {
        totals: DashboardTotals {
            total_properties,
            new_enquiries,
            total_users,
            total_revenue,
            on_sale,
            sold,
        },
        sales: SalesAnalytics {
            sold_percentage: percentage(sold, total_properties),
            available_percentage: percentage(on_sale, total_properties),
        },
        featured_properties,
        recent_users,
        cached: false,
    })
}

/// Admin dashboard statistics
#[utoipa::path(
    get,
    path = "/api/admin/dashboard",
    responses(
        (status = 200, description = "Totals, sales split, featured listings and recent users", body = DashboardStats),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn dashboard_stats(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ApiResponse<DashboardStats>>> {
    if let Some(mut stats) = state.dashboard_cache.get().await {
        debug!("Dashboard served from cache");
        stats.cached = true;
        return Ok(Json(ApiResponse::new(stats)));
    }

    let stats = load_stats(&state.db).await?;
    state.dashboard_cache.set(stats.clone()).await;

    Ok(Json(ApiResponse::new(stats)))
}

/// Drop the cached dashboard statistics
#[utoipa::path(
    post,
    path = "/api/admin/dashboard/invalidate",
    responses(
        (status = 200, description = "Cache cleared", body = MessageResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn invalidate_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminUser>,
) -> Json<ApiResponse<MessageResponse>> {
    state.dashboard_cache.invalidate().await;
    info!("Dashboard cache cleared by {}", admin.user_id);

    Json(ApiResponse::new(MessageResponse::new("Dashboard cache cleared")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(1, 3), 33.3);
        assert_eq!(percentage(2, 3), 66.7);
        assert_eq!(percentage(5, 5), 100.0);
    }
}
