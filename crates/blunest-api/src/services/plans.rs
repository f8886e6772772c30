//! Plan resolution and monthly usage metering

use blunest_db::entities::{
    prelude::{SubscriptionPlan, SubscriptionUsageLog, UserSubscription},
    subscription_plan::{self, FREE_PLAN_SLUG},
    subscription_usage_log::{self, UsageType},
    user_subscription::{self, SubscriptionStatus},
};
use chrono::{DateTime, Datelike, TimeZone, Utc};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Plan in force for a user, with the subscription that grants it
#[derive(Debug, Clone)]
pub struct CurrentPlan {
    pub subscription: Option<user_subscription::Model>,
    pub plan: subscription_plan::Model,
}

/// Midnight UTC on the first day of `now`'s month
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

pub async fn find_active_subscription<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
) -> ApiResult<Option<(user_subscription::Model, Option<subscription_plan::Model>)>> {
    let found = UserSubscription::find()
        .filter(user_subscription::Column::UserId.eq(user_id))
        .filter(user_subscription::Column::Status.eq(SubscriptionStatus::Active))
        .order_by_desc(user_subscription::Column::CreatedAt)
        .find_also_related(SubscriptionPlan)
        .one(db)
        .await?;

    Ok(found)
}

pub async fn free_plan<C: ConnectionTrait>(db: &C) -> ApiResult<subscription_plan::Model> {
    SubscriptionPlan::find()
        .filter(subscription_plan::Column::Slug.eq(FREE_PLAN_SLUG))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::Config("Free plan is missing from subscription_plans".to_string()))
}

/// Active subscription's plan, or the free plan
pub async fn current_plan<C: ConnectionTrait>(db: &C, user_id: Uuid) -> ApiResult<CurrentPlan> {
    match find_active_subscription(db, user_id).await? {
        Some((subscription, Some(plan))) => Ok(CurrentPlan {
            subscription: Some(subscription),
            plan,
        }),
        _ => Ok(CurrentPlan {
            subscription: None,
            plan: free_plan(db).await?,
        }),
    }
}

/// AI analyses the user ran since the start of the current month
pub async fn analyses_this_month<C: ConnectionTrait>(db: &C, user_id: Uuid) -> ApiResult<u64> {
    let count = SubscriptionUsageLog::find()
        .filter(subscription_usage_log::Column::UserId.eq(user_id))
        .filter(subscription_usage_log::Column::UsageType.eq(UsageType::AiAnalysis))
        .filter(subscription_usage_log::Column::CreatedAt.gte(month_start(Utc::now())))
        .count(db)
        .await?;

    Ok(count)
}

/// Whether another analysis fits into the plan's monthly allowance
pub fn within_limit(plan: &subscription_plan::Model, used: u64) -> bool {
    plan.is_unlimited() || used < plan.analyses_per_month as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_start() {
        let now = Utc.with_ymd_and_hms(2025, 3, 17, 14, 5, 9).unwrap();
        assert_eq!(
            month_start(now),
            Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()
        );
    }
}
