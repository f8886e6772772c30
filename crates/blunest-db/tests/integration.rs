//! Integration tests for blunest-db
//!
//! Runs the migrations against an in-memory SQLite database

use blunest_db::{
    connect,
    entities::{
        ai_agent_configuration, city, city_location, group_member, property,
        property_configuration, property_group, property_specification, subscription_plan, user,
        user_subscription,
    },
    is_unique_violation, migrate,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, Statement,
};
use serde_json::json;
use uuid::Uuid;

/// Helper to create a test database
async fn setup_test_db() -> sea_orm::DatabaseConnection {
    let db = connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    migrate(&db).await.expect("Failed to run migrations");

    db
}

async fn insert_property(db: &sea_orm::DatabaseConnection, slug: &str) -> property::Model {
    let now = Utc::now();
    property::ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(None),
        category_id: Set(None),
        title: Set("Sea facing apartment in Bandra".to_string()),
        slug: Set(slug.to_string()),
        description: Set("A bright three bedroom apartment close to the promenade.".to_string()),
        location: Set("Bandra West, Mumbai".to_string()),
        city: Set(Some("Mumbai".to_string())),
        state: Set(Some("Maharashtra".to_string())),
        latitude: Set(None),
        longitude: Set(None),
        price: Set(45_000_000.0),
        bedrooms: Set(3),
        bathrooms: Set(2),
        area_sqft: Set(1450.0),
        property_type: Set("apartment".to_string()),
        featured_image: Set(None),
        amenities: Set(json!(["gym", "pool"])),
        status: Set(property::PropertyStatus::Available),
        is_featured: Set(false),
        views: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("Failed to insert property")
}

async fn insert_group(db: &sea_orm::DatabaseConnection, property_id: Uuid) -> property_group::Model {
    let now = Utc::now();
    property_group::ActiveModel {
        id: Set(Uuid::new_v4()),
        property_id: Set(property_id),
        total_slots: Set(5),
        filled_slots: Set(0),
        is_locked: Set(false),
        status: Set(property_group::GroupStatus::Open),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("Failed to insert group")
}

fn member(group_id: Uuid, user_id: Uuid) -> group_member::ActiveModel {
    group_member::ActiveModel {
        id: Set(Uuid::new_v4()),
        group_id: Set(group_id),
        user_id: Set(Some(user_id)),
        full_name: Set("Asha Rao".to_string()),
        email: Set("asha@example.com".to_string()),
        phone: Set(None),
        investment_amount: Set(Some(500_000.0)),
        status: Set(group_member::MemberStatus::Pending),
        joined_at: Set(Utc::now()),
    }
}

#[tokio::test]
async fn test_database_connection() {
    let db = connect("sqlite::memory:").await.expect("Failed to connect");

    let backend = db.get_database_backend();
    assert!(matches!(backend, sea_orm::DatabaseBackend::Sqlite));
}

#[tokio::test]
async fn test_migrations_seed_plans() {
    let db = setup_test_db().await;

    let plans = subscription_plan::Entity::find()
        .order_by_asc(subscription_plan::Column::DisplayOrder)
        .all(&db)
        .await
        .expect("Failed to load plans");

    let slugs: Vec<&str> = plans.iter().map(|p| p.slug.as_str()).collect();
    assert_eq!(slugs, vec!["free", "ai_basic", "ai_pro", "ai_enterprise"]);

    let free = &plans[0];
    assert_eq!(free.analyses_per_month, 3);
    assert!(free.allows_agent("market_pulse"));
    assert!(!free.allows_agent("deal_underwriter"));

    let enterprise = &plans[3];
    assert!(enterprise.is_unlimited());
    assert!(enterprise.allows_agent("committee_synthesizer"));
}

#[tokio::test]
async fn test_migrations_seed_agents() {
    let db = setup_test_db().await;

    let count = ai_agent_configuration::Entity::find()
        .filter(ai_agent_configuration::Column::IsEnabled.eq(true))
        .count(&db)
        .await
        .expect("Failed to count agents");
    assert_eq!(count, 6);

    let agent = ai_agent_configuration::Entity::find()
        .filter(ai_agent_configuration::Column::AgentSlug.eq("deal_underwriter"))
        .one(&db)
        .await
        .expect("Query failed")
        .expect("Agent missing");
    assert_eq!(agent.version, 1);
    assert_eq!(agent.model, "default");
}

#[tokio::test]
async fn test_optional_columns_are_nullable() {
    let db = setup_test_db().await;

    let rows = db
        .query_all(Statement::from_string(
            DbBackend::Sqlite,
            "SELECT name, sql FROM sqlite_master WHERE type = 'table'",
        ))
        .await
        .expect("Failed to read schema");
    for row in rows {
        let name: String = row.try_get("", "name").unwrap();
        let sql: Option<String> = row.try_get("", "sql").unwrap();
        let sql = sql.unwrap_or_default();
        assert!(!sql.contains("NOT NULL NULL"), "{name} declares a column both ways: {sql}");
    }

    // Property, member and subscription rows with every optional field unset
    let property = insert_property(&db, "no-optional-fields").await;
    assert!(property.featured_image.is_none());

    let group = insert_group(&db, property.id).await;
    let saved = member(group.id, Uuid::new_v4())
        .insert(&db)
        .await
        .expect("Member without phone should insert");
    assert!(saved.phone.is_none());

    let now = Utc::now();
    let profile = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set("bare@example.com".to_string()),
        full_name: Set(None),
        phone: Set(None),
        role: Set(user::UserRole::User),
        avatar_url: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&db)
    .await
    .expect("Profile without name or phone should insert");

    let plan = subscription_plan::Entity::find()
        .filter(subscription_plan::Column::Slug.eq("ai_basic"))
        .one(&db)
        .await
        .unwrap()
        .expect("seeded plan");

    // Two pending subscriptions may both lack a gateway id
    for _ in 0..2 {
        user_subscription::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(profile.id),
            plan_id: Set(plan.id),
            status: Set(user_subscription::SubscriptionStatus::Created),
            gateway_subscription_id: Set(None),
            gateway_plan_id: Set(None),
            current_period_start: Set(None),
            current_period_end: Set(None),
            cancel_at_period_end: Set(false),
            cancelled_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&db)
        .await
        .expect("Subscription without gateway ids should insert");
    }
}

#[tokio::test]
async fn test_duplicate_membership_is_rejected() {
    let db = setup_test_db().await;
    let property = insert_property(&db, "bandra-sea-view").await;
    let group = insert_group(&db, property.id).await;
    let user_id = Uuid::new_v4();

    member(group.id, user_id)
        .insert(&db)
        .await
        .expect("First membership should insert");

    let err = member(group.id, user_id)
        .insert(&db)
        .await
        .expect_err("Second membership must violate the unique index");
    assert!(is_unique_violation(&err));

    let count = group_member::Entity::find()
        .filter(group_member::Column::GroupId.eq(group.id))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_one_group_per_property() {
    let db = setup_test_db().await;
    let property = insert_property(&db, "one-group-only").await;
    insert_group(&db, property.id).await;

    let now = Utc::now();
    let err = property_group::ActiveModel {
        id: Set(Uuid::new_v4()),
        property_id: Set(property.id),
        total_slots: Set(3),
        filled_slots: Set(0),
        is_locked: Set(false),
        status: Set(property_group::GroupStatus::Open),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&db)
    .await
    .expect_err("Second group for the same property must fail");
    assert!(is_unique_violation(&err));
}

#[tokio::test]
async fn test_filled_slots_cannot_exceed_total() {
    let db = setup_test_db().await;
    let property = insert_property(&db, "check-constraint").await;
    let group = insert_group(&db, property.id).await;

    let mut active: property_group::ActiveModel = group.into();
    active.filled_slots = Set(6);
    let result = active.update(&db).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_property_slug_is_unique() {
    let db = setup_test_db().await;
    insert_property(&db, "same-slug").await;

    let now = Utc::now();
    let err = property::ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(None),
        category_id: Set(None),
        title: Set("Another listing".to_string()),
        slug: Set("same-slug".to_string()),
        description: Set("Different listing that reuses the slug.".to_string()),
        location: Set("Pune".to_string()),
        city: Set(None),
        state: Set(None),
        latitude: Set(None),
        longitude: Set(None),
        price: Set(1.0),
        bedrooms: Set(1),
        bathrooms: Set(1),
        area_sqft: Set(400.0),
        property_type: Set("apartment".to_string()),
        featured_image: Set(None),
        amenities: Set(json!([])),
        status: Set(property::PropertyStatus::Draft),
        is_featured: Set(false),
        views: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&db)
    .await
    .expect_err("Duplicate slug must fail");
    assert!(is_unique_violation(&err));
}

#[tokio::test]
async fn test_migrations_seed_search_lookups() {
    let db = setup_test_db().await;

    let configurations: Vec<String> = property_configuration::Entity::find()
        .order_by_asc(property_configuration::Column::DisplayOrder)
        .all(&db)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(configurations.first().map(String::as_str), Some("1 RK"));
    assert!(configurations.contains(&"2 BHK".to_string()));

    let pune = city::Entity::find()
        .filter(city::Column::Name.eq("Pune"))
        .one(&db)
        .await
        .unwrap()
        .expect("Pune should be seeded");
    assert_eq!(pune.state, "Maharashtra");

    let localities = city_location::Entity::find()
        .filter(city_location::Column::CityId.eq(pune.id))
        .count(&db)
        .await
        .unwrap();
    assert!(localities > 0);
}

#[tokio::test]
async fn test_specifications_follow_property_delete() {
    let db = setup_test_db().await;
    let property = insert_property(&db, "bandra-specs").await;

    let now = Utc::now();
    for (order, label) in ["Living room", "Bedrooms"].iter().enumerate() {
        property_specification::ActiveModel {
            id: Set(Uuid::new_v4()),
            property_id: Set(property.id),
            category: Set("Flooring".to_string()),
            label: Set(label.to_string()),
            value: Set("Italian marble".to_string()),
            display_order: Set(order as i32),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&db)
        .await
        .expect("Failed to insert specification");
    }

    let orphan = property_specification::ActiveModel {
        id: Set(Uuid::new_v4()),
        property_id: Set(Uuid::new_v4()),
        category: Set("Flooring".to_string()),
        label: Set("Kitchen".to_string()),
        value: Set("Vitrified tiles".to_string()),
        display_order: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&db)
    .await;
    assert!(orphan.is_err(), "specification must reference a property");

    property::Entity::delete_by_id(property.id)
        .exec(&db)
        .await
        .unwrap();

    let remaining = property_specification::Entity::find().count(&db).await.unwrap();
    assert_eq!(remaining, 0);
}
