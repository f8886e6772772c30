//! Initial marketplace schema

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

fn created_at<T: IntoIden>(col: T) -> ColumnDef {
    timestamp_with_time_zone(col)
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================================
        // 1. users
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(uuid(User::Id).primary_key())
                    .col(string_len(User::Email, 255).not_null().unique_key())
                    .col(string_len_null(User::FullName, 255))
                    .col(string_len_null(User::Phone, 32))
                    .col(string_len(User::Role, 32).not_null().default("user"))
                    .col(string_len_null(User::AvatarUrl, 1024))
                    .col(created_at(User::CreatedAt))
                    .col(created_at(User::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 2. categories and properties
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Category::Table)
                    .if_not_exists()
                    .col(uuid(Category::Id).primary_key())
                    .col(string_len(Category::Name, 255).not_null())
                    .col(string_len(Category::Slug, 255).not_null().unique_key())
                    .col(ColumnDef::new(Category::Description).text())
                    .col(string_len_null(Category::Icon, 64))
                    .col(created_at(Category::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Property::Table)
                    .if_not_exists()
                    .col(uuid(Property::Id).primary_key())
                    .col(ColumnDef::new(Property::OwnerId).uuid())
                    .col(ColumnDef::new(Property::CategoryId).uuid())
                    .col(string_len(Property::Title, 255).not_null())
                    .col(string_len(Property::Slug, 255).not_null().unique_key())
                    .col(ColumnDef::new(Property::Description).text().not_null())
                    .col(string_len(Property::Location, 255).not_null())
                    .col(string_len_null(Property::City, 128))
                    .col(string_len_null(Property::State, 128))
                    .col(ColumnDef::new(Property::Latitude).double())
                    .col(ColumnDef::new(Property::Longitude).double())
                    .col(ColumnDef::new(Property::Price).double().not_null())
                    .col(ColumnDef::new(Property::Bedrooms).integer().not_null().default(0))
                    .col(ColumnDef::new(Property::Bathrooms).integer().not_null().default(0))
                    .col(ColumnDef::new(Property::AreaSqft).double().not_null().default(0.0))
                    .col(string_len(Property::PropertyType, 64).not_null())
                    .col(string_len_null(Property::FeaturedImage, 1024))
                    .col(ColumnDef::new(Property::Amenities).json().not_null())
                    .col(
                        string_len(Property::Status, 32)
                            .not_null()
                            .default("available"),
                    )
                    .col(boolean(Property::IsFeatured).not_null().default(false))
                    .col(ColumnDef::new(Property::Views).integer().not_null().default(0))
                    .col(created_at(Property::CreatedAt))
                    .col(created_at(Property::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_properties_category_id")
                            .from(Property::Table, Property::CategoryId)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_properties_status_created_at")
                    .table(Property::Table)
                    .col(Property::Status)
                    .col(Property::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PropertyImage::Table)
                    .if_not_exists()
                    .col(uuid(PropertyImage::Id).primary_key())
                    .col(uuid(PropertyImage::PropertyId).not_null())
                    .col(string_len(PropertyImage::Url, 1024).not_null())
                    .col(string_len_null(PropertyImage::AltText, 255))
                    .col(
                        ColumnDef::new(PropertyImage::OrderIndex)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(boolean(PropertyImage::IsPrimary).not_null().default(false))
                    .col(created_at(PropertyImage::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_property_images_property_id")
                            .from(PropertyImage::Table, PropertyImage::PropertyId)
                            .to(Property::Table, Property::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 3. group buying
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(PropertyGroup::Table)
                    .if_not_exists()
                    .col(uuid(PropertyGroup::Id).primary_key())
                    .col(uuid(PropertyGroup::PropertyId).not_null().unique_key())
                    .col(
                        ColumnDef::new(PropertyGroup::TotalSlots)
                            .integer()
                            .not_null()
                            .default(5),
                    )
                    .col(
                        ColumnDef::new(PropertyGroup::FilledSlots)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(boolean(PropertyGroup::IsLocked).not_null().default(false))
                    .col(
                        string_len(PropertyGroup::Status, 16)
                            .not_null()
                            .default("open"),
                    )
                    .col(created_at(PropertyGroup::CreatedAt))
                    .col(created_at(PropertyGroup::UpdatedAt))
                    .check(Expr::col(PropertyGroup::FilledSlots).gte(0))
                    .check(
                        Expr::col(PropertyGroup::FilledSlots)
                            .lte(Expr::col(PropertyGroup::TotalSlots)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_property_groups_property_id")
                            .from(PropertyGroup::Table, PropertyGroup::PropertyId)
                            .to(Property::Table, Property::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GroupMember::Table)
                    .if_not_exists()
                    .col(uuid(GroupMember::Id).primary_key())
                    .col(uuid(GroupMember::GroupId).not_null())
                    .col(ColumnDef::new(GroupMember::UserId).uuid())
                    .col(string_len(GroupMember::FullName, 255).not_null())
                    .col(string_len(GroupMember::Email, 255).not_null())
                    .col(string_len_null(GroupMember::Phone, 32))
                    .col(ColumnDef::new(GroupMember::InvestmentAmount).double())
                    .col(
                        string_len(GroupMember::Status, 16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(created_at(GroupMember::JoinedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_members_group_id")
                            .from(GroupMember::Table, GroupMember::GroupId)
                            .to(PropertyGroup::Table, PropertyGroup::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One membership per user per group
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_group_members_group_user")
                    .table(GroupMember::Table)
                    .col(GroupMember::GroupId)
                    .col(GroupMember::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 4. enquiries, leads, contact, newsletter
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Enquiry::Table)
                    .if_not_exists()
                    .col(uuid(Enquiry::Id).primary_key())
                    .col(uuid(Enquiry::PropertyId).not_null())
                    .col(ColumnDef::new(Enquiry::UserId).uuid())
                    .col(string_len(Enquiry::FullName, 255).not_null())
                    .col(string_len(Enquiry::Email, 255).not_null())
                    .col(string_len(Enquiry::Phone, 32).not_null())
                    .col(ColumnDef::new(Enquiry::Message).text())
                    .col(ColumnDef::new(Enquiry::InvestmentAmount).double())
                    .col(string_len(Enquiry::Status, 16).not_null().default("new"))
                    .col(created_at(Enquiry::CreatedAt))
                    .col(created_at(Enquiry::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_enquiries_property_id")
                            .from(Enquiry::Table, Enquiry::PropertyId)
                            .to(Property::Table, Property::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PropertyLead::Table)
                    .if_not_exists()
                    .col(uuid(PropertyLead::Id).primary_key())
                    .col(ColumnDef::new(PropertyLead::PropertyId).uuid())
                    .col(ColumnDef::new(PropertyLead::UserId).uuid())
                    .col(string_len(PropertyLead::LeadType, 32).not_null())
                    .col(string_len(PropertyLead::FullName, 255).not_null())
                    .col(string_len(PropertyLead::Email, 255).not_null())
                    .col(string_len_null(PropertyLead::Phone, 32))
                    .col(ColumnDef::new(PropertyLead::Message).text())
                    .col(
                        string_len(PropertyLead::Status, 16)
                            .not_null()
                            .default("new"),
                    )
                    .col(ColumnDef::new(PropertyLead::Notes).text())
                    .col(ColumnDef::new(PropertyLead::AssignedTo).uuid())
                    .col(created_at(PropertyLead::CreatedAt))
                    .col(created_at(PropertyLead::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_property_leads_property_id")
                    .table(PropertyLead::Table)
                    .col(PropertyLead::PropertyId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ContactMessage::Table)
                    .if_not_exists()
                    .col(uuid(ContactMessage::Id).primary_key())
                    .col(string_len(ContactMessage::Name, 255).not_null())
                    .col(string_len(ContactMessage::Email, 255).not_null())
                    .col(string_len_null(ContactMessage::Phone, 32))
                    .col(string_len(ContactMessage::Subject, 255).not_null())
                    .col(ColumnDef::new(ContactMessage::Message).text().not_null())
                    .col(
                        string_len(ContactMessage::Status, 16)
                            .not_null()
                            .default("new"),
                    )
                    .col(created_at(ContactMessage::CreatedAt))
                    .col(created_at(ContactMessage::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(NewsletterSubscriber::Table)
                    .if_not_exists()
                    .col(uuid(NewsletterSubscriber::Id).primary_key())
                    .col(
                        string_len(NewsletterSubscriber::Email, 255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        boolean(NewsletterSubscriber::Subscribed)
                            .not_null()
                            .default(true),
                    )
                    .col(created_at(NewsletterSubscriber::CreatedAt))
                    .col(created_at(NewsletterSubscriber::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 5. subscriptions
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(SubscriptionPlan::Table)
                    .if_not_exists()
                    .col(uuid(SubscriptionPlan::Id).primary_key())
                    .col(string_len(SubscriptionPlan::Name, 128).not_null())
                    .col(
                        string_len(SubscriptionPlan::Slug, 64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(SubscriptionPlan::Description).text())
                    .col(
                        ColumnDef::new(SubscriptionPlan::PriceMonthly)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(SubscriptionPlan::PriceYearly).double())
                    .col(
                        ColumnDef::new(SubscriptionPlan::AnalysesPerMonth)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SubscriptionPlan::MaxPropertiesComparison)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(SubscriptionPlan::AgentsAccess).json().not_null())
                    .col(ColumnDef::new(SubscriptionPlan::Features).json().not_null())
                    .col(boolean(SubscriptionPlan::IsActive).not_null().default(true))
                    .col(
                        ColumnDef::new(SubscriptionPlan::DisplayOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(created_at(SubscriptionPlan::CreatedAt))
                    .col(created_at(SubscriptionPlan::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserSubscription::Table)
                    .if_not_exists()
                    .col(uuid(UserSubscription::Id).primary_key())
                    .col(uuid(UserSubscription::UserId).not_null())
                    .col(uuid(UserSubscription::PlanId).not_null())
                    .col(
                        string_len(UserSubscription::Status, 16)
                            .not_null()
                            .default("created"),
                    )
                    .col(
                        string_len_null(UserSubscription::GatewaySubscriptionId, 128)
                            .unique_key(),
                    )
                    .col(string_len_null(UserSubscription::GatewayPlanId, 128))
                    .col(ColumnDef::new(UserSubscription::CurrentPeriodStart).timestamp_with_time_zone())
                    .col(ColumnDef::new(UserSubscription::CurrentPeriodEnd).timestamp_with_time_zone())
                    .col(
                        boolean(UserSubscription::CancelAtPeriodEnd)
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(UserSubscription::CancelledAt).timestamp_with_time_zone())
                    .col(created_at(UserSubscription::CreatedAt))
                    .col(created_at(UserSubscription::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_subscriptions_plan_id")
                            .from(UserSubscription::Table, UserSubscription::PlanId)
                            .to(SubscriptionPlan::Table, SubscriptionPlan::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_subscriptions_user_status")
                    .table(UserSubscription::Table)
                    .col(UserSubscription::UserId)
                    .col(UserSubscription::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SubscriptionUsageLog::Table)
                    .if_not_exists()
                    .col(uuid(SubscriptionUsageLog::Id).primary_key())
                    .col(uuid(SubscriptionUsageLog::UserId).not_null())
                    .col(ColumnDef::new(SubscriptionUsageLog::SubscriptionId).uuid())
                    .col(string_len(SubscriptionUsageLog::UsageType, 32).not_null())
                    .col(ColumnDef::new(SubscriptionUsageLog::PropertyId).uuid())
                    .col(ColumnDef::new(SubscriptionUsageLog::Metadata).json().not_null())
                    .col(created_at(SubscriptionUsageLog::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_usage_logs_user_type_created")
                    .table(SubscriptionUsageLog::Table)
                    .col(SubscriptionUsageLog::UserId)
                    .col(SubscriptionUsageLog::UsageType)
                    .col(SubscriptionUsageLog::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 6. notifications
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Notification::Table)
                    .if_not_exists()
                    .col(uuid(Notification::Id).primary_key())
                    .col(uuid(Notification::UserId).not_null())
                    .col(string_len(Notification::Title, 255).not_null())
                    .col(ColumnDef::new(Notification::Message).text().not_null())
                    .col(string_len(Notification::Kind, 32).not_null().default("system"))
                    .col(string_len_null(Notification::Link, 1024))
                    .col(boolean(Notification::IsRead).not_null().default(false))
                    .col(created_at(Notification::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_notifications_user_id")
                    .table(Notification::Table)
                    .col(Notification::UserId)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 7. AI analysis
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(AiAgentConfiguration::Table)
                    .if_not_exists()
                    .col(uuid(AiAgentConfiguration::Id).primary_key())
                    .col(
                        string_len(AiAgentConfiguration::AgentSlug, 64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(string_len(AiAgentConfiguration::DisplayName, 128).not_null())
                    .col(ColumnDef::new(AiAgentConfiguration::Description).text())
                    .col(
                        ColumnDef::new(AiAgentConfiguration::SystemPrompt)
                            .text()
                            .not_null(),
                    )
                    .col(
                        string_len(AiAgentConfiguration::Model, 64)
                            .not_null()
                            .default("default"),
                    )
                    .col(
                        ColumnDef::new(AiAgentConfiguration::Temperature)
                            .double()
                            .not_null()
                            .default(0.7),
                    )
                    .col(
                        ColumnDef::new(AiAgentConfiguration::MaxTokens)
                            .integer()
                            .not_null()
                            .default(2000),
                    )
                    .col(
                        string_len(AiAgentConfiguration::RequiredTier, 64)
                            .not_null()
                            .default("free"),
                    )
                    .col(
                        ColumnDef::new(AiAgentConfiguration::DisplayOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        boolean(AiAgentConfiguration::IsEnabled)
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(AiAgentConfiguration::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(created_at(AiAgentConfiguration::CreatedAt))
                    .col(created_at(AiAgentConfiguration::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AiPropertyAnalysis::Table)
                    .if_not_exists()
                    .col(uuid(AiPropertyAnalysis::Id).primary_key())
                    .col(uuid(AiPropertyAnalysis::UserId).not_null())
                    .col(uuid(AiPropertyAnalysis::PropertyId).not_null())
                    .col(ColumnDef::new(AiPropertyAnalysis::AnalysisData).json().not_null())
                    .col(ColumnDef::new(AiPropertyAnalysis::AgentsUsed).json().not_null())
                    .col(
                        ColumnDef::new(AiPropertyAnalysis::ExecutionTimeSeconds)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(AiPropertyAnalysis::TokensUsed)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(created_at(AiPropertyAnalysis::CreatedAt))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Children before parents
        manager
            .drop_table(Table::drop().table(AiPropertyAnalysis::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AiAgentConfiguration::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Notification::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SubscriptionUsageLog::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserSubscription::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SubscriptionPlan::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(NewsletterSubscriber::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ContactMessage::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PropertyLead::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Enquiry::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GroupMember::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PropertyGroup::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PropertyImage::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Property::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Category::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await?;

        Ok(())
    }
}

// ============================================================
// Table identifiers
// ============================================================

#[derive(DeriveIden)]
enum User {
    #[sea_orm(iden = "users")]
    Table,
    Id,
    Email,
    FullName,
    Phone,
    Role,
    AvatarUrl,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Category {
    #[sea_orm(iden = "categories")]
    Table,
    Id,
    Name,
    Slug,
    Description,
    Icon,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Property {
    #[sea_orm(iden = "properties")]
    Table,
    Id,
    OwnerId,
    CategoryId,
    Title,
    Slug,
    Description,
    Location,
    City,
    State,
    Latitude,
    Longitude,
    Price,
    Bedrooms,
    Bathrooms,
    AreaSqft,
    PropertyType,
    FeaturedImage,
    Amenities,
    Status,
    IsFeatured,
    Views,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PropertyImage {
    #[sea_orm(iden = "property_images")]
    Table,
    Id,
    PropertyId,
    Url,
    AltText,
    OrderIndex,
    IsPrimary,
    CreatedAt,
}

#[derive(DeriveIden)]
enum PropertyGroup {
    #[sea_orm(iden = "property_groups")]
    Table,
    Id,
    PropertyId,
    TotalSlots,
    FilledSlots,
    IsLocked,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum GroupMember {
    #[sea_orm(iden = "group_members")]
    Table,
    Id,
    GroupId,
    UserId,
    FullName,
    Email,
    Phone,
    InvestmentAmount,
    Status,
    JoinedAt,
}

#[derive(DeriveIden)]
enum Enquiry {
    #[sea_orm(iden = "enquiries")]
    Table,
    Id,
    PropertyId,
    UserId,
    FullName,
    Email,
    Phone,
    Message,
    InvestmentAmount,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PropertyLead {
    #[sea_orm(iden = "property_leads")]
    Table,
    Id,
    PropertyId,
    UserId,
    LeadType,
    FullName,
    Email,
    Phone,
    Message,
    Status,
    Notes,
    AssignedTo,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ContactMessage {
    #[sea_orm(iden = "contact_messages")]
    Table,
    Id,
    Name,
    Email,
    Phone,
    Subject,
    Message,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum NewsletterSubscriber {
    #[sea_orm(iden = "newsletter_subscribers")]
    Table,
    Id,
    Email,
    Subscribed,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum SubscriptionPlan {
    #[sea_orm(iden = "subscription_plans")]
    Table,
    Id,
    Name,
    Slug,
    Description,
    PriceMonthly,
    PriceYearly,
    AnalysesPerMonth,
    MaxPropertiesComparison,
    AgentsAccess,
    Features,
    IsActive,
    DisplayOrder,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum UserSubscription {
    #[sea_orm(iden = "user_subscriptions")]
    Table,
    Id,
    UserId,
    PlanId,
    Status,
    GatewaySubscriptionId,
    GatewayPlanId,
    CurrentPeriodStart,
    CurrentPeriodEnd,
    CancelAtPeriodEnd,
    CancelledAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum SubscriptionUsageLog {
    #[sea_orm(iden = "subscription_usage_logs")]
    Table,
    Id,
    UserId,
    SubscriptionId,
    UsageType,
    PropertyId,
    Metadata,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Notification {
    #[sea_orm(iden = "notifications")]
    Table,
    Id,
    UserId,
    Title,
    Message,
    Kind,
    Link,
    IsRead,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AiAgentConfiguration {
    #[sea_orm(iden = "ai_agent_configurations")]
    Table,
    Id,
    AgentSlug,
    DisplayName,
    Description,
    SystemPrompt,
    Model,
    Temperature,
    MaxTokens,
    RequiredTier,
    DisplayOrder,
    IsEnabled,
    Version,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AiPropertyAnalysis {
    #[sea_orm(iden = "ai_property_analyses")]
    Table,
    Id,
    UserId,
    PropertyId,
    AnalysisData,
    AgentsUsed,
    ExecutionTimeSeconds,
    TokensUsed,
    CreatedAt,
}
