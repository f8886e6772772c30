//! Property specifications, the developer directory and search lookups

use chrono::Utc;
use sea_orm::{ActiveValue::Set, EntityTrait};
use sea_orm_migration::{prelude::*, schema::*};
use uuid::Uuid;

use crate::entities::{city, city_location, property_configuration};

#[derive(DeriveMigrationName)]
pub struct Migration;

fn created_at<T: IntoIden>(col: T) -> ColumnDef {
    timestamp_with_time_zone(col)
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

/// City, state and its seeded localities
const CITIES: &[(&str, &str, &[&str])] = &[
    (
        "Mumbai",
        "Maharashtra",
        &["Andheri", "Bandra", "Powai", "Thane", "Navi Mumbai", "Worli"],
    ),
    (
        "Pune",
        "Maharashtra",
        &["Baner", "Hinjewadi", "Kharadi", "Wakad", "Koregaon Park"],
    ),
    (
        "Bengaluru",
        "Karnataka",
        &["Whitefield", "Sarjapur Road", "Electronic City", "Hebbal", "Indiranagar"],
    ),
    (
        "Hyderabad",
        "Telangana",
        &["Gachibowli", "Kondapur", "Kokapet", "Madhapur"],
    ),
    (
        "Gurugram",
        "Haryana",
        &["Golf Course Road", "Sohna Road", "Dwarka Expressway"],
    ),
    ("Alibaug", "Maharashtra", &["Kihim", "Nagaon", "Mandwa"]),
];

const CONFIGURATIONS: &[&str] = &[
    "1 RK", "1 BHK", "2 BHK", "3 BHK", "4 BHK", "5+ BHK", "Villa", "Plot",
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PropertySpecification::Table)
                    .if_not_exists()
                    .col(uuid(PropertySpecification::Id).primary_key())
                    .col(uuid(PropertySpecification::PropertyId).not_null())
                    .col(string_len(PropertySpecification::Category, 128).not_null())
                    .col(string_len(PropertySpecification::Label, 255).not_null())
                    .col(ColumnDef::new(PropertySpecification::Value).text().not_null())
                    .col(
                        ColumnDef::new(PropertySpecification::DisplayOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(created_at(PropertySpecification::CreatedAt))
                    .col(created_at(PropertySpecification::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_property_specifications_property_id")
                            .from(PropertySpecification::Table, PropertySpecification::PropertyId)
                            .to(Property::Table, Property::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_property_specifications_property_id")
                    .table(PropertySpecification::Table)
                    .col(PropertySpecification::PropertyId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Developer::Table)
                    .if_not_exists()
                    .col(uuid(Developer::Id).primary_key())
                    .col(string_len(Developer::Name, 255).not_null())
                    .col(string_len_null(Developer::LogoUrl, 1024))
                    .col(ColumnDef::new(Developer::Description).text())
                    .col(string_len_null(Developer::WebsiteUrl, 1024))
                    .col(string_len_null(Developer::Email, 255))
                    .col(string_len_null(Developer::Phone, 32))
                    .col(ColumnDef::new(Developer::YearsOfExperience).integer())
                    .col(ColumnDef::new(Developer::TotalProjects).integer())
                    .col(boolean(Developer::IsActive).not_null().default(true))
                    .col(created_at(Developer::CreatedAt))
                    .col(created_at(Developer::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(City::Table)
                    .if_not_exists()
                    .col(uuid(City::Id).primary_key())
                    .col(string_len(City::Name, 128).not_null().unique_key())
                    .col(string_len(City::State, 128).not_null())
                    .col(ColumnDef::new(City::DisplayOrder).integer().not_null().default(0))
                    .col(boolean(City::IsActive).not_null().default(true))
                    .col(created_at(City::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CityLocation::Table)
                    .if_not_exists()
                    .col(uuid(CityLocation::Id).primary_key())
                    .col(uuid(CityLocation::CityId).not_null())
                    .col(string_len(CityLocation::Name, 128).not_null())
                    .col(
                        ColumnDef::new(CityLocation::DisplayOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(boolean(CityLocation::IsActive).not_null().default(true))
                    .col(created_at(CityLocation::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_city_locations_city_id")
                            .from(CityLocation::Table, CityLocation::CityId)
                            .to(City::Table, City::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PropertyConfiguration::Table)
                    .if_not_exists()
                    .col(uuid(PropertyConfiguration::Id).primary_key())
                    .col(string_len(PropertyConfiguration::Name, 64).not_null().unique_key())
                    .col(
                        ColumnDef::new(PropertyConfiguration::DisplayOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(boolean(PropertyConfiguration::IsActive).not_null().default(true))
                    .col(created_at(PropertyConfiguration::CreatedAt))
                    .to_owned(),
            )
            .await?;

        // Lookup seed data
        let db = manager.get_connection();
        let now = Utc::now();

        for (order, (name, state, localities)) in CITIES.iter().enumerate() {
            let city_id = Uuid::new_v4();
            city::Entity::insert(city::ActiveModel {
                id: Set(city_id),
                name: Set(ToString::to_string(&name)),
                state: Set(ToString::to_string(&state)),
                display_order: Set(order as i32),
                is_active: Set(true),
                created_at: Set(now),
            })
            .exec(db)
            .await?;

            let locations = localities
                .iter()
                .enumerate()
                .map(|(order, locality)| city_location::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    city_id: Set(city_id),
                    name: Set(ToString::to_string(&locality)),
                    display_order: Set(order as i32),
                    is_active: Set(true),
                    created_at: Set(now),
                });
            city_location::Entity::insert_many(locations).exec(db).await?;
        }

        let configurations =
            CONFIGURATIONS
                .iter()
                .enumerate()
                .map(|(order, name)| property_configuration::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    name: Set(ToString::to_string(&name)),
                    display_order: Set(order as i32),
                    is_active: Set(true),
                    created_at: Set(now),
                });
        property_configuration::Entity::insert_many(configurations)
            .exec(db)
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PropertyConfiguration::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CityLocation::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(City::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Developer::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PropertySpecification::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Property {
    #[sea_orm(iden = "properties")]
    Table,
    Id,
}

#[derive(DeriveIden)]
enum PropertySpecification {
    #[sea_orm(iden = "property_specifications")]
    Table,
    Id,
    PropertyId,
    Category,
    Label,
    Value,
    DisplayOrder,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Developer {
    #[sea_orm(iden = "developers")]
    Table,
    Id,
    Name,
    LogoUrl,
    Description,
    WebsiteUrl,
    Email,
    Phone,
    YearsOfExperience,
    TotalProjects,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum City {
    #[sea_orm(iden = "cities")]
    Table,
    Id,
    Name,
    State,
    DisplayOrder,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum CityLocation {
    #[sea_orm(iden = "city_locations")]
    Table,
    Id,
    CityId,
    Name,
    DisplayOrder,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum PropertyConfiguration {
    #[sea_orm(iden = "property_configurations")]
    Table,
    Id,
    Name,
    DisplayOrder,
    IsActive,
    CreatedAt,
}
