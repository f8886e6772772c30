//! Database migrations

use sea_orm_migration::prelude::*;

mod m20250301_000001_init_schema;
mod m20250301_000002_seed_plans_and_agents;
mod m20250310_000003_specifications_and_directory;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_init_schema::Migration),
            Box::new(m20250301_000002_seed_plans_and_agents::Migration),
            Box::new(m20250310_000003_specifications_and_directory::Migration),
        ]
    }
}
