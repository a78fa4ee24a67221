//! Database migrations for the fleet inventory.

use sea_orm_migration::prelude::*;

mod columns;
mod m20250101_000001_create_fleet_tables;
mod m20250215_000001_create_allocation_constraint;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_fleet_tables::Migration),
            Box::new(m20250215_000001_create_allocation_constraint::Migration),
        ]
    }
}
