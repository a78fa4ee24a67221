//! Per-resource limits attached to an allocation.

use sea_orm_migration::prelude::*;

use super::columns::{index, stamp, stamp_null, text, uuid_pk, uuid_ref};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AllocationConstraint::Table)
                    .if_not_exists()
                    .col(uuid_pk(AllocationConstraint::Id))
                    .col(uuid_ref(AllocationConstraint::AllocationId))
                    .col(text(AllocationConstraint::ResourceType))
                    .col(uuid_ref(AllocationConstraint::ResourceTypeId))
                    .col(text(AllocationConstraint::ConstraintType))
                    .col(
                        ColumnDef::new(AllocationConstraint::ConstraintValue)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AllocationConstraint::DerivedResourceId).uuid().null())
                    .col(uuid_ref(AllocationConstraint::CreatedBy))
                    .col(stamp(AllocationConstraint::Created))
                    .col(stamp(AllocationConstraint::Updated))
                    .col(stamp_null(AllocationConstraint::Deleted))
                    .foreign_key(
                        ForeignKey::create()
                            .from(AllocationConstraint::Table, AllocationConstraint::AllocationId)
                            .to(Allocation::Table, Allocation::Id),
                    )
                    .to_owned(),
            )
            .await?;
        for stmt in [
            index(
                "idx_allocation_constraint_allocation",
                AllocationConstraint::Table,
                AllocationConstraint::AllocationId,
            ),
            index(
                "idx_allocation_constraint_resource_type_id",
                AllocationConstraint::Table,
                AllocationConstraint::ResourceTypeId,
            ),
        ] {
            manager.create_index(stmt).await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(AllocationConstraint::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Allocation {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum AllocationConstraint {
    Table,
    Id,
    AllocationId,
    ResourceType,
    ResourceTypeId,
    ConstraintType,
    ConstraintValue,
    DerivedResourceId,
    CreatedBy,
    Created,
    Updated,
    Deleted,
}
