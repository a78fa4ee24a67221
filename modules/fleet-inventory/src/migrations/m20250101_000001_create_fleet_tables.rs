//! Initial migration for the fleet inventory tables.

use sea_orm_migration::prelude::*;

use super::columns::{flag, index, labels, stamp, stamp_null, text, text_null, uuid_pk, uuid_ref};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    #[allow(clippy::too_many_lines)]
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InfrastructureProvider::Table)
                    .if_not_exists()
                    .col(uuid_pk(InfrastructureProvider::Id))
                    .col(text(InfrastructureProvider::Name))
                    .col(text_null(InfrastructureProvider::DisplayName))
                    .col(text(InfrastructureProvider::Org))
                    .col(text_null(InfrastructureProvider::OrgDisplayName))
                    .col(uuid_ref(InfrastructureProvider::CreatedBy))
                    .col(stamp(InfrastructureProvider::Created))
                    .col(stamp(InfrastructureProvider::Updated))
                    .col(stamp_null(InfrastructureProvider::Deleted))
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(index(
                "idx_infrastructure_provider_org",
                InfrastructureProvider::Table,
                InfrastructureProvider::Org,
            ))
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tenant::Table)
                    .if_not_exists()
                    .col(uuid_pk(Tenant::Id))
                    .col(text(Tenant::Name))
                    .col(text_null(Tenant::DisplayName))
                    .col(text(Tenant::Org))
                    .col(text_null(Tenant::OrgDisplayName))
                    .col(uuid_ref(Tenant::CreatedBy))
                    .col(stamp(Tenant::Created))
                    .col(stamp(Tenant::Updated))
                    .col(stamp_null(Tenant::Deleted))
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(index("idx_tenant_org", Tenant::Table, Tenant::Org))
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Site::Table)
                    .if_not_exists()
                    .col(uuid_pk(Site::Id))
                    .col(text(Site::Name))
                    .col(text_null(Site::Description))
                    .col(text(Site::Org))
                    .col(uuid_ref(Site::InfrastructureProviderId))
                    .col(text(Site::Status))
                    .col(uuid_ref(Site::CreatedBy))
                    .col(stamp(Site::Created))
                    .col(stamp(Site::Updated))
                    .col(stamp_null(Site::Deleted))
                    .foreign_key(
                        ForeignKey::create()
                            .from(Site::Table, Site::InfrastructureProviderId)
                            .to(InfrastructureProvider::Table, InfrastructureProvider::Id),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(index(
                "idx_site_infrastructure_provider",
                Site::Table,
                Site::InfrastructureProviderId,
            ))
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SshKeyGroup::Table)
                    .if_not_exists()
                    .col(uuid_pk(SshKeyGroup::Id))
                    .col(text(SshKeyGroup::Name))
                    .col(text_null(SshKeyGroup::Description))
                    .col(text(SshKeyGroup::Org))
                    .col(uuid_ref(SshKeyGroup::TenantId))
                    .col(text(SshKeyGroup::Status))
                    .col(uuid_ref(SshKeyGroup::CreatedBy))
                    .col(stamp(SshKeyGroup::Created))
                    .col(stamp(SshKeyGroup::Updated))
                    .col(stamp_null(SshKeyGroup::Deleted))
                    .foreign_key(
                        ForeignKey::create()
                            .from(SshKeyGroup::Table, SshKeyGroup::TenantId)
                            .to(Tenant::Table, Tenant::Id),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(index(
                "idx_ssh_key_group_tenant",
                SshKeyGroup::Table,
                SshKeyGroup::TenantId,
            ))
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Allocation::Table)
                    .if_not_exists()
                    .col(uuid_pk(Allocation::Id))
                    .col(text(Allocation::Name))
                    .col(text_null(Allocation::Description))
                    .col(uuid_ref(Allocation::InfrastructureProviderId))
                    .col(uuid_ref(Allocation::TenantId))
                    .col(uuid_ref(Allocation::SiteId))
                    .col(text(Allocation::Status))
                    .col(uuid_ref(Allocation::CreatedBy))
                    .col(stamp(Allocation::Created))
                    .col(stamp(Allocation::Updated))
                    .col(stamp_null(Allocation::Deleted))
                    .foreign_key(
                        ForeignKey::create()
                            .from(Allocation::Table, Allocation::InfrastructureProviderId)
                            .to(InfrastructureProvider::Table, InfrastructureProvider::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Allocation::Table, Allocation::TenantId)
                            .to(Tenant::Table, Tenant::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Allocation::Table, Allocation::SiteId)
                            .to(Site::Table, Site::Id),
                    )
                    .to_owned(),
            )
            .await?;
        for stmt in [
            index(
                "idx_allocation_infrastructure_provider",
                Allocation::Table,
                Allocation::InfrastructureProviderId,
            ),
            index("idx_allocation_tenant", Allocation::Table, Allocation::TenantId),
            index("idx_allocation_site", Allocation::Table, Allocation::SiteId),
            index("idx_allocation_status", Allocation::Table, Allocation::Status),
        ] {
            manager.create_index(stmt).await?;
        }

        manager
            .create_table(
                Table::create()
                    .table(Machine::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Machine::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(uuid_ref(Machine::InfrastructureProviderId))
                    .col(uuid_ref(Machine::SiteId))
                    .col(text(Machine::ControllerMachineId))
                    .col(text_null(Machine::ControllerMachineType))
                    .col(text_null(Machine::Vendor))
                    .col(text_null(Machine::ProductName))
                    .col(text_null(Machine::SerialNumber))
                    .col(text_null(Machine::Hostname))
                    .col(text_null(Machine::DefaultMacAddress))
                    .col(flag(Machine::IsInMaintenance))
                    .col(text_null(Machine::MaintenanceMessage))
                    .col(flag(Machine::IsNetworkDegraded))
                    .col(text_null(Machine::NetworkHealthMessage))
                    .col(flag(Machine::IsAssigned))
                    .col(flag(Machine::IsMissingOnSite))
                    .col(labels(Machine::Labels))
                    .col(text(Machine::Status))
                    .col(stamp(Machine::Created))
                    .col(stamp(Machine::Updated))
                    .col(stamp_null(Machine::Deleted))
                    .foreign_key(
                        ForeignKey::create()
                            .from(Machine::Table, Machine::InfrastructureProviderId)
                            .to(InfrastructureProvider::Table, InfrastructureProvider::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Machine::Table, Machine::SiteId)
                            .to(Site::Table, Site::Id),
                    )
                    .to_owned(),
            )
            .await?;
        for stmt in [
            index(
                "idx_machine_infrastructure_provider",
                Machine::Table,
                Machine::InfrastructureProviderId,
            ),
            index("idx_machine_site", Machine::Table, Machine::SiteId),
            index("idx_machine_status", Machine::Table, Machine::Status),
        ] {
            manager.create_index(stmt).await?;
        }

        manager
            .create_table(
                Table::create()
                    .table(Instance::Table)
                    .if_not_exists()
                    .col(uuid_pk(Instance::Id))
                    .col(text(Instance::Name))
                    .col(text_null(Instance::Description))
                    .col(ColumnDef::new(Instance::AllocationId).uuid().null())
                    .col(uuid_ref(Instance::TenantId))
                    .col(uuid_ref(Instance::InfrastructureProviderId))
                    .col(uuid_ref(Instance::SiteId))
                    .col(ColumnDef::new(Instance::MachineId).string().null())
                    .col(ColumnDef::new(Instance::ControllerInstanceId).uuid().null())
                    .col(text_null(Instance::Hostname))
                    .col(text_null(Instance::IpxeScript))
                    .col(flag(Instance::AlwaysBootWithCustomIpxe))
                    .col(flag(Instance::PhoneHomeEnabled))
                    .col(text_null(Instance::UserData))
                    .col(labels(Instance::Labels))
                    .col(flag(Instance::IsUpdatePending))
                    .col(text(Instance::Status))
                    .col(text_null(Instance::PowerStatus))
                    .col(flag(Instance::IsMissingOnSite))
                    .col(uuid_ref(Instance::CreatedBy))
                    .col(stamp(Instance::Created))
                    .col(stamp(Instance::Updated))
                    .col(stamp_null(Instance::Deleted))
                    .foreign_key(
                        ForeignKey::create()
                            .from(Instance::Table, Instance::AllocationId)
                            .to(Allocation::Table, Allocation::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Instance::Table, Instance::TenantId)
                            .to(Tenant::Table, Tenant::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Instance::Table, Instance::InfrastructureProviderId)
                            .to(InfrastructureProvider::Table, InfrastructureProvider::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Instance::Table, Instance::SiteId)
                            .to(Site::Table, Site::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Instance::Table, Instance::MachineId)
                            .to(Machine::Table, Machine::Id),
                    )
                    .to_owned(),
            )
            .await?;
        for stmt in [
            index("idx_instance_allocation", Instance::Table, Instance::AllocationId),
            index("idx_instance_tenant", Instance::Table, Instance::TenantId),
            index(
                "idx_instance_infrastructure_provider",
                Instance::Table,
                Instance::InfrastructureProviderId,
            ),
            index("idx_instance_site", Instance::Table, Instance::SiteId),
            index("idx_instance_machine", Instance::Table, Instance::MachineId),
            index("idx_instance_status", Instance::Table, Instance::Status),
        ] {
            manager.create_index(stmt).await?;
        }

        manager
            .create_table(
                Table::create()
                    .table(InfinibandPartition::Table)
                    .if_not_exists()
                    .col(uuid_pk(InfinibandPartition::Id))
                    .col(text(InfinibandPartition::Name))
                    .col(text_null(InfinibandPartition::Description))
                    .col(text(InfinibandPartition::Org))
                    .col(uuid_ref(InfinibandPartition::SiteId))
                    .col(uuid_ref(InfinibandPartition::TenantId))
                    .col(
                        ColumnDef::new(InfinibandPartition::ControllerIbPartitionId)
                            .uuid()
                            .null(),
                    )
                    .col(text_null(InfinibandPartition::PartitionKey))
                    .col(text_null(InfinibandPartition::PartitionName))
                    .col(ColumnDef::new(InfinibandPartition::ServiceLevel).integer().null())
                    .col(ColumnDef::new(InfinibandPartition::RateLimit).double().null())
                    .col(ColumnDef::new(InfinibandPartition::Mtu).integer().null())
                    .col(ColumnDef::new(InfinibandPartition::EnableSharp).boolean().null())
                    .col(labels(InfinibandPartition::Labels))
                    .col(text(InfinibandPartition::Status))
                    .col(flag(InfinibandPartition::IsMissingOnSite))
                    .col(uuid_ref(InfinibandPartition::CreatedBy))
                    .col(stamp(InfinibandPartition::Created))
                    .col(stamp(InfinibandPartition::Updated))
                    .col(stamp_null(InfinibandPartition::Deleted))
                    .foreign_key(
                        ForeignKey::create()
                            .from(InfinibandPartition::Table, InfinibandPartition::SiteId)
                            .to(Site::Table, Site::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(InfinibandPartition::Table, InfinibandPartition::TenantId)
                            .to(Tenant::Table, Tenant::Id),
                    )
                    .to_owned(),
            )
            .await?;
        for stmt in [
            index(
                "idx_infiniband_partition_site",
                InfinibandPartition::Table,
                InfinibandPartition::SiteId,
            ),
            index(
                "idx_infiniband_partition_tenant",
                InfinibandPartition::Table,
                InfinibandPartition::TenantId,
            ),
            index(
                "idx_infiniband_partition_status",
                InfinibandPartition::Table,
                InfinibandPartition::Status,
            ),
        ] {
            manager.create_index(stmt).await?;
        }

        manager
            .create_table(
                Table::create()
                    .table(NvlinkInterface::Table)
                    .if_not_exists()
                    .col(uuid_pk(NvlinkInterface::Id))
                    .col(uuid_ref(NvlinkInterface::InstanceId))
                    .col(uuid_ref(NvlinkInterface::SiteId))
                    .col(uuid_ref(NvlinkInterface::NvlinkLogicalPartitionId))
                    .col(ColumnDef::new(NvlinkInterface::NvlinkDomainId).uuid().null())
                    .col(text_null(NvlinkInterface::Device))
                    .col(
                        ColumnDef::new(NvlinkInterface::DeviceInstance)
                            .integer()
                            .not_null(),
                    )
                    .col(text_null(NvlinkInterface::GpuGuid))
                    .col(text(NvlinkInterface::Status))
                    .col(uuid_ref(NvlinkInterface::CreatedBy))
                    .col(stamp(NvlinkInterface::Created))
                    .col(stamp(NvlinkInterface::Updated))
                    .col(stamp_null(NvlinkInterface::Deleted))
                    .foreign_key(
                        ForeignKey::create()
                            .from(NvlinkInterface::Table, NvlinkInterface::InstanceId)
                            .to(Instance::Table, Instance::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(NvlinkInterface::Table, NvlinkInterface::SiteId)
                            .to(Site::Table, Site::Id),
                    )
                    .to_owned(),
            )
            .await?;
        for stmt in [
            index(
                "idx_nvlink_interface_instance",
                NvlinkInterface::Table,
                NvlinkInterface::InstanceId,
            ),
            index(
                "idx_nvlink_interface_site",
                NvlinkInterface::Table,
                NvlinkInterface::SiteId,
            ),
            index(
                "idx_nvlink_interface_status",
                NvlinkInterface::Table,
                NvlinkInterface::Status,
            ),
        ] {
            manager.create_index(stmt).await?;
        }

        manager
            .create_table(
                Table::create()
                    .table(SshKeyGroupInstanceAssociation::Table)
                    .if_not_exists()
                    .col(uuid_pk(SshKeyGroupInstanceAssociation::Id))
                    .col(uuid_ref(SshKeyGroupInstanceAssociation::SshKeyGroupId))
                    .col(uuid_ref(SshKeyGroupInstanceAssociation::SiteId))
                    .col(uuid_ref(SshKeyGroupInstanceAssociation::InstanceId))
                    .col(uuid_ref(SshKeyGroupInstanceAssociation::CreatedBy))
                    .col(stamp(SshKeyGroupInstanceAssociation::Created))
                    .col(stamp(SshKeyGroupInstanceAssociation::Updated))
                    .col(stamp_null(SshKeyGroupInstanceAssociation::Deleted))
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                SshKeyGroupInstanceAssociation::Table,
                                SshKeyGroupInstanceAssociation::SshKeyGroupId,
                            )
                            .to(SshKeyGroup::Table, SshKeyGroup::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                SshKeyGroupInstanceAssociation::Table,
                                SshKeyGroupInstanceAssociation::SiteId,
                            )
                            .to(Site::Table, Site::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                SshKeyGroupInstanceAssociation::Table,
                                SshKeyGroupInstanceAssociation::InstanceId,
                            )
                            .to(Instance::Table, Instance::Id),
                    )
                    .to_owned(),
            )
            .await?;
        for stmt in [
            index(
                "idx_skgia_ssh_key_group",
                SshKeyGroupInstanceAssociation::Table,
                SshKeyGroupInstanceAssociation::SshKeyGroupId,
            ),
            index(
                "idx_skgia_site",
                SshKeyGroupInstanceAssociation::Table,
                SshKeyGroupInstanceAssociation::SiteId,
            ),
            index(
                "idx_skgia_instance",
                SshKeyGroupInstanceAssociation::Table,
                SshKeyGroupInstanceAssociation::InstanceId,
            ),
        ] {
            manager.create_index(stmt).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Children first.
        let tables: [DynIden; 10] = [
            SshKeyGroupInstanceAssociation::Table.into_iden(),
            NvlinkInterface::Table.into_iden(),
            InfinibandPartition::Table.into_iden(),
            Instance::Table.into_iden(),
            Machine::Table.into_iden(),
            Allocation::Table.into_iden(),
            SshKeyGroup::Table.into_iden(),
            Site::Table.into_iden(),
            Tenant::Table.into_iden(),
            InfrastructureProvider::Table.into_iden(),
        ];
        for table in tables {
            manager
                .drop_table(Table::drop().table(table).if_exists().to_owned())
                .await?;
        }
        Ok(())
    }
}

#[derive(DeriveIden)]
enum InfrastructureProvider {
    Table,
    Id,
    Name,
    DisplayName,
    Org,
    OrgDisplayName,
    CreatedBy,
    Created,
    Updated,
    Deleted,
}

#[derive(DeriveIden)]
enum Tenant {
    Table,
    Id,
    Name,
    DisplayName,
    Org,
    OrgDisplayName,
    CreatedBy,
    Created,
    Updated,
    Deleted,
}

#[derive(DeriveIden)]
enum Site {
    Table,
    Id,
    Name,
    Description,
    Org,
    InfrastructureProviderId,
    Status,
    CreatedBy,
    Created,
    Updated,
    Deleted,
}

#[derive(DeriveIden)]
enum SshKeyGroup {
    Table,
    Id,
    Name,
    Description,
    Org,
    TenantId,
    Status,
    CreatedBy,
    Created,
    Updated,
    Deleted,
}

#[derive(DeriveIden)]
enum Allocation {
    Table,
    Id,
    Name,
    Description,
    InfrastructureProviderId,
    TenantId,
    SiteId,
    Status,
    CreatedBy,
    Created,
    Updated,
    Deleted,
}

#[derive(DeriveIden)]
enum Machine {
    Table,
    Id,
    InfrastructureProviderId,
    SiteId,
    ControllerMachineId,
    ControllerMachineType,
    Vendor,
    ProductName,
    SerialNumber,
    Hostname,
    DefaultMacAddress,
    IsInMaintenance,
    MaintenanceMessage,
    IsNetworkDegraded,
    NetworkHealthMessage,
    IsAssigned,
    IsMissingOnSite,
    Labels,
    Status,
    Created,
    Updated,
    Deleted,
}

#[derive(DeriveIden)]
enum Instance {
    Table,
    Id,
    Name,
    Description,
    AllocationId,
    TenantId,
    InfrastructureProviderId,
    SiteId,
    MachineId,
    ControllerInstanceId,
    Hostname,
    IpxeScript,
    AlwaysBootWithCustomIpxe,
    PhoneHomeEnabled,
    UserData,
    Labels,
    IsUpdatePending,
    Status,
    PowerStatus,
    IsMissingOnSite,
    CreatedBy,
    Created,
    Updated,
    Deleted,
}

#[derive(DeriveIden)]
enum InfinibandPartition {
    Table,
    Id,
    Name,
    Description,
    Org,
    SiteId,
    TenantId,
    ControllerIbPartitionId,
    PartitionKey,
    PartitionName,
    ServiceLevel,
    RateLimit,
    Mtu,
    EnableSharp,
    Labels,
    Status,
    IsMissingOnSite,
    CreatedBy,
    Created,
    Updated,
    Deleted,
}

#[derive(DeriveIden)]
enum NvlinkInterface {
    Table,
    Id,
    InstanceId,
    SiteId,
    NvlinkLogicalPartitionId,
    NvlinkDomainId,
    Device,
    DeviceInstance,
    GpuGuid,
    Status,
    CreatedBy,
    Created,
    Updated,
    Deleted,
}

#[derive(DeriveIden)]
enum SshKeyGroupInstanceAssociation {
    Table,
    Id,
    SshKeyGroupId,
    SiteId,
    InstanceId,
    CreatedBy,
    Created,
    Updated,
    Deleted,
}
