use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AuditLogEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuditLogEntries::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AuditLogEntries::InstanceId).uuid().not_null())
                    .col(ColumnDef::new(AuditLogEntries::UserId).uuid().null())
                    .col(ColumnDef::new(AuditLogEntries::ActorEmail).string().null())
                    .col(ColumnDef::new(AuditLogEntries::Action).string().not_null())
                    .col(ColumnDef::new(AuditLogEntries::Meta).json_binary().null())
                    .col(
                        ColumnDef::new(AuditLogEntries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_audit_log_entries_instance_id")
                    .table(AuditLogEntries::Table)
                    .col(AuditLogEntries::InstanceId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuditLogEntries::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AuditLogEntries {
    Table,
    Id,
    InstanceId,
    UserId,
    ActorEmail,
    Action,
    Meta,
    CreatedAt,
}
