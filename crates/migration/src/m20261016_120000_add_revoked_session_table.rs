use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RevokedSession::Table)
                    .if_not_exists()
                    .col(pk_auto(RevokedSession::Id))
                    // Empty string stands for "absent" so the unique index covers partial records.
                    .col(string(RevokedSession::Subject).not_null().to_owned())
                    .col(string(RevokedSession::SessionId).not_null().to_owned())
                    .col(timestamp_with_time_zone(RevokedSession::RevokedAt).not_null().to_owned())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_revoked_session_identity")
                    .table(RevokedSession::Table)
                    .col(RevokedSession::Subject)
                    .col(RevokedSession::SessionId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RevokedSession::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum RevokedSession {
    Table,
    Id,
    Subject,
    SessionId,
    RevokedAt,
}
