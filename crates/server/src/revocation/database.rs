use super::{RevocationStore, SessionIdentity};
use crate::entity::revoked_session::{self, Column, Entity as RevokedSession};
use crate::error::RevocationError;
use async_trait::async_trait;
use migration::{Migrator, MigratorTrait};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, Database, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter,
};
use time::OffsetDateTime;
use tracing::debug;

/// Revocation record shared by every instance pointing at the same database.
#[derive(Clone, Debug)]
pub struct DatabaseRevocationStore {
    db: DatabaseConnection,
}

impl DatabaseRevocationStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Connects and brings the schema up to date.
    pub async fn connect(database_url: &str) -> Result<Self, RevocationError> {
        let db = Database::connect(database_url).await?;
        Migrator::up(&db, None).await?;
        Ok(Self::new(db))
    }
}

fn stored(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

#[async_trait]
impl RevocationStore for DatabaseRevocationStore {
    #[tracing::instrument(skip(self))]
    async fn record(&self, identity: &SessionIdentity) -> Result<(), RevocationError> {
        if identity.is_empty() {
            return Ok(());
        }
        let row = revoked_session::ActiveModel {
            subject: Set(stored(&identity.subject)),
            session_id: Set(stored(&identity.session_id)),
            revoked_at: Set(OffsetDateTime::now_utc()),
            ..Default::default()
        };
        let inserted = RevokedSession::insert(row)
            .on_conflict(
                OnConflict::columns([Column::Subject, Column::SessionId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        debug!(inserted, "Revocation recorded");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn is_revoked(&self, identity: &SessionIdentity) -> Result<bool, RevocationError> {
        if identity.is_empty() {
            return Ok(false);
        }
        let count = RevokedSession::find()
            .filter(Column::Subject.eq(stored(&identity.subject)))
            .filter(Column::SessionId.eq(stored(&identity.session_id)))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }
}
