use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
};

use crate::entities::{prelude::*, store_entries};
use crate::{KeyValueStore, Namespace, StoreError, StoreResult};

/// Key-value entries persisted in the `store_entries` table.
pub struct StoreEntryRepository {
    db: DatabaseConnection,
}

impl StoreEntryRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find(
        &self,
        key: &str,
        namespace: Namespace,
    ) -> Result<Option<store_entries::Model>, DbErr> {
        StoreEntries::find_by_id((namespace.as_str().to_string(), key.to_string()))
            .one(&self.db)
            .await
    }

    /// Insert or overwrite; the newest write replaces the value wholesale.
    pub async fn upsert(&self, key: &str, value: &str, namespace: Namespace) -> Result<(), DbErr> {
        let entry = store_entries::ActiveModel {
            namespace: ActiveValue::Set(namespace.as_str().to_string()),
            key: ActiveValue::Set(key.to_string()),
            value: ActiveValue::Set(value.to_string()),
            updated_at: ActiveValue::Set(Utc::now().into()),
        };

        StoreEntries::insert(entry)
            .on_conflict(
                OnConflict::columns([store_entries::Column::Namespace, store_entries::Column::Key])
                    .update_columns([store_entries::Column::Value, store_entries::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    /// Delete entries not written since `cutoff`. Returns how many were removed.
    pub async fn delete_untouched_since(&self, cutoff: DateTime<Utc>) -> Result<u64, DbErr> {
        let cutoff: DateTimeWithTimeZone = cutoff.into();
        let result = StoreEntries::delete_many()
            .filter(store_entries::Column::UpdatedAt.lt(cutoff))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn count(&self) -> Result<u64, DbErr> {
        StoreEntries::find().count(&self.db).await
    }
}

#[async_trait]
impl KeyValueStore for StoreEntryRepository {
    async fn get(&self, key: &str, shared: bool) -> StoreResult<Option<String>> {
        let entry = self
            .find(key, Namespace::from_shared(shared))
            .await
            .map_err(|e| StoreError::unavailable(format!("failed to read {key}"), e))?;
        Ok(entry.map(|model| model.value))
    }

    async fn set(&self, key: &str, value: &str, shared: bool) -> StoreResult<()> {
        self.upsert(key, value, Namespace::from_shared(shared))
            .await
            .map_err(|e| StoreError::unavailable(format!("failed to write {key}"), e))
    }
}
