use super::{Claim, RecordStore, blocking};
use crate::db::log::ttlog_quiet;
use crate::db::pool::DbPool;
use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::mold_change::{MoldChange, MoldChangePatch, NewMoldChange};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// Record store over the local SQLite file. All access is serialized
/// through one connection.
#[derive(Clone)]
pub struct SqliteStore {
    pool: Arc<Mutex<DbPool>>,
}

impl SqliteStore {
    pub fn open(path: &str) -> AppResult<Self> {
        Ok(Self::from_pool(DbPool::new(path)?))
    }

    pub fn in_memory() -> AppResult<Self> {
        Ok(Self::from_pool(DbPool::in_memory()?))
    }

    pub fn from_pool(pool: DbPool) -> Self {
        Self {
            pool: Arc::new(Mutex::new(pool)),
        }
    }

    async fn run<F, T>(&self, func: F) -> AppResult<T>
    where
        F: FnOnce(&mut Connection) -> AppResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = Arc::clone(&self.pool);
        blocking(move || {
            let mut guard = pool
                .lock()
                .map_err(|_| AppError::Other("database mutex poisoned".into()))?;
            guard.with_conn(func)
        })
        .await
    }
}

fn parse_id(id: &str) -> AppResult<i64> {
    queries::parse_id(id).ok_or_else(|| AppError::NotFound(id.to_string()))
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn list(&self) -> AppResult<Vec<MoldChange>> {
        self.run(|conn| queries::list_changes(conn)).await
    }

    async fn create(&self, change: NewMoldChange) -> AppResult<MoldChange> {
        self.run(move |conn| {
            let rec = queries::insert_change(conn, &change, Utc::now())?;
            ttlog_quiet(
                conn,
                "add",
                &rec.id,
                &format!(
                    "{} {} → {} ({})",
                    rec.line, rec.previous_mold_id, rec.new_mold_id, rec.status
                ),
            );
            Ok(rec)
        })
        .await
    }

    async fn update(&self, id: &str, patch: MoldChangePatch) -> AppResult<MoldChange> {
        let key = parse_id(id)?;
        let id = id.to_string();

        self.run(move |conn| {
            let rec = queries::update_change(conn, key, &patch, Utc::now())?
                .ok_or_else(|| AppError::NotFound(id.clone()))?;

            let fields = serde_json::to_value(&patch)
                .ok()
                .and_then(|v| v.as_object().map(|o| o.keys().cloned().collect::<Vec<_>>()))
                .unwrap_or_default();
            ttlog_quiet(conn, "edit", &id, &format!("updated {}", fields.join(", ")));
            Ok(rec)
        })
        .await
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let key = parse_id(id)?;
        let id = id.to_string();

        self.run(move |conn| {
            if !queries::delete_change(conn, key)? {
                return Err(AppError::NotFound(id));
            }
            ttlog_quiet(conn, "del", &id, "mold change deleted");
            Ok(())
        })
        .await
    }

    async fn claim(&self, change: NewMoldChange) -> AppResult<Claim> {
        self.run(move |conn| {
            let claim = queries::claim_change(conn, &change, Utc::now())?;
            match &claim {
                Claim::Created(rec) => {
                    ttlog_quiet(conn, "claim", &rec.id, &format!("{} change started", rec.line))
                }
                Claim::Existing(rec) => {
                    tracing::debug!(id = %rec.id, "claim refused, record already active")
                }
            }
            Ok(claim)
        })
        .await
    }
}
