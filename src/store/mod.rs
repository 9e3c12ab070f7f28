//! Record store abstraction.
//!
//! Both the live counter and the one-shot CLI commands go through
//! [`RecordStore`], so they behave the same whether records live in the
//! local SQLite file ([`sqlite::SqliteStore`]) or behind a running
//! `rmoldtracker serve` ([`http::HttpStore`]).

pub mod http;
pub mod sqlite;

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::models::mold_change::{MoldChange, MoldChangePatch, NewMoldChange};
use async_trait::async_trait;
use std::sync::Arc;

/// Outcome of a create-if-none-active request.
#[derive(Debug, Clone, PartialEq)]
pub enum Claim {
    /// No record was active: a new pending one was created.
    Created(MoldChange),
    /// Another record is already active; nothing was written.
    Existing(MoldChange),
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Full record set, most recent start first.
    async fn list(&self) -> AppResult<Vec<MoldChange>>;

    async fn create(&self, change: NewMoldChange) -> AppResult<MoldChange>;

    /// Partial update. Unknown ids yield [`AppError::NotFound`].
    async fn update(&self, id: &str, patch: MoldChangePatch) -> AppResult<MoldChange>;

    async fn delete(&self, id: &str) -> AppResult<()>;

    /// Atomically create a pending record unless one is already active.
    async fn claim(&self, change: NewMoldChange) -> AppResult<Claim>;
}

/// Pick the backend from the configuration: REST when `api_url` is set,
/// the local database otherwise.
pub fn open(cfg: &Config) -> AppResult<Arc<dyn RecordStore>> {
    match &cfg.api_url {
        Some(url) => {
            tracing::debug!(url = %url, "using REST record store");
            Ok(Arc::new(http::HttpStore::new(url)))
        }
        None => {
            tracing::debug!(database = %cfg.database, "using SQLite record store");
            Ok(Arc::new(sqlite::SqliteStore::open(&cfg.database)?))
        }
    }
}

/// Run blocking work (SQLite, ureq) off the async workers.
pub(crate) async fn blocking<F, T>(func: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(func)
        .await
        .map_err(|e| AppError::Other(format!("task join error: {e}")))?
}
