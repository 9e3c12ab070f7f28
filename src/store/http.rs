//! REST client for `rmoldtracker serve`.
//!
//! Uses `ureq` (sync) wrapped in `spawn_blocking`. Status codes are read
//! by hand so that a 409 from the claim route can carry the active record.

use super::{Claim, RecordStore, blocking};
use crate::errors::{AppError, AppResult};
use crate::models::mold_change::{MoldChange, MoldChangePatch, NewMoldChange};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use ureq::Agent;
use ureq::http::Response;

pub struct HttpStore {
    base_url: String,
    agent: Agent,
}

impl HttpStore {
    pub fn new(base_url: &str) -> Self {
        let agent: Agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/mold-changes{}", self.base_url, path)
    }
}

fn read_json<T: DeserializeOwned>(resp: Response<ureq::Body>) -> AppResult<T> {
    Ok(resp.into_body().read_json::<T>()?)
}

/// Map a non-success response to an error, using the `{"error": ...}` body
/// when the server sent one.
fn error_from(resp: Response<ureq::Body>, id: Option<&str>) -> AppError {
    let status = resp.status().as_u16();
    let body = resp.into_body().read_to_string().unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or(body);

    match (status, id) {
        (404, Some(id)) => AppError::NotFound(id.to_string()),
        _ => AppError::Remote { status, message },
    }
}

#[async_trait]
impl RecordStore for HttpStore {
    async fn list(&self) -> AppResult<Vec<MoldChange>> {
        let agent = self.agent.clone();
        let url = self.url("");

        blocking(move || {
            let resp = agent.get(&url).call()?;
            if !resp.status().is_success() {
                return Err(error_from(resp, None));
            }
            read_json(resp)
        })
        .await
    }

    async fn create(&self, change: NewMoldChange) -> AppResult<MoldChange> {
        let agent = self.agent.clone();
        let url = self.url("");

        blocking(move || {
            let resp = agent.post(&url).send_json(&change)?;
            if !resp.status().is_success() {
                return Err(error_from(resp, None));
            }
            read_json(resp)
        })
        .await
    }

    async fn update(&self, id: &str, patch: MoldChangePatch) -> AppResult<MoldChange> {
        let agent = self.agent.clone();
        let url = self.url(&format!("/{id}"));
        let id = id.to_string();

        blocking(move || {
            let resp = agent.patch(&url).send_json(&patch)?;
            if !resp.status().is_success() {
                return Err(error_from(resp, Some(&id)));
            }
            read_json(resp)
        })
        .await
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let agent = self.agent.clone();
        let url = self.url(&format!("/{id}"));
        let id = id.to_string();

        blocking(move || {
            let resp = agent.delete(&url).call()?;
            if !resp.status().is_success() {
                return Err(error_from(resp, Some(&id)));
            }
            Ok(())
        })
        .await
    }

    async fn claim(&self, change: NewMoldChange) -> AppResult<Claim> {
        let agent = self.agent.clone();
        let url = self.url("/claim");

        blocking(move || {
            let resp = agent.post(&url).send_json(&change)?;
            match resp.status().as_u16() {
                409 => Ok(Claim::Existing(read_json(resp)?)),
                s if (200..300).contains(&s) => Ok(Claim::Created(read_json(resp)?)),
                _ => Err(error_from(resp, None)),
            }
        })
        .await
    }
}
