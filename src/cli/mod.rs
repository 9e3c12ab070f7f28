pub mod commands;
pub mod parser;

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::models::line::Line;
use crate::schedule::slots::FileSlotStore;
use tokio::runtime::Runtime;

/// Runtime for the async store calls of a one-shot command.
pub(crate) fn runtime() -> AppResult<Runtime> {
    Ok(Runtime::new()?)
}

/// "tb1", "TB1" → Line::Tb1
pub(crate) fn parse_line(code: &str) -> AppResult<Line> {
    Line::from_code(code).ok_or_else(|| AppError::InvalidLine(code.to_string()))
}

/// Client-local slots (schedule, current mold info).
pub(crate) fn slot_store(cfg: &Config) -> FileSlotStore {
    FileSlotStore::new(cfg.storage_path())
}
