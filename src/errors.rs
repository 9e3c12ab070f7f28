//! Unified application error type.
//! All modules (db, store, cache, core, cli, server) return AppError to keep
//! the error handling consistent and easy to manage.

use crate::core::counter::CounterError;
use crate::models::mold_change::MoldChange;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Database-related
    // ---------------------------
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    // ---------------------------
    // Remote store (REST client)
    // ---------------------------
    #[error("HTTP error: {0}")]
    Http(#[from] ureq::Error),

    #[error("Server responded {status}: {message}")]
    Remote { status: u16, message: String },

    // ---------------------------
    // Parsing errors
    // ---------------------------
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error("Invalid production line: {0}")]
    InvalidLine(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    // ---------------------------
    // Record lifecycle
    // ---------------------------
    #[error("Mold change not found: {0}")]
    NotFound(String),

    #[error("Another mold change is already active: {}", .0.id)]
    ActiveChangeExists(Box<MoldChange>),

    #[error(transparent)]
    Counter(#[from] CounterError),

    // ---------------------------
    // Schedule / local storage
    // ---------------------------
    #[error("Scheduled change not found: {0}")]
    ScheduleNotFound(String),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration")]
    ConfigLoad,

    #[error("Failed to save configuration")]
    ConfigSave,

    // ---------------------------
    // Export errors
    // ---------------------------
    #[error("Export error: {0}")]
    Export(String),

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

pub type AppResult<T> = Result<T, AppError>;
