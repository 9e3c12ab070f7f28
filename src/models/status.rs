use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ChangeStatus {
    Pending,
    InProgress,
    Completed,
}

impl ChangeStatus {
    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ChangeStatus::Pending => "pending",
            ChangeStatus::InProgress => "in_progress",
            ChangeStatus::Completed => "completed",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ChangeStatus::Pending),
            "in_progress" => Some(ChangeStatus::InProgress),
            "completed" => Some(ChangeStatus::Completed),
            _ => None,
        }
    }

    /// Accepts the DB spelling plus a few CLI-friendly aliases.
    pub fn from_cli_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" | "p" => Some(ChangeStatus::Pending),
            "in_progress" | "in-progress" | "running" | "i" => Some(ChangeStatus::InProgress),
            "completed" | "done" | "c" => Some(ChangeStatus::Completed),
            _ => None,
        }
    }

    /// Pending and in-progress records are the "active" ones.
    pub fn is_active(&self) -> bool {
        matches!(self, ChangeStatus::Pending | ChangeStatus::InProgress)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, ChangeStatus::Completed)
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}
