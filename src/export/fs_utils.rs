// src/export/fs_utils.rs

use crate::errors::{AppError, AppResult};
use crate::ui::messages::{confirm, info};
use std::path::Path;

/// Il file di destinazione può essere scritto?
///
/// - non esiste, oppure `force` → Ok
/// - è una directory → errore
/// - esiste → conferma interattiva, altrimenti export annullato
pub(crate) fn ensure_writable(path: &Path, force: bool) -> AppResult<()> {
    if path.is_dir() {
        return Err(AppError::Export(format!(
            "'{}' is a directory",
            path.display()
        )));
    }
    if !path.exists() || force {
        return Ok(());
    }

    let prompt = format!("The file '{}' already exists. Overwrite it?", path.display());
    if confirm(&prompt) {
        info("Existing file will be overwritten.");
        Ok(())
    } else {
        Err(AppError::Export(
            "export cancelled: existing file not overwritten".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_file_and_forced_overwrite_pass() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        assert!(ensure_writable(&path, false).is_ok());

        std::fs::write(&path, "x").unwrap();
        assert!(ensure_writable(&path, true).is_ok());
    }

    #[test]
    fn directory_is_rejected_even_with_force() {
        let dir = tempfile::tempdir().unwrap();
        let err = ensure_writable(dir.path(), true).unwrap_err();
        assert!(err.to_string().contains("is a directory"));
    }
}
