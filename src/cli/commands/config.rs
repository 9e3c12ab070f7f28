use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{error, success, warning};
use std::env;
use std::path::Path;
use std::process::Command;

/// Handle the `config` subcommand
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Config {
        print_config,
        edit_config,
        editor,
    } = cmd
    {
        let path = Config::config_file();

        if *print_config {
            print(cfg, &path)?;
        }
        if *edit_config {
            edit(cfg, &path, editor.clone())?;
        }
    }

    Ok(())
}

/// Effective configuration, `--db` / `--api` / env overrides included.
fn print(cfg: &Config, path: &Path) -> AppResult<()> {
    let yaml = serde_yaml::to_string(cfg).map_err(|e| AppError::Config(e.to_string()))?;
    println!("📄 Current configuration ({}):\n", path.display());
    println!("{yaml}");
    Ok(())
}

fn edit(cfg: &Config, path: &Path, requested: Option<String>) -> AppResult<()> {
    if !path.exists() {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        cfg.save_to(path)?;
    }

    let candidates = editor_candidates(
        requested,
        env::var("EDITOR").ok(),
        env::var("VISUAL").ok(),
    );

    let Some(used) = candidates.iter().find(|ed| {
        let ok = matches!(Command::new(ed.as_str()).arg(path).status(), Ok(s) if s.success());
        if !ok {
            warning(format!("Editor '{ed}' not available, trying the next one"));
        }
        ok
    }) else {
        error(format!(
            "Failed to edit configuration file (tried: {})",
            candidates.join(", ")
        ));
        return Ok(());
    };

    // il file modificato deve restare leggibile
    match Config::load_from(path) {
        Ok(_) => success(format!("Configuration file edited successfully using '{used}'")),
        Err(e) => warning(format!("Saved, but the file does not parse: {e}")),
    }
    Ok(())
}

/// `--editor`, then $EDITOR, $VISUAL and the platform default, without repeats.
fn editor_candidates(
    requested: Option<String>,
    env_editor: Option<String>,
    env_visual: Option<String>,
) -> Vec<String> {
    let platform = if cfg!(target_os = "windows") {
        "notepad"
    } else {
        "nano"
    };

    let mut out: Vec<String> = Vec::new();
    for ed in [requested, env_editor, env_visual, Some(platform.to_string())]
        .into_iter()
        .flatten()
    {
        let ed = ed.trim().to_string();
        if !ed.is_empty() && !out.contains(&ed) {
            out.push(ed);
        }
    }
    out
}
