use crate::cli::parser::Commands;
use crate::cli::runtime;
use crate::config::Config;
use crate::errors::AppResult;
use crate::store;
use crate::ui::messages::{confirm, info, success};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Del { id, force } = cmd {
        //
        // Confirmation prompt
        //
        let prompt = format!("Delete mold change #{}? This action is irreversible.", id);
        if !*force && !confirm(&prompt) {
            info("Operation cancelled.");
            return Ok(());
        }

        //
        // Execute deletion
        //
        let store = store::open(cfg)?;
        runtime()?.block_on(store.delete(id))?;

        success(format!("Mold change #{} has been deleted.", id));
    }

    Ok(())
}
