use crate::cli::parser::Commands;
use crate::cli::runtime;
use crate::config::Config;
use crate::errors::AppResult;
use crate::server;
use crate::store::RecordStore;
use crate::store::sqlite::SqliteStore;
use crate::ui::messages::{info, warning};
use std::sync::Arc;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Serve { bind } = cmd {
        let addr = bind.clone().unwrap_or_else(|| cfg.bind_addr.clone());

        if let Some(url) = &cfg.api_url {
            warning(format!(
                "api_url ({url}) is ignored by `serve`: records are served from the local database"
            ));
        }

        let store: Arc<dyn RecordStore> = Arc::new(SqliteStore::open(&cfg.database)?);

        info(format!("🗄️  Database : {}", cfg.database));
        info(format!("🌐 Listening on http://{addr} (Ctrl+C to stop)"));

        runtime()?.block_on(server::serve(store, &addr))?;
    }
    Ok(())
}
