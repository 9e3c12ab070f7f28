use crate::cli::parser::Commands;
use crate::cli::runtime;
use crate::config::Config;
use crate::errors::AppResult;
use crate::export::{ExportFilter, ExportFormat, ExportLogic};
use crate::store;
use std::path::Path;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Export {
        format,
        file,
        range,
        completed,
        force,
    } = cmd
    {
        let format = format
            .or_else(|| ExportFormat::from_path(Path::new(file)))
            .unwrap_or(ExportFormat::Csv);

        let store = store::open(cfg)?;
        let records = runtime()?.block_on(store.list())?;

        let filter = ExportFilter {
            range: range.clone(),
            completed_only: *completed,
        };
        ExportLogic::export(&records, format, file, &filter, *force)?;
    }
    Ok(())
}
