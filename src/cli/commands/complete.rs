use crate::cli::parser::Commands;
use crate::cli::runtime;
use crate::config::Config;
use crate::core::calculator::target::Target;
use crate::core::complete::{CompleteLogic, CompleteRequest};
use crate::errors::{AppError, AppResult};
use crate::store;
use crate::ui::messages::success;
use chrono::Utc;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Complete {
        id,
        minutes,
        delay_reason,
        description,
    } = cmd
    {
        let req = CompleteRequest {
            minutes: *minutes,
            delay_reason: delay_reason.clone(),
            description: description.clone(),
        };
        let target = Target::from_minutes(cfg.target_minutes);
        let store = store::open(cfg)?;

        let (rec, over_target) = runtime()?.block_on(async {
            let current = store
                .list()
                .await?
                .into_iter()
                .find(|r| r.id == *id)
                .ok_or_else(|| AppError::NotFound(id.clone()))?;

            let plan = CompleteLogic::plan(&current, &req, Utc::now(), target)?;
            let rec = store.update(id, plan.patch).await?;
            Ok::<_, AppError>((rec, plan.over_target))
        })?;

        let label = if over_target {
            "Fuera de meta"
        } else {
            "En meta"
        };
        success(format!(
            "Change #{} completed: {} - {} min ({label})",
            rec.id, rec.line, rec.downtime_minutes
        ));
    }
    Ok(())
}
