use crate::cli::parser::Commands;
use crate::cli::{parse_line, runtime};
use crate::config::Config;
use crate::core::add::{AddLogic, AddPlan, AddRequest};
use crate::core::calculator::target::Target;
use crate::core::counter::ChangeForm;
use crate::errors::{AppError, AppResult};
use crate::store::{self, Claim, RecordStore};
use crate::ui::messages::success;
use crate::utils::time::parse_local_datetime;
use chrono::Local;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Add {
        line,
        previous_mold,
        new_mold,
        supervisor,
        reason,
        start,
        minutes,
        delay_reason,
        description,
    } = cmd
    {
        let req = AddRequest {
            form: ChangeForm {
                line: Some(parse_line(line)?),
                supervisor: supervisor.clone(),
                previous_mold: previous_mold.clone(),
                new_mold: new_mold.clone(),
                reason: reason.clone(),
                delay_reason: delay_reason.clone().unwrap_or_default(),
                delay_description: description.clone().unwrap_or_default(),
            },
            started_at: start.as_deref().map(parse_local_datetime).transpose()?,
            minutes: *minutes,
        };

        let target = Target::from_minutes(cfg.target_minutes);
        let plan = AddLogic::plan(&req, &Local::now(), target)?;
        let store = store::open(cfg)?;

        runtime()?.block_on(apply(plan, store.as_ref(), target))?;
    }
    Ok(())
}

async fn apply(plan: AddPlan, store: &dyn RecordStore, target: Target) -> AppResult<()> {
    match plan {
        AddPlan::Claim(new) => match store.claim(new).await? {
            Claim::Created(rec) => {
                success(format!(
                    "Change #{} started on {} ({} → {})",
                    rec.id, rec.line, rec.previous_mold_id, rec.new_mold_id
                ));
                Ok(())
            }
            Claim::Existing(rec) => Err(AppError::ActiveChangeExists(Box::new(rec))),
        },
        AddPlan::Record(new) => {
            let rec = store.create(new).await?;
            let label = if target.is_exceeded(u64::from(rec.downtime_minutes) * 60) {
                "Fuera de meta"
            } else {
                "En meta"
            };
            success(format!(
                "Change #{} recorded: {} - {} min ({label})",
                rec.id, rec.line, rec.downtime_minutes
            ));
            Ok(())
        }
    }
}
