use crate::cli::parser::Commands;
use crate::cli::slot_store;
use crate::config::Config;
use crate::errors::AppResult;
use crate::models::schedule::CurrentMoldInfo;
use crate::schedule::slots::{MOLD_INFO_SLOT, load_slot, save_slot};
use crate::ui::messages::{info, success};
use crate::utils::colors::colorize_optional;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::MoldInfo {
        set,
        mold_id,
        cycle_time,
        description,
        print,
    } = cmd
    {
        let store = slot_store(cfg);
        let mut current: CurrentMoldInfo = load_slot(&store, MOLD_INFO_SLOT)?.unwrap_or_default();

        if *set {
            // solo i campi passati vengono sovrascritti
            if let Some(m) = mold_id {
                current.mold_id = m.trim().to_string();
            }
            if let Some(c) = cycle_time {
                current.cycle_time = c.trim().to_string();
            }
            if let Some(d) = description {
                current.description = d.trim().to_string();
            }
            save_slot(&store, MOLD_INFO_SLOT, &current)?;
            success("Current mold info saved.");
        }

        if *print || !*set {
            print_info(&current);
        }
    }
    Ok(())
}

fn print_info(current: &CurrentMoldInfo) {
    if *current == CurrentMoldInfo::default() {
        info("No current mold info stored.");
        return;
    }
    let or_dash = |s: &str| {
        if s.is_empty() {
            colorize_optional("-")
        } else {
            s.to_string()
        }
    };
    println!("🔧 Mold       : {}", or_dash(&current.mold_id));
    println!("⏱️  Cycle time : {}", or_dash(&current.cycle_time));
    println!("📝 Description: {}", or_dash(&current.description));
}
