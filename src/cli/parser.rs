use crate::export::ExportFormat;
use clap::{Parser, Subcommand};

/// Command-line interface definition for rMoldTracker
/// Mold-change tracking for production lines, backed by SQLite or a REST server
#[derive(Parser)]
#[command(
    name = "rmoldtracker",
    version = env!("CARGO_PKG_VERSION"),
    about = "Track mold changes on production lines: live counter, downtime vs target, schedules and exports",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Use a running `rmoldtracker serve` instead of the local database
    #[arg(global = true, long = "api", value_name = "URL")]
    pub api: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Manage the configuration file (view or edit)
    Config {
        #[arg(long = "print", help = "Print the current configuration")]
        print_config: bool,

        #[arg(
            long = "edit",
            help = "Edit the configuration file (default editor: $EDITOR, or nano/notepad)"
        )]
        edit_config: bool,

        #[arg(
            long = "editor",
            help = "Specify the editor to use (vim, nano, or custom path)"
        )]
        editor: Option<String>,
    },

    /// Run the REST API over the local database
    Serve {
        #[arg(long, value_name = "ADDR", help = "Listen address (default from config)")]
        bind: Option<String>,
    },

    /// Interactive live counter for the current mold change
    Counter {
        #[arg(long, help = "Pre-select the line (TB1, TB2, TB3, EDF1, EDF2)")]
        line: Option<String>,

        #[arg(long)]
        supervisor: Option<String>,

        #[arg(long = "prev", value_name = "MOLD")]
        previous_mold: Option<String>,

        #[arg(long = "new", value_name = "MOLD")]
        new_mold: Option<String>,

        #[arg(long)]
        reason: Option<String>,
    },

    /// Record a mold change (open, or already completed with --minutes)
    Add {
        /// Production line (TB1, TB2, TB3, EDF1, EDF2)
        line: String,

        #[arg(long = "prev", value_name = "MOLD", help = "Mold being removed")]
        previous_mold: String,

        #[arg(long = "new", value_name = "MOLD", help = "Mold being mounted")]
        new_mold: String,

        #[arg(long)]
        supervisor: String,

        #[arg(long, default_value = "Cambio de producto")]
        reason: String,

        #[arg(long, value_name = "DATETIME", help = "Start time (YYYY-MM-DD HH:MM, local)")]
        start: Option<String>,

        #[arg(long, help = "Downtime in minutes: records the change as completed")]
        minutes: Option<u32>,

        #[arg(long = "delay-reason", help = "Required when the target is exceeded")]
        delay_reason: Option<String>,

        #[arg(long = "desc", help = "Description for delay reason \"Otro\"")]
        description: Option<String>,
    },

    /// Complete an open mold change by id
    Complete {
        id: String,

        #[arg(long, help = "Downtime in minutes (default: time since start)")]
        minutes: Option<u32>,

        #[arg(long = "delay-reason", help = "Required when the target is exceeded")]
        delay_reason: Option<String>,

        #[arg(long = "desc", help = "Description for delay reason \"Otro\"")]
        description: Option<String>,
    },

    /// Delete a mold change by id
    Del {
        id: String,

        #[arg(long, short = 'f', help = "Do not ask for confirmation")]
        force: bool,
    },

    /// List mold changes
    List {
        #[arg(long, help = "pending | in_progress | completed")]
        status: Option<String>,

        #[arg(long)]
        line: Option<String>,

        #[arg(long = "today", help = "Only changes started today")]
        today: bool,

        #[arg(long, help = "Only changes started in the last N days")]
        days: Option<i64>,
    },

    /// Dashboard: today's totals, line status and averages
    Status {
        #[arg(long, help = "Show completed changes of the last --days days")]
        history: bool,

        #[arg(long, default_value_t = 30)]
        days: i64,
    },

    /// Reminders for upcoming mold changes
    Schedule {
        #[command(subcommand)]
        action: ScheduleAction,
    },

    /// Notes about the mold currently mounted
    MoldInfo {
        #[arg(long = "set", help = "Update the stored info with the given fields")]
        set: bool,

        #[arg(long = "mold", requires = "set")]
        mold_id: Option<String>,

        #[arg(long = "cycle-time", requires = "set")]
        cycle_time: Option<String>,

        #[arg(long = "desc", requires = "set")]
        description: Option<String>,

        #[arg(long = "print", help = "Print the stored info")]
        print: bool,
    },

    /// Export mold changes
    Export {
        #[arg(long, value_enum, help = "Defaults to the file extension, then csv")]
        format: Option<ExportFormat>,

        #[arg(long, value_name = "FILE")]
        file: String,

        #[arg(
            long,
            value_name = "RANGE",
            help = "Filter export by year/month/day or a custom range"
        )]
        range: Option<String>,

        #[arg(long, short = 'c', help = "Only completed changes")]
        completed: bool,

        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Print or manage the internal log table
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,
    },
}

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// Add a reminder
    Add {
        #[arg(long, value_name = "DATETIME", help = "YYYY-MM-DD HH:MM (local)")]
        date: String,

        #[arg(long = "mold")]
        mold_id: String,

        #[arg(long)]
        line: String,

        #[arg(long = "desc", default_value = "")]
        description: String,
    },

    /// List reminders
    List {
        #[arg(long, help = "Only reminders due within N days")]
        days: Option<i64>,
    },

    /// Remove a reminder (id or unique id prefix)
    Remove { id: String },

    /// Move a reminder to a new date
    Update {
        id: String,

        #[arg(long, value_name = "DATETIME")]
        date: String,
    },

    /// Show the next reminder and its countdown
    Next,
}
