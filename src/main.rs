//! rMoldTracker main entrypoint.

use rmoldtracker::run;
use rmoldtracker::ui::messages::error;

fn main() {
    println!();
    if let Err(e) = run() {
        error(format!("Error: {}", e));
        std::process::exit(1);
    }
}
