//! One-line coloured messages and the y/N prompt used by destructive commands.

use std::fmt;
use std::io::{self, BufRead, Write};

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

#[derive(Clone, Copy)]
enum Tone {
    Info,
    Success,
    Warning,
    Error,
}

impl Tone {
    fn colour(self) -> &'static str {
        match self {
            Tone::Info => "\x1b[34m",
            Tone::Success => "\x1b[32m",
            Tone::Warning => "\x1b[33m",
            Tone::Error => "\x1b[31m",
        }
    }

    fn icon(self) -> &'static str {
        match self {
            Tone::Info => "ℹ️",
            Tone::Success => "✅",
            Tone::Warning => "⚠️",
            Tone::Error => "❌",
        }
    }

    fn render(self, msg: &dyn fmt::Display) -> String {
        format!("{}{}{} {}{}", self.colour(), BOLD, self.icon(), RESET, msg)
    }
}

pub fn info<T: fmt::Display>(msg: T) {
    println!("{}", Tone::Info.render(&msg));
}

pub fn success<T: fmt::Display>(msg: T) {
    println!("{}", Tone::Success.render(&msg));
}

pub fn warning<T: fmt::Display>(msg: T) {
    println!("{}", Tone::Warning.render(&msg));
}

/// Errors go to stderr.
pub fn error<T: fmt::Display>(msg: T) {
    eprintln!("{}", Tone::Error.render(&msg));
}

pub fn header<T: fmt::Display>(msg: T) {
    println!(
        "{}{}====================== {}\n{}",
        Tone::Info.colour(),
        BOLD,
        msg,
        RESET
    );
}

/// Warn with `prompt` and read a y/N answer from stdin. EOF counts as "no".
pub fn confirm(prompt: &str) -> bool {
    warning(prompt);
    print!("Confirm [y/N]: ");
    let _ = io::stdout().flush();

    read_yes(io::stdin().lock())
}

fn read_yes<R: BufRead>(mut input: R) -> bool {
    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "s" | "si" | "sí"),
        Err(_) => false,
    }
}
