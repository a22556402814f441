use anyhow::Result;

use court_booking::cli::Command;
use court_booking::{handle_show, handle_watch, interpret};

fn main() {
    setup_logging();
    parse_and_execute().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });
}

fn setup_logging() {
    sensible_env_logger::init!();
}

fn parse_and_execute() -> Result<()> {
    let command = interpret();
    execute_command(command)
}

fn execute_command(command: Command) -> Result<()> {
    match command {
        Command::Show {
            host,
            date,
            viewing_type,
        } => handle_show(&host, date, viewing_type),
        Command::Watch {
            host,
            date,
            viewing_type,
            interval,
        } => handle_watch(&host, date, viewing_type, interval),
    }
}
