use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "court booking grid client")]
pub struct Cli {
    /// Command
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "lower_case")]
pub enum Command {
    /// Fetch one day from the booking backend and print its grid
    Show {
        /// Base URL of the booking backend
        #[arg(long)]
        host: String,
        /// Day to show, YYYY-MM-DD (defaults to today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
        /// Viewing booking-type code
        #[arg(short = 't', long = "type", default_value_t = 1)]
        viewing_type: u8,
    },
    /// Poll the backend periodically and keep the grid up to date
    Watch {
        /// Base URL of the booking backend
        #[arg(long)]
        host: String,
        /// Day to watch, YYYY-MM-DD (defaults to today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
        /// Viewing booking-type code
        #[arg(short = 't', long = "type", default_value_t = 1)]
        viewing_type: u8,
        /// Seconds between refresh pulls
        #[arg(short, long, default_value_t = 15)]
        interval: u64,
    },
}
