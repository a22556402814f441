pub mod api;
pub mod cli;
pub mod config;
pub mod display;
pub mod domain;
pub mod errors;
pub mod gesture;
pub mod grid;
pub mod pricing;
pub mod selection;
pub mod services;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::Parser;
use cli::Cli;

use crate::cli::Command;
use crate::config::AppConfig;
use crate::services::session::BookingSession;
use crate::services::watch::WatchService;

pub fn interpret() -> Command {
    let cli = Cli::parse();
    cli.command
}

pub fn handle_show(host: &str, date: Option<NaiveDate>, viewing_type: u8) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let mut session = new_session(host, date, viewing_type)?;
        session.load().await?;
        let view = session.rebuild()?;
        println!("{}", display::render_day(&view.snapshot, &view.grid));
        Ok(())
    })
}

pub fn handle_watch(
    host: &str,
    date: Option<NaiveDate>,
    viewing_type: u8,
    interval: u64,
) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let session = new_session(host, date, viewing_type)?;
        let mut service = WatchService::new(session, interval);
        service.run().await
    })
}

fn new_session(
    host: &str,
    date: Option<NaiveDate>,
    viewing_type: u8,
) -> Result<BookingSession> {
    let config = AppConfig::new();
    let date = date.unwrap_or_else(|| Local::now().date_naive());
    BookingSession::new(config, host, date, viewing_type)
}
