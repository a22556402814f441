use std::time::Duration;

use anyhow::Result;
use log::{debug, info};
use tokio::time::sleep;

use crate::display;

use super::session::BookingSession;

/// Keeps a session's day state in sync with the backend and re-renders
/// the grid after every successful pull.
pub struct WatchService {
    session: BookingSession,
    interval: Duration,
}

impl WatchService {
    pub fn new(session: BookingSession, interval_secs: u64) -> Self {
        Self {
            session,
            interval: Duration::from_secs(interval_secs),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.session.load().await?;
        self.render()?;

        loop {
            sleep(self.interval).await;

            // The refresh pull is best effort: a timeout or transport
            // error just leaves the grid as it was until the next cycle.
            match self.session.refresh().await {
                Ok(()) => self.render()?,
                Err(error) => debug!("refresh skipped: {error:#}"),
            }
        }
    }

    fn render(&mut self) -> Result<()> {
        let view = self.session.rebuild()?;
        info!(
            "{}: {} bookings, {} pending selections",
            self.session.date(),
            view.snapshot.bookings.len(),
            self.session.selections().len()
        );
        println!("{}", display::render_day(&view.snapshot, &view.grid));
        Ok(())
    }
}
