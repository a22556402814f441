pub mod session;
pub mod watch;

pub use session::{BookingSession, DayView};
pub use watch::WatchService;
