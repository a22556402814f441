pub mod models;
pub mod snapshot;
pub mod time;
pub mod types;

pub use models::{Booking, Court, CourtType, Selection, Shelter, TariffTable};
pub use snapshot::{normalize, RawDay, Snapshot};
pub use time::{Clock, TimeOfDay, TimeSlot};
pub use types::{is_seasonal_code, BookingType};
