use chrono::NaiveDate;

/// Thresholds driving cell flags and grid construction.
#[derive(Debug, Clone)]
pub struct GridSettings {
    /// Bookings with a type code above this stay editable for everyone.
    pub editable_type_cutoff: u8,
    /// Viewing-type codes below this may edit any booking.
    pub admin_view_cutoff: u8,
    /// Viewing-type codes below this may move a booking again after it
    /// has already been relocated once.
    pub movable_view_cutoff: u8,
    /// Court types with an id below this give every shelterless court its
    /// own synthetic shelter; later types share a single open one.
    pub per_court_shelter_max_type: i64,
    /// Base multiplier for synthetic shelter ids (`-type_id * base`).
    pub synthetic_shelter_base: i64,
    /// Smallest allowed selection run, in cells.
    pub min_selection_cells: usize,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            editable_type_cutoff: 3,
            admin_view_cutoff: 4,
            movable_view_cutoff: 2,
            per_court_shelter_max_type: 3,
            synthetic_shelter_base: 1000,
            min_selection_cells: 2,
        }
    }
}

/// HTTP client behavior against the booking backend.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub user_agent: &'static str,
    pub timeout_secs: u64,
    /// Bounded timeout for the periodic refresh pull; a miss is dropped.
    pub poll_timeout_secs: u64,
    pub poll_interval_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            user_agent: "CourtBooking/1.0",
            timeout_secs: 30,
            poll_timeout_secs: 5,
            poll_interval_secs: 15,
        }
    }
}

/// Venue-specific pricing carve-out: individual trainer sessions priced
/// as trainer-only during a fixed historical window.
#[derive(Debug, Clone)]
pub struct VenueSettings {
    pub trainer_only_hosts: Vec<String>,
    pub trainer_only_from: NaiveDate,
    pub trainer_only_until: NaiveDate,
    pub trainer_only_excluded_color: String,
}

impl Default for VenueSettings {
    fn default() -> Self {
        Self {
            trainer_only_hosts: vec!["t14.spb.ru".to_string(), "local.t14.spb.ru".to_string()],
            trainer_only_from: NaiveDate::from_ymd_opt(2022, 9, 1).expect("valid date"),
            trainer_only_until: NaiveDate::from_ymd_opt(2023, 2, 1).expect("valid date"),
            trainer_only_excluded_color: "#0b3dff".to_string(),
        }
    }
}

pub struct AppConfig {
    pub grid: GridSettings,
    pub client: ClientSettings,
    pub venue: VenueSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            grid: GridSettings::default(),
            client: ClientSettings::default(),
            venue: VenueSettings::default(),
        }
    }
}
