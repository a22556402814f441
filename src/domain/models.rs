use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::time::{TimeOfDay, TimeSlot};
use super::types::BookingType;

/// A physical bookable court.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Court {
    pub id: i64,
    pub number: i32,
    pub shelter_id: i64,
    pub court_type_id: i64,
}

/// A covering bubble grouping courts of one type. Courts without a real
/// shelter get a synthetic one with a negative id and `open = true`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shelter {
    pub id: i64,
    pub name: String,
    pub open: bool,
    pub courts: Vec<Court>,
}

/// A category of courts sharing one per-slot price table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourtType {
    pub id: i64,
    pub name: String,
    pub tariff: Vec<i64>,
    pub shelters: Vec<Shelter>,
}

impl CourtType {
    pub fn courts(&self) -> impl Iterator<Item = &Court> {
        self.shelters.iter().flat_map(|shelter| shelter.courts.iter())
    }
}

/// A persisted reservation spanning contiguous slots on one court.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub order_id: i64,
    pub court_id: i64,
    pub time_from: TimeOfDay,
    pub time_to: TimeOfDay,
    pub type_code: BookingType,
    pub color: Option<String>,
    pub trainer_color: Option<String>,
    pub moved_at: Option<NaiveDateTime>,
    pub date_at: Option<NaiveDate>,
}

impl Booking {
    /// Whether the booking fully contains the given slot.
    pub fn covers(&self, slot: &TimeSlot) -> bool {
        self.time_from <= slot.time_from && self.time_to >= slot.time_to
    }

    pub fn moved(&self) -> bool {
        self.moved_at.is_some()
    }
}

/// A pending, uncommitted user pick, keyed by court and exact slot bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub court_id: i64,
    pub time_from: TimeOfDay,
    pub time_to: TimeOfDay,
}

/// Money and color settings driving trainer/promotion rates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TariffTable {
    #[serde(default)]
    pub money: BTreeMap<String, i64>,
    #[serde(default)]
    pub color: BTreeMap<String, String>,
}

impl TariffTable {
    /// Per-half-hour trainer rate for a color, falling back to the first
    /// trainer row when no color matches.
    pub fn trainer_rate(&self, color: Option<&str>) -> i64 {
        self.rate_by_prefix("trainer", color)
    }

    /// Per-half-hour promotion rate for a color, falling back to the first
    /// promotion row when no color matches.
    pub fn promotion_rate(&self, color: Option<&str>) -> i64 {
        self.rate_by_prefix("stock", color)
    }

    fn rate_by_prefix(&self, prefix: &str, color: Option<&str>) -> i64 {
        if let Some(color) = color {
            for (key, value) in &self.color {
                if key.starts_with(prefix) && value == color {
                    if let Some(rate) = self.money.get(key).copied().filter(|rate| *rate != 0) {
                        return rate;
                    }
                }
            }
        }
        self.money.get(&format!("{prefix}1")).copied().unwrap_or(0)
    }
}
