use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::config::settings::GridSettings;
use crate::errors::SnapshotError;

use super::models::{Booking, Court, CourtType, Selection, Shelter, TariffTable};
use super::time::{TimeOfDay, TimeSlot};
use super::types::BookingType;

/// Display name given to synthetic shelters.
const OPEN_SHELTER_NAME: &str = "open";

// --- Wire Structures ---

/// The raw day payload as delivered by the polling endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDay {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub admin: u8,
    #[serde(rename = "type", default)]
    pub viewing_type: Option<u8>,
    #[serde(default)]
    pub is_season_booking: bool,
    #[serde(default)]
    pub court_types: Vec<RawCourtType>,
    #[serde(default)]
    pub inflates: Vec<RawShelter>,
    #[serde(default)]
    pub time_list: Vec<TimeSlot>,
    #[serde(default)]
    pub time_price: Vec<Vec<i64>>,
    #[serde(default)]
    pub time_blocked: Vec<RawBooking>,
    #[serde(default)]
    pub time_selected: Vec<Selection>,
    #[serde(default)]
    pub settings: RawSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCourtType {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub courts: Vec<RawCourt>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCourt {
    pub id: i64,
    pub number: i32,
    #[serde(default)]
    pub inflate_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawShelter {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBooking {
    pub id: i64,
    #[serde(default)]
    pub order_id: i64,
    pub court_id: i64,
    pub time_from: TimeOfDay,
    pub time_to: TimeOfDay,
    #[serde(default)]
    pub type_id: Option<u8>,
    #[serde(default)]
    pub order: Option<RawOrder>,
    #[serde(default)]
    pub trainer_color: Option<String>,
    #[serde(default)]
    pub moved_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub date_at: Option<NaiveDate>,
}

impl RawBooking {
    /// The effective type code: the entry's own, or the owning order's.
    fn effective_type_code(&self) -> u8 {
        self.type_id
            .filter(|code| *code != 0)
            .or_else(|| self.order.as_ref().map(|order| order.type_id))
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawOrder {
    pub type_id: u8,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSettings {
    #[serde(default)]
    pub discount: BTreeMap<String, f64>,
    #[serde(default)]
    pub money: BTreeMap<String, i64>,
    #[serde(default)]
    pub color: BTreeMap<String, String>,
}

// --- Normalized Snapshot ---

/// Normalized day state: everything the grid builder and the pricing
/// engine consume.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub date: NaiveDate,
    pub admin: bool,
    pub viewing_type: u8,
    pub season_booking: bool,
    pub slots: Vec<TimeSlot>,
    pub court_types: Vec<CourtType>,
    pub bookings: Vec<Booking>,
    pub discounts: BTreeMap<u8, f64>,
    pub tariffs: TariffTable,
    pub selections: Vec<Selection>,
}

impl Snapshot {
    pub fn court_type(&self, id: i64) -> Option<&CourtType> {
        self.court_types.iter().find(|court_type| court_type.id == id)
    }

    pub fn day_start(&self) -> TimeOfDay {
        self.slots[0].time_from
    }

    fn knows_court(&self, court_id: i64) -> bool {
        self.court_types
            .iter()
            .any(|court_type| court_type.courts().any(|court| court.id == court_id))
    }
}

/// Normalize a raw day payload, partitioning courts into shelters and
/// validating every booking against the day schedule.
pub fn normalize(
    raw: &RawDay,
    fallback_date: NaiveDate,
    settings: &GridSettings,
) -> Result<Snapshot, SnapshotError> {
    if raw.time_list.is_empty() {
        return Err(SnapshotError::EmptyDay);
    }

    let mut snapshot = Snapshot {
        date: raw.date.unwrap_or(fallback_date),
        admin: raw.admin == 1,
        viewing_type: raw.viewing_type.unwrap_or(0),
        season_booking: raw.is_season_booking,
        slots: raw.time_list.clone(),
        court_types: Vec::with_capacity(raw.court_types.len()),
        bookings: Vec::with_capacity(raw.time_blocked.len()),
        discounts: parse_discounts(&raw.settings.discount),
        tariffs: TariffTable {
            money: raw.settings.money.clone(),
            color: raw.settings.color.clone(),
        },
        selections: raw.time_selected.clone(),
    };

    for (index, raw_type) in raw.court_types.iter().enumerate() {
        let tariff = raw.time_price.get(index).cloned().unwrap_or_default();
        if tariff.len() < snapshot.slots.len() {
            return Err(SnapshotError::TariffMismatch {
                court_type_id: raw_type.id,
                have: tariff.len(),
                want: snapshot.slots.len(),
            });
        }
        snapshot
            .court_types
            .push(build_court_type(raw_type, tariff, &raw.inflates, settings));
    }

    for raw_booking in &raw.time_blocked {
        let booking = convert_booking(raw_booking, &snapshot)?;
        snapshot.bookings.push(booking);
    }

    Ok(snapshot)
}

// --- Shelter Partitioning ---

fn build_court_type(
    raw_type: &RawCourtType,
    tariff: Vec<i64>,
    known_shelters: &[RawShelter],
    settings: &GridSettings,
) -> CourtType {
    let mut court_type = CourtType {
        id: raw_type.id,
        name: raw_type.name.clone(),
        tariff,
        shelters: Vec::new(),
    };

    // Counter for synthetic shelter ids; court types below the threshold
    // give every open court its own shelter, later ones share a single one.
    let mut negative = -raw_type.id * settings.synthetic_shelter_base;

    for raw_court in &raw_type.courts {
        let shelter_id = if raw_court.inflate_id == 0 {
            if raw_type.id < settings.per_court_shelter_max_type {
                let id = negative;
                negative -= 1;
                id
            } else {
                negative
            }
        } else {
            raw_court.inflate_id
        };

        let court = Court {
            id: raw_court.id,
            number: raw_court.number,
            shelter_id,
            court_type_id: raw_type.id,
        };

        shelter_entry(&mut court_type.shelters, shelter_id, known_shelters)
            .courts
            .push(court);
    }

    court_type
}

fn shelter_entry<'a>(
    shelters: &'a mut Vec<Shelter>,
    shelter_id: i64,
    known_shelters: &[RawShelter],
) -> &'a mut Shelter {
    if let Some(position) = shelters.iter().position(|shelter| shelter.id == shelter_id) {
        return &mut shelters[position];
    }

    let known = known_shelters.iter().find(|shelter| shelter.id == shelter_id);
    shelters.push(Shelter {
        id: shelter_id,
        name: known.map_or_else(|| OPEN_SHELTER_NAME.to_string(), |s| s.name.clone()),
        open: known.is_none(),
        courts: Vec::new(),
    });
    shelters.last_mut().expect("entry just pushed")
}

// --- Booking Validation ---

fn convert_booking(raw: &RawBooking, snapshot: &Snapshot) -> Result<Booking, SnapshotError> {
    if !snapshot.knows_court(raw.court_id) {
        return Err(SnapshotError::UnknownCourt {
            booking_id: raw.id,
            court_id: raw.court_id,
        });
    }

    let day_start = snapshot.day_start();
    let day_end = snapshot.slots[snapshot.slots.len() - 1].time_to;
    let in_range = raw.time_from < raw.time_to && raw.time_from >= day_start && raw.time_to <= day_end;
    let aligned = in_range
        && (raw.time_from.seconds() - day_start.seconds()) % super::time::SLOT_SECONDS == 0;
    if !in_range || !aligned {
        return Err(SnapshotError::InvalidTimeRange {
            booking_id: raw.id,
            time_from: raw.time_from,
            time_to: raw.time_to,
        });
    }

    let code = raw.effective_type_code();
    let type_code =
        BookingType::from_code(code).ok_or(SnapshotError::UnknownBookingType {
            booking_id: raw.id,
            code,
        })?;

    Ok(Booking {
        id: raw.id,
        order_id: raw.order_id,
        court_id: raw.court_id,
        time_from: raw.time_from,
        time_to: raw.time_to,
        type_code,
        color: raw.order.as_ref().and_then(|order| order.color.clone()),
        trainer_color: raw.trainer_color.clone(),
        moved_at: raw.moved_at,
        date_at: raw.date_at,
    })
}

fn parse_discounts(raw: &BTreeMap<String, f64>) -> BTreeMap<u8, f64> {
    raw.iter()
        .filter_map(|(code, value)| code.parse().ok().map(|code| (code, *value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> GridSettings {
        GridSettings::default()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 15).unwrap()
    }

    fn raw_day(value: serde_json::Value) -> RawDay {
        serde_json::from_value(value).unwrap()
    }

    fn two_slot_day() -> serde_json::Value {
        serde_json::json!({
            "date": "2024-09-15",
            "court_types": [
                {"id": 1, "name": "Hard", "courts": [
                    {"id": 10, "number": 1},
                    {"id": 11, "number": 2},
                ]},
            ],
            "time_list": [
                {"time_from": "10:00", "time_to": "10:30"},
                {"time_from": "10:30", "time_to": "11:00"},
            ],
            "time_price": [[600, 600]],
        })
    }

    #[test]
    fn gives_each_open_court_its_own_shelter_below_threshold() {
        let snapshot = normalize(&raw_day(two_slot_day()), date(), &settings()).unwrap();

        let shelters = &snapshot.court_types[0].shelters;
        assert_eq!(shelters.len(), 2);
        assert_eq!(shelters[0].id, -1000);
        assert_eq!(shelters[1].id, -1001);
        assert!(shelters.iter().all(|shelter| shelter.open));
        assert!(shelters.iter().all(|shelter| shelter.courts.len() == 1));
    }

    #[test]
    fn shares_one_open_shelter_above_threshold() {
        let mut day = two_slot_day();
        day["court_types"][0]["id"] = serde_json::json!(3);
        let snapshot = normalize(&raw_day(day), date(), &settings()).unwrap();

        let shelters = &snapshot.court_types[0].shelters;
        assert_eq!(shelters.len(), 1);
        assert_eq!(shelters[0].id, -3000);
        assert_eq!(shelters[0].courts.len(), 2);
    }

    #[test]
    fn resolves_real_shelters_by_id() {
        let mut day = two_slot_day();
        day["inflates"] = serde_json::json!([{"id": 5, "name": "Bubble"}]);
        day["court_types"][0]["courts"][0]["inflate_id"] = serde_json::json!(5);
        let snapshot = normalize(&raw_day(day), date(), &settings()).unwrap();

        let shelters = &snapshot.court_types[0].shelters;
        assert_eq!(shelters[0].id, 5);
        assert_eq!(shelters[0].name, "Bubble");
        assert!(!shelters[0].open);
    }

    #[test]
    fn rejects_booking_on_unknown_court() {
        let mut day = two_slot_day();
        day["time_blocked"] = serde_json::json!([
            {"id": 7, "order_id": 1, "court_id": 99, "time_from": "10:00", "time_to": "10:30", "type_id": 1},
        ]);
        let error = normalize(&raw_day(day), date(), &settings()).unwrap_err();
        assert_eq!(
            error,
            SnapshotError::UnknownCourt {
                booking_id: 7,
                court_id: 99
            }
        );
    }

    #[test]
    fn rejects_out_of_range_booking() {
        let mut day = two_slot_day();
        day["time_blocked"] = serde_json::json!([
            {"id": 7, "order_id": 1, "court_id": 10, "time_from": "09:00", "time_to": "10:30", "type_id": 1},
        ]);
        let error = normalize(&raw_day(day), date(), &settings()).unwrap_err();
        assert!(matches!(error, SnapshotError::InvalidTimeRange { booking_id: 7, .. }));
    }

    #[test]
    fn rejects_inverted_booking_range() {
        let mut day = two_slot_day();
        day["time_blocked"] = serde_json::json!([
            {"id": 7, "order_id": 1, "court_id": 10, "time_from": "10:30", "time_to": "10:00", "type_id": 1},
        ]);
        assert!(normalize(&raw_day(day), date(), &settings()).is_err());
    }

    #[test]
    fn rejects_empty_day() {
        let mut day = two_slot_day();
        day["time_list"] = serde_json::json!([]);
        let error = normalize(&raw_day(day), date(), &settings()).unwrap_err();
        assert_eq!(error, SnapshotError::EmptyDay);
    }

    #[test]
    fn rejects_short_price_table() {
        let mut day = two_slot_day();
        day["time_price"] = serde_json::json!([[600]]);
        let error = normalize(&raw_day(day), date(), &settings()).unwrap_err();
        assert!(matches!(error, SnapshotError::TariffMismatch { court_type_id: 1, .. }));
    }

    #[test]
    fn booking_type_falls_back_to_owning_order() {
        let mut day = two_slot_day();
        day["time_blocked"] = serde_json::json!([
            {"id": 7, "order_id": 1, "court_id": 10, "time_from": "10:00", "time_to": "11:00",
             "order": {"type_id": 7, "color": "#112233"}},
        ]);
        let snapshot = normalize(&raw_day(day), date(), &settings()).unwrap();
        assert_eq!(snapshot.bookings[0].type_code, BookingType::Trainer);
        assert_eq!(snapshot.bookings[0].color.as_deref(), Some("#112233"));
    }

    #[test]
    fn parses_discount_table() {
        let mut day = two_slot_day();
        day["settings"] = serde_json::json!({"discount": {"2": 0.8, "7": 0.9}});
        let snapshot = normalize(&raw_day(day), date(), &settings()).unwrap();
        assert_eq!(snapshot.discounts.get(&2), Some(&0.8));
        assert_eq!(snapshot.discounts.get(&7), Some(&0.9));
    }
}
