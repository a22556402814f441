use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::config::policy::trainer_only_applies;
use crate::config::settings::VenueSettings;
use crate::domain::snapshot::Snapshot;
use crate::domain::types::BookingType;
use crate::grid::model::GridModel;

/// Everything the tariff computation depends on besides the groups
/// themselves.
#[derive(Debug, Clone)]
pub struct PriceContext<'a> {
    /// Booking-type code the price is computed for.
    pub type_code: u8,
    /// Multiplier from the discount table; the court component only.
    pub discount: f64,
    /// Manually entered flat total, overriding every tariff.
    pub manual_total: Option<i64>,
    pub promotion_color: Option<&'a str>,
    pub trainer_color: Option<&'a str>,
    pub host: &'a str,
    pub today: NaiveDate,
}

/// Price a set of groups: per covered slot index a tariff component is
/// picked by booking type, the trainer fee accumulates undiscounted into
/// a separate detail total.
pub fn price_groups(
    snapshot: &Snapshot,
    grid: &GridModel,
    groups: &[usize],
    ctx: &PriceContext<'_>,
    venue: &VenueSettings,
) -> i64 {
    let discount = if ctx.type_code == BookingType::Closed.code() {
        0.0
    } else {
        ctx.discount
    };

    let mut total = 0.0;
    let mut detail = 0.0;

    for &group_index in groups {
        let group = grid.group(group_index);
        let Some(court_type) = snapshot.court_type(group.court_type_id) else {
            continue;
        };

        let index_from = grid.cell(group.first_cell()).index;
        let index_to = grid.cell(group.last_cell()).index;

        for slot_index in index_from..=index_to {
            if let Some(manual) = ctx.manual_total {
                // The manually entered amount is flat for the whole input.
                total = manual as f64;
                continue;
            }

            let tariff = court_type.tariff.get(slot_index).copied().unwrap_or(0) as f64;

            match BookingType::from_code(ctx.type_code) {
                Some(BookingType::Promotion) => {
                    total += snapshot.tariffs.promotion_rate(ctx.promotion_color) as f64 / 2.0;
                }
                Some(BookingType::Trainer) => {
                    if trainer_only_applies(venue, ctx.host, ctx.today, ctx.trainer_color) {
                        total += snapshot.tariffs.trainer_rate(ctx.trainer_color) as f64 / 2.0;
                    } else {
                        total += tariff;
                        detail += snapshot.tariffs.trainer_rate(ctx.trainer_color) as f64 / 2.0;
                    }
                }
                // Season-with-trainer orders have no trainer attached at
                // creation time, so no detail component.
                Some(BookingType::SeasonTrainer) => total += tariff,
                _ => total += tariff,
            }
        }
    }

    (total * discount + detail).round() as i64
}

/// The discount multiplier for a booking type, 1.0 when the table has no
/// entry for it.
pub fn resolve_discount(discounts: &BTreeMap<u8, f64>, type_code: u8) -> f64 {
    discounts.get(&type_code).copied().unwrap_or(1.0)
}

/// One dated entry of a seasonal order, as edited in the season summary.
#[derive(Debug, Clone)]
pub struct SeasonItem {
    pub date_at: NaiveDate,
    pub price: f64,
    pub price_detail: i64,
    pub deleted: bool,
    pub delete_sharing: bool,
}

/// Month-scoped sum for season editing: per item the court component is
/// discounted, the detail is not, and the result rounds up.
pub fn price_month(items: &[SeasonItem], month: u32, discount: f64) -> i64 {
    items
        .iter()
        .filter(|item| (item.delete_sharing || !item.deleted) && item.date_at.month() == month)
        .map(|item| {
            let detail = item.price_detail as f64;
            ((item.price - detail) * discount + detail).ceil() as i64
        })
        .sum()
}
