use chrono::NaiveDate;

use super::settings::VenueSettings;

/// From this date on the default seasonal discount drops from 20% to 10%.
const SEASON_DISCOUNT_CUTOVER: (i32, u32, u32) = (2024, 9, 1);

/// Price multiplier sent with remote season price lookups.
pub fn season_discount(date: NaiveDate) -> f64 {
    let (year, month, day) = SEASON_DISCOUNT_CUTOVER;
    let cutover = NaiveDate::from_ymd_opt(year, month, day).expect("valid date");
    if date >= cutover { 0.90 } else { 0.80 }
}

/// Whether an individual trainer session at this venue prices as
/// trainer-only instead of court plus trainer detail.
pub fn trainer_only_applies(
    venue: &VenueSettings,
    host: &str,
    today: NaiveDate,
    trainer_color: Option<&str>,
) -> bool {
    let host_matches = venue
        .trainer_only_hosts
        .iter()
        .any(|candidate| host.contains(candidate.as_str()));
    let in_window = today >= venue.trainer_only_from && today < venue.trainer_only_until;
    let color_excluded =
        trainer_color.is_some_and(|color| color == venue.trainer_only_excluded_color);

    host_matches && in_window && !color_excluded
}
