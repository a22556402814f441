use std::collections::BTreeSet;
use std::fmt::Write as _;

use colored::{Color, Colorize};

use crate::domain::snapshot::Snapshot;
use crate::domain::types::BookingType;
use crate::grid::cell::Cell;
use crate::grid::model::GridModel;

const LABEL_WIDTH: usize = 7;

/// Render the day grid as a colored terminal block: one row per court,
/// two characters per half-hour cell.
pub fn render_day(snapshot: &Snapshot, grid: &GridModel) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", snapshot.date.format("%Y-%m-%d").to_string().bold());
    out.push_str(&time_ruler(snapshot));

    for court_type in &grid.court_types {
        let _ = writeln!(out, "{}", court_type.name.bold());
        for shelter in &court_type.shelters {
            for court in &shelter.courts {
                let _ = write!(out, "{:>width$} ", format!("№{}", court.number), width = LABEL_WIDTH - 1);
                for &cell_index in &court.cells {
                    let _ = write!(out, "{}", cell_glyph(grid.cell(cell_index)));
                }
                out.push('\n');
            }
        }
    }

    out.push_str(&legend(snapshot));
    out
}

fn time_ruler(snapshot: &Snapshot) -> String {
    let mut ruler = " ".repeat(LABEL_WIDTH);
    for (index, slot) in snapshot.slots.iter().enumerate() {
        if index % 4 == 0 {
            let _ = write!(ruler, "{:<8}", slot.time_from.hhmm());
        }
    }
    ruler.push('\n');
    ruler
}

fn cell_glyph(cell: &Cell) -> String {
    let glyph = if cell.ordered {
        let color = cell.type_code.map_or(Color::White, type_color);
        "██".color(color)
    } else if cell.selected {
        "▒▒".green()
    } else if cell.past_deadline {
        "··".dimmed()
    } else {
        "··".normal()
    };
    glyph.to_string()
}

fn legend(snapshot: &Snapshot) -> String {
    let present: BTreeSet<u8> = snapshot
        .bookings
        .iter()
        .map(|booking| booking.type_code.code())
        .collect();
    if present.is_empty() {
        return String::new();
    }

    let mut line = String::from(" ");
    for code in present {
        if let Some(booking_type) = BookingType::from_code(code) {
            let _ = write!(
                line,
                " {} {}",
                "██".color(type_color(booking_type)),
                booking_type.slug()
            );
        }
    }
    line.push('\n');
    line
}

fn type_color(booking_type: BookingType) -> Color {
    match booking_type {
        BookingType::Once => Color::Blue,
        BookingType::Season => Color::Green,
        BookingType::Group => Color::Magenta,
        BookingType::Tourney => Color::Yellow,
        BookingType::SeasonOnce => Color::Cyan,
        BookingType::Promotion => Color::BrightYellow,
        BookingType::Trainer => Color::Red,
        BookingType::Deposit => Color::BrightBlue,
        BookingType::Closed => Color::BrightBlack,
        BookingType::Club => Color::BrightMagenta,
        BookingType::ClubOnce => Color::BrightCyan,
        BookingType::SeasonTrainer => Color::BrightGreen,
    }
}

/// Group a price into thousands for display, e.g. 1234500 → "1 234 500".
pub fn format_price(value: i64) -> String {
    let digits = value.abs().to_string();
    let mut grouped = String::new();

    for (position, digit) in digits.chars().enumerate() {
        if position > 0 && (digits.len() - position) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(digit);
    }

    if value < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}
