use crate::config::settings::GridSettings;
use crate::domain::models::{Booking, Court};
use crate::domain::snapshot::Snapshot;
use crate::domain::time::{Clock, TimeSlot, SLOT_SECONDS};
use crate::errors::GridError;
use crate::selection::SelectionSet;

use super::cell::Cell;
use super::group::Group;
use super::model::{CourtGrid, CourtTypeGrid, GridModel, ShelterGrid};

/// Who is looking at the grid and in which mode.
#[derive(Debug, Clone, Copy)]
pub struct ViewContext {
    pub admin: bool,
    /// Raw viewing booking-type code; 0 when no mode is selected.
    pub viewing_type: u8,
    pub season_booking: bool,
}

/// Build the day grid from scratch.
///
/// Pure in its inputs: the same snapshot, selections, clock and context
/// always produce the same arenas. The grid is never patched in place;
/// callers re-run the build whenever any input changes.
pub fn build_grid(
    snapshot: &Snapshot,
    selections: &SelectionSet,
    clock: &Clock,
    ctx: &ViewContext,
    settings: &GridSettings,
) -> Result<GridModel, GridError> {
    let mut model = GridModel::default();

    for court_type in &snapshot.court_types {
        let mut type_grid = CourtTypeGrid {
            id: court_type.id,
            name: court_type.name.clone(),
            shelters: Vec::with_capacity(court_type.shelters.len()),
        };

        for shelter in &court_type.shelters {
            let mut shelter_grid = ShelterGrid {
                id: shelter.id,
                name: shelter.name.clone(),
                open: shelter.open,
                courts: Vec::with_capacity(shelter.courts.len()),
            };

            for court in &shelter.courts {
                let row =
                    build_court_row(&mut model, snapshot, selections, clock, ctx, settings, court)?;
                shelter_grid.courts.push(row);
            }

            type_grid.shelters.push(shelter_grid);
        }

        model.court_types.push(type_grid);
    }

    Ok(model)
}

// --- Row Construction ---

fn build_court_row(
    model: &mut GridModel,
    snapshot: &Snapshot,
    selections: &SelectionSet,
    clock: &Clock,
    ctx: &ViewContext,
    settings: &GridSettings,
    court: &Court,
) -> Result<CourtGrid, GridError> {
    let mut row = CourtGrid {
        id: court.id,
        number: court.number,
        cells: Vec::with_capacity(snapshot.slots.len()),
        groups: Vec::new(),
    };

    let day_start = snapshot.day_start().seconds();

    for slot in &snapshot.slots {
        let mut cell = new_cell(court, slot, day_start);

        let booking = resolve_booking(snapshot, court.id, slot)?;
        let selection = selections.matching(court.id, slot);

        if let Some(index) = booking {
            apply_booking(&mut cell, index, &snapshot.bookings[index], ctx, settings);
            // A booking always wins over a stale selection at the same spot.
            if let Some(stale) = selection {
                model.stale_selections.push(stale.clone());
            }
        } else if selection.is_some() {
            cell.selected = true;
            cell.editable = true;
            cell.movable = true;
        }

        apply_blocking(&mut cell, snapshot, clock, ctx);
        attach_to_group(model, &mut row, cell, ctx, settings);
    }

    Ok(row)
}

fn new_cell(court: &Court, slot: &TimeSlot, day_start: u32) -> Cell {
    Cell {
        index: ((slot.time_from.seconds() - day_start) / SLOT_SECONDS) as usize,
        court_id: court.id,
        court_type_id: court.court_type_id,
        slot: *slot,
        booking: None,
        booking_id: None,
        order_id: None,
        type_code: None,
        moved: false,
        selected: false,
        ordered: false,
        blocked: false,
        editable: false,
        movable: false,
        past_deadline: false,
        group: 0,
    }
}

/// Find the single booking containing the slot; two matches are a data
/// error the build must not paper over.
fn resolve_booking(
    snapshot: &Snapshot,
    court_id: i64,
    slot: &TimeSlot,
) -> Result<Option<usize>, GridError> {
    let mut found = None;

    for (index, booking) in snapshot.bookings.iter().enumerate() {
        if booking.court_id != court_id || !booking.covers(slot) {
            continue;
        }
        if let Some(first) = found {
            let first: &Booking = &snapshot.bookings[first];
            return Err(GridError::AmbiguousBooking {
                court_id,
                slot: slot.time_from,
                first: first.id,
                second: booking.id,
            });
        }
        found = Some(index);
    }

    Ok(found)
}

fn apply_booking(
    cell: &mut Cell,
    index: usize,
    booking: &Booking,
    ctx: &ViewContext,
    settings: &GridSettings,
) {
    cell.booking = Some(index);
    cell.booking_id = Some(booking.id);
    cell.order_id = Some(booking.order_id);
    cell.type_code = Some(booking.type_code);
    cell.moved = booking.moved();
    cell.ordered = true;
    cell.editable = booking.type_code.code() > settings.editable_type_cutoff
        || ctx.viewing_type < settings.admin_view_cutoff;
    cell.movable = ctx.viewing_type < settings.movable_view_cutoff || !booking.moved();
}

fn apply_blocking(cell: &mut Cell, snapshot: &Snapshot, clock: &Clock, ctx: &ViewContext) {
    if ctx.season_booking {
        cell.past_deadline = false;
        cell.blocked = cell.selected;
    } else {
        cell.past_deadline = clock.deadline_passed(snapshot.date, cell.slot.time_to);
        cell.blocked = cell.selected || cell.ordered || (!ctx.admin && cell.past_deadline);
    }
}

// --- Group Merging ---

fn attach_to_group(
    model: &mut GridModel,
    row: &mut CourtGrid,
    mut cell: Cell,
    ctx: &ViewContext,
    settings: &GridSettings,
) {
    let cell_index = model.cells.len();

    if let Some(&group_index) = row.groups.last() {
        let group = &mut model.groups[group_index];
        if extends(&cell, group) {
            cell.group = group_index;
            group.time_to = cell.slot.time_to;
            group.movable =
                group.movable && (ctx.viewing_type < settings.movable_view_cutoff || !cell.moved);
            group.cells.push(cell_index);
            row.cells.push(cell_index);
            model.cells.push(cell);
            return;
        }
    }

    let group_index = model.groups.len();
    cell.group = group_index;
    model.groups.push(open_group(&cell, cell_index));
    row.groups.push(group_index);
    row.cells.push(cell_index);
    model.cells.push(cell);
}

/// A cell continues the open group only within one booking or within one
/// selected stretch; free cells always open a group of their own.
fn extends(cell: &Cell, group: &Group) -> bool {
    (cell.ordered && group.ordered && cell.booking_id == group.booking_id)
        || (cell.selected && group.selected)
}

fn open_group(cell: &Cell, cell_index: usize) -> Group {
    Group {
        court_id: cell.court_id,
        court_type_id: cell.court_type_id,
        time_from: cell.slot.time_from,
        time_to: cell.slot.time_to,
        booking: cell.booking,
        booking_id: cell.booking_id,
        order_id: cell.order_id,
        type_code: cell.type_code,
        selected: cell.selected,
        ordered: cell.ordered,
        blocked: cell.blocked,
        movable: cell.movable,
        cells: vec![cell_index],
    }
}
