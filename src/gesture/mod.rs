use chrono::NaiveDate;

use crate::config::settings::GridSettings;
use crate::domain::models::Selection;
use crate::domain::time::TimeOfDay;
use crate::domain::types::is_seasonal_code;
use crate::grid::builder::ViewContext;
use crate::grid::group::Group;
use crate::grid::model::GridModel;
use crate::selection::selection_key;

/// Which end of a group a resize handle belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Leading,
    Trailing,
}

/// Remote command relocating a booking.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveCommand {
    pub booking_id: i64,
    pub court_id: i64,
    pub time_from: TimeOfDay,
    pub time_to: TimeOfDay,
}

/// Remote command changing a booking's span on its own court.
#[derive(Debug, Clone, PartialEq)]
pub struct StretchCommand {
    pub booking_id: i64,
    pub time_from: TimeOfDay,
    pub time_to: TimeOfDay,
}

/// What committing the gesture does.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureEffect {
    /// Replace selection keys locally; nothing leaves the client.
    UpdateSelection {
        select: Vec<Selection>,
        unselect: Vec<Selection>,
    },
    Move(MoveCommand),
    Stretch(StretchCommand),
}

/// Availability check that must succeed before the effect is applied.
/// The session supplies the date when it issues the request.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationProbe {
    pub order_id: i64,
    pub court_id: i64,
    pub time_from: TimeOfDay,
    pub time_to: TimeOfDay,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AbortReason {
    SourceImmovable,
    OutOfRange,
    TargetBlocked,
    NoDisplacement,
    MinimumSpan,
    CourtBusy,
    /// The proposed time collides on these dates of the recurrence.
    Conflicts(Vec<NaiveDate>),
}

/// Terminal state of a drag transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    Committed(GestureEffect),
    Aborted(AbortReason),
}

/// A locally checked gesture, ready for validation and execution.
#[derive(Debug, Clone, PartialEq)]
pub struct GesturePlan {
    pub source_group: usize,
    /// Courts this gesture holds exclusively until it resolves.
    pub lock_courts: Vec<i64>,
    pub validation: Option<ValidationProbe>,
    pub effect: GestureEffect,
}

// --- Move ---

/// Plan dropping a group onto a new first cell. The target range is the
/// drop cell plus as many following cells as the source has.
pub fn plan_move(
    grid: &GridModel,
    ctx: &ViewContext,
    source_group: usize,
    target_first_cell: usize,
) -> Result<GesturePlan, AbortReason> {
    let group = grid.group(source_group);
    check_source(group)?;

    let target_court = grid.cell(target_first_cell).court_id;
    let row = grid.court_row(target_court).ok_or(AbortReason::OutOfRange)?;
    let position = row
        .cells
        .iter()
        .position(|index| *index == target_first_cell)
        .ok_or(AbortReason::OutOfRange)?;

    let length = group.len();
    if position + length > row.cells.len() {
        return Err(AbortReason::OutOfRange);
    }
    let target_cells = &row.cells[position..position + length];

    if target_cells == group.cells.as_slice() {
        return Err(AbortReason::NoDisplacement);
    }
    check_blocked(grid, source_group, target_cells)?;

    let time_from = grid.cell(target_cells[0]).slot.time_from;
    let time_to = grid.cell(target_cells[length - 1]).slot.time_to;

    let validation =
        validation_probe(ctx, group, target_court, time_from, time_to);

    let effect = if group.selected {
        let select = target_cells
            .iter()
            .filter(|index| !grid.cell(**index).selected)
            .map(|index| selection_key(grid.cell(*index)))
            .collect();
        let unselect = group
            .cells
            .iter()
            .filter(|index| !target_cells.contains(*index))
            .map(|index| selection_key(grid.cell(*index)))
            .collect();
        GestureEffect::UpdateSelection { select, unselect }
    } else {
        GestureEffect::Move(MoveCommand {
            booking_id: group.booking_id.ok_or(AbortReason::SourceImmovable)?,
            court_id: target_court,
            time_from,
            time_to,
        })
    };

    let mut lock_courts = vec![group.court_id];
    if target_court != group.court_id {
        lock_courts.push(target_court);
    }

    Ok(GesturePlan {
        source_group,
        lock_courts,
        validation,
        effect,
    })
}

// --- Stretch ---

/// Plan dragging one edge of a group to a new boundary cell. The boundary
/// becomes the group's new first (leading) or last (trailing) cell.
pub fn plan_stretch(
    grid: &GridModel,
    ctx: &ViewContext,
    settings: &GridSettings,
    source_group: usize,
    edge: Edge,
    boundary_cell: usize,
) -> Result<GesturePlan, AbortReason> {
    let group = grid.group(source_group);
    check_source(group)?;

    if grid.cell(boundary_cell).court_id != group.court_id {
        return Err(AbortReason::OutOfRange);
    }
    let row = grid.court_row(group.court_id).ok_or(AbortReason::OutOfRange)?;
    let boundary = row_position(row.cells.as_slice(), boundary_cell)?;
    let first = row_position(row.cells.as_slice(), group.first_cell())?;
    let last = row_position(row.cells.as_slice(), group.last_cell())?;

    // The cells between the old and the new boundary, in slot order.
    let (changed, growing) = match edge {
        Edge::Trailing if boundary == last => return Err(AbortReason::NoDisplacement),
        Edge::Trailing if boundary > last => (row.cells[last + 1..=boundary].to_vec(), true),
        Edge::Trailing if boundary >= first => (row.cells[boundary + 1..=last].to_vec(), false),
        Edge::Trailing => return Err(AbortReason::OutOfRange),
        Edge::Leading if boundary == first => return Err(AbortReason::NoDisplacement),
        Edge::Leading if boundary < first => (row.cells[boundary..first].to_vec(), true),
        Edge::Leading if boundary <= last => (row.cells[first..boundary].to_vec(), false),
        Edge::Leading => return Err(AbortReason::OutOfRange),
    };

    if growing {
        check_blocked(grid, source_group, &changed)?;
    } else if group.selected && group.len() - changed.len() < settings.min_selection_cells {
        return Err(AbortReason::MinimumSpan);
    }

    let (time_from, time_to) = match edge {
        Edge::Trailing => (group.time_from, grid.cell(boundary_cell).slot.time_to),
        Edge::Leading => (grid.cell(boundary_cell).slot.time_from, group.time_to),
    };

    // Shrinking never collides with other dates, so only growth validates.
    let validation = if growing {
        let span_from = grid.cell(changed[0]).slot.time_from;
        let span_to = grid.cell(changed[changed.len() - 1]).slot.time_to;
        validation_probe(ctx, group, group.court_id, span_from, span_to)
    } else {
        None
    };

    let effect = if group.selected {
        if growing {
            GestureEffect::UpdateSelection {
                select: changed
                    .iter()
                    .filter(|index| !grid.cell(**index).selected)
                    .map(|index| selection_key(grid.cell(*index)))
                    .collect(),
                unselect: Vec::new(),
            }
        } else {
            GestureEffect::UpdateSelection {
                select: Vec::new(),
                unselect: changed
                    .iter()
                    .map(|index| selection_key(grid.cell(*index)))
                    .collect(),
            }
        }
    } else {
        GestureEffect::Stretch(StretchCommand {
            booking_id: group.booking_id.ok_or(AbortReason::SourceImmovable)?,
            time_from,
            time_to,
        })
    };

    Ok(GesturePlan {
        source_group,
        lock_courts: vec![group.court_id],
        validation,
        effect,
    })
}

// --- Shared Checks ---

fn check_source(group: &Group) -> Result<(), AbortReason> {
    if !group.movable || (!group.selected && !group.ordered) {
        return Err(AbortReason::SourceImmovable);
    }
    Ok(())
}

fn check_blocked(
    grid: &GridModel,
    source_group: usize,
    cells: &[usize],
) -> Result<(), AbortReason> {
    for &index in cells {
        let cell = grid.cell(index);
        if cell.group != source_group && grid.group(cell.group).blocked {
            return Err(AbortReason::TargetBlocked);
        }
    }
    Ok(())
}

fn row_position(cells: &[usize], cell_index: usize) -> Result<usize, AbortReason> {
    cells
        .iter()
        .position(|index| *index == cell_index)
        .ok_or(AbortReason::OutOfRange)
}

/// Seasonal bookings repeat across dates, so a seasonal move or growth
/// must be checked remotely first. A pending selection has no order yet
/// and probes with order id 0.
fn validation_probe(
    ctx: &ViewContext,
    group: &Group,
    court_id: i64,
    time_from: TimeOfDay,
    time_to: TimeOfDay,
) -> Option<ValidationProbe> {
    let required = if group.selected {
        is_seasonal_code(ctx.viewing_type)
    } else {
        group.type_code.is_some_and(|code| code.is_seasonal())
            && is_seasonal_code(ctx.viewing_type)
    };

    required.then(|| ValidationProbe {
        order_id: if group.selected {
            0
        } else {
            group.order_id.unwrap_or(0)
        },
        court_id,
        time_from,
        time_to,
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::domain::normalize;
    use crate::domain::snapshot::RawDay;
    use crate::domain::time::Clock;
    use crate::grid::build_grid;
    use crate::selection::SelectionSet;

    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 15).unwrap()
    }

    fn settings() -> GridSettings {
        GridSettings::default()
    }

    fn time(value: &str) -> TimeOfDay {
        TimeOfDay::parse(value).unwrap()
    }

    fn key(court_id: i64, from: &str, to: &str) -> Selection {
        Selection {
            court_id,
            time_from: time(from),
            time_to: time(to),
        }
    }

    fn view(viewing_type: u8) -> ViewContext {
        ViewContext {
            admin: false,
            viewing_type,
            season_booking: false,
        }
    }

    /// Courts 10 and 11, six slots from 10:00 to 13:00.
    fn build(bookings: serde_json::Value, selections: &SelectionSet, viewing_type: u8) -> GridModel {
        let raw: RawDay = serde_json::from_value(serde_json::json!({
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
                {"time_from": "11:00", "time_to": "11:30"},
                {"time_from": "11:30", "time_to": "12:00"},
                {"time_from": "12:00", "time_to": "12:30"},
                {"time_from": "12:30", "time_to": "13:00"},
            ],
            "time_price": [[600, 600, 700, 700, 800, 800]],
            "time_blocked": bookings,
        }))
        .unwrap();
        let snapshot = normalize(&raw, date(), &settings()).unwrap();
        let clock = Clock::new(date().and_hms_opt(8, 0, 0).unwrap());
        build_grid(&snapshot, selections, &clock, &view(viewing_type), &settings()).unwrap()
    }

    fn cell_at(grid: &GridModel, court_id: i64, from: &str) -> usize {
        grid.find_cell(court_id, time(from)).unwrap()
    }

    fn group_at(grid: &GridModel, court_id: i64, from: &str) -> usize {
        grid.cell(cell_at(grid, court_id, from)).group
    }

    fn selected_pair() -> SelectionSet {
        SelectionSet::from_entries(vec![key(10, "10:00", "10:30"), key(10, "10:30", "11:00")])
    }

    // --- Move ---

    #[test]
    fn move_to_blocked_target_aborts() {
        let selections = selected_pair();
        let bookings = serde_json::json!([
            {"id": 7, "order_id": 3, "court_id": 10, "time_from": "11:30", "time_to": "12:00", "type_id": 1},
        ]);
        let grid = build(bookings, &selections, 1);

        let source = group_at(&grid, 10, "10:00");
        let target = cell_at(&grid, 10, "11:00");
        let error = plan_move(&grid, &view(1), source, target).unwrap_err();
        assert_eq!(error, AbortReason::TargetBlocked);
    }

    #[test]
    fn move_without_displacement_aborts() {
        let selections = selected_pair();
        let grid = build(serde_json::json!([]), &selections, 1);

        let source = group_at(&grid, 10, "10:00");
        let target = cell_at(&grid, 10, "10:00");
        let error = plan_move(&grid, &view(1), source, target).unwrap_err();
        assert_eq!(error, AbortReason::NoDisplacement);
    }

    #[test]
    fn move_past_day_end_aborts() {
        let selections = selected_pair();
        let grid = build(serde_json::json!([]), &selections, 1);

        let source = group_at(&grid, 10, "10:00");
        let target = cell_at(&grid, 10, "12:30");
        let error = plan_move(&grid, &view(1), source, target).unwrap_err();
        assert_eq!(error, AbortReason::OutOfRange);
    }

    #[test]
    fn free_cell_cannot_be_dragged() {
        let grid = build(serde_json::json!([]), &SelectionSet::default(), 1);

        let source = group_at(&grid, 10, "10:00");
        let target = cell_at(&grid, 10, "11:00");
        let error = plan_move(&grid, &view(1), source, target).unwrap_err();
        assert_eq!(error, AbortReason::SourceImmovable);
    }

    #[test]
    fn selected_move_swaps_selection_keys() {
        let selections = selected_pair();
        let grid = build(serde_json::json!([]), &selections, 1);

        let source = group_at(&grid, 10, "10:00");
        let target = cell_at(&grid, 10, "11:00");
        let plan = plan_move(&grid, &view(1), source, target).unwrap();

        assert!(plan.validation.is_none());
        assert_eq!(
            plan.effect,
            GestureEffect::UpdateSelection {
                select: vec![key(10, "11:00", "11:30"), key(10, "11:30", "12:00")],
                unselect: vec![key(10, "10:00", "10:30"), key(10, "10:30", "11:00")],
            }
        );
    }

    #[test]
    fn overlapping_move_only_touches_the_difference() {
        let selections = selected_pair();
        let grid = build(serde_json::json!([]), &selections, 1);

        let source = group_at(&grid, 10, "10:00");
        let target = cell_at(&grid, 10, "10:30");
        let plan = plan_move(&grid, &view(1), source, target).unwrap();

        assert_eq!(
            plan.effect,
            GestureEffect::UpdateSelection {
                select: vec![key(10, "11:00", "11:30")],
                unselect: vec![key(10, "10:00", "10:30")],
            }
        );
    }

    #[test]
    fn ordered_move_emits_command_for_target_court() {
        let bookings = serde_json::json!([
            {"id": 7, "order_id": 3, "court_id": 10, "time_from": "10:00", "time_to": "11:00", "type_id": 1},
        ]);
        let grid = build(bookings, &SelectionSet::default(), 1);

        let source = group_at(&grid, 10, "10:00");
        let target = cell_at(&grid, 11, "11:00");
        let plan = plan_move(&grid, &view(1), source, target).unwrap();

        assert!(plan.validation.is_none());
        assert_eq!(plan.lock_courts, vec![10, 11]);
        assert_eq!(
            plan.effect,
            GestureEffect::Move(MoveCommand {
                booking_id: 7,
                court_id: 11,
                time_from: time("11:00"),
                time_to: time("12:00"),
            })
        );
    }

    #[test]
    fn seasonal_view_validates_selected_moves() {
        let selections = selected_pair();
        let grid = build(serde_json::json!([]), &selections, 2);

        let source = group_at(&grid, 10, "10:00");
        let target = cell_at(&grid, 10, "11:00");
        let plan = plan_move(&grid, &view(2), source, target).unwrap();

        assert_eq!(
            plan.validation,
            Some(ValidationProbe {
                order_id: 0,
                court_id: 10,
                time_from: time("11:00"),
                time_to: time("12:00"),
            })
        );
    }

    #[test]
    fn ordered_move_validates_only_when_both_types_are_seasonal() {
        let seasonal_booking = serde_json::json!([
            {"id": 7, "order_id": 3, "court_id": 10, "time_from": "10:00", "time_to": "11:00", "type_id": 2},
        ]);
        let grid = build(seasonal_booking.clone(), &SelectionSet::default(), 2);
        let source = group_at(&grid, 10, "10:00");
        let target = cell_at(&grid, 10, "11:30");
        let plan = plan_move(&grid, &view(2), source, target).unwrap();
        assert_eq!(plan.validation.as_ref().map(|p| p.order_id), Some(3));

        // Seasonal booking edited in one-off mode touches only this date.
        let grid = build(seasonal_booking, &SelectionSet::default(), 1);
        let source = group_at(&grid, 10, "10:00");
        let target = cell_at(&grid, 10, "11:30");
        let plan = plan_move(&grid, &view(1), source, target).unwrap();
        assert!(plan.validation.is_none());

        let one_off_booking = serde_json::json!([
            {"id": 7, "order_id": 3, "court_id": 10, "time_from": "10:00", "time_to": "11:00", "type_id": 1},
        ]);
        let grid = build(one_off_booking, &SelectionSet::default(), 2);
        let source = group_at(&grid, 10, "10:00");
        let target = cell_at(&grid, 10, "11:30");
        let plan = plan_move(&grid, &view(2), source, target).unwrap();
        assert!(plan.validation.is_none());
    }

    // --- Stretch ---

    #[test]
    fn trailing_grow_selects_added_cells() {
        let selections = selected_pair();
        let grid = build(serde_json::json!([]), &selections, 1);

        let source = group_at(&grid, 10, "10:00");
        let boundary = cell_at(&grid, 10, "11:30");
        let plan =
            plan_stretch(&grid, &view(1), &settings(), source, Edge::Trailing, boundary).unwrap();

        assert!(plan.validation.is_none());
        assert_eq!(
            plan.effect,
            GestureEffect::UpdateSelection {
                select: vec![key(10, "11:00", "11:30"), key(10, "11:30", "12:00")],
                unselect: vec![],
            }
        );
    }

    #[test]
    fn leading_grow_selects_cells_before_the_run() {
        let selections = SelectionSet::from_entries(vec![
            key(10, "11:00", "11:30"),
            key(10, "11:30", "12:00"),
        ]);
        let grid = build(serde_json::json!([]), &selections, 1);

        let source = group_at(&grid, 10, "11:00");
        let boundary = cell_at(&grid, 10, "10:30");
        let plan =
            plan_stretch(&grid, &view(1), &settings(), source, Edge::Leading, boundary).unwrap();

        assert_eq!(
            plan.effect,
            GestureEffect::UpdateSelection {
                select: vec![key(10, "10:30", "11:00")],
                unselect: vec![],
            }
        );
    }

    #[test]
    fn trailing_shrink_unselects_the_tail() {
        let selections = SelectionSet::from_entries(vec![
            key(10, "10:00", "10:30"),
            key(10, "10:30", "11:00"),
            key(10, "11:00", "11:30"),
        ]);
        let grid = build(serde_json::json!([]), &selections, 1);

        let source = group_at(&grid, 10, "10:00");
        let boundary = cell_at(&grid, 10, "10:30");
        let plan =
            plan_stretch(&grid, &view(1), &settings(), source, Edge::Trailing, boundary).unwrap();

        assert!(plan.validation.is_none());
        assert_eq!(
            plan.effect,
            GestureEffect::UpdateSelection {
                select: vec![],
                unselect: vec![key(10, "11:00", "11:30")],
            }
        );
    }

    #[test]
    fn shrink_below_one_hour_is_rejected() {
        let selections = selected_pair();
        let grid = build(serde_json::json!([]), &selections, 1);

        let source = group_at(&grid, 10, "10:00");
        let boundary = cell_at(&grid, 10, "10:00");
        let error = plan_stretch(&grid, &view(1), &settings(), source, Edge::Trailing, boundary)
            .unwrap_err();
        assert_eq!(error, AbortReason::MinimumSpan);
    }

    #[test]
    fn stretch_without_displacement_aborts() {
        let selections = selected_pair();
        let grid = build(serde_json::json!([]), &selections, 1);

        let source = group_at(&grid, 10, "10:00");
        let boundary = cell_at(&grid, 10, "10:30");
        let error = plan_stretch(&grid, &view(1), &settings(), source, Edge::Trailing, boundary)
            .unwrap_err();
        assert_eq!(error, AbortReason::NoDisplacement);
    }

    #[test]
    fn growth_into_a_booking_aborts() {
        let selections = selected_pair();
        let bookings = serde_json::json!([
            {"id": 7, "order_id": 3, "court_id": 10, "time_from": "11:00", "time_to": "11:30", "type_id": 1},
        ]);
        let grid = build(bookings, &selections, 1);

        let source = group_at(&grid, 10, "10:00");
        let boundary = cell_at(&grid, 10, "11:00");
        let error = plan_stretch(&grid, &view(1), &settings(), source, Edge::Trailing, boundary)
            .unwrap_err();
        assert_eq!(error, AbortReason::TargetBlocked);
    }

    #[test]
    fn growth_validates_the_added_span_only() {
        let selections = selected_pair();
        let grid = build(serde_json::json!([]), &selections, 2);

        let source = group_at(&grid, 10, "10:00");
        let boundary = cell_at(&grid, 10, "11:30");
        let plan =
            plan_stretch(&grid, &view(2), &settings(), source, Edge::Trailing, boundary).unwrap();

        assert_eq!(
            plan.validation,
            Some(ValidationProbe {
                order_id: 0,
                court_id: 10,
                time_from: time("11:00"),
                time_to: time("12:00"),
            })
        );
    }

    #[test]
    fn seasonal_shrink_skips_validation() {
        let selections = SelectionSet::from_entries(vec![
            key(10, "10:00", "10:30"),
            key(10, "10:30", "11:00"),
            key(10, "11:00", "11:30"),
        ]);
        let grid = build(serde_json::json!([]), &selections, 2);

        let source = group_at(&grid, 10, "10:00");
        let boundary = cell_at(&grid, 10, "10:30");
        let plan =
            plan_stretch(&grid, &view(2), &settings(), source, Edge::Trailing, boundary).unwrap();
        assert!(plan.validation.is_none());
    }

    #[test]
    fn ordered_stretch_emits_command_with_the_new_range() {
        let bookings = serde_json::json!([
            {"id": 7, "order_id": 3, "court_id": 10, "time_from": "10:00", "time_to": "11:00", "type_id": 1},
        ]);
        let grid = build(bookings, &SelectionSet::default(), 1);

        let source = group_at(&grid, 10, "10:00");
        let boundary = cell_at(&grid, 10, "11:30");
        let plan =
            plan_stretch(&grid, &view(1), &settings(), source, Edge::Trailing, boundary).unwrap();

        assert_eq!(plan.lock_courts, vec![10]);
        assert_eq!(
            plan.effect,
            GestureEffect::Stretch(StretchCommand {
                booking_id: 7,
                time_from: time("10:00"),
                time_to: time("12:00"),
            })
        );
    }

    #[test]
    fn ordered_leading_shrink_moves_the_start() {
        let bookings = serde_json::json!([
            {"id": 7, "order_id": 3, "court_id": 10, "time_from": "10:00", "time_to": "11:30", "type_id": 1},
        ]);
        let grid = build(bookings, &SelectionSet::default(), 1);

        let source = group_at(&grid, 10, "10:00");
        let boundary = cell_at(&grid, 10, "10:30");
        let plan =
            plan_stretch(&grid, &view(1), &settings(), source, Edge::Leading, boundary).unwrap();

        assert_eq!(
            plan.effect,
            GestureEffect::Stretch(StretchCommand {
                booking_id: 7,
                time_from: time("10:30"),
                time_to: time("11:30"),
            })
        );
    }
}
