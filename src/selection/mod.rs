use crate::domain::models::Selection;
use crate::domain::time::TimeSlot;
use crate::grid::builder::ViewContext;
use crate::grid::cell::Cell;
use crate::grid::model::GridModel;

/// The set of pending user picks, keyed by court and exact slot bounds.
///
/// Entries survive grid rebuilds; they disappear on commit, date or
/// viewing-type change, or when a refreshed booking shadows them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionSet {
    entries: Vec<Selection>,
}

/// The selection key of a cell.
pub fn selection_key(cell: &Cell) -> Selection {
    Selection {
        court_id: cell.court_id,
        time_from: cell.slot.time_from,
        time_to: cell.slot.time_to,
    }
}

impl SelectionSet {
    pub fn from_entries(entries: Vec<Selection>) -> Self {
        let mut set = Self::default();
        for entry in entries {
            set.select(entry);
        }
        set
    }

    pub fn entries(&self) -> &[Selection] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &Selection) -> bool {
        self.entries.contains(key)
    }

    /// The entry matching a court and exact slot bounds, if any.
    pub fn matching(&self, court_id: i64, slot: &TimeSlot) -> Option<&Selection> {
        self.entries.iter().find(|entry| {
            entry.court_id == court_id
                && entry.time_from == slot.time_from
                && entry.time_to == slot.time_to
        })
    }

    pub fn select(&mut self, key: Selection) {
        if !self.contains(&key) {
            self.entries.push(key);
        }
    }

    /// Remove every entry matching the key by value, not by identity.
    pub fn unselect(&mut self, key: &Selection) {
        self.entries.retain(|entry| entry != key);
    }

    pub fn unselect_all(&mut self) {
        self.entries.clear();
    }
}

/// Apply a click on a cell to the selection set. Returns whether the set
/// changed.
pub fn click(
    selections: &mut SelectionSet,
    grid: &GridModel,
    cell_index: usize,
    ctx: &ViewContext,
) -> bool {
    let cell = grid.cell(cell_index);

    if cell.ordered {
        return false;
    }

    // Admins toggle any non-booked cell individually.
    if ctx.admin {
        let key = selection_key(cell);
        if cell.selected {
            selections.unselect(&key);
        } else {
            selections.select(key);
        }
        return true;
    }

    if cell.past_deadline {
        return false;
    }

    if cell.selected {
        unselect_from_group(selections, grid, cell_index)
    } else {
        select_with_neighbour(selections, grid, cell_index)
    }
}

/// Select a dragged-over run of cells at once, skipping everything that is
/// not a free, unblocked slot. A sweep of less than two usable cells is
/// ignored.
pub fn select_sweep(selections: &mut SelectionSet, grid: &GridModel, cells: &[usize]) -> bool {
    let keys: Vec<Selection> = cells
        .iter()
        .map(|index| grid.cell(*index))
        .filter(|cell| !cell.ordered && !cell.selected && !cell.blocked)
        .map(selection_key)
        .collect();

    if keys.len() < 2 {
        return false;
    }
    for key in keys {
        selections.select(key);
    }
    true
}

// --- Click Rules ---

/// Shrink a selected run from the clicked end. Short runs clear entirely;
/// longer ones give up two boundary cells near the click, or the single
/// clicked cell elsewhere.
fn unselect_from_group(selections: &mut SelectionSet, grid: &GridModel, cell_index: usize) -> bool {
    let group = grid.group_of(cell_index);
    let members = &group.cells;

    let targets: Vec<usize> = if members.len() < 3 {
        members.clone()
    } else {
        let Some(position) = members.iter().position(|index| *index == cell_index) else {
            return false;
        };
        if position == 1 {
            if members.len() == 3 {
                members.clone()
            } else {
                members[..2].to_vec()
            }
        } else if position == members.len() - 2 {
            members[members.len() - 2..].to_vec()
        } else {
            vec![cell_index]
        }
    };

    for index in targets {
        selections.unselect(&selection_key(grid.cell(index)));
    }
    true
}

/// Select a free cell. Next to an existing run the cell joins alone;
/// otherwise it must bring one free, unblocked neighbour along, preferring
/// the following slot.
fn select_with_neighbour(
    selections: &mut SelectionSet,
    grid: &GridModel,
    cell_index: usize,
) -> bool {
    let cell = grid.cell(cell_index);
    let Some(row) = grid.court_row(cell.court_id) else {
        return false;
    };

    let previous = row
        .cells
        .iter()
        .copied()
        .find(|index| grid.cell(*index).slot.time_to == cell.slot.time_from);
    let next = row
        .cells
        .iter()
        .copied()
        .find(|index| grid.cell(*index).slot.time_from == cell.slot.time_to);

    let beside_run = next.is_some_and(|index| grid.cell(index).selected)
        || previous.is_some_and(|index| grid.cell(index).selected);
    if beside_run {
        selections.select(selection_key(cell));
        return true;
    }

    let Some(partner) = next
        .filter(|index| !grid.cell(*index).blocked)
        .or_else(|| previous.filter(|index| !grid.cell(*index).blocked))
    else {
        return false;
    };

    selections.select(selection_key(cell));
    selections.select(selection_key(grid.cell(partner)));
    true
}
