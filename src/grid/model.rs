use crate::domain::models::Selection;
use crate::domain::time::TimeOfDay;

use super::cell::Cell;
use super::group::Group;

/// The built grid: cell and group arenas plus the court-type tree that
/// orders them for rendering.
#[derive(Debug, Clone, Default)]
pub struct GridModel {
    pub cells: Vec<Cell>,
    pub groups: Vec<Group>,
    pub court_types: Vec<CourtTypeGrid>,
    /// Selections shadowed by a booking during this build; the owner of
    /// the selection set is expected to drop them.
    pub stale_selections: Vec<Selection>,
}

#[derive(Debug, Clone)]
pub struct CourtTypeGrid {
    pub id: i64,
    pub name: String,
    pub shelters: Vec<ShelterGrid>,
}

#[derive(Debug, Clone)]
pub struct ShelterGrid {
    pub id: i64,
    pub name: String,
    pub open: bool,
    pub courts: Vec<CourtGrid>,
}

/// One court row: its cells in slot order and the groups partitioning them.
#[derive(Debug, Clone)]
pub struct CourtGrid {
    pub id: i64,
    pub number: i32,
    pub cells: Vec<usize>,
    pub groups: Vec<usize>,
}

impl GridModel {
    pub fn cell(&self, index: usize) -> &Cell {
        &self.cells[index]
    }

    pub fn group(&self, index: usize) -> &Group {
        &self.groups[index]
    }

    pub fn group_of(&self, cell_index: usize) -> &Group {
        &self.groups[self.cells[cell_index].group]
    }

    pub fn court_row(&self, court_id: i64) -> Option<&CourtGrid> {
        self.court_types
            .iter()
            .flat_map(|court_type| court_type.shelters.iter())
            .flat_map(|shelter| shelter.courts.iter())
            .find(|court| court.id == court_id)
    }

    /// Arena indices of all currently selected groups, in grid order.
    pub fn selected_groups(&self) -> Vec<usize> {
        self.groups
            .iter()
            .enumerate()
            .filter(|(_, group)| group.selected)
            .map(|(index, _)| index)
            .collect()
    }

    /// Cell on a court starting exactly at `time_from`.
    pub fn find_cell(&self, court_id: i64, time_from: TimeOfDay) -> Option<usize> {
        let row = self.court_row(court_id)?;
        row.cells
            .iter()
            .copied()
            .find(|index| self.cells[*index].slot.time_from == time_from)
    }
}
