use crate::domain::time::TimeOfDay;
use crate::domain::types::BookingType;

/// A maximal run of contiguous same-state cells on one court: one booking,
/// one selected stretch, or a single free slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub court_id: i64,
    pub court_type_id: i64,
    pub time_from: TimeOfDay,
    pub time_to: TimeOfDay,
    pub booking: Option<usize>,
    pub booking_id: Option<i64>,
    pub order_id: Option<i64>,
    pub type_code: Option<BookingType>,
    pub selected: bool,
    pub ordered: bool,
    pub blocked: bool,
    pub movable: bool,
    /// Member cell arena indices, in slot order.
    pub cells: Vec<usize>,
}

impl Group {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn first_cell(&self) -> usize {
        self.cells[0]
    }

    pub fn last_cell(&self) -> usize {
        self.cells[self.cells.len() - 1]
    }

    /// Covered span in hours.
    pub fn hours(&self) -> f64 {
        f64::from(self.time_to.seconds() - self.time_from.seconds()) / 3600.0
    }
}
