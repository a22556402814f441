use crate::domain::time::TimeSlot;
use crate::domain::types::BookingType;

/// One (court, slot) position for a single build cycle.
///
/// Cells live in the grid arena and point at their owning group by index,
/// so the cell/group relationship stays bidirectional without reference
/// cycles.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// 0-based slot index within the day.
    pub index: usize,
    pub court_id: i64,
    pub court_type_id: i64,
    pub slot: TimeSlot,
    /// Index of the resolved booking in the snapshot, if any.
    pub booking: Option<usize>,
    pub booking_id: Option<i64>,
    pub order_id: Option<i64>,
    pub type_code: Option<BookingType>,
    pub moved: bool,
    pub selected: bool,
    pub ordered: bool,
    pub blocked: bool,
    pub editable: bool,
    pub movable: bool,
    pub past_deadline: bool,
    /// Arena index of the owning group.
    pub group: usize,
}
