use thiserror::Error;

use crate::domain::time::TimeOfDay;

/// Day payloads that cannot be normalized deterministically are fatal:
/// the grid must never be built on top of them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("day payload contains no time slots")]
    EmptyDay,

    #[error("price table for court type {court_type_id} covers {have} slots, day has {want}")]
    TariffMismatch {
        court_type_id: i64,
        have: usize,
        want: usize,
    },

    #[error("booking {booking_id} references unknown court {court_id}")]
    UnknownCourt { booking_id: i64, court_id: i64 },

    #[error("booking {booking_id} has out-of-range time {time_from}-{time_to}")]
    InvalidTimeRange {
        booking_id: i64,
        time_from: TimeOfDay,
        time_to: TimeOfDay,
    },

    #[error("booking {booking_id} carries unknown type code {code}")]
    UnknownBookingType { booking_id: i64, code: u8 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("bookings {first} and {second} both cover court {court_id} at {slot}")]
    AmbiguousBooking {
        court_id: i64,
        slot: TimeOfDay,
        first: i64,
        second: i64,
    },
}
