pub mod client;
pub mod instructions;

pub use client::{BookingClient, RefreshResponse, ValidateRequest, ValidateResponse};
pub use instructions::{apply, Instructions};
