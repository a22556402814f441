pub mod builder;
pub mod cell;
pub mod group;
pub mod model;

pub use builder::{build_grid, ViewContext};
pub use cell::Cell;
pub use group::Group;
pub use model::{CourtGrid, CourtTypeGrid, GridModel, ShelterGrid};
