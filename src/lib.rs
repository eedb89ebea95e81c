//! Weekly timetable engine: drag-selection over a fixed school-day grid,
//! merging selections into schedule blocks, and stacking overlapping blocks
//! for display.

pub mod engine;
pub mod grid;
pub mod model;
pub mod observability;
pub mod selection;
pub mod store;
