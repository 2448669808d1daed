pub mod core;
pub mod datasets;
pub mod schedule;
pub mod views;
