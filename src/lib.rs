//! Snake on a bounded grid: the simulation engine, free of any terminal IO.

pub mod engine;
pub mod error;
pub mod snake;

pub type GridInt = i32;
