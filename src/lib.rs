//! Simulates taking rooms or whole buildings out of a timetable and greedily
//! relocates the displaced activities to other rooms, at the same time or
//! shifted by up to a week.

pub mod config;
pub mod display;
pub mod error;
pub mod parser;
pub mod simulation;
pub mod web;

pub use error::{Result, SimError};
pub use simulation::{
    simulate, Booking, Relocation, Room, RoomRegistry, Selection, SimulationReport, Summary,
};
