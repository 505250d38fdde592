pub mod conflicts;
pub mod occupancy;
pub mod reallocation;
pub mod registry;
pub mod report;
pub mod types;

pub use conflicts::{detect_conflicts, removed_rooms, Conflict};
pub use occupancy::OccupancyIndex;
pub use reallocation::{Placement, Reallocator, MAX_SHIFT_DAYS};
pub use registry::RoomRegistry;
pub use report::{SimulationReport, Summary};
pub use types::{building_of, Booking, Relocation, Room, Selection, TimeSpan};

use tracing::info;

/// Runs one removal simulation over freshly seeded occupancy.
pub fn simulate(
    registry: &RoomRegistry,
    bookings: &[Booking],
    selection: &Selection,
) -> SimulationReport {
    let removed = removed_rooms(registry, selection);
    let mut occupancy = OccupancyIndex::from_bookings(bookings);
    info!(
        removed_rooms = removed.len(),
        seeded_slots = occupancy.len(),
        from = %selection.from,
        allow_redistribution = selection.allow_redistribution,
        "starting simulation"
    );

    let mut engine = Reallocator::new(
        registry,
        &removed,
        &mut occupancy,
        selection.allow_redistribution,
    );
    let placements: Vec<Placement> = detect_conflicts(bookings, &removed, selection.cutoff())
        .map(|conflict| engine.place(conflict))
        .collect();
    let report = SimulationReport::from_placements(placements);

    info!(
        conflicts = report.summary.total_conflicts,
        same_time = report.summary.same_time,
        shifted = report.summary.shifted,
        unplaceable = report.summary.unplaceable,
        "simulation finished"
    );
    report
}
