use std::collections::HashSet;

use tracing::debug;

use super::conflicts::Conflict;
use super::occupancy::OccupancyIndex;
use super::registry::RoomRegistry;
use super::types::{Booking, Relocation, Room, TimeSpan};

/// Largest day offset tried when shifting a booking in time.
pub const MAX_SHIFT_DAYS: i64 = 7;

/// Where a single conflicting booking ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    SameTime(Relocation),
    Shifted(Relocation),
    Unplaceable(Booking),
}

/// Greedy first-fit placement of displaced bookings.
///
/// Owns the only mutable reference to the occupancy index for the run, so
/// every commit is visible to the bookings placed after it.
pub struct Reallocator<'a> {
    registry: &'a RoomRegistry,
    removed: &'a HashSet<String>,
    occupancy: &'a mut OccupancyIndex,
    allow_redistribution: bool,
}

impl<'a> Reallocator<'a> {
    pub fn new(
        registry: &'a RoomRegistry,
        removed: &'a HashSet<String>,
        occupancy: &'a mut OccupancyIndex,
        allow_redistribution: bool,
    ) -> Self {
        Self {
            registry,
            removed,
            occupancy,
            allow_redistribution,
        }
    }

    /// Rooms still in service that can seat `required`, in registry order.
    /// An unknown group size seats nowhere.
    fn candidates(&self, required: Option<u32>) -> Vec<&'a Room> {
        let Some(required) = required else {
            return Vec::new();
        };
        self.registry
            .all_rooms_excluding(self.removed)
            .filter(|room| room.fits(required))
            .collect()
    }

    fn first_free(&self, candidates: &[&'a Room], span: TimeSpan) -> Option<&'a Room> {
        candidates
            .iter()
            .copied()
            .find(|room| !self.occupancy.contains(&room.id, span))
    }

    fn commit(
        &mut self,
        booking: &Booking,
        room: &Room,
        span: TimeSpan,
        shift_days: i64,
    ) -> Relocation {
        self.occupancy.insert(&room.id, span);
        Relocation {
            booking: booking.clone(),
            new_room: room.id.clone(),
            new_start: span.start,
            new_end: span.end,
            shift_days,
        }
    }

    /// Places one conflict: same time in another room first, then (if
    /// allowed) the same interval 1..=7 days later. For each offset all
    /// candidate rooms are scanned before moving to the next offset.
    ///
    /// A conflict without a complete interval has nothing to claim and is
    /// unplaceable.
    pub fn place(&mut self, conflict: Conflict<'_>) -> Placement {
        let booking = conflict.booking;
        let Some(original) = conflict.span else {
            debug!(row = booking.row, room = %booking.room, "end time unknown, not relocated");
            return Placement::Unplaceable(booking.clone());
        };
        let candidates = self.candidates(booking.group_size);

        if let Some(room) = self.first_free(&candidates, original) {
            debug!(
                row = booking.row,
                from = %booking.room,
                to = %room.id,
                "relocated at same time"
            );
            return Placement::SameTime(self.commit(booking, room, original, 0));
        }

        if self.allow_redistribution {
            for days in 1..=MAX_SHIFT_DAYS {
                let Some(span) = original.shifted_by_days(days) else {
                    break;
                };
                if let Some(room) = self.first_free(&candidates, span) {
                    debug!(
                        row = booking.row,
                        from = %booking.room,
                        to = %room.id,
                        days,
                        "relocated with shift"
                    );
                    return Placement::Shifted(self.commit(booking, room, span, days));
                }
            }
        }

        debug!(
            row = booking.row,
            room = %booking.room,
            candidates = candidates.len(),
            "no free slot found"
        );
        Placement::Unplaceable(booking.clone())
    }
}
