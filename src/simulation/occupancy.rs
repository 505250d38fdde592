use std::collections::{HashMap, HashSet};

use super::types::{Booking, TimeSpan};

/// Exact (room, start, end) claims.
///
/// Only identical intervals collide; partially overlapping intervals in the
/// same room do not. Entries are never removed during a run.
#[derive(Debug, Clone, Default)]
pub struct OccupancyIndex {
    slots: HashMap<String, HashSet<TimeSpan>>,
    len: usize,
}

impl OccupancyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the index with every booking that has a complete interval,
    /// whether or not the booking is itself displaced.
    pub fn from_bookings<'a>(bookings: impl IntoIterator<Item = &'a Booking>) -> Self {
        let mut index = Self::new();
        for booking in bookings {
            if let Some(span) = booking.span() {
                index.insert(&booking.room, span);
            }
        }
        index
    }

    pub fn contains(&self, room: &str, span: TimeSpan) -> bool {
        self.slots
            .get(room)
            .is_some_and(|spans| spans.contains(&span))
    }

    /// Claims a slot. Returns `false` if it was already claimed.
    pub fn insert(&mut self, room: &str, span: TimeSpan) -> bool {
        let inserted = match self.slots.get_mut(room) {
            Some(spans) => spans.insert(span),
            None => {
                self.slots.insert(room.to_string(), HashSet::from([span]));
                true
            }
        };
        if inserted {
            self.len += 1;
        }
        inserted
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
