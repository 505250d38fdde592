use std::collections::HashSet;

use chrono::NaiveDateTime;

use super::registry::RoomRegistry;
use super::types::{Booking, Selection, TimeSpan};

/// A booking invalidated by a room removal.
#[derive(Debug, Clone, Copy)]
pub struct Conflict<'a> {
    pub booking: &'a Booking,
    /// `None` when the end did not parse; such a conflict is never relocated.
    pub span: Option<TimeSpan>,
}

/// Rooms of every selected building plus every explicitly selected room.
///
/// Explicit ids are kept even if the registry does not know them, since
/// bookings may still reference them.
pub fn removed_rooms(registry: &RoomRegistry, selection: &Selection) -> HashSet<String> {
    let mut removed = registry.rooms_with_building_in(&selection.buildings);
    removed.extend(selection.rooms.iter().cloned());
    removed
}

/// Bookings in a removed room that start at or after `cutoff`, in input order.
///
/// Only the start decides: a booking whose start did not parse is never
/// affected, while one with an unparseable end still counts.
pub fn detect_conflicts<'a>(
    bookings: &'a [Booking],
    removed: &'a HashSet<String>,
    cutoff: NaiveDateTime,
) -> impl Iterator<Item = Conflict<'a>> + 'a {
    bookings.iter().filter_map(move |booking| {
        if !removed.contains(&booking.room) {
            return None;
        }
        let start = booking.start?;
        (start >= cutoff).then(|| Conflict {
            booking,
            span: booking.span(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::types::Room;
    use chrono::NaiveDate;

    fn at(s: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").ok()
    }

    fn booking(row: usize, room: &str, start: &str, end: &str) -> Booking {
        Booking {
            row,
            activity: format!("Activity {row}"),
            room: room.to_string(),
            start: at(start),
            end: at(end),
            group_size: Some(10),
        }
    }

    fn removed(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_removed_rooms_unions_buildings_and_rooms() {
        let registry = RoomRegistry::new(vec![
            Room::new("A1", Some(10)),
            Room::new("A2", Some(10)),
            Room::new("B1", Some(10)),
            Room::new("C1", Some(10)),
        ]);
        let selection = Selection::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
            .with_buildings(["A"])
            .with_rooms(["C1", "Z9"]);
        let set = removed_rooms(&registry, &selection);
        assert_eq!(set, removed(&["A1", "A2", "C1", "Z9"]));
    }

    #[test]
    fn test_empty_selection_removes_nothing() {
        let registry = RoomRegistry::new(vec![Room::new("A1", Some(10))]);
        let selection = Selection::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert!(removed_rooms(&registry, &selection).is_empty());
    }

    #[test]
    fn test_bookings_before_cutoff_are_not_conflicts() {
        let bookings = vec![
            booking(0, "A1", "2025-02-28 09:00", "2025-02-28 10:00"),
            booking(1, "A1", "2025-03-01 00:00", "2025-03-01 01:00"),
            booking(2, "A1", "2025-03-02 09:00", "2025-03-02 10:00"),
        ];
        let removed = removed(&["A1"]);
        let cutoff = at("2025-03-01 00:00").unwrap();
        let rows: Vec<usize> = detect_conflicts(&bookings, &removed, cutoff)
            .map(|c| c.booking.row)
            .collect();
        assert_eq!(rows, vec![1, 2]);
    }

    #[test]
    fn test_only_removed_rooms_conflict() {
        let bookings = vec![
            booking(0, "B1", "2025-03-02 09:00", "2025-03-02 10:00"),
            booking(1, "A1", "2025-03-02 09:00", "2025-03-02 10:00"),
        ];
        let removed = removed(&["A1"]);
        let cutoff = at("2025-03-01 00:00").unwrap();
        let conflicts: Vec<Conflict> = detect_conflicts(&bookings, &removed, cutoff).collect();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].booking.row, 1);
    }

    #[test]
    fn test_unparseable_start_never_matches() {
        let bookings = vec![booking(0, "A1", "not a date", "2025-03-02 10:00")];
        let removed = removed(&["A1"]);
        let cutoff = at("2025-03-01 00:00").unwrap();
        assert_eq!(detect_conflicts(&bookings, &removed, cutoff).count(), 0);
    }

    #[test]
    fn test_unparseable_end_still_conflicts() {
        let bookings = vec![booking(0, "A1", "2025-03-02 09:00", "garbage")];
        let removed = removed(&["A1"]);
        let cutoff = at("2025-03-01 00:00").unwrap();
        let conflicts: Vec<Conflict> = detect_conflicts(&bookings, &removed, cutoff).collect();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].booking.row, 0);
        assert!(conflicts[0].span.is_none());
    }
}
