use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};

/// Derives the building of a room: the leading ASCII-alphabetic prefix of its id.
/// `"A1.01"` belongs to `"A"`, `"HG2.10"` to `"HG"`, `"1.01"` to no building.
pub fn building_of(room_id: &str) -> Option<String> {
    let prefix: String = room_id
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    (!prefix.is_empty()).then_some(prefix)
}

/// A physical room that activities can be placed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    /// `None` when the capacity was missing or unparseable; such a room never fits.
    pub capacity: Option<u32>,
    pub building: Option<String>,
}

impl Room {
    pub fn new(id: impl Into<String>, capacity: Option<u32>) -> Self {
        let id = id.into();
        let building = building_of(&id);
        Self {
            id,
            capacity,
            building,
        }
    }

    /// Whether a group of `required` people fits in this room.
    pub fn fits(&self, required: u32) -> bool {
        self.capacity.is_some_and(|capacity| capacity >= required)
    }
}

/// A fully known booking interval; the unit that occupancy claims are made in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeSpan {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeSpan {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// The same interval moved `days` calendar days later, or `None` on overflow.
    pub fn shifted_by_days(&self, days: i64) -> Option<TimeSpan> {
        let delta = TimeDelta::try_days(days)?;
        Some(TimeSpan {
            start: self.start.checked_add_signed(delta)?,
            end: self.end.checked_add_signed(delta)?,
        })
    }
}

/// One scheduled occurrence of an activity, as loaded from the timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Zero-based position in the input table.
    pub row: usize,
    pub activity: String,
    pub room: String,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub group_size: Option<u32>,
}

impl Booking {
    pub fn span(&self) -> Option<TimeSpan> {
        Some(TimeSpan::new(self.start?, self.end?))
    }
}

/// A booking moved to a new room and possibly a new time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relocation {
    pub booking: Booking,
    pub new_room: String,
    pub new_start: NaiveDateTime,
    pub new_end: NaiveDateTime,
    /// Zero for a same-time relocation.
    pub shift_days: i64,
}

impl Relocation {
    pub fn new_span(&self) -> TimeSpan {
        TimeSpan::new(self.new_start, self.new_end)
    }
}

/// What the operator takes out of service and from when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    #[serde(default)]
    pub buildings: BTreeSet<String>,
    #[serde(default)]
    pub rooms: BTreeSet<String>,
    /// First day the removed rooms are unavailable.
    pub from: NaiveDate,
    #[serde(default)]
    pub allow_redistribution: bool,
}

impl Selection {
    pub fn new(from: NaiveDate) -> Self {
        Self {
            buildings: BTreeSet::new(),
            rooms: BTreeSet::new(),
            from,
            allow_redistribution: false,
        }
    }

    pub fn with_buildings<I, S>(mut self, buildings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.buildings.extend(buildings.into_iter().map(Into::into));
        self
    }

    pub fn with_rooms<I, S>(mut self, rooms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rooms.extend(rooms.into_iter().map(Into::into));
        self
    }

    pub fn with_redistribution(mut self, allow: bool) -> Self {
        self.allow_redistribution = allow;
        self
    }

    /// Midnight at the start of `from`; bookings starting at or after it are affected.
    pub fn cutoff(&self) -> NaiveDateTime {
        self.from.and_time(NaiveTime::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn test_building_is_leading_alpha_prefix() {
        assert_eq!(building_of("A1.01").as_deref(), Some("A"));
        assert_eq!(building_of("HG2.10").as_deref(), Some("HG"));
        assert_eq!(building_of("1.01"), None);
        assert_eq!(building_of(""), None);
    }

    #[test]
    fn test_room_without_capacity_never_fits() {
        assert!(!Room::new("A1", None).fits(0));
        assert!(Room::new("A1", Some(30)).fits(30));
        assert!(!Room::new("A1", Some(30)).fits(31));
    }

    #[test]
    fn test_shift_moves_both_ends() {
        let span = TimeSpan::new(at("2025-03-03 09:00"), at("2025-03-03 11:00"));
        let shifted = span.shifted_by_days(2).unwrap();
        assert_eq!(shifted.start, at("2025-03-05 09:00"));
        assert_eq!(shifted.end, at("2025-03-05 11:00"));
    }

    #[test]
    fn test_booking_span_needs_both_ends() {
        let mut booking = Booking {
            row: 0,
            activity: "Lecture".to_string(),
            room: "A1".to_string(),
            start: Some(at("2025-03-03 09:00")),
            end: None,
            group_size: Some(10),
        };
        assert_eq!(booking.span(), None);
        booking.end = Some(at("2025-03-03 10:00"));
        assert!(booking.span().is_some());
    }

    #[test]
    fn test_cutoff_is_midnight() {
        let sel = Selection::new(NaiveDate::from_ymd_opt(2025, 3, 3).unwrap());
        assert_eq!(sel.cutoff(), at("2025-03-03 00:00"));
    }
}
