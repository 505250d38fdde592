use serde::{Deserialize, Serialize};

use super::reallocation::Placement;
use super::types::{Booking, Relocation};

/// Headline counts of a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Summary {
    pub total_conflicts: usize,
    pub same_time: usize,
    pub shifted: usize,
    pub unplaceable: usize,
}

/// Outcome of one run, partitioned by placement kind.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SimulationReport {
    pub summary: Summary,
    pub same_time: Vec<Relocation>,
    pub shifted: Vec<Relocation>,
    pub unplaceable: Vec<Booking>,
}

impl SimulationReport {
    pub fn aggregate(
        same_time: Vec<Relocation>,
        shifted: Vec<Relocation>,
        unplaceable: Vec<Booking>,
    ) -> Self {
        let summary = Summary {
            total_conflicts: same_time.len() + shifted.len() + unplaceable.len(),
            same_time: same_time.len(),
            shifted: shifted.len(),
            unplaceable: unplaceable.len(),
        };
        Self {
            summary,
            same_time,
            shifted,
            unplaceable,
        }
    }

    /// Partitions placements, keeping their processing order within each list.
    pub fn from_placements(placements: impl IntoIterator<Item = Placement>) -> Self {
        let mut same_time = Vec::new();
        let mut shifted = Vec::new();
        let mut unplaceable = Vec::new();
        for placement in placements {
            match placement {
                Placement::SameTime(r) => same_time.push(r),
                Placement::Shifted(r) => shifted.push(r),
                Placement::Unplaceable(b) => unplaceable.push(b),
            }
        }
        Self::aggregate(same_time, shifted, unplaceable)
    }

    /// Same-time and shifted relocations together.
    pub fn relocations(&self) -> impl Iterator<Item = &Relocation> {
        self.same_time.iter().chain(self.shifted.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn booking(row: usize) -> Booking {
        let at = NaiveDateTime::parse_from_str("2025-03-03 09:00", "%Y-%m-%d %H:%M").ok();
        Booking {
            row,
            activity: "Lecture".to_string(),
            room: "A1".to_string(),
            start: at,
            end: at,
            group_size: Some(5),
        }
    }

    fn relocation(row: usize, shift_days: i64) -> Relocation {
        let b = booking(row);
        Relocation {
            new_room: "B1".to_string(),
            new_start: b.start.unwrap(),
            new_end: b.end.unwrap(),
            shift_days,
            booking: b,
        }
    }

    #[test]
    fn test_from_placements_partitions_and_counts() {
        let report = SimulationReport::from_placements(vec![
            Placement::Unplaceable(booking(0)),
            Placement::SameTime(relocation(1, 0)),
            Placement::Shifted(relocation(2, 3)),
            Placement::SameTime(relocation(3, 0)),
        ]);
        assert_eq!(
            report.summary,
            Summary {
                total_conflicts: 4,
                same_time: 2,
                shifted: 1,
                unplaceable: 1,
            }
        );
        let rows: Vec<usize> = report.same_time.iter().map(|r| r.booking.row).collect();
        assert_eq!(rows, vec![1, 3]);
        assert_eq!(report.relocations().count(), 3);
    }

    #[test]
    fn test_empty_aggregate() {
        let report = SimulationReport::aggregate(Vec::new(), Vec::new(), Vec::new());
        assert_eq!(report.summary, Summary::default());
    }
}
