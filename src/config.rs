use std::collections::BTreeSet;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::{Result, SimError};
use crate::simulation::Selection;

/// Selection as stored in a JSON file. Every field is optional so a file
/// can hold only part of a selection and leave the rest to the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SelectionFile {
    pub buildings: BTreeSet<String>,
    pub rooms: BTreeSet<String>,
    pub from: Option<NaiveDate>,
    pub allow_redistribution: bool,
}

impl SelectionFile {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| SimError::Selection {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Merges command-line choices into this file's selection.
    ///
    /// Buildings and rooms are unioned, an explicit `from` overrides the file,
    /// and redistribution is enabled if either side enables it. Without any
    /// `from`, the selection starts at `today`.
    pub fn merge(
        self,
        buildings: impl IntoIterator<Item = String>,
        rooms: impl IntoIterator<Item = String>,
        from: Option<NaiveDate>,
        allow_redistribution: bool,
        today: NaiveDate,
    ) -> Selection {
        Selection::new(from.or(self.from).unwrap_or(today))
            .with_buildings(self.buildings.into_iter().chain(buildings))
            .with_rooms(self.rooms.into_iter().chain(rooms))
            .with_redistribution(self.allow_redistribution || allow_redistribution)
    }
}
