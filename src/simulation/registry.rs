use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::warn;

use super::types::Room;

/// Rooms known to the simulation, in input order.
///
/// Input order is significant: the reallocation search is first-fit, so the
/// earlier of two suitable rooms always wins.
#[derive(Debug, Clone, Default)]
pub struct RoomRegistry {
    rooms: Vec<Room>,
    index: HashMap<String, usize>,
}

impl RoomRegistry {
    /// Builds a registry, keeping the first occurrence of each room id.
    pub fn new(rooms: impl IntoIterator<Item = Room>) -> Self {
        let mut registry = Self::default();
        for room in rooms {
            if registry.index.contains_key(&room.id) {
                warn!(room = %room.id, "duplicate room id, keeping the first occurrence");
                continue;
            }
            registry.index.insert(room.id.clone(), registry.rooms.len());
            registry.rooms.push(room);
        }
        registry
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn get(&self, room_id: &str) -> Option<&Room> {
        self.index.get(room_id).map(|&i| &self.rooms[i])
    }

    /// `None` for unknown rooms and for rooms whose capacity did not parse.
    pub fn capacity_of(&self, room_id: &str) -> Option<u32> {
        self.get(room_id).and_then(|room| room.capacity)
    }

    pub fn rooms_with_building_in(&self, buildings: &BTreeSet<String>) -> HashSet<String> {
        self.rooms
            .iter()
            .filter(|room| {
                room.building
                    .as_ref()
                    .is_some_and(|building| buildings.contains(building))
            })
            .map(|room| room.id.clone())
            .collect()
    }

    /// Every room not in `removed`, in registry order.
    pub fn all_rooms_excluding<'a>(
        &'a self,
        removed: &'a HashSet<String>,
    ) -> impl Iterator<Item = &'a Room> + 'a {
        self.rooms
            .iter()
            .filter(move |room| !removed.contains(&room.id))
    }

    /// Sorted distinct buildings, the choices offered for building selection.
    pub fn buildings(&self) -> Vec<String> {
        self.rooms
            .iter()
            .filter_map(|room| room.building.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Sorted room ids, the choices offered for explicit room selection.
    pub fn room_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.index.keys().cloned().collect();
        ids.sort();
        ids
    }
}
