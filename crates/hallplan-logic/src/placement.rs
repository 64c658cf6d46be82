//! Authoring-time room placement.
//!
//! [`RoomPlacementStore`] is a sparse map from authoring slot to the room type
//! dropped there. [`LayoutDraft`] wraps a store together with the shape being
//! edited and keeps the two consistent:
//!
//! - placements only land on room cells of the authoring grid
//! - room numbers are derived from the slot, never invented
//! - no two placements on a floor share a browsing cell
//! - a shape edit drops placements whose cell no longer exists
//!
//! On commit the draft becomes a [`LayoutRecord`]: the shape fields plus the
//! store serialized as a flat JSON object keyed by `"<floor>-<row>-<col>"`.

use crate::grid::{authoring_grid, authoring_to_browsing, GridCell};
use crate::shape::{validate_shape, ShapeConfig, ShapeError, Side};
use crate::slot::{slot_to_room_number, SlotAddress};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Room type and display number assigned to one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementEntry {
    pub room_type_key: String,
    pub room_number: String,
}

/// Sparse slot → placement map. Entries are replaced whole, never patched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomPlacementStore {
    entries: BTreeMap<SlotAddress, PlacementEntry>,
}

impl RoomPlacementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or fully replace the entry at `slot`.
    pub fn insert(&mut self, slot: SlotAddress, entry: PlacementEntry) -> &PlacementEntry {
        self.entries.insert(slot, entry);
        &self.entries[&slot]
    }

    /// Remove the entry at `slot`. Absent slots are not an error.
    pub fn remove(&mut self, slot: SlotAddress) -> Option<PlacementEntry> {
        self.entries.remove(&slot)
    }

    pub fn get(&self, slot: SlotAddress) -> Option<&PlacementEntry> {
        self.entries.get(&slot)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotAddress, &PlacementEntry)> {
        self.entries.iter().map(|(slot, entry)| (*slot, entry))
    }

    /// Serialize as the persisted placement blob.
    pub fn to_blob(&self) -> Result<String, PlacementError> {
        serde_json::to_string(self).map_err(|e| PlacementError::CorruptBlob(e.to_string()))
    }

    /// Load a persisted blob verbatim. An empty blob is an empty store.
    pub fn from_blob(blob: &str) -> Result<Self, PlacementError> {
        if blob.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(blob).map_err(|e| PlacementError::CorruptBlob(e.to_string()))
    }
}

/// Placement error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementError {
    /// Slot floor is not below the configured floor count.
    FloorOutOfRange { floor: u32, floors: u32 },
    /// Slot is a walkway, void, padding, or outside the grid.
    NotARoomSlot(SlotAddress),
    /// Slot maps to the same browsing cell as an existing placement. Happens
    /// when the browsing grid is one column wide and both side wings exist.
    SharedBrowsingCell {
        slot: SlotAddress,
        holder: SlotAddress,
    },
    /// Placement blob could not be (de)serialized.
    CorruptBlob(String),
}

impl fmt::Display for PlacementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacementError::FloorOutOfRange { floor, floors } => {
                write!(f, "floor index {floor} out of range for {floors} floors")
            }
            PlacementError::NotARoomSlot(slot) => write!(f, "slot {slot} is not a room cell"),
            PlacementError::SharedBrowsingCell { slot, holder } => {
                write!(f, "slot {slot} shares its browsing cell with {holder}")
            }
            PlacementError::CorruptBlob(msg) => write!(f, "corrupt placement blob: {msg}"),
        }
    }
}

impl std::error::Error for PlacementError {}

/// Why a draft could not be committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitError {
    InvalidShape(Vec<ShapeError>),
    Placement(PlacementError),
}

impl fmt::Display for CommitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitError::InvalidShape(errors) => {
                let msgs: Vec<String> = errors.iter().map(ToString::to_string).collect();
                write!(f, "invalid shape: {}", msgs.join("; "))
            }
            CommitError::Placement(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CommitError {}

/// Persisted layout: shape fields plus the opaque placement blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRecord {
    #[serde(flatten)]
    pub shape: ShapeConfig,
    pub placement_blob: String,
}

/// A room the collaborator should create for one placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRoom {
    pub room_number: String,
    pub room_type_key: String,
    /// 1-based, counted from the bottom.
    pub floor: u32,
    /// Browsing-grid slot; always set so browse never has to parse the number.
    pub layout_slot: SlotAddress,
}

/// Outcome of a shape edit on a draft.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// Placements dropped because their cell no longer exists, or because
    /// an earlier slot now maps to the same browsing cell.
    pub removed: Vec<SlotAddress>,
    /// Placements kept but given a new room number.
    pub renumbered: usize,
    /// The entrance named a wing the new shape doesn't have.
    pub entrance_cleared: bool,
}

impl PruneReport {
    pub fn is_noop(&self) -> bool {
        self.removed.is_empty() && self.renumbered == 0 && !self.entrance_cleared
    }
}

/// Browsing slot and room number for an authoring slot, if it is a room cell.
fn resolve_slot(shape: &ShapeConfig, slot: SlotAddress) -> Option<(SlotAddress, String)> {
    if slot.floor >= shape.floors {
        return None;
    }
    let (row, col) = authoring_to_browsing(shape, slot.row, slot.col)?;
    let browsing = SlotAddress::new(slot.floor, row, col);
    Some((browsing, slot_to_room_number(browsing, shape.floors)))
}

/// An in-progress layout owned by one authoring session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutDraft {
    shape: ShapeConfig,
    placements: RoomPlacementStore,
}

impl LayoutDraft {
    pub fn new(shape: ShapeConfig) -> Self {
        Self {
            shape,
            placements: RoomPlacementStore::new(),
        }
    }

    /// Resume editing a persisted layout. The blob is loaded verbatim; use
    /// [`LayoutDraft::stale_slots`] to find entries the shape no longer has.
    pub fn from_record(record: &LayoutRecord) -> Result<Self, PlacementError> {
        Ok(Self {
            shape: record.shape.clone(),
            placements: RoomPlacementStore::from_blob(&record.placement_blob)?,
        })
    }

    pub fn shape(&self) -> &ShapeConfig {
        &self.shape
    }

    pub fn placements(&self) -> &RoomPlacementStore {
        &self.placements
    }

    /// Drop a room type onto an authoring slot, replacing any previous entry.
    pub fn place(
        &mut self,
        slot: SlotAddress,
        room_type_key: impl Into<String>,
    ) -> Result<&PlacementEntry, PlacementError> {
        if slot.floor >= self.shape.floors {
            return Err(PlacementError::FloorOutOfRange {
                floor: slot.floor,
                floors: self.shape.floors,
            });
        }
        let (browsing, room_number) =
            resolve_slot(&self.shape, slot).ok_or(PlacementError::NotARoomSlot(slot))?;
        if let Some((holder, ..)) = self
            .live()
            .into_iter()
            .find(|(other, target, ..)| *other != slot && *target == browsing)
        {
            return Err(PlacementError::SharedBrowsingCell { slot, holder });
        }
        Ok(self.placements.insert(
            slot,
            PlacementEntry {
                room_type_key: room_type_key.into(),
                room_number,
            },
        ))
    }

    pub fn remove(&mut self, slot: SlotAddress) -> Option<PlacementEntry> {
        self.placements.remove(slot)
    }

    pub fn get(&self, slot: SlotAddress) -> Option<&PlacementEntry> {
        self.placements.get(slot)
    }

    /// Replace the shape, dropping placements outside the new grid and
    /// renumbering the ones that survive.
    pub fn set_shape(&mut self, shape: ShapeConfig) -> PruneReport {
        let mut report = PruneReport::default();
        self.shape = shape;
        report.entrance_cleared = self.shape.normalize_entrance();

        let mut kept = RoomPlacementStore::new();
        let mut claimed = HashSet::new();
        for (slot, entry) in self.placements.iter() {
            match resolve_slot(&self.shape, slot) {
                Some((browsing, room_number)) if claimed.insert(browsing) => {
                    if room_number != entry.room_number {
                        report.renumbered += 1;
                    }
                    kept.insert(
                        slot,
                        PlacementEntry {
                            room_type_key: entry.room_type_key.clone(),
                            room_number,
                        },
                    );
                }
                _ => report.removed.push(slot),
            }
        }
        self.placements = kept;
        report
    }

    /// Handle a click on an authoring cell. A walkway selects its wing as
    /// the entrance, or clears it if already selected. Other cells are ignored.
    pub fn toggle_entrance(&mut self, row: u32, col: u32) -> Option<Side> {
        if let Some(GridCell::Walkway(side)) = authoring_grid(&self.shape).get(row, col) {
            self.shape.entrance_side = if self.shape.entrance_side == Some(side) {
                None
            } else {
                Some(side)
            };
        }
        self.shape.entrance_side
    }

    /// Placements that resolve to a distinct browsing cell, in slot order.
    /// A loaded blob may hold entries that collide; the first one wins.
    fn live(&self) -> Vec<(SlotAddress, SlotAddress, String, &PlacementEntry)> {
        let mut claimed = HashSet::new();
        self.placements
            .iter()
            .filter_map(|(slot, entry)| {
                let (browsing, room_number) = resolve_slot(&self.shape, slot)?;
                claimed
                    .insert(browsing)
                    .then_some((slot, browsing, room_number, entry))
            })
            .collect()
    }

    /// Placements that will not materialize under the current shape: not a
    /// room cell, or shadowed by an earlier slot on the same browsing cell.
    pub fn stale_slots(&self) -> Vec<SlotAddress> {
        let live: HashSet<SlotAddress> = self.live().into_iter().map(|(slot, ..)| slot).collect();
        self.placements
            .iter()
            .map(|(slot, _)| slot)
            .filter(|slot| !live.contains(slot))
            .collect()
    }

    /// Placement count per room type key.
    pub fn palette_summary(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for (_, entry) in self.placements.iter() {
            *counts.entry(entry.room_type_key.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// One room per live placement, with an explicit browsing slot.
    pub fn materialize_rooms(&self) -> Vec<NewRoom> {
        self.live()
            .into_iter()
            .map(|(slot, layout_slot, room_number, entry)| NewRoom {
                room_number,
                room_type_key: entry.room_type_key.clone(),
                floor: self.shape.floors - slot.floor,
                layout_slot,
            })
            .collect()
    }

    /// Validate and produce the payload that replaces the persisted layout.
    pub fn commit(&self) -> Result<LayoutRecord, CommitError> {
        let errors = validate_shape(&self.shape);
        if !errors.is_empty() {
            return Err(CommitError::InvalidShape(errors));
        }
        Ok(LayoutRecord {
            shape: self.shape.clone(),
            placement_blob: self.placements.to_blob().map_err(CommitError::Placement)?,
        })
    }
}
