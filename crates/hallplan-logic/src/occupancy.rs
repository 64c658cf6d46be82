//! Read-only browsing overlay: persisted rooms, room types, occupants and the
//! viewer's own requests merged onto the browsing grid.
//!
//! Each [`RoomRecord`] is resolved to a slot (explicit `layout_slot` first,
//! otherwise parsed from its room number). Rooms that can't be resolved, or
//! whose slot is not a room cell of the browsing grid, are left off the grid
//! and listed in [`BrowsingView::excluded`].
//!
//! # Cell state
//!
//! Evaluated in order, first match wins:
//!
//! | State | Condition |
//! |-------|-----------|
//! | `Inactive` | room administratively disabled |
//! | `Requested(status)` | viewer holds a pending or approved request |
//! | `Full` | no remaining capacity |
//! | `Open` | requestable |

use crate::grid::{browsing_grid, FloorGrid, GridCell};
use crate::shape::{ShapeConfig, Side};
use crate::slot::{room_number_to_slot, SlotAddress};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// A bookable room category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomType {
    pub key: String,
    pub name: String,
    /// Occupants per room.
    pub capacity: u32,
}

/// A persisted physical room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRecord {
    pub room_id: u32,
    pub room_number: String,
    pub room_type_key: String,
    /// 1-based floor number as stored; informational only.
    pub floor: u32,
    pub is_active: bool,
    /// Authoritative when present.
    #[serde(default)]
    pub layout_slot: Option<SlotAddress>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Occupant {
    pub user_id: u32,
    pub name: String,
    pub roll_number: String,
}

/// Lifecycle of one room request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

/// Transitions a request can undergo after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestEvent {
    Approve,
    Reject,
    Cancel,
}

/// Request lifecycle error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// Only pending requests change state.
    InvalidTransition {
        from: RequestStatus,
        event: RequestEvent,
    },
    /// The viewer can't request this room in its current state.
    NotRequestable { room_id: u32, state: CellState },
    UnknownRoom(u32),
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::InvalidTransition { from, event } => {
                write!(f, "cannot apply {event:?} to a {from} request")
            }
            RequestError::NotRequestable { room_id, state } => {
                write!(f, "room {room_id} is not requestable ({state})")
            }
            RequestError::UnknownRoom(room_id) => write!(f, "unknown room {room_id}"),
        }
    }
}

impl std::error::Error for RequestError {}

impl RequestStatus {
    pub fn name(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    /// Pending and approved requests stop the viewer from requesting again.
    pub fn blocks_new_request(self) -> bool {
        matches!(self, RequestStatus::Pending | RequestStatus::Approved)
    }

    /// pending → approved | rejected | cancelled. Everything else is final.
    pub fn apply(self, event: RequestEvent) -> Result<RequestStatus, RequestError> {
        match (self, event) {
            (RequestStatus::Pending, RequestEvent::Approve) => Ok(RequestStatus::Approved),
            (RequestStatus::Pending, RequestEvent::Reject) => Ok(RequestStatus::Rejected),
            (RequestStatus::Pending, RequestEvent::Cancel) => Ok(RequestStatus::Cancelled),
            (from, event) => Err(RequestError::InvalidTransition { from, event }),
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One of the viewer's requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRequest {
    pub request_id: u64,
    pub room_id: u32,
    pub status: RequestStatus,
}

/// The viewer's request that currently governs `room_id`: the newest
/// blocking one if any, otherwise the newest of any status.
pub fn own_request(requests: &[RoomRequest], room_id: u32) -> Option<&RoomRequest> {
    let mut blocking: Option<&RoomRequest> = None;
    let mut newest: Option<&RoomRequest> = None;
    for req in requests.iter().filter(|r| r.room_id == room_id) {
        if newest.map_or(true, |n| req.request_id > n.request_id) {
            newest = Some(req);
        }
        if req.status.blocks_new_request()
            && blocking.map_or(true, |b| req.request_id > b.request_id)
        {
            blocking = Some(req);
        }
    }
    blocking.or(newest)
}

/// Whether the viewer's history allows a new request for `room_id`.
pub fn can_request(requests: &[RoomRequest], room_id: u32) -> bool {
    !requests
        .iter()
        .any(|r| r.room_id == room_id && r.status.blocks_new_request())
}

/// Interaction state of a room cell for the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    Inactive,
    Full,
    Requested(RequestStatus),
    Open,
}

impl CellState {
    pub fn is_requestable(self) -> bool {
        self == CellState::Open
    }
}

impl fmt::Display for CellState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellState::Inactive => f.write_str("inactive"),
            CellState::Full => f.write_str("full"),
            CellState::Requested(status) => write!(f, "requested-{status}"),
            CellState::Open => f.write_str("open"),
        }
    }
}

pub fn remaining_capacity(capacity: u32, occupants: usize) -> u32 {
    capacity.saturating_sub(u32::try_from(occupants).unwrap_or(u32::MAX))
}

pub fn cell_state(is_active: bool, remaining: u32, request: Option<&RoomRequest>) -> CellState {
    if !is_active {
        return CellState::Inactive;
    }
    if let Some(req) = request.filter(|r| r.status.blocks_new_request()) {
        return CellState::Requested(req.status);
    }
    if remaining == 0 {
        return CellState::Full;
    }
    CellState::Open
}

/// Where a record lands: explicit slot, else parsed from the room number.
pub fn resolve_room_slot(record: &RoomRecord, floors: u32) -> Option<SlotAddress> {
    record
        .layout_slot
        .or_else(|| room_number_to_slot(&record.room_number, floors))
}

/// Why a room was left off the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionReason {
    /// No layout slot and the room number doesn't parse.
    MalformedNumber,
    /// Slot is outside the building or not a room cell.
    OffGrid,
    /// Another room already holds the slot.
    DuplicateSlot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludedRoom {
    pub room_id: u32,
    pub room_number: String,
    pub reason: ExclusionReason,
}

/// Records that resolved to distinct room cells, plus the ones that didn't.
#[derive(Debug, Clone, Default)]
pub struct Resolution<'a> {
    pub placed: Vec<(SlotAddress, &'a RoomRecord)>,
    pub excluded: Vec<ExcludedRoom>,
}

/// Resolve every record against the browsing grid of `shape`.
///
/// The first record to claim a slot keeps it; later claimants are excluded.
pub fn resolve_rooms<'a>(shape: &ShapeConfig, rooms: &'a [RoomRecord]) -> Resolution<'a> {
    resolve_rooms_on(&browsing_grid(shape), shape.floors, rooms)
}

/// [`resolve_rooms`] against an already generated browsing grid.
pub fn resolve_rooms_on<'a>(
    grid: &FloorGrid,
    floors: u32,
    rooms: &'a [RoomRecord],
) -> Resolution<'a> {
    let mut taken = HashSet::new();
    let mut out = Resolution::default();

    for record in rooms {
        let exclude = |reason| ExcludedRoom {
            room_id: record.room_id,
            room_number: record.room_number.clone(),
            reason,
        };
        let Some(slot) = resolve_room_slot(record, floors) else {
            out.excluded.push(exclude(ExclusionReason::MalformedNumber));
            continue;
        };
        let on_grid = slot.floor < floors
            && grid.get(slot.row, slot.col).is_some_and(GridCell::is_room);
        if !on_grid {
            out.excluded.push(exclude(ExclusionReason::OffGrid));
            continue;
        }
        if !taken.insert(slot) {
            out.excluded.push(exclude(ExclusionReason::DuplicateSlot));
            continue;
        }
        out.placed.push((slot, record));
    }
    out
}

/// A room drawn on the browsing grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomCell {
    pub room_id: u32,
    pub room_number: String,
    pub room_type_key: String,
    /// `None` when the record names a room type that doesn't exist.
    pub room_type_name: Option<String>,
    pub capacity: u32,
    pub occupants: Vec<Occupant>,
    pub remaining: u32,
    pub own_request: Option<RoomRequest>,
    pub state: CellState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayCell {
    /// Padding; nothing to draw.
    Empty,
    /// A room cell with no persisted room.
    Vacant(Side),
    Room(Box<RoomCell>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloorView {
    /// 0 = top floor.
    pub floor_index: u32,
    /// 1-based, counted from the bottom.
    pub floor_number: u32,
    pub cells: Vec<Vec<OverlayCell>>,
}

impl FloorView {
    pub fn rooms(&self) -> impl Iterator<Item = &RoomCell> {
        self.cells.iter().flatten().filter_map(|c| match c {
            OverlayCell::Room(room) => Some(room.as_ref()),
            _ => None,
        })
    }
}

/// The complete browsing view, top floor first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowsingView {
    pub floors: Vec<FloorView>,
    pub excluded: Vec<ExcludedRoom>,
    /// Rooms whose occupant list could not be fetched and were shown empty.
    pub occupant_fetch_failures: Vec<u32>,
}

impl BrowsingView {
    pub fn room(&self, room_id: u32) -> Option<&RoomCell> {
        self.floors
            .iter()
            .flat_map(FloorView::rooms)
            .find(|r| r.room_id == room_id)
    }

    pub fn room_count(&self) -> usize {
        self.floors.iter().map(|f| f.rooms().count()).sum()
    }
}

/// Everything the overlay merges. Missing occupant entries mean "no occupants".
pub struct OverlayInput<'a> {
    pub shape: &'a ShapeConfig,
    pub rooms: &'a [RoomRecord],
    pub room_types: &'a [RoomType],
    pub occupants: &'a HashMap<u32, Vec<Occupant>>,
    pub my_requests: &'a [RoomRequest],
}

/// Merge rooms, types, occupants and requests onto the browsing grid.
pub fn build_overlay(input: &OverlayInput<'_>) -> BrowsingView {
    let grid = browsing_grid(input.shape);
    let resolution = resolve_rooms_on(&grid, input.shape.floors, input.rooms);
    build_overlay_on(input, &grid, resolution)
}

/// [`build_overlay`] with the grid and room resolution already computed.
/// `resolution` must come from `input.rooms` on `grid`.
pub fn build_overlay_on(
    input: &OverlayInput<'_>,
    grid: &FloorGrid,
    resolution: Resolution<'_>,
) -> BrowsingView {
    let Resolution { placed, excluded } = resolution;
    let types: HashMap<&str, &RoomType> = input
        .room_types
        .iter()
        .map(|t| (t.key.as_str(), t))
        .collect();
    let by_slot: HashMap<SlotAddress, &RoomRecord> = placed.into_iter().collect();

    let floors = (0..input.shape.floors)
        .map(|floor_index| {
            let cells = grid
                .rows()
                .iter()
                .enumerate()
                .map(|(r, row)| {
                    row.iter()
                        .enumerate()
                        .map(|(c, cell)| {
                            let slot = SlotAddress::new(floor_index, r as u32, c as u32);
                            match (cell, by_slot.get(&slot)) {
                                (GridCell::Room(_), Some(record)) => {
                                    OverlayCell::Room(Box::new(room_cell(input, &types, record)))
                                }
                                (GridCell::Room(side), None) => OverlayCell::Vacant(*side),
                                _ => OverlayCell::Empty,
                            }
                        })
                        .collect()
                })
                .collect();
            FloorView {
                floor_index,
                floor_number: input.shape.floors - floor_index,
                cells,
            }
        })
        .collect();

    BrowsingView {
        floors,
        excluded,
        occupant_fetch_failures: Vec::new(),
    }
}

fn room_cell(
    input: &OverlayInput<'_>,
    types: &HashMap<&str, &RoomType>,
    record: &RoomRecord,
) -> RoomCell {
    let room_type = types.get(record.room_type_key.as_str());
    let capacity = room_type.map_or(0, |t| t.capacity);
    let occupants = input
        .occupants
        .get(&record.room_id)
        .cloned()
        .unwrap_or_default();
    let remaining = remaining_capacity(capacity, occupants.len());
    let own = own_request(input.my_requests, record.room_id).cloned();
    let state = cell_state(record.is_active, remaining, own.as_ref());

    RoomCell {
        room_id: record.room_id,
        room_number: record.room_number.clone(),
        room_type_key: record.room_type_key.clone(),
        room_type_name: room_type.map(|t| t.name.clone()),
        capacity,
        occupants,
        remaining,
        own_request: own,
        state,
    }
}
