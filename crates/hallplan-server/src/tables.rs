//! In-memory collaborator tables.
//!
//! Implements [`HallBackend`] over plain collections so the session flows can
//! run without a real service: the headless harness and the integration tests
//! both drive it. Failure knobs (rejected saves, failing or slow occupant
//! fetches) reproduce the degraded paths.

use crate::backend::{BackendError, HallBackend};
use async_trait::async_trait;
use hallplan_logic::occupancy::{
    Occupant, RequestEvent, RequestStatus, RoomRecord, RoomRequest, RoomType,
};
use hallplan_logic::placement::{LayoutDraft, LayoutRecord};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Default)]
struct Tables {
    layout: Option<LayoutRecord>,
    rooms: Vec<RoomRecord>,
    room_types: Vec<RoomType>,
    occupants: HashMap<u32, Vec<Occupant>>,
    requests: Vec<RoomRequest>,
    next_room_id: u32,
    next_request_id: u64,
    // failure knobs
    reject_saves: Option<String>,
    failing_occupant_rooms: HashSet<u32>,
    occupant_delay: Option<Duration>,
}

/// Single-actor in-memory backend.
#[derive(Default)]
pub struct MemoryTables {
    tables: Mutex<Tables>,
    fetches_started: AtomicUsize,
    fetches_finished: AtomicUsize,
}

impl MemoryTables {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_room_types(&self, room_types: Vec<RoomType>) {
        self.lock().room_types = room_types;
    }

    /// Insert a room record directly, bypassing layout materialization.
    pub fn insert_room(&self, room: RoomRecord) {
        let mut t = self.lock();
        t.next_room_id = t.next_room_id.max(room.room_id);
        t.rooms.retain(|r| r.room_id != room.room_id);
        t.rooms.push(room);
    }

    pub fn set_room_active(&self, room_id: u32, is_active: bool) {
        if let Some(room) = self.lock().rooms.iter_mut().find(|r| r.room_id == room_id) {
            room.is_active = is_active;
        }
    }

    pub fn add_occupant(&self, room_id: u32, occupant: Occupant) {
        self.lock().occupants.entry(room_id).or_default().push(occupant);
    }

    pub fn rooms(&self) -> Vec<RoomRecord> {
        self.lock().rooms.clone()
    }

    pub fn layout(&self) -> Option<LayoutRecord> {
        self.lock().layout.clone()
    }

    /// Make every subsequent `save_layout` fail with `message`.
    pub fn reject_saves_with(&self, message: impl Into<String>) {
        self.lock().reject_saves = Some(message.into());
    }

    pub fn fail_occupants_for(&self, room_id: u32) {
        self.lock().failing_occupant_rooms.insert(room_id);
    }

    pub fn set_occupant_delay(&self, delay: Duration) {
        self.lock().occupant_delay = Some(delay);
    }

    /// Staff decision on a request (approve / reject).
    pub fn decide_request(
        &self,
        request_id: u64,
        event: RequestEvent,
    ) -> Result<RoomRequest, BackendError> {
        let mut t = self.lock();
        let request = t
            .requests
            .iter_mut()
            .find(|r| r.request_id == request_id)
            .ok_or_else(|| BackendError::NotFound(format!("request {request_id}")))?;
        request.status = request
            .status
            .apply(event)
            .map_err(|e| BackendError::Rejected(e.to_string()))?;
        Ok(request.clone())
    }

    /// (started, finished) occupant fetches.
    pub fn occupant_fetch_counts(&self) -> (usize, usize) {
        (
            self.fetches_started.load(Ordering::SeqCst),
            self.fetches_finished.load(Ordering::SeqCst),
        )
    }

    /// Rebuild room records from a committed layout. Rooms keep their id and
    /// active flag when their number survives the new layout.
    fn materialize(t: &mut Tables, record: &LayoutRecord) -> Result<(), BackendError> {
        let draft = LayoutDraft::from_record(record)
            .map_err(|e| BackendError::Rejected(e.to_string()))?;
        let previous: HashMap<String, RoomRecord> = t
            .rooms
            .drain(..)
            .map(|r| (r.room_number.clone(), r))
            .collect();

        for room in draft.materialize_rooms() {
            let (room_id, is_active) = match previous.get(&room.room_number) {
                Some(old) => (old.room_id, old.is_active),
                None => {
                    t.next_room_id += 1;
                    (t.next_room_id, true)
                }
            };
            t.rooms.push(RoomRecord {
                room_id,
                room_number: room.room_number,
                room_type_key: room.room_type_key,
                floor: room.floor,
                is_active,
                layout_slot: Some(room.layout_slot),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl HallBackend for MemoryTables {
    async fn load_layout(&self) -> Result<Option<LayoutRecord>, BackendError> {
        Ok(self.lock().layout.clone())
    }

    async fn save_layout(&self, record: LayoutRecord) -> Result<(), BackendError> {
        let mut t = self.lock();
        if let Some(message) = &t.reject_saves {
            return Err(BackendError::Rejected(message.clone()));
        }
        Self::materialize(&mut t, &record)?;
        t.layout = Some(record);
        Ok(())
    }

    async fn list_rooms(&self) -> Result<Vec<RoomRecord>, BackendError> {
        Ok(self.lock().rooms.clone())
    }

    async fn list_room_types(&self) -> Result<Vec<RoomType>, BackendError> {
        Ok(self.lock().room_types.clone())
    }

    async fn room_occupants(&self, room_id: u32) -> Result<Vec<Occupant>, BackendError> {
        self.fetches_started.fetch_add(1, Ordering::SeqCst);
        let (delay, failing) = {
            let t = self.lock();
            (t.occupant_delay, t.failing_occupant_rooms.contains(&room_id))
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let result = if failing {
            Err(BackendError::Transport(format!(
                "occupants for room {room_id} unavailable"
            )))
        } else {
            Ok(self.lock().occupants.get(&room_id).cloned().unwrap_or_default())
        };
        self.fetches_finished.fetch_add(1, Ordering::SeqCst);
        result
    }

    async fn my_room_requests(&self) -> Result<Vec<RoomRequest>, BackendError> {
        Ok(self.lock().requests.clone())
    }

    async fn submit_room_request(&self, room_id: u32) -> Result<RoomRequest, BackendError> {
        let mut t = self.lock();
        if !t.rooms.iter().any(|r| r.room_id == room_id) {
            return Err(BackendError::NotFound(format!("room {room_id}")));
        }
        if t
            .requests
            .iter()
            .any(|r| r.room_id == room_id && r.status.blocks_new_request())
        {
            return Err(BackendError::Rejected(format!(
                "an open request for room {room_id} already exists"
            )));
        }
        t.next_request_id += 1;
        let request = RoomRequest {
            request_id: t.next_request_id,
            room_id,
            status: RequestStatus::Pending,
        };
        t.requests.push(request.clone());
        Ok(request)
    }

    async fn cancel_room_request(&self, request_id: u64) -> Result<RoomRequest, BackendError> {
        self.decide_request(request_id, RequestEvent::Cancel)
    }
}
