//! Collaborator seam: everything HallPlan reads from or writes to the system
//! that owns persistence, authentication, and room records.
//!
//! The current actor is implied by the backend instance; requests are always
//! "mine".

use async_trait::async_trait;
use hallplan_logic::occupancy::{Occupant, RoomRecord, RoomRequest, RoomType};
use hallplan_logic::placement::LayoutRecord;
use thiserror::Error;

/// Failure reported by the collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The collaborator refused the operation. Message is passed through as-is.
    #[error("{0}")]
    Rejected(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("timed out after {0} ms")]
    Timeout(u64),
    #[error("not found: {0}")]
    NotFound(String),
}

#[async_trait]
pub trait HallBackend: Send + Sync {
    /// The persisted layout, or `None` before the first commit.
    async fn load_layout(&self) -> Result<Option<LayoutRecord>, BackendError>;

    /// Replace the persisted layout. The collaborator materializes one room
    /// record per placement.
    async fn save_layout(&self, record: LayoutRecord) -> Result<(), BackendError>;

    async fn list_rooms(&self) -> Result<Vec<RoomRecord>, BackendError>;

    async fn list_room_types(&self) -> Result<Vec<RoomType>, BackendError>;

    async fn room_occupants(&self, room_id: u32) -> Result<Vec<Occupant>, BackendError>;

    async fn my_room_requests(&self) -> Result<Vec<RoomRequest>, BackendError>;

    async fn submit_room_request(&self, room_id: u32) -> Result<RoomRequest, BackendError>;

    async fn cancel_room_request(&self, request_id: u64) -> Result<RoomRequest, BackendError>;
}
