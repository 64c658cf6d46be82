//! HallPlan Server
//!
//! Session flows over an abstract collaborator ([`backend::HallBackend`]):
//! authoring commits a layout as one payload, browsing loads the overlay with
//! a concurrent, cancellable occupant fan-out, and viewers request rooms.
//! All layout semantics live in `hallplan-logic`; this crate only sequences
//! I/O around it.

pub mod backend;
pub mod browse;
pub mod config;
pub mod error;
pub mod reducers;
pub mod tables;

pub use backend::{BackendError, HallBackend};
pub use browse::BrowseSession;
pub use config::ServerConfig;
pub use error::SessionError;
pub use tables::MemoryTables;
