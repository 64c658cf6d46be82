use crate::backend::BackendError;
use hallplan_logic::occupancy::RequestError;
use hallplan_logic::placement::PlacementError;
use hallplan_logic::shape::ShapeError;
use thiserror::Error;

/// Errors surfaced by authoring and browsing sessions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Commit blocked by shape validation.
    #[error("layout cannot be saved: {}", join(.0))]
    InvalidShape(Vec<ShapeError>),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Placement(#[from] PlacementError),
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error("no layout has been saved yet")]
    NoLayout,
    #[error("view load cancelled")]
    Cancelled,
}

fn join(errors: &[ShapeError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
