//! Client-facing actions: authoring a layout and requesting rooms.

use crate::backend::HallBackend;
use crate::error::SessionError;
use hallplan_logic::occupancy::{BrowsingView, RequestError, RequestEvent, RoomRequest};
use hallplan_logic::placement::{CommitError, LayoutDraft, LayoutRecord, PruneReport};
use hallplan_logic::shape::ShapeConfig;

// ============================================================================
// AUTHORING
// ============================================================================

/// Start an authoring session from the persisted layout, or from the default
/// shape if nothing has been saved yet.
pub async fn open_draft<B>(backend: &B) -> Result<LayoutDraft, SessionError>
where
    B: HallBackend + ?Sized,
{
    let Some(record) = backend.load_layout().await? else {
        log::info!("No saved layout, starting from default shape");
        return Ok(LayoutDraft::new(ShapeConfig::default()));
    };
    let draft = LayoutDraft::from_record(&record)?;
    let stale = draft.stale_slots();
    if !stale.is_empty() {
        log::warn!(
            "Saved layout has {} placements outside its own grid: {:?}",
            stale.len(),
            stale
        );
    }
    Ok(draft)
}

/// Apply a shape edit, reporting placements that no longer fit.
pub fn edit_shape(draft: &mut LayoutDraft, shape: ShapeConfig) -> PruneReport {
    let report = draft.set_shape(shape);
    if !report.removed.is_empty() {
        log::info!(
            "Shape edit removed {} placements: {:?}",
            report.removed.len(),
            report.removed
        );
    }
    if report.entrance_cleared {
        log::info!("Shape edit cleared the entrance selection");
    }
    report
}

/// Validate and persist the draft as the building's only layout.
///
/// Validation failures block the save. Collaborator errors are returned
/// unchanged and never retried.
pub async fn commit_layout<B>(
    backend: &B,
    draft: &LayoutDraft,
) -> Result<LayoutRecord, SessionError>
where
    B: HallBackend + ?Sized,
{
    let record = draft.commit().map_err(|e| match e {
        CommitError::InvalidShape(errors) => SessionError::InvalidShape(errors),
        CommitError::Placement(e) => SessionError::Placement(e),
    })?;

    if let Err(e) = backend.save_layout(record.clone()).await {
        log::warn!("Layout save failed: {}", e);
        return Err(e.into());
    }

    log::info!(
        "Layout saved: {} {} floors, {} placements",
        record.shape.shape_kind,
        record.shape.floors,
        draft.placements().len()
    );
    Ok(record)
}

// ============================================================================
// BOOKING
// ============================================================================

/// Request a room the viewer currently sees as open.
pub async fn submit_room_request<B>(
    backend: &B,
    view: &BrowsingView,
    room_id: u32,
) -> Result<RoomRequest, SessionError>
where
    B: HallBackend + ?Sized,
{
    let cell = view.room(room_id).ok_or(RequestError::UnknownRoom(room_id))?;
    if !cell.state.is_requestable() {
        return Err(RequestError::NotRequestable {
            room_id,
            state: cell.state,
        }
        .into());
    }
    let request = backend.submit_room_request(room_id).await?;
    log::info!("Requested room #{} ({})", room_id, cell.room_number);
    Ok(request)
}

/// Withdraw a pending request.
pub async fn cancel_room_request<B>(
    backend: &B,
    request: &RoomRequest,
) -> Result<RoomRequest, SessionError>
where
    B: HallBackend + ?Sized,
{
    request.status.apply(RequestEvent::Cancel)?;
    let updated = backend.cancel_room_request(request.request_id).await?;
    log::info!("Cancelled request #{}", request.request_id);
    Ok(updated)
}
