//! Session flow tests against the in-memory collaborator.

use hallplan_logic::occupancy::{
    CellState, ExclusionReason, Occupant, RequestEvent, RequestStatus, RoomRecord, RoomType,
};
use hallplan_logic::placement::PlacementError;
use hallplan_logic::shape::{ShapeConfig, ShapeError, ShapeKind, Side};
use hallplan_logic::slot::SlotAddress;
use hallplan_server::reducers::{
    cancel_room_request, commit_layout, edit_shape, open_draft, submit_room_request,
};
use hallplan_server::{BackendError, BrowseSession, MemoryTables, ServerConfig, SessionError};
use std::time::Duration;

// ── Helpers ────────────────────────────────────────────────────────────

fn u_shape() -> ShapeConfig {
    ShapeConfig {
        shape_kind: ShapeKind::U,
        floors: 2,
        top_count: 3,
        bottom_count: 0,
        left_count: 2,
        right_count: 2,
        open_side: Side::Bottom,
        entrance_side: Some(Side::Top),
        ..ShapeConfig::default()
    }
}

fn occupant(id: u32) -> Occupant {
    Occupant {
        user_id: id,
        name: format!("Student {id}"),
        roll_number: format!("R{id:04}"),
    }
}

/// Backend with a committed U-shaped hall: every top-wing room on both
/// floors is a double.
async fn seeded() -> MemoryTables {
    let backend = MemoryTables::new();
    backend.set_room_types(vec![RoomType {
        key: "double".to_string(),
        name: "Double".to_string(),
        capacity: 2,
    }]);
    let mut draft = open_draft(&backend).await.unwrap();
    edit_shape(&mut draft, u_shape());
    for floor in 0..2 {
        for col in 1..=3 {
            draft.place(SlotAddress::new(floor, 0, col), "double").unwrap();
        }
    }
    commit_layout(&backend, &draft).await.unwrap();
    backend
}

fn room_id(backend: &MemoryTables, number: &str) -> u32 {
    backend
        .rooms()
        .into_iter()
        .find(|r| r.room_number == number)
        .map(|r| r.room_id)
        .unwrap()
}

// ── Authoring ──────────────────────────────────────────────────────────

#[tokio::test]
async fn commit_materializes_rooms() {
    let backend = seeded().await;
    let rooms = backend.rooms();
    assert_eq!(rooms.len(), 6);
    assert!(rooms.iter().all(|r| r.layout_slot.is_some()));
    let mut numbers: Vec<_> = rooms.iter().map(|r| r.room_number.clone()).collect();
    numbers.sort();
    assert_eq!(numbers, vec!["1-A1", "1-A2", "1-A3", "2-A1", "2-A2", "2-A3"]);
}

#[tokio::test]
async fn invalid_entrance_blocks_commit() {
    let backend = MemoryTables::new();
    let mut draft = open_draft(&backend).await.unwrap();
    let mut shape = u_shape();
    shape.entrance_side = None;
    edit_shape(&mut draft, shape);
    draft.place(SlotAddress::new(0, 0, 1), "double").unwrap();

    let err = commit_layout(&backend, &draft).await.unwrap_err();
    assert_eq!(err, SessionError::InvalidShape(vec![ShapeError::MissingEntrance]));
    assert!(backend.layout().is_none());
}

#[tokio::test]
async fn save_failure_surfaces_raw_error() {
    let backend = MemoryTables::new();
    backend.reject_saves_with("403: layout locked by another editor");
    let draft = open_draft(&backend).await.unwrap();

    let err = commit_layout(&backend, &draft).await.unwrap_err();
    assert_eq!(
        err,
        SessionError::Backend(BackendError::Rejected(
            "403: layout locked by another editor".to_string()
        ))
    );
    assert_eq!(err.to_string(), "403: layout locked by another editor");
}

#[tokio::test]
async fn recommit_replaces_layout() {
    let backend = seeded().await;
    let kept_id = room_id(&backend, "2-A1");

    let mut draft = open_draft(&backend).await.unwrap();
    assert_eq!(draft.placements().len(), 6);
    let mut shape = draft.shape().clone();
    shape.top_count = 1;
    let report = edit_shape(&mut draft, shape);
    assert_eq!(report.removed.len(), 4);
    commit_layout(&backend, &draft).await.unwrap();

    assert_eq!(backend.rooms().len(), 2);
    assert_eq!(room_id(&backend, "2-A1"), kept_id);
}

#[tokio::test]
async fn one_column_hall_commits_distinct_rooms() {
    let backend = MemoryTables::new();
    let mut draft = open_draft(&backend).await.unwrap();
    edit_shape(
        &mut draft,
        ShapeConfig {
            shape_kind: ShapeKind::Square,
            floors: 1,
            top_count: 1,
            bottom_count: 1,
            left_count: 1,
            right_count: 1,
            entrance_side: Some(Side::Top),
            ..ShapeConfig::default()
        },
    );
    draft.place(SlotAddress::new(0, 1, 0), "double").unwrap();
    assert!(matches!(
        draft.place(SlotAddress::new(0, 1, 2), "double"),
        Err(PlacementError::SharedBrowsingCell { .. })
    ));

    // recommitting keeps the single record
    commit_layout(&backend, &draft).await.unwrap();
    commit_layout(&backend, &draft).await.unwrap();
    let rooms = backend.rooms();
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].room_number, "1-B1");
}

// ── Browsing ───────────────────────────────────────────────────────────

#[tokio::test]
async fn browsing_view_merges_everything() {
    let backend = seeded().await;
    let full = room_id(&backend, "2-A1");
    let open = room_id(&backend, "2-A2");
    backend.add_occupant(full, occupant(1));
    backend.add_occupant(full, occupant(2));
    backend.add_occupant(open, occupant(3));

    let session = BrowseSession::new(ServerConfig::default());
    let view = session.load(&backend).await.unwrap();

    assert_eq!(view.floors.len(), 2);
    assert_eq!(view.room_count(), 6);
    assert!(view.excluded.is_empty());
    assert_eq!(view.room(full).unwrap().remaining, 0);
    assert_eq!(view.room(full).unwrap().state, CellState::Full);
    assert_eq!(view.room(open).unwrap().remaining, 1);
    assert_eq!(view.room(open).unwrap().state, CellState::Open);
}

#[tokio::test]
async fn one_failing_occupant_fetch_degrades_only_that_room() {
    let backend = seeded().await;
    let broken = room_id(&backend, "1-A2");
    let fine = room_id(&backend, "1-A3");
    backend.add_occupant(broken, occupant(1));
    backend.add_occupant(fine, occupant(2));
    backend.fail_occupants_for(broken);

    let view = BrowseSession::new(ServerConfig::default())
        .load(&backend)
        .await
        .unwrap();
    assert_eq!(view.occupant_fetch_failures, vec![broken]);
    assert!(view.room(broken).unwrap().occupants.is_empty());
    assert_eq!(view.room(fine).unwrap().occupants.len(), 1);
    assert_eq!(view.room_count(), 6);
}

#[tokio::test]
async fn slow_occupant_fetch_times_out_as_failure() {
    let backend = seeded().await;
    backend.set_occupant_delay(Duration::from_millis(500));
    let config = ServerConfig {
        occupant_fetch_timeout_ms: 20,
        ..ServerConfig::default()
    };
    let view = BrowseSession::new(config).load(&backend).await.unwrap();
    assert_eq!(view.occupant_fetch_failures.len(), 6);
    assert_eq!(view.room_count(), 6);
}

#[tokio::test]
async fn dropping_session_cancels_in_flight_fetches() {
    let backend = seeded().await;
    backend.set_occupant_delay(Duration::from_secs(30));
    let config = ServerConfig {
        max_concurrent_fetches: 2,
        occupant_fetch_timeout_ms: 60_000,
    };

    let session = BrowseSession::new(config);
    let load = session.load(&backend);
    let unmount = async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(session);
    };
    let (result, ()) = tokio::join!(load, unmount);

    assert_eq!(result.unwrap_err(), SessionError::Cancelled);
    let (started, finished) = backend.occupant_fetch_counts();
    // only the permitted fetches ever started, and none completed
    assert_eq!(started, 2);
    assert_eq!(finished, 0);
}

#[tokio::test]
async fn cancelled_session_loads_nothing() {
    let backend = seeded().await;
    let session = BrowseSession::new(ServerConfig::default());
    session.cancel();
    let err = session.load(&backend).await.unwrap_err();
    assert_eq!(err, SessionError::Cancelled);
    assert_eq!(backend.occupant_fetch_counts(), (0, 0));
}

#[tokio::test]
async fn rooms_without_slot_fall_back_to_number() {
    let backend = seeded().await;
    backend.insert_room(RoomRecord {
        room_id: 100,
        room_number: "1-B1".to_string(), // left wing, first room, bottom floor
        room_type_key: "double".to_string(),
        floor: 1,
        is_active: true,
        layout_slot: None,
    });
    backend.insert_room(RoomRecord {
        room_id: 101,
        room_number: "Annex 4".to_string(),
        room_type_key: "double".to_string(),
        floor: 1,
        is_active: true,
        layout_slot: None,
    });

    let view = BrowseSession::new(ServerConfig::default())
        .load(&backend)
        .await
        .unwrap();
    assert!(view.room(100).is_some());
    assert!(view.room(101).is_none());
    assert_eq!(view.excluded[0].reason, ExclusionReason::MalformedNumber);
}

#[tokio::test]
async fn browsing_without_layout_fails() {
    let backend = MemoryTables::new();
    let err = BrowseSession::new(ServerConfig::default())
        .load(&backend)
        .await
        .unwrap_err();
    assert_eq!(err, SessionError::NoLayout);
}

// ── Booking ────────────────────────────────────────────────────────────

#[tokio::test]
async fn request_lifecycle_through_view() {
    let backend = seeded().await;
    let room = room_id(&backend, "2-A3");
    let session = BrowseSession::new(ServerConfig::default());

    let view = session.load(&backend).await.unwrap();
    let request = submit_room_request(&backend, &view, room).await.unwrap();
    assert_eq!(request.status, RequestStatus::Pending);

    // reload: the cell is pinned and a second request is refused locally
    let view = session.load(&backend).await.unwrap();
    assert_eq!(
        view.room(room).unwrap().state,
        CellState::Requested(RequestStatus::Pending)
    );
    assert!(matches!(
        submit_room_request(&backend, &view, room).await,
        Err(SessionError::Request(_))
    ));

    // withdraw, then the room is open again
    let cancelled = cancel_room_request(&backend, &request).await.unwrap();
    assert_eq!(cancelled.status, RequestStatus::Cancelled);
    let view = session.load(&backend).await.unwrap();
    assert_eq!(view.room(room).unwrap().state, CellState::Open);
    submit_room_request(&backend, &view, room).await.unwrap();
}

#[tokio::test]
async fn decided_requests_cannot_be_cancelled() {
    let backend = seeded().await;
    let room = room_id(&backend, "1-A1");
    let session = BrowseSession::new(ServerConfig::default());
    let view = session.load(&backend).await.unwrap();
    let request = submit_room_request(&backend, &view, room).await.unwrap();
    let approved = backend
        .decide_request(request.request_id, RequestEvent::Approve)
        .unwrap();

    assert!(matches!(
        cancel_room_request(&backend, &approved).await,
        Err(SessionError::Request(_))
    ));
    let view = session.load(&backend).await.unwrap();
    assert_eq!(
        view.room(room).unwrap().state,
        CellState::Requested(RequestStatus::Approved)
    );
}

#[tokio::test]
async fn inactive_rooms_are_not_requestable() {
    let backend = seeded().await;
    let room = room_id(&backend, "1-A1");
    backend.set_room_active(room, false);
    let view = BrowseSession::new(ServerConfig::default())
        .load(&backend)
        .await
        .unwrap();
    assert_eq!(view.room(room).unwrap().state, CellState::Inactive);
    assert!(submit_room_request(&backend, &view, room).await.is_err());
}
