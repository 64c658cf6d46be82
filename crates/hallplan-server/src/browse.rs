//! Browsing view loader.
//!
//! Loads the layout, rooms, room types and the viewer's requests, resolves
//! rooms to slots, then fetches every placed room's occupants concurrently.
//! A failed or timed-out occupant fetch degrades that one room to an empty
//! occupant list; it never fails the view.
//!
//! A [`BrowseSession`] is bound to the lifetime of whatever displays the view.
//! Dropping it, or calling [`BrowseSession::cancel`], drops every in-flight
//! fetch and makes the pending load return [`SessionError::Cancelled`].

use crate::backend::{BackendError, HallBackend};
use crate::config::ServerConfig;
use crate::error::SessionError;
use futures::future::join_all;
use hallplan_logic::grid::browsing_grid;
use hallplan_logic::occupancy::{
    build_overlay_on, resolve_rooms_on, BrowsingView, Occupant, OverlayInput,
};
use std::collections::HashMap;
use std::future::Future;
use tokio::sync::{watch, Semaphore};

pub struct BrowseSession {
    cancel_tx: watch::Sender<bool>,
    config: ServerConfig,
}

impl BrowseSession {
    pub fn new(config: ServerConfig) -> Self {
        let (cancel_tx, _) = watch::channel(false);
        Self { cancel_tx, config }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn cancel(&self) {
        self.cancel_tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel_tx.borrow()
    }

    /// Load the browsing view.
    ///
    /// The returned future does not borrow the session, so the session can be
    /// dropped while the load is still running.
    pub fn load<'a, B>(
        &self,
        backend: &'a B,
    ) -> impl Future<Output = Result<BrowsingView, SessionError>> + 'a
    where
        B: HallBackend + ?Sized,
    {
        let mut cancelled = self.cancel_tx.subscribe();
        let config = self.config.clone();
        async move {
            tokio::select! {
                biased;
                _ = wait_for_cancel(&mut cancelled) => {
                    log::info!("browsing view load cancelled");
                    Err(SessionError::Cancelled)
                }
                result = load_view(backend, &config) => result,
            }
        }
    }
}

impl Drop for BrowseSession {
    fn drop(&mut self) {
        self.cancel_tx.send_replace(true);
    }
}

/// Resolves once the session is cancelled or gone.
async fn wait_for_cancel(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

async fn load_view<B>(backend: &B, config: &ServerConfig) -> Result<BrowsingView, SessionError>
where
    B: HallBackend + ?Sized,
{
    let layout = backend.load_layout().await?.ok_or(SessionError::NoLayout)?;
    let (rooms, room_types, my_requests) = tokio::try_join!(
        backend.list_rooms(),
        backend.list_room_types(),
        backend.my_room_requests(),
    )?;

    let grid = browsing_grid(&layout.shape);
    let resolution = resolve_rooms_on(&grid, layout.shape.floors, &rooms);
    for excluded in &resolution.excluded {
        log::warn!(
            "Room #{} ({:?}) left off the grid: {:?}",
            excluded.room_id,
            excluded.room_number,
            excluded.reason
        );
    }
    let room_ids: Vec<u32> = resolution.placed.iter().map(|(_, r)| r.room_id).collect();
    let (occupants, failures) = fetch_occupants(backend, &room_ids, config).await;

    let input = OverlayInput {
        shape: &layout.shape,
        rooms: &rooms,
        room_types: &room_types,
        occupants: &occupants,
        my_requests: &my_requests,
    };
    let mut view = build_overlay_on(&input, &grid, resolution);
    view.occupant_fetch_failures = failures;

    log::debug!(
        "Browsing view: {} floors, {} rooms placed, {} excluded, {} occupant fetches failed",
        view.floors.len(),
        view.room_count(),
        view.excluded.len(),
        view.occupant_fetch_failures.len()
    );
    Ok(view)
}

/// Fetch occupants for every room, at most `max_concurrent_fetches` at once.
///
/// Returns the occupant map and the ids of rooms whose fetch failed.
async fn fetch_occupants<B>(
    backend: &B,
    room_ids: &[u32],
    config: &ServerConfig,
) -> (HashMap<u32, Vec<Occupant>>, Vec<u32>)
where
    B: HallBackend + ?Sized,
{
    let permits = Semaphore::new(config.max_concurrent_fetches.max(1));
    let timeout = config.fetch_timeout();
    let permits = &permits;

    let fetches = room_ids.iter().map(|&room_id| async move {
        let result = match permits.acquire().await {
            Ok(_permit) => tokio::time::timeout(timeout, backend.room_occupants(room_id))
                .await
                .unwrap_or_else(|_| Err(BackendError::Timeout(timeout.as_millis() as u64))),
            Err(_) => Err(BackendError::Transport("fetch pool closed".to_string())),
        };
        (room_id, result)
    });

    let mut occupants = HashMap::with_capacity(room_ids.len());
    let mut failures = Vec::new();
    for (room_id, result) in join_all(fetches).await {
        match result {
            Ok(list) => {
                occupants.insert(room_id, list);
            }
            Err(e) => {
                log::warn!("Occupant fetch for room #{} failed, showing empty: {}", room_id, e);
                failures.push(room_id);
            }
        }
    }
    (occupants, failures)
}
