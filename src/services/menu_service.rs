use crate::errors::{ApiError, StoreError};
use crate::persistence::Snapshot;
use crate::state::app::AppState;
use crate::state::menu::{Menu, NewEntry};

/// Current menu.
pub fn list(state: &AppState) -> Result<Menu, StoreError> {
    state.store.read()
}

/// Validate `req`, assign it an id, append it and publish the new menu.
///
/// Publishing happens before this returns, so a caller that sees success
/// knows every current subscriber has been offered the new snapshot.
pub fn add(state: &AppState, req: NewEntry) -> Result<Menu, ApiError> {
    if !req.is_complete() {
        return Err(ApiError::MissingFields);
    }

    let entry = req.into_entry(state.ids.next_id());
    let id = entry.id.clone();

    let snapshot = state.store.append(entry)?;
    tracing::info!(id = %id, entries = snapshot.menu.len(), "menu entry added");

    Ok(publish(state, snapshot))
}

/// Remove the entry with `id` and publish the resulting menu.
///
/// An unknown id still succeeds and still publishes.
pub fn remove(state: &AppState, id: &str) -> Result<Menu, ApiError> {
    if id.is_empty() {
        return Err(ApiError::MissingId);
    }

    let snapshot = state.store.remove(id)?;
    tracing::info!(id = %id, entries = snapshot.menu.len(), "menu entry removed");

    Ok(publish(state, snapshot))
}

// Called with the store lock already released. Concurrent mutations may get
// here out of write order; the broadcaster drops the older snapshot.
fn publish(state: &AppState, snapshot: Snapshot) -> Menu {
    let delivered = state.broadcaster.publish(snapshot.seq, snapshot.encoded);
    tracing::debug!(seq = snapshot.seq, delivered, "menu snapshot published");
    snapshot.menu
}
