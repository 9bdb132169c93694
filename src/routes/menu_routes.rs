use axum::{
    body::{Body, Bytes},
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::errors::ApiError;
use crate::services::{menu_service, stream_service};
use crate::state::app::AppState;
use crate::state::menu::{Menu, NewEntry};

/// Build the menu routes:
/// - /menu         GET list, POST add, DELETE remove
/// - /menu/stream  live event stream of menu snapshots
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/menu",
            get(list_menu)
                .post(add_entry)
                .delete(remove_entry),
        )
        .route("/menu/stream", get(stream_menu))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct RemoveParams {
    pub id: Option<String>,
}

//
// ─────────────────────────────────────────────────────────────
// GET /api/menu
// Return the whole menu
// ─────────────────────────────────────────────────────────────
//
async fn list_menu(
    State(state): State<AppState>,
) -> Result<Json<Menu>, ApiError>
{
    Ok(Json(menu_service::list(&state)?))
}

//
// ─────────────────────────────────────────────────────────────
// POST /api/menu
// Add an entry, return the updated menu with 201
// The body is decoded as JSON whatever its Content-Type says
// ─────────────────────────────────────────────────────────────
//
async fn add_entry(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Menu>), ApiError>
{
    let req: NewEntry = serde_json::from_slice(&body).map_err(|err| {
        tracing::debug!("rejected menu entry body: {err}");
        ApiError::InvalidBody
    })?;

    let menu = menu_service::add(&state, req)?;
    Ok((StatusCode::CREATED, Json(menu)))
}

//
// ─────────────────────────────────────────────────────────────
// DELETE /api/menu?id={id}
// Remove an entry; unknown ids succeed
// ─────────────────────────────────────────────────────────────
//
async fn remove_entry(
    State(state): State<AppState>,
    Query(params): Query<RemoveParams>,
) -> Result<StatusCode, ApiError>
{
    let id = params.id.unwrap_or_default();
    menu_service::remove(&state, &id)?;
    Ok(StatusCode::OK)
}

//
// ─────────────────────────────────────────────────────────────
// GET /api/menu/stream
// Current menu first, then one `menu` event per change
// ─────────────────────────────────────────────────────────────
//
async fn stream_menu(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError>
{
    let events = stream_service::open(&state)?;

    let mut response = Body::from_stream(events).into_response();
    let out = response.headers_mut();
    out.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    out.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    out.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    if let Some(origin) = headers.get(header::ORIGIN) {
        out.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
    }

    Ok(response)
}
