use anyhow::Result;
use std::time::{Duration, Instant};

use crate::collection::TrackedItem;
use chrono::NaiveDate;
use tracing::debug;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{log_requests, state::*, RequestsLoggingLevel, ServerConfig};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub version: String,
    pub hash: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Deserialize, Debug)]
struct UpdateRatingBody {
    pub rating: u8,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct UpdateDatesBody {
    pub start_date: Option<NaiveDate>,
    pub completion_date: Option<NaiveDate>,
}

#[derive(Deserialize, Debug)]
struct UpdateNoteBody {
    pub note: String,
}

const MAX_RATING: u8 = 10;

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        version: env!("CARGO_PKG_VERSION").to_string(),
        hash: state.hash.clone(),
    };
    Json(stats)
}

async fn add_item(
    State(service): State<GuardedCollectionService>,
    Path(user): Path<String>,
    Json(item): Json<TrackedItem>,
) -> Response {
    match service.get_item(&user, item.media_id) {
        Ok(Some(_)) => return StatusCode::CONFLICT.into_response(),
        Ok(None) => {}
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
    if let Some(rating) = item.user_rating {
        if rating > MAX_RATING {
            return StatusCode::BAD_REQUEST.into_response();
        }
    }

    match service.add_item(&user, item) {
        Ok(item) => (StatusCode::CREATED, Json(item)).into_response(),
        Err(err) => {
            debug!("Error adding item: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_items(
    State(service): State<GuardedCollectionService>,
    Path(user): Path<String>,
) -> Response {
    match service.get_user_items(&user) {
        Ok(items) => Json(items).into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn get_item(
    State(service): State<GuardedCollectionService>,
    Path((user, media_id)): Path<(String, i64)>,
) -> Response {
    match service.get_item(&user, media_id) {
        Ok(Some(item)) => Json(item).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn delete_item(
    State(service): State<GuardedCollectionService>,
    Path((user, media_id)): Path<(String, i64)>,
) -> Response {
    match service.delete_item(&user, media_id) {
        Ok(true) => StatusCode::OK.into_response(),
        Ok(false) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            debug!("Error deleting item {}: {}", media_id, err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Field edits respond 202: the write is committed after the debounce window.
async fn patch_rating(
    State(service): State<GuardedCollectionService>,
    Path((user, media_id)): Path<(String, i64)>,
    Json(body): Json<UpdateRatingBody>,
) -> Response {
    if body.rating > MAX_RATING {
        return StatusCode::BAD_REQUEST.into_response();
    }
    match service.get_item(&user, media_id) {
        Ok(Some(_)) => {}
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }

    service.set_rating_debounced(&user, media_id, body.rating);
    StatusCode::ACCEPTED.into_response()
}

async fn patch_dates(
    State(service): State<GuardedCollectionService>,
    Path((user, media_id)): Path<(String, i64)>,
    Json(body): Json<UpdateDatesBody>,
) -> Response {
    if body.start_date.is_none() && body.completion_date.is_none() {
        return StatusCode::BAD_REQUEST.into_response();
    }
    match service.get_item(&user, media_id) {
        Ok(Some(_)) => {}
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }

    service.set_dates_debounced(&user, media_id, body.start_date, body.completion_date);
    StatusCode::ACCEPTED.into_response()
}

async fn patch_note(
    State(service): State<GuardedCollectionService>,
    Path((user, media_id)): Path<(String, i64)>,
    Json(body): Json<UpdateNoteBody>,
) -> Response {
    match service.get_item(&user, media_id) {
        Ok(Some(_)) => {}
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }

    service.set_note_debounced(&user, media_id, body.note);
    StatusCode::ACCEPTED.into_response()
}

async fn get_stats(
    State(service): State<GuardedCollectionService>,
    Path(user): Path<String>,
) -> Response {
    match service.stats_overview(&user) {
        Ok(summary) => Json(summary).into_response(),
        Err(err) => {
            debug!("Error reading stats for {}: {}", user, err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_achievements(
    State(service): State<GuardedCollectionService>,
    Path(user): Path<String>,
) -> Response {
    match service.achievements_overview(&user) {
        Ok(achievements) => Json(achievements).into_response(),
        Err(err) => {
            debug!("Error reading achievements for {}: {}", user, err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub fn make_app(config: ServerConfig, service: GuardedCollectionService) -> Router {
    let state = ServerState {
        config,
        start_time: Instant::now(),
        service,
        hash: env!("GIT_HASH").to_string(),
    };

    let collection_routes: Router = Router::new()
        .route("/{user}/items", post(add_item).get(get_items))
        .route(
            "/{user}/items/{media_id}",
            get(get_item).delete(delete_item),
        )
        .route("/{user}/items/{media_id}/rating", patch(patch_rating))
        .route("/{user}/items/{media_id}/dates", patch(patch_dates))
        .route("/{user}/items/{media_id}/note", patch(patch_note))
        .with_state(state.clone());

    let user_routes: Router = Router::new()
        .route("/{user}/stats", get(get_stats))
        .route("/{user}/achievements", get(get_achievements))
        .with_state(state.clone());

    Router::new()
        .route("/", get(home))
        .with_state(state.clone())
        .nest("/v1/collection", collection_routes)
        .nest("/v1/user", user_routes)
        .layer(middleware::from_fn_with_state(state, log_requests))
}

pub async fn run_server(
    service: GuardedCollectionService,
    requests_logging_level: RequestsLoggingLevel,
    port: u16,
) -> Result<()> {
    let config = ServerConfig {
        port,
        requests_logging_level,
    };
    let app = make_app(config, service);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    Ok(axum::serve(listener, app).await?)
}
