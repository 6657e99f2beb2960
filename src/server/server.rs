use anyhow::{Context, Result};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::catalog::{ValidationError, ValidationStats};
use crate::channel::ProtocolError;
use crate::playback::{
    ControllerMode, DisplayLine, NowPlaying, QueueEntry, QueueError, SharedController,
};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{log_requests, state::*, widget_bridge::player_ws_handler};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub player_page_connected: bool,
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
struct SongsQuery {
    pub artist: Option<String>,
}

#[derive(Deserialize, Debug)]
struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Either a bare catalog id, or a full entry when `title` or `artist` is
/// given.
#[derive(Deserialize, Debug)]
struct EnqueueBody {
    pub id: String,
    pub title: Option<String>,
    pub artist: Option<String>,
}

#[derive(Serialize)]
struct EnqueueResponse {
    started_playback: bool,
    queue: Vec<QueueEntry>,
}

#[derive(Serialize)]
struct NowPlayingResponse<'a> {
    now_playing: Option<&'a NowPlaying>,
    is_from_queue: bool,
    #[serde(flatten)]
    mode: &'a ControllerMode,
    display: Option<&'a DisplayLine>,
    queue_length: usize,
}

#[derive(Serialize)]
struct ValidationResponse {
    artists: usize,
    songs: usize,
    stats: ValidationStats,
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        player_page_connected: state.widget_bridge.is_connected(),
    };
    Json(stats)
}

async fn get_artists(State(controller): State<SharedController>) -> Response {
    let catalog = controller.lock().await.catalog();
    Json(catalog.artists()).into_response()
}

async fn get_songs(
    State(controller): State<SharedController>,
    Query(query): Query<SongsQuery>,
) -> Response {
    let catalog = controller.lock().await.catalog();
    match query.artist {
        Some(mbid) => {
            if catalog.get_artist(&mbid).is_none() {
                return StatusCode::NOT_FOUND.into_response();
            }
            Json(catalog.songs_by_artist(&mbid)).into_response()
        }
        None => Json(catalog.songs()).into_response(),
    }
}

async fn search(
    State(controller): State<SharedController>,
    Query(query): Query<SearchQuery>,
) -> Response {
    let catalog = controller.lock().await.catalog();
    Json(catalog.search(&query.q)).into_response()
}

async fn post_queue(
    State(controller): State<SharedController>,
    Json(body): Json<EnqueueBody>,
) -> Response {
    let mut controller = controller.lock().await;
    let result = if body.title.is_some() || body.artist.is_some() {
        QueueEntry::new(&body.id, body.title.as_deref(), body.artist.as_deref())
            .and_then(|entry| controller.enqueue(entry))
    } else {
        controller.enqueue_song(&body.id)
    };

    match result {
        Ok(started_playback) => Json(EnqueueResponse {
            started_playback,
            queue: controller.queue(),
        })
        .into_response(),
        Err(QueueError::InvalidEntry(reason)) => {
            (StatusCode::BAD_REQUEST, reason).into_response()
        }
        Err(QueueError::UnknownSong(_)) => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn get_queue(State(controller): State<SharedController>) -> Response {
    Json(controller.lock().await.queue()).into_response()
}

async fn get_now_playing(State(controller): State<SharedController>) -> Response {
    let controller = controller.lock().await;
    let state = controller.playback_state();
    Json(NowPlayingResponse {
        now_playing: state.now_playing.as_ref(),
        is_from_queue: state.is_from_queue,
        mode: controller.mode(),
        display: controller.display(),
        queue_length: controller.queue().len(),
    })
    .into_response()
}

fn protocol_error_response(err: ProtocolError) -> Response {
    match err {
        ProtocolError::LinkClosed => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        other => {
            error!("Failed to send command: {}", other);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn post_skip(State(controller): State<SharedController>) -> Response {
    match controller.lock().await.skip() {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => protocol_error_response(err),
    }
}

async fn post_stop(State(controller): State<SharedController>) -> Response {
    match controller.lock().await.stop() {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => protocol_error_response(err),
    }
}

async fn post_validate(
    State(revalidator): State<GuardedRevalidator>,
    State(controller): State<SharedController>,
) -> Response {
    match revalidator.run().await {
        Ok((catalog, stats)) => {
            let response = ValidationResponse {
                artists: catalog.get_artists_count(),
                songs: catalog.get_songs_count(),
                stats,
            };
            controller.lock().await.replace_catalog(catalog);
            Json(response).into_response()
        }
        Err(ValidationError::AlreadyRunning) => {
            warn!("Validation requested while already running");
            StatusCode::CONFLICT.into_response()
        }
        Err(err) => {
            error!("Validation failed: {}", err);
            (StatusCode::SERVICE_UNAVAILABLE, err.to_string()).into_response()
        }
    }
}

pub fn make_app(state: ServerState) -> Result<Router> {
    let catalog_routes: Router = Router::new()
        .route("/artists", get(get_artists))
        .route("/songs", get(get_songs))
        .route("/search", get(search))
        .with_state(state.clone());

    let playback_routes: Router = Router::new()
        .route("/queue", get(get_queue))
        .route("/queue", post(post_queue))
        .route("/now-playing", get(get_now_playing))
        .route("/skip", post(post_skip))
        .route("/stop", post(post_stop))
        .with_state(state.clone());

    let admin_routes: Router = Router::new()
        .route("/validate", post(post_validate))
        .with_state(state.clone());

    let player_routes: Router = Router::new()
        .route("/ws", get(player_ws_handler))
        .with_state(state.clone());

    let home_router: Router = Router::new()
        .route("/", get(home))
        .with_state(state.clone());

    let app: Router = home_router
        .nest("/v1", catalog_routes.merge(playback_routes))
        .nest("/v1/admin", admin_routes)
        .nest("/v1/player", player_routes)
        .layer(middleware::from_fn_with_state(state.clone(), log_requests));

    Ok(app)
}

pub async fn run_server(state: ServerState, shutdown: CancellationToken) -> Result<()> {
    let port = state.config.port;
    let app = make_app(state)?;

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;

    info!("Ready to serve at port {}!", port);
    Ok(axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?)
}
