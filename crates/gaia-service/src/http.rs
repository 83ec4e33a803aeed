//! HTTP surface: `POST /event`, `GET /health`, `GET /status`, `GET /metrics`.
//! Engine reset is intentionally not routed.

use futures::{pin_mut, Stream, StreamExt};
use gaia_core::{Sample, ScoringEngine};
use gaia_prometheus_bridge::GaiaMetrics;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, warn};
use warp::http::StatusCode;
use warp::hyper::body::Buf;
use warp::reject::Reject;
use warp::reply::{Json, WithStatus};
use warp::{Filter, Rejection, Reply};

pub const MAX_BODY_BYTES: u64 = 16 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ScoringEngine>,
    pub metrics: Arc<GaiaMetrics>,
}

impl AppState {
    pub fn new(engine: Arc<ScoringEngine>, metrics: Arc<GaiaMetrics>) -> Self {
        Self { engine, metrics }
    }
}

#[derive(Debug)]
struct BodyTooLarge(u64);

impl Reject for BodyTooLarge {}

#[derive(Debug)]
struct BodyUnreadable(String);

impl Reject for BodyUnreadable {}

pub fn routes(
    state: AppState,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let event = warp::path("event")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::query::<Sample>())
        .and(body_limit())
        .and(warp::body::stream().and_then(collect_limited))
        .and(with_state(state.clone()))
        .and_then(handle_event);

    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handle_health);

    let status = warp::path("status")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handle_status);

    let metrics = warp::path("metrics")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state))
        .and_then(handle_metrics);

    event
        .or(health)
        .or(status)
        .or(metrics)
        .recover(handle_rejection)
}

fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

// Bodies are optional on /event, so a missing Content-Length is allowed. This
// only fails fast on a declared length; `collect_limited` enforces the cap on
// chunked bodies.
fn body_limit() -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::header::optional::<u64>("content-length")
        .and_then(|length: Option<u64>| async move {
            match length {
                Some(n) if n > MAX_BODY_BYTES => Err(warp::reject::custom(BodyTooLarge(n))),
                _ => Ok(()),
            }
        })
        .untuple_one()
}

async fn collect_limited<S, B>(body: S) -> Result<Vec<u8>, Rejection>
where
    S: Stream<Item = Result<B, warp::Error>> + Send,
    B: Buf + Send,
{
    pin_mut!(body);
    let mut collected = Vec::new();
    while let Some(chunk) = body.next().await {
        let mut chunk =
            chunk.map_err(|e| warp::reject::custom(BodyUnreadable(e.to_string())))?;
        let total = (collected.len() + chunk.remaining()) as u64;
        if total > MAX_BODY_BYTES {
            return Err(warp::reject::custom(BodyTooLarge(total)));
        }
        while chunk.has_remaining() {
            let part = chunk.chunk();
            let n = part.len();
            collected.extend_from_slice(part);
            chunk.advance(n);
        }
    }
    Ok(collected)
}

async fn handle_event(
    query: Sample,
    body: Vec<u8>,
    state: AppState,
) -> Result<WithStatus<Json>, Infallible> {
    let sample = if body.iter().all(u8::is_ascii_whitespace) {
        query
    } else {
        match serde_json::from_slice::<Sample>(&body) {
            Ok(from_body) => from_body.or(query),
            Err(e) => {
                warn!(error = %e, "rejected event body");
                return Ok(error_reply(
                    StatusCode::BAD_REQUEST,
                    format!("invalid JSON: {e}"),
                ));
            }
        }
    };

    let result = state.engine.process_event(&sample);
    state.metrics.observe_event(&result, &state.engine.status());
    debug!(
        cycle = result.cycle,
        threat = result.threat_level,
        latency_ms = result.latency_ms,
        "event processed"
    );

    Ok(warp::reply::with_status(
        warp::reply::json(&result),
        StatusCode::OK,
    ))
}

async fn handle_health(state: AppState) -> Result<Json, Infallible> {
    let cycles = state.engine.status().cycle_count;
    Ok(warp::reply::json(&json!({ "status": "ok", "cycles": cycles })))
}

async fn handle_status(state: AppState) -> Result<Json, Infallible> {
    let status = state.engine.status();
    state.metrics.observe_status(&status);
    Ok(warp::reply::json(&status))
}

async fn handle_metrics(state: AppState) -> Result<impl Reply, Infallible> {
    state.metrics.observe_status(&state.engine.status());
    let (code, content_type, body) = match state.metrics.snapshot() {
        Ok(text) => (StatusCode::OK, state.metrics.content_type(), text),
        Err(e) => {
            warn!(error = %e, "metrics snapshot failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "text/plain; charset=utf-8".to_string(),
                e.to_string(),
            )
        }
    };
    Ok(warp::reply::with_status(
        warp::reply::with_header(body, "content-type", content_type),
        code,
    ))
}

fn error_reply(code: StatusCode, message: String) -> WithStatus<Json> {
    warp::reply::with_status(warp::reply::json(&json!({ "error": message })), code)
}

async fn handle_rejection(err: Rejection) -> Result<WithStatus<Json>, Infallible> {
    let (code, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "not found".to_string())
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if let Some(BodyTooLarge(n)) = err.find::<BodyTooLarge>() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("body of at least {n} bytes exceeds {MAX_BODY_BYTES}"),
        )
    } else if let Some(BodyUnreadable(e)) = err.find::<BodyUnreadable>() {
        (StatusCode::BAD_REQUEST, format!("unreadable body: {e}"))
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_string())
    } else {
        warn!(?err, "unhandled rejection");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal error".to_string(),
        )
    };
    Ok(error_reply(code, message))
}
