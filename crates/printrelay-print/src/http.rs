// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP print API.
//
//   GET  /printers   installed printer names, or `null` before a UI session
//   POST /print      run a batch; multipart, urlencoded or JSON body
//
// No authentication. CORS is open to any origin.

use std::fmt::Display;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, FromRequest, Multipart, Query, Request, State};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::Deserialize;
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use printrelay_core::types::{JobResult, PrintJob};

use crate::batch::BatchCoordinator;
use crate::session::SessionContext;

/// Largest accepted request body; inline documents travel in the body.
pub const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Shared state behind every route.
#[derive(Clone)]
pub struct HttpState {
    pub coordinator: Arc<BatchCoordinator>,
    pub session: Arc<SessionContext>,
}

/// Build the print API router.
pub fn router(state: HttpState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/printers", get(printers))
        .route("/print", post(print))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn printers(
    State(state): State<HttpState>,
) -> Result<Json<Option<Vec<String>>>, (StatusCode, String)> {
    let printers = state.session.printers().await.map_err(|e| {
        warn!(error = %e, "printer lookup failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    Ok(Json(printers))
}

#[derive(Debug, Default, Deserialize)]
struct PrintQuery {
    #[serde(default)]
    detailed: bool,
}

async fn print(
    State(state): State<HttpState>,
    Query(query): Query<PrintQuery>,
    request: PrintRequest,
) -> Response {
    let results = run_detached(Arc::clone(&state.coordinator), request.jobs).await;
    if query.detailed {
        Json(results).into_response()
    } else {
        let flags: Vec<bool> = results.iter().map(|r| r.success).collect();
        Json(flags).into_response()
    }
}

/// Run the parsed jobs on their own task and slot the results back into
/// request order. A dropped connection only loses the reply; the jobs still
/// print.
async fn run_detached(coordinator: Arc<BatchCoordinator>, entries: Vec<JobEntry>) -> Vec<JobResult> {
    let mut jobs = Vec::with_capacity(entries.len());
    let mut slots = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry {
            Ok(job) => {
                jobs.push(job);
                slots.push(None);
            }
            Err(message) => slots.push(Some(JobResult::failed(message))),
        }
    }

    let pending = jobs.len();
    let printed = match tokio::spawn(async move { coordinator.run(&jobs).await }).await {
        Ok(results) => results,
        Err(e) => {
            warn!(error = %e, "print batch task failed");
            vec![JobResult::failed(format!("print task failed: {e}")); pending]
        }
    };

    let mut printed = printed.into_iter();
    slots
        .into_iter()
        .map(|slot| match slot {
            Some(rejected) => rejected,
            None => printed
                .next()
                .unwrap_or_else(|| JobResult::failed("print result missing")),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Request body
// ---------------------------------------------------------------------------

/// One entry of the `jobs` array: a job, or why it could not be read.
pub type JobEntry = std::result::Result<PrintJob, String>;

/// A decoded `POST /print` body.
#[derive(Debug)]
pub struct PrintRequest {
    pub jobs: Vec<JobEntry>,
}

#[derive(Debug, Deserialize)]
struct EncodedBody {
    #[serde(default)]
    session_id: Option<String>,
    jobs: String,
}

#[derive(Debug, Deserialize)]
struct JsonBody {
    #[serde(default)]
    session_id: Option<String>,
    jobs: Value,
}

fn bad_request(e: impl Display) -> (StatusCode, String) {
    debug!(error = %e, "rejected print request");
    (StatusCode::BAD_REQUEST, e.to_string())
}

fn parse_jobs(encoded: &str) -> Result<Vec<JobEntry>, (StatusCode, String)> {
    let values: Vec<Value> =
        serde_json::from_str(encoded).map_err(|e| bad_request(format!("invalid jobs: {e}")))?;
    Ok(job_entries(values))
}

/// Read each job on its own so one bad entry cannot sink its siblings.
fn job_entries(values: Vec<Value>) -> Vec<JobEntry> {
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            serde_json::from_value(value).map_err(|e| {
                warn!(index, error = %e, "unreadable print job");
                format!("invalid job {index}: {e}")
            })
        })
        .collect()
}

impl PrintRequest {
    /// Attach the batch-wide document to every job that has none of its own.
    fn new(session_id: Option<String>, mut jobs: Vec<JobEntry>) -> Self {
        if let Some(content) = session_id.filter(|s| !s.trim().is_empty()) {
            let parsed = jobs.iter_mut().filter_map(|entry| entry.as_mut().ok());
            for job in parsed.filter(|j| j.inline_content.is_none()) {
                job.inline_content = Some(content.clone());
            }
        }
        Self { jobs }
    }

    async fn from_multipart(mut multipart: Multipart) -> Result<Self, (StatusCode, String)> {
        let mut session_id = None;
        let mut jobs = None;
        while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
            let name = field.name().unwrap_or_default().to_owned();
            match name.as_str() {
                "session_id" => session_id = Some(field.text().await.map_err(bad_request)?),
                "jobs" => jobs = Some(field.text().await.map_err(bad_request)?),
                _ => debug!(field = %name, "ignoring unknown form field"),
            }
        }
        let jobs = jobs.ok_or_else(|| bad_request("missing jobs field"))?;
        Ok(Self::new(session_id, parse_jobs(&jobs)?))
    }
}

impl<S: Send + Sync> FromRequest<S> for PrintRequest {
    type Rejection = (StatusCode, String);

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state).await.map_err(bad_request)?;
            Self::from_multipart(multipart).await
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(body) = Form::<EncodedBody>::from_request(req, state)
                .await
                .map_err(bad_request)?;
            Ok(Self::new(body.session_id, parse_jobs(&body.jobs)?))
        } else if content_type.starts_with("application/json") {
            let Json(body) = Json::<JsonBody>::from_request(req, state)
                .await
                .map_err(bad_request)?;
            let jobs = match body.jobs {
                Value::Array(values) => job_entries(values),
                Value::String(encoded) => parse_jobs(&encoded)?,
                _ => return Err(bad_request("jobs must be an array or a JSON-encoded array")),
            };
            Ok(Self::new(body.session_id, jobs))
        } else {
            Err(bad_request(format!("unsupported content type '{content_type}'")))
        }
    }
}
