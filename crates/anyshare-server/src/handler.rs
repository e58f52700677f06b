use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Multipart, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;

use anyshare_registry::{Fetched, RegistryError, RegistryResult};
use anyshare_types::ShareId;

use crate::error::{ServerError, ServerResult};
use crate::router::AppState;
use crate::ttl::resolve_ttl;

/// Query parameters carrying an optional TTL.
#[derive(Debug, Default, Deserialize)]
pub struct TtlParams {
    #[serde(alias = "expired_time")]
    pub ttl: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DownloadParams {
    pub id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TextParams {
    pub text: Option<String>,
    #[serde(alias = "expired_time")]
    pub ttl: Option<String>,
}

/// Body returned by the create endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct Created {
    pub id: String,
}

/// Upload a file as multipart form data.
pub async fn upload(
    State(state): State<AppState>,
    params: Result<Query<TtlParams>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ServerResult<Json<Created>> {
    let Query(params) = params?;
    let mut multipart = multipart?;
    let ttl = resolve_ttl(params.ttl.as_deref(), state.config.legacy_invalid_ttl)?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        let Some(file_name) = field.file_name().map(base_name) else {
            continue;
        };
        let bytes = field.bytes().await?;
        upload = Some((file_name, bytes));
        break;
    }
    let (display_name, bytes) = upload
        .ok_or_else(|| RegistryError::InvalidInput("upload has no file field".into()))?;

    let registry = state.registry.clone();
    let id = blocking(move || registry.create_from_upload(&bytes, &display_name, ttl)).await?;
    Ok(Json(Created { id: id.to_string() }))
}

/// Retrieve a file or text share.
pub async fn download(
    State(state): State<AppState>,
    params: Result<Query<DownloadParams>, QueryRejection>,
) -> ServerResult<Response> {
    let Query(params) = params?;
    let raw = params
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| RegistryError::InvalidInput("missing id".into()))?;
    // Anything that is not a well-formed id was never issued.
    let id = ShareId::new(raw.clone()).map_err(|_| RegistryError::NotFound(raw))?;

    let registry = state.registry.clone();
    match blocking(move || registry.fetch(&id)).await? {
        Fetched::Text(text) => {
            Ok(([(CONTENT_TYPE, "text/plain; charset=utf-8")], text).into_response())
        }
        Fetched::File {
            display_name,
            bytes,
        } => {
            let mut headers = HeaderMap::new();
            headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            );
            headers.insert(CONTENT_DISPOSITION, attachment(&display_name));
            Ok((headers, bytes).into_response())
        }
    }
}

/// Share a piece of text given in the query string.
pub async fn share_text(
    State(state): State<AppState>,
    params: Result<Query<TextParams>, QueryRejection>,
) -> ServerResult<Json<Created>> {
    let Query(params) = params?;
    let ttl = resolve_ttl(params.ttl.as_deref(), state.config.legacy_invalid_ttl)?;
    let text = params.text.unwrap_or_default();

    let registry = state.registry.clone();
    let id = blocking(move || registry.create_from_text(&text, ttl)).await?;
    Ok(Json(Created { id: id.to_string() }))
}

/// Health check handler.
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Info handler.
pub async fn info(State(state): State<AppState>) -> ServerResult<Json<serde_json::Value>> {
    let registry = state.registry.clone();
    let records = blocking(move || registry.len()).await?;
    let limits = state.registry.config();
    Ok(Json(json!({
        "name": "anyshare-server",
        "version": env!("CARGO_PKG_VERSION"),
        "records": records,
        "max_payload_bytes": limits.max_payload_bytes,
        "default_ttl_secs": limits.default_ttl_secs,
    })))
}

/// Run a registry call on the blocking pool; registry calls take locks and
/// do file I/O.
async fn blocking<T, F>(f: F) -> ServerResult<T>
where
    F: FnOnce() -> RegistryResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?
        .map_err(ServerError::from)
}

/// Strip any directory part a client sent along with the file name.
fn base_name(name: &str) -> String {
    name.rsplit(['/', '\\']).next().unwrap_or_default().to_string()
}

fn attachment(display_name: &str) -> HeaderValue {
    let safe: String = display_name
        .chars()
        .map(|c| match c {
            ' '..='~' if c != '"' && c != '\\' => c,
            _ => '_',
        })
        .collect();
    HeaderValue::from_str(&format!("attachment; filename=\"{safe}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}
