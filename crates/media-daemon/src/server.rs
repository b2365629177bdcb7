use std::{env, net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use media_store::{ProviderKind, StorageError, StorageSettings, StorageState};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use utoipa::{OpenApi, ToSchema};

pub async fn run() -> Result<()> {
    let config = AppConfig::from_env()?;

    let storage = StorageState::initialize(&config.storage).await;

    let state = Arc::new(AppState {
        storage,
        settings: config.storage,
        version: config.version,
        environment: config.environment,
    });

    let app = build_router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .context("failed to bind listen socket")?;

    info!(addr = %config.listen_addr, "media-daemon listening");
    axum::serve(listener, app)
        .await
        .context("HTTP server exited")?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/upload", post(upload))
        .route("/files", get(list_files))
        .route("/download/:filename", get(download))
        .route("/info", get(service_info))
        .with_state(state)
}

struct AppState {
    storage: StorageState,
    settings: StorageSettings,
    version: String,
    environment: String,
}

#[derive(Debug, Clone)]
struct AppConfig {
    listen_addr: SocketAddr,
    version: String,
    environment: String,
    storage: StorageSettings,
}

impl AppConfig {
    fn from_env() -> Result<Self> {
        let listen_addr = env::var("MEDIA_API_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .context("invalid MEDIA_API_ADDR")?;

        let version = env::var("APP_VERSION").unwrap_or_else(|_| "1.0.0".to_string());
        let environment = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        Ok(Self {
            listen_addr,
            version,
            environment,
            storage: StorageSettings::from_env(),
        })
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service health and storage diagnostics", body = HealthResponse))
)]
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        storage: StorageHealth {
            configured: state.storage.is_ready(),
            provider: state.storage.provider().map(str::to_string),
            endpoint: state.settings.endpoint.clone(),
        },
    })
}

#[utoipa::path(
    get,
    path = "/ready",
    responses(
        (status = 200, description = "Storage is configured and the service accepts traffic", body = ReadyResponse),
        (status = 503, description = "Storage is not configured", body = ReadyResponse)
    )
)]
async fn ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.storage.is_ready() {
        (
            StatusCode::OK,
            Json(ReadyResponse {
                status: "ready".to_string(),
                reason: None,
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyResponse {
                status: "not ready".to_string(),
                reason: Some("storage not configured".to_string()),
            }),
        )
    }
}

#[utoipa::path(
    post,
    path = "/upload",
    responses(
        (status = 200, description = "Object stored", body = UploadResponse),
        (status = 400, description = "Missing file field or empty filename", body = ErrorBody),
        (status = 503, description = "Storage is not configured", body = ErrorBody)
    )
)]
async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let store = state.storage.store()?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request(format!("invalid multipart body: {err}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Err(ApiError::bad_request("empty filename")),
        };

        let content = field
            .bytes()
            .await
            .map_err(|err| ApiError::bad_request(format!("failed to read file field: {err}")))?;

        let url = store.upload(&filename, content.to_vec()).await?;
        return Ok(Json(UploadResponse {
            success: true,
            filename,
            url,
            provider: store.provider().to_string(),
        }));
    }

    Err(ApiError::bad_request("no file provided"))
}

#[utoipa::path(
    get,
    path = "/files",
    responses(
        (status = 200, description = "All object keys in the store", body = FilesResponse),
        (status = 503, description = "Storage is not configured", body = ErrorBody)
    )
)]
async fn list_files(State(state): State<Arc<AppState>>) -> Result<Json<FilesResponse>, ApiError> {
    let store = state.storage.store()?;
    let files = store.list().await?;

    Ok(Json(FilesResponse {
        count: files.len(),
        files,
        provider: store.provider().to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/download/{filename}",
    params(("filename" = String, Path, description = "Object key to fetch")),
    responses(
        (status = 200, description = "Object content", body = Vec<u8>, content_type = "application/octet-stream"),
        (status = 404, description = "Object not found", body = ErrorBody),
        (status = 503, description = "Storage is not configured", body = ErrorBody)
    )
)]
async fn download(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let store = state.storage.store()?;
    let content = store.download(&filename).await?;

    let headers = [
        (header::CONTENT_TYPE, "application/octet-stream".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={filename}"),
        ),
    ];
    Ok((headers, content).into_response())
}

#[utoipa::path(
    get,
    path = "/info",
    responses((status = 200, description = "Service and storage configuration", body = InfoResponse))
)]
async fn service_info(State(state): State<Arc<AppState>>) -> Json<InfoResponse> {
    // Region only means something for the S3 family.
    let region = match ProviderKind::detect(&state.settings) {
        ProviderKind::S3 => state.settings.region.clone(),
        _ => None,
    };

    Json(InfoResponse {
        app: "media-daemon".to_string(),
        version: state.version.clone(),
        environment: state.environment.clone(),
        storage: StorageInfo {
            provider: state.storage.provider().map(str::to_string),
            endpoint: state.settings.endpoint.clone(),
            name: state.settings.store_name.clone(),
            region,
        },
    })
}

#[derive(Debug, Serialize, ToSchema)]
struct HealthResponse {
    status: String,
    storage: StorageHealth,
}

#[derive(Debug, Serialize, ToSchema)]
struct StorageHealth {
    configured: bool,
    provider: Option<String>,
    endpoint: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
struct ReadyResponse {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
struct UploadResponse {
    success: bool,
    filename: String,
    url: String,
    provider: String,
}

#[derive(Debug, Serialize, ToSchema)]
struct FilesResponse {
    files: Vec<String>,
    count: usize,
    provider: String,
}

#[derive(Debug, Serialize, ToSchema)]
struct InfoResponse {
    app: String,
    version: String,
    environment: String,
    storage: StorageInfo,
}

#[derive(Debug, Serialize, ToSchema)]
struct StorageInfo {
    provider: Option<String>,
    endpoint: Option<String>,
    name: Option<String>,
    region: Option<String>,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn internal<E: std::fmt::Display>(err: E) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match &err {
            StorageError::NotConfigured(_) => {
                ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "storage not configured")
            }
            StorageError::NotFound(_) => ApiError::new(StatusCode::NOT_FOUND, err.to_string()),
            StorageError::Upload { .. } | StorageError::Download { .. } | StorageError::List(_) => {
                ApiError::internal(err)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(status = %self.status, message = %self.message, "api error");
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

#[derive(Debug, Serialize, ToSchema)]
struct ErrorBody {
    error: String,
}

pub mod docs {
    use super::*;

    #[derive(OpenApi)]
    #[openapi(
        info(title = "Media Daemon API", version = "0.1.0"),
        paths(health, ready, upload, list_files, download, service_info),
        components(schemas(
            HealthResponse,
            StorageHealth,
            ReadyResponse,
            UploadResponse,
            FilesResponse,
            InfoResponse,
            StorageInfo,
            ErrorBody
        ))
    )]
    pub struct ApiDoc;
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use media_store::{MediaStore, MemoryBackend};
    use serde_json::Value;
    use tower::Service;

    fn ready_state() -> Arc<AppState> {
        let store = MediaStore::with_backend(Arc::new(MemoryBackend::new()));
        Arc::new(AppState {
            storage: StorageState::Ready(Arc::new(store)),
            settings: StorageSettings {
                endpoint: Some("https://acct.blob.core.windows.net".to_string()),
                store_name: Some("acct".to_string()),
                region: Some("us-east-1".to_string()),
                access_key: Some("k".to_string()),
            },
            version: "1.0.0".to_string(),
            environment: "test".to_string(),
        })
    }

    fn unconfigured_state() -> Arc<AppState> {
        Arc::new(AppState {
            storage: StorageState::Unconfigured {
                reason: "no storage provider resolved".to_string(),
            },
            settings: StorageSettings::default(),
            version: "1.0.0".to_string(),
            environment: "test".to_string(),
        })
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .expect("request")
    }

    fn multipart_request(field_name: &str, filename: &str, content: &[u8]) -> Request<Body> {
        let boundary = "media-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; \
                 name=\"{field_name}\"; filename=\"{filename}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .expect("request")
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn health_reports_configured_storage() {
        let mut router = build_router(ready_state());

        let response = router.call(get_request("/health")).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["storage"]["configured"], true);
        assert_eq!(body["storage"]["provider"], "In-Memory");
        assert_eq!(
            body["storage"]["endpoint"],
            "https://acct.blob.core.windows.net"
        );
    }

    #[tokio::test]
    async fn health_stays_healthy_without_storage() {
        let mut router = build_router(unconfigured_state());

        let response = router.call(get_request("/health")).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["storage"]["configured"], false);
        assert_eq!(body["storage"]["provider"], Value::Null);
    }

    #[tokio::test]
    async fn readiness_follows_storage_state() {
        let mut router = build_router(unconfigured_state());
        let response = router.call(get_request("/ready")).await.expect("response");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = json_body(response).await;
        assert_eq!(body["status"], "not ready");
        assert_eq!(body["reason"], "storage not configured");

        let mut router = build_router(ready_state());
        let response = router.call(get_request("/ready")).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ready");
    }

    #[tokio::test]
    async fn upload_download_list_flow() {
        let mut router = build_router(ready_state());

        let response = router
            .call(multipart_request("file", "hello.txt", b"hi"))
            .await
            .expect("upload response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["filename"], "hello.txt");
        assert_eq!(body["url"], "mem://hello.txt");
        assert_eq!(body["provider"], "In-Memory");

        let response = router
            .call(get_request("/download/hello.txt"))
            .await
            .expect("download response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
            Some("application/octet-stream")
        );
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("download body");
        assert_eq!(&bytes[..], b"hi");

        let response = router.call(get_request("/files")).await.expect("files");
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["files"], serde_json::json!(["hello.txt"]));
    }

    #[tokio::test]
    async fn upload_without_file_field_is_rejected() {
        let mut router = build_router(ready_state());

        let response = router
            .call(multipart_request("attachment", "hello.txt", b"hi"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "no file provided");
    }

    #[tokio::test]
    async fn upload_with_empty_filename_is_rejected() {
        let mut router = build_router(ready_state());

        let response = router
            .call(multipart_request("file", "", b"hi"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "empty filename");
    }

    #[tokio::test]
    async fn storage_operations_return_503_when_unconfigured() {
        let mut router = build_router(unconfigured_state());

        for request in [
            multipart_request("file", "hello.txt", b"hi"),
            get_request("/files"),
            get_request("/download/hello.txt"),
        ] {
            let response = router.call(request).await.expect("response");
            assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
            let body = json_body(response).await;
            assert_eq!(body["error"], "storage not configured");
        }
    }

    #[tokio::test]
    async fn download_of_missing_object_is_404() {
        let mut router = build_router(ready_state());

        let response = router
            .call(get_request("/download/ghost.bin"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn info_reports_region_only_for_s3() {
        let mut router = build_router(ready_state());
        let response = router.call(get_request("/info")).await.expect("response");
        let body = json_body(response).await;
        assert_eq!(body["app"], "media-daemon");
        // Endpoint resolves to the blob provider, so region must be absent.
        assert_eq!(body["storage"]["region"], Value::Null);
        assert_eq!(body["storage"]["name"], "acct");
    }
}
