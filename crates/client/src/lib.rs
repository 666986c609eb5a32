//! # Registro Client
//!
//! HTTP implementation of [`RegistryApi`] over `reqwest`.
//!
//! All endpoints are joined onto the API base resolved at start-up (see
//! [`registro_core::config::resolve_api_base`]). Failures are classified into [`ApiError`]:
//! a request that never got a response is `Transport`; a non-2xx response is classified by
//! status with the backend's `error` message extracted from the body; an undecodable 2xx body
//! is `Decode`.

use registro_core::config::{request_timeout_from_env_value, resolve_api_base};
use registro_core::{ApiError, ApiResult, ClientConfig, ConfigError, RegistryApi};
use registro_types::{
    ExportFormat, HealthStatus, ListQuery, PatientId, PatientPage, PatientPayload, PatientRecord,
    StatsSnapshot,
};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tokio::io::{AsyncWrite, AsyncWriteExt};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to build HTTP client: {0}")]
    Build(reqwest::Error),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("failed to write export: {0}")]
    Write(#[from] std::io::Error),
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

pub const API_BASE_ENV: &str = "REGISTRO_API_BASE";
pub const HOST_ENV: &str = "REGISTRO_HOST";
pub const ORIGIN_ENV: &str = "REGISTRO_ORIGIN";
pub const TIMEOUT_ENV: &str = "REGISTRO_TIMEOUT_SECS";

/// Resolves the client configuration from the process environment.
///
/// # Arguments
/// * `api_base` - Explicit base URL (e.g. from a command-line flag); takes priority over
///   `REGISTRO_API_BASE`
///
/// # Errors
/// Returns a [`ConfigError`] if the resolved base is not an http(s) URL or the timeout is not a
/// positive number of seconds.
pub fn config_from_env(api_base: Option<String>) -> Result<ClientConfig, ConfigError> {
    let base = resolve_api_base(
        api_base.or_else(|| std::env::var(API_BASE_ENV).ok()),
        std::env::var(HOST_ENV).ok(),
        std::env::var(ORIGIN_ENV).ok(),
    );
    let timeout = request_timeout_from_env_value(std::env::var(TIMEOUT_ENV).ok())?;
    Ok(ClientConfig::new(base)?.with_request_timeout(timeout))
}

/// Registry backend reached over HTTP.
#[derive(Clone, Debug)]
pub struct HttpRegistryClient {
    http: Client,
    config: ClientConfig,
}

impl HttpRegistryClient {
    /// Creates a client for `config.api_base()` with the configured request timeout.
    ///
    /// # Errors
    /// Returns [`ClientError::Build`] if the TLS backend cannot be initialised.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(ClientError::Build)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Backend liveness check.
    pub async fn health(&self) -> ApiResult<HealthStatus> {
        self.fetch_json(self.http.get(self.config.endpoint("health")))
            .await
    }

    /// Downloads an export and copies its bytes, uninterpreted, into `writer`.
    ///
    /// # Returns
    /// The number of bytes written.
    ///
    /// # Errors
    /// Returns [`ClientError::Api`] if the request fails and [`ClientError::Write`] if `writer`
    /// does.
    pub async fn download_export<W>(&self, format: ExportFormat, writer: &mut W) -> ClientResult<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let url = self.config.export_url(format);
        let mut response = self.send(self.http.get(&url)).await?;

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await.map_err(transport)? {
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        writer.flush().await?;

        tracing::info!(%format, bytes = written, "export downloaded");
        Ok(written)
    }

    /// Sends `request`, turning transport failures and non-2xx statuses into [`ApiError`].
    async fn send(&self, request: RequestBuilder) -> ApiResult<Response> {
        let request = request.build().map_err(transport)?;
        let method = request.method().clone();
        let url = request.url().clone();
        tracing::debug!(%method, %url, "registry request");

        let response = self.http.execute(request).await.map_err(transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = ApiError::from_status(status.as_u16(), &body);
        tracing::warn!(%method, %url, status = status.as_u16(), error = %err, "registry request failed");
        Err(err)
    }

    async fn fetch_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = self.send(request).await?;
        let bytes = response.bytes().await.map_err(transport)?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn patient_url(&self, id: PatientId) -> String {
        self.config.endpoint(&format!("patients/{id}"))
    }
}

fn transport(err: reqwest::Error) -> ApiError {
    ApiError::Transport(err.to_string())
}

impl RegistryApi for HttpRegistryClient {
    async fn list_patients(&self, query: &ListQuery) -> ApiResult<PatientPage> {
        let request = self
            .http
            .get(self.config.endpoint("patients"))
            .query(&query.to_pairs());
        self.fetch_json(request).await
    }

    async fn get_patient(&self, id: PatientId) -> ApiResult<PatientRecord> {
        self.fetch_json(self.http.get(self.patient_url(id))).await
    }

    async fn create_patient(&self, payload: &PatientPayload) -> ApiResult<()> {
        let request = self.http.post(self.config.endpoint("patients")).json(payload);
        self.send(request).await.map(drop)
    }

    async fn update_patient(&self, id: PatientId, payload: &PatientPayload) -> ApiResult<()> {
        let request = self.http.put(self.patient_url(id)).json(payload);
        self.send(request).await.map(drop)
    }

    async fn delete_patient(&self, id: PatientId) -> ApiResult<()> {
        self.send(self.http.delete(self.patient_url(id)))
            .await
            .map(drop)
    }

    async fn stats(&self) -> ApiResult<StatsSnapshot> {
        self.fetch_json(self.http.get(self.config.endpoint("stats")))
            .await
    }

    fn export_url(&self, format: ExportFormat) -> String {
        self.config.export_url(format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Path, Query, State},
        http::StatusCode,
        response::{IntoResponse, Json},
        routing::get,
        Router,
    };
    use serde_json::{json, Value};
    use std::collections::{BTreeSet, HashMap};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Backend {
        last_query: Arc<Mutex<HashMap<String, String>>>,
        created: Arc<Mutex<Vec<Value>>>,
        deleted: Arc<Mutex<BTreeSet<i64>>>,
    }

    async fn list(
        State(backend): State<Backend>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Json<Value> {
        *backend.last_query.lock().expect("query lock") = params;
        Json(json!({
            "items": [
                {"id": 1, "name": "Ana", "has_hypertension": 1, "smoker": 0, "age": 52},
                {"id": 2, "name": "Bea", "has_hypertension": false, "glucose_mgdl": "n/a"}
            ],
            "page": 1,
            "pages": 1,
            "total": 2,
            "page_size": 10
        }))
    }

    async fn create(State(backend): State<Backend>, Json(body): Json<Value>) -> impl IntoResponse {
        if body.get("glucose_mgdl").is_some_and(Value::is_string) {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "glucose_mgdl must be numeric"})),
            );
        }
        backend.created.lock().expect("created lock").push(body);
        (StatusCode::CREATED, Json(json!({"id": 3})))
    }

    async fn show(Path(id): Path<i64>) -> impl IntoResponse {
        if id == 7 {
            (StatusCode::OK, Json(json!({"id": 7, "name": "Eva"})))
        } else {
            (StatusCode::NOT_FOUND, Json(json!({"error": "Paciente no encontrado"})))
        }
    }

    async fn update(Path(_id): Path<i64>, Json(_body): Json<Value>) -> Json<Value> {
        Json(json!({"ok": true}))
    }

    async fn remove(State(backend): State<Backend>, Path(id): Path<i64>) -> impl IntoResponse {
        if backend.deleted.lock().expect("deleted lock").insert(id) {
            (StatusCode::OK, Json(json!({"ok": true})))
        } else {
            (StatusCode::NOT_FOUND, Json(json!({"error": "Paciente no encontrado"})))
        }
    }

    async fn stats() -> Json<Value> {
        Json(json!({
            "total": 5,
            "with_hypertension": 2,
            "with_obesity": 1,
            "by_risk": {"moderado": 3, "bajo": 1, "alto (hipoglucemia)": 1}
        }))
    }

    async fn export(Path(fmt): Path<String>) -> impl IntoResponse {
        match fmt.as_str() {
            "csv" => (StatusCode::OK, "id,name\n1,Ana\n".to_string()),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, String::new()),
        }
    }

    async fn health() -> Json<Value> {
        Json(json!({"status": "ok", "time": "2024-05-01T10:00:00Z"}))
    }

    /// Serves `routes` under `/api` on an ephemeral port and returns the API base URL.
    async fn serve(routes: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener addr");
        let app = Router::new().nest("/api", routes);
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("test server");
        });
        format!("http://{addr}/api")
    }

    async fn backend() -> (HttpRegistryClient, Backend) {
        let backend = Backend::default();
        let routes = Router::new()
            .route("/patients", get(list).post(create))
            .route("/patients/:id", get(show).put(update).delete(remove))
            .route("/stats", get(stats))
            .route("/export/:fmt", get(export))
            .route("/health", get(health))
            .with_state(backend.clone());
        let base = serve(routes).await;
        let config = ClientConfig::new(base).expect("valid base");
        let client = HttpRegistryClient::new(config).expect("client builds");
        (client, backend)
    }

    #[tokio::test]
    async fn test_list_sends_filters_and_decodes_loose_flags() {
        let (client, backend) = backend().await;
        let query = ListQuery {
            page: 2,
            page_size: 25,
            filters: registro_types::PatientFilters::from_inputs("alto", "  "),
        };

        let page = client.list_patients(&query).await.expect("list succeeds");

        let sent = backend.last_query.lock().expect("query lock").clone();
        assert_eq!(sent.get("page").map(String::as_str), Some("2"));
        assert_eq!(sent.get("page_size").map(String::as_str), Some("25"));
        assert_eq!(sent.get("risk").map(String::as_str), Some("alto"));
        assert!(!sent.contains_key("name"));

        assert_eq!(page.total, 2);
        assert!(page.items[0].has_hypertension);
        assert!(!page.items[0].smoker);
        assert_eq!(page.items[0].age, Some(52));
        assert_eq!(page.items[1].glucose_mgdl, None);
    }

    #[tokio::test]
    async fn test_create_validation_message_is_extracted() {
        let (client, backend) = backend().await;
        let mut payload = PatientPayload::new();
        payload.insert("glucose_mgdl", "abc");

        let err = client
            .create_patient(&payload)
            .await
            .expect_err("backend rejects text glucose");

        assert_eq!(
            err,
            ApiError::Validation {
                status: 400,
                message: "glucose_mgdl must be numeric".into()
            }
        );
        assert!(backend.created.lock().expect("created lock").is_empty());
    }

    #[tokio::test]
    async fn test_create_sends_json_body() {
        let (client, backend) = backend().await;
        let mut payload = PatientPayload::new();
        payload.insert("name", "Ana");
        payload.insert("glucose_mgdl", 140);

        client.create_patient(&payload).await.expect("create succeeds");

        let created = backend.created.lock().expect("created lock").clone();
        assert_eq!(created, vec![json!({"name": "Ana", "glucose_mgdl": 140})]);
    }

    #[tokio::test]
    async fn test_get_missing_patient_is_not_found() {
        let (client, _) = backend().await;
        let found = client.get_patient(PatientId::new(7)).await.expect("found");
        assert_eq!(found.name.as_deref(), Some("Eva"));

        let err = client
            .get_patient(PatientId::new(8))
            .await
            .expect_err("missing");
        assert_eq!(
            err,
            ApiError::NotFound {
                message: "Paciente no encontrado".into()
            }
        );
    }

    #[tokio::test]
    async fn test_second_delete_fails() {
        let (client, _) = backend().await;
        client
            .delete_patient(PatientId::new(4))
            .await
            .expect("first delete succeeds");
        let err = client
            .delete_patient(PatientId::new(4))
            .await
            .expect_err("second delete fails");
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_update_succeeds() {
        let (client, _) = backend().await;
        let mut payload = PatientPayload::new();
        payload.insert("age", 41);
        client
            .update_patient(PatientId::new(7), &payload)
            .await
            .expect("update succeeds");
    }

    #[tokio::test]
    async fn test_stats_keep_server_order() {
        let (client, _) = backend().await;
        let stats = client.stats().await.expect("stats succeed");
        let labels: Vec<&str> = stats.by_risk.iter().map(|(label, _)| label).collect();
        assert_eq!(labels, vec!["moderado", "bajo", "alto (hipoglucemia)"]);
        assert_eq!(stats.total, 5);
    }

    #[tokio::test]
    async fn test_export_bytes_are_copied_verbatim() {
        let (client, _) = backend().await;
        let mut out = Vec::new();
        let written = client
            .download_export(ExportFormat::Csv, &mut out)
            .await
            .expect("export downloads");
        assert_eq!(out, b"id,name\n1,Ana\n");
        assert_eq!(written, out.len() as u64);
    }

    #[tokio::test]
    async fn test_empty_error_body_falls_back_to_status() {
        let (client, _) = backend().await;
        let mut out = Vec::new();
        let err = client
            .download_export(ExportFormat::Pdf, &mut out)
            .await
            .expect_err("pdf export fails");
        match err {
            ClientError::Api(api) => assert_eq!(api.operator_message(), "HTTP 500"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_health_reports_ok() {
        let (client, _) = backend().await;
        let health = client.health().await.expect("health succeeds");
        assert!(health.is_ok());
        assert_eq!(health.time.as_deref(), Some("2024-05-01T10:00:00Z"));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_decode_error() {
        let routes = Router::new().route("/stats", get(|| async { "not json" }));
        let base = serve(routes).await;
        let client = HttpRegistryClient::new(ClientConfig::new(base).expect("valid base"))
            .expect("client builds");

        let err = client.stats().await.expect_err("body is not json");
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let config = ClientConfig::new(format!("http://{addr}/api")).expect("valid base");
        let client = HttpRegistryClient::new(config).expect("client builds");
        let err = client.stats().await.expect_err("nothing listening");
        assert!(matches!(err, ApiError::Transport(_)));
        assert!(err.operator_message().starts_with("Error de red: "));
    }

    #[test]
    fn test_export_url_joins_base() {
        let config = ClientConfig::new("https://registro.example.org/api/").expect("valid base");
        let client = HttpRegistryClient::new(config).expect("client builds");
        assert_eq!(
            client.export_url(ExportFormat::Pdf),
            "https://registro.example.org/api/export/pdf"
        );
    }
}
