//! HTTP bridge between axum and the monitoring dispatcher
//!
//! Each request is decoded into a [`MonitoringRequest`], dispatched on a
//! blocking worker into a [`BufferedResponse`], then encoded back.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Response, StatusCode, Uri};
use axum::routing::get;
use axum::Router;
use tracing::{error, instrument};

use dispatcher::request::RESOURCE_PARAMETER;
use dispatcher::{BufferedResponse, DispatchContext, DispatcherError, MonitoringRequest};
use observability::RequestStatsAggregator;
use standalone::Standalone;

/// Shared by every request handler
pub struct ServerState {
    pub standalone: Standalone,
    pub stats: Mutex<RequestStatsAggregator>,
}

impl ServerState {
    pub fn new(standalone: Standalone) -> Self {
        Self {
            standalone,
            stats: Mutex::new(RequestStatsAggregator::new()),
        }
    }

    /// Run one dispatch on the calling thread
    fn dispatch(
        &self,
        request: &MonitoringRequest,
        label: String,
    ) -> (BufferedResponse, Result<(), DispatcherError>) {
        let _active = self.standalone.introspection.requests().begin(label);
        let runtime = if request.needs_runtime_informations() {
            self.standalone.runtime_informations()
        } else {
            Vec::new()
        };
        let mut response = BufferedResponse::new();
        let outcome = self
            .standalone
            .dispatcher
            .dispatch(request, &mut response, &runtime);
        (response, outcome)
    }

    fn record(&self, route: &'static str, latency_ms: f64, success: bool) {
        observability::record_dispatch_latency_ms(route, latency_ms);
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .update(route, latency_ms, success);
    }
}

/// Router serving the console at `path`
pub fn router(state: Arc<ServerState>, path: &str) -> Router {
    Router::new()
        .route(path, get(monitoring))
        .with_state(state)
}

#[instrument(name = "http_monitoring", skip_all, fields(query = uri.query().unwrap_or("")))]
pub async fn monitoring(
    State(state): State<Arc<ServerState>>,
    uri: Uri,
    headers: HeaderMap,
) -> Response<Body> {
    let request = to_monitoring_request(uri.query(), &headers);
    let route = route_label(&request);
    let label = format!("GET {uri}");
    let started = Instant::now();

    let worker = state.clone();
    let joined = tokio::task::spawn_blocking(move || worker.dispatch(&request, label)).await;
    let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

    match joined {
        Ok((response, outcome)) => {
            state.record(route, latency_ms, outcome.is_ok());
            into_http_response(response, outcome)
        }
        Err(e) => {
            error!(error = %e, "Dispatch worker failed");
            state.record(route, latency_ms, false);
            plain(StatusCode::INTERNAL_SERVER_ERROR, "dispatch worker failed")
        }
    }
}

/// Query pairs plus every header that is valid text
pub fn to_monitoring_request(query: Option<&str>, headers: &HeaderMap) -> MonitoringRequest {
    let mut request = MonitoringRequest::from_query(query.unwrap_or(""));
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            request = request.with_header(name.as_str(), value);
        }
    }
    request
}

fn route_label(request: &MonitoringRequest) -> &'static str {
    if request.parameter(RESOURCE_PARAMETER).is_some() {
        return "resource";
    }
    DispatchContext::from_request(request)
        .and_then(|context| context.output_mode())
        .map_or("invalid", |mode| mode.kind().as_str())
}

/// Encode the dispatcher's output; failures with nothing written become a
/// plain-text error page
pub fn into_http_response(
    response: BufferedResponse,
    outcome: Result<(), DispatcherError>,
) -> Response<Body> {
    let status = match &outcome {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        }
    };
    if let Err(e) = &outcome {
        if response.body().is_empty() {
            return plain(status, &e.to_string());
        }
    }

    let mut builder = Response::builder().status(status);
    for (name, value) in response.all_headers() {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            builder = builder.header(name, value);
        }
    }
    builder
        .body(Body::from(response.into_body()))
        .unwrap_or_else(|_| plain(StatusCode::INTERNAL_SERVER_ERROR, "invalid response"))
}

fn plain(status: StatusCode, message: &str) -> Response<Body> {
    let mut response = Response::new(Body::from(message.to_string()));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=UTF-8"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::MonitoringConfig;
    use tempfile::TempDir;

    fn state(dir: &TempDir, system_actions: bool) -> Arc<ServerState> {
        let mut config: MonitoringConfig =
            serde_json::from_str(r#"{ "application": { "name": "shop" } }"#).unwrap();
        config.security.system_actions_enabled = system_actions;
        config.hosting.resources_dir = dir.path().join("resources");
        config.hosting.deployment_dir = dir.path().join("webapp");
        Arc::new(ServerState::new(Standalone::from_config(&config).unwrap()))
    }

    async fn get_body(state: Arc<ServerState>, uri: &str, headers: HeaderMap) -> (StatusCode, HeaderMap, Vec<u8>) {
        let response = monitoring(State(state), uri.parse().unwrap(), headers).await;
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, body.to_vec())
    }

    #[test]
    fn test_request_conversion() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("fr-FR,en;q=0.5"));
        headers.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
        let request = to_monitoring_request(Some("part=sessions&period=WEEK"), &headers);

        assert_eq!(request.parameter("part"), Some("sessions"));
        assert_eq!(request.locale().tag(), "fr-FR");
        assert_eq!(request.header("Accept-Encoding"), Some("gzip"));
        assert_eq!(route_label(&request), "html");
        assert_eq!(route_label(&MonitoringRequest::from_query("format=xml")), "snapshot");
        assert_eq!(route_label(&MonitoringRequest::from_query("format=yaml")), "invalid");
        assert_eq!(
            route_label(&MonitoringRequest::from_query("graph=cpu&format=yaml")),
            "graph"
        );
    }

    #[test]
    fn test_error_without_body_is_plain_text() {
        let response = into_http_response(
            BufferedResponse::new(),
            Err(DispatcherError::ActionsDisabled),
        );
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=UTF-8"
        );
    }

    #[tokio::test]
    async fn test_dashboard_over_http() {
        let dir = TempDir::new().unwrap();
        let (status, headers, body) = get_body(state(&dir, false), "/monitoring", HeaderMap::new()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers.get(header::CACHE_CONTROL).unwrap(), "no-cache");
        assert!(headers
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/html"));
        assert!(String::from_utf8(body).unwrap().contains("Monitoring - shop"));
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir, false);

        let (status, _, _) =
            get_body(state.clone(), "/monitoring?part=processes&format=json", HeaderMap::new()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _, body) =
            get_body(state.clone(), "/monitoring?period=fortnight", HeaderMap::new()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(String::from_utf8(body).unwrap().contains("fortnight"));

        let summary = state.stats.lock().unwrap().summary();
        assert_eq!(summary.total_requests, 2);
        assert_eq!(summary.failed_requests, 2);
    }

    #[tokio::test]
    async fn test_system_action_then_render() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir, true);
        state
            .standalone
            .collector
            .record_request("http", "/checkout", 10, false);

        let (status, _, body) = get_body(
            state.clone(),
            "/monitoring?action=clear_counter&counter=http",
            HeaderMap::new(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(body)
            .unwrap()
            .contains("Statistics cleared for counter http"));
        assert_eq!(state.standalone.collector.counter("http").unwrap().hits(), 0);
    }
}
