use std::error::Error;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use axum::{
    routing::{ get, post },
    Router,
    Json,
    extract::{ State, rejection::JsonRejection },
    response::{ IntoResponse, Response },
    http::StatusCode,
};
use tower_http::cors::{ Any, CorsLayer };
use log::{ info, warn };

use crate::models::api::{ GraphResponse, OperationRequest };
use crate::service::ChatService;
use super::{ gateway, shutdown_signal, TlsPaths };

/// How long in-flight TLS requests may run after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Clone)]
struct AppState {
    service: Arc<ChatService>,
}

/// HTTP surface: `POST /graphql` for operations, `GET /health` for probes.
pub fn router(service: Arc<ChatService>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/graphql", post(graphql_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(AppState { service })
}

pub async fn start_http_server(
    addr: SocketAddr,
    service: Arc<ChatService>,
    tls: Option<TlsPaths>
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let app = router(service);

    match tls {
        Some(paths) => {
            super::install_crypto_provider();
            let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
                &paths.cert_path,
                &paths.key_path
            ).await?;
            let handle = axum_server::Handle::new();
            tokio::spawn(shutdown_on(handle.clone(), shutdown_signal()));
            info!("HTTPS query endpoint listening on: https://{}/graphql", addr);
            axum_server
                ::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service()).await?;
        }
        None => {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            info!("HTTP query endpoint listening on: http://{}/graphql", addr);
            axum::serve(listener, app.into_make_service())
                .with_graceful_shutdown(shutdown_signal()).await?;
        }
    }

    Ok(())
}

async fn shutdown_on<F>(handle: axum_server::Handle, signal: F)
    where F: Future<Output = ()>
{
    signal.await;
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}

async fn graphql_handler(
    State(state): State<AppState>,
    payload: Result<Json<OperationRequest>, JsonRejection>
) -> Response {
    match payload {
        Ok(Json(request)) => Json(gateway::execute(&state.service, request).await).into_response(),
        Err(rejection) => {
            warn!("Malformed request body: {}", rejection.body_text());
            (
                StatusCode::BAD_REQUEST,
                Json(GraphResponse::error("BAD_REQUEST", rejection.body_text())),
            ).into_response()
        }
    }
}

async fn health_handler() -> impl IntoResponse {
    "ok"
}
