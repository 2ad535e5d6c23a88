pub mod api;
pub mod gateway;
pub mod websocket;

use crate::cli::Args;
use crate::service::ChatService;
use std::error::Error;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use log::{ info, error };

#[derive(Debug, Clone)]
pub struct TlsPaths {
    pub cert_path: String,
    pub key_path: String,
}

impl TlsPaths {
    pub fn from_args(args: &Args) -> Result<Option<Self>, Box<dyn Error + Send + Sync>> {
        if !args.enable_tls {
            info!("TLS not enabled. Serving plain HTTP/WS.");
            return Ok(None);
        }
        match (&args.tls_cert_path, &args.tls_key_path) {
            (Some(cert_path), Some(key_path)) =>
                Ok(
                    Some(Self {
                        cert_path: cert_path.clone(),
                        key_path: key_path.clone(),
                    })
                ),
            (Some(_), None) | (None, Some(_)) => {
                error!("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.");
                Err("Missing TLS certificate or key path".into())
            }
            (None, None) => {
                error!("--enable-tls was set but no certificate/key paths provided.");
                Err("TLS enabled without cert/key".into())
            }
        }
    }
}

pub(crate) fn install_crypto_provider() {
    // Fails only when a provider is already installed.
    let _ = rustls::crypto::ring::default_provider().install_default();
}

pub(crate) async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

pub struct Server {
    service: Arc<ChatService>,
    args: Args,
}

impl Server {
    pub fn new(service: Arc<ChatService>, args: Args) -> Self {
        Self { service, args }
    }

    /// Runs the HTTP endpoint until shutdown, with the WebSocket transport
    /// alongside it when a port is configured.
    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let http_addr: SocketAddr = self.args.server_addr
            .parse()
            .map_err(|e| format!("Invalid server address '{}': {}", self.args.server_addr, e))?;
        let tls = TlsPaths::from_args(&self.args)?;

        if let Some(ws_port) = self.args.ws_port {
            self.start_ws_server(ws_port, tls.clone())?;
        }

        api::start_http_server(http_addr, self.service.clone(), tls).await
    }

    fn start_ws_server(
        &self,
        ws_port: u16,
        tls: Option<TlsPaths>
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let addr = SocketAddr::from(([0, 0, 0, 0], ws_port));
        let rate = NonZeroU32::new(self.args.ws_connections_per_second).ok_or(
            "--ws-connections-per-second must be at least 1"
        )?;
        let service = self.service.clone();

        tokio::spawn(async move {
            if let Err(e) = websocket::start_ws_server(addr, service, tls, rate).await {
                error!("WebSocket server error: {}", e);
            }
        });
        Ok(())
    }
}
