use crate::models::api::OperationRequest;
use crate::models::websocket::{ ClientMessage, ServerMessage };
use crate::service::ChatService;
use super::{ gateway, TlsPaths };

use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::io::{ AsyncRead, AsyncWrite };

use tokio_tungstenite::{ accept_async, WebSocketStream };
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_rustls::TlsAcceptor;

use rustls::ServerConfig;
use rustls::pki_types::{ CertificateDer, PrivateKeyDer };
use rustls_pemfile::{ certs, pkcs8_private_keys };

use governor::{ Quota, RateLimiter };

use log::{ info, warn, error };
use futures::{ Sink, SinkExt, StreamExt };

const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

fn load_tls_config(
    cert_path: &str,
    key_path: &str
) -> Result<Arc<ServerConfig>, Box<dyn Error + Send + Sync>> {
    let cert_file = File::open(cert_path).map_err(|e|
        format!("Failed to open TLS certificate file '{}': {}", cert_path, e)
    )?;
    let key_file = File::open(key_path).map_err(|e|
        format!("Failed to open TLS key file '{}': {}", key_path, e)
    )?;

    let mut cert_reader = BufReader::new(cert_file);
    let mut key_reader = BufReader::new(key_file);
    let cert_chain: Vec<CertificateDer<'static>> = certs(&mut cert_reader)
        .collect::<Result<_, _>>()
        .map_err(|e| format!("Failed to read certificate(s): {}", e))?;

    let mut keys = pkcs8_private_keys(&mut key_reader);
    let key = match keys.next() {
        Some(Ok(k)) => PrivateKeyDer::Pkcs8(k),
        Some(Err(e)) => {
            return Err(format!("Error reading private key: {}", e).into());
        }
        None => {
            return Err("No PKCS8 private key found in key file".into());
        }
    };

    let config = ServerConfig::builder_with_provider(
        Arc::new(rustls::crypto::ring::default_provider())
    )
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(cert_chain, key)?;
    Ok(Arc::new(config))
}

pub async fn start_ws_server(
    addr: SocketAddr,
    service: Arc<ChatService>,
    tls: Option<TlsPaths>,
    connections_per_second: NonZeroU32
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;

    let tls_acceptor = match tls {
        Some(paths) => {
            info!(
                "TLS enabled. Loading certificate from '{}' and key from '{}'",
                paths.cert_path,
                paths.key_path
            );
            let config = load_tls_config(&paths.cert_path, &paths.key_path)?;
            Some(TlsAcceptor::from(config))
        }
        None => None,
    };
    let protocol = if tls_acceptor.is_some() { "wss" } else { "ws" };
    info!("{} server listening on: {}", protocol.to_uppercase(), addr);

    let limiter = RateLimiter::direct(Quota::per_second(connections_per_second));

    loop {
        let (stream, peer) = listener.accept().await?;

        if limiter.check().is_err() {
            warn!("Global connection rate limit exceeded for {}. Dropping connection.", peer);
            continue;
        }

        info!("Incoming connection from: {}", peer);
        let service = Arc::clone(&service);
        let tls_acceptor_clone = tls_acceptor.clone();

        tokio::spawn(async move {
            let process_result = if let Some(acceptor) = tls_acceptor_clone {
                match acceptor.accept(stream).await {
                    Ok(tls_stream) => {
                        info!("TLS handshake successful for {}", peer);
                        process_connection(peer, tls_stream, service).await
                    }
                    Err(e) => {
                        error!("TLS handshake error for {}: {}", peer, e);
                        Err(Box::new(e) as Box<dyn Error + Send + Sync>)
                    }
                }
            } else {
                process_connection(peer, stream, service).await
            };

            if let Err(e) = process_result {
                error!("Failed to process connection for {}: {}", peer, e);
            }
        });
    }
}

async fn process_connection<S>(
    peer: SocketAddr,
    stream: S,
    service: Arc<ChatService>
) -> Result<(), Box<dyn Error + Send + Sync>>
    where S: AsyncRead + AsyncWrite + Unpin + Send + 'static
{
    match accept_async(stream).await {
        Ok(ws) => {
            handle_connection(peer, ws, service).await;
            Ok(())
        }
        Err(e) => {
            error!("Handshake failed for {}: {}", peer, e);
            Err(Box::new(e) as _)
        }
    }
}

/// What to do with one incoming text frame.
#[derive(Debug)]
pub enum Frame {
    Run {
        id: String,
        request: OperationRequest,
    },
    Reply(ServerMessage),
}

pub fn decode_frame(text: &str) -> Frame {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(msg) => {
            let id = msg.id().to_string();
            match msg.into_request() {
                Some((id, request)) => Frame::Run { id, request },
                None =>
                    Frame::Reply(ServerMessage::Error {
                        id: Some(id),
                        message: "Subscriptions are not supported".to_string(),
                    }),
            }
        }
        Err(e) =>
            Frame::Reply(ServerMessage::Error {
                id: None,
                message: format!("Failed to parse message: {}", e),
            }),
    }
}

async fn send_json<T>(tx: &mut T, peer: SocketAddr, msg: &ServerMessage) -> bool
    where T: Sink<Message> + Unpin, T::Error: std::fmt::Display
{
    let json = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to encode reply for {}: {}", peer, e);
            return true;
        }
    };
    match tx.send(Message::Text(json)).await {
        Ok(()) => true,
        Err(e) => {
            error!("Error sending message to {}: {}", peer, e);
            false
        }
    }
}

pub async fn handle_connection<S>(
    peer: SocketAddr,
    websocket: WebSocketStream<S>,
    service: Arc<ChatService>
)
    where S: AsyncRead + AsyncWrite + Unpin
{
    info!("New WebSocket connection: {}", peer);
    let (mut tx, mut rx) = websocket.split();

    while let Some(msg) = rx.next().await {
        match msg {
            Ok(message) => {
                if message.len() > MAX_MESSAGE_SIZE {
                    warn!(
                        "Message from {} exceeds size limit ({} > {})",
                        peer,
                        message.len(),
                        MAX_MESSAGE_SIZE
                    );
                    let error_msg = ServerMessage::Error {
                        id: None,
                        message: "Message too large".to_string(),
                    };
                    send_json(&mut tx, peer, &error_msg).await;
                    break;
                }

                match message {
                    Message::Text(text) => {
                        let reply = match decode_frame(&text) {
                            Frame::Run { id, request } => {
                                if request.operation_name == "sendMessage" {
                                    let processing = ServerMessage::Processing { id: id.clone() };
                                    if !send_json(&mut tx, peer, &processing).await {
                                        break;
                                    }
                                }
                                let payload = gateway::execute(&service, request).await;
                                ServerMessage::Result { id, payload }
                            }
                            Frame::Reply(reply) => {
                                warn!("Unusable frame from {}", peer);
                                reply
                            }
                        };
                        if !send_json(&mut tx, peer, &reply).await {
                            break;
                        }
                    }
                    Message::Close(_) => {
                        info!("Received close frame from {}", peer);
                        break;
                    }
                    Message::Ping(ping_data) => {
                        if tx.send(Message::Pong(ping_data)).await.is_err() {
                            error!("Failed to send pong to {}", peer);
                            break;
                        }
                    }
                    Message::Pong(_) => {}
                    Message::Binary(_) => {
                        warn!("Ignoring binary message from {}", peer);
                    }
                    Message::Frame(_) => {}
                }
            }
            Err(e) => {
                match e {
                    | tokio_tungstenite::tungstenite::Error::ConnectionClosed
                    | tokio_tungstenite::tungstenite::Error::Protocol(_)
                    | tokio_tungstenite::tungstenite::Error::Utf8 => {
                        info!("WebSocket connection closed or protocol error for {}: {}", peer, e);
                    }
                    tokio_tungstenite::tungstenite::Error::Io(ref io_err) if
                        io_err.kind() == std::io::ErrorKind::ConnectionReset
                    => {
                        info!("WebSocket connection reset by peer {}", peer);
                    }
                    _ => {
                        error!("Error receiving message from {}: {}", peer, e);
                    }
                }
                break;
            }
        }
    }
    info!("WebSocket connection closed for {}", peer);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_frames_run() {
        let frame = decode_frame(
            r#"{"type":"operation","id":"1","operationName":"getChats","variables":{"first":2}}"#
        );
        match frame {
            Frame::Run { id, request } => {
                assert_eq!(id, "1");
                assert_eq!(request.operation_name, "getChats");
            }
            other => panic!("unexpected frame {:?}", other),
        }
    }

    #[test]
    fn subscriptions_are_refused_with_their_id() {
        match decode_frame(r#"{"type":"subscribe","id":"sub-1"}"#) {
            Frame::Reply(ServerMessage::Error { id, message }) => {
                assert_eq!(id.as_deref(), Some("sub-1"));
                assert!(message.contains("not supported"));
            }
            other => panic!("unexpected frame {:?}", other),
        }
    }

    #[test]
    fn garbage_gets_a_parse_error() {
        match decode_frame("not json") {
            Frame::Reply(ServerMessage::Error { id, message }) => {
                assert!(id.is_none());
                assert!(message.starts_with("Failed to parse message"));
            }
            other => panic!("unexpected frame {:?}", other),
        }
    }
}
