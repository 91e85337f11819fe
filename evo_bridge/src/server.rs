//! Observer endpoint.
//!
//! Every accepted TCP connection is upgraded to a WebSocket and becomes
//! one subscriber: bridge events go out as JSON text frames, and every
//! inbound text or binary message is submitted as a command. A connection
//! failure only ends that connection.

use crate::bridge::Bridge;
use crate::error::BridgeResult;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, info, warn};

/// WebSocket server for observers.
pub struct ObserverServer {
    listener: TcpListener,
    bridge: Arc<Bridge>,
}

impl ObserverServer {
    /// Bind the listening socket.
    pub async fn bind(addr: SocketAddr, bridge: Arc<Bridge>) -> BridgeResult<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "Observer endpoint listening");
        Ok(Self { listener, bridge })
    }

    /// Address actually bound (useful with port 0).
    pub fn local_addr(&self) -> BridgeResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until the task is dropped.
    pub async fn run(self) -> BridgeResult<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let bridge = Arc::clone(&self.bridge);
                    tokio::spawn(async move {
                        if let Err(e) = serve_observer(stream, peer, bridge).await {
                            debug!(%peer, error = %e, "Observer connection ended with error");
                        }
                    });
                }
                Err(e) => warn!(error = %e, "Accept failed"),
            }
        }
    }
}

async fn serve_observer(
    stream: TcpStream,
    peer: SocketAddr,
    bridge: Arc<Bridge>,
) -> Result<(), WsError> {
    let ws = accept_async(stream).await?;
    let (mut ws_tx, mut ws_rx) = ws.split();

    let mut subscription = bridge.subscribe();
    let id = subscription.id();
    info!(%peer, subscriber = %id, "Observer connected");

    let result = loop {
        tokio::select! {
            event = subscription.recv() => {
                let Some(event) = event else { break Ok(()) };
                match event.to_json() {
                    Ok(json) => {
                        if let Err(e) = ws_tx.send(Message::Text(json.into())).await {
                            break Err(e);
                        }
                    }
                    Err(e) => warn!(subscriber = %id, error = %e, "Event serialization failed"),
                }
            }
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        bridge.submit_command(text.as_str());
                    }
                    Some(Ok(Message::Binary(bytes))) => {
                        bridge.submit_command(&String::from_utf8_lossy(&bytes));
                    }
                    Some(Ok(Message::Close(_))) | None => break Ok(()),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => break Err(e),
                }
            }
        }
    };

    bridge.unsubscribe(id);
    info!(%peer, subscriber = %id, "Observer disconnected");
    result
}
