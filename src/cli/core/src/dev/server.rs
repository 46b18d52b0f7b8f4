/* src/cli/core/src/dev/server.rs */

// Live-reload WebSocket endpoint. Clients only listen; nothing is replayed to late joiners.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::mpsc;

pub const LIVERELOAD_PATH: &str = "/livereload";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum ReloadMessage {
  /// Only stylesheets changed; pages can swap them in place.
  #[serde(rename = "CSS")]
  Css,
  Reload,
}

impl ReloadMessage {
  pub fn to_json(self) -> String {
    match self {
      Self::Css => r#"{"type":"CSS"}"#.to_string(),
      Self::Reload => r#"{"type":"Reload"}"#.to_string(),
    }
  }
}

/// Connected sockets. Guarded by a std mutex since the runtime drives them from
/// several OS threads.
#[derive(Default)]
pub struct Clients {
  next_id: AtomicU64,
  senders: Mutex<HashMap<u64, mpsc::UnboundedSender<String>>>,
}

impl Clients {
  fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, mpsc::UnboundedSender<String>>> {
    self.senders.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn register(&self) -> (u64, mpsc::UnboundedReceiver<String>) {
    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
    let (tx, rx) = mpsc::unbounded_channel();
    self.lock().insert(id, tx);
    (id, rx)
  }

  fn remove(&self, id: u64) {
    self.lock().remove(&id);
  }

  pub fn len(&self) -> usize {
    self.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Send to every connected client; returns how many were reached.
  pub fn broadcast(&self, message: ReloadMessage) -> usize {
    let text = message.to_json();
    let mut senders = self.lock();
    senders.retain(|_, tx| tx.send(text.clone()).is_ok());
    senders.len()
  }
}

pub fn router(clients: Arc<Clients>) -> Router {
  Router::new().route(LIVERELOAD_PATH, get(handle_upgrade)).with_state(clients)
}

async fn handle_upgrade(State(clients): State<Arc<Clients>>, ws: WebSocketUpgrade) -> Response {
  ws.on_upgrade(move |socket| serve_client(clients, socket))
}

async fn serve_client(clients: Arc<Clients>, socket: WebSocket) {
  let (id, mut outgoing) = clients.register();
  let (mut sink, mut incoming) = socket.split();
  loop {
    tokio::select! {
      Some(text) = outgoing.recv() => {
        if sink.send(Message::Text(text.into())).await.is_err() {
          break;
        }
      }
      frame = incoming.next() => match frame {
        Some(Ok(Message::Close(_)) | Err(_)) | None => break,
        Some(Ok(_)) => {}
      },
    }
  }
  clients.remove(id);
}

/// Bind the live-reload socket and serve it in the background.
pub async fn start(port: u16, clients: Arc<Clients>) -> Result<SocketAddr> {
  let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
    .await
    .with_context(|| format!("failed to bind live-reload port {port}"))?;
  let addr = listener.local_addr()?;
  tokio::spawn(async move {
    let _ = axum::serve(listener, router(clients)).await;
  });
  Ok(addr)
}
