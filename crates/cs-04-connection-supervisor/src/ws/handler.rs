//! Per-socket reader loop and writer task.
//!
//! Timeouts:
//! - before authentication the reader waits at most `auth_timeout` in total
//! - afterwards each read waits at most `idle_timeout`; pongs count as
//!   activity, so a client answering pings stays connected
//!
//! The writer stops when the connection is dropped from a channel for
//! falling behind, which closes the socket and, through the reader, runs the
//! supervisor's cleanup.

use axum::extract::ws::{Message, WebSocket};
use futures::{Sink, SinkExt, Stream, StreamExt};
use shared_bus::Mailbox;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout, Instant};
use tracing::{debug, error, info, warn};

use crate::domain::SupervisorError;
use crate::supervisor::ConnectionSupervisor;

/// How long the writer may keep flushing once the reader has stopped.
const WRITER_GRACE: Duration = Duration::from_secs(1);

/// WebSocket connection handler
pub struct WebSocketHandler {
    supervisor: Arc<ConnectionSupervisor>,
    /// Credential presented during the upgrade, if any.
    initial_token: Option<String>,
}

impl WebSocketHandler {
    pub fn new(supervisor: Arc<ConnectionSupervisor>) -> Self {
        Self {
            supervisor,
            initial_token: None,
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.initial_token = token;
        self
    }

    /// Handle a WebSocket connection until either side closes it.
    pub async fn handle(self, socket: WebSocket) {
        let (sink, stream) = socket.split();
        self.run(stream, sink).await;
    }

    /// Drive a connection over any message stream and sink.
    pub async fn run<St, Si, E>(self, mut stream: St, sink: Si)
    where
        St: Stream<Item = Result<Message, E>> + Unpin,
        E: Display,
        Si: Sink<Message> + Unpin + Send + 'static,
        Si::Error: Display,
    {
        let supervisor = self.supervisor;
        let ws = supervisor.config().websocket.clone();
        let (mut session, mailbox) = supervisor.open();
        let connection_id = session.id();

        let mut writer = tokio::spawn(write_loop(sink, mailbox, ws.ping_interval));
        let mut writer_done = false;

        let mut refused = false;
        if let Some(token) = &self.initial_token {
            if let Err(err) = supervisor.authenticate(&mut session, token).await {
                supervisor.reject(&session, &err).await;
                refused = true;
            }
        }
        let auth_deadline = Instant::now() + ws.auth_timeout;

        while !refused {
            let wait = if session.identity().is_some() {
                ws.idle_timeout
            } else {
                auth_deadline.saturating_duration_since(Instant::now())
            };

            let next = tokio::select! {
                _ = &mut writer => {
                    writer_done = true;
                    debug!(connection_id = %connection_id, "Writer stopped");
                    break;
                }
                next = timeout(wait, stream.next()) => next,
            };

            let message = match next {
                Ok(Some(Ok(message))) => message,
                Ok(Some(Err(err))) => {
                    warn!(connection_id = %connection_id, error = %err, "WebSocket error");
                    break;
                }
                Ok(None) => break,
                Err(_) if session.identity().is_some() => {
                    info!(connection_id = %connection_id, "Closing idle connection");
                    break;
                }
                Err(_) => {
                    warn!(connection_id = %connection_id, "No credential before deadline");
                    supervisor
                        .reject(&session, &SupervisorError::Unauthenticated)
                        .await;
                    break;
                }
            };

            match message {
                Message::Text(text) => supervisor.process_message(&mut session, &text).await,
                Message::Binary(data) => match String::from_utf8(data) {
                    Ok(text) => supervisor.process_message(&mut session, &text).await,
                    Err(_) => {
                        let err = SupervisorError::Malformed("binary frame is not UTF-8".into());
                        supervisor.reject(&session, &err).await;
                    }
                },
                // axum answers pings itself
                Message::Ping(_) | Message::Pong(_) => {}
                Message::Close(_) => {
                    debug!(connection_id = %connection_id, "Close frame received");
                    break;
                }
            }
        }

        // Drops the mailbox's last sender, so the writer drains and exits.
        supervisor.close(&mut session).await;

        if !writer_done && timeout(WRITER_GRACE, &mut writer).await.is_err() {
            debug!(connection_id = %connection_id, "Aborting writer");
            writer.abort();
        }
    }
}

/// Forward mailbox events to the socket as JSON text frames.
async fn write_loop<Si>(mut sink: Si, mut mailbox: Mailbox, ping_interval: Duration)
where
    Si: Sink<Message> + Unpin,
    Si::Error: Display,
{
    let connection_id = mailbox.id();
    let lagged = mailbox.lag_signal();
    let mut ping = tokio::time::interval_at(Instant::now() + ping_interval, ping_interval);

    loop {
        let outbound = tokio::select! {
            event = mailbox.recv() => match event {
                Some(event) => match serde_json::to_string(event.as_ref()) {
                    Ok(text) => Message::Text(text),
                    Err(err) => {
                        error!(connection_id = %connection_id, error = %err, "Failed to encode event");
                        continue;
                    }
                },
                None => break,
            },
            _ = lagged.notified() => {
                warn!(connection_id = %connection_id, "Closing connection that fell behind");
                break;
            }
            _ = ping.tick() => Message::Ping(Vec::new()),
        };

        if let Err(err) = sink.send(outbound).await {
            debug!(connection_id = %connection_id, error = %err, "Socket send failed");
            return;
        }
    }

    if let Err(err) = sink.send(Message::Close(None)).await {
        debug!(connection_id = %connection_id, error = %err, "Failed to send close frame");
    }
}
