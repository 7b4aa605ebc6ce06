//! WebSocket transport for marketplace connections.
//!
//! One reader loop and one writer task per socket. The reader feeds text
//! frames to the [`ConnectionSupervisor`](crate::ConnectionSupervisor); the
//! writer drains the connection's mailbox and sends keepalive pings.

pub mod handler;

pub use handler::WebSocketHandler;
