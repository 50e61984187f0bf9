//! WebSocket health channel
//!
//! Push side of the monitor: a Socket.IO subscription to the backend's
//! health namespace, with its connection state machine.

pub mod channel;
pub mod frame;
pub mod state;
pub mod transport;

pub use channel::{Subscription, WebSocketHealthChannel};
pub use frame::{Frame, FrameError};
pub use state::ConnectionState;
pub use transport::{SocketConnection, SocketTransport, TungsteniteTransport};
