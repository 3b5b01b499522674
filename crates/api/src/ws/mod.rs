//! Live notification sockets.
//!
//! [`WsManager`] is the registry of open connections, the handler performs
//! the authenticated upgrade, and the heartbeat keeps idle sockets alive.

mod handler;
mod heartbeat;
pub mod manager;
pub mod protocol;

pub use handler::ws_handler;
pub use heartbeat::{start_heartbeat, HEARTBEAT_INTERVAL};
pub use manager::WsManager;
