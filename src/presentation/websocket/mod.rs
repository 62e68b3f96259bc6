//! Course-room gateway: HELLO, IDENTIFY, READY, then live session dispatches
//! for every course the connection follows.

pub mod connection;
pub mod gateway;
pub mod handler;
pub mod messages;

pub use connection::ConnectionState;
pub use gateway::{Gateway, RoutedEvent};
pub use handler::ws_handler;
pub use messages::{GatewayReceive, GatewaySend, OpCode};
