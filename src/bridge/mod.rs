//! The message bridge between the native shell and the embedded content
//! surface. Commands come in as named JSON messages; notifications go out
//! as script calls.

pub mod command;
pub mod controller;
pub mod notification;

pub use command::{BridgeCommand, BridgeMessage, DecodeError};
pub use controller::BridgeController;
pub use notification::{BridgeNotification, NotificationSender};
