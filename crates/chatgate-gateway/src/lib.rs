//! The generation dispatcher: the gateway's sole inbound contract.

pub mod dispatch;

pub use dispatch::Dispatcher;
