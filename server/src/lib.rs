//! Hookrelay Server
//!
//! Relays GitHub webhooks and message-bus system events into Discord channels.
//! Delivery is best effort: failures are logged, never retried.

pub mod api;
pub mod config;
pub mod dispatch;
pub mod events;
pub mod listener;
pub mod observability;
pub mod tasks;
pub mod webhooks;
