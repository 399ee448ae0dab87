//! GitHub Webhook Intake
//!
//! Authenticates inbound `POST /github-webhook` deliveries, acknowledges them,
//! and hands rendering and delivery to a tracked background task.

pub mod handlers;
pub mod signing;
pub mod types;
