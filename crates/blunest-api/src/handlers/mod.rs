//! HTTP handlers, one module per resource

pub mod agents;
pub mod analysis;
pub mod auth;
pub mod dashboard;
pub mod developers;
pub mod enquiries;
pub mod groups;
pub mod health;
pub mod notifications;
pub mod properties;
pub mod search;
pub mod subscriptions;
pub mod users;
pub mod webhooks;
