//! Alert delivery integrations.

pub mod alert_dispatch;

pub use alert_dispatch::{ConsoleAlertDispatcher, WebhookAlertDispatcher};
