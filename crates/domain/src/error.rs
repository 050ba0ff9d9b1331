//! Domain error types.

use thiserror::Error;

/// Errors surfaced by the monitoring engine.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Entity not found: {0}")]
    EntityNotFound(String),
}

/// Flattens validator field errors into a single message, matching the
/// `field: message` form the API reports.
pub fn validation_message(errors: &validator::ValidationErrors) -> String {
    let parts: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |err| {
                format!("{}: {}", field, err.message.as_ref().unwrap_or(&"".into()))
            })
        })
        .collect();
    parts.join(", ")
}
