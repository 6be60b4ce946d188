//! Logging integration for typed-forms.
//!
//! Provides helpers for configuring [`tracing`]-based logging from
//! [`FormSettings`] and for creating per-form spans.

use crate::settings::FormSettings;

/// Sets up the global tracing subscriber based on the given settings.
///
/// The filter is read from `settings.log_level`. In debug mode a pretty,
/// human-readable format is used; otherwise a structured JSON format is used.
/// Installing a subscriber twice is a no-op.
pub fn setup_logging(settings: &FormSettings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
}

/// Creates a tracing span for one form operation on the named schema.
///
/// # Examples
///
/// ```
/// use typed_forms_core::logging::form_span;
///
/// let span = form_span("order", "update_form");
/// let _guard = span.enter();
/// tracing::debug!("validating");
/// ```
pub fn form_span(schema: &str, operation: &'static str) -> tracing::Span {
    tracing::debug_span!("form", schema = schema, op = operation)
}
