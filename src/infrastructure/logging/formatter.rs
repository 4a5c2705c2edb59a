use std::fmt;
use std::sync::Arc;

use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

use super::redaction::sanitize_error_message;

/// Event formatter that redacts the output of an inner formatter.
///
/// The inner formatter renders into a buffer first; the buffer is passed
/// through [`sanitize_error_message`] before anything reaches the writer, so
/// a sink using this formatter cannot emit an unredacted line.
#[derive(Debug, Clone)]
pub struct SanitizingFormatter<F> {
    inner: F,
    known_uris: Arc<[String]>,
}

impl<F> SanitizingFormatter<F> {
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            known_uris: Arc::from(Vec::new()),
        }
    }

    /// URIs replaced by their sanitized form wherever they appear literally.
    #[must_use]
    pub fn with_known_uris(mut self, uris: Arc<[String]>) -> Self {
        self.known_uris = uris;
        self
    }

    /// Apply the redaction step to an already formatted line.
    pub fn sanitize(&self, formatted: &str) -> String {
        sanitize_error_message(formatted, &self.known_uris)
    }
}

impl<S, N, F> FormatEvent<S, N> for SanitizingFormatter<F>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
    F: FormatEvent<S, N>,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut buffer = String::new();
        self.inner
            .format_event(ctx, Writer::new(&mut buffer), event)?;
        writer.write_str(&self.sanitize(&buffer))
    }
}
