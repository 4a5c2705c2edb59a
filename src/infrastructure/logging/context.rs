use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::redaction::sanitize_json;
use crate::domain::models::Severity;

/// Log `message` at `severity` with a redacted rendering of `context`
/// attached as the `context` field.
///
/// Any serializable value works; maps and structs are redacted by key. If
/// the context cannot be serialized the message is still emitted, annotated
/// with the failure.
pub fn log_with_context<C: Serialize + ?Sized>(severity: Severity, message: &str, context: &C) {
    let rendered = serde_json::to_value(context)
        .and_then(|value| serde_json::to_string(&sanitize_json(&value)));

    match rendered {
        Ok(rendered) => emit(severity, message, Some(&rendered)),
        Err(e) => {
            let annotated = format!("{message} [context logging failed: {e}]");
            emit(severity, &annotated, None);
        }
    }
}

fn emit(severity: Severity, message: &str, context: Option<&str>) {
    match (severity, context) {
        (Severity::Debug, Some(ctx)) => debug!(context = %ctx, "{message}"),
        (Severity::Debug, None) => debug!("{message}"),
        (Severity::Info, Some(ctx)) => info!(context = %ctx, "{message}"),
        (Severity::Info, None) => info!("{message}"),
        (Severity::Warning, Some(ctx)) => warn!(context = %ctx, "{message}"),
        (Severity::Warning, None) => warn!("{message}"),
        (Severity::Error, Some(ctx)) => error!(context = %ctx, "{message}"),
        (Severity::Error, None) => error!("{message}"),
        (Severity::Critical, Some(ctx)) => error!(critical = true, context = %ctx, "{message}"),
        (Severity::Critical, None) => error!(critical = true, "{message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::LogRecord;
    use crate::domain::ports::{RecordSink, SinkError};
    use crate::infrastructure::logging::remote::RemoteSinkLayer;
    use serde_json::{json, Map, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Default)]
    struct MemorySink(Mutex<Vec<LogRecord>>);

    impl RecordSink for MemorySink {
        fn append(&self, record: LogRecord) -> Result<(), SinkError> {
            self.0.lock().unwrap().push(record);
            Ok(())
        }
    }

    fn capture<F: FnOnce()>(f: F) -> Vec<LogRecord> {
        let sink = Arc::new(MemorySink::default());
        let subscriber = tracing_subscriber::registry()
            .with(RemoteSinkLayer::new(sink.clone(), Arc::from(Vec::new())));
        tracing::subscriber::with_default(subscriber, f);
        let records = sink.0.lock().unwrap().clone();
        records
    }

    #[test]
    fn test_context_is_redacted_and_level_preserved() {
        let context = match json!({"user": "bob", "db_password": "hunter2"}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };

        let records = capture(|| {
            log_with_context(Severity::Warning, "slow query", &context);
            log_with_context(Severity::Critical, "disk full", &Map::new());
        });

        assert_eq!(records.len(), 2);

        assert_eq!(records[0].level, Severity::Warning);
        assert_eq!(records[0].message, "slow query");
        let rendered = records[0].context["context"].as_str().unwrap();
        assert!(rendered.contains("\"db_password\":\"***\""));
        assert!(rendered.contains("\"user\":\"bob\""));
        assert!(!rendered.contains("hunter2"));

        assert_eq!(records[1].level, Severity::Error);
        assert_eq!(records[1].context["critical"], true);
    }

    #[derive(Serialize)]
    struct Connection<'a> {
        host: &'a str,
        secret: &'a str,
        replicas: Vec<Map<String, Value>>,
    }

    #[test]
    fn test_struct_context_is_redacted() {
        let replica = match json!({"host": "r1", "auth_token": "t1"}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let context = Connection {
            host: "db.internal",
            secret: "s3cr3t",
            replicas: vec![replica],
        };

        let records = capture(|| log_with_context(Severity::Info, "connected", &context));

        let rendered = records[0].context["context"].as_str().unwrap();
        let parsed: Value = serde_json::from_str(rendered).unwrap();
        assert_eq!(
            parsed,
            json!({"host": "db.internal", "secret": "***", "replicas": [{"host": "r1", "auth_token": "***"}]})
        );
    }

    #[test]
    fn test_unserializable_context_still_logs_message() {
        // tuple keys have no JSON object form
        let context: HashMap<(u8, u8), &str> = HashMap::from([((1, 2), "x")]);

        let records = capture(|| log_with_context(Severity::Error, "db down", &context));

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, Severity::Error);
        assert!(records[0]
            .message
            .starts_with("db down [context logging failed: "));
        assert!(!records[0].context.contains_key("context"));
    }
}
