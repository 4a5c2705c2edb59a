//! Implementation of the `logwarden redact` command.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::domain::models::Config;
use crate::infrastructure::logging::redaction::{sanitize_error_message, sanitize_map, SENSITIVE_KEYS};

#[derive(Args, Debug)]
pub struct RedactArgs {
    /// Additional URI to mask verbatim wherever it appears (repeatable)
    #[arg(long = "uri", value_name = "URI")]
    pub uris: Vec<String>,

    /// Additional key to treat as sensitive in JSON objects (repeatable)
    #[arg(long = "key", value_name = "KEY")]
    pub keys: Vec<String>,
}

/// Redact one input line.
///
/// In JSON mode lines holding a JSON object are redacted key by key and the
/// result text-sanitized again; anything else is treated as plain text.
fn redact_line(line: &str, known_uris: &[String], keys: &[String], json_mode: bool) -> String {
    if json_mode {
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(line) {
            let redacted = sanitize_map(&map, keys);
            if let Ok(rendered) = serde_json::to_string(&redacted) {
                return sanitize_error_message(&rendered, known_uris);
            }
        }
    }
    sanitize_error_message(line, known_uris)
}

pub async fn execute(args: RedactArgs, config: Config, json_mode: bool) -> Result<()> {
    let mut known_uris = args.uris;
    known_uris.extend(config.remote.uri.into_iter().filter(|u| !u.is_empty()));

    let mut keys: Vec<String> = SENSITIVE_KEYS.iter().map(ToString::to_string).collect();
    keys.extend(args.keys);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let redacted = redact_line(&line, &known_uris, &keys, json_mode);
        stdout.write_all(redacted.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
    }
    stdout.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_keys() -> Vec<String> {
        SENSITIVE_KEYS.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_plain_line() {
        let out = redact_line(
            "connect mongodb://admin:s3cret@db:27017 token=abc",
            &[],
            &default_keys(),
            false,
        );
        assert_eq!(out, "connect mongodb://***:***@db:27017 token=***");
    }

    #[test]
    fn test_json_line_uses_extra_keys() {
        let mut keys = default_keys();
        keys.push("ssn".to_string());

        let out = redact_line(r#"{"user":"bob","ssn":"123-45-6789"}"#, &[], &keys, true);
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["ssn"], "***");
        assert_eq!(value["user"], "bob");
    }

    #[test]
    fn test_known_uri_is_masked() {
        let uri = "https://svc:pw@logs.example.com".to_string();
        let out = redact_line("posting to https://svc:pw@logs.example.com", &[uri], &default_keys(), false);
        assert!(!out.contains("svc:pw"));
    }
}
