//! Sensitive data redaction
//!
//! Pure masking of connection URIs, free-form log text and structured
//! key/value maps. Every function here is stateless and never panics on
//! any input; the compiled patterns are shared read-only statics.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use reqwest::Url;
use serde_json::{Map, Value};

/// Replacement token for every masked value. Never matches a rule itself.
pub const MASK: &str = "***";

/// Field-name substrings that mark a structured value as sensitive.
pub const SENSITIVE_KEYS: &[&str] = &[
    "password", "pass", "pwd", "secret", "key", "token", "auth", "uri", "url",
];

// scheme://user:pass@  (userinfo cannot span whitespace)
static INLINE_CREDENTIALS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"://[^\s:/@]+:[^\s@]+@").expect("inline credential pattern is valid")
});

// the token runs to the next delimiter so `bearer token=x` cannot leave `x` behind
static BEARER_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?P<scheme>bearer)\s+[a-z0-9\-._~+/]+=*[^\s"'&]*"#)
        .expect("bearer pattern is valid")
});

// A key is one of the sensitive names, optionally prefixed by `_`, `-` or `.`
// separated segments (`api_key`, `db.password`, `client-secret`).
//
// Values, tried in order: a closed quoted string (escape aware), a JSON
// escaped `\"...\"` string, an unclosed quote up to the next delimiter, a
// bare run. A bare run swallows embedded quotes and punctuation but stops at
// a quote, comma or bracket that ends a JSON token, and never opens an array
// or an object.
static KEY_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"(?i)\b(?P<key>(?:[a-z0-9]+[_.\-])*(?:password|passwd|pass|pwd|secret|token|auth|key))\b"#,
        r#"(?P<kq>(?:\\?["'])?)(?P<sep>\s*[=:]\s*)"#,
        r#"(?:(?P<quoted>"(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*')"#,
        r#"|(?P<escaped>\\"(?:[^"\\]|\\[^"])*\\")"#,
        r#"|(?P<unclosed>["'][^\s&]*)"#,
        r#"|(?P<raw>(?:[^\s&"\\,{}\[\]]|\\[^"\s]|\\"[^\s&,:}\]"]|"[^\s&,:}\]]|[,{}\]][^\s&,:}\]"])+))"#,
    ))
    .expect("key/value pattern is valid")
});

/// Mask credentials and sensitive query parameters in a connection URI.
///
/// Host, port, path and non-sensitive parameters are preserved. Empty or
/// unparseable input yields [`MASK`].
pub fn sanitize_uri(uri: &str) -> String {
    if uri.trim().is_empty() {
        return MASK.to_string();
    }

    let Ok(mut url) = Url::parse(uri.trim()) else {
        return MASK.to_string();
    };

    let has_credentials = !url.username().is_empty() || url.password().is_some();
    if has_credentials && (url.set_username(MASK).is_err() || url.set_password(Some(MASK)).is_err())
    {
        return MASK.to_string();
    }

    if let Some(query) = url.query().map(sanitize_query) {
        url.set_query(Some(&query));
    }

    url.to_string()
}

/// Mask values of sensitive parameters in a raw query string, keeping every
/// other pair byte-for-byte.
fn sanitize_query(query: &str) -> String {
    query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if is_sensitive_key(key, SENSITIVE_KEYS) => format!("{key}={MASK}"),
            _ => pair.to_string(),
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Redact a free-form message.
///
/// Applied in order:
/// 1. literal occurrences of each `known_uris` entry become their
///    [`sanitize_uri`] form,
/// 2. inline `scheme://user:pass@` credentials are masked,
/// 3. `Bearer <token>` values are masked,
/// 4. `key=value` / `key: value` pairs with a sensitive key become `key=***`.
///    Closed quoted values keep their quotes and separator so JSON stays
///    valid; unclosed quotes and embedded quotes are masked with the value.
pub fn sanitize_error_message<S: AsRef<str>>(text: &str, known_uris: &[S]) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut sanitized = text.to_string();

    for uri in known_uris.iter().map(AsRef::as_ref) {
        if !uri.is_empty() && sanitized.contains(uri) {
            sanitized = sanitized.replace(uri, &sanitize_uri(uri));
        }
    }

    sanitized = INLINE_CREDENTIALS
        .replace_all(&sanitized, "://***:***@")
        .into_owned();

    sanitized = BEARER_TOKEN
        .replace_all(&sanitized, "${scheme} ***")
        .into_owned();

    KEY_VALUE
        .replace_all(&sanitized, |caps: &Captures<'_>| {
            let (key, kq, sep) = (&caps["key"], &caps["kq"], &caps["sep"]);
            if let Some(quoted) = caps.name("quoted") {
                let quote = &quoted.as_str()[..1];
                format!("{key}{kq}{sep}{quote}{MASK}{quote}")
            } else if caps.name("escaped").is_some() {
                format!("{key}{kq}{sep}\\\"{MASK}\\\"")
            } else if caps.name("raw").is_some() && !kq.is_empty() {
                // `"token":5` becomes `"token":"***"`
                format!("{key}{kq}{sep}{kq}{MASK}{kq}")
            } else {
                format!("{key}={MASK}")
            }
        })
        .into_owned()
}

/// [`sanitize_error_message`] without known URIs.
pub fn sanitize_line(text: &str) -> String {
    sanitize_error_message::<&str>(text, &[])
}

/// Recursively mask sensitive entries of a JSON-like map.
///
/// Entries whose key contains one of `sensitive_keys` (case-insensitive) are
/// replaced wholesale. Nested maps are walked, sequences are walked element
/// by element, other values pass through.
pub fn sanitize_map<S: AsRef<str>>(
    map: &Map<String, Value>,
    sensitive_keys: &[S],
) -> Map<String, Value> {
    map.iter()
        .map(|(key, value)| {
            let value = if is_sensitive_key(key, sensitive_keys) {
                Value::String(MASK.to_string())
            } else {
                sanitize_value(value, sensitive_keys)
            };
            (key.clone(), value)
        })
        .collect()
}

/// [`sanitize_map`] with the default [`SENSITIVE_KEYS`].
pub fn sanitize_context(map: &Map<String, Value>) -> Map<String, Value> {
    sanitize_map(map, SENSITIVE_KEYS)
}

/// [`sanitize_context`] for any JSON value; objects nested in sequences are
/// walked, top-level scalars pass through.
pub fn sanitize_json(value: &Value) -> Value {
    sanitize_value(value, SENSITIVE_KEYS)
}

fn sanitize_value<S: AsRef<str>>(value: &Value, sensitive_keys: &[S]) -> Value {
    match value {
        Value::Object(inner) => Value::Object(sanitize_map(inner, sensitive_keys)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| sanitize_value(item, sensitive_keys))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn is_sensitive_key<S: AsRef<str>>(key: &str, sensitive_keys: &[S]) -> bool {
    let lowered = key.to_lowercase();
    sensitive_keys
        .iter()
        .any(|sk| lowered.contains(&sk.as_ref().to_lowercase()))
}
