//! Structured-fragment extraction and value encoding.
//!
//! Secrets stored in free-form fields (typically `Notes`) often hold several
//! values as a small YAML document:
//!
//! ```yaml
//! api_key: abc123
//! port: 5432
//! tls: true
//! ```
//!
//! A handle with a subfield picks one top-level key out of such a document.
//! Whatever is substituted, whole secret or extracted value, is JSON-encoded
//! first so it lands correctly when the surrounding document is JSON or YAML.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::core::ResolveError;
use crate::placeholder::Handle;

/// Parse `credential` as a YAML mapping.
///
/// An empty or whitespace-only secret parses as an empty mapping, so a
/// subfield lookup on it reports the missing key rather than a parse error.
/// When the text holds several `---` separated documents, only the first is
/// read.
///
/// # Errors
///
/// Returns [`ResolveError::FragmentParse`] when the text is not valid YAML or
/// its top level is not a mapping.
pub fn parse_fragment(entry: &str, field: &str, credential: &str) -> Result<Mapping, ResolveError> {
    let parse_error = |reason: String| ResolveError::FragmentParse {
        entry: entry.to_string(),
        field: field.to_string(),
        reason,
    };

    if credential.trim().is_empty() {
        return Ok(Mapping::new());
    }

    let value: Value = match serde_yaml::Deserializer::from_str(credential).next() {
        Some(document) => Value::deserialize(document),
        None => serde_yaml::from_str(credential),
    }
    .map_err(|e| parse_error(describe_yaml_error(&e)))?;

    match value {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Ok(Mapping::new()),
        other => Err(parse_error(format!("expected key/value pairs, found {}", kind_of(&other)))),
    }
}

/// Extract `key` from the YAML document in `credential`.
///
/// Keys are compared as text, so `8080: http` or `true: on` are found by the
/// subfields `8080` and `true`.
///
/// # Errors
///
/// - [`ResolveError::FragmentParse`] if the credential is not a mapping
/// - [`ResolveError::MissingFragmentKey`] if `key` is not a top-level key
pub fn extract_fragment(
    entry: &str,
    field: &str,
    credential: &str,
    key: &str,
) -> Result<Value, ResolveError> {
    let mut mapping = parse_fragment(entry, field, credential)?;

    if let Some(value) = mapping.remove(key) {
        return Ok(value);
    }

    let scalar_key =
        mapping.keys().find(|candidate| scalar_text(candidate).as_deref() == Some(key)).cloned();

    scalar_key.and_then(|found| mapping.remove(&found)).ok_or_else(|| ResolveError::MissingFragmentKey {
        entry: entry.to_string(),
        field: field.to_string(),
        key: key.to_string(),
    })
}

/// JSON-encode a resolved value for substitution.
///
/// # Errors
///
/// Returns [`ResolveError::Encoding`] when the value has no JSON form, such as
/// a nested mapping with non-string keys.
pub fn encode_value<T: Serialize + ?Sized>(handle: &Handle, value: &T) -> Result<String, ResolveError> {
    serde_json::to_string(value).map_err(|e| ResolveError::Encoding {
        handle: handle.to_string(),
        reason: e.to_string(),
    })
}

/// Resolve a handle against its already fetched credential.
///
/// Without a subfield the whole credential is encoded as a JSON string;
/// with one, the named key is extracted and encoded.
///
/// # Errors
///
/// Propagates errors from [`extract_fragment`] and [`encode_value`].
pub fn render(handle: &Handle, credential: &str) -> Result<String, ResolveError> {
    match handle.subfield() {
        None => encode_value(handle, credential),
        Some(key) => {
            let value = extract_fragment(handle.entry(), handle.field(), credential, key)?;
            encode_value(handle, &value)
        }
    }
}

/// Describe a YAML error by position only; the message of some serde_yaml
/// errors quotes the offending input, which here is a secret.
fn describe_yaml_error(error: &serde_yaml::Error) -> String {
    match error.location() {
        Some(location) => {
            format!("invalid YAML at line {} column {}", location.line(), location.column())
        }
        None => "invalid YAML".to_string(),
    }
}

/// Text form of a scalar mapping key.
fn scalar_text(key: &Value) -> Option<String> {
    match key {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a plain string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
