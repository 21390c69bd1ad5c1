//! Response body inspection: HTML sniffing, message extraction, and the
//! token shapes the backend has shipped over time.

use serde_json::Value;

/// Maximum number of characters of an HTML body kept in error messages.
const SNIPPET_CHARS: usize = 200;

/// Whether a response body is an HTML page rather than a JSON payload.
///
/// The backend renders a crash page as HTML regardless of status code, so
/// both the content-type header and the body prefix are checked.
pub fn looks_like_html(content_type: Option<&str>, body: &str) -> bool {
    if let Some(ct) = content_type
        && ct.to_lowercase().contains("text/html")
    {
        return true;
    }
    let head = body.trim_start().to_lowercase();
    head.starts_with("<!doctype") || head.starts_with("<html")
}

/// Leading snippet of a body for diagnostics.
pub fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= SNIPPET_CHARS {
        return trimmed.to_string();
    }
    let head: String = trimmed.chars().take(SNIPPET_CHARS).collect();
    format!("{head}…")
}

/// Extract the human-readable message from a JSON error body.
///
/// The backend uses `message` but older endpoints use `error`.
pub fn extract_message(body: &Value) -> Option<String> {
    for field in ["message", "error"] {
        if let Some(text) = body.get(field).and_then(Value::as_str)
            && !text.is_empty()
        {
            return Some(text.to_string());
        }
    }
    None
}

/// Extract the field-level validation map from a JSON error body, if any.
pub fn extract_validation_errors(body: &Value) -> Option<Value> {
    for field in ["validationErrors", "errors"] {
        if let Some(map) = body.get(field)
            && map.is_object()
        {
            return Some(map.clone());
        }
    }
    None
}

/// Extract `(access_token, refresh_token)` from a token-bearing response.
///
/// Three shapes are accepted, reflecting backend API drift:
/// `{tokens: {accessToken, refreshToken}}` is canonical, the flat
/// `{accessToken, refreshToken}` and legacy `{token}` shapes are kept as
/// compatibility cases.
pub fn extract_token_pair(body: &Value) -> (Option<String>, Option<String>) {
    if let Some(tokens) = body.get("tokens")
        && tokens.is_object()
    {
        return (
            string_field(tokens, "accessToken"),
            string_field(tokens, "refreshToken"),
        );
    }

    if let Some(access) = string_field(body, "accessToken") {
        return (Some(access), string_field(body, "refreshToken"));
    }

    (string_field(body, "token"), None)
}

fn string_field(value: &Value, field: &str) -> Option<String> {
    value
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_html_detected_by_content_type() {
        assert!(looks_like_html(Some("text/html; charset=utf-8"), "{}"));
        assert!(!looks_like_html(Some("application/json"), "{}"));
    }

    #[test]
    fn test_html_detected_by_body_prefix() {
        assert!(looks_like_html(None, "<!DOCTYPE html><html>boom</html>"));
        assert!(looks_like_html(None, "  <html><body>Fatal error</body>"));
        assert!(!looks_like_html(None, r#"{"message":"ok"}"#));
    }

    #[test]
    fn test_snippet_truncates_long_bodies() {
        let body = "x".repeat(500);
        let s = snippet(&body);
        assert!(s.chars().count() <= SNIPPET_CHARS + 1);
        assert!(s.ends_with('…'));
    }

    #[test]
    fn test_extract_message_prefers_message_over_error() {
        let body = json!({"message": "first", "error": "second"});
        assert_eq!(extract_message(&body), Some("first".to_string()));
        let body = json!({"error": "only"});
        assert_eq!(extract_message(&body), Some("only".to_string()));
        assert_eq!(extract_message(&json!({})), None);
    }

    #[test]
    fn test_extract_validation_errors() {
        let body = json!({"message": "Validation failed", "validationErrors": {"title": "required"}});
        assert_eq!(
            extract_validation_errors(&body),
            Some(json!({"title": "required"}))
        );
        assert_eq!(extract_validation_errors(&json!({"message": "x"})), None);
    }

    #[test]
    fn test_token_pair_canonical_shape() {
        let body = json!({"tokens": {"accessToken": "a", "refreshToken": "r"}});
        assert_eq!(
            extract_token_pair(&body),
            (Some("a".to_string()), Some("r".to_string()))
        );
    }

    #[test]
    fn test_token_pair_flat_shape() {
        let body = json!({"accessToken": "a"});
        assert_eq!(extract_token_pair(&body), (Some("a".to_string()), None));
    }

    #[test]
    fn test_token_pair_legacy_shape() {
        let body = json!({"token": "legacy"});
        assert_eq!(extract_token_pair(&body), (Some("legacy".to_string()), None));
    }

    #[test]
    fn test_token_pair_absent() {
        assert_eq!(extract_token_pair(&json!({"user": {}})), (None, None));
    }
}
