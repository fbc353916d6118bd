//! Error normalization at the tool boundary.
//!
//! Remote callers never see raw errors. They get a short stable string with a
//! category prefix and a numeric code derived from the tool name, while the
//! full diagnostics go to the error log. Repeated failures of the same tool
//! produce the same code, so operators can grep the log by it.

use crate::config::DEFAULT_ERROR_LOG;
use crate::Error;

/// Ordered keyword table mapping tool names to error categories.
const CATEGORY_PREFIXES: &[(&str, &str)] = &[
    ("chat", "CHAT"),
    ("msg", "MSG"),
    ("contact", "CONTACT"),
    ("group", "GROUP"),
    ("media", "MEDIA"),
    ("profile", "PROFILE"),
    ("auth", "AUTH"),
    ("admin", "ADMIN"),
];

fn category_prefix(function_name: &str) -> &'static str {
    let lower = function_name.to_lowercase();
    for (keyword, prefix) in CATEGORY_PREFIXES {
        if lower.contains(keyword) {
            return prefix;
        }
    }
    "GEN"
}

/// FNV-1a. The std hasher is not guaranteed stable across releases and the
/// code must stay identical between deployments.
fn fnv1a(s: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in s.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Stable error code for a tool name, e.g. `CHAT-ERR-042`.
pub fn error_code(function_name: &str) -> String {
    format!(
        "{}-ERR-{:03}",
        category_prefix(function_name),
        fnv1a(function_name) % 1000
    )
}

/// Log the full error with context and return the user-facing message.
pub fn log_and_format_error(
    function_name: &str,
    error: &Error,
    args: &serde_json::Value,
) -> String {
    let context = match args {
        serde_json::Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", "),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    };

    tracing::error!("{function_name} failed ({context}): {error}");

    format!(
        "An error occurred (code: {}). Check {DEFAULT_ERROR_LOG} for details.",
        error_code(function_name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_is_deterministic_across_errors() {
        let a = log_and_format_error(
            "send_message",
            &Error::Rpc("CHAT_WRITE_FORBIDDEN".to_string()),
            &serde_json::json!({"chat_id": 1}),
        );
        let b = log_and_format_error(
            "send_message",
            &Error::NotFound("peer 1".to_string()),
            &serde_json::json!({"chat_id": 2}),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn prefixes_follow_keyword_table() {
        assert!(error_code("get_chats").starts_with("CHAT-ERR-"));
        assert!(error_code("search_contacts").starts_with("CONTACT-ERR-"));
        assert!(error_code("invite_to_group").starts_with("GROUP-ERR-"));
        assert!(error_code("download_media").starts_with("MEDIA-ERR-"));
        assert!(error_code("update_profile").starts_with("PROFILE-ERR-"));
        assert!(error_code("promote_admin").starts_with("ADMIN-ERR-"));
        // "message" does not contain the keyword "msg"; these fall through.
        assert!(error_code("delete_message").starts_with("GEN-ERR-"));
        assert!(error_code("ban_user").starts_with("GEN-ERR-"));
    }

    #[test]
    fn code_is_three_digits() {
        for name in ["get_chats", "send_message", "x"] {
            let code = error_code(name);
            let digits = code.rsplit('-').next().unwrap();
            assert_eq!(digits.len(), 3);
            assert!(digits.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
