//! Common utilities and helper functions
//!
//! This module provides shared utilities used across the application.

pub mod error;
pub mod retry;

/// Mask a secret for logging, keeping only the first `visible` characters
pub fn mask_secret(secret: &str, visible: usize) -> String {
    if secret.is_empty() {
        return String::from("<unset>");
    }
    let prefix: String = secret.chars().take(visible).collect();
    format!("{prefix}****")
}

/// Truncate text to a maximum number of characters
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_len.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}
