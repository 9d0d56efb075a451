//! Text formatting utilities.

use std::time::Duration;

/// Characters of failing content quoted in ingestion error messages.
pub const PREVIEW_LENGTH: usize = 50;

/// First [`PREVIEW_LENGTH`] characters of `text`, with an ellipsis when
/// truncated. Cuts on `char` boundaries.
pub fn content_preview(text: &str) -> String {
    let mut preview: String = text.chars().take(PREVIEW_LENGTH).collect();
    if text.chars().count() > PREVIEW_LENGTH {
        preview.push_str("...");
    }
    preview
}

/// Human-readable uptime, e.g. "2 days, 3 hours, 10 minutes, 5 seconds".
pub fn format_uptime(uptime: Duration) -> String {
    let seconds = uptime.as_secs();
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{} days", days));
    }
    if hours % 24 > 0 {
        parts.push(format!("{} hours", hours % 24));
    }
    if minutes % 60 > 0 {
        parts.push(format!("{} minutes", minutes % 60));
    }
    if seconds % 60 > 0 {
        parts.push(format!("{} seconds", seconds % 60));
    }

    if parts.is_empty() {
        "0 seconds".to_string()
    } else {
        parts.join(", ")
    }
}
