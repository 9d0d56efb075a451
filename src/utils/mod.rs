//! Utility modules.

pub mod text;

pub use text::{content_preview, format_uptime};
