pub mod redactor;
pub mod macros;
pub mod config;

pub use redactor::*;
pub use config::*;

/// Logging helpers with automatic PII redaction
///
/// User profiles in the quality system carry e-mail addresses, and requests
/// carry client IPs. Anything that ends up in a log line goes through
/// [`PiiRedactor`] first so that log aggregation never stores them in clear.
///
/// # Detected Data Types
///
/// - **Email Addresses**: ana.garcia@empresa.com → EMAIL[hash] or a***@e***
/// - **Phone Numbers**: (555) 123-4567 → (***) ***-****
/// - **IP Addresses**: 192.168.1.1 → 192.***.***.1
/// - **Custom Patterns**: configurable regex replacements
///
/// # Example
///
/// ```rust
/// use logger_redacted::{redact, redacted_info};
///
/// let line = redact("Sign-in for ana.garcia@empresa.com");
/// assert!(!line.contains("ana.garcia@empresa.com"));
///
/// redacted_info!("User {} signed in", "ana.garcia@empresa.com");
/// ```
pub fn redact(text: &str) -> String {
    DEFAULT_REDACTOR.redact(text)
}
