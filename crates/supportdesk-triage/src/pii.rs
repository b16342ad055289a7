//! PII redaction applied before text leaves the process
//!
//! Best-effort masking only: the patterns are deliberately coarse and are
//! not a security boundary.

use regex::Regex;
use supportdesk_core::{Error, Result};

pub const EMAIL_TOKEN: &str = "<email>";
pub const PHONE_TOKEN: &str = "<phone>";
pub const IBAN_TOKEN: &str = "<iban>";

/// Masks e-mail addresses, phone numbers and IBAN-like tokens
#[derive(Debug, Clone)]
pub struct PiiRedactor {
    email_regex: Regex,
    phone_regex: Regex,
    iban_regex: Regex,
}

impl PiiRedactor {
    /// Create a new redactor
    pub fn new() -> Result<Self> {
        Ok(Self {
            email_regex: Regex::new(r"(?i)[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}")
                .map_err(|e| {
                    Error::config(format!("Failed to compile email regex: {}", e))
                })?,
            // digits separated by whitespace, parentheses, hyphens or U+2010..U+2014 dashes
            phone_regex: Regex::new(r"\+?[0-9][0-9\s()\-\u{2010}-\u{2014}]{6,}[0-9]")
                .map_err(|e| {
                    Error::config(format!("Failed to compile phone regex: {}", e))
                })?,
            iban_regex: Regex::new(r"(?-u:\b)[A-Z]{2}[0-9]{2}[A-Z0-9]{1,30}(?-u:\b)")
                .map_err(|e| {
                    Error::config(format!("Failed to compile IBAN regex: {}", e))
                })?,
        })
    }

    /// Replace every match with its placeholder token.
    ///
    /// E-mails are masked first, then phone numbers, then IBANs.
    pub fn redact(&self, text: &str) -> String {
        let text = self.email_regex.replace_all(text, EMAIL_TOKEN);
        let text = self.phone_regex.replace_all(&text, PHONE_TOKEN);
        let text = self.iban_regex.replace_all(&text, IBAN_TOKEN);
        text.into_owned()
    }

}
