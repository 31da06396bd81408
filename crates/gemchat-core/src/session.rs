//! Logged-in identity.

use serde::{Deserialize, Serialize};

/// The identity established by a successful OTP verification.
///
/// Absence of a `Session` in the store means the user is logged out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Local phone number as typed by the user (no dial prefix).
    pub phone: String,
    /// Dial prefix, e.g. `"+1"`.
    pub country_code: String,
}

impl Session {
    pub fn new(phone: impl Into<String>, country_code: impl Into<String>) -> Self {
        Self {
            phone: phone.into(),
            country_code: country_code.into(),
        }
    }

    /// Dial prefix and number joined for display, e.g. `"+1 5551234567"`.
    pub fn display_number(&self) -> String {
        format!("{} {}", self.country_code, self.phone)
    }
}
