//! One-time-password challenge contract.

use serde::{Deserialize, Serialize};

/// Number of digits in a generated code.
pub const OTP_CODE_LEN: usize = 6;

/// An issued OTP challenge.
///
/// `code` is carried back to the caller because codes are shown on screen
/// instead of being delivered by SMS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpChallenge {
    pub id: String,
    pub phone: String,
    pub country_code: String,
    pub code: String,
    /// Unix epoch milliseconds after which the code is rejected.
    pub expires_at: i64,
}

impl OtpChallenge {
    pub fn is_expired_at(&self, now_millis: i64) -> bool {
        now_millis >= self.expires_at
    }

    /// Whole seconds left before expiry, rounded up.
    pub fn remaining_secs(&self, now_millis: i64) -> u64 {
        let left = self.expires_at - now_millis;
        if left <= 0 {
            0
        } else {
            ((left + 999) / 1000) as u64
        }
    }
}

/// Outcome of checking a code against a challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OtpVerification {
    /// Code matched; the challenge is consumed.
    Verified { phone: String, country_code: String },
    /// Wrong code; the challenge stays open for another attempt.
    Mismatch,
    /// The challenge outlived its validity window.
    Expired,
    /// No such challenge (never issued, or already consumed).
    UnknownChallenge,
}

impl OtpVerification {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified { .. })
    }
}

/// Issues and verifies OTP challenges.
pub trait OtpService: Send + Sync {
    fn request_otp(&self, phone: &str, country_code: &str) -> OtpChallenge;

    fn verify_otp(&self, challenge_id: &str, code: &str) -> OtpVerification;
}
