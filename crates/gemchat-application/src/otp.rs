//! Local OTP issuer.
//!
//! Codes are generated in-process and handed back to the caller for display;
//! nothing is delivered over SMS.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rand::Rng;
use tracing::{debug, info};
use uuid::Uuid;

use gemchat_core::clock::{Clock, SystemClock};
use gemchat_core::otp::{OtpChallenge, OtpService, OtpVerification};

/// In-memory [`OtpService`] with a fixed validity window.
pub struct LocalOtpService {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    challenges: Mutex<HashMap<String, OtpChallenge>>,
}

impl LocalOtpService {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            ttl,
            challenges: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of challenges still awaiting verification.
    pub fn open_challenges(&self) -> usize {
        self.challenges
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

impl OtpService for LocalOtpService {
    fn request_otp(&self, phone: &str, country_code: &str) -> OtpChallenge {
        let now = self.clock.now_millis();
        let challenge = OtpChallenge {
            id: Uuid::new_v4().to_string(),
            phone: phone.to_string(),
            country_code: country_code.to_string(),
            code: generate_code(),
            expires_at: now + self.ttl.as_millis() as i64,
        };

        let mut challenges = self.challenges.lock().unwrap_or_else(PoisonError::into_inner);
        challenges.retain(|_, c| !c.is_expired_at(now));
        challenges.insert(challenge.id.clone(), challenge.clone());

        info!(challenge_id = %challenge.id, "OTP issued");
        challenge
    }

    fn verify_otp(&self, challenge_id: &str, code: &str) -> OtpVerification {
        let now = self.clock.now_millis();
        let mut challenges = self.challenges.lock().unwrap_or_else(PoisonError::into_inner);

        let Some(challenge) = challenges.get(challenge_id) else {
            debug!(challenge_id, "Unknown OTP challenge");
            return OtpVerification::UnknownChallenge;
        };

        if challenge.is_expired_at(now) {
            challenges.remove(challenge_id);
            return OtpVerification::Expired;
        }

        if challenge.code != code.trim() {
            debug!(challenge_id, "OTP mismatch");
            return OtpVerification::Mismatch;
        }

        match challenges.remove(challenge_id) {
            Some(c) => OtpVerification::Verified {
                phone: c.phone,
                country_code: c.country_code,
            },
            None => OtpVerification::UnknownChallenge,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gemchat_core::clock::ManualClock;
    use gemchat_core::otp::OTP_CODE_LEN;

    fn service() -> (LocalOtpService, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        (
            LocalOtpService::with_clock(Duration::from_secs(30), clock.clone()),
            clock,
        )
    }

    #[test]
    fn test_code_shape() {
        let (service, _) = service();
        for _ in 0..50 {
            let challenge = service.request_otp("5551234567", "+1");
            assert_eq!(challenge.code.len(), OTP_CODE_LEN);
            assert!(challenge.code.chars().all(|c| c.is_ascii_digit()));
            assert!(!challenge.code.starts_with('0'));
            assert_eq!(challenge.expires_at, 1_030_000);
        }
    }

    #[test]
    fn test_verify_consumes_challenge() {
        let (service, _) = service();
        let challenge = service.request_otp("5551234567", "+1");

        let result = service.verify_otp(&challenge.id, &format!(" {} ", challenge.code));
        assert_eq!(
            result,
            OtpVerification::Verified {
                phone: "5551234567".to_string(),
                country_code: "+1".to_string(),
            }
        );
        assert_eq!(
            service.verify_otp(&challenge.id, &challenge.code),
            OtpVerification::UnknownChallenge
        );
    }

    #[test]
    fn test_mismatch_keeps_challenge_open() {
        let (service, _) = service();
        let challenge = service.request_otp("5551234567", "+1");
        let wrong = if challenge.code == "123456" { "654321" } else { "123456" };

        assert_eq!(service.verify_otp(&challenge.id, wrong), OtpVerification::Mismatch);
        assert!(service.verify_otp(&challenge.id, &challenge.code).is_verified());
    }

    #[test]
    fn test_expired_code_is_rejected() {
        let (service, clock) = service();
        let challenge = service.request_otp("5551234567", "+1");

        clock.advance(30_000);

        assert_eq!(
            service.verify_otp(&challenge.id, &challenge.code),
            OtpVerification::Expired
        );
        assert_eq!(service.open_challenges(), 0);
    }

    #[test]
    fn test_new_request_prunes_expired() {
        let (service, clock) = service();
        service.request_otp("5551234567", "+1");
        clock.advance(31_000);
        service.request_otp("5551234567", "+1");
        assert_eq!(service.open_challenges(), 1);
    }
}
