//! OTP login flow on top of the chat store.

use std::sync::Arc;

use tracing::info;

use gemchat_core::error::{ChatError, Result};
use gemchat_core::otp::{OtpChallenge, OtpService, OtpVerification};
use gemchat_core::session::Session;

use crate::{SharedStore, lock_store};

/// Minimum phone length accepted by the login form.
pub const MIN_PHONE_LEN: usize = 6;

/// Validates the login form, issues challenges and opens the session.
pub struct AuthService {
    otp: Arc<dyn OtpService>,
    store: SharedStore,
}

impl AuthService {
    pub fn new(otp: Arc<dyn OtpService>, store: SharedStore) -> Self {
        Self { otp, store }
    }

    /// Issues a challenge for the given number.
    ///
    /// # Errors
    ///
    /// `Validation` when the country code is blank or the phone has fewer
    /// than [`MIN_PHONE_LEN`] characters after trimming.
    pub fn request_otp(&self, country_code: &str, phone: &str) -> Result<OtpChallenge> {
        let country_code = country_code.trim();
        let phone = phone.trim();

        if country_code.is_empty() {
            return Err(ChatError::validation("Select a country code"));
        }
        if phone.chars().count() < MIN_PHONE_LEN {
            return Err(ChatError::validation(format!(
                "Phone number must be at least {} characters",
                MIN_PHONE_LEN
            )));
        }

        Ok(self.otp.request_otp(phone, country_code))
    }

    /// Checks `code` and, on success, logs the user in.
    pub fn verify(&self, challenge_id: &str, code: &str) -> OtpVerification {
        let outcome = self.otp.verify_otp(challenge_id, code);
        if let OtpVerification::Verified {
            phone,
            country_code,
        } = &outcome
        {
            lock_store(&self.store).login(Session::new(phone.clone(), country_code.clone()));
            info!("Login verified");
        }
        outcome
    }

    /// Clears the session. Chatrooms stay on the device.
    pub fn logout(&self) {
        lock_store(&self.store).logout();
    }

    pub fn is_logged_in(&self) -> bool {
        lock_store(&self.store).is_logged_in()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::otp::LocalOtpService;
    use gemchat_core::state::{AppSnapshot, StateRepository};
    use gemchat_core::store::ChatStore;
    use std::sync::Mutex;
    use std::time::Duration;

    struct NullRepository;

    impl StateRepository for NullRepository {
        fn load(&self) -> Result<Option<AppSnapshot>> {
            Ok(None)
        }
        fn save(&self, _snapshot: &AppSnapshot) -> Result<()> {
            Ok(())
        }
        fn clear(&self) -> Result<()> {
            Ok(())
        }
    }

    fn service() -> AuthService {
        let store = Arc::new(Mutex::new(ChatStore::load(Arc::new(NullRepository))));
        AuthService::new(Arc::new(LocalOtpService::new(Duration::from_secs(30))), store)
    }

    #[test]
    fn test_form_validation() {
        let auth = service();

        let err = auth.request_otp("", "5551234567").unwrap_err();
        assert!(err.is_validation());

        let err = auth.request_otp("+1", " 12345 ").unwrap_err();
        assert!(err.is_validation());

        assert!(auth.request_otp("+91", "123456").is_ok());
    }

    #[test]
    fn test_verified_code_logs_in() {
        let auth = service();
        let challenge = auth.request_otp("+1", "5551234567").unwrap();
        assert!(!auth.is_logged_in());

        assert!(auth.verify(&challenge.id, &challenge.code).is_verified());
        assert!(auth.is_logged_in());
        let store = lock_store(&auth.store);
        let session = store.session().unwrap();
        assert_eq!(session.phone, "5551234567");
        assert_eq!(session.country_code, "+1");
    }

    #[test]
    fn test_mismatch_does_not_log_in() {
        let auth = service();
        let challenge = auth.request_otp("+1", "5551234567").unwrap();
        let wrong = if challenge.code == "111111" { "222222" } else { "111111" };

        assert_eq!(auth.verify(&challenge.id, wrong), OtpVerification::Mismatch);
        assert!(!auth.is_logged_in());
    }

    #[test]
    fn test_logout() {
        let auth = service();
        let challenge = auth.request_otp("+1", "5551234567").unwrap();
        auth.verify(&challenge.id, &challenge.code);

        auth.logout();

        assert!(!auth.is_logged_in());
    }
}
