//! Time-based one-time passwords (RFC 6238, HMAC-SHA1).
//!
//! The shared secret is used as raw bytes, the way the issuing side hands it
//! out through the environment.

use std::time::{SystemTime, UNIX_EPOCH};

use hmac::digest::{Key, KeyInit};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha1::{Digest, Sha1};
use subtle::ConstantTimeEq;

use crate::config::TotpConfig;

type HmacSha1 = Hmac<Sha1>;

/// Largest accepted drift, in steps, on either side of the current one.
pub const MAX_WINDOW: u64 = 10;

/// Generates and checks TOTP codes for one shared secret.
#[derive(Debug, Clone)]
pub struct TotpVerifier {
    secret: SecretString,
    digits: u32,
    step_secs: u64,
    window: u64,
}

impl TotpVerifier {
    pub fn new(secret: SecretString, digits: u32, step_secs: u64, window: u64) -> Self {
        Self {
            secret,
            digits,
            step_secs: step_secs.max(1),
            window: window.min(MAX_WINDOW),
        }
    }

    pub fn from_config(secret: SecretString, config: &TotpConfig) -> Self {
        Self::new(secret, config.digits, config.step_secs, config.window)
    }

    /// Code for the time step containing `unix_secs`.
    pub fn generate_at(&self, unix_secs: u64) -> String {
        self.code_for_counter(unix_secs / self.step_secs)
    }

    /// Code for the current time step.
    pub fn generate(&self) -> String {
        self.generate_at(now())
    }

    /// Check `code` against the step containing `unix_secs`, plus `window`
    /// steps on either side.
    pub fn verify_at(&self, code: &str, unix_secs: u64) -> bool {
        if code.len() != self.digits as usize || !code.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }

        let counter = unix_secs / self.step_secs;
        let first = counter.saturating_sub(self.window);
        let last = counter.saturating_add(self.window);

        // Every candidate is compared so timing does not reveal which step matched.
        let mut matched = subtle::Choice::from(0);
        for c in first..=last {
            matched |= self.code_for_counter(c).as_bytes().ct_eq(code.as_bytes());
        }
        matched.into()
    }

    pub fn verify(&self, code: &str) -> bool {
        self.verify_at(code, now())
    }

    /// HMAC keyed per RFC 2104: long secrets are hashed, short ones zero-padded
    /// to the block size.
    fn keyed_mac(&self) -> HmacSha1 {
        let secret = self.secret.expose_secret().as_bytes();
        let mut key = Key::<HmacSha1>::default();
        if secret.len() > key.len() {
            let digest = Sha1::digest(secret);
            key[..digest.len()].copy_from_slice(&digest);
        } else {
            key[..secret.len()].copy_from_slice(secret);
        }
        <HmacSha1 as KeyInit>::new(&key)
    }

    fn code_for_counter(&self, counter: u64) -> String {
        let mut mac = self.keyed_mac();
        mac.update(&counter.to_be_bytes());
        let digest = mac.finalize().into_bytes();

        let offset = (digest[digest.len() - 1] & 0x0f) as usize;
        let binary = u32::from_be_bytes([
            digest[offset] & 0x7f,
            digest[offset + 1],
            digest[offset + 2],
            digest[offset + 3],
        ]);
        let code = binary % 10u32.pow(self.digits);
        format!("{:0width$}", code, width = self.digits as usize)
    }
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RFC_SECRET: &str = "12345678901234567890";

    fn verifier(digits: u32, window: u64) -> TotpVerifier {
        TotpVerifier::new(SecretString::new(RFC_SECRET.to_string()), digits, 30, window)
    }

    #[test]
    fn test_rfc6238_sha1_vectors() {
        let totp = verifier(8, 0);
        assert_eq!(totp.generate_at(59), "94287082");
        assert_eq!(totp.generate_at(1111111109), "07081804");
        assert_eq!(totp.generate_at(1111111111), "14050471");
        assert_eq!(totp.generate_at(1234567890), "89005924");
        assert_eq!(totp.generate_at(2000000000), "69279037");
        assert_eq!(totp.generate_at(20000000000), "65353130");
    }

    #[test]
    fn test_six_digit_codes() {
        let totp = verifier(6, 0);
        assert_eq!(totp.generate_at(59), "287082");
        assert_eq!(totp.generate_at(1111111109), "081804");
        assert!(totp.verify_at("081804", 1111111109));
    }

    #[test]
    fn test_window() {
        let strict = verifier(6, 0);
        let lenient = verifier(6, 1);
        let previous = strict.generate_at(1111111109 - 30);

        assert!(!strict.verify_at(&previous, 1111111109));
        assert!(lenient.verify_at(&previous, 1111111109));
        assert!(!lenient.verify_at(&strict.generate_at(1111111109 - 60), 1111111109));
    }

    #[test]
    fn test_default_config_accepts_only_current_step() {
        let totp = TotpVerifier::from_config(
            SecretString::new(RFC_SECRET.to_string()),
            &TotpConfig::default(),
        );
        let now = 1111111109;

        assert!(totp.verify_at(&totp.generate_at(now), now));
        assert!(!totp.verify_at(&totp.generate_at(now - 30), now));
        assert!(!totp.verify_at(&totp.generate_at(now + 30), now));
    }

    #[test]
    fn test_window_is_clamped() {
        let totp = TotpVerifier::new(SecretString::new(RFC_SECRET.to_string()), 6, 30, u64::MAX);
        let now = 1234567890;

        assert!(totp.verify_at(&totp.generate_at(now - 30 * MAX_WINDOW), now));
        assert!(!totp.verify_at(&totp.generate_at(now - 30 * (MAX_WINDOW + 1)), now));
    }

    #[test]
    fn test_key_derivation_matches_hmac() {
        let long_secret = "k".repeat(100);
        for secret in [RFC_SECRET.to_string(), long_secret, String::new()] {
            let totp = TotpVerifier::new(SecretString::new(secret.clone()), 6, 30, 0);
            let mut ours = totp.keyed_mac();
            let mut reference = <HmacSha1 as Mac>::new_from_slice(secret.as_bytes()).unwrap();
            ours.update(b"counter");
            reference.update(b"counter");
            assert_eq!(ours.finalize().into_bytes(), reference.finalize().into_bytes());
        }
    }

    #[test]
    fn test_rejects_malformed_codes() {
        let totp = verifier(6, 1);
        let code = totp.generate_at(1234567890);

        assert!(!totp.verify_at("", 1234567890));
        assert!(!totp.verify_at(&format!("{}0", code), 1234567890));
        assert!(!totp.verify_at(&code[..5], 1234567890));
        assert!(!totp.verify_at("12a456", 1234567890));
        assert!(!totp.verify_at(&format!(" {}", &code[1..]), 1234567890));
    }

    #[test]
    fn test_current_code_verifies() {
        let totp = verifier(6, 1);
        assert!(totp.verify(&totp.generate()));
    }

    #[test]
    fn test_debug_hides_secret() {
        let totp = verifier(6, 1);
        assert!(!format!("{:?}", totp).contains(RFC_SECRET));
    }
}
