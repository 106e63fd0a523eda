//! HMAC-SHA256 rotating token generation and validation.

use ring::{constant_time, hmac};

use crate::clock::unix_now;
use crate::error::{AdmitError, AuthErrorKind};

/// Stateless authority for time-bucketed proof-of-possession tokens.
///
/// A token is the lowercase hex HMAC-SHA256 digest of the current bucket
/// index (`now / bucket_seconds`, rendered in decimal) under the shared
/// secret. Any party holding the secret and a clock within one bucket of
/// the server's recomputes the same digest, so nothing is stored and
/// nothing beyond the secret is shared.
///
/// Holds no mutable state; a single instance can be used from any number
/// of tasks without locking.
pub struct TokenAuthority {
    key: hmac::Key,
    bucket_seconds: u64,
}

impl TokenAuthority {
    /// Create a new token authority.
    ///
    /// Rejects an empty secret and a zero bucket duration; both are
    /// configuration mistakes that must stop the daemon at startup rather
    /// than surface per request.
    pub fn new(secret: &[u8], bucket_seconds: u64) -> Result<Self, AdmitError> {
        if secret.is_empty() {
            return Err(AdmitError::Auth {
                kind: AuthErrorKind::EmptySecret,
            });
        }
        if bucket_seconds == 0 {
            return Err(AdmitError::Config {
                message: "Token bucket duration must be positive".to_string(),
            });
        }

        Ok(Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret),
            bucket_seconds,
        })
    }

    /// The configured rotation granularity in seconds.
    pub fn bucket_seconds(&self) -> u64 {
        self.bucket_seconds
    }

    /// Generate the token for the bucket containing `now`.
    ///
    /// Deterministic: any two instants in the same bucket yield the same
    /// token.
    pub fn generate_at(&self, now: u64) -> String {
        self.digest_for_bucket(now / self.bucket_seconds)
    }

    /// Generate the token for the current wall-clock bucket.
    pub fn generate(&self) -> String {
        self.generate_at(unix_now())
    }

    /// Validate a client-supplied token at the given instant.
    ///
    /// Accepts the current bucket's token and the immediately preceding
    /// bucket's, tolerating clock or network skew of up to one bucket while
    /// capping a captured token's useful lifetime at two bucket durations.
    ///
    /// Both comparisons are constant-time and both always run; neither the
    /// timing nor the result order leaks where a forgery diverged.
    pub fn validate_at(&self, now: u64, client_token: &str) -> bool {
        let bucket = now / self.bucket_seconds;
        let current = self.digest_for_bucket(bucket);
        let previous = self.digest_for_bucket(bucket.saturating_sub(1));

        let matches_current = constant_time_eq(client_token, &current);
        let matches_previous = bucket > 0 && constant_time_eq(client_token, &previous);

        matches_current | matches_previous
    }

    /// Validate a client-supplied token against the wall clock.
    pub fn validate(&self, client_token: &str) -> bool {
        self.validate_at(unix_now(), client_token)
    }

    fn digest_for_bucket(&self, bucket: u64) -> String {
        let tag = hmac::sign(&self.key, bucket.to_string().as_bytes());
        hex::encode(tag.as_ref())
    }
}

/// Constant-time string equality.
///
/// Length is the only thing an observer can learn from timing; token
/// digests are fixed-length so that reveals nothing.
fn constant_time_eq(a: &str, b: &str) -> bool {
    constant_time::verify_slices_are_equal(a.as_bytes(), b.as_bytes()).is_ok()
}
