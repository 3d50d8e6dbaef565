//! Anti-forgery tokens bound to a visitor.
//!
//! A token is an HMAC-SHA256 over the action name, the visitor token and a time
//! tick that advances every [`TICK_SECS`]. Tokens from the current and the
//! previous tick are accepted, so a token lives between 12 and 24 hours.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Action name every widget token is issued for.
pub const TIMER_NONCE_ACTION: &str = "post_display_timer_nonce";

/// Half of a token's maximum lifetime.
pub const TICK_SECS: i64 = 12 * 60 * 60;

/// Bytes of the MAC kept in the encoded token.
const TOKEN_BYTES: usize = 12;

pub struct NonceKeys {
    secret: Vec<u8>,
}

impl NonceKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
        }
    }

    /// Issue a token for `visitor` valid from now.
    pub fn issue(&self, visitor: &str) -> String {
        self.issue_at(visitor, chrono::Utc::now().timestamp())
    }

    pub fn verify(&self, visitor: &str, token: &str) -> bool {
        self.verify_at(visitor, token, chrono::Utc::now().timestamp())
    }

    pub fn issue_at(&self, visitor: &str, unix_secs: i64) -> String {
        let tag = self.mac(visitor, tick(unix_secs)).finalize().into_bytes();
        URL_SAFE_NO_PAD.encode(&tag[..TOKEN_BYTES])
    }

    pub fn verify_at(&self, visitor: &str, token: &str, unix_secs: i64) -> bool {
        let Ok(presented) = URL_SAFE_NO_PAD.decode(token.trim()) else {
            return false;
        };
        if presented.len() != TOKEN_BYTES {
            return false;
        }

        let current = tick(unix_secs);
        [current, current - 1].into_iter().any(|t| {
            self.mac(visitor, t)
                .verify_truncated_left(&presented)
                .is_ok()
        })
    }

    fn mac(&self, visitor: &str, tick: i64) -> Hmac<Sha256> {
        let mut mac =
            Hmac::<Sha256>::new_from_slice(&self.secret).expect("HMAC accepts any key length");
        mac.update(format!("{TIMER_NONCE_ACTION}|{visitor}|{tick}").as_bytes());
        mac
    }
}

fn tick(unix_secs: i64) -> i64 {
    unix_secs.div_euclid(TICK_SECS)
}
