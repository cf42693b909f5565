//! Signed session cookies.
//!
//! The cookie is the only record of a session; there is no server-side
//! table. Its value is `base64url(payload) "." base64url(hmac_sha256(payload))`
//! where the payload is a small JSON object carrying the `authed` flag and
//! the issue time. Anything that fails to decode, fails signature
//! verification, or is older than the configured max age reads as "no
//! session".

use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::{header, HeaderMap, HeaderValue};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session";

/// Session payload stored in the cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub authed: bool,
    /// Issue time, seconds since the Unix epoch.
    pub iat: u64,
}

impl Session {
    /// An authenticated session issued now.
    pub fn authed_now() -> Self {
        Self {
            authed: true,
            iat: epoch_secs(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("malformed session cookie")]
    Malformed,
    #[error("session signature mismatch")]
    BadSignature,
    #[error("session expired")]
    Expired,
}

/// Signs, verifies and renders the session cookie.
#[derive(Clone)]
pub struct SessionCodec {
    key: Vec<u8>,
    max_age_secs: u64,
    secure: bool,
}

impl std::fmt::Debug for SessionCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCodec")
            .field("max_age_secs", &self.max_age_secs)
            .field("secure", &self.secure)
            .finish_non_exhaustive()
    }
}

impl SessionCodec {
    pub fn new(secret: &str, max_age_secs: u64, secure: bool) -> Self {
        Self {
            key: secret.as_bytes().to_vec(),
            max_age_secs,
            secure,
        }
    }

    fn mac(&self) -> HmacSha256 {
        <HmacSha256 as KeyInit>::new_from_slice(&self.key)
            .expect("HMAC-SHA256 accepts keys of any length")
    }

    /// Encode and sign a session into a cookie value.
    pub fn sign(&self, session: &Session) -> String {
        let payload = serde_json::to_vec(session).unwrap_or_default();
        let payload = URL_SAFE_NO_PAD.encode(payload);

        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        format!("{payload}.{signature}")
    }

    /// Verify a cookie value and decode the session it carries.
    pub fn verify(&self, value: &str) -> Result<Session, SessionError> {
        self.verify_at(value, epoch_secs())
    }

    fn verify_at(&self, value: &str, now: u64) -> Result<Session, SessionError> {
        let (payload, signature) = value.split_once('.').ok_or(SessionError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| SessionError::Malformed)?;

        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| SessionError::BadSignature)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| SessionError::Malformed)?;
        let session: Session =
            serde_json::from_slice(&payload).map_err(|_| SessionError::Malformed)?;

        if now.saturating_sub(session.iat) > self.max_age_secs {
            return Err(SessionError::Expired);
        }
        Ok(session)
    }

    /// Read the session from a request's `Cookie` headers.
    ///
    /// `Ok(None)` means no session cookie was sent.
    pub fn read(&self, headers: &HeaderMap) -> Result<Option<Session>, SessionError> {
        match cookie_value(headers, SESSION_COOKIE) {
            Some(value) => self.verify(value).map(Some),
            None => Ok(None),
        }
    }

    /// `Set-Cookie` value establishing `session`.
    pub fn set_cookie(&self, session: &Session) -> HeaderValue {
        let value = format!(
            "{SESSION_COOKIE}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax{}",
            self.sign(session),
            self.max_age_secs,
            if self.secure { "; Secure" } else { "" },
        );
        HeaderValue::from_str(&value).unwrap_or_else(|_| self.clear_cookie())
    }

    /// `Set-Cookie` value that removes the session cookie.
    pub fn clear_cookie(&self) -> HeaderValue {
        if self.secure {
            HeaderValue::from_static(
                "session=; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly; SameSite=Lax; Secure",
            )
        } else {
            HeaderValue::from_static(
                "session=; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly; SameSite=Lax",
            )
        }
    }
}

/// Find a cookie by name across all `Cookie` headers.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name).then_some(value)
        })
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
