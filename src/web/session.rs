//! Signed cookie session holding the logged-in user name.

use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use sha2::{Digest, Sha512};

pub const SESSION_COOKIE: &str = "session";

/// Session lifetime; renewed on every authenticated request.
pub const SESSION_TTL: cookie::time::Duration = cookie::time::Duration::hours(1);

/// Derive the 64-byte signing key from a secret of any length.
#[must_use]
pub fn derive_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

#[must_use]
pub fn current_user(jar: &SignedCookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_owned())
        .filter(|user| !user.is_empty())
}

/// Store `user` in the session, (re)starting its lifetime.
#[must_use]
pub fn start(jar: SignedCookieJar, user: &str, secure: bool) -> SignedCookieJar {
    jar.add(
        Cookie::build((SESSION_COOKIE, user.to_owned()))
            .path("/")
            .http_only(true)
            .secure(secure)
            .same_site(SameSite::Strict)
            .max_age(SESSION_TTL),
    )
}

#[must_use]
pub fn end(jar: SignedCookieJar) -> SignedCookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}
