//! Login session cache.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::source::SourceError;

/// Name of the cookie that proves a successful login.
const AUTH_COOKIE: &str = "pass";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct NcoreSession {
    /// Value for the `Cookie` request header.
    pub cookie: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NcoreSession {
    /// Sessions without a known expiry are never reused.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|expires_at| now < expires_at - Duration::seconds(1))
    }
}

/// Sessions keyed by credential pair. Owned by one source instance.
#[derive(Default)]
pub(super) struct SessionStore {
    sessions: Mutex<HashMap<(String, String), NcoreSession>>,
}

impl SessionStore {
    pub async fn valid_cookie(&self, username: &str, password: &str) -> Option<String> {
        let sessions = self.sessions.lock().await;
        sessions
            .get(&(username.to_string(), password.to_string()))
            .filter(|s| s.is_valid_at(Utc::now()))
            .map(|s| s.cookie.clone())
    }

    pub async fn store(&self, username: &str, password: &str, session: NcoreSession) {
        self.sessions
            .lock()
            .await
            .insert((username.to_string(), password.to_string()), session);
    }
}

/// One cookie set by the login response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct LoginCookie {
    pub name: String,
    pub value: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl LoginCookie {
    /// `Max-Age` wins over `Expires`.
    pub fn from_response(cookie: &reqwest::cookie::Cookie<'_>, now: DateTime<Utc>) -> Self {
        let expires_at = cookie
            .max_age()
            .and_then(|age| Duration::from_std(age).ok())
            .map(|age| now + age)
            .or_else(|| cookie.expires().map(DateTime::<Utc>::from));

        Self {
            name: cookie.name().to_string(),
            value: cookie.value().to_string(),
            expires_at,
        }
    }
}

/// Build a session from the login response's cookies.
///
/// Fails with [`SourceError::Auth`] unless a live `pass` cookie was set.
/// The session expires with the `pass` cookie.
pub(super) fn parse_session(
    cookies: impl IntoIterator<Item = LoginCookie>,
) -> Result<NcoreSession, SourceError> {
    let mut pairs = Vec::new();
    let mut expires_at = None;
    let mut authenticated = false;

    for cookie in cookies {
        if cookie.name == AUTH_COOKIE {
            if cookie.value.is_empty() || cookie.value == "deleted" {
                continue;
            }
            authenticated = true;
            expires_at = cookie.expires_at;
        }
        pairs.push(format!("{}={}", cookie.name, cookie.value));
    }

    if !authenticated {
        return Err(SourceError::Auth(
            "login response did not set a session cookie".to_string(),
        ));
    }

    Ok(NcoreSession {
        cookie: pairs.join("; "),
        expires_at,
    })
}
