use std::collections::{HashMap, VecDeque};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use loan_eligibility::accounts::User;
use loan_eligibility::prediction::LoanVerdict;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use uuid::Uuid;

pub(crate) const SESSION_COOKIE: &str = "loan_session";
pub(crate) const RECENT_CHECK_LIMIT: usize = 5;
pub(crate) const SESSION_TTL_HOURS: i64 = 12;
pub(crate) const MAX_SESSIONS: usize = 10_000;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Eligibility check remembered for the dashboard; lives only as long as the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct RecentCheck {
    pub(crate) date: NaiveDate,
    pub(crate) result: String,
    pub(crate) banks: String,
}

impl RecentCheck {
    pub(crate) fn from_verdict(verdict: &LoanVerdict, date: NaiveDate) -> Self {
        let banks = if verdict.eligible_banks.is_empty() {
            "-".to_string()
        } else {
            verdict
                .eligible_banks
                .iter()
                .map(|offer| offer.bank.trim_end_matches(" Bank"))
                .collect::<Vec<_>>()
                .join(", ")
        };
        Self {
            date,
            result: verdict.result.clone(),
            banks,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Session {
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) recent_checks: VecDeque<RecentCheck>,
    pub(crate) last_seen: DateTime<Utc>,
}

/// In-process session table keyed by an opaque cookie token.
///
/// Sessions idle longer than the TTL are dropped, and the table never holds
/// more than [`MAX_SESSIONS`] entries; the least recently seen goes first.
#[derive(Clone)]
pub(crate) struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, Session>>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl(Duration::hours(SESSION_TTL_HOURS))
    }
}

impl SessionStore {
    pub(crate) fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Arc::default(),
            ttl,
        }
    }

    pub(crate) fn create(&self, user: &User) -> String {
        let now = Utc::now();
        let token = Uuid::new_v4().simple().to_string();
        let session = Session {
            name: user.name.clone(),
            email: user.email.clone(),
            recent_checks: VecDeque::new(),
            last_seen: now,
        };

        let mut guard = self.sessions.lock().expect("session mutex poisoned");
        self.prune_locked(&mut guard, now);
        if guard.len() >= MAX_SESSIONS {
            let stalest = guard
                .iter()
                .min_by_key(|(_, session)| session.last_seen)
                .map(|(token, _)| token.clone());
            if let Some(stalest) = stalest {
                guard.remove(&stalest);
            }
        }
        guard.insert(token.clone(), session);
        token
    }

    /// Live session for `token`; touching it extends its idle window.
    pub(crate) fn get(&self, token: &str) -> Option<Session> {
        let now = Utc::now();
        let mut guard = self.sessions.lock().expect("session mutex poisoned");
        if guard
            .get(token)
            .is_some_and(|session| self.is_expired(session, now))
        {
            guard.remove(token);
            return None;
        }
        let session = guard.get_mut(token)?;
        session.last_seen = now;
        Some(session.clone())
    }

    pub(crate) fn remove(&self, token: &str) -> Option<Session> {
        self.sessions
            .lock()
            .expect("session mutex poisoned")
            .remove(token)
    }

    /// Drop every session idle past the TTL as of `now`; returns how many went.
    #[cfg(test)]
    pub(crate) fn prune(&self, now: DateTime<Utc>) -> usize {
        let mut guard = self.sessions.lock().expect("session mutex poisoned");
        self.prune_locked(&mut guard, now)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.sessions.lock().expect("session mutex poisoned").len()
    }

    fn prune_locked(&self, sessions: &mut HashMap<String, Session>, now: DateTime<Utc>) -> usize {
        let before = sessions.len();
        sessions.retain(|_, session| !self.is_expired(session, now));
        before - sessions.len()
    }

    fn is_expired(&self, session: &Session, now: DateTime<Utc>) -> bool {
        now - session.last_seen >= self.ttl
    }

    /// Newest first, capped at [`RECENT_CHECK_LIMIT`].
    pub(crate) fn record_check(&self, token: &str, verdict: &LoanVerdict) {
        let mut guard = self.sessions.lock().expect("session mutex poisoned");
        if let Some(session) = guard.get_mut(token) {
            let today = Local::now().date_naive();
            session
                .recent_checks
                .push_front(RecentCheck::from_verdict(verdict, today));
            session.recent_checks.truncate(RECENT_CHECK_LIMIT);
        }
    }

    /// Resolve the session named by the request's cookie, if any.
    pub(crate) fn session_for(&self, headers: &HeaderMap) -> Option<(String, Session)> {
        let token = session_token(headers)?;
        let session = self.get(&token)?;
        Some((token, session))
    }
}

pub(crate) fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

pub(crate) fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax")
}

pub(crate) fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; Path=/; Max-Age=0")
}
