//! Per-player game sessions: question tokens and used hints.
//!
//! Sessions are keyed by the UUID carried in the `x-riddle-session` header.
//! The book is bounded; the least recently seen session is dropped when it
//! fills up.

use lru::LruCache;
use serde::Serialize;
use std::num::NonZeroUsize;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Header carrying the session id in both directions
pub const SESSION_HEADER: &str = "x-riddle-session";

/// Sessions tracked at once
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub tokens_left: u32,
    pub used_hints: Vec<String>,
}

impl Session {
    fn fresh(tokens: u32) -> Self {
        Self {
            tokens_left: tokens,
            used_hints: Vec::new(),
        }
    }
}

/// What `/state` and `/reset` report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub tokens_left: u32,
    pub hints_left: usize,
    pub used_hints: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HintError {
    NoneLeft,
}

pub struct SessionBook {
    sessions: Mutex<LruCache<Uuid, Session>>,
    questions_per_session: u32,
    hints: Vec<String>,
}

impl SessionBook {
    pub fn new(questions_per_session: u32, hints: Vec<String>, max_sessions: usize) -> Self {
        let cap = NonZeroUsize::new(max_sessions).unwrap_or(NonZeroUsize::MIN);
        Self {
            sessions: Mutex::new(LruCache::new(cap)),
            questions_per_session,
            hints,
        }
    }

    /// Parse a client-supplied id, minting a new one when absent or invalid.
    pub fn resolve(header: Option<&str>) -> Uuid {
        header
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
            .unwrap_or_else(Uuid::new_v4)
    }

    fn view(&self, session: &Session) -> SessionView {
        SessionView {
            tokens_left: session.tokens_left,
            hints_left: self.hints.len().saturating_sub(session.used_hints.len()),
            used_hints: session.used_hints.clone(),
        }
    }

    pub async fn state(&self, id: Uuid) -> SessionView {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_or_insert_mut(id, || Session::fresh(self.questions_per_session));
        self.view(session)
    }

    /// Spend one question token and return what is left.
    pub async fn take_token(&self, id: Uuid) -> Result<u32, TokenError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_or_insert_mut(id, || Session::fresh(self.questions_per_session));
        if session.tokens_left == 0 {
            return Err(TokenError::Exhausted);
        }
        session.tokens_left -= 1;
        Ok(session.tokens_left)
    }

    /// Hand out the next unused hint. Hints never cost question tokens.
    pub async fn next_hint(&self, id: Uuid) -> Result<(String, SessionView), HintError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_or_insert_mut(id, || Session::fresh(self.questions_per_session));
        let hint = self
            .hints
            .get(session.used_hints.len())
            .cloned()
            .ok_or(HintError::NoneLeft)?;
        session.used_hints.push(hint.clone());
        Ok((hint, self.view(session)))
    }

    pub async fn reset(&self, id: Uuid) -> SessionView {
        let mut sessions = self.sessions.lock().await;
        let fresh = Session::fresh(self.questions_per_session);
        let view = self.view(&fresh);
        sessions.put(id, fresh);
        view
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(tokens: u32) -> SessionBook {
        SessionBook::new(
            tokens,
            vec!["h1".to_string(), "h2".to_string()],
            DEFAULT_MAX_SESSIONS,
        )
    }

    #[test]
    fn test_resolve_keeps_valid_id() {
        let id = Uuid::new_v4();
        assert_eq!(SessionBook::resolve(Some(&id.to_string())), id);
        assert_ne!(SessionBook::resolve(Some("not-a-uuid")), id);
    }

    #[tokio::test]
    async fn test_tokens_run_out() {
        let book = book(2);
        let id = Uuid::new_v4();
        assert_eq!(book.take_token(id).await, Ok(1));
        assert_eq!(book.take_token(id).await, Ok(0));
        assert_eq!(book.take_token(id).await, Err(TokenError::Exhausted));
        assert_eq!(book.state(id).await.tokens_left, 0);
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let book = book(1);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        book.take_token(a).await.unwrap();
        assert_eq!(book.take_token(b).await, Ok(0));
        assert_eq!(book.len().await, 2);
    }

    #[tokio::test]
    async fn test_hints_do_not_cost_tokens() {
        let book = book(5);
        let id = Uuid::new_v4();
        let (hint, view) = book.next_hint(id).await.unwrap();
        assert_eq!(hint, "h1");
        assert_eq!(view.hints_left, 1);
        assert_eq!(view.tokens_left, 5);
        book.next_hint(id).await.unwrap();
        assert_eq!(book.next_hint(id).await, Err(HintError::NoneLeft));
        assert_eq!(book.state(id).await.used_hints, vec!["h1", "h2"]);
    }

    #[tokio::test]
    async fn test_reset_restores_budget() {
        let book = book(3);
        let id = Uuid::new_v4();
        book.take_token(id).await.unwrap();
        book.next_hint(id).await.unwrap();
        let view = book.reset(id).await;
        assert_eq!(view.tokens_left, 3);
        assert_eq!(view.hints_left, 2);
        assert!(view.used_hints.is_empty());
    }

    #[tokio::test]
    async fn test_book_is_bounded() {
        let book = SessionBook::new(20, Vec::new(), 2);
        for _ in 0..5 {
            book.state(Uuid::new_v4()).await;
        }
        assert_eq!(book.len().await, 2);
    }
}
