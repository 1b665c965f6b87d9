//! Session store: the single source of truth for pairing state
//!
//! Tracks a `UserSession` per connected user and owns every transition of
//! `partner_id`. Pairing links are only created by `pair` and only removed
//! by `clear_pairing`, both of which update the two sides together, so the
//! symmetry invariant (A paired to B implies B paired to A) holds after
//! every method returns.

use std::collections::HashMap;
use std::time::Instant;

use crate::error::AppError;
use crate::types::UserId;

/// Pairing state of a user session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Known to the server, neither searching nor chatting
    Idle,
    /// In the waiting pool, searching for a partner
    Waiting,
    /// Chatting with `partner_id`
    Paired,
}

/// Per-user pairing state record
#[derive(Debug)]
pub struct UserSession {
    /// Owner of this session
    pub user_id: UserId,
    /// Current position in the Idle/Waiting/Paired state machine
    pub state: SessionState,
    /// Current partner; `Some` iff state is `Paired`
    pub partner_id: Option<UserId>,
    /// First registration time
    pub joined_at: Instant,
    /// Start of the current pairing, reset on each match
    pub session_started_at: Option<Instant>,
    /// Messages relayed to the partner in the current pairing
    pub messages_sent: u64,
}

impl UserSession {
    /// Create a fresh idle session for a newly registered user
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            state: SessionState::Idle,
            partner_id: None,
            joined_at: Instant::now(),
            session_started_at: None,
            messages_sent: 0,
        }
    }
}

/// In-memory session store
///
/// Owned exclusively by the engine actor; every method takes `&mut self`,
/// and the actor processes one command at a time, so each call is an atomic
/// unit with respect to all other callers.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<UserId, UserSession>,
}

impl SessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    /// Register a user, creating an idle session if none exists.
    /// Idempotent: an existing session is left untouched.
    pub fn register(&mut self, user_id: UserId) {
        self.sessions
            .entry(user_id)
            .or_insert_with(|| UserSession::new(user_id));
    }

    /// Look up a session
    pub fn get(&self, user_id: UserId) -> Option<&UserSession> {
        self.sessions.get(&user_id)
    }

    /// Current partner of a user, if paired
    pub fn partner_of(&self, user_id: UserId) -> Option<UserId> {
        self.sessions.get(&user_id).and_then(|s| s.partner_id)
    }

    /// Mark a user as waiting for a partner
    ///
    /// A waiting user never carries a partner link.
    pub fn set_waiting(&mut self, user_id: UserId) {
        if let Some(session) = self.sessions.get_mut(&user_id) {
            session.state = SessionState::Waiting;
            session.partner_id = None;
        }
    }

    /// Pair two users with each other
    ///
    /// Both sessions move to `Paired` pointing at each other, with the
    /// pairing clock and message counters reset. Checks run before any
    /// mutation so a failure leaves the store untouched.
    pub fn pair(&mut self, a: UserId, b: UserId) -> Result<(), AppError> {
        if a == b {
            return Err(AppError::SelfPair);
        }
        for id in [a, b] {
            let Some(session) = self.sessions.get(&id) else {
                return Err(AppError::UnknownUser(id));
            };
            // A user may hold at most one partner link
            if session.state == SessionState::Paired {
                return Err(AppError::AlreadyPaired);
            }
        }

        let now = Instant::now();
        for (user, partner) in [(a, b), (b, a)] {
            let Some(session) = self.sessions.get_mut(&user) else {
                // Unreachable: presence checked above
                return Err(AppError::UnknownUser(user));
            };
            session.state = SessionState::Paired;
            session.partner_id = Some(partner);
            session.session_started_at = Some(now);
            session.messages_sent = 0;
        }
        Ok(())
    }

    /// Reset a user to idle, dropping any partner link and counters
    pub fn clear_pairing(&mut self, user_id: UserId) {
        if let Some(session) = self.sessions.get_mut(&user_id) {
            session.state = SessionState::Idle;
            session.partner_id = None;
            session.session_started_at = None;
            session.messages_sent = 0;
        }
    }

    /// Record one relayed message for the sending user
    pub fn record_message(&mut self, user_id: UserId) {
        if let Some(session) = self.sessions.get_mut(&user_id) {
            session.messages_sent += 1;
        }
    }

    /// Remove a user's session entirely (deregistration)
    pub fn remove(&mut self, user_id: UserId) {
        self.sessions.remove(&user_id);
    }

    /// Number of known users
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the store has no sessions
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Number of active chats (each pairing counted once)
    pub fn paired_count(&self) -> usize {
        self.sessions
            .values()
            .filter(|s| s.state == SessionState::Paired)
            .count()
            / 2
    }

    /// Iterate over all sessions
    pub fn sessions(&self) -> impl Iterator<Item = &UserSession> {
        self.sessions.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every pairing must be mutual and never reflexive.
    fn assert_symmetry(store: &SessionStore) {
        for session in store.sessions() {
            match session.state {
                SessionState::Paired => {
                    let partner_id = session.partner_id.expect("paired without partner");
                    assert_ne!(partner_id, session.user_id, "self-paired");
                    let partner = store.get(partner_id).expect("partner unknown");
                    assert_eq!(partner.partner_id, Some(session.user_id));
                    assert_eq!(partner.state, SessionState::Paired);
                }
                _ => assert!(session.partner_id.is_none()),
            }
        }
    }

    #[test]
    fn test_register_idempotent() {
        let mut store = SessionStore::new();
        let id = UserId::new();

        store.register(id);
        store.set_waiting(id);
        store.register(id);

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(id).unwrap().state, SessionState::Waiting);
    }

    #[test]
    fn test_pair_is_symmetric() {
        let mut store = SessionStore::new();
        let a = UserId::new();
        let b = UserId::new();
        store.register(a);
        store.register(b);

        store.pair(a, b).unwrap();

        assert_eq!(store.partner_of(a), Some(b));
        assert_eq!(store.partner_of(b), Some(a));
        assert_eq!(store.get(a).unwrap().state, SessionState::Paired);
        assert_eq!(store.get(b).unwrap().state, SessionState::Paired);
        assert_symmetry(&store);
    }

    #[test]
    fn test_pair_resets_counters() {
        let mut store = SessionStore::new();
        let a = UserId::new();
        let b = UserId::new();
        let c = UserId::new();
        store.register(a);
        store.register(b);
        store.register(c);

        store.pair(a, b).unwrap();
        store.record_message(a);
        store.record_message(a);
        assert_eq!(store.get(a).unwrap().messages_sent, 2);

        store.clear_pairing(a);
        store.clear_pairing(b);
        store.pair(a, c).unwrap();

        let session = store.get(a).unwrap();
        assert_eq!(session.messages_sent, 0);
        assert!(session.session_started_at.is_some());
    }

    #[test]
    fn test_pair_with_self_rejected() {
        let mut store = SessionStore::new();
        let a = UserId::new();
        store.register(a);

        assert!(matches!(store.pair(a, a), Err(AppError::SelfPair)));
        assert_eq!(store.get(a).unwrap().state, SessionState::Idle);
    }

    #[test]
    fn test_pair_already_paired_rejected() {
        let mut store = SessionStore::new();
        let a = UserId::new();
        let b = UserId::new();
        let c = UserId::new();
        store.register(a);
        store.register(b);
        store.register(c);
        store.pair(a, b).unwrap();

        assert!(matches!(store.pair(a, c), Err(AppError::AlreadyPaired)));
        // The existing pairing survives, C stays idle
        assert_eq!(store.partner_of(a), Some(b));
        assert_eq!(store.get(c).unwrap().state, SessionState::Idle);
        assert_symmetry(&store);
    }

    #[test]
    fn test_pair_unknown_user_leaves_store_untouched() {
        let mut store = SessionStore::new();
        let a = UserId::new();
        let ghost = UserId::new();
        store.register(a);

        assert!(matches!(
            store.pair(a, ghost),
            Err(AppError::UnknownUser(_))
        ));
        assert_eq!(store.get(a).unwrap().state, SessionState::Idle);
        assert!(store.partner_of(a).is_none());
    }

    #[test]
    fn test_clear_pairing() {
        let mut store = SessionStore::new();
        let a = UserId::new();
        let b = UserId::new();
        store.register(a);
        store.register(b);
        store.pair(a, b).unwrap();
        store.record_message(a);

        store.clear_pairing(a);
        store.clear_pairing(b);

        for id in [a, b] {
            let session = store.get(id).unwrap();
            assert_eq!(session.state, SessionState::Idle);
            assert!(session.partner_id.is_none());
            assert!(session.session_started_at.is_none());
            assert_eq!(session.messages_sent, 0);
        }
        assert_symmetry(&store);
    }

    #[test]
    fn test_paired_count() {
        let mut store = SessionStore::new();
        let ids: Vec<UserId> = (0..5).map(|_| UserId::new()).collect();
        for &id in &ids {
            store.register(id);
        }

        assert_eq!(store.paired_count(), 0);

        store.pair(ids[0], ids[1]).unwrap();
        store.pair(ids[2], ids[3]).unwrap();

        assert_eq!(store.paired_count(), 2);
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn test_remove() {
        let mut store = SessionStore::new();
        let a = UserId::new();
        store.register(a);
        store.remove(a);

        assert!(store.get(a).is_none());
        assert!(store.is_empty());
    }
}
