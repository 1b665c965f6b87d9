//! Partner matching
//!
//! Pairs a searching user with the longest-waiting pool candidate, or
//! enqueues them when nobody is available. Runs inside the engine actor, so
//! the dequeue-and-pair sequence is a single atomic unit: no other call can
//! observe or claim the same candidate.

use crate::error::AppError;
use crate::pool::WaitingPool;
use crate::store::{SessionState, SessionStore};
use crate::types::UserId;

/// Result of a find-partner attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Matched with the returned partner; both sessions are now paired
    Paired(UserId),
    /// No candidate available; the caller was placed in the waiting pool
    Waiting,
}

/// Find a partner for `user_id`
///
/// A user already in a chat must end it first (`AlreadyPaired`). A user
/// already waiting stays waiting with a single pool entry. Candidate
/// selection is FIFO and never yields the caller themselves.
pub fn find_partner(
    store: &mut SessionStore,
    pool: &mut WaitingPool,
    user_id: UserId,
) -> Result<MatchOutcome, AppError> {
    let session = store.get(user_id).ok_or(AppError::UnknownUser(user_id))?;
    if session.state == SessionState::Paired {
        return Err(AppError::AlreadyPaired);
    }

    match pool.dequeue_candidate(user_id) {
        Some(candidate) => {
            store.pair(user_id, candidate)?;
            pool.remove(user_id);
            Ok(MatchOutcome::Paired(candidate))
        }
        None => {
            pool.enqueue(user_id);
            store.set_waiting(user_id);
            Ok(MatchOutcome::Waiting)
        }
    }
}
