//! Message relay between paired partners
//!
//! Forwards chat content from a paired user to their partner's transport
//! channel. A closed channel means the partner is gone: the pairing is torn
//! down on both sides before the failure is reported, so neither session is
//! ever left pointing at a dead partner. Delivery is never retried; the
//! sender may re-send after pairing with someone new.

use std::collections::HashMap;

use tracing::warn;

use crate::client::Client;
use crate::error::AppError;
use crate::message::ServerMessage;
use crate::store::SessionStore;
use crate::types::UserId;

/// Deliver a chat message from `from` to their current partner
///
/// Returns the partner id on success, after recording the message against
/// the sender's session. Fails with `NotConnected` when the sender has no
/// partner, or `PartnerUnreachable` when the partner's channel is closed -
/// in which case both sessions have already been reset to idle.
pub async fn deliver(
    store: &mut SessionStore,
    clients: &HashMap<UserId, Client>,
    from: UserId,
    content: String,
) -> Result<UserId, AppError> {
    let Some(partner_id) = store.partner_of(from) else {
        return Err(AppError::NotConnected);
    };

    let delivered = match clients.get(&partner_id) {
        Some(partner) => partner.send(ServerMessage::Chat { content }).await.is_ok(),
        None => false,
    };

    if !delivered {
        warn!("Partner {} of {} unreachable, closing chat", partner_id, from);
        store.clear_pairing(from);
        store.clear_pairing(partner_id);
        return Err(AppError::PartnerUnreachable);
    }

    store.record_message(from);
    Ok(partner_id)
}
