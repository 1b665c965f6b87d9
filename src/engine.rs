//! ChatEngine actor implementation
//!
//! The central actor that manages all state: connected clients, the session
//! store, and the waiting pool. Uses the Actor pattern with mpsc channels
//! for message passing. Commands are processed one at a time, so every
//! read-then-write sequence on pairing state (matching, relaying, ending a
//! chat) is a critical section without any locks: two concurrent find
//! requests can never claim the same waiting candidate, and concurrent end
//! requests on the same pairing resolve in arrival order.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::client::Client;
use crate::error::AppError;
use crate::matcher::{self, MatchOutcome};
use crate::message::ServerMessage;
use crate::pool::WaitingPool;
use crate::relay;
use crate::store::SessionStore;
use crate::types::UserId;

/// Commands sent from handlers to the ChatEngine actor
#[derive(Debug)]
pub enum EngineCommand {
    /// New user connected
    Connect {
        user_id: UserId,
        sender: mpsc::Sender<ServerMessage>,
    },
    /// User disconnected
    Disconnect {
        user_id: UserId,
    },
    /// Find a chat partner
    Find {
        user_id: UserId,
    },
    /// Relay a chat message to the current partner
    Chat {
        user_id: UserId,
        content: String,
    },
    /// User started typing
    Typing {
        user_id: UserId,
    },
    /// User stopped typing
    StopTyping {
        user_id: UserId,
    },
    /// End the current chat
    End {
        user_id: UserId,
    },
    /// Report server statistics
    Stats {
        user_id: UserId,
    },
}

/// The main ChatEngine actor
///
/// Session lifecycle controller: consults the session store, drives the
/// matcher and relay, and emits outbound notifications to client channels.
pub struct ChatEngine {
    /// Transport handles of connected users: UserId -> Client
    clients: HashMap<UserId, Client>,
    /// Pairing state of every known user
    store: SessionStore,
    /// FIFO queue of users searching for a partner
    pool: WaitingPool,
    /// Total messages relayed since startup
    messages_relayed: u64,
    /// Command receiver channel
    receiver: mpsc::Receiver<EngineCommand>,
}

impl ChatEngine {
    /// Create a new ChatEngine with the given command receiver
    pub fn new(receiver: mpsc::Receiver<EngineCommand>) -> Self {
        Self {
            clients: HashMap::new(),
            store: SessionStore::new(),
            pool: WaitingPool::new(),
            messages_relayed: 0,
            receiver,
        }
    }

    /// Run the ChatEngine event loop
    ///
    /// Continuously receives and processes commands until all senders are dropped.
    pub async fn run(mut self) {
        info!("ChatEngine started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd).await;
        }

        info!("ChatEngine shutting down");
    }

    /// Process a single command
    async fn handle_command(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::Connect { user_id, sender } => {
                self.handle_connect(user_id, sender).await;
            }
            EngineCommand::Disconnect { user_id } => {
                self.handle_disconnect(user_id).await;
            }
            EngineCommand::Find { user_id } => {
                self.handle_find(user_id).await;
            }
            EngineCommand::Chat { user_id, content } => {
                self.handle_chat(user_id, content).await;
            }
            EngineCommand::Typing { user_id } => {
                self.handle_typing(user_id).await;
            }
            EngineCommand::StopTyping { user_id } => {
                self.handle_stop_typing(user_id).await;
            }
            EngineCommand::End { user_id } => {
                self.handle_end(user_id).await;
            }
            EngineCommand::Stats { user_id } => {
                self.handle_stats(user_id).await;
            }
        }
    }

    /// Handle new user connection
    async fn handle_connect(&mut self, user_id: UserId, sender: mpsc::Sender<ServerMessage>) {
        info!("User {} connected", user_id);
        self.clients.insert(user_id, Client::new(user_id, sender));
        self.store.register(user_id);
        debug!(
            "Total users: {}, waiting: {}, active chats: {}",
            self.store.len(),
            self.pool.len(),
            self.store.paired_count()
        );
    }

    /// Handle user disconnection
    ///
    /// Removes the user from the waiting pool, tears down any active pairing
    /// (notifying the partner), and forgets the session. If this races with
    /// being matched, the match was already processed first - the teardown
    /// path then notifies the fresh partner like any other chat end.
    async fn handle_disconnect(&mut self, user_id: UserId) {
        info!("User {} disconnected", user_id);

        self.pool.remove(user_id);

        if let Some(partner_id) = self.store.partner_of(user_id) {
            self.store.clear_pairing(user_id);
            self.store.clear_pairing(partner_id);
            if let Some(partner) = self.clients.get(&partner_id) {
                let _ = partner.send(ServerMessage::PartnerLeft).await;
            }
        }

        self.store.remove(user_id);
        self.clients.remove(&user_id);

        debug!(
            "Total users: {}, waiting: {}, active chats: {}",
            self.store.len(),
            self.pool.len(),
            self.store.paired_count()
        );
    }

    /// Handle a find-partner request
    async fn handle_find(&mut self, user_id: UserId) {
        let outcome = matcher::find_partner(&mut self.store, &mut self.pool, user_id);

        let Some(client) = self.clients.get(&user_id) else {
            return;
        };

        match outcome {
            Ok(MatchOutcome::Paired(partner_id)) => {
                info!("Paired {} with {}", user_id, partner_id);
                let _ = client.send(ServerMessage::PartnerFound).await;
                if let Some(partner) = self.clients.get(&partner_id) {
                    let _ = partner.send(ServerMessage::PartnerFound).await;
                }
            }
            Ok(MatchOutcome::Waiting) => {
                debug!("User {} waiting ({} in pool)", user_id, self.pool.len());
                let _ = client.send(ServerMessage::Waiting).await;
            }
            Err(err) => {
                let _ = client.send(err.into()).await;
            }
        }
    }

    /// Handle a chat message
    async fn handle_chat(&mut self, user_id: UserId, content: String) {
        // Clear typing status before delivery
        let was_typing = match self.clients.get_mut(&user_id) {
            Some(client) => {
                let was_typing = client.is_typing;
                client.set_typing(false);
                was_typing
            }
            None => return,
        };

        if was_typing {
            if let Some(partner_id) = self.store.partner_of(user_id) {
                if let Some(partner) = self.clients.get(&partner_id) {
                    let _ = partner.send(ServerMessage::PartnerStopTyping).await;
                }
            }
        }

        match relay::deliver(&mut self.store, &self.clients, user_id, content).await {
            Ok(partner_id) => {
                self.messages_relayed += 1;
                debug!("Relayed message {} -> {}", user_id, partner_id);
            }
            Err(err) => {
                if let AppError::PartnerUnreachable = err {
                    info!("Chat of {} closed: partner unreachable", user_id);
                }
                if let Some(client) = self.clients.get(&user_id) {
                    let _ = client.send(err.into()).await;
                }
            }
        }
    }

    /// Handle typing indicator start
    async fn handle_typing(&mut self, user_id: UserId) {
        let Some(client) = self.clients.get_mut(&user_id) else {
            return;
        };

        // Already typing? Skip
        if client.is_typing {
            return;
        }

        let Some(partner_id) = self.store.partner_of(user_id) else {
            let _ = client.send(AppError::NotConnected.into()).await;
            return;
        };

        client.set_typing(true);

        if let Some(partner) = self.clients.get(&partner_id) {
            let _ = partner.send(ServerMessage::PartnerTyping).await;
        }
    }

    /// Handle typing indicator stop
    async fn handle_stop_typing(&mut self, user_id: UserId) {
        let Some(client) = self.clients.get_mut(&user_id) else {
            return;
        };

        // Not typing? Skip
        if !client.is_typing {
            return;
        }

        client.set_typing(false);

        if let Some(partner_id) = self.store.partner_of(user_id) {
            if let Some(partner) = self.clients.get(&partner_id) {
                let _ = partner.send(ServerMessage::PartnerStopTyping).await;
            }
        }
    }

    /// Handle a chat-end request
    ///
    /// Computes the session summary from both sides before clearing them, so
    /// a repeated end request finds an idle session and gets `NotInChat`.
    async fn handle_end(&mut self, user_id: UserId) {
        let Some(client) = self.clients.get(&user_id) else {
            return;
        };

        let partner_id = match self.store.get(user_id).and_then(|s| s.partner_id) {
            Some(partner_id) => partner_id,
            None => {
                let _ = client.send(AppError::NotInChat.into()).await;
                return;
            }
        };

        let (duration, messages_total) = match self.store.get(user_id) {
            Some(session) => {
                let duration = session
                    .session_started_at
                    .map(|t| t.elapsed())
                    .unwrap_or_default();
                let partner_messages = self
                    .store
                    .get(partner_id)
                    .map_or(0, |s| s.messages_sent);
                (duration, session.messages_sent + partner_messages)
            }
            None => return,
        };

        self.store.clear_pairing(user_id);
        self.store.clear_pairing(partner_id);

        info!(
            "Chat ended by {} ({}s, {} messages)",
            user_id,
            duration.as_secs(),
            messages_total
        );

        let _ = client
            .send(ServerMessage::ChatEnded {
                duration_secs: duration.as_secs(),
                messages_total,
            })
            .await;

        if let Some(partner) = self.clients.get(&partner_id) {
            let _ = partner.send(ServerMessage::PartnerLeft).await;
        }
    }

    /// Handle a statistics request
    async fn handle_stats(&mut self, user_id: UserId) {
        let Some(client) = self.clients.get(&user_id) else {
            return;
        };

        let stats = ServerMessage::Stats {
            users: self.store.len(),
            waiting: self.pool.len(),
            active_chats: self.store.paired_count(),
            messages_relayed: self.messages_relayed,
        };

        if client.send(stats).await.is_err() {
            error!("Failed to send stats to {}", user_id);
        }
    }
}
