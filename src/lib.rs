//! Anonymous 1:1 Stranger-Chat Server Library
//!
//! A WebSocket server that pairs anonymous users into ephemeral one-to-one
//! chat sessions and relays messages between partners, built with
//! tokio-tungstenite using the Actor pattern for state management.
//!
//! # Features
//! - WebSocket connection handling
//! - FIFO partner matching (longest-waiting user first)
//! - Anonymous message relay between paired partners
//! - Partner-liveness handling with symmetric teardown
//! - Chat-end summaries (duration, message count)
//! - Typing indicators
//! - Server statistics
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatEngine` is the central actor owning the session store and
//!   waiting pool
//! - Each connection has a `handler` task communicating with the engine
//! - No locks needed - all state access goes through message passing, so
//!   matching and teardown are atomic by construction
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use tokio::sync::mpsc;
//! use anon_chat_server::{ChatEngine, handle_connection};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await.unwrap();
//!     let (cmd_tx, cmd_rx) = mpsc::channel(256);
//!
//!     tokio::spawn(ChatEngine::new(cmd_rx).run());
//!
//!     while let Ok((stream, _)) = listener.accept().await {
//!         let cmd_tx = cmd_tx.clone();
//!         tokio::spawn(handle_connection(stream, cmd_tx));
//!     }
//! }
//! ```

pub mod client;
pub mod engine;
pub mod error;
pub mod handler;
pub mod matcher;
pub mod message;
pub mod pool;
pub mod relay;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use client::Client;
pub use engine::{ChatEngine, EngineCommand};
pub use error::{AppError, SendError};
pub use handler::handle_connection;
pub use matcher::MatchOutcome;
pub use message::{ClientMessage, ErrorCode, ServerMessage};
pub use pool::WaitingPool;
pub use relay::deliver;
pub use store::{SessionState, SessionStore, UserSession};
pub use types::UserId;
