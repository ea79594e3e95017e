//! # Gully Cricket Server Library
//!
//! The authoritative server for a two-player LAN dice-cricket match.
//! Browsers on the local network connect over a hand-rolled WebSocket
//! layer; the server holds the only true copy of the match state and
//! pushes each observer a personalized view after every change.
//!
//! ## Architecture
//!
//! All mutable state, the [`game::Game`] record and the
//! [`session::SessionRegistry`], is owned by a single coordinating
//! loop. Connection tasks never touch it directly; they translate bytes
//! into [`network::ServerEvent`]s and send them down one channel. That
//! total ordering is what keeps two players' simultaneous picks
//! race-free: whichever event is dequeued first is fully applied before
//! the second is evaluated against the updated state.
//!
//! Nothing ever blocks on player input. The `picking` phase simply stays
//! open until both picks arrive, and broadcasts are fire-and-forget: a
//! failed write is treated as an impending disconnect and reconciled by
//! the reader task's close signal.
//!
//! ## Module Organization
//!
//! - [`frame`]: WebSocket frame codec. Buffer in, frames plus leftover
//!   bytes out; unmasked text frames and control frames out.
//! - [`handshake`]: one-shot upgrade negotiation (accept-key digest and
//!   the 101 response).
//! - [`session`]: registry mapping session ids to outbound handles.
//! - [`game`]: the turn-based match state machine. Seats, innings,
//!   picks, resolution, restart.
//! - [`network`]: listener, per-connection reader/writer tasks, the
//!   coordinating event loop, dispatch, and broadcast.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new("0.0.0.0:8080").await?;
//!     server.run().await
//! }
//! ```

pub mod frame;
pub mod game;
pub mod handshake;
pub mod network;
pub mod session;
