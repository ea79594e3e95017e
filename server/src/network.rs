//! Server network layer: the TCP listener, per-connection tasks, and the
//! coordinating loop that owns the game.
//!
//! Each connection gets one reader task (handshake, accumulation buffer,
//! frame decode) and one writer task (drains a channel of encoded frame
//! bytes). Everything that mutates state flows as a [`ServerEvent`]
//! through a single mpsc channel into the one loop that owns [`Game`]
//! and the session registry, so no locking is needed: two simultaneous
//! picks are applied in whichever order they are dequeued, the first
//! fully committed before the second is evaluated.

use crate::frame::{self, Opcode};
use crate::game::Game;
use crate::handshake;
use crate::session::SessionRegistry;
use log::{debug, error, info};
use shared::{ClientMsg, ServerMsg};
use std::error::Error;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

const STATIC_PAGE: &str = include_str!("../assets/index.html");
const MAX_REQUEST_HEAD: usize = 8 * 1024;

/// Events funneled from connection tasks into the coordinating loop.
#[derive(Debug)]
pub enum ServerEvent {
    Connected {
        id: u32,
        outbound: UnboundedSender<Vec<u8>>,
    },
    Inbound {
        id: u32,
        msg: ClientMsg,
    },
    Disconnected {
        id: u32,
    },
}

/// Main server owning the authoritative game and all live sessions.
pub struct Server {
    listener: Option<TcpListener>,
    registry: SessionRegistry,
    game: Game,
    event_tx: UnboundedSender<ServerEvent>,
    event_rx: UnboundedReceiver<ServerEvent>,
}

impl Server {
    /// Binds the listener. A taken port fails here; that is fatal for
    /// the process, there is no fallback transport.
    pub async fn new(addr: &str) -> Result<Self, Box<dyn Error>> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        let (event_tx, event_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener: Some(listener),
            registry: SessionRegistry::new(),
            game: Game::new(),
            event_tx,
            event_rx,
        })
    }

    /// The bound address, for when the OS picked the port.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|listener| listener.local_addr().ok())
    }

    /// Runs the accept loop and the coordinating event loop until the
    /// process ends.
    pub async fn run(&mut self) -> Result<(), Box<dyn Error>> {
        let listener = self.listener.take().ok_or("server is already running")?;
        tokio::spawn(accept_loop(listener, self.event_tx.clone()));

        while let Some(event) = self.event_rx.recv().await {
            self.handle_event(event);
        }
        Ok(())
    }

    fn handle_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::Connected { id, outbound } => {
                self.registry.insert(id, outbound);
                let seat = self.game.occupy_seat(id);
                self.send_msg(id, &ServerMsg::Joined { seat: seat_code(seat) });

                if seat.is_some() {
                    self.broadcast_state();
                } else {
                    // An observer's arrival mutates nothing, but it still
                    // needs one snapshot or it would stare at a blank
                    // page until the next ball.
                    self.send_msg(
                        id,
                        &ServerMsg::State {
                            seat: -1,
                            game: self.game.view_for(None),
                        },
                    );
                }
            }
            ServerEvent::Disconnected { id } => {
                self.registry.remove(&id);
                if self.game.release_seat(id) {
                    self.broadcast_state();
                }
            }
            ServerEvent::Inbound { id, msg } => self.dispatch(id, msg),
        }
    }

    /// Validates and applies one application message. Accepted mutations
    /// broadcast; rejected ones change nothing and answer nothing.
    fn dispatch(&mut self, id: u32, msg: ClientMsg) {
        let seat = self.game.seat_of(id);
        let applied = match msg {
            ClientMsg::Rename { name } => seat.map_or(false, |s| self.game.rename(s, &name)),
            ClientMsg::Pick { pick } => seat.map_or(false, |s| self.game.submit_pick(s, pick)),
            ClientMsg::NextBall => seat.is_some() && self.game.next_ball(),
            ClientMsg::Restart => {
                self.game.restart();
                true
            }
        };

        if applied {
            self.broadcast_state();
        } else {
            debug!("Session {} message ignored", id);
        }
    }

    /// Pushes a per-viewer projection of the game to every live session.
    fn broadcast_state(&self) {
        for id in self.registry.session_ids() {
            let seat = self.game.seat_of(id);
            let msg = ServerMsg::State {
                seat: seat_code(seat),
                game: self.game.view_for(seat),
            };
            self.send_msg(id, &msg);
        }
    }

    fn send_msg(&self, id: u32, msg: &ServerMsg) {
        match serde_json::to_string(msg) {
            Ok(json) => self.registry.send_to(id, frame::encode_text(&json)),
            Err(e) => error!("Failed to encode outbound message: {}", e),
        }
    }
}

fn seat_code(seat: Option<usize>) -> i32 {
    seat.map(|s| s as i32).unwrap_or(-1)
}

async fn accept_loop(listener: TcpListener, event_tx: UnboundedSender<ServerEvent>) {
    let mut next_session_id: u32 = 1;

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let id = next_session_id;
                next_session_id += 1;
                debug!("Connection from {} as session {}", addr, id);
                tokio::spawn(handle_connection(stream, id, event_tx.clone()));
            }
            Err(e) => {
                error!("Error accepting connection: {}", e);
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }
    }
}

/// Drives one connection: request head, then either the static page or
/// the upgrade handshake followed by frame traffic until close.
async fn handle_connection(mut stream: TcpStream, id: u32, event_tx: UnboundedSender<ServerEvent>) {
    let (head, leftover) = match read_request_head(&mut stream).await {
        Ok(parts) => parts,
        Err(e) => {
            debug!("Session {} dropped before a full request: {}", id, e);
            return;
        }
    };

    if !handshake::is_upgrade(&head) {
        if let Err(e) = stream.write_all(page_response().as_bytes()).await {
            debug!("Session {} static page write failed: {}", id, e);
        }
        return;
    }

    let response = handshake::response(handshake::websocket_key(&head));
    if stream.write_all(response.as_bytes()).await.is_err() {
        return;
    }

    let (read_half, write_half) = stream.into_split();
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    tokio::spawn(write_outbound(write_half, outbound_rx));

    if event_tx
        .send(ServerEvent::Connected {
            id,
            outbound: outbound_tx.clone(),
        })
        .is_err()
    {
        return;
    }

    read_frames(read_half, id, leftover, &event_tx, &outbound_tx).await;
    let _ = event_tx.send(ServerEvent::Disconnected { id });
}

/// The session's read side: appends to its private accumulation buffer,
/// drains complete frames, dispatches by opcode.
async fn read_frames(
    mut reader: OwnedReadHalf,
    id: u32,
    mut pending: Vec<u8>,
    event_tx: &UnboundedSender<ServerEvent>,
    outbound_tx: &UnboundedSender<Vec<u8>>,
) {
    let mut chunk = [0u8; 4096];

    loop {
        // Decode before reading so bytes that arrived glued to the
        // handshake are not held back waiting for more input.
        let (frames, rest) = frame::decode(&pending);
        pending = rest;

        for f in frames {
            match f.opcode {
                Opcode::Text | Opcode::Binary => {
                    match serde_json::from_slice::<ClientMsg>(&f.payload) {
                        Ok(msg) => {
                            let _ = event_tx.send(ServerEvent::Inbound { id, msg });
                        }
                        Err(e) => {
                            debug!("Session {} sent a malformed message, dropping: {}", id, e)
                        }
                    }
                }
                Opcode::Ping => {
                    let _ = outbound_tx.send(frame::encode_pong());
                }
                Opcode::Pong => {}
                Opcode::Close => return,
            }
        }

        match reader.read(&mut chunk).await {
            Ok(0) => return,
            Ok(n) => pending.extend_from_slice(&chunk[..n]),
            Err(e) => {
                debug!("Session {} read error: {}", id, e);
                return;
            }
        }
    }
}

/// The session's write side. A failed write ends the task quietly; the
/// read side's close/error signal reconciles registry and game state.
async fn write_outbound(mut writer: OwnedWriteHalf, mut outbound_rx: UnboundedReceiver<Vec<u8>>) {
    while let Some(bytes) = outbound_rx.recv().await {
        if let Err(e) = writer.write_all(&bytes).await {
            debug!("Outbound write failed: {}", e);
            return;
        }
    }
}

/// Reads until the blank line ending the request head. Bytes past it
/// (a fast client's first frames) are returned for the frame buffer.
async fn read_request_head(stream: &mut TcpStream) -> std::io::Result<(String, Vec<u8>)> {
    let mut collected = Vec::new();
    let mut chunk = [0u8; 1024];

    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(std::io::ErrorKind::UnexpectedEof.into());
        }
        collected.extend_from_slice(&chunk[..n]);

        if let Some(end) = collected.windows(4).position(|w| w == b"\r\n\r\n") {
            let leftover = collected.split_off(end + 4);
            return Ok((String::from_utf8_lossy(&collected).into_owned(), leftover));
        }
        if collected.len() > MAX_REQUEST_HEAD {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "request head too large",
            ));
        }
    }
}

fn page_response() -> String {
    format!(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: text/html; charset=utf-8\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n{}",
        STATIC_PAGE.len(),
        STATIC_PAGE
    )
}
