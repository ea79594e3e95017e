//! Upgrade handshake: turns an HTTP request head into the one-shot
//! `101 Switching Protocols` response that puts the connection into
//! frame mode.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use sha1::{Digest, Sha1};

const WS_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Whether the request head asks to upgrade to the WebSocket protocol.
/// Path is irrelevant; any upgrade request is accepted.
pub fn is_upgrade(head: &str) -> bool {
    header_value(head, "upgrade")
        .map(|value| value.eq_ignore_ascii_case("websocket"))
        .unwrap_or(false)
}

/// The client's `Sec-WebSocket-Key`, if it sent one.
pub fn websocket_key(head: &str) -> Option<&str> {
    header_value(head, "sec-websocket-key")
}

/// Derives the accept value: base64(SHA-1(key + GUID)).
pub fn accept_key(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(WS_GUID.as_bytes());
    STANDARD.encode(hasher.finalize())
}

/// Builds the switch-protocol response. A missing key still produces a
/// response, with the accept value derived from the empty string; clients
/// that sent no key will fail their own validation, which is the known
/// gap this server inherits rather than a hard error.
pub fn response(key: Option<&str>) -> String {
    let accept = accept_key(key.unwrap_or(""));
    format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {}\r\n\
         \r\n",
        accept
    )
}

fn header_value<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    head.lines().skip(1).find_map(|line| {
        let (key, value) = line.split_once(':')?;
        if key.trim().eq_ignore_ascii_case(name) {
            Some(value.trim())
        } else {
            None
        }
    })
}
